//! Compact calendar timestamps and the zone they are read in.
//!
//! Calendar markup carries times like `20240115T140000` or
//! `20240115T140000Z`. Whether a trailing `Z` is honored is a configuration
//! choice ([`TimestampZone`]) rather than a hard-coded assumption.

use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// How a wall-clock timestamp is turned into an instant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimestampZone {
    /// Always the host's local zone, ignoring any UTC marker.
    #[default]
    Local,
    /// Always UTC.
    Utc,
    /// UTC when the value carries a `Z` marker, local otherwise.
    Marker,
}

impl TimestampZone {
    /// Resolves a wall-clock time to a UTC instant.
    ///
    /// Local times skipped by a DST jump move forward by an hour. Ambiguous
    /// local times resolve to the earlier instant.
    pub fn resolve(&self, naive: NaiveDateTime, utc_marker: bool) -> Option<DateTime<Utc>> {
        let as_utc = match self {
            Self::Local => false,
            Self::Utc => true,
            Self::Marker => utc_marker,
        };

        if as_utc {
            Some(naive.and_utc())
        } else {
            resolve_in(&Local, naive)
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Utc => "utc",
            Self::Marker => "marker",
        }
    }
}

fn resolve_in<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> Option<DateTime<Utc>> {
    tz.from_local_datetime(&naive)
        .earliest()
        .or_else(|| {
            let shifted = naive.checked_add_signed(Duration::hours(1))?;
            tz.from_local_datetime(&shifted).earliest()
        })
        .map(|dt| dt.with_timezone(&Utc))
}

/// Parses a compact calendar timestamp.
///
/// Accepts `YYYYMMDD`, `YYYYMMDDTHHMM[SS]` and either with a trailing `Z`.
/// Hour and minute default to `00`; seconds are dropped. Returns `None` for
/// fewer than eight digits, stray characters, or an impossible date.
pub fn parse_compact_timestamp(value: &str, zone: TimestampZone) -> Option<DateTime<Utc>> {
    let value = value.trim();
    let utc_marker = value.ends_with(['Z', 'z']);
    let digits: String = value
        .chars()
        .filter(|c| !matches!(c, 'T' | 't' | 'Z' | 'z'))
        .collect();

    if digits.len() < 8 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let year: i32 = digits[0..4].parse().ok()?;
    let month: u32 = digits[4..6].parse().ok()?;
    let day: u32 = digits[6..8].parse().ok()?;
    let hour = component(&digits, 8)?;
    let minute = component(&digits, 10)?;

    let naive = NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, 0)?;
    zone.resolve(naive, utc_marker)
}

/// Reads up to two digits at `offset`, defaulting to zero when absent.
fn component(digits: &str, offset: usize) -> Option<u32> {
    match digits.get(offset..) {
        Some(rest) if !rest.is_empty() => rest[..rest.len().min(2)].parse().ok(),
        _ => Some(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Local
            .with_ymd_and_hms(y, m, d, h, min, 0)
            .earliest()
            .unwrap()
            .with_timezone(&Utc)
    }

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn datetime_in_local_zone() {
        assert_eq!(
            parse_compact_timestamp("20240115T140000", TimestampZone::Local),
            Some(local(2024, 1, 15, 14, 0))
        );
    }

    #[test]
    fn local_zone_ignores_utc_marker() {
        assert_eq!(
            parse_compact_timestamp("20240115T140000Z", TimestampZone::Local),
            Some(local(2024, 1, 15, 14, 0))
        );
    }

    #[test]
    fn marker_zone_honors_utc_marker() {
        assert_eq!(
            parse_compact_timestamp("20240115T140000Z", TimestampZone::Marker),
            Some(utc(2024, 1, 15, 14, 0))
        );
        assert_eq!(
            parse_compact_timestamp("20240115T140000", TimestampZone::Marker),
            Some(local(2024, 1, 15, 14, 0))
        );
    }

    #[test]
    fn utc_zone() {
        assert_eq!(
            parse_compact_timestamp("20240115T093000", TimestampZone::Utc),
            Some(utc(2024, 1, 15, 9, 30))
        );
    }

    #[test]
    fn date_only_is_midnight() {
        assert_eq!(
            parse_compact_timestamp("20240210", TimestampZone::Utc),
            Some(utc(2024, 2, 10, 0, 0))
        );
    }

    #[test]
    fn partial_time_fills_defaults() {
        assert_eq!(
            parse_compact_timestamp("20240210T09", TimestampZone::Utc),
            Some(utc(2024, 2, 10, 9, 0))
        );
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_compact_timestamp("", TimestampZone::Utc).is_none());
        assert!(parse_compact_timestamp("2024011", TimestampZone::Utc).is_none());
        assert!(parse_compact_timestamp("tomorrow", TimestampZone::Utc).is_none());
        assert!(parse_compact_timestamp("2024-01-15", TimestampZone::Utc).is_none());
        assert!(parse_compact_timestamp("20241341T000000", TimestampZone::Utc).is_none());
        assert!(parse_compact_timestamp("20240115T250000", TimestampZone::Utc).is_none());
    }

    #[test]
    fn zone_serde_names() {
        let zone: TimestampZone = serde_json::from_str("\"marker\"").unwrap();
        assert_eq!(zone, TimestampZone::Marker);
        assert_eq!(TimestampZone::default().as_str(), "local");
    }

    /// CET/CEST-like zone that springs forward at 2024-03-31 01:00 UTC.
    #[derive(Debug, Clone, Copy)]
    struct SpringForward;

    impl SpringForward {
        fn transition() -> NaiveDateTime {
            NaiveDate::from_ymd_opt(2024, 3, 31)
                .unwrap()
                .and_hms_opt(1, 0, 0)
                .unwrap()
        }

        fn winter() -> chrono::FixedOffset {
            chrono::FixedOffset::east_opt(3600).unwrap()
        }

        fn summer() -> chrono::FixedOffset {
            chrono::FixedOffset::east_opt(7200).unwrap()
        }
    }

    impl TimeZone for SpringForward {
        type Offset = chrono::FixedOffset;

        fn from_offset(_offset: &chrono::FixedOffset) -> Self {
            SpringForward
        }

        fn offset_from_local_date(&self, local: &NaiveDate) -> chrono::LocalResult<Self::Offset> {
            self.offset_from_local_datetime(&local.and_time(chrono::NaiveTime::MIN))
        }

        fn offset_from_local_datetime(
            &self,
            local: &NaiveDateTime,
        ) -> chrono::LocalResult<Self::Offset> {
            let winter = *local - Duration::hours(1) < Self::transition();
            let summer = *local - Duration::hours(2) >= Self::transition();
            match (winter, summer) {
                (true, true) => chrono::LocalResult::Ambiguous(Self::winter(), Self::summer()),
                (true, false) => chrono::LocalResult::Single(Self::winter()),
                (false, true) => chrono::LocalResult::Single(Self::summer()),
                (false, false) => chrono::LocalResult::None,
            }
        }

        fn offset_from_utc_date(&self, utc: &NaiveDate) -> Self::Offset {
            self.offset_from_utc_datetime(&utc.and_time(chrono::NaiveTime::MIN))
        }

        fn offset_from_utc_datetime(&self, utc: &NaiveDateTime) -> Self::Offset {
            if *utc < Self::transition() {
                Self::winter()
            } else {
                Self::summer()
            }
        }
    }

    fn naive(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn time_in_dst_gap_moves_forward() {
        assert_eq!(
            resolve_in(&SpringForward, naive(2024, 3, 31, 2, 30)),
            Some(utc(2024, 3, 31, 1, 30))
        );
        assert_eq!(
            resolve_in(&SpringForward, naive(2024, 3, 31, 1, 30)),
            Some(utc(2024, 3, 31, 0, 30))
        );
        assert_eq!(
            resolve_in(&SpringForward, naive(2024, 3, 31, 3, 0)),
            Some(utc(2024, 3, 31, 1, 0))
        );
    }
}
