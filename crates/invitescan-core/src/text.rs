//! Heuristic invite detection in plain-text message bodies.
//!
//! A body counts as an invite when it has a labeled time line such as
//! `When: ...`, `Time: ...` or `Date: ...`. An optional `Where:` or
//! `Location:` line supplies the location. A value may sit on the line after
//! its label, which is how block-per-field HTML bodies read once reduced.
//!
//! The captured time text is parsed against a short list of explicit
//! formats. This is deliberately not a natural-language parser: relative
//! phrases like "tomorrow" are not understood. When parsing fails the start
//! falls back to the scan time supplied by the caller, and the description
//! says so, so a consumer can tell an estimate from a parsed time.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use tracing::debug;

use crate::invite::InviteEvent;
use crate::timestamp::TimestampZone;

/// Title used when the message has no subject.
pub const PLACEHOLDER_TITLE: &str = "Meeting Invitation";

/// Description attached to every invite found in a message body.
pub const BODY_MARKER: &str = "Parsed from email body";

static WHEN_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:when|time|date):\s*([^\r\n]+)").expect("Invalid when regex")
});

static WHERE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:where|location):\s*([^\r\n]+)").expect("Invalid where regex")
});

static WEEKDAY_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:mon|tue|wed|thu|fri|sat|sun)[a-z]*\.?,?\s+").expect("Invalid weekday regex")
});

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %I:%M %p",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %I:%M %p",
    "%m/%d/%Y %I:%M%p",
    "%B %d, %Y %I:%M %p",
    "%B %d, %Y %I:%M%p",
    "%B %d, %Y at %I:%M %p",
    "%B %d, %Y %H:%M",
    "%B %d %Y %I:%M %p",
    "%d %B %Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%B %d, %Y", "%B %d %Y", "%d %B %Y"];

/// Parses a message body for a labeled meeting time.
///
/// Returns `None` when no time label is present. `now` is the scan time used
/// when the labeled text is not a recognized date.
pub fn parse_invite_text(
    body: &str,
    subject_fallback: &str,
    now: DateTime<Utc>,
    zone: TimestampZone,
) -> Option<InviteEvent> {
    let when = WHEN_REGEX.captures(body)?.get(1)?.as_str().trim();

    let title = match subject_fallback.trim() {
        "" => PLACEHOLDER_TITLE,
        subject => subject,
    };

    let location = WHERE_REGEX
        .captures(body)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .unwrap_or_default();

    let (start, description) = match parse_when(when, zone) {
        Some(start) => (start, BODY_MARKER.to_string()),
        None => {
            debug!(when = %when, "time text not understood, using scan time");
            (now, format!("{} (time not understood: {})", BODY_MARKER, when))
        }
    };

    Some(
        InviteEvent::new(title, start)?
            .with_location(location)
            .with_description(description),
    )
}

/// Tries the known formats against the labeled time text.
///
/// Trailing ranges (`- 3:00 PM`), parenthesized zone names and a leading
/// weekday are stripped before matching.
fn parse_when(text: &str, zone: TimestampZone) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }

    let mut candidate = text;
    for separator in [" - ", " – ", " to ", "("] {
        if let Some((head, _)) = candidate.split_once(separator) {
            candidate = head;
        }
    }
    let candidate = WEEKDAY_REGEX.replace(candidate.trim(), "");
    let candidate = candidate.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(candidate) {
        return Some(dt.with_timezone(&Utc));
    }

    let naive = DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(candidate, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(candidate, fmt).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })?;

    zone.resolve(naive, false)
}
