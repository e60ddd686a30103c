//! Calendar markup (iCalendar) parsing.
//!
//! Only the handful of properties an invite needs are read: `SUMMARY`,
//! `DTSTART`, `DTEND`, `LOCATION` and `DESCRIPTION`. Wrapped calendars
//! (`BEGIN:VCALENDAR` / `BEGIN:VEVENT`) go through `icalendar`; bare property
//! lines with no wrapper are scanned line by line.
//!
//! Timestamps are taken as raw values and resolved with [`TimestampZone`], so
//! parameters such as `;TZID=...` or `;VALUE=DATE` are accepted and ignored.

use icalendar::{Calendar, CalendarComponent, Component};
use tracing::{debug, warn};

use crate::invite::InviteEvent;
use crate::timestamp::{TimestampZone, parse_compact_timestamp};

/// Title used when neither the markup nor the caller supplies one.
pub const PLACEHOLDER_TITLE: &str = "Calendar Invite";

const FIELDS: [&str; 5] = ["SUMMARY", "DTSTART", "DTEND", "LOCATION", "DESCRIPTION"];

/// Parses calendar markup into an invite.
///
/// `fallback_title` (usually the message subject) is used when the markup has
/// no `SUMMARY`. Returns `None` unless a start time resolves.
///
/// Only the first `VEVENT` is read. Properties of other components
/// (`VTIMEZONE`, `VALARM`, ...) never reach the event, so a time zone
/// definition's `DTSTART` cannot become the event start.
pub fn parse_calendar_markup(
    markup: &str,
    fallback_title: &str,
    zone: TimestampZone,
) -> Option<InviteEvent> {
    let fields = if has_wrapper(markup) {
        read_first_event(markup)?
    } else {
        read_bare_lines(markup)
    };

    let title = fields
        .summary
        .or_else(|| non_empty(fallback_title.trim()))
        .unwrap_or_else(|| PLACEHOLDER_TITLE.to_string());

    let Some(start) = fields
        .start
        .as_deref()
        .and_then(|s| parse_compact_timestamp(s, zone))
    else {
        debug!(title = %title, raw_start = ?fields.start, "markup has no usable DTSTART");
        return None;
    };

    let mut invite = InviteEvent::new(title, start)?;
    if let Some(end) = fields
        .end
        .as_deref()
        .and_then(|s| parse_compact_timestamp(s, zone))
    {
        invite = invite.with_end_time(end);
    }
    if let Some(location) = fields.location {
        invite = invite.with_location(location);
    }
    if let Some(description) = fields.description {
        invite = invite.with_description(description);
    }

    debug!(title = invite.title(), start = %invite.start_time(), "parsed calendar markup");
    Some(invite)
}

#[derive(Debug, Default)]
struct MarkupFields {
    summary: Option<String>,
    start: Option<String>,
    end: Option<String>,
    location: Option<String>,
    description: Option<String>,
}

impl MarkupFields {
    fn set(&mut self, name: &str, value: &str) {
        match name {
            "SUMMARY" => self.summary = non_empty(&unescape_text(value)),
            "DTSTART" => self.start = non_empty(value),
            "DTEND" => self.end = non_empty(value),
            "LOCATION" => self.location = non_empty(&unescape_text(value)),
            "DESCRIPTION" => self.description = non_empty(&unescape_text(value)),
            _ => {}
        }
    }
}

fn has_wrapper(markup: &str) -> bool {
    markup
        .lines()
        .any(|line| line.trim_start().starts_with("BEGIN:"))
}

/// Reads the first `VEVENT` of a wrapped calendar.
fn read_first_event(markup: &str) -> Option<MarkupFields> {
    let calendar = match markup.parse::<Calendar>() {
        Ok(calendar) => calendar,
        Err(e) => {
            warn!(error = %e, "failed to parse calendar markup");
            return None;
        }
    };

    let event = calendar.iter().find_map(|component| match component {
        CalendarComponent::Event(event) => Some(event),
        _ => None,
    })?;

    let mut fields = MarkupFields::default();
    for name in FIELDS {
        if let Some(value) = event.property_value(name) {
            fields.set(name, value);
        }
    }
    Some(fields)
}

/// Scans `NAME[;PARAM=...]:value` lines with no component wrapper.
///
/// Property names are matched case-sensitively at the start of a line.
fn read_bare_lines(markup: &str) -> MarkupFields {
    let mut fields = MarkupFields::default();
    for line in markup.lines() {
        let Some((head, value)) = line.trim().split_once(':') else {
            continue;
        };
        let name = head.split(';').next().unwrap_or(head);
        fields.set(name, value.trim());
    }
    fields
}

/// Reverses iCalendar TEXT escaping left in a property value.
fn unescape_text(value: &str) -> String {
    if !value.contains('\\') {
        return value.trim().to_string();
    }
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') | Some('N') => out.push('\n'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out.trim().to_string()
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Local, TimeZone, Utc};

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

    fn full_invite() -> &'static str {
        "BEGIN:VCALENDAR\r\n\
         VERSION:2.0\r\n\
         PRODID:-//Example Corp//Mailer//EN\r\n\
         METHOD:REQUEST\r\n\
         BEGIN:VTIMEZONE\r\n\
         TZID:Europe/Paris\r\n\
         BEGIN:STANDARD\r\n\
         DTSTART:19701025T030000\r\n\
         END:STANDARD\r\n\
         END:VTIMEZONE\r\n\
         BEGIN:VEVENT\r\n\
         UID:planning-42@example.com\r\n\
         SUMMARY:Quarterly Planning\r\n\
         DTSTART:20250205T100000Z\r\n\
         DTEND:20250205T113000Z\r\n\
         LOCATION:Building 2\\, Room 301\r\n\
         DESCRIPTION:Agenda:\\n1. Roadmap\\n2. Budget\r\n\
         BEGIN:VALARM\r\n\
         ACTION:DISPLAY\r\n\
         DESCRIPTION:Reminder\r\n\
         TRIGGER:-PT15M\r\n\
         END:VALARM\r\n\
         END:VEVENT\r\n\
         END:VCALENDAR\r\n"
    }

    #[test]
    fn minimal_markup() {
        let markup = "SUMMARY:Team Sync\nDTSTART:20240115T140000\nLOCATION:Room 4";
        let invite = parse_calendar_markup(markup, "", TimestampZone::Local).unwrap();

        assert_eq!(invite.title(), "Team Sync");
        assert_eq!(invite.start_time(), local(2024, 1, 15, 14, 0));
        assert_eq!(invite.location(), "Room 4");
        assert!(invite.end_time().is_none());
        assert_eq!(invite.source(), "email");
    }

    #[test]
    fn missing_start_yields_nothing() {
        let markup = "SUMMARY:Team Sync\nLOCATION:Room 4";
        assert!(parse_calendar_markup(markup, "Subject", TimestampZone::Local).is_none());
    }

    #[test]
    fn unparseable_start_yields_nothing() {
        let markup = "SUMMARY:Team Sync\nDTSTART:soon";
        assert!(parse_calendar_markup(markup, "", TimestampZone::Local).is_none());
    }

    #[test]
    fn title_falls_back_to_subject_then_placeholder() {
        let markup = "DTSTART:20240115T140000";
        let invite = parse_calendar_markup(markup, "Fwd: Design review", TimestampZone::Utc)
            .unwrap();
        assert_eq!(invite.title(), "Fwd: Design review");

        let invite = parse_calendar_markup(markup, "", TimestampZone::Utc).unwrap();
        assert_eq!(invite.title(), PLACEHOLDER_TITLE);

        let markup = "SUMMARY:\nDTSTART:20240115T140000";
        let invite = parse_calendar_markup(markup, "Subject", TimestampZone::Utc).unwrap();
        assert_eq!(invite.title(), "Subject");
    }

    #[test]
    fn full_invite_reads_only_the_event() {
        let invite = parse_calendar_markup(full_invite(), "ignored", TimestampZone::Marker)
            .unwrap();

        assert_eq!(invite.title(), "Quarterly Planning");
        assert_eq!(invite.start_time(), utc(2025, 2, 5, 10, 0));
        assert_eq!(invite.end_time(), Some(utc(2025, 2, 5, 11, 30)));
        assert_eq!(invite.location(), "Building 2, Room 301");
        assert_eq!(invite.description(), Some("Agenda:\n1. Roadmap\n2. Budget"));
    }

    #[test]
    fn only_first_event_is_used() {
        let markup = "BEGIN:VCALENDAR\n\
                      BEGIN:VEVENT\n\
                      SUMMARY:First\n\
                      DTSTART:20240301T090000\n\
                      END:VEVENT\n\
                      BEGIN:VEVENT\n\
                      SUMMARY:Second\n\
                      DTSTART:20240302T090000\n\
                      END:VEVENT\n\
                      END:VCALENDAR";
        let invite = parse_calendar_markup(markup, "", TimestampZone::Utc).unwrap();
        assert_eq!(invite.title(), "First");
        assert_eq!(invite.start_time(), utc(2024, 3, 1, 9, 0));
    }

    #[test]
    fn parameters_are_ignored() {
        let markup = "SUMMARY;LANGUAGE=en-US:Standup\n\
                      DTSTART;TZID=\"America/New_York\":20240115T090000\n\
                      DTEND;TZID=America/New_York:20240115T091500";
        let invite = parse_calendar_markup(markup, "", TimestampZone::Utc).unwrap();
        assert_eq!(invite.title(), "Standup");
        assert_eq!(invite.start_time(), utc(2024, 1, 15, 9, 0));
        assert_eq!(invite.end_time(), Some(utc(2024, 1, 15, 9, 15)));
    }

    #[test]
    fn all_day_event() {
        let markup = "SUMMARY:Company Holiday\nDTSTART;VALUE=DATE:20250210";
        let invite = parse_calendar_markup(markup, "", TimestampZone::Utc).unwrap();
        assert_eq!(invite.start_time(), utc(2025, 2, 10, 0, 0));
    }

    #[test]
    fn folded_lines_are_joined() {
        let markup = "BEGIN:VCALENDAR\r\n\
                      BEGIN:VEVENT\r\n\
                      SUMMARY:Architecture review for the new\r\n  ingestion pipeline\r\n\
                      DTSTART:20240115T140000Z\r\n\
                      END:VEVENT\r\n\
                      END:VCALENDAR\r\n";
        let invite = parse_calendar_markup(markup, "", TimestampZone::Utc).unwrap();
        assert_eq!(
            invite.title(),
            "Architecture review for the new ingestion pipeline"
        );
        assert_eq!(invite.start_time(), utc(2024, 1, 15, 14, 0));
    }

    #[test]
    fn wrapped_event_parameters_are_ignored() {
        let markup = "BEGIN:VCALENDAR\n\
                      BEGIN:VEVENT\n\
                      SUMMARY:Standup\n\
                      DTSTART;TZID=Europe/Paris:20240115T090000\n\
                      DTEND;VALUE=DATE:20240116\n\
                      END:VEVENT\n\
                      END:VCALENDAR\n";
        let invite = parse_calendar_markup(markup, "", TimestampZone::Utc).unwrap();
        assert_eq!(invite.start_time(), utc(2024, 1, 15, 9, 0));
        assert_eq!(invite.end_time(), Some(utc(2024, 1, 16, 0, 0)));
    }

    #[test]
    fn calendar_without_event_yields_nothing() {
        let markup = "BEGIN:VCALENDAR\n\
                      BEGIN:VTODO\n\
                      SUMMARY:File taxes\n\
                      DTSTART:20240415T090000\n\
                      END:VTODO\n\
                      END:VCALENDAR\n";
        assert!(parse_calendar_markup(markup, "Subject", TimestampZone::Utc).is_none());
    }

    #[test]
    fn property_names_are_case_sensitive() {
        let markup = "summary:lowercase\nDTSTART:20240115T140000";
        let invite = parse_calendar_markup(markup, "Subject", TimestampZone::Utc).unwrap();
        assert_eq!(invite.title(), "Subject");
    }

    #[test]
    fn invalid_end_is_dropped() {
        let markup = "SUMMARY:Sync\nDTSTART:20240115T140000\nDTEND:later";
        let invite = parse_calendar_markup(markup, "", TimestampZone::Utc).unwrap();
        assert!(invite.end_time().is_none());
    }

    #[test]
    fn bare_lines_split_at_first_colon() {
        let markup = "DTSTART:20240115T140000\nDESCRIPTION:Agenda: roadmap\\, budget";
        let invite = parse_calendar_markup(markup, "", TimestampZone::Utc).unwrap();
        assert_eq!(invite.description(), Some("Agenda: roadmap, budget"));
    }
}
