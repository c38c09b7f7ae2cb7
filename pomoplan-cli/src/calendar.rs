use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use pomoplan_core::{parse_clock_string, EntryKind, ScheduleEntry};

pub struct CalendarEvent {
    pub uid: String,
    pub start_utc: DateTime<Utc>,
    pub end_utc: DateTime<Utc>,
    pub summary: String,
    pub description: String,
}

fn local_to_utc(date: NaiveDate, minutes: i32, tz: Tz) -> Result<DateTime<Utc>> {
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| anyhow!("no midnight on {date}"))?;
    let ndt = midnight + Duration::minutes(minutes.into());
    let local = tz
        .from_local_datetime(&ndt)
        .single()
        .ok_or_else(|| anyhow!("ambiguous or invalid local time (DST?): {ndt} {tz}"))?;
    Ok(local.with_timezone(&Utc))
}

/// Pin a formatted schedule onto a calendar date.
///
/// An end clock earlier than or equal to its start rolls into the next day,
/// which is how a block ending at midnight comes back (`"00:00"`).
pub fn schedule_to_events(
    entries: &[ScheduleEntry],
    date: NaiveDate,
    tz: Tz,
) -> Result<Vec<CalendarEvent>> {
    let mut events = Vec::new();

    for e in entries {
        let (Some(start), Some(end)) = (e.start_time.as_deref(), e.end_time.as_deref()) else {
            continue;
        };
        let start_min = parse_clock_string(start).with_context(|| format!("entry {}", e.id))?;
        let mut end_min = parse_clock_string(end).with_context(|| format!("entry {}", e.id))?;
        if end_min <= start_min {
            end_min += 24 * 60;
        }

        let kind = match e.kind {
            EntryKind::Routine => "routine",
            EntryKind::Event => "event",
        };

        events.push(CalendarEvent {
            uid: format!("{}-{}@pomoplan", date.format("%Y%m%d"), e.id),
            start_utc: local_to_utc(date, start_min, tz)?,
            end_utc: local_to_utc(date, end_min, tz)?,
            summary: e.text.clone(),
            description: format!("Type: {}\nAuto: {}\n", kind, e.is_auto),
        });
    }

    Ok(events)
}

/// Emit a minimal ICS calendar containing VEVENT blocks (UTC times).
pub fn events_to_ics(events: &[CalendarEvent]) -> String {
    let mut s = String::new();
    s.push_str("BEGIN:VCALENDAR\nVERSION:2.0\nPRODID:-//Pomoplan//EN\n");

    for e in events {
        let dtstart = e.start_utc.format("%Y%m%dT%H%M%SZ");
        let dtend = e.end_utc.format("%Y%m%dT%H%M%SZ");

        s.push_str("BEGIN:VEVENT\n");
        s.push_str(&format!("UID:{}\n", e.uid));
        s.push_str(&format!("DTSTART:{}\n", dtstart));
        s.push_str(&format!("DTEND:{}\n", dtend));
        s.push_str(&format!("SUMMARY:{}\n", escape_ics(&e.summary)));
        s.push_str(&format!("DESCRIPTION:{}\n", escape_ics(&e.description)));
        s.push_str("END:VEVENT\n");
    }

    s.push_str("END:VCALENDAR\n");
    s
}

/// Render a formatted schedule for `date` in `tz` as an ICS document.
pub fn schedule_to_ics(entries: &[ScheduleEntry], date: NaiveDate, tz: Tz) -> Result<String> {
    Ok(events_to_ics(&schedule_to_events(entries, date, tz)?))
}

fn escape_ics(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('\n', "\\n")
        .replace(',', "\\,")
        .replace(';', "\\;")
}
