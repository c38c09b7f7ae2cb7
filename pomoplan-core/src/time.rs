//! Time utilities: minute-of-day offsets, `HH:MM` rendering and the injected "now".

use chrono::{Timelike, Utc};
use chrono_tz::Tz;

use crate::entry::ScheduleEntry;
use crate::error::{PlanError, Result};

/// Minutes in one day. Offsets are never day-aware past this bound.
pub const MINUTES_PER_DAY: i32 = 1440;

/// Sort key for entries that carry no start time; greater than any `HH:MM`.
const MISSING_START_SENTINEL: &str = "99:99";

/// Render a minute offset as zero-padded `HH:MM`.
///
/// The hour wraps modulo 24 without a day component, so `1440` renders as
/// `"00:00"` and `1500` as `"01:00"`.
pub fn to_clock_string(minutes: i32) -> String {
    let hour = minutes.div_euclid(60).rem_euclid(24);
    let minute = minutes.rem_euclid(60);
    format!("{hour:02}:{minute:02}")
}

/// Parse `HH:MM` into a minute offset. `"24:00"` is accepted as end of day.
pub fn parse_clock_string(s: &str) -> Result<i32> {
    let invalid = || PlanError::InvalidClock(s.to_string());

    let (h, m) = s.trim().split_once(':').ok_or_else(invalid)?;
    let hour: i32 = h.parse().map_err(|_| invalid())?;
    let minute: i32 = m.parse().map_err(|_| invalid())?;

    if !(0..=59).contains(&minute) || !(0..=24).contains(&hour) {
        return Err(invalid());
    }
    let total = hour * 60 + minute;
    if total > MINUTES_PER_DAY {
        return Err(invalid());
    }
    Ok(total)
}

/// Stable sort by formatted start time; entries without one sort last.
///
/// Zero-padded `HH:MM` strings order lexicographically the same way they
/// order chronologically within a single day.
pub fn sort_entries(entries: &mut [ScheduleEntry]) {
    entries.sort_by(|a, b| {
        let ka = a.start_time.as_deref().unwrap_or(MISSING_START_SENTINEL);
        let kb = b.start_time.as_deref().unwrap_or(MISSING_START_SENTINEL);
        ka.cmp(kb)
    });
}

/// Source of the current wall-clock minute for "today" planning runs.
pub trait ClockProvider {
    /// Minutes elapsed since local midnight, in `[0, 1440)`.
    fn minutes_since_midnight(&self) -> i32;
}

/// Always reports the same minute. Used by tests and replayed requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub i32);

impl ClockProvider for FixedClock {
    fn minutes_since_midnight(&self) -> i32 {
        self.0
    }
}

/// Reads the system clock in a configured IANA timezone.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    tz: Tz,
}

impl SystemClock {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    /// Parse an IANA name like `"America/Chicago"`.
    pub fn from_tz_name(name: &str) -> Option<Self> {
        name.parse::<Tz>().ok().map(Self::new)
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new(Tz::UTC)
    }
}

impl ClockProvider for SystemClock {
    fn minutes_since_midnight(&self) -> i32 {
        let local = Utc::now().with_timezone(&self.tz);
        (local.hour() * 60 + local.minute()) as i32
    }
}

impl<C: ClockProvider + ?Sized> ClockProvider for &C {
    fn minutes_since_midnight(&self) -> i32 {
        (**self).minutes_since_midnight()
    }
}
