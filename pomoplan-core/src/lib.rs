//! pomoplan-core: single-day planning with fixed routines and pomodoro-paced tasks.
//!
//! Flow per request: task records are classified into fixed blocks and
//! flexible tasks on a fresh [`Day`], the [`Scheduler`] lays them out in
//! minute offsets, and the result is rendered as sorted `HH:MM` entries.

pub mod day;
pub mod entry;
pub mod error;
pub mod event;
pub mod request;
pub mod routine;
pub mod scheduler;
pub mod time;

pub use day::{AddOutcome, Day, DayItem, ScheduleConflict};
pub use entry::{EntryKind, RawEntry, ScheduleEntry};
pub use error::PlanError;
pub use event::{normalize_duration, round_to_nearest_5, FlexibleTask};
pub use request::{plan, plan_with, ClockValue, InvalidRecord, PlanOutcome, PlanRequest, TaskRecord};
pub use routine::{FixedBlock, Frequency};
pub use scheduler::{Pomodoro, ScheduleRun, Scheduler, Shortfall, DEFAULT_DAY_START};
pub use time::{
    parse_clock_string, sort_entries, to_clock_string, ClockProvider, FixedClock, SystemClock,
    MINUTES_PER_DAY,
};
