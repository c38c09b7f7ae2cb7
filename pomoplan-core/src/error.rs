//! Error types for pomoplan-core.
//!
//! Only malformed input at the request boundary is an error. A conflicting
//! fixed block is reported through [`crate::day::ScheduleConflict`] and a task
//! that does not fit before day-end through [`crate::scheduler::Shortfall`].

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    /// Fixed block bounds outside the day or not strictly increasing.
    #[error("invalid fixed block '{name}': start={start} finish={finish}")]
    InvalidBlock {
        name: String,
        start: i32,
        finish: i32,
    },

    /// Pomodoro quantum that could never advance the cursor.
    #[error("invalid pomodoro: work={work_minutes} break={break_minutes} (work must be 1..=1440, break 0..=1440)")]
    InvalidPomodoro {
        work_minutes: i32,
        break_minutes: i32,
    },

    /// Wall-clock string that is not `HH:MM`.
    #[error("invalid clock time '{0}', expected HH:MM")]
    InvalidClock(String),

    /// Task record whose type is neither `routine` nor `event`.
    #[error("task '{id}' has unsupported type '{kind}'")]
    UnknownTaskType { id: String, kind: String },
}

pub type Result<T> = std::result::Result<T, PlanError>;
