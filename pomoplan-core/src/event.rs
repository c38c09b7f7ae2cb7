//! Flexible tasks ("events"): priority-ordered work placed by the scheduler.

use serde::{Deserialize, Serialize};

/// Durations are never shorter than this many minutes.
pub const MIN_DURATION_MINUTES: i32 = 30;

/// Round to the nearest multiple of 5 minutes.
///
/// Uses `f64::round`, i.e. half away from zero. Integer input never lands
/// exactly on a half (x / 5 has no `.5` fraction), so the rule only matters for
/// callers that feed fractional minutes through [`round_to_nearest_5_f64`].
pub fn round_to_nearest_5(minutes: i32) -> i32 {
    round_to_nearest_5_f64(minutes as f64)
}

/// Fractional variant of [`round_to_nearest_5`] with the same rounding rule.
pub fn round_to_nearest_5_f64(minutes: f64) -> i32 {
    ((minutes / 5.0).round() * 5.0) as i32
}

/// Floor at 30 minutes, then round to 5.
pub fn normalize_duration(requested: i32) -> i32 {
    round_to_nearest_5(requested.max(MIN_DURATION_MINUTES))
}

/// A unit of flexible work.
///
/// The normalized duration is computed once in [`FlexibleTask::new`]; fields
/// are private so it cannot drift afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlexibleTask {
    id: Option<String>,
    name: String,
    /// Lower value = more urgent.
    priority: i32,
    requested_duration: i32,
    normalized_duration: i32,
    /// Decides the pomodoro marker; defaults to the normalized duration.
    original_duration: i32,
}

impl FlexibleTask {
    pub fn new(name: impl Into<String>, priority: i32, requested_duration: i32) -> Self {
        let normalized = normalize_duration(requested_duration);
        Self {
            id: None,
            name: name.into(),
            priority,
            requested_duration,
            normalized_duration: normalized,
            original_duration: normalized,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_original_duration(mut self, minutes: i32) -> Self {
        self.original_duration = minutes;
        self
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn requested_duration(&self) -> i32 {
        self.requested_duration
    }

    pub fn normalized_duration(&self) -> i32 {
        self.normalized_duration
    }

    pub fn original_duration(&self) -> i32 {
        self.original_duration
    }

    /// True when the task needs more than one work quantum.
    pub fn spans_multiple_quanta(&self, work_minutes: i32) -> bool {
        self.original_duration > work_minutes
    }
}
