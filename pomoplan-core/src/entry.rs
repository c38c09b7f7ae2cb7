//! Schedule entries: minute offsets from the scheduler, clock strings on the wire.

use serde::{Deserialize, Serialize};

use crate::time::to_clock_string;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Routine,
    Event,
}

/// Scheduler output before formatting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    pub id: String,
    pub text: String,
    pub kind: EntryKind,
    pub start: i32,
    pub end: i32,
    pub is_auto: bool,
    /// Id of the flexible task an auto slot belongs to.
    pub task_id: Option<String>,
}

impl RawEntry {
    pub fn duration(&self) -> i32 {
        self.end - self.start
    }

    pub fn format(&self) -> ScheduleEntry {
        ScheduleEntry {
            id: self.id.clone(),
            text: self.text.clone(),
            kind: self.kind,
            start_time: Some(to_clock_string(self.start)),
            end_time: Some(to_clock_string(self.end)),
            is_auto: self.is_auto,
            task_id: self.task_id.clone(),
        }
    }
}

/// A formatted entry as returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEntry {
    pub id: String,
    pub text: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    #[serde(default)]
    pub is_auto: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
}
