//! Fixed blocks ("routines"): immovable intervals on the day's timeline.

use serde::{Deserialize, Serialize};

use crate::error::{PlanError, Result};
use crate::time::MINUTES_PER_DAY;

/// Repetition hint carried with a routine. Accepted, never interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Custom(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedBlock {
    id: Option<String>,
    name: String,
    /// Minute of day, `[0, 1440)`.
    start: i32,
    /// Minute of day, `(start, 1440]`.
    finish: i32,
    frequency: Option<Frequency>,
}

impl FixedBlock {
    /// Build a block; bounds must satisfy `0 <= start < finish <= 1440`.
    pub fn new(name: impl Into<String>, start: i32, finish: i32) -> Result<Self> {
        let name = name.into();
        if !(0..MINUTES_PER_DAY).contains(&start) || finish <= start || finish > MINUTES_PER_DAY {
            return Err(PlanError::InvalidBlock {
                name,
                start,
                finish,
            });
        }
        Ok(Self {
            id: None,
            name,
            start,
            finish,
            frequency: None,
        })
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_frequency(mut self, frequency: Frequency) -> Self {
        self.frequency = Some(frequency);
        self
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn start(&self) -> i32 {
        self.start
    }

    pub fn finish(&self) -> i32 {
        self.finish
    }

    pub fn frequency(&self) -> Option<&Frequency> {
        self.frequency.as_ref()
    }

    /// `minute` lies in `[start, finish)`.
    pub fn contains(&self, minute: i32) -> bool {
        self.start <= minute && minute < self.finish
    }

    /// `other` starts strictly inside this block's span.
    pub fn starts_inside(&self, other: &FixedBlock) -> bool {
        self.start < other.start && other.start < self.finish
    }

    /// Insertion conflict: either block's start lies strictly inside the other.
    ///
    /// This is not a general overlap test. Two blocks sharing the same start,
    /// e.g. `[540, 600)` and `[540, 660)`, do not conflict under it.
    pub fn conflicts_with(&self, other: &FixedBlock) -> bool {
        self.starts_inside(other) || other.starts_inside(self)
    }
}
