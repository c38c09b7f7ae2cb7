//! Day container: the fixed blocks and flexible queue for one planning run.
//!
//! A `Day` is built fresh per request and dropped once the scheduler has run.

use serde::{Deserialize, Serialize};

use crate::event::FlexibleTask;
use crate::routine::FixedBlock;

/// Everything a day can hold. Classification happens before insertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DayItem {
    Fixed(FixedBlock),
    Flexible(FlexibleTask),
}

impl From<FixedBlock> for DayItem {
    fn from(b: FixedBlock) -> Self {
        DayItem::Fixed(b)
    }
}

impl From<FlexibleTask> for DayItem {
    fn from(t: FlexibleTask) -> Self {
        DayItem::Flexible(t)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddOutcome {
    /// Flexible task appended to the queue.
    Queued,
    /// Fixed block accepted onto the timeline.
    Scheduled,
}

/// A fixed block refused because it collides with one already on the day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleConflict {
    pub rejected: FixedBlock,
    pub existing: FixedBlock,
}

impl std::fmt::Display for ScheduleConflict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "'{}' [{}, {}) overlaps '{}' [{}, {})",
            self.rejected.name(),
            self.rejected.start(),
            self.rejected.finish(),
            self.existing.name(),
            self.existing.start(),
            self.existing.finish()
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Day {
    date: String,
    fixed: Vec<FixedBlock>,
    flexible: Vec<FlexibleTask>,
}

impl Day {
    pub fn new(date: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            ..Self::default()
        }
    }

    pub fn date(&self) -> &str {
        &self.date
    }

    /// Insert an item. Only fixed blocks can be refused; the day is untouched then.
    pub fn add(&mut self, item: impl Into<DayItem>) -> Result<AddOutcome, ScheduleConflict> {
        match item.into() {
            DayItem::Flexible(task) => {
                self.flexible.push(task);
                Ok(AddOutcome::Queued)
            }
            DayItem::Fixed(block) => {
                if let Some(existing) = self.fixed.iter().find(|a| a.conflicts_with(&block)) {
                    return Err(ScheduleConflict {
                        existing: existing.clone(),
                        rejected: block,
                    });
                }
                self.fixed.push(block);
                Ok(AddOutcome::Scheduled)
            }
        }
    }

    pub fn add_flexible(&mut self, task: FlexibleTask) {
        self.flexible.push(task);
    }

    pub fn add_fixed(&mut self, block: FixedBlock) -> Result<(), ScheduleConflict> {
        self.add(block).map(|_| ())
    }

    /// Blocks in insertion order.
    pub fn fixed_blocks(&self) -> &[FixedBlock] {
        &self.fixed
    }

    /// Flexible tasks in insertion order.
    pub fn flexible_queue(&self) -> &[FlexibleTask] {
        &self.flexible
    }

    /// Blocks ordered by start (stable).
    pub fn sorted_fixed(&self) -> Vec<&FixedBlock> {
        let mut v: Vec<&FixedBlock> = self.fixed.iter().collect();
        v.sort_by_key(|b| b.start());
        v
    }

    /// Tasks ordered by priority; ties keep insertion order.
    pub fn sorted_flexible(&self) -> Vec<&FlexibleTask> {
        let mut v: Vec<&FlexibleTask> = self.flexible.iter().collect();
        v.sort_by_key(|t| t.priority());
        v
    }
}
