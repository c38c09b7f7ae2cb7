//! Greedy day scheduler: fixed blocks stay put, flexible tasks fill the gaps
//! in pomodoro-sized slots.
//!
//! The cursor only ever moves forward. Every loop iteration either advances
//! it, consumes remaining task minutes, or stops the task, and the cursor is
//! bounded by the end of the day, so a run always terminates.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::day::Day;
use crate::entry::{EntryKind, RawEntry};
use crate::error::{PlanError, Result};
use crate::event::FlexibleTask;
use crate::routine::FixedBlock;
use crate::time::{ClockProvider, MINUTES_PER_DAY};

/// Where the cursor starts when planning a day other than today (08:00).
pub const DEFAULT_DAY_START: i32 = 480;

/// Label suffix for slots of tasks longer than one work quantum.
pub const POMODORO_MARKER: &str = " (Pomodoro)";

/// Work/break cadence for flexible tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pomodoro {
    work_minutes: i32,
    break_minutes: i32,
}

impl Pomodoro {
    pub fn new(work_minutes: i32, break_minutes: i32) -> Result<Self> {
        if !(1..=MINUTES_PER_DAY).contains(&work_minutes)
            || !(0..=MINUTES_PER_DAY).contains(&break_minutes)
        {
            return Err(PlanError::InvalidPomodoro {
                work_minutes,
                break_minutes,
            });
        }
        Ok(Self {
            work_minutes,
            break_minutes,
        })
    }

    pub fn work_minutes(&self) -> i32 {
        self.work_minutes
    }

    pub fn break_minutes(&self) -> i32 {
        self.break_minutes
    }
}

impl Default for Pomodoro {
    fn default() -> Self {
        Self {
            work_minutes: 25,
            break_minutes: 5,
        }
    }
}

/// Minutes of a flexible task that did not fit before the end of the day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shortfall {
    pub task_id: Option<String>,
    pub name: String,
    /// Normalized duration the task asked for.
    pub requested: i32,
    pub placed: i32,
    pub unplaced: i32,
}

/// Output of one scheduler run, in production order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleRun {
    /// Routine entries first (by start), then auto slots per task.
    pub entries: Vec<RawEntry>,
    pub shortfalls: Vec<Shortfall>,
}

impl ScheduleRun {
    pub fn auto_slots(&self) -> impl Iterator<Item = &RawEntry> {
        self.entries.iter().filter(|e| e.is_auto)
    }

    /// Total minutes placed for a given flexible task id.
    pub fn placed_minutes(&self, task_id: &str) -> i32 {
        self.auto_slots()
            .filter(|e| e.task_id.as_deref() == Some(task_id))
            .map(RawEntry::duration)
            .sum()
    }
}

#[derive(Debug, Clone)]
pub struct Scheduler<C: ClockProvider> {
    clock: C,
    default_start: i32,
}

impl<C: ClockProvider> Scheduler<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            default_start: DEFAULT_DAY_START,
        }
    }

    /// Override the start-of-day cursor used when `is_today` is false.
    pub fn with_default_start(mut self, minutes: i32) -> Self {
        self.default_start = minutes;
        self
    }

    /// Lay out `day`. Only reads the clock when `is_today` is set.
    pub fn run(&self, pomodoro: Pomodoro, day: &Day, is_today: bool) -> ScheduleRun {
        let blocks = day.sorted_fixed();
        let tasks = day.sorted_flexible();

        let mut cursor = if is_today {
            self.clock.minutes_since_midnight()
        } else {
            self.default_start
        };
        debug!(cursor, is_today, blocks = blocks.len(), tasks = tasks.len(), "scheduler start");

        let mut run = ScheduleRun::default();

        for b in &blocks {
            run.entries.push(routine_entry(b));
        }

        for task in tasks {
            let placed = place_task(task, &blocks, pomodoro, &mut cursor, &mut run.entries);
            let requested = task.normalized_duration();
            if placed < requested {
                warn!(
                    task = task.name(),
                    requested,
                    placed,
                    "flexible task did not fit before end of day"
                );
                run.shortfalls.push(Shortfall {
                    task_id: task.id().map(str::to_string),
                    name: task.name().to_string(),
                    requested,
                    placed,
                    unplaced: requested - placed,
                });
            }
        }

        run
    }
}

fn routine_entry(b: &FixedBlock) -> RawEntry {
    RawEntry {
        id: b
            .id()
            .map(str::to_string)
            .unwrap_or_else(|| format!("routine-{}", b.start())),
        text: b.name().to_string(),
        kind: EntryKind::Routine,
        start: b.start(),
        end: b.finish(),
        is_auto: false,
        task_id: None,
    }
}

/// Place one task starting at `cursor`; returns minutes placed.
fn place_task(
    task: &FlexibleTask,
    blocks: &[&FixedBlock],
    pomodoro: Pomodoro,
    cursor: &mut i32,
    out: &mut Vec<RawEntry>,
) -> i32 {
    let work = pomodoro.work_minutes();
    let mut remaining = task.normalized_duration();

    while remaining > 0 && *cursor < MINUTES_PER_DAY {
        if let Some(b) = blocks.iter().find(|b| b.contains(*cursor)) {
            debug!(from = *cursor, to = b.finish(), block = b.name(), "cursor inside block");
            *cursor = b.finish();
            continue;
        }

        let next = blocks.iter().find(|b| b.start() >= *cursor);
        let gap = match next {
            Some(b) => b.start() - *cursor,
            None => MINUTES_PER_DAY - *cursor,
        };

        if gap < work {
            match next {
                Some(b) => {
                    debug!(from = *cursor, to = b.finish(), gap, "gap too short, jumping past block");
                    *cursor = b.finish();
                    continue;
                }
                None => break,
            }
        }

        let slot = work.min(remaining);
        let mut text = task.name().to_string();
        if task.spans_multiple_quanta(work) {
            text.push_str(POMODORO_MARKER);
        }
        debug!(task = task.name(), start = *cursor, minutes = slot, "placed slot");
        out.push(RawEntry {
            id: format!("auto-{}", *cursor),
            text,
            kind: EntryKind::Event,
            start: *cursor,
            end: *cursor + slot,
            is_auto: true,
            task_id: task.id().map(str::to_string),
        });

        remaining -= slot;
        *cursor += slot + pomodoro.break_minutes();
    }

    task.normalized_duration() - remaining
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::FixedClock;

    fn block(name: &str, start: i32, finish: i32) -> FixedBlock {
        FixedBlock::new(name, start, finish).unwrap()
    }

    fn spans(run: &ScheduleRun) -> Vec<(i32, i32)> {
        run.auto_slots().map(|e| (e.start, e.end)).collect()
    }

    #[test]
    fn test_pomodoro_validation() {
        assert!(Pomodoro::new(25, 5).is_ok());
        assert!(Pomodoro::new(1, 0).is_ok());
        assert!(Pomodoro::new(0, 0).is_err());
        assert!(Pomodoro::new(25, -1).is_err());
        assert!(Pomodoro::new(MINUTES_PER_DAY, MINUTES_PER_DAY).is_ok());
        assert!(Pomodoro::new(MINUTES_PER_DAY + 1, 5).is_err());
        assert!(Pomodoro::new(25, i32::MAX).is_err());
        assert!(Pomodoro::new(i32::MAX, 0).is_err());
        assert_eq!(Pomodoro::default(), Pomodoro::new(25, 5).unwrap());
    }

    #[test]
    fn test_day_long_break_ends_the_task() {
        let mut day = Day::new("d");
        day.add_flexible(FlexibleTask::new("Essay", 1, 60).with_id("e"));
        let pomo = Pomodoro::new(25, MINUTES_PER_DAY).unwrap();
        let run = Scheduler::new(FixedClock(1439)).run(pomo, &day, true);

        // no room for a 25-minute slot at 23:59
        assert!(spans(&run).is_empty());
        assert_eq!(run.shortfalls[0].unplaced, 60);

        let run = Scheduler::new(FixedClock(0)).run(pomo, &day, false);
        assert_eq!(spans(&run), vec![(480, 505)]);
        assert_eq!(run.shortfalls[0].unplaced, 35);
    }

    #[test]
    fn test_fixed_only_day_emits_routines() {
        let mut day = Day::new("d");
        day.add_fixed(block("lunch", 720, 780).with_id("r-lunch")).unwrap();
        day.add_fixed(block("gym", 420, 480)).unwrap();

        let run = Scheduler::new(FixedClock(0)).run(Pomodoro::default(), &day, false);
        assert_eq!(run.entries.len(), 2);
        assert!(run.entries.iter().all(|e| e.kind == EntryKind::Routine && !e.is_auto));
        assert_eq!(run.entries[0].id, "routine-420");
        assert_eq!(run.entries[1].id, "r-lunch");
        assert!(run.shortfalls.is_empty());
    }

    #[test]
    fn test_slots_split_with_breaks() {
        let mut day = Day::new("d");
        day.add_flexible(FlexibleTask::new("Essay", 1, 65).with_id("t1"));

        let pomo = Pomodoro::new(30, 10).unwrap();
        let run = Scheduler::new(FixedClock(0)).run(pomo, &day, false);

        assert_eq!(spans(&run), vec![(480, 510), (520, 550), (560, 565)]);
        assert!(run.auto_slots().all(|e| e.text == "Essay (Pomodoro)"));
        assert_eq!(run.entries[0].id, "auto-480");
        assert_eq!(run.placed_minutes("t1"), 65);
    }

    #[test]
    fn test_single_quantum_task_has_no_marker() {
        let mut day = Day::new("d");
        day.add_flexible(FlexibleTask::new("Email", 1, 30));
        let run = Scheduler::new(FixedClock(0)).run(Pomodoro::new(30, 5).unwrap(), &day, false);
        assert_eq!(spans(&run), vec![(480, 510)]);
        assert_eq!(run.entries[0].text, "Email");
    }

    #[test]
    fn test_cursor_skips_over_block_it_lands_in() {
        let mut day = Day::new("d");
        day.add_fixed(block("meeting", 470, 500)).unwrap();
        day.add_flexible(FlexibleTask::new("Read", 1, 30));
        let run = Scheduler::new(FixedClock(0)).run(Pomodoro::new(30, 0).unwrap(), &day, false);
        assert_eq!(spans(&run), vec![(500, 530)]);
    }

    #[test]
    fn test_short_gap_jumps_past_next_block() {
        let mut day = Day::new("d");
        // 20-minute gap before the block, shorter than one work quantum
        day.add_fixed(block("standup", 500, 515)).unwrap();
        day.add_flexible(FlexibleTask::new("Code", 1, 30));
        let run = Scheduler::new(FixedClock(0)).run(Pomodoro::new(25, 5).unwrap(), &day, false);
        assert_eq!(spans(&run), vec![(515, 540), (545, 550)]);
    }

    #[test]
    fn test_priority_order_with_stable_ties() {
        let mut day = Day::new("d");
        day.add_flexible(FlexibleTask::new("second", 5, 30).with_id("b"));
        day.add_flexible(FlexibleTask::new("first", 1, 30).with_id("a"));
        day.add_flexible(FlexibleTask::new("third", 5, 30).with_id("c"));
        let run = Scheduler::new(FixedClock(0)).run(Pomodoro::new(30, 0).unwrap(), &day, false);
        let order: Vec<&str> = run.auto_slots().filter_map(|e| e.task_id.as_deref()).collect();
        assert_eq!(order, vec!["a", "b", "c"]);
        assert_eq!(spans(&run), vec![(480, 510), (510, 540), (540, 570)]);
    }

    #[test]
    fn test_today_reads_injected_clock() {
        let mut day = Day::new("d");
        day.add_flexible(FlexibleTask::new("Late", 1, 30));
        let run = Scheduler::new(FixedClock(1000)).run(Pomodoro::new(30, 5).unwrap(), &day, true);
        assert_eq!(spans(&run), vec![(1000, 1030)]);
    }

    #[test]
    fn test_default_start_override() {
        let mut day = Day::new("d");
        day.add_flexible(FlexibleTask::new("Early", 1, 30));
        let run = Scheduler::new(FixedClock(0))
            .with_default_start(360)
            .run(Pomodoro::new(30, 5).unwrap(), &day, false);
        assert_eq!(spans(&run), vec![(360, 390)]);
    }

    #[test]
    fn test_end_of_day_shortfall_is_reported() {
        let mut day = Day::new("d");
        day.add_flexible(FlexibleTask::new("Night", 1, 90).with_id("n"));
        let run = Scheduler::new(FixedClock(1380)).run(Pomodoro::new(25, 5).unwrap(), &day, true);

        // 1380..1405, 1410..1435, then the cursor hits 1440 with 40 minutes left
        assert_eq!(spans(&run), vec![(1380, 1405), (1410, 1435)]);
        assert_eq!(
            run.shortfalls,
            vec![Shortfall {
                task_id: Some("n".to_string()),
                name: "Night".to_string(),
                requested: 90,
                placed: 50,
                unplaced: 40,
            }]
        );
    }

    #[test]
    fn test_block_at_end_of_day_stops_placement() {
        let mut day = Day::new("d");
        day.add_fixed(block("sleep", 1320, 1440)).unwrap();
        day.add_flexible(FlexibleTask::new("Chores", 1, 30));
        let run = Scheduler::new(FixedClock(1300)).run(Pomodoro::new(25, 5).unwrap(), &day, true);
        assert_eq!(spans(&run).len(), 0);
        assert_eq!(run.shortfalls.len(), 1);
        assert_eq!(run.shortfalls[0].unplaced, 30);
    }
}
