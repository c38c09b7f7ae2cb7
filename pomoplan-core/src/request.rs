//! Request boundary: decode task records, classify them onto a fresh day,
//! run the scheduler and return a formatted, sorted schedule.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::day::{Day, DayItem, ScheduleConflict};
use crate::entry::{RawEntry, ScheduleEntry};
use crate::error::{PlanError, Result};
use crate::event::FlexibleTask;
use crate::routine::FixedBlock;
use crate::scheduler::{Pomodoro, Scheduler, Shortfall};
use crate::time::{parse_clock_string, sort_entries, ClockProvider};

pub const DEFAULT_PRIORITY: i32 = 5;
pub const DEFAULT_DURATION_MINUTES: i32 = 60;

/// A time on the wire: minute offset or `"HH:MM"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClockValue {
    Minutes(i32),
    Clock(String),
}

impl ClockValue {
    pub fn minutes(&self) -> Result<i32> {
        match self {
            ClockValue::Minutes(m) => Ok(*m),
            ClockValue::Clock(s) => parse_clock_string(s),
        }
    }
}

impl From<i32> for ClockValue {
    fn from(m: i32) -> Self {
        ClockValue::Minutes(m)
    }
}

/// Raw task as stored and exchanged by callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    pub id: String,
    pub text: String,
    /// `"routine"` or `"event"`.
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<ClockValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<ClockValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
    /// `"manual"` pins an event to its own start/end like a routine.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_mode: Option<String>,
    #[serde(default)]
    pub unplaced: bool,
}

impl TaskRecord {
    pub fn routine(id: impl Into<String>, text: impl Into<String>, start: i32, end: i32) -> Self {
        Self {
            start_time: Some(start.into()),
            end_time: Some(end.into()),
            ..Self::bare(id, text, "routine")
        }
    }

    pub fn event(id: impl Into<String>, text: impl Into<String>, priority: i32, duration: i32) -> Self {
        Self {
            priority: Some(priority),
            duration: Some(duration),
            ..Self::bare(id, text, "event")
        }
    }

    fn bare(id: impl Into<String>, text: impl Into<String>, kind: &str) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            kind: kind.to_string(),
            start_time: None,
            end_time: None,
            duration: None,
            priority: None,
            event_mode: None,
            unplaced: false,
        }
    }

    fn is_pinned(&self) -> bool {
        match self.kind.as_str() {
            "routine" => true,
            "event" => self.event_mode.as_deref() == Some("manual"),
            _ => false,
        }
    }

    /// Turn a record into a day item.
    ///
    /// Routines and manual events become fixed blocks (missing bounds read as
    /// 0, then validated); other events become flexible tasks with priority 5
    /// and 60 minutes unless given.
    pub fn classify(&self) -> Result<DayItem> {
        if self.is_pinned() {
            let start = self.start_time.as_ref().map(ClockValue::minutes).transpose()?.unwrap_or(0);
            let finish = self.end_time.as_ref().map(ClockValue::minutes).transpose()?.unwrap_or(0);
            let block = FixedBlock::new(self.text.clone(), start, finish)?.with_id(self.id.clone());
            return Ok(DayItem::Fixed(block));
        }

        if self.kind != "event" {
            return Err(PlanError::UnknownTaskType {
                id: self.id.clone(),
                kind: self.kind.clone(),
            });
        }

        let task = FlexibleTask::new(
            self.text.clone(),
            self.priority.unwrap_or(DEFAULT_PRIORITY),
            self.duration.unwrap_or(DEFAULT_DURATION_MINUTES),
        )
        .with_id(self.id.clone());
        let original = task.normalized_duration();
        Ok(DayItem::Flexible(task.with_original_duration(original)))
    }
}

/// One planning request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanRequest {
    pub tasks: Vec<TaskRecord>,
    #[serde(alias = "pomodoro_work")]
    pub pomodoro_work: i32,
    #[serde(alias = "pomodoro_break")]
    pub pomodoro_break: i32,
    #[serde(default, alias = "is_today")]
    pub is_today: bool,
}

impl PlanRequest {
    pub fn new(tasks: Vec<TaskRecord>, pomodoro: Pomodoro, is_today: bool) -> Self {
        Self {
            tasks,
            pomodoro_work: pomodoro.work_minutes(),
            pomodoro_break: pomodoro.break_minutes(),
            is_today,
        }
    }
}

/// A record left out of the day because its times do not form a valid block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvalidRecord {
    pub id: String,
    pub text: String,
    pub reason: String,
}

/// Result of [`plan`]: the schedule plus what could not be honoured.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanOutcome {
    pub schedule: Vec<ScheduleEntry>,
    /// Fixed blocks dropped because they collided with an earlier one.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rejected: Vec<ScheduleConflict>,
    /// Fixed records with unusable times, e.g. an overnight 23:00-07:00 routine.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub invalid: Vec<InvalidRecord>,
    /// Flexible tasks that ran out of day.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub shortfalls: Vec<Shortfall>,
}

/// Plan with the default start-of-day cursor.
pub fn plan<C: ClockProvider>(request: &PlanRequest, clock: C) -> Result<PlanOutcome> {
    plan_with(request, &Scheduler::new(clock))
}

/// Plan with a caller-configured scheduler.
pub fn plan_with<C: ClockProvider>(request: &PlanRequest, scheduler: &Scheduler<C>) -> Result<PlanOutcome> {
    let pomodoro = Pomodoro::new(request.pomodoro_work, request.pomodoro_break)?;

    let mut day = Day::new("today");
    let mut rejected = Vec::new();
    let mut invalid = Vec::new();

    for record in &request.tasks {
        let item = match record.classify() {
            Ok(item) => item,
            Err(e @ (PlanError::InvalidBlock { .. } | PlanError::InvalidClock(_))) => {
                warn!(id = %record.id, error = %e, "skipping fixed record with unusable times");
                invalid.push(InvalidRecord {
                    id: record.id.clone(),
                    text: record.text.clone(),
                    reason: e.to_string(),
                });
                continue;
            }
            Err(e) => return Err(e),
        };
        if let Err(conflict) = day.add(item) {
            warn!(conflict = %conflict, "dropping conflicting fixed block");
            rejected.push(conflict);
        }
    }

    let run = scheduler.run(pomodoro, &day, request.is_today);

    let mut schedule: Vec<ScheduleEntry> = run.entries.iter().map(RawEntry::format).collect();
    sort_entries(&mut schedule);

    info!(
        entries = schedule.len(),
        rejected = rejected.len(),
        invalid = invalid.len(),
        shortfalls = run.shortfalls.len(),
        "plan ready"
    );

    Ok(PlanOutcome {
        schedule,
        rejected,
        invalid,
        shortfalls: run.shortfalls,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::EntryKind;
    use crate::time::FixedClock;

    #[test]
    fn test_classify_routine_and_manual_event() {
        let r = TaskRecord::routine("r1", "Gym", 420, 480);
        assert!(matches!(r.classify().unwrap(), DayItem::Fixed(b) if b.start() == 420 && b.id() == Some("r1")));

        let mut manual = TaskRecord::event("e1", "Dentist", 1, 60);
        manual.event_mode = Some("manual".to_string());
        manual.start_time = Some(ClockValue::Clock("14:00".to_string()));
        manual.end_time = Some(ClockValue::Clock("15:00".to_string()));
        assert!(matches!(manual.classify().unwrap(), DayItem::Fixed(b) if b.start() == 840 && b.finish() == 900));
    }

    #[test]
    fn test_classify_flexible_defaults() {
        let mut rec = TaskRecord::event("e2", "Study", 1, 60);
        rec.priority = None;
        rec.duration = None;
        let DayItem::Flexible(t) = rec.classify().unwrap() else {
            panic!("expected flexible task");
        };
        assert_eq!(t.priority(), DEFAULT_PRIORITY);
        assert_eq!(t.normalized_duration(), 60);
        assert_eq!(t.original_duration(), 60);
        assert_eq!(t.id(), Some("e2"));
    }

    #[test]
    fn test_classify_errors() {
        let mut rec = TaskRecord::event("x", "Mystery", 1, 30);
        rec.kind = "reminder".to_string();
        assert_eq!(
            rec.classify(),
            Err(PlanError::UnknownTaskType {
                id: "x".to_string(),
                kind: "reminder".to_string()
            })
        );

        // routine without bounds reads as [0, 0)
        let mut r = TaskRecord::routine("r", "Empty", 0, 0);
        r.start_time = None;
        r.end_time = None;
        assert!(matches!(r.classify(), Err(PlanError::InvalidBlock { .. })));

        let mut bad = TaskRecord::routine("r", "Bad clock", 0, 0);
        bad.start_time = Some(ClockValue::Clock("9am".to_string()));
        assert!(matches!(bad.classify(), Err(PlanError::InvalidClock(_))));
    }

    #[test]
    fn test_plan_drops_conflicting_block() {
        let req = PlanRequest {
            tasks: vec![
                TaskRecord::routine("a", "Standup", 540, 600),
                TaskRecord::routine("b", "Overlap", 570, 630),
            ],
            pomodoro_work: 25,
            pomodoro_break: 5,
            is_today: false,
        };
        let out = plan(&req, FixedClock(0)).unwrap();
        assert_eq!(out.schedule.len(), 1);
        assert_eq!(out.schedule[0].id, "a");
        assert_eq!(out.rejected.len(), 1);
        assert_eq!(out.rejected[0].rejected.id(), Some("b"));
    }

    #[test]
    fn test_plan_rejects_bad_pomodoro() {
        let req = PlanRequest {
            tasks: vec![],
            pomodoro_work: 0,
            pomodoro_break: 0,
            is_today: false,
        };
        assert!(matches!(plan(&req, FixedClock(0)), Err(PlanError::InvalidPomodoro { .. })));

        let huge_break = PlanRequest {
            tasks: vec![TaskRecord::event("e", "E", 1, 60)],
            pomodoro_work: 25,
            pomodoro_break: i32::MAX,
            is_today: false,
        };
        assert!(matches!(
            plan(&huge_break, FixedClock(0)),
            Err(PlanError::InvalidPomodoro { .. })
        ));
    }

    #[test]
    fn test_plan_skips_overnight_routine_and_keeps_planning() {
        let mut no_times = TaskRecord::event("m", "Dentist", 1, 60);
        no_times.event_mode = Some("manual".to_string());
        let mut bad_clock = TaskRecord::routine("c", "Walk", 0, 0);
        bad_clock.start_time = Some(ClockValue::Clock("7pm".to_string()));

        let req = PlanRequest {
            tasks: vec![
                TaskRecord::routine("s", "Sleep", 1380, 420),
                no_times,
                bad_clock,
                TaskRecord::event("e", "Essay", 1, 60),
            ],
            pomodoro_work: 30,
            pomodoro_break: 0,
            is_today: false,
        };
        let out = plan(&req, FixedClock(0)).unwrap();

        let ids: Vec<&str> = out.invalid.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["s", "m", "c"]);
        assert!(out.invalid[0].reason.contains("Sleep"));
        assert!(out.rejected.is_empty());

        let slots: Vec<(&str, &str)> = out
            .schedule
            .iter()
            .map(|e| (e.start_time.as_deref().unwrap(), e.end_time.as_deref().unwrap()))
            .collect();
        assert_eq!(slots, vec![("08:00", "08:30"), ("08:30", "09:00")]);
        assert!(out.shortfalls.is_empty());
    }

    #[test]
    fn test_unknown_type_still_fails_the_plan() {
        let mut rec = TaskRecord::event("x", "Mystery", 1, 30);
        rec.kind = "reminder".to_string();
        let req = PlanRequest::new(vec![rec], Pomodoro::default(), false);
        assert!(matches!(
            plan(&req, FixedClock(0)),
            Err(PlanError::UnknownTaskType { .. })
        ));
    }

    #[test]
    fn test_plan_output_sorted_and_formatted() {
        let req = PlanRequest::new(
            vec![
                TaskRecord::event("e", "Deep work", 1, 30),
                TaskRecord::routine("r", "Breakfast", 420, 450),
            ],
            Pomodoro::new(30, 5).unwrap(),
            false,
        );
        let out = plan(&req, FixedClock(0)).unwrap();
        let got: Vec<(&str, EntryKind, &str, &str)> = out
            .schedule
            .iter()
            .map(|e| {
                (
                    e.text.as_str(),
                    e.kind,
                    e.start_time.as_deref().unwrap(),
                    e.end_time.as_deref().unwrap(),
                )
            })
            .collect();
        assert_eq!(
            got,
            vec![
                ("Breakfast", EntryKind::Routine, "07:00", "07:30"),
                ("Deep work", EntryKind::Event, "08:00", "08:30"),
            ]
        );
        assert_eq!(out.schedule[1].task_id.as_deref(), Some("e"));
    }

    #[test]
    fn test_request_accepts_snake_and_camel_keys() {
        let snake = r#"{"tasks":[],"pomodoro_work":25,"pomodoro_break":5,"is_today":true}"#;
        let camel = r#"{"tasks":[],"pomodoroWork":25,"pomodoroBreak":5}"#;
        let a: PlanRequest = serde_json::from_str(snake).unwrap();
        let b: PlanRequest = serde_json::from_str(camel).unwrap();
        assert!(a.is_today);
        assert!(!b.is_today);
        assert_eq!(a.pomodoro_work, b.pomodoro_work);
    }

    #[test]
    fn test_record_times_accept_minutes_or_clock() {
        let json = r#"[
            {"id":"1","text":"Gym","type":"routine","startTime":420,"endTime":"08:00"},
            {"id":"2","text":"Read","type":"event","duration":45,"priority":2}
        ]"#;
        let recs: Vec<TaskRecord> = serde_json::from_str(json).unwrap();
        assert_eq!(recs[0].start_time.as_ref().unwrap().minutes().unwrap(), 420);
        assert_eq!(recs[0].end_time.as_ref().unwrap().minutes().unwrap(), 480);
        assert_eq!(recs[1].duration, Some(45));
        assert!(!recs[1].unplaced);
    }
}
