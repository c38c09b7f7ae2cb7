//! On-disk state under `~/.pomoplan`: the task-record store.
//!
//! Records are kept as raw JSON per user, keyed by day label. Schedules are
//! recomputed on every run and never written here.

use anyhow::{bail, Context, Result};
use pomoplan_core::TaskRecord;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub fn pomoplan_home() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("POMOPLAN_HOME") {
        return Ok(PathBuf::from(dir));
    }
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".pomoplan"))
}

pub fn ensure_pomoplan_home() -> Result<PathBuf> {
    let dir = pomoplan_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}

/// day label -> records for that day
pub type DayRecords = BTreeMap<String, Vec<TaskRecord>>;

#[derive(Debug, Clone)]
pub struct TaskStore {
    root: PathBuf,
}

impl TaskStore {
    pub fn open(home: &Path) -> Result<Self> {
        let root = home.join("tasks");
        fs::create_dir_all(&root).with_context(|| format!("create {}", root.display()))?;
        Ok(Self { root })
    }

    pub fn open_default() -> Result<Self> {
        Self::open(&ensure_pomoplan_home()?)
    }

    fn user_path(&self, user: &str) -> Result<PathBuf> {
        validate_key("user", user)?;
        Ok(self.root.join(format!("{user}.json")))
    }

    /// All days for a user. Unknown users have no days.
    pub fn load_all(&self, user: &str) -> Result<DayRecords> {
        let p = self.user_path(user)?;
        if !p.exists() {
            return Ok(DayRecords::new());
        }
        let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
        serde_json::from_str(&s).with_context(|| format!("parse {}", p.display()))
    }

    pub fn load_day(&self, user: &str, day: &str) -> Result<Vec<TaskRecord>> {
        Ok(self.load_all(user)?.remove(day).unwrap_or_default())
    }

    /// Replace every record stored for `day`.
    pub fn save_day(&self, user: &str, day: &str, tasks: Vec<TaskRecord>) -> Result<()> {
        validate_key("day", day)?;
        let mut all = self.load_all(user)?;
        if tasks.is_empty() {
            all.remove(day);
        } else {
            all.insert(day.to_string(), tasks);
        }
        self.write_all(user, &all)
    }

    /// Remove one record; returns whether anything was deleted.
    pub fn delete(&self, user: &str, day: &str, id: &str) -> Result<bool> {
        let mut all = self.load_all(user)?;
        let Some(records) = all.get_mut(day) else {
            return Ok(false);
        };
        let before = records.len();
        records.retain(|r| r.id != id);
        let removed = records.len() != before;
        if records.is_empty() {
            all.remove(day);
        }
        if removed {
            self.write_all(user, &all)?;
        }
        Ok(removed)
    }

    fn write_all(&self, user: &str, all: &DayRecords) -> Result<()> {
        let p = self.user_path(user)?;
        let json = serde_json::to_string_pretty(all)?;
        fs::write(&p, json).with_context(|| format!("write {}", p.display()))?;
        tracing::debug!(path = %p.display(), days = all.len(), "task store written");
        Ok(())
    }
}

fn validate_key(what: &str, value: &str) -> Result<()> {
    let ok = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        && !value.starts_with('.');
    if !ok {
        bail!("invalid {what} '{value}': use letters, digits, '-', '_' or '.'");
    }
    Ok(())
}
