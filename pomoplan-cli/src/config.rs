use anyhow::{bail, Context, Result};
use chrono_tz::Tz;
use pomoplan_core::{parse_clock_string, Pomodoro, SystemClock, DEFAULT_DAY_START};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::state::ensure_pomoplan_home;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub pomodoro: PomodoroSection,
    #[serde(default)]
    pub day: DaySection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PomodoroSection {
    pub work_minutes: i32,
    pub break_minutes: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DaySection {
    /// Cursor start for days other than today, `HH:MM`.
    pub default_start: String,
    /// IANA zone used to read "now" for today's plan.
    pub timezone: String,
}

impl Default for PomodoroSection {
    fn default() -> Self {
        let p = Pomodoro::default();
        Self {
            work_minutes: p.work_minutes(),
            break_minutes: p.break_minutes(),
        }
    }
}

impl Default for DaySection {
    fn default() -> Self {
        Self {
            default_start: pomoplan_core::to_clock_string(DEFAULT_DAY_START),
            timezone: "America/Chicago".to_string(),
        }
    }
}

impl Config {
    /// Pomodoro from config, with optional per-run overrides.
    pub fn pomodoro(&self, work: Option<i32>, brk: Option<i32>) -> Result<Pomodoro> {
        let work = work.unwrap_or(self.pomodoro.work_minutes);
        let brk = brk.unwrap_or(self.pomodoro.break_minutes);
        Ok(Pomodoro::new(work, brk)?)
    }

    pub fn default_start_minutes(&self) -> Result<i32> {
        parse_clock_string(&self.day.default_start)
            .with_context(|| format!("day.default_start = {:?}", self.day.default_start))
    }

    pub fn tz(&self) -> Result<Tz> {
        match self.day.timezone.parse::<Tz>() {
            Ok(tz) => Ok(tz),
            Err(_) => bail!("invalid timezone: {}", self.day.timezone),
        }
    }

    pub fn clock(&self) -> Result<SystemClock> {
        Ok(SystemClock::new(self.tz()?))
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_pomoplan_home()?.join("config.toml"))
}

pub fn load_config() -> Result<Config> {
    load_config_from(&config_path()?)
}

pub fn load_config_from(p: &Path) -> Result<Config> {
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(p).with_context(|| format!("read {}", p.display()))?;
    toml::from_str(&s).with_context(|| format!("parse {}", p.display()))
}

pub fn save_config(cfg: &Config) -> Result<()> {
    let p = config_path()?;
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config(&Config::default())?;
    println!("Wrote {}", p.display());
    Ok(())
}
