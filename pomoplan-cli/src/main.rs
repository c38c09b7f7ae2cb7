use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use pomoplan_core::{plan_with, PlanOutcome, PlanRequest, Scheduler, TaskRecord};
use serde::Deserialize;
use std::path::{Path, PathBuf};

mod calendar;
mod config;
mod state;

use state::TaskStore;

#[derive(Parser, Debug)]
#[command(
    name = "pomoplan",
    version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("POMOPLAN_BUILD_SHA"), ")"),
    about = "Plan a day of routines and pomodoro-paced tasks"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build a timetable from task records (a file, or a stored day)
    Plan {
        /// JSON file: a list of task records or a full plan request
        #[arg(long, conflicts_with_all = ["user", "day"])]
        file: Option<PathBuf>,

        /// Load records from the store for this user
        #[arg(long, requires = "day")]
        user: Option<String>,

        /// Day label in the store
        #[arg(long, requires = "user")]
        day: Option<String>,

        /// Work minutes per slot (overrides config)
        #[arg(long)]
        work: Option<i32>,

        /// Break minutes after each slot (overrides config)
        #[arg(long = "break")]
        break_minutes: Option<i32>,

        /// Start from the current time instead of the configured day start
        #[arg(long)]
        today: bool,

        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,

        /// Calendar date for ICS output (YYYY-MM-DD, default: today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Manage stored task records
    Tasks {
        #[command(subcommand)]
        command: TasksCommand,
    },

    /// Manage ~/.pomoplan/config.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum TasksCommand {
    /// Print every stored day for a user as JSON
    List {
        #[arg(long)]
        user: String,
    },

    /// Replace a day's records with the contents of a JSON file
    Save {
        #[arg(long)]
        user: String,
        #[arg(long)]
        day: String,
        #[arg(long)]
        file: PathBuf,
    },

    /// Delete one record by id
    Delete {
        #[arg(long)]
        user: String,
        #[arg(long)]
        day: String,
        #[arg(long)]
        id: String,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write a default config if none exists
    Init,
    /// Print the effective config
    Show,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Ics,
}

/// Accepted shapes of a `--file` input.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TaskFile {
    Request(PlanRequest),
    Records(Vec<TaskRecord>),
}

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries the schedule; diagnostics go to stderr
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Plan {
            file,
            user,
            day,
            work,
            break_minutes,
            today,
            format,
            date,
        } => {
            let input = match (file, user, day) {
                (Some(path), _, _) => PlanInput::from_file(&path)?,
                (None, Some(user), Some(day)) => PlanInput {
                    records: TaskStore::open_default()?.load_day(&user, &day)?,
                    work: None,
                    break_minutes: None,
                    is_today: None,
                },
                _ => bail!("pass --file <tasks.json> or --user <name> --day <label>"),
            };
            run_plan(input, work, break_minutes, today, format, date)?;
        }

        Command::Tasks { command } => {
            let store = TaskStore::open_default()?;
            match command {
                TasksCommand::List { user } => {
                    let all = store.load_all(&user)?;
                    println!("{}", serde_json::to_string_pretty(&all)?);
                }
                TasksCommand::Save { user, day, file } => {
                    let records = read_records(&file)?;
                    let n = records.len();
                    store.save_day(&user, &day, records)?;
                    println!("Saved {n} task(s) for {user} / {day}");
                }
                TasksCommand::Delete { user, day, id } => {
                    if store.delete(&user, &day, &id)? {
                        println!("Deleted {id}");
                    } else {
                        bail!("no task '{id}' for {user} / {day}");
                    }
                }
            }
        }

        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config()?,
            ConfigCommand::Show => {
                let cfg = config::load_config()?;
                println!("# {}", config::config_path()?.display());
                print!("{}", toml::to_string_pretty(&cfg).context("serialize config")?);
            }
        },
    }

    Ok(())
}

/// Records plus any settings carried by a full request file.
struct PlanInput {
    records: Vec<TaskRecord>,
    work: Option<i32>,
    break_minutes: Option<i32>,
    is_today: Option<bool>,
}

impl PlanInput {
    fn from_file(path: &Path) -> Result<Self> {
        let s = std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        let parsed: TaskFile =
            serde_json::from_str(&s).with_context(|| format!("parse {}", path.display()))?;
        Ok(match parsed {
            TaskFile::Request(r) => Self {
                records: r.tasks,
                work: Some(r.pomodoro_work),
                break_minutes: Some(r.pomodoro_break),
                is_today: Some(r.is_today),
            },
            TaskFile::Records(records) => Self {
                records,
                work: None,
                break_minutes: None,
                is_today: None,
            },
        })
    }
}

fn read_records(path: &Path) -> Result<Vec<TaskRecord>> {
    Ok(PlanInput::from_file(path)?.records)
}

fn run_plan(
    input: PlanInput,
    work: Option<i32>,
    break_minutes: Option<i32>,
    today: bool,
    format: OutputFormat,
    date: Option<NaiveDate>,
) -> Result<()> {
    let cfg = config::load_config()?;

    // flags > request file > config
    let pomodoro = cfg.pomodoro(work.or(input.work), break_minutes.or(input.break_minutes))?;
    let is_today = today || input.is_today.unwrap_or(false);

    let request = PlanRequest::new(input.records, pomodoro, is_today);
    let scheduler = Scheduler::new(cfg.clock()?).with_default_start(cfg.default_start_minutes()?);
    let outcome = plan_with(&request, &scheduler)?;

    match format {
        OutputFormat::Table => print_table(&outcome),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&outcome)?),
        OutputFormat::Ics => {
            let tz = cfg.tz()?;
            let date = date.unwrap_or_else(|| chrono::Utc::now().with_timezone(&tz).date_naive());
            print!("{}", calendar::schedule_to_ics(&outcome.schedule, date, tz)?);
        }
    }

    Ok(())
}

fn print_table(outcome: &PlanOutcome) {
    println!("# Plan\n");
    for e in &outcome.schedule {
        let marker = if e.is_auto { "*" } else { " " };
        println!(
            "{}-{} {} [{:?}] {}",
            e.start_time.as_deref().unwrap_or("--:--"),
            e.end_time.as_deref().unwrap_or("--:--"),
            marker,
            e.kind,
            e.text
        );
    }

    if !outcome.rejected.is_empty() {
        println!("\n## Rejected routines\n");
        for c in &outcome.rejected {
            println!("- {c}");
        }
    }

    if !outcome.invalid.is_empty() {
        println!("\n## Skipped records\n");
        for r in &outcome.invalid {
            println!("- {} ({}): {}", r.text, r.id, r.reason);
        }
    }

    if !outcome.shortfalls.is_empty() {
        println!("\n## Not fully placed\n");
        for s in &outcome.shortfalls {
            println!(
                "- {}: {} of {} min placed ({} min left)",
                s.name, s.placed, s.requested, s.unplaced
            );
        }
    }
}
