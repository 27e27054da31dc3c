//! `proplus` command-line front end.
//!
//! # Responsibility
//! - Drive a local-only `StateStore` from the terminal.
//! - Persist after every successful mutation.
//! - Read-only commands leave an existing local backup untouched.

use anyhow::{bail, Context, Result};
use chrono::Datelike;
use clap::{Parser, Subcommand};
use log::info;
use proplus_core::engine::{habits_by_priority, is_done_today, today_local, weekly_completions};
use proplus_core::model::schedule::{weekday_display_name, weekday_key};
use proplus_core::reconcile::{parse_import, ImportMode};
use proplus_core::service::schedule_service::parse_day;
use proplus_core::service::{HabitService, ProjectService, ScheduleService, SettingsService};
use proplus_core::{default_record, init_logging, CoreConfig, SqliteLocalBackup, StateStore};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "proplus", about = "ProPlus productivity dashboard", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Summary of the stored record
    Status,

    /// List habits by priority with streaks
    Habits,

    /// Toggle a habit's completion for today
    Toggle {
        /// Habit id
        habit_id: String,
    },

    /// Mark the first habit matching a name fragment as done today
    Done {
        /// Part of the habit label
        fragment: String,
    },

    /// Add a task to a project by name
    Task {
        /// Project name (case-insensitive)
        #[arg(long, short)]
        project: String,

        /// Task text
        text: String,
    },

    /// Show one day's schedule (defaults to today)
    Agenda {
        /// Weekday, e.g. `monday`
        day: Option<String>,
    },

    /// Import a JSON export
    Import {
        path: PathBuf,

        /// Replace the whole record instead of merging
        #[arg(long)]
        overwrite: bool,
    },

    /// Import schedule events from CSV
    ImportCsv { path: PathBuf },

    /// Write the record as JSON
    Export {
        /// Output file (stdout when omitted)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Show the journal, or replace it
    Journal {
        /// New journal text
        text: Option<String>,
    },

    /// Switch theme, e.g. `galaxy-theme`
    Theme { theme: String },

    /// Replace all data with the built-in defaults
    Reset {
        /// Confirm that all habits, projects, schedule and journal are discarded
        #[arg(long)]
        yes: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = CoreConfig::from_env().context("invalid configuration")?;
    init_logging(config.log_level, &config.log_dir()).context("failed to start logging")?;

    let backup = SqliteLocalBackup::open(config.db_path())
        .with_context(|| format!("failed to open {}", config.db_path().display()))?;
    // No remote backend ships with the CLI; the configured app id and
    // identity are still applied and shown by `status`.
    let mut store = StateStore::from_config(default_record(), Box::new(backup), &config, None);
    let report = store.load();
    info!(
        "event=cli_start module=cli status=ok source={}",
        report.source.as_str()
    );

    let today = today_local();
    let mutated = match cli.command {
        Commands::Status => {
            let record = store.get();
            let done_today = record
                .habits
                .iter()
                .filter(|habit| is_done_today(habit, today))
                .count();
            println!("source: {}", report.source.as_str());
            println!(
                "app: {} identity: {} sync: {}",
                store.app_id(),
                if store.has_remote_identity() { "set" } else { "none" },
                store.sync_state().label()
            );
            println!("theme: {}", record.settings.theme.as_str());
            println!("habits done today: {done_today}/{}", record.habits.len());
            println!("active projects: {}", record.active_projects().count());
            let week: Vec<String> = weekly_completions(&record.habits, today)
                .iter()
                .map(|(_, count)| count.to_string())
                .collect();
            println!("last 7 days: {}", week.join(" "));
            println!("last updated: {}", record.last_updated.to_rfc3339());
            false
        }
        Commands::Habits => {
            for habit in habits_by_priority(&store.get().habits) {
                let mark = if is_done_today(habit, today) { "x" } else { " " };
                println!(
                    "[{mark}] {} (p{}) streak={} id={}",
                    habit.text, habit.priority, habit.streak, habit.id
                );
            }
            false
        }
        Commands::Toggle { habit_id } => {
            let toggle = HabitService::new(store.get_mut()).toggle_today(&habit_id, today)?;
            println!("done today: {} streak: {}", toggle.done_today, toggle.streak);
            true
        }
        Commands::Done { fragment } => {
            let (habit_id, toggle) =
                HabitService::new(store.get_mut()).complete_matching(&fragment, today)?;
            println!("{habit_id} streak: {}", toggle.streak);
            true
        }
        Commands::Task { project, text } => {
            let (project_id, task_id) =
                ProjectService::new(store.get_mut()).add_task_by_project_name(&project, &text)?;
            println!("added {task_id} to {project_id}");
            true
        }
        Commands::Agenda { day } => {
            let day = match day {
                Some(value) => parse_day(&value)?,
                None => today.weekday(),
            };
            println!("{}", weekday_display_name(day));
            for (time, name) in store.get().schedule.day(day).agenda() {
                println!("  {time}  {name}");
            }
            false
        }
        Commands::Import { path, overwrite } => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let candidate = parse_import(&text)?;
            let mode = if overwrite {
                ImportMode::Overwrite
            } else {
                ImportMode::Merge
            };
            let defaults = store.defaults().clone();
            let summary = candidate.apply(store.get_mut(), mode, &defaults, today)?;
            println!(
                "{}: {} projects and {} habits added, {} duplicates skipped",
                summary.mode.as_str(),
                summary.projects_added,
                summary.habits_added,
                summary.projects_skipped + summary.habits_skipped
            );
            true
        }
        Commands::ImportCsv { path } => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let summary = ScheduleService::new(&mut store.get_mut().schedule).import_csv(&text)?;
            println!(
                "imported {} events, skipped {} rows",
                summary.imported, summary.skipped
            );
            true
        }
        Commands::Export { output } => {
            let json = serde_json::to_string_pretty(store.get())?;
            match output {
                Some(path) => std::fs::write(&path, json)
                    .with_context(|| format!("failed to write {}", path.display()))?,
                None => println!("{json}"),
            }
            false
        }
        Commands::Journal { text } => match text {
            Some(text) => {
                SettingsService::new(store.get_mut()).set_journal(text);
                true
            }
            None => {
                println!("{}", store.get().journal);
                false
            }
        },
        Commands::Theme { theme } => {
            let theme = SettingsService::new(store.get_mut()).set_theme(&theme)?;
            println!("theme: {}", theme.as_str());
            true
        }
        Commands::Reset { yes } => {
            if !yes {
                bail!("reset discards all data; pass --yes to confirm");
            }
            let outcome = store.reset_to_defaults();
            if !outcome.local_written() {
                bail!("reset was not saved: {:?}", outcome.local);
            }
            println!("all data reset to defaults");
            false
        }
    };

    if mutated {
        let outcome = store.persist();
        if !outcome.local_written() {
            bail!("changes were not saved: {:?}", outcome.local);
        }
        info!(
            "event=cli_persist module=cli status=ok day={}",
            weekday_key(today.weekday())
        );
    }
    store.shutdown();
    Ok(())
}
