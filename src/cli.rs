use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use crate::commands::CommandReport;
use crate::commands::import_habits::{self, ImportHabitsOptions};
use crate::import::config::{CreatedAtPolicy, EntryOrder, load_config};

#[derive(Debug, Parser)]
#[command(
    name = "daylio-habit-import",
    version,
    about = "Import Habit CSV history into the goals of a Daylio backup"
)]
struct Cli {
    /// The path to the .daylio backup file
    #[arg(long, value_name = "PATH")]
    daylio_file_path: PathBuf,
    /// The path to the Habit-exported CSV file
    #[arg(long, value_name = "PATH")]
    habit_file_path: PathBuf,
    /// The path to the desired output file. If omitted, dry-run only
    #[arg(long, value_name = "PATH")]
    output_file_path: Option<PathBuf>,
    /// Order of the rewritten goal entries
    #[arg(long, value_enum)]
    entry_order: Option<EntryOrder>,
    /// When to move a goal's start date to the earliest habit date
    #[arg(long, value_enum)]
    created_at_policy: Option<CreatedAtPolicy>,
    /// Keep the backup's existing goal success weeks
    #[arg(long)]
    no_success_weeks: bool,
    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn into_options(self) -> Result<(ImportHabitsOptions, bool)> {
        let mut import = load_config()?.options()?;
        if let Some(order) = self.entry_order {
            import.entry_order = order;
        }
        if let Some(policy) = self.created_at_policy {
            import.created_at_policy = policy;
        }
        if self.no_success_weeks {
            import.success_weeks = false;
        }

        let opts = ImportHabitsOptions {
            daylio_path: self.daylio_file_path,
            habit_path: self.habit_file_path,
            output_path: self.output_file_path,
            import,
        };
        Ok((opts, self.json))
    }
}

fn render_text(report: &CommandReport) -> String {
    let mut out = format!("{}:\n", report.command);
    for detail in &report.details {
        out.push_str(&format!("  {detail}\n"));
    }
    for warning in &report.warnings {
        out.push_str(&format!("  warning: {warning}\n"));
    }
    out
}

pub fn run() -> Result<()> {
    let (opts, json) = Cli::parse().into_options()?;
    let report = import_habits::run(&opts)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render_text(&report));
    }
    Ok(())
}
