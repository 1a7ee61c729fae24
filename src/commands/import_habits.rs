use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::commands::CommandReport;
use crate::daylio::backup::Backup;
use crate::import::config::ImportOptions;
use crate::import::goals::{GoalMatch, import_goals};
use crate::import::habits::read_habits_file;
use crate::import::warn::{self, WarnEvent};

#[derive(Debug, Clone)]
pub struct ImportHabitsOptions {
    pub daylio_path: PathBuf,
    pub habit_path: PathBuf,
    pub output_path: Option<PathBuf>,
    pub import: ImportOptions,
}

pub fn run(opts: &ImportHabitsOptions) -> Result<CommandReport> {
    let mut report = CommandReport::new("import-habits");
    let mut backup = Backup::load(&opts.daylio_path)?;

    let outcome = import_into(&mut backup, opts, &mut report);

    let workspace = backup.workspace_path().display().to_string();
    if let Err(err) = backup.close() {
        let err = format!("{err:#}");
        warn::emit(WarnEvent {
            code: "WORKSPACE_CLEANUP_FAILED",
            stage: "cleanup",
            action: "remove-workspace",
            path: &workspace,
            err: &err,
        });
        report.warn(format!("failed to clean up {workspace}: {err}"));
    }

    outcome?;
    Ok(report)
}

fn import_into(
    backup: &mut Backup,
    opts: &ImportHabitsOptions,
    report: &mut CommandReport,
) -> Result<()> {
    report.detail(format!("daylio_file={}", opts.daylio_path.display()));
    report.detail(format!(
        "loaded {} day entries, {} goals, {} goal entries, {} tags",
        backup.data.day_entries.len(),
        backup.data.goals.len(),
        backup.data.goal_entries.len(),
        backup.data.tags.len(),
    ));
    report.detail(format!(
        "archive_entries={} top_level_keys={}",
        backup.archive_entries().len(),
        backup.raw().len(),
    ));

    let habits = read_habits_file(&opts.habit_path)?;
    report.detail(format!("habit_file={}", opts.habit_path.display()));
    for (name, dates) in &habits {
        report.detail(format!("found habit {name:?} with {} entries", dates.len()));
    }

    let summary = import_goals(&mut backup.data, &habits, &opts.import)
        .context("failed to import goals from habits")?;

    for (habit, resolution) in &summary.resolutions {
        let via = match resolution.matched {
            GoalMatch::Name => "name".to_string(),
            GoalMatch::Tag { tag_id } => format!("tag {tag_id}"),
        };
        report.detail(format!(
            "habit {habit:?} -> goal {} via {via}",
            resolution.goal_id
        ));
    }
    report.detail(format!("goal_entries={}", summary.entries));
    match summary.success_weeks {
        Some(count) => report.detail(format!("goal_success_weeks={count}")),
        None => report.detail("goal_success_weeks=unchanged"),
    }
    if !summary.backfilled_goals.is_empty() {
        let ids = summary
            .backfilled_goals
            .iter()
            .map(i64::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        report.detail(format!("moved created_at back for goals: {ids}"));
    }

    if backup.persist(opts.output_path.as_deref())? {
        if let Some(path) = &opts.output_path {
            report.detail(format!("wrote {}", path.display()));
        }
    } else {
        report.detail("dry-run: no output path provided; nothing written");
    }
    Ok(())
}
