use crate::daylio::model::{BackupData, Goal, GoalEntry, Tag};
use crate::error::ImportError;
use crate::import::config::{CreatedAtPolicy, EntryOrder, ImportOptions};
use crate::import::habits::HabitDates;
use crate::import::streaks::collect_success_weeks;
use anyhow::Result;
use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Timelike};
use serde_json::Map;
use std::cmp::Reverse;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Completions land at 23:00 on their day, close to when a journal entry is
/// usually written.
const COMPLETION_OFFSET_HOURS: i64 = 23;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalMatch {
    Name,
    Tag { tag_id: i64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub goal_id: i64,
    pub matched: GoalMatch,
}

#[derive(Debug, Clone, Default)]
pub struct ImportSummary {
    pub resolutions: BTreeMap<String, Resolution>,
    pub entries: usize,
    /// `None` when success weeks were left untouched.
    pub success_weeks: Option<usize>,
    pub backfilled_goals: Vec<i64>,
}

/// Find the goal a habit belongs to: a goal with the same name, else the
/// first goal tagged with a tag of that name.
pub fn resolve_goal(habit: &str, goals: &[Goal], tags: &[Tag]) -> Option<Resolution> {
    if let Some(goal) = goals.iter().find(|g| g.name == habit) {
        return Some(Resolution {
            goal_id: goal.id,
            matched: GoalMatch::Name,
        });
    }

    let tag = tags.iter().find(|t| t.name == habit)?;
    let goal = goals.iter().find(|g| g.tag_id() == Some(tag.id))?;
    Some(Resolution {
        goal_id: goal.id,
        matched: GoalMatch::Tag { tag_id: tag.id },
    })
}

pub fn resolve_habits(
    habits: &HabitDates,
    goals: &[Goal],
    tags: &[Tag],
) -> Result<BTreeMap<String, Resolution>> {
    let mut out = BTreeMap::new();
    for habit in habits.keys() {
        let Some(resolution) = resolve_goal(habit, goals, tags) else {
            return Err(ImportError::UnresolvedHabit(habit.clone()).into());
        };
        debug!(habit = %habit, goal_id = resolution.goal_id, "resolved habit");
        out.insert(habit.clone(), resolution);
    }
    Ok(out)
}

fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

fn epoch_millis(at: NaiveDateTime) -> i64 {
    at.and_utc().timestamp_millis()
}

pub fn completion_entry(goal_id: i64, date: NaiveDate, id: i64) -> GoalEntry {
    let at = start_of_day(date) + TimeDelta::hours(COMPLETION_OFFSET_HOURS);
    GoalEntry {
        created_at: epoch_millis(at),
        hour: i64::from(at.hour()),
        minute: i64::from(at.minute()),
        second: i64::from(at.second()),
        day: i64::from(at.day()),
        month: i64::from(at.month()),
        year: i64::from(at.year()),
        goal_id,
        id,
        extra: Map::new(),
    }
}

/// One entry per (habit, date) pair. IDs count up from 1 in habit-name then
/// file order; the returned list is sorted by timestamp.
pub fn synthesize_entries(
    habits: &HabitDates,
    resolved: &BTreeMap<String, Resolution>,
    order: EntryOrder,
) -> Vec<GoalEntry> {
    let mut out = Vec::new();
    let mut next_id = 1i64;
    for (habit, dates) in habits {
        let Some(resolution) = resolved.get(habit) else {
            continue;
        };
        for date in dates {
            out.push(completion_entry(resolution.goal_id, *date, next_id));
            next_id += 1;
        }
    }

    match order {
        EntryOrder::NewestFirst => out.sort_by_key(|e| Reverse(e.created_at)),
        EntryOrder::OldestFirst => out.sort_by_key(|e| e.created_at),
    }
    out
}

fn earliest_per_goal(
    habits: &HabitDates,
    resolved: &BTreeMap<String, Resolution>,
) -> BTreeMap<i64, NaiveDate> {
    let mut out: BTreeMap<i64, NaiveDate> = BTreeMap::new();
    for (habit, dates) in habits {
        let (Some(resolution), Some(earliest)) = (resolved.get(habit), dates.iter().min()) else {
            continue;
        };
        out.entry(resolution.goal_id)
            .and_modify(|current| *current = (*current).min(*earliest))
            .or_insert(*earliest);
    }
    out
}

/// Move goal start dates to the earliest imported completion. Returns the IDs
/// of goals whose `created_at` changed.
pub fn backfill_created_at(
    goals: &mut [Goal],
    habits: &HabitDates,
    resolved: &BTreeMap<String, Resolution>,
    policy: CreatedAtPolicy,
) -> Vec<i64> {
    let earliest = earliest_per_goal(habits, resolved);
    let mut changed = Vec::new();
    for goal in goals.iter_mut() {
        let Some(date) = earliest.get(&goal.id) else {
            continue;
        };
        let start = epoch_millis(start_of_day(*date));
        let overwrite = match policy {
            CreatedAtPolicy::EarliestOnly => goal.created_at > start,
            CreatedAtPolicy::Always => goal.created_at != start,
        };
        if overwrite {
            goal.created_at = start;
            changed.push(goal.id);
        }
    }
    changed
}

/// Rewrite goal entries (and optionally success weeks) from habit history.
///
/// Every habit is resolved before anything is written, so an unresolved habit
/// leaves `data` untouched.
pub fn import_goals(
    data: &mut BackupData,
    habits: &HabitDates,
    opts: &ImportOptions,
) -> Result<ImportSummary> {
    let resolutions = resolve_habits(habits, &data.goals, &data.tags)?;

    let entries = synthesize_entries(habits, &resolutions, opts.entry_order);
    let success_weeks = opts
        .success_weeks
        .then(|| collect_success_weeks(habits, &resolutions));
    let backfilled_goals = backfill_created_at(
        &mut data.goals,
        habits,
        &resolutions,
        opts.created_at_policy,
    );

    let summary = ImportSummary {
        entries: entries.len(),
        success_weeks: success_weeks.as_ref().map(Vec::len),
        backfilled_goals,
        resolutions,
    };
    data.goal_entries = entries;
    if let Some(weeks) = success_weeks {
        data.goal_success_weeks = weeks;
    }

    info!(
        entries = summary.entries,
        success_weeks = ?summary.success_weeks,
        backfilled = summary.backfilled_goals.len(),
        "imported habits"
    );
    Ok(summary)
}
