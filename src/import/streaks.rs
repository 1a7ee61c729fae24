//! Week-level success streaks.
//!
//! A week counts when a Sunday is reached with a running day counter of
//! exactly 7. The counter restarts at 1 on every Monday and otherwise
//! increments once per completion, so the rule counts completions, not
//! distinct weekdays.

use crate::daylio::model::GoalSuccessWeek;
use crate::import::goals::Resolution;
use crate::import::habits::HabitDates;
use chrono::{Datelike, NaiveDate, Weekday};
use serde_json::Map;
use std::cmp::Reverse;
use std::collections::BTreeMap;

const DAYS_PER_WEEK: u32 = 7;

pub fn success_weeks(goal_id: i64, dates: &[NaiveDate]) -> Vec<GoalSuccessWeek> {
    let mut sorted = dates.to_vec();
    sorted.sort();

    let mut out = Vec::new();
    let mut run = 0u32;
    for date in sorted {
        if date.weekday() == Weekday::Mon {
            run = 0;
        }
        run += 1;
        if date.weekday() == Weekday::Sun && run == DAYS_PER_WEEK {
            let iso = date.iso_week();
            out.push(GoalSuccessWeek {
                sunday_day: i64::from(date.day()),
                sunday_month: i64::from(date.month()),
                sunday_year: i64::from(date.year()),
                goal_id,
                week: i64::from(iso.week()),
                year: i64::from(iso.year()),
                extra: Map::new(),
            });
        }
    }
    out
}

/// Success weeks for every habit, newest week first, lowest goal ID first
/// within a week.
pub fn collect_success_weeks(
    habits: &HabitDates,
    resolved: &BTreeMap<String, Resolution>,
) -> Vec<GoalSuccessWeek> {
    let mut out = Vec::new();
    for (habit, dates) in habits {
        let Some(resolution) = resolved.get(habit) else {
            continue;
        };
        out.extend(success_weeks(resolution.goal_id, dates));
    }
    out.sort_by_key(|week| (Reverse(week.year), Reverse(week.week), week.goal_id));
    out
}
