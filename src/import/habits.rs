use crate::error::ImportError;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::fs;
use std::io::Read;
use std::path::Path;

const HABIT_COLUMN: &str = "Habit";
const DATE_COLUMN: &str = "Date";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Completion dates per habit name, in file order. Repeated rows are kept.
pub type HabitDates = BTreeMap<String, Vec<NaiveDate>>;

pub fn read_habits_file(path: &Path) -> Result<HabitDates> {
    let file =
        fs::File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    read_habits(file).with_context(|| format!("failed to read habit CSV {}", path.display()))
}

pub fn read_habits<R: Read>(input: R) -> Result<HabitDates> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(input);

    let headers = reader.headers().context("failed to read header record")?;
    let habit_index = headers.iter().position(|h| h == HABIT_COLUMN);
    let date_index = headers.iter().position(|h| h == DATE_COLUMN);
    let (habit_index, date_index) = match (habit_index, date_index) {
        (Some(habit), Some(date)) => (habit, date),
        (habit, date) => {
            let missing = [(HABIT_COLUMN, habit), (DATE_COLUMN, date)]
                .into_iter()
                .filter(|(_, index)| index.is_none())
                .map(|(name, _)| name)
                .collect::<Vec<_>>()
                .join(", ");
            return Err(ImportError::MissingColumns(missing).into());
        }
    };

    let mut out = HabitDates::new();
    for (row, record) in reader.records().enumerate() {
        let line = row + 2;
        let record = record.with_context(|| format!("failed to parse record on line {line}"))?;
        let habit = record.get(habit_index).unwrap_or_default();
        let raw_date = record.get(date_index).unwrap_or_default();
        let date = NaiveDate::parse_from_str(raw_date, DATE_FORMAT)
            .with_context(|| format!("failed to parse date {raw_date:?} on line {line}"))?;
        out.entry(habit.to_string()).or_default().push(date);
    }
    Ok(out)
}
