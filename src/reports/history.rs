use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::Connection;

use crate::judgedb::{DBResult, submissions, tracking};

/// Submissions per user per day. One row per student, one column per date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryReport {
    pub dates: Vec<NaiveDate>,
    pub rows: Vec<HistoryRow>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRow {
    pub user: String,
    pub counts: Vec<i64>,
}

/// Builds the pivot from `min_date` (or the first recorded day) up to the day of the latest run.
///
/// Returns `None` when there is nothing to report: no runs, no activity, or an empty range.
pub fn build_history(
    connection: &Connection,
    students: &[String],
    min_date: Option<NaiveDate>,
) -> DBResult<Option<HistoryReport>> {
    let first = match min_date {
        Some(date) => Some(date),
        None => submissions::query_first_activity(connection, students)?,
    };
    // Activity is grouped by the judge's local day, which can be ahead of the run's UTC day.
    let last = match tracking::query_last_tracking_overall(connection)? {
        Some(run) => {
            let run_day = run.date_naive();
            let active = submissions::query_last_activity(connection, students)?;
            Some(active.map_or(run_day, |active| run_day.max(active)))
        }
        None => None,
    };

    let (Some(first), Some(last)) = (first, last) else {
        log::info!("[build_history] No tracked activity to report.");
        return Ok(None);
    };
    if last < first {
        log::info!("[build_history] Latest run ({last}) is before the report start ({first}).");
        return Ok(None);
    }

    let counts = submissions::query_submissions_by_date(connection, students, first)?;
    if counts.is_empty() {
        log::info!("[build_history] No submissions since {first}.");
        return Ok(None);
    }

    let dates: Vec<NaiveDate> = first.iter_days().take_while(|day| *day <= last).collect();
    let columns: HashMap<NaiveDate, usize> =
        dates.iter().enumerate().map(|(i, day)| (*day, i)).collect();

    let mut rows: Vec<HistoryRow> = students
        .iter()
        .map(|user| HistoryRow { user: user.clone(), counts: vec![0; dates.len()] })
        .collect();
    let positions: HashMap<&str, usize> =
        students.iter().enumerate().map(|(i, user)| (user.as_str(), i)).collect();

    for count in counts {
        let (Some(&row), Some(&column)) = (positions.get(count.user.as_str()), columns.get(&count.date))
        else {
            log::debug!("[build_history] Skipping {} on {}: outside the report.", count.user, count.date);
            continue;
        };
        rows[row].counts[column] = count.problems;
    }

    Ok(Some(HistoryReport { dates, rows }))
}

pub fn write_history_csv(report: &HistoryReport, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Could not create {}", path.display()))?;

    let header = std::iter::once(String::from("user"))
        .chain(report.dates.iter().map(|day| day.format("%Y-%m-%d").to_string()));
    writer.write_record(header)?;

    for row in &report.rows {
        let record = std::iter::once(row.user.clone())
            .chain(row.counts.iter().map(i64::to_string));
        writer.write_record(record)?;
    }
    writer.flush()?;

    log::info!(
        "[write_history_csv] Wrote {} users x {} days to {}",
        report.rows.len(),
        report.dates.len(),
        path.display()
    );
    Ok(())
}
