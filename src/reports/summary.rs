use std::path::Path;

use anyhow::{Context, Result};
use itertools::Itertools;
use serde::Serialize;

use crate::models::UserSummary;

pub const CONSOLE_HEADER: &str = "USER\tNEW SUBMISSIONS\tLAST SUBMISSION";
pub const PEEK_HEADER: &str = "USER\tTOTAL\tLAST";

/// `2025-09-12T10:15:30.123+00:00` becomes `2025-09-12 10:15:30`; nothing becomes `Never`.
pub fn format_last(last: Option<&str>) -> String {
    match last {
        Some(date) => date.chars().take(19).collect::<String>().replace('T', " "),
        None => String::from("Never"),
    }
}

impl std::fmt::Display for UserSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}\t{}\t{}", self.user, self.total, format_last(self.last.as_deref()))?;
        if let Some(error) = &self.error {
            write!(f, "\t{error}")?;
        }
        Ok(())
    }
}

/// Tab separated, ready to paste into a spreadsheet.
pub fn render_console(header: &str, summaries: &[UserSummary]) -> String {
    std::iter::once(header.to_string())
        .chain(summaries.iter().map(UserSummary::to_string))
        .join("\n")
}

#[derive(Serialize)]
struct SummaryRow<'a> {
    user: &'a str,
    #[serde(rename = "new submissions")]
    total: usize,
    #[serde(rename = "last submission")]
    last: String,
    error: &'a str,
}

pub fn write_summary_csv(summaries: &[UserSummary], path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Could not create {}", path.display()))?;

    for summary in summaries {
        writer.serialize(SummaryRow {
            user: &summary.user,
            total: summary.total,
            last: summary.last.as_deref().map(|date| format_last(Some(date))).unwrap_or_default(),
            error: summary.error.as_deref().unwrap_or_default(),
        })?;
    }
    writer.flush()?;

    log::info!("[write_summary_csv] Wrote {} rows to {}", summaries.len(), path.display());
    Ok(())
}
