use std::path::{Path, PathBuf};

use chrono::NaiveDate;

pub mod history;
pub mod summary;

/// `<dir>/<prefix><YYYY-MM-DD>.csv`
pub fn dated_csv_path(dir: &Path, prefix: &str, day: NaiveDate) -> PathBuf {
    dir.join(format!("{prefix}{}.csv", day.format("%Y-%m-%d")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dated_paths() {
        let day = NaiveDate::from_ymd_opt(2025, 9, 12).unwrap();
        assert_eq!(dated_csv_path(Path::new("out"), "", day), PathBuf::from("out/2025-09-12.csv"));
        assert_eq!(
            dated_csv_path(Path::new("."), "summary-", day),
            PathBuf::from("./summary-2025-09-12.csv")
        );
    }
}
