use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use regex::Regex;

pub const DEFAULT_BASE_URL: &str = "https://dmoj.elpuig.xeill.net";
pub const DEFAULT_DATABASE: &str = "dmoj.db";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Everything a command needs to know, loaded once in `main` and passed down.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_token: Option<String>,
    pub base_url: String,
    pub students: Vec<String>,
    pub database: PathBuf,
    pub report_min_date: Option<NaiveDate>,
    pub output_dir: PathBuf,
    pub timeout: Duration,
}

impl Config {
    /// Loads the configuration from the process environment, reading `.env` first if present.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let students = var("DMOJ_STUDENTS")
            .context("Expected 'DMOJ_STUDENTS=<user>,<user>,...' in .env in project root.")?;

        let report_min_date = var("DMOJ_REPORT_MIN_DATE")
            .map(|raw| {
                NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
                    .with_context(|| format!("DMOJ_REPORT_MIN_DATE is not a YYYY-MM-DD date: {raw}"))
            })
            .transpose()?;

        let timeout = var("DMOJ_TIMEOUT_SECS")
            .map(|raw| {
                raw.parse::<u64>()
                    .with_context(|| format!("DMOJ_TIMEOUT_SECS is not a number of seconds: {raw}"))
            })
            .transpose()?
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        Ok(Self {
            api_token: var("DMOJ_API_TOKEN"),
            base_url: var("DMOJ_BASE_URL").unwrap_or_else(|| String::from(DEFAULT_BASE_URL)),
            students: parse_students(&students)?,
            database: var("DMOJ_DB").unwrap_or_else(|| String::from(DEFAULT_DATABASE)).into(),
            report_min_date,
            output_dir: var("DMOJ_OUTPUT_DIR").unwrap_or_else(|| String::from(".")).into(),
            timeout: Duration::from_secs(timeout),
        })
    }

    /// The token is only needed by commands that talk to the judge.
    pub fn require_token(&self) -> Result<&str> {
        self.api_token
            .as_deref()
            .context("Expected 'DMOJ_API_TOKEN=<token>' in .env in project root.")
    }
}

/// Splits a comma separated username list, dropping blanks and repeats while keeping order.
pub fn parse_students(raw: &str) -> Result<Vec<String>> {
    let valid = Regex::new(r"^[A-Za-z0-9_.\-]+$")?;
    let mut students: Vec<String> = Vec::new();

    for name in raw.split(',').map(str::trim).filter(|name| !name.is_empty()) {
        if !valid.is_match(name) {
            return Err(anyhow!("Invalid judge username: {name:?}"));
        }
        if !students.iter().any(|s| s == name) {
            students.push(name.to_string());
        }
    }

    if students.is_empty() {
        return Err(anyhow!("DMOJ_STUDENTS does not name any user."));
    }
    Ok(students)
}
