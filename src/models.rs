use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::Deserialize;

// 1900-01-01T00:00:00Z, the boundary for a user that has never been tracked.
pub const NEVER_TRACKED_TIMESTAMP: i64 = -2_208_988_800;

pub fn never_tracked() -> DateTime<Utc> {
    DateTime::from_timestamp(NEVER_TRACKED_TIMESTAMP, 0).unwrap_or_default()
}

/// Parses a judge or database timestamp.
///
/// Accepts RFC 3339 (what the judge serves and what we store), a naive
/// `YYYY-MM-DDTHH:MM:SS[.f]` taken as UTC, and a bare `YYYY-MM-DD` taken as midnight UTC.
pub fn parse_date(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|date| date.with_timezone(&Utc))
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").map(|d| d.and_utc()))
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d").map(|d| d.and_time(NaiveTime::MIN).and_utc()))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub name: String,
}

/// One submission object as served by the judge's `/api/v2/submissions`.
///
/// Every field is optional: the judge sends `null` for things like the
/// runtime of a submission that is still queued.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RemoteSubmission {
    pub id: Option<i64>,
    pub problem: Option<String>,
    pub date: Option<String>,
    pub language: Option<String>,
    pub time: Option<f64>,
    pub memory: Option<f64>,
    pub points: Option<f64>,
    pub result: Option<String>,
    pub contest: Option<RemoteContest>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RemoteContest {
    pub key: Option<String>,
    pub points: Option<f64>,
}

impl RemoteSubmission {
    pub fn submitted_at(&self) -> Option<DateTime<Utc>> {
        self.date.as_deref().and_then(|date| parse_date(date).ok())
    }
}

/// The `data` member of a paginated submissions response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmissionPage {
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub objects: Vec<RemoteSubmission>,
}

/// Outcome of collecting one user.
#[derive(Debug, Clone, PartialEq)]
pub struct UserSummary {
    pub user: String,
    pub total: usize,
    pub last: Option<String>,
    pub error: Option<String>,
}

impl UserSummary {
    pub fn failed(user: &str, error: &anyhow::Error) -> Self {
        Self {
            user: user.to_string(),
            total: 0,
            last: None,
            error: Some(format!("{error:#}")),
        }
    }
}

/// A row of the `submissions_by_date` view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyCount {
    pub user: String,
    pub date: NaiveDate,
    pub problems: i64,
}
