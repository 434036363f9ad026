use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::Connection;

use crate::judgeapi::{JudgeClient, PageResponse};
use crate::judgedb::{self, DBResult, submissions, tracking, users};
use crate::models::{RemoteSubmission, UserSummary};

/// Collects every user in `students`, one after the other.
///
/// A user whose requests fail gets an `error` in their summary and the batch moves on;
/// database errors abort the whole run.
pub async fn collect(
    client: &JudgeClient,
    connection: &mut Connection,
    students: &[String],
) -> Result<Vec<UserSummary>> {
    let mut summaries = Vec::with_capacity(students.len());
    for username in students {
        summaries.push(collect_user(client, connection, username).await?);
    }
    Ok(summaries)
}

pub async fn collect_user(
    client: &JudgeClient,
    connection: &mut Connection,
    username: &str,
) -> Result<UserSummary> {
    log::info!("[collect_user] Collecting submissions for {username}...");

    // Taken before the first request: anything submitted while pages are in flight is
    // newer than this run's tracking date, so the next run picks it up.
    let run_date = Utc::now();

    let submissions = match fetch_all_pages(client, username).await {
        Ok(Some(submissions)) => submissions,
        Ok(None) => {
            log::info!("[collect_user] No data for {username}, nothing recorded.");
            return Ok(unchanged(connection, username)?);
        }
        Err(err) => {
            log::error!("[collect_user] Could not collect {username}: {err:#}");
            return Ok(UserSummary::failed(username, &err));
        }
    };

    let summary = record_run(connection, username, &submissions, run_date)?;
    log::info!(
        "[collect_user] {username}: {} new submission(s) out of {} fetched.",
        summary.total,
        submissions.len()
    );
    Ok(summary)
}

/// Walks every page of `username`'s submissions.
///
/// `None` means the judge had no data for the user at all (non-200 on the first page).
/// A later page answering non-200 is skipped; a failed request fails the whole user.
pub async fn fetch_all_pages(
    client: &JudgeClient,
    username: &str,
) -> Result<Option<Vec<RemoteSubmission>>> {
    let Some(first) = client.fetch_page(username, None).await?.into_page() else {
        return Ok(None);
    };

    let total_pages = first.total_pages;
    let mut submissions = first.objects;

    for page in 2..=total_pages {
        match client.fetch_page(username, Some(page)).await?.into_page() {
            Some(next) => submissions.extend(next.objects),
            None => log::warn!(
                "[fetch_all_pages] Page {page}/{total_pages} of {username} had no data, skipping."
            ),
        }
    }

    Ok(Some(submissions))
}

/// Records one sync run for `username` at `run_date`.
///
/// The run gets a single tracking row. Only submissions dated strictly after the user's
/// previous run are stored against it, and a judge id already in the store is not stored
/// (or counted) again. Everything happens in one transaction.
pub fn record_run(
    connection: &mut Connection,
    username: &str,
    fetched: &[RemoteSubmission],
    run_date: DateTime<Utc>,
) -> DBResult<UserSummary> {
    let tx = connection.transaction()?;

    let user = users::get_or_create_user(&tx, username)?;
    let since = tracking::query_last_tracking(&tx, &user)?;
    let tracking_id = tracking::insert_tracking(&tx, &user, run_date)?;

    let mut total = 0;
    let mut newest: Option<(DateTime<Utc>, &str)> = None;

    for (submission, submitted_at, date) in fetched.iter().filter_map(|s| {
        let submitted_at = s.submitted_at()?;
        (submitted_at > since).then_some((s, submitted_at, s.date.as_deref()?))
    }) {
        if !submissions::insert_submission(&tx, tracking_id, submission)? {
            continue;
        }
        total += 1;
        if newest.is_none_or(|(latest, _)| submitted_at > latest) {
            newest = Some((submitted_at, date));
        }
    }

    let last = match newest {
        Some((_, date)) => Some(date.to_string()),
        None => submissions::query_last_submission(&tx, &user)?,
    };

    tx.commit()?;

    Ok(UserSummary {
        user: username.to_string(),
        total,
        last,
        error: None,
    })
}

/// Summary for a user the judge had nothing for: no new submissions, last one from the store.
fn unchanged(connection: &Connection, username: &str) -> DBResult<UserSummary> {
    let last = match users::query_user(connection, username)? {
        Some(user) => submissions::query_last_submission(connection, &user)?,
        None => None,
    };

    Ok(UserSummary {
        user: username.to_string(),
        total: 0,
        last,
        error: None,
    })
}

/// Quick look at a user's first page without touching the database.
pub async fn peek_user(client: &JudgeClient, username: &str) -> UserSummary {
    match client.fetch_page(username, None).await {
        Ok(PageResponse::Page(page)) => UserSummary {
            user: username.to_string(),
            total: page.objects.len(),
            last: page
                .objects
                .iter()
                .filter_map(|s| Some((s.submitted_at()?, s.date.clone()?)))
                .max_by_key(|(submitted_at, _)| *submitted_at)
                .map(|(_, date)| date),
            error: None,
        },
        Ok(PageResponse::NoData(status)) => UserSummary {
            user: username.to_string(),
            total: 0,
            last: None,
            error: Some(status.as_u16().to_string()),
        },
        Err(err) => UserSummary::failed(username, &err),
    }
}

/// Opens the database in `path` and collects `students`. Convenience for the `collect` command.
pub async fn collect_into(
    client: &JudgeClient,
    path: &std::path::Path,
    students: &[String],
) -> Result<Vec<UserSummary>> {
    let mut connection = judgedb::open(path)?;
    collect(client, &mut connection, students).await
}
