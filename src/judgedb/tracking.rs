use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::Connection;

use crate::{judgedb::DBResult, models};

/////*============== TRACKING QUERIES ==============*/

// Stored as fixed-width UTC so that `max(date)` in SQL orders like time does.
pub(crate) fn format_tracking_date(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_tracking_date(raw: &str) -> DBResult<DateTime<Utc>> {
    models::parse_date(raw).map_err(|err| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(err))
    })
}

/// Records a sync run for `user` at `date`.
///
/// Returns the id of the new tracking row.
pub fn insert_tracking(
    connection: &Connection,
    user: &models::User,
    date: DateTime<Utc>,
) -> DBResult<i64> {
    log::trace!("[insert_tracking] Tracking {} at {date}", user.name);

    connection
        .prepare("INSERT INTO tracking (date, user_id) VALUES (:date, :user_id)")?
        .execute(rusqlite::named_params! {
            ":date":    format_tracking_date(date),
            ":user_id": user.id,
        })?;

    Ok(connection.last_insert_rowid())
}

/// The date of `user`'s latest sync run, or 1900-01-01 if they were never collected.
pub fn query_last_tracking(connection: &Connection, user: &models::User) -> DBResult<DateTime<Utc>> {
    let raw: Option<String> = connection
        .prepare("SELECT max(date) FROM tracking WHERE user_id = :user_id")?
        .query_row(rusqlite::named_params! { ":user_id": user.id }, |row| row.get(0))?;

    match raw {
        Some(raw) => parse_tracking_date(&raw),
        None => Ok(models::never_tracked()),
    }
}

/// The latest sync run across every user, if any run happened at all.
pub fn query_last_tracking_overall(connection: &Connection) -> DBResult<Option<DateTime<Utc>>> {
    let raw: Option<String> = connection
        .prepare("SELECT max(date) FROM tracking")?
        .query_row([], |row| row.get(0))?;

    raw.as_deref().map(parse_tracking_date).transpose()
}
