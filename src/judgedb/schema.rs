use rusqlite::Connection;

use crate::judgedb::DBResult;

pub const USER_SCHEMA: &str =
    "CREATE TABLE IF NOT EXISTS user (
        id             INTEGER     PRIMARY KEY AUTOINCREMENT,
        name           TEXT        NOT NULL    UNIQUE
    )";

pub const TRACKING_SCHEMA: &str =
    "CREATE TABLE IF NOT EXISTS tracking (
        id             INTEGER     PRIMARY KEY AUTOINCREMENT,
        date           TEXT        NOT NULL,
        user_id        INTEGER     NOT NULL    REFERENCES user(id)
    )";

pub const SUBMISSION_SCHEMA: &str =
    "CREATE TABLE IF NOT EXISTS submission (
        id             INTEGER     PRIMARY KEY AUTOINCREMENT,
        submission_id  INTEGER     UNIQUE,

        problem_name   TEXT,
        date           TEXT,
        language       TEXT,
        time           REAL,
        memory         REAL,
        points         REAL,
        result         TEXT,

        contest_name   TEXT,
        contest_points REAL,

        tracking_id    INTEGER     NOT NULL    REFERENCES tracking(id)
    )";

pub const SUBMISSIONS_BY_DATE_VIEW: &str =
    "CREATE VIEW IF NOT EXISTS submissions_by_date AS
        SELECT u.name               AS user,
               count(s.id)          AS problems,
               substr(s.date, 1, 10) AS date
        FROM submission s
        JOIN tracking t ON s.tracking_id = t.id
        JOIN user u     ON t.user_id = u.id
        WHERE s.date IS NOT NULL
        GROUP BY u.name, substr(s.date, 1, 10)";

/// Creates every table and view that doesn't exist yet. Safe to run on every startup.
pub fn initialize_schema(connection: &Connection) -> DBResult<()> {
    log::debug!("[initialize_schema] creating user table...");
    connection.execute(USER_SCHEMA, [])?;

    log::debug!("[initialize_schema] creating tracking table...");
    connection.execute(TRACKING_SCHEMA, [])?;

    log::debug!("[initialize_schema] creating submission table...");
    connection.execute(SUBMISSION_SCHEMA, [])?;

    log::debug!("[initialize_schema] creating submissions_by_date view...");
    connection.execute(SUBMISSIONS_BY_DATE_VIEW, [])?;

    Ok(())
}
