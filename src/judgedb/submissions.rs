use chrono::NaiveDate;
use itertools::Itertools;
use rusqlite::Connection;

use crate::{judgedb::{self, DBResult}, models};

/////*============== SUBMISSION QUERIES ==============*/
impl<'a> TryFrom<&'a rusqlite::Row<'a>> for models::DailyCount {
    type Error = rusqlite::Error;

    fn try_from(row: &rusqlite::Row) -> Result<Self, rusqlite::Error> {
        let raw_date: String = row.get("date")?;
        let date = NaiveDate::parse_from_str(&raw_date, "%Y-%m-%d").map_err(|err| {
            rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(err))
        })?;

        Ok(Self {
            user: row.get("user")?,
            problems: row.get("problems")?,
            date,
        })
    }
}

/// Inserts a judge submission into the batch `tracking_id`.
/// Returns `true` if it was newly added, false if its judge id is already stored.
pub fn insert_submission(
    connection: &Connection,
    tracking_id: i64,
    submission: &models::RemoteSubmission,
) -> DBResult<bool> {
    log::trace!(
        "[insert_submission] Inserting submission {:?} ({:?}) into batch {tracking_id}...",
        submission.id,
        submission.problem
    );

    let contest = submission.contest.as_ref();
    let query_params = rusqlite::named_params! {
            ":submission_id":  submission.id,
            ":problem_name":   submission.problem,
            ":date":           submission.date,
            ":language":       submission.language,
            ":time":           submission.time,
            ":memory":         submission.memory,
            ":points":         submission.points,
            ":result":         submission.result,
            ":contest_name":   contest.and_then(|c| c.key.as_deref()),
            ":contest_points": contest.and_then(|c| c.points),
            ":tracking_id":    tracking_id,
    };

    connection
        .prepare(
            "INSERT INTO submission
                ( submission_id,  problem_name,  date,  language,  time,  memory,  points,
                  result,  contest_name,  contest_points,  tracking_id)
             VALUES
                (:submission_id, :problem_name, :date, :language, :time, :memory, :points,
                 :result, :contest_name, :contest_points, :tracking_id)",
        )?
        .execute(query_params)
        .map_or_else(judgedb::swallow_constraint_violation, |_| Ok(true))
}

/// The judge date of `user`'s most recent stored submission.
///
/// Compared as instants, not as text: the judge may send different UTC offsets.
pub fn query_last_submission(
    connection: &Connection,
    user: &models::User,
) -> DBResult<Option<String>> {
    let mut stmt = connection.prepare(
        "SELECT s.date
         FROM submission s
         JOIN tracking t ON s.tracking_id = t.id
         WHERE t.user_id = :user_id
           AND s.date IS NOT NULL",
    )?;

    let dates = stmt
        .query_map(rusqlite::named_params! { ":user_id": user.id }, |row| row.get::<_, String>(0))?
        .collect::<DBResult<Vec<String>>>()?;

    Ok(dates
        .into_iter()
        .filter_map(|date| Some((models::parse_date(&date).ok()?, date)))
        .max_by_key(|(submitted_at, _)| *submitted_at)
        .map(|(_, date)| date))
}

/// The last day with any recorded activity for `users`.
pub fn query_last_activity(connection: &Connection, users: &[String]) -> DBResult<Option<NaiveDate>> {
    if users.is_empty() {
        return Ok(None);
    }

    let raw: Option<String> = connection
        .prepare(&format!(
            "SELECT max(date) FROM submissions_by_date WHERE user IN ({})",
            placeholders(users.len())
        ))?
        .query_row(rusqlite::params_from_iter(users), |row| row.get(0))?;

    raw.as_deref().map(parse_view_date).transpose()
}

fn parse_view_date(raw: &str) -> DBResult<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|err| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(err))
    })
}

/// Per-day submission counts for `users` from `since` onwards.
pub fn query_submissions_by_date(
    connection: &Connection,
    users: &[String],
    since: NaiveDate,
) -> DBResult<Vec<models::DailyCount>> {
    if users.is_empty() {
        return Ok(Vec::new());
    }
    log::trace!("[query_submissions_by_date] Counting submissions for {} users since {since}", users.len());

    let since = since.format("%Y-%m-%d").to_string();
    let mut stmt = connection.prepare(&format!(
        "SELECT user, problems, date
         FROM submissions_by_date
         WHERE user IN ({})
           AND date >= ?
         ORDER BY date, user",
        placeholders(users.len())
    ))?;

    let params = users
        .iter()
        .map(String::as_str)
        .chain(std::iter::once(since.as_str()));

    let counts = stmt
        .query_map(rusqlite::params_from_iter(params), |row| models::DailyCount::try_from(row))?
        .collect::<DBResult<Vec<models::DailyCount>>>()?;

    Ok(counts)
}

/// The first day with any recorded activity for `users`.
pub fn query_first_activity(connection: &Connection, users: &[String]) -> DBResult<Option<NaiveDate>> {
    if users.is_empty() {
        return Ok(None);
    }

    let raw: Option<String> = connection
        .prepare(&format!(
            "SELECT min(date) FROM submissions_by_date WHERE user IN ({})",
            placeholders(users.len())
        ))?
        .query_row(rusqlite::params_from_iter(users), |row| row.get(0))?;

    raw.as_deref().map(parse_view_date).transpose()
}

fn placeholders(count: usize) -> String {
    std::iter::repeat_n("?", count).join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::judgedb::{tracking, users};
    use chrono::{TimeZone, Utc};

    fn submission(id: i64, date: &str) -> models::RemoteSubmission {
        models::RemoteSubmission {
            id: Some(id),
            problem: Some(String::from("aplusb")),
            date: Some(date.to_string()),
            language: Some(String::from("PY3")),
            time: Some(0.02),
            memory: Some(9216.0),
            points: Some(10.0),
            result: Some(String::from("AC")),
            contest: None,
        }
    }

    fn batch(connection: &Connection, name: &str) -> (models::User, i64) {
        let user = users::get_or_create_user(connection, name).unwrap();
        let run = Utc.with_ymd_and_hms(2025, 10, 1, 0, 0, 0).unwrap();
        let tracking_id = tracking::insert_tracking(connection, &user, run).unwrap();
        (user, tracking_id)
    }

    #[test]
    fn duplicate_judge_id_is_not_inserted_twice() {
        let connection = judgedb::open_in_memory().unwrap();
        let (_, tracking_id) = batch(&connection, "fer");

        let sub = submission(7, "2025-09-12T10:00:00+00:00");
        assert!(insert_submission(&connection, tracking_id, &sub).unwrap());
        assert!(!insert_submission(&connection, tracking_id, &sub).unwrap());

        let rows: i64 = connection
            .query_row("SELECT count(*) FROM submission", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn contest_fields_are_flattened() {
        let connection = judgedb::open_in_memory().unwrap();
        let (_, tracking_id) = batch(&connection, "fer");

        let mut sub = submission(8, "2025-09-12T10:00:00+00:00");
        sub.contest = Some(models::RemoteContest {
            key: Some(String::from("weekly1")),
            points: Some(3.5),
        });
        insert_submission(&connection, tracking_id, &sub).unwrap();

        let (name, points): (String, f64) = connection
            .query_row("SELECT contest_name, contest_points FROM submission", [], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })
            .unwrap();
        assert_eq!(name, "weekly1");
        assert_eq!(points, 3.5);
    }

    #[test]
    fn last_submission_is_per_user() {
        let connection = judgedb::open_in_memory().unwrap();
        let (fer, fer_batch) = batch(&connection, "fer");
        let (admin, _) = batch(&connection, "admin");

        assert_eq!(query_last_submission(&connection, &fer).unwrap(), None);

        insert_submission(&connection, fer_batch, &submission(1, "2025-09-12T10:00:00+00:00")).unwrap();
        insert_submission(&connection, fer_batch, &submission(2, "2025-09-14T09:00:00+00:00")).unwrap();

        assert_eq!(
            query_last_submission(&connection, &fer).unwrap().as_deref(),
            Some("2025-09-14T09:00:00+00:00")
        );
        assert_eq!(query_last_submission(&connection, &admin).unwrap(), None);
    }

    #[test]
    fn counts_are_grouped_by_user_and_day() {
        let connection = judgedb::open_in_memory().unwrap();
        let (_, fer_batch) = batch(&connection, "fer");
        let (_, admin_batch) = batch(&connection, "admin");
        let (_, other_batch) = batch(&connection, "outsider");

        insert_submission(&connection, fer_batch, &submission(1, "2025-09-12T10:00:00+00:00")).unwrap();
        insert_submission(&connection, fer_batch, &submission(2, "2025-09-12T23:00:00+00:00")).unwrap();
        insert_submission(&connection, fer_batch, &submission(3, "2025-09-13T01:00:00+00:00")).unwrap();
        insert_submission(&connection, admin_batch, &submission(4, "2025-09-11T12:00:00+00:00")).unwrap();
        insert_submission(&connection, other_batch, &submission(5, "2025-09-12T12:00:00+00:00")).unwrap();

        let students = vec![String::from("fer"), String::from("admin")];
        let day = |d| NaiveDate::from_ymd_opt(2025, 9, d).unwrap();

        let counts = query_submissions_by_date(&connection, &students, day(12)).unwrap();
        assert_eq!(
            counts,
            vec![
                models::DailyCount { user: String::from("fer"), date: day(12), problems: 2 },
                models::DailyCount { user: String::from("fer"), date: day(13), problems: 1 },
            ]
        );

        assert_eq!(query_first_activity(&connection, &students).unwrap(), Some(day(11)));
        assert_eq!(query_first_activity(&connection, &[]).unwrap(), None);
        assert_eq!(query_last_activity(&connection, &students).unwrap(), Some(day(13)));
        assert_eq!(query_last_activity(&connection, &[]).unwrap(), None);
    }

    #[test]
    fn last_submission_compares_instants_across_offsets() {
        let connection = judgedb::open_in_memory().unwrap();
        let (fer, fer_batch) = batch(&connection, "fer");

        // Sorts last as text, but is 2025-09-13T23:00Z.
        insert_submission(&connection, fer_batch, &submission(1, "2025-09-14T01:00:00+02:00")).unwrap();
        insert_submission(&connection, fer_batch, &submission(2, "2025-09-13T23:30:00+00:00")).unwrap();

        assert_eq!(
            query_last_submission(&connection, &fer).unwrap().as_deref(),
            Some("2025-09-13T23:30:00+00:00")
        );
    }

    #[test]
    fn integrity_errors_are_not_mistaken_for_duplicates() {
        let connection = judgedb::open_in_memory().unwrap();

        // No tracking row with this id: FOREIGN KEY failure, not a duplicate.
        let result = insert_submission(&connection, 999, &submission(1, "2025-09-12T10:00:00+00:00"));

        assert!(result.is_err());
    }
}
