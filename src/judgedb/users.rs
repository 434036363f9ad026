use rusqlite::Connection;

use crate::{judgedb::DBResult, models};

/////*============== USER QUERIES ==============*/
impl<'a> TryFrom<&'a rusqlite::Row<'a>> for models::User {
    type Error = rusqlite::Error;

    fn try_from(row: &rusqlite::Row) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
        })
    }
}

/// Returns the user named `name`, if they exist.
pub fn query_user(connection: &Connection, name: &str) -> DBResult<Option<models::User>> {
    connection
        .prepare("SELECT id, name FROM user WHERE name = :name")?
        .query(rusqlite::named_params! { ":name": name })?
        .next()?
        .map(|row| row.try_into())
        .transpose()
}

pub fn insert_user(connection: &Connection, name: &str) -> DBResult<models::User> {
    log::trace!("[insert_user] Inserting user {name} into user...");

    connection
        .prepare("INSERT INTO user (name) VALUES (:name)")?
        .execute(rusqlite::named_params! { ":name": name })?;

    log::info!("User {name} has been added to the database.");

    Ok(models::User {
        id: connection.last_insert_rowid(),
        name: name.to_string(),
    })
}

/// Returns the user named `name`, inserting them first if this is their first collection.
pub fn get_or_create_user(connection: &Connection, name: &str) -> DBResult<models::User> {
    match query_user(connection, name)? {
        Some(user) => Ok(user),
        None => insert_user(connection, name),
    }
}
