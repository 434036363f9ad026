use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::Connection;

pub mod schema;
pub mod submissions;
pub mod tracking;
pub mod users;

pub type DBResult<T> = rusqlite::Result<T>;

/// Opens (creating if needed) the database at `path` and makes sure the schema exists.
///
/// The returned connection is the session for a whole command; it is closed when dropped.
pub fn open(path: impl AsRef<Path>) -> Result<Connection> {
    let path = path.as_ref();
    log::debug!("[open] Opening database {}", path.display());

    let connection = Connection::open(path)
        .with_context(|| format!("Could not open database: {}", path.display()))?;
    prepare(&connection)
        .with_context(|| format!("Could not initialize database: {}", path.display()))?;

    Ok(connection)
}

pub fn open_in_memory() -> DBResult<Connection> {
    let connection = Connection::open_in_memory()?;
    prepare(&connection)?;
    Ok(connection)
}

fn prepare(connection: &Connection) -> DBResult<()> {
    connection.pragma_update(None, "foreign_keys", true)?;
    schema::initialize_schema(connection)
}

/// Maps a UNIQUE violation to `Ok(false)` ("already there") and passes every other error on,
/// including NOT NULL and FOREIGN KEY failures.
pub(crate) fn swallow_constraint_violation(err: rusqlite::Error) -> DBResult<bool> {
    match err {
        rusqlite::Error::SqliteFailure(ref failure, _)
            if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            log::trace!("[swallow_constraint_violation] Ignoring duplicate row: {err}");
            Ok(false)
        }
        other => Err(other),
    }
}
