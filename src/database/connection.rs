//! SQLite connection handling for linkflow.

use std::path::Path;
use std::time::Duration;

use rusqlite::Connection;
use tracing::debug;

use super::migrations;

/// How long a writer waits on a locked database before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Owns the connection that holds the `links` table.
///
/// Migrations are applied on every open, so a `Database` is always at
/// [`migrations::CURRENT_SCHEMA_VERSION`].
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens (or creates) the database file at `path`.
    ///
    /// # Errors
    /// Returns `rusqlite::Error` if the file cannot be opened or a migration fails.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, rusqlite::Error> {
        let path = path.as_ref();
        debug!(path = %path.display(), "opening link database");
        Self::prepare(Connection::open(path)?)
    }

    /// Opens a private in-memory database, dropped with the `Database`.
    pub fn open_in_memory() -> Result<Self, rusqlite::Error> {
        Self::prepare(Connection::open_in_memory()?)
    }

    fn prepare(conn: Connection) -> Result<Self, rusqlite::Error> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        migrations::run_all(&conn)?;
        Ok(Self { conn })
    }

    pub fn schema_version(&self) -> i32 {
        migrations::get_schema_version(&self.conn)
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}
