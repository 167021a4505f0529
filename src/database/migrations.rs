//! Versioned schema for the linkflow database.
//!
//! Each step in [`MIGRATIONS`] runs once, inside its own transaction, and is
//! recorded in `schema_version` together with the time it was applied.

use rusqlite::{params, Connection};
use tracing::info;

type Step = fn(&Connection) -> Result<(), rusqlite::Error>;

/// Ordered schema steps: version, description, body.
const MIGRATIONS: &[(i32, &str, Step)] = &[
    (1, "Initial schema: links table", create_links),
    (2, "Add project_id and triage indexes", add_project_reference),
];

/// Highest version in [`MIGRATIONS`].
pub const CURRENT_SCHEMA_VERSION: i32 = 2;

/// Highest applied version, or 0 for a fresh database.
pub fn get_schema_version(conn: &Connection) -> i32 {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )
    .unwrap_or(0)
}

/// Brings `conn` up to [`CURRENT_SCHEMA_VERSION`]. Idempotent.
pub fn run_all(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         CREATE TABLE IF NOT EXISTS schema_version (
             version INTEGER PRIMARY KEY,
             applied_at INTEGER NOT NULL,
             description TEXT NOT NULL
         );",
    )?;

    let current = get_schema_version(conn);
    for &(version, description, step) in MIGRATIONS.iter().filter(|(v, _, _)| *v > current) {
        let tx = conn.unchecked_transaction()?;
        step(&tx)?;
        tx.execute(
            "INSERT OR IGNORE INTO schema_version (version, applied_at, description) VALUES (?1, ?2, ?3)",
            params![version, chrono::Utc::now().timestamp(), description],
        )?;
        tx.commit()?;
        info!(version, description, "schema migration applied");
    }
    Ok(())
}

/// v1. A NULL `action` means the same as '' (not yet triaged).
fn create_links(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS links (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            url TEXT NOT NULL,
            title TEXT NOT NULL,
            description TEXT,
            content TEXT,
            action TEXT DEFAULT '',
            topic TEXT,
            share_to TEXT,
            tags TEXT NOT NULL DEFAULT '[]',
            custom_properties TEXT NOT NULL DEFAULT '{}',
            timestamp TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_links_timestamp ON links(timestamp);
        ",
    )
}

/// v2. Older files may already carry `project_id` from a manual ALTER.
fn add_project_reference(conn: &Connection) -> Result<(), rusqlite::Error> {
    let has_project_id: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM pragma_table_info('links') WHERE name = 'project_id'",
        [],
        |row| row.get(0),
    )?;
    if !has_project_id {
        conn.execute_batch("ALTER TABLE links ADD COLUMN project_id INTEGER;")?;
    }
    conn.execute_batch(
        "
        CREATE INDEX IF NOT EXISTS idx_links_action ON links(action);
        CREATE INDEX IF NOT EXISTS idx_links_topic ON links(topic);
        ",
    )
}
