//! Linkflow storage layer: one SQLite file with a versioned `links` schema.
//!
//! ```no_run
//! use linkflow::database::Database;
//!
//! let db = Database::open("linkflow.db").expect("failed to open database");
//! assert_eq!(db.schema_version(), linkflow::database::migrations::CURRENT_SCHEMA_VERSION);
//! ```

pub mod connection;
pub mod migrations;

pub use connection::Database;
