#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! `SQLite`-backed storage for crime reports and community votes.
//!
//! Uses `switchy_database` for all database operations. The schema is
//! created on open with `CREATE TABLE IF NOT EXISTS`; votes reference
//! their report with `ON DELETE CASCADE` so deleting a report
//! orphan-cleans its votes.

pub mod queries;

use std::path::Path;

use switchy_database::Database;
use switchy_database_connection::init_sqlite_rusqlite;
use thiserror::Error;

/// Default path for the reports database.
pub const DEFAULT_DB_PATH: &str = "data/crime_watch.db";

/// Errors that can occur during database operations.
#[derive(Debug, Error)]
pub enum DbError {
    /// Database query error.
    #[error("Database error: {0}")]
    Database(#[from] switchy_database::DatabaseError),

    /// Data conversion error.
    #[error("Data conversion error: {message}")]
    Conversion {
        /// Description of what went wrong.
        message: String,
    },

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DbError {
    pub(crate) fn conversion(message: impl Into<String>) -> Self {
        Self::Conversion {
            message: message.into(),
        }
    }
}

/// Opens (or creates) the reports `SQLite` database and ensures the
/// schema exists.
///
/// Pass `None` for an in-memory database (used by tests).
///
/// # Errors
///
/// Returns [`DbError`] if the database cannot be opened or schema
/// creation fails.
pub async fn open_db(path: Option<&Path>) -> Result<Box<dyn Database>, DbError> {
    if let Some(parent) = path.and_then(Path::parent) {
        std::fs::create_dir_all(parent)?;
    }

    let db = init_sqlite_rusqlite(path)
        .map_err(|e| DbError::conversion(format!("Failed to open SQLite database: {e}")))?;

    ensure_schema(db.as_ref()).await?;
    log::info!("Reports database ready");

    Ok(db)
}

/// Creates all tables and indexes if they don't already exist.
async fn ensure_schema(db: &dyn Database) -> Result<(), DbError> {
    db.exec_raw(
        "CREATE TABLE IF NOT EXISTS crime_reports (
            id                  TEXT PRIMARY KEY,
            reporter_id         TEXT NOT NULL,
            title               TEXT,
            description         TEXT,
            category            TEXT,
            lat                 REAL,
            lng                 REAL,
            address             TEXT,
            province            TEXT,
            district            TEXT,
            ward                TEXT,
            street              TEXT,
            attachments         TEXT NOT NULL DEFAULT '[]',
            status              INTEGER NOT NULL DEFAULT 0,
            severity            INTEGER NOT NULL DEFAULT 1,
            confirmation_count  INTEGER NOT NULL DEFAULT 0,
            dispute_count       INTEGER NOT NULL DEFAULT 0,
            trust_score         INTEGER NOT NULL DEFAULT 0,
            verification_level  TEXT NOT NULL DEFAULT 'unverified',
            verified_by         TEXT,
            verified_at         TEXT,
            reported_at         TEXT,
            created_at          TEXT NOT NULL,
            updated_at          TEXT NOT NULL
        )",
    )
    .await?;

    db.exec_raw(
        "CREATE TABLE IF NOT EXISTS report_votes (
            id          TEXT PRIMARY KEY,
            voter_id    TEXT NOT NULL,
            report_id   TEXT NOT NULL REFERENCES crime_reports(id) ON DELETE CASCADE,
            vote_kind   TEXT NOT NULL,
            created_at  TEXT NOT NULL,
            UNIQUE(voter_id, report_id, vote_kind)
        )",
    )
    .await?;

    db.exec_raw(
        "CREATE INDEX IF NOT EXISTS idx_report_votes_report
         ON report_votes (report_id, voter_id)",
    )
    .await?;

    db.exec_raw(
        "CREATE INDEX IF NOT EXISTS idx_crime_reports_reporter
         ON crime_reports (reporter_id)",
    )
    .await?;

    db.exec_raw(
        "CREATE INDEX IF NOT EXISTS idx_crime_reports_district
         ON crime_reports (district)",
    )
    .await?;

    // Enable foreign key enforcement (SQLite has it off by default)
    db.exec_raw("PRAGMA foreign_keys = ON").await?;

    Ok(())
}
