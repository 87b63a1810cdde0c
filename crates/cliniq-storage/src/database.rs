// SPDX-FileCopyrightText: 2026 Cliniq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All reads and writes are serialized through tokio-rusqlite's single
//! background thread. Do NOT create additional Connection instances for writes.

use std::path::Path;

use cliniq_core::CliniqError;
use tracing::debug;

use crate::migrations;

/// An open, migrated SQLite database.
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").finish_non_exhaustive()
    }
}

impl Database {
    /// Open (creating if needed) the database at `path` and run migrations.
    ///
    /// Migrations run on a blocking thread with a short-lived connection
    /// before the long-lived async connection is opened.
    pub async fn open(path: &str, wal_mode: bool) -> Result<Self, CliniqError> {
        if let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(CliniqError::storage)?;
        }

        let migrate_path = path.to_string();
        tokio::task::spawn_blocking(move || -> Result<(), CliniqError> {
            let mut conn = rusqlite::Connection::open(&migrate_path).map_err(CliniqError::storage)?;
            if wal_mode {
                conn.pragma_update(None, "journal_mode", "WAL")
                    .map_err(CliniqError::storage)?;
            }
            migrations::run_migrations(&mut conn)
        })
        .await
        .map_err(|e| CliniqError::Internal(format!("migration task failed: {e}")))??;

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(CliniqError::storage)?;
        let db = Self { conn };
        db.apply_pragmas().await?;
        debug!(path = %path, wal_mode, "database opened");
        Ok(db)
    }

    async fn apply_pragmas(&self) -> Result<(), CliniqError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch(
                    "PRAGMA foreign_keys = ON;
                     PRAGMA synchronous = NORMAL;
                     PRAGMA busy_timeout = 5000;",
                )
            })
            .await
            .map_err(map_tr_err)
    }

    /// The single async connection.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }
}

/// Convert tokio-rusqlite errors to [`CliniqError::Storage`].
pub fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> CliniqError {
    CliniqError::Storage {
        source: format!("database error: {e}").into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn table_exists(db: &Database) -> bool {
        db.connection()
            .call(|conn| -> Result<bool, rusqlite::Error> {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'connections'",
                    [],
                    |row| row.get(0),
                )?;
                Ok(count == 1)
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn open_creates_file_and_schema() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("cliniq.db");
        let db = Database::open(path.to_str().unwrap(), true).await.unwrap();

        assert!(path.exists());
        assert!(table_exists(&db).await);
    }

    #[tokio::test]
    async fn reopen_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cliniq.db");
        let path = path.to_str().unwrap();

        drop(Database::open(path, true).await.unwrap());
        let db = Database::open(path, true).await.unwrap();
        assert!(table_exists(&db).await);
    }

    #[tokio::test]
    async fn unopenable_path_is_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Database::open(dir.path().to_str().unwrap(), false)
            .await
            .err()
            .unwrap();
        assert!(matches!(err, CliniqError::Storage { .. }));
    }
}
