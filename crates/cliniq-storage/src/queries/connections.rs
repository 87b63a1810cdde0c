// SPDX-FileCopyrightText: 2026 Cliniq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Connection record CRUD operations.
//!
//! Only the owner id and the operation are ever logged; the sealed secret is
//! passed straight through to SQLite.

use cliniq_core::{CliniqError, ConnectionRecord, OwnerId};
use rusqlite::params;
use tracing::debug;

use crate::database::{Database, map_tr_err};

const SELECT_COLUMNS: &str =
    "SELECT owner_id, base_url, encrypted_secret, workflow_scope, created_at, updated_at
     FROM connections";

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<ConnectionRecord> {
    Ok(ConnectionRecord {
        owner_id: OwnerId(row.get(0)?),
        base_url: row.get(1)?,
        encrypted_secret: row.get(2)?,
        workflow_scope: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

/// Insert a record, or replace the owner's existing one in a single statement.
///
/// `created_at` of an existing row is kept.
pub async fn upsert_connection(db: &Database, record: &ConnectionRecord) -> Result<(), CliniqError> {
    let record = record.clone();
    let owner = record.owner_id.clone();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT INTO connections
                    (owner_id, base_url, encrypted_secret, workflow_scope, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(owner_id) DO UPDATE SET
                    base_url = excluded.base_url,
                    encrypted_secret = excluded.encrypted_secret,
                    workflow_scope = excluded.workflow_scope,
                    updated_at = excluded.updated_at",
                params![
                    record.owner_id.0,
                    record.base_url,
                    record.encrypted_secret,
                    record.workflow_scope,
                    record.created_at,
                    record.updated_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;
    debug!(owner = %owner, "connection upserted");
    Ok(())
}

/// Get the owner's record.
pub async fn get_connection(
    db: &Database,
    owner: &OwnerId,
) -> Result<Option<ConnectionRecord>, CliniqError> {
    let owner = owner.0.clone();
    db.connection()
        .call(move |conn| -> Result<Option<ConnectionRecord>, rusqlite::Error> {
            let mut stmt = conn.prepare(&format!("{SELECT_COLUMNS} WHERE owner_id = ?1"))?;
            match stmt.query_row(params![owner], row_to_record) {
                Ok(record) => Ok(Some(record)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Delete the owner's record. Returns whether a row was removed.
pub async fn delete_connection(db: &Database, owner: &OwnerId) -> Result<bool, CliniqError> {
    let owner_key = owner.0.clone();
    let removed = db
        .connection()
        .call(move |conn| -> Result<usize, rusqlite::Error> {
            conn.execute(
                "DELETE FROM connections WHERE owner_id = ?1",
                params![owner_key],
            )
        })
        .await
        .map_err(map_tr_err)?;
    debug!(owner = %owner, removed = removed > 0, "connection deleted");
    Ok(removed > 0)
}

/// List every stored record, ordered by owner id.
pub async fn list_connections(db: &Database) -> Result<Vec<ConnectionRecord>, CliniqError> {
    db.connection()
        .call(|conn| -> Result<Vec<ConnectionRecord>, rusqlite::Error> {
            let mut stmt = conn.prepare(&format!("{SELECT_COLUMNS} ORDER BY owner_id"))?;
            let rows = stmt.query_map([], row_to_record)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}
