// SPDX-FileCopyrightText: 2026 Cliniq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the CredentialStore trait.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use cliniq_config::model::StorageConfig;
use cliniq_core::{
    AdapterType, CliniqError, ConnectionRecord, CredentialStore, HealthStatus, OwnerId,
    PluginAdapter,
};

use crate::database::{Database, map_tr_err};
use crate::queries;

/// SQLite-backed credential store.
///
/// Wraps a [`Database`] handle and delegates to the typed query modules. The
/// database is opened on the first call to [`CredentialStore::initialize`].
pub struct SqliteCredentialStore {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteCredentialStore {
    /// Create a new store with the given configuration.
    ///
    /// The database is not opened until [`CredentialStore::initialize`] is called.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    fn db(&self) -> Result<&Database, CliniqError> {
        self.db.get().ok_or_else(|| CliniqError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }

    /// Every stored record. Used by operator diagnostics, never by request handlers.
    pub async fn list_records(&self) -> Result<Vec<ConnectionRecord>, CliniqError> {
        queries::connections::list_connections(self.db()?).await
    }

    async fn checkpoint(&self, db: &Database) -> Result<(), CliniqError> {
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")
            })
            .await
            .map_err(map_tr_err)
    }
}

#[async_trait]
impl PluginAdapter for SqliteCredentialStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, CliniqError> {
        let db = match self.db.get() {
            Some(db) => db,
            None => return Ok(HealthStatus::Unhealthy("not initialized".to_string())),
        };
        let probe = db
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.query_row("SELECT COUNT(*) FROM connections", [], |_| Ok(()))
            })
            .await;
        match probe {
            Ok(()) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(format!("query failed: {e}"))),
        }
    }

    async fn shutdown(&self) -> Result<(), CliniqError> {
        if let Some(db) = self.db.get() {
            self.checkpoint(db).await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for SqliteCredentialStore {
    async fn initialize(&self) -> Result<(), CliniqError> {
        let db = Database::open(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| CliniqError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite credential store initialized");
        Ok(())
    }

    async fn upsert(&self, record: &ConnectionRecord) -> Result<(), CliniqError> {
        queries::connections::upsert_connection(self.db()?, record).await
    }

    async fn get(&self, owner: &OwnerId) -> Result<Option<ConnectionRecord>, CliniqError> {
        queries::connections::get_connection(self.db()?, owner).await
    }

    async fn delete(&self, owner: &OwnerId) -> Result<bool, CliniqError> {
        queries::connections::delete_connection(self.db()?, owner).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn make_config(path: &str) -> StorageConfig {
        StorageConfig {
            database_path: path.to_string(),
            wal_mode: true,
            timeout_secs: 5,
        }
    }

    fn record(owner: &str, secret: &str) -> ConnectionRecord {
        ConnectionRecord {
            owner_id: OwnerId::from(owner),
            base_url: "https://n8n.example.com/api/v1".to_string(),
            encrypted_secret: secret.to_string(),
            workflow_scope: None,
            created_at: "2026-01-01T00:00:00Z".to_string(),
            updated_at: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    #[tokio::test]
    async fn store_implements_plugin_adapter() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let store = SqliteCredentialStore::new(make_config(db_path.to_str().unwrap()));

        assert_eq!(store.name(), "sqlite");
        assert_eq!(store.version(), semver::Version::new(0, 1, 0));
        assert_eq!(store.adapter_type(), AdapterType::Storage);
    }

    #[tokio::test]
    async fn initialize_twice_returns_error() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("double_init.db");
        let store = SqliteCredentialStore::new(make_config(db_path.to_str().unwrap()));

        store.initialize().await.unwrap();
        assert!(store.initialize().await.is_err());
    }

    #[tokio::test]
    async fn health_reflects_initialization() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("health.db");
        let store = SqliteCredentialStore::new(make_config(db_path.to_str().unwrap()));

        assert!(matches!(
            store.health_check().await.unwrap(),
            HealthStatus::Unhealthy(_)
        ));
        store.initialize().await.unwrap();
        assert_eq!(store.health_check().await.unwrap(), HealthStatus::Healthy);
    }

    #[tokio::test]
    async fn operations_before_initialize_are_storage_errors() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("no_init.db");
        let store = SqliteCredentialStore::new(make_config(db_path.to_str().unwrap()));

        let err = store.get(&OwnerId::from("u")).await.unwrap_err();
        assert!(matches!(err, CliniqError::Storage { .. }));
    }

    #[tokio::test]
    async fn lifecycle_through_trait_object() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("lifecycle.db");
        let store: Arc<dyn CredentialStore> = Arc::new(SqliteCredentialStore::new(make_config(
            db_path.to_str().unwrap(),
        )));
        store.initialize().await.unwrap();

        let owner = OwnerId::from("user-1");
        store.upsert(&record("user-1", "sealed-1")).await.unwrap();
        assert_eq!(
            store.get(&owner).await.unwrap().unwrap().encrypted_secret,
            "sealed-1"
        );

        assert!(store.delete(&owner).await.unwrap());
        assert!(store.get(&owner).await.unwrap().is_none());
        // Idempotent.
        assert!(!store.delete(&owner).await.unwrap());

        store.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn concurrent_upserts_leave_one_complete_record() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("race.db");
        let store = Arc::new(SqliteCredentialStore::new(make_config(
            db_path.to_str().unwrap(),
        )));
        store.initialize().await.unwrap();

        let mut handles = Vec::new();
        for i in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .upsert(&record("user-1", &format!("sealed-{i}")))
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let all = store.list_records().await.unwrap();
        assert_eq!(all.len(), 1);
        assert!(all[0].encrypted_secret.starts_with("sealed-"));
    }

    #[tokio::test]
    async fn records_survive_reopen() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("persist.db");
        let path = db_path.to_str().unwrap();

        {
            let store = SqliteCredentialStore::new(make_config(path));
            store.initialize().await.unwrap();
            store.upsert(&record("user-1", "sealed-1")).await.unwrap();
            store.shutdown().await.unwrap();
        }

        let store = SqliteCredentialStore::new(make_config(path));
        store.initialize().await.unwrap();
        assert!(store.get(&OwnerId::from("user-1")).await.unwrap().is_some());
    }
}
