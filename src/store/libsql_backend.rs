//! libSQL backend: async `Database` trait implementation.
//!
//! Supports local file and in-memory databases.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::{Connection, Database as LibSqlDatabase, params};
use tracing::{debug, info};

use crate::error::DatabaseError;
use crate::store::migrations;
use crate::store::traits::{Database, StoredProfile};

/// libSQL database backend.
///
/// Holds one connection reused for all operations; `libsql::Connection` is
/// safe for concurrent async use.
pub struct LibSqlBackend {
    _db: Arc<LibSqlDatabase>,
    conn: Connection,
}

impl LibSqlBackend {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::Pool(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DatabaseError::Pool(format!("Failed to open libSQL database: {e}")))?;

        let backend = Self::from_database(db)?;
        backend.run_migrations().await?;
        info!(path = %path.display(), "Database opened");
        Ok(backend)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, DatabaseError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| {
                DatabaseError::Pool(format!("Failed to create in-memory database: {e}"))
            })?;

        let backend = Self::from_database(db)?;
        backend.run_migrations().await?;
        Ok(backend)
    }

    fn from_database(db: LibSqlDatabase) -> Result<Self, DatabaseError> {
        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to create connection: {e}")))?;
        Ok(Self {
            _db: Arc::new(db),
            conn,
        })
    }

    fn conn(&self) -> &Connection {
        &self.conn
    }
}

/// Parse an RFC 3339 or SQLite datetime string.
fn parse_datetime(s: &str) -> DateTime<Utc> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return dt.with_timezone(&Utc);
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return ndt.and_utc();
    }
    DateTime::<Utc>::MIN_UTC
}

#[async_trait]
impl Database for LibSqlBackend {
    async fn run_migrations(&self) -> Result<(), DatabaseError> {
        migrations::run_migrations(self.conn()).await
    }

    // ── Profiles ────────────────────────────────────────────────────

    async fn upsert_profile(
        &self,
        user_id: &str,
        data: &serde_json::Value,
    ) -> Result<(), DatabaseError> {
        let now = Utc::now().to_rfc3339();
        let data_str =
            serde_json::to_string(data).map_err(|e| DatabaseError::Serialization(e.to_string()))?;

        self.conn()
            .execute(
                "INSERT INTO user_profiles (id, data, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT (id) DO UPDATE SET data = ?2, updated_at = ?3",
                params![user_id, data_str, now],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("upsert_profile: {e}")))?;

        debug!(user_id, "Profile upserted");
        Ok(())
    }

    async fn get_profile(&self, user_id: &str) -> Result<Option<StoredProfile>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                "SELECT id, data, updated_at FROM user_profiles WHERE id = ?1",
                params![user_id],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("get_profile: {e}")))?;

        let row = match rows.next().await {
            Ok(Some(row)) => row,
            Ok(None) => return Ok(None),
            Err(e) => return Err(DatabaseError::Query(format!("get_profile: {e}"))),
        };

        let id: String = row
            .get(0)
            .map_err(|e| DatabaseError::Query(format!("get_profile id: {e}")))?;
        let data_str: String = row.get(1).unwrap_or_else(|_| "{}".to_string());
        let updated_at: String = row.get(2).unwrap_or_default();
        let data = serde_json::from_str(&data_str)
            .map_err(|e| DatabaseError::Serialization(e.to_string()))?;

        Ok(Some(StoredProfile {
            id,
            data,
            updated_at: parse_datetime(&updated_at),
        }))
    }

    // ── Settings ────────────────────────────────────────────────────

    async fn get_setting(
        &self,
        user_id: &str,
        key: &str,
    ) -> Result<Option<serde_json::Value>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                "SELECT value FROM settings WHERE user_id = ?1 AND key = ?2",
                params![user_id, key],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("get_setting: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => {
                let value_str: String = row.get(0).unwrap_or_else(|_| "null".to_string());
                let value: serde_json::Value =
                    serde_json::from_str(&value_str).unwrap_or(serde_json::Value::Null);
                Ok(Some(value))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("get_setting: {e}"))),
        }
    }

    async fn set_setting(
        &self,
        user_id: &str,
        key: &str,
        value: &serde_json::Value,
    ) -> Result<(), DatabaseError> {
        let now = Utc::now().to_rfc3339();
        let value_str = serde_json::to_string(value)
            .map_err(|e| DatabaseError::Serialization(e.to_string()))?;

        self.conn()
            .execute(
                "INSERT INTO settings (user_id, key, value, updated_at) VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT (user_id, key) DO UPDATE SET value = ?3, updated_at = ?4",
                params![user_id, key, value_str, now],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("set_setting: {e}")))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn test_db() -> LibSqlBackend {
        LibSqlBackend::new_memory().await.unwrap()
    }

    // ── Profile tests ───────────────────────────────────────────────

    #[tokio::test]
    async fn profile_upsert_is_last_write_wins() {
        let db = test_db().await;
        db.upsert_profile("user1", &json!({"first_name": "Alice", "age": 30}))
            .await
            .unwrap();
        db.upsert_profile("user1", &json!({"first_name": "Alicia"}))
            .await
            .unwrap();

        let profile = db.get_profile("user1").await.unwrap().unwrap();
        assert_eq!(profile.id, "user1");
        assert_eq!(profile.data, json!({"first_name": "Alicia"}));
        assert!(profile.updated_at > DateTime::<Utc>::MIN_UTC);
    }

    #[tokio::test]
    async fn profile_get_nonexistent() {
        let db = test_db().await;
        assert!(db.get_profile("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn on_disk_database_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("fit.db");
        {
            let db = LibSqlBackend::new_local(&path).await.unwrap();
            db.upsert_profile("user1", &json!({"sport": "rugby"}))
                .await
                .unwrap();
        }
        let db = LibSqlBackend::new_local(&path).await.unwrap();
        let profile = db.get_profile("user1").await.unwrap().unwrap();
        assert_eq!(profile.data["sport"], "rugby");
    }

    // ── Settings tests ──────────────────────────────────────────────

    #[tokio::test]
    async fn settings_crud() {
        let db = test_db().await;
        let value = json!({"current_step_id": "get_name"});

        db.set_setting("user1", "onboarding_state", &value)
            .await
            .unwrap();
        let fetched = db
            .get_setting("user1", "onboarding_state")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fetched["current_step_id"], "get_name");

        db.set_setting("user1", "onboarding_state", &json!({"current_step_id": "completion"}))
            .await
            .unwrap();
        let fetched = db
            .get_setting("user1", "onboarding_state")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fetched["current_step_id"], "completion");
        assert!(db.get_setting("user2", "onboarding_state").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn settings_user_isolation() {
        let db = test_db().await;
        db.set_setting("user1", "key", &json!("val1")).await.unwrap();
        db.set_setting("user2", "key", &json!("val2")).await.unwrap();

        assert_eq!(db.get_setting("user1", "key").await.unwrap().unwrap(), "val1");
        assert_eq!(db.get_setting("user2", "key").await.unwrap().unwrap(), "val2");
    }

    #[tokio::test]
    async fn migrations_are_idempotent() {
        let db = test_db().await;
        db.run_migrations().await.unwrap();
    }
}
