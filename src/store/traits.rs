//! `Database` trait: single async interface for all persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::DatabaseError;

/// A stored user profile row.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredProfile {
    pub id: String,
    /// Flattened profile columns as a JSON object.
    pub data: serde_json::Value,
    pub updated_at: DateTime<Utc>,
}

/// Backend-agnostic database trait covering profiles and settings.
#[async_trait]
pub trait Database: Send + Sync {
    /// Run all pending schema migrations.
    async fn run_migrations(&self) -> Result<(), DatabaseError>;

    // ── Profiles ────────────────────────────────────────────────────

    /// Insert or replace the profile keyed by `user_id`. Last write wins.
    async fn upsert_profile(
        &self,
        user_id: &str,
        data: &serde_json::Value,
    ) -> Result<(), DatabaseError>;

    async fn get_profile(&self, user_id: &str) -> Result<Option<StoredProfile>, DatabaseError>;

    // ── Settings ────────────────────────────────────────────────────

    async fn get_setting(
        &self,
        user_id: &str,
        key: &str,
    ) -> Result<Option<serde_json::Value>, DatabaseError>;

    async fn set_setting(
        &self,
        user_id: &str,
        key: &str,
        value: &serde_json::Value,
    ) -> Result<(), DatabaseError>;
}
