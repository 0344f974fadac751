//! Saving onboarding progress.
//!
//! Answers are flattened into a single profile record keyed by user id, using
//! a per-flow column mapping. Categorical answers go through fixed remap
//! tables that fall back to a default for unknown values.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::sync::Mutex;

use crate::error::{DatabaseError, PersistenceError};
use crate::store::Database;

use super::response::AnswerValue;
use super::state::OnboardingState;

/// Settings key under which the final session snapshot is stored.
pub const STATE_SETTING_KEY: &str = "onboarding_state";

/// Result of a save attempt, reported to the caller instead of raised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum SaveOutcome {
    /// The step is not a checkpoint; nothing was written.
    Skipped,
    Saved,
    Failed(String),
}

impl SaveOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

// ── Categorical remaps ──────────────────────────────────────────────────

/// Main objective → stored fitness goal. Unknown values become `general`.
pub fn map_fitness_goal(objective: &str) -> &'static str {
    match objective {
        "performance" => "performance",
        "health_wellness" => "general_health",
        "body_composition" => "muscle_gain",
        "energy_sleep" => "energy",
        "strength_building" => "strength",
        "endurance_cardio" => "endurance",
        "recovery_focus" => "recovery",
        "weight_management" => "maintenance",
        "weight_loss" => "weight_loss",
        "muscle_gain" => "muscle_gain",
        _ => "general",
    }
}

/// Sport or experience level → stored sport level. Unknown values become
/// `recreational`.
pub fn map_sport_level(level: &str) -> &'static str {
    match level {
        "recreational" | "beginner" => "recreational",
        "amateur_competitive" | "intermediate" => "amateur_competitive",
        "semi_professional" | "advanced" => "semi_professional",
        "professional" | "expert" => "professional",
        _ => "recreational",
    }
}

// ── Column mapping ──────────────────────────────────────────────────────

/// Computes a column from the whole session state.
pub type ColumnFn = fn(&OnboardingState) -> Value;

#[derive(Clone)]
enum Source {
    /// Raw answer, `null` when missing.
    Answer(&'static str),
    /// Raw answer, `default` when missing.
    AnswerOr(&'static str, Value),
    /// List answer, `default` when missing or empty.
    ListOr(&'static str, &'static [&'static str]),
    /// Text answer through a remap table; missing values remap from "".
    Remap(&'static str, fn(&str) -> &'static str),
    Computed(ColumnFn),
}

#[derive(Clone)]
struct Column {
    name: &'static str,
    source: Source,
}

/// Per-flow mapping from answers to external profile columns.
#[derive(Clone, Default)]
pub struct RecordMapping {
    columns: Vec<Column>,
}

impl std::fmt::Debug for RecordMapping {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.column_names()).finish()
    }
}

impl RecordMapping {
    pub fn new() -> Self {
        Self::default()
    }

    fn column(mut self, name: &'static str, source: Source) -> Self {
        self.columns.push(Column { name, source });
        self
    }

    pub fn answer(self, column: &'static str, field: &'static str) -> Self {
        self.column(column, Source::Answer(field))
    }

    pub fn answer_or(self, column: &'static str, field: &'static str, default: impl Into<Value>) -> Self {
        self.column(column, Source::AnswerOr(field, default.into()))
    }

    pub fn list_or(
        self,
        column: &'static str,
        field: &'static str,
        default: &'static [&'static str],
    ) -> Self {
        self.column(column, Source::ListOr(field, default))
    }

    pub fn remap(self, column: &'static str, field: &'static str, table: fn(&str) -> &'static str) -> Self {
        self.column(column, Source::Remap(field, table))
    }

    pub fn computed(self, column: &'static str, f: ColumnFn) -> Self {
        self.column(column, Source::Computed(f))
    }

    pub fn column_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.columns.iter().map(|c| c.name)
    }

    /// Flatten `state` into a record for `user_id`.
    pub fn build(&self, user_id: &str, state: &OnboardingState, now: DateTime<Utc>) -> ProfileRecord {
        let answers = &state.answers;
        let mut map = Map::new();
        map.insert("id".into(), Value::String(user_id.to_string()));
        for column in &self.columns {
            let value = match &column.source {
                Source::Answer(field) => answers.get(field).map(answer_json).unwrap_or(Value::Null),
                Source::AnswerOr(field, default) => answers
                    .get(field)
                    .map(answer_json)
                    .unwrap_or_else(|| default.clone()),
                Source::ListOr(field, default) => {
                    let list = answers.get_list(field);
                    if list.is_empty() {
                        Value::from(default.to_vec())
                    } else {
                        Value::from(list.to_vec())
                    }
                }
                Source::Remap(field, table) => {
                    Value::from(table(answers.get_str(field).unwrap_or_default()))
                }
                Source::Computed(f) => f(state),
            };
            map.insert(column.name.to_string(), value);
        }
        map.insert("updated_at".into(), Value::String(now.to_rfc3339()));
        ProfileRecord(map)
    }
}

/// Whole numbers become JSON integers so numeric columns stay integral.
fn answer_json(value: &AnswerValue) -> Value {
    match value {
        AnswerValue::Bool(b) => Value::Bool(*b),
        AnswerValue::Number(n) if n.fract() == 0.0 && n.abs() < i64::MAX as f64 => {
            Value::from(*n as i64)
        }
        AnswerValue::Number(n) => serde_json::Number::from_f64(*n)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        AnswerValue::Text(s) => Value::String(s.clone()),
        AnswerValue::List(items) => Value::from(items.clone()),
    }
}

/// A flattened profile row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ProfileRecord(Map<String, Value>);

impl ProfileRecord {
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0.get(column)
    }

    pub fn user_id(&self) -> Option<&str> {
        self.0.get("id").and_then(Value::as_str)
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }
}

// ── Stores ──────────────────────────────────────────────────────────────

/// Destination for onboarding progress.
#[async_trait]
pub trait ProgressStore: Send + Sync {
    /// Upsert the flattened profile for `user_id`. Last write wins.
    async fn save_progress(&self, user_id: &str, record: &ProfileRecord) -> Result<(), PersistenceError>;

    /// Store the raw session snapshot for `user_id`.
    async fn save_snapshot(&self, user_id: &str, state: &OnboardingState) -> Result<(), PersistenceError>;
}

/// Progress store over the application database.
pub struct LibSqlProgressStore {
    db: Arc<dyn Database>,
}

impl LibSqlProgressStore {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ProgressStore for LibSqlProgressStore {
    async fn save_progress(&self, user_id: &str, record: &ProfileRecord) -> Result<(), PersistenceError> {
        self.db.upsert_profile(user_id, &record.to_value()).await?;
        Ok(())
    }

    async fn save_snapshot(&self, user_id: &str, state: &OnboardingState) -> Result<(), PersistenceError> {
        let value = serde_json::to_value(state)?;
        self.db.set_setting(user_id, STATE_SETTING_KEY, &value).await?;
        Ok(())
    }
}

/// In-memory progress store. Can be switched to fail every write.
#[derive(Debug, Default)]
pub struct MemoryProgressStore {
    records: Mutex<HashMap<String, ProfileRecord>>,
    snapshots: Mutex<HashMap<String, OnboardingState>>,
    saves: AtomicUsize,
    failing: AtomicBool,
}

impl MemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Successful `save_progress` calls so far.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub async fn record(&self, user_id: &str) -> Option<ProfileRecord> {
        self.records.lock().await.get(user_id).cloned()
    }

    pub async fn snapshot(&self, user_id: &str) -> Option<OnboardingState> {
        self.snapshots.lock().await.get(user_id).cloned()
    }

    fn check(&self) -> Result<(), PersistenceError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(DatabaseError::Query("store unavailable".into()).into());
        }
        Ok(())
    }
}

#[async_trait]
impl ProgressStore for MemoryProgressStore {
    async fn save_progress(&self, user_id: &str, record: &ProfileRecord) -> Result<(), PersistenceError> {
        self.check()?;
        self.records
            .lock()
            .await
            .insert(user_id.to_string(), record.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn save_snapshot(&self, user_id: &str, state: &OnboardingState) -> Result<(), PersistenceError> {
        self.check()?;
        self.snapshots
            .lock()
            .await
            .insert(user_id.to_string(), state.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::onboarding::flow::{FlowBuilder, Locale, LocalizedText, StepDefinition};
    use crate::store::LibSqlBackend;
    use serde_json::json;

    fn state() -> OnboardingState {
        let flow = FlowBuilder::new("t", "a", "done")
            .step(StepDefinition::info("a", LocalizedText::from("A")).next_step("done"))
            .step(StepDefinition::confirmation("done", LocalizedText::from("Done")))
            .build()
            .unwrap();
        OnboardingState::new(&flow, Locale::Fr, Utc::now())
    }

    fn mapping() -> RecordMapping {
        RecordMapping::new()
            .answer("first_name", "firstName")
            .answer("age", "age")
            .answer_or("sport", "sport", "none")
            .list_or("modules", "selectedModules", &["sport", "nutrition"])
            .remap("fitness_goal", "mainObjective", map_fitness_goal)
            .remap("sport_level", "sportLevel", map_sport_level)
            .computed("trial_modules", |s| json!(s.derived.trial_modules))
    }

    #[test]
    fn remaps_fall_back_to_defaults() {
        assert_eq!(map_fitness_goal("health_wellness"), "general_health");
        assert_eq!(map_fitness_goal("body_composition"), "muscle_gain");
        assert_eq!(map_fitness_goal("holistic"), "general");
        assert_eq!(map_fitness_goal(""), "general");
        assert_eq!(map_sport_level("intermediate"), "amateur_competitive");
        assert_eq!(map_sport_level("expert"), "professional");
        assert_eq!(map_sport_level("olympian"), "recreational");
    }

    #[test]
    fn record_flattens_answers_with_defaults() {
        let mut state = state();
        state.answers.insert("firstName", "Alice");
        state.answers.insert("age", 31.0);
        state.answers.insert("mainObjective", "energy_sleep");
        state.derived.trial_modules = vec!["strength".into()];

        let now = Utc::now();
        let record = mapping().build("user-1", &state, now);
        assert_eq!(
            record.to_value(),
            json!({
                "id": "user-1",
                "first_name": "Alice",
                "age": 31,
                "sport": "none",
                "modules": ["sport", "nutrition"],
                "fitness_goal": "energy",
                "sport_level": "recreational",
                "trial_modules": ["strength"],
                "updated_at": now.to_rfc3339(),
            })
        );
        assert_eq!(record.user_id(), Some("user-1"));
    }

    #[test]
    fn fractional_numbers_stay_floats() {
        let mut state = state();
        state.answers.insert("age", 7.5);
        let record = mapping().build("u", &state, Utc::now());
        assert_eq!(record.get("age"), Some(&json!(7.5)));
        assert_eq!(record.get("first_name"), Some(&Value::Null));
    }

    #[tokio::test]
    async fn memory_store_can_fail() {
        let store = MemoryProgressStore::new();
        let record = mapping().build("u", &state(), Utc::now());
        store.save_progress("u", &record).await.unwrap();
        assert_eq!(store.save_count(), 1);

        store.set_failing(true);
        let err = store.save_progress("u", &record).await.unwrap_err();
        assert!(matches!(err, PersistenceError::Store(_)));
        assert_eq!(store.save_count(), 1);
    }

    #[tokio::test]
    async fn libsql_store_writes_profile_and_snapshot() {
        let db: Arc<dyn Database> = Arc::new(LibSqlBackend::new_memory().await.unwrap());
        let store = LibSqlProgressStore::new(Arc::clone(&db));

        let mut state = state();
        state.answers.insert("firstName", "Alice");
        let record = mapping().build("user-1", &state, Utc::now());
        store.save_progress("user-1", &record).await.unwrap();
        store.save_snapshot("user-1", &state).await.unwrap();

        let profile = db.get_profile("user-1").await.unwrap().unwrap();
        assert_eq!(profile.data["first_name"], "Alice");
        let snapshot = db
            .get_setting("user-1", STATE_SETTING_KEY)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(snapshot["answers"]["firstName"], "Alice");
    }
}
