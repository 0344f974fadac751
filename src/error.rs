//! Error types for fit-onboard.

use uuid::Uuid;

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Flow error: {0}")]
    Flow(#[from] FlowError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),
}

/// Environment / application configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// A malformed flow definition, or a navigator asked to do something the
/// flow graph cannot support.
///
/// These are fatal: a well-formed flow never produces one at runtime, and
/// `Flow::build` rejects most of them before a session can start.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FlowError {
    #[error("Flow {flow} has no step {step_id}")]
    UnknownStep { flow: String, step_id: String },

    #[error("Duplicate step id {step_id} in flow {flow}")]
    DuplicateStep { flow: String, step_id: String },

    #[error("Step {from} points at {target}, which is neither a step nor the terminal")]
    DanglingTarget { from: String, target: String },

    #[error("Branch on step {from} resolved to undeclared target {target}")]
    UndeclaredBranchTarget { from: String, target: String },

    #[error("Step {step_id} is unreachable from the initial step")]
    Unreachable { step_id: String },

    #[error("Step {step_id} cannot reach the terminal step")]
    NoPathToTerminal { step_id: String },

    #[error("Question step {step_id} has no answer field mapping")]
    UnmappedStep { step_id: String },

    #[error("Question step {step_id} has no input kind")]
    MissingInputKind { step_id: String },

    #[error("Select step {step_id} has no options")]
    MissingOptions { step_id: String },

    #[error("Rule {rule} cannot apply to {input} input on step {step_id}")]
    IncompatibleRule {
        step_id: String,
        rule: String,
        input: String,
    },

    #[error("Session is already at the terminal step {step_id}")]
    AtTerminal { step_id: String },
}

/// Database-related errors.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Saving onboarding progress failed. Never blocks navigation.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("No authenticated user; progress not saved")]
    NoAuthenticatedUser,

    #[error("Failed to serialize onboarding record: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store rejected onboarding record: {0}")]
    Store(#[from] DatabaseError),
}

/// Live catalog service errors. Static catalog data is always the fallback.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Catalog request to {url} failed: {reason}")]
    RequestFailed { url: String, reason: String },

    #[error("Catalog service returned status {status} for {url}")]
    BadStatus { url: String, status: u16 },

    #[error("Invalid catalog payload from {url}: {reason}")]
    InvalidPayload { url: String, reason: String },
}

/// Session registry errors.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Onboarding session {0} not found")]
    NotFound(Uuid),

    #[error("Onboarding session {0} is busy with another request")]
    Busy(Uuid),

    #[error("Onboarding session {0} is already complete")]
    AlreadyComplete(Uuid),

    #[error("Unknown flow: {0}")]
    UnknownFlow(String),
}
