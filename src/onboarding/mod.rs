//! Onboarding engine: declarative step flows, a navigator that walks them,
//! and the calculators and persistence the flows feed.
//!
//! A [`Flow`] is a validated graph of steps built once at startup. Each
//! session owns a [`Navigator`] that validates responses, merges answers,
//! resolves the next step and saves progress at checkpoints. Saving never
//! blocks navigation; the outcome is reported alongside the new view.

pub mod calculators;
pub mod flow;
pub mod flows;
pub mod identity;
pub mod navigator;
pub mod persistence;
pub mod response;
pub mod routes;
pub mod sessions;
pub mod state;
pub mod validation;

pub use flow::{Flow, FlowBuilder, Locale, LocalizedText, StepDefinition};
pub use identity::{FixedIdentity, Identity};
pub use navigator::{
    AdvanceOutcome, CalculatorSettings, Clock, Completion, FixedClock, Navigator, NavigatorDeps,
    SessionView, SystemClock,
};
pub use persistence::{LibSqlProgressStore, MemoryProgressStore, ProgressStore, SaveOutcome};
pub use response::{Answers, Response};
pub use routes::{OnboardingRouteState, onboarding_routes};
pub use sessions::SessionRegistry;
pub use state::{OnboardingState, SessionPhase};
