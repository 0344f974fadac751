//! The two onboarding flows served by the engine.

pub mod conversational;
pub mod questionnaire;

use crate::error::FlowError;

use super::flow::{Flow, LocalizedText};

pub use conversational::CONVERSATIONAL;
pub use questionnaire::QUESTIONNAIRE;

/// Ids of every built-in flow.
pub const FLOW_IDS: &[&str] = &[CONVERSATIONAL, QUESTIONNAIRE];

/// Build the flow registered under `id`.
pub fn by_id(id: &str) -> Option<Result<Flow, FlowError>> {
    match id {
        CONVERSATIONAL => Some(conversational::flow()),
        QUESTIONNAIRE => Some(questionnaire::flow()),
        _ => None,
    }
}

fn t(fr: &str, en: &str) -> LocalizedText {
    LocalizedText::new(fr, en)
}
