//! Per-session onboarding state.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::catalog::SportCategory;

use super::flow::{Flow, Locale, StepId};
use super::response::Answers;

/// Lifecycle of a session: in progress until `complete()` runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    #[default]
    InProgress,
    Completed,
}

impl SessionPhase {
    pub fn can_transition_to(&self, target: SessionPhase) -> bool {
        matches!((self, target), (Self::InProgress, Self::Completed))
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        };
        write!(f, "{s}")
    }
}

/// Values computed from the answers, refreshed after every advance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Derived {
    /// Monthly price of the chosen modules. Unset until a pack or a custom
    /// module list is chosen.
    #[serde(default, with = "rust_decimal::serde::str_option")]
    pub price: Option<Decimal>,
    pub estimated_minutes_left: u32,
    #[serde(default)]
    pub suggested_modules: Vec<String>,
    #[serde(default)]
    pub trial_modules: Vec<String>,
    pub trial_ends_at: Option<DateTime<Utc>>,
    pub daily_calories: Option<u32>,
    pub hydration_goal_ml: Option<u32>,
    pub sport_category: Option<SportCategory>,
}

/// Progress summary shown alongside the current step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
    pub percentage: u32,
    pub estimated_minutes_left: u32,
    pub skip_count: u32,
}

/// Everything a session has accumulated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnboardingState {
    pub flow_id: String,
    pub phase: SessionPhase,
    pub current_step_id: StepId,
    pub answers: Answers,
    /// Append-only, no duplicates.
    pub completed_step_ids: Vec<StepId>,
    pub derived: Derived,
    pub skip_count: u32,
    pub locale: Locale,
    pub started_at: DateTime<Utc>,
    pub last_updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl OnboardingState {
    pub fn new(flow: &Flow, locale: Locale, now: DateTime<Utc>) -> Self {
        Self {
            flow_id: flow.id().to_string(),
            phase: SessionPhase::InProgress,
            current_step_id: flow.initial().to_string(),
            answers: Answers::new(),
            completed_step_ids: Vec::new(),
            derived: Derived {
                estimated_minutes_left: flow.estimated_minutes(),
                ..Default::default()
            },
            skip_count: 0,
            locale,
            started_at: now,
            last_updated_at: now,
            completed_at: None,
        }
    }

    /// Record `step_id` as completed unless it already is.
    pub fn mark_completed(&mut self, step_id: &str) {
        if !self.completed_step_ids.iter().any(|s| s == step_id) {
            self.completed_step_ids.push(step_id.to_string());
        }
    }

    pub fn is_complete(&self) -> bool {
        self.phase.is_terminal()
    }

    pub fn progress(&self, total_steps: usize) -> Progress {
        let completed = self.completed_step_ids.len();
        let percentage = if total_steps == 0 {
            0
        } else {
            ((completed as f64 / total_steps as f64) * 100.0).round().min(100.0) as u32
        };
        Progress {
            completed,
            total: total_steps,
            percentage,
            estimated_minutes_left: self.derived.estimated_minutes_left,
            skip_count: self.skip_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::onboarding::flow::{FlowBuilder, LocalizedText, StepDefinition};

    fn flow() -> Flow {
        FlowBuilder::new("t", "a", "done")
            .step(StepDefinition::info("a", LocalizedText::from("A")).next_step("b"))
            .step(StepDefinition::info("b", LocalizedText::from("B")).next_step("done"))
            .step(StepDefinition::confirmation("done", LocalizedText::from("Done")))
            .estimated_minutes(8)
            .build()
            .unwrap()
    }

    #[test]
    fn new_state_starts_at_initial_step() {
        let now = Utc::now();
        let state = OnboardingState::new(&flow(), Locale::Fr, now);
        assert_eq!(state.current_step_id, "a");
        assert_eq!(state.derived.estimated_minutes_left, 8);
        assert!(state.derived.price.is_none());
        assert_eq!(state.phase, SessionPhase::InProgress);
    }

    #[test]
    fn completed_steps_have_no_duplicates() {
        let mut state = OnboardingState::new(&flow(), Locale::Fr, Utc::now());
        state.mark_completed("a");
        state.mark_completed("a");
        state.mark_completed("b");
        assert_eq!(state.completed_step_ids, ["a", "b"]);
    }

    #[test]
    fn progress_percentage_rounds() {
        let mut state = OnboardingState::new(&flow(), Locale::Fr, Utc::now());
        assert_eq!(state.progress(3).percentage, 0);
        state.mark_completed("a");
        assert_eq!(state.progress(3).percentage, 33);
        state.mark_completed("b");
        assert_eq!(state.progress(3).percentage, 67);
        assert_eq!(state.progress(0).percentage, 0);
    }

    #[test]
    fn phase_transitions() {
        assert!(SessionPhase::InProgress.can_transition_to(SessionPhase::Completed));
        assert!(!SessionPhase::Completed.can_transition_to(SessionPhase::InProgress));
        assert!(SessionPhase::Completed.is_terminal());
        assert_eq!(SessionPhase::InProgress.to_string(), "in_progress");
    }

    #[test]
    fn state_round_trips_through_json() {
        let mut state = OnboardingState::new(&flow(), Locale::En, Utc::now());
        state.derived.price = Some(Decimal::from(16));
        state.answers.insert("firstName", "Alice");
        let json = serde_json::to_string(&state).unwrap();
        let back: OnboardingState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }
}
