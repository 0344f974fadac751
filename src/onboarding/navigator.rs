//! Step navigator: drives one session through a flow.
//!
//! `advance` validates the response for the current step and, if it passes,
//! merges it into the answers, resolves the next step, runs the step's hook,
//! refreshes derived values and moves on. The new state is built on a copy
//! and swapped in only once every fallible step has succeeded, so a rejected
//! or failed advance leaves the session untouched.
//!
//! Steps whose options are looked up from the answers or the catalog are
//! passed over when the lookup comes back empty, such as positions for a
//! sport that has none.
//!
//! Checkpoint steps save progress after the move. A failed save is reported
//! in the outcome and logged; it never undoes or blocks navigation.

use std::sync::{Arc, LazyLock};

use chrono::{DateTime, Duration, Utc};
use regex::Regex;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::catalog::{self, Catalog, data};
use crate::error::{FlowError, PersistenceError};

use super::calculators::{self, BmrEquation, DEFAULT_HYDRATION_BASE_ML, TRIAL_DAYS};
use super::flow::{
    Flow, InputKind, Locale, OptionSource, StepDefinition, StepHook, StepId, StepKind, StepOption,
};
use super::identity::Identity;
use super::persistence::{ProgressStore, SaveOutcome};
use super::response::{Answers, Response};
use super::state::{Derived, OnboardingState, Progress, SessionPhase};
use super::validation::validate;

// ── Clock ───────────────────────────────────────────────────────────────

/// Source of "now", injectable for tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Always returns the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

// ── Settings ────────────────────────────────────────────────────────────

/// Calculator parameters shared by every session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalculatorSettings {
    pub bmr_equation: BmrEquation,
    pub hydration_base_ml: u32,
}

impl Default for CalculatorSettings {
    fn default() -> Self {
        Self {
            bmr_equation: BmrEquation::default(),
            hydration_base_ml: DEFAULT_HYDRATION_BASE_ML,
        }
    }
}

/// Collaborators a navigator needs besides its flow.
#[derive(Clone)]
pub struct NavigatorDeps {
    pub catalog: Arc<Catalog>,
    pub store: Arc<dyn ProgressStore>,
    pub identity: Arc<dyn Identity>,
    pub clock: Arc<dyn Clock>,
    pub settings: CalculatorSettings,
}

// ── Outcomes and views ──────────────────────────────────────────────────

/// Result of one `advance` call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdvanceOutcome {
    /// Non-empty when the response was rejected; the session did not move.
    pub validation_errors: Vec<String>,
    pub current_step_id: StepId,
    pub save: SaveOutcome,
}

impl AdvanceOutcome {
    pub fn advanced(&self) -> bool {
        self.validation_errors.is_empty()
    }
}

/// Result of `complete`: the final snapshot plus the save result.
#[derive(Debug, Clone, Serialize)]
pub struct Completion {
    pub state: OnboardingState,
    pub save: SaveOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionView {
    pub id: String,
    pub label: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A step rendered for the session's locale and answers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepView {
    pub id: StepId,
    pub kind: StepKind,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub input: Option<InputKind>,
    pub options: Vec<OptionView>,
    pub tips: Vec<String>,
    pub is_terminal: bool,
}

/// Everything the presentation layer needs to draw the session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub flow: String,
    pub phase: SessionPhase,
    pub locale: Locale,
    pub current_step: StepView,
    pub answers: Answers,
    pub pending_response: Response,
    pub validation_errors: Vec<String>,
    pub derived: Derived,
    pub progress: Progress,
}

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{(\w+)\}").unwrap());

/// Replace `{field}` placeholders with text answers; unknown fields render empty.
fn personalize(template: &str, answers: &Answers) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &regex::Captures<'_>| {
            answers.get_str(&caps[1]).unwrap_or_default().to_string()
        })
        .into_owned()
}

// ── Navigator ───────────────────────────────────────────────────────────

/// Drives a single onboarding session. Not shared: the session registry
/// wraps each navigator in its own lock.
pub struct Navigator {
    flow: Arc<Flow>,
    deps: NavigatorDeps,
    state: OnboardingState,
    /// Last rejected response, kept so the client can redisplay it.
    pending: Response,
    errors: Vec<String>,
}

impl Navigator {
    pub fn new(flow: Arc<Flow>, deps: NavigatorDeps, locale: Locale) -> Self {
        let state = OnboardingState::new(&flow, locale, deps.clock.now());
        Self {
            flow,
            deps,
            state,
            pending: Response::None,
            errors: Vec::new(),
        }
    }

    pub fn flow(&self) -> &Flow {
        &self.flow
    }

    pub fn state(&self) -> &OnboardingState {
        &self.state
    }

    pub fn is_complete(&self) -> bool {
        self.state.is_complete()
    }

    pub fn current_step(&self) -> Result<&StepDefinition, FlowError> {
        self.flow.step(&self.state.current_step_id)
    }

    /// Submit `response` for the current step.
    ///
    /// Returns `Ok` with validation errors when the response is rejected, and
    /// `Err` only for flow configuration problems.
    pub async fn advance(&mut self, response: Response) -> Result<AdvanceOutcome, FlowError> {
        self.advance_inner(response, false).await
    }

    /// Move past the current step without answering. Steps with a `required`
    /// rule reject the skip like any absent response.
    pub async fn skip(&mut self) -> Result<AdvanceOutcome, FlowError> {
        self.advance_inner(Response::None, true).await
    }

    async fn advance_inner(&mut self, response: Response, skipped: bool) -> Result<AdvanceOutcome, FlowError> {
        if self.state.is_complete() || self.state.current_step_id == self.flow.terminal() {
            return Err(FlowError::AtTerminal {
                step_id: self.state.current_step_id.clone(),
            });
        }
        let flow = Arc::clone(&self.flow);
        let step = flow.step(&self.state.current_step_id)?;

        let result = validate(step, &response, self.state.locale);
        if !result.is_valid() {
            debug!(
                flow = flow.id(),
                step = %step.id,
                errors = result.errors().len(),
                "Onboarding response rejected"
            );
            self.pending = response;
            self.errors = result.into_errors();
            return Ok(AdvanceOutcome {
                validation_errors: self.errors.clone(),
                current_step_id: self.state.current_step_id.clone(),
                save: SaveOutcome::Skipped,
            });
        }

        let now = self.deps.clock.now();
        let mut next = self.state.clone();

        if step.kind == StepKind::Question {
            let key = flow.field_key(&step.id).ok_or_else(|| FlowError::UnmappedStep {
                step_id: step.id.clone(),
            })?;
            if let Some(value) = response.to_answer() {
                next.answers.insert(key, value);
            }
        }
        next.mark_completed(&step.id);

        let next_step_id = flow.resolve_next(step, &response, &next.answers)?;

        if let Some(hook) = &step.hook {
            self.apply_hook(hook, &response, &mut next, now).await;
        }
        self.refresh_derived(&mut next);
        let next_step_id = self.pass_over_empty(&flow, next_step_id, &next.answers).await?;

        if skipped {
            next.skip_count += 1;
        }
        next.current_step_id = next_step_id;
        next.last_updated_at = now;
        self.state = next;
        self.pending = Response::None;
        self.errors.clear();

        info!(
            flow = flow.id(),
            from = %step.id,
            to = %self.state.current_step_id,
            "Onboarding step advanced"
        );

        let save = if flow.is_checkpoint(&step.id) {
            self.persist(false).await
        } else {
            SaveOutcome::Skipped
        };

        Ok(AdvanceOutcome {
            validation_errors: Vec::new(),
            current_step_id: self.state.current_step_id.clone(),
            save,
        })
    }

    /// Follow `step_id` past steps with a looked-up option source that
    /// yields nothing for the current answers.
    async fn pass_over_empty(&self, flow: &Flow, mut step_id: StepId, answers: &Answers) -> Result<StepId, FlowError> {
        for _ in 0..flow.total_steps() {
            if step_id == flow.terminal() {
                break;
            }
            let step = flow.step(&step_id)?;
            let looked_up = matches!(
                step.options,
                Some(OptionSource::SportPositions { .. } | OptionSource::ProfileGoals { .. })
            );
            if !looked_up || !self.options_for(step, answers).await.is_empty() {
                break;
            }
            debug!(flow = flow.id(), step = %step.id, "No options to offer, passing over step");
            step_id = flow.resolve_next(step, &Response::None, answers)?;
        }
        Ok(step_id)
    }

    /// Finish the session: record the terminal step, save once more and
    /// return the final snapshot.
    pub async fn complete(&mut self) -> Result<Completion, FlowError> {
        if !self.state.phase.can_transition_to(SessionPhase::Completed) {
            return Err(FlowError::AtTerminal {
                step_id: self.state.current_step_id.clone(),
            });
        }
        let now = self.deps.clock.now();
        let terminal = self.flow.terminal().to_string();

        let mut next = self.state.clone();
        next.mark_completed(&terminal);
        next.current_step_id = terminal;
        next.phase = SessionPhase::Completed;
        next.completed_at = Some(now);
        next.last_updated_at = now;
        self.refresh_derived(&mut next);
        self.state = next;
        self.pending = Response::None;
        self.errors.clear();

        info!(
            flow = self.flow.id(),
            completed_steps = self.state.completed_step_ids.len(),
            "Onboarding completed"
        );

        let save = self.persist(true).await;
        Ok(Completion {
            state: self.state.clone(),
            save,
        })
    }

    async fn apply_hook(
        &self,
        hook: &StepHook,
        response: &Response,
        state: &mut OnboardingState,
        now: DateTime<Utc>,
    ) {
        let catalog = &self.deps.catalog;
        match hook {
            StepHook::PackSelection { modules_field } => {
                let Some(pack_id) = response.as_str() else { return };
                if pack_id == catalog::CUSTOM_PACK {
                    return;
                }
                if let Some(pack) = catalog.pack(pack_id) {
                    let modules: Vec<String> = pack.modules.iter().map(|m| m.to_string()).collect();
                    state.derived.price = Some(calculators::price_of(&modules));
                    state.answers.insert(modules_field.as_str(), modules);
                }
            }
            StepHook::CustomModuleSelection => {
                if let Some(modules) = response.as_list() {
                    state.derived.price = Some(calculators::price_of(modules));
                }
            }
            StepHook::Upsell { modules_field } => {
                let suggestions = calculators::suggested_modules(state.answers.get_list(modules_field));
                state.derived.trial_ends_at =
                    (!suggestions.is_empty()).then(|| now + Duration::days(TRIAL_DAYS));
                state.derived.trial_modules = suggestions.clone();
                state.derived.suggested_modules = suggestions;
            }
            StepHook::ModuleSelection => {
                if let Some(modules) = response.as_list() {
                    state.derived.estimated_minutes_left = calculators::estimated_minutes(modules);
                }
            }
            StepHook::SportSelection => {
                let sport = match response.as_str() {
                    Some(id) => catalog.sport(id).await,
                    None => None,
                };
                state.derived.sport_category = sport.map(|s| s.category);
            }
            StepHook::ProfileType { modules_field } => {
                if let Some(profile_type) = response.as_str() {
                    let modules: Vec<String> = data::profile_type_modules(profile_type)
                        .iter()
                        .map(|m| m.to_string())
                        .collect();
                    state.derived.estimated_minutes_left = calculators::estimated_minutes(&modules);
                    state.answers.insert(modules_field.as_str(), modules);
                }
            }
        }
    }

    fn refresh_derived(&self, state: &mut OnboardingState) {
        let settings = self.deps.settings;
        let inputs = self.flow.profile_inputs(&state.answers);

        state.derived.daily_calories = (self.flow.always_estimates_calories() || inputs.has_body_data())
            .then(|| inputs.daily_calories(settings.bmr_equation));

        let category = state
            .derived
            .sport_category
            .or_else(|| {
                inputs
                    .sport
                    .as_deref()
                    .and_then(catalog::static_sport)
                    .map(|s| s.category)
            })
            .unwrap_or_default();
        state.derived.hydration_goal_ml = Some(calculators::personalized_hydration_goal_ml(
            settings.hydration_base_ml,
            category,
            inputs.age,
            inputs.gender.as_deref(),
            &inputs.goals,
        ));
    }

    async fn persist(&self, with_snapshot: bool) -> SaveOutcome {
        let Some(user_id) = self.deps.identity.current_user_id() else {
            let err = PersistenceError::NoAuthenticatedUser;
            warn!(flow = self.flow.id(), "{err}");
            return SaveOutcome::Failed(err.to_string());
        };

        let record = self
            .flow
            .record_mapping()
            .build(&user_id, &self.state, self.deps.clock.now());
        let store = &self.deps.store;
        let result = async {
            store.save_progress(&user_id, &record).await?;
            if with_snapshot {
                store.save_snapshot(&user_id, &self.state).await?;
            }
            Ok::<(), PersistenceError>(())
        }
        .await;

        match result {
            Ok(()) => {
                debug!(flow = self.flow.id(), user_id = %user_id, "Onboarding progress saved");
                SaveOutcome::Saved
            }
            Err(e) => {
                warn!(flow = self.flow.id(), user_id = %user_id, "Failed to save onboarding progress: {e}");
                SaveOutcome::Failed(e.to_string())
            }
        }
    }

    async fn options_for(&self, step: &StepDefinition, answers: &Answers) -> Vec<StepOption> {
        match &step.options {
            None => Vec::new(),
            Some(OptionSource::Static(options)) => options.clone(),
            Some(OptionSource::Sports) => catalog::sport_step_options(&self.deps.catalog.sports().await),
            Some(OptionSource::SportPositions { sport_field }) => match answers.get_str(sport_field) {
                Some(sport) => self.deps.catalog.position_options(sport).await,
                None => Vec::new(),
            },
            Some(OptionSource::ProfileGoals { profile_field }) => catalog::choice_options(
                data::goals_for_profile(answers.get_str(profile_field).unwrap_or_default()),
            ),
        }
    }

    /// Render the current step and progress.
    pub async fn view(&self) -> Result<SessionView, FlowError> {
        let step = self.current_step()?;
        let locale = self.state.locale;
        let answers = &self.state.answers;
        let options = self.options_for(step, answers).await;

        let current_step = StepView {
            id: step.id.clone(),
            kind: step.kind,
            title: personalize(step.title.render(locale), answers),
            question: step.question.as_ref().map(|q| personalize(q.render(locale), answers)),
            description: step.description.as_ref().map(|d| d.render(locale).to_string()),
            input: step.input,
            options: options
                .into_iter()
                .map(|o| OptionView {
                    id: o.id,
                    label: o.label.render(locale).to_string(),
                    value: o.value,
                    description: o.description.map(|d| d.render(locale).to_string()),
                })
                .collect(),
            tips: step.tips.iter().map(|t| t.render(locale).to_string()).collect(),
            is_terminal: step.id == self.flow.terminal(),
        };

        Ok(SessionView {
            flow: self.flow.id().to_string(),
            phase: self.state.phase,
            locale,
            current_step,
            answers: answers.clone(),
            pending_response: self.pending.clone(),
            validation_errors: self.errors.clone(),
            derived: self.state.derived.clone(),
            progress: self.state.progress(self.flow.total_steps()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::pack_options;
    use crate::onboarding::flow::{FlowBuilder, LocalizedText, StepDefinition};
    use crate::onboarding::identity::FixedIdentity;
    use crate::onboarding::persistence::{MemoryProgressStore, RecordMapping};
    use crate::onboarding::validation::ValidationRule;
    use chrono::TimeZone;
    use rust_decimal::Decimal;

    fn t(s: &str) -> LocalizedText {
        LocalizedText::from(s)
    }

    fn test_flow() -> Arc<Flow> {
        let flow = FlowBuilder::new("test", "welcome", "done")
            .step(StepDefinition::info("welcome", t("Welcome")).next_step("get_name"))
            .step(
                StepDefinition::question("get_name", t("Name?"), InputKind::Text)
                    .rule(ValidationRule::required(t("Name required")))
                    .rule(ValidationRule::min(2.0, t("Too short")))
                    .next_step("pack_selection"),
            )
            .step(
                StepDefinition::question("pack_selection", t("Pack for {firstName}"), InputKind::SingleSelect)
                    .options(pack_options())
                    .rule(ValidationRule::required(t("Pick a pack")))
                    .hook(StepHook::PackSelection {
                        modules_field: "selectedModules".into(),
                    })
                    .branch(&["custom_module_selection", "pack_upsell"], |r, _| {
                        match r.as_str() {
                            Some("custom") => Some("custom_module_selection".into()),
                            _ => Some("pack_upsell".into()),
                        }
                    }),
            )
            .step(
                StepDefinition::question("custom_module_selection", t("Modules"), InputKind::MultiSelect)
                    .options(catalog::module_options())
                    .rule(ValidationRule::required(t("Pick modules")))
                    .hook(StepHook::CustomModuleSelection)
                    .next_step("pack_upsell"),
            )
            .step(
                StepDefinition::summary("pack_upsell", t("Suggestions"))
                    .hook(StepHook::Upsell {
                        modules_field: "selectedModules".into(),
                    })
                    .next_step("nickname"),
            )
            .step(StepDefinition::question("nickname", t("Nickname?"), InputKind::Text).next_step("done"))
            .step(StepDefinition::confirmation("done", t("Done")))
            .field("get_name", "firstName")
            .field("pack_selection", "selectedPack")
            .field("custom_module_selection", "selectedModules")
            .field("nickname", "nickname")
            .checkpoints(&["pack_selection", "pack_upsell"])
            .record(
                RecordMapping::new()
                    .answer("first_name", "firstName")
                    .answer("selected_pack", "selectedPack"),
            )
            .build()
            .unwrap();
        Arc::new(flow)
    }

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap()
    }

    fn navigator_with(store: Arc<MemoryProgressStore>, identity: FixedIdentity) -> Navigator {
        let deps = NavigatorDeps {
            catalog: Arc::new(Catalog::new()),
            store,
            identity: Arc::new(identity),
            clock: Arc::new(FixedClock(fixed_now())),
            settings: CalculatorSettings::default(),
        };
        Navigator::new(test_flow(), deps, Locale::Fr)
    }

    fn navigator() -> (Navigator, Arc<MemoryProgressStore>) {
        let store = Arc::new(MemoryProgressStore::new());
        (navigator_with(Arc::clone(&store), FixedIdentity::user("u1")), store)
    }

    async fn to_pack(nav: &mut Navigator) {
        nav.advance(Response::None).await.unwrap();
        nav.advance(Response::Text("Alice".into())).await.unwrap();
        assert_eq!(nav.state().current_step_id, "pack_selection");
    }

    #[tokio::test]
    async fn rejected_response_leaves_state_untouched() {
        let (mut nav, _) = navigator();
        nav.advance(Response::None).await.unwrap();
        let before = nav.state().clone();

        let outcome = nav.advance(Response::Text("A".into())).await.unwrap();
        assert!(!outcome.advanced());
        assert_eq!(outcome.validation_errors, ["Too short"]);
        assert_eq!(nav.state(), &before);

        let view = nav.view().await.unwrap();
        assert_eq!(view.validation_errors, ["Too short"]);
        assert_eq!(view.pending_response, Response::Text("A".into()));
    }

    #[tokio::test]
    async fn info_steps_merge_nothing() {
        let (mut nav, _) = navigator();
        let outcome = nav.advance(Response::Toggle(true)).await.unwrap();
        assert!(outcome.advanced());
        assert!(nav.state().answers.is_empty());
        assert_eq!(nav.state().completed_step_ids, ["welcome"]);
        assert_eq!(nav.state().current_step_id, "get_name");
    }

    #[tokio::test]
    async fn known_pack_sets_modules_and_price() {
        let (mut nav, store) = navigator();
        to_pack(&mut nav).await;

        let outcome = nav
            .advance(Response::SingleSelect("performance".into()))
            .await
            .unwrap();
        assert_eq!(outcome.current_step_id, "pack_upsell");
        assert_eq!(outcome.save, SaveOutcome::Saved);
        assert_eq!(nav.state().derived.price, Some(Decimal::from(28)));
        assert_eq!(
            nav.state().answers.get_list("selectedModules"),
            ["sport", "strength", "nutrition", "sleep"]
        );

        let row = store.record("u1").await.unwrap().to_value();
        assert_eq!(row["selected_pack"], "performance");
        assert_eq!(row["first_name"], "Alice");
    }

    #[tokio::test]
    async fn custom_pack_defers_price_to_module_choice() {
        let (mut nav, _) = navigator();
        to_pack(&mut nav).await;

        nav.advance(Response::SingleSelect("custom".into())).await.unwrap();
        assert_eq!(nav.state().current_step_id, "custom_module_selection");
        assert_eq!(nav.state().derived.price, None);

        nav.advance(Response::MultiSelect(vec!["sport".into(), "nutrition".into()]))
            .await
            .unwrap();
        assert_eq!(nav.state().derived.price, Some(Decimal::from(16)));
    }

    #[tokio::test]
    async fn upsell_suggests_complements_with_trial() {
        let (mut nav, _) = navigator();
        to_pack(&mut nav).await;
        nav.advance(Response::SingleSelect("custom".into())).await.unwrap();
        nav.advance(Response::MultiSelect(vec!["sport".into()])).await.unwrap();

        let outcome = nav.advance(Response::None).await.unwrap();
        assert_eq!(outcome.current_step_id, "nickname");
        let derived = &nav.state().derived;
        assert_eq!(derived.suggested_modules, ["strength", "sleep"]);
        assert_eq!(derived.trial_modules, ["strength", "sleep"]);
        assert_eq!(derived.trial_ends_at, Some(fixed_now() + Duration::days(15)));
    }

    #[tokio::test]
    async fn upsell_without_suggestions_opens_no_trial() {
        let (mut nav, _) = navigator();
        to_pack(&mut nav).await;
        nav.advance(Response::SingleSelect("holistic".into())).await.unwrap();
        nav.advance(Response::None).await.unwrap();
        assert!(nav.state().derived.suggested_modules.is_empty());
        assert_eq!(nav.state().derived.trial_ends_at, None);
    }

    #[tokio::test]
    async fn failed_save_does_not_block_navigation() {
        let (mut nav, store) = navigator();
        to_pack(&mut nav).await;
        store.set_failing(true);

        let outcome = nav
            .advance(Response::SingleSelect("performance".into()))
            .await
            .unwrap();
        assert!(outcome.save.is_failed());
        assert_eq!(nav.state().current_step_id, "pack_upsell");
        assert_eq!(store.save_count(), 0);
    }

    #[tokio::test]
    async fn anonymous_session_reports_missing_user() {
        let store = Arc::new(MemoryProgressStore::new());
        let mut nav = navigator_with(Arc::clone(&store), FixedIdentity::anonymous());
        to_pack(&mut nav).await;

        let outcome = nav
            .advance(Response::SingleSelect("performance".into()))
            .await
            .unwrap();
        assert_eq!(
            outcome.save,
            SaveOutcome::Failed(PersistenceError::NoAuthenticatedUser.to_string())
        );
        assert_eq!(nav.state().current_step_id, "pack_upsell");
    }

    #[tokio::test]
    async fn non_checkpoint_steps_do_not_save() {
        let (mut nav, store) = navigator();
        let outcome = nav.advance(Response::None).await.unwrap();
        assert_eq!(outcome.save, SaveOutcome::Skipped);
        assert_eq!(store.save_count(), 0);
    }

    #[tokio::test]
    async fn skip_counts_and_respects_required() {
        let (mut nav, _) = navigator();
        nav.advance(Response::None).await.unwrap();
        let outcome = nav.skip().await.unwrap();
        assert_eq!(outcome.validation_errors, ["Name required"]);
        assert_eq!(nav.state().skip_count, 0);

        nav.advance(Response::Text("Alice".into())).await.unwrap();
        nav.advance(Response::SingleSelect("holistic".into())).await.unwrap();
        nav.advance(Response::None).await.unwrap();
        assert_eq!(nav.state().current_step_id, "nickname");
        nav.skip().await.unwrap();
        assert_eq!(nav.state().skip_count, 1);
        assert!(!nav.state().answers.contains("nickname"));
        assert_eq!(nav.state().current_step_id, "done");
    }

    #[tokio::test]
    async fn complete_records_terminal_and_snapshot() {
        let (mut nav, store) = navigator();
        to_pack(&mut nav).await;

        let completion = nav.complete().await.unwrap();
        assert_eq!(completion.save, SaveOutcome::Saved);
        assert_eq!(completion.state.phase, SessionPhase::Completed);
        assert_eq!(completion.state.current_step_id, "done");
        assert_eq!(completion.state.completed_step_ids.last().unwrap(), "done");
        assert_eq!(completion.state.completed_at, Some(fixed_now()));

        let snapshot = store.snapshot("u1").await.unwrap();
        assert_eq!(snapshot.answers.get_str("firstName"), Some("Alice"));

        assert!(matches!(nav.complete().await, Err(FlowError::AtTerminal { .. })));
        assert!(matches!(nav.advance(Response::None).await, Err(FlowError::AtTerminal { .. })));
    }

    #[tokio::test]
    async fn complete_reports_failed_save() {
        let (mut nav, store) = navigator();
        store.set_failing(true);
        let completion = nav.complete().await.unwrap();
        assert!(completion.save.is_failed());
        assert!(nav.is_complete());
    }

    #[tokio::test]
    async fn view_personalizes_title() {
        let (mut nav, _) = navigator();
        to_pack(&mut nav).await;
        let view = nav.view().await.unwrap();
        assert_eq!(view.current_step.title, "Pack for Alice");
        assert_eq!(view.current_step.options.len(), data::PACKS.len() + 1);
        assert_eq!(view.progress.completed, 2);
        assert_eq!(view.progress.total, 7);
        assert_eq!(view.progress.percentage, 29);
    }

    #[test]
    fn placeholders_without_answers_render_empty() {
        let answers = Answers::new();
        assert_eq!(personalize("Hi {firstName}!", &answers), "Hi !");
        assert_eq!(personalize("No placeholder", &answers), "No placeholder");
    }
}
