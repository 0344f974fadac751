//! Profile-type questionnaire: a short form whose later pages depend on the
//! modules the chosen profile type activates.

use serde_json::{Value, json};

use crate::catalog::{self, DEFAULT_MODULES, data};
use crate::error::FlowError;
use crate::onboarding::calculators::ProfileInputs;
use crate::onboarding::flow::{Flow, FlowBuilder, InputKind, OptionSource, StepDefinition, StepHook, StepId};
use crate::onboarding::persistence::RecordMapping;
use crate::onboarding::response::Answers;
use crate::onboarding::state::OnboardingState;
use crate::onboarding::validation::ValidationRule;

use super::t;

pub const QUESTIONNAIRE: &str = "questionnaire";

const MODULES_FIELD: &str = "active_modules";

/// Most primary goals a user may pick.
pub const MAX_PRIMARY_GOALS: usize = 3;

/// Minutes per day assumed for sport profiles that leave the field blank.
const DEFAULT_AVAILABLE_MINUTES: f64 = 30.0;

fn is_active(answers: &Answers, module: &str) -> bool {
    answers.list_contains(MODULES_FIELD, module)
}

fn after_goals(answers: &Answers) -> Option<StepId> {
    let next = if is_active(answers, "nutrition") {
        "dietary_preference"
    } else if is_active(answers, "sport") {
        "sport_selection"
    } else {
        "summary"
    };
    Some(next.to_string())
}

fn after_nutrition(answers: &Answers) -> Option<StepId> {
    let next = if is_active(answers, "sport") { "sport_selection" } else { "summary" };
    Some(next.to_string())
}

fn profile(answers: &Answers) -> ProfileInputs {
    let goals = answers.get_list("primary_goals").to_vec();
    ProfileInputs {
        age: answers.get_number("age").filter(|a| *a > 0.0).map(|a| a as u32),
        gender: answers.get_str("gender").map(str::to_string),
        lifestyle: answers.get_str("lifestyle").map(str::to_string),
        fitness_goal: goals.first().cloned(),
        goals,
        sport: answers.get_str("sport").map(str::to_string),
    }
}

fn fitness_goal(state: &OnboardingState) -> Value {
    let goal = state
        .answers
        .get_list("primary_goals")
        .first()
        .map_or("general", String::as_str);
    json!(goal)
}

/// Sport profiles get their answer (30 when blank or zero); others get 0.
fn available_time(state: &OnboardingState) -> Value {
    let answers = &state.answers;
    if !is_active(answers, "sport") {
        return json!(0);
    }
    let minutes = answers
        .get_number("available_time_per_day")
        .filter(|m| *m > 0.0)
        .unwrap_or(DEFAULT_AVAILABLE_MINUTES);
    json!(minutes.round() as i64)
}

fn record() -> RecordMapping {
    RecordMapping::new()
        .answer("profile_type", "profile_type")
        .computed("modules", |_| json!(DEFAULT_MODULES))
        .list_or("active_modules", MODULES_FIELD, &[])
        .answer("age", "age")
        .answer("gender", "gender")
        .answer("lifestyle", "lifestyle")
        .computed("available_time_per_day", available_time)
        .answer("fitness_experience", "fitness_experience")
        .list_or("primary_goals", "primary_goals", &[])
        .computed("fitness_goal", fitness_goal)
        .answer_or("motivation", "motivation", "")
        .answer_or("sport", "sport", "none")
        .answer("sport_position", "sport_position")
        .answer_or("sport_level", "sport_level", "recreational")
        .answer_or("training_frequency", "training_frequency", 0)
        .answer_or("season_period", "season_period", "off_season")
        .answer_or("dietary_preference", "dietary_preference", "omnivore")
        .list_or("food_allergies", "food_allergies", &[])
        .list_or("dietary_restrictions", "dietary_restrictions", &[])
        .list_or("food_dislikes", "food_dislikes", &[])
        .list_or("injuries", "injuries", &[])
        .computed("daily_calories", |state| json!(state.derived.daily_calories))
}

pub fn flow() -> Result<Flow, FlowError> {
    FlowBuilder::new(QUESTIONNAIRE, "profile_type", "completion")
        .step(
            StepDefinition::question("profile_type", t("Quel programme te ressemble ?", "Which program fits you?"), InputKind::SingleSelect)
                .options(catalog::choice_options(data::PROFILE_TYPES))
                .rule(ValidationRule::required(t("Choisis un type de profil", "Pick a profile type")))
                .hook(StepHook::ProfileType {
                    modules_field: MODULES_FIELD.into(),
                })
                .next_step("age"),
        )
        // ── Personal info ───────────────────────────────────────────
        .step(
            StepDefinition::question("age", t("Ton âge", "Your age"), InputKind::Number)
                .rule(ValidationRule::required(t("Ton âge est requis", "Your age is required")))
                .rule(ValidationRule::min(13.0, t("Tu dois avoir au moins 13 ans", "You must be at least 13")))
                .rule(ValidationRule::max(100.0, t("Âge invalide", "Invalid age")))
                .next_step("gender"),
        )
        .step(
            StepDefinition::question("gender", t("Genre", "Gender"), InputKind::SingleSelect)
                .options(catalog::choice_options(data::GENDERS))
                .rule(ValidationRule::required(t("Ton genre est requis", "Your gender is required")))
                .next_step("lifestyle"),
        )
        .step(
            StepDefinition::question("lifestyle", t("Mode de vie", "Lifestyle"), InputKind::SingleSelect)
                .options(catalog::choice_options(data::LIFESTYLES))
                .rule(ValidationRule::required(t("Ton mode de vie est requis", "Your lifestyle is required")))
                .next_step("fitness_experience"),
        )
        .step(
            StepDefinition::question("fitness_experience", t("Expérience sportive", "Training experience"), InputKind::SingleSelect)
                .options(catalog::choice_options(data::FITNESS_EXPERIENCE))
                .next_step("available_time"),
        )
        .step(
            StepDefinition::question("available_time", t("Temps disponible par jour (minutes)", "Time available per day (minutes)"), InputKind::Number)
                .rule(ValidationRule::min(0.0, t("Valeur invalide", "Invalid value")))
                .rule(ValidationRule::max(300.0, t("300 minutes maximum", "300 minutes at most")))
                .next_step("primary_goals"),
        )
        // ── Goals ───────────────────────────────────────────────────
        .step(
            StepDefinition::question("primary_goals", t("Tes objectifs principaux", "Your main goals"), InputKind::MultiSelect)
                .prompt(t("Jusqu'à 3 objectifs", "Up to 3 goals"))
                .option_source(OptionSource::ProfileGoals {
                    profile_field: "profile_type".into(),
                })
                .rule(ValidationRule::required(t("Choisis au moins un objectif", "Pick at least one goal")))
                .rule(ValidationRule::custom(
                    |r| r.as_list().is_none_or(|goals| goals.len() <= MAX_PRIMARY_GOALS),
                    t("3 objectifs maximum", "3 goals at most"),
                ))
                .next_step("motivation"),
        )
        .step(
            StepDefinition::question("motivation", t("Ta motivation", "Your motivation"), InputKind::Text)
                .rule(ValidationRule::max(500.0, t("500 caractères maximum", "500 characters at most")))
                .branch(&["dietary_preference", "sport_selection", "summary"], |_, answers| {
                    after_goals(answers)
                }),
        )
        // ── Nutrition ───────────────────────────────────────────────
        .step(
            StepDefinition::question("dietary_preference", t("Ton régime alimentaire", "Your diet"), InputKind::SingleSelect)
                .options(catalog::choice_options(data::DIETARY_PREFERENCES))
                .next_step("food_allergies"),
        )
        .step(
            StepDefinition::question("food_allergies", t("Allergies alimentaires", "Food allergies"), InputKind::MultiSelect)
                .options(catalog::choice_options(data::COMMON_ALLERGIES))
                .branch(&["sport_selection", "summary"], |_, answers| after_nutrition(answers)),
        )
        // ── Sport ───────────────────────────────────────────────────
        .step(
            StepDefinition::question("sport_selection", t("Ton sport", "Your sport"), InputKind::SingleSelect)
                .option_source(OptionSource::Sports)
                .hook(StepHook::SportSelection)
                .next_step("sport_position"),
        )
        .step(
            StepDefinition::question("sport_position", t("Ton poste", "Your position"), InputKind::SingleSelect)
                .option_source(OptionSource::SportPositions {
                    sport_field: "sport".into(),
                })
                .next_step("sport_level"),
        )
        .step(
            StepDefinition::question("sport_level", t("Ton niveau", "Your level"), InputKind::SingleSelect)
                .options(catalog::choice_options(data::SPORT_LEVELS))
                .next_step("training_frequency"),
        )
        .step(
            StepDefinition::question("training_frequency", t("Entraînements par semaine", "Sessions per week"), InputKind::Slider)
                .rule(ValidationRule::min(0.0, t("Valeur invalide", "Invalid value")))
                .rule(ValidationRule::max(14.0, t("14 séances maximum", "14 sessions at most")))
                .next_step("season_period"),
        )
        .step(
            StepDefinition::question("season_period", t("Période de la saison", "Season period"), InputKind::SingleSelect)
                .options(catalog::choice_options(data::SEASON_PERIODS))
                .next_step("summary"),
        )
        .step(StepDefinition::summary("summary", t("Ton profil", "Your profile")).next_step("completion"))
        .step(StepDefinition::confirmation("completion", t("Profil enregistré !", "Profile saved!")))
        .field("profile_type", "profile_type")
        .field("age", "age")
        .field("gender", "gender")
        .field("lifestyle", "lifestyle")
        .field("fitness_experience", "fitness_experience")
        .field("available_time", "available_time_per_day")
        .field("primary_goals", "primary_goals")
        .field("motivation", "motivation")
        .field("dietary_preference", "dietary_preference")
        .field("food_allergies", "food_allergies")
        .field("sport_selection", "sport")
        .field("sport_position", "sport_position")
        .field("sport_level", "sport_level")
        .field("training_frequency", "training_frequency")
        .field("season_period", "season_period")
        .estimated_minutes(5)
        .profile(profile)
        .always_estimate_calories()
        .record(record())
        .build()
}
