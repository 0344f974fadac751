//! Conversational onboarding: a chat-like sequence that sells a pack, then
//! asks only about the modules the user picked.

use regex::Regex;
use serde_json::{Value, json};

use crate::catalog::{self, DEFAULT_MODULES, data};
use crate::error::FlowError;
use crate::onboarding::calculators::ProfileInputs;
use crate::onboarding::flow::{Flow, FlowBuilder, InputKind, OptionSource, StepDefinition, StepHook, StepId};
use crate::onboarding::persistence::{RecordMapping, map_fitness_goal, map_sport_level};
use crate::onboarding::response::Answers;
use crate::onboarding::state::OnboardingState;
use crate::onboarding::validation::ValidationRule;

use super::t;

pub const CONVERSATIONAL: &str = "conversational";

const MODULES_FIELD: &str = "selectedModules";

/// Module sections in the order they are visited, with their first step.
const SECTIONS: &[(&str, &str)] = &[
    ("sport", "sport_selection"),
    ("strength", "strength_setup"),
    ("nutrition", "nutrition_setup"),
    ("sleep", "sleep_setup"),
    ("hydration", "hydration_setup"),
];

/// First step after the module sections.
const AFTER_SECTIONS: &str = "available_time";

fn remaining_sections(after: Option<&str>) -> &'static [(&'static str, &'static str)] {
    let start = after
        .and_then(|module| SECTIONS.iter().position(|(m, _)| *m == module))
        .map_or(0, |i| i + 1);
    &SECTIONS[start..]
}

/// First section after `after` whose module was selected.
fn next_section(answers: &Answers, after: Option<&str>) -> StepId {
    remaining_sections(after)
        .iter()
        .find(|(module, _)| answers.list_contains(MODULES_FIELD, module))
        .map_or(AFTER_SECTIONS, |(_, step)| *step)
        .to_string()
}

/// Make `step` leave the section of `module` (or the module selection, for `None`).
fn leave_section(step: StepDefinition, module: Option<&'static str>) -> StepDefinition {
    let mut targets: Vec<&str> = remaining_sections(module).iter().map(|(_, s)| *s).collect();
    targets.push(AFTER_SECTIONS);
    step.branch(&targets, move |_, answers| Some(next_section(answers, module)))
}

fn profile(answers: &Answers) -> ProfileInputs {
    let fitness_goal = answers
        .get_str("mainObjective")
        .map(|o| map_fitness_goal(o).to_string());
    ProfileInputs {
        age: answers.get_number("age").filter(|a| *a > 0.0).map(|a| a as u32),
        gender: answers.get_str("gender").map(str::to_string),
        lifestyle: answers.get_str("lifestyle").map(str::to_string),
        goals: fitness_goal.iter().cloned().collect(),
        fitness_goal,
        sport: answers.get_str("sport").map(str::to_string),
    }
}

fn trial_end_date(state: &OnboardingState) -> Value {
    state
        .derived
        .trial_ends_at
        .map_or(Value::Null, |at| Value::String(at.to_rfc3339()))
}

fn record() -> RecordMapping {
    RecordMapping::new()
        .answer("first_name", "firstName")
        .answer("age", "age")
        .answer("gender", "gender")
        .answer("lifestyle", "lifestyle")
        .remap("fitness_goal", "mainObjective", map_fitness_goal)
        .list_or("modules", MODULES_FIELD, DEFAULT_MODULES)
        .list_or("active_modules", MODULES_FIELD, DEFAULT_MODULES)
        .answer("selected_pack", "selectedPack")
        .computed("trial_modules", |s| json!(s.derived.trial_modules))
        .computed("trial_end_date", trial_end_date)
        .computed("suggested_modules", |s| json!(s.derived.suggested_modules))
        .answer("sport", "sport")
        .answer("sport_position", "sportPosition")
        .remap("sport_level", "sportLevel", map_sport_level)
        .answer("season_period", "seasonPeriod")
        .answer("training_frequency", "trainingFrequency")
        .answer("equipment_level", "equipmentLevel")
        .answer("strength_objective", "strengthObjective")
        .answer("strength_experience", "strengthExperience")
        .answer("dietary_preference", "dietaryPreference")
        .list_or("food_allergies", "foodAllergies", &[])
        .answer("nutrition_objective", "nutritionObjective")
        .list_or("dietary_restrictions", "dietaryRestrictions", &[])
        .answer("sleep_hours_average", "averageSleepHours")
        .answer("sleep_difficulties", "sleepDifficulties")
        .answer("water_intake_goal", "hydrationGoal")
        .answer("hydration_reminders", "hydrationReminders")
        .answer("motivation", "motivation")
        .answer("available_time_per_day", "availableTimePerDay")
        .answer("privacy_consent", "privacyConsent")
        .answer("marketing_consent", "marketingConsent")
}

pub fn flow() -> Result<Flow, FlowError> {
    let name_pattern = Regex::new(r"^\p{L}[\p{L}\p{M} '\-]*$").expect("name pattern is valid");

    FlowBuilder::new(CONVERSATIONAL, "welcome", "completion")
        // ── Introduction ────────────────────────────────────────────
        .step(
            StepDefinition::info("welcome", t("Bienvenue ! 👋", "Welcome! 👋"))
                .description(t(
                    "Quelques questions pour construire ton programme sur mesure.",
                    "A few questions to build your personal program.",
                ))
                .minutes(1)
                .next_step("get_name"),
        )
        .step(
            StepDefinition::question("get_name", t("Comment tu t'appelles ?", "What's your name?"), InputKind::Text)
                .rule(ValidationRule::required(t("Ton prénom est requis", "Your first name is required")))
                .rule(ValidationRule::min(2.0, t("Au moins 2 caractères", "At least 2 characters")))
                .rule(ValidationRule::max(50.0, t("50 caractères maximum", "50 characters at most")))
                .rule(ValidationRule::pattern(
                    name_pattern,
                    t("Lettres, espaces et tirets uniquement", "Letters, spaces and hyphens only"),
                ))
                .next_step("age"),
        )
        // ── Personal info ───────────────────────────────────────────
        .step(
            StepDefinition::question("age", t("Enchanté {firstName} ! Quel âge as-tu ?", "Nice to meet you {firstName}! How old are you?"), InputKind::Number)
                .rule(ValidationRule::required(t("Ton âge est requis", "Your age is required")))
                .rule(ValidationRule::min(13.0, t("Tu dois avoir au moins 13 ans", "You must be at least 13")))
                .rule(ValidationRule::max(100.0, t("Âge invalide", "Invalid age")))
                .next_step("gender"),
        )
        .step(
            StepDefinition::question("gender", t("Tu es…", "You are…"), InputKind::SingleSelect)
                .options(catalog::choice_options(data::GENDERS))
                .tip(t("Utilisé pour estimer tes besoins caloriques", "Used to estimate your calorie needs"))
                .next_step("lifestyle"),
        )
        .step(
            StepDefinition::question("lifestyle", t("Ton quotidien ressemble à…", "Your daily life looks like…"), InputKind::SingleSelect)
                .options(catalog::choice_options(data::LIFESTYLES))
                .rule(ValidationRule::required(t("Choisis ton mode de vie", "Pick your lifestyle")))
                .next_step("main_objective"),
        )
        .step(
            StepDefinition::question("main_objective", t("Quel est ton objectif principal ?", "What is your main goal?"), InputKind::SingleSelect)
                .options(catalog::choice_options(data::MAIN_OBJECTIVES))
                .rule(ValidationRule::required(t("Choisis un objectif", "Pick a goal")))
                .next_step("pack_selection"),
        )
        // ── Pack and modules ────────────────────────────────────────
        .step(
            StepDefinition::question("pack_selection", t("Choisis ton accompagnement", "Choose your coaching"), InputKind::SingleSelect)
                .options(catalog::pack_options())
                .rule(ValidationRule::required(t("Choisis un pack", "Pick a pack")))
                .hook(StepHook::PackSelection {
                    modules_field: MODULES_FIELD.into(),
                })
                .branch(&["custom_module_selection", "pack_upsell"], |response, _| {
                    Some(match response.as_str() {
                        Some(catalog::CUSTOM_PACK) => "custom_module_selection".to_string(),
                        _ => "pack_upsell".to_string(),
                    })
                }),
        )
        .step(
            StepDefinition::question("custom_module_selection", t("Compose ton programme", "Build your program"), InputKind::MultiSelect)
                .options(catalog::module_options())
                .rule(ValidationRule::required(t("Choisis au moins un module", "Pick at least one module")))
                .hook(StepHook::CustomModuleSelection)
                .next_step("pack_upsell"),
        )
        .step(
            StepDefinition::summary("pack_upsell", t("Pour aller plus loin", "Go further"))
                .description(t(
                    "Ces modules complètent ton choix. Essaie-les gratuitement pendant 15 jours.",
                    "These modules complement your choice. Try them free for 15 days.",
                ))
                .hook(StepHook::Upsell {
                    modules_field: MODULES_FIELD.into(),
                })
                .next_step("module_selection"),
        )
        .step(leave_section(
            StepDefinition::question("module_selection", t("Tes modules", "Your modules"), InputKind::MultiSelect)
                .prompt(t("Confirme les modules à configurer", "Confirm the modules to set up"))
                .options(catalog::module_options())
                .rule(ValidationRule::required(t("Choisis au moins un module", "Pick at least one module")))
                .hook(StepHook::ModuleSelection),
            None,
        ))
        // ── Sport ───────────────────────────────────────────────────
        .step(
            StepDefinition::question("sport_selection", t("Quel sport pratiques-tu ?", "Which sport do you play?"), InputKind::SingleSelect)
                .option_source(OptionSource::Sports)
                .rule(ValidationRule::required(t("Choisis un sport", "Pick a sport")))
                .hook(StepHook::SportSelection)
                .next_step("sport_position"),
        )
        .step(
            StepDefinition::question("sport_position", t("À quel poste ?", "Which position?"), InputKind::SingleSelect)
                .option_source(OptionSource::SportPositions {
                    sport_field: "sport".into(),
                })
                .next_step("sport_level"),
        )
        .step(
            StepDefinition::question("sport_level", t("Ton niveau", "Your level"), InputKind::SingleSelect)
                .options(catalog::choice_options(data::SPORT_LEVELS))
                .next_step("sport_season"),
        )
        .step(
            StepDefinition::question("sport_season", t("Où en es-tu dans ta saison ?", "Where are you in your season?"), InputKind::SingleSelect)
                .options(catalog::choice_options(data::SEASON_PERIODS))
                .next_step("training_frequency"),
        )
        .step(
            StepDefinition::question("training_frequency", t("Séances par semaine", "Sessions per week"), InputKind::Slider)
                .rule(ValidationRule::min(0.0, t("Valeur invalide", "Invalid value")))
                .rule(ValidationRule::max(14.0, t("14 séances maximum", "14 sessions at most")))
                .next_step("sport_equipment"),
        )
        .step(leave_section(
            StepDefinition::question("sport_equipment", t("Ton équipement", "Your equipment"), InputKind::SingleSelect)
                .options(catalog::choice_options(data::EQUIPMENT_LEVELS)),
            Some("sport"),
        ))
        // ── Strength ────────────────────────────────────────────────
        .step(
            StepDefinition::question("strength_setup", t("Ton objectif en musculation", "Your strength goal"), InputKind::SingleSelect)
                .options(catalog::choice_options(data::STRENGTH_OBJECTIVES))
                .next_step("strength_experience"),
        )
        .step(leave_section(
            StepDefinition::question("strength_experience", t("Ton expérience", "Your experience"), InputKind::SingleSelect)
                .options(catalog::choice_options(data::FITNESS_EXPERIENCE)),
            Some("strength"),
        ))
        // ── Nutrition ───────────────────────────────────────────────
        .step(
            StepDefinition::question("nutrition_setup", t("Ton régime alimentaire", "Your diet"), InputKind::SingleSelect)
                .options(catalog::choice_options(data::DIETARY_PREFERENCES))
                .next_step("nutrition_objective"),
        )
        .step(
            StepDefinition::question("nutrition_objective", t("Ton objectif nutritionnel", "Your nutrition goal"), InputKind::SingleSelect)
                .options(catalog::choice_options(data::NUTRITION_OBJECTIVES))
                .next_step("nutrition_restrictions"),
        )
        .step(leave_section(
            StepDefinition::question("nutrition_restrictions", t("Des allergies ?", "Any allergies?"), InputKind::MultiSelect)
                .options(catalog::choice_options(data::COMMON_ALLERGIES)),
            Some("nutrition"),
        ))
        // ── Sleep ───────────────────────────────────────────────────
        .step(
            StepDefinition::question("sleep_setup", t("Combien d'heures dors-tu ?", "How many hours do you sleep?"), InputKind::Slider)
                .rule(ValidationRule::min(4.0, t("4 heures minimum", "4 hours minimum")))
                .rule(ValidationRule::max(12.0, t("12 heures maximum", "12 hours maximum")))
                .next_step("sleep_difficulties"),
        )
        .step(leave_section(
            StepDefinition::question("sleep_difficulties", t("Des difficultés de sommeil ?", "Any sleep difficulties?"), InputKind::MultiSelect)
                .options(catalog::choice_options(data::SLEEP_DIFFICULTIES)),
            Some("sleep"),
        ))
        // ── Hydration ───────────────────────────────────────────────
        .step(
            StepDefinition::question("hydration_setup", t("Objectif d'hydratation (litres)", "Hydration goal (litres)"), InputKind::Slider)
                .rule(ValidationRule::min(1.0, t("1 litre minimum", "1 litre minimum")))
                .rule(ValidationRule::max(5.0, t("5 litres maximum", "5 litres maximum")))
                .tip(t("Par pas de 0,5 L", "In 0.5 L steps"))
                .next_step("hydration_reminders"),
        )
        .step(leave_section(
            StepDefinition::question("hydration_reminders", t("Activer les rappels ?", "Turn on reminders?"), InputKind::Toggle),
            Some("hydration"),
        ))
        // ── Wrap-up ─────────────────────────────────────────────────
        .step(
            StepDefinition::question("available_time", t("Temps disponible par jour (minutes)", "Time available per day (minutes)"), InputKind::Slider)
                .rule(ValidationRule::min(10.0, t("10 minutes minimum", "10 minutes minimum")))
                .rule(ValidationRule::max(180.0, t("180 minutes maximum", "180 minutes maximum")))
                .next_step("final_questions"),
        )
        .step(
            StepDefinition::question("final_questions", t("Qu'est-ce qui te motive ?", "What motivates you?"), InputKind::Text)
                .rule(ValidationRule::max(500.0, t("500 caractères maximum", "500 characters at most")))
                .next_step("privacy_consent"),
        )
        .step(
            StepDefinition::question("privacy_consent", t("Confidentialité", "Privacy"), InputKind::Toggle)
                .prompt(t(
                    "J'accepte le traitement de mes données pour personnaliser mon programme",
                    "I agree to my data being processed to personalize my program",
                ))
                .rule(ValidationRule::custom(
                    |r| r.as_bool() == Some(true),
                    t("Ton accord est nécessaire pour continuer", "Your consent is needed to continue"),
                ))
                .next_step("marketing_consent"),
        )
        .step(
            StepDefinition::question("marketing_consent", t("Recevoir nos conseils par email ?", "Get our tips by email?"), InputKind::Toggle)
                .next_step("summary"),
        )
        .step(StepDefinition::summary("summary", t("Récapitulatif", "Summary")).next_step("completion"))
        .step(StepDefinition::confirmation("completion", t("C'est parti {firstName} ! 🎉", "Let's go {firstName}! 🎉")))
        .field("get_name", "firstName")
        .field("age", "age")
        .field("gender", "gender")
        .field("lifestyle", "lifestyle")
        .field("main_objective", "mainObjective")
        .field("pack_selection", "selectedPack")
        .field("custom_module_selection", MODULES_FIELD)
        .field("module_selection", MODULES_FIELD)
        .field("sport_selection", "sport")
        .field("sport_position", "sportPosition")
        .field("sport_level", "sportLevel")
        .field("sport_season", "seasonPeriod")
        .field("training_frequency", "trainingFrequency")
        .field("sport_equipment", "equipmentLevel")
        .field("strength_setup", "strengthObjective")
        .field("strength_experience", "strengthExperience")
        .field("nutrition_setup", "dietaryPreference")
        .field("nutrition_objective", "nutritionObjective")
        .field("nutrition_restrictions", "foodAllergies")
        .field("sleep_setup", "averageSleepHours")
        .field("sleep_difficulties", "sleepDifficulties")
        .field("hydration_setup", "hydrationGoal")
        .field("hydration_reminders", "hydrationReminders")
        .field("available_time", "availableTimePerDay")
        .field("final_questions", "motivation")
        .field("privacy_consent", "privacyConsent")
        .field("marketing_consent", "marketingConsent")
        // `lifestyle` closes the personal info section.
        .checkpoints(&[
            "lifestyle",
            "pack_selection",
            "custom_module_selection",
            "pack_upsell",
            "module_selection",
            "sport_selection",
        ])
        .estimated_minutes(12)
        .profile(profile)
        .record(record())
        .build()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, TimeZone, Utc};
    use rust_decimal::Decimal;

    use super::*;
    use crate::catalog::{Catalog, Sport, SportCategory};
    use crate::onboarding::flow::Locale;
    use crate::onboarding::identity::FixedIdentity;
    use crate::onboarding::navigator::{CalculatorSettings, FixedClock, Navigator, NavigatorDeps};
    use crate::onboarding::persistence::{MemoryProgressStore, SaveOutcome};
    use crate::onboarding::response::Response;
    use crate::onboarding::state::SessionPhase;

    fn navigator(store: Arc<MemoryProgressStore>) -> Navigator {
        navigator_with_catalog(store, Arc::new(Catalog::new()))
    }

    fn navigator_with_catalog(store: Arc<MemoryProgressStore>, catalog: Arc<Catalog>) -> Navigator {
        let deps = NavigatorDeps {
            catalog,
            store,
            identity: Arc::new(FixedIdentity::user("user-1")),
            clock: Arc::new(FixedClock(Utc.with_ymd_and_hms(2026, 5, 4, 8, 0, 0).unwrap())),
            settings: CalculatorSettings::default(),
        };
        Navigator::new(Arc::new(flow().unwrap()), deps, Locale::Fr)
    }

    fn select(s: &str) -> Response {
        Response::SingleSelect(s.into())
    }

    fn multi(items: &[&str]) -> Response {
        Response::MultiSelect(items.iter().map(|s| s.to_string()).collect())
    }

    async fn answer(nav: &mut Navigator, response: Response) -> SaveOutcome {
        let outcome = nav.advance(response).await.unwrap();
        assert!(
            outcome.advanced(),
            "rejected at {}: {:?}",
            nav.state().current_step_id,
            outcome.validation_errors
        );
        outcome.save
    }

    async fn through_personal_info(nav: &mut Navigator) {
        answer(nav, Response::None).await;
        answer(nav, Response::Text("Alice".into())).await;
        answer(nav, Response::Number(30.0)).await;
        answer(nav, select("female")).await;
        answer(nav, select("office_worker")).await;
        answer(nav, select("performance")).await;
        assert_eq!(nav.state().current_step_id, "pack_selection");
    }

    #[test]
    fn flow_is_well_formed() {
        let flow = flow().unwrap();
        assert_eq!(flow.initial(), "welcome");
        assert_eq!(flow.terminal(), "completion");
        assert!(flow.is_checkpoint("pack_upsell"));
        assert!(!flow.is_checkpoint("get_name"));
    }

    #[test]
    fn sections_follow_module_choice() {
        let mut answers = Answers::new();
        answers.insert(MODULES_FIELD, vec!["sleep".to_string(), "sport".to_string()]);
        assert_eq!(next_section(&answers, None), "sport_selection");
        assert_eq!(next_section(&answers, Some("sport")), "sleep_setup");
        assert_eq!(next_section(&answers, Some("sleep")), AFTER_SECTIONS);
        assert_eq!(next_section(&Answers::new(), None), AFTER_SECTIONS);
    }

    #[tokio::test]
    async fn name_is_validated_and_personalizes_titles() {
        let mut nav = navigator(Arc::new(MemoryProgressStore::new()));
        answer(&mut nav, Response::None).await;

        let outcome = nav.advance(Response::Text("R2-D2".into())).await.unwrap();
        assert_eq!(outcome.validation_errors, ["Lettres, espaces et tirets uniquement"]);
        let outcome = nav.advance(Response::Text(String::new())).await.unwrap();
        assert_eq!(outcome.validation_errors, ["Ton prénom est requis"]);

        answer(&mut nav, Response::Text("Alice".into())).await;
        let view = nav.view().await.unwrap();
        assert_eq!(view.current_step.title, "Enchanté Alice ! Quel âge as-tu ?");
    }

    #[tokio::test]
    async fn optional_gender_takes_any_widget() {
        let mut nav = navigator(Arc::new(MemoryProgressStore::new()));
        answer(&mut nav, Response::None).await;
        answer(&mut nav, Response::Text("Alice".into())).await;
        answer(&mut nav, Response::Number(30.0)).await;

        let outcome = nav.advance(Response::Text("female".into())).await.unwrap();
        assert!(outcome.advanced(), "{:?}", outcome.validation_errors);
        assert_eq!(nav.state().current_step_id, "lifestyle");
        assert_eq!(nav.state().answers.get_str("gender"), Some("female"));
    }

    #[tokio::test]
    async fn custom_path_with_sport_and_sleep() {
        let store = Arc::new(MemoryProgressStore::new());
        let mut nav = navigator(Arc::clone(&store));
        through_personal_info(&mut nav).await;
        assert_eq!(store.save_count(), 1);

        assert_eq!(answer(&mut nav, select("custom")).await, SaveOutcome::Saved);
        assert_eq!(nav.state().current_step_id, "custom_module_selection");
        answer(&mut nav, multi(&["sport", "sleep"])).await;
        assert_eq!(nav.state().derived.price, Some(Decimal::from(14)));

        answer(&mut nav, Response::None).await;
        let derived = &nav.state().derived;
        assert_eq!(derived.suggested_modules, ["strength"]);
        assert_eq!(
            derived.trial_ends_at,
            Some(Utc.with_ymd_and_hms(2026, 5, 4, 8, 0, 0).unwrap() + Duration::days(15))
        );

        answer(&mut nav, multi(&["sport", "sleep"])).await;
        assert_eq!(nav.state().current_step_id, "sport_selection");
        assert_eq!(nav.state().derived.estimated_minutes_left, 7);

        answer(&mut nav, select("football")).await;
        assert_eq!(nav.state().current_step_id, "sport_position");
        assert_eq!(nav.state().derived.sport_category, Some(SportCategory::Team));

        let view = nav.view().await.unwrap();
        assert_eq!(view.current_step.options[0].value, "Gardien");
        assert_eq!(view.current_step.options[1].id, "défenseur_central");

        answer(&mut nav, select("Gardien")).await;
        answer(&mut nav, select("amateur_competitive")).await;
        answer(&mut nav, select("in_season")).await;
        answer(&mut nav, Response::Slider(4.0)).await;
        answer(&mut nav, select("full_gym")).await;
        assert_eq!(nav.state().current_step_id, "sleep_setup");

        let outcome = nav.advance(Response::Slider(3.0)).await.unwrap();
        assert_eq!(outcome.validation_errors, ["4 heures minimum"]);
        answer(&mut nav, Response::Slider(7.5)).await;
        answer(&mut nav, multi(&[])).await;
        assert_eq!(nav.state().current_step_id, "available_time");

        answer(&mut nav, Response::Slider(45.0)).await;
        answer(&mut nav, Response::Text("Gagner le championnat".into())).await;
        let outcome = nav.advance(Response::Toggle(false)).await.unwrap();
        assert_eq!(outcome.validation_errors, ["Ton accord est nécessaire pour continuer"]);
        answer(&mut nav, Response::Toggle(true)).await;
        answer(&mut nav, Response::Toggle(false)).await;
        answer(&mut nav, Response::None).await;
        assert_eq!(nav.state().current_step_id, "completion");

        let completion = nav.complete().await.unwrap();
        assert_eq!(completion.save, SaveOutcome::Saved);
        assert_eq!(completion.state.phase, SessionPhase::Completed);

        let record = store.record("user-1").await.unwrap();
        let row = record.to_value();
        assert_eq!(row["first_name"], "Alice");
        assert_eq!(row["age"], 30);
        assert_eq!(row["fitness_goal"], "performance");
        assert_eq!(row["modules"], json!(["sport", "sleep"]));
        assert_eq!(row["selected_pack"], "custom");
        assert_eq!(row["trial_modules"], json!(["strength"]));
        assert_eq!(row["trial_end_date"], "2026-05-19T08:00:00+00:00");
        assert_eq!(row["sport_position"], "Gardien");
        assert_eq!(row["sport_level"], "amateur_competitive");
        assert_eq!(row["sleep_hours_average"], json!(7.5));
        assert_eq!(row["water_intake_goal"], Value::Null);
        assert_eq!(row["food_allergies"], json!([]));
        assert_eq!(row["privacy_consent"], true);

        // female, 30, office worker, performance: (700 + 1000 - 150 - 161) * 1.3 + 200
        assert_eq!(completion.state.derived.daily_calories, Some(2006));
    }

    #[tokio::test]
    async fn pack_path_and_sport_without_positions() {
        let mut nav = navigator(Arc::new(MemoryProgressStore::new()));
        through_personal_info(&mut nav).await;

        answer(&mut nav, select("performance")).await;
        assert_eq!(nav.state().current_step_id, "pack_upsell");
        assert_eq!(nav.state().derived.price, Some(Decimal::from(28)));
        assert_eq!(nav.state().answers.get_list(MODULES_FIELD).len(), 4);

        answer(&mut nav, Response::None).await;
        assert!(nav.state().derived.suggested_modules.is_empty());

        answer(&mut nav, multi(&["sport", "hydration"])).await;
        answer(&mut nav, select("other")).await;
        assert_eq!(nav.state().current_step_id, "sport_level");
        answer(&mut nav, select("recreational")).await;
        answer(&mut nav, select("off_season")).await;
        answer(&mut nav, Response::Slider(2.0)).await;
        answer(&mut nav, select("no_equipment")).await;
        assert_eq!(nav.state().current_step_id, "hydration_setup");
        answer(&mut nav, Response::Slider(2.5)).await;
        answer(&mut nav, Response::Toggle(true)).await;
        assert_eq!(nav.state().current_step_id, "available_time");
    }

    #[tokio::test]
    async fn live_sport_positions_are_offered() {
        let catalog = Arc::new(Catalog::new());
        catalog
            .set_live_sports(vec![Sport {
                id: "padel".into(),
                name: "Padel".into(),
                emoji: None,
                category: SportCategory::Racket,
                positions: vec!["Drive".into(), "Revers".into()],
            }])
            .await;
        let mut nav = navigator_with_catalog(Arc::new(MemoryProgressStore::new()), catalog);
        through_personal_info(&mut nav).await;
        answer(&mut nav, select("performance")).await;
        answer(&mut nav, Response::None).await;
        answer(&mut nav, multi(&["sport"])).await;

        answer(&mut nav, select("padel")).await;
        assert_eq!(nav.state().current_step_id, "sport_position");
        assert_eq!(nav.state().derived.sport_category, Some(SportCategory::Racket));
        let view = nav.view().await.unwrap();
        let positions: Vec<_> = view.current_step.options.iter().map(|o| o.value.as_str()).collect();
        assert_eq!(positions, ["Drive", "Revers"]);

        answer(&mut nav, select("Revers")).await;
        assert_eq!(nav.state().current_step_id, "sport_level");
        assert_eq!(nav.state().answers.get_str("sportPosition"), Some("Revers"));
    }

    #[tokio::test]
    async fn unknown_sport_passes_over_positions() {
        let mut nav = navigator(Arc::new(MemoryProgressStore::new()));
        through_personal_info(&mut nav).await;
        answer(&mut nav, select("performance")).await;
        answer(&mut nav, Response::None).await;
        answer(&mut nav, multi(&["sport"])).await;

        answer(&mut nav, select("padel")).await;
        assert_eq!(nav.state().current_step_id, "sport_level");
        assert!(!nav.state().completed_step_ids.iter().any(|id| id == "sport_position"));
        assert!(!nav.state().answers.contains("sportPosition"));
    }

    #[test]
    fn unknown_objective_is_stored_as_general() {
        let mut state = OnboardingState::new(&flow().unwrap(), Locale::En, Utc::now());
        state.answers.insert("mainObjective", "holistic");
        let row = record().build("u", &state, Utc::now()).to_value();
        assert_eq!(row["fitness_goal"], "general");
        assert_eq!(row["modules"], json!(DEFAULT_MODULES));
        assert_eq!(row["trial_end_date"], Value::Null);
    }
}
