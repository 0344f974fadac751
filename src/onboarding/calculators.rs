//! Derived-value calculators. All pure.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::catalog::{SportCategory, data};

/// Reference body weight used by the calorie estimate, in kg.
pub const REFERENCE_WEIGHT_KG: f64 = 70.0;
pub const REFERENCE_HEIGHT_MALE_CM: f64 = 175.0;
pub const REFERENCE_HEIGHT_FEMALE_CM: f64 = 160.0;

/// Length of the free trial on upsold modules.
pub const TRIAL_DAYS: i64 = 15;

/// Sum of the unit prices of `modules`. Unknown ids cost nothing.
pub fn price_of<S: AsRef<str>>(modules: &[S]) -> Decimal {
    modules
        .iter()
        .filter_map(|id| data::MODULES.iter().find(|m| m.id == id.as_ref()))
        .map(|m| Decimal::from(m.price_eur))
        .sum()
}

/// Onboarding minutes left once `modules` are chosen.
pub fn estimated_minutes<S: AsRef<str>>(modules: &[S]) -> u32 {
    data::BASE_SETUP_MINUTES
        + modules
            .iter()
            .filter_map(|id| data::MODULES.iter().find(|m| m.id == id.as_ref()))
            .map(|m| m.setup_minutes)
            .sum::<u32>()
}

/// Complementary modules worth offering on top of `modules`, in a fixed
/// order: strength for sport, nutrition for strength, sleep for sport.
pub fn suggested_modules<S: AsRef<str>>(modules: &[S]) -> Vec<String> {
    let has = |id: &str| modules.iter().any(|m| m.as_ref() == id);
    let mut suggestions = Vec::new();
    if has("sport") && !has("strength") {
        suggestions.push("strength".to_string());
    }
    if has("strength") && !has("nutrition") {
        suggestions.push("nutrition".to_string());
    }
    if has("sport") && !has("sleep") {
        suggestions.push("sleep".to_string());
    }
    suggestions
}

// ── Calories ────────────────────────────────────────────────────────────

/// Basal metabolic rate equation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BmrEquation {
    #[default]
    MifflinStJeor,
    /// Revised Harris-Benedict (Roza & Shizgal).
    HarrisBenedict,
}

impl BmrEquation {
    /// BMR in kcal/day at the reference weight and height for `gender`.
    /// Anything other than `male` uses the female coefficients.
    pub fn bmr(&self, age: f64, gender: &str) -> f64 {
        let w = REFERENCE_WEIGHT_KG;
        let male = gender == "male";
        match (self, male) {
            (Self::MifflinStJeor, true) => 10.0 * w + 6.25 * REFERENCE_HEIGHT_MALE_CM - 5.0 * age + 5.0,
            (Self::MifflinStJeor, false) => {
                10.0 * w + 6.25 * REFERENCE_HEIGHT_FEMALE_CM - 5.0 * age - 161.0
            }
            (Self::HarrisBenedict, true) => {
                88.362 + 13.397 * w + 4.799 * REFERENCE_HEIGHT_MALE_CM - 5.677 * age
            }
            (Self::HarrisBenedict, false) => {
                447.593 + 9.247 * w + 3.098 * REFERENCE_HEIGHT_FEMALE_CM - 4.330 * age
            }
        }
    }
}

impl fmt::Display for BmrEquation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MifflinStJeor => write!(f, "mifflin_st_jeor"),
            Self::HarrisBenedict => write!(f, "harris_benedict"),
        }
    }
}

impl FromStr for BmrEquation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mifflin_st_jeor" | "mifflin" => Ok(Self::MifflinStJeor),
            "harris_benedict" | "harris" => Ok(Self::HarrisBenedict),
            other => Err(format!("unknown BMR equation '{other}'")),
        }
    }
}

/// Activity multiplier for a lifestyle; unknown lifestyles get 1.4.
pub fn activity_factor(lifestyle: &str) -> f64 {
    match lifestyle {
        "student" => 1.4,
        "office_worker" => 1.3,
        "physical_job" => 1.6,
        "retired" => 1.2,
        _ => 1.4,
    }
}

/// Signed kcal adjustment for a fitness goal; unknown goals get 0.
pub fn goal_adjustment(goal: &str) -> f64 {
    match goal {
        "weight_loss" => -300.0,
        "muscle_gain" => 400.0,
        "performance" => 200.0,
        _ => 0.0,
    }
}

/// `round(bmr * activity_factor(lifestyle) + goal_adjustment(goal))`.
pub fn estimated_daily_calories(
    age: u32,
    gender: &str,
    lifestyle: &str,
    goal: &str,
    equation: BmrEquation,
) -> u32 {
    let kcal = equation.bmr(f64::from(age), gender) * activity_factor(lifestyle) + goal_adjustment(goal);
    kcal.round().max(0.0) as u32
}

// ── Hydration ───────────────────────────────────────────────────────────

/// Default daily water target before personalization, in ml.
pub const DEFAULT_HYDRATION_BASE_ML: u32 = 2500;

fn category_modifier(category: SportCategory) -> i32 {
    match category {
        SportCategory::Endurance => 750,
        SportCategory::Team => 500,
        SportCategory::Racket => 400,
        SportCategory::Strength => 300,
        SportCategory::Other => 0,
    }
}

fn age_modifier(age: Option<u32>) -> i32 {
    match age {
        None => 0,
        Some(a) if a < 14 => -500,
        Some(a) if a < 18 => -250,
        Some(a) if a <= 55 => 0,
        Some(_) => -200,
    }
}

fn gender_modifier(gender: Option<&str>) -> i32 {
    match gender {
        Some("male") => 300,
        _ => 0,
    }
}

fn goal_modifier(goal: &str) -> i32 {
    match goal {
        "performance" => 500,
        "endurance" => 400,
        "muscle_gain" => 300,
        "weight_loss" => 250,
        "recovery" => 200,
        _ => 0,
    }
}

/// Base plus additive modifiers for sport category, age bracket, gender and
/// each distinct goal. Never below zero.
pub fn personalized_hydration_goal_ml<S: AsRef<str>>(
    base_ml: u32,
    category: SportCategory,
    age: Option<u32>,
    gender: Option<&str>,
    goals: &[S],
) -> u32 {
    let mut seen: Vec<&str> = Vec::with_capacity(goals.len());
    let goals_total: i32 = goals
        .iter()
        .map(AsRef::as_ref)
        .filter(|g| {
            if seen.contains(g) {
                false
            } else {
                seen.push(g);
                true
            }
        })
        .map(goal_modifier)
        .sum();

    let total = i64::from(base_ml)
        + i64::from(category_modifier(category))
        + i64::from(age_modifier(age))
        + i64::from(gender_modifier(gender))
        + i64::from(goals_total);
    total.max(0) as u32
}

// ── Profile inputs ──────────────────────────────────────────────────────

/// The answers the calorie and hydration calculators read, extracted from a
/// flow's answers by that flow's extractor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileInputs {
    pub age: Option<u32>,
    pub gender: Option<String>,
    pub lifestyle: Option<String>,
    pub fitness_goal: Option<String>,
    pub goals: Vec<String>,
    pub sport: Option<String>,
}

impl ProfileInputs {
    /// Calorie estimate with missing inputs defaulted to age 25, male,
    /// office worker, general goal.
    pub fn daily_calories(&self, equation: BmrEquation) -> u32 {
        let age = self.age.filter(|a| *a > 0).unwrap_or(25);
        estimated_daily_calories(
            age,
            self.gender.as_deref().unwrap_or("male"),
            self.lifestyle.as_deref().unwrap_or("office_worker"),
            self.fitness_goal.as_deref().unwrap_or("general"),
            equation,
        )
    }

    /// Whether enough is known for a calorie estimate worth showing.
    pub fn has_body_data(&self) -> bool {
        self.age.is_some() || self.gender.is_some() || self.lifestyle.is_some()
    }
}
