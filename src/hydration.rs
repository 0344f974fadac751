//! Daily hydration tracking: a goal, the intakes logged against it, and the
//! summary shown on the dashboard.

use std::collections::HashMap;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;

/// Amounts offered as one-tap buttons, in ml.
pub const QUICK_AMOUNTS: [u32; 5] = [125, 250, 330, 500, 750];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DrinkKind {
    #[default]
    Water,
    Coffee,
    Tea,
    Juice,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intake {
    pub time: NaiveTime,
    pub amount_ml: u32,
    #[serde(default)]
    pub kind: DrinkKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HydrationSummary {
    pub goal_ml: u32,
    pub current_ml: u32,
    pub remaining_ml: u32,
    /// Share of the goal reached, capped at 100.
    pub percentage: f64,
    pub goal_reached: bool,
}

/// One day of intakes, in the order they were logged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HydrationDay {
    pub goal_ml: u32,
    intakes: Vec<Intake>,
}

impl HydrationDay {
    pub fn new(goal_ml: u32) -> Self {
        Self {
            goal_ml,
            intakes: Vec::new(),
        }
    }

    pub fn intakes(&self) -> &[Intake] {
        &self.intakes
    }

    pub fn add(&mut self, time: NaiveTime, amount_ml: u32, kind: DrinkKind) {
        self.intakes.push(Intake { time, amount_ml, kind });
    }

    /// Undo the most recent intake. Returns it, or `None` on an empty day.
    pub fn remove_last(&mut self) -> Option<Intake> {
        self.intakes.pop()
    }

    pub fn current_ml(&self) -> u32 {
        self.intakes.iter().map(|i| i.amount_ml).sum()
    }

    pub fn summary(&self) -> HydrationSummary {
        let current_ml = self.current_ml();
        let percentage = if self.goal_ml == 0 {
            100.0
        } else {
            (f64::from(current_ml) / f64::from(self.goal_ml) * 100.0).min(100.0)
        };
        HydrationSummary {
            goal_ml: self.goal_ml,
            current_ml,
            remaining_ml: self.goal_ml.saturating_sub(current_ml),
            percentage,
            goal_reached: current_ml >= self.goal_ml,
        }
    }
}

/// In-memory hydration days, one per user. Starting a new date drops the
/// user's earlier days.
#[derive(Debug, Default)]
pub struct HydrationLog {
    days: RwLock<HashMap<String, (NaiveDate, HydrationDay)>>,
}

impl HydrationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// The user's day for `date`, or an empty day at `default_goal_ml`.
    pub async fn day(&self, user_id: &str, date: NaiveDate, default_goal_ml: u32) -> HydrationDay {
        match self.days.read().await.get(user_id) {
            Some((d, day)) if *d == date => day.clone(),
            _ => HydrationDay::new(default_goal_ml),
        }
    }

    /// Apply `f` to the user's day for `date`, creating it first if needed.
    /// Returns what `f` returned and the updated day.
    pub async fn update<R>(
        &self,
        user_id: &str,
        date: NaiveDate,
        default_goal_ml: u32,
        f: impl FnOnce(&mut HydrationDay) -> R,
    ) -> (R, HydrationDay) {
        let mut days = self.days.write().await;
        let entry = days
            .entry(user_id.to_string())
            .or_insert_with(|| (date, HydrationDay::new(default_goal_ml)));
        if entry.0 != date {
            debug!(user_id, from = %entry.0, to = %date, "Starting new hydration day");
            *entry = (date, HydrationDay::new(default_goal_ml));
        }
        let result = f(&mut entry.1);
        (result, entry.1.clone())
    }
}
