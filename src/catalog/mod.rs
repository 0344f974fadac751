//! Catalog of modules, packs and sports.
//!
//! Static data is compiled in. The sports list can additionally be
//! overridden by a live catalog service; lookups consult the override first
//! and fall back to the static table.

pub mod data;
pub mod remote;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::CatalogError;
use crate::onboarding::flow::{LocalizedText, StepOption};

pub use data::{CUSTOM_PACK, Choice, DEFAULT_MODULES, ModuleInfo, PackInfo, SportInfo};
pub use remote::RemoteCatalog;

/// Broad sport family, used to size the hydration goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SportCategory {
    Team,
    Endurance,
    Racket,
    Strength,
    #[default]
    Other,
}

impl std::fmt::Display for SportCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Team => "team",
            Self::Endurance => "endurance",
            Self::Racket => "racket",
            Self::Strength => "strength",
            Self::Other => "other",
        };
        write!(f, "{s}")
    }
}

/// A sport as served to clients and as received from the live catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sport {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emoji: Option<String>,
    #[serde(default)]
    pub category: SportCategory,
    #[serde(default)]
    pub positions: Vec<String>,
}

impl From<&SportInfo> for Sport {
    fn from(info: &SportInfo) -> Self {
        Self {
            id: info.id.to_string(),
            name: info.name_fr.to_string(),
            emoji: Some(info.emoji.to_string()),
            category: info.category,
            positions: info.positions.iter().map(|p| p.to_string()).collect(),
        }
    }
}

/// Option id for a position label: lowercase, whitespace runs become `_`.
pub fn position_option_id(label: &str) -> String {
    label
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

fn position_options(positions: &[String]) -> Vec<StepOption> {
    positions
        .iter()
        .map(|p| StepOption {
            id: position_option_id(p),
            label: LocalizedText::from(p.as_str()),
            value: p.clone(),
            description: None,
        })
        .collect()
}

/// Static lookups plus the live sports override.
#[derive(Debug, Default)]
pub struct Catalog {
    live_sports: RwLock<Option<Vec<Sport>>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn modules(&self) -> &'static [ModuleInfo] {
        data::MODULES
    }

    pub fn module(&self, id: &str) -> Option<&'static ModuleInfo> {
        data::MODULES.iter().find(|m| m.id == id)
    }

    pub fn packs(&self) -> &'static [PackInfo] {
        data::PACKS
    }

    pub fn pack(&self, id: &str) -> Option<&'static PackInfo> {
        data::PACKS.iter().find(|p| p.id == id)
    }

    /// All sports: the live list when one is loaded, the static table otherwise.
    pub async fn sports(&self) -> Vec<Sport> {
        if let Some(live) = self.live_sports.read().await.as_ref() {
            return live.clone();
        }
        data::SPORTS.iter().map(Sport::from).collect()
    }

    /// Look a sport up, live list first.
    pub async fn sport(&self, id: &str) -> Option<Sport> {
        if let Some(sport) = self
            .live_sports
            .read()
            .await
            .as_ref()
            .and_then(|live| live.iter().find(|s| s.id == id))
        {
            return Some(sport.clone());
        }
        static_sport(id).map(Sport::from)
    }

    /// Position options for `sport_id`. Falls back to the static positions
    /// when the live entry has none.
    pub async fn position_options(&self, sport_id: &str) -> Vec<StepOption> {
        if let Some(sport) = self.sport(sport_id).await {
            if !sport.positions.is_empty() {
                return position_options(&sport.positions);
            }
        }
        static_sport(sport_id)
            .map(|s| {
                let positions: Vec<String> = s.positions.iter().map(|p| p.to_string()).collect();
                position_options(&positions)
            })
            .unwrap_or_default()
    }

    /// Replace the live sports list.
    pub async fn set_live_sports(&self, sports: Vec<Sport>) {
        *self.live_sports.write().await = Some(sports);
    }

    pub async fn clear_live_sports(&self) {
        *self.live_sports.write().await = None;
    }

    pub async fn has_live_sports(&self) -> bool {
        self.live_sports.read().await.is_some()
    }

    /// Fetch sports from the live catalog service and install them.
    ///
    /// On failure the current list (live or static) stays in place.
    pub async fn refresh(&self, remote: &RemoteCatalog) -> Result<usize, CatalogError> {
        let sports = remote.fetch_sports().await?;
        let count = sports.len();
        self.set_live_sports(sports).await;
        tracing::info!(count, "Live sports catalog loaded");
        Ok(count)
    }
}

/// Static sport entry by id.
pub fn static_sport(id: &str) -> Option<&'static SportInfo> {
    data::SPORTS.iter().find(|s| s.id == id)
}

/// Step options from a plain option list.
pub fn choice_options(choices: &[Choice]) -> Vec<StepOption> {
    choices
        .iter()
        .map(|c| {
            let option = StepOption::new(c.id, LocalizedText::new(c.name_fr, c.name_en));
            if c.description.is_empty() {
                option
            } else {
                option.with_description(LocalizedText::from(c.description))
            }
        })
        .collect()
}

pub fn module_options() -> Vec<StepOption> {
    data::MODULES
        .iter()
        .map(|m| {
            StepOption::new(m.id, LocalizedText::new(m.name_fr, m.name_en))
                .with_description(LocalizedText::from(m.description))
        })
        .collect()
}

/// Pack options followed by the custom choice.
pub fn pack_options() -> Vec<StepOption> {
    data::PACKS
        .iter()
        .map(|p| {
            StepOption::new(p.id, LocalizedText::new(p.name_fr, p.name_en))
                .with_description(LocalizedText::from(p.description))
        })
        .chain(std::iter::once(StepOption::new(
            CUSTOM_PACK,
            LocalizedText::new("Sur mesure", "Custom"),
        )))
        .collect()
}

/// Sport options, using the static English name when the sport is known
/// statically.
pub fn sport_step_options(sports: &[Sport]) -> Vec<StepOption> {
    sports
        .iter()
        .map(|s| {
            let label = match static_sport(&s.id) {
                Some(info) => LocalizedText::new(s.name.as_str(), info.name_en),
                None => LocalizedText::from(s.name.as_str()),
            };
            StepOption::new(s.id.as_str(), label)
        })
        .collect()
}
