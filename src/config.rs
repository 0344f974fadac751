//! Configuration types.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;
use crate::onboarding::calculators::{BmrEquation, DEFAULT_HYDRATION_BASE_ML};
use crate::onboarding::navigator::CalculatorSettings;

/// Service configuration, read from `FIT_ONBOARD_*` environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// libSQL database file.
    pub db_path: PathBuf,
    pub port: u16,
    /// Live sports catalog service. Static data only when unset.
    pub catalog_url: Option<String>,
    pub catalog_api_key: Option<SecretString>,
    pub calculators: CalculatorSettings,
    /// Sessions untouched for this long are dropped.
    pub session_idle_timeout: Duration,
    /// Directory for daily rolling log files. Stderr only when unset.
    pub log_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("./data/fit-onboard.db"),
            port: 8080,
            catalog_url: None,
            catalog_api_key: None,
            calculators: CalculatorSettings::default(),
            session_idle_timeout: Duration::from_secs(3600), // 1 hour
            log_dir: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from any key lookup. Unset or blank keys take defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let port = match get("FIT_ONBOARD_PORT") {
            Some(v) => parse("FIT_ONBOARD_PORT", &v)?,
            None => defaults.port,
        };
        let hydration_base_ml = match get("FIT_ONBOARD_HYDRATION_BASE_ML") {
            Some(v) => parse("FIT_ONBOARD_HYDRATION_BASE_ML", &v)?,
            None => DEFAULT_HYDRATION_BASE_ML,
        };
        let session_idle_timeout = match get("FIT_ONBOARD_SESSION_IDLE_MINUTES") {
            Some(v) => {
                let minutes: u64 = parse("FIT_ONBOARD_SESSION_IDLE_MINUTES", &v)?;
                Duration::from_secs(minutes.saturating_mul(60))
            }
            None => defaults.session_idle_timeout,
        };
        let bmr_equation = match get("FIT_ONBOARD_BMR_EQUATION") {
            Some(v) => BmrEquation::from_str(&v).map_err(|message| ConfigError::InvalidValue {
                key: "FIT_ONBOARD_BMR_EQUATION".to_string(),
                message,
            })?,
            None => BmrEquation::default(),
        };

        Ok(Self {
            db_path: get("FIT_ONBOARD_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.db_path),
            port,
            catalog_url: get("FIT_ONBOARD_CATALOG_URL"),
            catalog_api_key: get("FIT_ONBOARD_CATALOG_API_KEY").map(SecretString::from),
            calculators: CalculatorSettings {
                bmr_equation,
                hydration_base_ml,
            },
            session_idle_timeout,
            log_dir: get("FIT_ONBOARD_LOG_DIR").map(PathBuf::from),
        })
    }
}

fn parse<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("'{value}': {e}"),
    })
}
