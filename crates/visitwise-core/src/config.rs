//! Practice configuration
//!
//! Loaded from a JSON file; every field has a default so a missing or
//! partial file still yields a usable config.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::VisitwiseError;
use crate::media::DEFAULT_STORAGE_ROOT;
use crate::model::Amount;
use crate::store::Theme;

/// Placeholders: `{name}`, `{currency}`, `{amount}`
pub const DEFAULT_REMINDER_TEMPLATE: &str =
    "Hello {name}, this is a gentle reminder that {currency}{amount} is pending for your sessions. Thank you!";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PracticeConfig {
    pub practitioner_name: Option<String>,
    pub currency_symbol: String,
    /// Pre-filled charge for new patients
    pub default_charge_per_visit: Amount,
    /// Prefixed to 10-digit local numbers in messaging links
    pub default_country_code: String,
    pub reminder_template: String,
    pub default_theme: Theme,
    pub storage_root: String,
}

impl Default for PracticeConfig {
    fn default() -> Self {
        PracticeConfig {
            practitioner_name: None,
            currency_symbol: "₹".to_string(),
            default_charge_per_visit: 0,
            default_country_code: "91".to_string(),
            reminder_template: DEFAULT_REMINDER_TEMPLATE.to_string(),
            default_theme: Theme::System,
            storage_root: DEFAULT_STORAGE_ROOT.to_string(),
        }
    }
}

impl PracticeConfig {
    pub fn from_json_str(json: &str) -> crate::Result<Self> {
        let config: PracticeConfig = serde_json::from_str(json)?;
        config.check()?;
        Ok(config)
    }

    /// Read a config file; a missing file means defaults
    pub fn load(path: &Path) -> crate::Result<Self> {
        if !path.exists() {
            log::info!("No config at {}, using defaults", path.display());
            return Ok(PracticeConfig::default());
        }
        let contents = std::fs::read_to_string(path)?;
        let config = PracticeConfig::from_json_str(&contents)?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    fn check(&self) -> crate::Result<()> {
        if !self.reminder_template.contains("{amount}") {
            return Err(VisitwiseError::Config(
                "reminder_template must contain {amount}".to_string(),
            ));
        }
        if !self.default_country_code.chars().all(|c| c.is_ascii_digit()) {
            return Err(VisitwiseError::Config(
                "default_country_code must be digits only".to_string(),
            ));
        }
        if self.storage_root.trim_matches('/').is_empty() {
            return Err(VisitwiseError::Config("storage_root cannot be empty".to_string()));
        }
        Ok(())
    }
}
