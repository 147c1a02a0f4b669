use crate::error::{ConsolidatorError, Result};
use crate::extraction::DEFAULT_MAX_CONTEXT_CHARS;
use crate::locale::ReportLocale;
use crate::scaling::DisplayUnit;
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_PRIMARY_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_FALLBACK_MODEL: &str = "gemini-1.5-flash";

pub const ENV_API_KEY: &str = "GEMINI_API_KEY";
pub const ENV_PRIMARY_MODEL: &str = "CONSOLIDATOR_PRIMARY_MODEL";
pub const ENV_FALLBACK_MODEL: &str = "CONSOLIDATOR_FALLBACK_MODEL";
pub const ENV_MAX_CONTEXT: &str = "CONSOLIDATOR_MAX_CONTEXT";
pub const ENV_UNIT: &str = "CONSOLIDATOR_UNIT";
pub const ENV_LOCALE: &str = "CONSOLIDATOR_LOCALE";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsolidatorConfig {
    pub api_key: Option<String>,
    pub primary_model: String,
    /// Tried once when the primary model call fails.
    pub fallback_model: String,
    pub max_context_chars: usize,
    pub default_unit: DisplayUnit,
    pub locale: ReportLocale,
}

impl Default for ConsolidatorConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            primary_model: DEFAULT_PRIMARY_MODEL.to_string(),
            fallback_model: DEFAULT_FALLBACK_MODEL.to_string(),
            max_context_chars: DEFAULT_MAX_CONTEXT_CHARS,
            default_unit: DisplayUnit::default(),
            locale: ReportLocale::default(),
        }
    }
}

impl ConsolidatorConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| ConsolidatorError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults, then the optional TOML file, then environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                debug!("Loading configuration from {}", path.display());
                let text = std::fs::read_to_string(path)?;
                Self::from_toml_str(&text)?
            }
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Applies `CONSOLIDATOR_*` / `GEMINI_API_KEY` style overrides from `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty(ENV_API_KEY) {
            self.api_key = Some(key);
        }
        if let Some(model) = non_empty(ENV_PRIMARY_MODEL) {
            self.primary_model = model;
        }
        if let Some(model) = non_empty(ENV_FALLBACK_MODEL) {
            self.fallback_model = model;
        }
        if let Some(max) = non_empty(ENV_MAX_CONTEXT) {
            self.max_context_chars = max.trim().parse().map_err(|_| {
                ConsolidatorError::Config(format!("{} must be a positive integer, got '{}'", ENV_MAX_CONTEXT, max))
            })?;
        }
        if let Some(unit) = non_empty(ENV_UNIT) {
            self.default_unit = unit.parse()?;
        }
        if let Some(locale) = non_empty(ENV_LOCALE) {
            self.locale = locale.parse()?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_context_chars == 0 {
            return Err(ConsolidatorError::Config(
                "max_context_chars must be greater than zero".to_string(),
            ));
        }
        if self.primary_model.trim().is_empty() || self.fallback_model.trim().is_empty() {
            return Err(ConsolidatorError::Config(
                "model names must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ConsolidatorError::Config(format!("{} must be set", ENV_API_KEY)))
    }
}
