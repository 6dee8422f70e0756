use crate::error::{Result, StatementExtractorError};

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_TEMPERATURE: f32 = 0.1;

/// Environment variables consulted for the API key, in order.
pub const API_KEY_VARS: &[&str] = &["GEMINI_API_KEY", "API_KEY"];

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractorConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub temperature: f32,
}

impl ExtractorConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: GEMINI_BASE_URL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    /// Reads the key from `GEMINI_API_KEY` (or `API_KEY`), with optional
    /// `GEMINI_MODEL` and `GEMINI_BASE_URL` overrides.
    pub fn from_env() -> Result<Self> {
        let api_key = resolve_api_key().ok_or_else(|| {
            StatementExtractorError::Configuration(format!(
                "no API key found; set one of {}",
                API_KEY_VARS.join(", ")
            ))
        })?;

        let mut config = Self::new(api_key);
        if let Some(model) = non_empty_var("GEMINI_MODEL") {
            config.model = model;
        }
        if let Some(base_url) = non_empty_var("GEMINI_BASE_URL") {
            config.base_url = base_url;
        }
        Ok(config)
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !is_usable_key(&self.api_key) {
            return Err(StatementExtractorError::Configuration(
                "API key is missing".to_string(),
            ));
        }
        if self.model.trim().is_empty() {
            return Err(StatementExtractorError::Configuration(
                "model name is empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Bundlers substitute the literal string "undefined" for unset keys, so it
/// counts as absent.
pub fn is_usable_key(key: &str) -> bool {
    let key = key.trim();
    !key.is_empty() && key != "undefined"
}

pub fn resolve_api_key() -> Option<String> {
    API_KEY_VARS
        .iter()
        .filter_map(|name| std::env::var(name).ok())
        .find(|value| is_usable_key(value))
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
