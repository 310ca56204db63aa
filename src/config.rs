//! Configuration for vcs-valet.
//!
//! All configuration is resolved once, at process start, into plain value
//! objects (`LlmConfig`, `OrganizeOptions`) that are passed explicitly to the
//! components that need them. Environment variables are consulted only here,
//! with `$HOME/.vcs-valet/settings.json` as a fallback for unset variables.

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Settings loaded from $HOME/.vcs-valet/settings.json.
#[derive(Debug, Default, Deserialize)]
pub struct Settings {
    /// Environment variable overrides.
    #[serde(default)]
    pub env: HashMap<String, String>,
}

impl Settings {
    /// Loads settings from the default location.
    ///
    /// A missing file yields empty settings; a malformed file is an error.
    pub fn load() -> Result<Self> {
        let settings_path = Self::settings_path()?;
        Self::load_from_path(&settings_path)
    }

    /// Loads settings from a specific path.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {}", path.display()))?;

        serde_json::from_str::<Settings>(&content)
            .with_context(|| format!("Failed to parse settings file: {}", path.display()))
    }

    /// Returns the default settings path.
    pub fn settings_path() -> Result<PathBuf> {
        let home_dir = dirs::home_dir().context("Failed to determine home directory")?;

        Ok(home_dir.join(".vcs-valet").join("settings.json"))
    }

    /// Returns an environment variable with fallback to settings.
    pub fn get_env_var(&self, key: &str) -> Option<String> {
        match env::var(key) {
            Ok(value) => Some(value),
            Err(_) => self.env.get(key).cloned(),
        }
    }

    /// Returns the first of `keys` that resolves, via env or settings.
    pub fn get_env_vars(&self, keys: &[&str]) -> Option<String> {
        keys.iter().find_map(|key| self.get_env_var(key))
    }
}

/// Language used for LLM prompt templates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PromptLanguage {
    /// English prompts (default).
    #[default]
    English,
    /// Japanese prompts.
    Japanese,
}

impl PromptLanguage {
    /// Parses a language name; anything other than Japanese maps to English.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "japanese" | "ja" => Self::Japanese,
            _ => Self::English,
        }
    }
}

/// Configuration for the LLM completion service.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Model identifier sent to the provider.
    pub model: String,
    /// Maximum tokens requested per completion.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f64,
    /// Prompt template language.
    pub language: PromptLanguage,
    /// Base URL of the OpenAI-compatible API.
    pub api_base: String,
    /// API key, if one was resolved. Clients fail at construction without it.
    pub api_key: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            max_tokens: 100,
            temperature: 0.1,
            language: PromptLanguage::English,
            api_base: "https://api.openai.com/v1".to_string(),
            api_key: None,
        }
    }
}

impl LlmConfig {
    /// Builds the LLM configuration from the environment, with `settings`
    /// providing fallback values for unset variables.
    ///
    /// Unparseable numeric values fall back to the defaults with a warning
    /// rather than failing the whole command.
    pub fn from_env(settings: &Settings) -> Self {
        let defaults = Self::default();

        let model = settings
            .get_env_var("VCS_VALET_MODEL")
            .unwrap_or(defaults.model);

        let max_tokens = settings
            .get_env_var("VCS_VALET_MAX_TOKENS")
            .and_then(|v| match v.parse() {
                Ok(n) => Some(n),
                Err(_) => {
                    tracing::warn!("ignoring unparseable VCS_VALET_MAX_TOKENS: {v}");
                    None
                }
            })
            .unwrap_or(defaults.max_tokens);

        let temperature = settings
            .get_env_var("VCS_VALET_TEMPERATURE")
            .and_then(|v| match v.parse() {
                Ok(t) => Some(t),
                Err(_) => {
                    tracing::warn!("ignoring unparseable VCS_VALET_TEMPERATURE: {v}");
                    None
                }
            })
            .unwrap_or(defaults.temperature);

        let language = settings
            .get_env_var("VCS_VALET_LANGUAGE")
            .map(|v| PromptLanguage::from_name(&v))
            .unwrap_or_default();

        let api_base = settings
            .get_env_var("VCS_VALET_API_BASE")
            .unwrap_or(defaults.api_base);

        let api_key = settings.get_env_vars(&["VCS_VALET_API_KEY", "OPENAI_API_KEY"]);

        Self {
            model,
            max_tokens,
            temperature,
            language,
            api_base,
            api_key,
        }
    }
}

/// Options controlling commit-history analysis and squash execution.
#[derive(Debug, Clone)]
pub struct OrganizeOptions {
    /// Total changed lines at or below which a single-file commit is tiny.
    pub tiny_threshold: usize,
    /// Total changed lines at or below which a ≤3-file commit is small.
    pub small_threshold: usize,
    /// Minimum confidence score a proposal needs to be shown/applied.
    pub confidence_threshold: f64,
    /// Commit-message patterns (regex, substring fallback) excluded from
    /// analysis.
    pub exclude_patterns: Vec<String>,
    /// Aggressive mode lowers the effective confidence threshold to 0.5.
    pub aggressive: bool,
    /// Maximum number of commits to analyze.
    pub limit: usize,
}

impl Default for OrganizeOptions {
    fn default() -> Self {
        Self {
            tiny_threshold: 5,
            small_threshold: 20,
            confidence_threshold: 0.7,
            exclude_patterns: Vec::new(),
            aggressive: false,
            limit: 10,
        }
    }
}

impl OrganizeOptions {
    /// The confidence threshold actually applied to proposals.
    ///
    /// Aggressive mode caps it at 0.5 so lower-confidence proposals surface.
    pub fn effective_confidence_threshold(&self) -> f64 {
        if self.aggressive {
            self.confidence_threshold.min(0.5)
        } else {
            self.confidence_threshold
        }
    }
}
