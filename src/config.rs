use serde::Deserialize;
use std::{fs, path::Path, time::Duration};

use crate::error::ExtractError;
use crate::readiness::PollConfig;

#[derive(Deserialize)]
pub struct Config {
    pub gemini: GeminiConfig,
    #[serde(default)]
    pub extract: ExtractConfig,
}

#[derive(Deserialize)]
pub struct GeminiConfig {
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

fn default_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

/// What to do with a line-item row that matches the grammar but fails
/// numeric coercion. The historical extractors flip-flopped on this,
/// so it is an explicit policy rather than a constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowPolicy {
    /// Fail the whole extraction.
    #[default]
    Abort,
    /// Log the row and keep going.
    Skip,
}

#[derive(Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    pub row_policy: RowPolicy,
    pub poll_interval_ms: u64,
    pub max_polls: Option<u32>,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            row_policy: RowPolicy::default(),
            poll_interval_ms: 500,
            max_polls: None,
        }
    }
}

impl ExtractConfig {
    pub fn poll_config(&self) -> PollConfig {
        PollConfig {
            interval: Duration::from_millis(self.poll_interval_ms),
            max_polls: self.max_polls,
        }
    }

    /// The text-only commands need the extraction knobs but no
    /// credentials, so a missing config file falls back to defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Config::load(&path) {
            Ok(cfg) => cfg.extract,
            Err(_) => {
                tracing::debug!(path = %path.as_ref().display(), "No config file, using defaults");
                Self::default()
            }
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ExtractError> {
        let content = fs::read_to_string(&path)?;
        toml::from_str(&content)
            .map_err(|e| ExtractError::Config(format!("{}: {e}", path.as_ref().display())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_fills_defaults() {
        let cfg: Config = toml::from_str(
            r#"
            [gemini]
            api_key = "k"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.gemini.model, "gemini-2.0-flash");
        assert_eq!(cfg.extract.row_policy, RowPolicy::Abort);
        assert_eq!(cfg.extract.poll_interval_ms, 500);
        assert_eq!(cfg.extract.max_polls, None);
    }

    #[test]
    fn row_policy_parses_snake_case() {
        let cfg: Config = toml::from_str(
            r#"
            [gemini]
            api_key = "k"

            [extract]
            row_policy = "skip"
            poll_interval_ms = 200
            max_polls = 30
            "#,
        )
        .unwrap();
        assert_eq!(cfg.extract.row_policy, RowPolicy::Skip);
        assert_eq!(cfg.extract.poll_config().interval.as_millis(), 200);
        assert_eq!(cfg.extract.max_polls, Some(30));
    }
}
