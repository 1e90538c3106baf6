//! Configuration for the chat application
//!
//! Settings are read from a TOML file. Every section falls back to its
//! defaults, so an empty or partial file is valid.

use crate::speech::SpeechPolicy;
use crate::ui::ThemeMode;
use crate::{ChatterError, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Environment variable that points at an explicit config file
pub const CONFIG_ENV: &str = "CHATTER_CONFIG";

/// Repository the utility bar links to
pub const DEFAULT_REPOSITORY_URL: &str = "https://github.com/e-roy/gemini-pro-vision-playground";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChatSection {
    /// Name shown next to assistant messages
    pub assistant_name: String,
    /// Delay before the echo responder answers
    pub reply_delay_ms: u64,
}

impl Default for ChatSection {
    fn default() -> Self {
        Self {
            assistant_name: "Assistant".into(),
            reply_delay_ms: 600,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SpeechSection {
    /// Whether replies are spoken on arrival or on demand
    pub policy: SpeechPolicy,
    /// BCP 47 language tag sent with every utterance
    pub lang: String,
    /// Disable to run without any synthesizer
    pub enabled: bool,
    /// Synthesizer binary driven by the command backend
    pub program: String,
}

impl Default for SpeechSection {
    fn default() -> Self {
        Self {
            policy: SpeechPolicy::Automatic,
            lang: "en-US".into(),
            enabled: true,
            program: "espeak-ng".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UiSection {
    pub theme: ThemeMode,
    pub repository_url: String,
}

impl Default for UiSection {
    fn default() -> Self {
        Self {
            theme: ThemeMode::Dark,
            repository_url: DEFAULT_REPOSITORY_URL.into(),
        }
    }
}

/// Complete application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ChatterConfig {
    pub chat: ChatSection,
    pub speech: SpeechSection,
    pub ui: UiSection,
}

impl ChatterConfig {
    /// Parse and validate a configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: ChatterConfig = toml::from_str(content)
            .map_err(|e| ChatterError::ConfigError(format!("invalid TOML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            ChatterError::ConfigError(format!("cannot read {}: {e}", path.display()))
        })?;
        let config = Self::from_toml(&content)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Find the configuration file: `$CHATTER_CONFIG` first, then the user
    /// config directory. Missing files yield the defaults.
    pub fn discover() -> Result<Self> {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Self::load(PathBuf::from(path));
        }

        match Self::default_path() {
            Some(path) if path.exists() => Self::load(path),
            _ => Ok(Self::default()),
        }
    }

    /// `<config_dir>/chatter/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("chatter").join("config.toml"))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.speech.lang.trim().is_empty() {
            return Err(ChatterError::ConfigError(
                "speech.lang must not be empty".to_string(),
            ));
        }

        if self.speech.enabled && self.speech.program.trim().is_empty() {
            return Err(ChatterError::ConfigError(
                "speech.program is required when speech is enabled".to_string(),
            ));
        }

        let url = &self.ui.repository_url;
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            return Err(ChatterError::ConfigError(format!(
                "ui.repository_url must be an http(s) URL, got {url:?}"
            )));
        }

        Ok(())
    }
}
