//! Application configuration
//!
//! Loaded from TOML. Every section is optional; missing values fall back to
//! the defaults below.

use crate::speech::VoiceConfig;
use crate::storage::StorageKeys;
use crate::{MockerviewError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Environment variable pointing at an explicit config file
pub const CONFIG_ENV: &str = "MOCKERVIEW_CONFIG";
pub const DATA_DIR_ENV: &str = "MOCKERVIEW_DATA_DIR";
pub const QUESTIONS_KEY_ENV: &str = "MOCKERVIEW_QUESTIONS_KEY";
pub const RECORDINGS_KEY_ENV: &str = "MOCKERVIEW_RECORDINGS_KEY";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding one JSON document per collection
    pub data_dir: PathBuf,
    pub questions_key: String,
    pub recordings_key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        let keys = StorageKeys::default();
        Self {
            data_dir: dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("mockerview"),
            questions_key: keys.questions,
            recordings_key: keys.recordings,
        }
    }
}

impl StorageConfig {
    pub fn keys(&self) -> StorageKeys {
        StorageKeys {
            questions: self.questions_key.clone(),
            recordings: self.recordings_key.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Locale questions are announced in
    pub locale: String,
    /// Installed voices; the one matching `locale` is used
    pub voices: Vec<VoiceConfig>,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            locale: "en-US".to_string(),
            voices: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Whether to use the microphone at all
    pub enable_capture: bool,
    /// Whether to use the speakers at all
    pub enable_playback: bool,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            enable_capture: true,
            enable_playback: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// How long a notice stays on screen
    pub notice_secs: f32,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self { notice_secs: 6.0 }
    }
}

impl UiConfig {
    pub fn notice_duration(&self) -> Duration {
        Duration::from_secs_f32(self.notice_secs.max(0.5))
    }
}

/// Configuration for the whole application
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub speech: SpeechConfig,
    pub audio: AudioConfig,
    pub ui: UiConfig,
}

impl AppConfig {
    /// Default location of the config file
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("mockerview").join("config.toml"))
    }

    /// Parse a TOML document
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(content)
            .map_err(|e| MockerviewError::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            MockerviewError::ConfigError(format!("{}: {}", path.display(), e))
        })?;
        info!("Loaded configuration from {}", path.display());
        Self::from_toml(&content)
    }

    /// Resolve configuration the way the binary does: `$MOCKERVIEW_CONFIG`,
    /// then the per-user config file, then defaults; environment overrides
    /// are applied last.
    pub fn discover() -> Result<Self> {
        let config = match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::load(PathBuf::from(path))?,
            None => match Self::default_path().filter(|p| p.exists()) {
                Some(path) => Self::load(path)?,
                None => {
                    debug!("No config file found, using defaults");
                    Self::default()
                }
            },
        };

        let config = config.with_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup (the process environment in
    /// production)
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(dir) = lookup(DATA_DIR_ENV).filter(|v| !v.is_empty()) {
            self.storage.data_dir = PathBuf::from(dir);
        }
        if let Some(key) = lookup(QUESTIONS_KEY_ENV).filter(|v| !v.is_empty()) {
            self.storage.questions_key = key;
        }
        if let Some(key) = lookup(RECORDINGS_KEY_ENV).filter(|v| !v.is_empty()) {
            self.storage.recordings_key = key;
        }
        self
    }

    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.storage.data_dir = dir.into();
        self
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.speech.locale = locale.into();
        self
    }

    pub fn with_voice(mut self, voice: VoiceConfig) -> Self {
        self.speech.voices.push(voice);
        self
    }

    /// Disable the microphone
    pub fn without_capture(mut self) -> Self {
        self.audio.enable_capture = false;
        self
    }

    /// Disable the speakers (and with them announcements)
    pub fn without_playback(mut self) -> Self {
        self.audio.enable_playback = false;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.storage.questions_key.trim().is_empty() || self.storage.recordings_key.trim().is_empty() {
            return Err(MockerviewError::ConfigError(
                "storage keys must not be empty".into(),
            ));
        }
        if self.storage.questions_key == self.storage.recordings_key {
            return Err(MockerviewError::ConfigError(format!(
                "questions and recordings share the key {:?}",
                self.storage.questions_key
            )));
        }
        if self.speech.locale.trim().is_empty() {
            return Err(MockerviewError::ConfigError("speech locale is empty".into()));
        }
        for voice in &self.speech.voices {
            if voice.model_path.is_empty() || voice.tokens_path.is_empty() {
                return Err(MockerviewError::ConfigError(format!(
                    "voice {} needs model_path and tokens_path",
                    voice.locale
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert!(config.audio.enable_capture);
        assert!(config.audio.enable_playback);
        assert_eq!(config.storage.questions_key, "questions");
        assert_eq!(config.storage.recordings_key, "recordings");
        assert_eq!(config.ui.notice_duration(), Duration::from_secs(6));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = AppConfig::default()
            .without_capture()
            .without_playback()
            .with_locale("ko-KR")
            .with_data_dir("/tmp/mockerview-test");

        assert!(!config.audio.enable_capture);
        assert!(!config.audio.enable_playback);
        assert_eq!(config.speech.locale, "ko-KR");
        assert_eq!(config.storage.data_dir, PathBuf::from("/tmp/mockerview-test"));
    }

    #[test]
    fn test_partial_toml() {
        let config = AppConfig::from_toml(
            r#"
            [speech]
            locale = "ko-KR"

            [[speech.voices]]
            locale = "ko-KR"
            model_path = "/voices/ko.onnx"
            tokens_path = "/voices/tokens.txt"
            "#,
        )
        .unwrap();

        assert_eq!(config.speech.locale, "ko-KR");
        assert_eq!(config.speech.voices.len(), 1);
        assert_eq!(config.speech.voices[0].length_scale, 1.0);
        assert_eq!(config.storage.questions_key, "questions");
    }

    #[test]
    fn test_rejects_shared_keys() {
        let result = AppConfig::from_toml(
            r#"
            [storage]
            questions_key = "data"
            recordings_key = "data"
            "#,
        );
        assert!(matches!(result, Err(MockerviewError::ConfigError(_))));
    }

    #[test]
    fn test_rejects_malformed_toml() {
        assert!(AppConfig::from_toml("[storage").is_err());
    }

    #[test]
    fn test_env_overrides() {
        let config = AppConfig::default().with_env_overrides(|key| match key {
            DATA_DIR_ENV => Some("/srv/mockerview".to_string()),
            QUESTIONS_KEY_ENV => Some("qs".to_string()),
            RECORDINGS_KEY_ENV => Some(String::new()),
            _ => None,
        });

        assert_eq!(config.storage.data_dir, PathBuf::from("/srv/mockerview"));
        assert_eq!(config.storage.questions_key, "qs");
        assert_eq!(config.storage.recordings_key, "recordings");
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            AppConfig::load("/nonexistent/mockerview.toml"),
            Err(MockerviewError::ConfigError(_))
        ));
    }
}
