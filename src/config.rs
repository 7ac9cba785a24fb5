use crate::audio::AudioFormat;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Without a key the simulated analyzer is used
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_analysis_prompt")]
    pub analysis_prompt: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_monitor_input")]
    pub monitor_input: bool,

    #[serde(default)]
    pub monitor_output: bool,

    #[serde(default = "default_input_level")]
    pub input_level: u8,

    #[serde(default = "default_output_level")]
    pub output_level: u8,

    #[serde(default = "default_max_latency_ms")]
    pub max_latency_ms: u32,

    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    #[serde(default = "default_channels")]
    pub channels: u16,

    #[serde(default = "default_recordings_dir")]
    pub recordings_dir: PathBuf,
}

fn default_api_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_analysis_prompt() -> String {
    "Summarize the candidate's main skills, relevant experience and seniority level. \
     Also produce a 0 to 100 score for how well the candidate fits the role."
        .to_string()
}

fn default_temperature() -> f32 {
    0.2
}

fn default_monitor_input() -> bool {
    true
}

fn default_input_level() -> u8 {
    65
}

fn default_output_level() -> u8 {
    55
}

fn default_max_latency_ms() -> u32 {
    120
}

fn default_sample_rate() -> u32 {
    AudioFormat::default().sample_rate
}

fn default_channels() -> u16 {
    AudioFormat::default().channels
}

fn default_recordings_dir() -> PathBuf {
    PathBuf::from("recordings")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            api_key: None,
            model: default_model(),
            analysis_prompt: default_analysis_prompt(),
            temperature: default_temperature(),
            monitor_input: default_monitor_input(),
            monitor_output: false,
            input_level: default_input_level(),
            output_level: default_output_level(),
            max_latency_ms: default_max_latency_ms(),
            sample_rate: default_sample_rate(),
            channels: default_channels(),
            recordings_dir: default_recordings_dir(),
        }
    }
}

impl Config {
    /// Load configuration from the default location (~/.config/recstudio/config.json)
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from `path`, writing the defaults there if it is missing
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            tracing::info!(
                "Config file not found at {:?}, creating default config",
                config_path
            );
            let config = Self::default();
            config.save_to(config_path)?;
            return Ok(config);
        }

        let contents = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        let config: Self = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {:?}", config_path))?;

        tracing::info!("Loaded config from {:?}", config_path);
        Ok(config)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let contents = serde_json::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(config_path, contents)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;

        tracing::info!("Saved config to {:?}", config_path);
        Ok(())
    }

    /// Get the path to the configuration file
    fn config_path() -> Result<PathBuf> {
        let config_dir = if let Ok(dir) = std::env::var("XDG_CONFIG_HOME") {
            PathBuf::from(dir)
        } else {
            let home = std::env::var("HOME").context("HOME environment variable not set")?;
            PathBuf::from(home).join(".config")
        };

        Ok(config_dir.join("recstudio").join("config.json"))
    }

    pub fn audio_format(&self) -> AudioFormat {
        AudioFormat::new(self.sample_rate, self.channels)
    }

    /// The API key, if one is set and non-blank
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.api_url.is_empty() {
            return Err(anyhow::anyhow!("api_url cannot be empty"));
        }

        if self.model.is_empty() {
            return Err(anyhow::anyhow!("model cannot be empty"));
        }

        if !(0.0..=1.0).contains(&self.temperature) {
            return Err(anyhow::anyhow!("temperature must be between 0.0 and 1.0"));
        }

        if self.input_level > 100 || self.output_level > 100 {
            return Err(anyhow::anyhow!(
                "input_level and output_level must be between 0 and 100"
            ));
        }

        if !(10..=500).contains(&self.max_latency_ms) || self.max_latency_ms % 10 != 0 {
            return Err(anyhow::anyhow!(
                "max_latency_ms must be a multiple of 10 between 10 and 500"
            ));
        }

        if self.sample_rate == 0 || self.channels == 0 {
            return Err(anyhow::anyhow!("sample_rate and channels must be non-zero"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        config.validate().unwrap();
        assert_eq!(config.audio_format(), AudioFormat::default());
        assert!(config.api_key().is_none());
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config: Config = serde_json::from_str(r#"{"temperature": 0.7}"#).unwrap();
        assert_eq!(config.temperature, 0.7);
        assert_eq!(config.max_latency_ms, 120);
        assert!(config.monitor_input);
        assert!(!config.monitor_output);
    }

    #[test]
    fn test_blank_api_key_counts_as_missing() {
        let config = Config {
            api_key: Some("   ".to_string()),
            ..Config::default()
        };
        assert!(config.api_key().is_none());
    }

    #[test]
    fn test_validation_ranges() {
        let bad = [
            Config {
                temperature: 1.5,
                ..Config::default()
            },
            Config {
                input_level: 101,
                ..Config::default()
            },
            Config {
                max_latency_ms: 125,
                ..Config::default()
            },
            Config {
                max_latency_ms: 510,
                ..Config::default()
            },
            Config {
                channels: 0,
                ..Config::default()
            },
        ];

        for config in bad {
            assert!(config.validate().is_err(), "{:?} should be rejected", config);
        }
    }

    #[test]
    fn test_load_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recstudio").join("config.json");

        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.model, default_model());

        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded.recordings_dir, PathBuf::from("recordings"));
    }

    #[test]
    fn test_load_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
