use draw_servicing_core::risk::draw_score::RiskPolicy;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

const ENV_CONFIG_PATH: &str = "DRAWCTL_CONFIG_PATH";
const DEFAULT_CONFIG_PATH: &str = "drawctl.yaml";
const DEFAULT_LOG_LEVEL: &str = "warn";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssistantConfig {
    /// Default `limit` offered to the model for `get_recent_draws`.
    #[serde(default)]
    pub recent_draws_limit: Option<u32>,
}

/// YAML configuration file structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub log_level: Option<String>,
    #[serde(default)]
    pub risk_policy: RiskPolicy,
    #[serde(default)]
    pub assistant: AssistantConfig,
}

/// How the configuration was obtained. Logged once tracing is up.
#[derive(Debug, Clone)]
pub enum ConfigSource {
    Defaults,
    Missing(PathBuf),
    Empty(PathBuf),
    Loaded(PathBuf),
    Invalid(PathBuf, String),
}

impl ConfigSource {
    pub fn log(&self) {
        match self {
            ConfigSource::Defaults => tracing::debug!("No config path resolved, using defaults"),
            ConfigSource::Missing(path) => {
                tracing::debug!(path = %path.display(), "Config file not found, using defaults")
            }
            ConfigSource::Empty(path) => {
                tracing::debug!(path = %path.display(), "Config file is empty, using defaults")
            }
            ConfigSource::Loaded(path) => {
                tracing::info!(path = %path.display(), "Loaded configuration from file")
            }
            ConfigSource::Invalid(path, error) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %error,
                    "Failed to load config file, using defaults"
                )
            }
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub risk_policy: RiskPolicy,
    pub assistant: AssistantConfig,
    pub source: ConfigSource,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            risk_policy: RiskPolicy::default(),
            assistant: AssistantConfig::default(),
            source: ConfigSource::Defaults,
        }
    }
}

impl Config {
    /// Load configuration from the file named by `DRAWCTL_CONFIG_PATH`,
    /// falling back to `drawctl.yaml` in the working directory.
    pub fn from_env() -> Self {
        let config_path =
            std::env::var(ENV_CONFIG_PATH).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::from_path(Path::new(&config_path))
    }

    pub fn from_path(path: &Path) -> Self {
        let (file, source) = Self::load_config_file(path);
        Self {
            log_level: file
                .log_level
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
            risk_policy: file.risk_policy,
            assistant: file.assistant,
            source,
        }
    }

    fn load_config_file(path: &Path) -> (ConfigFile, ConfigSource) {
        let owned = path.to_path_buf();

        if !path.exists() {
            return (ConfigFile::default(), ConfigSource::Missing(owned));
        }

        match fs::read_to_string(path) {
            Ok(contents) => {
                let contents = contents.trim();
                if contents.is_empty() {
                    return (ConfigFile::default(), ConfigSource::Empty(owned));
                }

                match serde_yaml::from_str(contents) {
                    Ok(config) => (config, ConfigSource::Loaded(owned)),
                    Err(e) => (
                        ConfigFile::default(),
                        ConfigSource::Invalid(owned, e.to_string()),
                    ),
                }
            }
            Err(e) => (
                ConfigFile::default(),
                ConfigSource::Invalid(owned, e.to_string()),
            ),
        }
    }
}
