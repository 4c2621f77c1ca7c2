use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

/// Environment prefix for overrides, e.g. `LOREWRIGHT_GENERATION__PROVIDER_TIMEOUT_SECS=90`.
pub const ENV_PREFIX: &str = "LOREWRIGHT_";

/// Fallback variable for the provider key.
pub const API_KEY_ENV: &str = "GOOGLE_API_KEY";

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub provider: ProviderConfig,
    pub generation: GenerationSettings,
    pub logging: LoggingConfig,
    pub data: DataConfig,
}

/// Model provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// API key; falls back to `GOOGLE_API_KEY` when unset.
    pub api_key: Option<String>,
    /// Model used for text flows.
    pub model: String,
    /// Model used for image flows.
    pub image_model: String,
    pub base_url: String,
}

/// Generation pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    /// Upper bound on a single model call, in seconds.
    pub provider_timeout_secs: u64,
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<u32>,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is not set.
    pub level: String,
    /// Mirror log output to stdout in addition to the log file.
    pub stdout: bool,
}

/// Data directory configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Override the default data directory.
    pub data_dir: Option<PathBuf>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gemini-2.0-flash".to_string(),
            image_model: "gemini-2.0-flash-preview-image-generation".to_string(),
            base_url: "https://generativelanguage.googleapis.com".to_string(),
        }
    }
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            provider_timeout_secs: 60,
            temperature: None,
            max_output_tokens: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            stdout: false,
        }
    }
}

impl GenerationSettings {
    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_secs)
    }
}

impl AppConfig {
    /// Load configuration from `~/.config/lorewright/config.toml` and the
    /// environment. Returns `Default` if the sources cannot be merged.
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// Load from an explicit config file path (missing files are skipped).
    pub fn load_from(path: &Path) -> Self {
        if path.exists() {
            log::info!("Loading config from {}", path.display());
        } else {
            log::debug!("No config file at {}, using defaults", path.display());
        }

        let mut config = match Self::figment(path).extract::<AppConfig>() {
            Ok(config) => config,
            Err(e) => {
                log::warn!(
                    "Failed to load config from {}: {e}, using defaults",
                    path.display()
                );
                Self::default()
            }
        };

        if config.provider.api_key.is_none() {
            config.provider.api_key = std::env::var(API_KEY_ENV).ok().filter(|k| !k.trim().is_empty());
        }
        config
    }

    /// Layered sources: defaults, then the TOML file, then `LOREWRIGHT_*` variables.
    pub fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Resolved data directory (override or XDG default).
    pub fn data_dir(&self) -> PathBuf {
        self.data.data_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .map(|d| d.join("lorewright"))
                .unwrap_or_else(|| PathBuf::from("data"))
        })
    }

    /// Append-only library file inside the data directory.
    pub fn library_path(&self) -> PathBuf {
        self.data_dir().join("library.jsonl")
    }

    pub fn log_dir(&self) -> PathBuf {
        self.data_dir().join("logs")
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("lorewright").join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }
}
