use std::fmt;
use std::path::{Path, PathBuf};

use bevy::log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::physics::math::Scalar;

const CONFIG_FILE_NAME: &str = "config.toml";
const ENVIRONMENT_PREFIX: &str = "BHTREE";

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Serialize(toml::ser::Error),
    Source(::config::ConfigError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "Failed to access configuration file: {e}"),
            ConfigError::Parse(e) => write!(f, "Failed to parse configuration: {e}"),
            ConfigError::Serialize(e) => write!(f, "Failed to serialize configuration: {e}"),
            ConfigError::Source(e) => write!(f, "Failed to merge configuration sources: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        ConfigError::Parse(e)
    }
}

impl From<toml::ser::Error> for ConfigError {
    fn from(e: toml::ser::Error) -> Self {
        ConfigError::Serialize(e)
    }
}

impl From<::config::ConfigError> for ConfigError {
    fn from(e: ::config::ConfigError) -> Self {
        ConfigError::Source(e)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct BhTreeConfig {
    pub tree: TreeConfig,
    pub build: BuildConfig,
    pub generation: GenerationConfig,
}

/// Initial bounding cube of a fresh tree.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct TreeConfig {
    pub origin: [Scalar; 3],
    pub edge: Scalar,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            origin: [-2.0, -2.0, -2.0],
            edge: 4.0,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BuildStrategy {
    #[default]
    Sequential,
    /// Box growth on one thread, then one insertion task per top-level octant.
    Parallel,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct BuildConfig {
    pub strategy: BuildStrategy,
    /// Batches smaller than this are built sequentially regardless of strategy.
    pub parallel_threshold: usize,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            strategy: BuildStrategy::Sequential,
            parallel_threshold: 4096,
        }
    }
}

/// Parameters of the synthetic body distribution used by the driver.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct GenerationConfig {
    pub body_count: usize,
    pub seed: Option<u64>,
    pub steps: usize,
    pub time_step: Scalar,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            body_count: 4096,
            seed: None,
            steps: 10,
            time_step: 0.0125,
        }
    }
}

impl BhTreeConfig {
    /// Load configuration from a file, falling back to defaults if the file doesn't exist
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    warn!(
                        "Failed to parse config file {}: {}. Using defaults.",
                        path.display(),
                        e
                    );
                    Self::default()
                }
            },
            Err(_) => {
                info!("Config file {} not found. Using defaults.", path.display());
                Self::default()
            }
        }
    }

    /// Location of the per-user configuration file, if the platform has one.
    pub fn user_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "bhtree")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    /// Load the per-user configuration merged with `BHTREE_` environment
    /// overrides (e.g. `BHTREE_BUILD__STRATEGY=parallel`).
    pub fn load_from_user_config() -> Self {
        let Some(path) = Self::user_config_path() else {
            info!("No user configuration directory available. Using defaults.");
            return Self::default();
        };

        Self::load_layered(&path).unwrap_or_else(|e| {
            warn!("{e}. Using defaults.");
            Self::default()
        })
    }

    /// Merge an optional TOML file with environment overrides.
    pub fn load_layered(path: &Path) -> Result<Self, ConfigError> {
        let settings = ::config::Config::builder()
            .add_source(::config::File::from(path).required(false))
            .add_source(
                ::config::Environment::with_prefix(ENVIRONMENT_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    /// Save configuration to a file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
