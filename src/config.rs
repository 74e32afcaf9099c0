use std::path::Path;

use tracing::warn;

use crate::ai::{validate_hyperparameters, DqnConfig};
use crate::error::ConfigError;
use crate::game::{DEFAULT_HEIGHT, DEFAULT_WIDTH};
use crate::training::TrainerConfig;

/// Board dimensions and piece sequence seed.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub width: usize,
    pub height: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            seed: None,
        }
    }
}

/// Top-level application configuration, loadable from TOML.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub game: GameConfig,
    pub dqn: DqnConfig,
    pub training: TrainerConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: AppConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the file
    /// does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            warn!(path = %path.display(), "config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.game.width < 4 || self.game.height < 4 {
            return Err(ConfigError::Validation(
                "game.width and game.height must be >= 4".into(),
            ));
        }

        validate_hyperparameters(
            self.dqn.learning_rate,
            self.dqn.batch_size,
            self.dqn.max_epochs,
        )
        .map_err(|e| match e {
            ConfigError::Validation(msg) => ConfigError::Validation(format!("dqn.{msg}")),
            other => other,
        })?;
        if !(0.0..=1.0).contains(&self.dqn.gamma) {
            return Err(ConfigError::Validation(
                "dqn.gamma must be in [0, 1]".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.dqn.epsilon_start) {
            return Err(ConfigError::Validation(
                "dqn.epsilon_start must be in [0, 1]".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.dqn.epsilon_min) {
            return Err(ConfigError::Validation(
                "dqn.epsilon_min must be in [0, 1]".into(),
            ));
        }
        if self.dqn.epsilon_min > self.dqn.epsilon_start {
            return Err(ConfigError::Validation(
                "dqn.epsilon_min must be <= dqn.epsilon_start".into(),
            ));
        }
        if !(self.dqn.epsilon_decay > 0.0 && self.dqn.epsilon_decay <= 1.0) {
            return Err(ConfigError::Validation(
                "dqn.epsilon_decay must be in (0, 1]".into(),
            ));
        }
        if self.dqn.replay_capacity < self.dqn.batch_size {
            return Err(ConfigError::Validation(
                "dqn.replay_capacity must be >= dqn.batch_size".into(),
            ));
        }
        if self.dqn.target_sync_episodes == 0 {
            return Err(ConfigError::Validation(
                "dqn.target_sync_episodes must be > 0".into(),
            ));
        }

        if self.training.log_interval == 0 {
            return Err(ConfigError::Validation(
                "training.log_interval must be > 0".into(),
            ));
        }
        if self.training.metrics_window == 0 {
            return Err(ConfigError::Validation(
                "training.metrics_window must be > 0".into(),
            ));
        }
        if self.training.channel_capacity == 0 {
            return Err(ConfigError::Validation(
                "training.channel_capacity must be > 0".into(),
            ));
        }

        Ok(())
    }

    /// Generate a TOML string with all default values (useful for creating
    /// example config files).
    pub fn default_toml() -> Result<String, ConfigError> {
        toml::to_string_pretty(&AppConfig::default())
            .map_err(|e| ConfigError::Validation(format!("default config does not serialize: {e}")))
    }
}
