use std::path::PathBuf;

/// Errors that can occur during a training tick.
#[derive(Debug, thiserror::Error)]
pub enum TrainingError {
    #[error("failed to read tensor data: {0}")]
    TensorData(String),

    #[error("training session lock was poisoned by a panicked tick")]
    SessionPoisoned,

    #[error("training tick panicked: {0}")]
    TickPanicked(String),

    #[error("failed to spawn training thread: {0}")]
    Spawn(#[source] std::io::Error),
}

/// Errors that can occur when loading or changing configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("config validation error: {0}")]
    Validation(String),
}

/// Errors raised while handling an inbound control message.
#[derive(Debug, thiserror::Error)]
pub enum ControlError {
    #[error("malformed control message: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Training(#[from] TrainingError),
}
