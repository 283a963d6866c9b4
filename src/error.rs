use std::path::PathBuf;

use thiserror::Error;

/// Problems found while building a [`FlagSet`](crate::FlagSet).
///
/// These are load-time failures. Evaluation itself never returns an error.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid flag name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    #[error("flag '{0}' is defined more than once")]
    DuplicateFlag(String),

    #[error("rollout percentage {percentage} for flag '{name}' must be between 0 and 100")]
    RolloutOutOfRange { name: String, percentage: u8 },

    #[error("failed to read flag definitions from {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed flag definitions: {0}")]
    Json(#[from] serde_json::Error),
}
