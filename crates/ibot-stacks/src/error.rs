//! Synthesis errors.

use ibot_config::ConfigError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SynthError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Core(#[from] ibot_core::Error),
}

pub type Result<T> = std::result::Result<T, SynthError>;
