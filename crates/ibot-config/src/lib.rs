//! Configuration loading for ibot infrastructure synthesis.
//!
//! This crate handles:
//! - Per-environment bootstrap parameter files (`params-{env}.json`)
//! - Environment name validation
//! - Project settings (`ibot.kdl`)

pub mod environment;
pub mod error;
pub mod params;
pub mod project;

pub use environment::validate_env;
pub use error::{ConfigError, ConfigResult};
pub use params::ParameterStore;
pub use project::ProjectConfig;
