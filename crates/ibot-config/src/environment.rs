//! Environment name validation.

use regex::Regex;
use std::sync::LazyLock;

use crate::{ConfigError, ConfigResult};

// No dashes: `ibot-{env}-{name}` must stay unambiguous across environments.
static ENV_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-z][a-z0-9]*$").unwrap());

/// Check that `env` can be used as a name segment.
pub fn validate_env(env: &str) -> ConfigResult<()> {
    if ENV_REGEX.is_match(env) {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            field: "env".to_string(),
            message: format!(
                "'{}' must start with a lowercase letter and contain only lowercase letters and digits",
                env
            ),
        })
    }
}
