//! Error types for ibot.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("naming collision: '{name}' declared by both {first} and {second}")]
    NamingCollision {
        name: String,
        first: String,
        second: String,
    },

    #[error("stack '{stack}' imports '{export}' which no earlier stack exports")]
    UnresolvedReference { stack: String, export: String },

    #[error("stack '{stack}' references unknown logical id '{logical_id}'")]
    UnknownLogicalId { stack: String, logical_id: String },

    #[error("duplicate stack: {0}")]
    DuplicateStack(String),

    #[error("identity lookup failed: {0}")]
    IdentityLookup(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, Error>;
