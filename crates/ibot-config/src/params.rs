//! Per-environment bootstrap parameters.
//!
//! Each environment has a `params-{env}.json` file holding the stack
//! parameters its bootstrap was deployed with:
//!
//! ```json
//! [
//!   { "ParameterKey": "Qualifier", "ParameterValue": "q1" },
//!   { "ParameterKey": "FileAssetsBucketName", "ParameterValue": "bucket1" },
//!   { "ParameterKey": "ContainerAssetsRepositoryName", "ParameterValue": "repo1" }
//! ]
//! ```

use ibot_core::Params;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::{ConfigError, ConfigResult};

pub const QUALIFIER: &str = "Qualifier";
pub const FILE_ASSETS_BUCKET_NAME: &str = "FileAssetsBucketName";
pub const CONTAINER_ASSETS_REPOSITORY_NAME: &str = "ContainerAssetsRepositoryName";

/// One entry of a parameter file.
#[derive(Debug, Clone, Deserialize)]
pub struct ParameterEntry {
    #[serde(rename = "ParameterKey")]
    pub key: String,
    #[serde(rename = "ParameterValue")]
    pub value: String,
}

/// Reads bootstrap parameter files from a directory.
///
/// Nothing is cached: every [`load`](Self::load) reads the file again.
#[derive(Debug, Clone)]
pub struct ParameterStore {
    root: PathBuf,
}

impl ParameterStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `{root}/params-{env}.json`
    pub fn path_for(&self, env: &str) -> PathBuf {
        self.root.join(format!("params-{env}.json"))
    }

    /// Load the parameters for `env`.
    pub fn load(&self, env: &str) -> ConfigResult<Params> {
        let path = self.path_for(env);
        debug!(path = %path.display(), "reading bootstrap parameters");
        let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        parse_params(&content, &path)
    }
}

/// Parse the content of a parameter file. `path` is only used in errors.
pub fn parse_params(content: &str, path: &Path) -> ConfigResult<Params> {
    let entries: Vec<ParameterEntry> =
        serde_json::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    let mut values: HashMap<String, String> = HashMap::with_capacity(entries.len());
    for entry in entries {
        if values.contains_key(&entry.key) {
            return Err(ConfigError::Duplicate(format!(
                "parameter '{}' in {}",
                entry.key,
                path.display()
            )));
        }
        values.insert(entry.key, entry.value);
    }

    let mut take = |key: &str| {
        values
            .remove(key)
            .ok_or_else(|| ConfigError::MissingField(format!("{} in {}", key, path.display())))
    };

    Ok(Params {
        qualifier: take(QUALIFIER)?,
        file_assets_bucket_name: take(FILE_ASSETS_BUCKET_NAME)?,
        container_assets_repository_name: take(CONTAINER_ASSETS_REPOSITORY_NAME)?,
    })
}
