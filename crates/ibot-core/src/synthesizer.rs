//! Per-stack asset-publishing configuration.

use crate::Params;

/// Prefix shared by asset object keys and image tags.
pub const ASSET_PREFIX: &str = "cdk";

/// Bootstrapped roles a deploy engine assumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BootstrapRole {
    Deploy,
    FilePublishing,
    Lookup,
}

impl BootstrapRole {
    pub const ALL: [BootstrapRole; 3] = [
        BootstrapRole::Deploy,
        BootstrapRole::FilePublishing,
        BootstrapRole::Lookup,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BootstrapRole::Deploy => "deploy",
            BootstrapRole::FilePublishing => "file-publishing",
            BootstrapRole::Lookup => "lookup",
        }
    }
}

impl std::fmt::Display for BootstrapRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a stack's assets are packaged and published.
///
/// This is a plain value: every stack owns its own copy, and two
/// synthesizers built from equal parameters compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Synthesizer {
    pub qualifier: String,
    pub file_assets_bucket_name: String,
    pub container_assets_repository_name: String,
    /// Object key prefix for file assets (`cdk/`).
    pub bucket_prefix: String,
    /// Tag prefix for container assets (`cdk-`).
    pub docker_tag_prefix: String,
}

impl Synthesizer {
    pub fn from_params(params: &Params) -> Self {
        Self {
            qualifier: params.qualifier.clone(),
            file_assets_bucket_name: params.file_assets_bucket_name.clone(),
            container_assets_repository_name: params.container_assets_repository_name.clone(),
            bucket_prefix: format!("{ASSET_PREFIX}/"),
            docker_tag_prefix: format!("{ASSET_PREFIX}-"),
        }
    }

    /// `cdk-{qualifier}-{kind}-role-{account}-{region}`
    pub fn bootstrap_role_name(&self, role: BootstrapRole, account_id: &str, region: &str) -> String {
        format!(
            "{ASSET_PREFIX}-{}-{}-role-{}-{}",
            self.qualifier,
            role.as_str(),
            account_id,
            region
        )
    }

    pub fn bootstrap_role_arn(&self, role: BootstrapRole, account_id: &str, region: &str) -> String {
        format!(
            "arn:aws:iam::{}:role/{}",
            account_id,
            self.bootstrap_role_name(role, account_id, region)
        )
    }

    /// Object key a file asset is published under.
    pub fn asset_object_key(&self, asset_id: &str, extension: &str) -> String {
        format!("{}{}.{}", self.bucket_prefix, asset_id, extension)
    }
}
