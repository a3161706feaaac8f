//! Account lookup through STS.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_sts::config::Region;
use aws_sdk_sts::error::DisplayErrorContext;
use ibot_core::identity::IdentityResolver;
use ibot_core::{Error, Result};
use tracing::debug;

/// Resolves the account of the ambient AWS credentials.
#[derive(Debug, Clone, Default)]
pub struct StsIdentityResolver {
    profile: Option<String>,
}

impl StsIdentityResolver {
    pub fn new(profile: Option<String>) -> Self {
        Self { profile }
    }
}

#[async_trait]
impl IdentityResolver for StsIdentityResolver {
    async fn account_id(&self, region: &str) -> Result<String> {
        let mut loader =
            aws_config::defaults(BehaviorVersion::latest()).region(Region::new(region.to_string()));
        if let Some(profile) = &self.profile {
            loader = loader.profile_name(profile);
        }
        let config = loader.load().await;

        debug!(region, profile = ?self.profile, "calling GetCallerIdentity");
        let output = aws_sdk_sts::Client::new(&config)
            .get_caller_identity()
            .send()
            .await
            .map_err(|e| Error::IdentityLookup(DisplayErrorContext(&e).to_string()))?;

        output
            .account()
            .map(str::to_string)
            .ok_or_else(|| Error::IdentityLookup("caller identity has no account".to_string()))
    }
}
