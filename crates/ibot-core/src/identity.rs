//! Account identity resolution.

use async_trait::async_trait;

use crate::Result;

/// Resolves the account a synthesis run targets.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// Account id of the caller's credentials in `region`.
    async fn account_id(&self, region: &str) -> Result<String>;
}

/// Resolver returning a fixed account id.
#[derive(Debug, Clone)]
pub struct StaticIdentity(String);

impl StaticIdentity {
    pub fn new(account_id: impl Into<String>) -> Self {
        Self(account_id.into())
    }
}

#[async_trait]
impl IdentityResolver for StaticIdentity {
    async fn account_id(&self, _region: &str) -> Result<String> {
        Ok(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_identity() {
        let resolver = StaticIdentity::new("123456789012");
        assert_eq!(resolver.account_id("us-east-1").await.unwrap(), "123456789012");
    }
}
