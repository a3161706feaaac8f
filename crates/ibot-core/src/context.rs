//! Synthesis context and deployment parameters.

/// Bootstrap parameters for one environment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Params {
    /// Bootstrap qualifier (e.g., "hnb659fds").
    pub qualifier: String,
    /// Bucket receiving file assets.
    pub file_assets_bucket_name: String,
    /// Repository receiving container assets.
    pub container_assets_repository_name: String,
}

impl Params {
    pub fn new(
        qualifier: impl Into<String>,
        file_assets_bucket_name: impl Into<String>,
        container_assets_repository_name: impl Into<String>,
    ) -> Self {
        Self {
            qualifier: qualifier.into(),
            file_assets_bucket_name: file_assets_bucket_name.into(),
            container_assets_repository_name: container_assets_repository_name.into(),
        }
    }
}

/// Everything a synthesis run needs to know about its target.
///
/// Built once per run, after the parameter file has been read and the
/// account identity resolved. Fields are private so the value cannot be
/// changed once stacks start reading it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Context {
    env: String,
    region: String,
    account_id: String,
    params: Params,
}

impl Context {
    pub fn new(
        env: impl Into<String>,
        region: impl Into<String>,
        account_id: impl Into<String>,
        params: Params,
    ) -> Self {
        Self {
            env: env.into(),
            region: region.into(),
            account_id: account_id.into(),
            params,
        }
    }

    pub fn env(&self) -> &str {
        &self.env
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Deployment environment in `aws://{account}/{region}` form.
    pub fn environment_uri(&self) -> String {
        format!("aws://{}/{}", self.account_id, self.region)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_uri() {
        let ctx = Context::new("dev", "us-east-1", "123456789012", Params::new("q1", "b", "r"));
        assert_eq!(ctx.environment_uri(), "aws://123456789012/us-east-1");
        assert_eq!(ctx.params().qualifier, "q1");
    }
}
