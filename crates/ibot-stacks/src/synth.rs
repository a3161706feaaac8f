//! Synthesis entry point.

use ibot_config::{ConfigError, ParameterStore, ProjectConfig, validate_env};
use ibot_core::identity::IdentityResolver;
use ibot_core::{Context, StackGraph};
use std::path::PathBuf;
use tracing::info;

use crate::{Result, StackGraphBuilder};

/// Inputs of a synthesis run.
#[derive(Debug, Clone)]
pub struct SynthSettings {
    pub env: String,
    pub region: String,
    /// Directory holding `params-{env}.json`.
    pub bootstrap_dir: PathBuf,
    pub project: ProjectConfig,
}

/// Read parameters and resolve the account, producing the run's context.
///
/// This is the only step that performs I/O.
pub async fn load_context(
    settings: &SynthSettings,
    resolver: &dyn IdentityResolver,
) -> Result<Context> {
    validate_env(&settings.env)?;
    if settings.region.trim().is_empty() {
        return Err(ConfigError::MissingField("region".to_string()).into());
    }

    let params = ParameterStore::new(&settings.bootstrap_dir).load(&settings.env)?;
    let account_id = resolver.account_id(&settings.region).await?;
    info!(
        env = %settings.env,
        region = %settings.region,
        account = %account_id,
        qualifier = %params.qualifier,
        "context resolved"
    );

    Ok(Context::new(
        settings.env.clone(),
        settings.region.clone(),
        account_id,
        params,
    ))
}

/// Load the context and build the full stack graph.
pub async fn synthesize(
    settings: &SynthSettings,
    resolver: &dyn IdentityResolver,
) -> Result<StackGraph> {
    let ctx = load_context(settings, resolver).await?;
    StackGraphBuilder::new(&ctx, &settings.project).build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SynthError;
    use async_trait::async_trait;
    use ibot_core::identity::StaticIdentity;
    use ibot_core::render::Assembly;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const PARAMS: &str = r#"[
        { "ParameterKey": "Qualifier", "ParameterValue": "q1" },
        { "ParameterKey": "FileAssetsBucketName", "ParameterValue": "bucket1" },
        { "ParameterKey": "ContainerAssetsRepositoryName", "ParameterValue": "repo1" }
    ]"#;

    fn settings(dir: &std::path::Path, env: &str) -> SynthSettings {
        SynthSettings {
            env: env.to_string(),
            region: "us-east-1".to_string(),
            bootstrap_dir: dir.to_path_buf(),
            project: ProjectConfig::default(),
        }
    }

    /// Counts lookups and always fails.
    struct FailingIdentity(AtomicUsize);

    #[async_trait]
    impl IdentityResolver for FailingIdentity {
        async fn account_id(&self, _region: &str) -> ibot_core::Result<String> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Err(ibot_core::Error::IdentityLookup("no credentials".to_string()))
        }
    }

    #[tokio::test]
    async fn test_synthesize_dev() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("params-dev.json"), PARAMS).unwrap();

        let resolver = StaticIdentity::new("123456789012");
        let graph = synthesize(&settings(dir.path(), "dev"), &resolver)
            .await
            .unwrap();

        assert_eq!(graph.len(), 5);
        assert_eq!(graph.context().account_id(), "123456789012");
        let api = graph.stack("IbotDevApiStack").unwrap();
        let names: Vec<&str> = api
            .resources()
            .iter()
            .filter_map(|r| r.physical_name())
            .collect();
        assert!(names.contains(&"ibot-dev-api-lambda"));
        assert!(names.contains(&"ibot-dev-api-gateway"));

        let assembly = Assembly::from_graph(&graph);
        let template = assembly.template("IbotDevApiStack").unwrap();
        assert_eq!(
            template["Resources"]["IbotDevApiLambda"]["Properties"]["VpcConfig"]["SubnetIds"][0],
            serde_json::json!({ "Fn::ImportValue": "IbotDevNetworkStack:PublicSubnet1Id" })
        );
    }

    #[tokio::test]
    async fn test_missing_key_fails_before_identity_lookup() {
        let dir = tempfile::tempdir().unwrap();
        let partial = r#"[
            { "ParameterKey": "Qualifier", "ParameterValue": "q1" },
            { "ParameterKey": "FileAssetsBucketName", "ParameterValue": "bucket1" }
        ]"#;
        fs::write(dir.path().join("params-dev.json"), partial).unwrap();

        let resolver = FailingIdentity(AtomicUsize::new(0));
        let err = synthesize(&settings(dir.path(), "dev"), &resolver)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SynthError::Config(ConfigError::MissingField(_))
        ));
        assert_eq!(resolver.0.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_identity_failure_aborts() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("params-dev.json"), PARAMS).unwrap();

        let resolver = FailingIdentity(AtomicUsize::new(0));
        let err = synthesize(&settings(dir.path(), "dev"), &resolver)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SynthError::Core(ibot_core::Error::IdentityLookup(_))
        ));
        assert_eq!(resolver.0.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalid_env_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = StaticIdentity::new("123456789012");
        let err = synthesize(&settings(dir.path(), "dev-eu"), &resolver)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SynthError::Config(ConfigError::InvalidValue { .. })
        ));
    }
}
