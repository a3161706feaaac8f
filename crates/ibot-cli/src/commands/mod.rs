//! CLI command implementations.

mod synth;

pub use synth::{synth, write_assembly};

use anyhow::{Context, Result};
use ibot_config::ProjectConfig;
use ibot_core::identity::{IdentityResolver, StaticIdentity};
use ibot_core::naming::{qualify_dash_for, qualify_title_for};
use ibot_core::StackGraph;
use ibot_stacks::SynthSettings;

use crate::TargetArgs;
use crate::identity::StsIdentityResolver;

fn settings(target: &TargetArgs) -> Result<SynthSettings> {
    let mut project = match &target.project {
        Some(path) => ProjectConfig::load(path)
            .with_context(|| format!("Failed to load project file: {}", path.display()))?,
        None => ProjectConfig::default(),
    };
    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    project.resolve_build_dir(&cwd);
    Ok(SynthSettings {
        env: target.env.clone(),
        region: target.region.clone(),
        bootstrap_dir: target.bootstrap_dir.clone(),
        project,
    })
}

fn resolver(target: &TargetArgs, profile: Option<String>) -> Box<dyn IdentityResolver> {
    match &target.account_id {
        Some(account_id) => Box::new(StaticIdentity::new(account_id.clone())),
        None => Box::new(StsIdentityResolver::new(profile)),
    }
}

async fn build_graph(target: &TargetArgs, profile: Option<String>) -> Result<StackGraph> {
    let settings = settings(target)?;
    let resolver = resolver(target, profile);
    ibot_stacks::synthesize(&settings, resolver.as_ref())
        .await
        .with_context(|| format!("Failed to synthesize environment '{}'", target.env))
}

pub async fn list(target: &TargetArgs, profile: Option<String>) -> Result<()> {
    let graph = build_graph(target, profile).await?;
    for node in graph.nodes() {
        if node.dependencies.is_empty() {
            println!("{}", node.stack.id());
        } else {
            let deps: Vec<&str> = node.dependencies.iter().map(String::as_str).collect();
            println!("{} (after {})", node.stack.id(), deps.join(", "));
        }
    }
    Ok(())
}

pub fn names(env: &str, names: &[String]) -> Result<()> {
    ibot_config::validate_env(env)?;
    for name in names {
        println!(
            "{}\t{}",
            qualify_dash_for(env, name),
            qualify_title_for(env, name)
        );
    }
    Ok(())
}
