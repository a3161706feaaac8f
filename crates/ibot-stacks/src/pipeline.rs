//! Delivery pipeline stack.
//!
//! Two stages: `Source` checks out `deploy-{env}` using the token held by
//! the repo stack's secret, `Build` runs a build project on the checkout.
//! The artifact store is the bootstrap file-assets bucket named in the
//! parameters, not anything declared by the network stack.

use ibot_config::ProjectConfig;
use ibot_core::naming::{qualify, qualify_title};
use ibot_core::resource::{BuildSpec, LogicalId, PipelineStage, Value};
use ibot_core::{Context, Stack, Synthesizer, factory};

use crate::repo::RepoOutputs;

pub const BUILD_SPEC_VERSION: &str = "0.2";

/// `deploy-{env}`
pub fn deploy_branch(ctx: &Context) -> String {
    format!("deploy-{}", ctx.env())
}

pub fn build(
    ctx: &Context,
    synthesizer: Synthesizer,
    project: &ProjectConfig,
    repo: &RepoOutputs,
) -> Stack {
    let id = |name: &str| LogicalId::new(qualify_title(ctx, name));

    let bucket = factory::artifact_bucket(id("artifact-bucket"), &ctx.params().file_assets_bucket_name);
    let source_output = factory::pipeline_artifact(id("source-output"), "SourceOutput");
    let source = factory::source_action(
        id("source-action"),
        factory::SourceProps {
            owner: &project.source_owner,
            repo: &project.source_repo,
            branch: deploy_branch(ctx),
            oauth_token: Value::SecretString(Box::new(repo.token_secret.value())),
            output: &source_output,
        },
    );
    let project_decl = factory::build_project(
        qualify(ctx, "build-project"),
        &project.build_image,
        BuildSpec {
            version: BUILD_SPEC_VERSION.to_string(),
            install_commands: project.install_commands.clone(),
            build_commands: project.build_commands.clone(),
        },
    );
    let build_action = factory::build_action(id("build-action"), &project_decl, &source_output);
    let pipeline = factory::pipeline(
        qualify(ctx, "pipeline"),
        &bucket,
        vec![
            PipelineStage {
                name: "Source".to_string(),
                actions: vec![source.logical_id.clone()],
            },
            PipelineStage {
                name: "Build".to_string(),
                actions: vec![build_action.logical_id.clone()],
            },
        ],
    );

    let mut stack = Stack::new(qualify_title(ctx, "pipeline-stack"), synthesizer)
        .with_description(format!("ibot {} delivery pipeline", ctx.env()));
    stack.declare(bucket);
    stack.declare(source_output);
    stack.declare(source);
    stack.declare(project_decl);
    stack.declare(build_action);
    stack.declare(pipeline);
    stack
}
