//! Resource declaration constructors.
//!
//! Every function here is a pure value constructor: it takes a qualified
//! name and typed inputs and returns the declaration. Nothing is
//! registered anywhere; callers collect declarations into a [`Stack`].
//!
//! [`Stack`]: crate::Stack

use sha2::{Digest, Sha256};

use crate::naming::QualifiedName;
use crate::resource::{
    AccessKey, ArtifactBucket, BuildAction, BuildProject, BuildSpec, CodeAsset, ComputeFunction,
    Effect, GatewayTrigger, HttpGateway, IdentityPolicy, IdentityRole, IdentityUser, LogicalId,
    Network, NetworkAttachment, Pipeline, PipelineArtifact, PipelineStage, PolicyStatement,
    RoleOrigin, Runtime, Secret, SourceAction, SubnetKind, SubnetSpec, Value,
};

pub const DEFAULT_CIDR: &str = "10.0.0.0/16";
pub const DEFAULT_STAGE_NAME: &str = "prod";

/// Single-AZ network with one public subnet and no NAT gateway.
pub fn network(name: QualifiedName) -> Network {
    Network {
        logical_id: name.logical_id,
        name: name.name,
        cidr: DEFAULT_CIDR.to_string(),
        max_azs: 1,
        nat_gateways: 0,
        subnets: vec![SubnetSpec {
            name: "public".to_string(),
            kind: SubnetKind::Public,
            cidr_mask: 24,
        }],
    }
}

/// `{build_dir}/{component}.zip`
pub fn artifact_path(build_dir: &str, component: &str) -> String {
    format!("{}/{}.zip", build_dir.trim_end_matches('/'), component)
}

/// `{component}.handler`
pub fn handler(component: &str) -> String {
    format!("{component}.handler")
}

/// File asset for a component's deployment artifact.
///
/// The asset id is the SHA-256 of the artifact path, so it is stable for
/// a given build layout without touching the file.
pub fn code_asset(build_dir: &str, component: &str) -> CodeAsset {
    let path = artifact_path(build_dir, component);
    let asset_id = hex::encode(Sha256::digest(path.as_bytes()));
    CodeAsset { path, asset_id }
}

/// Inputs of a compute function besides its name.
#[derive(Debug, Clone)]
pub struct FunctionProps {
    pub runtime: Runtime,
    pub code: CodeAsset,
    pub handler: String,
    pub role: Value,
    pub network: Option<NetworkAttachment>,
}

pub fn compute_function(name: QualifiedName, props: FunctionProps) -> ComputeFunction {
    ComputeFunction {
        logical_id: name.logical_id,
        name: name.name,
        runtime: props.runtime,
        code: props.code,
        handler: props.handler,
        role: props.role,
        network: props.network,
    }
}

/// Proxy gateway in front of `function`.
pub fn http_gateway(name: QualifiedName, function: &ComputeFunction) -> HttpGateway {
    HttpGateway {
        logical_id: name.logical_id,
        name: name.name,
        trigger: GatewayTrigger {
            function: function.logical_id.clone(),
            function_arn: Value::get_att(&function.logical_id, "Arn"),
            proxy: true,
            stage_name: DEFAULT_STAGE_NAME.to_string(),
        },
    }
}

/// Role assumed by an AWS service principal.
pub fn service_role(
    name: QualifiedName,
    service: &str,
    managed_policy_arns: Vec<String>,
) -> IdentityRole {
    IdentityRole {
        logical_id: name.logical_id,
        name: name.name,
        origin: RoleOrigin::Declared {
            assumed_by: service.to_string(),
            managed_policy_arns,
        },
    }
}

/// Reference to a role that already exists.
pub fn imported_role(logical_id: LogicalId, name: String, arn: String) -> IdentityRole {
    IdentityRole {
        logical_id,
        name,
        origin: RoleOrigin::Imported { arn },
    }
}

/// Allow `sts:AssumeRole` on exactly the given roles.
pub fn assume_roles_statement(roles: &[&IdentityRole]) -> PolicyStatement {
    PolicyStatement {
        effect: Effect::Allow,
        actions: vec!["sts:AssumeRole".to_string()],
        resources: roles.iter().map(|r| r.arn()).collect(),
    }
}

pub fn policy(
    name: QualifiedName,
    statements: Vec<PolicyStatement>,
    users: &[&IdentityUser],
) -> IdentityPolicy {
    IdentityPolicy {
        logical_id: name.logical_id,
        name: name.name,
        statements,
        users: users
            .iter()
            .map(|u| Value::Ref(u.logical_id.clone()))
            .collect(),
    }
}

pub fn user(name: QualifiedName) -> IdentityUser {
    IdentityUser {
        logical_id: name.logical_id,
        name: name.name,
    }
}

pub fn access_key(logical_id: LogicalId, user: &IdentityUser) -> AccessKey {
    AccessKey {
        logical_id,
        user: Value::Ref(user.logical_id.clone()),
    }
}

/// Secret holding the secret half of `key`, described by its public id.
pub fn access_key_secret(name: QualifiedName, key: &AccessKey) -> Secret {
    Secret {
        logical_id: name.logical_id,
        name: name.name,
        description: Some(Value::Join(vec![
            Value::literal("Secret access key for "),
            Value::Ref(key.logical_id.clone()),
        ])),
        secret_string: Some(Value::get_att(&key.logical_id, "SecretAccessKey")),
    }
}

/// Secret whose value is assigned after deployment.
pub fn placeholder_secret(name: QualifiedName, description: &str) -> Secret {
    Secret {
        logical_id: name.logical_id,
        name: name.name,
        description: Some(Value::literal(description)),
        secret_string: None,
    }
}

pub fn artifact_bucket(logical_id: LogicalId, bucket_name: &str) -> ArtifactBucket {
    ArtifactBucket {
        logical_id,
        bucket_name: bucket_name.to_string(),
    }
}

pub fn pipeline_artifact(logical_id: LogicalId, artifact_name: &str) -> PipelineArtifact {
    PipelineArtifact {
        logical_id,
        artifact_name: artifact_name.to_string(),
    }
}

/// Source checkout of `owner/repo@branch`.
pub struct SourceProps<'a> {
    pub owner: &'a str,
    pub repo: &'a str,
    pub branch: String,
    pub oauth_token: Value,
    pub output: &'a PipelineArtifact,
}

pub fn source_action(logical_id: LogicalId, props: SourceProps<'_>) -> SourceAction {
    SourceAction {
        logical_id,
        action_name: "Source".to_string(),
        owner: props.owner.to_string(),
        repo: props.repo.to_string(),
        branch: props.branch,
        oauth_token: props.oauth_token,
        output: props.output.logical_id.clone(),
    }
}

pub fn build_action(
    logical_id: LogicalId,
    project: &BuildProject,
    input: &PipelineArtifact,
) -> BuildAction {
    BuildAction {
        logical_id,
        action_name: "Build".to_string(),
        project: project.logical_id.clone(),
        input: input.logical_id.clone(),
    }
}

pub fn build_project(name: QualifiedName, image: &str, build_spec: BuildSpec) -> BuildProject {
    BuildProject {
        logical_id: name.logical_id,
        name: name.name,
        image: image.to_string(),
        build_spec,
    }
}

pub fn pipeline(
    name: QualifiedName,
    artifact_bucket: &ArtifactBucket,
    stages: Vec<PipelineStage>,
) -> Pipeline {
    Pipeline {
        logical_id: name.logical_id,
        name: name.name,
        artifact_bucket: artifact_bucket.logical_id.clone(),
        stages,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::naming::qualify;
    use crate::{Context, Params};

    fn ctx() -> Context {
        Context::new("dev", "us-east-1", "123456789012", Params::new("q1", "bucket1", "repo1"))
    }

    #[test]
    fn test_network_is_single_az_public_only() {
        let vpc = network(qualify(&ctx(), "vpc"));
        assert_eq!(vpc.name, "ibot-dev-vpc");
        assert_eq!(vpc.max_azs, 1);
        assert_eq!(vpc.nat_gateways, 0);
        assert_eq!(vpc.subnets.len(), 1);
        assert_eq!(vpc.subnets[0].kind, SubnetKind::Public);
    }

    #[test]
    fn test_code_asset_is_stable() {
        let a = code_asset("../../.build", "api");
        let b = code_asset("../../.build/", "api");
        assert_eq!(a.path, "../../.build/api.zip");
        assert_eq!(a, b);
        assert_eq!(a.asset_id.len(), 64);
        assert_ne!(a.asset_id, code_asset("../../.build", "worker").asset_id);
    }

    #[test]
    fn test_gateway_wires_function() {
        let role = service_role(qualify(&ctx(), "api-role"), "lambda.amazonaws.com", vec![]);
        let function = compute_function(
            qualify(&ctx(), "api-lambda"),
            FunctionProps {
                runtime: Runtime::Python39,
                code: code_asset("build", "api"),
                handler: handler("api"),
                role: role.arn(),
                network: None,
            },
        );
        let gateway = http_gateway(qualify(&ctx(), "api-gateway"), &function);
        assert_eq!(gateway.trigger.function, function.logical_id);
        assert_eq!(
            gateway.trigger.function_arn,
            Value::get_att(&function.logical_id, "Arn")
        );
        assert!(gateway.trigger.proxy);
        assert_eq!(function.handler, "api.handler");
    }

    #[test]
    fn test_access_key_secret_embeds_key_id() {
        let user = user(qualify(&ctx(), "ci-user"));
        let key = access_key(LogicalId::new("IbotDevCiAccessKey"), &user);
        let secret = access_key_secret(qualify(&ctx(), "ci-secret"), &key);
        let description = secret.description.unwrap();
        assert_eq!(description.local_refs(), vec![&key.logical_id]);
        assert_eq!(
            secret.secret_string,
            Some(Value::get_att(&key.logical_id, "SecretAccessKey"))
        );
    }

    #[test]
    fn test_assume_roles_statement() {
        let a = imported_role(LogicalId::new("A"), "a".into(), "arn:a".into());
        let b = imported_role(LogicalId::new("B"), "b".into(), "arn:b".into());
        let stmt = assume_roles_statement(&[&a, &b]);
        assert_eq!(stmt.actions, vec!["sts:AssumeRole"]);
        assert_eq!(
            stmt.resources,
            vec![Value::literal("arn:a"), Value::literal("arn:b")]
        );
    }
}
