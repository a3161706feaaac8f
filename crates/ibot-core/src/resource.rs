//! Resource declarations.
//!
//! Declarations are immutable values. Attributes that point at other
//! resources are [`Value`] expressions, resolved by the deploy engine.

use derive_more::{Display, From};
use serde::Serialize;

/// Identifier of a declaration inside its stack (title-cased).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Display)]
#[display("{_0}")]
pub struct LogicalId(String);

impl LogicalId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Derived id for a rendered sub-resource (e.g. `{Api}Deployment`).
    pub fn child(&self, suffix: &str) -> LogicalId {
        LogicalId(format!("{}{}", self.0, suffix))
    }
}

/// An attribute value, possibly referring to another declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// A plain string.
    Literal(String),
    /// The primary identifier of a declaration in the same stack.
    Ref(LogicalId),
    /// A named attribute of a declaration in the same stack.
    GetAtt {
        logical_id: LogicalId,
        attribute: String,
    },
    /// A value exported by an earlier stack.
    Import(String),
    /// Concatenation of values.
    Join(Vec<Value>),
    /// The secret string of the secret identified by the inner value.
    SecretString(Box<Value>),
}

impl Value {
    pub fn literal(s: impl Into<String>) -> Self {
        Value::Literal(s.into())
    }

    pub fn get_att(logical_id: &LogicalId, attribute: &str) -> Self {
        Value::GetAtt {
            logical_id: logical_id.clone(),
            attribute: attribute.to_string(),
        }
    }

    /// Logical ids this value points at within its own stack.
    pub fn local_refs(&self) -> Vec<&LogicalId> {
        let mut out = Vec::new();
        self.collect_local_refs(&mut out);
        out
    }

    /// Export names this value imports.
    pub fn imports(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_imports(&mut out);
        out
    }

    fn collect_local_refs<'a>(&'a self, out: &mut Vec<&'a LogicalId>) {
        match self {
            Value::Ref(id) | Value::GetAtt { logical_id: id, .. } => out.push(id),
            Value::Join(parts) => parts.iter().for_each(|p| p.collect_local_refs(out)),
            Value::SecretString(inner) => inner.collect_local_refs(out),
            Value::Literal(_) | Value::Import(_) => {}
        }
    }

    fn collect_imports<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Value::Import(name) => out.push(name),
            Value::Join(parts) => parts.iter().for_each(|p| p.collect_imports(out)),
            Value::SecretString(inner) => inner.collect_imports(out),
            Value::Literal(_) | Value::Ref(_) | Value::GetAtt { .. } => {}
        }
    }
}

/// Function runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Runtime {
    Python39,
    Python312,
    ProvidedAl2,
    ProvidedAl2023,
}

impl Runtime {
    pub fn as_str(&self) -> &'static str {
        match self {
            Runtime::Python39 => "python3.9",
            Runtime::Python312 => "python3.12",
            Runtime::ProvidedAl2 => "provided.al2",
            Runtime::ProvidedAl2023 => "provided.al2023",
        }
    }
}

impl std::fmt::Display for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Runtime {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s {
            "python3.9" => Ok(Runtime::Python39),
            "python3.12" => Ok(Runtime::Python312),
            "provided.al2" => Ok(Runtime::ProvidedAl2),
            "provided.al2023" => Ok(Runtime::ProvidedAl2023),
            other => Err(crate::Error::InvalidInput(format!("unknown runtime: {other}"))),
        }
    }
}

/// Kind of subnet in a network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubnetKind {
    Public,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubnetSpec {
    pub name: String,
    pub kind: SubnetKind,
    pub cidr_mask: u8,
}

/// A virtual network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Network {
    pub logical_id: LogicalId,
    pub name: String,
    pub cidr: String,
    pub max_azs: u8,
    pub nat_gateways: u8,
    pub subnets: Vec<SubnetSpec>,
}

impl Network {
    /// Logical ids of the rendered subnets, one per subnet spec and AZ.
    pub fn subnet_ids(&self) -> Vec<LogicalId> {
        self.subnets
            .iter()
            .flat_map(|subnet| {
                (1..=self.max_azs).map(move |az| {
                    self.logical_id.child(&format!(
                        "{}Subnet{}",
                        crate::naming::title(&subnet.name),
                        az
                    ))
                })
            })
            .collect()
    }

    pub fn internet_gateway_id(&self) -> LogicalId {
        self.logical_id.child("InternetGateway")
    }

    pub fn gateway_attachment_id(&self) -> LogicalId {
        self.logical_id.child("GatewayAttachment")
    }

    pub fn public_route_table_id(&self) -> LogicalId {
        self.logical_id.child("PublicRouteTable")
    }

    pub fn default_route_id(&self) -> LogicalId {
        self.logical_id.child("PublicDefaultRoute")
    }

    fn rendered_ids(&self) -> Vec<LogicalId> {
        let mut ids = vec![
            self.internet_gateway_id(),
            self.gateway_attachment_id(),
            self.public_route_table_id(),
            self.default_route_id(),
        ];
        for subnet in self.subnet_ids() {
            ids.push(subnet.child("RouteTableAssociation"));
            ids.push(subnet);
        }
        ids
    }
}

/// A deployment artifact published as a file asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeAsset {
    /// Path of the artifact on the synthesizing machine.
    pub path: String,
    /// Content-addressed identifier used for the object key.
    pub asset_id: String,
}

/// Where a function is placed inside a network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkAttachment {
    pub vpc_id: Value,
    pub subnet_ids: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComputeFunction {
    pub logical_id: LogicalId,
    pub name: String,
    pub runtime: Runtime,
    pub code: CodeAsset,
    /// Entry point, `{component}.handler`.
    pub handler: String,
    pub role: Value,
    pub network: Option<NetworkAttachment>,
}

impl ComputeFunction {
    /// Security group rendered when the function is attached to a network.
    pub fn security_group_id(&self) -> LogicalId {
        self.logical_id.child("SecurityGroup")
    }
}

/// Wiring between a gateway and its backing function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayTrigger {
    pub function: LogicalId,
    pub function_arn: Value,
    /// Route every path (`{proxy+}`) and the root to the function.
    pub proxy: bool,
    pub stage_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpGateway {
    pub logical_id: LogicalId,
    pub name: String,
    pub trigger: GatewayTrigger,
}

impl HttpGateway {
    pub const PROXY_RESOURCE: &'static str = "ProxyResource";
    pub const ROOT_METHOD: &'static str = "RootMethod";
    pub const PROXY_METHOD: &'static str = "ProxyMethod";
    pub const DEPLOYMENT: &'static str = "Deployment";
    pub const STAGE: &'static str = "Stage";
    pub const PERMISSION: &'static str = "InvokePermission";

    fn rendered_ids(&self) -> Vec<LogicalId> {
        let mut suffixes = vec![Self::DEPLOYMENT, Self::STAGE, Self::PERMISSION, Self::ROOT_METHOD];
        if self.trigger.proxy {
            suffixes.extend([Self::PROXY_RESOURCE, Self::PROXY_METHOD]);
        }
        suffixes.into_iter().map(|s| self.logical_id.child(s)).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleOrigin {
    /// Created by this stack.
    Declared {
        assumed_by: String,
        managed_policy_arns: Vec<String>,
    },
    /// Pre-existing role, referenced by ARN only.
    Imported { arn: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityRole {
    pub logical_id: LogicalId,
    pub name: String,
    pub origin: RoleOrigin,
}

impl IdentityRole {
    /// Value identifying the role's ARN.
    pub fn arn(&self) -> Value {
        match &self.origin {
            RoleOrigin::Declared { .. } => Value::get_att(&self.logical_id, "Arn"),
            RoleOrigin::Imported { arn } => Value::literal(arn.clone()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    Allow,
    Deny,
}

impl Effect {
    pub fn as_str(&self) -> &'static str {
        match self {
            Effect::Allow => "Allow",
            Effect::Deny => "Deny",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyStatement {
    pub effect: Effect,
    pub actions: Vec<String>,
    pub resources: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityPolicy {
    pub logical_id: LogicalId,
    pub name: String,
    pub statements: Vec<PolicyStatement>,
    /// Users the policy is attached to.
    pub users: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityUser {
    pub logical_id: LogicalId,
    pub name: String,
}

/// Access key of a user. `Ref` yields the public key id, the
/// `SecretAccessKey` attribute the secret half.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessKey {
    pub logical_id: LogicalId,
    pub user: Value,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Secret {
    pub logical_id: LogicalId,
    pub name: String,
    pub description: Option<Value>,
    /// `None` leaves the value to be filled in after deployment.
    pub secret_string: Option<Value>,
}

/// An existing bucket, referenced by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactBucket {
    pub logical_id: LogicalId,
    pub bucket_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineStage {
    pub name: String,
    pub actions: Vec<LogicalId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    pub logical_id: LogicalId,
    pub name: String,
    pub artifact_bucket: LogicalId,
    pub stages: Vec<PipelineStage>,
}

/// A named artifact passed between pipeline actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineArtifact {
    pub logical_id: LogicalId,
    pub artifact_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceAction {
    pub logical_id: LogicalId,
    pub action_name: String,
    pub owner: String,
    pub repo: String,
    pub branch: String,
    pub oauth_token: Value,
    pub output: LogicalId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildAction {
    pub logical_id: LogicalId,
    pub action_name: String,
    pub project: LogicalId,
    pub input: LogicalId,
}

/// Inline build specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSpec {
    pub version: String,
    pub install_commands: Vec<String>,
    pub build_commands: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildProject {
    pub logical_id: LogicalId,
    pub name: String,
    pub image: String,
    pub build_spec: BuildSpec,
}

/// A declared resource.
#[derive(Debug, Clone, PartialEq, Eq, From)]
pub enum Resource {
    Network(Network),
    ComputeFunction(ComputeFunction),
    HttpGateway(HttpGateway),
    IdentityRole(IdentityRole),
    IdentityPolicy(IdentityPolicy),
    IdentityUser(IdentityUser),
    AccessKey(AccessKey),
    Secret(Secret),
    ArtifactBucket(ArtifactBucket),
    Pipeline(Pipeline),
    PipelineArtifact(PipelineArtifact),
    SourceAction(SourceAction),
    BuildAction(BuildAction),
    BuildProject(BuildProject),
}

impl Resource {
    pub fn logical_id(&self) -> &LogicalId {
        match self {
            Resource::Network(r) => &r.logical_id,
            Resource::ComputeFunction(r) => &r.logical_id,
            Resource::HttpGateway(r) => &r.logical_id,
            Resource::IdentityRole(r) => &r.logical_id,
            Resource::IdentityPolicy(r) => &r.logical_id,
            Resource::IdentityUser(r) => &r.logical_id,
            Resource::AccessKey(r) => &r.logical_id,
            Resource::Secret(r) => &r.logical_id,
            Resource::ArtifactBucket(r) => &r.logical_id,
            Resource::Pipeline(r) => &r.logical_id,
            Resource::PipelineArtifact(r) => &r.logical_id,
            Resource::SourceAction(r) => &r.logical_id,
            Resource::BuildAction(r) => &r.logical_id,
            Resource::BuildProject(r) => &r.logical_id,
        }
    }

    /// Logical ids taken by this declaration once rendered: its own and
    /// those of any sub-resources it expands to.
    pub fn occupied_ids(&self) -> Vec<LogicalId> {
        let mut ids = vec![self.logical_id().clone()];
        match self {
            Resource::Network(r) => ids.extend(r.rendered_ids()),
            Resource::HttpGateway(r) => ids.extend(r.rendered_ids()),
            Resource::ComputeFunction(r) if r.network.is_some() => ids.push(r.security_group_id()),
            _ => {}
        }
        ids
    }

    /// Physical name claimed in the account, if any.
    ///
    /// Imported declarations claim nothing: the name belongs to whoever
    /// created the resource.
    pub fn physical_name(&self) -> Option<&str> {
        match self {
            Resource::Network(r) => Some(&r.name),
            Resource::ComputeFunction(r) => Some(&r.name),
            Resource::HttpGateway(r) => Some(&r.name),
            Resource::IdentityRole(r) => match r.origin {
                RoleOrigin::Declared { .. } => Some(&r.name),
                RoleOrigin::Imported { .. } => None,
            },
            Resource::IdentityPolicy(r) => Some(&r.name),
            Resource::IdentityUser(r) => Some(&r.name),
            Resource::Secret(r) => Some(&r.name),
            Resource::Pipeline(r) => Some(&r.name),
            Resource::BuildProject(r) => Some(&r.name),
            Resource::AccessKey(_)
            | Resource::ArtifactBucket(_)
            | Resource::PipelineArtifact(_)
            | Resource::SourceAction(_)
            | Resource::BuildAction(_) => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Resource::Network(_) => "Network",
            Resource::ComputeFunction(_) => "ComputeFunction",
            Resource::HttpGateway(_) => "HttpGateway",
            Resource::IdentityRole(_) => "IdentityRole",
            Resource::IdentityPolicy(_) => "IdentityPolicy",
            Resource::IdentityUser(_) => "IdentityUser",
            Resource::AccessKey(_) => "AccessKey",
            Resource::Secret(_) => "Secret",
            Resource::ArtifactBucket(_) => "ArtifactBucket",
            Resource::Pipeline(_) => "Pipeline",
            Resource::PipelineArtifact(_) => "PipelineArtifact",
            Resource::SourceAction(_) => "SourceAction",
            Resource::BuildAction(_) => "BuildAction",
            Resource::BuildProject(_) => "BuildProject",
        }
    }

    /// References to existing resources, rendered as metadata only.
    pub fn is_imported(&self) -> bool {
        matches!(
            self,
            Resource::ArtifactBucket(_)
                | Resource::IdentityRole(IdentityRole {
                    origin: RoleOrigin::Imported { .. },
                    ..
                })
        )
    }

    /// Declarations that only exist inside a pipeline definition.
    pub fn is_embedded(&self) -> bool {
        matches!(
            self,
            Resource::PipelineArtifact(_) | Resource::SourceAction(_) | Resource::BuildAction(_)
        )
    }

    /// Every logical id this declaration points at within its stack.
    pub fn local_refs(&self) -> Vec<&LogicalId> {
        let mut out = Vec::new();
        for value in self.values() {
            out.extend(value.local_refs());
        }
        match self {
            Resource::HttpGateway(r) => out.push(&r.trigger.function),
            Resource::Pipeline(r) => {
                out.push(&r.artifact_bucket);
                out.extend(r.stages.iter().flat_map(|s| s.actions.iter()));
            }
            Resource::SourceAction(r) => out.push(&r.output),
            Resource::BuildAction(r) => {
                out.push(&r.project);
                out.push(&r.input);
            }
            _ => {}
        }
        out
    }

    /// Every export name this declaration imports.
    pub fn imports(&self) -> Vec<&str> {
        self.values().into_iter().flat_map(|v| v.imports()).collect()
    }

    fn values(&self) -> Vec<&Value> {
        match self {
            Resource::ComputeFunction(r) => {
                let mut values = vec![&r.role];
                if let Some(net) = &r.network {
                    values.push(&net.vpc_id);
                    values.extend(net.subnet_ids.iter());
                }
                values
            }
            Resource::HttpGateway(r) => vec![&r.trigger.function_arn],
            Resource::IdentityPolicy(r) => r
                .statements
                .iter()
                .flat_map(|s| s.resources.iter())
                .chain(r.users.iter())
                .collect(),
            Resource::AccessKey(r) => vec![&r.user],
            Resource::Secret(r) => r.description.iter().chain(r.secret_string.iter()).collect(),
            Resource::SourceAction(r) => vec![&r.oauth_token],
            Resource::Network(_)
            | Resource::IdentityRole(_)
            | Resource::IdentityUser(_)
            | Resource::ArtifactBucket(_)
            | Resource::Pipeline(_)
            | Resource::PipelineArtifact(_)
            | Resource::BuildAction(_)
            | Resource::BuildProject(_) => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_refs_and_imports() {
        let value = Value::Join(vec![
            Value::literal("key "),
            Value::Ref(LogicalId::new("Key")),
            Value::SecretString(Box::new(Value::Import("Stack:Secret".to_string()))),
        ]);
        assert_eq!(value.local_refs(), vec![&LogicalId::new("Key")]);
        assert_eq!(value.imports(), vec!["Stack:Secret"]);
    }

    #[test]
    fn test_imported_role_claims_no_name() {
        let role = Resource::IdentityRole(IdentityRole {
            logical_id: LogicalId::new("DeployRole"),
            name: "cdk-q1-deploy-role".to_string(),
            origin: RoleOrigin::Imported {
                arn: "arn:aws:iam::1:role/cdk-q1-deploy-role".to_string(),
            },
        });
        assert!(role.is_imported());
        assert_eq!(role.physical_name(), None);
    }

    #[test]
    fn test_network_occupies_subnet_ids() {
        let network = Network {
            logical_id: LogicalId::new("IbotDevVpc"),
            name: "ibot-dev-vpc".to_string(),
            cidr: "10.0.0.0/16".to_string(),
            max_azs: 1,
            nat_gateways: 0,
            subnets: vec![SubnetSpec {
                name: "public".to_string(),
                kind: SubnetKind::Public,
                cidr_mask: 24,
            }],
        };
        assert_eq!(network.subnet_ids(), vec![LogicalId::new("IbotDevVpcPublicSubnet1")]);
        let occupied = Resource::Network(network).occupied_ids();
        assert!(occupied.contains(&LogicalId::new("IbotDevVpc")));
        assert!(occupied.contains(&LogicalId::new("IbotDevVpcPublicSubnet1")));
        assert!(occupied.contains(&LogicalId::new("IbotDevVpcInternetGateway")));
    }

    #[test]
    fn test_runtime_parse() {
        assert_eq!("python3.9".parse::<Runtime>().unwrap(), Runtime::Python39);
        assert!("cobol".parse::<Runtime>().is_err());
    }

    #[test]
    fn test_logical_id_child() {
        assert_eq!(LogicalId::new("Api").child("Deployment").as_str(), "ApiDeployment");
    }
}
