//! Rendering of a stack graph into a cloud assembly.
//!
//! The assembly is a set of JSON documents: one template per stack, one
//! asset manifest per stack that publishes files, and a top-level
//! `manifest.json` tying them together for the deploy engine.

use std::collections::BTreeMap;

use serde_json::{Map, Value as Json, json};

use crate::resource::{
    AccessKey, BuildAction, BuildProject, ComputeFunction, HttpGateway, IdentityPolicy,
    IdentityRole, IdentityUser, LogicalId, Network, Pipeline, Resource, RoleOrigin, Secret,
    SourceAction, Value,
};
use crate::synthesizer::BootstrapRole;
use crate::{Context, Stack, StackGraph};

pub const ASSEMBLY_VERSION: &str = "36.0.0";
pub const MANIFEST_FILE: &str = "manifest.json";

/// A rendered cloud assembly: file name -> document.
#[derive(Debug, Clone, PartialEq)]
pub struct Assembly {
    pub files: BTreeMap<String, Json>,
}

impl Assembly {
    pub fn from_graph(graph: &StackGraph) -> Self {
        let ctx = graph.context();
        let mut files = BTreeMap::new();
        let mut artifacts = Map::new();

        for node in graph.nodes() {
            let stack = &node.stack;
            let template_file = template_file(stack.id());
            files.insert(template_file.clone(), render_template(stack, ctx));

            let mut dependencies: Vec<Json> =
                node.dependencies.iter().map(|d| json!(d)).collect();

            if let Some(assets) = render_assets(stack, ctx) {
                let assets_id = format!("{}.assets", stack.id());
                let assets_file = format!("{assets_id}.json");
                files.insert(assets_file.clone(), assets);
                artifacts.insert(
                    assets_id.clone(),
                    json!({
                        "type": "cdk:asset-manifest",
                        "properties": { "file": assets_file },
                    }),
                );
                dependencies.push(json!(assets_id));
            }

            let synth = stack.synthesizer();
            artifacts.insert(
                stack.id().to_string(),
                json!({
                    "type": "aws:cloudformation:stack",
                    "environment": ctx.environment_uri(),
                    "properties": {
                        "templateFile": template_file,
                        "stackName": stack.id(),
                        "assumeRoleArn": synth.bootstrap_role_arn(
                            BootstrapRole::Deploy, ctx.account_id(), ctx.region()),
                        "lookupRoleArn": synth.bootstrap_role_arn(
                            BootstrapRole::Lookup, ctx.account_id(), ctx.region()),
                    },
                    "dependencies": dependencies,
                }),
            );
        }

        files.insert(
            MANIFEST_FILE.to_string(),
            json!({ "version": ASSEMBLY_VERSION, "artifacts": artifacts }),
        );
        Self { files }
    }

    pub fn manifest(&self) -> Option<&Json> {
        self.files.get(MANIFEST_FILE)
    }

    pub fn template(&self, stack_id: &str) -> Option<&Json> {
        self.files.get(&template_file(stack_id))
    }
}

pub fn template_file(stack_id: &str) -> String {
    format!("{stack_id}.template.json")
}

/// Render a value expression.
pub fn render_value(value: &Value) -> Json {
    match value {
        Value::Literal(s) => json!(s),
        Value::Ref(id) => json!({ "Ref": id }),
        Value::GetAtt {
            logical_id,
            attribute,
        } => json!({ "Fn::GetAtt": [logical_id, attribute] }),
        Value::Import(name) => json!({ "Fn::ImportValue": name }),
        Value::Join(parts) => {
            let parts: Vec<Json> = parts.iter().map(render_value).collect();
            json!({ "Fn::Join": ["", parts] })
        }
        Value::SecretString(secret) => json!({
            "Fn::Join": ["", [
                "{{resolve:secretsmanager:",
                render_value(secret),
                ":SecretString:::}}",
            ]]
        }),
    }
}

fn render_template(stack: &Stack, ctx: &Context) -> Json {
    let mut resources = Map::new();
    let mut imports = Map::new();

    for resource in stack.resources() {
        if resource.is_embedded() {
            continue;
        }
        if resource.is_imported() {
            imports.insert(resource.logical_id().to_string(), render_import(resource));
            continue;
        }
        for (id, body) in render_resource(resource, stack, ctx) {
            resources.insert(id.to_string(), body);
        }
    }

    let outputs: Map<String, Json> = stack
        .exports()
        .iter()
        .map(|e| {
            (
                e.output_id.to_string(),
                json!({ "Value": render_value(&e.value), "Export": { "Name": e.name } }),
            )
        })
        .collect();

    let mut template = Map::new();
    template.insert("AWSTemplateFormatVersion".into(), json!("2010-09-09"));
    if let Some(description) = stack.description() {
        template.insert("Description".into(), json!(description));
    }
    template.insert(
        "Parameters".into(),
        json!({
            "BootstrapVersion": {
                "Type": "AWS::SSM::Parameter::Value<String>",
                "Default": format!("/cdk-bootstrap/{}/version", stack.synthesizer().qualifier),
            }
        }),
    );
    if !imports.is_empty() {
        template.insert("Metadata".into(), json!({ "ibot:imports": imports }));
    }
    template.insert("Resources".into(), Json::Object(resources));
    if !outputs.is_empty() {
        template.insert("Outputs".into(), Json::Object(outputs));
    }
    Json::Object(template)
}

fn render_import(resource: &Resource) -> Json {
    match resource {
        Resource::IdentityRole(IdentityRole {
            name,
            origin: RoleOrigin::Imported { arn },
            ..
        }) => json!({ "Kind": resource.kind(), "RoleName": name, "Arn": arn }),
        Resource::ArtifactBucket(bucket) => {
            json!({ "Kind": resource.kind(), "BucketName": bucket.bucket_name })
        }
        other => json!({ "Kind": other.kind() }),
    }
}

fn cfn(kind: &str, properties: Json) -> Json {
    json!({ "Type": kind, "Properties": properties })
}

fn render_resource(resource: &Resource, stack: &Stack, ctx: &Context) -> Vec<(LogicalId, Json)> {
    match resource {
        Resource::Network(r) => render_network(r),
        Resource::ComputeFunction(r) => render_function(r, stack, ctx),
        Resource::HttpGateway(r) => render_gateway(r),
        Resource::IdentityRole(r) => vec![(r.logical_id.clone(), render_role(r))],
        Resource::IdentityPolicy(r) => vec![(r.logical_id.clone(), render_policy(r))],
        Resource::IdentityUser(r) => vec![(r.logical_id.clone(), render_user(r))],
        Resource::AccessKey(r) => vec![(r.logical_id.clone(), render_access_key(r))],
        Resource::Secret(r) => vec![(r.logical_id.clone(), render_secret(r))],
        Resource::BuildProject(r) => vec![(r.logical_id.clone(), render_build_project(r))],
        Resource::Pipeline(r) => vec![(r.logical_id.clone(), render_pipeline(r, stack))],
        Resource::ArtifactBucket(_)
        | Resource::PipelineArtifact(_)
        | Resource::SourceAction(_)
        | Resource::BuildAction(_) => Vec::new(),
    }
}

fn name_tag(name: &str) -> Json {
    json!([{ "Key": "Name", "Value": name }])
}

fn render_network(r: &Network) -> Vec<(LogicalId, Json)> {
    let vpc_ref = json!({ "Ref": r.logical_id });
    let mut out = vec![
        (
            r.logical_id.clone(),
            cfn(
                "AWS::EC2::VPC",
                json!({
                    "CidrBlock": r.cidr,
                    "EnableDnsHostnames": true,
                    "EnableDnsSupport": true,
                    "Tags": name_tag(&r.name),
                }),
            ),
        ),
        (
            r.internet_gateway_id(),
            cfn("AWS::EC2::InternetGateway", json!({ "Tags": name_tag(&r.name) })),
        ),
        (
            r.gateway_attachment_id(),
            cfn(
                "AWS::EC2::VPCGatewayAttachment",
                json!({
                    "VpcId": vpc_ref,
                    "InternetGatewayId": { "Ref": r.internet_gateway_id() },
                }),
            ),
        ),
        (
            r.public_route_table_id(),
            cfn("AWS::EC2::RouteTable", json!({ "VpcId": vpc_ref })),
        ),
        (
            r.default_route_id(),
            json!({
                "Type": "AWS::EC2::Route",
                "Properties": {
                    "RouteTableId": { "Ref": r.public_route_table_id() },
                    "DestinationCidrBlock": "0.0.0.0/0",
                    "GatewayId": { "Ref": r.internet_gateway_id() },
                },
                "DependsOn": [r.gateway_attachment_id()],
            }),
        ),
    ];

    let subnet_ids = r.subnet_ids();
    let subnet_count = subnet_ids.len();
    let mut index = 0;
    for subnet in &r.subnets {
        for az in 0..usize::from(r.max_azs) {
            let Some(id) = subnet_ids.get(index) else {
                break;
            };
            out.push((
                id.clone(),
                cfn(
                    "AWS::EC2::Subnet",
                    json!({
                        "VpcId": vpc_ref,
                        "CidrBlock": { "Fn::Select": [index, {
                            "Fn::Cidr": [
                                { "Fn::GetAtt": [r.logical_id, "CidrBlock"] },
                                subnet_count,
                                32 - u32::from(subnet.cidr_mask),
                            ]
                        }]},
                        "AvailabilityZone": { "Fn::Select": [az, { "Fn::GetAZs": "" }] },
                        "MapPublicIpOnLaunch": true,
                        "Tags": name_tag(&format!("{}-{}-{}", r.name, subnet.name, az + 1)),
                    }),
                ),
            ));
            out.push((
                id.child("RouteTableAssociation"),
                cfn(
                    "AWS::EC2::SubnetRouteTableAssociation",
                    json!({
                        "SubnetId": { "Ref": id },
                        "RouteTableId": { "Ref": r.public_route_table_id() },
                    }),
                ),
            ));
            index += 1;
        }
    }
    out
}

fn render_function(r: &ComputeFunction, stack: &Stack, ctx: &Context) -> Vec<(LogicalId, Json)> {
    let synth = stack.synthesizer();
    let mut properties = json!({
        "FunctionName": r.name,
        "Runtime": r.runtime.as_str(),
        "Handler": r.handler,
        "Role": render_value(&r.role),
        "Code": {
            "S3Bucket": synth.file_assets_bucket_name,
            "S3Key": synth.asset_object_key(&r.code.asset_id, "zip"),
        },
    });
    let mut out = Vec::new();

    if let Some(network) = &r.network {
        let subnet_ids: Vec<Json> = network.subnet_ids.iter().map(render_value).collect();
        properties["VpcConfig"] = json!({
            "SubnetIds": subnet_ids,
            "SecurityGroupIds": [{ "Fn::GetAtt": [r.security_group_id(), "GroupId"] }],
        });
        out.push((
            r.security_group_id(),
            cfn(
                "AWS::EC2::SecurityGroup",
                json!({
                    "GroupDescription": format!("Automatic security group for {}", r.name),
                    "VpcId": render_value(&network.vpc_id),
                    "SecurityGroupEgress": [{ "CidrIp": "0.0.0.0/0", "IpProtocol": "-1" }],
                }),
            ),
        ));
    }

    out.insert(
        0,
        (
            r.logical_id.clone(),
            json!({
                "Type": "AWS::Lambda::Function",
                "Properties": properties,
                "Metadata": {
                    "aws:asset:path": r.code.path,
                    "aws:asset:property": "Code",
                    "aws:asset:account": ctx.account_id(),
                },
            }),
        ),
    );
    out
}

fn render_gateway(r: &HttpGateway) -> Vec<(LogicalId, Json)> {
    let api = json!({ "Ref": r.logical_id });
    let root = json!({ "Fn::GetAtt": [r.logical_id, "RootResourceId"] });
    let integration = json!({
        "Type": "AWS_PROXY",
        "IntegrationHttpMethod": "POST",
        "Uri": { "Fn::Join": ["", [
            "arn:",
            { "Ref": "AWS::Partition" },
            ":apigateway:",
            { "Ref": "AWS::Region" },
            ":lambda:path/2015-03-31/functions/",
            render_value(&r.trigger.function_arn),
            "/invocations",
        ]]},
    });
    let method = |resource_id: Json| {
        cfn(
            "AWS::ApiGateway::Method",
            json!({
                "RestApiId": api,
                "ResourceId": resource_id,
                "HttpMethod": "ANY",
                "AuthorizationType": "NONE",
                "Integration": integration,
            }),
        )
    };

    let root_method = r.logical_id.child(HttpGateway::ROOT_METHOD);
    let mut methods = vec![root_method.clone()];
    let mut out = vec![
        (
            r.logical_id.clone(),
            cfn("AWS::ApiGateway::RestApi", json!({ "Name": r.name })),
        ),
        (root_method, method(root.clone())),
    ];

    if r.trigger.proxy {
        let proxy = r.logical_id.child(HttpGateway::PROXY_RESOURCE);
        let proxy_method = r.logical_id.child(HttpGateway::PROXY_METHOD);
        out.push((
            proxy.clone(),
            cfn(
                "AWS::ApiGateway::Resource",
                json!({ "RestApiId": api, "ParentId": root, "PathPart": "{proxy+}" }),
            ),
        ));
        out.push((proxy_method.clone(), method(json!({ "Ref": proxy }))));
        methods.push(proxy_method);
    }

    let deployment = r.logical_id.child(HttpGateway::DEPLOYMENT);
    out.push((
        deployment.clone(),
        json!({
            "Type": "AWS::ApiGateway::Deployment",
            "Properties": { "RestApiId": api },
            "DependsOn": methods,
        }),
    ));
    out.push((
        r.logical_id.child(HttpGateway::STAGE),
        cfn(
            "AWS::ApiGateway::Stage",
            json!({
                "RestApiId": api,
                "DeploymentId": { "Ref": deployment },
                "StageName": r.trigger.stage_name,
            }),
        ),
    ));
    out.push((
        r.logical_id.child(HttpGateway::PERMISSION),
        cfn(
            "AWS::Lambda::Permission",
            json!({
                "Action": "lambda:InvokeFunction",
                "FunctionName": render_value(&r.trigger.function_arn),
                "Principal": "apigateway.amazonaws.com",
                "SourceArn": { "Fn::Join": ["", [
                    "arn:",
                    { "Ref": "AWS::Partition" },
                    ":execute-api:",
                    { "Ref": "AWS::Region" },
                    ":",
                    { "Ref": "AWS::AccountId" },
                    ":",
                    api,
                    "/*/*/*",
                ]]},
            }),
        ),
    ));
    out
}

fn render_role(r: &IdentityRole) -> Json {
    match &r.origin {
        RoleOrigin::Declared {
            assumed_by,
            managed_policy_arns,
        } => cfn(
            "AWS::IAM::Role",
            json!({
                "RoleName": r.name,
                "AssumeRolePolicyDocument": {
                    "Version": "2012-10-17",
                    "Statement": [{
                        "Effect": "Allow",
                        "Principal": { "Service": assumed_by },
                        "Action": "sts:AssumeRole",
                    }],
                },
                "ManagedPolicyArns": managed_policy_arns,
            }),
        ),
        RoleOrigin::Imported { arn } => json!({ "Arn": arn }),
    }
}

fn render_policy(r: &IdentityPolicy) -> Json {
    let statements: Vec<Json> = r
        .statements
        .iter()
        .map(|s| {
            let resources: Vec<Json> = s.resources.iter().map(render_value).collect();
            json!({ "Effect": s.effect.as_str(), "Action": s.actions, "Resource": resources })
        })
        .collect();
    let users: Vec<Json> = r.users.iter().map(render_value).collect();
    cfn(
        "AWS::IAM::Policy",
        json!({
            "PolicyName": r.name,
            "PolicyDocument": { "Version": "2012-10-17", "Statement": statements },
            "Users": users,
        }),
    )
}

fn render_user(r: &IdentityUser) -> Json {
    cfn("AWS::IAM::User", json!({ "UserName": r.name }))
}

fn render_access_key(r: &AccessKey) -> Json {
    cfn(
        "AWS::IAM::AccessKey",
        json!({ "UserName": render_value(&r.user) }),
    )
}

fn render_secret(r: &Secret) -> Json {
    let mut properties = json!({ "Name": r.name });
    if let Some(description) = &r.description {
        properties["Description"] = render_value(description);
    }
    if let Some(secret_string) = &r.secret_string {
        properties["SecretString"] = render_value(secret_string);
    }
    cfn("AWS::SecretsManager::Secret", properties)
}

fn render_build_project(r: &BuildProject) -> Json {
    let spec = json!({
        "version": r.build_spec.version,
        "phases": {
            "install": { "commands": r.build_spec.install_commands },
            "build": { "commands": r.build_spec.build_commands },
        },
    });
    cfn(
        "AWS::CodeBuild::Project",
        json!({
            "Name": r.name,
            "Artifacts": { "Type": "CODEPIPELINE" },
            "Source": { "Type": "CODEPIPELINE", "BuildSpec": spec.to_string() },
            "Environment": {
                "Type": "LINUX_CONTAINER",
                "ComputeType": "BUILD_GENERAL1_SMALL",
                "Image": r.image,
            },
        }),
    )
}

fn artifact_name(stack: &Stack, id: &LogicalId) -> Option<String> {
    match stack.resource(id)? {
        Resource::PipelineArtifact(a) => Some(a.artifact_name.clone()),
        _ => None,
    }
}

fn render_source_action(a: &SourceAction, stack: &Stack) -> Json {
    json!({
        "Name": a.action_name,
        "ActionTypeId": {
            "Category": "Source",
            "Owner": "ThirdParty",
            "Provider": "GitHub",
            "Version": "1",
        },
        "Configuration": {
            "Owner": a.owner,
            "Repo": a.repo,
            "Branch": a.branch,
            "OAuthToken": render_value(&a.oauth_token),
            "PollForSourceChanges": false,
        },
        "OutputArtifacts": artifact_name(stack, &a.output)
            .map(|name| vec![json!({ "Name": name })])
            .unwrap_or_default(),
        "RunOrder": 1,
    })
}

fn render_build_action(a: &BuildAction, stack: &Stack) -> Json {
    json!({
        "Name": a.action_name,
        "ActionTypeId": {
            "Category": "Build",
            "Owner": "AWS",
            "Provider": "CodeBuild",
            "Version": "1",
        },
        "Configuration": { "ProjectName": { "Ref": a.project } },
        "InputArtifacts": artifact_name(stack, &a.input)
            .map(|name| vec![json!({ "Name": name })])
            .unwrap_or_default(),
        "RunOrder": 1,
    })
}

fn render_pipeline(r: &Pipeline, stack: &Stack) -> Json {
    let location = match stack.resource(&r.artifact_bucket) {
        Some(Resource::ArtifactBucket(bucket)) => json!(bucket.bucket_name),
        _ => json!({ "Ref": r.artifact_bucket }),
    };
    let stages: Vec<Json> = r
        .stages
        .iter()
        .map(|stage| {
            let actions: Vec<Json> = stage
                .actions
                .iter()
                .filter_map(|id| match stack.resource(id)? {
                    Resource::SourceAction(a) => Some(render_source_action(a, stack)),
                    Resource::BuildAction(a) => Some(render_build_action(a, stack)),
                    _ => None,
                })
                .collect();
            json!({ "Name": stage.name, "Actions": actions })
        })
        .collect();
    cfn(
        "AWS::CodePipeline::Pipeline",
        json!({
            "Name": r.name,
            "ArtifactStore": { "Type": "S3", "Location": location },
            "Stages": stages,
            "RestartExecutionOnUpdate": false,
        }),
    )
}

fn render_assets(stack: &Stack, ctx: &Context) -> Option<Json> {
    let synth = stack.synthesizer();
    let mut files = Map::new();
    for resource in stack.resources() {
        if let Resource::ComputeFunction(f) = resource {
            files.insert(
                f.code.asset_id.clone(),
                json!({
                    "source": { "path": f.code.path, "packaging": "file" },
                    "destinations": {
                        format!("{}-{}", ctx.account_id(), ctx.region()): {
                            "bucketName": synth.file_assets_bucket_name,
                            "objectKey": synth.asset_object_key(&f.code.asset_id, "zip"),
                            "region": ctx.region(),
                            "assumeRoleArn": synth.bootstrap_role_arn(
                                BootstrapRole::FilePublishing, ctx.account_id(), ctx.region()),
                        }
                    },
                }),
            );
        }
    }
    if files.is_empty() {
        return None;
    }
    Some(json!({
        "version": ASSEMBLY_VERSION,
        "files": files,
        "dockerImages": {},
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory;
    use crate::naming::qualify;
    use crate::{Params, Synthesizer};

    fn ctx() -> Context {
        Context::new("dev", "us-east-1", "123456789012", Params::new("q1", "bucket1", "repo1"))
    }

    #[test]
    fn test_imported_declarations_render_as_metadata() {
        let ctx = ctx();
        let mut stack = Stack::new("IbotDevCiStack", Synthesizer::from_params(ctx.params()));
        let role = factory::imported_role(
            LogicalId::new("IbotDevDeployRole"),
            "cdk-q1-deploy-role".to_string(),
            "arn:aws:iam::123456789012:role/cdk-q1-deploy-role".to_string(),
        );
        let user = factory::user(qualify(&ctx, "ci-user"));
        let key = factory::access_key(LogicalId::new("IbotDevCiAccessKey"), &user);
        let secret = factory::access_key_secret(qualify(&ctx, "ci-secret"), &key);
        stack.declare(role);
        stack.declare(user);
        stack.declare(key);
        stack.declare(secret);

        let mut graph = StackGraph::new(&ctx);
        graph.add(stack).unwrap();
        let assembly = Assembly::from_graph(&graph);
        let template = assembly.template("IbotDevCiStack").unwrap();

        assert!(template["Resources"].get("IbotDevDeployRole").is_none());
        assert_eq!(
            template["Metadata"]["ibot:imports"]["IbotDevDeployRole"]["Arn"],
            "arn:aws:iam::123456789012:role/cdk-q1-deploy-role"
        );
        assert_eq!(
            template["Resources"]["IbotDevCiSecret"]["Properties"]["Description"],
            json!({ "Fn::Join": ["", ["Secret access key for ", { "Ref": "IbotDevCiAccessKey" }]] })
        );
        assert!(assembly.files.get("IbotDevCiStack.assets.json").is_none());
        assert_eq!(
            assembly.manifest().unwrap()["artifacts"]["IbotDevCiStack"]["properties"]["assumeRoleArn"],
            "arn:aws:iam::123456789012:role/cdk-q1-deploy-role-123456789012-us-east-1"
        );
    }

    #[test]
    fn test_network_renders_public_subnet_without_nat() {
        let ctx = ctx();
        let mut stack = Stack::new("IbotDevNetworkStack", Synthesizer::from_params(ctx.params()));
        stack.declare(factory::network(qualify(&ctx, "vpc")));
        let mut graph = StackGraph::new(&ctx);
        graph.add(stack).unwrap();

        let assembly = Assembly::from_graph(&graph);
        let resources = assembly.template("IbotDevNetworkStack").unwrap()["Resources"]
            .as_object()
            .unwrap();
        let types: Vec<&str> = resources
            .values()
            .filter_map(|r| r["Type"].as_str())
            .collect();
        assert!(types.contains(&"AWS::EC2::VPC"));
        assert_eq!(types.iter().filter(|t| **t == "AWS::EC2::Subnet").count(), 1);
        assert!(!types.contains(&"AWS::EC2::NatGateway"));
        assert_eq!(
            resources["IbotDevVpcPublicSubnet1"]["Properties"]["MapPublicIpOnLaunch"],
            true
        );
    }

    #[test]
    fn test_render_values() {
        assert_eq!(render_value(&Value::literal("x")), json!("x"));
        assert_eq!(
            render_value(&Value::Ref(LogicalId::new("Vpc"))),
            json!({ "Ref": "Vpc" })
        );
        assert_eq!(
            render_value(&Value::get_att(&LogicalId::new("Key"), "SecretAccessKey")),
            json!({ "Fn::GetAtt": ["Key", "SecretAccessKey"] })
        );
        assert_eq!(
            render_value(&Value::Import("A:B".to_string())),
            json!({ "Fn::ImportValue": "A:B" })
        );
    }

    #[test]
    fn test_render_secret_string() {
        let value = Value::SecretString(Box::new(Value::Import("Repo:Token".to_string())));
        assert_eq!(
            render_value(&value),
            json!({ "Fn::Join": ["", [
                "{{resolve:secretsmanager:",
                { "Fn::ImportValue": "Repo:Token" },
                ":SecretString:::}}",
            ]]})
        );
    }
}
