//! Serving stack: the component's function behind an HTTP gateway.

use ibot_config::ProjectConfig;
use ibot_core::factory::{self, FunctionProps};
use ibot_core::naming::{qualify, qualify_title};
use ibot_core::resource::NetworkAttachment;
use ibot_core::{Context, Stack, Synthesizer};

use crate::network::NetworkOutputs;

pub const LAMBDA_SERVICE: &str = "lambda.amazonaws.com";
pub const BASIC_EXECUTION_POLICY: &str =
    "arn:aws:iam::aws:policy/service-role/AWSLambdaBasicExecutionRole";
pub const VPC_ACCESS_POLICY: &str =
    "arn:aws:iam::aws:policy/service-role/AWSLambdaVPCAccessExecutionRole";

pub fn build(
    ctx: &Context,
    synthesizer: Synthesizer,
    project: &ProjectConfig,
    network: &NetworkOutputs,
) -> Stack {
    let component = project.component.as_str();

    let role = factory::service_role(
        qualify(ctx, &format!("{component}-role")),
        LAMBDA_SERVICE,
        vec![
            BASIC_EXECUTION_POLICY.to_string(),
            VPC_ACCESS_POLICY.to_string(),
        ],
    );
    let function = factory::compute_function(
        qualify(ctx, &format!("{component}-lambda")),
        FunctionProps {
            runtime: project.runtime,
            code: factory::code_asset(&project.build_dir, component),
            handler: factory::handler(component),
            role: role.arn(),
            network: Some(NetworkAttachment {
                vpc_id: network.vpc_id.value(),
                subnet_ids: network.public_subnet_ids.iter().map(|h| h.value()).collect(),
            }),
        },
    );
    let gateway = factory::http_gateway(qualify(ctx, &format!("{component}-gateway")), &function);

    let mut stack = Stack::new(qualify_title(ctx, &format!("{component}-stack")), synthesizer)
        .with_description(format!("ibot {} {} service", ctx.env(), component));
    stack.declare(role);
    stack.declare(function);
    stack.declare(gateway);
    stack
}
