//! Network stack.

use ibot_core::naming::{qualify, qualify_title};
use ibot_core::resource::Value;
use ibot_core::{Context, ImportHandle, Stack, Synthesizer, factory};

/// Handles published by the network stack.
#[derive(Debug, Clone)]
pub struct NetworkOutputs {
    pub vpc_id: ImportHandle,
    pub public_subnet_ids: Vec<ImportHandle>,
}

pub fn build(ctx: &Context, synthesizer: Synthesizer) -> (Stack, NetworkOutputs) {
    let mut stack = Stack::new(qualify_title(ctx, "network-stack"), synthesizer)
        .with_description(format!("ibot {} network", ctx.env()));

    let vpc = factory::network(qualify(ctx, "vpc"));
    let vpc_id = stack.export("VpcId", Value::Ref(vpc.logical_id.clone()));
    let public_subnet_ids = vpc
        .subnet_ids()
        .into_iter()
        .enumerate()
        .map(|(i, id)| stack.export(&format!("PublicSubnet{}Id", i + 1), Value::Ref(id)))
        .collect();
    stack.declare(vpc);

    (
        stack,
        NetworkOutputs {
            vpc_id,
            public_subnet_ids,
        },
    )
}
