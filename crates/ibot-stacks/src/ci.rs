//! CI credentials stack.
//!
//! Declares a user that may assume the three bootstrap roles, an access
//! key for it, and a secret holding the key's secret half.

use ibot_core::naming::{qualify, qualify_title};
use ibot_core::resource::{IdentityRole, LogicalId};
use ibot_core::synthesizer::BootstrapRole;
use ibot_core::{Context, Stack, Synthesizer, factory};

/// Declarations of the CI stack other code may want to inspect.
#[derive(Debug, Clone)]
pub struct CiOutputs {
    pub roles: Vec<LogicalId>,
    pub policy: LogicalId,
    pub user: LogicalId,
    pub access_key: LogicalId,
    pub secret: LogicalId,
}

pub fn build(ctx: &Context, synthesizer: Synthesizer) -> (Stack, CiOutputs) {
    let roles: Vec<IdentityRole> = BootstrapRole::ALL
        .iter()
        .map(|&role| {
            factory::imported_role(
                LogicalId::new(qualify_title(ctx, &format!("{role}-role"))),
                synthesizer.bootstrap_role_name(role, ctx.account_id(), ctx.region()),
                synthesizer.bootstrap_role_arn(role, ctx.account_id(), ctx.region()),
            )
        })
        .collect();

    let user = factory::user(qualify(ctx, "ci-user"));
    let role_refs: Vec<&IdentityRole> = roles.iter().collect();
    let policy = factory::policy(
        qualify(ctx, "ci-policy"),
        vec![factory::assume_roles_statement(&role_refs)],
        &[&user],
    );
    let access_key = factory::access_key(LogicalId::new(qualify_title(ctx, "ci-access-key")), &user);
    let secret = factory::access_key_secret(qualify(ctx, "ci-secret"), &access_key);

    let outputs = CiOutputs {
        roles: roles.iter().map(|r| r.logical_id.clone()).collect(),
        policy: policy.logical_id.clone(),
        user: user.logical_id.clone(),
        access_key: access_key.logical_id.clone(),
        secret: secret.logical_id.clone(),
    };

    let mut stack = Stack::new(qualify_title(ctx, "ci-stack"), synthesizer)
        .with_description(format!("ibot {} CI credentials", ctx.env()));
    for role in roles {
        stack.declare(role);
    }
    stack.declare(user);
    stack.declare(policy);
    stack.declare(access_key);
    stack.declare(secret);

    (stack, outputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ibot_core::resource::Value;
    use ibot_core::{Params, Resource};

    fn ctx() -> Context {
        Context::new("dev", "us-east-1", "123456789012", Params::new("q1", "bucket1", "repo1"))
    }

    #[test]
    fn test_policy_grants_exactly_bootstrap_roles() {
        let (stack, outputs) = build(&ctx(), Synthesizer::from_params(ctx().params()));
        let Some(Resource::IdentityPolicy(policy)) = stack.resource(&outputs.policy) else {
            panic!("policy missing");
        };
        assert_eq!(policy.statements.len(), 1);
        let expected: Vec<Value> = ["deploy", "file-publishing", "lookup"]
            .iter()
            .map(|kind| {
                Value::literal(format!(
                    "arn:aws:iam::123456789012:role/cdk-q1-{kind}-role-123456789012-us-east-1"
                ))
            })
            .collect();
        assert_eq!(policy.statements[0].resources, expected);
        assert_eq!(policy.users, vec![Value::Ref(outputs.user.clone())]);
    }

    #[test]
    fn test_secret_describes_access_key() {
        let (stack, outputs) = build(&ctx(), Synthesizer::from_params(ctx().params()));
        let Some(Resource::Secret(secret)) = stack.resource(&outputs.secret) else {
            panic!("secret missing");
        };
        assert_eq!(secret.name, "ibot-dev-ci-secret");
        let description = secret.description.as_ref().unwrap();
        assert_eq!(description.local_refs(), vec![&outputs.access_key]);
        assert_eq!(stack.exports().len(), 0);
    }

    #[test]
    fn test_roles_are_imported() {
        let (stack, outputs) = build(&ctx(), Synthesizer::from_params(ctx().params()));
        assert_eq!(outputs.roles.len(), 3);
        for id in &outputs.roles {
            assert!(stack.resource(id).unwrap().is_imported());
        }
        assert_eq!(outputs.roles[0].as_str(), "IbotDevDeployRole");
    }
}
