//! Source-access stack.

use ibot_core::naming::{qualify, qualify_title};
use ibot_core::resource::Value;
use ibot_core::{Context, ImportHandle, Stack, Synthesizer, factory};

#[derive(Debug, Clone)]
pub struct RepoOutputs {
    /// ARN of the secret meant to hold the source access token.
    pub token_secret: ImportHandle,
}

pub fn build(ctx: &Context, synthesizer: Synthesizer) -> (Stack, RepoOutputs) {
    let mut stack = Stack::new(qualify_title(ctx, "repo-stack"), synthesizer)
        .with_description(format!("ibot {} source access", ctx.env()));

    let secret = factory::placeholder_secret(
        qualify(ctx, "github-token"),
        "Source control access token, set after deployment",
    );
    let token_secret = stack.export("GithubTokenSecretArn", Value::Ref(secret.logical_id.clone()));
    stack.declare(secret);

    (stack, RepoOutputs { token_secret })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ibot_core::{Params, Resource};

    #[test]
    fn test_token_secret_has_no_value() {
        let ctx = Context::new("dev", "us-east-1", "123456789012", Params::new("q1", "b", "r"));
        let (stack, outputs) = build(&ctx, Synthesizer::from_params(ctx.params()));
        let Resource::Secret(secret) = &stack.resources()[0] else {
            panic!("expected a secret");
        };
        assert_eq!(secret.name, "ibot-dev-github-token");
        assert!(secret.secret_string.is_none());
        assert_eq!(outputs.token_secret.stack(), "IbotDevRepoStack");
    }
}
