//! Resource name qualification.
//!
//! Every physical name is `ibot-{env}-{name}`; logical ids and stack ids
//! use the title-cased form of the same string.

use crate::Context;
use crate::resource::LogicalId;

/// Prefix shared by every qualified name.
pub const NAME_PREFIX: &str = "ibot";

/// Convert a dash-separated string to its title form.
///
/// Each dash-separated segment gets its first character upper-cased and
/// the dashes are dropped: `ibot-dev-api` becomes `IbotDevApi`. The rest
/// of each segment is left as-is, so an already title-cased string without
/// dashes maps to itself.
pub fn title(dashed: &str) -> String {
    let mut out = String::with_capacity(dashed.len());
    for segment in dashed.split('-') {
        let mut chars = segment.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
        }
    }
    out
}

/// `ibot-{env}`
pub fn prefix_dash(ctx: &Context) -> String {
    prefix_dash_for(ctx.env())
}

/// `ibot-{env}-{name}`
pub fn qualify_dash(ctx: &Context, name: &str) -> String {
    qualify_dash_for(ctx.env(), name)
}

/// Title form of [`qualify_dash`].
pub fn qualify_title(ctx: &Context, name: &str) -> String {
    title(&qualify_dash(ctx, name))
}

/// A name qualified both ways.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QualifiedName {
    /// Dash form, used as the physical name.
    pub name: String,
    /// Title form, used as the logical id.
    pub logical_id: LogicalId,
}

/// Qualify `name` for the context's environment.
pub fn qualify(ctx: &Context, name: &str) -> QualifiedName {
    QualifiedName {
        name: qualify_dash(ctx, name),
        logical_id: LogicalId::new(qualify_title(ctx, name)),
    }
}

/// Same as [`prefix_dash`] when only the env string is at hand.
pub fn prefix_dash_for(env: &str) -> String {
    format!("{NAME_PREFIX}-{env}")
}

/// Same as [`qualify_dash`] when only the env string is at hand.
pub fn qualify_dash_for(env: &str, name: &str) -> String {
    format!("{}-{}", prefix_dash_for(env), name)
}

/// Same as [`qualify_title`] when only the env string is at hand.
pub fn qualify_title_for(env: &str, name: &str) -> String {
    title(&qualify_dash_for(env, name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Params;

    fn ctx(env: &str) -> Context {
        Context::new(env, "us-east-1", "123456789012", Params::new("q1", "bucket1", "repo1"))
    }

    #[test]
    fn test_qualify_dash() {
        for env in ["dev", "prod", "stage2"] {
            for name in ["vpc", "api-lambda", "ci-user"] {
                assert_eq!(qualify_dash(&ctx(env), name), format!("ibot-{env}-{name}"));
            }
        }
    }

    #[test]
    fn test_qualify_title() {
        assert_eq!(qualify_title(&ctx("dev"), "api-stack"), "IbotDevApiStack");
        assert_eq!(qualify_title(&ctx("prod"), "vpc"), "IbotProdVpc");
    }

    #[test]
    fn test_qualify_both_forms() {
        let q = qualify(&ctx("dev"), "api-lambda");
        assert_eq!(q.name, "ibot-dev-api-lambda");
        assert_eq!(q.logical_id.as_str(), "IbotDevApiLambda");
    }

    #[test]
    fn test_title_idempotent_on_title_case() {
        for s in ["IbotDevApiStack", "Vpc", "A"] {
            assert_eq!(title(s), s);
            assert_eq!(title(&title(s)), title(s));
        }
    }

    #[test]
    fn test_title_edge_cases() {
        assert_eq!(title(""), "");
        assert_eq!(title("a--b"), "AB");
        assert_eq!(title("-lead"), "Lead");
    }

    #[test]
    fn test_qualification_is_deterministic() {
        let a = qualify_dash(&ctx("dev"), "api-lambda");
        let b = qualify_dash(&ctx("dev"), "api-lambda");
        assert_eq!(a, b);
        assert_ne!(a, qualify_dash(&ctx("prod"), "api-lambda"));
    }
}
