//! Project settings parsing.
//!
//! ```kdl
//! source owner="acme" repo="ibot"
//! component "api"
//! build-dir "../../.build"
//! runtime "python3.9"
//! build-image "aws/codebuild/standard:5.0"
//! install "pip install -r requirements.txt"
//! build "make build"
//! ```
//!
//! Every node is optional; missing ones keep their defaults.

use crate::{ConfigError, ConfigResult};
use ibot_core::resource::Runtime;
use kdl::{KdlDocument, KdlNode};
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

// Dash-separated lowercase segments, so `title` yields a valid logical id.
static COMPONENT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z][a-z0-9]*(-[a-z0-9]+)*$").unwrap());

/// Settings describing what is deployed and where its source lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectConfig {
    /// Source repository owner.
    pub source_owner: String,
    /// Source repository name.
    pub source_repo: String,
    /// Logical name of the served component (e.g., "api").
    pub component: String,
    /// Directory holding `{component}.zip` build artifacts.
    pub build_dir: String,
    pub runtime: Runtime,
    pub build_image: String,
    pub install_commands: Vec<String>,
    pub build_commands: Vec<String>,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            source_owner: "ibot".to_string(),
            source_repo: "ibot".to_string(),
            component: "api".to_string(),
            build_dir: "../../.build".to_string(),
            runtime: Runtime::Python39,
            build_image: "aws/codebuild/standard:5.0".to_string(),
            install_commands: vec!["echo install".to_string()],
            build_commands: vec!["echo build".to_string()],
        }
    }
}

impl ProjectConfig {
    /// Read and parse a project file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        parse_project(&content)
    }

    /// Anchor a relative `build_dir` at `base`.
    ///
    /// Asset manifests are read relative to the output directory, so the
    /// artifact path must not depend on where synthesis ran.
    pub fn resolve_build_dir(&mut self, base: &Path) {
        let dir = Path::new(&self.build_dir);
        if dir.is_relative() {
            self.build_dir = base.join(dir).to_string_lossy().into_owned();
        }
    }
}

/// Parse project settings from KDL text.
pub fn parse_project(kdl: &str) -> ConfigResult<ProjectConfig> {
    let doc: KdlDocument = kdl.parse()?;
    let mut config = ProjectConfig::default();
    let mut install = Vec::new();
    let mut build = Vec::new();

    for node in doc.nodes() {
        match node.name().value() {
            "source" => {
                config.source_owner = get_string_prop(node, "owner")
                    .ok_or_else(|| ConfigError::MissingField("source owner".to_string()))?;
                config.source_repo = get_string_prop(node, "repo")
                    .ok_or_else(|| ConfigError::MissingField("source repo".to_string()))?;
            }
            "component" => {
                config.component = required_arg(node, "component")?;
            }
            "build-dir" | "build_dir" => {
                config.build_dir = required_arg(node, "build-dir")?;
            }
            "runtime" => {
                let runtime = required_arg(node, "runtime")?;
                config.runtime = runtime.parse().map_err(|_| ConfigError::InvalidValue {
                    field: "runtime".to_string(),
                    message: format!("unknown runtime: {}", runtime),
                })?;
            }
            "build-image" | "build_image" => {
                config.build_image = required_arg(node, "build-image")?;
            }
            "install" => install.extend(get_all_string_args(node)),
            "build" => build.extend(get_all_string_args(node)),
            _ => {} // Ignore unknown nodes
        }
    }

    if !install.is_empty() {
        config.install_commands = install;
    }
    if !build.is_empty() {
        config.build_commands = build;
    }
    if !COMPONENT_REGEX.is_match(&config.component) {
        return Err(ConfigError::InvalidValue {
            field: "component".to_string(),
            message: format!(
                "'{}' must be lowercase letters and digits separated by single dashes",
                config.component
            ),
        });
    }

    Ok(config)
}

fn required_arg(node: &KdlNode, field: &str) -> ConfigResult<String> {
    get_first_string_arg(node).ok_or_else(|| ConfigError::MissingField(field.to_string()))
}

// Helper functions for extracting values from KDL nodes

fn get_first_string_arg(node: &KdlNode) -> Option<String> {
    node.entries()
        .iter()
        .find(|e| e.name().is_none())
        .and_then(|e| e.value().as_string())
        .map(|s| s.to_string())
}

fn get_all_string_args(node: &KdlNode) -> Vec<String> {
    node.entries()
        .iter()
        .filter(|e| e.name().is_none())
        .filter_map(|e| e.value().as_string())
        .map(|s| s.to_string())
        .collect()
}

fn get_string_prop(node: &KdlNode, name: &str) -> Option<String> {
    node.get(name)
        .and_then(|v| v.as_string())
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_project() {
        let kdl = r#"
            source owner="acme" repo="ibot"
            component "api"
            build-dir "../.build"
            runtime "python3.12"
            build-image "aws/codebuild/standard:7.0"
            install "pip install -r requirements.txt"
            build "make zip" "make test"
        "#;

        let config = parse_project(kdl).unwrap();
        assert_eq!(config.source_owner, "acme");
        assert_eq!(config.source_repo, "ibot");
        assert_eq!(config.build_dir, "../.build");
        assert_eq!(config.runtime, Runtime::Python312);
        assert_eq!(config.build_image, "aws/codebuild/standard:7.0");
        assert_eq!(config.install_commands, vec!["pip install -r requirements.txt"]);
        assert_eq!(config.build_commands, vec!["make zip", "make test"]);
    }

    #[test]
    fn test_empty_project_keeps_defaults() {
        assert_eq!(parse_project("").unwrap(), ProjectConfig::default());
    }

    #[test]
    fn test_source_requires_repo() {
        let result = parse_project(r#"source owner="acme""#);
        assert!(matches!(result, Err(ConfigError::MissingField(_))));
    }

    #[test]
    fn test_unknown_runtime() {
        let result = parse_project(r#"runtime "cobol""#);
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_component_must_be_dash_case() {
        for component in ["my_api", "", "Api", "2api", "api-", "my--api", "my api"] {
            let kdl = format!("component \"{component}\"");
            assert!(
                matches!(parse_project(&kdl), Err(ConfigError::InvalidValue { .. })),
                "{component}"
            );
        }
        let config = parse_project(r#"component "my-api2""#).unwrap();
        assert_eq!(config.component, "my-api2");
    }

    #[test]
    fn test_resolve_build_dir() {
        let mut config = ProjectConfig::default();
        config.build_dir = ".build".to_string();
        config.resolve_build_dir(Path::new("/work/ibot"));
        assert_eq!(config.build_dir, "/work/ibot/.build");

        config.resolve_build_dir(Path::new("/elsewhere"));
        assert_eq!(config.build_dir, "/work/ibot/.build");
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(parse_project("source {"), Err(ConfigError::Kdl(_))));
    }
}
