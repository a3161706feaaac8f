//! Cloud assembly synthesis command.

use anyhow::{Context, Result, bail};
use ibot_core::render::Assembly;
use std::path::Path;
use tracing::{debug, info};

use super::build_graph;
use crate::TargetArgs;

/// Build the graph and write its assembly to `out`.
///
/// Nothing is written unless the whole graph builds.
pub async fn synth(target: &TargetArgs, profile: Option<String>, out: &Path) -> Result<()> {
    let graph = build_graph(target, profile).await?;
    let assembly = Assembly::from_graph(&graph);
    write_assembly(&assembly, out)?;

    for stack in graph.stacks() {
        println!("✓ {} ({} declarations)", stack.id(), stack.resources().len());
    }
    println!("Wrote {} files to {}", assembly.files.len(), out.display());
    Ok(())
}

/// Write the assembly to `out`, replacing any earlier assembly there.
///
/// Files are staged in a sibling temporary directory and moved into place
/// once all of them are written, so `out` never holds a partial assembly.
pub fn write_assembly(assembly: &Assembly, out: &Path) -> Result<()> {
    if out.file_name().is_none() {
        bail!("Output path must name a directory: {}", out.display());
    }
    let parent = match out.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)
        .with_context(|| format!("Failed to create output directory: {}", parent.display()))?;

    let staging = tempfile::Builder::new()
        .prefix(".ibot-assembly-")
        .tempdir_in(parent)
        .with_context(|| format!("Failed to create staging directory in {}", parent.display()))?;
    for (file, document) in &assembly.files {
        let path = staging.path().join(file);
        let content = serde_json::to_string_pretty(document)?;
        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        debug!(file = %file, "staged");
    }

    if out.exists() {
        if !is_replaceable(out)? {
            bail!(
                "Refusing to replace {}: not an empty directory or cloud assembly",
                out.display()
            );
        }
        std::fs::remove_dir_all(out)
            .with_context(|| format!("Failed to remove previous assembly: {}", out.display()))?;
    }
    std::fs::rename(staging.path(), out)
        .with_context(|| format!("Failed to move assembly into {}", out.display()))?;
    info!(path = %out.display(), files = assembly.files.len(), "wrote assembly");
    Ok(())
}

fn is_replaceable(out: &Path) -> Result<bool> {
    if !out.is_dir() {
        return Ok(false);
    }
    if out.join("manifest.json").is_file() {
        return Ok(true);
    }
    let mut entries = std::fs::read_dir(out)
        .with_context(|| format!("Failed to read {}", out.display()))?;
    Ok(entries.next().is_none())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ibot_config::ProjectConfig;
    use ibot_core::{Context as SynthContext, Params};
    use ibot_stacks::StackGraphBuilder;

    #[test]
    fn test_write_assembly() {
        let ctx = SynthContext::new("dev", "us-east-1", "123456789012", Params::new("q1", "bucket1", "repo1"));
        let project = ProjectConfig::default();
        let graph = StackGraphBuilder::new(&ctx, &project).build().unwrap();
        let assembly = Assembly::from_graph(&graph);

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("cdk.out");
        write_assembly(&assembly, &out).unwrap();

        let manifest = read_json(&out.join("manifest.json"));
        assert_eq!(
            manifest["artifacts"]["IbotDevApiStack"]["environment"],
            "aws://123456789012/us-east-1"
        );
        assert!(out.join("IbotDevApiStack.template.json").exists());
        assert!(out.join("IbotDevApiStack.assets.json").exists());
        assert!(!out.join("IbotDevCiStack.assets.json").exists());
    }

    #[test]
    fn test_rewrite_drops_stale_files() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("cdk.out");
        write_assembly(&assembly(&ProjectConfig::default()), &out).unwrap();
        std::fs::write(out.join("IbotProdApiStack.template.json"), "{}").unwrap();

        write_assembly(&assembly(&ProjectConfig::default()), &out).unwrap();
        assert!(!out.join("IbotProdApiStack.template.json").exists());
        assert!(out.join("manifest.json").exists());

        // No staging directories left beside the output.
        let siblings: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(siblings.len(), 1);
    }

    #[test]
    fn test_refuses_to_replace_unrelated_directory() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("src");
        std::fs::create_dir(&out).unwrap();
        std::fs::write(out.join("main.rs"), "fn main() {}").unwrap();

        assert!(write_assembly(&assembly(&ProjectConfig::default()), &out).is_err());
        assert!(out.join("main.rs").exists());
    }

    #[test]
    fn test_asset_path_resolves_from_output_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join(".build")).unwrap();
        std::fs::write(dir.path().join(".build/api.zip"), b"zip").unwrap();

        let mut project = ProjectConfig::default();
        project.build_dir = ".build".to_string();
        project.resolve_build_dir(dir.path());

        let out = dir.path().join("cdk.out");
        write_assembly(&assembly(&project), &out).unwrap();

        let assets = read_json(&out.join("IbotDevApiStack.assets.json"));
        let files = assets["files"].as_object().unwrap();
        assert_eq!(files.len(), 1);
        let source = files.values().next().unwrap()["source"]["path"].as_str().unwrap();
        assert!(out.join(source).is_file(), "{source}");
    }

    fn assembly(project: &ProjectConfig) -> Assembly {
        let ctx = SynthContext::new("dev", "us-east-1", "123456789012", Params::new("q1", "bucket1", "repo1"));
        let graph = StackGraphBuilder::new(&ctx, project).build().unwrap();
        Assembly::from_graph(&graph)
    }

    fn read_json(path: &Path) -> serde_json::Value {
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
    }
}
