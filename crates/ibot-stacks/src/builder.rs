//! Stack graph builder - assembles every stack in dependency order.

use ibot_config::ProjectConfig;
use ibot_core::{Context, StackGraph, Synthesizer};
use tracing::{debug, info};

use crate::{Result, ci, network, pipeline, repo, serving};

/// Builds the full stack graph for one context.
pub struct StackGraphBuilder<'a> {
    ctx: &'a Context,
    project: &'a ProjectConfig,
    /// Built once; every stack gets its own copy.
    synthesizer: Synthesizer,
}

impl<'a> StackGraphBuilder<'a> {
    pub fn new(ctx: &'a Context, project: &'a ProjectConfig) -> Self {
        Self {
            ctx,
            project,
            synthesizer: Synthesizer::from_params(ctx.params()),
        }
    }

    /// Build network, ci, repo, pipeline and serving stacks, in that order.
    ///
    /// Any failure discards the whole graph.
    pub fn build(&self) -> Result<StackGraph> {
        let ctx = self.ctx;
        let mut graph = StackGraph::new(ctx);
        info!(env = ctx.env(), region = ctx.region(), "building stack graph");

        let (stack, network) = network::build(ctx, self.synthesizer.clone());
        self.add(&mut graph, stack)?;

        let (stack, _ci) = ci::build(ctx, self.synthesizer.clone());
        self.add(&mut graph, stack)?;

        let (stack, repo) = repo::build(ctx, self.synthesizer.clone());
        self.add(&mut graph, stack)?;

        let stack = pipeline::build(ctx, self.synthesizer.clone(), self.project, &repo);
        self.add(&mut graph, stack)?;

        let stack = serving::build(ctx, self.synthesizer.clone(), self.project, &network);
        self.add(&mut graph, stack)?;

        info!(stacks = graph.len(), "stack graph complete");
        Ok(graph)
    }

    fn add(&self, graph: &mut StackGraph, stack: ibot_core::Stack) -> Result<()> {
        let id = stack.id().to_string();
        let resources = stack.resources().len();
        graph.add(stack)?;
        debug!(stack = %id, resources, "stack added");
        Ok(())
    }
}
