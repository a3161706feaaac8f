//! Core declaration types for ibot infrastructure synthesis.
//!
//! This crate contains:
//! - The per-run synthesis context and deployment parameters
//! - Resource name qualification
//! - The per-stack asset-publishing synthesizer
//! - Resource declarations and their value expressions
//! - Stacks, cross-stack handles and the write-once stack graph
//! - Rendering of the graph into a cloud assembly

pub mod context;
pub mod error;
pub mod factory;
pub mod graph;
pub mod identity;
pub mod naming;
pub mod render;
pub mod resource;
pub mod stack;
pub mod synthesizer;

pub use context::{Context, Params};
pub use error::{Error, Result};
pub use graph::StackGraph;
pub use resource::{LogicalId, Resource, Value};
pub use stack::{Export, ImportHandle, Stack};
pub use synthesizer::Synthesizer;
