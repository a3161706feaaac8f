//! Stack graph assembly for ibot.
//!
//! Stacks are built in a fixed order, each step returning typed handles
//! that later steps consume:
//!
//! 1. network  - single-AZ VPC, exports the VPC and subnet ids
//! 2. ci       - deploy user allowed to assume the bootstrap roles
//! 3. repo     - placeholder secret for the source access token
//! 4. pipeline - source + build pipeline, imports the token secret
//! 5. serving  - function and HTTP gateway, imports the network

pub mod builder;
pub mod ci;
pub mod error;
pub mod network;
pub mod pipeline;
pub mod repo;
pub mod serving;
pub mod synth;

pub use builder::StackGraphBuilder;
pub use error::{Result, SynthError};
pub use synth::{SynthSettings, load_context, synthesize};
