//! ibot CLI tool.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod identity;

#[derive(Parser)]
#[command(name = "ibot")]
#[command(about = "Synthesize ibot infrastructure stacks", long_about = None)]
struct Cli {
    /// Log level or filter directive
    #[arg(long, env = "LOG_LEVEL", default_value = "info", global = true)]
    log_level: String,

    /// AWS profile used to resolve the account
    #[arg(long, env = "AWS_PROFILE", global = true)]
    profile: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Which environment to synthesize and where its inputs live.
#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
    /// Environment name (e.g., dev, prod)
    #[arg(long, env = "IBOT_ENV")]
    pub env: String,

    /// Target region
    #[arg(long, env = "AWS_REGION")]
    pub region: String,

    /// Directory holding params-{env}.json
    #[arg(long, default_value = "bootstrap")]
    pub bootstrap_dir: PathBuf,

    /// Project settings file (KDL)
    #[arg(long)]
    pub project: Option<PathBuf>,

    /// Use this account id instead of looking it up
    #[arg(long)]
    pub account_id: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build every stack and write the cloud assembly
    Synth {
        #[command(flatten)]
        target: TargetArgs,
        /// Output directory
        #[arg(long, default_value = "cdk.out")]
        out: PathBuf,
    },
    /// List stacks in build order with their dependencies
    List {
        #[command(flatten)]
        target: TargetArgs,
    },
    /// Print the qualified forms of logical names
    Names {
        /// Environment name
        #[arg(long, env = "IBOT_ENV")]
        env: String,
        /// Logical names (e.g., api-lambda)
        #[arg(required = true)]
        names: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Synth { target, out } => {
            commands::synth(&target, cli.profile, &out).await?;
        }
        Commands::List { target } => {
            commands::list(&target, cli.profile).await?;
        }
        Commands::Names { env, names } => {
            commands::names(&env, &names)?;
        }
    }

    Ok(())
}
