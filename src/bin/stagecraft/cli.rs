//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

/// Stagecraft - stage-qualified configuration composer for serverless stacks
#[derive(Parser)]
#[command(name = "stagecraft")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a starter project
    Init(InitArgs),

    /// Compose the deployment document for a stage
    Build(BuildArgs),

    /// Print the resolved environment for a stage
    Env(StageArgs),

    /// Print the policy statements for a stage
    Policy(StageArgs),

    /// List the export names of the permanent stack
    Outputs(StageArgs),

    /// List every cross-stack import and whether it resolves
    Imports(StageArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct InitArgs {
    /// Directory to initialize (defaults to the current directory)
    pub path: Option<PathBuf>,

    /// Service name (defaults to the directory name)
    #[arg(long)]
    pub service: Option<String>,
}

#[derive(Args)]
pub struct StageArgs {
    /// Deployment stage, e.g. dev or prod
    #[arg(short, long, env = "STAGECRAFT_STAGE")]
    pub stage: Option<String>,
}

#[derive(Args)]
pub struct BuildArgs {
    #[command(flatten)]
    pub stage: StageArgs,

    /// Write the document to a file instead of stdout
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Emit compact JSON
    #[arg(long)]
    pub compact: bool,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
