//! Stagecraft CLI - stage-qualified configuration composer

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};
use stagecraft::core::manifest::ManifestError;
use stagecraft::util::diagnostic::{emit, suggestions, Diagnostic};
use stagecraft::util::GlobalContext;
use stagecraft::ComposeError;

fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("stagecraft=debug")
    } else {
        EnvFilter::new("stagecraft=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let mut ctx = match GlobalContext::new() {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("error: {:#}", e);
            std::process::exit(1);
        }
    };
    if cli.no_color {
        ctx.set_color(false);
    }

    if let Err(e) = run(cli.command, &ctx) {
        report(&e, ctx.color());
        std::process::exit(1);
    }
}

fn run(command: Commands, ctx: &GlobalContext) -> Result<()> {
    match command {
        Commands::Init(args) => commands::init::execute(args, ctx),
        Commands::Build(args) => commands::build::execute(args, ctx),
        Commands::Env(args) => commands::env::execute(args, ctx),
        Commands::Policy(args) => commands::policy::execute(args, ctx),
        Commands::Outputs(args) => commands::outputs::execute(args, ctx),
        Commands::Imports(args) => commands::imports::execute(args, ctx),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}

fn report(error: &anyhow::Error, color: bool) {
    if let Some(err) = error.downcast_ref::<ComposeError>() {
        emit(&err.to_diagnostic(), color);
    } else if let Some(err) = error.downcast_ref::<ManifestError>() {
        emit(
            &Diagnostic::error(err.to_string()).with_suggestion(suggestions::NO_MANIFEST),
            color,
        );
    } else {
        eprintln!("error: {:#}", error);
    }
}
