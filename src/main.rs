mod cli;
mod commands;
mod compare;
mod extract;
mod lexicon;
mod llm;
mod model;
mod normalize;
mod reader;
mod util;

use anyhow::Result;
use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::lexicon::Lexicon;

fn main() {
    init_tracing();

    if let Err(err) = run() {
        error!(error = %err, "command failed");
        for cause in err.chain().skip(1) {
            error!(cause = %cause, "caused by");
        }
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let lexicon = Lexicon::builtin();

    match cli.command {
        Commands::Templates(args) => commands::templates::run(args),
        Commands::Extract(args) => commands::extract::run(args, &lexicon),
        Commands::Check(args) => commands::check::run(args, &lexicon),
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
