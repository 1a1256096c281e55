use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "reportcheck",
    version,
    about = "Validate report structure against section templates"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the available section templates
    Templates(TemplatesArgs),
    /// Extract heading candidates from a structured document
    Extract(ExtractArgs),
    /// Check a document against a named template
    Check(CheckArgs),
}

#[derive(Args, Debug, Clone)]
pub struct TemplatesArgs {
    #[arg(long)]
    pub templates_path: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ExtractArgs {
    #[arg(long)]
    pub document: PathBuf,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct CheckArgs {
    #[arg(long)]
    pub document: PathBuf,

    #[arg(long)]
    pub template: String,

    #[arg(long)]
    pub templates_path: Option<PathBuf>,

    #[arg(long, default_value = "http://localhost:11434")]
    pub llm_url: String,

    #[arg(long, default_value = "tinyllama")]
    pub llm_model: String,

    #[arg(long, default_value_t = false)]
    pub no_llm: bool,

    #[arg(long, default_value_t = false)]
    pub no_spelling: bool,

    #[arg(long)]
    pub report_path: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}
