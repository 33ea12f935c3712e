use clap::{CommandFactory, Parser, Subcommand, ValueHint};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Convert CYME network models to GridLAB-D", long_about = None)]
pub struct Cli {
    /// Set the logging level
    #[arg(long, default_value = "info", global = true)]
    pub log_level: tracing::Level,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Convert the networks of a CYME table export to GLM models
    Convert(ConvertArgs),
    /// List the CYME tables a conversion reads
    Tables {
        /// Mark which tables are present in this export directory
        #[arg(long, value_hint = ValueHint::DirPath)]
        data: Option<PathBuf>,
    },
    /// Generate shell completion scripts
    Completions {
        /// Shell type
        #[arg(value_enum)]
        shell: Shell,
        /// Write output to a file instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

#[derive(clap::Args, Debug)]
pub struct ConvertArgs {
    /// Directory with one CSV file per CYME table
    #[arg(long, value_hint = ValueHint::DirPath)]
    pub data: PathBuf,
    /// Directory the GLM models are written to
    #[arg(short, long, value_hint = ValueHint::DirPath)]
    pub output: PathBuf,
    /// TOML conversion settings
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,
    /// Directory modification files are read from (defaults to the
    /// directory of the config file)
    #[arg(long, value_hint = ValueHint::DirPath)]
    pub input: Option<PathBuf>,
    /// Also write a Graphviz network map per network
    #[arg(long)]
    pub dot: bool,
    /// Write the run summary and diagnostics as JSON
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub report: Option<PathBuf>,
}

pub fn build_cli_command() -> clap::Command {
    Cli::command()
}
