use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "litsweep",
    version,
    about = "Grid-sweep evaluation of sentence-to-literal adaptation"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the full sweep over every domain under the tests root.
    Sweep(SweepArgs),
    /// Report discovered domains and their corpus sizes.
    List(ListArgs),
    /// Report persisted sweep output and the latest run manifest.
    Status(StatusArgs),
}

#[derive(Args, Debug, Clone)]
pub struct SweepArgs {
    #[arg(long, default_value = "input_tests")]
    pub tests_root: PathBuf,

    #[arg(long, default_value = "output")]
    pub output_root: PathBuf,

    #[arg(long, default_value = "http://localhost:11434")]
    pub backend_url: String,

    /// Deadline for each backend round-trip.
    #[arg(long, default_value_t = 120_000)]
    pub timeout_ms: u64,
}

#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    #[arg(long, default_value = "input_tests")]
    pub tests_root: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long, default_value = "output")]
    pub output_root: PathBuf,
}
