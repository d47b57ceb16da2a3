use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "cxo-node",
    about = "CXO node: replicates published object graphs to local storage",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Path to a TOML config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the node daemon
    Start(StartArgs),
    /// Print the effective configuration as TOML
    Config,
}

#[derive(Args, Debug, Default)]
pub struct StartArgs {
    /// Address for the announcement endpoint (overrides `[server] listen_addr`)
    #[arg(long)]
    pub listen: Option<String>,
    /// Storage root directory (overrides `[storage] root`)
    #[arg(long)]
    pub storage: Option<PathBuf>,
    /// Tracker base URL (overrides `[tracker] address`)
    #[arg(long)]
    pub tracker: Option<String>,
}
