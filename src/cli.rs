use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mcd")]
#[command(version)]
#[command(about = "Apply machine configs to this node", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Daemon config file
    #[arg(long, global = true, env = "MCD_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Check whether a config transition can be applied in place
    Check(CheckArgs),

    /// Show the file and unit changes a config would make
    Diff(DiffArgs),

    /// Apply a new config and reboot into it
    Update(UpdateArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// The two configs of a transition
#[derive(Args)]
pub struct Snapshots {
    /// Currently applied MachineConfig (JSON)
    #[arg(long)]
    pub old: PathBuf,

    /// Desired MachineConfig (JSON)
    #[arg(long)]
    pub new: PathBuf,
}

#[derive(Args)]
pub struct CheckArgs {
    #[command(flatten)]
    pub snapshots: Snapshots,

    /// Run without a cluster (allows a first-boot empty old config)
    #[arg(long)]
    pub once: bool,
}

#[derive(Args)]
pub struct DiffArgs {
    #[command(flatten)]
    pub snapshots: Snapshots,

    /// Print the diff as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct UpdateArgs {
    #[command(flatten)]
    pub snapshots: Snapshots,

    /// Run without a cluster: no drain, events go to the log
    #[arg(long)]
    pub once: bool,

    /// Show what would change without touching the node
    #[arg(long)]
    pub dry_run: bool,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Node name
    #[arg(long, env = "NODE_NAME")]
    pub node: Option<String>,
}
