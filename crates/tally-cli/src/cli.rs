use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tally_types::EntityKind;

#[derive(Parser)]
#[command(
    name = "tally",
    about = "Tally: purchase, sale and stock records on a versioned ledger",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Ledger journal file. Without one, state lives only for this process.
    #[arg(long, global = true)]
    pub journal: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run one chaincode function
    Invoke(InvokeArgs),
    /// Show every recorded version of a record
    History(HistoryArgs),
    /// Start the HTTP host
    Serve(ServeArgs),
}

#[derive(Args)]
pub struct InvokeArgs {
    /// purchase, sale or store
    pub kind: EntityKind,
    /// create, query, update, delete or getHistory
    pub function: String,
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

#[derive(Args)]
pub struct HistoryArgs {
    pub kind: EntityKind,
    /// Tenant (company) id
    pub tenant: String,
    /// Order id or spec id
    pub local: String,
}

#[derive(Args)]
pub struct ServeArgs {
    /// TOML server configuration
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Overrides `bind_addr` from the configuration
    #[arg(long)]
    pub bind: Option<SocketAddr>,
}
