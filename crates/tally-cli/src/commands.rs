use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use colored::Colorize;
use serde_json::Value;
use tally_chaincode::{Chaincode, Response};
use tally_ledger::{JournalConfig, LocalLedger};
use tally_server::{InvokeResponse, ServerConfig, TallyServer};
use tally_types::EntityKind;
use tracing::debug;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Invoke(args) => cmd_invoke(cli.journal.as_deref(), cli.format, args),
        Command::History(args) => cmd_history(cli.journal.as_deref(), cli.format, args),
        Command::Serve(args) => cmd_serve(cli.journal, args),
    }
}

fn open_ledger(journal: Option<&Path>) -> anyhow::Result<LocalLedger> {
    match journal {
        Some(path) => LocalLedger::open(path, JournalConfig::default())
            .with_context(|| format!("opening journal {}", path.display())),
        None => {
            debug!("no journal given; ledger is in-memory");
            Ok(LocalLedger::new())
        }
    }
}

/// One invocation in its own ledger transaction.
fn invoke_once(ledger: &LocalLedger, kind: EntityKind, function: &str, args: &[String]) -> Response {
    let tx = ledger.begin();
    debug!(kind = %kind, tx_id = %tx.tx_id(), function, "invoke");
    Chaincode::new(kind).invoke(&tx, function, args)
}

fn cmd_invoke(journal: Option<&Path>, format: OutputFormat, args: InvokeArgs) -> anyhow::Result<()> {
    let ledger = open_ledger(journal)?;
    let response = invoke_once(&ledger, args.kind, &args.function, &args.args);
    report(&response, format, &format!("{} {}", args.kind, args.function))
}

fn cmd_history(journal: Option<&Path>, format: OutputFormat, args: HistoryArgs) -> anyhow::Result<()> {
    let ledger = open_ledger(journal)?;
    let call_args = [args.tenant.clone(), args.local.clone()];
    let response = invoke_once(&ledger, args.kind, "getHistory", &call_args);
    let label = format!("{} history {} {}", args.kind, args.tenant, args.local);
    if format == OutputFormat::Json || !response.is_ok() {
        return report(&response, format, &label);
    }

    let history: Value =
        serde_json::from_slice(&response.payload).context("history payload is not JSON")?;
    let entries = history.as_array().map(Vec::as_slice).unwrap_or_default();
    if entries.is_empty() {
        println!("No history for {} {}.", args.tenant.bold(), args.local.bold());
        return Ok(());
    }

    println!("{} ({} versions)", label.bold(), entries.len());
    for entry in entries {
        let tx_id: String = entry["TxId"].as_str().unwrap_or("?").chars().take(8).collect();
        let timestamp = entry["Timestamp"].as_str().unwrap_or_default();
        let value = if entry["IsDelete"] == "true" {
            "deleted".red().to_string()
        } else {
            entry["Value"].to_string()
        };
        println!("  {}  {}  {}", tx_id.yellow(), timestamp.dimmed(), value);
    }
    Ok(())
}

fn cmd_serve(journal: Option<PathBuf>, args: ServeArgs) -> anyhow::Result<()> {
    let mut config = match &args.config {
        Some(path) => ServerConfig::load(path)?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if journal.is_some() {
        config.journal = journal;
    }

    let server = TallyServer::new(config)?;
    let runtime = tokio::runtime::Runtime::new().context("starting async runtime")?;
    runtime.block_on(server.serve())?;
    Ok(())
}

/// Print `response` and turn a failed invocation into an error.
fn report(response: &Response, format: OutputFormat, label: &str) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&InvokeResponse::from(response))?);
        }
        OutputFormat::Text if response.is_ok() => {
            if response.payload.is_empty() {
                println!("{} {label}", "✓".green().bold());
            } else {
                println!("{}", pretty_payload(&response.payload));
            }
        }
        OutputFormat::Text => {}
    }
    if !response.is_ok() {
        bail!("{} {label}: {}", "✗".red().bold(), response.message);
    }
    Ok(())
}

fn pretty_payload(payload: &[u8]) -> String {
    serde_json::from_slice::<Value>(payload)
        .ok()
        .and_then(|value| serde_json::to_string_pretty(&value).ok())
        .unwrap_or_else(|| String::from_utf8_lossy(payload).into_owned())
}
