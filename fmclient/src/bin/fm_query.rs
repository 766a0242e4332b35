//! Run a find against one layout and print the decoded records as JSON.
//!
//! Connection settings come from `FILEMAKER_*` environment variables or a
//! configuration file; the query comes from the command line.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::ffi::OsString;
use std::io::{self, Write};
use std::sync::Arc;

use clap::Parser;
use fmclient::domain::ports::ResultSetClient;
use fmclient::domain::{Action, Command, Range, Search};
use fmclient::outbound::http::{ConnectionSettings, HttpConnection};
use fmclient::outbound::result_set::XmlResultSetClient;
use ortho_config::OrthoConfig;
use tokio::runtime::Builder;
use tracing::{debug, warn};
use tracing_subscriber::{EnvFilter, fmt};

/// `fm-query` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "fm-query",
    about = "Find records on a FileMaker layout and print them as JSON",
    version
)]
struct CliArgs {
    /// Layout to search.
    #[arg(long, value_name = "name")]
    layout: String,
    /// Search criterion as `field=value`; repeat for several fields.
    #[arg(long = "find", value_name = "field=value", value_parser = parse_criterion)]
    criteria: Vec<(String, String)>,
    /// Send criteria verbatim instead of escaping search operators.
    #[arg(long)]
    raw: bool,
    /// Maximum number of records to return.
    #[arg(long, value_name = "count")]
    limit: Option<u64>,
    /// Number of records to skip.
    #[arg(long, value_name = "count")]
    skip: Option<u64>,
}

fn main() -> io::Result<()> {
    if let Err(error) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .json()
        .try_init()
    {
        warn!(error = %error, "tracing init failed");
    }

    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|error| io::Error::other(format!("create Tokio runtime: {error}")))?;
    runtime.block_on(async_main())
}

async fn async_main() -> io::Result<()> {
    let args = CliArgs::try_parse().map_err(io::Error::other)?;
    let settings = ConnectionSettings::load_from_iter([OsString::from("fm-query")])
        .map_err(|error| io::Error::other(format!("load settings: {error}")))?;
    let server_time_zone = settings
        .server_time_zone()
        .map_err(|error| io::Error::other(error.to_string()))?;
    let connection = HttpConnection::from_settings(&settings)
        .map_err(|error| io::Error::other(format!("build connection: {error}")))?;
    let client = XmlResultSetClient::new(Arc::new(connection), server_time_zone);

    let command = build_command(&args)?;
    debug!(command = %command, "running query");
    let records = client
        .execute(&command)
        .await
        .map_err(|error| io::Error::other(format!("query failed: {error}")))?;

    let mut stdout = io::stdout().lock();
    for record in records.iter() {
        serde_json::to_writer(&mut stdout, record).map_err(io::Error::other)?;
        writeln!(stdout)?;
    }
    writeln!(
        stdout,
        "fetched={} total_count={}",
        records.len(),
        records.total_count()
    )?;
    Ok(())
}

fn build_command(args: &CliArgs) -> io::Result<Command> {
    let collected: Search = args.criteria.iter().cloned().collect();
    let search = if args.raw { collected.raw() } else { collected };
    let action = if search.is_empty() {
        Action::FindAll
    } else {
        Action::Find
    };

    let mut parameters = search.to_parameters();
    parameters.extend(Range::new(args.limit, args.skip).to_parameters());
    let command = Command::new(args.layout.as_str(), parameters)
        .map_err(|error| io::Error::other(format!("invalid query: {error}")))?;
    Ok(command.with_action(action))
}

fn parse_criterion(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .filter(|(field, _)| !field.is_empty())
        .map(|(field, value)| (field.to_owned(), value.to_owned()))
        .ok_or_else(|| format!("expected field=value, got \"{raw}\""))
}
