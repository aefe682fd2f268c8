//! Run and view commands - execute algorithm and view containers

use anyhow::Result;
use clap::Args;
use std::path::Path;
use tabulon::{execute_algorithm, execute_view, Config, Datapackage, DEFAULT_ARGUMENT_SPACE};
use tabulon_runner::DockerRunner;

use crate::cli::error::HelpfulError;

/// Arguments for the `run` command
#[derive(Debug, Args)]
pub struct RunArgs {
    /// Algorithm name (algorithms/<name>.json)
    pub algorithm: String,

    #[arg(long, default_value = DEFAULT_ARGUMENT_SPACE)]
    pub space: String,

    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `view` command
#[derive(Debug, Args)]
pub struct ViewArgs {
    /// View name (views/<name>.json)
    pub view: String,

    #[arg(long, default_value = DEFAULT_ARGUMENT_SPACE)]
    pub space: String,

    #[arg(long)]
    pub json: bool,
}

fn runner(base: &Path) -> Result<DockerRunner> {
    let config = Config::load(base).map_err(HelpfulError::from_datapackage)?;
    Ok(DockerRunner::new(config.runner))
}

pub fn cmd_run(args: RunArgs, base: &Path) -> Result<()> {
    let store = Datapackage::open(base);
    let logs = execute_algorithm(&store, &runner(base)?, &args.algorithm, &args.space)
        .map_err(HelpfulError::from_datapackage)?;
    print_logs(&logs, args.json)
}

pub fn cmd_view(args: ViewArgs, base: &Path) -> Result<()> {
    let store = Datapackage::open(base);
    let logs = execute_view(&store, &runner(base)?, &args.view, &args.space)
        .map_err(HelpfulError::from_datapackage)?;
    print_logs(&logs, args.json)
}

fn print_logs(logs: &str, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&serde_json::json!({ "logs": logs }))?);
    } else if !logs.is_empty() {
        println!("{}", logs);
    }
    Ok(())
}
