//! Tabulon command-line interface
//!
//! Works on one datapackage directory at a time: reconciles resource data
//! against templates, edits argument spaces and runs algorithm and view
//! containers.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tabulon_logging::{init_logging, LogConfig};
use tracing::debug;

mod cli;

#[derive(Parser, Debug)]
#[command(name = "tabulon", about = "Schema-reconciled tabular resources in a datapackage")]
struct Cli {
    /// Enable verbose logging (info/debug to stderr)
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    /// Datapackage root (defaults to the current directory)
    #[arg(long, global = true, env = tabulon::BASE_PATH_ENV)]
    base_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Inspect or replace resource data
    Resource {
        #[command(subcommand)]
        action: cli::resource::ResourceAction,
    },

    /// Preview template expansion
    Schema {
        #[command(subcommand)]
        action: cli::schema::SchemaAction,
    },

    /// Inspect or assign argument values
    Argument {
        #[command(subcommand)]
        action: cli::argument::ArgumentAction,
    },

    /// Run an algorithm container
    Run(cli::execute::RunArgs),

    /// Render a view container
    View(cli::execute::ViewArgs),

    /// Show resolved paths and runner settings
    Config(cli::config::ConfigArgs),
}

fn command_wants_json(command: &Commands) -> bool {
    use cli::argument::ArgumentAction;
    use cli::resource::ResourceAction;
    use cli::schema::SchemaAction;

    match command {
        Commands::Resource { action } => match action {
            ResourceAction::Show { json, .. } => *json,
            ResourceAction::Set { json, .. } => *json,
        },
        Commands::Schema { action } => match action {
            SchemaAction::Generate { json, .. } => *json,
        },
        Commands::Argument { action } => match action {
            ArgumentAction::Show { json, .. } => *json,
            ArgumentAction::Set { .. } => false,
        },
        Commands::Run(args) => args.json,
        Commands::View(args) => args.json,
        Commands::Config(args) => args.json,
    }
}

fn run_command(cli: Cli) -> Result<()> {
    let base = tabulon::resolve_base_path(cli.base_path)
        .map_err(cli::error::HelpfulError::from_datapackage)?;
    debug!(base = %base.display(), "resolved datapackage root");

    match cli.command {
        Commands::Resource { action } => cli::resource::run(action, &base),
        Commands::Schema { action } => cli::schema::run(action, &base),
        Commands::Argument { action } => cli::argument::run(action, &base),
        Commands::Run(args) => cli::execute::cmd_run(args, &base),
        Commands::View(args) => cli::execute::cmd_view(args, &base),
        Commands::Config(args) => cli::config::run(args, &base),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let json_mode = command_wants_json(&cli.command);

    if let Err(err) = init_logging(LogConfig {
        app_name: "tabulon",
        verbose: cli.verbose,
        log_dir: None,
    }) {
        eprintln!("Warning: failed to initialize logging: {:#}", err);
    }

    match run_command(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if json_mode {
                cli::error::print_json_error(&err);
            } else if err.downcast_ref::<cli::error::HelpfulError>().is_some() {
                eprint!("{}", err);
            } else {
                eprintln!("{:?}", err);
            }
            ExitCode::from(1)
        }
    }
}
