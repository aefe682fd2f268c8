//! Config command - show resolved paths and runner settings

use std::path::Path;
use tabulon::{Config, Datapackage};

use crate::cli::error::HelpfulError;

/// Arguments for the config command
#[derive(Debug, clap::Args)]
pub struct ConfigArgs {
    /// Show resolved paths in JSON format
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: ConfigArgs, base: &Path) -> anyhow::Result<()> {
    let store = Datapackage::open(base);
    let config = Config::load(base).map_err(HelpfulError::from_datapackage)?;
    let home = tabulon_logging::tabulon_home()?;
    let logs = tabulon_logging::logs_dir()?;
    let config_path = Config::path(base);
    let datapackage = store.datapackage_path();

    if args.json {
        let output = serde_json::json!({
            "home": home.to_string_lossy(),
            "logs": logs.to_string_lossy(),
            "base_path": base.to_string_lossy(),
            "datapackage": {
                "path": datapackage.to_string_lossy(),
                "exists": datapackage.exists(),
            },
            "config": {
                "path": config_path.to_string_lossy(),
                "exists": config_path.exists(),
            },
            "runner": config.runner,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("TABULON CONFIGURATION");
        println!("=====================");
        println!();
        println!("Home:        {}", home.display());
        println!("Logs:        {}", logs.display());
        println!();
        println!("Datapackage: {}", base.display());
        println!("  metadata:  {} {}", datapackage.display(), exists_label(&datapackage));
        println!("  config:    {} {}", config_path.display(), exists_label(&config_path));
        println!();
        println!("Runner:      {}", config.runner.program);
        println!("  mount:     {}", config.runner.mount_target);
        if let Some(user) = &config.runner.user {
            println!("  user:      {}", user);
        }
        if !config.runner.extra_args.is_empty() {
            println!("  args:      {}", config.runner.extra_args.join(" "));
        }
    }

    Ok(())
}

fn exists_label(path: &Path) -> &'static str {
    if path.exists() {
        "[exists]"
    } else {
        "[not found]"
    }
}
