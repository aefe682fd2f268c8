//! Argument commands - inspect and assign argument values

use anyhow::Result;
use clap::Subcommand;
use std::path::Path;
use tabulon::{Datapackage, DEFAULT_ARGUMENT_SPACE};

use crate::cli::error::HelpfulError;
use crate::cli::output::{format_value, parse_value, print_table};

#[derive(Subcommand, Debug, Clone)]
pub enum ArgumentAction {
    /// Show the arguments of an algorithm's argument space
    Show {
        algorithm: String,
        /// Only show this argument
        argument: Option<String>,
        #[arg(long, default_value = DEFAULT_ARGUMENT_SPACE)]
        space: String,
        #[arg(long)]
        json: bool,
    },
    /// Validate and store a scalar argument value
    Set {
        algorithm: String,
        argument: String,
        /// JSON value; bare words are taken as strings
        value: String,
        #[arg(long, default_value = DEFAULT_ARGUMENT_SPACE)]
        space: String,
    },
}

pub fn run(action: ArgumentAction, base: &Path) -> Result<()> {
    let store = Datapackage::open(base);
    match action {
        ArgumentAction::Show {
            algorithm,
            argument,
            space,
            json,
        } => show(&store, &algorithm, argument.as_deref(), &space, json),
        ArgumentAction::Set {
            algorithm,
            argument,
            value,
            space,
        } => {
            let value = parse_value(&value);
            store
                .set_argument(&algorithm, &space, &argument, value.clone())
                .map_err(HelpfulError::from_datapackage)?;
            println!("{}.{} = {}", space, argument, value);
            Ok(())
        }
    }
}

fn show(store: &Datapackage, algorithm: &str, argument: Option<&str>, space: &str, json: bool) -> Result<()> {
    if let Some(name) = argument {
        let arg = store
            .load_argument(algorithm, name, space)
            .map_err(HelpfulError::from_datapackage)?;
        if json {
            println!("{}", serde_json::to_string_pretty(&arg)?);
        } else {
            println!("{}", arg.value().map(format_value).unwrap_or_default());
        }
        return Ok(());
    }

    let arguments = store
        .load_argument_space(algorithm, space)
        .map_err(HelpfulError::from_datapackage)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&arguments)?);
        return Ok(());
    }

    let rows = arguments
        .data
        .iter()
        .map(|arg| {
            let value = match arg.resource() {
                Some(resource) => format!("<resource {}>", resource),
                None => arg.value().map(format_value).unwrap_or_default(),
            };
            vec![arg.name.clone(), value]
        })
        .collect();
    println!("Argument space: {}", arguments.name);
    print_table(&["ARGUMENT", "VALUE"], rows);
    Ok(())
}
