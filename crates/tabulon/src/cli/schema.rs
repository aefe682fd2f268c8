//! Schema command - preview template expansion without writing anything

use anyhow::Result;
use clap::Subcommand;
use std::path::{Path, PathBuf};
use tabulon::Datapackage;
use tabulon_schema::{generate_schema, Table};

use crate::cli::error::HelpfulError;
use crate::cli::output::{format_value, print_table};
use crate::cli::read_records;

#[derive(Subcommand, Debug, Clone)]
pub enum SchemaAction {
    /// Expand a template against sample data and print the resulting schema
    Generate {
        /// Template name (templates/<name>.json)
        template: String,
        /// JSON file with row records (`-` for stdin)
        #[arg(long)]
        data: PathBuf,
        /// Resource name used in error messages
        #[arg(long, default_value = "preview")]
        resource: String,
        #[arg(long)]
        json: bool,
    },
}

pub fn run(action: SchemaAction, base: &Path) -> Result<()> {
    match action {
        SchemaAction::Generate {
            template,
            data,
            resource,
            json,
        } => generate(&Datapackage::open(base), &template, &data, &resource, json),
    }
}

fn generate(store: &Datapackage, template: &str, data: &Path, resource: &str, json: bool) -> Result<()> {
    let template = store
        .load_template(template)
        .map_err(HelpfulError::from_datapackage)?;
    let table = Table::from_records(&read_records(data)?);
    let schema = generate_schema(resource, &template, &table)
        .map_err(|e| HelpfulError::from_datapackage(e.into()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&schema)?);
        return Ok(());
    }

    let labels = table.column_names();
    let rows = schema
        .fields
        .iter()
        .enumerate()
        .map(|(position, field)| {
            vec![
                position.to_string(),
                field.name.clone(),
                labels.get(position).cloned().unwrap_or_default(),
                field.metadata.get("type").map(format_value).unwrap_or_default(),
            ]
        })
        .collect();
    print_table(&["POS", "FIELD", "LABEL", "TYPE"], rows);

    if let Some(key) = &schema.primary_key {
        println!("Primary key: {}", key.join(", "));
    }
    Ok(())
}
