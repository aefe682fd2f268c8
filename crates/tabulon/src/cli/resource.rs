//! Resource commands - inspect and replace resource data

use anyhow::Result;
use clap::Subcommand;
use std::path::{Path, PathBuf};
use tabulon::Datapackage;
use tabulon_schema::{Resource, Table};

use crate::cli::error::HelpfulError;
use crate::cli::output::{format_value, print_records, print_table};
use crate::cli::read_records;

/// Subcommands for resource management
#[derive(Subcommand, Debug, Clone)]
pub enum ResourceAction {
    /// Show a resource's schema and data
    Show {
        name: String,
        /// Template to expand an inherited schema from
        #[arg(long)]
        template: Option<String>,
        /// Maximum number of rows to print
        #[arg(short = 'n', long, default_value = "20")]
        rows: usize,
        #[arg(long)]
        json: bool,
    },
    /// Replace a resource's data, generating its schema on first write
    Set {
        name: String,
        /// JSON file with row records (`-` for stdin)
        #[arg(long)]
        data: PathBuf,
        /// Template used when the resource has no schema yet
        #[arg(long)]
        template: Option<String>,
        #[arg(long)]
        json: bool,
    },
}

pub fn run(action: ResourceAction, base: &Path) -> Result<()> {
    let store = Datapackage::open(base);
    match action {
        ResourceAction::Show {
            name,
            template,
            rows,
            json,
        } => show(&store, &name, template.as_deref(), rows, json),
        ResourceAction::Set {
            name,
            data,
            template,
            json,
        } => set(&store, &name, &data, template.as_deref(), json),
    }
}

fn show(store: &Datapackage, name: &str, template: Option<&str>, rows: usize, json: bool) -> Result<()> {
    let resource = store
        .load_resource(name, template)
        .map_err(HelpfulError::from_datapackage)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&resource.to_record())?);
        return Ok(());
    }

    print_summary(&resource);

    if let Some(schema) = resource.schema() {
        println!();
        let field_rows = schema
            .fields
            .iter()
            .map(|field| {
                vec![
                    field.name.clone(),
                    field.title.clone().unwrap_or_default(),
                    field.metadata.get("type").map(format_value).unwrap_or_default(),
                ]
            })
            .collect();
        print_table(&["FIELD", "TITLE", "TYPE"], field_rows);
    }

    let records = resource.records();
    if !records.is_empty() {
        println!();
        print_records(&records[..records.len().min(rows)]);
        if records.len() > rows {
            println!("... {} more rows", records.len() - rows);
        }
    }

    Ok(())
}

fn set(store: &Datapackage, name: &str, data: &Path, template: Option<&str>, json: bool) -> Result<()> {
    let records = read_records(data)?;
    let mut resource = store
        .load_resource(name, template)
        .map_err(HelpfulError::from_datapackage)?;

    resource
        .set_table(Table::from_records(&records))
        .map_err(|e| HelpfulError::from_datapackage(e.into()))?;
    store
        .write_resource(&resource)
        .map_err(HelpfulError::from_datapackage)?;

    if json {
        let summary = serde_json::json!({
            "name": resource.name(),
            "rows": resource.table().row_count(),
            "fields": resource.schema().map(|s| s.field_names()).unwrap_or_default(),
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&resource);
    }
    Ok(())
}

fn print_summary(resource: &Resource) {
    let status = match resource.is_populated() {
        Ok(true) => "populated",
        Ok(false) => "empty",
        Err(_) => "inconsistent",
    };
    println!("Resource: {}", resource.name());
    println!("Profile:  {}", resource.profile());
    println!("Rows:     {}", resource.table().row_count());
    println!("Status:   {}", status);
    if let Some(schema) = resource.schema() {
        if let Some(key) = &schema.primary_key {
            println!("Key:      {}", key.join(", "));
        }
        if schema.is_template_derived() {
            println!("Schema:   inherited from template");
        }
    }
}
