//! Error taxonomy for templates, tables, resources and arguments.
//!
//! Every variant carries enough context (resource name, offending positions,
//! allowed values) to render an actionable message. None of these are retried.

use serde_json::Value;
use thiserror::Error;

/// Errors raised while loading a template.
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Invalid position spec '{spec}': {reason}")]
    InvalidPositionSpec { spec: String, reason: String },

    #[error("Template is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Structural errors raised by [`crate::Table`] operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    #[error("Column '{column}' has {found} values, expected {expected}")]
    ColumnLength {
        column: String,
        expected: usize,
        found: usize,
    },

    #[error("Duplicate column '{0}'")]
    DuplicateColumn(String),

    #[error("Column '{0}' not found")]
    MissingColumn(String),

    #[error("Expected {expected} column labels, got {found}")]
    ColumnCount { expected: usize, found: usize },
}

/// Errors raised by schema generation, reconciliation and the record codec.
#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("Resource '{resource}': template has no fields")]
    EmptyTemplate { resource: String },

    #[error("Resource '{resource}': no template available to generate a schema from")]
    MissingTemplate { resource: String },

    #[error(
        "Resource '{resource}': can't generate schema from template, position {position} \
         is out of range for data with {columns} columns and {rows} rows \
         (template fields: {template_fields:?}). Does the data match the template?"
    )]
    IndexOutOfRange {
        position: i64,
        resource: String,
        template_fields: Vec<String>,
        rows: usize,
        columns: usize,
    },

    #[error(
        "Resource '{resource}': template {template_fields:?} leaves column positions \
         {unset:?} without a field"
    )]
    IncompleteSchemaGeneration {
        resource: String,
        unset: Vec<usize>,
        template_fields: Vec<String>,
    },

    #[error(
        "Resource '{resource}': data columns {data_columns:?} do not match schema fields \
         {schema_fields:?}"
    )]
    SchemaDataMismatch {
        resource: String,
        schema_fields: Vec<String>,
        data_columns: Vec<String>,
    },

    #[error("Populated resource '{resource}' is missing data or schema")]
    InconsistentResource { resource: String },

    #[error("Resource '{resource}': unknown profile '{profile}'")]
    UnknownProfile { resource: String, profile: String },

    #[error("Resource '{resource}': primary key column '{column}' not found in data")]
    PrimaryKeyColumnMissing { resource: String, column: String },

    #[error("Resource '{resource}': {source}")]
    Table {
        resource: String,
        #[source]
        source: TableError,
    },

    #[error("Resource record is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Errors raised while validating or assigning a scalar argument.
#[derive(Debug, Error)]
pub enum ArgumentError {
    #[error(
        "Argument '{argument}' is backed by a '{profile}' resource; edit the resource \
         instead of assigning a value"
    )]
    InvalidProfile { argument: String, profile: String },

    #[error("Argument '{argument}' expects a value of type {expected}, got {found}")]
    InvalidType {
        argument: String,
        expected: String,
        found: String,
    },

    #[error("Argument '{argument}': {value} is not one of {allowed:?}")]
    InvalidEnumValue {
        argument: String,
        value: Value,
        allowed: Vec<Value>,
    },

    #[error("Argument '{argument}': {reason}")]
    InvalidValue { argument: String, reason: String },

    #[error("Can't find argument named '{argument}' in argument space '{space}'")]
    ArgumentNotFound { argument: String, space: String },
}
