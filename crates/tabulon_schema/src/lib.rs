//! Schema reconciliation for tabular data resources
//!
//! # Philosophy: Template first, Schema on first data
//!
//! A resource can exist before its column layout is known. It carries a
//! reusable, position-addressed **template**; the concrete **schema** is
//! derived from it the first time data arrives, when the column count is
//! finally observable. From then on the schema governs the table:
//!
//! 1. **Expansion**: template entries resolve against the observed width
//! 2. **Reconciliation**: every new table is renamed to canonical field names,
//!    its labels become field titles, and the primary key is promoted
//! 3. **Persistence**: the table round-trips losslessly through row records
//!
//! Reshaping an existing schema is never done silently: mismatched data fails.
//!
//! # Modules
//!
//! - [`template`]: Position specs and field templates
//! - [`schema`]: Concrete schema fields
//! - [`table`]: Column-oriented tables with an optional promoted key
//! - [`expand`]: Template expansion into a schema
//! - [`resource`]: Resources, reconciliation and the record codec
//! - [`argument`]: Scalar argument validation
//! - [`lookup`]: Name-based lookup helpers

pub mod argument;
pub mod error;
pub mod expand;
pub mod lookup;
pub mod resource;
pub mod schema;
pub mod table;
pub mod template;

pub use argument::{validate, Argument, ArgumentInterface, ArgumentSpace, ArgumentType, EnumOption};
pub use error::{ArgumentError, ResourceError, TableError, TemplateError};
pub use expand::generate_schema;
pub use lookup::{find_by_name, find_by_name_mut, find_value_by_name, Named};
pub use resource::{Resource, ResourceProfile, ResourceRecord, SchemaEntry, INHERIT_SCHEMA_MARKER};
pub use schema::{Schema, SchemaField, SchemaOrigin};
pub use table::{has_user_defined_key, Column, RowKey, Table};
pub use template::{FieldTemplate, PositionSpec, Selection, Template};
