//! Tabular data resources and their canonical record form.
//!
//! # Lifecycle
//!
//! 1. **Load**: a [`ResourceRecord`] plus the template it references becomes a
//!    [`Resource`]. Stored data is reordered into schema order and its primary
//!    key promoted.
//! 2. **Assign**: [`Resource::set_table`] replaces the table wholesale. The
//!    first non-empty assignment generates the schema from the template; later
//!    assignments must match it.
//! 3. **Persist**: [`Resource::to_record`] demotes the key back into leading
//!    columns and collapses template-copied schemas into the inherit marker.

use serde::de;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info};

use crate::error::{ResourceError, TableError};
use crate::expand::generate_schema;
use crate::lookup::Named;
use crate::schema::Schema;
use crate::table::{has_user_defined_key, Table};
use crate::template::Template;

/// Sentinel stored in place of a schema that is a verbatim template copy.
pub const INHERIT_SCHEMA_MARKER: &str = "inherit-from-template";

/// Supported resource shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceProfile {
    TabularData,
    ParameterTabularData,
}

impl ResourceProfile {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceProfile::TabularData => "tabular-data-resource",
            ResourceProfile::ParameterTabularData => "parameter-tabular-data-resource",
        }
    }
}

impl fmt::Display for ResourceProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ResourceProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tabular-data-resource" => Ok(ResourceProfile::TabularData),
            "parameter-tabular-data-resource" => Ok(ResourceProfile::ParameterTabularData),
            _ => Err(format!(
                "Invalid resource profile: '{}'. Expected: tabular-data-resource or \
                 parameter-tabular-data-resource",
                s
            )),
        }
    }
}

/// The `schema` slot of a stored resource.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaEntry {
    /// Use the associated template verbatim.
    Inherit,
    Inline(Schema),
}

impl Serialize for SchemaEntry {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            SchemaEntry::Inherit => serializer.serialize_str(INHERIT_SCHEMA_MARKER),
            SchemaEntry::Inline(schema) => schema.serialize(serializer),
        }
    }
}

/// `null`, `""` and `{}` all mean "no schema yet".
fn deserialize_schema_entry<'de, D>(deserializer: D) -> Result<Option<SchemaEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(s) if s.is_empty() => Ok(None),
        Value::String(s) if s == INHERIT_SCHEMA_MARKER => Ok(Some(SchemaEntry::Inherit)),
        Value::String(s) => Err(de::Error::custom(format!(
            "unknown schema marker '{}', expected '{}'",
            s, INHERIT_SCHEMA_MARKER
        ))),
        Value::Object(map) if map.is_empty() => Ok(None),
        value @ Value::Object(_) => serde_json::from_value(value)
            .map(|schema| Some(SchemaEntry::Inline(schema)))
            .map_err(de::Error::custom),
        other => Err(de::Error::custom(format!(
            "schema must be an object or '{}', got {}",
            INHERIT_SCHEMA_MARKER, other
        ))),
    }
}

/// Canonical persisted form of a resource. Unknown top-level keys are kept in
/// `extra` and written back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceRecord {
    pub name: String,

    pub profile: String,

    #[serde(default, deserialize_with = "deserialize_schema_entry")]
    pub schema: Option<SchemaEntry>,

    #[serde(default)]
    pub data: Vec<Map<String, Value>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ResourceRecord {
    pub fn from_json(raw: &str) -> Result<Self, ResourceError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn is_populated(&self) -> bool {
        !self.data.is_empty()
    }
}

/// A named table together with its template and (once populated) its schema.
#[derive(Debug, Clone)]
pub struct Resource {
    name: String,
    profile: ResourceProfile,
    template: Option<Template>,
    schema: Option<Schema>,
    table: Table,
    extra: Map<String, Value>,
}

impl Resource {
    /// A resource with no data and no schema yet.
    pub fn empty(name: impl Into<String>, profile: ResourceProfile, template: Option<Template>) -> Self {
        Self {
            name: name.into(),
            profile,
            template,
            schema: None,
            table: Table::empty(),
            extra: Map::new(),
        }
    }

    /// Build a resource from its stored record.
    pub fn from_record(record: ResourceRecord, template: Option<Template>) -> Result<Self, ResourceError> {
        let ResourceRecord {
            name,
            profile,
            schema,
            data,
            extra,
        } = record;

        let profile = profile
            .parse::<ResourceProfile>()
            .map_err(|_| ResourceError::UnknownProfile {
                resource: name.clone(),
                profile,
            })?;

        let schema = match schema {
            None => None,
            Some(SchemaEntry::Inline(schema)) => Some(schema),
            Some(SchemaEntry::Inherit) => {
                let template = template.as_ref().ok_or_else(|| ResourceError::MissingTemplate {
                    resource: name.clone(),
                })?;
                Some(Schema::inherited(template))
            }
        };

        let mut table = Table::from_records(&data);

        if !table.is_empty() {
            let schema = schema.as_ref().ok_or_else(|| ResourceError::InconsistentResource {
                resource: name.clone(),
            })?;

            let names = schema.field_names();
            if !same_name_set(&names, &table.column_names()) {
                return Err(ResourceError::SchemaDataMismatch {
                    resource: name,
                    schema_fields: names,
                    data_columns: table.column_names(),
                });
            }
            table = table
                .select_columns(&names)
                .map_err(|source| table_error(&name, source))?;
            table = promote_primary_key(&name, schema, table)?;
        }

        debug!(resource = %name, rows = table.row_count(), "loaded resource");

        Ok(Self {
            name,
            profile,
            template,
            schema,
            table,
            extra,
        })
    }

    /// Parse and load a record from JSON text.
    pub fn from_json(raw: &str, template: Option<Template>) -> Result<Self, ResourceError> {
        Self::from_record(ResourceRecord::from_json(raw)?, template)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn profile(&self) -> ResourceProfile {
        self.profile
    }

    pub fn template(&self) -> Option<&Template> {
        self.template.as_ref()
    }

    pub fn schema(&self) -> Option<&Schema> {
        self.schema.as_ref()
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    /// True when the table holds data and a schema is set; false when the
    /// table is empty. Data without a schema is an upstream bug and fails.
    pub fn is_populated(&self) -> Result<bool, ResourceError> {
        match (self.table.is_empty(), self.schema.is_some()) {
            (true, _) => Ok(false),
            (false, true) => Ok(true),
            (false, false) => Err(ResourceError::InconsistentResource {
                resource: self.name.clone(),
            }),
        }
    }

    /// Replace the resource's table, reconciling it with the schema.
    ///
    /// With no schema yet, one is generated from the template against the
    /// incoming width. Column labels become field titles, columns are renamed
    /// to canonical field names, and the schema's primary key is promoted.
    /// A label equal to a field's canonical name keeps the title already set.
    ///
    /// Either every step succeeds and both schema and table are replaced, or
    /// the resource is left untouched. A schema is never generated from a
    /// table without rows.
    pub fn set_table(&mut self, table: Table) -> Result<(), ResourceError> {
        let clears = table.row_count() == 0 && table.width() == 0;
        if clears || (self.schema.is_none() && table.is_empty()) {
            debug!(resource = %self.name, "cleared resource data");
            self.table = Table::empty();
            return Ok(());
        }

        let table = if has_user_defined_key(&table) {
            table.demote_key()
        } else {
            table
        };

        let (mut schema, table) = match &self.schema {
            Some(existing) => (existing.clone(), align_labels(&self.name, existing, table)?),
            None => {
                let template = self
                    .template
                    .as_ref()
                    .ok_or_else(|| ResourceError::MissingTemplate {
                        resource: self.name.clone(),
                    })?;
                (generate_schema(&self.name, template, &table)?, table)
            }
        };
        let generated = self.schema.is_none();

        // A canonical name carries no presentation information, so it never
        // replaces a title a writer supplied earlier.
        for (field, label) in schema.fields.iter_mut().zip(table.column_names()) {
            if label != field.name || field.title.is_none() {
                field.title = Some(label);
            }
        }

        let table = table
            .rename_columns(&schema.field_names())
            .map_err(|source| table_error(&self.name, source))?;
        let table = promote_primary_key(&self.name, &schema, table)?;

        if generated {
            info!(resource = %self.name, fields = schema.fields.len(), "generated schema for resource");
        }
        debug!(resource = %self.name, rows = table.row_count(), "reconciled resource data");
        self.schema = Some(schema);
        self.table = table;
        Ok(())
    }

    /// Row records in canonical field order, key columns leading.
    pub fn records(&self) -> Vec<Map<String, Value>> {
        self.table.to_records()
    }

    /// Canonical persisted form.
    pub fn to_record(&self) -> ResourceRecord {
        let schema = self.schema.as_ref().map(|schema| {
            if schema.is_template_derived() {
                SchemaEntry::Inherit
            } else {
                SchemaEntry::Inline(schema.clone())
            }
        });

        ResourceRecord {
            name: self.name.clone(),
            profile: self.profile.as_str().to_string(),
            schema,
            data: self.records(),
            extra: self.extra.clone(),
        }
    }

    pub fn to_json_pretty(&self) -> Result<String, ResourceError> {
        Ok(serde_json::to_string_pretty(&self.to_record())?)
    }
}

impl Named for Resource {
    fn name(&self) -> &str {
        &self.name
    }
}

/// Accept labels that are the schema's names in any order, or that match the
/// canonical name or current title of the field at each position.
fn align_labels(resource: &str, schema: &Schema, table: Table) -> Result<Table, ResourceError> {
    let names = schema.field_names();
    let labels = table.column_names();

    if labels == names {
        return Ok(table);
    }

    let mismatch = || ResourceError::SchemaDataMismatch {
        resource: resource.to_string(),
        schema_fields: names.clone(),
        data_columns: labels.clone(),
    };

    if labels.len() != names.len() {
        return Err(mismatch());
    }

    if same_name_set(&names, &labels) {
        return table
            .select_columns(&names)
            .map_err(|source| table_error(resource, source));
    }

    let positional = schema
        .fields
        .iter()
        .zip(&labels)
        .all(|(field, label)| &field.name == label || field.title.as_deref() == Some(label.as_str()));
    if positional {
        Ok(table)
    } else {
        Err(mismatch())
    }
}

fn promote_primary_key(resource: &str, schema: &Schema, table: Table) -> Result<Table, ResourceError> {
    match &schema.primary_key {
        Some(key) if !key.is_empty() => table.promote_key(key).map_err(|source| match source {
            TableError::MissingColumn(column) => ResourceError::PrimaryKeyColumnMissing {
                resource: resource.to_string(),
                column,
            },
            other => table_error(resource, other),
        }),
        _ => Ok(table),
    }
}

fn same_name_set(a: &[String], b: &[String]) -> bool {
    a.len() == b.len() && a.iter().collect::<HashSet<_>>() == b.iter().collect::<HashSet<_>>()
}

fn table_error(resource: &str, source: TableError) -> ResourceError {
    ResourceError::Table {
        resource: resource.to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Column;
    use crate::template::{FieldTemplate, PositionSpec};
    use serde_json::json;

    fn template() -> Template {
        Template::new(vec![
            FieldTemplate::new(PositionSpec::Index(0), "x").with_metadata("type", "number"),
            FieldTemplate::new(PositionSpec::Range { start: Some(1), stop: None }, "y"),
        ])
    }

    fn data(labels: [&str; 3]) -> Table {
        Table::new(vec![
            Column::new(labels[0], vec![json!(1), json!(2)]),
            Column::new(labels[1], vec![json!(10), json!(20)]),
            Column::new(labels[2], vec![json!(100), json!(200)]),
        ])
        .unwrap()
    }

    #[test]
    fn profile_parsing() {
        assert_eq!(
            "tabular-data-resource".parse::<ResourceProfile>(),
            Ok(ResourceProfile::TabularData)
        );
        assert!("image-resource".parse::<ResourceProfile>().is_err());
    }

    #[test]
    fn fresh_resource_is_empty_without_schema() {
        let resource = Resource::empty("r", ResourceProfile::TabularData, Some(template()));
        assert!(!resource.is_populated().unwrap());
        assert!(resource.schema().is_none());
    }

    #[test]
    fn first_assignment_generates_schema_and_titles() {
        let mut resource = Resource::empty("r", ResourceProfile::TabularData, Some(template()));
        resource.set_table(data(["Time", "A", "B"])).unwrap();

        assert!(resource.is_populated().unwrap());
        let schema = resource.schema().unwrap();
        assert_eq!(schema.field_names(), vec!["x", "y0", "y1"]);
        let titles: Vec<_> = schema.fields.iter().map(|f| f.title.clone().unwrap()).collect();
        assert_eq!(titles, vec!["Time", "A", "B"]);
        assert_eq!(resource.table().column_names(), vec!["x", "y0", "y1"]);
    }

    #[test]
    fn later_assignment_accepts_names_titles_or_reordered_names() {
        let mut resource = Resource::empty("r", ResourceProfile::TabularData, Some(template()));
        resource.set_table(data(["Time", "A", "B"])).unwrap();

        resource.set_table(data(["Time", "A", "B"])).unwrap();
        resource.set_table(data(["x", "y0", "y1"])).unwrap();

        resource.set_table(data(["y1", "x", "y0"])).unwrap();
        let x = resource.table().column("x").unwrap();
        assert_eq!(x.values, vec![json!(10), json!(20)]);

        let titles: Vec<_> = resource
            .schema()
            .unwrap()
            .fields
            .iter()
            .map(|f| f.title.clone().unwrap())
            .collect();
        assert_eq!(titles, vec!["Time", "A", "B"]);
    }

    #[test]
    fn renamed_column_is_a_mismatch() {
        let mut resource = Resource::empty("r", ResourceProfile::TabularData, Some(template()));
        resource.set_table(data(["x", "y0", "y1"])).unwrap();

        let err = resource.set_table(data(["x", "y0", "renamed"])).unwrap_err();
        assert!(matches!(err, ResourceError::SchemaDataMismatch { .. }));
    }

    #[test]
    fn missing_template_blocks_first_assignment() {
        let mut resource = Resource::empty("r", ResourceProfile::TabularData, None);
        assert!(matches!(
            resource.set_table(data(["a", "b", "c"])),
            Err(ResourceError::MissingTemplate { .. })
        ));
    }

    #[test]
    fn primary_key_is_promoted_and_written_first() {
        let template = template().with_primary_key(["y1"]);
        let mut resource = Resource::empty("r", ResourceProfile::TabularData, Some(template));
        resource.set_table(data(["t", "a", "b"])).unwrap();

        assert_eq!(resource.table().column_names(), vec!["x", "y0"]);
        let records = resource.records();
        assert_eq!(records[0].keys().collect::<Vec<_>>(), vec!["y1", "x", "y0"]);
    }

    #[test]
    fn user_defined_key_is_demoted_before_reconciling() {
        let mut resource = Resource::empty("r", ResourceProfile::TabularData, Some(template()));
        let keyed = data(["t", "a", "b"]).promote_key(&["t".to_string()]).unwrap();
        resource.set_table(keyed).unwrap();

        assert_eq!(resource.table().column_names(), vec!["x", "y0", "y1"]);
        assert_eq!(resource.table().columns()[0].values, vec![json!(1), json!(2)]);
    }

    #[test]
    fn clearing_keeps_schema() {
        let mut resource = Resource::empty("r", ResourceProfile::TabularData, Some(template()));
        resource.set_table(data(["t", "a", "b"])).unwrap();
        resource.set_table(Table::empty()).unwrap();

        assert!(!resource.is_populated().unwrap());
        assert!(resource.schema().is_some());
    }

    #[test]
    fn columns_without_rows_never_generate_schema() {
        let mut resource = Resource::empty("r", ResourceProfile::TabularData, Some(template()));
        let headers_only = Table::new(vec![
            Column::new("a", Vec::new()),
            Column::new("b", Vec::new()),
        ])
        .unwrap();

        resource.set_table(headers_only).unwrap();
        assert!(resource.schema().is_none());
        assert!(!resource.is_populated().unwrap());

        resource.set_table(data(["t", "a", "b"])).unwrap();
        assert_eq!(resource.schema().unwrap().field_names(), vec!["x", "y0", "y1"]);
    }

    #[test]
    fn failed_assignment_leaves_resource_unchanged() {
        let keyed = template().with_primary_key(["missing"]);
        let mut resource = Resource::empty("r", ResourceProfile::TabularData, Some(keyed));

        let err = resource.set_table(data(["t", "a", "b"])).unwrap_err();
        assert!(matches!(err, ResourceError::PrimaryKeyColumnMissing { .. }));
        assert!(resource.schema().is_none());
        assert!(resource.table().is_empty());

        let mut populated = Resource::empty("p", ResourceProfile::TabularData, Some(template()));
        populated.set_table(data(["Time", "A", "B"])).unwrap();
        let before = populated.schema().cloned();
        let table_before = populated.table().clone();

        assert!(populated.set_table(data(["Time", "A", "renamed"])).is_err());
        assert_eq!(populated.schema().cloned(), before);
        assert_eq!(populated.table(), &table_before);
    }

    #[test]
    fn record_with_data_but_no_schema_is_inconsistent() {
        let record: ResourceRecord = serde_json::from_value(json!({
            "name": "r",
            "profile": "tabular-data-resource",
            "schema": null,
            "data": [{"a": 1}]
        }))
        .unwrap();

        assert!(matches!(
            Resource::from_record(record, Some(template())),
            Err(ResourceError::InconsistentResource { .. })
        ));
    }

    #[test]
    fn unknown_profile_is_rejected() {
        let record: ResourceRecord = serde_json::from_value(json!({
            "name": "r",
            "profile": "image-resource",
            "data": []
        }))
        .unwrap();

        assert!(matches!(
            Resource::from_record(record, None),
            Err(ResourceError::UnknownProfile { profile, .. }) if profile == "image-resource"
        ));
    }

    #[test]
    fn inherit_marker_expands_and_collapses() {
        let template = Template::new(vec![
            FieldTemplate::new(PositionSpec::Index(0), "name"),
            FieldTemplate::new(PositionSpec::Index(1), "value"),
        ])
        .with_primary_key(["name"]);

        let record: ResourceRecord = serde_json::from_value(json!({
            "name": "params",
            "profile": "parameter-tabular-data-resource",
            "schema": INHERIT_SCHEMA_MARKER,
            "data": [{"value": 1.5, "name": "k"}],
            "description": "fit parameters"
        }))
        .unwrap();

        let resource = Resource::from_record(record, Some(template)).unwrap();
        assert!(resource.schema().unwrap().is_template_derived());
        assert_eq!(resource.table().column_names(), vec!["value"]);

        let out = serde_json::to_value(resource.to_record()).unwrap();
        assert_eq!(out["schema"], json!(INHERIT_SCHEMA_MARKER));
        assert_eq!(out["description"], json!("fit parameters"));
        assert_eq!(out["data"], json!([{"name": "k", "value": 1.5}]));
    }

    #[test]
    fn inherit_marker_without_template_fails() {
        let record: ResourceRecord = serde_json::from_value(json!({
            "name": "params",
            "profile": "tabular-data-resource",
            "schema": INHERIT_SCHEMA_MARKER,
            "data": []
        }))
        .unwrap();

        assert!(matches!(
            Resource::from_record(record, None),
            Err(ResourceError::MissingTemplate { .. })
        ));
    }

    #[test]
    fn empty_schema_values_mean_no_schema() {
        for schema in [json!(null), json!(""), json!({})] {
            let record: ResourceRecord = serde_json::from_value(json!({
                "name": "r",
                "profile": "tabular-data-resource",
                "schema": schema,
                "data": []
            }))
            .unwrap();
            assert!(record.schema.is_none());
        }
    }
}
