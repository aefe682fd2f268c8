//! Concrete, positioned schemas.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::lookup::Named;
use crate::template::{deserialize_primary_key, FieldTemplate, Template};

/// One positioned field. `name` is the stable storage identifier; `title` is
/// the presentation label last supplied by a writer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaField {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

impl SchemaField {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: None,
            metadata: Map::new(),
        }
    }

    /// Derive a field from a template entry. The position is not carried over.
    pub fn from_template(template: &FieldTemplate, name: impl Into<String>) -> Self {
        let mut metadata = template.metadata.clone();
        let title = match metadata.remove("title") {
            Some(Value::String(title)) => Some(title),
            Some(other) => {
                metadata.insert("title".to_string(), other);
                None
            }
            None => None,
        };

        Self {
            name: name.into(),
            title,
            metadata,
        }
    }
}

impl Named for SchemaField {
    fn name(&self) -> &str {
        &self.name
    }
}

/// Where a schema came from, which decides how it is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchemaOrigin {
    /// Generated or stored alongside the resource.
    #[default]
    Resource,
    /// Copied verbatim from the template; written back as the inherit marker.
    Template,
}

/// Ordered field list (order = canonical column order) plus optional primary key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    pub fields: Vec<SchemaField>,

    #[serde(
        rename = "primaryKey",
        default,
        deserialize_with = "deserialize_primary_key",
        skip_serializing_if = "Option::is_none"
    )]
    pub primary_key: Option<Vec<String>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,

    #[serde(skip)]
    pub origin: SchemaOrigin,
}

impl Schema {
    pub fn new(fields: Vec<SchemaField>) -> Self {
        Self {
            fields,
            primary_key: None,
            extra: Map::new(),
            origin: SchemaOrigin::Resource,
        }
    }

    pub fn with_primary_key(mut self, key: Option<Vec<String>>) -> Self {
        self.primary_key = key;
        self
    }

    /// Copy a template verbatim, tagged so writers collapse it back to the
    /// inherit marker.
    pub fn inherited(template: &Template) -> Self {
        Self {
            fields: template
                .fields
                .iter()
                .map(|field| SchemaField::from_template(field, field.name.clone()))
                .collect(),
            primary_key: template.primary_key.clone(),
            extra: template.extra.clone(),
            origin: SchemaOrigin::Template,
        }
    }

    pub fn field_names(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.name.clone()).collect()
    }

    pub fn is_template_derived(&self) -> bool {
        self.origin == SchemaOrigin::Template
    }
}
