//! Template expansion: derive a concrete schema from a template and the width
//! of the first data a resource receives.
//!
//! Template entries are applied in order and later entries overwrite earlier
//! ones where their positions overlap, so a broad range can be refined by a
//! narrower entry further down. Every column must end up with a field.

use tracing::debug;

use crate::error::ResourceError;
use crate::schema::{Schema, SchemaField};
use crate::table::Table;
use crate::template::{Selection, Template};

/// Generate a schema for `table` from `template`.
///
/// `table` must already have any user-defined key demoted into plain columns;
/// its full width is the number of schema fields produced. The template is
/// never modified.
pub fn generate_schema(
    resource: &str,
    template: &Template,
    table: &Table,
) -> Result<Schema, ResourceError> {
    if template.fields.is_empty() {
        return Err(ResourceError::EmptyTemplate {
            resource: resource.to_string(),
        });
    }

    let width = table.width();
    let mut slots: Vec<Option<SchemaField>> = vec![None; width];

    for field in &template.fields {
        let selection = field
            .position
            .resolve(width)
            .map_err(|position| ResourceError::IndexOutOfRange {
                position,
                resource: resource.to_string(),
                template_fields: template.field_names(),
                rows: table.row_count(),
                columns: width,
            })?;

        match selection {
            Selection::Single(position) => {
                slots[position] = Some(SchemaField::from_template(field, field.name.clone()));
            }
            Selection::Range(range) => {
                for (offset, position) in range.enumerate() {
                    let name = format!("{}{}", field.name, offset);
                    slots[position] = Some(SchemaField::from_template(field, name));
                }
            }
        }
    }

    let unset: Vec<usize> = slots
        .iter()
        .enumerate()
        .filter(|(_, slot)| slot.is_none())
        .map(|(position, _)| position)
        .collect();
    if !unset.is_empty() {
        return Err(ResourceError::IncompleteSchemaGeneration {
            resource: resource.to_string(),
            unset,
            template_fields: template.field_names(),
        });
    }

    let fields: Vec<SchemaField> = slots.into_iter().flatten().collect();
    debug!(
        resource,
        fields = fields.len(),
        template_fields = template.fields.len(),
        "generated schema from template"
    );

    Ok(Schema::new(fields).with_primary_key(template.primary_key.clone()))
}
