//! Field templates: position-addressed blueprints for a schema.
//!
//! A template entry is addressed either by a single column position or by a
//! half-open range using slice rules (`"2:5"`, `":"`, `"1:"`, `":-1"`). The
//! concrete column count is only known once data arrives, so positions are
//! resolved lazily by [`PositionSpec::resolve`].

use serde::de;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use crate::error::TemplateError;
use crate::lookup::Named;

/// Where a template entry applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PositionSpec {
    /// One column; negative values count from the end.
    Index(i64),
    /// Slice of columns; omitted bounds default to the start / end.
    Range { start: Option<i64>, stop: Option<i64> },
}

/// A position spec resolved against a concrete column count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Single(usize),
    Range(Range<usize>),
}

impl PositionSpec {
    /// Resolve against `width` columns.
    ///
    /// Ranges clamp to `[0, width]` and may select nothing. A single index
    /// never clamps: the offending position is returned as the error.
    pub fn resolve(&self, width: usize) -> Result<Selection, i64> {
        let len = width as i64;
        match *self {
            PositionSpec::Index(position) => {
                let resolved = if position < 0 { position + len } else { position };
                if (0..len).contains(&resolved) {
                    Ok(Selection::Single(resolved as usize))
                } else {
                    Err(position)
                }
            }
            PositionSpec::Range { start, stop } => {
                let start = clamp_bound(start, 0, len);
                let stop = clamp_bound(stop, len, len).max(start);
                Ok(Selection::Range(start as usize..stop as usize))
            }
        }
    }
}

fn clamp_bound(bound: Option<i64>, default: i64, len: i64) -> i64 {
    match bound {
        None => default,
        Some(v) if v < 0 => (v + len).max(0),
        Some(v) => v.min(len),
    }
}

impl fmt::Display for PositionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionSpec::Index(position) => write!(f, "{}", position),
            PositionSpec::Range { start, stop } => {
                if let Some(start) = start {
                    write!(f, "{}", start)?;
                }
                write!(f, ":")?;
                if let Some(stop) = stop {
                    write!(f, "{}", stop)?;
                }
                Ok(())
            }
        }
    }
}

impl FromStr for PositionSpec {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let invalid = |reason: &str| TemplateError::InvalidPositionSpec {
            spec: s.to_string(),
            reason: reason.to_string(),
        };

        if !trimmed.contains(':') {
            return trimmed
                .parse::<i64>()
                .map(PositionSpec::Index)
                .map_err(|_| invalid("expected an integer position"));
        }

        let parts: Vec<&str> = trimmed.split(':').collect();
        match parts.len() {
            2 => {}
            3 => return Err(invalid("slice steps are not supported, expected 'start:stop'")),
            _ => return Err(invalid("expected 'start:stop'")),
        }

        let parse_bound = |part: &str| -> Result<Option<i64>, TemplateError> {
            let part = part.trim();
            if part.is_empty() {
                return Ok(None);
            }
            part.parse::<i64>()
                .map(Some)
                .map_err(|_| invalid("range bounds must be integers"))
        };

        Ok(PositionSpec::Range {
            start: parse_bound(parts[0])?,
            stop: parse_bound(parts[1])?,
        })
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PositionSpecRepr {
    Integer(i64),
    Text(String),
}

impl Serialize for PositionSpec {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for PositionSpec {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match PositionSpecRepr::deserialize(deserializer)? {
            PositionSpecRepr::Integer(position) => Ok(PositionSpec::Index(position)),
            PositionSpecRepr::Text(text) => text.parse().map_err(de::Error::custom),
        }
    }
}

/// One entry of a template. Metadata beyond `name` (type, title, ...) is kept
/// opaque so unknown keys survive untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldTemplate {
    #[serde(rename = "positionSpec", alias = "index")]
    pub position: PositionSpec,

    pub name: String,

    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

impl FieldTemplate {
    pub fn new(position: PositionSpec, name: impl Into<String>) -> Self {
        Self {
            position,
            name: name.into(),
            metadata: Map::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

impl Named for FieldTemplate {
    fn name(&self) -> &str {
        &self.name
    }
}

/// An immutable, ordered list of field templates plus an optional primary key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    #[serde(default)]
    pub fields: Vec<FieldTemplate>,

    #[serde(
        rename = "primaryKey",
        default,
        deserialize_with = "deserialize_primary_key",
        skip_serializing_if = "Option::is_none"
    )]
    pub primary_key: Option<Vec<String>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Template {
    pub fn new(fields: Vec<FieldTemplate>) -> Self {
        Self {
            fields,
            primary_key: None,
            extra: Map::new(),
        }
    }

    pub fn with_primary_key<I, S>(mut self, key: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.primary_key = Some(key.into_iter().map(Into::into).collect());
        self
    }

    pub fn from_json(raw: &str) -> Result<Self, TemplateError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn field_names(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.name.clone()).collect()
    }
}

/// Primary keys may be declared as one name or a list of names.
pub(crate) fn deserialize_primary_key<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum KeyRepr {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<KeyRepr>::deserialize(deserializer)? {
        None => None,
        Some(KeyRepr::One(name)) => Some(vec![name]),
        Some(KeyRepr::Many(names)) if names.is_empty() => None,
        Some(KeyRepr::Many(names)) => Some(names),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn parses_integer_and_range_specs() {
        assert_eq!("3".parse::<PositionSpec>().unwrap(), PositionSpec::Index(3));
        assert_eq!("-1".parse::<PositionSpec>().unwrap(), PositionSpec::Index(-1));
        assert_eq!(
            "2:5".parse::<PositionSpec>().unwrap(),
            PositionSpec::Range { start: Some(2), stop: Some(5) }
        );
        assert_eq!(
            ":".parse::<PositionSpec>().unwrap(),
            PositionSpec::Range { start: None, stop: None }
        );
        assert_eq!(
            "1:".parse::<PositionSpec>().unwrap(),
            PositionSpec::Range { start: Some(1), stop: None }
        );
    }

    #[test]
    fn rejects_malformed_specs() {
        assert!("a".parse::<PositionSpec>().is_err());
        assert!("1:2:3".parse::<PositionSpec>().is_err());
        assert!("x:2".parse::<PositionSpec>().is_err());
    }

    #[test]
    fn resolves_like_slices() {
        let full = PositionSpec::Range { start: None, stop: None };
        assert_eq!(full.resolve(4), Ok(Selection::Range(0..4)));

        let tail = PositionSpec::Range { start: Some(-2), stop: None };
        assert_eq!(tail.resolve(5), Ok(Selection::Range(3..5)));

        let past_end = PositionSpec::Range { start: Some(2), stop: Some(10) };
        assert_eq!(past_end.resolve(4), Ok(Selection::Range(2..4)));

        let inverted = PositionSpec::Range { start: Some(3), stop: Some(1) };
        assert_eq!(inverted.resolve(5), Ok(Selection::Range(3..3)));
    }

    #[test]
    fn single_index_never_clamps() {
        assert_eq!(PositionSpec::Index(-1).resolve(3), Ok(Selection::Single(2)));
        assert_eq!(PositionSpec::Index(10).resolve(3), Err(10));
        assert_eq!(PositionSpec::Index(-4).resolve(3), Err(-4));
    }

    #[test]
    fn deserializes_integer_and_string_positions() {
        let template: Template = serde_json::from_value(json!({
            "fields": [
                {"positionSpec": 0, "name": "x", "type": "number"},
                {"index": "1:", "name": "y", "title": "Y"}
            ],
            "primaryKey": "x"
        }))
        .unwrap();

        assert_eq!(template.fields[0].position, PositionSpec::Index(0));
        assert_eq!(template.fields[0].metadata["type"], json!("number"));
        assert_eq!(
            template.fields[1].position,
            PositionSpec::Range { start: Some(1), stop: None }
        );
        assert_eq!(template.primary_key, Some(vec!["x".to_string()]));
    }

    #[test]
    fn stepped_slice_is_rejected_with_reason() {
        match "0::2".parse::<PositionSpec>() {
            Err(TemplateError::InvalidPositionSpec { spec, reason }) => {
                assert_eq!(spec, "0::2");
                assert!(reason.contains("steps are not supported"));
            }
            other => panic!("expected InvalidPositionSpec, got {:?}", other),
        }
        assert!("1:2:3:4".parse::<PositionSpec>().is_err());
    }

    proptest! {
        #[test]
        fn range_resolution_stays_in_bounds(
            start in proptest::option::of(-20i64..20),
            stop in proptest::option::of(-20i64..20),
            width in 0usize..12,
        ) {
            let spec = PositionSpec::Range { start, stop };
            match spec.resolve(width) {
                Ok(Selection::Range(range)) => {
                    prop_assert!(range.start <= range.end);
                    prop_assert!(range.end <= width);
                }
                other => prop_assert!(false, "unexpected resolution {:?}", other),
            }
        }
    }
}
