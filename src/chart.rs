//! Decomposition charts
//!
//! A chart declares how one record shape is decomposed into tables: which
//! field identifies a record (the slice id), which groups of fields become
//! component tables, where nested types live inside a parent record, and
//! which components are excluded from layer/cake creation.
//!
//! Charts arrive as plain JSON (string paths, `key@Type` reference tokens,
//! `{origin, destination}` renames, nested maps for grouped components).
//! [`Chart::from_value`] resolves this duck-typed form into a closed set of
//! tagged variants so every property-item kind is handled exactly once by
//! exhaustive matching downstream.

use serde_json::Value;

use crate::error::DecomposeError;

/// Chart keys reserved for structure rather than component declarations.
/// Every key starting with `_` is reserved; these are the ones carrying
/// meaning today.
pub const SLICE_ID_KEY: &str = "_sliceId";
pub const TYPE_NAME_KEY: &str = "_name";
pub const SOURCE_PATH_KEY: &str = "_path";
pub const NESTED_TYPES_KEY: &str = "_types";
pub const SKIP_LAYER_KEY: &str = "_skipLayerCreation";

/// One property item inside a leaf component declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyItem {
    /// A slash-delimited path into the source record, optionally emitted
    /// under a different destination name.
    Path {
        origin: String,
        destination: Option<String>,
    },
    /// `componentKey@Type`: resolves to the content hashes of the named
    /// nested component's rows, in source order.
    Reference {
        component: String,
        type_name: String,
        destination: Option<String>,
    },
    /// `sliceId@Type`: resolves to the ordered slice ids of the nested
    /// type's child records on the current parent record.
    SliceIds {
        type_name: String,
        destination: Option<String>,
    },
}

impl PropertyItem {
    /// Parse the string form of a property item. A `@` marks a reference
    /// token; everything else is a source path.
    pub fn parse(raw: &str, destination: Option<String>) -> Self {
        match raw.split_once('@') {
            Some((component, type_name)) if component == "sliceId" => PropertyItem::SliceIds {
                type_name: type_name.to_string(),
                destination,
            },
            Some((component, type_name)) => PropertyItem::Reference {
                component: component.to_string(),
                type_name: type_name.to_string(),
                destination,
            },
            None => PropertyItem::Path {
                origin: raw.to_string(),
                destination,
            },
        }
    }

    fn from_value(value: &Value) -> Result<Self, DecomposeError> {
        match value {
            Value::String(s) => Ok(PropertyItem::parse(s, None)),
            Value::Object(obj) => {
                let origin = obj.get("origin").and_then(Value::as_str).ok_or_else(|| {
                    DecomposeError::InvalidChart(
                        "property item object needs a string 'origin'".to_string(),
                    )
                })?;
                let destination = obj
                    .get("destination")
                    .and_then(Value::as_str)
                    .map(str::to_string);
                Ok(PropertyItem::parse(origin, destination))
            }
            other => Err(DecomposeError::InvalidChart(format!(
                "property item must be a string or an origin/destination object, got {other}"
            ))),
        }
    }
}

/// The declaration attached to one component key: either an ordered list of
/// property items (leaf form) or a nested map of component keys (grouped
/// form), recursively.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyDecl {
    Items(Vec<PropertyItem>),
    Group(Vec<(String, PropertyDecl)>),
}

impl PropertyDecl {
    fn from_value(value: &Value) -> Result<Self, DecomposeError> {
        match value {
            Value::Array(items) => {
                let items = items
                    .iter()
                    .map(PropertyItem::from_value)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(PropertyDecl::Items(items))
            }
            Value::Object(map) => {
                let mut group = Vec::with_capacity(map.len());
                for (key, inner) in map.iter() {
                    group.push((key.clone(), PropertyDecl::from_value(inner)?));
                }
                Ok(PropertyDecl::Group(group))
            }
            other => Err(DecomposeError::InvalidChart(format!(
                "component declaration must be a list or a nested map, got {other}"
            ))),
        }
    }
}

/// A recursive decomposition schema for one record shape.
///
/// Component keys are kept as an ordered list: declaration order determines
/// table order and wrapper-row field order, and object iteration order is not
/// part of this crate's contract.
#[derive(Debug, Clone, PartialEq)]
pub struct Chart {
    /// Name of the record field holding the unique identifier of one record
    /// within this chart's scope.
    pub slice_id_field: String,
    /// Namespace prefix applied to every table this chart produces.
    pub type_name: Option<String>,
    /// Where, inside a parent record, the records this chart decomposes are
    /// found. Set only on nested-type charts.
    pub source_path: Option<String>,
    /// Component keys for which no layer/cake entry is produced.
    pub skip_layer_for: Vec<String>,
    /// Nested-type charts, decomposed before this chart's own components.
    pub nested_types: Vec<Chart>,
    /// Ordered component declarations.
    pub components: Vec<(String, PropertyDecl)>,
}

impl Chart {
    /// Parse a chart from its plain JSON form.
    pub fn from_value(value: &Value) -> Result<Chart, DecomposeError> {
        let obj = value.as_object().ok_or_else(|| {
            DecomposeError::InvalidChart("chart must be a JSON object".to_string())
        })?;

        let slice_id_field = obj
            .get(SLICE_ID_KEY)
            .and_then(Value::as_str)
            .ok_or_else(|| {
                DecomposeError::InvalidChart(format!("chart needs a string {SLICE_ID_KEY}"))
            })?
            .to_string();

        let type_name = obj
            .get(TYPE_NAME_KEY)
            .and_then(Value::as_str)
            .map(str::to_string);
        let source_path = obj
            .get(SOURCE_PATH_KEY)
            .and_then(Value::as_str)
            .map(str::to_string);

        let skip_layer_for = match obj.get(SKIP_LAYER_KEY) {
            None => Vec::new(),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| {
                    item.as_str().map(str::to_string).ok_or_else(|| {
                        DecomposeError::InvalidChart(format!(
                            "{SKIP_LAYER_KEY} entries must be strings"
                        ))
                    })
                })
                .collect::<Result<Vec<_>, _>>()?,
            Some(other) => {
                return Err(DecomposeError::InvalidChart(format!(
                    "{SKIP_LAYER_KEY} must be a list of component keys, got {other}"
                )))
            }
        };

        let nested_types = match obj.get(NESTED_TYPES_KEY) {
            None => Vec::new(),
            Some(Value::Array(charts)) => charts
                .iter()
                .map(Chart::from_value)
                .collect::<Result<Vec<_>, _>>()?,
            Some(other) => {
                return Err(DecomposeError::InvalidChart(format!(
                    "{NESTED_TYPES_KEY} must be a list of charts, got {other}"
                )))
            }
        };

        let mut components = Vec::new();
        for (key, decl) in obj.iter() {
            if key.starts_with('_') {
                continue;
            }
            components.push((key.clone(), PropertyDecl::from_value(decl)?));
        }

        Ok(Chart {
            slice_id_field,
            type_name,
            source_path,
            skip_layer_for,
            nested_types,
            components,
        })
    }

    /// Find a nested-type chart by its type name.
    pub fn nested_type(&self, type_name: &str) -> Option<&Chart> {
        self.nested_types
            .iter()
            .find(|t| t.type_name.as_deref() == Some(type_name))
    }

    /// Find a component declaration by key.
    pub fn component(&self, key: &str) -> Option<&PropertyDecl> {
        self.components
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, decl)| decl)
    }

    /// Label used in error messages for this chart.
    pub fn label(&self) -> &str {
        self.type_name.as_deref().unwrap_or("Main Chart")
    }
}
