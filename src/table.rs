//! Table types and table-name derivation
//!
//! The engine's output is an ordered set of named tables. Each table is an
//! append-only sequence of hashed rows plus, once assembly finishes, the
//! content hash of its own schema row. Order matters everywhere: row order
//! mirrors source-record order and table order mirrors creation order, so
//! the set is a sequence of (name, table) pairs rather than a hash map.

use serde_json::{Map, Value};

use crate::hash::HASH_KEY;

/// Key of the schema table present in every result set.
pub const TABLE_CFGS_KEY: &str = "tableCfgs";

/// The kind of a generated table, stored as `_type` on its JSON form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    Components,
    Layers,
    Cakes,
    SliceIds,
    InsertHistory,
    Edits,
    MultiEdits,
    EditHistory,
    TableCfgs,
}

impl TableKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TableKind::Components => "components",
            TableKind::Layers => "layers",
            TableKind::Cakes => "cakes",
            TableKind::SliceIds => "sliceIds",
            TableKind::InsertHistory => "insertHistory",
            TableKind::Edits => "edits",
            TableKind::MultiEdits => "multiEdits",
            TableKind::EditHistory => "editHistory",
            TableKind::TableCfgs => "tableCfgs",
        }
    }
}

/// One generated table: an ordered sequence of hashed rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub kind: TableKind,
    pub rows: Vec<Value>,
    /// Content hash of this table's schema row, stamped by the driver once
    /// the schema table is assembled.
    pub schema_hash: Option<String>,
}

impl Table {
    pub fn new(kind: TableKind) -> Self {
        Table {
            kind,
            rows: Vec::new(),
            schema_hash: None,
        }
    }

    pub fn with_rows(kind: TableKind, rows: Vec<Value>) -> Self {
        Table {
            kind,
            rows,
            schema_hash: None,
        }
    }

    /// Hash of the row at `idx`, if the row is stamped.
    pub fn row_hash(&self, idx: usize) -> Option<&str> {
        self.rows
            .get(idx)
            .and_then(|row| row.get(HASH_KEY))
            .and_then(Value::as_str)
    }

    /// JSON form: `{"_type": ..., "_data": [...], "tableCfg": ...}`.
    pub fn to_value(&self) -> Value {
        let mut obj = Map::new();
        obj.insert(
            "_type".to_string(),
            Value::String(self.kind.as_str().to_string()),
        );
        obj.insert("_data".to_string(), Value::Array(self.rows.clone()));
        if let Some(ref schema_hash) = self.schema_hash {
            obj.insert("tableCfg".to_string(), Value::String(schema_hash.clone()));
        }
        Value::Object(obj)
    }
}

/// An ordered collection of named tables.
///
/// Each invocation of the driver returns a freshly built set; nested results
/// are merged in by the owning call, never shared across sibling subtrees.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableSet {
    entries: Vec<(String, Table)>,
}

impl TableSet {
    pub fn new() -> Self {
        TableSet::default()
    }

    /// Insert a table, replacing any table already stored under `name`.
    /// Valid charts never collide here: the validator guarantees table-name
    /// uniqueness across the chart tree.
    pub fn insert(&mut self, name: impl Into<String>, table: Table) {
        let name = name.into();
        if let Some(entry) = self.entries.iter_mut().find(|(n, _)| *n == name) {
            entry.1 = table;
        } else {
            self.entries.push((name, table));
        }
    }

    pub fn get(&self, name: &str) -> Option<&Table> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, t)| t)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Table> {
        let idx = self.entries.iter().position(|(n, _)| n == name)?;
        Some(self.entries.remove(idx).1)
    }

    /// Move every table of `other` into this set, in order.
    pub fn merge(&mut self, other: TableSet) {
        for (name, table) in other.entries {
            self.insert(name, table);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Table)> {
        self.entries.iter().map(|(n, t)| (n.as_str(), t))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut Table)> {
        self.entries.iter_mut().map(|(n, t)| (n.as_str(), &mut *t))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// JSON form: an object mapping table name to table contents, in set
    /// order.
    pub fn to_value(&self) -> Value {
        let mut obj = Map::new();
        for (name, table) in &self.entries {
            obj.insert(name.clone(), table.to_value());
        }
        Value::Object(obj)
    }
}

impl IntoIterator for TableSet {
    type Item = (String, Table);
    type IntoIter = std::vec::IntoIter<(String, Table)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Capitalize the first character of a key for camel-cased table names.
fn capitalize(key: &str) -> String {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Name of the component table for `(componentKey, typeName)`.
///
/// With a type name the key is namespaced (`wheel` + `brand` → `wheelBrand`),
/// without one the key itself is used in lowercase.
pub fn components_name(key: &str, type_name: Option<&str>) -> String {
    match type_name {
        Some(type_name) if !type_name.is_empty() => {
            format!("{}{}", type_name.to_lowercase(), capitalize(key))
        }
        _ => key.to_lowercase(),
    }
}

/// Name of the slice-id-set table for a type (`wheelSliceId` / `sliceId`).
pub fn slice_ids_name(type_name: Option<&str>) -> String {
    match type_name {
        Some(type_name) if !type_name.is_empty() => {
            format!("{}SliceId", type_name.to_lowercase())
        }
        _ => "sliceId".to_string(),
    }
}

/// Name of the cake table for a type (`wheelCake` / `cake`).
pub fn cake_name(type_name: Option<&str>) -> String {
    match type_name {
        Some(type_name) if !type_name.is_empty() => {
            format!("{}Cake", type_name.to_lowercase())
        }
        _ => "cake".to_string(),
    }
}

/// Name of the layer table overlaying a component table.
pub fn layer_name(components_table: &str) -> String {
    format!("{components_table}Layer")
}

/// Name of the insert-history journal for a table.
pub fn history_name(table: &str) -> String {
    format!("{table}InsertHistory")
}

/// Name of the relation table linking a parent type to a nested type's
/// slice-id lists.
pub fn relation_name(parent_type: Option<&str>, sub_type: &str) -> String {
    format!(
        "{}{}s",
        parent_type.map(str::to_lowercase).unwrap_or_default(),
        sub_type
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_components_name() {
        assert_eq!(components_name("brand", Some("Wheel")), "wheelBrand");
        assert_eq!(components_name("general", None), "general");
        assert_eq!(components_name("Color", None), "color");
        assert_eq!(components_name("sliceId", Some("Wheel")), "wheelSliceId");
    }

    #[test]
    fn test_derived_names() {
        assert_eq!(slice_ids_name(Some("Car")), "carSliceId");
        assert_eq!(slice_ids_name(None), "sliceId");
        assert_eq!(cake_name(Some("Car")), "carCake");
        assert_eq!(cake_name(None), "cake");
        assert_eq!(layer_name("general"), "generalLayer");
        assert_eq!(history_name("general"), "generalInsertHistory");
        assert_eq!(relation_name(Some("Car"), "Wheel"), "carWheels");
    }

    #[test]
    fn test_set_preserves_insertion_order() {
        let mut set = TableSet::new();
        set.insert("zulu", Table::new(TableKind::Components));
        set.insert("alpha", Table::new(TableKind::Layers));

        let names: Vec<&str> = set.names().collect();
        assert_eq!(names, vec!["zulu", "alpha"]);
    }

    #[test]
    fn test_merge_moves_tables() {
        let mut a = TableSet::new();
        a.insert("one", Table::new(TableKind::Components));

        let mut b = TableSet::new();
        b.insert("two", Table::new(TableKind::Layers));
        a.merge(b);

        assert!(a.contains("one"));
        assert!(a.contains("two"));
        assert_eq!(a.len(), 2);
    }

    #[test]
    fn test_table_to_value() {
        let mut table = Table::with_rows(TableKind::Components, vec![json!({"model": "X"})]);
        table.schema_hash = Some("abc".to_string());

        let value = table.to_value();
        assert_eq!(value["_type"], "components");
        assert_eq!(value["_data"][0]["model"], "X");
        assert_eq!(value["tableCfg"], "abc");
    }
}
