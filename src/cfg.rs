//! Schema rows (`TableCfg`) for generated tables
//!
//! Every table the engine produces is accompanied by exactly one schema row
//! in the `tableCfgs` table: its key, kind, ordered column descriptors and
//! root/head/shared flags. Component schemas are synthesized by mirroring
//! the component recursion (see `decompose::schema`); the fixed-shape tables
//! (layers, cakes, slice-id sets, journals) get their schemas from the
//! builders below.

use serde::Serialize;
use serde_json::Value;

use crate::table::{history_name, slice_ids_name, TableKind};

/// Inferred type of one column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ColumnType {
    String,
    Number,
    Boolean,
    Json,
    JsonArray,
}

/// Reference target of a column holding content hashes of another table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnRef {
    pub table_key: String,
}

/// One column descriptor of a schema row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnCfg {
    pub key: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    pub title_long: String,
    pub title_short: String,
    #[serde(rename = "ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<ColumnRef>,
}

impl ColumnCfg {
    /// Plain column; titles are derived from the key.
    pub fn new(key: impl Into<String>, column_type: ColumnType) -> Self {
        let key = key.into();
        let mut chars = key.chars();
        let title_long = match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        };
        ColumnCfg {
            title_short: key.clone(),
            key,
            column_type,
            title_long,
            reference: None,
        }
    }

    pub fn with_titles(
        mut self,
        title_long: impl Into<String>,
        title_short: impl Into<String>,
    ) -> Self {
        self.title_long = title_long.into();
        self.title_short = title_short.into();
        self
    }

    /// Mark the column as a reference into another table.
    pub fn with_ref(mut self, table_key: impl Into<String>) -> Self {
        self.reference = Some(ColumnRef {
            table_key: table_key.into(),
        });
        self
    }

    /// The `_hash` column every table starts with.
    pub fn hash_column() -> Self {
        ColumnCfg::new("_hash", ColumnType::String).with_titles("Hash", "Hash")
    }
}

/// One schema row: the full description of one generated table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableCfg {
    pub key: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub columns: Vec<ColumnCfg>,
    pub is_head: bool,
    pub is_root: bool,
    pub is_shared: bool,
}

impl TableCfg {
    pub fn new(key: impl Into<String>, kind: TableKind, columns: Vec<ColumnCfg>) -> Self {
        TableCfg {
            key: key.into(),
            kind: kind.as_str(),
            columns,
            is_head: false,
            is_root: false,
            is_shared: false,
        }
    }

    /// The unhashed JSON row for this schema entry.
    pub fn to_row(&self) -> Value {
        serde_json::to_value(self).expect("a TableCfg always serializes to JSON")
    }
}

/// Schema of a layer table: slice-id-to-hash mapping plus the slice-id-set
/// row and component table it overlays.
pub fn layer_table_cfg(layer_key: &str, components_table: &str) -> TableCfg {
    TableCfg::new(
        layer_key,
        TableKind::Layers,
        vec![
            ColumnCfg::hash_column(),
            ColumnCfg::new("add", ColumnType::Json).with_titles("Added Slice Hashes", "Add"),
            ColumnCfg::new("sliceIdsTable", ColumnType::String)
                .with_titles("Slice ID Table", "Slice IDs"),
            ColumnCfg::new("sliceIdsTableRow", ColumnType::String)
                .with_titles("Slice ID Row", "Row"),
            ColumnCfg::new("componentsTable", ColumnType::String)
                .with_titles("Components Table", "Components")
                .with_ref(components_table),
        ],
    )
}

/// Schema of a cake table: one row aggregating all layers of one invocation.
pub fn cake_table_cfg(cake_key: &str) -> TableCfg {
    TableCfg::new(
        cake_key,
        TableKind::Cakes,
        vec![
            ColumnCfg::hash_column(),
            ColumnCfg::new("sliceIdsTable", ColumnType::String)
                .with_titles("Slice ID Table", "Slice IDs"),
            ColumnCfg::new("sliceIdsRow", ColumnType::String).with_titles("Slice ID Row", "Row"),
            ColumnCfg::new("layers", ColumnType::Json).with_titles("Layers", "Layers"),
        ],
    )
}

/// Schema of a slice-id-set table, with placeholders for future incremental
/// `base`/`remove` lists.
pub fn slice_ids_table_cfg(type_name: Option<&str>) -> TableCfg {
    TableCfg::new(
        slice_ids_name(type_name),
        TableKind::SliceIds,
        vec![
            ColumnCfg::hash_column(),
            ColumnCfg::new("base", ColumnType::String).with_titles("Base Slice ID", "Base"),
            ColumnCfg::new("add", ColumnType::JsonArray).with_titles("Slice IDs", "IDs"),
            ColumnCfg::new("remove", ColumnType::JsonArray)
                .with_titles("Removed Slice IDs", "Removed"),
        ],
    )
}

/// Schema of the insert-history journal that accompanies a table.
pub fn insert_history_table_cfg(table_cfg: &TableCfg) -> TableCfg {
    TableCfg::new(
        history_name(&table_cfg.key),
        TableKind::InsertHistory,
        vec![
            ColumnCfg::hash_column(),
            ColumnCfg::new("inserts", ColumnType::JsonArray)
                .with_titles("Inserted Rows", "Inserts")
                .with_ref(&table_cfg.key),
        ],
    )
}

/// Schema of the edits journal attached to a cake.
pub fn edit_table_cfg(cake_key: &str) -> TableCfg {
    TableCfg::new(
        format!("{cake_key}Edits"),
        TableKind::Edits,
        vec![
            ColumnCfg::hash_column(),
            ColumnCfg::new("edit", ColumnType::Json).with_titles("Edit", "Edit"),
            ColumnCfg::new("cake", ColumnType::String)
                .with_titles("Cake", "Cake")
                .with_ref(cake_key),
        ],
    )
}

/// Schema of the multi-edits journal attached to a cake.
pub fn multi_edit_table_cfg(cake_key: &str) -> TableCfg {
    TableCfg::new(
        format!("{cake_key}MultiEdits"),
        TableKind::MultiEdits,
        vec![
            ColumnCfg::hash_column(),
            ColumnCfg::new("edits", ColumnType::JsonArray)
                .with_titles("Edits", "Edits")
                .with_ref(format!("{cake_key}Edits")),
        ],
    )
}

/// Schema of the edit-history journal attached to a cake.
pub fn edit_history_table_cfg(cake_key: &str) -> TableCfg {
    TableCfg::new(
        format!("{cake_key}EditHistory"),
        TableKind::EditHistory,
        vec![
            ColumnCfg::hash_column(),
            ColumnCfg::new("edit", ColumnType::String)
                .with_titles("Edit", "Edit")
                .with_ref(format!("{cake_key}Edits")),
        ],
    )
}
