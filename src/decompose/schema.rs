//! Schema synthesis
//!
//! Mirrors the component synthesizer's recursion over chart shape alone, so
//! every table one invocation can produce has exactly one matching schema
//! row. Field names for plain paths are learned from a synthetic skeleton
//! record resolved through the same path walk the data side uses; reference
//! columns are typed as identifiers.

use std::collections::HashSet;

use serde_json::{Map, Value};

use crate::cfg::{
    cake_table_cfg, edit_history_table_cfg, edit_table_cfg, insert_history_table_cfg,
    layer_table_cfg, multi_edit_table_cfg, slice_ids_table_cfg, ColumnCfg, ColumnType, TableCfg,
};
use crate::chart::{Chart, PropertyDecl, PropertyItem};
use crate::decompose::resolve::resolve_path;
use crate::table::{cake_name, components_name, layer_name, relation_name, slice_ids_name, TableKind};

/// Placeholder leaf value used in skeleton records.
const PLACEHOLDER: &str = "string";

/// Build the synthetic record a path declaration would have been resolved
/// against: nested one-key objects ending in a placeholder string.
fn skeleton_from_path(origin: &str) -> Value {
    let mut value = Value::String(PLACEHOLDER.to_string());
    for segment in origin.split('/').rev() {
        let mut obj = Map::new();
        obj.insert(segment.to_string(), value);
        value = Value::Object(obj);
    }
    value
}

/// Column type inferred from a skeleton placeholder.
fn column_type_of(placeholder: &Value) -> ColumnType {
    match placeholder {
        Value::Bool(_) => ColumnType::Boolean,
        Value::Number(_) => ColumnType::Number,
        Value::Array(_) => ColumnType::JsonArray,
        Value::Object(_) => ColumnType::Json,
        _ => ColumnType::String,
    }
}

/// One column per property item, named exactly as the data side names the
/// resolved field.
fn item_column(item: &PropertyItem) -> ColumnCfg {
    match item {
        PropertyItem::Path {
            origin,
            destination,
        } => {
            let skeleton = skeleton_from_path(origin);
            let (name, placeholder) = resolve_path(&skeleton, origin, destination.as_deref())
                .expect("a skeleton always resolves its own path");
            ColumnCfg::new(name, column_type_of(&placeholder))
        }
        PropertyItem::Reference {
            component,
            type_name,
            destination,
        } => {
            let type_arg = (!type_name.is_empty()).then_some(type_name.as_str());
            let table = components_name(component, type_arg);
            let name = destination.clone().unwrap_or_else(|| table.clone());
            ColumnCfg::new(name, ColumnType::String).with_ref(table)
        }
        PropertyItem::SliceIds {
            type_name,
            destination,
        } => {
            let table = slice_ids_name(Some(type_name));
            let name = destination.clone().unwrap_or_else(|| table.clone());
            ColumnCfg::new(name, ColumnType::String).with_ref(table)
        }
    }
}

/// Schema rows for one component declaration, in the same table order the
/// component synthesizer produces: sub-component schemas first, wrapper
/// schema last.
pub(crate) fn component_table_cfgs(
    component_key: &str,
    decl: &PropertyDecl,
    type_name: Option<&str>,
) -> Vec<TableCfg> {
    match decl {
        PropertyDecl::Items(items) => {
            let mut columns = vec![ColumnCfg::hash_column()];
            columns.extend(items.iter().map(item_column));
            vec![TableCfg::new(
                components_name(component_key, type_name),
                TableKind::Components,
                columns,
            )]
        }
        PropertyDecl::Group(group) => {
            let mut cfgs = Vec::new();
            for (sub_key, sub_decl) in group {
                cfgs.extend(component_table_cfgs(sub_key, sub_decl, type_name));
            }

            let mut columns = vec![ColumnCfg::hash_column()];
            for (sub_key, _) in group {
                let sub_name = components_name(sub_key, type_name);
                columns.push(ColumnCfg::new(&sub_name, ColumnType::String).with_ref(&sub_name));
            }
            cfgs.push(TableCfg::new(
                components_name(component_key, type_name),
                TableKind::Components,
                columns,
            ));
            cfgs
        }
    }
}

/// Schema row for the relation table linking a parent cake to a nested
/// type's slice-id lists.
fn relation_table_cfg(parent_type: Option<&str>, sub_type: &str) -> TableCfg {
    let column_key = format!("{}s", sub_type.to_lowercase());
    TableCfg::new(
        relation_name(parent_type, sub_type),
        TableKind::Components,
        vec![
            ColumnCfg::hash_column(),
            ColumnCfg::new(column_key, ColumnType::JsonArray)
                .with_titles(
                    format!("{sub_type} References"),
                    format!("{sub_type}s"),
                )
                .with_ref(cake_name(Some(sub_type))),
        ],
    )
}

/// All schema rows for the tables one driver invocation produces, nested
/// recursion excluded. The walk is kept structurally identical to the
/// driver's table creation so data tables and schema rows stay a bijection.
pub(crate) fn invocation_table_cfgs(chart: &Chart) -> Vec<TableCfg> {
    let type_name = chart.type_name.as_deref();
    let skip: HashSet<String> = chart
        .skip_layer_for
        .iter()
        .map(|key| components_name(key, type_name))
        .collect();

    let mut cfgs = Vec::new();

    // Components, their journals, and a layer per non-skipped component
    // table (grouped declarations contribute one layer per produced table).
    for (key, decl) in &chart.components {
        for cfg in component_table_cfgs(key, decl, type_name) {
            let history = insert_history_table_cfg(&cfg);
            let layer = if skip.contains(&cfg.key) {
                None
            } else {
                Some(layer_table_cfg(&layer_name(&cfg.key), &cfg.key))
            };
            cfgs.push(cfg);
            cfgs.push(history);
            if let Some(layer) = layer {
                let layer_history = insert_history_table_cfg(&layer);
                cfgs.push(layer);
                cfgs.push(layer_history);
            }
        }
    }

    let cake_key = cake_name(type_name);
    let cake = cake_table_cfg(&cake_key);
    let cake_history = insert_history_table_cfg(&cake);
    cfgs.push(cake);
    cfgs.push(cake_history);

    cfgs.push(edit_table_cfg(&cake_key));
    cfgs.push(multi_edit_table_cfg(&cake_key));
    cfgs.push(edit_history_table_cfg(&cake_key));

    let slice_ids = slice_ids_table_cfg(type_name);
    let slice_ids_history = insert_history_table_cfg(&slice_ids);
    cfgs.push(slice_ids);
    cfgs.push(slice_ids_history);

    for nested in &chart.nested_types {
        let Some(sub_type) = nested.type_name.as_deref() else {
            continue;
        };
        let relation = relation_table_cfg(type_name, sub_type);
        let relation_history = insert_history_table_cfg(&relation);
        let relation_layer = layer_table_cfg(&layer_name(&relation.key), &relation.key);
        let relation_layer_history = insert_history_table_cfg(&relation_layer);
        cfgs.push(relation);
        cfgs.push(relation_history);
        cfgs.push(relation_layer);
        cfgs.push(relation_layer_history);
    }

    cfgs
}
