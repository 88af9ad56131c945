//! Decomposition driver
//!
//! Orchestrates one full decomposition: validate the chart, recurse into
//! nested types depth-first, synthesize components, build slice-id set,
//! layers, cake, relation and journal tables, mirror the chart into schema
//! rows, stamp every table with its schema hash, and hand the result to the
//! deduplication pass.

use std::collections::{HashMap, HashSet};

use serde_json::{json, Map, Value};
use tracing::debug;

use crate::chart::Chart;
use crate::decompose::component::create_component;
use crate::decompose::resolve::child_records;
use crate::decompose::schema::invocation_table_cfgs;
use crate::decompose::validate::validate;
use crate::dedup::remove_duplicates;
use crate::error::DecomposeError;
use crate::hash::{row_hash, with_hash, HASH_KEY};
use crate::table::{
    cake_name, components_name, history_name, layer_name, relation_name, slice_ids_name, Table,
    TableKind, TableSet, TABLE_CFGS_KEY,
};

/// Decompose a JSON document (or array of documents) according to a chart.
///
/// Returns the full table set: slice-id set, components, layers, journals,
/// relations, cake, the tables of every nested type, and one `tableCfgs`
/// schema table. Duplicate rows are already collapsed.
pub fn from_json(json: &Value, chart: &Chart) -> Result<TableSet, DecomposeError> {
    validate(chart)?;

    // A single document is a one-element batch.
    let records: Vec<Value> = match json {
        Value::Array(items) => items.clone(),
        single => vec![single.clone()],
    };
    decompose_batch(&records, chart)
}

/// Per-parent slice-id lists of one nested type, feeding the relation
/// tables.
struct NestedSliceIds {
    type_name: String,
    /// `(parent slice id, child slice ids)` in parent-record order.
    per_parent: Vec<(Value, Vec<Value>)>,
}

fn decompose_batch(records: &[Value], chart: &Chart) -> Result<TableSet, DecomposeError> {
    let type_name = chart.type_name.as_deref();
    debug!(
        chart = chart.label(),
        records = records.len(),
        "decomposing batch"
    );

    // Nested types first: their hashes are inputs to the parent's reference
    // resolution.
    let mut nested_set = TableSet::new();
    let mut nested_slice_ids = Vec::new();
    for sub in &chart.nested_types {
        let path = sub.source_path.as_deref();

        let mut batch = Vec::new();
        let mut per_parent = Vec::with_capacity(records.len());
        for record in records {
            let children = child_records(record, path);
            per_parent.push((
                record.get(&chart.slice_id_field).cloned().unwrap_or(Value::Null),
                children
                    .iter()
                    .map(|c| c.get(&sub.slice_id_field).cloned().unwrap_or(Value::Null))
                    .collect(),
            ));
            batch.extend(children);
        }

        if let Some(ref sub_type) = sub.type_name {
            nested_slice_ids.push(NestedSliceIds {
                type_name: sub_type.clone(),
                per_parent,
            });
        }

        nested_set.merge(decompose_batch(&batch, sub)?);
    }

    // Slice-id set of this batch.
    let ids: Vec<Value> = records
        .iter()
        .map(|record| record.get(&chart.slice_id_field).cloned().unwrap_or(Value::Null))
        .collect();
    let slice_ids_key = slice_ids_name(type_name);
    let slice_ids_row = with_hash(json!({ "add": ids }));
    let slice_ids_hash = row_hash(&slice_ids_row)
        .expect("a freshly stamped row carries a hash")
        .to_string();
    let slice_ids_table = Table::with_rows(TableKind::SliceIds, vec![slice_ids_row]);

    // Components of this chart, nested results threaded through for
    // reference resolution.
    let mut components = TableSet::new();
    for (key, decl) in &chart.components {
        components.merge(create_component(
            records,
            key,
            decl,
            type_name,
            Some(chart),
            Some(&nested_set),
        )?);
    }

    let mut histories = TableSet::new();
    for name in components.names() {
        histories.insert(history_name(name), Table::new(TableKind::InsertHistory));
    }

    // One layer per component table, unless skipped for this component.
    let skip: HashSet<String> = chart
        .skip_layer_for
        .iter()
        .map(|key| components_name(key, type_name))
        .collect();

    let mut layers = TableSet::new();
    for (name, table) in components.iter() {
        if skip.contains(name) {
            continue;
        }

        let mut add = Map::new();
        for (idx, id) in ids.iter().enumerate() {
            let hash = table
                .row_hash(idx)
                .expect("one stamped component row exists per record")
                .to_string();
            add.insert(layer_key(id), Value::String(hash));
        }
        let layer_row = with_hash(json!({
            "add": add,
            "sliceIdsTable": slice_ids_key,
            "sliceIdsTableRow": slice_ids_hash,
            "componentsTable": name,
        }));

        let layer_table_key = layer_name(name);
        histories.insert(
            history_name(&layer_table_key),
            Table::new(TableKind::InsertHistory),
        );
        layers.insert(
            layer_table_key,
            Table::with_rows(TableKind::Layers, vec![layer_row]),
        );
    }

    // The cake aggregates one entry per layer.
    let cake_key = cake_name(type_name);
    let mut cake_layers = Map::new();
    for (layer_key, layer_table) in layers.iter() {
        let hash = layer_table
            .row_hash(0)
            .expect("every layer table holds one stamped row")
            .to_string();
        cake_layers.insert(layer_key.to_string(), Value::String(hash));
    }
    let cake_row = with_hash(json!({
        "sliceIdsTable": slice_ids_key,
        "sliceIdsRow": slice_ids_hash,
        "layers": cake_layers,
    }));
    let cake_hash = row_hash(&cake_row)
        .expect("a freshly stamped row carries a hash")
        .to_string();
    let cake_table = Table::with_rows(TableKind::Cakes, vec![cake_row]);
    histories.insert(history_name(&cake_key), Table::new(TableKind::InsertHistory));
    histories.insert(history_name(&slice_ids_key), Table::new(TableKind::InsertHistory));

    // Empty edit journals, populated outside this core.
    let mut edits = TableSet::new();
    edits.insert(format!("{cake_key}Edits"), Table::new(TableKind::Edits));
    edits.insert(
        format!("{cake_key}MultiEdits"),
        Table::new(TableKind::MultiEdits),
    );
    edits.insert(
        format!("{cake_key}EditHistory"),
        Table::new(TableKind::EditHistory),
    );

    // Relation tables: parent cake to ordered child slice ids, one row per
    // parent record.
    let mut relations = TableSet::new();
    for nested in &nested_slice_ids {
        let relation_key = relation_name(type_name, &nested.type_name);
        let column = format!("{}s", nested.type_name.to_lowercase());

        let rows: Vec<Value> = nested
            .per_parent
            .iter()
            .map(|(_, child_ids)| {
                with_hash(json!({
                    &column: [{ "ref": cake_hash, "sliceIds": child_ids }],
                }))
            })
            .collect();

        let mut add = Map::new();
        for ((parent_id, _), row) in nested.per_parent.iter().zip(&rows) {
            let hash = row_hash(row)
                .expect("a freshly stamped row carries a hash")
                .to_string();
            add.insert(layer_key(parent_id), Value::String(hash));
        }
        let relation_layer_row = with_hash(json!({
            "add": add,
            "sliceIdsTable": slice_ids_key,
            "sliceIdsTableRow": slice_ids_hash,
            "componentsTable": relation_key,
        }));

        histories.insert(
            history_name(&relation_key),
            Table::new(TableKind::InsertHistory),
        );
        histories.insert(
            history_name(&layer_name(&relation_key)),
            Table::new(TableKind::InsertHistory),
        );
        relations.insert(
            layer_name(&relation_key),
            Table::with_rows(TableKind::Layers, vec![relation_layer_row]),
        );
        relations.insert(
            relation_key,
            Table::with_rows(TableKind::Components, rows),
        );
    }

    // Mirror the chart into schema rows; merge the schemas the nested
    // recursion already produced.
    let mut cfg_rows: Vec<Value> = invocation_table_cfgs(chart)
        .iter()
        .map(|cfg| with_hash(cfg.to_row()))
        .collect();
    if let Some(nested_cfgs) = nested_set.remove(TABLE_CFGS_KEY) {
        cfg_rows.extend(nested_cfgs.rows);
    }
    let schema_hashes: HashMap<String, String> = cfg_rows
        .iter()
        .filter_map(|row| {
            Some((
                row.get("key")?.as_str()?.to_string(),
                row.get(HASH_KEY)?.as_str()?.to_string(),
            ))
        })
        .collect();

    // Assemble and stamp.
    let mut result = TableSet::new();
    result.insert(slice_ids_key, slice_ids_table);
    result.merge(components);
    result.merge(layers);
    result.merge(histories);
    result.merge(edits);
    result.merge(relations);
    result.insert(cake_key, cake_table);
    result.merge(nested_set);

    for (name, table) in result.iter_mut() {
        let schema_hash = schema_hashes
            .get(name)
            .ok_or_else(|| DecomposeError::MissingTableCfg(name.to_string()))?;
        table.schema_hash = Some(schema_hash.clone());
    }
    result.insert(
        TABLE_CFGS_KEY,
        Table::with_rows(TableKind::TableCfgs, cfg_rows),
    );

    debug!(
        chart = chart.label(),
        tables = result.len(),
        "assembled table set"
    );
    Ok(remove_duplicates(result))
}

/// Layer maps are keyed by the string form of a slice id.
fn layer_key(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
