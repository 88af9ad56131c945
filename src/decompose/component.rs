//! Component synthesis
//!
//! A component is one projected field-group per source record. Leaf
//! declarations resolve their property items into one flat row per record;
//! grouped declarations synthesize one sub-component per inner key first and
//! wrap the sub-rows' content hashes into one wrapper row per record. Either
//! way the caller receives every produced table, row order matching source
//! order.

use serde_json::{Map, Value};

use crate::chart::{Chart, PropertyDecl};
use crate::decompose::resolve::resolve_item;
use crate::error::DecomposeError;
use crate::hash::hash_rows;
use crate::table::{components_name, Table, TableKind, TableSet};

/// Synthesize the component tables for one declaration over one record
/// batch.
///
/// Leaf form produces a single table; grouped form produces the
/// sub-component tables followed by their wrapper table. Given the same
/// records and chart the output is bit-identical across runs.
pub(crate) fn create_component(
    records: &[Value],
    component_key: &str,
    decl: &PropertyDecl,
    type_name: Option<&str>,
    chart: Option<&Chart>,
    nested: Option<&TableSet>,
) -> Result<TableSet, DecomposeError> {
    match decl {
        PropertyDecl::Items(items) => {
            let mut rows = Vec::with_capacity(records.len());
            for record in records {
                let mut row = Map::new();
                for item in items {
                    if let Some((name, value)) = resolve_item(record, item, chart, nested)? {
                        row.insert(name, value);
                    }
                }
                rows.push(Value::Object(row));
            }

            let mut set = TableSet::new();
            set.insert(
                components_name(component_key, type_name),
                Table::with_rows(TableKind::Components, hash_rows(rows)),
            );
            Ok(set)
        }
        PropertyDecl::Group(group) => {
            // Sub-components first, over the same records.
            let mut set = TableSet::new();
            for (sub_key, sub_decl) in group {
                set.merge(create_component(
                    records, sub_key, sub_decl, type_name, chart, nested,
                )?);
            }

            // Wrapper rows hold the sub-rows' hashes, addressed by their
            // generated table names.
            let mut rows = Vec::with_capacity(records.len());
            for idx in 0..records.len() {
                let mut row = Map::new();
                for (sub_key, _) in group {
                    let sub_name = components_name(sub_key, type_name);
                    let hash = set
                        .get(&sub_name)
                        .and_then(|table| table.row_hash(idx))
                        .expect("one stamped sub-row is synthesized per record")
                        .to_string();
                    row.insert(sub_name, Value::String(hash));
                }
                rows.push(Value::Object(row));
            }

            set.insert(
                components_name(component_key, type_name),
                Table::with_rows(TableKind::Components, hash_rows(rows)),
            );
            Ok(set)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::Chart;
    use crate::hash::content_hash;
    use serde_json::json;

    fn decl_of(chart: &Chart, key: &str) -> PropertyDecl {
        chart.component(key).unwrap().clone()
    }

    #[test]
    fn test_leaf_component_one_row_per_record() {
        let chart = Chart::from_value(&json!({
            "_sliceId": "id",
            "general": ["brand", "doors"]
        }))
        .unwrap();
        let records = vec![
            json!({"id": "a", "brand": "VW", "doors": 5}),
            json!({"id": "b", "brand": "Audi", "doors": 3}),
        ];

        let set = create_component(
            &records,
            "general",
            &decl_of(&chart, "general"),
            None,
            Some(&chart),
            None,
        )
        .unwrap();

        let table = set.get("general").unwrap();
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0]["brand"], "VW");
        assert_eq!(table.rows[1]["doors"], 3);
        assert!(table.rows[0]["_hash"].is_string());
    }

    #[test]
    fn test_missing_path_omits_field() {
        let chart = Chart::from_value(&json!({
            "_sliceId": "id",
            "color": ["colors/roof", "colors/sides"]
        }))
        .unwrap();
        let records = vec![json!({"id": "a", "colors": {"roof": "white"}})];

        let set = create_component(
            &records,
            "color",
            &decl_of(&chart, "color"),
            None,
            Some(&chart),
            None,
        )
        .unwrap();

        let row = &set.get("color").unwrap().rows[0];
        assert_eq!(row["roof"], "white");
        assert!(row.get("sides").is_none());
    }

    #[test]
    fn test_type_name_namespaces_table() {
        let chart = Chart::from_value(&json!({
            "_sliceId": "SN",
            "_name": "Wheel",
            "brand": ["brand"]
        }))
        .unwrap();
        let records = vec![json!({"SN": "A1", "brand": "Borbet"})];

        let set = create_component(
            &records,
            "brand",
            &decl_of(&chart, "brand"),
            Some("Wheel"),
            Some(&chart),
            None,
        )
        .unwrap();

        assert!(set.contains("wheelBrand"));
    }

    #[test]
    fn test_grouped_component_wraps_sub_hashes() {
        let chart = Chart::from_value(&json!({
            "_sliceId": "id",
            "shape": {
                "height": ["dims/h"],
                "width": ["dims/w"]
            }
        }))
        .unwrap();
        let records = vec![json!({"id": "a", "dims": {"h": 10, "w": 20}})];

        let set = create_component(
            &records,
            "shape",
            &decl_of(&chart, "shape"),
            None,
            Some(&chart),
            None,
        )
        .unwrap();

        // Sub tables come first, the wrapper table last.
        let names: Vec<&str> = set.names().collect();
        assert_eq!(names, vec!["height", "width", "shape"]);

        let wrapper = &set.get("shape").unwrap().rows[0];
        assert_eq!(
            wrapper["height"],
            json!(content_hash(&json!({"h": 10})))
        );
        assert_eq!(wrapper["width"], json!(content_hash(&json!({"w": 20}))));
    }

    #[test]
    fn test_deterministic_output() {
        let chart = Chart::from_value(&json!({
            "_sliceId": "id",
            "general": ["brand"]
        }))
        .unwrap();
        let records = vec![json!({"id": "a", "brand": "VW"})];
        let decl = decl_of(&chart, "general");

        let a = create_component(&records, "general", &decl, None, Some(&chart), None).unwrap();
        let b = create_component(&records, "general", &decl, None, Some(&chart), None).unwrap();
        assert_eq!(a, b);
    }
}
