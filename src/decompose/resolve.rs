//! Property resolution
//!
//! Resolves one declared property item against one source record: plain
//! slash-delimited paths descend into the record, reference tokens are
//! answered from the chart's nested types. Absent data resolves to "no
//! value" or an empty list; a structurally unsatisfiable reference is a hard
//! error.

use serde_json::Value;

use crate::chart::{Chart, PropertyItem};
use crate::decompose::component::create_component;
use crate::error::DecomposeError;
use crate::table::{components_name, slice_ids_name, TableSet};

/// Walk a slash-delimited path through a record.
///
/// Returns the resolved `(field name, value)` pair, or `None` when any
/// segment is absent so optional substructures degrade gracefully. The field
/// name is the destination override if present, else the path's last
/// segment.
pub(crate) fn resolve_path(
    record: &Value,
    origin: &str,
    destination: Option<&str>,
) -> Option<(String, Value)> {
    let mut current = record;
    let mut last_segment = origin;
    for segment in origin.split('/') {
        last_segment = segment;
        current = current.get(segment)?;
    }
    if current.is_null() {
        return None;
    }
    let name = destination.unwrap_or(last_segment).to_string();
    Some((name, current.clone()))
}

/// Extract the child records a nested type contributes on one parent record.
///
/// A single object counts as a one-element batch; an absent path or a null
/// value contributes nothing.
pub(crate) fn child_records(record: &Value, source_path: Option<&str>) -> Vec<Value> {
    let Some(path) = source_path else {
        return Vec::new();
    };
    match record.get(path) {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.clone(),
        Some(single) => vec![single.clone()],
    }
}

/// Resolve one property item against one source record.
///
/// `chart` is the chart owning the declaration; `nested` is the table set of
/// already-computed nested types, threaded through for reference resolution.
pub(crate) fn resolve_item(
    record: &Value,
    item: &PropertyItem,
    chart: Option<&Chart>,
    nested: Option<&TableSet>,
) -> Result<Option<(String, Value)>, DecomposeError> {
    match item {
        PropertyItem::Path {
            origin,
            destination,
        } => Ok(resolve_path(record, origin, destination.as_deref())),
        PropertyItem::SliceIds {
            type_name,
            destination,
        } => {
            let chart = reference_chart(chart)?;
            require_nested(nested)?;
            Ok(Some(resolve_slice_ids(
                record,
                type_name,
                chart,
                destination.as_deref(),
            )))
        }
        PropertyItem::Reference {
            component,
            type_name,
            destination,
        } => {
            let chart = reference_chart(chart)?;
            let nested = require_nested(nested)?;
            resolve_component_ref(
                record,
                component,
                type_name,
                chart,
                nested,
                destination.as_deref(),
            )
            .map(Some)
        }
    }
}

/// References need a chart with declared nested types.
fn reference_chart(chart: Option<&Chart>) -> Result<&Chart, DecomposeError> {
    match chart {
        Some(chart) if !chart.nested_types.is_empty() => Ok(chart),
        _ => Err(DecomposeError::ReferenceWithoutNestedTypes),
    }
}

/// References need the nested table set computed before the parent.
fn require_nested(nested: Option<&TableSet>) -> Result<&TableSet, DecomposeError> {
    nested.ok_or(DecomposeError::ReferenceWithoutNestedTypes)
}

/// `sliceId@Type`: the ordered slice ids of the nested type's child records
/// on this parent record. An unknown type or an absent path yields an empty
/// list.
fn resolve_slice_ids(
    record: &Value,
    type_name: &str,
    chart: &Chart,
    destination: Option<&str>,
) -> (String, Value) {
    let name = destination
        .map(str::to_string)
        .unwrap_or_else(|| slice_ids_name(Some(type_name)));

    let Some(ty) = chart.nested_type(type_name) else {
        return (name, Value::Array(Vec::new()));
    };

    let ids: Vec<Value> = child_records(record, ty.source_path.as_deref())
        .iter()
        .map(|child| child.get(&ty.slice_id_field).cloned().unwrap_or(Value::Null))
        .collect();
    (name, Value::Array(ids))
}

/// `componentKey@Type`: content hashes of the named nested component's rows
/// for exactly this parent record's children, in source order.
///
/// The referenced component may target a subset of children not materialized
/// as such in the nested tables, or live on a sub-chart, so a component
/// limited to these children is synthesized on the spot and its row hashes
/// collected from its wrapper table.
fn resolve_component_ref(
    record: &Value,
    component: &str,
    type_name: &str,
    chart: &Chart,
    nested: &TableSet,
    destination: Option<&str>,
) -> Result<(String, Value), DecomposeError> {
    let sub_chart = chart.nested_type(type_name);
    let destination_chart = sub_chart.unwrap_or(chart);
    let type_arg = (!type_name.is_empty()).then_some(type_name);

    let decl =
        destination_chart
            .component(component)
            .ok_or_else(|| DecomposeError::UnknownComponent {
                component: component.to_string(),
                chart: if type_name.is_empty() {
                    "Main Chart".to_string()
                } else {
                    type_name.to_string()
                },
            })?;

    let name = destination
        .map(str::to_string)
        .unwrap_or_else(|| components_name(component, type_arg));

    let children = child_records(record, destination_chart.source_path.as_deref());
    if children.is_empty() {
        return Ok((name, Value::Array(Vec::new())));
    }

    let synthesized = create_component(&children, component, decl, type_arg, sub_chart, Some(nested))?;
    let table = synthesized
        .get(&components_name(component, type_arg))
        .expect("the synthesized set always contains the requested component table");

    let refs: Vec<Value> = (0..children.len())
        .map(|idx| {
            Value::String(
                table
                    .row_hash(idx)
                    .expect("one stamped row is synthesized per child record")
                    .to_string(),
            )
        })
        .collect();
    Ok((name, Value::Array(refs)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn wheel_chart() -> Chart {
        Chart::from_value(&json!({
            "_sliceId": "VIN",
            "_name": "Car",
            "_types": [
                {"_sliceId": "SN", "_name": "Wheel", "_path": "wheels", "brand": ["brand"]}
            ]
        }))
        .unwrap()
    }

    fn car_record() -> Value {
        json!({
            "VIN": "VIN1",
            "wheels": [
                {"SN": "A1", "brand": "Borbet"},
                {"SN": "A2", "brand": "Ronal"}
            ]
        })
    }

    #[test]
    fn test_plain_path() {
        let record = json!({"brand": "Volkswagen"});
        let (name, value) = resolve_path(&record, "brand", None).unwrap();
        assert_eq!(name, "brand");
        assert_eq!(value, "Volkswagen");
    }

    #[test]
    fn test_nested_path() {
        let record = json!({"colors": {"roof": "white"}});
        let (name, value) = resolve_path(&record, "colors/roof", None).unwrap();
        assert_eq!(name, "roof");
        assert_eq!(value, "white");
    }

    #[test]
    fn test_missing_segment_yields_no_value() {
        let record = json!({"colors": {"roof": "white"}});
        assert!(resolve_path(&record, "colors/sides", None).is_none());
        assert!(resolve_path(&record, "paint/roof", None).is_none());
    }

    #[test]
    fn test_falsy_values_survive() {
        let record = json!({"doors": 0, "cabrio": false, "note": ""});
        assert_eq!(resolve_path(&record, "doors", None).unwrap().1, 0);
        assert_eq!(resolve_path(&record, "cabrio", None).unwrap().1, false);
        assert_eq!(resolve_path(&record, "note", None).unwrap().1, "");
    }

    #[test]
    fn test_rename() {
        let record = json!({"colors": {"roof": "white"}});
        let (name, _) = resolve_path(&record, "colors/roof", Some("roofColor")).unwrap();
        assert_eq!(name, "roofColor");
    }

    #[test]
    fn test_slice_id_reference() {
        let chart = wheel_chart();
        let item = PropertyItem::parse("sliceId@Wheel", None);
        let (name, value) = resolve_item(&car_record(), &item, Some(&chart), Some(&TableSet::new()))
            .unwrap()
            .unwrap();
        assert_eq!(name, "wheelSliceId");
        assert_eq!(value, json!(["A1", "A2"]));
    }

    #[test]
    fn test_slice_id_reference_single_object() {
        let chart = wheel_chart();
        let record = json!({"VIN": "VIN1", "wheels": {"SN": "A1"}});
        let item = PropertyItem::parse("sliceId@Wheel", None);
        let (_, value) = resolve_item(&record, &item, Some(&chart), Some(&TableSet::new()))
            .unwrap()
            .unwrap();
        assert_eq!(value, json!(["A1"]));
    }

    #[test]
    fn test_slice_id_reference_absent_path() {
        let chart = wheel_chart();
        let record = json!({"VIN": "VIN1"});
        let item = PropertyItem::parse("sliceId@Wheel", None);
        let (_, value) = resolve_item(&record, &item, Some(&chart), Some(&TableSet::new()))
            .unwrap()
            .unwrap();
        assert_eq!(value, json!([]));
    }

    #[test]
    fn test_component_reference_orders_hashes_by_source() {
        let chart = wheel_chart();
        let item = PropertyItem::parse("brand@Wheel", None);
        let (name, value) = resolve_item(&car_record(), &item, Some(&chart), Some(&TableSet::new()))
            .unwrap()
            .unwrap();

        assert_eq!(name, "wheelBrand");
        let refs = value.as_array().unwrap();
        assert_eq!(refs.len(), 2);
        assert_eq!(
            refs[0],
            json!(crate::hash::content_hash(&json!({"brand": "Borbet"})))
        );
        assert_eq!(
            refs[1],
            json!(crate::hash::content_hash(&json!({"brand": "Ronal"})))
        );
    }

    #[test]
    fn test_unknown_component_is_an_error() {
        let chart = wheel_chart();
        let item = PropertyItem::parse("dimension@Wheel", None);
        let err = resolve_item(&car_record(), &item, Some(&chart), Some(&TableSet::new()))
            .unwrap_err();
        assert!(matches!(err, DecomposeError::UnknownComponent { .. }));
        assert!(err.to_string().contains("dimension"));
        assert!(err.to_string().contains("Wheel"));
    }

    #[test]
    fn test_reference_without_nested_types_is_an_error() {
        let chart = Chart::from_value(&json!({"_sliceId": "id"})).unwrap();
        let item = PropertyItem::parse("brand@Wheel", None);
        let err = resolve_item(&car_record(), &item, Some(&chart), Some(&TableSet::new()))
            .unwrap_err();
        assert!(matches!(err, DecomposeError::ReferenceWithoutNestedTypes));
    }
}
