//! # Layercake - content-addressed JSON decomposition
//!
//! A library for decomposing arbitrary nested JSON documents into a
//! normalized, content-addressed, multi-table representation: each declared
//! group of fields becomes its own append-only table, relationships between
//! tables are expressed as content-hash references, and a generated schema
//! row accompanies every table.
//!
//! ## Modules
//!
//! - **chart**: the declarative schema describing how records decompose
//! - **decompose**: the recursive decomposition engine
//! - **hash**: deterministic content hashing of rows
//! - **dedup**: collapsing rows that share a content hash
//!
//! ## Quick Start
//!
//! ```rust
//! use layercake::{from_json, Chart};
//! use serde_json::json;
//!
//! # fn main() -> anyhow::Result<()> {
//! let chart = Chart::from_value(&json!({
//!     "_sliceId": "id",
//!     "general": ["brand", "model"],
//!     "color": ["colors/roof", "colors/sides"]
//! }))?;
//!
//! let data = json!([
//!     {"id": "car1", "brand": "VW", "model": "Polo",
//!      "colors": {"roof": "white", "sides": "green"}}
//! ]);
//!
//! let tables = from_json(&data, &chart)?;
//!
//! // One component table per declared group, one layer per component,
//! // one cake aggregating the layers, plus slice ids, journals and the
//! // tableCfgs schema table.
//! assert_eq!(tables.get("general").unwrap().rows[0]["brand"], "VW");
//! assert!(tables.contains("generalLayer"));
//! assert!(tables.contains("cake"));
//! assert!(tables.contains("tableCfgs"));
//! # Ok(())
//! # }
//! ```

use serde_json::{json, Value};

pub mod cfg;
pub mod chart;
pub mod decompose;
pub mod dedup;
pub mod error;
pub mod hash;
pub mod table;

// Re-export commonly used types for convenience
pub use cfg::{ColumnCfg, ColumnType, TableCfg};
pub use chart::{Chart, PropertyDecl, PropertyItem};
pub use decompose::from_json;
pub use dedup::remove_duplicates;
pub use error::DecomposeError;
pub use hash::content_hash;
pub use table::{Table, TableKind, TableSet};

/// Example record batch: two cars with colors and wheels.
pub fn example_records() -> Value {
    json!([
        {
            "VIN": "VIN1",
            "brand": "Volkswagen",
            "type": "Polo",
            "doors": 5,
            "engine": "Diesel",
            "gears": 6,
            "transmission": "Manual",
            "colors": {
                "sides": "green",
                "roof": "white",
                "highlights": "chrome"
            },
            "wheels": [
                {"SN": "BOB37382", "brand": "Borbet", "dimension": "185/60 R16"}
            ]
        },
        {
            "VIN": "VIN2",
            "brand": "Volkswagen",
            "type": "Golf",
            "doors": 3,
            "engine": "Petrol",
            "gears": 7,
            "transmission": "Automatic",
            "colors": {
                "sides": "blue",
                "roof": "black",
                "highlights": "chrome"
            },
            "wheels": [
                {"SN": "BOB37383", "brand": "Borbet", "dimension": "195/55 R16"}
            ]
        }
    ])
}

/// Example chart decomposing the [`example_records`] batch into general,
/// technical, color and wheel components, wheels being a nested type.
pub fn example_chart() -> Chart {
    Chart::from_value(&json!({
        "_sliceId": "VIN",
        "_name": "Car",
        "general": ["brand", "type", "doors"],
        "technical": ["engine", "transmission", "gears"],
        "color": ["colors/sides", "colors/roof", "colors/highlights"],
        "wheel": ["sliceId@Wheel", "brand@Wheel", "dimension@Wheel"],
        "_types": [
            {
                "_path": "wheels",
                "_sliceId": "SN",
                "_name": "Wheel",
                "brand": ["brand"],
                "dimension": ["dimension"]
            }
        ]
    }))
    .expect("the example chart is well-formed")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_example_decomposes() {
        let tables = from_json(&example_records(), &example_chart()).unwrap();

        // Both cars land in the slice-id set, in source order.
        let slice_ids = tables.get("carSliceId").unwrap();
        assert_eq!(slice_ids.rows[0]["add"], json!(["VIN1", "VIN2"]));

        // Component tables for the parent and the nested type.
        assert_eq!(tables.get("carGeneral").unwrap().rows.len(), 2);
        assert_eq!(tables.get("carColor").unwrap().rows[0]["sides"], "green");
        assert_eq!(tables.get("wheelDimension").unwrap().rows.len(), 2);

        // The wheel component of each car references its wheel's hashes.
        let wheel = tables.get("carWheel").unwrap();
        assert_eq!(wheel.rows[0]["wheelSliceId"], json!(["BOB37382"]));
        assert_eq!(
            wheel.rows[1]["wheelDimension"][0],
            json!(content_hash(&json!({"dimension": "195/55 R16"})))
        );

        // Cakes for both types, stamped with their schema hashes.
        assert!(tables.get("carCake").unwrap().schema_hash.is_some());
        assert!(tables.get("wheelCake").unwrap().schema_hash.is_some());
    }

    #[test]
    fn test_identical_wheel_brands_deduplicate() {
        // Both example wheels share the brand "Borbet".
        let tables = from_json(&example_records(), &example_chart()).unwrap();
        let brand = tables.get("wheelBrand").unwrap();
        assert_eq!(brand.rows.len(), 1);
        assert_eq!(brand.rows[0]["brand"], "Borbet");
    }
}
