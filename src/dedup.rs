//! Structural deduplication of a finished table set
//!
//! Rows are content-addressed, so two rows with the same `_hash` inside one
//! table are the same row. `remove_duplicates` collapses them to the first
//! occurrence; references keep resolving because they point at hashes, not
//! row positions. Running the pass twice yields the same result as running
//! it once.

use std::collections::HashSet;

use tracing::debug;

use crate::hash::row_hash;
use crate::table::TableSet;

/// Collapse rows sharing a content hash within each table.
pub fn remove_duplicates(set: TableSet) -> TableSet {
    let mut result = TableSet::new();

    for (name, mut table) in set {
        let before = table.rows.len();
        let mut seen: HashSet<String> = HashSet::with_capacity(before);

        table.rows.retain(|row| match row_hash(row) {
            Some(hash) => seen.insert(hash.to_string()),
            // Unstamped rows have no identity to collapse on.
            None => true,
        });

        if table.rows.len() < before {
            debug!(
                table = %name,
                removed = before - table.rows.len(),
                "collapsed duplicate rows"
            );
        }
        result.insert(name, table);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::with_hash;
    use crate::table::{Table, TableKind};
    use serde_json::json;

    fn set_with_rows(rows: Vec<serde_json::Value>) -> TableSet {
        let mut set = TableSet::new();
        set.insert(
            "model",
            Table::with_rows(
                TableKind::Components,
                rows.into_iter().map(with_hash).collect(),
            ),
        );
        set
    }

    #[test]
    fn test_collapses_identical_rows() {
        let set = set_with_rows(vec![
            json!({"model": "X"}),
            json!({"model": "X"}),
            json!({"model": "Y"}),
        ]);

        let result = remove_duplicates(set);
        let table = result.get("model").unwrap();
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0]["model"], "X");
        assert_eq!(table.rows[1]["model"], "Y");
    }

    #[test]
    fn test_keeps_first_occurrence_order() {
        let set = set_with_rows(vec![
            json!({"model": "Y"}),
            json!({"model": "X"}),
            json!({"model": "Y"}),
        ]);

        let result = remove_duplicates(set);
        let table = result.get("model").unwrap();
        assert_eq!(table.rows[0]["model"], "Y");
        assert_eq!(table.rows[1]["model"], "X");
    }

    #[test]
    fn test_idempotent() {
        let set = set_with_rows(vec![
            json!({"model": "X"}),
            json!({"model": "X"}),
            json!({"model": "Y"}),
        ]);

        let once = remove_duplicates(set);
        let twice = remove_duplicates(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_preserves_tables_without_duplicates() {
        let set = set_with_rows(vec![json!({"model": "X"})]);
        let result = remove_duplicates(set);
        assert_eq!(result.get("model").unwrap().rows.len(), 1);
    }
}
