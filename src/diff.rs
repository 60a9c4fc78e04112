// ABOUTME: Record diff engine and column consistency checker
// ABOUTME: Pure functions over decoded rows; no database access

use std::collections::HashMap;

use serde::Serialize;

use crate::value::{records_identical, Record, Value};

/// A record that differs between source and target under the same primary key.
#[derive(Debug, Clone, Serialize)]
pub struct ModifiedPair {
    pub source: Record,
    pub target: Record,
}

/// Partition of two row sets keyed by a shared primary key column.
///
/// Every key present on either side lands in exactly one of the four buckets.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DiffResult {
    /// Rows whose key exists only on the source (production) side.
    pub only_in_source: Vec<Record>,
    /// Rows whose key exists only on the target (local) side.
    pub only_in_target: Vec<Record>,
    /// Keys present on both sides with differing records.
    pub modified: Vec<ModifiedPair>,
    /// Keys present on both sides with identical records.
    pub identical: Vec<Record>,
}

impl DiffResult {
    /// True when applying the sync set would be a no-op.
    pub fn in_sync(&self) -> bool {
        self.only_in_source.is_empty() && self.modified.is_empty()
    }

    /// The records an upsert pass should write to the target: source-only rows
    /// plus the source side of every modified pair.
    pub fn records_to_sync(&self) -> Vec<&Record> {
        self.only_in_source
            .iter()
            .chain(self.modified.iter().map(|pair| &pair.source))
            .collect()
    }

    /// Count of keys across all four buckets.
    pub fn total_keys(&self) -> usize {
        self.only_in_source.len()
            + self.only_in_target.len()
            + self.modified.len()
            + self.identical.len()
    }
}

/// Column sets that differ between two tables of the same name.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ColumnConsistencyResult {
    /// Columns the target has that the source lacks.
    pub missing_in_source: Vec<String>,
    /// Columns the source has that the target lacks.
    pub missing_in_target: Vec<String>,
}

impl ColumnConsistencyResult {
    pub fn all_match(&self) -> bool {
        self.missing_in_source.is_empty() && self.missing_in_target.is_empty()
    }
}

/// Partition `source_rows` and `target_rows` by the value of `primary_key`.
///
/// Rows are bucketed by the canonical key string of their primary-key value,
/// so a signed and an unsigned representation of the same number collide as
/// one key. A row with no primary-key column (or a NULL key) is keyed as NULL;
/// duplicate keys within one side keep the last row seen, matching a
/// by-primary-key read.
pub fn diff_table(source_rows: &[Record], target_rows: &[Record], primary_key: &str) -> DiffResult {
    let source_map = index_by_key(source_rows, primary_key);
    let target_map = index_by_key(target_rows, primary_key);

    let mut result = DiffResult::default();

    for (key, target_row) in &target_map {
        if !source_map.contains_key(key) {
            result.only_in_target.push((*target_row).clone());
        }
    }

    for (key, source_row) in &source_map {
        match target_map.get(key) {
            None => result.only_in_source.push((*source_row).clone()),
            Some(target_row) => {
                if records_identical(source_row, target_row) {
                    result.identical.push((*source_row).clone());
                } else {
                    result.modified.push(ModifiedPair {
                        source: (*source_row).clone(),
                        target: (*target_row).clone(),
                    });
                }
            }
        }
    }

    result
}

fn index_by_key<'a>(rows: &'a [Record], primary_key: &str) -> HashMap<String, &'a Record> {
    let mut map = HashMap::with_capacity(rows.len());
    for row in rows {
        let key = row
            .get(primary_key)
            .unwrap_or(&Value::Null)
            .key_string();
        map.insert(key, row);
    }
    map
}

/// Compare two column-name lists, case-sensitively.
///
/// Symmetric by construction: swapping the arguments swaps the two output
/// lists. Order of the inputs is preserved in the outputs.
pub fn check_columns(source_columns: &[String], target_columns: &[String]) -> ColumnConsistencyResult {
    let missing_in_source = target_columns
        .iter()
        .filter(|col| !source_columns.contains(col))
        .cloned()
        .collect();
    let missing_in_target = source_columns
        .iter()
        .filter(|col| !target_columns.contains(col))
        .cloned()
        .collect();

    ColumnConsistencyResult {
        missing_in_source,
        missing_in_target,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, Value)]) -> Record {
        pairs
            .iter()
            .map(|(col, val)| (col.to_string(), val.clone()))
            .collect()
    }

    #[test]
    fn test_diff_partitions_into_four_classes() {
        let source = vec![
            row(&[("id", Value::Int(1)), ("name", Value::Text("a".into()))]),
            row(&[("id", Value::Int(2)), ("name", Value::Text("b".into()))]),
            row(&[("id", Value::Int(3)), ("name", Value::Text("c".into()))]),
        ];
        let target = vec![
            row(&[("id", Value::Int(1)), ("name", Value::Text("a".into()))]),
            row(&[("id", Value::Int(2)), ("name", Value::Text("B".into()))]),
            row(&[("id", Value::Int(4)), ("name", Value::Text("d".into()))]),
        ];

        let diff = diff_table(&source, &target, "id");

        assert_eq!(diff.only_in_source.len(), 1);
        assert_eq!(diff.only_in_source[0]["id"], Value::Int(3));
        assert_eq!(diff.only_in_target.len(), 1);
        assert_eq!(diff.only_in_target[0]["id"], Value::Int(4));
        assert_eq!(diff.modified.len(), 1);
        assert_eq!(diff.modified[0].source["id"], Value::Int(2));
        assert_eq!(diff.identical.len(), 1);
        assert!(!diff.in_sync());
    }

    #[test]
    fn test_diff_partition_covers_key_union() {
        let source = vec![
            row(&[("id", Value::Int(1)), ("v", Value::Int(10))]),
            row(&[("id", Value::Int(2)), ("v", Value::Int(20))]),
        ];
        let target = vec![
            row(&[("id", Value::Int(2)), ("v", Value::Int(21))]),
            row(&[("id", Value::Int(3)), ("v", Value::Int(30))]),
            row(&[("id", Value::Int(4)), ("v", Value::Int(40))]),
        ];

        let diff = diff_table(&source, &target, "id");
        // Keys 1..=4, each in exactly one bucket.
        assert_eq!(diff.total_keys(), 4);
        assert_eq!(diff.only_in_source.len(), 1);
        assert_eq!(diff.only_in_target.len(), 2);
        assert_eq!(diff.modified.len(), 1);
        assert_eq!(diff.identical.len(), 0);
    }

    #[test]
    fn test_diff_unifies_signed_and_unsigned_keys() {
        let source = vec![row(&[("id", Value::UInt(1)), ("v", Value::Int(1))])];
        let target = vec![row(&[("id", Value::Int(1)), ("v", Value::Int(1))])];

        let diff = diff_table(&source, &target, "id");
        assert_eq!(diff.identical.len(), 1);
        assert!(diff.only_in_source.is_empty());
        assert!(diff.only_in_target.is_empty());
    }

    #[test]
    fn test_diff_empty_sides() {
        let rows = vec![row(&[("id", Value::Int(1))])];

        let diff = diff_table(&rows, &[], "id");
        assert_eq!(diff.only_in_source.len(), 1);
        assert!(diff.only_in_target.is_empty());

        let diff = diff_table(&[], &rows, "id");
        assert_eq!(diff.only_in_target.len(), 1);
        assert!(diff.in_sync());

        let diff = diff_table(&[], &[], "id");
        assert_eq!(diff.total_keys(), 0);
        assert!(diff.in_sync());
    }

    #[test]
    fn test_records_to_sync_is_source_only_plus_modified_source() {
        let source = vec![
            row(&[("id", Value::Int(1)), ("v", Value::Int(10))]),
            row(&[("id", Value::Int(2)), ("v", Value::Int(20))]),
        ];
        let target = vec![row(&[("id", Value::Int(2)), ("v", Value::Int(99))])];

        let diff = diff_table(&source, &target, "id");
        let to_sync = diff.records_to_sync();
        assert_eq!(to_sync.len(), 2);
        assert!(to_sync.iter().all(|r| r["v"] != Value::Int(99)));
    }

    #[test]
    fn test_check_columns_symmetry() {
        let a = vec!["id".to_string(), "name".to_string(), "email".to_string()];
        let b = vec!["id".to_string(), "name".to_string(), "phone".to_string()];

        let forward = check_columns(&a, &b);
        assert_eq!(forward.missing_in_source, vec!["phone"]);
        assert_eq!(forward.missing_in_target, vec!["email"]);
        assert!(!forward.all_match());

        let reverse = check_columns(&b, &a);
        assert_eq!(reverse.missing_in_source, forward.missing_in_target);
        assert_eq!(reverse.missing_in_target, forward.missing_in_source);
    }

    #[test]
    fn test_check_columns_is_case_sensitive() {
        let a = vec!["Name".to_string()];
        let b = vec!["name".to_string()];
        let result = check_columns(&a, &b);
        assert_eq!(result.missing_in_source, vec!["name"]);
        assert_eq!(result.missing_in_target, vec!["Name"]);
    }
}
