//! Greedy set cover over attribute fields
//!
//! Finding the smallest attribute subset that distinguishes every record
//! is the set cover problem and NP-hard. The greedy heuristic used here
//! repeatedly adds the remaining field with the most distinct values and
//! stops once every record has a unique combined key. The result is small
//! but not guaranteed minimal.
//!
//! Determinism: ties on distinct-value count go to the lexicographically
//! smallest field name.

use crate::error::{KeyError, KeyResult};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::debug;

/// Mandatory identity attribute; never a candidate, always retained
pub const ID_FIELD: &str = "id";

/// One attribute record: field name to JSON value
pub type AttributeRecord = Map<String, Value>;

/// Canonical text of a value, used for distinctness
///
/// Absent fields key as `null`. Integral floats key like the equal
/// integer, so `1` and `1.0` are the same value.
fn key_of(record: &AttributeRecord, field: &str) -> String {
    record
        .get(field)
        .map(canonical_text)
        .unwrap_or_else(|| Value::Null.to_string())
}

fn canonical_text(value: &Value) -> String {
    if let Value::Number(n) = value {
        if let Some(f) = n.as_f64().filter(|f| n.is_f64() && f.fract() == 0.0) {
            if (i64::MIN as f64..i64::MAX as f64).contains(&f) {
                return (f as i64).to_string();
            }
            if (0.0..u64::MAX as f64).contains(&f) {
                return (f as u64).to_string();
            }
        }
    }
    value.to_string()
}

fn distinct_count(records: &[AttributeRecord], field: &str) -> usize {
    records
        .iter()
        .map(|r| key_of(r, field))
        .collect::<HashSet<_>>()
        .len()
}

fn is_unique(records: &[AttributeRecord], fields: &[String]) -> bool {
    let mut seen = HashSet::with_capacity(records.len());
    records.iter().all(|r| {
        let key: Vec<String> = fields.iter().map(|f| key_of(r, f)).collect();
        seen.insert(key)
    })
}

/// Find a small set of fields whose combined values are unique per record
///
/// `id` and any `exclude`d fields are never candidates. Returns an empty
/// set when there is at most one record.
///
/// # Errors
///
/// `KeyError::NonUnique` if all candidates are exhausted before every
/// record is distinguished.
pub fn greedy_set_cover(
    records: &[AttributeRecord],
    exclude: &[&str],
) -> KeyResult<BTreeSet<String>> {
    let excluded: BTreeSet<&str> = exclude
        .iter()
        .copied()
        .chain(std::iter::once(ID_FIELD))
        .collect();

    // BTreeMap keeps candidates in name order for tie-breaking
    let mut candidates: BTreeMap<&str, usize> = BTreeMap::new();
    for record in records {
        for field in record.keys() {
            if !excluded.contains(field.as_str()) && !candidates.contains_key(field.as_str()) {
                candidates.insert(field.as_str(), distinct_count(records, field));
            }
        }
    }
    let tried: BTreeSet<String> = candidates.keys().map(|f| f.to_string()).collect();

    let mut chosen: Vec<String> = Vec::new();
    while !is_unique(records, &chosen) {
        // max_by_key returns the last maximum; iterate in reverse so the
        // lexicographically smallest name wins a tie
        let next = candidates
            .iter()
            .rev()
            .max_by_key(|(_, count)| **count)
            .map(|(field, _)| *field);

        match next {
            Some(field) => {
                debug!(
                    target: "calcpack::keys",
                    field,
                    distinct = candidates[field],
                    "Selected distinguishing field"
                );
                candidates.remove(field);
                chosen.push(field.to_string());
            }
            None => return Err(KeyError::NonUnique { fields: tried }),
        }
    }

    Ok(chosen.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn records(values: Vec<Value>) -> Vec<AttributeRecord> {
        values
            .into_iter()
            .map(|v| match v {
                Value::Object(map) => map,
                other => panic!("not an object: {}", other),
            })
            .collect()
    }

    fn set(fields: &[&str]) -> BTreeSet<String> {
        fields.iter().map(|f| f.to_string()).collect()
    }

    #[test]
    fn test_constant_field_is_never_chosen() {
        let data = records(vec![
            json!({"id": 1, "a": 1, "b": 2, "c": 3}),
            json!({"id": 2, "a": 2, "b": 2, "c": 3}),
            json!({"id": 3, "a": 1, "b": 2, "c": 4}),
        ]);
        assert_eq!(greedy_set_cover(&data, &[]).unwrap(), set(&["a", "c"]));
    }

    #[test]
    fn test_integral_float_equals_integer() {
        let data = records(vec![
            json!({"id": 1, "a": 1, "b": "x"}),
            json!({"id": 2, "a": 1.0, "b": "y"}),
        ]);
        assert_eq!(greedy_set_cover(&data, &[]).unwrap(), set(&["b"]));

        let data = records(vec![json!({"id": 1, "a": 2}), json!({"id": 2, "a": 2.0})]);
        assert!(matches!(
            greedy_set_cover(&data, &[]),
            Err(KeyError::NonUnique { .. })
        ));
        assert_eq!(canonical_text(&json!(1.5)), "1.5");
        assert_eq!(canonical_text(&json!(-3.0)), "-3");
    }

    #[test]
    fn test_single_field_suffices() {
        let data = records(vec![
            json!({"id": 1, "name": "steel", "unit": "kg"}),
            json!({"id": 2, "name": "iron", "unit": "kg"}),
            json!({"id": 3, "name": "water", "unit": "kg"}),
        ]);
        assert_eq!(greedy_set_cover(&data, &[]).unwrap(), set(&["name"]));
    }

    #[test]
    fn test_highest_cardinality_first() {
        let data = records(vec![
            json!({"id": 1, "a": 1, "z": 1}),
            json!({"id": 2, "a": 1, "z": 2}),
            json!({"id": 3, "a": 2, "z": 3}),
        ]);
        assert_eq!(greedy_set_cover(&data, &[]).unwrap(), set(&["z"]));
    }

    #[test]
    fn test_tie_breaks_by_name() {
        let data = records(vec![
            json!({"id": 1, "b": 1, "a": 1}),
            json!({"id": 2, "b": 2, "a": 2}),
        ]);
        assert_eq!(greedy_set_cover(&data, &[]).unwrap(), set(&["a"]));
    }

    #[test]
    fn test_exclude() {
        let data = records(vec![
            json!({"id": 1, "a": 1, "b": 1}),
            json!({"id": 2, "a": 2, "b": 2}),
        ]);
        assert_eq!(greedy_set_cover(&data, &["a"]).unwrap(), set(&["b"]));
    }

    #[test]
    fn test_non_unique() {
        let data = records(vec![
            json!({"id": 1, "a": 1, "b": 2}),
            json!({"id": 2, "a": 1, "b": 2}),
        ]);
        let err = greedy_set_cover(&data, &[]).unwrap_err();
        assert_eq!(
            err,
            KeyError::NonUnique {
                fields: set(&["a", "b"])
            }
        );
    }

    #[test]
    fn test_id_is_never_a_candidate() {
        let data = records(vec![json!({"id": 1}), json!({"id": 2})]);
        assert!(matches!(
            greedy_set_cover(&data, &[]),
            Err(KeyError::NonUnique { .. })
        ));
    }

    #[test]
    fn test_trivial_inputs() {
        assert!(greedy_set_cover(&[], &[]).unwrap().is_empty());
        let one = records(vec![json!({"id": 1, "a": 1})]);
        assert!(greedy_set_cover(&one, &[]).unwrap().is_empty());
    }

    #[test]
    fn test_value_kinds_are_distinct() {
        let data = records(vec![
            json!({"id": 1, "code": 1}),
            json!({"id": 2, "code": "1"}),
            json!({"id": 3, "code": null}),
            json!({"id": 4, "code": [1]}),
        ]);
        assert_eq!(greedy_set_cover(&data, &[]).unwrap(), set(&["code"]));
    }
}
