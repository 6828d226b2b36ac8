//! Projection of attribute records onto their identifying fields

use crate::error::{KeyError, KeyResult};
use crate::selector::{greedy_set_cover, AttributeRecord, ID_FIELD};
use std::collections::BTreeSet;

/// Output of [`as_unique_attributes`]
#[derive(Debug, Clone, PartialEq)]
pub struct UniqueAttributes {
    /// Fields picked by the selector (without `id` or `include`)
    pub fields: BTreeSet<String>,
    /// Records reduced to `fields`, `include` and `id`
    pub records: Vec<AttributeRecord>,
}

impl UniqueAttributes {
    /// Every field retained in `records`: selected, included and `id`
    pub fn retained_fields(&self, include: &[&str]) -> BTreeSet<String> {
        self.fields
            .iter()
            .cloned()
            .chain(include.iter().map(|f| f.to_string()))
            .chain(std::iter::once(ID_FIELD.to_string()))
            .collect()
    }
}

/// Select identifying fields and reduce every record to them
///
/// Every record must carry `id` and share exactly the same field set;
/// both are checked before the selector runs. Fields in `include` are
/// kept in the output even when they do not help distinguish records.
pub fn as_unique_attributes(
    records: &[AttributeRecord],
    exclude: &[&str],
    include: &[&str],
) -> KeyResult<UniqueAttributes> {
    if let Some(first) = records.first() {
        let expected: BTreeSet<&String> = first.keys().collect();
        for (index, record) in records.iter().enumerate() {
            if !record.contains_key(ID_FIELD) {
                return Err(KeyError::MissingId { index });
            }
            if record.keys().collect::<BTreeSet<_>>() != expected {
                return Err(KeyError::InconsistentFields { index });
            }
        }
    }

    let fields = greedy_set_cover(records, exclude)?;
    let keep = |key: &str| key == ID_FIELD || fields.contains(key) || include.contains(&key);

    let projected = records
        .iter()
        .map(|record| {
            record
                .iter()
                .filter(|(key, _)| keep(key.as_str()))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect::<AttributeRecord>()
        })
        .collect();

    Ok(UniqueAttributes {
        fields,
        records: projected,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn records(values: Vec<Value>) -> Vec<AttributeRecord> {
        values
            .into_iter()
            .filter_map(|v| match v {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .collect()
    }

    fn sample() -> Vec<AttributeRecord> {
        records(vec![
            json!({"id": 1, "a": 1, "b": 2, "c": 3}),
            json!({"id": 2, "a": 2, "b": 2, "c": 3}),
            json!({"id": 3, "a": 1, "b": 2, "c": 4}),
        ])
    }

    #[test]
    fn test_projection_keeps_id() {
        let result = as_unique_attributes(&sample(), &[], &[]).unwrap();
        assert_eq!(
            result.fields,
            ["a", "c"].iter().map(|s| s.to_string()).collect()
        );
        assert_eq!(
            Value::Object(result.records[0].clone()),
            json!({"id": 1, "a": 1, "c": 3})
        );
        assert_eq!(result.records.len(), 3);
    }

    #[test]
    fn test_include_is_retained() {
        let result = as_unique_attributes(&sample(), &[], &["b"]).unwrap();
        assert!(!result.fields.contains("b"));
        assert_eq!(
            Value::Object(result.records[2].clone()),
            json!({"id": 3, "a": 1, "b": 2, "c": 4})
        );
        assert_eq!(result.retained_fields(&["b"]).len(), 4);
    }

    #[test]
    fn test_inconsistent_fields() {
        let data = records(vec![
            json!({"id": 1, "a": 1}),
            json!({"id": 2, "a": 2, "b": 1}),
        ]);
        assert_eq!(
            as_unique_attributes(&data, &[], &[]).unwrap_err(),
            KeyError::InconsistentFields { index: 1 }
        );
    }

    #[test]
    fn test_inconsistent_fields_checked_before_selection() {
        // Not unique either; the consistency check must win
        let data = records(vec![
            json!({"id": 1, "a": 1}),
            json!({"id": 2, "a": 1}),
            json!({"id": 3, "b": 1}),
        ]);
        assert!(matches!(
            as_unique_attributes(&data, &[], &[]),
            Err(KeyError::InconsistentFields { index: 2 })
        ));
    }

    #[test]
    fn test_missing_id() {
        let data = records(vec![json!({"a": 1}), json!({"a": 2})]);
        assert_eq!(
            as_unique_attributes(&data, &[], &[]).unwrap_err(),
            KeyError::MissingId { index: 0 }
        );
    }

    #[test]
    fn test_non_unique_propagates() {
        let data = records(vec![json!({"id": 1, "a": 1}), json!({"id": 2, "a": 1})]);
        assert!(matches!(
            as_unique_attributes(&data, &[], &[]),
            Err(KeyError::NonUnique { .. })
        ));
    }

    #[test]
    fn test_empty_input() {
        let result = as_unique_attributes(&[], &[], &[]).unwrap();
        assert!(result.fields.is_empty());
        assert!(result.records.is_empty());
    }
}
