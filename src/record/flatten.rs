//! Flattening of raw API records into all-string warehouse rows.

use serde_json::{Map, Value};

use super::Record;
use super::entities::{EntitySpec, FieldKind, FieldSpec};
use super::timestamp;

/// A flattened row: column name to string (or null) value.
pub type FlatRow = Map<String, Value>;

/// Flatten a batch of records according to the entity's field transforms.
pub fn flatten_batch(entity: &EntitySpec, records: &[Record]) -> Vec<FlatRow> {
    records
        .iter()
        .map(|record| flatten_record(entity, record))
        .collect()
}

/// Flatten a single record.
///
/// Output keys match `EntitySpec::columns` exactly, in the same order.
/// Fields missing from the record produce null columns.
pub fn flatten_record(entity: &EntitySpec, record: &Record) -> FlatRow {
    let mut row = FlatRow::new();
    row.insert("id".to_string(), scalar(record.get("id")));
    for field in entity.fields {
        apply(field, record.get(field.source), &mut row);
    }
    row
}

fn apply(field: &FieldSpec, value: Option<&Value>, row: &mut FlatRow) {
    match field.kind {
        FieldKind::Scalar => {
            row.insert(field.source.to_string(), scalar(value));
        }
        FieldKind::Timestamp => {
            row.insert(field.source.to_string(), timestamp::normalize(value));
        }
        FieldKind::Relation => insert_pair(row, field.source, value),
        FieldKind::RelationAs(base) => insert_pair(row, base, value),
        FieldKind::RelationId => {
            row.insert(field.source.to_string(), relation_id(value));
        }
        FieldKind::RelationName => {
            row.insert(field.source.to_string(), relation_name(value));
        }
    }
}

fn insert_pair(row: &mut FlatRow, base: &str, value: Option<&Value>) {
    row.insert(format!("{base}_id"), relation_id(value));
    row.insert(format!("{base}_name"), relation_name(value));
}

/// First element of an `[id, name]` pair. Bare scalars are accepted as the
/// id itself; `false` marks an empty relation.
fn relation_id(value: Option<&Value>) -> Value {
    match value {
        Some(Value::Array(items)) => items.first().map(stringify).unwrap_or(Value::Null),
        None | Some(Value::Null) | Some(Value::Bool(_)) => Value::Null,
        Some(other) => stringify(other),
    }
}

/// Second element of an `[id, name]` pair, or null when the pair is empty
/// or carries no name.
fn relation_name(value: Option<&Value>) -> Value {
    match value {
        Some(Value::Array(items)) if items.len() > 1 => stringify(&items[1]),
        _ => Value::Null,
    }
}

/// Coerce a scalar to its string form. Null stays null; booleans become
/// "true"/"false"; numbers keep their JSON rendering.
fn scalar(value: Option<&Value>) -> Value {
    match value {
        None | Some(Value::Null) => Value::Null,
        Some(other) => stringify(other),
    }
}

fn stringify(value: &Value) -> Value {
    match value {
        Value::Null => Value::Null,
        Value::String(s) => Value::String(s.clone()),
        other => Value::String(other.to_string()),
    }
}
