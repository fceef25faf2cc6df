use serde_json::{Map, Value};

/// A decoded transaction row.
///
/// Rows are schema-tolerant: whatever columns the batch carried become keys.
/// Required-field checks happen later, during structural validation.
pub type Row = Map<String, Value>;

/// Converts a JSON value into a row if it is an object.
pub fn row_from_value(value: Value) -> Option<Row> {
    match value {
        Value::Object(map) => Some(map),
        _ => None,
    }
}
