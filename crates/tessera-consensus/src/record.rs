use serde::Serialize;
use serde_json::Value;
use tessera_codec::Row;

use crate::errors::StructuralValidationError;
use crate::validation::{check_record, AsRecord};

/// A row that passed structural validation.
///
/// Every column of the source row is kept, including ones no accessor names.
/// Records are immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TransactionRecord {
    row: Row,
}

impl TransactionRecord {
    /// Validates `row` and wraps it.
    ///
    /// Beyond the presence checks of [`check_record`], `entity_id` must be a
    /// non-empty string.
    pub fn from_row(row: Row) -> Result<Self, StructuralValidationError> {
        check_record(&row)?;
        match row.get("entity_id") {
            Some(Value::String(id)) if !id.is_empty() => Ok(Self { row }),
            _ => Err(StructuralValidationError::InvalidField {
                field: "entity_id",
                expected: "must be a non-empty string",
            }),
        }
    }

    /// Validates a JSON object and wraps it.
    pub fn from_value(value: Value) -> Result<Self, StructuralValidationError> {
        match value {
            Value::Object(row) => Self::from_row(row),
            _ => Err(StructuralValidationError::NotAnObject),
        }
    }

    /// Entity identifier, when it is a string.
    pub fn entity_id(&self) -> Option<&str> {
        self.row.get("entity_id").and_then(Value::as_str)
    }

    /// Event type, read from `event_type` or else `event`.
    pub fn event_type(&self) -> Option<&str> {
        self.row
            .get("event_type")
            .and_then(Value::as_str)
            .or_else(|| self.row.get("event").and_then(Value::as_str))
    }

    /// Raw timestamp value.
    pub fn timestamp(&self) -> &Value {
        self.row.get("timestamp").unwrap_or(&Value::Null)
    }

    /// Optional structured details.
    pub fn details(&self) -> Option<&Value> {
        self.row.get("details").filter(|v| !v.is_null())
    }

    /// All columns.
    pub fn row(&self) -> &Row {
        &self.row
    }

    /// Unwraps into the underlying row.
    pub fn into_row(self) -> Row {
        self.row
    }
}

impl AsRecord for TransactionRecord {
    fn as_row(&self) -> Option<&Row> {
        Some(&self.row)
    }
}

impl TryFrom<Row> for TransactionRecord {
    type Error = StructuralValidationError;

    fn try_from(row: Row) -> Result<Self, Self::Error> {
        Self::from_row(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keeps_extra_columns() {
        let record = TransactionRecord::from_value(json!({
            "entity_id": "e1", "event": "create", "timestamp": 1, "region": "eu"
        }))
        .unwrap();
        assert_eq!(record.row()["region"], "eu");
        assert_eq!(record.event_type(), Some("create"));
        assert_eq!(record.entity_id(), Some("e1"));
        assert!(record.details().is_none());
    }

    #[test]
    fn rejects_incomplete_rows() {
        let err = TransactionRecord::from_value(json!({"entity_id": "e1"})).unwrap_err();
        assert_eq!(err.field(), Some("event_type"));
    }

    #[test]
    fn entity_id_must_be_a_non_empty_string() {
        for id in [json!(""), json!(42), json!(["e1"])] {
            let err = TransactionRecord::from_value(json!({
                "entity_id": id, "event_type": "create", "timestamp": 1
            }))
            .unwrap_err();
            assert_eq!(err.field(), Some("entity_id"));
            assert!(matches!(err, StructuralValidationError::InvalidField { .. }));
        }
    }

    #[test]
    fn serializes_as_plain_row() {
        let value = json!({"entity_id": "e1", "event_type": "x", "timestamp": 1});
        let record = TransactionRecord::from_value(value.clone()).unwrap();
        assert_eq!(serde_json::to_value(&record).unwrap(), value);
    }
}
