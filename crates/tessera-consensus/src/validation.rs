use serde::Serialize;
use serde_json::Value;
use tessera_codec::Row;

use crate::errors::{ConsensusError, StructuralValidationError};
use crate::hashes::to_structural;

/// Fields every transaction record must carry with a non-null value.
///
/// `event_type` is also satisfied by a non-null `event` column.
pub const REQUIRED_FIELDS: [&str; 3] = ["entity_id", "event_type", "timestamp"];

const EVENT_ALIAS: &str = "event";

/// Anything that can be viewed as a row for structural checks.
pub trait AsRecord {
    /// The row view, or `None` if the value is not an object.
    fn as_row(&self) -> Option<&Row>;
}

impl AsRecord for Row {
    fn as_row(&self) -> Option<&Row> {
        Some(self)
    }
}

impl AsRecord for Value {
    fn as_row(&self) -> Option<&Row> {
        self.as_object()
    }
}

impl<R: AsRecord + ?Sized> AsRecord for &R {
    fn as_row(&self) -> Option<&Row> {
        (**self).as_row()
    }
}

/// Checks that one record carries every required field with a non-null value.
pub fn check_record<R: AsRecord + ?Sized>(record: &R) -> Result<(), StructuralValidationError> {
    let row = record
        .as_row()
        .ok_or(StructuralValidationError::NotAnObject)?;

    for field in REQUIRED_FIELDS {
        let value = if field == "event_type" {
            match (row.get(field), row.get(EVENT_ALIAS)) {
                (Some(v), _) if !v.is_null() => Some(v),
                (_, Some(v)) if !v.is_null() => Some(v),
                (None, None) => None,
                _ => Some(&Value::Null),
            }
        } else {
            row.get(field)
        };

        match value {
            None => return Err(StructuralValidationError::MissingField { field }),
            Some(Value::Null) => return Err(StructuralValidationError::NullField { field }),
            Some(_) => {}
        }
    }
    Ok(())
}

/// Returns true iff every record passes [`check_record`].
///
/// All-or-nothing: a single failing record anywhere makes the result false.
/// An empty slice is valid.
pub fn bulk_validate<R: AsRecord>(records: &[R]) -> bool {
    records.iter().all(|r| check_record(r).is_ok())
}

/// Per-record results, in input order.
pub fn validate_each<R: AsRecord>(records: &[R]) -> Vec<Result<(), StructuralValidationError>> {
    records.iter().map(check_record).collect()
}

/// [`bulk_validate`] over any serializable records.
pub fn bulk_validate_serialized<T: Serialize>(records: &[T]) -> Result<bool, ConsensusError> {
    for record in records {
        if check_record(&to_structural(record)?).is_err() {
            return Ok(false);
        }
    }
    Ok(true)
}
