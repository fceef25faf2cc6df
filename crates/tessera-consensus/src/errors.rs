use serde::Serialize;
use thiserror::Error;

/// Consensus error types.
#[derive(Error, Debug)]
pub enum ConsensusError {
    /// A record could not be turned into structural data.
    #[error("serialization failed: {0}")]
    Serialization(String),
    /// Canonicalization of a record failed.
    #[error("canonicalization failed: {0}")]
    Canonicalization(#[from] tessera_canonical::CanonicalizationError),
    /// A block header is missing fields or holds malformed values.
    #[error("invalid block header: {0}")]
    InvalidHeader(String),
}

/// A row that lacks something every transaction record must carry.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum StructuralValidationError {
    /// The record is not a JSON object.
    #[error("record is not an object")]
    NotAnObject,
    /// A required field is absent.
    #[error("missing required field '{field}'")]
    MissingField {
        /// Name of the field.
        field: &'static str,
    },
    /// A required field is present but null.
    #[error("required field '{field}' is null")]
    NullField {
        /// Name of the field.
        field: &'static str,
    },
    /// A required field holds a value of the wrong shape.
    #[error("field '{field}' {expected}")]
    InvalidField {
        /// Name of the field.
        field: &'static str,
        /// What the field must hold.
        expected: &'static str,
    },
}

impl StructuralValidationError {
    /// The offending field, if the error concerns one.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            StructuralValidationError::NotAnObject => None,
            StructuralValidationError::MissingField { field }
            | StructuralValidationError::NullField { field }
            | StructuralValidationError::InvalidField { field, .. } => Some(*field),
        }
    }
}
