use canonical_json::to_string;
use serde_json::{Number, Value};

use crate::hygiene::HygieneReport;
use std::fmt;

/// Error returned when canonicalization fails.
#[derive(thiserror::Error, Debug)]
pub enum CanonicalizationError {
    /// Non-finite number (NaN/Infinity) detected.
    #[error("non-finite number detected at {0}")]
    NonFiniteNumber(String),
    /// Generic failure from the RFC 8785 encoder.
    #[error("other error: {0}")]
    Other(String),
}

/// Result of canonicalization.
#[derive(Debug)]
pub struct CanonicalizationResult {
    /// Canonical UTF-8 bytes for the input value.
    pub bytes: Vec<u8>,
    /// Hygiene report describing the normalizations applied.
    pub report: HygieneReport,
}

/// Helper for building JSON paths in error messages.
#[derive(Debug, Clone)]
struct Path {
    segments: Vec<String>,
}

impl Path {
    fn root() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    fn push_field(&self, field: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(field.to_string());
        Self { segments }
    }

    fn push_index(&self, index: usize) -> Self {
        let mut segments = self.segments.clone();
        segments.push(format!("[{}]", index));
        Self { segments }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            write!(f, "root")
        } else {
            write!(f, "{}", self.segments.join("."))
        }
    }
}

/// Canonicalizer that emits deterministic bytes.
///
/// Objects are emitted with sorted keys and no insignificant whitespace
/// (RFC 8785). Before emission every number is rewritten to its fixed form:
/// a finite float with no fractional part that fits an integer type becomes
/// that integer, so `1700000000.0` and `1700000000` produce identical bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct Canonicalizer;

impl Canonicalizer {
    /// Creates a new canonicalizer.
    pub fn new() -> Self {
        Self
    }

    /// Produces canonical bytes + hygiene report.
    pub fn canonicalize(
        &self,
        value: &Value,
    ) -> Result<CanonicalizationResult, CanonicalizationError> {
        let mut report = HygieneReport::clean();
        let mut normalized = value.clone();

        self.normalize(&mut normalized, Path::root(), &mut report)?;

        let canonical =
            to_string(&normalized).map_err(|err| CanonicalizationError::Other(err.to_string()))?;
        let bytes = canonical.into_bytes();

        Ok(CanonicalizationResult { bytes, report })
    }

    /// Rewrites numbers in place and rejects values the profile cannot encode.
    fn normalize(
        &self,
        value: &mut Value,
        path: Path,
        report: &mut HygieneReport,
    ) -> Result<(), CanonicalizationError> {
        match value {
            Value::Object(map) => {
                for (key, child) in map.iter_mut() {
                    self.normalize(child, path.push_field(key), report)?;
                }
                Ok(())
            }
            Value::Array(items) => {
                for (idx, item) in items.iter_mut().enumerate() {
                    self.normalize(item, path.push_index(idx), report)?;
                }
                Ok(())
            }
            Value::Number(num) => {
                let Some(f) = num.as_f64().filter(|_| num.is_f64()) else {
                    return Ok(());
                };
                if !f.is_finite() {
                    report.record("NonFiniteNumber", "non_finite_numbers");
                    return Err(CanonicalizationError::NonFiniteNumber(path.to_string()));
                }
                if let Some(integral) = integral_number(f) {
                    report.record("IntegralFloat", "integral_floats");
                    *num = integral;
                }
                Ok(())
            }
            Value::String(_) | Value::Bool(_) | Value::Null => Ok(()),
        }
    }
}

/// Converts an integral float into an integer JSON number when it fits.
fn integral_number(f: f64) -> Option<Number> {
    if f.fract() != 0.0 {
        return None;
    }
    // i64::MIN is exactly representable; i64::MAX + 1 is the first float past the range.
    if (-9_223_372_036_854_775_808.0..9_223_372_036_854_775_808.0).contains(&f) {
        return Some(Number::from(f as i64));
    }
    if (0.0..18_446_744_073_709_551_616.0).contains(&f) {
        return Some(Number::from(f as u64));
    }
    None
}

/// Canonical bytes of `value` under the default profile.
pub fn canonical_bytes(value: &Value) -> Result<Vec<u8>, CanonicalizationError> {
    Canonicalizer::new().canonicalize(value).map(|r| r.bytes)
}

/// Canonical decimal text of a JSON number, as it appears in canonical bytes.
pub fn canonical_number_text(number: &Number) -> Result<String, CanonicalizationError> {
    if let Some(f) = number.as_f64().filter(|_| number.is_f64()) {
        if !f.is_finite() {
            return Err(CanonicalizationError::NonFiniteNumber("number".to_string()));
        }
        if let Some(integral) = integral_number(f) {
            return Ok(integral.to_string());
        }
    }
    Ok(number.to_string())
}
