use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Hygiene status for canonicalization attempts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HygieneStatus {
    /// The input was canonicalizable without rewriting.
    Ok,
    /// The input was accepted after numeric normalization; warnings should be inspected.
    Normalized,
    /// The input was invalid and must be rejected.
    Invalid,
}

/// Stable warning code emitted by canonicalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HygieneWarning(String);

impl HygieneWarning {
    /// Creates a warning from a literal code.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Returns the warning code.
    pub fn code(&self) -> &str {
        &self.0
    }
}

/// Hygiene reports produced during canonicalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HygieneReport {
    /// Overall hygiene status.
    pub status: HygieneStatus,
    /// Stable warning codes, deduplicated.
    pub warnings: Vec<HygieneWarning>,
    /// Counters such as the number of rewritten floats.
    pub metrics: BTreeMap<String, u64>,
}

impl HygieneReport {
    pub(crate) fn clean() -> Self {
        Self {
            status: HygieneStatus::Ok,
            warnings: Vec::new(),
            metrics: BTreeMap::new(),
        }
    }

    pub(crate) fn record(&mut self, code: &str, metric: &str) {
        if !self.warnings.iter().any(|w| w.code() == code) {
            self.warnings.push(HygieneWarning::new(code));
        }
        *self.metrics.entry(metric.to_string()).or_insert(0) += 1;
        if self.status == HygieneStatus::Ok {
            self.status = HygieneStatus::Normalized;
        }
    }
}
