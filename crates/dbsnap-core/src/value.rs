//! Dynamically typed scalar values for row data.
//!
//! Snapshots capture row contents without knowing the column types at compile
//! time, so each cell is one of a closed set of scalar variants. The untagged
//! serde representation keeps persisted rows as plain JSON.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A single cell value in a captured row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SqlValue {
    /// SQL NULL.
    Null,
    /// Boolean.
    Bool(bool),
    /// Integer (64-bit).
    Integer(i64),
    /// Floating point (64-bit).
    Float(f64),
    /// Text.
    String(String),
}

/// A captured row: column name mapped to its value.
///
/// Sorted keys give deterministic column order in generated INSERT lists and
/// WHERE clauses. A row may carry keys absent from the table's current
/// columns; that is tolerated, not validated.
pub type Row = BTreeMap<String, SqlValue>;

impl SqlValue {
    /// Returns true for the NULL variant.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Canonical textual form used for cross-capture comparison.
    ///
    /// The two snapshots being compared were taken by independent drivers, so
    /// the same logical value can arrive as `Integer(25)` in one and
    /// `String("25")` in the other. Returns `None` for NULL, which never has
    /// a textual form.
    #[must_use]
    pub fn canonical_text(&self) -> Option<String> {
        match self {
            Self::Null => None,
            Self::Bool(b) => Some(b.to_string()),
            Self::Integer(i) => Some(i.to_string()),
            Self::Float(f) => Some(canonical_float(*f)),
            Self::String(s) => Some(s.clone()),
        }
    }

    /// Value equality by canonical representation.
    ///
    /// NULL is equal only to NULL; everything else compares by canonical
    /// text, so `Integer(1)`, `Float(1.0)` and `String("1")` are all equal.
    #[must_use]
    pub fn canonically_eq(&self, other: &Self) -> bool {
        match (self.canonical_text(), other.canonical_text()) {
            (None, None) => true,
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}

/// Integral floats print without the fractional part so they compare equal
/// to their integer counterparts. This text is for comparison and keying
/// only, never SQL output; non-finite values keep their display form here
/// and are quoted by the DML renderer.
fn canonical_float(f: f64) -> String {
    const MAX_EXACT: f64 = 9_007_199_254_740_992.0; // 2^53
    if f.is_finite() && f.fract() == 0.0 && f.abs() < MAX_EXACT {
        #[allow(clippy::cast_possible_truncation)]
        return (f as i64).to_string();
    }
    f.to_string()
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}
