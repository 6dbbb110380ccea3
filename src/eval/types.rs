//! Evaluation primitives shared by every task: bounded metric values and
//! item identities.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// A metric or score value bounded to [0.0, 1.0].
///
/// Construction fails instead of clamping, so an out-of-range score surfaces
/// where it was produced.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, PartialOrd)]
#[serde(transparent)]
pub struct MetricValue(f64);

impl MetricValue {
    /// The value 1.0.
    pub const ONE: MetricValue = MetricValue(1.0);
    /// The value 0.0.
    pub const ZERO: MetricValue = MetricValue(0.0);

    /// Create a MetricValue, returning an error if `value` is outside [0, 1]
    /// or not a number.
    ///
    /// # Example
    /// ```
    /// use anno_score::eval::MetricValue;
    ///
    /// let v = MetricValue::try_new("f1", 0.95).unwrap();
    /// assert!((v.get() - 0.95).abs() < 1e-12);
    /// assert!(MetricValue::try_new("f1", 1.5).is_err());
    /// ```
    pub fn try_new(kind: &'static str, value: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&value) {
            return Err(Error::score_out_of_range(kind, value));
        }
        Ok(MetricValue(value))
    }

    /// Get the underlying value.
    #[inline]
    pub fn get(&self) -> f64 {
        self.0
    }
}

impl Default for MetricValue {
    fn default() -> Self {
        MetricValue::ZERO
    }
}

impl std::fmt::Display for MetricValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4}", self.0)
    }
}

/// Check that a pairwise score lies in [0, 1].
///
/// Quality oracles route every priority and quality through this before
/// returning it.
pub fn checked_score(kind: &'static str, value: f64) -> Result<f64> {
    MetricValue::try_new(kind, value).map(|v| v.get())
}

/// Identity of an item within one side of one document.
///
/// Collaborators assign ids; parent and sibling links refer to items by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub u64);

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u64> for ItemId {
    fn from(id: u64) -> Self {
        ItemId(id)
    }
}
