//! Precision / recall / F1 aggregation.
//!
//! [`Metrics`] keeps four base counters and derives the rest:
//!
//! | Counter   | Meaning                                             |
//! |-----------|-----------------------------------------------------|
//! | `tp_std`  | quality mass credited to reference items (recall)   |
//! | `tp_test` | quality mass credited to system items (precision)   |
//! | `n_std`   | reference items that count                          |
//! | `n_test`  | system items that count                             |
//!
//! Two construction paths exist. [`Metrics::symmetric`] shares one true
//! positive sum between both sides, which is what one-to-one matchings
//! produce. [`Metrics::asymmetric`] attributes quality to each side
//! separately, which one-to-many clusters need: a reference fact matched by
//! three responses contributes once to recall and three times to precision.
//!
//! # Edge cases
//!
//! - `n_test == 0` ⇒ precision = 1.0
//! - `n_std == 0` ⇒ recall = 1.0
//! - both zero ⇒ F1 = 1.0 (an empty response to an empty reference is right)
//! - otherwise `P + R == 0` ⇒ F1 = 0.0

use super::types::MetricValue;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::iter::Sum;
use std::ops::AddAssign;

/// Precision, recall and F1 over a document, a tag bucket or a corpus.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    /// True positive mass used for recall
    pub tp_std: f64,
    /// True positive mass used for precision
    pub tp_test: f64,
    /// Number of reference items
    pub n_std: usize,
    /// Number of system items
    pub n_test: usize,
    /// tp_test / n_test
    pub precision: MetricValue,
    /// tp_std / n_std
    pub recall: MetricValue,
    /// Harmonic mean of precision and recall
    pub f1: MetricValue,
}

impl Metrics {
    /// Metrics of an empty comparison: everything is 1.0.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            tp_std: 0.0,
            tp_test: 0.0,
            n_std: 0,
            n_test: 0,
            precision: MetricValue::ONE,
            recall: MetricValue::ONE,
            f1: MetricValue::ONE,
        }
    }

    /// Metrics with a single true positive sum shared by both sides.
    ///
    /// # Example
    ///
    /// ```rust
    /// use anno_score::eval::Metrics;
    ///
    /// let m = Metrics::symmetric(2.0, 4, 2).unwrap();
    /// assert_eq!(m.precision.get(), 1.0);
    /// assert_eq!(m.recall.get(), 0.5);
    /// assert!((m.f1.get() - 2.0 / 3.0).abs() < 1e-12);
    /// ```
    pub fn symmetric(tp: f64, n_std: usize, n_test: usize) -> Result<Self> {
        Self::asymmetric(tp, tp, n_std, n_test)
    }

    /// Metrics with independently attributed true positive sums.
    ///
    /// Fails if any derived value falls outside [0, 1], i.e. when a true
    /// positive sum exceeds its count or is negative.
    pub fn asymmetric(tp_std: f64, tp_test: f64, n_std: usize, n_test: usize) -> Result<Self> {
        let mut metrics = Self {
            tp_std,
            tp_test,
            n_std,
            n_test,
            ..Self::empty()
        };
        metrics.recalculate()?;
        Ok(metrics)
    }

    /// Recompute precision, recall and F1 from the four counters.
    pub fn recalculate(&mut self) -> Result<()> {
        let precision = if self.n_test > 0 {
            self.tp_test / self.n_test as f64
        } else {
            1.0
        };
        let recall = if self.n_std > 0 {
            self.tp_std / self.n_std as f64
        } else {
            1.0
        };

        let f1 = if self.n_std + self.n_test == 0 {
            1.0
        } else if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };

        self.precision = MetricValue::try_new("precision", precision)?;
        self.recall = MetricValue::try_new("recall", recall)?;
        self.f1 = MetricValue::try_new("f1", f1)?;
        Ok(())
    }

    /// Accumulate another set of counters into this one.
    ///
    /// Counters that were each valid stay valid when summed, so this cannot
    /// fail.
    pub fn add(&mut self, other: &Metrics) {
        self.tp_std += other.tp_std;
        self.tp_test += other.tp_test;
        self.n_std += other.n_std;
        self.n_test += other.n_test;
        let recalculated = self.recalculate();
        debug_assert!(recalculated.is_ok(), "sum of valid metrics is invalid");
    }

    /// True when the comparison was perfect.
    #[must_use]
    pub fn is_perfect(&self) -> bool {
        self.f1.get() >= 1.0
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::empty()
    }
}

impl AddAssign<&Metrics> for Metrics {
    fn add_assign(&mut self, rhs: &Metrics) {
        self.add(rhs);
    }
}

impl AddAssign for Metrics {
    fn add_assign(&mut self, rhs: Metrics) {
        self.add(&rhs);
    }
}

impl Sum for Metrics {
    fn sum<I: Iterator<Item = Metrics>>(iter: I) -> Self {
        iter.fold(Metrics::empty(), |mut acc, m| {
            acc += m;
            acc
        })
    }
}

impl<'a> Sum<&'a Metrics> for Metrics {
    fn sum<I: Iterator<Item = &'a Metrics>>(iter: I) -> Self {
        iter.fold(Metrics::empty(), |mut acc, m| {
            acc.add(m);
            acc
        })
    }
}
