//! # anno-score
//!
//! Scoring of machine annotations against human reference annotations.
//!
//! - **Spans**: entity mention recognition with weighted token overlap
//! - **Attributes**: entity clustering judged by attribute agreement
//! - **Facts**: relation extraction scored by one-to-many clusters
//!
//! ## Quick Start
//!
//! ```rust
//! use anno_score::eval::{evaluate_spans, EvalConfig, SpanItem, Tag};
//!
//! let reference = vec![SpanItem::new(1, Tag::Person, [1, 2, 3])];
//! let system = vec![SpanItem::new(1, Tag::Person, [1, 2])];
//!
//! let alignment = evaluate_spans(&reference, &system, &EvalConfig::default()).unwrap();
//! assert!((alignment.overall.f1.get() - 2.0 / 3.0).abs() < 1e-12);
//! ```
//!
//! ## How matching works
//!
//! | Stage    | Where                      | What happens                              |
//! |----------|----------------------------|-------------------------------------------|
//! | oracle   | [`eval::QualityOracle`]    | priority, quality and ignore rules        |
//! | search   | [`eval::MatchingEngine`]   | best one-to-one matching by final F1      |
//! | clusters | [`eval::ClusterEngine`]    | best one-to-many binding of facts         |
//! | metrics  | [`eval::Metrics`]          | precision, recall and F1 with edge cases  |
//!
//! The search is exhaustive with pruning. Documents are small enough for it
//! in practice; [`eval::SearchOptions::max_steps`] bounds the pathological
//! ones.
//!
//! ## Feature Flags
//!
//! ```toml
//! [dependencies]
//! anno-score = "0.1"                                        # sequential scoring
//! anno-score = { version = "0.1", features = ["eval-parallel"] } # documents on rayon
//! anno-score = { version = "0.1", features = ["fast-lock"] }     # parking_lot mutex
//! ```
//!
//! ## Logging
//!
//! The crate logs through the `log` facade and installs no logger. Search
//! sizes and results are logged at `debug`, documents missing on one side
//! at `warn`.

#![warn(missing_docs)]

mod error;
pub mod eval;
pub mod similarity;
pub mod sync;

pub use error::{Error, Result};

/// Common imports.
///
/// ```rust
/// use anno_score::prelude::*;
///
/// let metrics = Metrics::symmetric(1.0, 1, 1).unwrap();
/// assert!(metrics.is_perfect());
/// ```
pub mod prelude {
    pub use crate::eval::{
        evaluate_entities, evaluate_facts, evaluate_spans, prepare_spans, Alignment, EntityItem,
        EvalConfig, Fact, FactAlignment, Metrics, QualityOracle, SpanItem, Tag,
    };
    pub use crate::{Error, Result};
}
