//! Error types for anno-score.

use thiserror::Error;

/// Result type for anno-score operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for anno-score operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Invalid input provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration could not be parsed.
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Evaluation error.
    #[error("Evaluation error: {0}")]
    Evaluation(String),

    /// An oracle produced a score outside [0, 1].
    #[error("{kind} score {value} is outside [0, 1]")]
    ScoreOutOfRange {
        /// Which score was produced ("priority", "quality", "precision", ...)
        kind: &'static str,
        /// The offending value
        value: f64,
    },

    /// A tag pair has no entry in the compatibility table.
    #[error("No compatibility entry for reference tag {reference} and system tag {system}")]
    MissingTagPair {
        /// Reference-side tag label
        reference: String,
        /// System-side tag label
        system: String,
    },

    /// The search step budget ran out before the search space was covered.
    #[error("Search exhausted after {steps} steps without covering the search space")]
    SearchExhausted {
        /// Number of search nodes visited
        steps: u64,
    },
}

impl Error {
    /// Create an invalid input error.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Error::InvalidInput(msg.into())
    }

    /// Create an evaluation error.
    pub fn evaluation(msg: impl Into<String>) -> Self {
        Error::Evaluation(msg.into())
    }

    /// Create a score range error.
    pub fn score_out_of_range(kind: &'static str, value: f64) -> Self {
        Error::ScoreOutOfRange { kind, value }
    }

    /// Create a missing tag pair error.
    pub fn missing_tag_pair(reference: impl Into<String>, system: impl Into<String>) -> Self {
        Error::MissingTagPair {
            reference: reference.into(),
            system: system.into(),
        }
    }
}
