//! Corpus-level aggregation.
//!
//! Documents are scored independently and their counters summed, so corpus
//! precision and recall are micro-averages over items, not means of
//! per-document scores.
//!
//! With the `eval-parallel` feature documents are scored on the rayon pool.

use super::cluster::FactAlignment;
use super::matching::Alignment;
use super::metrics::Metrics;
use super::tags::Tag;
use crate::Result;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Scores of one document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentScore {
    /// Document name
    pub name: String,
    /// Metrics over all tags
    pub overall: Metrics,
    /// Metrics per tag; empty for facts
    pub by_tag: BTreeMap<Tag, Metrics>,
}

impl DocumentScore {
    /// Scores of a span or attribute alignment.
    #[must_use]
    pub fn from_alignment(name: impl Into<String>, alignment: &Alignment) -> Self {
        Self {
            name: name.into(),
            overall: alignment.overall,
            by_tag: alignment.by_tag.clone(),
        }
    }

    /// Scores of a fact alignment.
    #[must_use]
    pub fn from_facts(name: impl Into<String>, alignment: &FactAlignment) -> Self {
        Self {
            name: name.into(),
            overall: alignment.overall,
            by_tag: BTreeMap::new(),
        }
    }
}

/// Summed scores of a corpus.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CorpusScores {
    /// Per-document scores in the order they were added
    pub documents: Vec<DocumentScore>,
    /// Sum over all documents
    pub overall: Metrics,
    /// Sum per tag over all documents
    pub by_tag: BTreeMap<Tag, Metrics>,
}

impl CorpusScores {
    /// Empty corpus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one document.
    pub fn add(&mut self, document: DocumentScore) {
        self.overall += &document.overall;
        for (tag, metrics) in &document.by_tag {
            *self.by_tag.entry(*tag).or_default() += metrics;
        }
        self.documents.push(document);
    }
}

impl FromIterator<DocumentScore> for CorpusScores {
    fn from_iter<I: IntoIterator<Item = DocumentScore>>(iter: I) -> Self {
        let mut scores = Self::new();
        for document in iter {
            scores.add(document);
        }
        scores
    }
}

/// Score every document with `score` and sum the results.
///
/// The first error aborts the run.
pub fn score_corpus<D, F>(documents: &[D], score: F) -> Result<CorpusScores>
where
    D: Sync,
    F: Fn(&D) -> Result<DocumentScore> + Sync,
{
    #[cfg(feature = "eval-parallel")]
    let scored: Vec<DocumentScore> = {
        use rayon::prelude::*;
        documents.par_iter().map(&score).collect::<Result<_>>()?
    };

    #[cfg(not(feature = "eval-parallel"))]
    let scored: Vec<DocumentScore> = documents.iter().map(&score).collect::<Result<_>>()?;

    log::debug!("corpus: scored {} documents", scored.len());
    Ok(scored.into_iter().collect())
}

/// Which documents of the two sides belong together.
///
/// Documents are paired by name. A reference document without a system
/// counterpart is still scored, against an empty response; a system
/// document without a reference cannot be scored and is only reported.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DocumentPairing {
    /// Names present on both sides
    pub paired: Vec<String>,
    /// Names present only in the reference
    pub reference_only: Vec<String>,
    /// Names present only in the response
    pub system_only: Vec<String>,
}

impl DocumentPairing {
    /// Pair document names, sorted.
    pub fn new<R, S>(reference: R, system: S) -> Self
    where
        R: IntoIterator,
        R::Item: Into<String>,
        S: IntoIterator,
        S::Item: Into<String>,
    {
        let reference: BTreeSet<String> = reference.into_iter().map(Into::into).collect();
        let system: BTreeSet<String> = system.into_iter().map(Into::into).collect();

        let pairing = Self {
            paired: reference.intersection(&system).cloned().collect(),
            reference_only: reference.difference(&system).cloned().collect(),
            system_only: system.difference(&reference).cloned().collect(),
        };

        for name in &pairing.reference_only {
            log::warn!("document '{}' has no response; scored as empty", name);
        }
        for name in &pairing.system_only {
            log::warn!("response '{}' has no reference document; skipped", name);
        }
        pairing
    }

    /// Names to score: paired documents, then reference-only ones.
    pub fn scored(&self) -> impl Iterator<Item = &str> + '_ {
        self.paired
            .iter()
            .chain(self.reference_only.iter())
            .map(String::as_str)
    }
}
