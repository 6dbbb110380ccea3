//! Annotation scoring: matching engines, quality oracles and metrics.
//!
//! # Overview
//!
//! A human reference annotation and a system annotation of the same text are
//! compared item by item. Three tasks are supported:
//!
//! | Task       | Items          | Oracle              | Engine             |
//! |------------|----------------|---------------------|--------------------|
//! | spans      | [`SpanItem`]   | [`SpanOracle`]      | [`MatchingEngine`] |
//! | attributes | [`EntityItem`] | [`AttributeOracle`] | [`MatchingEngine`] |
//! | facts      | [`Fact`]       | [`ArgumentOracle`]  | [`ClusterEngine`]  |
//!
//! Spans and attributes are matched one-to-one; a reference fact may be
//! matched by several system facts. Every task ends in [`Metrics`]: overall,
//! per tag where tags apply, and summed over a corpus by [`CorpusScores`].
//!
//! # Span scoring
//!
//! ```rust
//! use anno_score::eval::{evaluate_spans, prepare_spans, EvalConfig, SpanItem, Tag};
//!
//! let config = EvalConfig::default();
//! let reference = prepare_spans(
//!     vec![
//!         SpanItem::new(1, Tag::Organization, [3, 4]),
//!         SpanItem::new(2, Tag::Person, [7, 8]),
//!     ],
//!     &config,
//! );
//! let system = prepare_spans(vec![SpanItem::new(1, Tag::Organization, [3, 4])], &config);
//!
//! let alignment = evaluate_spans(&reference, &system, &config).unwrap();
//! assert_eq!(alignment.overall.precision.get(), 1.0);
//! assert_eq!(alignment.overall.recall.get(), 0.5);
//! ```
//!
//! # Fact scoring
//!
//! ```rust
//! use anno_score::eval::{evaluate_facts, EvalConfig, Fact};
//!
//! let reference = vec![Fact::new(1, "Occupation")
//!     .with_argument("who", ["Иванов"])
//!     .with_argument("position", ["директор"])];
//! let system = vec![Fact::new(1, "Occupation")
//!     .with_argument("who", ["Иванова"])
//!     .with_argument("job", ["Директор"])];
//!
//! let alignment = evaluate_facts(&reference, &system, &EvalConfig::default()).unwrap();
//! assert_eq!(alignment.overall.f1.get(), 1.0);
//! ```
//!
//! # Custom oracles
//!
//! [`MatchingEngine`] works with any [`QualityOracle`]; the ignore rules and
//! the way a matching is turned into [`Metrics`] are part of the oracle.

mod attribute;
mod cluster;
mod config;
mod corpus;
mod fact;
mod matching;
mod metrics;
mod oracle;
mod span;
mod tags;
mod types;

pub use attribute::{Attribute, AttributeOracle, EntityItem};
pub use cluster::{Cluster, ClusterEngine, FactAlignment};
pub use config::EvalConfig;
pub use corpus::{score_corpus, CorpusScores, DocumentPairing, DocumentScore};
pub use fact::{
    prepare_reference, Argument, ArgumentOracle, ArgumentScore, ArgumentWeights, Fact, FactMode,
    EASY_MODALITIES, HARD_DIFFICULTIES,
};
pub use matching::{AlignedPair, Alignment, MatchingEngine, SearchOptions, UnmatchedItem};
pub use metrics::Metrics;
pub use oracle::{EvalContext, Item, MatchingView, QualityOracle, ScoredPair, Side};
pub use span::{fold_locorg, link_embedding, SpanItem, SpanOracle, SpanWeights, TokenId};
pub use tags::{Tag, TagTable};
pub use types::{checked_score, ItemId, MetricValue};

use crate::Result;
use std::borrow::Cow;

/// Fold LocOrg when it is disabled, then link parents and siblings.
///
/// Skip this when the collaborator already provides the links.
#[must_use]
pub fn prepare_spans(mut items: Vec<SpanItem>, config: &EvalConfig) -> Vec<SpanItem> {
    if !config.locorg_enabled {
        fold_locorg(&mut items);
    }
    link_embedding(&mut items);
    items
}

/// Score the entity spans of one document.
///
/// With locorg disabled, sides that still carry LocOrg spans are run through
/// [`prepare_spans`] first, so those spans are scored as Location.
pub fn evaluate_spans(
    reference: &[SpanItem],
    system: &[SpanItem],
    config: &EvalConfig,
) -> Result<Alignment> {
    config.validate()?;
    let reference = fold_unprepared(reference, config, "reference");
    let system = fold_unprepared(system, config, "system");

    let oracle = config.span_oracle();
    MatchingEngine::new(&oracle, &*reference, &*system, &config.span_tags())?
        .with_options(config.search)
        .find_solution()
}

fn fold_unprepared<'a>(
    items: &'a [SpanItem],
    config: &EvalConfig,
    side: &str,
) -> Cow<'a, [SpanItem]> {
    if config.locorg_enabled || !items.iter().any(|item| item.tag == Tag::LocOrg) {
        return Cow::Borrowed(items);
    }
    log::warn!(
        "locorg is disabled but {} spans carry LocOrg; folding them into Location",
        side
    );
    Cow::Owned(prepare_spans(items.to_vec(), config))
}

/// Score the attribute-described entities of one document.
///
/// Entities are normalized and LocOrg is scored as Location.
pub fn evaluate_entities(
    reference: &[EntityItem],
    system: &[EntityItem],
    config: &EvalConfig,
) -> Result<Alignment> {
    config.validate()?;
    let prepare = |items: &[EntityItem]| -> Vec<EntityItem> {
        items
            .iter()
            .map(|item| {
                let mut item = item.normalized();
                item.tag = item.tag.folded(false);
                item
            })
            .collect()
    };
    let reference = prepare(reference);
    let system = prepare(system);

    let oracle = config.attribute_oracle();
    MatchingEngine::new(&oracle, &reference, &system, &config.entity_tags())?
        .with_options(config.search)
        .find_solution()
}

/// Score the facts of one document under the configured [`FactMode`].
///
/// Only reference facts are prepared; system facts are scored as given, so
/// a service or `phase` argument in a response counts as spurious.
pub fn evaluate_facts(
    reference: &[Fact],
    system: &[Fact],
    config: &EvalConfig,
) -> Result<FactAlignment> {
    config.validate()?;
    let reference = prepare_reference(reference.to_vec(), config.fact_mode);

    let oracle = config.argument_oracle();
    ClusterEngine::new(&oracle, &reference, system)
        .with_max_steps(config.search.max_steps)
        .find_solution()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prepare_spans_folds_locorg() {
        let config = EvalConfig {
            locorg_enabled: false,
            ..EvalConfig::default()
        };
        let items = prepare_spans(
            vec![
                SpanItem::new(1, Tag::LocOrg, [1, 2]),
                SpanItem::new(2, Tag::Location, [1]),
            ],
            &config,
        );
        assert_eq!(items[0].tag, Tag::Location);
        assert_eq!(items[1].parents, vec![ItemId(1)]);
    }

    #[test]
    fn test_evaluate_spans_by_tag_buckets() {
        let config = EvalConfig::default();
        let reference = vec![
            SpanItem::new(1, Tag::Person, [1, 2]),
            SpanItem::new(2, Tag::LocOrg, [5]),
        ];
        let system = vec![SpanItem::new(1, Tag::Person, [1, 2])];
        let alignment = evaluate_spans(&reference, &system, &config).unwrap();
        assert_eq!(alignment.by_tag.len(), 4);
        assert_eq!(alignment.by_tag[&Tag::Person].f1.get(), 1.0);
        assert_eq!(alignment.by_tag[&Tag::LocOrg].recall.get(), 0.0);
    }

    #[test]
    fn test_evaluate_entities_folds_locorg() {
        let config = EvalConfig::default();
        let reference = vec![EntityItem::new(1, Tag::LocOrg).with_attribute("name", ["Россия"])];
        let system = vec![EntityItem::new(1, Tag::Location).with_attribute("name", ["России"])];
        let alignment = evaluate_entities(&reference, &system, &config).unwrap();
        assert_eq!(alignment.overall.f1.get(), 1.0);
        assert_eq!(alignment.pairs[0].tag, Tag::Location);
        assert!(!alignment.by_tag.contains_key(&Tag::LocOrg));
    }

    #[test]
    fn test_evaluate_spans_folds_unprepared_locorg() {
        let config = EvalConfig {
            locorg_enabled: false,
            ..EvalConfig::default()
        };
        let reference = vec![
            SpanItem::new(1, Tag::LocOrg, [1, 2]),
            SpanItem::new(2, Tag::Person, [5]),
        ];
        let system = vec![SpanItem::new(1, Tag::Person, [5])];
        let alignment = evaluate_spans(&reference, &system, &config).unwrap();

        assert_eq!(alignment.overall.n_std, 2);
        assert_eq!(alignment.overall.recall.get(), 0.5);
        assert_eq!(alignment.unmatched_reference.len(), 1);
        assert_eq!(alignment.unmatched_reference[0].tag, Tag::Location);
        assert_eq!(alignment.by_tag[&Tag::Location].n_std, 1);
    }

    #[test]
    fn test_evaluate_facts_hard_mode() {
        let config = EvalConfig {
            fact_mode: FactMode::Hard,
            ..EvalConfig::default()
        };
        let reference = vec![Fact::new(1, "Meeting")
            .with_argument("participant", ["Иванов"])
            .with_argument("modality", ["future"])];
        let alignment = evaluate_facts(&reference, &[], &config).unwrap();
        assert!(alignment.clusters.is_empty());
        assert_eq!(alignment.overall.f1.get(), 1.0);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = EvalConfig {
            fuzzy_edit_ratio: -0.5,
            ..EvalConfig::default()
        };
        assert!(evaluate_spans(&[], &[], &config).is_err());
    }
}
