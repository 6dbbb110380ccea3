//! The quality oracle contract between the matching engine and a task.
//!
//! The engine never looks inside items. Everything it needs comes through
//! [`QualityOracle`]:
//!
//! - `tag_compatible`: gate deciding whether a pair is ever considered
//! - `priority`: cheap score that builds the search matrix and drives pruning
//! - `quality`: precise score summed into the true positives
//! - `is_*_ignored`: rules removing items from the denominators after the fact
//! - `evaluate`: turns a complete matching into [`Metrics`]
//!
//! Ignore rules may need tie-break state that must stay stable while one
//! matching is being scored (which of two identical-span items was kept).
//! That state lives in an [`EvalContext`] owned by whoever runs the
//! evaluation, never in the items or the oracle.

use super::metrics::Metrics;
use super::tags::Tag;
use super::types::ItemId;
use crate::Result;
use std::collections::HashMap;

/// An item that can be matched: an entity mention, an entity, a fact.
pub trait Item {
    /// Identity within its side of the document.
    fn id(&self) -> ItemId;
    /// Category label.
    fn tag(&self) -> Tag;
}

/// Tie-break state for a single evaluation.
///
/// Records, per unordered pair of twin items, which one was kept. The first
/// item to claim a pair keeps it; later claims by its twin are refused, so
/// repeated questions about the same matching always get the same answer.
///
/// # Example
///
/// ```rust
/// use anno_score::eval::{EvalContext, ItemId};
///
/// let mut ctx = EvalContext::new();
/// assert!(ctx.claim_twin(ItemId(1), ItemId(2)));
/// assert!(!ctx.claim_twin(ItemId(2), ItemId(1)));
/// assert!(ctx.claim_twin(ItemId(1), ItemId(2)));
/// ```
#[derive(Debug, Clone, Default)]
pub struct EvalContext {
    kept_twins: HashMap<(ItemId, ItemId), ItemId>,
}

impl EvalContext {
    /// Fresh context with no decisions recorded.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the pair `(claimant, twin)` for `claimant`.
    ///
    /// Returns true if `claimant` is (or now becomes) the kept item.
    pub fn claim_twin(&mut self, claimant: ItemId, twin: ItemId) -> bool {
        let key = if claimant <= twin {
            (claimant, twin)
        } else {
            (twin, claimant)
        };
        *self.kept_twins.entry(key).or_insert(claimant) == claimant
    }

    /// The kept item of a pair, if one was decided.
    #[must_use]
    pub fn kept_twin(&self, a: ItemId, b: ItemId) -> Option<ItemId> {
        let key = if a <= b { (a, b) } else { (b, a) };
        self.kept_twins.get(&key).copied()
    }

    /// Forget every decision.
    pub fn reset(&mut self) {
        self.kept_twins.clear();
    }

    /// Number of decided pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.kept_twins.len()
    }

    /// True when nothing was decided yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.kept_twins.is_empty()
    }
}

/// A matched pair as seen by an oracle: side-local indices plus the
/// pair's quality.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredPair {
    /// Index into the reference side
    pub reference: usize,
    /// Index into the system side
    pub system: usize,
    /// Quality of the pair
    pub quality: f64,
}

/// One side of a matching.
#[derive(Debug, Clone, Copy)]
pub struct Side<'a, T> {
    items: &'a [&'a T],
    partner: &'a [Option<usize>],
    unmatched: &'a [usize],
    by_id: &'a HashMap<ItemId, usize>,
}

impl<'a, T> Side<'a, T> {
    /// Assemble a side.
    ///
    /// `partner[i]` is the index on the other side matched to item `i`;
    /// `unmatched` lists the leftovers under evaluation; `by_id` maps ids to
    /// indices into `items`.
    #[must_use]
    pub fn new(
        items: &'a [&'a T],
        partner: &'a [Option<usize>],
        unmatched: &'a [usize],
        by_id: &'a HashMap<ItemId, usize>,
    ) -> Self {
        Self {
            items,
            partner,
            unmatched,
            by_id,
        }
    }

    /// All items of this side.
    #[must_use]
    pub fn items(&self) -> &'a [&'a T] {
        self.items
    }

    /// Item at `index`.
    #[must_use]
    pub fn item(&self, index: usize) -> &'a T {
        self.items[index]
    }

    /// Unmatched items under evaluation.
    #[must_use]
    pub fn unmatched(&self) -> &'a [usize] {
        self.unmatched
    }

    /// Whether item `index` is paired anywhere in the full matching.
    #[must_use]
    pub fn is_matched(&self, index: usize) -> bool {
        self.partner.get(index).is_some_and(Option::is_some)
    }

    /// The other-side index paired with item `index`.
    #[must_use]
    pub fn partner(&self, index: usize) -> Option<usize> {
        self.partner.get(index).copied().flatten()
    }

    /// Index of the item with `id`, if it is on this side.
    #[must_use]
    pub fn position(&self, id: ItemId) -> Option<usize> {
        self.by_id.get(&id).copied()
    }

    /// Whether the item with `id` is on this side and matched.
    #[must_use]
    pub fn is_matched_id(&self, id: ItemId) -> bool {
        self.position(id).is_some_and(|i| self.is_matched(i))
    }
}

/// A complete matching, or the part of it being evaluated (one tag bucket).
///
/// `pairs` and the sides' unmatched lists are the evaluated subset; partner
/// lookups always reflect the full matching, so ignore rules see matches
/// made outside the subset.
#[derive(Debug, Clone, Copy)]
pub struct MatchingView<'a, T> {
    /// Reference side
    pub reference: Side<'a, T>,
    /// System side
    pub system: Side<'a, T>,
    /// Pairs under evaluation
    pub pairs: &'a [ScoredPair],
}

/// Task-specific comparison logic.
///
/// Implementations must return scores in [0, 1] and fail with an error,
/// not a silent zero, when a tag pair is unknown.
pub trait QualityOracle {
    /// The items this oracle compares.
    type Item: Item;

    /// Whether a reference item may be compared with a system item at all.
    fn tag_compatible(&self, reference: &Self::Item, system: &Self::Item) -> Result<bool>;

    /// Cheap estimate used to build the search matrix.
    fn priority(&self, reference: &Self::Item, system: &Self::Item) -> Result<f64>;

    /// Precise score contributing to the true positive sum.
    fn quality(&self, reference: &Self::Item, system: &Self::Item) -> Result<f64>;

    /// Whether a matched pair is left out of the metrics entirely.
    fn is_pair_ignored(
        &self,
        _view: &MatchingView<'_, Self::Item>,
        _pair: &ScoredPair,
        _ctx: &mut EvalContext,
    ) -> bool {
        false
    }

    /// Whether an unmatched reference item is left out of recall.
    fn is_reference_ignored(
        &self,
        _view: &MatchingView<'_, Self::Item>,
        _index: usize,
        _ctx: &mut EvalContext,
    ) -> bool {
        false
    }

    /// Whether an unmatched system item is left out of precision.
    fn is_system_ignored(
        &self,
        _view: &MatchingView<'_, Self::Item>,
        _index: usize,
        _ctx: &mut EvalContext,
    ) -> bool {
        false
    }

    /// Score a matching.
    ///
    /// The default shares one true positive sum between both sides: every
    /// counted pair adds its quality and one item to each denominator, every
    /// counted leftover adds one item to its own side.
    fn evaluate(&self, view: &MatchingView<'_, Self::Item>, ctx: &mut EvalContext) -> Result<Metrics> {
        let mut tp = 0.0;
        let mut n_std = 0;
        let mut n_test = 0;

        for pair in view.pairs {
            if self.is_pair_ignored(view, pair, ctx) {
                continue;
            }
            tp += pair.quality;
            n_std += 1;
            n_test += 1;
        }

        for &index in view.reference.unmatched() {
            if !self.is_reference_ignored(view, index, ctx) {
                n_std += 1;
            }
        }
        for &index in view.system.unmatched() {
            if !self.is_system_ignored(view, index, ctx) {
                n_test += 1;
            }
        }

        Metrics::symmetric(tp, n_std, n_test)
    }
}
