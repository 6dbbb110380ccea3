//! One-to-one matching of reference items to system items.
//!
//! The engine searches for the assignment whose *final* F1, after the
//! oracle's ignore rules, is highest. Greedy or Hungarian assignment does not
//! work here: the ignore rules make the score of a pair depend on what else
//! is matched.
//!
//! # Algorithm
//!
//! 1. Items on both sides are bucketed by tag (person, location,
//!    organization, locorg), keeping input order inside a bucket.
//! 2. A sparse priority matrix is filled for tag-compatible cells only.
//! 3. Reference items are visited in bucket order. For the current one:
//!    - candidates are the unused system items with nonzero priority, or only
//!      the perfect (priority 1) ones if any exist
//!    - a candidate is skipped if a later reference item matches it
//!      perfectly while the current pair is imperfect
//!    - leaving the item unmatched is tried only when nothing was viable, or
//!      when a single imperfect candidate is also wanted by a later item
//! 4. When either side runs out, the accumulated matching is scored through
//!    the oracle; the strictly best F1 wins and ties keep the earlier branch.
//!
//! The search is exponential in the worst case; [`SearchOptions::max_steps`]
//! turns a runaway search into [`Error::SearchExhausted`].
//!
//! # Example
//!
//! ```rust
//! use anno_score::eval::{MatchingEngine, SpanItem, SpanOracle, Tag};
//!
//! let reference = vec![
//!     SpanItem::new(1, Tag::Person, [1, 2]),
//!     SpanItem::new(2, Tag::Location, [5]),
//! ];
//! let system = vec![
//!     SpanItem::new(1, Tag::Location, [5]),
//!     SpanItem::new(2, Tag::Person, [1, 2]),
//! ];
//! let oracle = SpanOracle::default();
//!
//! let alignment = MatchingEngine::new(&oracle, &reference, &system, &Tag::ALL)
//!     .unwrap()
//!     .find_solution()
//!     .unwrap();
//! assert_eq!(alignment.overall.f1.get(), 1.0);
//! assert_eq!(alignment.pairs.len(), 2);
//! ```

use super::metrics::Metrics;
use super::oracle::{EvalContext, Item, MatchingView, QualityOracle, ScoredPair, Side};
use super::tags::Tag;
use super::types::{checked_score, ItemId};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::ops::Range;

/// Search tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchOptions {
    /// Try leaving every reference item unmatched, not only where the
    /// pruning heuristic allows it.
    pub always_explore_skip: bool,
    /// Give up with [`Error::SearchExhausted`] after this many search steps.
    pub max_steps: Option<u64>,
}

/// A matched pair in the final alignment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlignedPair {
    /// Position of the reference item in the input
    pub reference: usize,
    /// Position of the system item in the input
    pub system: usize,
    /// Id of the reference item
    pub reference_id: ItemId,
    /// Id of the system item
    pub system_id: ItemId,
    /// Tag of the reference item
    pub tag: Tag,
    /// Priority of the pair
    pub priority: f64,
    /// Quality of the pair
    pub quality: f64,
    /// Left out of the metrics
    pub ignored: bool,
}

/// An item left without a partner.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnmatchedItem {
    /// Position of the item in the input
    pub index: usize,
    /// Id of the item
    pub id: ItemId,
    /// Tag of the item
    pub tag: Tag,
    /// Left out of the metrics
    pub ignored: bool,
}

/// Result of a matching search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alignment {
    /// Matched pairs in reference order
    pub pairs: Vec<AlignedPair>,
    /// Reference items without a partner
    pub unmatched_reference: Vec<UnmatchedItem>,
    /// System items without a partner
    pub unmatched_system: Vec<UnmatchedItem>,
    /// Metrics over all tags
    pub overall: Metrics,
    /// Metrics per tag bucket
    pub by_tag: BTreeMap<Tag, Metrics>,
    /// Search steps taken
    pub steps: u64,
}

/// Sparse reference × system matrix of priorities and qualities.
#[derive(Debug, Clone)]
struct ScoreMatrix {
    columns: usize,
    priority: Vec<f64>,
    quality: Vec<f64>,
    /// Nonzero reference rows per system column
    by_column: Vec<Vec<usize>>,
    /// Nonzero system columns per reference row
    by_row: Vec<Vec<usize>>,
}

impl ScoreMatrix {
    fn priority(&self, r: usize, s: usize) -> f64 {
        self.priority[r * self.columns + s]
    }

    fn quality(&self, r: usize, s: usize) -> f64 {
        self.quality[r * self.columns + s]
    }
}

/// Items of one side sorted into tag buckets.
#[derive(Debug)]
struct Bucketed<'a, T> {
    items: Vec<&'a T>,
    /// Input position of each item
    origin: Vec<usize>,
    /// Range of each tag's bucket in `items`
    buckets: Vec<(Tag, Range<usize>)>,
    by_id: HashMap<ItemId, usize>,
}

impl<'a, T: Item> Bucketed<'a, T> {
    fn new(input: &'a [T], tags: &[Tag]) -> Self {
        let mut items = Vec::with_capacity(input.len());
        let mut origin = Vec::with_capacity(input.len());
        let mut buckets = Vec::with_capacity(tags.len());

        for &tag in tags {
            let start = items.len();
            for (i, item) in input.iter().enumerate() {
                if item.tag() == tag {
                    items.push(item);
                    origin.push(i);
                }
            }
            buckets.push((tag, start..items.len()));
        }

        let dropped = input.len() - items.len();
        if dropped > 0 {
            log::debug!("matching: {} items with unscored tags left out", dropped);
        }

        let by_id = items.iter().enumerate().map(|(i, item)| (item.id(), i)).collect();
        Self {
            items,
            origin,
            buckets,
            by_id,
        }
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}

/// Mutable state of the backtracking search.
struct SearchState {
    used: Vec<bool>,
    remaining_system: usize,
    pairs: Vec<(usize, usize)>,
    steps: u64,
    best: Option<(f64, Vec<(usize, usize)>)>,
}

/// Partner arrays and leftovers of one complete matching.
struct Assignment {
    reference_partner: Vec<Option<usize>>,
    system_partner: Vec<Option<usize>>,
    pairs: Vec<ScoredPair>,
}

/// Searches for the best one-to-one alignment under a [`QualityOracle`].
pub struct MatchingEngine<'a, O: QualityOracle> {
    oracle: &'a O,
    reference: Bucketed<'a, O::Item>,
    system: Bucketed<'a, O::Item>,
    matrix: ScoreMatrix,
    options: SearchOptions,
}

impl<'a, O: QualityOracle> MatchingEngine<'a, O> {
    /// Bucket both sides by `tags` and fill the priority matrix.
    ///
    /// Items whose tag is not in `tags` take no part in the matching.
    pub fn new(
        oracle: &'a O,
        reference: &'a [O::Item],
        system: &'a [O::Item],
        tags: &[Tag],
    ) -> Result<Self> {
        let reference = Bucketed::new(reference, tags);
        let system = Bucketed::new(system, tags);
        let matrix = Self::score_matrix(oracle, &reference, &system)?;

        log::debug!(
            "matching: {} reference x {} system items, {} candidate cells",
            reference.len(),
            system.len(),
            matrix.by_row.iter().map(Vec::len).sum::<usize>()
        );

        Ok(Self {
            oracle,
            reference,
            system,
            matrix,
            options: SearchOptions::default(),
        })
    }

    /// Replace the search options.
    #[must_use]
    pub fn with_options(mut self, options: SearchOptions) -> Self {
        self.options = options;
        self
    }

    fn score_matrix(
        oracle: &O,
        reference: &Bucketed<'_, O::Item>,
        system: &Bucketed<'_, O::Item>,
    ) -> Result<ScoreMatrix> {
        let rows = reference.len();
        let columns = system.len();
        let mut matrix = ScoreMatrix {
            columns,
            priority: vec![0.0; rows * columns],
            quality: vec![0.0; rows * columns],
            by_column: vec![Vec::new(); columns],
            by_row: vec![Vec::new(); rows],
        };

        for (r, reference_item) in reference.items.iter().enumerate() {
            for (s, system_item) in system.items.iter().enumerate() {
                if !oracle.tag_compatible(reference_item, system_item)? {
                    continue;
                }
                let priority = checked_score("priority", oracle.priority(reference_item, system_item)?)?;
                if priority == 0.0 {
                    continue;
                }
                let quality = checked_score("quality", oracle.quality(reference_item, system_item)?)?;
                matrix.priority[r * columns + s] = priority;
                matrix.quality[r * columns + s] = quality;
                matrix.by_row[r].push(s);
                matrix.by_column[s].push(r);
            }
        }
        Ok(matrix)
    }

    /// Run the search and score the winning matching.
    pub fn find_solution(&self) -> Result<Alignment> {
        let mut state = SearchState {
            used: vec![false; self.system.len()],
            remaining_system: self.system.len(),
            pairs: Vec::with_capacity(self.reference.len()),
            steps: 0,
            best: None,
        };
        self.search(0, &mut state)?;

        let (best_f1, best_pairs) = state
            .best
            .ok_or_else(|| Error::evaluation("matching search produced no leaf"))?;
        log::debug!(
            "matching: finished after {} steps, best f1 {:.4}",
            state.steps,
            best_f1
        );

        self.alignment(&best_pairs, state.steps)
    }

    fn search(&self, current: usize, state: &mut SearchState) -> Result<()> {
        state.steps += 1;
        if let Some(max_steps) = self.options.max_steps {
            if state.steps > max_steps {
                return Err(Error::SearchExhausted { steps: state.steps });
            }
        }

        if current == self.reference.len() || state.remaining_system == 0 {
            let f1 = self.score_leaf(&state.pairs)?;
            let better = state.best.as_ref().map_or(true, |(best, _)| f1 > *best);
            if better {
                log::trace!("matching: new best f1 {:.4} at step {}", f1, state.steps);
                state.best = Some((f1, state.pairs.clone()));
            }
            return Ok(());
        }

        let (candidates, has_perfect) = self.candidates(current, &state.used);
        let mut viable = 0;
        let mut max_alternatives = 0;

        for s in candidates {
            let mut alternatives = 0;
            let mut claimed_elsewhere = false;
            for &k in &self.matrix.by_column[s] {
                if k <= current {
                    continue;
                }
                alternatives += 1;
                if self.matrix.priority(k, s) == 1.0 && self.matrix.priority(current, s) < 1.0 {
                    claimed_elsewhere = true;
                }
            }
            max_alternatives = max_alternatives.max(alternatives);
            if claimed_elsewhere {
                continue;
            }

            viable += 1;
            state.used[s] = true;
            state.remaining_system -= 1;
            state.pairs.push((current, s));

            let result = self.search(current + 1, state);

            state.pairs.pop();
            state.remaining_system += 1;
            state.used[s] = false;
            result?;
        }

        let explore_skip = self.options.always_explore_skip
            || viable == 0
            || (viable == 1 && max_alternatives > 0 && !has_perfect);
        if explore_skip {
            self.search(current + 1, state)?;
        }
        Ok(())
    }

    /// Unused system items worth pairing with `current`, and whether they
    /// are the perfect ones.
    fn candidates(&self, current: usize, used: &[bool]) -> (Vec<usize>, bool) {
        let open: Vec<usize> = self.matrix.by_row[current]
            .iter()
            .copied()
            .filter(|&s| !used[s])
            .collect();
        let perfect: Vec<usize> = open
            .iter()
            .copied()
            .filter(|&s| self.matrix.priority(current, s) == 1.0)
            .collect();
        if perfect.is_empty() {
            (open, false)
        } else {
            (perfect, true)
        }
    }

    fn assignment(&self, pairs: &[(usize, usize)]) -> Assignment {
        let mut reference_partner = vec![None; self.reference.len()];
        let mut system_partner = vec![None; self.system.len()];
        let scored = pairs
            .iter()
            .map(|&(r, s)| {
                reference_partner[r] = Some(s);
                system_partner[s] = Some(r);
                ScoredPair {
                    reference: r,
                    system: s,
                    quality: self.matrix.quality(r, s),
                }
            })
            .collect();
        Assignment {
            reference_partner,
            system_partner,
            pairs: scored,
        }
    }

    fn score_leaf(&self, pairs: &[(usize, usize)]) -> Result<f64> {
        let assignment = self.assignment(pairs);
        let unmatched_reference = leftovers(&assignment.reference_partner);
        let unmatched_system = leftovers(&assignment.system_partner);
        let view = self.view(&assignment, &assignment.pairs, &unmatched_reference, &unmatched_system);
        let metrics = self.oracle.evaluate(&view, &mut EvalContext::new())?;
        Ok(metrics.f1.get())
    }

    fn view<'v>(
        &'v self,
        assignment: &'v Assignment,
        pairs: &'v [ScoredPair],
        unmatched_reference: &'v [usize],
        unmatched_system: &'v [usize],
    ) -> MatchingView<'v, O::Item> {
        MatchingView {
            reference: Side::new(
                &self.reference.items,
                &assignment.reference_partner,
                unmatched_reference,
                &self.reference.by_id,
            ),
            system: Side::new(
                &self.system.items,
                &assignment.system_partner,
                unmatched_system,
                &self.system.by_id,
            ),
            pairs,
        }
    }

    /// Score the final matching overall and per tag, with one context shared
    /// by every evaluation so tie-breaks agree across buckets.
    fn alignment(&self, pairs: &[(usize, usize)], steps: u64) -> Result<Alignment> {
        let assignment = self.assignment(pairs);
        let unmatched_reference = leftovers(&assignment.reference_partner);
        let unmatched_system = leftovers(&assignment.system_partner);
        let mut ctx = EvalContext::new();

        let full = self.view(&assignment, &assignment.pairs, &unmatched_reference, &unmatched_system);
        let overall = self.oracle.evaluate(&full, &mut ctx)?;

        let mut by_tag = BTreeMap::new();
        for (tag, range) in &self.reference.buckets {
            let tag_pairs: Vec<ScoredPair> = assignment
                .pairs
                .iter()
                .filter(|p| range.contains(&p.reference))
                .copied()
                .collect();
            let tag_reference: Vec<usize> = unmatched_reference
                .iter()
                .copied()
                .filter(|&r| range.contains(&r))
                .collect();
            let system_range = self
                .system
                .buckets
                .iter()
                .find(|(t, _)| t == tag)
                .map(|(_, range)| range.clone())
                .unwrap_or(0..0);
            let tag_system: Vec<usize> = unmatched_system
                .iter()
                .copied()
                .filter(|&s| system_range.contains(&s))
                .collect();

            let view = self.view(&assignment, &tag_pairs, &tag_reference, &tag_system);
            by_tag.insert(*tag, self.oracle.evaluate(&view, &mut ctx)?);
        }

        let aligned = assignment
            .pairs
            .iter()
            .map(|pair| {
                let reference_item = self.reference.items[pair.reference];
                let system_item = self.system.items[pair.system];
                AlignedPair {
                    reference: self.reference.origin[pair.reference],
                    system: self.system.origin[pair.system],
                    reference_id: reference_item.id(),
                    system_id: system_item.id(),
                    tag: reference_item.tag(),
                    priority: self.matrix.priority(pair.reference, pair.system),
                    quality: pair.quality,
                    ignored: self.oracle.is_pair_ignored(&full, pair, &mut ctx),
                }
            })
            .collect();

        let unmatched_reference_items = unmatched_reference
            .iter()
            .map(|&r| {
                let item = self.reference.items[r];
                UnmatchedItem {
                    index: self.reference.origin[r],
                    id: item.id(),
                    tag: item.tag(),
                    ignored: self.oracle.is_reference_ignored(&full, r, &mut ctx),
                }
            })
            .collect();
        let unmatched_system_items = unmatched_system
            .iter()
            .map(|&s| {
                let item = self.system.items[s];
                UnmatchedItem {
                    index: self.system.origin[s],
                    id: item.id(),
                    tag: item.tag(),
                    ignored: self.oracle.is_system_ignored(&full, s, &mut ctx),
                }
            })
            .collect();

        Ok(Alignment {
            pairs: aligned,
            unmatched_reference: unmatched_reference_items,
            unmatched_system: unmatched_system_items,
            overall,
            by_tag,
            steps,
        })
    }
}

/// Indices without a partner.
fn leftovers(partner: &[Option<usize>]) -> Vec<usize> {
    (0..partner.len()).filter(|&i| partner[i].is_none()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::span::{SpanItem, SpanOracle};
    use crate::eval::tags::TagTable;

    fn solve(reference: &[SpanItem], system: &[SpanItem]) -> Alignment {
        let oracle = SpanOracle::default();
        MatchingEngine::new(&oracle, reference, system, &Tag::ALL)
            .unwrap()
            .find_solution()
            .unwrap()
    }

    #[test]
    fn test_empty_sides() {
        let alignment = solve(&[], &[]);
        assert!(alignment.pairs.is_empty());
        assert_eq!(alignment.overall, Metrics::empty());
        assert_eq!(alignment.steps, 1);
    }

    #[test]
    fn test_empty_system() {
        let reference = vec![SpanItem::new(1, Tag::Person, [1])];
        let alignment = solve(&reference, &[]);
        assert_eq!(alignment.overall.recall.get(), 0.0);
        assert_eq!(alignment.overall.precision.get(), 1.0);
        assert_eq!(alignment.unmatched_reference.len(), 1);
    }

    #[test]
    fn test_perfect_overlaps_give_perfect_matching() {
        let reference = vec![
            SpanItem::new(1, Tag::Person, [1, 2]),
            SpanItem::new(2, Tag::Organization, [4, 5, 6]),
            SpanItem::new(3, Tag::Location, [9]),
        ];
        let system = vec![
            SpanItem::new(10, Tag::Location, [9]),
            SpanItem::new(11, Tag::Organization, [4, 5, 6]),
            SpanItem::new(12, Tag::Person, [1, 2]),
        ];
        let alignment = solve(&reference, &system);
        assert_eq!(alignment.overall.f1.get(), 1.0);
        assert_eq!(alignment.pairs.len(), 3);
        for pair in &alignment.pairs {
            assert_eq!(reference[pair.reference].tokens, system[pair.system].tokens);
        }
    }

    #[test]
    fn test_pairs_report_input_positions_in_bucket_order() {
        let reference = vec![
            SpanItem::new(1, Tag::Location, [9]),
            SpanItem::new(2, Tag::Person, [1]),
        ];
        let system = vec![
            SpanItem::new(1, Tag::Person, [1]),
            SpanItem::new(2, Tag::Location, [9]),
        ];
        let alignment = solve(&reference, &system);
        assert_eq!(alignment.pairs[0].reference, 1);
        assert_eq!(alignment.pairs[0].system, 0);
        assert_eq!(alignment.pairs[0].tag, Tag::Person);
        assert_eq!(alignment.pairs[1].reference, 0);
        assert_eq!(alignment.pairs[1].system, 1);
    }

    #[test]
    fn test_incompatible_tags_never_pair() {
        let reference = vec![SpanItem::new(1, Tag::Person, [1, 2])];
        let system = vec![SpanItem::new(1, Tag::Organization, [1, 2])];
        let alignment = solve(&reference, &system);
        assert!(alignment.pairs.is_empty());
        assert_eq!(alignment.overall.f1.get(), 0.0);
        assert_eq!(alignment.by_tag[&Tag::Person].n_std, 1);
        assert_eq!(alignment.by_tag[&Tag::Person].n_test, 0);
        assert_eq!(alignment.by_tag[&Tag::Organization].n_test, 1);
    }

    #[test]
    fn test_shared_perfect_candidate_is_used_once() {
        let reference = vec![
            SpanItem::new(1, Tag::Location, [3]),
            SpanItem::new(2, Tag::LocOrg, [3]),
        ];
        let system = vec![SpanItem::new(1, Tag::LocOrg, [3])];
        let oracle = SpanOracle::new(TagTable::lenient(), Default::default());
        let alignment = MatchingEngine::new(&oracle, &reference, &system, &Tag::ALL)
            .unwrap()
            .find_solution()
            .unwrap();
        assert_eq!(alignment.pairs.len(), 1);
        assert_eq!(alignment.unmatched_reference.len(), 1);
    }

    #[test]
    fn test_imperfect_pair_yields_to_perfect_later_item() {
        // reference 1 overlaps system 1 partially, reference 2 perfectly
        let reference = vec![
            SpanItem::new(1, Tag::Person, [1, 2, 3]),
            SpanItem::new(2, Tag::Person, [2, 3]),
        ];
        let system = vec![SpanItem::new(1, Tag::Person, [2, 3])];
        let alignment = solve(&reference, &system);
        assert_eq!(alignment.pairs.len(), 1);
        assert_eq!(alignment.pairs[0].reference, 1);
        assert_eq!(alignment.pairs[0].quality, 1.0);
    }

    #[test]
    fn test_better_global_assignment_is_found() {
        // the first candidate of reference 1 is the worse choice overall
        let reference = vec![
            SpanItem::new(1, Tag::Person, [1, 2]),
            SpanItem::new(2, Tag::Person, [2, 3, 4]),
        ];
        let system = vec![
            SpanItem::new(1, Tag::Person, [2, 3]),
            SpanItem::new(2, Tag::Person, [1, 2, 7]),
        ];
        let alignment = solve(&reference, &system);
        assert_eq!(alignment.pairs.len(), 2);
        let mut formed: Vec<(usize, usize)> =
            alignment.pairs.iter().map(|p| (p.reference, p.system)).collect();
        formed.sort_unstable();
        assert_eq!(formed, vec![(0, 1), (1, 0)]);
    }

    #[test]
    fn test_siblings_count_once() {
        let mut reference = vec![
            SpanItem::new(1, Tag::Organization, [1, 2]),
            SpanItem::new(2, Tag::Person, [1, 2]),
        ];
        crate::eval::span::link_embedding(&mut reference);
        let system = vec![SpanItem::new(1, Tag::Organization, [1, 2])];
        let alignment = solve(&reference, &system);

        assert_eq!(alignment.overall.f1.get(), 1.0);
        assert_eq!(alignment.unmatched_reference.len(), 1);
        assert!(alignment.unmatched_reference[0].ignored);
        assert_eq!(alignment.by_tag[&Tag::Person].n_std, 0);
    }

    #[test]
    fn test_embedded_item_inside_matched_parent_is_ignored() {
        let mut reference = vec![
            SpanItem::new(1, Tag::Organization, [1, 2, 3]),
            SpanItem::new(2, Tag::Organization, [2, 3]),
        ];
        crate::eval::span::link_embedding(&mut reference);
        let system = vec![SpanItem::new(1, Tag::Organization, [1, 2, 3])];
        let alignment = solve(&reference, &system);
        assert_eq!(alignment.overall.f1.get(), 1.0);
        assert!(alignment.unmatched_reference[0].ignored);
    }

    #[test]
    fn test_step_budget() {
        let reference: Vec<SpanItem> = (0..6).map(|i| SpanItem::new(i, Tag::Person, [1, 2, 3])).collect();
        let system: Vec<SpanItem> = (0..6).map(|i| SpanItem::new(i, Tag::Person, [2, 3, 4])).collect();
        let oracle = SpanOracle::default();
        let engine = MatchingEngine::new(&oracle, &reference, &system, &Tag::ALL)
            .unwrap()
            .with_options(SearchOptions {
                always_explore_skip: false,
                max_steps: Some(10),
            });
        let err = engine.find_solution().unwrap_err();
        assert!(matches!(err, Error::SearchExhausted { .. }));
    }

    #[test]
    fn test_always_explore_skip_never_does_worse() {
        let reference = vec![
            SpanItem::new(1, Tag::Person, [1, 2]),
            SpanItem::new(2, Tag::Person, [2, 3]),
        ];
        let system = vec![SpanItem::new(1, Tag::Person, [2])];
        let oracle = SpanOracle::default();
        let pruned = MatchingEngine::new(&oracle, &reference, &system, &Tag::ALL)
            .unwrap()
            .find_solution()
            .unwrap();
        let full = MatchingEngine::new(&oracle, &reference, &system, &Tag::ALL)
            .unwrap()
            .with_options(SearchOptions {
                always_explore_skip: true,
                max_steps: None,
            })
            .find_solution()
            .unwrap();
        assert!(full.overall.f1.get() >= pruned.overall.f1.get());
        assert!(full.steps >= pruned.steps);
    }

    #[test]
    fn test_by_tag_sums_to_overall() {
        let reference = vec![
            SpanItem::new(1, Tag::Person, [1, 2]),
            SpanItem::new(2, Tag::Location, [5, 6]),
            SpanItem::new(3, Tag::Organization, [8]),
        ];
        let system = vec![
            SpanItem::new(1, Tag::Person, [1]),
            SpanItem::new(2, Tag::Location, [5, 6]),
            SpanItem::new(3, Tag::Location, [11]),
        ];
        let alignment = solve(&reference, &system);
        let summed: Metrics = alignment.by_tag.values().sum();
        assert_eq!(summed.n_std, alignment.overall.n_std);
        assert_eq!(summed.n_test, alignment.overall.n_test);
        assert!((summed.tp_std - alignment.overall.tp_std).abs() < 1e-12);
    }

    #[test]
    fn test_alignment_serializes() {
        let reference = vec![SpanItem::new(1, Tag::Person, [1])];
        let system = vec![SpanItem::new(1, Tag::Person, [1])];
        let json = serde_json::to_value(solve(&reference, &system)).unwrap();
        assert_eq!(json["pairs"][0]["tag"], "person");
        assert_eq!(json["overall"]["f1"], 1.0);
    }
}
