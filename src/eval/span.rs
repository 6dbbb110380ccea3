//! Entity-span recognition scoring.
//!
//! A [`SpanItem`] is one annotated mention: a set of token positions with a
//! tag. Each token carries the sub-roles it plays inside the mention (name,
//! surname, descriptor...), and [`SpanWeights`] turns those roles into the
//! weight a missed or found token is worth.
//!
//! # Scores
//!
//! - priority: Jaccard overlap of the token sets
//! - quality: `tp / (tp + fn + fp)`, where `tp` and `fn` are weighted
//!   reference tokens (missed punctuation weighs 0) and `fp` counts spurious
//!   system tokens; falls back to priority when the denominator is 0
//!
//! # Ignore rules
//!
//! | Rule      | Side      | Effect                                               |
//! |-----------|-----------|------------------------------------------------------|
//! | embedded  | both      | item inside a matched parent does not count          |
//! | weightless| reference | unmatched item with zero total weight does not count |
//! | siblings  | reference | only one of two identical-span items counts          |
//!
//! # Example
//!
//! ```rust
//! use anno_score::eval::{QualityOracle, SpanItem, SpanOracle, Tag};
//!
//! let reference = SpanItem::new(1, Tag::Person, [1, 2, 3]);
//! let system = SpanItem::new(1, Tag::Person, [1, 2]);
//! let oracle = SpanOracle::default();
//!
//! let quality = oracle.quality(&reference, &system).unwrap();
//! assert!((quality - 2.0 / 3.0).abs() < 1e-12);
//! ```

use super::oracle::{EvalContext, Item, MatchingView, QualityOracle, ScoredPair, Side};
use super::tags::{Tag, TagTable};
use super::types::{checked_score, ItemId};
use crate::similarity::jaccard;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

/// Position of a token in the document.
pub type TokenId = u32;

/// Role assigned to tokens that were annotated without a sub-role.
pub const DEFAULT_ROLE: &str = "none";

/// One annotated mention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpanItem {
    /// Identity within its side
    pub id: ItemId,
    /// Category
    pub tag: Tag,
    /// Covered token positions
    pub tokens: BTreeSet<TokenId>,
    /// Sub-roles per token; tokens missing here play no role
    #[serde(default)]
    pub roles: BTreeMap<TokenId, Vec<String>>,
    /// Tokens that are punctuation
    #[serde(default)]
    pub punctuation: BTreeSet<TokenId>,
    /// Items that strictly contain this one under the parent table
    #[serde(default)]
    pub parents: Vec<ItemId>,
    /// Items with the identical token set and a different tag
    #[serde(default)]
    pub siblings: Vec<ItemId>,
}

impl SpanItem {
    /// Create a mention whose tokens all play the default role.
    pub fn new(id: u64, tag: Tag, tokens: impl IntoIterator<Item = TokenId>) -> Self {
        let tokens: BTreeSet<TokenId> = tokens.into_iter().collect();
        let roles = tokens
            .iter()
            .map(|&t| (t, vec![DEFAULT_ROLE.to_string()]))
            .collect();
        Self {
            id: ItemId(id),
            tag,
            tokens,
            roles,
            punctuation: BTreeSet::new(),
            parents: Vec::new(),
            siblings: Vec::new(),
        }
    }

    /// Assign `role` to `tokens`, replacing the default role.
    ///
    /// Tokens not yet covered are added to the mention.
    #[must_use]
    pub fn with_role(mut self, role: &str, tokens: impl IntoIterator<Item = TokenId>) -> Self {
        for token in tokens {
            self.tokens.insert(token);
            let roles = self.roles.entry(token).or_default();
            roles.retain(|r| r != DEFAULT_ROLE);
            if !roles.iter().any(|r| r == role) {
                roles.push(role.to_string());
            }
        }
        self
    }

    /// Mark `tokens` as punctuation.
    #[must_use]
    pub fn with_punctuation(mut self, tokens: impl IntoIterator<Item = TokenId>) -> Self {
        self.punctuation.extend(tokens);
        self
    }

    /// Weight of one token under this item's tag. Punctuation and tokens
    /// outside the mention weigh 0.
    #[must_use]
    pub fn token_weight(&self, token: TokenId, weights: &SpanWeights) -> f64 {
        if self.punctuation.contains(&token) {
            return 0.0;
        }
        self.roles
            .get(&token)
            .map(|roles| {
                roles
                    .iter()
                    .map(|role| weights.weight(self.tag, role))
                    .fold(0.0, f64::max)
            })
            .unwrap_or(0.0)
    }

    /// Sum of token weights.
    #[must_use]
    pub fn total_weight(&self, weights: &SpanWeights) -> f64 {
        self.tokens
            .iter()
            .map(|&t| self.token_weight(t, weights))
            .sum()
    }
}

impl Item for SpanItem {
    fn id(&self) -> ItemId {
        self.id
    }

    fn tag(&self) -> Tag {
        self.tag
    }
}

/// Per-(tag, role) token weights. Unlisted roles weigh 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpanWeights {
    table: BTreeMap<Tag, BTreeMap<String, f64>>,
}

impl SpanWeights {
    /// Table with no entries: every token weighs 0.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            table: BTreeMap::new(),
        }
    }

    /// Table where every role of every tag weighs `weight`.
    #[must_use]
    pub fn uniform(weight: f64) -> Self {
        let mut table = Self::empty();
        for tag in Tag::ALL {
            table.set(tag, "*", weight);
        }
        table
    }

    /// Set the weight of `role` under `tag`. The role `*` matches any role
    /// without an entry of its own.
    pub fn set(&mut self, tag: Tag, role: &str, weight: f64) {
        self.table
            .entry(tag)
            .or_default()
            .insert(role.to_string(), weight);
    }

    /// Weight of `role` under `tag`.
    #[must_use]
    pub fn weight(&self, tag: Tag, role: &str) -> f64 {
        let Some(roles) = self.table.get(&tag) else {
            return 0.0;
        };
        roles
            .get(role)
            .or_else(|| roles.get("*"))
            .copied()
            .unwrap_or(0.0)
    }

    /// Iterate over all entries.
    pub fn iter(&self) -> impl Iterator<Item = (Tag, &str, f64)> + '_ {
        self.table
            .iter()
            .flat_map(|(tag, roles)| roles.iter().map(move |(r, w)| (*tag, r.as_str(), *w)))
    }
}

impl Default for SpanWeights {
    fn default() -> Self {
        let mut weights = Self::empty();
        let defaults: [(Tag, &[&str]); 4] = [
            (
                Tag::Person,
                &["none", "name", "patronymic", "nickname", "surname"],
            ),
            (
                Tag::Location,
                &[
                    "none", "name", "org_descr", "org_name", "loc_descr", "surname", "loc_name",
                    "nickname",
                ],
            ),
            (
                Tag::Organization,
                &[
                    "none", "org_descr", "surname", "loc_name", "loc_descr", "org_name", "job",
                ],
            ),
            (
                Tag::LocOrg,
                &["none", "loc_descr", "org_name", "org_descr", "loc_name"],
            ),
        ];
        for (tag, roles) in defaults {
            for role in roles {
                weights.set(tag, role, 1.0);
            }
        }
        weights
    }
}

/// Fill `parents` and `siblings` of every item from token containment.
///
/// A parent strictly contains the item's tokens and carries one of the
/// item's [`Tag::parent_tags`]. A sibling covers exactly the same tokens
/// under a different tag.
pub fn link_embedding(items: &mut [SpanItem]) {
    let links: Vec<(Vec<ItemId>, Vec<ItemId>)> = items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let mut parents = Vec::new();
            let mut siblings = Vec::new();
            for (j, other) in items.iter().enumerate() {
                if i == j {
                    continue;
                }
                if other.tokens == item.tokens {
                    if other.tag != item.tag {
                        siblings.push(other.id);
                    }
                } else if item.tag.parent_tags().contains(&other.tag)
                    && item.tokens.is_subset(&other.tokens)
                {
                    parents.push(other.id);
                }
            }
            (parents, siblings)
        })
        .collect();

    for (item, (parents, siblings)) in items.iter_mut().zip(links) {
        item.parents = parents;
        item.siblings = siblings;
    }
}

/// Relabel every LocOrg item as Location.
pub fn fold_locorg(items: &mut [SpanItem]) {
    for item in items.iter_mut() {
        item.tag = item.tag.folded(false);
    }
}

/// Quality oracle for entity spans.
#[derive(Debug, Clone, Default)]
pub struct SpanOracle {
    tags: TagTable,
    weights: SpanWeights,
}

impl SpanOracle {
    /// Oracle with an explicit tag table and weight table.
    #[must_use]
    pub fn new(tags: TagTable, weights: SpanWeights) -> Self {
        Self { tags, weights }
    }

    /// Whether a matched parent swallows the item at `index`.
    fn is_embedded(side: &Side<'_, SpanItem>, index: usize) -> bool {
        side.item(index)
            .parents
            .iter()
            .any(|&parent| side.is_matched_id(parent))
    }

    /// Whether a sibling of the reference item at `index` is the one that
    /// counts.
    fn loses_to_sibling(side: &Side<'_, SpanItem>, index: usize, ctx: &mut EvalContext) -> bool {
        let item = side.item(index);
        let matched = side.is_matched(index);

        for &sibling_id in &item.siblings {
            let Some(j) = side.position(sibling_id) else {
                continue;
            };
            let sibling = side.item(j);
            match (matched, side.is_matched(j)) {
                (false, true) => return true,
                (true, false) => continue,
                _ => {}
            }
            match item.tag.dominance().cmp(&sibling.tag.dominance()) {
                Ordering::Less => return true,
                Ordering::Greater => continue,
                Ordering::Equal => {
                    if !ctx.claim_twin(item.id, sibling.id) {
                        return true;
                    }
                }
            }
        }
        false
    }
}

impl QualityOracle for SpanOracle {
    type Item = SpanItem;

    fn tag_compatible(&self, reference: &SpanItem, system: &SpanItem) -> Result<bool> {
        self.tags.compatible(reference.tag, system.tag)
    }

    fn priority(&self, reference: &SpanItem, system: &SpanItem) -> Result<f64> {
        if !self.tag_compatible(reference, system)? {
            return Ok(0.0);
        }
        checked_score("priority", jaccard(&reference.tokens, &system.tokens))
    }

    fn quality(&self, reference: &SpanItem, system: &SpanItem) -> Result<f64> {
        if !self.tag_compatible(reference, system)? {
            return Ok(0.0);
        }

        let mut tp = 0.0;
        let mut fn_ = 0.0;
        for &token in &reference.tokens {
            let weight = reference.token_weight(token, &self.weights);
            if system.tokens.contains(&token) {
                tp += weight;
            } else {
                fn_ += weight;
            }
        }
        let fp = system.tokens.difference(&reference.tokens).count() as f64;

        let denominator = tp + fn_ + fp;
        if denominator > 0.0 {
            checked_score("quality", tp / denominator)
        } else {
            self.priority(reference, system)
        }
    }

    fn is_pair_ignored(
        &self,
        view: &MatchingView<'_, SpanItem>,
        pair: &ScoredPair,
        ctx: &mut EvalContext,
    ) -> bool {
        Self::loses_to_sibling(&view.reference, pair.reference, ctx)
    }

    fn is_reference_ignored(
        &self,
        view: &MatchingView<'_, SpanItem>,
        index: usize,
        ctx: &mut EvalContext,
    ) -> bool {
        Self::is_embedded(&view.reference, index)
            || view.reference.item(index).total_weight(&self.weights) == 0.0
            || Self::loses_to_sibling(&view.reference, index, ctx)
    }

    fn is_system_ignored(
        &self,
        view: &MatchingView<'_, SpanItem>,
        index: usize,
        _ctx: &mut EvalContext,
    ) -> bool {
        Self::is_embedded(&view.system, index)
    }
}
