//! Entity attribute scoring.
//!
//! An [`EntityItem`] is a clustered entity described by named attributes,
//! each with one or more alternative values ("name: Газпром | Газпрома").
//! Two entities are as good a match as the share of their attributes that
//! agree.
//!
//! ```text
//! quality = matched_ref / (matched_ref + unmatched_ref + unmatched_sys)
//! ```
//!
//! In simple mode (`forgive_extra_values`) unmatched system attributes are
//! not counted. Attribute values are compared with a [`FuzzyMatcher`].

use super::oracle::{Item, QualityOracle};
use super::tags::{Tag, TagTable};
use super::types::{checked_score, ItemId};
use crate::similarity::{normalize_value, FuzzyMatcher};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Attribute dropped during normalization.
const WIKIDATA: &str = "wikidata";

/// A named attribute with alternative values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    /// Lowercase name
    pub name: String,
    /// Alternatives, normalized
    pub values: BTreeSet<String>,
}

impl Attribute {
    /// Create an attribute; name and values are normalized.
    pub fn new<S: AsRef<str>>(name: &str, values: impl IntoIterator<Item = S>) -> Self {
        Self {
            name: name.trim().to_lowercase(),
            values: values
                .into_iter()
                .map(|v| normalize_value(v.as_ref()))
                .filter(|v| !v.is_empty())
                .collect(),
        }
    }

    /// Same name and at least one pair of values fuzzy-equal.
    #[must_use]
    pub fn matches(&self, other: &Attribute, fuzzy: &FuzzyMatcher) -> bool {
        self.name == other.name
            && self
                .values
                .iter()
                .any(|a| other.values.iter().any(|b| fuzzy.matches(a, b)))
    }

    fn is_descriptor(&self) -> bool {
        self.name.ends_with("descr") || self.name.ends_with("descriptor")
    }
}

/// A clustered entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityItem {
    /// Identity within its side
    pub id: ItemId,
    /// Category
    pub tag: Tag,
    /// Attributes in annotation order
    pub attributes: Vec<Attribute>,
}

impl EntityItem {
    /// Entity without attributes.
    #[must_use]
    pub fn new(id: u64, tag: Tag) -> Self {
        Self {
            id: ItemId(id),
            tag,
            attributes: Vec::new(),
        }
    }

    /// Add an attribute.
    #[must_use]
    pub fn with_attribute<S: AsRef<str>>(
        mut self,
        name: &str,
        values: impl IntoIterator<Item = S>,
    ) -> Self {
        self.attributes.push(Attribute::new(name, values));
        self
    }

    /// Canonical form used for scoring.
    ///
    /// - attributes with the same name merge into one set of alternatives
    /// - `wikidata` is dropped
    /// - descriptor attributes (`*descr`, `*descriptor`) disappear, and every
    ///   other value gains the alternatives `"value descr"` and
    ///   `"descr value"`, unless the descriptor already occurs in it as a word
    /// - digits around names are stripped last, so `name1` and `name2` stay
    ///   two attributes both called `name`
    #[must_use]
    pub fn normalized(&self) -> Self {
        let mut merged: BTreeMap<&str, BTreeSet<String>> = BTreeMap::new();
        for attribute in &self.attributes {
            if attribute.name == WIKIDATA {
                continue;
            }
            merged
                .entry(attribute.name.as_str())
                .or_default()
                .extend(attribute.values.iter().cloned());
        }

        let mut attributes: Vec<Attribute> = merged
            .into_iter()
            .map(|(name, values)| Attribute {
                name: name.to_string(),
                values,
            })
            .collect();

        let descriptors: BTreeSet<String> = attributes
            .iter()
            .filter(|a| a.is_descriptor())
            .flat_map(|a| a.values.iter().cloned())
            .collect();

        if !descriptors.is_empty() {
            attributes.retain(|a| !a.is_descriptor());
            for attribute in &mut attributes {
                attribute.values = with_descriptors(&attribute.values, &descriptors);
            }
        }

        for attribute in &mut attributes {
            attribute.name = attribute
                .name
                .trim_matches(|c: char| c.is_ascii_digit())
                .to_string();
        }

        Self {
            id: self.id,
            tag: self.tag,
            attributes,
        }
    }
}

fn with_descriptors(values: &BTreeSet<String>, descriptors: &BTreeSet<String>) -> BTreeSet<String> {
    let mut out = values.clone();
    for value in values {
        let padded = format!(" {} ", value);
        for descr in descriptors {
            if padded.contains(&format!(" {} ", descr)) {
                continue;
            }
            out.insert(format!("{} {}", value, descr));
            out.insert(format!("{} {}", descr, value));
        }
    }
    out
}

impl Item for EntityItem {
    fn id(&self) -> ItemId {
        self.id
    }

    fn tag(&self) -> Tag {
        self.tag
    }
}

/// Quality oracle for attribute-described entities.
#[derive(Debug, Clone)]
pub struct AttributeOracle {
    tags: TagTable,
    fuzzy: FuzzyMatcher,
    forgive_extra_values: bool,
}

impl AttributeOracle {
    /// Create an oracle.
    #[must_use]
    pub fn new(tags: TagTable, fuzzy: FuzzyMatcher, forgive_extra_values: bool) -> Self {
        Self {
            tags,
            fuzzy,
            forgive_extra_values,
        }
    }

    fn attribute_overlap(&self, reference: &EntityItem, system: &EntityItem) -> f64 {
        let mut matched_reference = vec![false; reference.attributes.len()];
        let mut matched_system = vec![false; system.attributes.len()];

        for (i, r) in reference.attributes.iter().enumerate() {
            for (j, s) in system.attributes.iter().enumerate() {
                if r.matches(s, &self.fuzzy) {
                    matched_reference[i] = true;
                    matched_system[j] = true;
                }
            }
        }

        let tp = matched_reference.iter().filter(|&&m| m).count();
        let fn_ = reference.attributes.len() - tp;
        let fp = if self.forgive_extra_values {
            0
        } else {
            matched_system.iter().filter(|&&m| !m).count()
        };

        let denominator = tp + fn_ + fp;
        if denominator == 0 {
            0.0
        } else {
            tp as f64 / denominator as f64
        }
    }
}

impl Default for AttributeOracle {
    fn default() -> Self {
        Self::new(TagTable::strict(), FuzzyMatcher::shared(), false)
    }
}

impl QualityOracle for AttributeOracle {
    type Item = EntityItem;

    fn tag_compatible(&self, reference: &EntityItem, system: &EntityItem) -> Result<bool> {
        self.tags.compatible(reference.tag, system.tag)
    }

    fn priority(&self, reference: &EntityItem, system: &EntityItem) -> Result<f64> {
        self.quality(reference, system)
    }

    fn quality(&self, reference: &EntityItem, system: &EntityItem) -> Result<f64> {
        if !self.tag_compatible(reference, system)? {
            return Ok(0.0);
        }
        checked_score("quality", self.attribute_overlap(reference, system))
    }
}
