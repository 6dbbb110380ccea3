//! Scoring configuration.
//!
//! [`EvalConfig`] gathers every knob of the three tasks. All fields have
//! defaults, so a JSON file only needs the ones it changes:
//!
//! ```rust
//! use anno_score::eval::{EvalConfig, FactMode};
//!
//! let config = EvalConfig::from_json(r#"{ "fact_mode": "hard", "locorg_enabled": false }"#).unwrap();
//! assert_eq!(config.fact_mode, FactMode::Hard);
//! assert!(!config.locorg_enabled);
//! assert!(config.search.max_steps.is_none());
//! ```

use super::attribute::AttributeOracle;
use super::fact::{ArgumentOracle, ArgumentWeights, FactMode};
use super::matching::SearchOptions;
use super::span::{SpanOracle, SpanWeights};
use super::tags::{Tag, TagTable};
use crate::similarity::{FuzzyMatcher, DEFAULT_EDIT_RATIO};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Configuration shared by the span, attribute and fact tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalConfig {
    /// Score LocOrg as its own tag; otherwise it is folded into Location.
    pub locorg_enabled: bool,
    /// Let LocOrg match Location and Organization.
    pub lenient_locorg: bool,
    /// Do not penalize extra system attribute values (simple mode).
    pub forgive_extra_values: bool,
    /// Fact scoring track.
    pub fact_mode: FactMode,
    /// Matching search tuning, shared by the cluster search.
    pub search: SearchOptions,
    /// Fraction of the shorter value's length allowed as edits.
    pub fuzzy_edit_ratio: f64,
    /// Token weights for span quality.
    pub span_weights: SpanWeights,
    /// Argument weights for fact quality.
    pub argument_weights: ArgumentWeights,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            locorg_enabled: true,
            lenient_locorg: false,
            forgive_extra_values: false,
            fact_mode: FactMode::default(),
            search: SearchOptions::default(),
            fuzzy_edit_ratio: DEFAULT_EDIT_RATIO,
            span_weights: SpanWeights::default(),
            argument_weights: ArgumentWeights::default(),
        }
    }
}

impl EvalConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values no scorer can work with.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..1.0).contains(&self.fuzzy_edit_ratio) {
            return Err(Error::invalid_input(format!(
                "fuzzy_edit_ratio must be in [0, 1), got {}",
                self.fuzzy_edit_ratio
            )));
        }
        if let Some((tag, role, weight)) = self
            .span_weights
            .iter()
            .find(|(_, _, w)| !w.is_finite() || *w < 0.0)
        {
            return Err(Error::invalid_input(format!(
                "span weight for {}/{} must be finite and non-negative, got {}",
                tag, role, weight
            )));
        }
        let argument_weights = std::iter::once(("default", self.argument_weights.default)).chain(
            self.argument_weights
                .by_name
                .iter()
                .map(|(name, w)| (name.as_str(), *w)),
        );
        for (name, weight) in argument_weights {
            if !weight.is_finite() || weight < 0.0 {
                return Err(Error::invalid_input(format!(
                    "argument weight for '{}' must be finite and non-negative, got {}",
                    name, weight
                )));
            }
        }
        if self.search.max_steps == Some(0) {
            return Err(Error::invalid_input("max_steps must be positive"));
        }
        if self.lenient_locorg && !self.locorg_enabled {
            log::warn!("lenient_locorg has no effect while locorg is disabled");
        }
        Ok(())
    }

    /// Tags scored by the span task, in bucket order.
    #[must_use]
    pub fn span_tags(&self) -> Vec<Tag> {
        Tag::ALL
            .into_iter()
            .filter(|&t| self.locorg_enabled || t != Tag::LocOrg)
            .collect()
    }

    /// Tags scored by the attribute task. LocOrg is always folded there.
    #[must_use]
    pub fn entity_tags(&self) -> Vec<Tag> {
        vec![Tag::Person, Tag::Location, Tag::Organization]
    }

    /// Tag compatibility table for the span task.
    #[must_use]
    pub fn tag_table(&self) -> TagTable {
        if self.lenient_locorg && self.locorg_enabled {
            TagTable::lenient()
        } else {
            TagTable::strict()
        }
    }

    /// Fuzzy matcher for attribute values and fact arguments.
    #[must_use]
    pub fn fuzzy_matcher(&self) -> FuzzyMatcher {
        FuzzyMatcher::with_ratio(self.fuzzy_edit_ratio)
    }

    /// Oracle for the span task.
    #[must_use]
    pub fn span_oracle(&self) -> SpanOracle {
        SpanOracle::new(self.tag_table(), self.span_weights.clone())
    }

    /// Oracle for the attribute task.
    #[must_use]
    pub fn attribute_oracle(&self) -> AttributeOracle {
        AttributeOracle::new(TagTable::strict(), self.fuzzy_matcher(), self.forgive_extra_values)
    }

    /// Oracle for the fact task.
    #[must_use]
    pub fn argument_oracle(&self) -> ArgumentOracle {
        ArgumentOracle::new(self.fuzzy_matcher(), self.argument_weights.clone())
    }
}
