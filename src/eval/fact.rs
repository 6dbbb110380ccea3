//! Relational facts and the argument oracle used by the cluster engine.
//!
//! A [`Fact`] is a typed relation ("Occupation", "Meeting") whose arguments
//! name its participants: `who: Иванов`, `position: директор`, `where:
//! Москва`. A reference fact may be matched by several system facts that
//! each carry part of its arguments, so facts are scored in clusters
//! (see [`super::cluster`]) rather than one-to-one.
//!
//! Two service arguments are stripped by [`Fact::prepare`]: `modality`
//! (possibility / future / negation make a fact optional) and `difficulty`
//! (`elevated` marks facts too hard for the easy track).

use super::types::{checked_score, ItemId};
use crate::similarity::{normalize_value, FuzzyMatcher};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Argument naming the participant's job.
pub const POSITION: &str = "position";
/// Alias of [`POSITION`].
pub const JOB: &str = "job";
/// Service argument carrying the fact's modality.
pub const MODALITY: &str = "modality";
/// Service argument carrying the fact's difficulty.
pub const DIFFICULTY: &str = "difficulty";
/// Argument dropped in easy mode.
pub const PHASE: &str = "phase";

/// Modalities that make a reference fact optional: only easy mode keeps it.
pub const EASY_MODALITIES: [&str; 3] = ["possibility", "future", "negation"];
/// Difficulties the easy track does not score.
pub const HARD_DIFFICULTIES: [&str; 1] = ["elevated"];

/// Scoring track for facts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FactMode {
    /// Hard-difficulty reference facts are ignored and their `phase` is not scored.
    #[default]
    Easy,
    /// Facts with an easy-mode modality are removed from the reference.
    Hard,
}

/// One fact argument with alternative values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Argument {
    /// Lowercase name, `job` folded into `position`
    pub name: String,
    /// Alternatives, normalized
    pub values: Vec<String>,
}

impl Argument {
    /// Create an argument; name and values are normalized.
    pub fn new<S: AsRef<str>>(name: &str, values: impl IntoIterator<Item = S>) -> Self {
        let name = name.trim().to_lowercase();
        let name = if name == JOB { POSITION.to_string() } else { name };
        let mut normalized: Vec<String> = Vec::new();
        for value in values {
            let value = normalize_value(value.as_ref());
            if !value.is_empty() && !normalized.contains(&value) {
                normalized.push(value);
            }
        }
        Self {
            name,
            values: normalized,
        }
    }

    /// Same name and some pair of alternatives fuzzy-equal.
    #[must_use]
    pub fn can_match(&self, other: &Argument, fuzzy: &FuzzyMatcher) -> bool {
        self.name == other.name
            && self
                .values
                .iter()
                .any(|a| other.values.iter().any(|b| fuzzy.matches(a, b)))
    }
}

/// A typed relation with arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fact {
    /// Identity within its side
    pub id: ItemId,
    /// Fact type, e.g. "Occupation"
    pub kind: String,
    /// Scored arguments
    pub arguments: Vec<Argument>,
    /// Carries an easy-mode modality
    pub optional: bool,
    /// Marked as too hard for the easy track
    pub elevated: bool,
    /// Excluded from the denominators
    pub ignored: bool,
}

impl Fact {
    /// Fact without arguments.
    #[must_use]
    pub fn new(id: u64, kind: &str) -> Self {
        Self {
            id: ItemId(id),
            kind: kind.trim().to_lowercase(),
            arguments: Vec::new(),
            optional: false,
            elevated: false,
            ignored: false,
        }
    }

    /// Add an argument.
    #[must_use]
    pub fn with_argument<S: AsRef<str>>(
        mut self,
        name: &str,
        values: impl IntoIterator<Item = S>,
    ) -> Self {
        self.arguments.push(Argument::new(name, values));
        self
    }

    /// Move `modality` and `difficulty` arguments into flags.
    #[must_use]
    pub fn prepare(mut self) -> Self {
        let mut optional = false;
        let mut elevated = false;
        self.arguments.retain(|argument| match argument.name.as_str() {
            MODALITY => {
                optional |= argument
                    .values
                    .iter()
                    .any(|v| EASY_MODALITIES.contains(&v.as_str()));
                false
            }
            DIFFICULTY => {
                elevated |= argument
                    .values
                    .iter()
                    .any(|v| HARD_DIFFICULTIES.contains(&v.as_str()));
                false
            }
            _ => true,
        });
        self.optional |= optional;
        self.elevated |= elevated;
        self
    }

    /// Drop the `phase` argument.
    pub fn remove_phase(&mut self) {
        self.arguments.retain(|a| a.name != PHASE);
    }

    /// Same type and at least one matching argument other than `position`.
    #[must_use]
    pub fn can_match(&self, other: &Fact, fuzzy: &FuzzyMatcher) -> bool {
        self.kind == other.kind
            && self.arguments.iter().any(|a| {
                a.name != POSITION && other.arguments.iter().any(|b| a.can_match(b, fuzzy))
            })
    }
}

/// Prepare reference facts for a scoring track.
///
/// Easy mode marks elevated facts as ignored and removes `phase`; hard mode
/// drops optional facts.
#[must_use]
pub fn prepare_reference(facts: Vec<Fact>, mode: FactMode) -> Vec<Fact> {
    let prepared = facts.into_iter().map(Fact::prepare);
    match mode {
        FactMode::Easy => prepared
            .map(|mut fact| {
                fact.ignored = fact.elevated;
                fact.remove_phase();
                fact
            })
            .collect(),
        FactMode::Hard => prepared.filter(|fact| !fact.optional).collect(),
    }
}

/// Per-argument-name weights. Unlisted names weigh `default`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArgumentWeights {
    /// Weight of names without an entry
    pub default: f64,
    /// Explicit weights
    pub by_name: BTreeMap<String, f64>,
}

impl ArgumentWeights {
    /// Weight of the argument `name`.
    #[must_use]
    pub fn weight(&self, name: &str) -> f64 {
        self.by_name.get(name).copied().unwrap_or(self.default)
    }
}

impl Default for ArgumentWeights {
    fn default() -> Self {
        Self {
            default: 1.0,
            by_name: BTreeMap::new(),
        }
    }
}

/// Coverage and consistency of one reference fact by its bound system facts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ArgumentScore {
    /// Weighted share of arguments recovered, penalized by spurious ones
    pub argument_quality: f64,
    /// Share of matched argument pairs supplied together by one system fact
    pub identification_quality: f64,
}

impl ArgumentScore {
    /// Combined cluster quality: `(A + A·I) / 2`.
    #[must_use]
    pub fn quality(&self) -> f64 {
        (self.argument_quality + self.argument_quality * self.identification_quality) / 2.0
    }
}

/// Compares facts by their arguments.
#[derive(Debug, Clone, Default)]
pub struct ArgumentOracle {
    fuzzy: FuzzyMatcher,
    weights: ArgumentWeights,
}

impl ArgumentOracle {
    /// Create an oracle.
    #[must_use]
    pub fn new(fuzzy: FuzzyMatcher, weights: ArgumentWeights) -> Self {
        Self { fuzzy, weights }
    }

    /// Whether `system` may be bound to `reference`.
    #[must_use]
    pub fn can_match(&self, reference: &Fact, system: &Fact) -> bool {
        reference.can_match(system, &self.fuzzy)
    }

    /// Score `reference` against the system facts bound to it.
    ///
    /// Every system argument binds to the first reference argument it
    /// matches; arguments binding nowhere are spurious.
    pub fn score(&self, reference: &Fact, bound: &[&Fact]) -> Result<ArgumentScore> {
        let mut suppliers: Vec<Vec<usize>> = vec![Vec::new(); reference.arguments.len()];
        let mut spurious = 0.0;

        for (fact_index, fact) in bound.iter().enumerate() {
            for argument in &fact.arguments {
                let target = reference
                    .arguments
                    .iter()
                    .position(|r| argument.can_match(r, &self.fuzzy));
                match target {
                    Some(r) => suppliers[r].push(fact_index),
                    None => spurious += self.weights.weight(&argument.name),
                }
            }
        }

        let mut found = 0.0;
        let mut missed = 0.0;
        let mut matched = Vec::new();
        for (r, argument) in reference.arguments.iter().enumerate() {
            let weight = self.weights.weight(&argument.name);
            if suppliers[r].is_empty() {
                missed += weight;
            } else {
                found += weight;
                matched.push(r);
            }
        }

        let denominator = found + spurious + missed;
        let argument_quality = if denominator > 0.0 {
            checked_score("argument quality", found / denominator)?
        } else {
            0.0
        };

        let identification_quality = if bound.len() <= 1 {
            1.0
        } else {
            identification(&matched, &suppliers)
        };

        Ok(ArgumentScore {
            argument_quality,
            identification_quality: checked_score("identification quality", identification_quality)?,
        })
    }
}

/// Share of matched argument pairs that some single system fact supplies
/// both of.
fn identification(matched: &[usize], suppliers: &[Vec<usize>]) -> f64 {
    let k = matched.len();
    let pairs = k * k.saturating_sub(1) / 2;
    if pairs == 0 {
        return 1.0;
    }

    let mut edges = 0;
    for (i, &x) in matched.iter().enumerate() {
        for &y in &matched[i + 1..] {
            if suppliers[x].iter().any(|f| suppliers[y].contains(f)) {
                edges += 1;
            }
        }
    }
    edges as f64 / pairs as f64
}
