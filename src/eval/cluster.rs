//! One-to-many matching of reference facts to system facts.
//!
//! A system may split one reference fact across several responses, each
//! with some of its arguments. The cluster engine therefore lets any number
//! of system facts bind to one reference fact and scores the resulting
//! clusters:
//!
//! | Factor | Meaning                                                            |
//! |--------|--------------------------------------------------------------------|
//! | A      | weighted argument coverage, penalized by spurious arguments        |
//! | I      | share of matched argument pairs supplied by a single system fact   |
//! | Q      | `(A + A·I) / 2`                                                    |
//!
//! Every system fact is tried against each reference fact it can match, and
//! unbound; the assignment with the strictly best F1 wins.
//!
//! Recall credits each reference fact once, precision credits each system
//! fact, so the metrics are built with [`Metrics::asymmetric`].

use super::fact::{ArgumentOracle, Fact};
use super::metrics::Metrics;
use super::types::ItemId;
use crate::{Error, Result};
use serde::Serialize;

/// A reference fact with the system facts bound to it, or a lone system
/// fact.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cluster {
    /// Position of the reference fact in the input
    pub reference: Option<usize>,
    /// Id of the reference fact
    pub reference_id: Option<ItemId>,
    /// Positions of the bound system facts
    pub system: Vec<usize>,
    /// Argument coverage
    pub argument_quality: f64,
    /// Identification consistency
    pub identification_quality: f64,
    /// Combined quality
    pub quality: f64,
    /// The reference fact is excluded from scoring
    pub ignored: bool,
}

/// Result of a cluster search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FactAlignment {
    /// Reference clusters in input order, then unbound system facts
    pub clusters: Vec<Cluster>,
    /// Metrics of the winning assignment
    pub overall: Metrics,
    /// Search steps taken
    pub steps: u64,
}

/// Searches system-to-reference bindings for facts.
#[derive(Debug)]
pub struct ClusterEngine<'a> {
    oracle: &'a ArgumentOracle,
    reference: &'a [Fact],
    system: &'a [Fact],
    /// Reference facts each system fact may bind to
    candidates: Vec<Vec<usize>>,
    max_steps: Option<u64>,
}

struct ClusterSearch {
    assignment: Vec<Option<usize>>,
    steps: u64,
    best: Option<(f64, Vec<Option<usize>>)>,
}

impl<'a> ClusterEngine<'a> {
    /// Precompute which reference facts each system fact can match.
    #[must_use]
    pub fn new(oracle: &'a ArgumentOracle, reference: &'a [Fact], system: &'a [Fact]) -> Self {
        let candidates: Vec<Vec<usize>> = system
            .iter()
            .map(|s| {
                reference
                    .iter()
                    .enumerate()
                    .filter(|(_, r)| oracle.can_match(r, s))
                    .map(|(i, _)| i)
                    .collect()
            })
            .collect();

        log::debug!(
            "clusters: {} reference x {} system facts, {} candidate bindings",
            reference.len(),
            system.len(),
            candidates.iter().map(Vec::len).sum::<usize>()
        );

        Self {
            oracle,
            reference,
            system,
            candidates,
            max_steps: None,
        }
    }

    /// Give up with [`Error::SearchExhausted`] after `max_steps` steps.
    #[must_use]
    pub fn with_max_steps(mut self, max_steps: Option<u64>) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Run the search and score the winning assignment.
    pub fn find_solution(&self) -> Result<FactAlignment> {
        let mut search = ClusterSearch {
            assignment: Vec::with_capacity(self.system.len()),
            steps: 0,
            best: None,
        };
        self.search(&mut search)?;

        let (best_f1, assignment) = search
            .best
            .ok_or_else(|| Error::evaluation("cluster search produced no leaf"))?;
        log::debug!(
            "clusters: finished after {} steps, best f1 {:.4}",
            search.steps,
            best_f1
        );

        let (clusters, overall) = self.evaluate(&assignment)?;
        Ok(FactAlignment {
            clusters,
            overall,
            steps: search.steps,
        })
    }

    fn search(&self, search: &mut ClusterSearch) -> Result<()> {
        search.steps += 1;
        if let Some(max_steps) = self.max_steps {
            if search.steps > max_steps {
                return Err(Error::SearchExhausted {
                    steps: search.steps,
                });
            }
        }

        let k = search.assignment.len();
        if k == self.system.len() {
            let (_, metrics) = self.evaluate(&search.assignment)?;
            let f1 = metrics.f1.get();
            if search.best.as_ref().map_or(true, |(best, _)| f1 > *best) {
                search.best = Some((f1, search.assignment.clone()));
            }
            return Ok(());
        }

        for &r in &self.candidates[k] {
            search.assignment.push(Some(r));
            let result = self.search(search);
            search.assignment.pop();
            result?;
        }

        search.assignment.push(None);
        let result = self.search(search);
        search.assignment.pop();
        result
    }

    /// Build and score the clusters of a complete assignment.
    fn evaluate(&self, assignment: &[Option<usize>]) -> Result<(Vec<Cluster>, Metrics)> {
        let mut bound: Vec<Vec<usize>> = vec![Vec::new(); self.reference.len()];
        let mut unbound = Vec::new();
        for (s, target) in assignment.iter().enumerate() {
            match target {
                Some(r) => bound[*r].push(s),
                None => unbound.push(s),
            }
        }

        let mut clusters = Vec::with_capacity(self.reference.len() + unbound.len());
        let mut tp_std = 0.0;
        let mut tp_test = 0.0;
        let mut n_std = 0;
        let mut n_test = unbound.len();

        for (r, system) in bound.into_iter().enumerate() {
            let reference = &self.reference[r];
            let cluster = self.score_cluster(r, reference, system)?;
            if !cluster.ignored {
                n_std += 1;
                n_test += cluster.system.len();
                tp_std += cluster.quality;
                tp_test += cluster.quality * cluster.system.len() as f64;
            }
            clusters.push(cluster);
        }

        clusters.extend(unbound.into_iter().map(|s| Cluster {
            reference: None,
            reference_id: None,
            system: vec![s],
            argument_quality: 0.0,
            identification_quality: 0.0,
            quality: 0.0,
            ignored: false,
        }));

        let metrics = Metrics::asymmetric(tp_std, tp_test, n_std, n_test)?;
        Ok((clusters, metrics))
    }

    fn score_cluster(&self, r: usize, reference: &Fact, system: Vec<usize>) -> Result<Cluster> {
        let mut cluster = Cluster {
            reference: Some(r),
            reference_id: Some(reference.id),
            system,
            argument_quality: 0.0,
            identification_quality: 0.0,
            quality: 0.0,
            ignored: reference.ignored,
        };
        if cluster.ignored || cluster.system.is_empty() {
            return Ok(cluster);
        }

        let facts: Vec<&Fact> = cluster.system.iter().map(|&s| &self.system[s]).collect();
        let score = self.oracle.score(reference, &facts)?;
        cluster.argument_quality = score.argument_quality;
        cluster.identification_quality = score.identification_quality;
        cluster.quality = score.quality();
        Ok(cluster)
    }
}
