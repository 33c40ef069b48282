//! Linguistic variables and fuzzification

use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use crate::error::{ErrorCode, FlsError, FlsResult};

use super::membership::{Interval, IntervalMembership, IntervalSet};
use super::universe::{Edge, Universe};

/// Whether a variable feeds rules or receives their conclusions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Input measurement
    #[default]
    Antecedent,
    /// Output (risk) variable
    Consequent,
}

/// A named label and the interval set it denotes on its variable's universe
#[derive(Debug, Clone)]
pub struct LinguisticLabel {
    pub name: String,
    pub membership: IntervalMembership,
    set: IntervalSet,
}

impl LinguisticLabel {
    /// Sampled lower/upper curves
    pub fn set(&self) -> &IntervalSet {
        &self.set
    }

    pub fn degree_at(&self, index: usize) -> Interval {
        self.set.get(index).unwrap_or(Interval::ZERO)
    }
}

/// Record of a crisp value that fell outside the universe and was clamped
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClampNotice {
    pub variable: String,
    pub value: f64,
    pub clamped_to: f64,
    pub edge: Edge,
}

impl ClampNotice {
    pub fn code(&self) -> ErrorCode {
        ErrorCode::OutOfRangeInput
    }
}

/// Result of fuzzifying one crisp value: a degree for every label
#[derive(Debug, Clone, PartialEq)]
pub struct Fuzzified {
    /// Universe sample index the value resolved to
    pub index: usize,
    /// Universe sample value the value resolved to
    pub sample: f64,
    /// Degrees for all labels, in definition order (zero entries included)
    pub degrees: IndexMap<String, Interval>,
    /// Set when the value was outside the universe
    pub clamped: Option<ClampNotice>,
}

impl Fuzzified {
    pub fn degree(&self, label: &str) -> Option<Interval> {
        self.degrees.get(label).copied()
    }
}

/// A named collection of labels over one universe
#[derive(Debug, Clone)]
pub struct FuzzyVariable {
    name: String,
    role: Role,
    universe: Arc<Universe>,
    labels: IndexMap<String, LinguisticLabel>,
}

impl FuzzyVariable {
    pub fn new(name: impl Into<String>, role: Role, universe: Universe) -> Self {
        Self::with_shared_universe(name, role, Arc::new(universe))
    }

    /// Input variable
    pub fn antecedent(name: impl Into<String>, universe: Universe) -> Self {
        Self::new(name, Role::Antecedent, universe)
    }

    /// Output variable
    pub fn consequent(name: impl Into<String>, universe: Universe) -> Self {
        Self::new(name, Role::Consequent, universe)
    }

    pub fn with_shared_universe(name: impl Into<String>, role: Role, universe: Arc<Universe>) -> Self {
        Self {
            name: name.into(),
            role,
            universe,
            labels: IndexMap::new(),
        }
    }

    /// Add a label, sampling its membership over the universe.
    ///
    /// Fails on a duplicate name or a malformed footprint.
    pub fn add_label(&mut self, name: impl Into<String>, membership: IntervalMembership) -> FlsResult<()> {
        let name = name.into();
        if self.labels.contains_key(&name) {
            return Err(FlsError::duplicate_label(&self.name, &name));
        }

        let set = membership
            .sample(&name, &self.universe)
            .map_err(|e| e.with_context("variable", self.name.clone()))?;
        self.labels.insert(
            name.clone(),
            LinguisticLabel {
                name,
                membership,
                set,
            },
        );
        Ok(())
    }

    /// Builder-style `add_label`
    pub fn with_label(mut self, name: impl Into<String>, membership: IntervalMembership) -> FlsResult<Self> {
        self.add_label(name, membership)?;
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn universe(&self) -> &Universe {
        &self.universe
    }

    pub fn shared_universe(&self) -> Arc<Universe> {
        Arc::clone(&self.universe)
    }

    pub fn label(&self, name: &str) -> Option<&LinguisticLabel> {
        self.labels.get(name)
    }

    pub fn labels(&self) -> impl Iterator<Item = &LinguisticLabel> {
        self.labels.values()
    }

    pub fn label_names(&self) -> impl Iterator<Item = &str> {
        self.labels.keys().map(String::as_str)
    }

    pub fn has_label(&self, name: &str) -> bool {
        self.labels.contains_key(name)
    }

    pub fn label_count(&self) -> usize {
        self.labels.len()
    }

    /// Fuzzify a crisp value against every label.
    ///
    /// The value resolves to the nearest-below universe sample. Values outside
    /// the universe are clamped to the edge sample and reported, not rejected.
    /// NaN and infinities fail with `InvalidInput`.
    pub fn fuzzify(&self, value: f64) -> FlsResult<Fuzzified> {
        if !value.is_finite() {
            return Err(FlsError::invalid_input(&self.name, value));
        }
        let (index, edge) = self.universe.nearest_index(value);
        let sample = self.universe.points()[index];

        let clamped = edge.map(|edge| {
            warn!(
                variable = %self.name,
                value,
                clamped_to = sample,
                "input outside universe, clamping to edge sample"
            );
            ClampNotice {
                variable: self.name.clone(),
                value,
                clamped_to: sample,
                edge,
            }
        });

        let degrees: IndexMap<String, Interval> = self
            .labels
            .iter()
            .map(|(name, label)| (name.clone(), label.degree_at(index)))
            .collect();
        trace!(variable = %self.name, value, sample, ?degrees, "fuzzified");

        Ok(Fuzzified {
            index,
            sample,
            degrees,
            clamped,
        })
    }

    /// The label with the highest mean membership for a value.
    ///
    /// `None` when no label has non-zero membership or the value is not finite.
    pub fn dominant_label(&self, value: f64) -> Option<(&str, Interval)> {
        if !value.is_finite() {
            return None;
        }
        let fuzzified = self.fuzzify_quiet(value);
        self.labels
            .keys()
            .zip(fuzzified)
            .filter(|(_, d)| !d.is_zero())
            .max_by(|a, b| a.1.midpoint().total_cmp(&b.1.midpoint()))
            .map(|(name, d)| (name.as_str(), d))
    }

    /// Degrees in label order, without clamp logging
    fn fuzzify_quiet(&self, value: f64) -> Vec<Interval> {
        let (index, _) = self.universe.nearest_index(value);
        self.labels.values().map(|l| l.degree_at(index)).collect()
    }
}
