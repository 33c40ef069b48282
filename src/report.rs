//! Inference results and curve data for plotting

use std::sync::Arc;

use serde::Serialize;

use crate::engine::{Reduction, TypeReduction};
use crate::error::FlsResult;
use crate::fuzzy::{ClampNotice, FuzzyVariable, Interval, IntervalSet, Universe};

/// Per-rule trace entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleActivation {
    /// Position in the rule base
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Output label the rule concludes
    pub consequent: String,
    pub strength: Interval,
    /// An antecedent variable was missing from the panel
    pub skipped: bool,
}

/// Outcome of one inference call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskResult {
    /// Crisp risk value
    pub score: f64,
    /// Risk interval, ordered `lower <= upper`
    pub interval: Interval,
    /// Centroid of the aggregated lower curve
    pub lower_centroid: f64,
    /// Centroid of the aggregated upper curve
    pub upper_centroid: f64,
    pub reduction: TypeReduction,
    /// Output label with the highest mean membership at `score`
    pub risk_group: Option<String>,
    pub activations: Vec<RuleActivation>,
    /// Inputs that were clamped to a universe edge
    pub clamped: Vec<ClampNotice>,
    /// Aggregated output set
    pub aggregated: IntervalSet,
    pub output: String,
    #[serde(skip)]
    universe: Arc<Universe>,
}

impl RiskResult {
    pub(crate) fn new(
        output: &str,
        universe: Arc<Universe>,
        aggregated: IntervalSet,
        policy: TypeReduction,
        reduction: Reduction,
        risk_group: Option<String>,
    ) -> Self {
        let (lo, hi) = if reduction.lower_centroid <= reduction.upper_centroid {
            (reduction.lower_centroid, reduction.upper_centroid)
        } else {
            (reduction.upper_centroid, reduction.lower_centroid)
        };
        Self {
            score: reduction.score,
            interval: Interval::new(lo, hi),
            lower_centroid: reduction.lower_centroid,
            upper_centroid: reduction.upper_centroid,
            reduction: policy,
            risk_group,
            activations: Vec::new(),
            clamped: Vec::new(),
            aggregated,
            output: output.to_string(),
            universe,
        }
    }

    /// Output universe the aggregated set is sampled on
    pub fn universe(&self) -> &Universe {
        &self.universe
    }

    /// Rules with a non-zero firing strength
    pub fn fired(&self) -> impl Iterator<Item = &RuleActivation> {
        self.activations.iter().filter(|a| !a.strength.is_zero())
    }

    pub fn was_clamped(&self) -> bool {
        !self.clamped.is_empty()
    }

    /// Aggregated output curves, ready for plotting
    pub fn aggregated_curve(&self) -> CurveSeries {
        CurveSeries::new(&self.output, "aggregated", &self.universe, &self.aggregated)
    }

    pub fn to_json(&self) -> FlsResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> FlsResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

// ============================================================================
// Curve series
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CurvePoint {
    pub x: f64,
    pub lower: f64,
    pub upper: f64,
}

/// One label's lower/upper curves over its universe
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurveSeries {
    pub variable: String,
    pub label: String,
    pub points: Vec<CurvePoint>,
}

impl CurveSeries {
    pub fn new(variable: &str, label: &str, universe: &Universe, set: &IntervalSet) -> Self {
        let points = universe
            .points()
            .iter()
            .zip(set.iter())
            .map(|(&x, d)| CurvePoint {
                x,
                lower: d.lower,
                upper: d.upper,
            })
            .collect();
        Self {
            variable: variable.to_string(),
            label: label.to_string(),
            points,
        }
    }

    /// Widest footprint across the series
    pub fn max_width(&self) -> f64 {
        self.points
            .iter()
            .map(|p| p.upper - p.lower)
            .fold(0.0, f64::max)
    }
}

impl FuzzyVariable {
    /// Curves of every label, in definition order
    pub fn curves(&self) -> Vec<CurveSeries> {
        self.labels()
            .map(|label| CurveSeries::new(self.name(), &label.name, self.universe(), label.set()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FlsConfig;
    use std::collections::HashMap;

    fn normal_result() -> RiskResult {
        let engine = FlsConfig::mews_engine().unwrap();
        let panel: HashMap<String, f64> =
            [("SBP", 110.0), ("HR", 70.0), ("SPO2", 96.0), ("Temp", 37.5), ("BS", 90.0)]
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect();
        engine.infer(&panel).unwrap()
    }

    #[test]
    fn test_interval_is_ordered() {
        let engine = FlsConfig::mews_engine().unwrap();
        let mut panel: HashMap<String, f64> =
            [("SBP", 50.0), ("HR", 70.0), ("SPO2", 96.0), ("Temp", 37.5), ("BS", 90.0)]
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect();
        let result = engine.infer(&panel).unwrap();
        assert!(result.interval.lower <= result.interval.upper);
        // right-shoulder output: the lower curve's centroid sits further right
        assert!(result.lower_centroid > result.upper_centroid);

        panel.insert("SBP".to_string(), 110.0);
        let result = engine.infer(&panel).unwrap();
        assert!(result.interval.lower <= result.score && result.score <= result.interval.upper);
    }

    #[test]
    fn test_fired_and_curve() {
        let result = normal_result();
        assert_eq!(result.fired().count(), 1);
        assert!(!result.was_clamped());

        let curve = result.aggregated_curve();
        assert_eq!(curve.variable, "RG");
        assert_eq!(curve.points.len(), result.universe().len());
        assert_eq!(curve.points[0].x, 0.0);
        assert!(curve.points.iter().all(|p| p.lower <= p.upper));
    }

    #[test]
    fn test_to_json() {
        let json = normal_result().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["risk_group"], "NRM");
        assert_eq!(value["reduction"], "centroid-of-bounds");
        assert!(value["activations"].as_array().unwrap().len() >= 7);
        assert!(value.get("universe").is_none());
    }

    #[test]
    fn test_variable_curves() {
        let engine = FlsConfig::mews_engine().unwrap();
        let sbp = engine.input("SBP").unwrap();
        let curves = sbp.curves();

        assert_eq!(curves.len(), sbp.label_count());
        assert_eq!(curves[0].label, "Low+3");
        assert!(curves.iter().all(|c| c.points.len() == sbp.universe().len()));
        assert!(curves.iter().any(|c| c.max_width() > 0.0));
    }
}
