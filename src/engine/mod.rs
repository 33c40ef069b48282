//! Inference Engine
//!
//! Composes the IT2 pipeline over one configured rule base:
//!
//! ```text
//! panel ──► fuzzify_all ──► fire ──► aggregate ──► defuzzify ──► RiskResult
//!           (per input)    (per rule) (min/max)    (type reduction)
//! ```
//!
//! An engine is immutable once built. Every `infer` call allocates its own
//! aggregation buffer, so one engine can be shared across threads freely.
//!
//! # Example
//!
//! ```ignore
//! use it2fls::config::FlsConfig;
//!
//! let engine = FlsConfig::mews_engine()?;
//! let panel = [("SBP", 110.0), ("HR", 70.0), ("SPO2", 96.0), ("Temp", 37.5), ("BS", 90.0)]
//!     .into_iter()
//!     .map(|(k, v)| (k.to_string(), v))
//!     .collect();
//! let result = engine.infer(&panel)?;
//! println!("risk {:.2} ({:?})", result.score, result.risk_group);
//! ```

pub mod batch;
pub mod reduction;

pub use batch::BatchConfig;
pub use reduction::{centroid, Reduction, TypeReduction};

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use tracing::{debug, info};

use crate::error::{ErrorCode, FlsError, FlsResult};
use crate::fls_bail;
use crate::fuzzy::{Fuzzified, FuzzyVariable, IntervalSet, Role, Rule, RuleBase};
use crate::report::{RiskResult, RuleActivation};

/// Crisp measurements keyed by variable name
pub type Panel = HashMap<String, f64>;

/// A validated, immutable IT2 inference engine
#[derive(Debug, Clone)]
pub struct InferenceEngine {
    inputs: IndexMap<String, FuzzyVariable>,
    output: FuzzyVariable,
    rules: RuleBase,
    reduction: TypeReduction,
}

impl InferenceEngine {
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    pub fn input(&self, name: &str) -> Option<&FuzzyVariable> {
        self.inputs.get(name)
    }

    pub fn inputs(&self) -> impl Iterator<Item = &FuzzyVariable> {
        self.inputs.values()
    }

    pub fn output(&self) -> &FuzzyVariable {
        &self.output
    }

    pub fn rules(&self) -> &RuleBase {
        &self.rules
    }

    pub fn type_reduction(&self) -> TypeReduction {
        self.reduction
    }

    /// Same engine with a different type-reduction policy
    pub fn with_type_reduction(mut self, reduction: TypeReduction) -> Self {
        self.reduction = reduction;
        self
    }

    /// Fuzzify every configured input present in the panel.
    ///
    /// Panel entries with no configured variable are ignored. Configured
    /// variables absent from the panel are simply missing from the result.
    pub fn fuzzify_all(&self, panel: &Panel) -> FlsResult<HashMap<String, Fuzzified>> {
        let mut fuzzified = HashMap::with_capacity(self.inputs.len());
        for (name, variable) in &self.inputs {
            let Some(&value) = panel.get(name) else {
                continue;
            };
            fuzzified.insert(name.clone(), variable.fuzzify(value)?);
        }

        for name in panel.keys().filter(|k| !self.inputs.contains_key(k.as_str())) {
            debug!(variable = %name, "ignoring panel entry with no configured variable");
        }
        Ok(fuzzified)
    }

    /// Firing strength of every rule, in rule-base order
    pub fn fire(&self, fuzzified: &HashMap<String, Fuzzified>) -> Vec<RuleActivation> {
        self.rules
            .concluding_on(self.output.name())
            .map(|(index, rule)| {
                let firing = rule.fire(fuzzified);
                let strength = firing.strength();
                if firing.is_skipped() {
                    debug!(rule = index, rule_name = ?rule.name, "rule skipped, antecedent variable missing");
                } else if !strength.is_zero() {
                    debug!(
                        rule = index,
                        rule_name = ?rule.name,
                        lower = strength.lower,
                        upper = strength.upper,
                        "rule fired"
                    );
                }
                RuleActivation {
                    index,
                    name: rule.name.clone(),
                    consequent: rule.consequent.label.clone(),
                    strength,
                    skipped: firing.is_skipped(),
                }
            })
            .collect()
    }

    /// Mamdani min implication per rule, max across rules
    pub fn aggregate(&self, activations: &[RuleActivation]) -> IntervalSet {
        let mut aggregated = IntervalSet::zeros(self.output.universe().len());
        for activation in activations.iter().filter(|a| !a.skipped && !a.strength.is_zero()) {
            if let Some(label) = self.output.label(&activation.consequent) {
                aggregated.absorb_clipped(label.set(), activation.strength);
            }
        }
        aggregated
    }

    /// Type-reduce an aggregated set on the output universe
    pub fn defuzzify(&self, aggregated: IntervalSet) -> FlsResult<RiskResult> {
        let universe = self.output.shared_universe();
        let Some(reduction) = self.reduction.reduce(&aggregated, &universe) else {
            return Err(FlsError::no_rule_fired(self.rules.len())
                .with_context("reduction", self.reduction.as_str()));
        };
        debug!(
            policy = self.reduction.as_str(),
            score = reduction.score,
            lower_centroid = reduction.lower_centroid,
            upper_centroid = reduction.upper_centroid,
            "type reduction"
        );

        let risk_group = self
            .output
            .dominant_label(reduction.score)
            .map(|(name, _)| name.to_string());

        Ok(RiskResult::new(
            self.output.name(),
            universe,
            aggregated,
            self.reduction,
            reduction,
            risk_group,
        ))
    }

    /// Run the full pipeline on one panel.
    ///
    /// Fails with `NoRuleFired` when every firing strength is zero and with
    /// `InvalidInput` on a non-finite measurement. Neither affects later calls.
    pub fn infer(&self, panel: &Panel) -> FlsResult<RiskResult> {
        let fuzzified = self.fuzzify_all(panel)?;
        let activations = self.fire(&fuzzified);

        if activations.iter().all(|a| a.strength.is_zero()) {
            let skipped = activations.iter().filter(|a| a.skipped).count();
            return Err(FlsError::no_rule_fired(activations.len())
                .with_context("skipped", skipped.to_string())
                .with_context("inputs", fuzzified.len().to_string()));
        }

        let aggregated = self.aggregate(&activations);
        let mut result = self.defuzzify(aggregated)?;
        result.activations = activations;
        result.clamped = self
            .inputs
            .keys()
            .filter_map(|name| fuzzified.get(name)?.clamped.clone())
            .collect();
        Ok(result)
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Collects variables and rules, then validates them into an engine
#[derive(Debug, Clone, Default)]
pub struct EngineBuilder {
    variables: Vec<FuzzyVariable>,
    rules: Vec<Rule>,
    reduction: TypeReduction,
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn variable(mut self, variable: FuzzyVariable) -> Self {
        self.variables.push(variable);
        self
    }

    pub fn variables(mut self, variables: impl IntoIterator<Item = FuzzyVariable>) -> Self {
        self.variables.extend(variables);
        self
    }

    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn rules(mut self, rules: impl IntoIterator<Item = Rule>) -> Self {
        self.rules.extend(rules);
        self
    }

    pub fn type_reduction(mut self, reduction: TypeReduction) -> Self {
        self.reduction = reduction;
        self
    }

    /// Validate and build. All configuration errors surface here.
    pub fn build(self) -> FlsResult<InferenceEngine> {
        let mut seen = HashSet::new();
        let mut inputs = IndexMap::new();
        let mut output: Option<FuzzyVariable> = None;

        for variable in self.variables {
            if !seen.insert(variable.name().to_string()) {
                return Err(FlsError::new(
                    ErrorCode::DuplicateVariable,
                    format!("variable '{}' is defined more than once", variable.name()),
                )
                .with_context("variable", variable.name()));
            }
            match variable.role() {
                Role::Antecedent => {
                    inputs.insert(variable.name().to_string(), variable);
                }
                Role::Consequent => {
                    if let Some(existing) = &output {
                        fls_bail!(
                            ErrorCode::ConfigurationError,
                            "only one output variable is supported, found '{}' and '{}'",
                            existing.name(),
                            variable.name()
                        );
                    }
                    output = Some(variable);
                }
            }
        }

        let Some(output) = output else {
            return Err(FlsError::new(ErrorCode::MissingOutput, "no consequent variable defined")
                .with_hint("Mark the risk variable with role = \"consequent\""));
        };

        let rules = RuleBase::from_rules(self.rules)?;
        for (index, rule) in rules.rules().iter().enumerate() {
            validate_rule(index, rule, &inputs, &output)?;
        }
        rules.ensure_concludes_on(output.name())?;

        info!(
            inputs = inputs.len(),
            output = %output.name(),
            rules = rules.len(),
            reduction = self.reduction.as_str(),
            "inference engine built"
        );

        Ok(InferenceEngine {
            inputs,
            output,
            rules,
            reduction: self.reduction,
        })
    }
}

fn validate_rule(
    index: usize,
    rule: &Rule,
    inputs: &IndexMap<String, FuzzyVariable>,
    output: &FuzzyVariable,
) -> FlsResult<()> {
    let tag = |e: FlsError| {
        let e = e.with_context("rule", index.to_string());
        match &rule.name {
            Some(name) => e.with_context("rule_name", name.clone()),
            None => e,
        }
    };

    for clause in &rule.clauses {
        let Some(variable) = inputs.get(&clause.variable) else {
            let err = FlsError::unknown_variable(&clause.variable);
            let err = if clause.variable == output.name() {
                err.with_hint("The output variable cannot appear in an antecedent")
            } else {
                err
            };
            return Err(tag(err));
        };
        if !variable.has_label(&clause.label) {
            return Err(tag(FlsError::unknown_label(&clause.variable, &clause.label)));
        }
    }

    if rule.consequent.variable != output.name() {
        return Err(tag(FlsError::unknown_variable(&rule.consequent.variable)
            .with_hint(format!("Rules must conclude on the output variable '{}'", output.name()))));
    }
    if !output.has_label(&rule.consequent.label) {
        return Err(tag(FlsError::unknown_label(output.name(), &rule.consequent.label)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FlsConfig;
    use crate::fuzzy::{Clause, Edge, IntervalMembership, Shape, Universe};

    fn panel(values: &[(&str, f64)]) -> Panel {
        values.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    fn normal_panel() -> Panel {
        panel(&[("SBP", 110.0), ("HR", 70.0), ("SPO2", 96.0), ("Temp", 37.5), ("BS", 90.0)])
    }

    fn mews() -> InferenceEngine {
        FlsConfig::mews_engine().unwrap()
    }

    fn label(a: f64, b: f64, c: f64, d: f64) -> IntervalMembership {
        IntervalMembership::shifted(Shape::trapezoid(a, b, c, d).unwrap(), 0.5).unwrap()
    }

    fn temp() -> FuzzyVariable {
        FuzzyVariable::antecedent("Temp", Universe::new(35.0, 40.0, 0.5).unwrap())
            .with_label("Normal", label(35.0, 35.0, 37.5, 38.5)).unwrap()
            .with_label("Fever", label(37.5, 38.5, 40.0, 40.0)).unwrap()
    }

    fn risk() -> FuzzyVariable {
        FuzzyVariable::consequent("Risk", Universe::new(0.0, 10.0, 0.5).unwrap())
            .with_label("Low", label(0.0, 0.0, 2.0, 4.0)).unwrap()
            .with_label("High", label(6.0, 8.0, 10.0, 10.0)).unwrap()
    }

    fn small_engine() -> FlsResult<InferenceEngine> {
        InferenceEngine::builder()
            .variable(temp())
            .variable(risk())
            .rule(Rule::all(vec![Clause::new("Temp", "Normal")], Clause::new("Risk", "Low")))
            .rule(Rule::all(vec![Clause::new("Temp", "Fever")], Clause::new("Risk", "High")))
            .build()
    }

    #[test]
    fn test_normal_panel_is_low_risk() {
        let result = mews().infer(&normal_panel()).unwrap();

        assert!(result.score <= 1.5, "score {}", result.score);
        assert_eq!(result.risk_group.as_deref(), Some("NRM"));
        assert!(result.interval.lower <= result.interval.upper);
        assert!(result.clamped.is_empty());

        let fired: Vec<_> = result.activations.iter().filter(|a| !a.strength.is_zero()).collect();
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].consequent, "NRM");
        assert_eq!(fired[0].strength, crate::fuzzy::Interval::ONE);
    }

    #[test]
    fn test_severe_hypotension_is_high_risk() {
        let mut values = normal_panel();
        values.insert("SBP".to_string(), 50.0);
        let result = mews().infer(&values).unwrap();

        assert!(result.score > 13.0, "score {}", result.score);
        assert_eq!(result.risk_group.as_deref(), Some("HRG14"));
        let hrg14 = result.activations.iter().find(|a| a.consequent == "HRG14").unwrap();
        assert_eq!(hrg14.strength, crate::fuzzy::Interval::ONE);
    }

    #[test]
    fn test_partial_panel() {
        let engine = mews();

        // Only the HR-only rule can fire
        let result = engine.infer(&panel(&[("HR", 102.0)])).unwrap();
        assert!((result.score - 3.5).abs() < 1e-6, "score {}", result.score);
        assert_eq!(result.risk_group.as_deref(), Some("LRG3"));
        assert!(result.activations.iter().filter(|a| a.skipped).count() >= 5);

        let err = engine.infer(&panel(&[("SBP", 110.0), ("HR", 70.0)])).unwrap_err();
        assert!(err.is_no_rule_fired());
        assert!(!err.is_configuration_error());
    }

    #[test]
    fn test_out_of_range_input_is_clamped() {
        let engine = mews();
        let mut hot = normal_panel();
        hot.insert("Temp".to_string(), 42.0);
        let mut edge = normal_panel();
        edge.insert("Temp".to_string(), 40.0);

        let clamped = engine.infer(&hot).unwrap();
        let at_edge = engine.infer(&edge).unwrap();

        assert_eq!(clamped.score, at_edge.score);
        assert_eq!(clamped.clamped.len(), 1);
        assert_eq!(clamped.clamped[0].variable, "Temp");
        assert_eq!(clamped.clamped[0].edge, Edge::End);
        assert!(at_edge.clamped.is_empty());
        assert!((clamped.score - 6.5).abs() < 1e-6, "score {}", clamped.score);
    }

    #[test]
    fn test_non_finite_input_rejected() {
        let engine = mews();
        let mut values = normal_panel();
        values.insert("HR".to_string(), f64::NAN);

        let err = engine.infer(&values).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidInput);
        assert_eq!(err.context_field("variable"), Some("HR"));

        // engine unaffected
        assert!(engine.infer(&normal_panel()).is_ok());
    }

    #[test]
    fn test_unknown_panel_entries_ignored() {
        let engine = mews();
        let mut values = normal_panel();
        values.insert("RespRate".to_string(), 40.0);
        assert_eq!(engine.infer(&values).unwrap(), engine.infer(&normal_panel()).unwrap());
    }

    #[test]
    fn test_infer_is_idempotent() {
        let engine = mews();
        let values = panel(&[("SBP", 84.0), ("HR", 58.0), ("SPO2", 91.0), ("Temp", 36.2), ("BS", 71.0)]);
        let first = engine.infer(&values).unwrap();
        let second = engine.infer(&values).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_mean_of_means_policy() {
        let centroid = mews().infer(&normal_panel()).unwrap();
        let mean = mews()
            .with_type_reduction(TypeReduction::MeanOfMeans)
            .infer(&normal_panel())
            .unwrap();

        assert_eq!(mean.reduction, TypeReduction::MeanOfMeans);
        assert!(mean.score <= 1.5);
        assert!((mean.score - centroid.score).abs() > 1e-3);
        assert_eq!(mean.lower_centroid, centroid.lower_centroid);
        assert_eq!(mean.upper_centroid, centroid.upper_centroid);
    }

    #[test]
    fn test_small_engine() {
        let engine = small_engine().unwrap();
        let cool = engine.infer(&panel(&[("Temp", 36.0)])).unwrap();
        let hot = engine.infer(&panel(&[("Temp", 39.5)])).unwrap();

        assert_eq!(cool.risk_group.as_deref(), Some("Low"));
        assert_eq!(hot.risk_group.as_deref(), Some("High"));
        assert!(cool.score < hot.score);
    }

    #[test]
    fn test_gap_between_labels_fires_nothing() {
        let crisp = |a, b, c, d| IntervalMembership::crisp(Shape::trapezoid(a, b, c, d).unwrap()).unwrap();
        let gapped = FuzzyVariable::antecedent("Glucose", Universe::new(0.0, 10.0, 1.0).unwrap())
            .with_label("Low", crisp(0.0, 0.0, 2.0, 3.0)).unwrap()
            .with_label("High", crisp(5.0, 6.0, 10.0, 10.0)).unwrap();
        let engine = InferenceEngine::builder()
            .variable(gapped)
            .variable(temp())
            .variable(risk())
            .rule(Rule::all(
                vec![Clause::new("Glucose", "Low"), Clause::new("Temp", "Normal")],
                Clause::new("Risk", "Low"),
            ))
            .rule(Rule::all(
                vec![Clause::new("Glucose", "High"), Clause::new("Temp", "Normal")],
                Clause::new("Risk", "High"),
            ))
            .build()
            .unwrap();

        let err = engine.infer(&panel(&[("Glucose", 4.0), ("Temp", 36.0)])).unwrap_err();
        assert_eq!(err.code, ErrorCode::NoRuleFired);
        assert_eq!(err.context_field("skipped"), Some("0"));
        assert!(engine.infer(&panel(&[("Glucose", 1.0), ("Temp", 36.0)])).is_ok());
    }

    #[test]
    fn test_below_universe_matches_first_sample() {
        let engine = small_engine().unwrap();
        let below = engine.infer(&panel(&[("Temp", 30.0)])).unwrap();
        let first = engine.infer(&panel(&[("Temp", 35.0)])).unwrap();

        assert_eq!(below.score, first.score);
        assert_eq!(below.clamped[0].edge, Edge::Start);
        assert_eq!(below.clamped[0].clamped_to, 35.0);
    }

    #[test]
    fn test_aggregate_is_max_of_clipped() {
        let engine = small_engine().unwrap();
        let fuzzified = engine.fuzzify_all(&panel(&[("Temp", 38.0)])).unwrap();
        let activations = engine.fire(&fuzzified);
        let aggregated = engine.aggregate(&activations);

        let low = engine.output().label("Low").unwrap().set().clipped(activations[0].strength);
        let high = engine.output().label("High").unwrap().set().clipped(activations[1].strength);
        for (i, d) in aggregated.iter().enumerate() {
            assert_eq!(d.lower, low.lower()[i].max(high.lower()[i]));
            assert_eq!(d.upper, low.upper()[i].max(high.upper()[i]));
        }
    }

    #[test]
    fn test_engine_is_send_sync() {
        fn check<T: Send + Sync>() {}
        check::<InferenceEngine>();
        check::<RiskResult>();
    }

    #[test]
    fn test_duplicate_variable_rejected() {
        let err = InferenceEngine::builder()
            .variable(temp())
            .variable(temp())
            .variable(risk())
            .build()
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::DuplicateVariable);
    }

    #[test]
    fn test_missing_output_rejected() {
        let err = InferenceEngine::builder().variable(temp()).build().unwrap_err();
        assert_eq!(err.code, ErrorCode::MissingOutput);
    }

    #[test]
    fn test_empty_rule_base_rejected() {
        let err = InferenceEngine::builder()
            .variable(temp())
            .variable(risk())
            .build()
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::EmptyRuleBase);
        assert!(err.is_configuration_error());
    }

    #[test]
    fn test_unknown_references_rejected() {
        let unknown_var = InferenceEngine::builder()
            .variable(temp())
            .variable(risk())
            .rule(Rule::all(vec![Clause::new("HR", "Normal")], Clause::new("Risk", "Low")))
            .build()
            .unwrap_err();
        assert_eq!(unknown_var.code, ErrorCode::UnknownVariable);
        assert_eq!(unknown_var.context_field("rule"), Some("0"));

        let unknown_label = InferenceEngine::builder()
            .variable(temp())
            .variable(risk())
            .rule(Rule::all(vec![Clause::new("Temp", "Normal")], Clause::new("Risk", "Extreme")))
            .build()
            .unwrap_err();
        assert_eq!(unknown_label.code, ErrorCode::UnknownLabel);
    }
}
