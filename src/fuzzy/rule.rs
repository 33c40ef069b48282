//! Fuzzy rules and rule bases
//!
//! A rule combines its clauses with a single connective (all AND or all OR)
//! and concludes one label on the output variable. Firing strengths are
//! intervals: the connective is applied to lower and upper degrees separately.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{ErrorCode, FlsError, FlsResult};
use crate::fls_ensure;

use super::membership::Interval;
use super::variable::Fuzzified;

/// How a rule's clauses combine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Connective {
    /// Minimum over clauses
    #[default]
    And,
    /// Maximum over clauses
    Or,
}

impl Connective {
    pub fn as_str(&self) -> &'static str {
        match self {
            Connective::And => "and",
            Connective::Or => "or",
        }
    }

    fn combine(&self, acc: Interval, next: Interval) -> Interval {
        match self {
            Connective::And => acc.meet(&next),
            Connective::Or => acc.join(&next),
        }
    }
}

/// `variable IS label`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Clause {
    pub variable: String,
    pub label: String,
}

impl Clause {
    pub fn new(variable: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
            label: label.into(),
        }
    }
}

/// Outcome of evaluating one rule against a fuzzified panel
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Firing {
    /// All antecedent variables were present
    Fired(Interval),
    /// An antecedent variable was missing from the panel
    Skipped,
}

impl Firing {
    /// Strength, with skipped rules counting as `[0, 0]`
    pub fn strength(&self) -> Interval {
        match self {
            Firing::Fired(s) => *s,
            Firing::Skipped => Interval::ZERO,
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Firing::Skipped)
    }
}

/// A fuzzy rule: clauses joined by one connective, concluding one output label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// Rule name/label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub connective: Connective,
    pub clauses: Vec<Clause>,
    pub consequent: Clause,
}

impl Rule {
    pub fn new(connective: Connective, clauses: Vec<Clause>, consequent: Clause) -> Self {
        Self {
            name: None,
            connective,
            clauses,
            consequent,
        }
    }

    /// `c1 AND c2 AND ... => consequent`
    pub fn all(clauses: Vec<Clause>, consequent: Clause) -> Self {
        Self::new(Connective::And, clauses, consequent)
    }

    /// `c1 OR c2 OR ... => consequent`
    pub fn any(clauses: Vec<Clause>, consequent: Clause) -> Self {
        Self::new(Connective::Or, clauses, consequent)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Firing strength against fuzzified inputs keyed by variable name.
    ///
    /// A rule that mentions a variable absent from `inputs` is skipped. A label
    /// missing from a present variable's degrees counts as `[0, 0]`.
    pub fn fire(&self, inputs: &HashMap<String, Fuzzified>) -> Firing {
        let mut strength: Option<Interval> = None;

        for clause in &self.clauses {
            let Some(fuzzified) = inputs.get(&clause.variable) else {
                return Firing::Skipped;
            };
            let degree = fuzzified.degree(&clause.label).unwrap_or(Interval::ZERO);
            strength = Some(match strength {
                Some(acc) => self.connective.combine(acc, degree),
                None => degree,
            });
        }

        strength.map_or(Firing::Skipped, Firing::Fired)
    }

    /// Display form, e.g. `SBP is Normal and HR is Normal => RG is NRM`
    pub fn describe(&self) -> String {
        let joiner = format!(" {} ", self.connective.as_str());
        let body = self
            .clauses
            .iter()
            .map(|c| format!("{} is {}", c.variable, c.label))
            .collect::<Vec<_>>()
            .join(&joiner);
        format!("{} => {} is {}", body, self.consequent.variable, self.consequent.label)
    }
}

/// Ordered rules concluding on one output variable
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RuleBase {
    rules: Vec<Rule>,
}

impl RuleBase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule; rules without clauses are rejected
    pub fn add(&mut self, rule: Rule) -> FlsResult<()> {
        fls_ensure!(
            !rule.clauses.is_empty(),
            ErrorCode::EmptyClauses,
            "rule {} ({}) has no antecedent clauses",
            self.rules.len(),
            rule.name.as_deref().unwrap_or("unnamed")
        );
        self.rules.push(rule);
        Ok(())
    }

    pub fn from_rules(rules: impl IntoIterator<Item = Rule>) -> FlsResult<Self> {
        let mut base = Self::new();
        for rule in rules {
            base.add(rule)?;
        }
        Ok(base)
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rules whose consequent is on `output`
    pub fn concluding_on<'a>(&'a self, output: &'a str) -> impl Iterator<Item = (usize, &'a Rule)> + 'a {
        self.rules
            .iter()
            .enumerate()
            .filter(move |(_, r)| r.consequent.variable == output)
    }

    /// Fail with `EmptyRuleBase` unless some rule concludes on `output`
    pub fn ensure_concludes_on(&self, output: &str) -> FlsResult<()> {
        if self.concluding_on(output).next().is_none() {
            return Err(FlsError::new(
                ErrorCode::EmptyRuleBase,
                format!("no rule concludes on output variable '{}'", output),
            )
            .with_context("output", output)
            .with_context("rules", self.rules.len().to_string()));
        }
        Ok(())
    }
}
