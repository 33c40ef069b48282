//! Interval type-2 fuzzy building blocks
//!
//! - `universe`: discretized domains
//! - `membership`: shapes, interval membership functions, sampled interval sets
//! - `variable`: linguistic variables and fuzzification
//! - `rule`: clauses, rules and rule bases

pub mod universe;
pub mod membership;
pub mod variable;
pub mod rule;

pub use universe::{Universe, Edge, MAX_UNIVERSE_POINTS};
pub use membership::{Interval, Shape, IntervalMembership, IntervalSet};
pub use variable::{Role, LinguisticLabel, FuzzyVariable, Fuzzified, ClampNotice};
pub use rule::{Connective, Clause, Rule, RuleBase, Firing};
