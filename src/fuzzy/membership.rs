//! Interval membership functions
//!
//! Each linguistic label is a band of membership rather than a single curve:
//! - `Shape` - the type-1 curve family (trapezoid, triangle, Gaussian)
//! - `IntervalMembership` - how the lower/upper pair is derived from shapes
//! - `IntervalSet` - both curves sampled over a `Universe`
//!
//! # Construction policies
//!
//! - **Parameter shift**: one shape, evaluated at positions shifted by a fixed
//!   `uncertainty`. The upper curve moves every sloped edge outward, the lower
//!   curve moves it inward. Vertical edges (zero-width ramps) are hard boundaries
//!   and stay put.
//! - **Dual parameter**: independent shapes for each bound, for asymmetric
//!   footprints. The lower shape must never rise above the upper one.

use serde::{Deserialize, Serialize};

use crate::error::{ErrorCode, FlsError, FlsResult};
use crate::fls_ensure;

use super::universe::Universe;

/// Slack allowed when comparing sampled lower/upper curves
const FOOTPRINT_TOLERANCE: f64 = 1e-12;

// ============================================================================
// Interval degree
// ============================================================================

/// A closed membership interval `[lower, upper]`
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Interval {
    pub lower: f64,
    pub upper: f64,
}

impl Interval {
    pub const ZERO: Interval = Interval { lower: 0.0, upper: 0.0 };
    pub const ONE: Interval = Interval { lower: 1.0, upper: 1.0 };

    pub fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }

    /// Width of the footprint at this point
    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }

    pub fn midpoint(&self) -> f64 {
        (self.lower + self.upper) / 2.0
    }

    /// AND: minimum, applied to each bound independently
    pub fn meet(&self, other: &Self) -> Self {
        Self::new(self.lower.min(other.lower), self.upper.min(other.upper))
    }

    /// OR: maximum, applied to each bound independently
    pub fn join(&self, other: &Self) -> Self {
        Self::new(self.lower.max(other.lower), self.upper.max(other.upper))
    }

    pub fn is_zero(&self) -> bool {
        self.lower == 0.0 && self.upper == 0.0
    }

    /// `0 <= lower <= upper <= 1`
    pub fn is_well_formed(&self) -> bool {
        0.0 <= self.lower && self.lower <= self.upper && self.upper <= 1.0
    }
}

// ============================================================================
// Shapes
// ============================================================================

/// Type-1 membership curve families
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "lowercase")]
pub enum Shape {
    /// 0 below `a`, ramp to 1 at `b`, plateau through `c`, ramp to 0 at `d`
    Trapezoid { a: f64, b: f64, c: f64, d: f64 },
    /// `exp(-0.5 * ((x - mean) / sigma)^2)`
    Gaussian { mean: f64, sigma: f64 },
}

impl Shape {
    /// Validated trapezoid; requires `a <= b <= c <= d`
    pub fn trapezoid(a: f64, b: f64, c: f64, d: f64) -> FlsResult<Self> {
        let shape = Shape::Trapezoid { a, b, c, d };
        shape.validate()?;
        Ok(shape)
    }

    /// Triangle `(a, b, c)`, stored as the trapezoid `(a, b, b, c)`
    pub fn triangle(a: f64, b: f64, c: f64) -> FlsResult<Self> {
        Self::trapezoid(a, b, b, c)
    }

    /// Validated Gaussian; requires `sigma > 0`
    pub fn gaussian(mean: f64, sigma: f64) -> FlsResult<Self> {
        let shape = Shape::Gaussian { mean, sigma };
        shape.validate()?;
        Ok(shape)
    }

    /// Build from a kind name and a flat parameter list
    pub fn from_params(kind: &str, params: &[f64]) -> FlsResult<Self> {
        match (kind, params) {
            ("trapezoid", &[a, b, c, d]) => Self::trapezoid(a, b, c, d),
            ("triangle", &[a, b, c]) => Self::triangle(a, b, c),
            ("gaussian", &[mean, sigma]) => Self::gaussian(mean, sigma),
            ("trapezoid" | "triangle" | "gaussian", _) => Err(FlsError::invalid_shape(format!(
                "{} expects {} parameters, got {}",
                kind,
                match kind {
                    "trapezoid" => 4,
                    "triangle" => 3,
                    _ => 2,
                },
                params.len()
            ))),
            _ => Err(FlsError::invalid_shape(format!("unknown shape '{}'", kind))
                .with_hint("Supported shapes: trapezoid, triangle, gaussian")),
        }
    }

    /// Check parameter ordering and finiteness
    pub fn validate(&self) -> FlsResult<()> {
        match *self {
            Shape::Trapezoid { a, b, c, d } => {
                fls_ensure!(
                    [a, b, c, d].iter().all(|p| p.is_finite()),
                    ErrorCode::InvalidShape,
                    "trapezoid parameters must be finite: ({}, {}, {}, {})",
                    a, b, c, d
                );
                fls_ensure!(
                    a <= b && b <= c && c <= d,
                    ErrorCode::InvalidShape,
                    "trapezoid parameters must satisfy a <= b <= c <= d: ({}, {}, {}, {})",
                    a, b, c, d
                );
            }
            Shape::Gaussian { mean, sigma } => {
                fls_ensure!(
                    mean.is_finite() && sigma.is_finite(),
                    ErrorCode::InvalidShape,
                    "gaussian parameters must be finite: ({}, {})",
                    mean, sigma
                );
                fls_ensure!(sigma > 0.0, ErrorCode::InvalidShape, "gaussian sigma must be positive, got {}", sigma);
            }
        }
        Ok(())
    }

    /// Membership degree of a crisp value
    pub fn evaluate(&self, x: f64) -> f64 {
        match *self {
            Shape::Trapezoid { a, b, c, d } => rise(x, a, b).min(fall(x, c, d)),
            Shape::Gaussian { mean, sigma } => gaussian(x, mean, sigma),
        }
    }

    /// The core (where membership = 1)
    pub fn core(&self) -> (f64, f64) {
        match *self {
            Shape::Trapezoid { b, c, .. } => (b, c),
            Shape::Gaussian { mean, .. } => (mean, mean),
        }
    }

    /// The support (where membership > 0); unbounded for a Gaussian
    pub fn support(&self) -> Option<(f64, f64)> {
        match *self {
            Shape::Trapezoid { a, d, .. } => Some((a, d)),
            Shape::Gaussian { .. } => None,
        }
    }

    /// Lower bound of the footprint produced by shifting this shape by `u`
    fn shifted_lower(&self, x: f64, u: f64) -> f64 {
        match *self {
            Shape::Trapezoid { a, b, c, d } => {
                let (ul, ur) = ramp_shifts(a, b, c, d, u);
                rise(x - ul, a, b).min(fall(x + ur, c, d))
            }
            Shape::Gaussian { mean, sigma } => {
                gaussian(x, mean - u, sigma).min(gaussian(x, mean + u, sigma))
            }
        }
    }

    /// Upper bound of the footprint produced by shifting this shape by `u`
    fn shifted_upper(&self, x: f64, u: f64) -> f64 {
        match *self {
            Shape::Trapezoid { a, b, c, d } => {
                let (ul, ur) = ramp_shifts(a, b, c, d, u);
                rise(x + ul, a, b).min(fall(x - ur, c, d))
            }
            Shape::Gaussian { mean, sigma } => {
                if (x - mean).abs() <= u {
                    1.0
                } else if x < mean {
                    gaussian(x, mean - u, sigma)
                } else {
                    gaussian(x, mean + u, sigma)
                }
            }
        }
    }
}

/// Rising edge: 0 at or below `a`, 1 at or above `b`.
///
/// The slope branch is only reached for `a < x < b`, so a vertical edge
/// (`a == b`) never divides by zero.
fn rise(x: f64, a: f64, b: f64) -> f64 {
    if x >= b {
        1.0
    } else if x <= a {
        0.0
    } else {
        ((x - a) / (b - a)).clamp(0.0, 1.0)
    }
}

/// Falling edge: 1 at or below `c`, 0 at or above `d`; divides only for `c < x < d`
fn fall(x: f64, c: f64, d: f64) -> f64 {
    if x <= c {
        1.0
    } else if x >= d {
        0.0
    } else {
        ((d - x) / (d - c)).clamp(0.0, 1.0)
    }
}

fn gaussian(x: f64, mean: f64, sigma: f64) -> f64 {
    (-0.5 * ((x - mean) / sigma).powi(2)).exp()
}

/// Shift applied to the left and right ramps; vertical edges are not shifted
fn ramp_shifts(a: f64, b: f64, c: f64, d: f64, u: f64) -> (f64, f64) {
    let left = if b > a { u } else { 0.0 };
    let right = if d > c { u } else { 0.0 };
    (left, right)
}

// ============================================================================
// Interval membership functions
// ============================================================================

/// Interval membership function: how a label's lower/upper curves are derived
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "lowercase")]
pub enum IntervalMembership {
    /// One shape, evaluated at positions shifted by `uncertainty`
    Shifted { shape: Shape, uncertainty: f64 },
    /// Independent shapes for the lower and upper curves
    Dual { lower: Shape, upper: Shape },
}

impl IntervalMembership {
    /// Parameter-shift policy; `uncertainty == 0` gives a type-1 set
    pub fn shifted(shape: Shape, uncertainty: f64) -> FlsResult<Self> {
        shape.validate()?;
        fls_ensure!(
            uncertainty.is_finite() && uncertainty >= 0.0,
            ErrorCode::InvalidShape,
            "uncertainty must be a non-negative finite number, got {}",
            uncertainty
        );
        Ok(IntervalMembership::Shifted { shape, uncertainty })
    }

    /// Dual-parameter policy; bound ordering is checked when sampled
    pub fn dual(lower: Shape, upper: Shape) -> FlsResult<Self> {
        lower.validate()?;
        upper.validate()?;
        Ok(IntervalMembership::Dual { lower, upper })
    }

    /// Type-1 set (lower == upper)
    pub fn crisp(shape: Shape) -> FlsResult<Self> {
        Self::shifted(shape, 0.0)
    }

    /// Membership interval of a crisp value
    pub fn evaluate(&self, x: f64) -> Interval {
        match *self {
            IntervalMembership::Shifted { shape, uncertainty } => Interval::new(
                shape.shifted_lower(x, uncertainty),
                shape.shifted_upper(x, uncertainty),
            ),
            IntervalMembership::Dual { lower, upper } => {
                Interval::new(lower.evaluate(x), upper.evaluate(x))
            }
        }
    }

    /// Sample both curves over a universe.
    ///
    /// Fails with `FootprintViolation` if the lower curve rises above the upper
    /// curve at any sample; bounds are never swapped.
    pub fn sample(&self, label: &str, universe: &Universe) -> FlsResult<IntervalSet> {
        let mut lower = Vec::with_capacity(universe.len());
        let mut upper = Vec::with_capacity(universe.len());

        for &x in universe.points() {
            let degree = self.evaluate(x);
            if degree.lower > degree.upper + FOOTPRINT_TOLERANCE {
                return Err(FlsError::footprint(label, x, degree.lower, degree.upper));
            }
            lower.push(degree.lower.min(degree.upper));
            upper.push(degree.upper);
        }

        IntervalSet::new(lower, upper)
    }
}

// ============================================================================
// Sampled interval sets
// ============================================================================

/// Lower and upper membership curves aligned index-for-index with a universe.
///
/// Invariant: `0 <= lower[i] <= upper[i] <= 1` for every index.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntervalSet {
    lower: Vec<f64>,
    upper: Vec<f64>,
}

impl IntervalSet {
    /// Build from explicit curves, checking the footprint invariant
    pub fn new(lower: Vec<f64>, upper: Vec<f64>) -> FlsResult<Self> {
        fls_ensure!(
            lower.len() == upper.len(),
            ErrorCode::FootprintViolation,
            "lower ({}) and upper ({}) curves differ in length",
            lower.len(), upper.len()
        );
        for (i, (&l, &u)) in lower.iter().zip(&upper).enumerate() {
            fls_ensure!(
                Interval::new(l, u).is_well_formed(),
                ErrorCode::FootprintViolation,
                "sample {} violates 0 <= lower <= upper <= 1 (lower = {}, upper = {})",
                i, l, u
            );
        }
        Ok(Self { lower, upper })
    }

    /// All-zero set of `len` samples (aggregation starting point)
    pub fn zeros(len: usize) -> Self {
        Self {
            lower: vec![0.0; len],
            upper: vec![0.0; len],
        }
    }

    pub fn len(&self) -> usize {
        self.lower.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lower.is_empty()
    }

    pub fn lower(&self) -> &[f64] {
        &self.lower
    }

    pub fn upper(&self) -> &[f64] {
        &self.upper
    }

    /// Degree interval at a sample index
    pub fn get(&self, index: usize) -> Option<Interval> {
        Some(Interval::new(*self.lower.get(index)?, *self.upper.get(index)?))
    }

    /// Footprint width at each sample
    pub fn widths(&self) -> Vec<f64> {
        self.lower
            .iter()
            .zip(&self.upper)
            .map(|(l, u)| u - l)
            .collect()
    }

    /// Mamdani implication: clip each bound at the matching firing strength
    pub fn clipped(&self, strength: Interval) -> Self {
        Self {
            lower: self.lower.iter().map(|&l| l.min(strength.lower)).collect(),
            upper: self.upper.iter().map(|&u| u.min(strength.upper)).collect(),
        }
    }

    /// Pointwise maximum with `other` clipped at `strength`, in place
    pub fn absorb_clipped(&mut self, other: &IntervalSet, strength: Interval) {
        for (acc, &l) in self.lower.iter_mut().zip(&other.lower) {
            *acc = acc.max(l.min(strength.lower));
        }
        for (acc, &u) in self.upper.iter_mut().zip(&other.upper) {
            *acc = acc.max(u.min(strength.upper));
        }
    }

    /// Pointwise maximum with `other`, in place
    pub fn union_with(&mut self, other: &IntervalSet) {
        self.absorb_clipped(other, Interval::ONE);
    }

    /// True when both curves are zero everywhere
    pub fn is_null(&self) -> bool {
        self.upper.iter().all(|&u| u == 0.0)
    }

    /// Iterate degree intervals in universe order
    pub fn iter(&self) -> impl Iterator<Item = Interval> + '_ {
        self.lower
            .iter()
            .zip(&self.upper)
            .map(|(&l, &u)| Interval::new(l, u))
    }
}
