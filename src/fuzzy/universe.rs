//! Discretized universe of discourse

use serde::{Deserialize, Serialize};

use crate::error::{ErrorCode, FlsResult};
use crate::fls_ensure;

/// Relative tolerance (in units of the local step) used when snapping a crisp
/// value onto the sample grid.
const GRID_TOLERANCE: f64 = 1e-6;

/// Upper bound on the number of samples in a stepped universe
pub const MAX_UNIVERSE_POINTS: usize = 10_000_000;

/// Which edge a crisp value was clamped to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Edge {
    Start,
    End,
}

/// An ordered, finite sampling `x_0 < x_1 < ... < x_n` of a continuous domain.
///
/// Immutable once constructed; shared between variables and the aggregation
/// buffer through `Arc`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Universe {
    points: Vec<f64>,
}

impl Universe {
    /// Sample `start..=stop` with a fixed `step`.
    ///
    /// `stop` is included when it lies on the grid (within float tolerance);
    /// otherwise the last point is the largest grid point below `stop`.
    pub fn new(start: f64, stop: f64, step: f64) -> FlsResult<Self> {
        fls_ensure!(
            start.is_finite() && stop.is_finite() && step.is_finite(),
            ErrorCode::InvalidUniverse,
            "universe bounds must be finite (start = {}, stop = {}, step = {})",
            start, stop, step
        );
        fls_ensure!(step > 0.0, ErrorCode::InvalidUniverse, "universe step must be positive, got {}", step);
        fls_ensure!(
            stop > start,
            ErrorCode::InvalidUniverse,
            "universe stop ({}) must be greater than start ({})",
            stop, start
        );

        let intervals = ((stop - start) / step + GRID_TOLERANCE).floor();
        fls_ensure!(
            intervals < MAX_UNIVERSE_POINTS as f64,
            ErrorCode::InvalidUniverse,
            "universe {}..{} with step {} exceeds {} sample points",
            start, stop, step, MAX_UNIVERSE_POINTS
        );
        let intervals = intervals as usize;
        // start + i*step rather than accumulating, so long grids don't drift
        let points = (0..=intervals).map(|i| start + i as f64 * step).collect();
        Self::from_points(points)
    }

    /// `n` evenly spaced points from `start` to `stop`, both included
    pub fn linspace(start: f64, stop: f64, n: usize) -> FlsResult<Self> {
        fls_ensure!(
            (2..=MAX_UNIVERSE_POINTS).contains(&n),
            ErrorCode::InvalidUniverse,
            "linspace needs between 2 and {} points, got {}",
            MAX_UNIVERSE_POINTS, n
        );
        fls_ensure!(
            start.is_finite() && stop.is_finite() && stop > start,
            ErrorCode::InvalidUniverse,
            "linspace bounds must be finite with stop > start (start = {}, stop = {})",
            start, stop
        );

        let step = (stop - start) / (n - 1) as f64;
        let mut points: Vec<f64> = (0..n).map(|i| start + i as f64 * step).collect();
        points[n - 1] = stop;
        Self::from_points(points)
    }

    /// Build from explicit sample points (finite, strictly increasing, at least two)
    pub fn from_points(points: Vec<f64>) -> FlsResult<Self> {
        fls_ensure!(
            points.len() >= 2,
            ErrorCode::InvalidUniverse,
            "a universe needs at least 2 sample points, got {}",
            points.len()
        );
        fls_ensure!(
            points.iter().all(|p| p.is_finite()),
            ErrorCode::InvalidUniverse,
            "universe sample points must be finite"
        );
        fls_ensure!(
            points.windows(2).all(|w| w[0] < w[1]),
            ErrorCode::InvalidUniverse,
            "universe sample points must be strictly increasing"
        );
        Ok(Self { points })
    }

    pub fn points(&self) -> &[f64] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false; a universe holds at least two points
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn start(&self) -> f64 {
        self.points[0]
    }

    pub fn end(&self) -> f64 {
        self.points[self.points.len() - 1]
    }

    pub fn contains(&self, x: f64) -> bool {
        x >= self.start() && x <= self.end()
    }

    /// Nearest-below sample index for `x`, clamped to the edges.
    ///
    /// Returns the edge that was hit when `x` lies outside the sampled range.
    pub fn nearest_index(&self, x: f64) -> (usize, Option<Edge>) {
        if x < self.start() {
            return (0, Some(Edge::Start));
        }
        if x > self.end() {
            return (self.points.len() - 1, Some(Edge::End));
        }

        // Count of points <= x, with a step-relative tolerance so that 37.5 snaps
        // to a grid point computed as 35.0 + 25 * 0.1.
        let below = self.points.partition_point(|&p| p <= x);
        let idx = below.saturating_sub(1);
        if let Some(&next) = self.points.get(idx + 1) {
            let step = next - self.points[idx];
            if next - x <= step * GRID_TOLERANCE {
                return (idx + 1, None);
            }
        }
        (idx, None)
    }

    /// Sample value at an index
    pub fn at(&self, index: usize) -> Option<f64> {
        self.points.get(index).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inclusive_integer_grid() {
        let u = Universe::new(0.0, 200.0, 1.0).unwrap();
        assert_eq!(u.len(), 201);
        assert_eq!(u.start(), 0.0);
        assert_eq!(u.end(), 200.0);
    }

    #[test]
    fn test_fractional_step_grid() {
        let u = Universe::new(35.0, 40.0, 0.1).unwrap();
        assert_eq!(u.len(), 51);
        assert!((u.end() - 40.0).abs() < 1e-9);

        let risk = Universe::new(0.0, 14.0, 0.5).unwrap();
        assert_eq!(risk.len(), 29);
    }

    #[test]
    fn test_stop_off_grid_is_excluded() {
        let u = Universe::new(0.0, 10.5, 2.0).unwrap();
        assert_eq!(u.points(), &[0.0, 2.0, 4.0, 6.0, 8.0, 10.0]);
    }

    #[test]
    fn test_invalid_universes() {
        assert_eq!(Universe::new(0.0, 10.0, 0.0).unwrap_err().code, ErrorCode::InvalidUniverse);
        assert_eq!(Universe::new(10.0, 0.0, 1.0).unwrap_err().code, ErrorCode::InvalidUniverse);
        assert_eq!(Universe::new(0.0, f64::NAN, 1.0).unwrap_err().code, ErrorCode::InvalidUniverse);
        assert!(Universe::from_points(vec![1.0]).is_err());
        assert!(Universe::from_points(vec![1.0, 1.0, 2.0]).is_err());
        assert!(Universe::linspace(0.0, 1.0, 1).is_err());
    }

    #[test]
    fn test_oversized_grid_is_rejected() {
        let err = Universe::new(0.0, 1e300, 1e-300).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidUniverse);
        assert!(err.is_configuration_error());

        assert!(Universe::new(0.0, 1e9, 1e-6).is_err());
        assert_eq!(Universe::new(0.0, 1e6, 1.0).unwrap().len(), 1_000_001);
        assert!(Universe::linspace(0.0, 1.0, MAX_UNIVERSE_POINTS + 1).is_err());
    }

    #[test]
    fn test_linspace() {
        let u = Universe::linspace(15.0, 30.0, 100).unwrap();
        assert_eq!(u.len(), 100);
        assert_eq!(u.start(), 15.0);
        assert_eq!(u.end(), 30.0);
    }

    #[test]
    fn test_nearest_below_lookup() {
        let u = Universe::new(50.0, 200.0, 1.0).unwrap();
        assert_eq!(u.nearest_index(50.0), (0, None));
        assert_eq!(u.nearest_index(110.0), (60, None));
        assert_eq!(u.nearest_index(110.9), (60, None));
        assert_eq!(u.nearest_index(200.0), (150, None));
    }

    #[test]
    fn test_lookup_snaps_float_grid() {
        let u = Universe::new(35.0, 40.0, 0.1).unwrap();
        let (idx, edge) = u.nearest_index(37.5);
        assert_eq!(edge, None);
        assert!((u.at(idx).unwrap() - 37.5).abs() < 1e-9);
    }

    #[test]
    fn test_lookup_clamps_to_edges() {
        let u = Universe::new(50.0, 200.0, 1.0).unwrap();
        assert_eq!(u.nearest_index(0.0), (0, Some(Edge::Start)));
        assert_eq!(u.nearest_index(250.0), (150, Some(Edge::End)));
        assert!(!u.contains(0.0));
        assert!(u.contains(75.5));
    }
}
