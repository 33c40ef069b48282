//! Type reduction: collapsing the aggregated interval set to a crisp score
//!
//! # Policies
//!
//! - **Centroid of bounds** (default): type-1 centroid of the lower curve and of
//!   the upper curve; the crisp score is their midpoint.
//! - **Mean of means**: type-1 centroid of the pointwise mean curve
//!   `(lower + upper) / 2`. This is not the average of the two bound
//!   centroids, which would equal the centroid-of-bounds score exactly. The
//!   curves carry different mass, so the two policies generally disagree.
//!
//! Both report the per-bound centroids as the risk interval. A bound whose
//! curve is zero everywhere has no centroid and borrows the other bound's.

use serde::{Deserialize, Serialize};

use crate::fuzzy::{IntervalSet, Universe};

/// Type-reduction policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum TypeReduction {
    #[default]
    CentroidOfBounds,
    MeanOfMeans,
}

impl TypeReduction {
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeReduction::CentroidOfBounds => "centroid-of-bounds",
            TypeReduction::MeanOfMeans => "mean-of-means",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "centroid-of-bounds" | "centroid" | "cob" => Some(TypeReduction::CentroidOfBounds),
            "mean-of-means" | "mean" | "mom" => Some(TypeReduction::MeanOfMeans),
            _ => None,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            TypeReduction::CentroidOfBounds => "Midpoint of the lower-curve and upper-curve centroids",
            TypeReduction::MeanOfMeans => "Centroid of the pointwise mean of the lower and upper curves",
        }
    }

    /// Reduce an aggregated set; `None` when both curves are zero everywhere
    pub fn reduce(&self, set: &IntervalSet, universe: &Universe) -> Option<Reduction> {
        let points = universe.points();
        let (lower_centroid, upper_centroid) =
            match (centroid(points, set.lower()), centroid(points, set.upper())) {
                (Some(l), Some(u)) => (l, u),
                (Some(c), None) | (None, Some(c)) => (c, c),
                (None, None) => return None,
            };

        let score = match self {
            TypeReduction::CentroidOfBounds => (lower_centroid + upper_centroid) / 2.0,
            TypeReduction::MeanOfMeans => {
                let mean: Vec<f64> = set.iter().map(|d| d.midpoint()).collect();
                centroid(points, &mean)?
            }
        };

        Some(Reduction {
            score,
            lower_centroid,
            upper_centroid,
        })
    }
}

/// Output of a type reduction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reduction {
    pub score: f64,
    pub lower_centroid: f64,
    pub upper_centroid: f64,
}

/// Discrete type-1 centroid `sum(x * mu) / sum(mu)`; `None` if `sum(mu) == 0`
pub fn centroid(points: &[f64], membership: &[f64]) -> Option<f64> {
    let (num, den) = points
        .iter()
        .zip(membership)
        .fold((0.0, 0.0), |(num, den), (&x, &mu)| (num + x * mu, den + mu));
    if den > 0.0 {
        Some(num / den)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn universe() -> Universe {
        Universe::new(0.0, 4.0, 1.0).unwrap()
    }

    #[test]
    fn test_centroid() {
        assert_eq!(centroid(&[0.0, 1.0, 2.0], &[0.0, 1.0, 0.0]), Some(1.0));
        assert_eq!(centroid(&[0.0, 1.0, 2.0], &[1.0, 0.0, 1.0]), Some(1.0));
        assert_eq!(centroid(&[0.0, 1.0, 2.0], &[0.0, 0.0, 0.0]), None);
    }

    #[test]
    fn test_centroid_of_bounds() {
        let set = IntervalSet::new(vec![0.0, 1.0, 0.0, 0.0, 0.0], vec![0.0, 1.0, 1.0, 1.0, 0.0]).unwrap();
        let r = TypeReduction::CentroidOfBounds.reduce(&set, &universe()).unwrap();
        assert_eq!(r.lower_centroid, 1.0);
        assert_eq!(r.upper_centroid, 2.0);
        assert_eq!(r.score, 1.5);
    }

    #[test]
    fn test_mean_of_means_differs() {
        let set = IntervalSet::new(vec![0.0, 1.0, 0.0, 0.0, 0.0], vec![0.0, 1.0, 1.0, 1.0, 0.0]).unwrap();
        let r = TypeReduction::MeanOfMeans.reduce(&set, &universe()).unwrap();
        // mean curve [0, 1, .5, .5, 0] -> (1 + 1 + 1.5) / 2
        assert!((r.score - 1.75).abs() < 1e-12);
        assert_eq!(r.lower_centroid, 1.0);
        assert_eq!(r.upper_centroid, 2.0);
        // not the average of the bound centroids
        assert_ne!(r.score, (r.lower_centroid + r.upper_centroid) / 2.0);
    }

    #[test]
    fn test_empty_lower_borrows_upper() {
        let set = IntervalSet::new(vec![0.0; 5], vec![0.0, 0.0, 0.0, 0.5, 1.0]).unwrap();
        for policy in [TypeReduction::CentroidOfBounds, TypeReduction::MeanOfMeans] {
            let r = policy.reduce(&set, &universe()).unwrap();
            assert_eq!(r.lower_centroid, r.upper_centroid);
            assert!((r.score - 11.0 / 3.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_null_set_has_no_reduction() {
        let set = IntervalSet::zeros(5);
        assert!(TypeReduction::CentroidOfBounds.reduce(&set, &universe()).is_none());
        assert!(TypeReduction::MeanOfMeans.reduce(&set, &universe()).is_none());
    }

    #[test]
    fn test_policy_names() {
        assert_eq!(TypeReduction::from_str("centroid-of-bounds"), Some(TypeReduction::CentroidOfBounds));
        assert_eq!(TypeReduction::from_str("MEAN_OF_MEANS"), Some(TypeReduction::MeanOfMeans));
        assert_eq!(TypeReduction::from_str("karnik-mendel"), None);
        assert_eq!(TypeReduction::default(), TypeReduction::CentroidOfBounds);
    }
}
