//! Seams between the optimizers and their collaborators.
//!
//! [`DistanceMatrixProvider`] is the boundary to the outside world (a routing
//! service or a geometric estimate). [`RouteOptimizer`] is the single capability
//! all four strategies share.

use crate::error::OptimizeError;
use crate::model::Coordinate;
use crate::problem::RoutingProblem;
use crate::route::{Algorithm, OptimizedRoute};

/// Pairwise travel data for an ordered list of locations.
///
/// `distances_km[i][j]` and `durations_secs[i][j]` describe travel from the
/// i-th to the j-th location.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TravelMatrices {
    pub distances_km: Vec<Vec<f64>>,
    pub durations_secs: Vec<Vec<f64>>,
}

/// Provides distance and duration matrices for a set of locations.
///
/// The matrices are indexed by the provided location order.
pub trait DistanceMatrixProvider: Sync {
    fn matrices_for(&self, locations: &[Coordinate]) -> Result<TravelMatrices, OptimizeError>;
}

impl<P: DistanceMatrixProvider + ?Sized> DistanceMatrixProvider for &P {
    fn matrices_for(&self, locations: &[Coordinate]) -> Result<TravelMatrices, OptimizeError> {
        (**self).matrices_for(locations)
    }
}

/// A route construction or improvement strategy.
///
/// Implementations never mutate the problem; they work on index permutations
/// over its feasible jobs and always return a complete route, even when
/// cancelled.
pub trait RouteOptimizer: Send + Sync {
    fn algorithm(&self) -> Algorithm;

    fn optimize(&self, problem: &RoutingProblem<'_>) -> OptimizedRoute;
}
