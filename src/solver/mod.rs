//! Route optimizers.
//!
//! Nearest-neighbor builds a greedy route; 2-opt and simulated annealing improve
//! it; the genetic optimizer evolves a population seeded with it.

pub mod annealing;
pub mod genetic;
pub mod nearest_neighbor;
pub mod operators;
pub mod two_opt;

pub use annealing::{AnnealingConfig, SimulatedAnnealingOptimizer};
pub use genetic::{GeneticConfig, GeneticOptimizer};
pub use nearest_neighbor::{Construction, NearestNeighborOptimizer};
pub use two_opt::{TwoOptConfig, TwoOptOptimizer};

use crate::error::OptimizeError;
use crate::model::RouteOptimizationParameters;
use crate::problem::RoutingProblem;
use crate::route::{Algorithm, OptimizedRoute};
use crate::traits::{DistanceMatrixProvider, RouteOptimizer};

impl Algorithm {
    /// Build the optimizer for this algorithm with default settings.
    ///
    /// `seed` fixes the random source of the stochastic optimizers and is
    /// ignored by the deterministic ones.
    pub fn optimizer(self, seed: Option<u64>) -> Box<dyn RouteOptimizer> {
        match self {
            Algorithm::NearestNeighbor => Box::new(NearestNeighborOptimizer),
            Algorithm::TwoOpt => Box::new(TwoOptOptimizer::default()),
            Algorithm::Genetic => Box::new(GeneticOptimizer::from_valid(GeneticConfig {
                seed,
                ..GeneticConfig::default()
            })),
            Algorithm::SimulatedAnnealing => {
                Box::new(SimulatedAnnealingOptimizer::from_valid(AnnealingConfig {
                    seed,
                    ..AnnealingConfig::default()
                }))
            }
        }
    }
}

/// Prepare the problem and run one algorithm over it.
pub fn optimize<P>(
    params: &RouteOptimizationParameters,
    provider: &P,
    algorithm: Algorithm,
) -> Result<OptimizedRoute, OptimizeError>
where
    P: DistanceMatrixProvider + ?Sized,
{
    let problem = RoutingProblem::prepare(params, provider)?;
    Ok(algorithm.optimizer(None).optimize(&problem))
}
