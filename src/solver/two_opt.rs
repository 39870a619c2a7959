//! 2-opt local search over the nearest-neighbor seed.
//!
//! For each pair of edges (i, i+1) and (j, j+1) of the current order, reverse
//! the jobs between them when that strictly lowers the route cost. Full passes
//! repeat until a pass finds no improving reversal or the pass budget runs out.
//! The start node takes part in the first edge, so the first job can change.
//!
//! When only distance matters and the matrix is symmetric, a reversal is
//! judged by its four edge endpoints, making a pass O(n^2). Otherwise every
//! candidate is priced with the full objective.

use tracing::debug;

use crate::error::OptimizeError;
use crate::matrix::{DistanceMatrix, START};
use crate::problem::{RoutingProblem, RunStats};
use crate::route::{Algorithm, OptimizedRoute};
use crate::solver::nearest_neighbor::NearestNeighborOptimizer;
use crate::traits::RouteOptimizer;

/// Minimum cost drop that counts as an improvement.
const IMPROVEMENT_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone)]
pub struct TwoOptConfig {
    /// Maximum number of full passes.
    pub max_iterations: usize,
}

impl Default for TwoOptConfig {
    fn default() -> Self {
        Self { max_iterations: 1000 }
    }
}

impl TwoOptConfig {
    pub fn with_max_iterations(mut self, n: usize) -> Self {
        self.max_iterations = n;
        self
    }

    pub fn validate(&self) -> Result<(), OptimizeError> {
        if self.max_iterations == 0 {
            return Err(OptimizeError::config("max_iterations", "must be at least 1"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct TwoOptOptimizer {
    config: TwoOptConfig,
}

impl TwoOptOptimizer {
    pub fn new(config: TwoOptConfig) -> Result<Self, OptimizeError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Improve `order` in place, recording passes and evaluations in `run`.
    fn improve(&self, problem: &RoutingProblem<'_>, order: &mut [usize], cost: &mut f64, run: &mut RunStats) {
        let n = order.len();
        if n < 2 {
            return;
        }
        let objective = problem.objective();
        let matrix = problem.matrix();
        let by_edges = objective.is_distance_only() && matrix.is_symmetric();
        let mut candidate = order.to_vec();

        while run.iterations < self.config.max_iterations {
            if problem.is_cancelled() {
                run.terminated_early = true;
                break;
            }
            run.iterations += 1;

            let mut improved = false;
            for i in 0..n - 1 {
                for j in i + 1..n {
                    run.evaluations += 1;
                    if by_edges {
                        if reversal_delta(matrix, order, i, j) < -IMPROVEMENT_EPSILON {
                            order[i..=j].reverse();
                            *cost = objective.cost(order);
                            improved = true;
                        }
                        continue;
                    }

                    candidate.copy_from_slice(order);
                    candidate[i..=j].reverse();
                    let candidate_cost = objective.cost(&candidate);
                    if candidate_cost < *cost - IMPROVEMENT_EPSILON {
                        order[i..=j].reverse();
                        *cost = candidate_cost;
                        improved = true;
                    }
                }
            }
            run.history.push(*cost);
            debug!(pass = run.iterations, cost = *cost, improved, "2-opt pass");

            if !improved {
                break;
            }
        }
    }
}

/// Distance change from reversing `order[i..=j]` on a symmetric matrix.
fn reversal_delta(matrix: &DistanceMatrix, order: &[usize], i: usize, j: usize) -> f64 {
    let before = if i == 0 { START } else { DistanceMatrix::job_node(order[i - 1]) };
    let first = DistanceMatrix::job_node(order[i]);
    let last = DistanceMatrix::job_node(order[j]);
    let after = if j + 1 < order.len() {
        Some(DistanceMatrix::job_node(order[j + 1]))
    } else {
        matrix.end_node()
    };

    let mut delta = matrix.distance(before, last) - matrix.distance(before, first);
    if let Some(after) = after {
        delta += matrix.distance(first, after) - matrix.distance(last, after);
    }
    delta
}

impl RouteOptimizer for TwoOptOptimizer {
    fn algorithm(&self) -> Algorithm {
        Algorithm::TwoOpt
    }

    fn optimize(&self, problem: &RoutingProblem<'_>) -> OptimizedRoute {
        let mut run = RunStats::start();
        let seed = NearestNeighborOptimizer.construct(problem);
        run.initial_cost = seed.cost;
        run.evaluations = seed.evaluations;
        run.terminated_early = seed.cancelled;
        run.history.push(seed.cost);

        let mut order = seed.order;
        let mut cost = seed.cost;
        if !seed.cancelled {
            self.improve(problem, &mut order, &mut cost, &mut run);
        }
        run.extra("seed_cost", seed.cost);
        run.extra("improvement", seed.cost - cost);

        problem.finish(Algorithm::TwoOpt, &order, run)
    }
}
