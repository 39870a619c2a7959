//! Greedy nearest-neighbor construction.
//!
//! From the current position, repeatedly move to the unvisited job with the
//! lowest leg score under the active objective. Deterministic: ties go to the
//! job that appears first in the input. Also provides the seed route for 2-opt
//! and simulated annealing.

use tracing::debug;

use crate::matrix::{DistanceMatrix, START};
use crate::problem::{RoutingProblem, RunStats};
use crate::route::{Algorithm, OptimizedRoute};
use crate::traits::RouteOptimizer;

/// A greedy order together with how it was obtained.
#[derive(Debug, Clone, PartialEq)]
pub struct Construction {
    pub order: Vec<usize>,
    pub cost: f64,
    /// Leg scores computed while building.
    pub evaluations: usize,
    /// Set when cancellation cut the construction short; the remaining jobs
    /// were appended in input order.
    pub cancelled: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NearestNeighborOptimizer;

impl NearestNeighborOptimizer {
    pub fn new() -> Self {
        Self
    }

    pub fn construct(&self, problem: &RoutingProblem<'_>) -> Construction {
        let objective = problem.objective();
        let n = problem.job_count();
        let mut visited = vec![false; n];
        let mut order = Vec::with_capacity(n);
        let mut current = START;
        let mut evaluations = 0;
        let mut cancelled = false;

        while order.len() < n {
            if problem.is_cancelled() {
                cancelled = true;
                order.extend((0..n).filter(|&job| !visited[job]));
                break;
            }

            let mut best: Option<(usize, f64)> = None;
            for job in (0..n).filter(|&job| !visited[job]) {
                let score = objective.leg_score(current, job);
                evaluations += 1;
                if best.is_none_or(|(_, best_score)| score < best_score) {
                    best = Some((job, score));
                }
            }
            let Some((job, _)) = best else { break };
            visited[job] = true;
            order.push(job);
            current = DistanceMatrix::job_node(job);
        }

        let cost = objective.cost(&order);
        debug!(jobs = n, cost, cancelled, "nearest-neighbor construction done");
        Construction {
            order,
            cost,
            evaluations,
            cancelled,
        }
    }
}

impl RouteOptimizer for NearestNeighborOptimizer {
    fn algorithm(&self) -> Algorithm {
        Algorithm::NearestNeighbor
    }

    fn optimize(&self, problem: &RoutingProblem<'_>) -> OptimizedRoute {
        let mut run = RunStats::start();
        run.initial_cost = problem.cost(&problem.identity());
        run.history.push(run.initial_cost);

        let construction = self.construct(problem);
        run.history.push(construction.cost);
        run.evaluations = construction.evaluations + 2;
        run.iterations = construction.order.len();
        run.terminated_early = construction.cancelled;

        problem.finish(Algorithm::NearestNeighbor, &construction.order, run)
    }
}
