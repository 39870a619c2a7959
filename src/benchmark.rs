//! Side-by-side comparison of optimizers on one prepared problem.
//!
//! Every (algorithm, run) pair is an independent optimization over the same
//! read-only [`RoutingProblem`], so pairs run across the rayon pool. Stochastic
//! algorithms get seed `base_seed + run` when a base seed is configured.

use std::time::Duration;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::error::OptimizeError;
use crate::model::RouteOptimizationParameters;
use crate::problem::RoutingProblem;
use crate::route::{Algorithm, OptimizedRoute};
use crate::traits::DistanceMatrixProvider;

#[derive(Debug, Clone)]
pub struct BenchmarkConfig {
    /// Runs per algorithm. Deterministic algorithms repeat identically.
    pub runs_per_algorithm: usize,
    pub base_seed: Option<u64>,
    /// Spread runs across the rayon thread pool.
    pub parallel: bool,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            runs_per_algorithm: 5,
            base_seed: None,
            parallel: true,
        }
    }
}

impl BenchmarkConfig {
    pub fn with_runs_per_algorithm(mut self, runs: usize) -> Self {
        self.runs_per_algorithm = runs;
        self
    }

    pub fn with_base_seed(mut self, seed: u64) -> Self {
        self.base_seed = Some(seed);
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn validate(&self) -> Result<(), OptimizeError> {
        if self.runs_per_algorithm == 0 {
            return Err(OptimizeError::config("runs_per_algorithm", "must be at least 1"));
        }
        Ok(())
    }
}

/// Aggregate results of one algorithm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlgorithmStats {
    pub algorithm: Algorithm,
    pub runs: usize,
    /// Runs that visited every feasible job exactly once.
    pub successes: usize,
    pub success_rate: f64,
    pub min_cost: f64,
    pub max_cost: f64,
    pub mean_cost: f64,
    /// Population standard deviation of the final cost.
    pub std_dev_cost: f64,
    pub mean_elapsed: Duration,
    /// Mean cost relative to the fastest algorithm's mean cost, in percent.
    pub gap_to_fastest_percent: f64,
    /// Best cost relative to the best cost of any algorithm, in percent.
    pub gap_to_best_percent: f64,
    pub best_route: OptimizedRoute,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkReport {
    /// One entry per requested algorithm, in request order.
    pub stats: Vec<AlgorithmStats>,
    /// Algorithm with the lowest mean wall-clock time.
    pub fastest: Option<Algorithm>,
    /// Algorithm that produced the lowest cost overall.
    pub best: Option<Algorithm>,
}

impl BenchmarkReport {
    pub fn stats_for(&self, algorithm: Algorithm) -> Option<&AlgorithmStats> {
        self.stats.iter().find(|stats| stats.algorithm == algorithm)
    }

    /// The lowest-cost route of the whole benchmark.
    pub fn best_route(&self) -> Option<&OptimizedRoute> {
        self.best
            .and_then(|algorithm| self.stats_for(algorithm))
            .map(|stats| &stats.best_route)
    }
}

#[derive(Debug, Clone, Default)]
pub struct BenchmarkHarness {
    config: BenchmarkConfig,
}

impl BenchmarkHarness {
    pub fn new(config: BenchmarkConfig) -> Result<Self, OptimizeError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Prepare `params` once and benchmark `algorithms` on the result.
    pub fn compare<P>(
        &self,
        params: &RouteOptimizationParameters,
        provider: &P,
        algorithms: &[Algorithm],
    ) -> Result<BenchmarkReport, OptimizeError>
    where
        P: DistanceMatrixProvider + ?Sized,
    {
        let problem = RoutingProblem::prepare(params, provider)?;
        Ok(self.run(&problem, algorithms))
    }

    #[instrument(skip_all, fields(algorithms = algorithms.len(), runs = self.config.runs_per_algorithm))]
    pub fn run(&self, problem: &RoutingProblem<'_>, algorithms: &[Algorithm]) -> BenchmarkReport {
        let runs = self.config.runs_per_algorithm;
        let pairs: Vec<(Algorithm, usize)> = algorithms
            .iter()
            .flat_map(|&algorithm| (0..runs).map(move |run| (algorithm, run)))
            .collect();

        let execute = |&(algorithm, run): &(Algorithm, usize)| {
            let seed = self.config.base_seed.map(|base| base.wrapping_add(run as u64));
            algorithm.optimizer(seed).optimize(problem)
        };
        let routes: Vec<OptimizedRoute> = if self.config.parallel {
            pairs.par_iter().map(execute).collect()
        } else {
            pairs.iter().map(execute).collect()
        };

        let mut stats: Vec<AlgorithmStats> = algorithms
            .iter()
            .zip(routes.chunks(runs))
            .map(|(&algorithm, chunk)| summarize(problem, algorithm, chunk))
            .collect();

        let fastest = stats
            .iter()
            .min_by(|a, b| a.mean_elapsed.cmp(&b.mean_elapsed))
            .map(|s| (s.algorithm, s.mean_cost));
        let best = stats
            .iter()
            .min_by(|a, b| a.min_cost.total_cmp(&b.min_cost))
            .map(|s| (s.algorithm, s.min_cost));

        for entry in &mut stats {
            if let Some((_, reference)) = fastest {
                entry.gap_to_fastest_percent = percent_gap(entry.mean_cost, reference);
            }
            if let Some((_, reference)) = best {
                entry.gap_to_best_percent = percent_gap(entry.min_cost, reference);
            }
            info!(
                algorithm = %entry.algorithm,
                mean_cost = entry.mean_cost,
                std_dev = entry.std_dev_cost,
                success_rate = entry.success_rate,
                mean_ms = entry.mean_elapsed.as_millis() as u64,
                "benchmark result"
            );
        }

        BenchmarkReport {
            stats,
            fastest: fastest.map(|(algorithm, _)| algorithm),
            best: best.map(|(algorithm, _)| algorithm),
        }
    }
}

/// `routes` is non-empty.
fn summarize(problem: &RoutingProblem<'_>, algorithm: Algorithm, routes: &[OptimizedRoute]) -> AlgorithmStats {
    let runs = routes.len();
    let costs: Vec<f64> = routes.iter().map(OptimizedRoute::cost).collect();
    let mean = costs.iter().sum::<f64>() / runs as f64;
    let variance = costs.iter().map(|cost| (cost - mean).powi(2)).sum::<f64>() / runs as f64;
    let successes = routes.iter().filter(|route| visits_every_job(problem, route)).count();
    let total_elapsed: Duration = routes.iter().map(|route| route.metrics.elapsed).sum();

    let mut best_route = &routes[0];
    for route in &routes[1..] {
        if route.cost() < best_route.cost() {
            best_route = route;
        }
    }

    AlgorithmStats {
        algorithm,
        runs,
        successes,
        success_rate: successes as f64 / runs as f64,
        min_cost: costs.iter().copied().fold(f64::INFINITY, f64::min),
        max_cost: costs.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        mean_cost: mean,
        std_dev_cost: variance.sqrt(),
        mean_elapsed: total_elapsed / runs as u32,
        gap_to_fastest_percent: 0.0,
        gap_to_best_percent: 0.0,
        best_route: best_route.clone(),
    }
}

fn visits_every_job(problem: &RoutingProblem<'_>, route: &OptimizedRoute) -> bool {
    let mut visited: Vec<usize> = route.stops.iter().map(|stop| stop.job_index).collect();
    visited.sort_unstable();
    visited == problem.job_indices()
}

/// `(value - reference)` as a percentage of the reference's magnitude.
/// A zero reference yields 0 for an equal value, otherwise the raw difference.
fn percent_gap(value: f64, reference: f64) -> f64 {
    let diff = value - reference;
    if reference.abs() < f64::EPSILON {
        return if diff.abs() < f64::EPSILON { 0.0 } else { diff * 100.0 };
    }
    diff / reference.abs() * 100.0
}
