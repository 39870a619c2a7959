//! Simulated annealing over the nearest-neighbor seed.
//!
//! Neighbors come from a uniformly chosen swap, segment reversal or
//! reinsertion. Uphill moves are accepted with probability `exp(-delta / T)`.
//! Temperature cools geometrically after each batch of
//! `iterations_per_temperature` moves until it drops below `min_temperature`.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::error::OptimizeError;
use crate::problem::{RoutingProblem, RunStats};
use crate::route::{Algorithm, OptimizedRoute};
use crate::solver::nearest_neighbor::NearestNeighborOptimizer;
use crate::solver::operators;
use crate::traits::RouteOptimizer;

#[derive(Debug, Clone)]
pub struct AnnealingConfig {
    pub initial_temperature: f64,
    /// Geometric cooling factor applied after each batch, in (0, 1).
    pub cooling_rate: f64,
    pub min_temperature: f64,
    pub iterations_per_temperature: usize,
    /// Hard cap on neighbor evaluations (0 = no cap).
    pub max_iterations: usize,
    pub seed: Option<u64>,
}

impl Default for AnnealingConfig {
    fn default() -> Self {
        Self {
            initial_temperature: 1000.0,
            cooling_rate: 0.995,
            min_temperature: 0.1,
            iterations_per_temperature: 100,
            max_iterations: 0,
            seed: None,
        }
    }
}

impl AnnealingConfig {
    pub fn with_initial_temperature(mut self, t: f64) -> Self {
        self.initial_temperature = t;
        self
    }

    pub fn with_cooling_rate(mut self, rate: f64) -> Self {
        self.cooling_rate = rate;
        self
    }

    pub fn with_min_temperature(mut self, t: f64) -> Self {
        self.min_temperature = t;
        self
    }

    pub fn with_iterations_per_temperature(mut self, n: usize) -> Self {
        self.iterations_per_temperature = n;
        self
    }

    pub fn with_max_iterations(mut self, n: usize) -> Self {
        self.max_iterations = n;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<(), OptimizeError> {
        if !(self.initial_temperature.is_finite() && self.initial_temperature > 0.0) {
            return Err(OptimizeError::config("initial_temperature", "must be positive and finite"));
        }
        if !(self.min_temperature > 0.0 && self.min_temperature < self.initial_temperature) {
            return Err(OptimizeError::config(
                "min_temperature",
                format!("must be in (0, {})", self.initial_temperature),
            ));
        }
        if !(self.cooling_rate > 0.0 && self.cooling_rate < 1.0) {
            return Err(OptimizeError::config(
                "cooling_rate",
                format!("must be in (0, 1), got {}", self.cooling_rate),
            ));
        }
        if self.iterations_per_temperature == 0 {
            return Err(OptimizeError::config("iterations_per_temperature", "must be at least 1"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct SimulatedAnnealingOptimizer {
    config: AnnealingConfig,
}

impl SimulatedAnnealingOptimizer {
    pub fn new(config: AnnealingConfig) -> Result<Self, OptimizeError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Wrap a config already known to be valid, such as a default with a seed.
    pub(crate) fn from_valid(config: AnnealingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnnealingConfig {
        &self.config
    }

    /// Run with a caller-supplied random source.
    pub fn optimize_with_rng<R: Rng + ?Sized>(&self, problem: &RoutingProblem<'_>, rng: &mut R) -> OptimizedRoute {
        let config = &self.config;
        let mut run = RunStats::start();
        let objective = problem.objective();
        let seed = NearestNeighborOptimizer.construct(problem);
        run.initial_cost = seed.cost;
        run.evaluations = seed.evaluations;
        run.terminated_early = seed.cancelled;
        run.history.push(seed.cost);
        run.extra("seed_cost", seed.cost);

        if problem.job_count() < 2 || seed.cancelled {
            return problem.finish(Algorithm::SimulatedAnnealing, &seed.order, run);
        }

        let mut current = seed.order;
        let mut current_cost = seed.cost;
        let mut best = current.clone();
        let mut best_cost = current_cost;
        let mut candidate = current.clone();

        let mut temperature = config.initial_temperature;
        let mut moves = 0usize;
        let mut accepted = 0usize;
        let mut improving = 0usize;
        let capped = |moves: usize| config.max_iterations > 0 && moves >= config.max_iterations;

        while temperature >= config.min_temperature && !capped(moves) {
            if problem.is_cancelled() {
                run.terminated_early = true;
                break;
            }

            for _ in 0..config.iterations_per_temperature {
                if capped(moves) {
                    break;
                }
                candidate.clone_from(&current);
                match rng.gen_range(0..3) {
                    0 => operators::swap(&mut candidate, rng),
                    1 => operators::reverse_segment(&mut candidate, rng),
                    _ => operators::reinsert(&mut candidate, rng),
                }
                let candidate_cost = objective.cost(&candidate);
                moves += 1;

                let delta = candidate_cost - current_cost;
                let accept = delta <= 0.0 || rng.gen_range(0.0..1.0) < (-delta / temperature).exp();
                if !accept {
                    continue;
                }
                if delta < 0.0 {
                    improving += 1;
                }
                accepted += 1;
                std::mem::swap(&mut current, &mut candidate);
                current_cost = candidate_cost;
                if current_cost < best_cost {
                    best.clone_from(&current);
                    best_cost = current_cost;
                }
            }

            run.history.push(best_cost);
            run.iterations += 1;
            temperature *= config.cooling_rate;
        }

        debug!(
            steps = run.iterations,
            moves, accepted, improving, temperature, best_cost, "annealing finished"
        );
        run.evaluations += moves;
        run.extra("final_temperature", temperature);
        run.extra("accepted_moves", accepted as f64);
        run.extra("improving_moves", improving as f64);
        problem.finish(Algorithm::SimulatedAnnealing, &best, run)
    }
}

impl RouteOptimizer for SimulatedAnnealingOptimizer {
    fn algorithm(&self) -> Algorithm {
        Algorithm::SimulatedAnnealing
    }

    fn optimize(&self, problem: &RoutingProblem<'_>) -> OptimizedRoute {
        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed.unwrap_or_else(rand::random));
        self.optimize_with_rng(problem, &mut rng)
    }
}
