//! Genetic algorithm over job permutations.
//!
//! Tournament selection, order crossover, swap mutation and elitism. Fitness is
//! the inverse of route cost, so individuals are ranked by ascending cost.
//! Fitness evaluation of a generation runs on the rayon pool; each generation is
//! complete before the next one is bred.

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use tracing::debug;

use crate::error::OptimizeError;
use crate::objective::ObjectiveFunction;
use crate::problem::{RoutingProblem, RunStats};
use crate::route::{Algorithm, OptimizedRoute};
use crate::solver::nearest_neighbor::NearestNeighborOptimizer;
use crate::solver::operators;
use crate::traits::RouteOptimizer;

#[derive(Debug, Clone)]
pub struct GeneticConfig {
    pub population_size: usize,
    pub generations: usize,
    /// Probability an offspring gets a swap mutation.
    pub mutation_rate: f64,
    /// Probability offspring come from crossover rather than a parent copy.
    pub crossover_rate: f64,
    /// Best individuals copied unchanged into the next generation.
    pub elite_count: usize,
    pub tournament_size: usize,
    /// Seed the initial population with the nearest-neighbor route.
    pub inject_seed: bool,
    /// Evaluate fitness across the rayon thread pool.
    pub parallel: bool,
    /// Random seed for reproducibility.
    pub seed: Option<u64>,
}

impl Default for GeneticConfig {
    fn default() -> Self {
        Self {
            population_size: 50,
            generations: 100,
            mutation_rate: 0.02,
            crossover_rate: 0.8,
            elite_count: 5,
            tournament_size: 3,
            inject_seed: true,
            parallel: true,
            seed: None,
        }
    }
}

impl GeneticConfig {
    pub fn with_population_size(mut self, n: usize) -> Self {
        self.population_size = n;
        self
    }

    pub fn with_generations(mut self, n: usize) -> Self {
        self.generations = n;
        self
    }

    pub fn with_mutation_rate(mut self, rate: f64) -> Self {
        self.mutation_rate = rate;
        self
    }

    pub fn with_crossover_rate(mut self, rate: f64) -> Self {
        self.crossover_rate = rate;
        self
    }

    pub fn with_elite_count(mut self, n: usize) -> Self {
        self.elite_count = n;
        self
    }

    pub fn with_tournament_size(mut self, k: usize) -> Self {
        self.tournament_size = k;
        self
    }

    pub fn with_inject_seed(mut self, inject: bool) -> Self {
        self.inject_seed = inject;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<(), OptimizeError> {
        if self.population_size < 2 {
            return Err(OptimizeError::config("population_size", "must be at least 2"));
        }
        if self.generations == 0 {
            return Err(OptimizeError::config("generations", "must be at least 1"));
        }
        for (field, rate) in [("mutation_rate", self.mutation_rate), ("crossover_rate", self.crossover_rate)] {
            if !(0.0..=1.0).contains(&rate) {
                return Err(OptimizeError::config(field, format!("must be in [0, 1], got {rate}")));
            }
        }
        if self.elite_count >= self.population_size {
            return Err(OptimizeError::config(
                "elite_count",
                format!("must be below population_size ({})", self.population_size),
            ));
        }
        if self.tournament_size == 0 {
            return Err(OptimizeError::config("tournament_size", "must be at least 1"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Chromosome {
    order: Vec<usize>,
    cost: f64,
}

impl Chromosome {
    fn unevaluated(order: Vec<usize>) -> Self {
        Self {
            order,
            cost: f64::INFINITY,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct GeneticOptimizer {
    config: GeneticConfig,
}

impl GeneticOptimizer {
    pub fn new(config: GeneticConfig) -> Result<Self, OptimizeError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Wrap a config already known to be valid, such as a default with a seed.
    pub(crate) fn from_valid(config: GeneticConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GeneticConfig {
        &self.config
    }

    /// Run with a caller-supplied random source.
    pub fn optimize_with_rng<R: Rng + ?Sized>(&self, problem: &RoutingProblem<'_>, rng: &mut R) -> OptimizedRoute {
        let config = &self.config;
        let mut run = RunStats::start();
        let objective = problem.objective();
        let seed = NearestNeighborOptimizer.construct(problem);
        run.evaluations = seed.evaluations;
        run.extra("seed_cost", seed.cost);

        let n = problem.job_count();
        if n < 2 || seed.cancelled {
            run.initial_cost = seed.cost;
            run.history.push(seed.cost);
            run.terminated_early = seed.cancelled;
            return problem.finish(Algorithm::Genetic, &seed.order, run);
        }

        let mut population = self.initial_population(&seed.order, rng);
        self.evaluate(&objective, &mut population);
        run.evaluations += population.len();

        let mut best = fittest(&population).clone();
        let mut best_generation = 0;
        run.initial_cost = best.cost;
        run.history.push(best.cost);

        for generation in 1..=config.generations {
            if problem.is_cancelled() {
                run.terminated_early = true;
                break;
            }

            population.sort_by(|a, b| a.cost.total_cmp(&b.cost));
            let mut next: Vec<Chromosome> = population[..config.elite_count].to_vec();

            while next.len() < config.population_size {
                let parent_a = &population[self.tournament(&population, rng)];
                let parent_b = &population[self.tournament(&population, rng)];
                let mut child = if rng.gen_bool(config.crossover_rate) {
                    operators::order_crossover(&parent_a.order, &parent_b.order, rng)
                } else {
                    parent_a.order.clone()
                };
                if rng.gen_bool(config.mutation_rate) {
                    operators::swap(&mut child, rng);
                }
                next.push(Chromosome::unevaluated(child));
            }

            self.evaluate(&objective, &mut next[config.elite_count..]);
            run.evaluations += config.population_size - config.elite_count;
            population = next;

            let generation_best = fittest(&population);
            if generation_best.cost < best.cost {
                best = generation_best.clone();
                best_generation = generation;
            }
            run.history.push(best.cost);
            run.iterations = generation;
            debug!(generation, best_cost = best.cost, "generation complete");
        }

        run.extra("best_generation", best_generation as f64);
        run.extra("population_size", config.population_size as f64);
        problem.finish(Algorithm::Genetic, &best.order, run)
    }

    /// The nearest-neighbor route as one individual (when injected), random
    /// permutations for the rest.
    fn initial_population<R: Rng + ?Sized>(&self, seed: &[usize], rng: &mut R) -> Vec<Chromosome> {
        let config = &self.config;
        let mut population = Vec::with_capacity(config.population_size);
        if config.inject_seed {
            population.push(Chromosome::unevaluated(seed.to_vec()));
        }
        while population.len() < config.population_size {
            let mut order = seed.to_vec();
            order.shuffle(rng);
            population.push(Chromosome::unevaluated(order));
        }
        population
    }

    fn evaluate(&self, objective: &ObjectiveFunction<'_>, population: &mut [Chromosome]) {
        if self.config.parallel {
            population
                .par_iter_mut()
                .for_each(|individual| individual.cost = objective.cost(&individual.order));
        } else {
            for individual in population.iter_mut() {
                individual.cost = objective.cost(&individual.order);
            }
        }
    }

    /// Sample `tournament_size` individuals uniformly and return the fittest.
    fn tournament<R: Rng + ?Sized>(&self, population: &[Chromosome], rng: &mut R) -> usize {
        let n = population.len();
        let mut best = rng.gen_range(0..n);
        for _ in 1..self.config.tournament_size {
            let candidate = rng.gen_range(0..n);
            if population[candidate].cost < population[best].cost {
                best = candidate;
            }
        }
        best
    }
}

/// Lowest-cost individual; the first one wins ties. `population` is non-empty.
fn fittest(population: &[Chromosome]) -> &Chromosome {
    let mut best = &population[0];
    for candidate in &population[1..] {
        if candidate.cost < best.cost {
            best = candidate;
        }
    }
    best
}

impl RouteOptimizer for GeneticOptimizer {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Genetic
    }

    fn optimize(&self, problem: &RoutingProblem<'_>) -> OptimizedRoute {
        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed.unwrap_or_else(rand::random));
        self.optimize_with_rng(problem, &mut rng)
    }
}
