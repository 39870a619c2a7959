//! route-optimizer
//!
//! Single-technician route optimization: order one technician's service jobs
//! for a day under a chosen objective, with nearest-neighbor, 2-opt, genetic
//! and simulated annealing strategies plus a benchmark harness to compare them.
//!
//! ```no_run
//! use route_optimizer::{
//!     Algorithm, Coordinate, HaversineMatrix, RouteOptimizationParameters, ServiceJob, Technician,
//! };
//!
//! let tech = Technician::new("tech-1", Coordinate::new(36.17, -115.14));
//! let jobs = vec![ServiceJob::new("job-1", Coordinate::new(36.11, -115.17))];
//! let params = RouteOptimizationParameters::new(tech, jobs);
//! let route = route_optimizer::optimize(&params, &HaversineMatrix::default(), Algorithm::TwoOpt)?;
//! println!("{} km", route.total_distance_km);
//! # Ok::<(), route_optimizer::OptimizeError>(())
//! ```

pub mod benchmark;
pub mod error;
pub mod feasibility;
pub mod haversine;
pub mod matrix;
pub mod model;
pub mod objective;
pub mod osrm;
pub mod problem;
pub mod route;
pub mod solver;
pub mod traits;

pub use benchmark::{AlgorithmStats, BenchmarkConfig, BenchmarkHarness, BenchmarkReport};
pub use error::OptimizeError;
pub use haversine::HaversineMatrix;
pub use matrix::DistanceMatrix;
pub use model::{
    CancellationToken, Coordinate, CostRates, Objective, RouteConstraint, RouteOptimizationParameters, ServiceJob,
    Technician, TimeWindow,
};
pub use objective::ObjectiveFunction;
pub use osrm::{OsrmClient, OsrmConfig};
pub use problem::RoutingProblem;
pub use route::{Algorithm, ExcludedJob, ExclusionReason, OptimizationMetrics, OptimizedRoute, RouteStop};
pub use solver::{
    optimize, AnnealingConfig, GeneticConfig, GeneticOptimizer, NearestNeighborOptimizer,
    SimulatedAnnealingOptimizer, TwoOptConfig, TwoOptOptimizer,
};
pub use traits::{DistanceMatrixProvider, RouteOptimizer, TravelMatrices};
