mod fixtures;

use fixtures::las_vegas_locations::{sample_jobs, DEPOTS};
use route_optimizer::haversine::HaversineMatrix;
use route_optimizer::model::{RouteOptimizationParameters, Technician};
use route_optimizer::route::Algorithm;
use route_optimizer::solver::optimize;

fn params() -> RouteOptimizationParameters {
    let tech = Technician::new("smoke", DEPOTS[0].location);
    RouteOptimizationParameters::new(tech, sample_jobs(8))
}

#[test]
fn optimize_routes_every_job_with_each_algorithm() {
    let params = params();
    for algorithm in Algorithm::ALL {
        let route = optimize(&params, &HaversineMatrix::default(), algorithm).expect("optimize");
        assert_eq!(route.stops.len(), 8, "{algorithm} dropped jobs");
        assert_eq!(route.technician_id, "smoke");
        assert!(route.total_distance_km > 0.0);
        assert_eq!(route.algorithm, algorithm);
    }
}

#[test]
fn optimize_single_job() {
    let tech = Technician::new("smoke", DEPOTS[0].location);
    let params = RouteOptimizationParameters::new(tech, sample_jobs(1));
    let route = optimize(&params, &HaversineMatrix::default(), Algorithm::SimulatedAnnealing).expect("optimize");
    assert_eq!(route.stops.len(), 1);
    assert_eq!(route.stops[0].job_index, 0);
}
