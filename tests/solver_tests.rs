//! Comprehensive solver tests
//!
//! Skills, revenue, time windows, constraints, cancellation and the
//! invariants every optimizer shares.

mod fixtures;

use std::collections::HashSet;
use std::thread;
use std::time::Duration;

use rstest::rstest;

use fixtures::{at, hours, job, minutes, technician, FailingMatrix, ManhattanMatrix};
use route_optimizer::model::{
    Objective, RouteConstraint, RouteOptimizationParameters, ServiceJob, TimeWindow,
};
use route_optimizer::problem::RoutingProblem;
use route_optimizer::route::{Algorithm, ExclusionReason, OptimizedRoute};
use route_optimizer::solver::{
    optimize, AnnealingConfig, GeneticConfig, GeneticOptimizer, NearestNeighborOptimizer,
    SimulatedAnnealingOptimizer, TwoOptOptimizer,
};
use route_optimizer::traits::RouteOptimizer;
use route_optimizer::OptimizeError;

// ============================================================================
// Helper Functions
// ============================================================================

fn run(params: &RouteOptimizationParameters, algorithm: Algorithm) -> OptimizedRoute {
    let problem = RoutingProblem::prepare(params, &ManhattanMatrix).expect("prepare");
    algorithm.optimizer(Some(7)).optimize(&problem)
}

fn assert_visits_each_once(route: &OptimizedRoute, expected: usize) {
    let ids: HashSet<&str> = route.job_ids().into_iter().collect();
    assert_eq!(route.stops.len(), expected, "wrong stop count: {:?}", route.job_ids());
    assert_eq!(ids.len(), expected, "duplicate stops: {:?}", route.job_ids());
}

/// Twelve jobs scattered around the origin in no particular order.
fn scattered_jobs() -> Vec<ServiceJob> {
    vec![
        job("j1", 3.0, 1.0),
        job("j2", -2.0, 4.0),
        job("j3", 5.0, -3.0),
        job("j4", 1.0, 1.0),
        job("j5", -4.0, -1.0),
        job("j6", 2.0, 6.0),
        job("j7", 6.0, 2.0),
        job("j8", -1.0, -5.0),
        job("j9", 0.5, 3.5),
        job("j10", -3.0, 2.0),
        job("j11", 4.0, 4.0),
        job("j12", -5.0, -4.0),
    ]
}

fn scattered() -> RouteOptimizationParameters {
    RouteOptimizationParameters::new(technician("alice"), scattered_jobs()).with_end_location(at(0.0, 0.0))
}

fn nn_cost(params: &RouteOptimizationParameters) -> f64 {
    run(params, Algorithm::NearestNeighbor).cost()
}

// ============================================================================
// Skill Tests
// ============================================================================

#[rstest]
#[case::nearest_neighbor(Algorithm::NearestNeighbor)]
#[case::two_opt(Algorithm::TwoOpt)]
#[case::genetic(Algorithm::Genetic)]
#[case::annealing(Algorithm::SimulatedAnnealing)]
fn test_skill_filter_keeps_only_qualified_jobs(#[case] algorithm: Algorithm) {
    let tech = technician("alice").with_skill("A");
    let jobs = vec![
        job("needs-a", 1.0, 0.0).with_skill("A"),
        job("needs-b", 2.0, 0.0).with_skill("B"),
    ];
    let params = RouteOptimizationParameters::new(tech, jobs);

    let route = run(&params, algorithm);

    assert_eq!(route.job_ids(), vec!["needs-a"]);
    assert_eq!(route.metrics.excluded_count(), 1);
    let excluded = &route.metrics.excluded_jobs[0];
    assert_eq!(excluded.job_id, "needs-b");
    assert_eq!(
        excluded.reason,
        ExclusionReason::MissingSkills {
            missing: vec!["B".to_string()]
        }
    );
    assert!(route.metrics.warnings.iter().any(|w| w.contains("needs-b")));
}

#[test]
fn test_skill_validation_can_be_disabled() {
    let jobs = vec![job("needs-b", 2.0, 0.0).with_skill("B")];
    let params = RouteOptimizationParameters::new(technician("alice"), jobs).with_validate_skills(false);

    let route = run(&params, Algorithm::NearestNeighbor);
    assert_eq!(route.job_ids(), vec!["needs-b"]);
    assert_eq!(route.metrics.excluded_count(), 0);
}

// ============================================================================
// Revenue Tests
// ============================================================================

fn revenue_jobs() -> Vec<ServiceJob> {
    vec![
        job("small", 1.0, 0.0).with_revenue(1000.0),
        job("medium", 0.0, 1.0).with_revenue(3000.0),
        job("big", 5.0, 5.0).with_revenue(5000.0),
    ]
}

#[rstest]
#[case::nearest_neighbor(Algorithm::NearestNeighbor)]
#[case::two_opt(Algorithm::TwoOpt)]
#[case::genetic(Algorithm::Genetic)]
#[case::annealing(Algorithm::SimulatedAnnealing)]
fn test_revenue_keeps_high_value_job_under_stop_limit(#[case] algorithm: Algorithm) {
    let params = RouteOptimizationParameters::new(technician("alice"), revenue_jobs())
        .with_objective(Objective::MaximizeRevenue)
        .with_constraint(RouteConstraint::MaxStops(2));

    let route = run(&params, algorithm);

    let ids = route.job_ids();
    assert!(ids.contains(&"big"), "5000 job dropped: {ids:?}");
    assert!(ids.contains(&"medium"));
    assert_eq!(route.metrics.excluded_jobs[0].job_id, "small");
    assert_eq!(route.metrics.excluded_jobs[0].reason, ExclusionReason::ExceedsStopLimit);
}

#[rstest]
#[case::nearest_neighbor(Algorithm::NearestNeighbor)]
#[case::two_opt(Algorithm::TwoOpt)]
#[case::genetic(Algorithm::Genetic)]
#[case::annealing(Algorithm::SimulatedAnnealing)]
fn test_revenue_serves_high_value_window_first(#[case] algorithm: Algorithm) {
    // The big job is only on time when visited first.
    let mut jobs = revenue_jobs();
    jobs[2] = jobs[2].clone().with_time_window(TimeWindow::new(hours(8), hours(8) + minutes(30)));
    let params = RouteOptimizationParameters::new(technician("alice"), jobs)
        .with_objective(Objective::MaximizeRevenue)
        .with_respect_time_windows(true);

    let route = run(&params, algorithm);

    assert_eq!(route.stops[0].job_id, "big");
    assert_eq!(route.stops[0].arrival, hours(8) + minutes(10));
    assert_visits_each_once(&route, 3);
    assert!(route.cost() < -8000.0, "revenue not served: {}", route.cost());
}

#[test]
fn test_nearest_neighbor_goes_for_revenue_first() {
    let params = RouteOptimizationParameters::new(technician("alice"), revenue_jobs())
        .with_objective(Objective::MaximizeRevenue);
    let route = run(&params, Algorithm::NearestNeighbor);
    assert_eq!(route.stops[0].job_id, "big");
}

// ============================================================================
// Time Window Tests
// ============================================================================

#[test]
fn test_unreachable_window_is_excluded() {
    let jobs = vec![
        job("easy", 1.0, 0.0),
        job("too-far", 10.0, 0.0).with_time_window(TimeWindow::new(hours(8), hours(8) + minutes(5))),
    ];
    let params = RouteOptimizationParameters::new(technician("alice"), jobs).with_respect_time_windows(true);

    let route = run(&params, Algorithm::TwoOpt);

    assert_eq!(route.job_ids(), vec!["easy"]);
    assert_eq!(route.metrics.excluded_jobs[0].reason, ExclusionReason::UnreachableTimeWindow);
}

#[test]
fn test_windows_ignored_unless_requested() {
    let jobs = vec![job("too-far", 10.0, 0.0).with_time_window(TimeWindow::new(hours(8), hours(8) + minutes(5)))];
    let params = RouteOptimizationParameters::new(technician("alice"), jobs);

    let route = run(&params, Algorithm::NearestNeighbor);
    assert_eq!(route.job_ids(), vec!["too-far"]);
}

#[test]
fn test_job_past_working_hours_is_excluded() {
    let tech = technician("alice").with_working_hours(TimeWindow::hours(8, 9));
    let jobs = vec![
        job("quick", 1.0, 0.0),
        job("long", 2.0, 0.0).with_duration_minutes(90),
    ];
    let params = RouteOptimizationParameters::new(tech, jobs).with_respect_time_windows(true);

    let route = run(&params, Algorithm::NearestNeighbor);

    assert_eq!(route.job_ids(), vec!["quick"]);
    assert_eq!(route.metrics.excluded_jobs[0].reason, ExclusionReason::OutsideWorkingHours);
}

#[test]
fn test_waits_for_window_to_open() {
    let jobs = vec![job("later", 1.0, 0.0).with_time_window(TimeWindow::hours(10, 12))];
    let params = RouteOptimizationParameters::new(technician("alice"), jobs).with_respect_time_windows(true);

    let route = run(&params, Algorithm::NearestNeighbor);
    let stop = &route.stops[0];

    assert_eq!(stop.arrival, hours(8) + minutes(1));
    assert_eq!(stop.service_start, hours(10));
    assert_eq!(stop.departure, hours(10) + minutes(30));
}

#[rstest]
#[case::nearest_neighbor(Algorithm::NearestNeighbor)]
#[case::two_opt(Algorithm::TwoOpt)]
#[case::genetic(Algorithm::Genetic)]
#[case::annealing(Algorithm::SimulatedAnnealing)]
fn test_window_closed_by_earlier_service_is_excluded(#[case] algorithm: Algorithm) {
    // Each job alone is reachable by 08:20, but not after 30 minutes at the other.
    let window = TimeWindow::new(hours(8), hours(8) + minutes(20));
    let jobs = vec![
        job("a", 1.0, 0.0).with_time_window(window),
        job("b", 1.0, 0.5).with_time_window(window),
    ];
    let params = RouteOptimizationParameters::new(technician("alice"), jobs).with_respect_time_windows(true);

    let route = run(&params, algorithm);

    assert_eq!(route.job_ids(), vec!["a"]);
    assert_eq!(route.metrics.excluded_count(), 1);
    assert_eq!(route.metrics.excluded_jobs[0].job_id, "b");
    assert_eq!(route.metrics.excluded_jobs[0].reason, ExclusionReason::UnreachableTimeWindow);
    assert!(route.stops.iter().all(|stop| stop.service_start <= hours(8) + minutes(20)));
}

#[test]
fn test_window_outside_working_hours_is_rejected() {
    let params = RouteOptimizationParameters::new(technician("alice"), scattered_jobs())
        .with_window(TimeWindow::hours(18, 20));

    let err = RoutingProblem::prepare(&params, &ManhattanMatrix).unwrap_err();
    assert!(matches!(err, OptimizeError::NoWorkingHours { .. }), "{err}");
}

// ============================================================================
// Route Shape Tests
// ============================================================================

#[test]
fn test_stop_schedule_and_totals() {
    let jobs = vec![job("a", 1.0, 0.0), job("b", 3.0, 0.0)];
    let params = RouteOptimizationParameters::new(technician("alice"), jobs).with_end_location(at(0.0, 0.0));

    let route = run(&params, Algorithm::NearestNeighbor);

    assert_eq!(route.job_ids(), vec!["a", "b"]);
    assert_eq!(route.stops[0].arrival, hours(8) + minutes(1));
    assert_eq!(route.stops[0].departure, hours(8) + minutes(31));
    assert_eq!(route.stops[1].arrival, hours(8) + minutes(33));
    assert!((route.total_distance_km - 6.0).abs() < 1e-9);
    // 6 minutes of driving, 60 of service.
    assert_eq!(route.total_duration.as_secs(), 66 * 60);
    assert!((route.stops[1].distance_from_previous_km - 2.0).abs() < 1e-9);
}

#[test]
fn test_stops_report_caller_positions() {
    let tech = technician("alice").with_skill("A");
    let jobs = vec![
        job("skip", 1.0, 0.0).with_skill("B"),
        job("keep", 2.0, 0.0),
    ];
    let params = RouteOptimizationParameters::new(tech, jobs);

    let route = run(&params, Algorithm::NearestNeighbor);
    assert_eq!(route.stops[0].job_index, 1);
}

#[test]
fn test_distance_cap_is_penalised() {
    let jobs = vec![job("near", 1.0, 0.0), job("far", 8.0, 0.0)];
    let capped = RouteOptimizationParameters::new(technician("alice"), jobs.clone())
        .with_constraint(RouteConstraint::MaxDistanceKm(5.0));
    let free = RouteOptimizationParameters::new(technician("alice"), jobs);

    let over = run(&capped, Algorithm::TwoOpt);
    let plain = run(&free, Algorithm::TwoOpt);

    assert!((plain.cost() - 8.0).abs() < 1e-9);
    assert!((over.cost() - (8.0 + 3.0 * 100.0)).abs() < 1e-9);
}

#[test]
fn test_stop_limit_keeps_input_order_without_revenue() {
    let jobs = vec![job("first", 5.0, 0.0), job("second", 1.0, 0.0), job("third", 2.0, 0.0)];
    let params = RouteOptimizationParameters::new(technician("alice"), jobs).with_constraint(RouteConstraint::MaxStops(2));

    let route = run(&params, Algorithm::NearestNeighbor);

    assert_eq!(route.job_ids(), vec!["second", "first"]);
    assert_eq!(route.metrics.excluded_jobs[0].job_id, "third");
}

// ============================================================================
// Empty Input Tests
// ============================================================================

#[rstest]
#[case::nearest_neighbor(Algorithm::NearestNeighbor)]
#[case::two_opt(Algorithm::TwoOpt)]
#[case::genetic(Algorithm::Genetic)]
#[case::annealing(Algorithm::SimulatedAnnealing)]
fn test_no_jobs_gives_empty_route(#[case] algorithm: Algorithm) {
    let params = RouteOptimizationParameters::new(technician("alice"), Vec::new()).with_end_location(at(3.0, 3.0));

    let route = run(&params, algorithm);

    assert!(route.is_empty());
    assert_eq!(route.cost(), 0.0);
    assert_eq!(route.total_distance_km, 0.0);
    assert_eq!(route.total_duration.as_secs(), 0);
    assert!(!route.metrics.terminated_early);
}

#[test]
fn test_all_jobs_excluded_gives_empty_route() {
    let jobs = vec![job("b", 1.0, 0.0).with_skill("B"), job("c", 2.0, 0.0).with_skill("C")];
    let params = RouteOptimizationParameters::new(technician("alice"), jobs);

    let route = run(&params, Algorithm::Genetic);

    assert!(route.is_empty());
    assert_eq!(route.cost(), 0.0);
    assert_eq!(route.metrics.excluded_count(), 2);
}

// ============================================================================
// Cancellation Tests
// ============================================================================

#[rstest]
#[case::nearest_neighbor(Algorithm::NearestNeighbor)]
#[case::two_opt(Algorithm::TwoOpt)]
#[case::genetic(Algorithm::Genetic)]
#[case::annealing(Algorithm::SimulatedAnnealing)]
fn test_cancelled_before_start_still_returns_route(#[case] algorithm: Algorithm) {
    let params = scattered();
    params.cancellation.cancel();

    let route = run(&params, algorithm);

    assert!(route.metrics.terminated_early);
    assert_visits_each_once(&route, 12);
    assert!(route.metrics.warnings.iter().any(|w| w.contains("cancelled")));
}

/// `count` jobs on a 60 km square from a fixed linear congruential sequence.
fn many_jobs(count: usize) -> Vec<ServiceJob> {
    let mut state: u64 = 0x2545_f491;
    let mut next = move || {
        state = state.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1_442_695_040_888_963_407);
        ((state >> 33) as f64 / f64::from(1u32 << 31)) * 60.0 - 30.0
    };
    (0..count)
        .map(|i| job(&format!("m{i}"), next(), next()).with_duration_minutes(0))
        .collect()
}

/// Run `optimizer` while another thread cancels the token after `delay`.
fn run_cancelled_after(
    params: &RouteOptimizationParameters,
    optimizer: &dyn RouteOptimizer,
    delay: Duration,
) -> OptimizedRoute {
    let problem = RoutingProblem::prepare(params, &ManhattanMatrix).expect("prepare");
    let token = params.cancellation.clone();
    thread::scope(|scope| {
        scope.spawn(move || {
            thread::sleep(delay);
            token.cancel();
        });
        optimizer.optimize(&problem)
    })
}

fn assert_cancelled_mid_run(route: &OptimizedRoute, jobs: usize) {
    assert!(route.metrics.terminated_early);
    assert_visits_each_once(route, jobs);
    assert!(
        route.metrics.final_cost <= route.metrics.initial_cost + 1e-9,
        "{} > {}",
        route.metrics.final_cost,
        route.metrics.initial_cost
    );
    assert!(route.metrics.warnings.iter().any(|w| w.contains("cancelled")));
}

#[test]
fn test_genetic_cancelled_between_generations() {
    let params = RouteOptimizationParameters::new(technician("alice"), many_jobs(60));
    // Only cancellation can end this run.
    let optimizer = GeneticOptimizer::new(
        GeneticConfig::default()
            .with_generations(usize::MAX)
            .with_seed(11),
    )
    .unwrap();

    let route = run_cancelled_after(&params, &optimizer, Duration::from_millis(50));

    assert_cancelled_mid_run(&route, 60);
    assert!(route.iterations > 0, "no generation finished before cancellation");
}

#[test]
fn test_annealing_cancelled_between_batches() {
    let params = RouteOptimizationParameters::new(technician("alice"), many_jobs(60));
    let optimizer = SimulatedAnnealingOptimizer::new(
        AnnealingConfig::default()
            .with_initial_temperature(1.0e6)
            .with_min_temperature(1.0e-6)
            .with_cooling_rate(0.999_999)
            .with_seed(11),
    )
    .unwrap();

    let route = run_cancelled_after(&params, &optimizer, Duration::from_millis(50));

    assert_cancelled_mid_run(&route, 60);
    assert!(route.iterations > 0, "no batch finished before cancellation");
}

#[test]
fn test_two_opt_cancelled_between_passes() {
    // Priced by time so every candidate is a full schedule walk; passes are slow.
    let params =
        RouteOptimizationParameters::new(technician("alice"), many_jobs(400)).with_objective(Objective::MinimizeTime);

    let route = run_cancelled_after(&params, &TwoOptOptimizer::default(), Duration::from_millis(10));

    assert_cancelled_mid_run(&route, 400);
}

// ============================================================================
// Invariant Tests
// ============================================================================

#[rstest]
#[case::nearest_neighbor(Algorithm::NearestNeighbor)]
#[case::two_opt(Algorithm::TwoOpt)]
#[case::genetic(Algorithm::Genetic)]
#[case::annealing(Algorithm::SimulatedAnnealing)]
fn test_every_job_visited_once(#[case] algorithm: Algorithm) {
    let route = run(&scattered(), algorithm);
    assert_visits_each_once(&route, 12);
    assert_eq!(route.algorithm, algorithm);
    assert!(!route.is_optimal);
}

#[test]
fn test_nearest_neighbor_is_deterministic() {
    let params = scattered();
    let problem = RoutingProblem::prepare(&params, &ManhattanMatrix).unwrap();
    let first = NearestNeighborOptimizer.optimize(&problem);
    let second = NearestNeighborOptimizer.optimize(&problem);
    assert_eq!(first.job_ids(), second.job_ids());
    assert_eq!(first.cost(), second.cost());
}

#[test]
fn test_two_opt_never_worse_than_nearest_neighbor() {
    let params = scattered();
    let problem = RoutingProblem::prepare(&params, &ManhattanMatrix).unwrap();
    let seed = NearestNeighborOptimizer.optimize(&problem);
    let improved = TwoOptOptimizer::default().optimize(&problem);
    assert!(improved.cost() <= seed.cost() + 1e-9);
    assert_eq!(improved.metrics.initial_cost, seed.cost());
}

#[test]
fn test_stochastic_optimizers_reproducible_with_seed() {
    let params = scattered();
    let problem = RoutingProblem::prepare(&params, &ManhattanMatrix).unwrap();

    let genetic = GeneticOptimizer::new(GeneticConfig::default().with_seed(11)).unwrap();
    assert_eq!(genetic.optimize(&problem).job_ids(), genetic.optimize(&problem).job_ids());

    let annealing = SimulatedAnnealingOptimizer::new(
        AnnealingConfig::default()
            .with_initial_temperature(50.0)
            .with_seed(11),
    )
    .unwrap();
    assert_eq!(annealing.optimize(&problem).job_ids(), annealing.optimize(&problem).job_ids());
}

#[rstest]
#[case::genetic(Algorithm::Genetic)]
#[case::annealing(Algorithm::SimulatedAnnealing)]
fn test_unseeded_runs_stay_near_nearest_neighbor(#[case] algorithm: Algorithm) {
    let params = scattered();
    let bound = nn_cost(&params) * 1.1;
    let problem = RoutingProblem::prepare(&params, &ManhattanMatrix).unwrap();

    for _ in 0..5 {
        let route = algorithm.optimizer(None).optimize(&problem);
        assert!(route.cost() <= bound, "{algorithm}: {} > {bound}", route.cost());
    }
}

#[rstest]
#[case::distance(Objective::MinimizeDistance)]
#[case::time(Objective::MinimizeTime)]
#[case::cost(Objective::MinimizeCost)]
fn test_improvers_respect_every_objective(#[case] objective: Objective) {
    let params = scattered().with_objective(objective);
    let seed = nn_cost(&params);
    for algorithm in [Algorithm::TwoOpt, Algorithm::Genetic, Algorithm::SimulatedAnnealing] {
        let route = run(&params, algorithm);
        assert!(route.cost() <= seed + 1e-9, "{algorithm} regressed under {objective:?}");
    }
}

#[test]
fn test_cost_history_ends_at_final_cost() {
    let route = run(&scattered(), Algorithm::Genetic);
    let last = route.metrics.cost_history.last().unwrap();
    assert!((last - route.cost()).abs() < 1e-9);
    assert!(route.metrics.evaluations > 0);
}

// ============================================================================
// Error Tests
// ============================================================================

#[test]
fn test_provider_failure_is_fatal() {
    let params = scattered();
    let err = optimize(&params, &FailingMatrix, Algorithm::NearestNeighbor).unwrap_err();
    assert!(matches!(err, OptimizeError::Provider { .. }));
}

#[test]
fn test_negative_duration_rejected() {
    let jobs = vec![job("bad", 1.0, 0.0).with_duration_minutes(-5)];
    let params = RouteOptimizationParameters::new(technician("alice"), jobs);
    let err = optimize(&params, &ManhattanMatrix, Algorithm::TwoOpt).unwrap_err();
    assert!(matches!(err, OptimizeError::NegativeDuration { job_id } if job_id == "bad"));
}

#[test]
fn test_technician_without_hours_rejected() {
    let tech = technician("alice").with_working_hours(TimeWindow::hours(9, 9));
    let params = RouteOptimizationParameters::new(tech, scattered_jobs());
    let err = optimize(&params, &ManhattanMatrix, Algorithm::TwoOpt).unwrap_err();
    assert!(matches!(err, OptimizeError::NoWorkingHours { .. }));
}

#[test]
fn test_duplicate_job_ids_rejected() {
    let jobs = vec![job("dup", 1.0, 0.0), job("dup", 2.0, 0.0)];
    let params = RouteOptimizationParameters::new(technician("alice"), jobs);
    let err = optimize(&params, &ManhattanMatrix, Algorithm::NearestNeighbor).unwrap_err();
    assert!(matches!(err, OptimizeError::DuplicateJob { .. }));
}
