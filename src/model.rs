//! Input records consumed by the optimizers.
//!
//! Everything here is read-only from the optimizers' point of view. Surrounding
//! layers own persistence and build these values per optimization call.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};

use crate::error::OptimizeError;
use crate::haversine;

/// A geographic point (degrees).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Great-circle distance to `other` in kilometres.
    pub fn haversine_km(&self, other: &Coordinate) -> f64 {
        haversine::haversine_km(*self, *other)
    }

    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    fn validate(&self) -> Result<(), OptimizeError> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(OptimizeError::InvalidCoordinate {
                latitude: self.latitude,
                longitude: self.longitude,
            })
        }
    }
}

/// A window of time of day, in seconds since midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: i32,
    pub end: i32,
}

impl TimeWindow {
    pub const fn new(start: i32, end: i32) -> Self {
        Self { start, end }
    }

    /// Window given in whole hours, e.g. `TimeWindow::hours(8, 17)`.
    pub const fn hours(start: i32, end: i32) -> Self {
        Self::new(start * 3600, end * 3600)
    }

    pub const fn contains(&self, time: i32) -> bool {
        self.start <= time && time <= self.end
    }

    fn validate(&self, context: &str, allow_empty: bool) -> Result<(), OptimizeError> {
        let ok = if allow_empty {
            self.end >= self.start
        } else {
            self.end > self.start
        };
        if ok {
            Ok(())
        } else {
            Err(OptimizeError::InvalidTimeWindow {
                context: context.to_string(),
                start: self.start,
                end: self.end,
            })
        }
    }
}

/// A service job as seen by the optimizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceJob {
    pub id: String,
    pub location: Coordinate,
    #[serde(default)]
    pub required_skills: Vec<String>,
    /// Estimated on-site duration in minutes.
    pub estimated_duration_minutes: i32,
    #[serde(default)]
    pub time_window: Option<TimeWindow>,
    /// Monetary value earned when the job is served.
    #[serde(default)]
    pub revenue: f64,
}

impl ServiceJob {
    pub fn new(id: impl Into<String>, location: Coordinate) -> Self {
        Self {
            id: id.into(),
            location,
            required_skills: Vec::new(),
            estimated_duration_minutes: 30,
            time_window: None,
            revenue: 0.0,
        }
    }

    pub fn with_skill(mut self, skill: impl Into<String>) -> Self {
        self.required_skills.push(skill.into());
        self
    }

    pub fn with_duration_minutes(mut self, minutes: i32) -> Self {
        self.estimated_duration_minutes = minutes;
        self
    }

    pub fn with_time_window(mut self, window: TimeWindow) -> Self {
        self.time_window = Some(window);
        self
    }

    pub fn with_revenue(mut self, revenue: f64) -> Self {
        self.revenue = revenue;
        self
    }

    /// Service duration in seconds.
    pub fn service_seconds(&self) -> f64 {
        f64::from(self.estimated_duration_minutes) * 60.0
    }
}

/// The technician whose day is being routed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Technician {
    pub id: String,
    #[serde(default)]
    pub skills: Vec<String>,
    pub working_hours: TimeWindow,
    pub home_location: Coordinate,
}

impl Technician {
    /// A technician working 08:00-17:00 from `home_location`.
    pub fn new(id: impl Into<String>, home_location: Coordinate) -> Self {
        Self {
            id: id.into(),
            skills: Vec::new(),
            working_hours: TimeWindow::hours(8, 17),
            home_location,
        }
    }

    pub fn with_skill(mut self, skill: impl Into<String>) -> Self {
        self.skills.push(skill.into());
        self
    }

    pub fn with_working_hours(mut self, window: TimeWindow) -> Self {
        self.working_hours = window;
        self
    }

    /// Skills the job requires that this technician lacks.
    pub fn missing_skills(&self, job: &ServiceJob) -> Vec<String> {
        job.required_skills
            .iter()
            .filter(|skill| !self.skills.contains(skill))
            .cloned()
            .collect()
    }
}

/// What the optimizer minimizes (or maximizes, for revenue).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Objective {
    #[default]
    MinimizeDistance,
    MinimizeTime,
    MinimizeCost,
    MaximizeRevenue,
}

/// Rates and weights used by the objective function.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostRates {
    /// Travel cost per kilometre.
    pub cost_per_km: f64,
    /// Labor cost per hour on the road or on site.
    pub labor_cost_per_hour: f64,
    /// Multiplier on travel cost when it is subtracted from revenue.
    ///
    /// `MaximizeRevenue` minimizes
    /// `-(served revenue) + revenue_travel_weight * cost_per_km * km`.
    /// A weight of 0 ignores travel entirely; larger values make the optimizer
    /// trade revenue for shorter routes.
    pub revenue_travel_weight: f64,
    /// Penalty per minute a job starts after its window (or the day ends late).
    pub lateness_penalty_per_minute: f64,
    /// Penalty per unit (km or minute) a soft route constraint is exceeded.
    pub constraint_penalty: f64,
}

impl Default for CostRates {
    fn default() -> Self {
        Self {
            cost_per_km: 0.65,
            labor_cost_per_hour: 45.0,
            revenue_travel_weight: 1.0,
            lateness_penalty_per_minute: 10.0,
            constraint_penalty: 100.0,
        }
    }
}

impl CostRates {
    pub fn validate(&self) -> Result<(), OptimizeError> {
        let fields = [
            ("cost_per_km", self.cost_per_km),
            ("labor_cost_per_hour", self.labor_cost_per_hour),
            ("revenue_travel_weight", self.revenue_travel_weight),
            ("lateness_penalty_per_minute", self.lateness_penalty_per_minute),
            ("constraint_penalty", self.constraint_penalty),
        ];
        for (field, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(OptimizeError::config(
                    field,
                    format!("must be a non-negative number, got {value}"),
                ));
            }
        }
        Ok(())
    }
}

/// Extra route-level constraints.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RouteConstraint {
    /// Visit at most this many jobs; the rest are excluded by the filter.
    MaxStops(usize),
    /// Soft cap on total route distance.
    MaxDistanceKm(f64),
    /// Soft cap on total route duration.
    MaxDurationMinutes(f64),
}

/// Cooperative cancellation flag shared between a caller and a running optimizer.
///
/// Optimizers poll it between iterations or generations and return the best
/// route found so far once it is set.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Full input contract for one optimization call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteOptimizationParameters {
    pub jobs: Vec<ServiceJob>,
    pub technician: Technician,
    pub start_location: Coordinate,
    #[serde(default)]
    pub end_location: Option<Coordinate>,
    /// Part of the day the route may use.
    pub window: TimeWindow,
    #[serde(default)]
    pub objective: Objective,
    #[serde(default)]
    pub validate_skills: bool,
    #[serde(default)]
    pub respect_time_windows: bool,
    #[serde(default)]
    pub constraints: Vec<RouteConstraint>,
    #[serde(default)]
    pub cost_rates: CostRates,
    #[serde(skip)]
    pub cancellation: CancellationToken,
}

impl RouteOptimizationParameters {
    /// Parameters starting at the technician's home, over their working hours.
    pub fn new(technician: Technician, jobs: Vec<ServiceJob>) -> Self {
        Self {
            start_location: technician.home_location,
            window: technician.working_hours,
            jobs,
            technician,
            end_location: None,
            objective: Objective::default(),
            validate_skills: true,
            respect_time_windows: false,
            constraints: Vec::new(),
            cost_rates: CostRates::default(),
            cancellation: CancellationToken::new(),
        }
    }

    pub fn with_objective(mut self, objective: Objective) -> Self {
        self.objective = objective;
        self
    }

    pub fn with_start_location(mut self, location: Coordinate) -> Self {
        self.start_location = location;
        self
    }

    pub fn with_end_location(mut self, location: Coordinate) -> Self {
        self.end_location = Some(location);
        self
    }

    pub fn with_window(mut self, window: TimeWindow) -> Self {
        self.window = window;
        self
    }

    pub fn with_validate_skills(mut self, validate: bool) -> Self {
        self.validate_skills = validate;
        self
    }

    pub fn with_respect_time_windows(mut self, respect: bool) -> Self {
        self.respect_time_windows = respect;
        self
    }

    pub fn with_constraint(mut self, constraint: RouteConstraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    pub fn with_cost_rates(mut self, rates: CostRates) -> Self {
        self.cost_rates = rates;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Moment the technician leaves the start location.
    pub fn day_start(&self) -> i32 {
        self.window.start.max(self.technician.working_hours.start)
    }

    /// Latest moment the technician may still be working.
    pub fn day_end(&self) -> i32 {
        self.window.end.min(self.technician.working_hours.end)
    }

    pub fn max_stops(&self) -> Option<usize> {
        self.constraints
            .iter()
            .filter_map(|constraint| match constraint {
                RouteConstraint::MaxStops(n) => Some(*n),
                _ => None,
            })
            .min()
    }

    /// Rejects parameters no optimizer should run on.
    pub fn validate(&self) -> Result<(), OptimizeError> {
        let technician = &self.technician;
        if technician.working_hours.end <= technician.working_hours.start {
            return Err(OptimizeError::NoWorkingHours {
                technician_id: technician.id.clone(),
            });
        }
        technician.home_location.validate()?;
        self.window.validate("optimization", false)?;
        if self.day_end() <= self.day_start() {
            return Err(OptimizeError::NoWorkingHours {
                technician_id: technician.id.clone(),
            });
        }
        self.start_location.validate()?;
        if let Some(end) = &self.end_location {
            end.validate()?;
        }
        self.cost_rates.validate()?;

        for constraint in &self.constraints {
            match constraint {
                RouteConstraint::MaxStops(_) => {}
                RouteConstraint::MaxDistanceKm(limit) | RouteConstraint::MaxDurationMinutes(limit) => {
                    if !limit.is_finite() || *limit < 0.0 {
                        return Err(OptimizeError::config(
                            "constraints",
                            format!("route limits must be non-negative, got {limit}"),
                        ));
                    }
                }
            }
        }

        let mut seen = HashSet::new();
        for job in &self.jobs {
            if !seen.insert(job.id.as_str()) {
                return Err(OptimizeError::DuplicateJob {
                    job_id: job.id.clone(),
                });
            }
            if job.estimated_duration_minutes < 0 {
                return Err(OptimizeError::NegativeDuration {
                    job_id: job.id.clone(),
                });
            }
            job.location.validate()?;
            if let Some(window) = &job.time_window {
                window.validate(&format!("job {}", job.id), true)?;
            }
            if !job.revenue.is_finite() {
                return Err(OptimizeError::config("revenue", format!("job {} revenue is not finite", job.id)));
            }
        }
        Ok(())
    }
}
