//! Planner configuration.
//!
//! All tunables of a planning run in one serde-friendly struct. Missing
//! fields take their defaults, so a partial JSON document is a valid
//! configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Allocation strategy run by the planner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationMode {
    /// Single first-fit pass.
    #[default]
    Greedy,
    /// Express pass, then standard pass.
    Priority,
}

/// Tunables of a planning run.
///
/// Times are in seconds unless noted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Allocation strategy.
    pub allocation: AllocationMode,
    /// Timeline sampling step and conflict bucket width.
    pub time_step: f64,
    /// Wait injected per resolution round.
    pub delay_increment: f64,
    /// Upper bound on resolution rounds.
    pub max_iterations: usize,
    /// Width of the window that merges repeated detections.
    pub dedup_window: f64,
    /// Maximum number of conflicts listed in a report.
    pub report_limit: usize,
    /// Dwell time per order line picked.
    pub pick_seconds_per_item: f64,
    /// Include the deadline estimate in assignment checks.
    pub enforce_deadlines: bool,
    /// Wall-clock budget of one tour optimisation (ms).
    pub route_time_budget_ms: u64,
    /// Randomised restarts of the tour improver.
    pub route_restarts: usize,
    /// Seed for the tour improver.
    pub seed: u64,
    /// Run the cost-optimal oracle after allocation for comparison.
    pub run_baseline: bool,
    /// Wall-clock budget of the baseline oracle (ms).
    pub oracle_time_budget_ms: u64,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            allocation: AllocationMode::Greedy,
            time_step: 1.0,
            delay_increment: 5.0,
            max_iterations: 50,
            dedup_window: 5.0,
            report_limit: 10,
            pick_seconds_per_item: 30.0,
            enforce_deadlines: false,
            route_time_budget_ms: 2_000,
            route_restarts: 4,
            seed: 42,
            run_baseline: false,
            oracle_time_budget_ms: 30_000,
        }
    }
}

impl PlannerConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the allocation strategy.
    pub fn with_allocation(mut self, mode: AllocationMode) -> Self {
        self.allocation = mode;
        self
    }

    /// Sets the sampling step.
    pub fn with_time_step(mut self, time_step: f64) -> Self {
        self.time_step = time_step;
        self
    }

    /// Sets the per-round delay.
    pub fn with_delay_increment(mut self, delay: f64) -> Self {
        self.delay_increment = delay;
        self
    }

    /// Sets the resolution round limit.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Sets the de-duplication window.
    pub fn with_dedup_window(mut self, window: f64) -> Self {
        self.dedup_window = window;
        self
    }

    /// Sets the report listing cap.
    pub fn with_report_limit(mut self, limit: usize) -> Self {
        self.report_limit = limit;
        self
    }

    /// Sets the dwell time per order line picked.
    pub fn with_pick_seconds(mut self, seconds: f64) -> Self {
        self.pick_seconds_per_item = seconds;
        self
    }

    /// Enables deadline checks during allocation.
    pub fn with_deadlines(mut self) -> Self {
        self.enforce_deadlines = true;
        self
    }

    /// Sets the tour improver seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Enables the oracle baseline with the given budget (ms).
    pub fn with_baseline(mut self, budget_ms: u64) -> Self {
        self.run_baseline = true;
        self.oracle_time_budget_ms = budget_ms;
        self
    }

    /// Sets the tour optimisation budget (ms).
    pub fn with_route_budget(mut self, budget_ms: u64) -> Self {
        self.route_time_budget_ms = budget_ms;
        self
    }

    /// Tour optimisation budget.
    pub fn route_time_budget(&self) -> Duration {
        Duration::from_millis(self.route_time_budget_ms)
    }

    /// Oracle budget.
    pub fn oracle_time_budget(&self) -> Duration {
        Duration::from_millis(self.oracle_time_budget_ms)
    }

    /// Rejects values the planner cannot work with.
    pub fn validate(&self) -> Result<(), String> {
        if self.time_step.is_nan() || self.time_step <= 0.0 {
            return Err(format!("time_step must be positive, got {}", self.time_step));
        }
        if self.delay_increment.is_nan() || self.delay_increment <= 0.0 {
            return Err(format!(
                "delay_increment must be positive, got {}",
                self.delay_increment
            ));
        }
        if self.dedup_window.is_nan() || self.dedup_window <= 0.0 {
            return Err(format!(
                "dedup_window must be positive, got {}",
                self.dedup_window
            ));
        }
        if self.pick_seconds_per_item < 0.0 {
            return Err(format!(
                "pick_seconds_per_item must not be negative, got {}",
                self.pick_seconds_per_item
            ));
        }
        Ok(())
    }
}
