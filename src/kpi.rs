//! Plan quality metrics (KPIs).
//!
//! Computes aggregate performance indicators from the final routes of a
//! planning run.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Total distance | Sum of route distances (cells) |
//! | Makespan | Longest route time (s) |
//! | Total cost | Sum of route costs |
//! | Utilization | Route time ÷ makespan, per agent |
//! | Load balance | Population std-dev of route times over the fleet |
//! | Success rate | Assigned orders ÷ orders |

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::allocation::AllocationResult;
use crate::fleet::Fleet;
use crate::models::AgentRoute;

/// Plan performance indicators. Times are in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanKpi {
    /// Sum of route distances (cells).
    pub total_distance: u32,
    /// Longest route time (s).
    pub makespan: f64,
    /// Sum of route costs.
    pub total_cost: f64,
    /// Per-agent utilization (0.0..1.0); idle agents are 0.
    pub utilization_by_agent: BTreeMap<String, f64>,
    /// Mean utilization over the fleet.
    pub avg_utilization: f64,
    /// Standard deviation of route times over the fleet (s).
    pub load_balance_stddev: f64,
    /// Fraction of orders assigned (0.0..1.0).
    pub success_rate: f64,
}

impl PlanKpi {
    /// Computes KPIs from the final routes.
    ///
    /// # Arguments
    /// * `fleet` - Every agent of the run, idle ones included.
    /// * `routes` - Final routes (at most one per agent).
    /// * `allocation` - The allocation the routes were built from.
    pub fn calculate(fleet: &Fleet, routes: &[AgentRoute], allocation: &AllocationResult) -> Self {
        let total_distance = routes.iter().map(|r| r.total_distance).sum();
        let total_cost = routes.iter().map(|r| r.cost).sum();
        let makespan = routes.iter().map(|r| r.total_time).fold(0.0, f64::max);

        let times: Vec<f64> = fleet
            .agents()
            .iter()
            .map(|a| {
                routes
                    .iter()
                    .find(|r| r.agent_id == a.id)
                    .map_or(0.0, |r| r.total_time)
            })
            .collect();

        let utilization_by_agent: BTreeMap<String, f64> = fleet
            .agents()
            .iter()
            .zip(&times)
            .map(|(a, &t)| {
                let u = if makespan > 0.0 { t / makespan } else { 0.0 };
                (a.id.clone(), u)
            })
            .collect();

        let avg_utilization = mean(utilization_by_agent.values().copied());
        let load_balance_stddev = std_dev(&times);

        Self {
            total_distance,
            makespan,
            total_cost,
            utilization_by_agent,
            avg_utilization,
            load_balance_stddev,
            success_rate: allocation.success_rate(),
        }
    }
}

fn mean(values: impl ExactSizeIterator<Item = f64>) -> f64 {
    let n = values.len();
    if n == 0 {
        0.0
    } else {
        values.sum::<f64>() / n as f64
    }
}

fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values.iter().copied());
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}
