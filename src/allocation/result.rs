//! Allocation outcome.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{info, warn};

use crate::constraints::ConstraintViolation;
use crate::fleet::Fleet;
use crate::models::AgentKind;

/// An order committed to an agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderAssignment {
    /// Committed order.
    pub order_id: String,
    /// Receiving agent.
    pub agent_id: String,
    /// Receiving agent's kind.
    pub agent_kind: AgentKind,
}

/// Why one agent turned an order down.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentRejection {
    /// Agent that was tried.
    pub agent_id: String,
    /// Every violation found for that agent.
    pub violations: Vec<ConstraintViolation>,
}

/// An order no agent could take.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedOrder {
    /// Unassigned order.
    pub order_id: String,
    /// Rejections of every agent tried, in the order they were tried.
    pub rejections: Vec<AgentRejection>,
}

impl FailedOrder {
    /// Distinct violation categories across all rejections.
    pub fn categories(&self) -> BTreeSet<&'static str> {
        self.rejections
            .iter()
            .flat_map(|r| r.violations.iter().map(|v| v.kind.category()))
            .collect()
    }

    /// One line per rejecting agent, e.g. `"R1: [capacity] ..., [cart] ..."`.
    pub fn reasons(&self) -> Vec<String> {
        self.rejections
            .iter()
            .map(|r| {
                let msgs: Vec<String> = r.violations.iter().map(|v| v.to_string()).collect();
                format!("{}: {}", r.agent_id, msgs.join(", "))
            })
            .collect()
    }
}

/// Result of one allocation pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AllocationResult {
    /// Name of the strategy that produced the result.
    pub strategy: String,
    /// Committed orders, in commitment order.
    pub assignments: Vec<OrderAssignment>,
    /// Orders left unassigned, in processing order.
    pub failures: Vec<FailedOrder>,
    /// Number of orders in the batch.
    pub total_orders: usize,
}

impl AllocationResult {
    /// Creates an empty result for a batch.
    pub fn new(strategy: impl Into<String>, total_orders: usize) -> Self {
        Self {
            strategy: strategy.into(),
            assignments: Vec::new(),
            failures: Vec::new(),
            total_orders,
        }
    }

    /// Number of committed orders.
    pub fn assigned_count(&self) -> usize {
        self.assignments.len()
    }

    /// Number of unassigned orders.
    pub fn failed_count(&self) -> usize {
        self.failures.len()
    }

    /// Fraction of orders committed (1.0 for an empty batch).
    pub fn success_rate(&self) -> f64 {
        if self.total_orders == 0 {
            1.0
        } else {
            self.assigned_count() as f64 / self.total_orders as f64
        }
    }

    /// Whether every order was committed.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Agent an order was committed to.
    pub fn agent_for(&self, order_id: &str) -> Option<&str> {
        self.assignments
            .iter()
            .find(|a| a.order_id == order_id)
            .map(|a| a.agent_id.as_str())
    }

    /// Orders committed to an agent, in commitment order.
    pub fn orders_for(&self, agent_id: &str) -> Vec<&str> {
        self.assignments
            .iter()
            .filter(|a| a.agent_id == agent_id)
            .map(|a| a.order_id.as_str())
            .collect()
    }

    /// Failure record of an order.
    pub fn failure_for(&self, order_id: &str) -> Option<&FailedOrder> {
        self.failures.iter().find(|f| f.order_id == order_id)
    }

    /// Emits a summary of the pass through `tracing`.
    pub fn log_summary(&self, fleet: &Fleet) {
        info!(
            strategy = %self.strategy,
            total = self.total_orders,
            assigned = self.assigned_count(),
            failed = self.failed_count(),
            rate = format_args!("{:.1}%", self.success_rate() * 100.0),
            "allocation summary"
        );

        for (agent, state) in fleet.iter() {
            if state.assigned_orders.is_empty() {
                continue;
            }
            let utilization = if agent.capacity_weight > 0.0 {
                state.load_weight / agent.capacity_weight * 100.0
            } else {
                0.0
            };
            info!(
                agent = %agent.id,
                kind = %agent.kind,
                orders = state.assigned_orders.len(),
                load_kg = format_args!("{:.2}/{}", state.load_weight, agent.capacity_weight),
                utilization = format_args!("{utilization:.1}%"),
                "agent load"
            );
        }

        for failure in &self.failures {
            warn!(
                order = %failure.order_id,
                reasons = ?failure.categories(),
                "order not assigned"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::ViolationKind;

    fn sample() -> AllocationResult {
        let mut r = AllocationResult::new("greedy", 3);
        r.assignments.push(OrderAssignment {
            order_id: "O1".into(),
            agent_id: "R1".into(),
            agent_kind: AgentKind::Robot,
        });
        r.assignments.push(OrderAssignment {
            order_id: "O2".into(),
            agent_id: "R1".into(),
            agent_kind: AgentKind::Robot,
        });
        r.failures.push(FailedOrder {
            order_id: "O3".into(),
            rejections: vec![
                AgentRejection {
                    agent_id: "R1".into(),
                    violations: vec![ConstraintViolation::new(
                        ViolationKind::UnpairedCart,
                        "R1",
                        "cart R1 needs an assigned human",
                    )],
                },
                AgentRejection {
                    agent_id: "H1".into(),
                    violations: vec![ConstraintViolation::new(
                        ViolationKind::InvalidPairing,
                        "H1",
                        "nope",
                    )],
                },
            ],
        });
        r
    }

    #[test]
    fn test_counts() {
        let r = sample();
        assert_eq!(r.assigned_count(), 2);
        assert_eq!(r.failed_count(), 1);
        assert!((r.success_rate() - 2.0 / 3.0).abs() < 1e-10);
        assert!(!r.is_complete());
    }

    #[test]
    fn test_lookups() {
        let r = sample();
        assert_eq!(r.agent_for("O2"), Some("R1"));
        assert_eq!(r.agent_for("O3"), None);
        assert_eq!(r.orders_for("R1"), vec!["O1", "O2"]);
        assert!(r.failure_for("O3").is_some());
    }

    #[test]
    fn test_failure_reasons() {
        let r = sample();
        let f = r.failure_for("O3").unwrap();
        let cats: Vec<_> = f.categories().into_iter().collect();
        assert_eq!(cats, vec!["cart", "pairing"]);
        assert_eq!(f.reasons()[0], "R1: [cart] cart R1 needs an assigned human");
    }

    #[test]
    fn test_empty_batch_rate() {
        assert_eq!(AllocationResult::new("greedy", 0).success_rate(), 1.0);
    }

    #[test]
    fn test_serializes() {
        let json = serde_json::to_string(&sample()).unwrap();
        assert!(json.contains("\"agent_kind\":\"robot\""));
    }
}
