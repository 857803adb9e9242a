//! Cost-optimal allocation baseline.
//!
//! The oracle answers "what is the cheapest feasible assignment of this
//! batch?" so the greedy allocator can be compared against it. It is not
//! used by routing or conflict resolution.
//!
//! # Model
//!
//! - every order is assigned to exactly one agent;
//! - every assignment passes [`ConstraintChecker::can_assign_order`]
//!   against the agent's load at that point;
//! - cost = Σ hourly cost of the agent each order is assigned to.
//!
//! # Algorithm
//! Depth-first branch and bound over orders (greedy processing order),
//! trying agents in ascending cost. The bound adds, for every open order,
//! the cheapest agent that could take it on an empty load.
//!
//! # Reference
//! Martello & Toth (1990), "Knapsack Problems", Ch. 7: Generalized
//! Assignment Problem

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::allocation::{order_sequence, OrderAssignment};
use crate::constraints::ConstraintChecker;
use crate::fleet::Fleet;
use crate::models::Order;

/// How the oracle finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OracleStatus {
    /// Search completed; the assignment is cost-minimal.
    Optimal,
    /// Budget ran out after an assignment was found.
    Feasible,
    /// Search completed without any complete assignment.
    Infeasible,
    /// Budget ran out before any complete assignment was found.
    TimedOut,
}

/// Result of an oracle run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OracleSolution {
    /// Termination status.
    pub status: OracleStatus,
    /// Best assignment found (empty unless `Optimal` or `Feasible`).
    pub assignments: Vec<OrderAssignment>,
    /// Objective value of `assignments`.
    pub cost: f64,
    /// Search nodes visited.
    pub nodes: u64,
    /// Wall-clock time spent (ms).
    pub elapsed_ms: u64,
}

impl OracleSolution {
    /// Whether a complete assignment was found.
    pub fn has_solution(&self) -> bool {
        matches!(self.status, OracleStatus::Optimal | OracleStatus::Feasible)
    }
}

/// Cost-minimising allocation within a time budget.
pub trait OptimizationOracle {
    /// Oracle name for logs.
    fn name(&self) -> &'static str;

    /// Solves the batch. The fleet is not modified.
    fn solve(&self, fleet: &Fleet, orders: &[Order], budget: Duration) -> OracleSolution;
}

/// Exact branch-and-bound oracle.
#[derive(Debug, Clone, Copy)]
pub struct BranchAndBoundOracle<'a> {
    checker: ConstraintChecker<'a>,
}

impl<'a> BranchAndBoundOracle<'a> {
    /// Creates an oracle around a constraint checker.
    pub fn new(checker: ConstraintChecker<'a>) -> Self {
        Self { checker }
    }
}

impl OptimizationOracle for BranchAndBoundOracle<'_> {
    fn name(&self) -> &'static str {
        "branch_and_bound"
    }

    fn solve(&self, fleet: &Fleet, orders: &[Order], budget: Duration) -> OracleSolution {
        let started = Instant::now();
        let mut fleet = fleet.clone();
        fleet.reset();
        fleet.auto_pair();

        let sequence = order_sequence(orders);

        // Agents that could take each order on an empty load, cheapest first.
        let candidates: Vec<Vec<usize>> = sequence
            .iter()
            .map(|&oi| {
                let mut agents: Vec<usize> = (0..fleet.len())
                    .filter(|&ai| {
                        self.checker
                            .can_assign_order(fleet.agent(ai), fleet.state(ai), &orders[oi])
                            .is_ok()
                    })
                    .collect();
                agents.sort_by(|&a, &b| {
                    fleet
                        .agent(a)
                        .cost_per_hour
                        .total_cmp(&fleet.agent(b).cost_per_hour)
                });
                agents
            })
            .collect();

        let mut search = Search {
            checker: self.checker,
            orders,
            sequence: &sequence,
            candidates: &candidates,
            suffix_bound: suffix_bounds(&fleet, &candidates),
            deadline: started + budget,
            nodes: 0,
            timed_out: false,
            current: Vec::with_capacity(sequence.len()),
            best: None,
            best_cost: f64::INFINITY,
        };

        if candidates.iter().all(|c| !c.is_empty()) {
            search.branch(&mut fleet, 0, 0.0);
        } else {
            debug!("an order has no candidate agent");
        }

        let status = match (&search.best, search.timed_out) {
            (Some(_), false) => OracleStatus::Optimal,
            (Some(_), true) => OracleStatus::Feasible,
            (None, false) => OracleStatus::Infeasible,
            (None, true) => OracleStatus::TimedOut,
        };

        let assignments = search
            .best
            .as_ref()
            .map(|best| {
                sequence
                    .iter()
                    .zip(best)
                    .map(|(&oi, &ai)| OrderAssignment {
                        order_id: orders[oi].id.clone(),
                        agent_id: fleet.agent(ai).id.clone(),
                        agent_kind: fleet.agent(ai).kind,
                    })
                    .collect()
            })
            .unwrap_or_default();
        let cost = if search.best.is_some() {
            search.best_cost
        } else {
            0.0
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;
        info!(
            oracle = self.name(),
            status = ?status,
            cost,
            nodes = search.nodes,
            elapsed_ms,
            "oracle finished"
        );

        OracleSolution {
            status,
            assignments,
            cost,
            nodes: search.nodes,
            elapsed_ms,
        }
    }
}

/// `bound[d]` = Σ cheapest candidate cost over orders `d..`.
fn suffix_bounds(fleet: &Fleet, candidates: &[Vec<usize>]) -> Vec<f64> {
    let mut bound = vec![0.0; candidates.len() + 1];
    for d in (0..candidates.len()).rev() {
        let cheapest = candidates[d]
            .first()
            .map(|&ai| fleet.agent(ai).cost_per_hour)
            .unwrap_or(f64::INFINITY);
        bound[d] = bound[d + 1] + cheapest;
    }
    bound
}

struct Search<'s, 'a> {
    checker: ConstraintChecker<'a>,
    orders: &'s [Order],
    sequence: &'s [usize],
    candidates: &'s [Vec<usize>],
    suffix_bound: Vec<f64>,
    deadline: Instant,
    nodes: u64,
    timed_out: bool,
    current: Vec<usize>,
    best: Option<Vec<usize>>,
    best_cost: f64,
}

impl Search<'_, '_> {
    fn branch(&mut self, fleet: &mut Fleet, depth: usize, cost: f64) {
        if self.timed_out || Instant::now() >= self.deadline {
            self.timed_out = true;
            return;
        }
        self.nodes += 1;

        if depth == self.sequence.len() {
            if cost < self.best_cost {
                self.best_cost = cost;
                self.best = Some(self.current.clone());
            }
            return;
        }
        if cost + self.suffix_bound[depth] >= self.best_cost {
            return;
        }

        let (orders, candidates) = (self.orders, self.candidates);
        let order = &orders[self.sequence[depth]];
        for &ai in &candidates[depth] {
            if self
                .checker
                .can_assign_order(fleet.agent(ai), fleet.state(ai), order)
                .is_err()
            {
                continue;
            }

            let saved = fleet.state(ai).clone();
            fleet.state_mut(ai).commit(order, self.checker.catalog());
            self.current.push(ai);

            let step_cost = fleet.agent(ai).cost_per_hour;
            self.branch(fleet, depth + 1, cost + step_cost);

            self.current.pop();
            *fleet.state_mut(ai) = saved;

            if self.timed_out {
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocation::{AllocationStrategy, GreedyAllocator};
    use crate::models::{Agent, Catalog, Location, Product, Warehouse};

    fn catalog() -> Catalog {
        Catalog::new()
            .with_product(Product::new("P15", 15.0, 1.0, Location::new(1, 1)))
            .with_product(Product::new("P10", 10.0, 1.0, Location::new(2, 2)))
            .with_product(Product::new("P50", 50.0, 1.0, Location::new(3, 3)))
    }

    fn fleet() -> Fleet {
        Fleet::new(vec![
            Agent::robot("R1", 20.0, 30.0).with_cost(5.0),
            Agent::human("H1", 35.0, 50.0).with_cost(25.0),
        ])
    }

    #[test]
    fn test_beats_greedy() {
        let w = Warehouse::new(10, 10, Location::new(0, 0));
        let c = catalog();
        let checker = ConstraintChecker::new(&w, &c);
        let mut orders = vec![
            Order::new("A").with_item("P15", 1).with_totals(&c),
            Order::new("B").with_item("P10", 1).with_totals(&c),
            Order::new("C").with_item("P10", 1).with_totals(&c),
        ];

        let mut greedy_fleet = fleet();
        let greedy = GreedyAllocator::new(checker).allocate(&mut greedy_fleet, &mut orders);
        let greedy_cost: f64 = greedy
            .assignments
            .iter()
            .map(|a| greedy_fleet.agent(greedy_fleet.index_of(&a.agent_id).unwrap()).cost_per_hour)
            .sum();
        assert!((greedy_cost - 55.0).abs() < 1e-10);

        let solution =
            BranchAndBoundOracle::new(checker).solve(&fleet(), &orders, Duration::from_secs(10));
        assert_eq!(solution.status, OracleStatus::Optimal);
        assert!((solution.cost - 35.0).abs() < 1e-10);
        assert!(solution.cost <= greedy_cost);

        let agent_of = |id: &str| {
            solution
                .assignments
                .iter()
                .find(|a| a.order_id == id)
                .map(|a| a.agent_id.as_str())
        };
        assert_eq!(agent_of("A"), Some("H1"));
        assert_eq!(agent_of("B"), Some("R1"));
        assert_eq!(agent_of("C"), Some("R1"));
    }

    #[test]
    fn test_infeasible_when_an_order_fits_nobody() {
        let w = Warehouse::new(10, 10, Location::new(0, 0));
        let c = catalog();
        let orders = vec![
            Order::new("A").with_item("P10", 1).with_totals(&c),
            Order::new("HUGE").with_item("P50", 1).with_totals(&c),
        ];
        let solution = BranchAndBoundOracle::new(ConstraintChecker::new(&w, &c)).solve(
            &fleet(),
            &orders,
            Duration::from_secs(1),
        );
        assert_eq!(solution.status, OracleStatus::Infeasible);
        assert!(!solution.has_solution());
        assert!(solution.assignments.is_empty());
    }

    #[test]
    fn test_infeasible_by_combined_load() {
        let w = Warehouse::new(10, 10, Location::new(0, 0));
        let c = catalog();
        // Four 15 kg orders: robot takes one, human two; the fourth fits nowhere.
        let orders: Vec<Order> = (0..4)
            .map(|i| Order::new(format!("O{i}")).with_item("P15", 1).with_totals(&c))
            .collect();
        let solution = BranchAndBoundOracle::new(ConstraintChecker::new(&w, &c)).solve(
            &fleet(),
            &orders,
            Duration::from_secs(5),
        );
        assert_eq!(solution.status, OracleStatus::Infeasible);
    }

    #[test]
    fn test_zero_budget_times_out() {
        let w = Warehouse::new(10, 10, Location::new(0, 0));
        let c = catalog();
        let orders = vec![Order::new("A").with_item("P10", 1).with_totals(&c)];
        let solution = BranchAndBoundOracle::new(ConstraintChecker::new(&w, &c)).solve(
            &fleet(),
            &orders,
            Duration::ZERO,
        );
        assert_eq!(solution.status, OracleStatus::TimedOut);
    }

    #[test]
    fn test_input_fleet_untouched() {
        let w = Warehouse::new(10, 10, Location::new(0, 0));
        let c = catalog();
        let orders = vec![Order::new("A").with_item("P10", 1).with_totals(&c)];
        let f = fleet();
        let solution = BranchAndBoundOracle::new(ConstraintChecker::new(&w, &c)).solve(
            &f,
            &orders,
            Duration::from_secs(1),
        );
        assert_eq!(solution.assignments[0].agent_id, "R1");
        assert_eq!(f.state(0).load_weight, 0.0);
    }
}
