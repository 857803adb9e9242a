//! Greedy first-fit allocator.
//!
//! # Algorithm
//!
//! 1. Reset every agent's per-pass state and every order's back-reference.
//! 2. Apply configured Cart↔Human pairings, then auto-pair the rest.
//! 3. Sort orders (express first, then time to deadline).
//! 4. Sort agents once (robot, cart, human; then hourly cost).
//! 5. Commit each order to the first agent that passes every check.
//!
//! # Complexity
//! O(n · m · k²) where n=orders, m=agents, k=products per order.

use tracing::{debug, info, warn};

use super::{
    agent_sequence, order_sequence, AgentRejection, AllocationResult, AllocationStrategy,
    FailedOrder, OrderAssignment,
};
use crate::constraints::ConstraintChecker;
use crate::fleet::Fleet;
use crate::models::Order;

/// Deterministic greedy allocator.
///
/// Produces a feasible assignment, not necessarily the cheapest one.
///
/// # Example
///
/// ```
/// use u_pick::allocation::{AllocationStrategy, GreedyAllocator};
/// use u_pick::constraints::ConstraintChecker;
/// use u_pick::fleet::Fleet;
/// use u_pick::models::{Agent, Catalog, Location, Order, Product, Warehouse};
///
/// let warehouse = Warehouse::new(10, 10, Location::new(0, 0));
/// let catalog = Catalog::new().with_product(Product::new("P1", 5.0, 2.0, Location::new(3, 3)));
/// let mut fleet = Fleet::new(vec![Agent::robot("R1", 20.0, 30.0)]);
/// let mut orders = vec![Order::new("O1").with_item("P1", 1).with_totals(&catalog)];
///
/// let allocator = GreedyAllocator::new(ConstraintChecker::new(&warehouse, &catalog));
/// let result = allocator.allocate(&mut fleet, &mut orders);
/// assert_eq!(result.assigned_count(), 1);
/// assert_eq!(orders[0].assigned_agent.as_deref(), Some("R1"));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct GreedyAllocator<'a> {
    checker: ConstraintChecker<'a>,
}

impl<'a> GreedyAllocator<'a> {
    /// Creates an allocator around a constraint checker.
    pub fn new(checker: ConstraintChecker<'a>) -> Self {
        Self { checker }
    }

    /// The checker used for every candidate.
    pub fn checker(&self) -> &ConstraintChecker<'a> {
        &self.checker
    }
}

impl AllocationStrategy for GreedyAllocator<'_> {
    fn name(&self) -> &'static str {
        "greedy"
    }

    fn allocate(&self, fleet: &mut Fleet, orders: &mut [Order]) -> AllocationResult {
        let paired = start_pass(fleet, orders);

        let order_seq = order_sequence(orders);
        let agent_seq = agent_sequence(fleet.agents());
        info!(
            orders = orders.len(),
            agents = fleet.len(),
            auto_paired = paired,
            "greedy allocation pass"
        );

        let mut result = AllocationResult::new(self.name(), orders.len());
        first_fit(&self.checker, fleet, orders, &order_seq, &agent_seq, &mut result);

        info!(
            assigned = result.assigned_count(),
            failed = result.failed_count(),
            "greedy allocation done"
        );
        result
    }
}

/// Wipes per-pass state and back-references, then pairs carts.
///
/// Returns the number of auto-paired carts.
pub(super) fn start_pass(fleet: &mut Fleet, orders: &mut [Order]) -> usize {
    fleet.reset();
    for order in orders.iter_mut() {
        order.assigned_agent = None;
    }
    fleet.auto_pair()
}

/// Commits each order of `order_seq` to the first agent of `agent_seq`
/// that passes every check, on top of whatever the fleet already carries.
pub(super) fn first_fit(
    checker: &ConstraintChecker<'_>,
    fleet: &mut Fleet,
    orders: &mut [Order],
    order_seq: &[usize],
    agent_seq: &[usize],
    result: &mut AllocationResult,
) {
    let catalog = checker.catalog();

    for &oi in order_seq {
        let order = &orders[oi];
        let mut rejections = Vec::new();
        let mut chosen = None;

        for &ai in agent_seq {
            match checker.can_assign_order(fleet.agent(ai), fleet.state(ai), order) {
                Ok(()) => {
                    chosen = Some(ai);
                    break;
                }
                Err(violations) => rejections.push(AgentRejection {
                    agent_id: fleet.agent(ai).id.clone(),
                    violations,
                }),
            }
        }

        match chosen {
            Some(ai) => {
                fleet.state_mut(ai).commit(order, catalog);
                let agent = fleet.agent(ai);
                debug!(order = %order.id, agent = %agent.id, "order committed");
                result.assignments.push(OrderAssignment {
                    order_id: order.id.clone(),
                    agent_id: agent.id.clone(),
                    agent_kind: agent.kind,
                });
                orders[oi].assigned_agent = Some(agent.id.clone());
            }
            None => {
                warn!(order = %order.id, tried = rejections.len(), "no agent can take order");
                result.failures.push(FailedOrder {
                    order_id: order.id.clone(),
                    rejections,
                });
            }
        }
    }
}
