//! Strict-priority allocator.
//!
//! # Algorithm
//!
//! 1. Reset the fleet and pair carts, as the greedy pass does.
//! 2. Express pass: express orders (by time to deadline) are offered to
//!    the fastest agents first; ties fall back to the greedy agent order.
//! 3. Standard pass: the remaining orders are offered to agents in greedy
//!    order (robot, cart, human; then hourly cost), on top of the loads
//!    committed by the express pass.
//!
//! No standard order can take capacity an express order could have used.
//!
//! # Complexity
//! O(n · m · k²), same as [`super::GreedyAllocator`].

use tracing::info;

use super::greedy::{first_fit, start_pass};
use super::{agent_sequence, order_sequence, AllocationResult, AllocationStrategy};
use crate::constraints::ConstraintChecker;
use crate::fleet::Fleet;
use crate::models::{Agent, Order};

/// Two-pass allocator serving express orders before any standard one.
#[derive(Debug, Clone, Copy)]
pub struct PriorityAllocator<'a> {
    checker: ConstraintChecker<'a>,
}

impl<'a> PriorityAllocator<'a> {
    /// Creates an allocator around a constraint checker.
    pub fn new(checker: ConstraintChecker<'a>) -> Self {
        Self { checker }
    }
}

/// Greedy agent order re-sorted by descending speed (stable).
fn express_agent_sequence(agents: &[Agent]) -> Vec<usize> {
    let mut seq = agent_sequence(agents);
    seq.sort_by(|&a, &b| agents[b].speed.total_cmp(&agents[a].speed));
    seq
}

impl AllocationStrategy for PriorityAllocator<'_> {
    fn name(&self) -> &'static str {
        "priority"
    }

    fn allocate(&self, fleet: &mut Fleet, orders: &mut [Order]) -> AllocationResult {
        let paired = start_pass(fleet, orders);

        let (express, standard): (Vec<usize>, Vec<usize>) = order_sequence(orders)
            .into_iter()
            .partition(|&i| orders[i].is_express());
        info!(
            express = express.len(),
            standard = standard.len(),
            agents = fleet.len(),
            auto_paired = paired,
            "priority allocation pass"
        );

        let mut result = AllocationResult::new(self.name(), orders.len());

        let fast_first = express_agent_sequence(fleet.agents());
        first_fit(&self.checker, fleet, orders, &express, &fast_first, &mut result);
        let express_assigned = result.assigned_count();

        let cheap_first = agent_sequence(fleet.agents());
        first_fit(&self.checker, fleet, orders, &standard, &cheap_first, &mut result);

        info!(
            express_assigned,
            standard_assigned = result.assigned_count() - express_assigned,
            failed = result.failed_count(),
            "priority allocation done"
        );
        result
    }
}
