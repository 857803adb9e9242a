//! Order allocation.
//!
//! Maps each order of a batch onto at most one agent of the fleet such
//! that every hard constraint of [`crate::constraints`] holds.
//!
//! # Strategies
//!
//! | Strategy | Optimal | Deterministic | Notes |
//! |----------|---------|---------------|-------|
//! | [`GreedyAllocator`] | no | yes | first-fit over priority-sorted orders and cost-sorted agents |
//! | [`PriorityAllocator`] | no | yes | express pass on the fastest agents, then a standard pass |
//! | [`crate::oracle::BranchAndBoundOracle`] | yes (within budget) | yes | cost baseline only |

mod greedy;
mod ordering;
mod priority;
mod result;

pub use greedy::GreedyAllocator;
pub use ordering::{agent_sequence, order_sequence};
pub use priority::PriorityAllocator;
pub use result::{AgentRejection, AllocationResult, FailedOrder, OrderAssignment};

use crate::fleet::Fleet;
use crate::models::Order;

/// An allocation algorithm.
///
/// Implementations reset the fleet's per-pass state before they start,
/// so calling `allocate` twice on the same input yields the same result.
pub trait AllocationStrategy {
    /// Strategy name used in results and logs.
    fn name(&self) -> &'static str;

    /// Allocates `orders` onto `fleet`.
    ///
    /// Commits loads into the fleet state and sets each assigned order's
    /// `assigned_agent`.
    fn allocate(&self, fleet: &mut Fleet, orders: &mut [Order]) -> AllocationResult;
}
