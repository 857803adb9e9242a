//! Processing order of orders and agents for one allocation pass.
//!
//! Both sequences are returned as indices into the input slice and are
//! stable: entries that compare equal keep their input order.

use std::cmp::Ordering;

use crate::models::{Agent, Order, Priority};

/// Sort key of an order: express first, then least time to deadline.
fn order_key(order: &Order) -> (u8, i64) {
    let class = match order.priority {
        Priority::Express => 0,
        Priority::Standard => 1,
    };
    (class, order.time_to_deadline())
}

/// Indices of `orders` in allocation order.
///
/// Express before standard, then ascending time to deadline; ties keep
/// input order.
pub fn order_sequence(orders: &[Order]) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..orders.len()).collect();
    indices.sort_by_key(|&i| order_key(&orders[i]));
    indices
}

/// Indices of `agents` in the order they are offered an order.
///
/// Cheapest kind first (robot, cart, human), then ascending hourly cost;
/// ties keep input order.
pub fn agent_sequence(agents: &[Agent]) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..agents.len()).collect();
    indices.sort_by(|&a, &b| compare_agents(&agents[a], &agents[b]));
    indices
}

fn compare_agents(a: &Agent, b: &Agent) -> Ordering {
    a.kind
        .allocation_rank()
        .cmp(&b.kind.allocation_rank())
        .then_with(|| a.cost_per_hour.total_cmp(&b.cost_per_hour))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ClockTime;

    fn order(id: &str, priority: Priority, received: (u32, u32), deadline: (u32, u32)) -> Order {
        Order::new(id).with_priority(priority).with_window(
            ClockTime::from_hm(received.0, received.1).unwrap(),
            ClockTime::from_hm(deadline.0, deadline.1).unwrap(),
        )
    }

    #[test]
    fn test_express_first_then_deadline() {
        let orders = vec![
            order("std_late", Priority::Standard, (8, 0), (12, 0)),
            order("exp_late", Priority::Express, (8, 0), (11, 0)),
            order("std_early", Priority::Standard, (8, 0), (9, 0)),
            order("exp_early", Priority::Express, (9, 0), (9, 30)),
        ];
        let seq = order_sequence(&orders);
        let ids: Vec<_> = seq.iter().map(|&i| orders[i].id.as_str()).collect();
        assert_eq!(ids, vec!["exp_early", "exp_late", "std_early", "std_late"]);
    }

    #[test]
    fn test_order_ties_keep_input_order() {
        let orders = vec![
            order("B", Priority::Standard, (8, 0), (10, 0)),
            order("A", Priority::Standard, (9, 0), (11, 0)),
        ];
        assert_eq!(order_sequence(&orders), vec![0, 1]);
    }

    #[test]
    fn test_agent_kind_then_cost() {
        let agents = vec![
            Agent::human("H1", 35.0, 50.0).with_cost(25.0),
            Agent::cart("C1", 50.0, 80.0).with_cost(3.0),
            Agent::robot("R2", 20.0, 30.0).with_cost(8.0),
            Agent::robot("R1", 20.0, 30.0).with_cost(5.0),
            Agent::human("H2", 35.0, 50.0).with_cost(20.0),
        ];
        let seq = agent_sequence(&agents);
        let ids: Vec<_> = seq.iter().map(|&i| agents[i].id.as_str()).collect();
        assert_eq!(ids, vec!["R1", "R2", "C1", "H2", "H1"]);
    }

    #[test]
    fn test_empty_sequences() {
        assert!(order_sequence(&[]).is_empty());
        assert!(agent_sequence(&[]).is_empty());
    }
}
