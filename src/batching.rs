//! Order batching.
//!
//! Groups orders that one agent could pick in a single trip, and estimates
//! the walking saved by doing so.
//!
//! | Operation | Rule |
//! |-----------|------|
//! | [`OrderBatcher::can_batch_orders`] | combined weight and volume within capacity, all products compatible |
//! | [`OrderBatcher::find_batchable_orders`] | greedy grouping in input order |
//! | [`OrderBatcher::calculate_batching_benefit`] | Σ per-order round trips − shared round trips |
//!
//! Handling restrictions and pairing are not considered here; they are
//! checked when orders are allocated.

use tracing::debug;

use crate::constraints::{ConstraintChecker, ConstraintViolation};
use crate::fleet::AgentState;
use crate::models::{Agent, Catalog, Location, Order, Product, Warehouse};

/// Groups compatible orders for one agent.
///
/// # Example
///
/// ```
/// use u_pick::batching::OrderBatcher;
/// use u_pick::models::{Agent, Catalog, Location, Order, Product, Warehouse};
///
/// let warehouse = Warehouse::new(10, 10, Location::new(0, 0));
/// let catalog = Catalog::new().with_product(Product::new("P1", 5.0, 2.0, Location::new(3, 3)));
/// let orders = vec![
///     Order::new("O1").with_item("P1", 1).with_totals(&catalog),
///     Order::new("O2").with_item("P1", 1).with_totals(&catalog),
/// ];
///
/// let batcher = OrderBatcher::new(&warehouse, &catalog);
/// let batches = batcher.find_batchable_orders(&orders, &Agent::robot("R1", 20.0, 30.0));
/// assert_eq!(batches.len(), 1);
/// assert_eq!(batcher.calculate_batching_benefit(&batches[0]), 12);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct OrderBatcher<'a> {
    warehouse: &'a Warehouse,
    catalog: &'a Catalog,
    checker: ConstraintChecker<'a>,
}

impl<'a> OrderBatcher<'a> {
    /// Creates a batcher over a warehouse and catalog.
    pub fn new(warehouse: &'a Warehouse, catalog: &'a Catalog) -> Self {
        Self {
            warehouse,
            catalog,
            checker: ConstraintChecker::new(warehouse, catalog),
        }
    }

    /// Whether two orders fit together on `agent`.
    ///
    /// Capacity is checked before compatibility; the first failure is
    /// returned.
    pub fn can_batch_orders(
        &self,
        first: &Order,
        second: &Order,
        agent: &Agent,
    ) -> Result<(), ConstraintViolation> {
        let loaded = AgentState {
            load_weight: first.total_weight,
            load_volume: first.total_volume,
            ..AgentState::default()
        };
        self.checker.capacity(agent, &loaded, second)?;

        let mut products: Vec<&Product> = first.products(self.catalog);
        for p in second.products(self.catalog) {
            if !products.iter().any(|q| q.id == p.id) {
                products.push(p);
            }
        }
        self.checker.product_compatibility(&products)
    }

    /// Greedy grouping of `orders` into batches for `agent`.
    ///
    /// Each unbatched order opens a batch, then every later unbatched
    /// order joins it if it pairs with every member and the batch totals
    /// stay within capacity. Every order lands in exactly one batch.
    pub fn find_batchable_orders<'o>(
        &self,
        orders: &'o [Order],
        agent: &Agent,
    ) -> Vec<Vec<&'o Order>> {
        let mut used = vec![false; orders.len()];
        let mut batches = Vec::new();

        for i in 0..orders.len() {
            if used[i] {
                continue;
            }
            used[i] = true;
            let mut batch = vec![&orders[i]];
            let mut weight = orders[i].total_weight;
            let mut volume = orders[i].total_volume;

            for j in i + 1..orders.len() {
                if used[j] {
                    continue;
                }
                let candidate = &orders[j];
                let pairs_ok = batch
                    .iter()
                    .all(|member| self.can_batch_orders(member, candidate, agent).is_ok());
                if pairs_ok
                    && weight + candidate.total_weight <= agent.capacity_weight
                    && volume + candidate.total_volume <= agent.capacity_volume
                {
                    weight += candidate.total_weight;
                    volume += candidate.total_volume;
                    used[j] = true;
                    batch.push(candidate);
                }
            }

            debug!(agent = %agent.id, size = batch.len(), weight, "batch formed");
            batches.push(batch);
        }
        batches
    }

    /// Estimated cells saved by picking a batch in one trip.
    ///
    /// Every distinct location of every order costs an entry round trip
    /// when picked separately; a batch pays once per location it shares.
    /// Zero for batches of fewer than two orders.
    pub fn calculate_batching_benefit(&self, batch: &[&Order]) -> u32 {
        if batch.len() < 2 {
            return 0;
        }
        let entry = self.warehouse.entry_point;
        let round_trip = |loc: &Location| entry.distance_to(loc) * 2;

        let mut shared: Vec<Location> = Vec::new();
        let mut separate = 0;
        for order in batch {
            for loc in order.unique_locations(self.catalog) {
                separate += round_trip(&loc);
                if !shared.contains(&loc) {
                    shared.push(loc);
                }
            }
        }
        let combined: u32 = shared.iter().map(round_trip).sum();
        separate - combined
    }
}
