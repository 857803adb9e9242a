//! Timed route construction.
//!
//! Groups an agent's order lines by pick point, asks a [`RoutePlanner`]
//! for a visiting order and lays the tour out on the clock:
//!
//! | Segment | Duration |
//! |---------|----------|
//! | travel  | distance ÷ agent speed |
//! | pick    | order lines × `pick_seconds_per_item` |
//!
//! The route starts at the entry point at t=0 and ends there.

use std::collections::BTreeMap;
use tracing::debug;

use super::RoutePlanner;
use crate::models::{Agent, AgentRoute, Catalog, Location, Order, PickedItem, RouteStep, Warehouse};

/// Builds timed routes for agents.
pub struct RouteBuilder<'a> {
    warehouse: &'a Warehouse,
    catalog: &'a Catalog,
    planner: &'a dyn RoutePlanner,
    pick_seconds_per_item: f64,
}

impl<'a> RouteBuilder<'a> {
    /// Creates a builder with 30 s per order line picked.
    pub fn new(warehouse: &'a Warehouse, catalog: &'a Catalog, planner: &'a dyn RoutePlanner) -> Self {
        Self {
            warehouse,
            catalog,
            planner,
            pick_seconds_per_item: 30.0,
        }
    }

    /// Sets the dwell time per order line picked.
    pub fn with_pick_seconds(mut self, seconds: f64) -> Self {
        self.pick_seconds_per_item = seconds;
        self
    }

    /// Pick points of the given orders with what is picked at each.
    ///
    /// Lines of unknown products are skipped.
    pub fn pick_stops(&self, orders: &[&Order]) -> BTreeMap<Location, Vec<PickedItem>> {
        let mut stops: BTreeMap<Location, Vec<PickedItem>> = BTreeMap::new();
        for order in orders {
            for (product, quantity) in order.lines(self.catalog) {
                let point = self.warehouse.pick_point(&product.location);
                stops
                    .entry(point)
                    .or_default()
                    .push(PickedItem::new(&order.id, &product.id, quantity));
            }
        }
        stops
    }

    /// Builds the timed route of `agent` serving `orders`.
    ///
    /// An agent without pick stops gets an empty route.
    pub fn build(&self, agent: &Agent, orders: &[&Order]) -> AgentRoute {
        let order_ids: Vec<String> = orders.iter().map(|o| o.id.clone()).collect();
        let stops = self.pick_stops(orders);
        if stops.is_empty() {
            return AgentRoute::new(&agent.id, agent.kind, Vec::new()).with_orders(order_ids);
        }

        let (locations, picks): (Vec<Location>, Vec<Vec<PickedItem>>) = stops.into_iter().unzip();
        let entry = self.warehouse.entry_point;
        let tour = self.planner.plan(entry, &locations);

        let travel = |distance: u32| -> f64 {
            if agent.speed > 0.0 {
                distance as f64 / agent.speed
            } else {
                0.0
            }
        };

        let mut steps = Vec::with_capacity(locations.len() + 2);
        steps.push(RouteStep::new(entry, 0.0));
        let mut clock = 0.0;
        let mut previous = 0;

        for (&stop, &distance) in tour.sequence.iter().zip(&tour.cumulative_distance) {
            clock += travel(distance - previous);
            previous = distance;

            let departure = clock + picks[stop].len() as f64 * self.pick_seconds_per_item;
            let mut step = RouteStep::new(locations[stop], clock)
                .with_departure(departure)
                .with_cumulative_distance(distance)
                .picking();
            step.picks = picks[stop].clone();
            steps.push(step);
            clock = departure;
        }

        clock += travel(tour.total_distance - previous);
        steps.push(RouteStep::new(entry, clock).with_cumulative_distance(tour.total_distance));

        let route = AgentRoute::new(&agent.id, agent.kind, steps).with_orders(order_ids);
        let cost = route.total_time / 3600.0 * agent.cost_per_hour;
        debug!(
            agent = %agent.id,
            planner = self.planner.name(),
            stops = locations.len(),
            distance = route.total_distance,
            time = route.total_time,
            "route built"
        );
        route.with_cost(cost)
    }
}
