//! Timed route model.
//!
//! A route is the ordered, timestamped list of stops one agent visits,
//! starting and ending at the warehouse entry. Routes are produced by a
//! [`crate::routing::RoutePlanner`] and consumed by the collision
//! detector, which may delay them.
//!
//! All times are in seconds relative to the start of the batch (t=0).

use serde::{Deserialize, Serialize};

use super::{AgentKind, Location};

/// Units of one order line picked at a stop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickedItem {
    /// Order the units belong to.
    pub order_id: String,
    /// Picked product.
    pub product_id: String,
    /// Number of units.
    pub quantity: u32,
}

impl PickedItem {
    /// Creates a pick record.
    pub fn new(order_id: impl Into<String>, product_id: impl Into<String>, quantity: u32) -> Self {
        Self {
            order_id: order_id.into(),
            product_id: product_id.into(),
            quantity,
        }
    }
}

/// One stop of a route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteStep {
    /// Stop cell.
    pub location: Location,
    /// Arrival time (s).
    pub arrival: f64,
    /// Departure time (s). Equal to `arrival` for pass-through stops.
    pub departure: f64,
    /// Whether the agent is picking while at this stop.
    pub picking: bool,
    /// Units picked here.
    pub picks: Vec<PickedItem>,
    /// Distance travelled from the route start up to this stop (cells).
    pub cumulative_distance: u32,
}

impl RouteStep {
    /// Creates a non-picking stop with zero dwell.
    pub fn new(location: Location, arrival: f64) -> Self {
        Self {
            location,
            arrival,
            departure: arrival,
            picking: false,
            picks: Vec::new(),
            cumulative_distance: 0,
        }
    }

    /// Sets the departure time.
    pub fn with_departure(mut self, departure: f64) -> Self {
        self.departure = departure;
        self
    }

    /// Marks the stop as a pick stop.
    pub fn picking(mut self) -> Self {
        self.picking = true;
        self
    }

    /// Adds a pick record and marks the stop as a pick stop.
    pub fn with_pick(mut self, pick: PickedItem) -> Self {
        self.picks.push(pick);
        self.picking = true;
        self
    }

    /// Sets the cumulative distance.
    pub fn with_cumulative_distance(mut self, distance: u32) -> Self {
        self.cumulative_distance = distance;
        self
    }

    /// Time spent at the stop (s).
    #[inline]
    pub fn dwell(&self) -> f64 {
        self.departure - self.arrival
    }

    /// Shifts both timestamps.
    pub fn shift(&mut self, delta: f64) {
        self.arrival += delta;
        self.departure += delta;
    }
}

/// The timed route of one agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentRoute {
    /// Route owner.
    pub agent_id: String,
    /// Owner classification (decides right-of-way).
    pub agent_kind: AgentKind,
    /// Orders served by this route.
    pub order_ids: Vec<String>,
    /// Stops in visiting order.
    pub steps: Vec<RouteStep>,
    /// Total travelled distance (cells).
    pub total_distance: u32,
    /// Time spent picking (s).
    pub picking_time: f64,
    /// Time from start to the last departure (s), waits included.
    pub total_time: f64,
    /// Operating cost of the route.
    pub cost: f64,
}

impl AgentRoute {
    /// Creates a route from steps, deriving distance and times.
    pub fn new(agent_id: impl Into<String>, agent_kind: AgentKind, steps: Vec<RouteStep>) -> Self {
        let mut route = Self {
            agent_id: agent_id.into(),
            agent_kind,
            order_ids: Vec::new(),
            steps,
            total_distance: 0,
            picking_time: 0.0,
            total_time: 0.0,
            cost: 0.0,
        };
        route.total_distance = route
            .steps
            .windows(2)
            .map(|w| w[0].location.distance_to(&w[1].location))
            .sum();
        route.picking_time = route
            .steps
            .iter()
            .filter(|s| s.picking)
            .map(RouteStep::dwell)
            .sum();
        route.refresh_total_time();
        route
    }

    /// Sets the served orders.
    pub fn with_orders(mut self, order_ids: Vec<String>) -> Self {
        self.order_ids = order_ids;
        self
    }

    /// Sets the route cost.
    pub fn with_cost(mut self, cost: f64) -> Self {
        self.cost = cost;
        self
    }

    /// Start time of the route (s).
    pub fn start_time(&self) -> f64 {
        self.steps.first().map(|s| s.arrival).unwrap_or(0.0)
    }

    /// Time spent moving between stops (s).
    pub fn travel_time(&self) -> f64 {
        self.steps
            .windows(2)
            .map(|w| (w[1].arrival - w[0].departure).max(0.0))
            .sum()
    }

    /// Recomputes `total_time` from the last departure.
    pub fn refresh_total_time(&mut self) {
        self.total_time = self.steps.last().map(|s| s.departure).unwrap_or(0.0) - self.start_time();
    }

    /// Whether the route visits no stop.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Number of stops where the agent picks.
    pub fn pick_stop_count(&self) -> usize {
        self.steps.iter().filter(|s| s.picking).count()
    }
}
