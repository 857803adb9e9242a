//! Hard-constraint checks for order assignment.
//!
//! Every predicate is pure: it evaluates an agent snapshot (configuration
//! plus per-pass [`AgentState`]) against an order and never mutates
//! anything. Failures are structured [`ConstraintViolation`] values, not
//! errors; a violation only means "this agent cannot take this order now".
//!
//! | Check | Applies to | Fails when |
//! |-------|-----------|------------|
//! | capacity | all | load + order exceeds weight or volume capacity |
//! | product compatibility | all | two products list each other (either side) |
//! | robot restrictions | robots | forbidden zone, fragile item, unit too heavy |
//! | cart assignment | carts | no paired human |
//! | deadline (optional) | all | estimated pick time exceeds time to deadline |
//!
//! [`ConstraintChecker::validate_solution`] re-checks a finished
//! allocation: every order held by exactly one agent, and every agent's
//! commitments feasible when replayed in order.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::fleet::{AgentState, Fleet};
use crate::models::{Agent, AgentKind, Catalog, Order, Product, Warehouse};

/// Result of a multi-violation check.
pub type CheckResult = Result<(), Vec<ConstraintViolation>>;

/// Capacity dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CapacityDimension {
    /// Weight (kg).
    Weight,
    /// Volume (dm³).
    Volume,
}

/// Classification of constraint violations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ViolationKind {
    /// Load would exceed capacity in `dimension` by `excess`.
    Capacity {
        dimension: CapacityDimension,
        excess: f64,
    },
    /// Two products may not share a load.
    IncompatibleProducts { first: String, second: String },
    /// Product lies in a zone the agent may not enter.
    RestrictedZone { zone: String, product_id: String },
    /// Fragile product refused by the agent.
    FragileItem { product_id: String },
    /// A single unit is heavier than the agent accepts.
    ItemTooHeavy { product_id: String, excess: f64 },
    /// Cart without a human partner.
    UnpairedCart,
    /// Non-cart agent flagged `requires_human`; only carts can be paired.
    HumanRequired,
    /// Estimated completion does not fit before the deadline (minutes).
    DeadlineInfeasible { required: f64, available: f64 },
    /// Pairing between the wrong kinds or with an already-paired agent.
    InvalidPairing,
    /// Order held by no agent.
    UnassignedOrder { order_id: String },
    /// Order held by more than one agent.
    DuplicateAssignment { order_id: String, agents: Vec<String> },
}

impl ViolationKind {
    /// Short category label for summaries.
    pub fn category(&self) -> &'static str {
        match self {
            ViolationKind::Capacity { .. } => "capacity",
            ViolationKind::IncompatibleProducts { .. } => "compatibility",
            ViolationKind::RestrictedZone { .. }
            | ViolationKind::FragileItem { .. }
            | ViolationKind::ItemTooHeavy { .. } => "robot_restriction",
            ViolationKind::UnpairedCart | ViolationKind::HumanRequired => "cart",
            ViolationKind::DeadlineInfeasible { .. } => "deadline",
            ViolationKind::InvalidPairing => "pairing",
            ViolationKind::UnassignedOrder { .. }
            | ViolationKind::DuplicateAssignment { .. } => "completeness",
        }
    }
}

/// A constraint violation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintViolation {
    /// Type of violation.
    pub kind: ViolationKind,
    /// Related entity (agent or product id).
    pub entity_id: String,
    /// Human-readable description.
    pub message: String,
}

impl ConstraintViolation {
    /// Creates a violation.
    pub fn new(kind: ViolationKind, entity_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            entity_id: entity_id.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConstraintViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind.category(), self.message)
    }
}

/// Stateless constraint checker over a warehouse and product catalog.
#[derive(Debug, Clone, Copy)]
pub struct ConstraintChecker<'a> {
    warehouse: &'a Warehouse,
    catalog: &'a Catalog,
    enforce_deadlines: bool,
    pick_seconds_per_item: f64,
}

impl<'a> ConstraintChecker<'a> {
    /// Creates a checker. Deadline checks are off.
    pub fn new(warehouse: &'a Warehouse, catalog: &'a Catalog) -> Self {
        Self {
            warehouse,
            catalog,
            enforce_deadlines: false,
            pick_seconds_per_item: 30.0,
        }
    }

    /// Includes the deadline estimate in [`Self::can_assign_order`].
    pub fn with_deadlines(mut self, pick_seconds_per_item: f64) -> Self {
        self.enforce_deadlines = true;
        self.pick_seconds_per_item = pick_seconds_per_item;
        self
    }

    /// The catalog orders are resolved against.
    pub fn catalog(&self) -> &'a Catalog {
        self.catalog
    }

    /// Capacity check: current load + order totals within both limits.
    ///
    /// Weight is reported before volume.
    pub fn capacity(
        &self,
        agent: &Agent,
        state: &AgentState,
        order: &Order,
    ) -> Result<(), ConstraintViolation> {
        let weight = state.load_weight + order.total_weight;
        if weight > agent.capacity_weight {
            return Err(ConstraintViolation::new(
                ViolationKind::Capacity {
                    dimension: CapacityDimension::Weight,
                    excess: weight - agent.capacity_weight,
                },
                &agent.id,
                format!(
                    "weight capacity exceeded: {weight:.2}kg > {}kg",
                    agent.capacity_weight
                ),
            ));
        }

        let volume = state.load_volume + order.total_volume;
        if volume > agent.capacity_volume {
            return Err(ConstraintViolation::new(
                ViolationKind::Capacity {
                    dimension: CapacityDimension::Volume,
                    excess: volume - agent.capacity_volume,
                },
                &agent.id,
                format!(
                    "volume capacity exceeded: {volume:.2}dm3 > {}dm3",
                    agent.capacity_volume
                ),
            ));
        }

        Ok(())
    }

    /// Pairwise compatibility scan; fails on the first incompatible pair.
    pub fn product_compatibility(&self, products: &[&Product]) -> Result<(), ConstraintViolation> {
        for (i, a) in products.iter().enumerate() {
            for b in &products[i + 1..] {
                if !a.is_compatible_with(b) {
                    return Err(incompatible(a, b));
                }
            }
        }
        Ok(())
    }

    /// Compatibility of incoming products against products already carried.
    ///
    /// Only cross pairs are scanned; pairs inside either set are covered by
    /// [`Self::product_compatibility`].
    pub fn load_compatibility(
        &self,
        state: &AgentState,
        incoming: &[&Product],
    ) -> Result<(), ConstraintViolation> {
        for carried_id in &state.carried_products {
            let Some(carried) = self.catalog.get(carried_id) else {
                continue;
            };
            for p in incoming {
                if !carried.is_compatible_with(p) {
                    return Err(incompatible(carried, p));
                }
            }
        }
        Ok(())
    }

    /// Robot-only handling restrictions. Reports every offending item.
    ///
    /// Always passes for non-robot agents.
    pub fn robot_restrictions(&self, agent: &Agent, order: &Order) -> CheckResult {
        if agent.kind != AgentKind::Robot {
            return Ok(());
        }

        let restrictions = &agent.restrictions;
        let mut errors = Vec::new();

        for (product, _) in order.lines(self.catalog) {
            let zone = self.warehouse.zone_at(&product.location);
            if !restrictions.can_access_zone(zone) {
                let zone = zone.unwrap_or_default();
                errors.push(ConstraintViolation::new(
                    ViolationKind::RestrictedZone {
                        zone: zone.to_string(),
                        product_id: product.id.clone(),
                    },
                    &agent.id,
                    format!(
                        "robot {} may not enter zone {zone} (product {})",
                        agent.id, product.id
                    ),
                ));
            }

            if restrictions.no_fragile && product.fragile {
                errors.push(ConstraintViolation::new(
                    ViolationKind::FragileItem {
                        product_id: product.id.clone(),
                    },
                    &agent.id,
                    format!(
                        "robot {} cannot carry fragile product {}",
                        agent.id, product.id
                    ),
                ));
            }

            if let Some(max) = restrictions.max_item_weight {
                if product.weight > max {
                    errors.push(ConstraintViolation::new(
                        ViolationKind::ItemTooHeavy {
                            product_id: product.id.clone(),
                            excess: product.weight - max,
                        },
                        &agent.id,
                        format!(
                            "product {} too heavy: {}kg > {max}kg",
                            product.id, product.weight
                        ),
                    ));
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Human-partner check.
    ///
    /// Carts must currently be paired with a human. A robot whose
    /// restrictions set `requires_human` can never be paired and always
    /// fails. Humans always pass.
    pub fn cart_assignment(
        &self,
        agent: &Agent,
        state: &AgentState,
    ) -> Result<(), ConstraintViolation> {
        match agent.kind {
            AgentKind::Cart if !state.is_paired() => Err(ConstraintViolation::new(
                ViolationKind::UnpairedCart,
                &agent.id,
                format!("cart {} needs an assigned human", agent.id),
            )),
            AgentKind::Robot if agent.restrictions.requires_human => {
                Err(ConstraintViolation::new(
                    ViolationKind::HumanRequired,
                    &agent.id,
                    format!(
                        "{} {} requires a human partner but only carts can be paired",
                        agent.kind, agent.id
                    ),
                ))
            }
            AgentKind::Cart | AgentKind::Robot | AgentKind::Human => Ok(()),
        }
    }

    /// Rough feasibility of finishing the order before its deadline.
    ///
    /// Estimate: one-way entry distance to every distinct rack location at
    /// the agent's speed, plus a fixed pick time per order line.
    pub fn deadline_feasible(&self, agent: &Agent, order: &Order) -> Result<(), ConstraintViolation> {
        let locations = order.unique_locations(self.catalog);
        if locations.is_empty() {
            return Ok(());
        }

        let entry = self.warehouse.entry_point;
        let distance: u32 = locations.iter().map(|l| entry.distance_to(l)).sum();
        let travel_minutes = if agent.speed > 0.0 {
            distance as f64 / agent.speed / 60.0
        } else {
            f64::INFINITY
        };
        let pick_minutes = order.line_count() as f64 * self.pick_seconds_per_item / 60.0;
        let required = travel_minutes + pick_minutes;
        let available = order.time_to_deadline() as f64;

        if required > available {
            return Err(ConstraintViolation::new(
                ViolationKind::DeadlineInfeasible {
                    required,
                    available,
                },
                &agent.id,
                format!("not enough time: {required:.1}min needed, {available:.1}min available"),
            ));
        }
        Ok(())
    }

    /// Aggregates every applicable check and returns all violations found.
    pub fn can_assign_order(&self, agent: &Agent, state: &AgentState, order: &Order) -> CheckResult {
        let mut errors = Vec::new();
        let products = order.products(self.catalog);

        if let Err(e) = self.capacity(agent, state, order) {
            errors.push(e);
        }
        if let Err(e) = self.product_compatibility(&products) {
            errors.push(e);
        }
        if let Err(e) = self.load_compatibility(state, &products) {
            errors.push(e);
        }
        if let Err(mut e) = self.robot_restrictions(agent, order) {
            errors.append(&mut e);
        }
        if let Err(e) = self.cart_assignment(agent, state) {
            errors.push(e);
        }
        if self.enforce_deadlines {
            if let Err(e) = self.deadline_feasible(agent, order) {
                errors.push(e);
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Re-checks a finished allocation.
    ///
    /// Each agent's orders are replayed in commitment order onto an empty
    /// load that keeps the agent's pairing, and every order must pass
    /// [`Self::can_assign_order`] at its point in the replay. Then every
    /// order of `orders` must be held by exactly one agent. Order ids a
    /// state lists but `orders` does not contain are ignored.
    pub fn validate_solution(&self, fleet: &Fleet, orders: &[Order]) -> CheckResult {
        let mut errors = Vec::new();
        let by_id: HashMap<&str, &Order> = orders.iter().map(|o| (o.id.as_str(), o)).collect();
        let mut holders: HashMap<&str, Vec<String>> = HashMap::new();

        for (agent, state) in fleet.iter() {
            let mut replay = AgentState {
                partner: state.partner,
                ..AgentState::default()
            };
            for order_id in &state.assigned_orders {
                holders
                    .entry(order_id.as_str())
                    .or_default()
                    .push(agent.id.clone());
                if let Some(order) = by_id.get(order_id.as_str()) {
                    if let Err(mut e) = self.can_assign_order(agent, &replay, order) {
                        errors.append(&mut e);
                    }
                    replay.commit(order, self.catalog);
                }
            }
        }

        for order in orders {
            match holders.remove(order.id.as_str()) {
                None => errors.push(ConstraintViolation::new(
                    ViolationKind::UnassignedOrder {
                        order_id: order.id.clone(),
                    },
                    &order.id,
                    format!("order {} is not assigned", order.id),
                )),
                Some(agents) if agents.len() > 1 => errors.push(ConstraintViolation::new(
                    ViolationKind::DuplicateAssignment {
                        order_id: order.id.clone(),
                        agents: agents.clone(),
                    },
                    &order.id,
                    format!("order {} held by {}", order.id, agents.join(", ")),
                )),
                Some(_) => {}
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn incompatible(a: &Product, b: &Product) -> ConstraintViolation {
    ConstraintViolation::new(
        ViolationKind::IncompatibleProducts {
            first: a.id.clone(),
            second: b.id.clone(),
        },
        &a.id,
        format!(
            "incompatible products: {} ({}) and {} ({})",
            a.id, a.category, b.id, b.category
        ),
    )
}
