//! Agent model.
//!
//! Agents are the mobile entities that carry orders: autonomous robots,
//! human pickers, and push carts. The kind set is closed; every
//! kind-specific rule is an exhaustive `match` on [`AgentKind`].
//!
//! Agents are read-only configuration during a planning run. Mutable
//! per-pass state (load, carried products, pairing) lives in
//! [`crate::fleet::AgentState`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Agent classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentKind {
    /// Autonomous mobile robot. Cheapest; subject to handling restrictions.
    Robot,
    /// Human picker.
    Human,
    /// Push cart. Operational only when paired with a human.
    Cart,
}

impl AgentKind {
    /// Allocation preference (lower = tried first): robot, cart, human.
    pub fn allocation_rank(self) -> u8 {
        match self {
            AgentKind::Robot => 0,
            AgentKind::Cart => 1,
            AgentKind::Human => 2,
        }
    }

    /// Right-of-way in conflict resolution (higher = keeps moving).
    ///
    /// Robots yield first, then carts; humans are never delayed by a
    /// lower kind.
    pub fn right_of_way(self) -> u8 {
        match self {
            AgentKind::Robot => 0,
            AgentKind::Cart => 1,
            AgentKind::Human => 2,
        }
    }

    /// Lowercase name as used in input files.
    pub fn as_str(self) -> &'static str {
        match self {
            AgentKind::Robot => "robot",
            AgentKind::Human => "human",
            AgentKind::Cart => "cart",
        }
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Handling restrictions of an agent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Restrictions {
    /// Zone ids the agent may not enter.
    pub no_zones: Vec<String>,
    /// Whether fragile products are refused.
    pub no_fragile: bool,
    /// Heaviest single unit accepted (kg). `None` = unlimited.
    pub max_item_weight: Option<f64>,
    /// Whether the agent needs a human partner to operate. Always set for
    /// carts; a robot with this flag is never assignable.
    pub requires_human: bool,
}

impl Restrictions {
    /// Whether the agent may enter a zone. Cells outside any zone are open.
    pub fn can_access_zone(&self, zone_id: Option<&str>) -> bool {
        match zone_id {
            Some(zone) => !self.no_zones.iter().any(|z| z == zone),
            None => true,
        }
    }
}

/// A fleet member.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    /// Unique agent identifier.
    pub id: String,
    /// Agent classification.
    pub kind: AgentKind,
    /// Maximum carried weight (kg).
    pub capacity_weight: f64,
    /// Maximum carried volume (dm³).
    pub capacity_volume: f64,
    /// Travel speed (cells per second).
    pub speed: f64,
    /// Operating cost per hour.
    pub cost_per_hour: f64,
    /// Handling restrictions.
    pub restrictions: Restrictions,
    /// Preconfigured partner id (cart ↔ human).
    pub paired_with: Option<String>,
}

impl Agent {
    /// Creates an agent with the given capacities and default speed 1.0.
    pub fn new(
        id: impl Into<String>,
        kind: AgentKind,
        capacity_weight: f64,
        capacity_volume: f64,
    ) -> Self {
        let requires_human = kind == AgentKind::Cart;
        Self {
            id: id.into(),
            kind,
            capacity_weight,
            capacity_volume,
            speed: 1.0,
            cost_per_hour: 0.0,
            restrictions: Restrictions {
                requires_human,
                ..Restrictions::default()
            },
            paired_with: None,
        }
    }

    /// Creates a robot.
    pub fn robot(id: impl Into<String>, capacity_weight: f64, capacity_volume: f64) -> Self {
        Self::new(id, AgentKind::Robot, capacity_weight, capacity_volume)
    }

    /// Creates a human picker.
    pub fn human(id: impl Into<String>, capacity_weight: f64, capacity_volume: f64) -> Self {
        Self::new(id, AgentKind::Human, capacity_weight, capacity_volume)
    }

    /// Creates a cart.
    pub fn cart(id: impl Into<String>, capacity_weight: f64, capacity_volume: f64) -> Self {
        Self::new(id, AgentKind::Cart, capacity_weight, capacity_volume)
    }

    /// Sets the travel speed.
    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = speed;
        self
    }

    /// Sets the hourly cost.
    pub fn with_cost(mut self, cost_per_hour: f64) -> Self {
        self.cost_per_hour = cost_per_hour;
        self
    }

    /// Replaces the restriction set.
    pub fn with_restrictions(mut self, restrictions: Restrictions) -> Self {
        self.restrictions = restrictions;
        self
    }

    /// Forbids a zone.
    pub fn without_zone(mut self, zone_id: impl Into<String>) -> Self {
        self.restrictions.no_zones.push(zone_id.into());
        self
    }

    /// Refuses fragile products.
    pub fn no_fragile(mut self) -> Self {
        self.restrictions.no_fragile = true;
        self
    }

    /// Caps the weight of a single unit.
    pub fn with_max_item_weight(mut self, kg: f64) -> Self {
        self.restrictions.max_item_weight = Some(kg);
        self
    }

    /// Preconfigures a partner.
    pub fn paired_with(mut self, partner_id: impl Into<String>) -> Self {
        self.paired_with = Some(partner_id.into());
        self
    }
}

impl fmt::Display for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.kind, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_builder() {
        let r = Agent::robot("R1", 20.0, 30.0)
            .with_speed(2.0)
            .with_cost(5.0)
            .without_zone("C")
            .no_fragile()
            .with_max_item_weight(10.0);

        assert_eq!(r.id, "R1");
        assert_eq!(r.kind, AgentKind::Robot);
        assert!((r.speed - 2.0).abs() < 1e-10);
        assert!(r.restrictions.no_fragile);
        assert_eq!(r.restrictions.max_item_weight, Some(10.0));
        assert!(!r.restrictions.can_access_zone(Some("C")));
        assert!(r.restrictions.can_access_zone(Some("A")));
        assert!(r.restrictions.can_access_zone(None));
        assert_eq!(r.to_string(), "robot(R1)");
    }

    #[test]
    fn test_cart_requires_human_by_default() {
        assert!(Agent::cart("C1", 50.0, 80.0).restrictions.requires_human);
        assert!(!Agent::human("H1", 35.0, 50.0).restrictions.requires_human);
    }

    #[test]
    fn test_kind_orderings() {
        assert!(AgentKind::Robot.allocation_rank() < AgentKind::Cart.allocation_rank());
        assert!(AgentKind::Cart.allocation_rank() < AgentKind::Human.allocation_rank());
        assert!(AgentKind::Human.right_of_way() > AgentKind::Cart.right_of_way());
        assert!(AgentKind::Cart.right_of_way() > AgentKind::Robot.right_of_way());
    }

    #[test]
    fn test_kind_serde_lowercase() {
        let json = serde_json::to_string(&AgentKind::Cart).unwrap();
        assert_eq!(json, "\"cart\"");
        let kind: AgentKind = serde_json::from_str("\"robot\"").unwrap();
        assert_eq!(kind, AgentKind::Robot);
    }
}
