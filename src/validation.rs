//! Input validation for planning runs.
//!
//! Checks structural integrity of the warehouse, catalog, fleet and order
//! batch before planning. Detects:
//! - Duplicate IDs
//! - Orders referencing unknown products
//! - Empty orders and inverted time windows
//! - Positions outside the warehouse grid
//! - Agents with non-positive capacity or speed
//! - Configured pairings that name unknown agents, the wrong kind, or a
//!   partner already claimed by someone else
//!
//! Constraint violations found during allocation are not validation
//! errors; see [`crate::constraints`].

use std::collections::{HashMap, HashSet};

use crate::models::{Agent, AgentKind, Order, Product, Warehouse};

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Two entities share the same ID.
    DuplicateId,
    /// An order line references a product that doesn't exist.
    InvalidProductReference,
    /// A pairing references an agent that doesn't exist.
    InvalidAgentReference,
    /// A pairing joins the wrong kinds or an already-claimed partner.
    InvalidPairing,
    /// An order has no lines or a zero quantity.
    EmptyOrder,
    /// An order's deadline precedes its receive time.
    InvalidTimeWindow,
    /// A position lies outside the warehouse grid.
    OutOfBounds,
    /// Non-positive capacity or speed.
    InvalidAgent,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates the input data of a planning run.
///
/// Checks:
/// 1. Entry point and product locations lie on the grid
/// 2. No duplicate product, agent or order IDs
/// 3. Agents have positive capacities and speed
/// 4. Configured pairings are cart ↔ human and one-to-one
/// 5. Orders are non-empty, reference known products, and end after
///    they start
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_input(
    warehouse: &Warehouse,
    products: &[Product],
    agents: &[Agent],
    orders: &[Order],
) -> ValidationResult {
    let mut errors = Vec::new();

    if !warehouse.contains(&warehouse.entry_point) {
        errors.push(ValidationError::new(
            ValidationErrorKind::OutOfBounds,
            format!("Entry point {} is outside the warehouse", warehouse.entry_point),
        ));
    }

    let mut product_ids = HashSet::new();
    for p in products {
        if !product_ids.insert(p.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate product ID: {}", p.id),
            ));
        }
        if !warehouse.contains(&p.location) {
            errors.push(ValidationError::new(
                ValidationErrorKind::OutOfBounds,
                format!("Product '{}' at {} is outside the warehouse", p.id, p.location),
            ));
        }
    }

    let mut agents_by_id: HashMap<&str, &Agent> = HashMap::new();
    for a in agents {
        if agents_by_id.insert(a.id.as_str(), a).is_some() {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate agent ID: {}", a.id),
            ));
        }
        if a.capacity_weight <= 0.0 || a.capacity_volume <= 0.0 || a.speed <= 0.0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidAgent,
                format!(
                    "Agent '{}' needs positive capacity and speed (weight {}, volume {}, speed {})",
                    a.id, a.capacity_weight, a.capacity_volume, a.speed
                ),
            ));
        }
    }

    errors.extend(check_pairings(agents, &agents_by_id));

    let mut order_ids = HashSet::new();
    for o in orders {
        if !order_ids.insert(o.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate order ID: {}", o.id),
            ));
        }
        if o.items.is_empty() || o.items.iter().any(|i| i.quantity == 0) {
            errors.push(ValidationError::new(
                ValidationErrorKind::EmptyOrder,
                format!("Order '{}' has no items or a zero quantity", o.id),
            ));
        }
        if o.deadline < o.received_time {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidTimeWindow,
                format!(
                    "Order '{}' is due at {} before it is received at {}",
                    o.id, o.deadline, o.received_time
                ),
            ));
        }
        for item in &o.items {
            if !product_ids.contains(item.product_id.as_str()) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidProductReference,
                    format!(
                        "Order '{}' references unknown product '{}'",
                        o.id, item.product_id
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

/// Checks configured pairings from both sides.
fn check_pairings(agents: &[Agent], by_id: &HashMap<&str, &Agent>) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    // human → cart, cart → human
    let mut cart_of: HashMap<&str, &str> = HashMap::new();
    let mut human_of: HashMap<&str, &str> = HashMap::new();

    for a in agents {
        let Some(partner_id) = a.paired_with.as_deref() else {
            continue;
        };
        let Some(partner) = by_id.get(partner_id) else {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidAgentReference,
                format!("Agent '{}' is paired with unknown agent '{partner_id}'", a.id),
            ));
            continue;
        };

        let (cart, human) = match (a.kind, partner.kind) {
            (AgentKind::Cart, AgentKind::Human) => (a.id.as_str(), partner_id),
            (AgentKind::Human, AgentKind::Cart) => (partner_id, a.id.as_str()),
            (kind, partner_kind) => {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidPairing,
                    format!(
                        "Agent '{}' ({kind}) cannot pair with '{partner_id}' ({partner_kind}); only cart and human pair",
                        a.id
                    ),
                ));
                continue;
            }
        };

        if let Some(&other) = cart_of.get(human).filter(|&&c| c != cart) {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidPairing,
                format!("Human '{human}' is paired with both '{other}' and '{cart}'"),
            ));
            continue;
        }
        if let Some(&other) = human_of.get(cart).filter(|&&h| h != human) {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidPairing,
                format!("Cart '{cart}' is paired with both '{other}' and '{human}'"),
            ));
            continue;
        }
        cart_of.insert(human, cart);
        human_of.insert(cart, human);
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ClockTime, Location};

    fn warehouse() -> Warehouse {
        Warehouse::new(10, 8, Location::new(0, 0))
    }

    fn products() -> Vec<Product> {
        vec![
            Product::new("P1", 1.0, 1.0, Location::new(1, 1)),
            Product::new("P2", 2.0, 1.0, Location::new(3, 4)),
        ]
    }

    fn agents() -> Vec<Agent> {
        vec![
            Agent::robot("R1", 20.0, 30.0),
            Agent::human("H1", 35.0, 50.0),
            Agent::cart("C1", 50.0, 80.0).paired_with("H1"),
        ]
    }

    fn orders() -> Vec<Order> {
        vec![
            Order::new("O1").with_item("P1", 1),
            Order::new("O2").with_item("P2", 2).with_item("P1", 1),
        ]
    }

    fn has(errors: &[ValidationError], kind: ValidationErrorKind) -> bool {
        errors.iter().any(|e| e.kind == kind)
    }

    #[test]
    fn test_valid_input() {
        assert!(validate_input(&warehouse(), &products(), &agents(), &orders()).is_ok());
    }

    #[test]
    fn test_duplicate_ids() {
        let mut p = products();
        p.push(Product::new("P1", 1.0, 1.0, Location::new(2, 2)));
        let mut a = agents();
        a.push(Agent::robot("R1", 1.0, 1.0));
        let mut o = orders();
        o.push(Order::new("O1").with_item("P2", 1));

        let errors = validate_input(&warehouse(), &p, &a, &o).unwrap_err();
        let dupes: Vec<_> = errors
            .iter()
            .filter(|e| e.kind == ValidationErrorKind::DuplicateId)
            .collect();
        assert_eq!(dupes.len(), 3);
        assert!(dupes.iter().any(|e| e.message.contains("product")));
        assert!(dupes.iter().any(|e| e.message.contains("agent")));
        assert!(dupes.iter().any(|e| e.message.contains("order")));
    }

    #[test]
    fn test_dangling_product_reference() {
        let o = vec![Order::new("O1").with_item("NOPE", 1)];
        let errors = validate_input(&warehouse(), &products(), &agents(), &o).unwrap_err();
        assert!(has(&errors, ValidationErrorKind::InvalidProductReference));
    }

    #[test]
    fn test_empty_order_and_window() {
        let late = Order::new("O2").with_item("P1", 1).with_window(
            ClockTime::from_hm(10, 0).unwrap(),
            ClockTime::from_hm(9, 0).unwrap(),
        );
        let o = vec![Order::new("O1"), late, Order::new("O3").with_item("P1", 0)];
        let errors = validate_input(&warehouse(), &products(), &agents(), &o).unwrap_err();
        assert_eq!(
            errors
                .iter()
                .filter(|e| e.kind == ValidationErrorKind::EmptyOrder)
                .count(),
            2
        );
        assert!(has(&errors, ValidationErrorKind::InvalidTimeWindow));
    }

    #[test]
    fn test_out_of_bounds() {
        let p = vec![Product::new("P1", 1.0, 1.0, Location::new(10, 2))];
        let o = vec![Order::new("O1").with_item("P1", 1)];
        let errors = validate_input(&warehouse(), &p, &agents(), &o).unwrap_err();
        assert!(has(&errors, ValidationErrorKind::OutOfBounds));

        let w = Warehouse::new(5, 5, Location::new(-1, 0));
        let errors = validate_input(&w, &[], &[], &[]).unwrap_err();
        assert!(has(&errors, ValidationErrorKind::OutOfBounds));
    }

    #[test]
    fn test_invalid_agent() {
        let a = vec![Agent::robot("R1", 0.0, 30.0), Agent::human("H1", 35.0, 50.0).with_speed(0.0)];
        let errors = validate_input(&warehouse(), &products(), &a, &orders()).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(|e| e.kind == ValidationErrorKind::InvalidAgent));
    }

    #[test]
    fn test_bad_pairings() {
        let a = vec![
            Agent::robot("R1", 20.0, 30.0).paired_with("H1"),
            Agent::human("H1", 35.0, 50.0),
            Agent::cart("C1", 50.0, 80.0).paired_with("H1"),
            Agent::cart("C2", 50.0, 80.0).paired_with("H1"),
            Agent::cart("C3", 50.0, 80.0).paired_with("GHOST"),
        ];
        let errors = validate_input(&warehouse(), &products(), &a, &orders()).unwrap_err();
        let pairing = errors
            .iter()
            .filter(|e| e.kind == ValidationErrorKind::InvalidPairing)
            .count();
        assert_eq!(pairing, 2); // robot, and C2 claiming H1
        assert!(has(&errors, ValidationErrorKind::InvalidAgentReference));
    }

    #[test]
    fn test_mutual_pairing_is_fine() {
        let a = vec![
            Agent::human("H1", 35.0, 50.0).paired_with("C1"),
            Agent::cart("C1", 50.0, 80.0).paired_with("H1"),
        ];
        assert!(validate_input(&warehouse(), &products(), &a, &orders()).is_ok());
    }

    #[test]
    fn test_multiple_errors() {
        let o = vec![Order::new("O1").with_item("X", 1), Order::new("O1")];
        let errors = validate_input(&warehouse(), &products(), &agents(), &o).unwrap_err();
        assert!(errors.len() >= 3);
    }
}
