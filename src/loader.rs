//! JSON input loading.
//!
//! Reads the four input documents of a planning run (warehouse, products,
//! agents, orders) into domain types. Malformed input is fatal and
//! surfaces as [`PlanError`]:
//!
//! | Problem | Error |
//! |---------|-------|
//! | invalid JSON / wrong field types | [`PlanError::Json`] |
//! | agent `type` not robot/human/cart | [`PlanError::UnknownAgentKind`] |
//! | `priority` not standard/express | [`PlanError::UnknownPriority`] |
//! | time not `"HH:MM"` | [`PlanError::ClockTime`] |
//! | no grid dimensions | [`PlanError::MissingField`] |
//! | dangling references, duplicates, ... | [`PlanError::Invalid`] (via [`PlanInput::validate`]) |

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{debug, info};

use crate::error::{PlanError, Result};
use crate::models::{
    Agent, AgentKind, Catalog, ClockTime, Location, Order, OrderItem, Priority, Product,
    Restrictions, Warehouse, Zone,
};
use crate::validation::validate_input;

#[derive(Debug, Deserialize)]
struct DimensionsDto {
    width: i32,
    height: i32,
}

#[derive(Debug, Deserialize)]
struct ZoneDto {
    #[serde(default)]
    name: String,
    #[serde(default, rename = "type")]
    zone_type: String,
    #[serde(default)]
    coords: Vec<(i32, i32)>,
    #[serde(default)]
    restrictions: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct WarehouseDto {
    width: Option<i32>,
    height: Option<i32>,
    dimensions: Option<DimensionsDto>,
    entry_point: (i32, i32),
    #[serde(default)]
    zones: BTreeMap<String, ZoneDto>,
    #[serde(default)]
    aisles: Vec<(i32, i32)>,
}

#[derive(Debug, Deserialize)]
struct ProductDto {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    category: String,
    weight: f64,
    volume: f64,
    location: (i32, i32),
    #[serde(default)]
    frequency: String,
    #[serde(default)]
    fragile: bool,
    #[serde(default)]
    incompatible_with: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct AgentDto {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    capacity_weight: f64,
    capacity_volume: f64,
    speed: f64,
    cost_per_hour: f64,
    #[serde(default)]
    restrictions: Restrictions,
    #[serde(default)]
    paired_with: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OrderItemDto {
    product_id: String,
    quantity: u32,
}

#[derive(Debug, Deserialize)]
struct OrderDto {
    id: String,
    received_time: String,
    deadline: String,
    #[serde(default = "default_priority")]
    priority: String,
    items: Vec<OrderItemDto>,
}

fn default_priority() -> String {
    "standard".to_string()
}

/// Reads a warehouse document.
///
/// Grid size is taken from `width`/`height` or from `dimensions`.
pub fn load_warehouse<R: Read>(reader: R) -> Result<Warehouse> {
    let dto: WarehouseDto = serde_json::from_reader(reader)?;

    let (width, height) = match (dto.width, dto.height, dto.dimensions) {
        (Some(w), Some(h), _) => (w, h),
        (_, _, Some(d)) => (d.width, d.height),
        (None, _, None) => return Err(missing("warehouse", "width")),
        (_, None, None) => return Err(missing("warehouse", "height")),
    };

    let mut warehouse = Warehouse::new(width, height, Location::from(dto.entry_point))
        .with_aisles(dto.aisles.into_iter().map(Location::from));

    for (id, z) in dto.zones {
        let mut zone = Zone::new(id)
            .with_name(z.name)
            .with_type(z.zone_type)
            .with_coords(z.coords.into_iter().map(Location::from));
        for tag in z.restrictions {
            zone = zone.with_restriction(tag);
        }
        warehouse = warehouse.with_zone(zone);
    }

    debug!(
        width,
        height,
        zones = warehouse.zones.len(),
        aisles = warehouse.aisles.len(),
        "warehouse loaded"
    );
    Ok(warehouse)
}

/// Reads a product list.
pub fn load_products<R: Read>(reader: R) -> Result<Vec<Product>> {
    let dtos: Vec<ProductDto> = serde_json::from_reader(reader)?;
    let products = dtos
        .into_iter()
        .map(|p| {
            let mut product = Product::new(p.id, p.weight, p.volume, Location::from(p.location))
                .with_name(p.name)
                .with_category(p.category)
                .with_frequency(p.frequency);
            if p.fragile {
                product = product.fragile();
            }
            for other in p.incompatible_with {
                product = product.incompatible_with(other);
            }
            product
        })
        .collect::<Vec<_>>();
    debug!(count = products.len(), "products loaded");
    Ok(products)
}

/// Reads an agent list.
///
/// Carts always require a human partner, whatever their restrictions say.
pub fn load_agents<R: Read>(reader: R) -> Result<Vec<Agent>> {
    let dtos: Vec<AgentDto> = serde_json::from_reader(reader)?;
    let agents = dtos
        .into_iter()
        .map(|a| -> Result<Agent> {
            let kind = parse_kind(&a.kind).ok_or_else(|| PlanError::UnknownAgentKind {
                agent_id: a.id.clone(),
                kind: a.kind.clone(),
            })?;

            let mut restrictions = a.restrictions;
            restrictions.requires_human |= kind == AgentKind::Cart;

            let mut agent = Agent::new(a.id, kind, a.capacity_weight, a.capacity_volume)
                .with_speed(a.speed)
                .with_cost(a.cost_per_hour)
                .with_restrictions(restrictions);
            if let Some(partner) = a.paired_with {
                agent = agent.paired_with(partner);
            }
            Ok(agent)
        })
        .collect::<Result<Vec<_>>>()?;
    debug!(count = agents.len(), "agents loaded");
    Ok(agents)
}

/// Reads an order list and computes totals against `catalog`.
pub fn load_orders<R: Read>(reader: R, catalog: &Catalog) -> Result<Vec<Order>> {
    let dtos: Vec<OrderDto> = serde_json::from_reader(reader)?;
    let orders = dtos
        .into_iter()
        .map(|o| -> Result<Order> {
            let priority = parse_priority(&o.priority).ok_or_else(|| PlanError::UnknownPriority {
                order_id: o.id.clone(),
                priority: o.priority.clone(),
            })?;
            let received: ClockTime = o.received_time.parse()?;
            let deadline: ClockTime = o.deadline.parse()?;

            let mut order = Order::new(o.id)
                .with_priority(priority)
                .with_window(received, deadline);
            order.items = o
                .items
                .into_iter()
                .map(|i| OrderItem::new(i.product_id, i.quantity))
                .collect();
            order.calculate_totals(catalog);
            Ok(order)
        })
        .collect::<Result<Vec<_>>>()?;
    debug!(count = orders.len(), "orders loaded");
    Ok(orders)
}

fn parse_kind(s: &str) -> Option<AgentKind> {
    match s {
        "robot" => Some(AgentKind::Robot),
        "human" => Some(AgentKind::Human),
        "cart" => Some(AgentKind::Cart),
        _ => None,
    }
}

fn parse_priority(s: &str) -> Option<Priority> {
    match s {
        "standard" => Some(Priority::Standard),
        "express" => Some(Priority::Express),
        _ => None,
    }
}

fn missing(entity: &str, field: &str) -> PlanError {
    PlanError::MissingField {
        entity: entity.to_string(),
        field: field.to_string(),
    }
}

/// All input of one planning run.
#[derive(Debug, Clone)]
pub struct PlanInput {
    /// Floor layout.
    pub warehouse: Warehouse,
    /// Product list, in file order.
    pub products: Vec<Product>,
    /// Fleet, in file order.
    pub agents: Vec<Agent>,
    /// Order batch, in file order, with totals computed.
    pub orders: Vec<Order>,
}

impl PlanInput {
    /// Parses the four documents from strings.
    pub fn from_json(warehouse: &str, products: &str, agents: &str, orders: &str) -> Result<Self> {
        let warehouse = load_warehouse(warehouse.as_bytes())?;
        let products = load_products(products.as_bytes())?;
        let catalog: Catalog = products.iter().cloned().collect();
        let agents = load_agents(agents.as_bytes())?;
        let orders = load_orders(orders.as_bytes(), &catalog)?;
        Ok(Self {
            warehouse,
            products,
            agents,
            orders,
        })
    }

    /// Reads `warehouse.json`, `products.json`, `agents.json` and
    /// `orders.json` from a directory.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let open = |name: &str| -> Result<BufReader<File>> {
            Ok(BufReader::new(File::open(dir.join(name))?))
        };

        let warehouse = load_warehouse(open("warehouse.json")?)?;
        let products = load_products(open("products.json")?)?;
        let catalog: Catalog = products.iter().cloned().collect();
        let agents = load_agents(open("agents.json")?)?;
        let orders = load_orders(open("orders.json")?, &catalog)?;

        info!(
            dir = %dir.display(),
            products = products.len(),
            agents = agents.len(),
            orders = orders.len(),
            "input loaded"
        );
        Ok(Self {
            warehouse,
            products,
            agents,
            orders,
        })
    }

    /// Product lookup built from the product list.
    pub fn catalog(&self) -> Catalog {
        self.products.iter().cloned().collect()
    }

    /// Structural validation; fails with every problem found.
    pub fn validate(&self) -> Result<()> {
        validate_input(&self.warehouse, &self.products, &self.agents, &self.orders)
            .map_err(PlanError::Invalid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WAREHOUSE: &str = r#"{
        "dimensions": {"width": 10, "height": 8},
        "entry_point": [0, 0],
        "zones": {
            "A": {"name": "Electronics", "type": "electronics", "coords": [[1, 1], [2, 1]], "restrictions": []},
            "C": {"name": "Food", "type": "food", "coords": [[8, 1]], "restrictions": ["temperature_controlled"]}
        }
    }"#;

    const PRODUCTS: &str = r#"[
        {"id": "P1", "name": "Phone", "category": "electronics", "weight": 0.3, "volume": 0.5,
         "location": [1, 1], "frequency": "high", "fragile": true, "incompatible_with": []},
        {"id": "P2", "name": "Bleach", "category": "chemical", "weight": 2.0, "volume": 2.0,
         "location": [8, 1], "frequency": "low", "fragile": false, "incompatible_with": ["P1"]}
    ]"#;

    const AGENTS: &str = r#"[
        {"id": "R1", "type": "robot", "capacity_weight": 20, "capacity_volume": 30, "speed": 2.0,
         "cost_per_hour": 5, "restrictions": {"no_zones": ["C"], "no_fragile": true, "max_item_weight": 10}},
        {"id": "H1", "type": "human", "capacity_weight": 35, "capacity_volume": 50, "speed": 1.5,
         "cost_per_hour": 25},
        {"id": "C1", "type": "cart", "capacity_weight": 50, "capacity_volume": 80, "speed": 1.2,
         "cost_per_hour": 3, "restrictions": {}}
    ]"#;

    const ORDERS: &str = r#"[
        {"id": "O1", "received_time": "08:00", "deadline": "10:00", "priority": "express",
         "items": [{"product_id": "P1", "quantity": 2}, {"product_id": "P2", "quantity": 1}]},
        {"id": "O2", "received_time": "08:15", "deadline": "12:00", "priority": "standard",
         "items": [{"product_id": "P2", "quantity": 3}]}
    ]"#;

    #[test]
    fn test_load_all() {
        let input = PlanInput::from_json(WAREHOUSE, PRODUCTS, AGENTS, ORDERS).unwrap();
        assert_eq!(input.warehouse.width, 10);
        assert_eq!(input.warehouse.zone_at(&Location::new(8, 1)), Some("C"));
        assert!(input.warehouse.zones["C"].has_restriction("temperature_controlled"));

        let catalog = input.catalog();
        assert!(catalog.get("P1").unwrap().fragile);
        assert!(!catalog.get("P1").unwrap().is_compatible_with(catalog.get("P2").unwrap()));

        let r1 = &input.agents[0];
        assert_eq!(r1.kind, AgentKind::Robot);
        assert_eq!(r1.restrictions.no_zones, vec!["C"]);
        assert_eq!(r1.restrictions.max_item_weight, Some(10.0));
        assert!(input.agents[2].restrictions.requires_human);

        let o1 = &input.orders[0];
        assert_eq!(o1.priority, Priority::Express);
        assert_eq!(o1.time_to_deadline(), 120);
        assert!((o1.total_weight - 2.6).abs() < 1e-10);
        assert!((o1.total_volume - 3.0).abs() < 1e-10);

        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_flat_dimensions_and_aisles() {
        let w = load_warehouse(
            r#"{"width": 6, "height": 4, "entry_point": [0, 0], "aisles": [[1, 0], [1, 1]]}"#.as_bytes(),
        )
        .unwrap();
        assert_eq!((w.width, w.height), (6, 4));
        assert!(w.is_aisle(&Location::new(1, 1)));
        assert!(w.zones.is_empty());
    }

    #[test]
    fn test_missing_dimensions() {
        let err = load_warehouse(r#"{"entry_point": [0, 0]}"#.as_bytes()).unwrap_err();
        assert!(matches!(err, PlanError::MissingField { .. }));
    }

    #[test]
    fn test_unknown_agent_kind() {
        let json = r#"[{"id": "D1", "type": "drone", "capacity_weight": 1, "capacity_volume": 1,
                        "speed": 1, "cost_per_hour": 1}]"#;
        let err = load_agents(json.as_bytes()).unwrap_err();
        match err {
            PlanError::UnknownAgentKind { agent_id, kind } => {
                assert_eq!(agent_id, "D1");
                assert_eq!(kind, "drone");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_bad_time_and_priority() {
        let catalog = Catalog::new();
        let bad_time = r#"[{"id": "O1", "received_time": "8h", "deadline": "10:00", "items": []}]"#;
        assert!(matches!(
            load_orders(bad_time.as_bytes(), &catalog).unwrap_err(),
            PlanError::ClockTime(_)
        ));

        let bad_priority = r#"[{"id": "O1", "received_time": "08:00", "deadline": "10:00",
                               "priority": "urgent", "items": []}]"#;
        assert!(matches!(
            load_orders(bad_priority.as_bytes(), &catalog).unwrap_err(),
            PlanError::UnknownPriority { .. }
        ));
    }

    #[test]
    fn test_dangling_reference_is_fatal() {
        let orders = r#"[{"id": "O1", "received_time": "08:00", "deadline": "10:00",
                         "items": [{"product_id": "P9", "quantity": 1}]}]"#;
        let input = PlanInput::from_json(WAREHOUSE, PRODUCTS, AGENTS, orders).unwrap();
        let err = input.validate().unwrap_err();
        assert!(matches!(err, PlanError::Invalid(_)));
        assert!(err.to_string().contains("P9"));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            load_products("[{".as_bytes()).unwrap_err(),
            PlanError::Json(_)
        ));
    }

    #[test]
    fn test_missing_dir() {
        let err = PlanInput::from_dir("/nonexistent/u-pick-input").unwrap_err();
        assert!(matches!(err, PlanError::Io(_)));
    }
}
