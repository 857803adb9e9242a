//! Storage slotting analysis.
//!
//! Studies an order history and proposes new rack locations that bring
//! frequently ordered products closer to the entry point, without moving
//! a product out of the zone its category belongs to.
//!
//! # Algorithm
//!
//! 1. Count ordered units per product.
//! 2. Map each product's category to a zone: an explicit mapping first,
//!    otherwise the first zone (by id) whose type equals the category.
//! 3. Per zone, sort cells by entry distance and products by descending
//!    frequency (ties by id), then pair them up.
//! 4. Products without a zone or a free cell keep their location.
//!
//! Proposals only; nothing in the catalog is moved.
//!
//! # Reference
//! Frazelle (2002), "World-Class Warehousing and Material Handling", ch. 4

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

use crate::models::{Catalog, Location, Order, Product, Warehouse};

/// Before/after entry distances of a proposed layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageImprovement {
    /// Σ entry distance of each order's distinct locations, current layout.
    pub current_total_distance: u32,
    /// Same sum under the proposed layout.
    pub new_total_distance: u32,
    /// Current total per order.
    pub current_avg_distance: f64,
    /// Proposed total per order.
    pub new_avg_distance: f64,
    /// Relative reduction of the average (%); 0 when the current one is 0.
    pub improvement_percent: f64,
    /// Current minus proposed total (negative when the proposal is worse).
    pub distance_saved: i64,
}

/// Frequency and affinity analysis with slotting proposals.
#[derive(Debug, Clone)]
pub struct StorageOptimizer<'a> {
    warehouse: &'a Warehouse,
    catalog: &'a Catalog,
    category_zones: BTreeMap<String, String>,
}

impl<'a> StorageOptimizer<'a> {
    /// Creates an optimizer; categories map to zones of the same type.
    pub fn new(warehouse: &'a Warehouse, catalog: &'a Catalog) -> Self {
        Self {
            warehouse,
            catalog,
            category_zones: BTreeMap::new(),
        }
    }

    /// Sends a category to a specific zone.
    pub fn with_category_zone(
        mut self,
        category: impl Into<String>,
        zone_id: impl Into<String>,
    ) -> Self {
        self.category_zones.insert(category.into(), zone_id.into());
        self
    }

    /// Zone a category is stored in.
    pub fn zone_for(&self, category: &str) -> Option<&str> {
        if let Some(zone_id) = self.category_zones.get(category) {
            return self
                .warehouse
                .zones
                .contains_key(zone_id)
                .then_some(zone_id.as_str());
        }
        self.warehouse
            .zones
            .values()
            .find(|z| z.zone_type == category)
            .map(|z| z.id.as_str())
    }

    /// Ordered units per product. Unknown products are skipped.
    pub fn product_frequency(&self, orders: &[Order]) -> BTreeMap<String, u32> {
        let mut frequency = BTreeMap::new();
        for order in orders {
            for (product, quantity) in order.lines(self.catalog) {
                *frequency.entry(product.id.clone()).or_insert(0) += quantity;
            }
        }
        frequency
    }

    /// Number of orders in which each product pair appears together.
    ///
    /// Keys are sorted pairs of distinct products.
    pub fn product_affinity(&self, orders: &[Order]) -> BTreeMap<(String, String), u32> {
        let mut affinity = BTreeMap::new();
        for order in orders {
            let products = order.products(self.catalog);
            for (i, a) in products.iter().enumerate() {
                for b in &products[i + 1..] {
                    let pair = if a.id <= b.id {
                        (a.id.clone(), b.id.clone())
                    } else {
                        (b.id.clone(), a.id.clone())
                    };
                    *affinity.entry(pair).or_insert(0) += 1;
                }
            }
        }
        affinity
    }

    /// The `n` most ordered products, most frequent first; ties by id.
    pub fn top_products(frequency: &BTreeMap<String, u32>, n: usize) -> Vec<String> {
        let mut ranked: Vec<(&String, u32)> = frequency.iter().map(|(id, &f)| (id, f)).collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked.into_iter().take(n).map(|(id, _)| id.clone()).collect()
    }

    /// Proposed location of every catalog product.
    pub fn propose_reorganization(&self, orders: &[Order]) -> BTreeMap<String, Location> {
        let frequency = self.product_frequency(orders);
        let entry = self.warehouse.entry_point;

        let mut products: Vec<&Product> = self.catalog.iter().collect();
        products.sort_by(|a, b| {
            let fa = frequency.get(&a.id).copied().unwrap_or(0);
            let fb = frequency.get(&b.id).copied().unwrap_or(0);
            fb.cmp(&fa).then_with(|| a.id.cmp(&b.id))
        });

        let mut free_cells: BTreeMap<&str, std::vec::IntoIter<Location>> = self
            .warehouse
            .zones
            .values()
            .map(|zone| {
                let mut cells: Vec<Location> = zone.coords.iter().copied().collect();
                cells.sort_by_key(|c| (entry.distance_to(c), *c));
                (zone.id.as_str(), cells.into_iter())
            })
            .collect();

        let mut proposal = BTreeMap::new();
        let mut moved = 0;
        for product in products {
            let cell = self
                .zone_for(&product.category)
                .and_then(|zone_id| free_cells.get_mut(zone_id))
                .and_then(|cells| cells.next());
            let location = cell.unwrap_or(product.location);
            if location != product.location {
                moved += 1;
            }
            proposal.insert(product.id.clone(), location);
        }

        info!(
            products = proposal.len(),
            moved,
            orders = orders.len(),
            "storage reorganisation proposed"
        );
        proposal
    }

    /// Compares the current layout with `new_locations` over `orders`.
    ///
    /// Products missing from `new_locations` keep their location.
    pub fn calculate_improvement(
        &self,
        orders: &[Order],
        new_locations: &BTreeMap<String, Location>,
    ) -> StorageImprovement {
        let entry = self.warehouse.entry_point;
        let mut current = 0u32;
        let mut proposed = 0u32;

        for order in orders {
            current += order
                .unique_locations(self.catalog)
                .iter()
                .map(|loc| entry.distance_to(loc))
                .sum::<u32>();

            let mut seen: Vec<Location> = Vec::new();
            for (product, _) in order.lines(self.catalog) {
                let loc = new_locations
                    .get(&product.id)
                    .copied()
                    .unwrap_or(product.location);
                if !seen.contains(&loc) {
                    seen.push(loc);
                    proposed += entry.distance_to(&loc);
                }
            }
        }

        let per_order = |total: u32| {
            if orders.is_empty() {
                0.0
            } else {
                total as f64 / orders.len() as f64
            }
        };
        let current_avg = per_order(current);
        let new_avg = per_order(proposed);
        let improvement_percent = if current_avg > 0.0 {
            (current_avg - new_avg) / current_avg * 100.0
        } else {
            0.0
        };

        StorageImprovement {
            current_total_distance: current,
            new_total_distance: proposed,
            current_avg_distance: current_avg,
            new_avg_distance: new_avg,
            improvement_percent,
            distance_saved: i64::from(current) - i64::from(proposed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Zone;

    fn warehouse() -> Warehouse {
        Warehouse::new(10, 10, Location::new(0, 0))
            .with_zone(Zone::new("A").with_type("electronics").with_coords([
                Location::new(5, 5),
                Location::new(1, 0),
                Location::new(3, 0),
            ]))
            .with_zone(
                Zone::new("C")
                    .with_type("food")
                    .with_coords([Location::new(8, 8), Location::new(0, 2)]),
            )
    }

    fn catalog() -> Catalog {
        Catalog::new()
            .with_product(Product::new("E1", 1.0, 1.0, Location::new(5, 5)).with_category("electronics"))
            .with_product(Product::new("E2", 1.0, 1.0, Location::new(3, 0)).with_category("electronics"))
            .with_product(Product::new("E3", 1.0, 1.0, Location::new(1, 0)).with_category("electronics"))
            .with_product(Product::new("F1", 1.0, 1.0, Location::new(8, 8)).with_category("food"))
            .with_product(Product::new("T1", 1.0, 1.0, Location::new(7, 7)).with_category("textile"))
    }

    fn history(c: &Catalog) -> Vec<Order> {
        vec![
            Order::new("O1").with_item("E1", 3).with_item("F1", 1).with_totals(c),
            Order::new("O2").with_item("E1", 1).with_item("E2", 2).with_totals(c),
            Order::new("O3").with_item("F1", 2).with_item("T1", 1).with_totals(c),
        ]
    }

    #[test]
    fn test_frequency_and_top_products() {
        let (w, c) = (warehouse(), catalog());
        let optimizer = StorageOptimizer::new(&w, &c);
        let freq = optimizer.product_frequency(&history(&c));

        assert_eq!(freq.get("E1"), Some(&4));
        assert_eq!(freq.get("F1"), Some(&3));
        assert_eq!(freq.get("E2"), Some(&2));
        assert_eq!(freq.get("E3"), None);
        assert_eq!(StorageOptimizer::top_products(&freq, 2), vec!["E1", "F1"]);
        assert_eq!(StorageOptimizer::top_products(&freq, 10).len(), 4);
    }

    #[test]
    fn test_affinity_pairs_are_sorted() {
        let (w, c) = (warehouse(), catalog());
        let optimizer = StorageOptimizer::new(&w, &c);
        let mut orders = history(&c);
        orders.push(
            Order::new("O4")
                .with_item("F1", 1)
                .with_item("E1", 1)
                .with_item("E1", 1)
                .with_totals(&c),
        );

        let affinity = optimizer.product_affinity(&orders);
        assert_eq!(affinity.get(&("E1".into(), "F1".into())), Some(&2));
        assert_eq!(affinity.get(&("E1".into(), "E2".into())), Some(&1));
        assert_eq!(affinity.get(&("F1".into(), "T1".into())), Some(&1));
        assert_eq!(affinity.len(), 3);
    }

    #[test]
    fn test_frequent_products_move_toward_entry() {
        let (w, c) = (warehouse(), catalog());
        let optimizer = StorageOptimizer::new(&w, &c);
        let proposal = optimizer.propose_reorganization(&history(&c));

        assert_eq!(proposal["E1"], Location::new(1, 0));
        assert_eq!(proposal["E2"], Location::new(3, 0));
        assert_eq!(proposal["E3"], Location::new(5, 5));
        assert_eq!(proposal["F1"], Location::new(0, 2));
        // No textile zone.
        assert_eq!(proposal["T1"], Location::new(7, 7));
    }

    #[test]
    fn test_full_zone_keeps_location_and_mapping_overrides() {
        let w = warehouse();
        let c = catalog()
            .with_product(Product::new("F2", 1.0, 1.0, Location::new(9, 9)).with_category("food"))
            .with_product(Product::new("F3", 1.0, 1.0, Location::new(9, 8)).with_category("food"));
        let orders = vec![Order::new("O1").with_item("F3", 5).with_item("F2", 1).with_totals(&c)];

        let proposal = StorageOptimizer::new(&w, &c).propose_reorganization(&orders);
        assert_eq!(proposal["F3"], Location::new(0, 2));
        assert_eq!(proposal["F2"], Location::new(8, 8));
        // F1 never ordered: zone C is full.
        assert_eq!(proposal["F1"], Location::new(8, 8));

        let optimizer = StorageOptimizer::new(&w, &c).with_category_zone("textile", "C");
        assert_eq!(optimizer.zone_for("textile"), Some("C"));
        assert_eq!(
            StorageOptimizer::new(&w, &c)
                .with_category_zone("textile", "Z")
                .zone_for("textile"),
            None
        );
    }

    #[test]
    fn test_calculate_improvement() {
        let (w, c) = (warehouse(), catalog());
        let optimizer = StorageOptimizer::new(&w, &c);
        let orders = history(&c);
        let proposal = optimizer.propose_reorganization(&orders);

        let report = optimizer.calculate_improvement(&orders, &proposal);
        // O1 26 + O2 13 + O3 30 before; 3 + 4 + 16 after.
        assert_eq!(report.current_total_distance, 69);
        assert_eq!(report.new_total_distance, 23);
        assert_eq!(report.distance_saved, 46);
        assert!((report.current_avg_distance - 23.0).abs() < 1e-10);
        assert!((report.improvement_percent - 46.0 / 69.0 * 100.0).abs() < 1e-9);

        let unchanged = optimizer.calculate_improvement(&orders, &BTreeMap::new());
        assert_eq!(unchanged.distance_saved, 0);
        assert!(unchanged.improvement_percent.abs() < 1e-12);

        let empty = optimizer.calculate_improvement(&[], &proposal);
        assert_eq!(empty.current_avg_distance, 0.0);
        assert_eq!(empty.improvement_percent, 0.0);
    }
}
