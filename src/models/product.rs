//! Product model and catalog.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use super::Location;

/// A stocked product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// Unique product identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Product family.
    pub category: String,
    /// Unit weight (kg).
    pub weight: f64,
    /// Unit volume (dm³).
    pub volume: f64,
    /// Rack cell.
    pub location: Location,
    /// Demand class (e.g., "high", "low").
    pub frequency: String,
    /// Requires careful handling.
    pub fragile: bool,
    /// Ids of products that must not travel with this one.
    pub incompatible_with: BTreeSet<String>,
}

impl Product {
    /// Creates a product at a location with the given unit weight and volume.
    pub fn new(id: impl Into<String>, weight: f64, volume: f64, location: Location) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            category: String::new(),
            weight,
            volume,
            location,
            frequency: String::new(),
            fragile: false,
            incompatible_with: BTreeSet::new(),
        }
    }

    /// Sets the product name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the category.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Sets the demand class.
    pub fn with_frequency(mut self, frequency: impl Into<String>) -> Self {
        self.frequency = frequency.into();
        self
    }

    /// Marks the product fragile.
    pub fn fragile(mut self) -> Self {
        self.fragile = true;
        self
    }

    /// Declares an incompatible product.
    pub fn incompatible_with(mut self, product_id: impl Into<String>) -> Self {
        self.incompatible_with.insert(product_id.into());
        self
    }

    /// Whether two products may share a load.
    ///
    /// Symmetric: incompatible if either side lists the other.
    pub fn is_compatible_with(&self, other: &Product) -> bool {
        !self.incompatible_with.contains(&other.id) && !other.incompatible_with.contains(&self.id)
    }
}

/// Product lookup by id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    products: HashMap<String, Product>,
}

impl Catalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a product.
    pub fn insert(&mut self, product: Product) {
        self.products.insert(product.id.clone(), product);
    }

    /// Adds a product (builder form).
    pub fn with_product(mut self, product: Product) -> Self {
        self.insert(product);
        self
    }

    /// Looks up a product.
    #[inline]
    pub fn get(&self, product_id: &str) -> Option<&Product> {
        self.products.get(product_id)
    }

    /// Whether a product id is known.
    pub fn contains(&self, product_id: &str) -> bool {
        self.products.contains_key(product_id)
    }

    /// Number of products.
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Iterates over all products (unordered).
    pub fn iter(&self) -> impl Iterator<Item = &Product> {
        self.products.values()
    }
}

impl FromIterator<Product> for Catalog {
    fn from_iter<I: IntoIterator<Item = Product>>(iter: I) -> Self {
        let mut catalog = Catalog::new();
        for p in iter {
            catalog.insert(p);
        }
        catalog
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_builder() {
        let p = Product::new("P001", 0.5, 1.0, Location::new(1, 1))
            .with_name("USB cable")
            .with_category("electronics")
            .with_frequency("high")
            .fragile();

        assert_eq!(p.id, "P001");
        assert_eq!(p.name, "USB cable");
        assert!(p.fragile);
        assert!((p.weight - 0.5).abs() < 1e-10);
    }

    #[test]
    fn test_incompatibility_is_symmetric() {
        let bleach = Product::new("P1", 1.0, 1.0, Location::new(1, 1)).incompatible_with("P2");
        let bread = Product::new("P2", 1.0, 1.0, Location::new(2, 1));
        let soap = Product::new("P3", 1.0, 1.0, Location::new(3, 1));

        assert!(!bleach.is_compatible_with(&bread));
        assert!(!bread.is_compatible_with(&bleach));
        assert!(bread.is_compatible_with(&soap));
        assert!(soap.is_compatible_with(&bleach));
    }

    #[test]
    fn test_catalog_lookup() {
        let catalog: Catalog = vec![
            Product::new("P1", 1.0, 1.0, Location::new(1, 1)),
            Product::new("P2", 2.0, 1.0, Location::new(2, 1)),
        ]
        .into_iter()
        .collect();

        assert_eq!(catalog.len(), 2);
        assert!(catalog.contains("P1"));
        assert!(catalog.get("P3").is_none());
        assert!((catalog.get("P2").unwrap().weight - 2.0).abs() < 1e-10);
    }
}
