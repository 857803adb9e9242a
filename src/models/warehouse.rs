//! Warehouse layout model.
//!
//! A warehouse is a bounded grid with a single entry point, a set of
//! named zones (racks grouped by product family) and, optionally, the
//! navigable aisle cells agents must stand on to pick.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use super::Location;

/// A storage zone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Zone {
    /// Zone identifier (e.g., "A", "C").
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Zone classification (e.g., "electronics", "food").
    pub zone_type: String,
    /// Member cells.
    pub coords: HashSet<Location>,
    /// Restriction tags (e.g., "temperature_controlled").
    pub restrictions: Vec<String>,
}

impl Zone {
    /// Creates an empty zone.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            zone_type: String::new(),
            coords: HashSet::new(),
            restrictions: Vec::new(),
        }
    }

    /// Sets the zone name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the zone type.
    pub fn with_type(mut self, zone_type: impl Into<String>) -> Self {
        self.zone_type = zone_type.into();
        self
    }

    /// Adds member cells.
    pub fn with_coords(mut self, coords: impl IntoIterator<Item = Location>) -> Self {
        self.coords.extend(coords);
        self
    }

    /// Adds a restriction tag.
    pub fn with_restriction(mut self, tag: impl Into<String>) -> Self {
        self.restrictions.push(tag.into());
        self
    }

    /// Whether a cell belongs to this zone.
    #[inline]
    pub fn contains(&self, location: &Location) -> bool {
        self.coords.contains(location)
    }

    /// Whether the zone carries a restriction tag.
    pub fn has_restriction(&self, tag: &str) -> bool {
        self.restrictions.iter().any(|r| r == tag)
    }
}

/// Warehouse floor plan.
///
/// Zones are kept ordered by id so that `zone_at` is deterministic when
/// zones overlap.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Warehouse {
    /// Grid width (cells).
    pub width: i32,
    /// Grid height (cells).
    pub height: i32,
    /// Where every tour starts and ends.
    pub entry_point: Location,
    /// Zones by id.
    pub zones: BTreeMap<String, Zone>,
    /// Navigable aisle cells. Empty = agents pick at the rack cell itself.
    pub aisles: HashSet<Location>,
}

impl Warehouse {
    /// Creates a warehouse without zones or aisles.
    pub fn new(width: i32, height: i32, entry_point: Location) -> Self {
        Self {
            width,
            height,
            entry_point,
            zones: BTreeMap::new(),
            aisles: HashSet::new(),
        }
    }

    /// Adds a zone.
    pub fn with_zone(mut self, zone: Zone) -> Self {
        self.zones.insert(zone.id.clone(), zone);
        self
    }

    /// Adds aisle cells.
    pub fn with_aisles(mut self, aisles: impl IntoIterator<Item = Location>) -> Self {
        self.aisles.extend(aisles);
        self
    }

    /// Whether a cell lies inside the grid bounds.
    pub fn contains(&self, location: &Location) -> bool {
        location.x >= 0 && location.y >= 0 && location.x < self.width && location.y < self.height
    }

    /// Whether a cell is a navigable aisle.
    #[inline]
    pub fn is_aisle(&self, location: &Location) -> bool {
        self.aisles.contains(location)
    }

    /// Id of the zone containing a cell.
    pub fn zone_at(&self, location: &Location) -> Option<&str> {
        self.zones
            .values()
            .find(|z| z.contains(location))
            .map(|z| z.id.as_str())
    }

    /// Type of the zone containing a cell.
    pub fn zone_type_at(&self, location: &Location) -> Option<&str> {
        self.zones
            .values()
            .find(|z| z.contains(location))
            .map(|z| z.zone_type.as_str())
    }

    /// Cell an agent stands on to pick from a rack location.
    ///
    /// Without aisles this is the rack cell itself. Otherwise the aisle
    /// neighbour closest to the entry point, falling back to the nearest
    /// aisle cell overall. Ties resolve to the smallest coordinates.
    pub fn pick_point(&self, product_location: &Location) -> Location {
        if self.aisles.is_empty() {
            return *product_location;
        }

        let adjacent = product_location
            .neighbors()
            .into_iter()
            .filter(|c| self.aisles.contains(c))
            .min_by_key(|c| (self.entry_point.distance_to(c), *c));

        match adjacent {
            Some(cell) => cell,
            None => self
                .aisles
                .iter()
                .copied()
                .min_by_key(|c| (product_location.distance_to(c), *c))
                .unwrap_or(*product_location),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_warehouse() -> Warehouse {
        Warehouse::new(10, 8, Location::new(0, 0))
            .with_zone(
                Zone::new("A")
                    .with_name("Electronics")
                    .with_type("electronics")
                    .with_coords([Location::new(1, 1), Location::new(2, 1)]),
            )
            .with_zone(
                Zone::new("C")
                    .with_name("Food")
                    .with_type("food")
                    .with_coords([Location::new(8, 1)])
                    .with_restriction("temperature_controlled"),
            )
    }

    #[test]
    fn test_zone_lookup() {
        let w = sample_warehouse();
        assert_eq!(w.zone_at(&Location::new(1, 1)), Some("A"));
        assert_eq!(w.zone_at(&Location::new(8, 1)), Some("C"));
        assert_eq!(w.zone_at(&Location::new(5, 5)), None);
        assert_eq!(w.zone_type_at(&Location::new(2, 1)), Some("electronics"));
        assert!(w.zones["C"].has_restriction("temperature_controlled"));
    }

    #[test]
    fn test_bounds() {
        let w = sample_warehouse();
        assert!(w.contains(&Location::new(0, 0)));
        assert!(w.contains(&Location::new(9, 7)));
        assert!(!w.contains(&Location::new(10, 0)));
        assert!(!w.contains(&Location::new(0, -1)));
    }

    #[test]
    fn test_pick_point_without_aisles() {
        let w = sample_warehouse();
        assert_eq!(w.pick_point(&Location::new(2, 1)), Location::new(2, 1));
    }

    #[test]
    fn test_pick_point_prefers_adjacent_aisle_near_entry() {
        let w = sample_warehouse().with_aisles([
            Location::new(2, 0),
            Location::new(2, 2),
            Location::new(5, 5),
        ]);
        // (2,0) and (2,2) both touch the rack; (2,0) is closer to the entry.
        assert_eq!(w.pick_point(&Location::new(2, 1)), Location::new(2, 0));
        assert!(w.is_aisle(&Location::new(5, 5)));
    }

    #[test]
    fn test_pick_point_falls_back_to_nearest_aisle() {
        let w = sample_warehouse().with_aisles([Location::new(5, 5), Location::new(9, 7)]);
        assert_eq!(w.pick_point(&Location::new(6, 6)), Location::new(5, 5));
    }
}
