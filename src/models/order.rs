//! Order model.
//!
//! An order is a list of (product, quantity) lines with a receive time,
//! a deadline and a priority class. Order totals are derived from the
//! catalog but are **not** kept in sync automatically: call
//! [`Order::calculate_totals`] after changing the item list.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{Catalog, Location, Product};

/// Time of day with minute resolution, parsed from `"HH:MM"`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[derive(Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClockTime {
    minutes: u32,
}

impl ClockTime {
    /// Creates a time from hours and minutes.
    ///
    /// Returns `None` when the time is not a valid time of day.
    pub fn from_hm(hours: u32, minutes: u32) -> Option<Self> {
        (hours < 24 && minutes < 60).then_some(Self {
            minutes: hours * 60 + minutes,
        })
    }

    /// Minutes since midnight.
    #[inline]
    pub fn minutes(&self) -> u32 {
        self.minutes
    }
}

/// Error parsing a `"HH:MM"` string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid time of day '{0}', expected HH:MM")]
pub struct ClockTimeError(pub String);

impl FromStr for ClockTime {
    type Err = ClockTimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ClockTimeError(s.to_string());
        let (h, m) = s.trim().split_once(':').ok_or_else(err)?;
        let hours: u32 = h.parse().map_err(|_| err())?;
        let minutes: u32 = m.parse().map_err(|_| err())?;
        ClockTime::from_hm(hours, minutes).ok_or_else(err)
    }
}

impl TryFrom<String> for ClockTime {
    type Error = ClockTimeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ClockTime> for String {
    fn from(t: ClockTime) -> Self {
        t.to_string()
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.minutes / 60, self.minutes % 60)
    }
}

/// Order urgency class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Normal service level.
    #[default]
    Standard,
    /// Served before every standard order.
    Express,
}

/// One order line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    /// Ordered product.
    pub product_id: String,
    /// Number of units.
    pub quantity: u32,
}

impl OrderItem {
    /// Creates an order line.
    pub fn new(product_id: impl Into<String>, quantity: u32) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
        }
    }
}

/// A customer order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Unique order identifier.
    pub id: String,
    /// When the order arrived.
    pub received_time: ClockTime,
    /// Latest completion time.
    pub deadline: ClockTime,
    /// Urgency class.
    pub priority: Priority,
    /// Order lines.
    pub items: Vec<OrderItem>,
    /// Sum of line weights (kg). Derived; see [`Order::calculate_totals`].
    pub total_weight: f64,
    /// Sum of line volumes (dm³). Derived; see [`Order::calculate_totals`].
    pub total_volume: f64,
    /// Agent the order was committed to in the last allocation pass.
    pub assigned_agent: Option<String>,
}

impl Order {
    /// Creates a standard order received at 00:00 with deadline 23:59.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            received_time: ClockTime::default(),
            deadline: ClockTime::from_hm(23, 59).unwrap_or_default(),
            priority: Priority::Standard,
            items: Vec::new(),
            total_weight: 0.0,
            total_volume: 0.0,
            assigned_agent: None,
        }
    }

    /// Sets the receive time and deadline.
    pub fn with_window(mut self, received: ClockTime, deadline: ClockTime) -> Self {
        self.received_time = received;
        self.deadline = deadline;
        self
    }

    /// Sets the priority class.
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Marks the order express.
    pub fn express(self) -> Self {
        self.with_priority(Priority::Express)
    }

    /// Adds an order line. Totals are not updated.
    pub fn with_item(mut self, product_id: impl Into<String>, quantity: u32) -> Self {
        self.items.push(OrderItem::new(product_id, quantity));
        self
    }

    /// Recomputes `total_weight` and `total_volume` from the catalog.
    ///
    /// Lines whose product is unknown contribute nothing.
    pub fn calculate_totals(&mut self, catalog: &Catalog) {
        let (weight, volume) = self
            .lines(catalog)
            .fold((0.0, 0.0), |(w, v), (p, qty)| {
                (w + p.weight * qty as f64, v + p.volume * qty as f64)
            });
        self.total_weight = weight;
        self.total_volume = volume;
    }

    /// Builder form of [`Order::calculate_totals`].
    pub fn with_totals(mut self, catalog: &Catalog) -> Self {
        self.calculate_totals(catalog);
        self
    }

    /// Resolved (product, quantity) lines, skipping unknown products.
    pub fn lines<'a>(
        &'a self,
        catalog: &'a Catalog,
    ) -> impl Iterator<Item = (&'a Product, u32)> + 'a {
        self.items
            .iter()
            .filter_map(move |item| catalog.get(&item.product_id).map(|p| (p, item.quantity)))
    }

    /// Distinct products of the order, in line order.
    pub fn products<'a>(&'a self, catalog: &'a Catalog) -> Vec<&'a Product> {
        let mut out: Vec<&Product> = Vec::new();
        for (p, _) in self.lines(catalog) {
            if !out.iter().any(|q| q.id == p.id) {
                out.push(p);
            }
        }
        out
    }

    /// Distinct rack locations of the order.
    pub fn unique_locations(&self, catalog: &Catalog) -> Vec<Location> {
        let mut out: Vec<Location> = Vec::new();
        for (p, _) in self.lines(catalog) {
            if !out.contains(&p.location) {
                out.push(p.location);
            }
        }
        out
    }

    /// Number of order lines; picking time is charged per line.
    pub fn line_count(&self) -> usize {
        self.items.len()
    }

    /// Minutes between receipt and deadline (negative if already late).
    pub fn time_to_deadline(&self) -> i64 {
        self.deadline.minutes() as i64 - self.received_time.minutes() as i64
    }

    /// Whether the order is express.
    pub fn is_express(&self) -> bool {
        self.priority == Priority::Express
    }
}
