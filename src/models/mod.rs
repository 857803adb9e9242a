//! Warehouse planning domain models.
//!
//! Provides the core data types of a planning run: the floor plan, the
//! product catalog, the fleet, the order batch, and the timed routes
//! produced for each agent.
//!
//! # Units
//!
//! | Quantity | Unit |
//! |----------|------|
//! | Distance | grid cells |
//! | Weight | kg |
//! | Volume | dm³ |
//! | Route time | seconds from dispatch |
//! | Order times | minutes of the day (`ClockTime`) |

mod agent;
mod location;
mod order;
mod product;
mod route;
mod warehouse;

pub use agent::{Agent, AgentKind, Restrictions};
pub use location::Location;
pub use order::{ClockTime, ClockTimeError, Order, OrderItem, Priority};
pub use product::{Catalog, Product};
pub use route::{AgentRoute, PickedItem, RouteStep};
pub use warehouse::{Warehouse, Zone};
