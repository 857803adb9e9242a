//! Route planning.
//!
//! Turns the pick stops of one agent into a closed tour from the entry
//! point and lays it out as a timed [`crate::models::AgentRoute`].
//!
//! | Planner | Quality | Budgeted |
//! |---------|---------|----------|
//! | [`NearestNeighborPlanner`] | construction heuristic | no |
//! | [`TwoOptPlanner`] | 2-opt local optimum, random restarts | yes |

mod builder;
mod tour;

pub use builder::RouteBuilder;
pub use tour::{NearestNeighborPlanner, RoutePlanner, Tour, TwoOptPlanner};
