//! Space-time conflict detection and resolution.
//!
//! Routes are sampled into per-agent timelines ([`Timeline`]), compared
//! pairwise in fixed time buckets ([`CollisionDetector`]) and repaired by
//! injecting waits into the route of the agent that gives way
//! ([`ConflictResolver`]).
//!
//! # Right of way
//!
//! | Kind | Rank | Yields to |
//! |------|------|-----------|
//! | Human | 2 | nobody |
//! | Cart | 1 | humans |
//! | Robot | 0 | carts, humans |
//!
//! Between agents of equal rank the larger id yields.
//!
//! # Example
//!
//! ```
//! use u_pick::collision::{CollisionDetector, ConflictResolver, ResolutionStatus};
//! use u_pick::models::{AgentKind, AgentRoute, Location, RouteStep};
//!
//! let mut routes = vec![
//!     AgentRoute::new("R1", AgentKind::Robot, vec![
//!         RouteStep::new(Location::new(0, 4), 0.0),
//!         RouteStep::new(Location::new(8, 4), 8.0).with_departure(10.0).picking(),
//!     ]),
//!     AgentRoute::new("H1", AgentKind::Human, vec![
//!         RouteStep::new(Location::new(4, 0), 0.0),
//!         RouteStep::new(Location::new(4, 8), 8.0).with_departure(10.0).picking(),
//!     ]),
//! ];
//!
//! let resolver = ConflictResolver::new(CollisionDetector::new(Location::new(0, 0)));
//! let report = resolver.resolve(&mut routes);
//! assert_eq!(report.initial.vertex, 1);
//! assert_eq!(report.status, ResolutionStatus::Converged);
//! ```

mod detector;
mod report;
mod resolver;
mod timeline;

pub use detector::CollisionDetector;
pub use report::{
    AppliedDelay, Conflict, ConflictCounts, ConflictKind, ConflictReport, ResolutionStatus,
};
pub use resolver::{delay_route, ConflictResolver};
pub use timeline::{bucket, Sample, Timeline};
