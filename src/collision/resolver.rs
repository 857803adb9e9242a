//! Delay-based conflict resolution.
//!
//! # Algorithm
//!
//! Each round re-detects conflicts on the current routes. If no vertex
//! conflict is left the resolver stops. Otherwise the earliest vertex
//! conflict is taken and the agent with lower right-of-way waits
//! `delay_increment` seconds at the stop it last reached; every later
//! stop shifts by the same amount.
//!
//! The best state (fewest conflicts) is kept as a snapshot. If the state
//! after the last round is worse, the snapshot is restored and the run is
//! reported as abandoned. Edge conflicts are reported, never repaired.

use tracing::{debug, info, warn};

use super::detector::CollisionDetector;
use super::report::{
    AppliedDelay, Conflict, ConflictCounts, ConflictKind, ConflictReport, ResolutionStatus,
};
use crate::config::PlannerConfig;
use crate::models::{AgentRoute, Location};

/// Repairs vertex conflicts by delaying the yielding agent.
#[derive(Debug, Clone)]
pub struct ConflictResolver {
    detector: CollisionDetector,
    delay_increment: f64,
    max_iterations: usize,
    report_limit: usize,
}

impl ConflictResolver {
    /// Creates a resolver with 5 s waits, 50 rounds and 10 listed conflicts.
    pub fn new(detector: CollisionDetector) -> Self {
        Self {
            detector,
            delay_increment: 5.0,
            max_iterations: 50,
            report_limit: 10,
        }
    }

    /// Creates a resolver and its detector from the run configuration.
    pub fn from_config(entry_point: Location, config: &PlannerConfig) -> Self {
        Self::new(CollisionDetector::from_config(entry_point, config))
            .with_delay_increment(config.delay_increment)
            .with_max_iterations(config.max_iterations)
            .with_report_limit(config.report_limit)
    }

    /// Sets the wait per round.
    pub fn with_delay_increment(mut self, delay: f64) -> Self {
        self.delay_increment = delay;
        self
    }

    /// Sets the round limit.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Sets the listing cap of the report.
    pub fn with_report_limit(mut self, limit: usize) -> Self {
        self.report_limit = limit;
        self
    }

    /// The underlying detector.
    pub fn detector(&self) -> &CollisionDetector {
        &self.detector
    }

    /// Detects and resolves conflicts in place.
    ///
    /// Never fails; the report carries whatever could not be resolved.
    pub fn resolve(&self, routes: &mut [AgentRoute]) -> ConflictReport {
        let mut conflicts = self.detector.detect(routes);
        let initial = ConflictCounts::of(&conflicts);
        info!(
            agents = routes.len(),
            vertex = initial.vertex,
            edge = initial.edge,
            "conflict detection"
        );

        let mut best_count = conflicts.len();
        let mut best_routes = routes.to_vec();
        let mut best_conflicts = conflicts.clone();
        let mut delays = Vec::new();
        let mut iterations = 0;

        while iterations < self.max_iterations {
            let Some(target) = conflicts.iter().find(|c| c.kind == ConflictKind::Vertex) else {
                break;
            };
            let Some(yielder) = yielding_route(target, routes) else {
                warn!(conflict = %target, "conflict names an unknown agent");
                break;
            };

            iterations += 1;
            let at = target.time;
            delay_route(&mut routes[yielder], at, self.delay_increment);
            debug!(
                round = iterations,
                agent = %routes[yielder].agent_id,
                at,
                delay = self.delay_increment,
                "agent yields"
            );
            delays.push(AppliedDelay {
                agent_id: routes[yielder].agent_id.clone(),
                at,
                amount: self.delay_increment,
            });

            conflicts = self.detector.detect(routes);
            if conflicts.len() < best_count {
                best_count = conflicts.len();
                best_routes = routes.to_vec();
                best_conflicts = conflicts.clone();
            }
        }

        let mut status = if conflicts.iter().any(|c| c.kind == ConflictKind::Vertex) {
            ResolutionStatus::IterationLimit
        } else {
            ResolutionStatus::Converged
        };

        if conflicts.len() > best_count {
            warn!(
                current = conflicts.len(),
                best = best_count,
                "resolution made things worse, restoring best state"
            );
            routes.clone_from_slice(&best_routes);
            conflicts = best_conflicts;
            status = ResolutionStatus::Abandoned { best_count };
        }

        let remaining = ConflictCounts::of(&conflicts);
        info!(
            rounds = iterations,
            vertex = remaining.vertex,
            edge = remaining.edge,
            status = ?status,
            "conflict resolution done"
        );

        conflicts.truncate(self.report_limit);
        ConflictReport {
            initial,
            remaining,
            best_count,
            iterations,
            delays,
            status,
            conflicts,
        }
    }
}

/// Index of the route whose agent gives way in a conflict.
///
/// Lower right-of-way yields (robot before cart before human). Between
/// equal kinds the lexicographically larger id yields.
fn yielding_route(conflict: &Conflict, routes: &[AgentRoute]) -> Option<usize> {
    let (first, second) = &conflict.agents;
    let a = routes.iter().position(|r| &r.agent_id == first)?;
    let b = routes.iter().position(|r| &r.agent_id == second)?;

    let (ra, rb) = (
        routes[a].agent_kind.right_of_way(),
        routes[b].agent_kind.right_of_way(),
    );
    Some(if ra < rb { a } else { b })
}

/// Makes a route wait `amount` seconds at the last stop reached by `at`.
///
/// Every later stop shifts by `amount`; total time and cost follow.
pub fn delay_route(route: &mut AgentRoute, at: f64, amount: f64) {
    if route.steps.is_empty() {
        return;
    }
    let index = route
        .steps
        .iter()
        .rposition(|s| s.arrival <= at)
        .unwrap_or(0);

    route.steps[index].departure += amount;
    for step in &mut route.steps[index + 1..] {
        step.shift(amount);
    }

    let before = route.total_time;
    route.refresh_total_time();
    if before > 0.0 {
        route.cost *= route.total_time / before;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AgentKind, RouteStep};

    fn line(id: &str, kind: AgentKind, from: Location, to: Location, start: f64) -> AgentRoute {
        let arrive = start + from.distance_to(&to) as f64;
        AgentRoute::new(
            id,
            kind,
            vec![
                RouteStep::new(from, 0.0).with_departure(start),
                RouteStep::new(to, arrive).with_departure(arrive + 2.0).picking(),
            ],
        )
    }

    fn resolver() -> ConflictResolver {
        ConflictResolver::new(CollisionDetector::new(Location::new(0, 0)))
    }

    #[test]
    fn test_crossing_resolved_by_robot_waiting() {
        let mut routes = vec![
            line("R1", AgentKind::Robot, Location::new(0, 4), Location::new(8, 4), 0.0),
            line("H1", AgentKind::Human, Location::new(4, 0), Location::new(4, 8), 0.0),
        ];

        let report = resolver().resolve(&mut routes);
        assert_eq!(report.initial.vertex, 1);
        assert_eq!(report.remaining.total(), 0);
        assert_eq!(report.status, ResolutionStatus::Converged);
        assert_eq!(report.iterations, 1);
        assert_eq!(report.delays[0].agent_id, "R1");

        // Robot waited 5 s at its start; the human is untouched.
        assert!((routes[0].steps[0].departure - 5.0).abs() < 1e-10);
        assert!((routes[0].steps[1].arrival - 13.0).abs() < 1e-10);
        assert!((routes[0].total_time - 15.0).abs() < 1e-10);
        assert!((routes[1].total_time - 10.0).abs() < 1e-10);
        assert!(report.is_clear());
    }

    #[test]
    fn test_rollback_when_delay_makes_it_worse() {
        // Delaying R1 by 5 s walks it into H2 at (5, 4) and H3 at (6, 4).
        let mut routes = vec![
            line("R1", AgentKind::Robot, Location::new(0, 4), Location::new(8, 4), 0.0),
            line("H1", AgentKind::Human, Location::new(4, 0), Location::new(4, 8), 0.0),
            line("H2", AgentKind::Human, Location::new(5, 0), Location::new(5, 8), 6.0),
            line("H3", AgentKind::Human, Location::new(6, 0), Location::new(6, 8), 7.0),
        ];
        let original = routes.clone();

        let report = resolver().with_max_iterations(1).resolve(&mut routes);
        assert_eq!(report.initial.total(), 1);
        assert_eq!(report.iterations, 1);
        assert_eq!(report.status, ResolutionStatus::Abandoned { best_count: 1 });
        assert_eq!(report.remaining.total(), 1);
        assert_eq!(routes, original);
    }

    #[test]
    fn test_never_worse_than_best() {
        let mut routes = vec![
            line("R1", AgentKind::Robot, Location::new(0, 4), Location::new(8, 4), 0.0),
            line("R2", AgentKind::Robot, Location::new(8, 3), Location::new(0, 3), 0.0),
            line("C1", AgentKind::Cart, Location::new(4, 0), Location::new(4, 8), 0.0),
            line("H1", AgentKind::Human, Location::new(3, 8), Location::new(3, 0), 0.0),
            line("H2", AgentKind::Human, Location::new(5, 0), Location::new(5, 8), 6.0),
        ];
        for max in [0, 1, 2, 5, 50] {
            let mut attempt = routes.clone();
            let report = resolver().with_max_iterations(max).resolve(&mut attempt);
            assert!(report.remaining.total() <= report.best_count);
            assert!(report.best_count <= report.initial.total());
            let recount = resolver().detector().detect(&attempt).len();
            assert_eq!(recount, report.remaining.total());
        }
        let report = resolver().resolve(&mut routes);
        assert!(report.remaining.total() <= report.initial.total());
    }

    #[test]
    fn test_same_kind_larger_id_yields() {
        let mut routes = vec![
            line("R2", AgentKind::Robot, Location::new(0, 4), Location::new(8, 4), 0.0),
            line("R1", AgentKind::Robot, Location::new(4, 0), Location::new(4, 8), 0.0),
        ];
        let report = resolver().resolve(&mut routes);
        assert_eq!(report.delays[0].agent_id, "R2");
    }

    #[test]
    fn test_cart_yields_to_human() {
        let mut routes = vec![
            line("H9", AgentKind::Human, Location::new(0, 4), Location::new(8, 4), 0.0),
            line("C1", AgentKind::Cart, Location::new(4, 0), Location::new(4, 8), 0.0),
        ];
        let report = resolver().resolve(&mut routes);
        assert_eq!(report.delays[0].agent_id, "C1");
    }

    #[test]
    fn test_delay_mid_route() {
        let mut route = AgentRoute::new(
            "A",
            AgentKind::Robot,
            vec![
                RouteStep::new(Location::new(0, 0), 0.0),
                RouteStep::new(Location::new(3, 0), 3.0).with_departure(5.0).picking(),
                RouteStep::new(Location::new(0, 0), 8.0),
            ],
        )
        .with_cost(8.0);

        delay_route(&mut route, 4.0, 2.0);
        assert!((route.steps[0].departure - 0.0).abs() < 1e-10);
        assert!((route.steps[1].arrival - 3.0).abs() < 1e-10);
        assert!((route.steps[1].departure - 7.0).abs() < 1e-10);
        assert!((route.steps[2].arrival - 10.0).abs() < 1e-10);
        assert!((route.total_time - 10.0).abs() < 1e-10);
        assert!((route.cost - 10.0).abs() < 1e-10);
    }

    #[test]
    fn test_report_listing_is_capped() {
        let cell = Location::new(2, 2);
        let stand = |id: &str| {
            AgentRoute::new(id, AgentKind::Human, vec![RouteStep::new(cell, 0.0).with_departure(30.0)])
        };
        let mut routes = vec![stand("H1"), stand("H2"), stand("H3")];
        let report = resolver()
            .with_max_iterations(0)
            .with_report_limit(4)
            .resolve(&mut routes);
        assert_eq!(report.initial.vertex, 18); // 3 pairs × 6 windows
        assert_eq!(report.conflicts.len(), 4);
        assert_eq!(report.status, ResolutionStatus::IterationLimit);
    }
}
