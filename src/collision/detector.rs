//! Conflict detection over sampled timelines.
//!
//! # Rules
//!
//! | Kind | Condition |
//! |------|-----------|
//! | vertex | same bucket, same cell, cell is not the entry, not both picking |
//! | edge | A goes X→Y while B goes Y→X over consecutive buckets, nobody picking or standing still, neither cell is the entry |
//!
//! Detections of the same kind and agent pair inside one `dedup_window`
//! are merged into the first one.
//!
//! Absence of conflicts holds at sampling resolution only: two fast agents
//! may cross between samples unnoticed.

use std::collections::{BTreeMap, HashSet};
use tracing::warn;

use super::report::{Conflict, ConflictKind};
use super::timeline::{is_valid_step, Timeline};
use crate::config::PlannerConfig;
use crate::models::{AgentRoute, Location};

type Occupancy = BTreeMap<i64, Vec<(Location, bool)>>;

/// Finds vertex and edge conflicts between timed routes.
#[derive(Debug, Clone)]
pub struct CollisionDetector {
    entry_point: Location,
    time_step: f64,
    dedup_window: f64,
}

impl CollisionDetector {
    /// Creates a detector with 1 s buckets and a 5 s merge window.
    pub fn new(entry_point: Location) -> Self {
        Self {
            entry_point,
            time_step: 1.0,
            dedup_window: 5.0,
        }
    }

    /// Creates a detector from the run configuration.
    pub fn from_config(entry_point: Location, config: &PlannerConfig) -> Self {
        Self::new(entry_point)
            .with_time_step(config.time_step)
            .with_dedup_window(config.dedup_window)
    }

    /// Sets the sampling step / bucket width.
    ///
    /// Values that are not positive and finite are ignored.
    pub fn with_time_step(mut self, time_step: f64) -> Self {
        if is_valid_step(time_step) {
            self.time_step = time_step;
        } else {
            warn!(time_step, kept = self.time_step, "ignoring invalid time step");
        }
        self
    }

    /// Sets the merge window.
    ///
    /// Values that are not positive and finite are ignored.
    pub fn with_dedup_window(mut self, window: f64) -> Self {
        if is_valid_step(window) {
            self.dedup_window = window;
        } else {
            warn!(window, kept = self.dedup_window, "ignoring invalid merge window");
        }
        self
    }

    /// Sampling step.
    pub fn time_step(&self) -> f64 {
        self.time_step
    }

    /// Samples every route.
    pub fn timelines(&self, routes: &[AgentRoute]) -> Vec<Timeline> {
        routes
            .iter()
            .map(|r| Timeline::from_route(r, self.time_step))
            .collect()
    }

    /// All de-duplicated conflicts, ordered by time.
    pub fn detect(&self, routes: &[AgentRoute]) -> Vec<Conflict> {
        let occupancy: Vec<Occupancy> = self
            .timelines(routes)
            .iter()
            .map(|tl| tl.occupancy(self.time_step))
            .collect();

        let mut found = Vec::new();
        for i in 0..routes.len() {
            for j in (i + 1)..routes.len() {
                let (a, b) = (&routes[i].agent_id, &routes[j].agent_id);
                self.vertex_conflicts(a, &occupancy[i], b, &occupancy[j], &mut found);
                self.edge_conflicts(a, &occupancy[i], b, &occupancy[j], &mut found);
            }
        }

        found.sort_by(|x, y| x.time.total_cmp(&y.time).then(x.kind.cmp(&y.kind)));
        self.deduplicate(found)
    }

    fn vertex_conflicts(
        &self,
        a: &str,
        occ_a: &Occupancy,
        b: &str,
        occ_b: &Occupancy,
        out: &mut Vec<Conflict>,
    ) {
        for (bucket, cells_a) in occ_a {
            let Some(cells_b) = occ_b.get(bucket) else {
                continue;
            };
            let shared = cells_a.iter().find_map(|&(la, pa)| {
                cells_b
                    .iter()
                    .any(|&(lb, pb)| la == lb && la != self.entry_point && !(pa && pb))
                    .then_some(la)
            });
            if let Some(cell) = shared {
                out.push(Conflict::new(
                    ConflictKind::Vertex,
                    *bucket as f64 * self.time_step,
                    a,
                    b,
                    Some(cell),
                ));
            }
        }
    }

    fn edge_conflicts(
        &self,
        a: &str,
        occ_a: &Occupancy,
        b: &str,
        occ_b: &Occupancy,
        out: &mut Vec<Conflict>,
    ) {
        for (&bucket, cells_a) in occ_a {
            let (Some(next_a), Some(cells_b), Some(next_b)) = (
                occ_a.get(&(bucket + 1)),
                occ_b.get(&bucket),
                occ_b.get(&(bucket + 1)),
            ) else {
                continue;
            };
            let (Some(&(xa, pa)), Some(&(ya, qa))) = (cells_a.last(), next_a.first()) else {
                continue;
            };
            let (Some(&(xb, pb)), Some(&(yb, qb))) = (cells_b.last(), next_b.first()) else {
                continue;
            };

            let moving = xa != ya && xb != yb;
            let swapped = xa == yb && ya == xb;
            let idle = pa || qa || pb || qb;
            let at_entry = xa == self.entry_point || ya == self.entry_point;
            if moving && swapped && !idle && !at_entry {
                out.push(Conflict::new(
                    ConflictKind::Edge,
                    bucket as f64 * self.time_step,
                    a,
                    b,
                    Some(xa),
                ));
            }
        }
    }

    fn deduplicate(&self, conflicts: Vec<Conflict>) -> Vec<Conflict> {
        let mut seen = HashSet::new();
        conflicts
            .into_iter()
            .filter(|c| {
                let window = (c.time / self.dedup_window).floor() as i64;
                seen.insert((c.kind, c.agents.clone(), window))
            })
            .collect()
    }
}
