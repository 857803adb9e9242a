//! Closed-tour planners over Manhattan distance.
//!
//! A tour starts at the entry point, visits every stop exactly once and
//! returns to the entry point.
//!
//! # Reference
//! Lin & Kernighan (1973), "An Effective Heuristic Algorithm for the
//! Traveling-Salesman Problem"; Croes (1958), 2-opt.

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::debug;

use crate::config::PlannerConfig;
use crate::models::Location;

/// Visiting order of a stop set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tour {
    /// Stop indices in visiting order (a permutation of `0..stops.len()`).
    pub sequence: Vec<usize>,
    /// Distance from the entry up to each visit, parallel to `sequence`.
    pub cumulative_distance: Vec<u32>,
    /// Closed tour length, return leg included.
    pub total_distance: u32,
}

impl Tour {
    /// Builds a tour from a visiting order, computing its distances.
    pub fn from_sequence(entry: Location, stops: &[Location], sequence: Vec<usize>) -> Self {
        let mut cumulative_distance = Vec::with_capacity(sequence.len());
        let mut position = entry;
        let mut travelled = 0;
        for &i in &sequence {
            travelled += position.distance_to(&stops[i]);
            cumulative_distance.push(travelled);
            position = stops[i];
        }
        let total_distance = travelled + position.distance_to(&entry);

        Self {
            sequence,
            cumulative_distance,
            total_distance,
        }
    }

    /// Whether `sequence` visits each of `n` stops exactly once.
    pub fn is_permutation_of(&self, n: usize) -> bool {
        let mut seen = vec![false; n];
        self.sequence.len() == n
            && self
                .sequence
                .iter()
                .all(|&i| i < n && !std::mem::replace(&mut seen[i], true))
    }
}

/// Turns a stop set into a closed tour from the entry point.
///
/// Implementations must always return a valid permutation, even when
/// they run out of time.
pub trait RoutePlanner {
    /// Planner name for logs.
    fn name(&self) -> &'static str;

    /// Plans a tour over `stops`.
    fn plan(&self, entry: Location, stops: &[Location]) -> Tour;
}

/// Nearest-neighbour construction.
///
/// Always moves to the closest unvisited stop; ties go to the lower index.
#[derive(Debug, Clone, Copy, Default)]
pub struct NearestNeighborPlanner;

impl NearestNeighborPlanner {
    fn sequence(entry: Location, stops: &[Location]) -> Vec<usize> {
        let mut visited = vec![false; stops.len()];
        let mut sequence = Vec::with_capacity(stops.len());
        let mut position = entry;

        for _ in 0..stops.len() {
            let next = (0..stops.len())
                .filter(|&i| !visited[i])
                .min_by_key(|&i| (position.distance_to(&stops[i]), i));
            let Some(next) = next else { break };
            visited[next] = true;
            sequence.push(next);
            position = stops[next];
        }
        sequence
    }
}

impl RoutePlanner for NearestNeighborPlanner {
    fn name(&self) -> &'static str {
        "nearest_neighbor"
    }

    fn plan(&self, entry: Location, stops: &[Location]) -> Tour {
        Tour::from_sequence(entry, stops, Self::sequence(entry, stops))
    }
}

/// Nearest-neighbour seed improved by 2-opt, plus seeded random restarts.
///
/// Stops improving once the wall-clock budget is spent and returns the
/// best tour found so far.
#[derive(Debug, Clone)]
pub struct TwoOptPlanner {
    time_budget: Duration,
    restarts: usize,
    seed: u64,
}

impl TwoOptPlanner {
    /// Creates a planner.
    pub fn new(time_budget: Duration, restarts: usize, seed: u64) -> Self {
        Self {
            time_budget,
            restarts,
            seed,
        }
    }

    /// Creates a planner from the run configuration.
    pub fn from_config(config: &PlannerConfig) -> Self {
        Self::new(config.route_time_budget(), config.route_restarts, config.seed)
    }
}

impl Default for TwoOptPlanner {
    fn default() -> Self {
        Self::from_config(&PlannerConfig::default())
    }
}

impl RoutePlanner for TwoOptPlanner {
    fn name(&self) -> &'static str {
        "two_opt"
    }

    fn plan(&self, entry: Location, stops: &[Location]) -> Tour {
        let deadline = Instant::now() + self.time_budget;

        let mut best = NearestNeighborPlanner::sequence(entry, stops);
        improve(entry, stops, &mut best, deadline);
        let mut best_len = Tour::from_sequence(entry, stops, best.clone()).total_distance;

        if stops.len() > 3 {
            let mut rng = SmallRng::seed_from_u64(self.seed);
            for restart in 0..self.restarts {
                if Instant::now() >= deadline {
                    debug!(restart, "tour budget spent");
                    break;
                }
                let mut candidate = perturb(&best, &mut rng);
                improve(entry, stops, &mut candidate, deadline);
                let len = Tour::from_sequence(entry, stops, candidate.clone()).total_distance;
                if len < best_len {
                    best = candidate;
                    best_len = len;
                }
            }
        }

        Tour::from_sequence(entry, stops, best)
    }
}

/// Random restart point: either a full shuffle or a double-bridge move.
fn perturb<R: Rng>(sequence: &[usize], rng: &mut R) -> Vec<usize> {
    let mut next = sequence.to_vec();
    if rng.random_bool(0.5) {
        next.shuffle(rng);
        return next;
    }

    let n = next.len();
    let mut cuts = [rng.random_range(1..n), rng.random_range(1..n), rng.random_range(1..n)];
    cuts.sort_unstable();
    let [a, b, c] = cuts;
    let mut bridged = Vec::with_capacity(n);
    bridged.extend_from_slice(&next[..a]);
    bridged.extend_from_slice(&next[c..]);
    bridged.extend_from_slice(&next[b..c]);
    bridged.extend_from_slice(&next[a..b]);
    next = bridged;
    next
}

/// First-improvement 2-opt on the closed path `entry, stops.., entry`.
fn improve(entry: Location, stops: &[Location], sequence: &mut [usize], deadline: Instant) {
    let n = sequence.len();
    let at = |seq: &[usize], pos: usize| -> Location {
        if pos == 0 || pos == n + 1 {
            entry
        } else {
            stops[seq[pos - 1]]
        }
    };

    loop {
        let mut improved = false;
        for i in 1..n {
            for j in (i + 1)..=n {
                let (a, b) = (at(sequence, i - 1), at(sequence, i));
                let (c, d) = (at(sequence, j), at(sequence, j + 1));
                let before = a.distance_to(&b) + c.distance_to(&d);
                let after = a.distance_to(&c) + b.distance_to(&d);
                if after < before {
                    sequence[i - 1..j].reverse();
                    improved = true;
                }
            }
            if Instant::now() >= deadline {
                return;
            }
        }
        if !improved {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Vec<Location> {
        vec![Location::new(5, 0), Location::new(5, 5), Location::new(0, 5)]
    }

    #[test]
    fn test_square_tour_is_twenty() {
        let entry = Location::new(0, 0);
        let nn = NearestNeighborPlanner.plan(entry, &square());
        assert_eq!(nn.total_distance, 20);
        assert_eq!(nn.sequence, vec![0, 1, 2]);
        assert_eq!(nn.cumulative_distance, vec![5, 10, 15]);

        let opt = TwoOptPlanner::default().plan(entry, &square());
        assert_eq!(opt.total_distance, 20);
        assert!(opt.is_permutation_of(3));
    }

    #[test]
    fn test_two_opt_removes_crossing() {
        let entry = Location::new(0, 0);
        // Visiting in input order zig-zags across the grid.
        let stops = vec![
            Location::new(10, 0),
            Location::new(0, 10),
            Location::new(10, 10),
            Location::new(0, 5),
            Location::new(10, 5),
        ];
        let crossing = Tour::from_sequence(entry, &stops, vec![0, 1, 2, 3, 4]);
        let nn = NearestNeighborPlanner.plan(entry, &stops);
        let opt = TwoOptPlanner::new(Duration::from_millis(500), 8, 7).plan(entry, &stops);

        assert!(opt.is_permutation_of(stops.len()));
        assert!(opt.total_distance <= nn.total_distance);
        assert!(opt.total_distance < crossing.total_distance);
        assert_eq!(opt.total_distance, 40);
    }

    #[test]
    fn test_zero_budget_still_valid() {
        let entry = Location::new(0, 0);
        let stops: Vec<Location> = (0..12).map(|i| Location::new((i * 7) % 11, (i * 3) % 5)).collect();
        let tour = TwoOptPlanner::new(Duration::ZERO, 4, 1).plan(entry, &stops);
        assert!(tour.is_permutation_of(stops.len()));
        assert_eq!(tour.cumulative_distance.len(), stops.len());
    }

    #[test]
    fn test_seeded_planner_is_deterministic() {
        let entry = Location::new(0, 0);
        let stops: Vec<Location> = (0..9).map(|i| Location::new((i * 5) % 9, (i * 4) % 7)).collect();
        let planner = TwoOptPlanner::new(Duration::from_secs(5), 4, 42);
        assert_eq!(planner.plan(entry, &stops), planner.plan(entry, &stops));
    }

    #[test]
    fn test_empty_and_single_stop() {
        let entry = Location::new(2, 2);
        let empty = TwoOptPlanner::default().plan(entry, &[]);
        assert_eq!(empty.total_distance, 0);
        assert!(empty.sequence.is_empty());

        let one = NearestNeighborPlanner.plan(entry, &[Location::new(4, 5)]);
        assert_eq!(one.total_distance, 10);
        assert_eq!(one.cumulative_distance, vec![5]);
    }

    #[test]
    fn test_perturb_keeps_permutation() {
        let mut rng = SmallRng::seed_from_u64(3);
        let base: Vec<usize> = (0..8).collect();
        for _ in 0..20 {
            let mut p = perturb(&base, &mut rng);
            p.sort_unstable();
            assert_eq!(p, base);
        }
    }
}
