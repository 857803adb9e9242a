//! Space-time sampling of routes.
//!
//! A timeline is the list of `(time, cell, picking)` samples of one agent.
//! Samples are taken at every arrival, every `time_step` while dwelling at
//! a stop, and every `time_step` along each travel leg. Legs are walked
//! x first, then y, at the route's uniform speed
//! (total distance ÷ total travel time).

use std::collections::BTreeMap;

use crate::models::{AgentRoute, Location};

/// One sample of an agent's position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Time (s).
    pub time: f64,
    /// Occupied cell.
    pub location: Location,
    /// Whether the agent is picking at `location`.
    pub picking: bool,
}

/// Sampled positions of one agent.
#[derive(Debug, Clone)]
pub struct Timeline {
    /// Owner.
    pub agent_id: String,
    /// Samples in time order.
    pub samples: Vec<Sample>,
}

impl Timeline {
    /// Samples a route at `time_step` resolution.
    ///
    /// A step that is not a positive finite number yields the arrival
    /// samples only.
    pub fn from_route(route: &AgentRoute, time_step: f64) -> Self {
        let mut samples = Vec::new();
        let sampling = is_valid_step(time_step);
        let travel_time = route.travel_time();
        let speed = if travel_time > 0.0 {
            route.total_distance as f64 / travel_time
        } else {
            0.0
        };

        for (i, step) in route.steps.iter().enumerate() {
            samples.push(Sample {
                time: step.arrival,
                location: step.location,
                picking: step.picking,
            });
            if !sampling {
                continue;
            }

            let mut t = step.arrival + time_step;
            while t < step.departure {
                samples.push(Sample {
                    time: t,
                    location: step.location,
                    picking: step.picking,
                });
                t += time_step;
            }

            let Some(next) = route.steps.get(i + 1) else {
                break;
            };
            if speed <= 0.0 || step.location == next.location {
                continue;
            }

            let mut t = step.departure + time_step;
            while t < next.arrival {
                let cells = ((t - step.departure) * speed).floor() as u32;
                samples.push(Sample {
                    time: t,
                    location: step.location.step_toward(&next.location, cells),
                    picking: false,
                });
                t += time_step;
            }
        }

        Self {
            agent_id: route.agent_id.clone(),
            samples,
        }
    }

    /// Per-bucket occupancy: bucket index → samples falling in it.
    pub fn occupancy(&self, time_step: f64) -> BTreeMap<i64, Vec<(Location, bool)>> {
        let mut buckets: BTreeMap<i64, Vec<(Location, bool)>> = BTreeMap::new();
        for s in &self.samples {
            buckets
                .entry(bucket(s.time, time_step))
                .or_default()
                .push((s.location, s.picking));
        }
        buckets
    }
}

/// Whether `time_step` can drive sampling and bucketing.
#[inline]
pub fn is_valid_step(time_step: f64) -> bool {
    time_step.is_finite() && time_step > 0.0
}

/// Bucket index of a time.
#[inline]
pub fn bucket(time: f64, time_step: f64) -> i64 {
    (time / time_step).floor() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AgentKind, RouteStep};

    fn straight_route() -> AgentRoute {
        AgentRoute::new(
            "A",
            AgentKind::Robot,
            vec![
                RouteStep::new(Location::new(0, 0), 0.0),
                RouteStep::new(Location::new(2, 2), 4.0).with_departure(6.0).picking(),
            ],
        )
    }

    #[test]
    fn test_samples_travel_and_dwell() {
        let tl = Timeline::from_route(&straight_route(), 1.0);
        let cells: Vec<(f64, Location, bool)> = tl
            .samples
            .iter()
            .map(|s| (s.time, s.location, s.picking))
            .collect();

        assert_eq!(
            cells,
            vec![
                (0.0, Location::new(0, 0), false),
                (1.0, Location::new(1, 0), false),
                (2.0, Location::new(2, 0), false),
                (3.0, Location::new(2, 1), false),
                (4.0, Location::new(2, 2), true),
                (5.0, Location::new(2, 2), true),
            ]
        );
    }

    #[test]
    fn test_uniform_speed_from_route() {
        // 4 cells in 8 s of travel: half a cell per second.
        let route = AgentRoute::new(
            "A",
            AgentKind::Human,
            vec![
                RouteStep::new(Location::new(0, 0), 0.0),
                RouteStep::new(Location::new(4, 0), 8.0),
            ],
        );
        let tl = Timeline::from_route(&route, 2.0);
        let xs: Vec<i32> = tl.samples.iter().map(|s| s.location.x).collect();
        assert_eq!(xs, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_occupancy_buckets() {
        let tl = Timeline::from_route(&straight_route(), 1.0);
        let occ = tl.occupancy(2.0);
        assert_eq!(occ[&0].len(), 2);
        assert_eq!(occ[&2], vec![(Location::new(2, 2), true), (Location::new(2, 2), true)]);
    }

    #[test]
    fn test_empty_route() {
        let route = AgentRoute::new("A", AgentKind::Cart, Vec::new());
        assert!(Timeline::from_route(&route, 1.0).samples.is_empty());
    }

    #[test]
    fn test_degenerate_step_keeps_arrivals_only() {
        for step in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let tl = Timeline::from_route(&straight_route(), step);
            let times: Vec<f64> = tl.samples.iter().map(|s| s.time).collect();
            assert_eq!(times, vec![0.0, 4.0]);
        }
    }

    #[test]
    fn test_bucket_floor() {
        assert_eq!(bucket(0.0, 1.0), 0);
        assert_eq!(bucket(4.99, 1.0), 4);
        assert_eq!(bucket(5.0, 2.5), 2);
    }
}
