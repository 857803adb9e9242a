//! Conflict values and the resolution report.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::Location;

/// Conflict classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictKind {
    /// Two agents on the same cell in the same time bucket.
    Vertex,
    /// Two agents swapping adjacent cells between consecutive buckets.
    Edge,
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictKind::Vertex => write!(f, "vertex"),
            ConflictKind::Edge => write!(f, "edge"),
        }
    }
}

/// A detected space-time conflict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conflict {
    /// Conflict type.
    pub kind: ConflictKind,
    /// Start of the time bucket the conflict was seen in (s).
    pub time: f64,
    /// Involved agents, lexicographically sorted.
    pub agents: (String, String),
    /// Shared cell (vertex) or the first agent's source cell (edge).
    pub location: Option<Location>,
}

impl Conflict {
    /// Creates a conflict; the agent pair is stored sorted.
    pub fn new(
        kind: ConflictKind,
        time: f64,
        a: impl Into<String>,
        b: impl Into<String>,
        location: Option<Location>,
    ) -> Self {
        let (a, b) = (a.into(), b.into());
        let agents = if a <= b { (a, b) } else { (b, a) };
        Self {
            kind,
            time,
            agents,
            location,
        }
    }

    /// Whether the conflict involves `agent_id`.
    pub fn involves(&self, agent_id: &str) -> bool {
        self.agents.0 == agent_id || self.agents.1 == agent_id
    }
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} conflict at t={:.1}s between {} and {}",
            self.kind, self.time, self.agents.0, self.agents.1
        )?;
        if let Some(loc) = self.location {
            write!(f, " at {loc}")?;
        }
        Ok(())
    }
}

/// Conflict counts by kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictCounts {
    /// Vertex conflicts.
    pub vertex: usize,
    /// Edge conflicts.
    pub edge: usize,
}

impl ConflictCounts {
    /// Counts a conflict list.
    pub fn of(conflicts: &[Conflict]) -> Self {
        let vertex = conflicts
            .iter()
            .filter(|c| c.kind == ConflictKind::Vertex)
            .count();
        Self {
            vertex,
            edge: conflicts.len() - vertex,
        }
    }

    /// All conflicts.
    pub fn total(&self) -> usize {
        self.vertex + self.edge
    }
}

/// How the resolver finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ResolutionStatus {
    /// No vertex conflict remains.
    Converged,
    /// Round limit reached; the final state is the best one seen.
    IterationLimit,
    /// The final state was worse than the best one seen and was rolled
    /// back to it.
    Abandoned {
        /// Conflict count of the restored state.
        best_count: usize,
    },
}

/// A wait injected into a route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedDelay {
    /// Delayed agent.
    pub agent_id: String,
    /// Conflict time that triggered the wait (s).
    pub at: f64,
    /// Wait length (s).
    pub amount: f64,
}

/// Outcome of conflict detection and resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictReport {
    /// Counts before any delay.
    pub initial: ConflictCounts,
    /// Counts of the returned routes.
    pub remaining: ConflictCounts,
    /// Fewest conflicts seen in any state.
    pub best_count: usize,
    /// Resolution rounds run.
    pub iterations: usize,
    /// Waits applied, in order. Includes waits later undone by a rollback.
    pub delays: Vec<AppliedDelay>,
    /// Termination status.
    pub status: ResolutionStatus,
    /// Remaining conflicts, capped at the configured listing limit.
    pub conflicts: Vec<Conflict>,
}

impl ConflictReport {
    /// Whether the returned routes are free of conflicts.
    pub fn is_clear(&self) -> bool {
        self.remaining.total() == 0
    }

    /// Short human-readable summary.
    pub fn summary(&self) -> String {
        let status = match self.status {
            ResolutionStatus::Converged => "converged".to_string(),
            ResolutionStatus::IterationLimit => "iteration limit".to_string(),
            ResolutionStatus::Abandoned { best_count } => format!("abandoned at {best_count}"),
        };
        format!(
            "{} -> {} conflicts ({} vertex, {} edge) after {} rounds, {}",
            self.initial.total(),
            self.remaining.total(),
            self.remaining.vertex,
            self.remaining.edge,
            self.iterations,
            status
        )
    }
}
