//! Fatal planning errors.
//!
//! Only malformed input aborts a run. Everything the planner can recover
//! from (constraint violations, unassignable orders, unresolved conflicts)
//! is reported as a value instead.

use thiserror::Error;

use crate::models::ClockTimeError;
use crate::validation::ValidationError;

/// Errors that abort a planning run.
#[derive(Error, Debug)]
pub enum PlanError {
    /// Input could not be parsed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Input file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Unknown agent type in the fleet file.
    #[error("unknown agent type '{kind}' for agent {agent_id}")]
    UnknownAgentKind { agent_id: String, kind: String },

    /// Unknown order priority.
    #[error("unknown priority '{priority}' for order {order_id}")]
    UnknownPriority { order_id: String, priority: String },

    /// A required field is absent.
    #[error("{entity} is missing field '{field}'")]
    MissingField { entity: String, field: String },

    /// Malformed time of day.
    #[error(transparent)]
    ClockTime(#[from] ClockTimeError),

    /// Structural problems found by input validation.
    #[error("invalid input: {}", summarize(.0))]
    Invalid(Vec<ValidationError>),

    /// Configuration values out of range.
    #[error("invalid configuration: {0}")]
    Config(String),
}

fn summarize(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result alias for fallible planning operations.
pub type Result<T> = std::result::Result<T, PlanError>;
