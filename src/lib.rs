//! Warehouse fleet planning for mixed robot / human / cart fleets.
//!
//! Assigns a batch of orders to agents under hard constraints, lays out a
//! timed route per agent, then detects and repairs space-time conflicts
//! between the routes. Single-pass batch planning.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Location`, `Warehouse`, `Product`,
//!   `Agent`, `Order`, `AgentRoute`
//! - **`fleet`**: Agent table with per-pass load state and Cart↔Human pairing
//! - **`constraints`**: Capacity, compatibility and kind-specific checks
//! - **`allocation`**: Greedy and strict-priority order allocation
//! - **`batching`**: Grouping of compatible orders per agent
//! - **`routing`**: Tour planning (nearest neighbour, 2-opt) and timed routes
//! - **`collision`**: Vertex/edge conflict detection and wait-based resolution
//! - **`oracle`**: Cost-optimal branch-and-bound baseline
//! - **`kpi`**: Plan metrics
//! - **`storage`**: Order-history slotting analysis and proposals
//! - **`validation`**: Input integrity checks (duplicate IDs, dangling refs, pairings)
//! - **`loader`**: JSON input
//! - **`planner`**: The end-to-end pipeline
//!
//! # Logging
//!
//! Progress is reported through `tracing`; no subscriber is installed.
//!
//! # References
//!
//! - Stern et al. (2019), "Multi-Agent Pathfinding: Definitions, Variants, and Benchmarks"
//! - Martello & Toth (1990), "Knapsack Problems"
//! - Croes (1958), "A Method for Solving Traveling-Salesman Problems"

pub mod allocation;
pub mod batching;
pub mod collision;
pub mod config;
pub mod constraints;
pub mod error;
pub mod fleet;
pub mod kpi;
pub mod loader;
pub mod models;
pub mod oracle;
pub mod planner;
pub mod routing;
pub mod storage;
pub mod validation;

pub use config::{AllocationMode, PlannerConfig};
pub use error::{PlanError, Result};
pub use loader::PlanInput;
pub use planner::{PlanOutcome, WarehousePlanner};
