//! End-to-end planning pipeline.
//!
//! | Stage | Component |
//! |-------|-----------|
//! | 1. Input checks | [`PlanInput::validate`], [`PlannerConfig::validate`] |
//! | 2. Allocation | [`GreedyAllocator`] or [`PriorityAllocator`], then [`ConstraintChecker::validate_solution`] |
//! | 3. Routing | [`RouteBuilder`] + [`TwoOptPlanner`] |
//! | 4. Conflicts | [`ConflictResolver`] |
//! | 5. Metrics | [`PlanKpi`] |
//! | 6. Baseline (optional) | [`BranchAndBoundOracle`] |
//!
//! Only malformed input or configuration fails the run; unassignable
//! orders and unresolved conflicts are part of the [`PlanOutcome`].

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::allocation::{AllocationResult, AllocationStrategy, GreedyAllocator, PriorityAllocator};
use crate::collision::{ConflictReport, ConflictResolver};
use crate::config::{AllocationMode, PlannerConfig};
use crate::constraints::ConstraintChecker;
use crate::error::{PlanError, Result};
use crate::fleet::Fleet;
use crate::kpi::PlanKpi;
use crate::loader::PlanInput;
use crate::models::{AgentRoute, Order};
use crate::oracle::{BranchAndBoundOracle, OptimizationOracle, OracleSolution};
use crate::routing::{RouteBuilder, TwoOptPlanner};

/// Everything a planning run produces.
#[derive(Debug, Clone, Serialize)]
pub struct PlanOutcome {
    /// Order → agent assignment and failures.
    pub allocation: AllocationResult,
    /// Final (possibly delayed) routes, one per agent with work, in fleet order.
    pub routes: Vec<AgentRoute>,
    /// Conflict detection and resolution summary.
    pub conflicts: ConflictReport,
    /// Plan metrics over the final routes.
    pub kpi: PlanKpi,
    /// Cost-optimal assignment, when requested.
    pub baseline: Option<OracleSolution>,
}

impl PlanOutcome {
    /// Σ hourly cost of the assigned agent per order, comparable with the
    /// baseline cost.
    pub fn assignment_cost(&self, fleet: &Fleet) -> f64 {
        self.allocation
            .assignments
            .iter()
            .filter_map(|a| fleet.index_of(&a.agent_id))
            .map(|i| fleet.agent(i).cost_per_hour)
            .sum()
    }
}

/// Runs the full pipeline under one configuration.
///
/// # Example
///
/// ```
/// use u_pick::loader::PlanInput;
/// use u_pick::models::{Agent, Location, Order, Product, Warehouse};
/// use u_pick::planner::WarehousePlanner;
/// use u_pick::PlannerConfig;
///
/// let products = vec![Product::new("P1", 2.0, 1.0, Location::new(3, 0))];
/// let catalog = products.iter().cloned().collect();
/// let mut input = PlanInput {
///     warehouse: Warehouse::new(10, 10, Location::new(0, 0)),
///     agents: vec![Agent::robot("R1", 20.0, 30.0)],
///     orders: vec![Order::new("O1").with_item("P1", 1).with_totals(&catalog)],
///     products,
/// };
///
/// let outcome = WarehousePlanner::new(PlannerConfig::new()).plan(&mut input).unwrap();
/// assert_eq!(outcome.allocation.assigned_count(), 1);
/// assert_eq!(outcome.routes[0].total_distance, 6);
/// ```
#[derive(Debug, Clone, Default)]
pub struct WarehousePlanner {
    config: PlannerConfig,
}

impl WarehousePlanner {
    /// Creates a planner.
    pub fn new(config: PlannerConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Plans one batch.
    ///
    /// Sets `assigned_agent` on every order of `input` that was placed.
    pub fn plan(&self, input: &mut PlanInput) -> Result<PlanOutcome> {
        self.config.validate().map_err(PlanError::Config)?;
        input.validate()?;

        let catalog = input.catalog();
        let warehouse = &input.warehouse;
        let mut checker = ConstraintChecker::new(warehouse, &catalog);
        if self.config.enforce_deadlines {
            checker = checker.with_deadlines(self.config.pick_seconds_per_item);
        }

        let mut fleet = Fleet::new(input.agents.clone());
        let allocation = match self.config.allocation {
            AllocationMode::Greedy => {
                GreedyAllocator::new(checker).allocate(&mut fleet, &mut input.orders)
            }
            AllocationMode::Priority => {
                PriorityAllocator::new(checker).allocate(&mut fleet, &mut input.orders)
            }
        };
        allocation.log_summary(&fleet);
        if let Err(violations) = checker.validate_solution(&fleet, &input.orders) {
            for v in &violations {
                if v.kind.category() == "completeness" {
                    debug!(violation = %v, "allocation incomplete");
                } else {
                    warn!(violation = %v, "committed order fails re-check");
                }
            }
        }

        let tour_planner = TwoOptPlanner::from_config(&self.config);
        let builder = RouteBuilder::new(warehouse, &catalog, &tour_planner)
            .with_pick_seconds(self.config.pick_seconds_per_item);

        let mut routes: Vec<AgentRoute> = fleet
            .agents()
            .iter()
            .filter_map(|agent| {
                let orders: Vec<&Order> = input
                    .orders
                    .iter()
                    .filter(|o| o.assigned_agent.as_deref() == Some(agent.id.as_str()))
                    .collect();
                (!orders.is_empty()).then(|| builder.build(agent, &orders))
            })
            .collect();

        let resolver = ConflictResolver::from_config(warehouse.entry_point, &self.config);
        let conflicts = resolver.resolve(&mut routes);
        if !conflicts.is_clear() {
            warn!(summary = %conflicts.summary(), "conflicts remain after resolution");
        }

        let kpi = PlanKpi::calculate(&fleet, &routes, &allocation);

        let baseline = self.config.run_baseline.then(|| {
            BranchAndBoundOracle::new(checker).solve(
                &fleet,
                &input.orders,
                self.config.oracle_time_budget(),
            )
        });

        info!(
            assigned = allocation.assigned_count(),
            failed = allocation.failed_count(),
            routes = routes.len(),
            makespan = kpi.makespan,
            total_cost = kpi.total_cost,
            "planning run complete"
        );

        Ok(PlanOutcome {
            allocation,
            routes,
            conflicts,
            kpi,
            baseline,
        })
    }
}
