//! Fleet table and per-pass agent state.
//!
//! The fleet owns the read-only [`Agent`] configuration together with one
//! [`AgentState`] per agent. States are indexed in parallel with agents
//! and are wiped by [`Fleet::reset`] at the start of every allocation pass.
//!
//! Cart ↔ Human pairing is a mutual, non-owning association stored as
//! indices into the agent table.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constraints::{ConstraintViolation, ViolationKind};
use crate::models::{Agent, AgentKind, Catalog, Order};

/// Mutable state of one agent during an allocation pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentState {
    /// Committed weight (kg).
    pub load_weight: f64,
    /// Committed volume (dm³).
    pub load_volume: f64,
    /// Distinct product ids already carried.
    pub carried_products: Vec<String>,
    /// Committed orders, in commitment order.
    pub assigned_orders: Vec<String>,
    /// Index of the paired agent (cart ↔ human).
    pub partner: Option<usize>,
}

impl AgentState {
    /// Whether the agent currently has a partner.
    #[inline]
    pub fn is_paired(&self) -> bool {
        self.partner.is_some()
    }

    /// Commits an order: adds its totals, products and id.
    pub fn commit(&mut self, order: &Order, catalog: &Catalog) {
        self.load_weight += order.total_weight;
        self.load_volume += order.total_volume;
        for product in order.products(catalog) {
            if !self.carried_products.contains(&product.id) {
                self.carried_products.push(product.id.clone());
            }
        }
        self.assigned_orders.push(order.id.clone());
    }
}

/// Agents plus their per-pass state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Fleet {
    agents: Vec<Agent>,
    states: Vec<AgentState>,
}

impl Fleet {
    /// Creates a fleet with fresh state and configured pairings applied.
    pub fn new(agents: Vec<Agent>) -> Self {
        let states = vec![AgentState::default(); agents.len()];
        let mut fleet = Self { agents, states };
        fleet.reset();
        fleet
    }

    /// Number of agents.
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    /// Whether the fleet is empty.
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Agent configuration by index.
    #[inline]
    pub fn agent(&self, index: usize) -> &Agent {
        &self.agents[index]
    }

    /// Agent state by index.
    #[inline]
    pub fn state(&self, index: usize) -> &AgentState {
        &self.states[index]
    }

    /// Mutable agent state by index.
    pub(crate) fn state_mut(&mut self, index: usize) -> &mut AgentState {
        &mut self.states[index]
    }

    /// All agents in input order.
    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    /// Index of an agent by id.
    pub fn index_of(&self, agent_id: &str) -> Option<usize> {
        self.agents.iter().position(|a| a.id == agent_id)
    }

    /// Agent and state pairs in input order.
    pub fn iter(&self) -> impl Iterator<Item = (&Agent, &AgentState)> {
        self.agents.iter().zip(self.states.iter())
    }

    /// Id of an agent's current partner.
    pub fn partner_of(&self, index: usize) -> Option<&str> {
        self.states[index]
            .partner
            .map(|p| self.agents[p].id.as_str())
    }

    /// Clears every per-pass state, then re-applies configured pairings.
    ///
    /// A configured pairing is applied only between a cart and a human,
    /// both still free; anything else is ignored here and reported by
    /// [`crate::validation::validate_input`].
    pub fn reset(&mut self) {
        for state in &mut self.states {
            *state = AgentState::default();
        }

        for cart in 0..self.agents.len() {
            if self.agents[cart].kind != AgentKind::Cart {
                continue;
            }
            let Some(partner_id) = self.agents[cart].paired_with.clone() else {
                continue;
            };
            if let Some(human) = self.index_of(&partner_id) {
                if self.pair(cart, human).is_err() {
                    debug!(cart = %self.agents[cart].id, human = %partner_id, "configured pairing skipped");
                }
            }
        }

        // Humans may name their cart instead.
        for human in 0..self.agents.len() {
            if self.agents[human].kind != AgentKind::Human || self.states[human].is_paired() {
                continue;
            }
            let Some(partner_id) = self.agents[human].paired_with.clone() else {
                continue;
            };
            if let Some(cart) = self.index_of(&partner_id) {
                if self.pair(cart, human).is_err() {
                    debug!(human = %self.agents[human].id, cart = %partner_id, "configured pairing skipped");
                }
            }
        }
    }

    /// Checks whether a cart and a human may be paired.
    pub fn can_pair(&self, cart: usize, human: usize) -> Result<(), ConstraintViolation> {
        let cart_agent = &self.agents[cart];
        let human_agent = &self.agents[human];

        if cart_agent.kind != AgentKind::Cart {
            return Err(ConstraintViolation::new(
                ViolationKind::InvalidPairing,
                &cart_agent.id,
                format!("{} is not a cart", cart_agent.id),
            ));
        }
        if human_agent.kind != AgentKind::Human {
            return Err(ConstraintViolation::new(
                ViolationKind::InvalidPairing,
                &human_agent.id,
                format!("{} is not a human", human_agent.id),
            ));
        }
        if let Some(p) = self.states[human].partner.filter(|&p| p != cart) {
            return Err(ConstraintViolation::new(
                ViolationKind::InvalidPairing,
                &human_agent.id,
                format!(
                    "human {} is already paired with cart {}",
                    human_agent.id, self.agents[p].id
                ),
            ));
        }
        if let Some(p) = self.states[cart].partner.filter(|&p| p != human) {
            return Err(ConstraintViolation::new(
                ViolationKind::InvalidPairing,
                &cart_agent.id,
                format!(
                    "cart {} is already paired with human {}",
                    cart_agent.id, self.agents[p].id
                ),
            ));
        }
        Ok(())
    }

    /// Pairs a cart with a human (both directions).
    pub fn pair(&mut self, cart: usize, human: usize) -> Result<(), ConstraintViolation> {
        self.can_pair(cart, human)?;
        self.states[cart].partner = Some(human);
        self.states[human].partner = Some(cart);
        Ok(())
    }

    /// Pairs every unpaired cart with the next unpaired human.
    ///
    /// First-fit in input order; existing pairings are never reshuffled.
    /// Returns the number of new pairs.
    pub fn auto_pair(&mut self) -> usize {
        let mut paired = 0;
        let mut next_human = 0;

        for cart in 0..self.agents.len() {
            if self.agents[cart].kind != AgentKind::Cart || self.states[cart].is_paired() {
                continue;
            }
            while next_human < self.agents.len()
                && (self.agents[next_human].kind != AgentKind::Human
                    || self.states[next_human].is_paired())
            {
                next_human += 1;
            }
            if next_human == self.agents.len() {
                debug!(cart = %self.agents[cart].id, "no free human left for cart");
                break;
            }
            if self.pair(cart, next_human).is_ok() {
                debug!(
                    cart = %self.agents[cart].id,
                    human = %self.agents[next_human].id,
                    "cart paired"
                );
                paired += 1;
            }
            next_human += 1;
        }

        paired
    }
}
