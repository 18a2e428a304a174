//! Agent-local state records and read-only snapshots
//!
//! Each agent owns one mutable state record. The record is only ever
//! mutated by that agent's own decision procedure; other components (the
//! orchestrator, the rendering collaborator) read immutable snapshots.
//!
//! Deterministic collections (BTreeMap/BTreeSet) keep snapshots and
//! serialized output stable across runs.

use crate::models::event::AgentId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Lifecycle phase of an agent's request/response chain
///
/// Transitions are driven solely by event arrival; no agent polls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgentPhase {
    /// No request in flight
    Idle,
    /// Waiting for the response correlated with `request_id`
    AwaitingResponse { request_id: String },
    /// Terminal for this agent's chain
    Done,
}

/// A completed lot allocation as recorded by an agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationRecord {
    pub request_id: String,
    pub site_id: String,
    /// Batch ids in FEFO order
    pub batch_ids: Vec<String>,
    pub quantity: u32,
    pub release_day: usize,
    pub partial: bool,
}

/// A planned shipment as recorded by an agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipmentRecord {
    pub shipment_id: String,
    pub site_id: String,
    pub batch_ids: Vec<String>,
    pub departure_day: usize,
    pub eta_day: usize,
    pub cost_cents: i64,
    /// True when the compliance rule set was non-empty at plan time
    pub compliance_flagged: bool,
}

/// Read-only snapshot of one agent's state
///
/// Exposed to the rendering collaborator; serializable as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSnapshot {
    pub agent: AgentId,
    pub phase: AgentPhase,
    /// Stock positions by batch id (empty for agents that hold no stock)
    pub inventory: BTreeMap<String, u32>,
    /// Request ids awaiting a correlated response
    pub pending_requests: BTreeSet<String>,
    pub allocations: Vec<AllocationRecord>,
    pub shipments: Vec<ShipmentRecord>,
}

impl AgentSnapshot {
    /// Empty snapshot for an agent with fresh state
    pub fn empty(agent: AgentId) -> Self {
        Self {
            agent,
            phase: AgentPhase::Idle,
            inventory: BTreeMap::new(),
            pending_requests: BTreeSet::new(),
            allocations: Vec::new(),
            shipments: Vec::new(),
        }
    }
}
