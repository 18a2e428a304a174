//! Trial Supply Simulator Core - Rust Engine
//!
//! Deterministic simulation of a clinical-trial supply chain as a small
//! multi-agent network. Direct queries to mock backend systems
//! (MCP-style) and structured agent-to-agent messages (A2A-style) share
//! one append-only timeline from which all metrics derive.
//!
//! # Architecture
//!
//! - **core**: logical time (day-granularity clock)
//! - **fixtures**: immutable reference data (sites, batch catalog, rules)
//! - **models**: domain types (timeline events, messages, query results,
//!   agent state)
//! - **systems**: the four mock backend registries
//! - **agents**: decision logic of the four agents, FEFO allocation,
//!   shipment costing
//! - **orchestrator**: trigger injection, dispatch loop, metrics
//! - **rng**: deterministic PRNG for randomized fixture catalogs
//!
//! # Critical Invariants
//!
//! 1. All money values are i64 (cents)
//! 2. The pipeline consumes no randomness; identical fixtures and
//!    trigger parameters replay to an identical timeline
//! 3. Agents share no mutable state; events on the bus are the only
//!    cross-agent channel

// Module declarations
pub mod agents;
pub mod core;
pub mod fixtures;
pub mod models;
pub mod orchestrator;
pub mod rng;
pub mod systems;

// Re-exports for convenience
pub use agents::{
    fefo_allocate, Agent, ClinicalOpsAgent, CroInterfaceAgent, InsufficientSupply,
    LogisticsAgent, LotAllocation, ManufacturingAgent, OutboundMessage, ShippingRates,
    SystemsGateway,
};
pub use crate::core::time::SimClock;
pub use fixtures::{FixtureSet, SiteDescriptor};
pub use models::{
    event::{AgentId, BusError, EventDraft, EventPayload, Protocol, Timeline, TimelineEvent},
    message::{
        ActivateSiteCommand, AllocateLotRequest, AllocateLotResponse, CreateShipmentRequest,
        ShipmentPlan, SiteActivated, CONSTRAINT_PARTIAL_ALLOCATION,
    },
    query::{
        BatchInfo, DepotInventory, EnrollmentData, InventorySummary, QueryRecord, QueryResult,
        StabilityStatus, SystemId,
    },
    state::{AgentPhase, AgentSnapshot, AllocationRecord, ShipmentRecord},
};
pub use orchestrator::{
    Orchestrator, RunReport, SimulationConfig, SimulationError, SimulationMetrics,
};
pub use rng::SimRng;
pub use systems::{MockSystems, SystemError};
