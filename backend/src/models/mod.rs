//! Domain types: timeline events, messages, query results, agent state

pub mod event;
pub mod message;
pub mod query;
pub mod state;

pub use event::{AgentId, BusError, EventDraft, EventPayload, Protocol, Timeline, TimelineEvent};
pub use message::{
    ActivateSiteCommand, AllocateLotRequest, AllocateLotResponse, CreateShipmentRequest,
    ShipmentPlan, SiteActivated, CONSTRAINT_PARTIAL_ALLOCATION,
};
pub use query::{
    BatchInfo, DepotInventory, EnrollmentData, InventorySummary, QueryRecord, QueryResult,
    StabilityStatus, SystemId,
};
pub use state::{AgentPhase, AgentSnapshot, AllocationRecord, ShipmentRecord};
