//! Structured agent-to-agent messages
//!
//! One record per message kind. Messages are the only cross-agent
//! influence channel: an agent never touches another agent's state, it
//! publishes one of these and the orchestrator delivers it.
//!
//! Correlation ids (`request_id`) and shipment ids are sequential
//! counters owned by the issuing agent (`REQ-0001`, `SHP-0001`, ...) so
//! that identical runs produce byte-identical timelines.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Constraint flag carried by a partial `AllocateLotResponse`
pub const CONSTRAINT_PARTIAL_ALLOCATION: &str = "partial_allocation";

/// External trigger: activate a trial site
///
/// The single externally initiated event. Everything downstream of it is
/// generated inside the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivateSiteCommand {
    pub site_id: String,
}

/// Site activation notice, CRO Interface → Clinical Operations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteActivated {
    pub study_id: String,
    pub site_id: String,
    pub activation_day: usize,
    /// Planned enrollment for the site, taken from the trial registry
    pub enrollment_target: u32,
}

/// Lot allocation request, Clinical Operations → Manufacturing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocateLotRequest {
    pub request_id: String,
    pub study_id: String,
    pub site_id: String,
    pub quantity: u32,
}

/// Lot allocation response, Manufacturing → Clinical Operations
///
/// `batch_ids` is ordered by ascending expiry (FEFO order). A shortfall
/// is reported as data: the response carries everything that could be
/// allocated plus the `partial_allocation` constraint flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocateLotResponse {
    pub request_id: String,
    pub study_id: String,
    pub site_id: String,
    pub batch_ids: Vec<String>,
    pub allocated_quantity: u32,
    pub release_day: usize,
    pub constraints: BTreeSet<String>,
}

impl AllocateLotResponse {
    /// Whether the allocation fell short of the requested quantity
    pub fn is_partial(&self) -> bool {
        self.constraints
            .contains(CONSTRAINT_PARTIAL_ALLOCATION)
    }
}

/// Shipment request, Clinical Operations → Logistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateShipmentRequest {
    pub request_id: String,
    pub site_id: String,
    pub batch_ids: Vec<String>,
    pub quantity: u32,
    pub target_delivery_day: usize,
}

/// Shipment plan, Logistics → Clinical Operations
///
/// `compliance_flags` carries the active rule identifiers found at plan
/// time; a non-empty set is informational and does not block shipment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipmentPlan {
    pub request_id: String,
    pub shipment_id: String,
    pub site_id: String,
    pub batch_ids: Vec<String>,
    pub departure_day: usize,
    pub eta_day: usize,
    pub cost_cents: i64,
    pub compliance_flags: BTreeSet<String>,
}
