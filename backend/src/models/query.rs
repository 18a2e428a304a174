//! Direct-query result records
//!
//! Payloads returned by the four mock backend registries. One record per
//! query lands on the timeline as a `DirectQuery` event so the rendering
//! collaborator can show agent↔system traffic alongside agent messages.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Backend registry identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SystemId {
    /// Trial/CTMS registry: site roster and enrollment forecasts
    TrialRegistry,
    /// Lab/stability registry: batch catalog, stability and expiry
    LabRegistry,
    /// Warehouse/inventory registry: depot stock positions
    WarehouseRegistry,
    /// Compliance/ERP registry: shipping rules and inventory totals
    ComplianceRegistry,
}

impl SystemId {
    /// Human-readable registry name
    pub fn display_name(&self) -> &'static str {
        match self {
            SystemId::TrialRegistry => "Trial Registry",
            SystemId::LabRegistry => "Lab Registry",
            SystemId::WarehouseRegistry => "Warehouse Registry",
            SystemId::ComplianceRegistry => "Compliance Registry",
        }
    }
}

impl std::fmt::Display for SystemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Stability disposition of a batch
///
/// Only `Approved` batches are eligible for allocation. Expiry is a
/// separate, date-dependent check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StabilityStatus {
    Approved,
    Quarantined,
}

/// 90-day enrollment ramp forecast for one site
///
/// `daily_forecast` holds `(day, count)` pairs where `day` is 1-based and
/// `count` is the number of subjects expected to enroll on that day. The
/// derived cumulative curve is monotonically non-decreasing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrollmentData {
    pub site_id: String,
    pub daily_forecast: Vec<(usize, u32)>,
}

impl EnrollmentData {
    /// Cumulative expected enrollment through `day` (inclusive)
    pub fn cumulative_through(&self, day: usize) -> u32 {
        self.daily_forecast
            .iter()
            .filter(|(d, _)| *d <= day)
            .map(|(_, count)| count)
            .sum()
    }
}

/// Batch record as reported by the lab registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchInfo {
    pub batch_id: String,
    /// Day on which the batch expires (exclusive: unusable on this day)
    pub expiry_day: usize,
    pub stability_status: StabilityStatus,
    pub quantity_available: u32,
}

/// Depot stock positions serving one site
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepotInventory {
    pub site_id: String,
    pub on_hand_by_batch: BTreeMap<String, u32>,
}

/// ERP-level inventory totals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventorySummary {
    pub total_units: u32,
    pub batch_count: u32,
}

/// Result carried by a `DirectQuery` timeline event
///
/// `NotFound` makes failed lookups visible on the timeline; the querying
/// agent downgrades them locally and the run continues.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum QueryResult {
    Sites(Vec<crate::fixtures::SiteDescriptor>),
    Enrollment(EnrollmentData),
    Batches(Vec<BatchInfo>),
    BatchExpiry {
        batch_id: String,
        valid_on_day: usize,
        valid: bool,
    },
    Depot(DepotInventory),
    Compliance {
        site_id: String,
        rules: BTreeSet<String>,
    },
    InventorySummary(InventorySummary),
    NotFound {
        entity: String,
        id: String,
    },
}

/// One direct query as recorded on the timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRecord {
    /// Registry that answered the query
    pub system: SystemId,
    /// Operation name, e.g. `get_trial_sites`
    pub operation: String,
    pub result: QueryResult,
}
