//! Mock backend systems
//!
//! Four independent read-only registries stand in for the production
//! CTMS, LIMS, WMS and compliance/ERP backends. Queries are pure given
//! the fixture set: calling the same operation twice with the same
//! arguments returns the same answer, and nothing is mutated beyond
//! per-operation call counters kept for observability.
//!
//! Agents never hold a registry directly; they go through the
//! `SystemsGateway` (see `agents`), which records every call as a
//! `DirectQuery` event on the timeline.

use crate::fixtures::{FixtureSet, SiteDescriptor};
use crate::models::query::{
    BatchInfo, DepotInventory, EnrollmentData, InventorySummary, StabilityStatus,
};
use serde::Serialize;
use std::cell::Cell;
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

/// Horizon of the enrollment ramp forecast, in days
pub const ENROLLMENT_FORECAST_DAYS: usize = 90;

/// Recoverable query failure
///
/// A `NotFound` never aborts the run: the querying agent downgrades it
/// locally, typically to a constraint flag or a skipped step.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SystemError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },
}

/// Trial/CTMS registry: site roster and enrollment forecasts
#[derive(Debug, Clone)]
pub struct TrialRegistry {
    sites: Vec<SiteDescriptor>,
}

impl TrialRegistry {
    pub fn new(sites: Vec<SiteDescriptor>) -> Self {
        Self { sites }
    }

    /// All registered trial sites, in roster order. Never fails.
    pub fn trial_sites(&self) -> &[SiteDescriptor] {
        &self.sites
    }

    /// 90-day enrollment ramp forecast for a site
    ///
    /// A linear ramp toward the site's planned enrollment: cumulative
    /// enrollment through day `d` is `planned * d / horizon`, so the
    /// cumulative curve is monotonically non-decreasing and reaches the
    /// target on the final day.
    pub fn enrollment_data(&self, site_id: &str) -> Result<EnrollmentData, SystemError> {
        let site = self
            .sites
            .iter()
            .find(|s| s.site_id == site_id)
            .ok_or_else(|| SystemError::NotFound {
                entity: "site",
                id: site_id.to_string(),
            })?;

        let horizon = ENROLLMENT_FORECAST_DAYS;
        let cumulative = |day: usize| -> u32 {
            (site.planned_enrollment as u64 * day as u64 / horizon as u64) as u32
        };
        let daily_forecast = (1..=horizon)
            .map(|day| (day, cumulative(day) - cumulative(day - 1)))
            .collect();

        Ok(EnrollmentData {
            site_id: site.site_id.clone(),
            daily_forecast,
        })
    }
}

/// Lab/stability registry: batch catalog, stability, expiry
#[derive(Debug, Clone)]
pub struct LabRegistry {
    batches: Vec<BatchInfo>,
}

impl LabRegistry {
    pub fn new(batches: Vec<BatchInfo>) -> Self {
        Self { batches }
    }

    /// Full batch catalog with stability dispositions. Never fails.
    pub fn batch_catalog(&self) -> &[BatchInfo] {
        &self.batches
    }

    /// Stability record for one batch
    pub fn batch_stability(&self, batch_id: &str) -> Result<&BatchInfo, SystemError> {
        self.batches
            .iter()
            .find(|b| b.batch_id == batch_id)
            .ok_or_else(|| SystemError::NotFound {
                entity: "batch",
                id: batch_id.to_string(),
            })
    }

    /// Whether a batch is still usable on `on_day`
    pub fn check_batch_expiry(&self, batch_id: &str, on_day: usize) -> Result<bool, SystemError> {
        let batch = self.batch_stability(batch_id)?;
        Ok(batch.expiry_day > on_day)
    }
}

/// Warehouse/inventory registry: depot stock positions
#[derive(Debug, Clone)]
pub struct WarehouseRegistry {
    on_hand: BTreeMap<String, u32>,
}

impl WarehouseRegistry {
    pub fn new(batches: &[BatchInfo]) -> Self {
        let on_hand = batches
            .iter()
            .map(|b| (b.batch_id.clone(), b.quantity_available))
            .collect();
        Self { on_hand }
    }

    /// Stock positions at the depot serving `site_id`. Never fails.
    pub fn depot_inventory(&self, site_id: &str) -> DepotInventory {
        DepotInventory {
            site_id: site_id.to_string(),
            on_hand_by_batch: self.on_hand.clone(),
        }
    }
}

/// Compliance/ERP registry: shipping rules and inventory totals
#[derive(Debug, Clone)]
pub struct ComplianceRegistry {
    rules_by_site: BTreeMap<String, BTreeSet<String>>,
    summary: InventorySummary,
}

impl ComplianceRegistry {
    pub fn new(
        rules_by_site: BTreeMap<String, BTreeSet<String>>,
        batches: &[BatchInfo],
    ) -> Self {
        let summary = InventorySummary {
            total_units: batches
                .iter()
                .filter(|b| b.stability_status == StabilityStatus::Approved)
                .map(|b| b.quantity_available)
                .sum(),
            batch_count: batches.len() as u32,
        };
        Self {
            rules_by_site,
            summary,
        }
    }

    /// Active rule identifiers for a site; empty set means compliant.
    /// Never fails: unknown sites simply have no active rules.
    pub fn compliance_rules(&self, site_id: &str) -> BTreeSet<String> {
        self.rules_by_site.get(site_id).cloned().unwrap_or_default()
    }

    /// ERP-level inventory totals. Never fails.
    pub fn inventory_summary(&self) -> InventorySummary {
        self.summary
    }
}

/// Per-operation call counters, for observability only
#[derive(Debug, Default)]
pub struct QueryCounters {
    pub trial_sites: Cell<u64>,
    pub enrollment_data: Cell<u64>,
    pub batch_catalog: Cell<u64>,
    pub check_batch_expiry: Cell<u64>,
    pub depot_inventory: Cell<u64>,
    pub compliance_rules: Cell<u64>,
    pub inventory_summary: Cell<u64>,
}

/// Counter snapshot, serializable for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryCounterSnapshot {
    pub counts: BTreeMap<String, u64>,
}

impl QueryCounters {
    fn bump(cell: &Cell<u64>) {
        cell.set(cell.get() + 1);
    }

    pub fn snapshot(&self) -> QueryCounterSnapshot {
        let mut counts = BTreeMap::new();
        counts.insert("get_trial_sites".to_string(), self.trial_sites.get());
        counts.insert("get_enrollment_data".to_string(), self.enrollment_data.get());
        counts.insert("get_batch_stability".to_string(), self.batch_catalog.get());
        counts.insert(
            "check_batch_expiry".to_string(),
            self.check_batch_expiry.get(),
        );
        counts.insert("get_depot_inventory".to_string(), self.depot_inventory.get());
        counts.insert(
            "check_compliance_rules".to_string(),
            self.compliance_rules.get(),
        );
        counts.insert(
            "get_inventory_summary".to_string(),
            self.inventory_summary.get(),
        );
        QueryCounterSnapshot { counts }
    }
}

/// Facade over the four registries
///
/// All query traffic goes through these methods so the counters see
/// every call regardless of which agent issued it.
#[derive(Debug)]
pub struct MockSystems {
    trial: TrialRegistry,
    lab: LabRegistry,
    warehouse: WarehouseRegistry,
    compliance: ComplianceRegistry,
    counters: QueryCounters,
}

impl MockSystems {
    /// Build all registries from one fixture set
    pub fn new(fixtures: &FixtureSet) -> Self {
        Self {
            trial: TrialRegistry::new(fixtures.sites.clone()),
            lab: LabRegistry::new(fixtures.batches.clone()),
            warehouse: WarehouseRegistry::new(&fixtures.batches),
            compliance: ComplianceRegistry::new(fixtures.site_rules.clone(), &fixtures.batches),
            counters: QueryCounters::default(),
        }
    }

    pub fn trial_sites(&self) -> &[SiteDescriptor] {
        QueryCounters::bump(&self.counters.trial_sites);
        self.trial.trial_sites()
    }

    pub fn enrollment_data(&self, site_id: &str) -> Result<EnrollmentData, SystemError> {
        QueryCounters::bump(&self.counters.enrollment_data);
        self.trial.enrollment_data(site_id)
    }

    pub fn batch_catalog(&self) -> &[BatchInfo] {
        QueryCounters::bump(&self.counters.batch_catalog);
        self.lab.batch_catalog()
    }

    pub fn check_batch_expiry(&self, batch_id: &str, on_day: usize) -> Result<bool, SystemError> {
        QueryCounters::bump(&self.counters.check_batch_expiry);
        self.lab.check_batch_expiry(batch_id, on_day)
    }

    pub fn depot_inventory(&self, site_id: &str) -> DepotInventory {
        QueryCounters::bump(&self.counters.depot_inventory);
        self.warehouse.depot_inventory(site_id)
    }

    pub fn compliance_rules(&self, site_id: &str) -> BTreeSet<String> {
        QueryCounters::bump(&self.counters.compliance_rules);
        self.compliance.compliance_rules(site_id)
    }

    pub fn inventory_summary(&self) -> InventorySummary {
        QueryCounters::bump(&self.counters.inventory_summary);
        self.compliance.inventory_summary()
    }

    /// Observability: how often each operation has been called
    pub fn query_counters(&self) -> QueryCounterSnapshot {
        self.counters.snapshot()
    }
}
