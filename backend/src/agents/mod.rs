//! Agents and the shared agent contract
//!
//! Four agents drive the supply chain: CRO Interface, Clinical
//! Operations, Manufacturing and Logistics. Each owns its state and
//! exposes one entry point, `handle_event`, invoked by the orchestrator
//! for every bus event the agent is interested in. Decision logic is a
//! pure function of (current state, incoming event, query results
//! fetched through the gateway during handling).
//!
//! # Query recording
//!
//! Agents reach the mock systems only through `SystemsGateway`. Every
//! gateway call both returns the typed result and records a
//! `DirectQuery` draft; the orchestrator publishes those drafts before
//! the agent's outbound messages, so queries always precede the
//! decisions they informed on the timeline.

use crate::models::event::{AgentId, EventPayload, TimelineEvent};
use crate::models::query::{
    BatchInfo, DepotInventory, EnrollmentData, InventorySummary, QueryRecord, QueryResult,
    SystemId,
};
use crate::models::state::AgentSnapshot;
use crate::systems::{MockSystems, SystemError};
use std::collections::BTreeSet;

pub mod clinical_ops;
pub mod cro;
pub mod logistics;
pub mod manufacturing;

pub use clinical_ops::ClinicalOpsAgent;
pub use cro::CroInterfaceAgent;
pub use logistics::{LogisticsAgent, ShippingRates};
pub use manufacturing::{fefo_allocate, InsufficientSupply, LotAllocation, ManufacturingAgent};

/// An agent-to-agent message an agent wants published
///
/// The orchestrator stamps the source, id and timestamp at publication.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundMessage {
    pub target: AgentId,
    pub payload: EventPayload,
}

impl OutboundMessage {
    pub fn new(target: AgentId, payload: EventPayload) -> Self {
        Self { target, payload }
    }
}

/// Shared agent contract
pub trait Agent {
    fn id(&self) -> AgentId;

    /// Whether this agent consumes the given event
    ///
    /// Default: events addressed to the agent. Implementations narrow
    /// this further by kind.
    fn wants(&self, event: &TimelineEvent) -> bool {
        event.target() == Some(self.id())
    }

    /// Consume one event, returning the messages to publish as a result
    ///
    /// Returns an empty list when the event requires no reaction.
    /// Recoverable conditions (`NotFound`, shortfalls) are encoded as
    /// data on the returned messages, never surfaced as errors.
    fn handle_event(
        &mut self,
        event: &TimelineEvent,
        gateway: &mut SystemsGateway<'_>,
    ) -> Vec<OutboundMessage>;

    /// Read-only snapshot of the agent's current state
    fn snapshot(&self) -> AgentSnapshot;
}

/// Recording proxy between one agent and the mock systems
///
/// Lives for a single `handle_event` call. Collects a `QueryRecord` per
/// call, including failed lookups, in call order.
pub struct SystemsGateway<'a> {
    systems: &'a MockSystems,
    today: usize,
    queries: Vec<QueryRecord>,
}

impl<'a> SystemsGateway<'a> {
    pub fn new(systems: &'a MockSystems, today: usize) -> Self {
        Self {
            systems,
            today,
            queries: Vec::new(),
        }
    }

    /// Current simulated day
    pub fn today(&self) -> usize {
        self.today
    }

    fn record(&mut self, system: SystemId, operation: &str, result: QueryResult) {
        self.queries.push(QueryRecord {
            system,
            operation: operation.to_string(),
            result,
        });
    }

    fn record_not_found(&mut self, system: SystemId, operation: &str, err: &SystemError) {
        let SystemError::NotFound { entity, id } = err;
        self.record(
            system,
            operation,
            QueryResult::NotFound {
                entity: entity.to_string(),
                id: id.clone(),
            },
        );
    }

    /// `get_trial_sites` against the trial registry
    pub fn trial_sites(&mut self) -> Vec<crate::fixtures::SiteDescriptor> {
        let sites = self.systems.trial_sites().to_vec();
        self.record(
            SystemId::TrialRegistry,
            "get_trial_sites",
            QueryResult::Sites(sites.clone()),
        );
        sites
    }

    /// `get_enrollment_data` against the trial registry
    pub fn enrollment_data(&mut self, site_id: &str) -> Result<EnrollmentData, SystemError> {
        match self.systems.enrollment_data(site_id) {
            Ok(data) => {
                self.record(
                    SystemId::TrialRegistry,
                    "get_enrollment_data",
                    QueryResult::Enrollment(data.clone()),
                );
                Ok(data)
            }
            Err(err) => {
                self.record_not_found(SystemId::TrialRegistry, "get_enrollment_data", &err);
                Err(err)
            }
        }
    }

    /// `get_batch_stability` against the lab registry (full catalog)
    pub fn batch_catalog(&mut self) -> Vec<BatchInfo> {
        let batches = self.systems.batch_catalog().to_vec();
        self.record(
            SystemId::LabRegistry,
            "get_batch_stability",
            QueryResult::Batches(batches.clone()),
        );
        batches
    }

    /// `check_batch_expiry` against the lab registry
    pub fn check_batch_expiry(
        &mut self,
        batch_id: &str,
        on_day: usize,
    ) -> Result<bool, SystemError> {
        match self.systems.check_batch_expiry(batch_id, on_day) {
            Ok(valid) => {
                self.record(
                    SystemId::LabRegistry,
                    "check_batch_expiry",
                    QueryResult::BatchExpiry {
                        batch_id: batch_id.to_string(),
                        valid_on_day: on_day,
                        valid,
                    },
                );
                Ok(valid)
            }
            Err(err) => {
                self.record_not_found(SystemId::LabRegistry, "check_batch_expiry", &err);
                Err(err)
            }
        }
    }

    /// `get_depot_inventory` against the warehouse registry
    pub fn depot_inventory(&mut self, site_id: &str) -> DepotInventory {
        let inventory = self.systems.depot_inventory(site_id);
        self.record(
            SystemId::WarehouseRegistry,
            "get_depot_inventory",
            QueryResult::Depot(inventory.clone()),
        );
        inventory
    }

    /// `check_compliance_rules` against the compliance registry
    pub fn compliance_rules(&mut self, site_id: &str) -> BTreeSet<String> {
        let rules = self.systems.compliance_rules(site_id);
        self.record(
            SystemId::ComplianceRegistry,
            "check_compliance_rules",
            QueryResult::Compliance {
                site_id: site_id.to_string(),
                rules: rules.clone(),
            },
        );
        rules
    }

    /// `get_inventory_summary` against the compliance/ERP registry
    pub fn inventory_summary(&mut self) -> InventorySummary {
        let summary = self.systems.inventory_summary();
        self.record(
            SystemId::ComplianceRegistry,
            "get_inventory_summary",
            QueryResult::InventorySummary(summary),
        );
        summary
    }

    /// Query records collected during this handling, in call order
    pub fn into_queries(self) -> Vec<QueryRecord> {
        self.queries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::FixtureSet;

    #[test]
    fn test_gateway_records_calls_in_order() {
        let systems = MockSystems::new(&FixtureSet::default());
        let mut gateway = SystemsGateway::new(&systems, 0);

        gateway.trial_sites();
        let _ = gateway.enrollment_data("SITE-01").unwrap();
        gateway.inventory_summary();

        let queries = gateway.into_queries();
        let ops: Vec<&str> = queries.iter().map(|q| q.operation.as_str()).collect();
        assert_eq!(
            ops,
            vec!["get_trial_sites", "get_enrollment_data", "get_inventory_summary"]
        );
    }

    #[test]
    fn test_gateway_records_failed_lookup() {
        let systems = MockSystems::new(&FixtureSet::default());
        let mut gateway = SystemsGateway::new(&systems, 0);

        assert!(gateway.enrollment_data("SITE-99").is_err());

        let queries = gateway.into_queries();
        assert_eq!(queries.len(), 1);
        assert!(matches!(queries[0].result, QueryResult::NotFound { .. }));
    }
}
