//! Timeline events and the message bus
//!
//! Every interaction in a run — direct queries to mock systems and
//! structured agent-to-agent messages alike — lands on one append-only
//! log, the `Timeline`. Events enable:
//! - Rendering (the presentation collaborator color-codes by protocol)
//! - Metrics (derived entirely from the final log)
//! - Determinism checks (digest over the serialized log)
//!
//! # Ordering
//!
//! Publication assigns a monotonic id starting at 1 with no gaps, and the
//! current logical day as timestamp. Causally dependent events always get
//! larger ids because agents publish only while processing an earlier
//! event. Events are never mutated or removed after publication.

use crate::models::message::{
    ActivateSiteCommand, AllocateLotRequest, AllocateLotResponse, CreateShipmentRequest,
    ShipmentPlan, SiteActivated,
};
use crate::models::query::QueryRecord;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Protocol class of a timeline event
///
/// Purely a display tag: both classes share one delivery mechanism.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Protocol {
    /// Synchronous read against a mock backend system (MCP-style)
    DirectQuery,
    /// Typed message published by one agent for another (A2A-style)
    AgentMessage,
}

impl Protocol {
    /// Short wire-style tag, e.g. for timeline rendering
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::DirectQuery => "MCP",
            Protocol::AgentMessage => "A2A",
        }
    }
}

/// Participants in the simulation
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum AgentId {
    /// The outside collaborator that injects the activation trigger
    External,
    CroInterface,
    ClinicalOps,
    Manufacturing,
    Logistics,
}

impl AgentId {
    /// Human-readable agent name
    pub fn display_name(&self) -> &'static str {
        match self {
            AgentId::External => "External Trigger",
            AgentId::CroInterface => "CRO Interface Agent",
            AgentId::ClinicalOps => "Clinical Ops Agent",
            AgentId::Manufacturing => "Manufacturing Agent",
            AgentId::Logistics => "Logistics Agent",
        }
    }
}

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Payload of a timeline event, one case per kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum EventPayload {
    ActivateSite(ActivateSiteCommand),
    SiteActivated(SiteActivated),
    AllocateLotRequest(AllocateLotRequest),
    AllocateLotResponse(AllocateLotResponse),
    CreateShipmentRequest(CreateShipmentRequest),
    ShipmentPlan(ShipmentPlan),
    DirectQuery(QueryRecord),
}

impl EventPayload {
    /// String discriminator for the payload kind
    pub fn kind(&self) -> &'static str {
        match self {
            EventPayload::ActivateSite(_) => "ActivateSite",
            EventPayload::SiteActivated(_) => "SiteActivated",
            EventPayload::AllocateLotRequest(_) => "AllocateLotRequest",
            EventPayload::AllocateLotResponse(_) => "AllocateLotResponse",
            EventPayload::CreateShipmentRequest(_) => "CreateShipmentRequest",
            EventPayload::ShipmentPlan(_) => "ShipmentPlan",
            EventPayload::DirectQuery(_) => "DirectQuery",
        }
    }

    /// Protocol class implied by the payload kind
    pub fn protocol(&self) -> Protocol {
        match self {
            EventPayload::DirectQuery(_) => Protocol::DirectQuery,
            _ => Protocol::AgentMessage,
        }
    }

    /// Schema-consistency check applied at publication
    ///
    /// Violations are programming defects, not runtime conditions: a
    /// well-formed agent can never produce them.
    fn validate(&self) -> Result<(), String> {
        fn require(ok: bool, reason: &str) -> Result<(), String> {
            if ok {
                Ok(())
            } else {
                Err(reason.to_string())
            }
        }

        match self {
            EventPayload::ActivateSite(cmd) => {
                require(!cmd.site_id.is_empty(), "empty site_id")
            }
            EventPayload::SiteActivated(ev) => {
                require(!ev.site_id.is_empty(), "empty site_id")?;
                require(!ev.study_id.is_empty(), "empty study_id")
            }
            EventPayload::AllocateLotRequest(req) => {
                require(!req.request_id.is_empty(), "empty request_id")?;
                require(!req.site_id.is_empty(), "empty site_id")?;
                require(req.quantity > 0, "zero quantity")
            }
            EventPayload::AllocateLotResponse(resp) => {
                require(!resp.request_id.is_empty(), "empty request_id")?;
                require(
                    resp.batch_ids.is_empty() == (resp.allocated_quantity == 0),
                    "batch list inconsistent with allocated quantity",
                )
            }
            EventPayload::CreateShipmentRequest(req) => {
                require(!req.request_id.is_empty(), "empty request_id")?;
                require(!req.batch_ids.is_empty(), "empty batch list")?;
                require(req.quantity > 0, "zero quantity")
            }
            EventPayload::ShipmentPlan(plan) => {
                require(!plan.shipment_id.is_empty(), "empty shipment_id")?;
                require(
                    plan.eta_day >= plan.departure_day,
                    "eta earlier than departure",
                )
            }
            EventPayload::DirectQuery(record) => {
                require(!record.operation.is_empty(), "empty operation")
            }
        }
    }
}

/// Bus-level failure
///
/// `MalformedPayload` is fatal: it indicates a defect in the publishing
/// agent, and the orchestrator aborts the run rather than retrying.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BusError {
    #[error("malformed {kind} payload: {reason}")]
    MalformedPayload { kind: &'static str, reason: String },
}

/// An event before publication assigns id and timestamp
#[derive(Debug, Clone, PartialEq)]
pub struct EventDraft {
    pub source: AgentId,
    pub target: Option<AgentId>,
    pub payload: EventPayload,
}

impl EventDraft {
    /// Draft an agent-to-agent message
    pub fn message(source: AgentId, target: AgentId, payload: EventPayload) -> Self {
        Self {
            source,
            target: Some(target),
            payload,
        }
    }

    /// Draft a direct-query record (no target agent)
    pub fn query(source: AgentId, record: QueryRecord) -> Self {
        Self {
            source,
            target: None,
            payload: EventPayload::DirectQuery(record),
        }
    }
}

/// Immutable record of one interaction on the timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEvent {
    id: u64,
    day: usize,
    protocol: Protocol,
    source: AgentId,
    target: Option<AgentId>,
    payload: EventPayload,
}

impl TimelineEvent {
    /// Monotonic sequence number (1-based, gap-free)
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Logical day on which the event occurred
    pub fn day(&self) -> usize {
        self.day
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    pub fn source(&self) -> AgentId {
        self.source
    }

    /// Target agent; `None` for pure system queries
    pub fn target(&self) -> Option<AgentId> {
        self.target
    }

    pub fn payload(&self) -> &EventPayload {
        &self.payload
    }

    /// String discriminator of the payload kind
    pub fn kind(&self) -> &'static str {
        self.payload.kind()
    }
}

/// Append-only ordered log of all simulation events
///
/// # Example
/// ```
/// use trial_supply_simulator_core_rs::models::event::{
///     AgentId, EventDraft, EventPayload, Timeline,
/// };
/// use trial_supply_simulator_core_rs::models::message::ActivateSiteCommand;
///
/// let mut timeline = Timeline::new();
/// let draft = EventDraft::message(
///     AgentId::External,
///     AgentId::CroInterface,
///     EventPayload::ActivateSite(ActivateSiteCommand {
///         site_id: "SITE-01".to_string(),
///     }),
/// );
/// let event = timeline.publish(0, draft).unwrap();
/// assert_eq!(event.id(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Timeline {
    events: Vec<TimelineEvent>,
    next_id: u64,
}

impl Timeline {
    /// Create an empty timeline
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
            next_id: 1,
        }
    }

    /// Validate, stamp and append a draft; returns the published event
    ///
    /// Timestamps are monotonically non-decreasing: `day` must not move
    /// backwards relative to the last published event.
    pub fn publish(&mut self, day: usize, draft: EventDraft) -> Result<&TimelineEvent, BusError> {
        let kind = draft.payload.kind();

        draft
            .payload
            .validate()
            .map_err(|reason| BusError::MalformedPayload { kind, reason })?;

        if draft.payload.protocol() == Protocol::AgentMessage && draft.target.is_none() {
            return Err(BusError::MalformedPayload {
                kind,
                reason: "agent message requires a target".to_string(),
            });
        }

        if let Some(last) = self.events.last() {
            if day < last.day() {
                return Err(BusError::MalformedPayload {
                    kind,
                    reason: format!("timestamp regression: day {} after day {}", day, last.day()),
                });
            }
        }

        let event = TimelineEvent {
            id: self.next_id,
            day,
            protocol: draft.payload.protocol(),
            source: draft.source,
            target: draft.target,
            payload: draft.payload,
        };
        self.next_id += 1;
        self.events.push(event);
        Ok(self.events.last().expect("just pushed"))
    }

    /// Number of events published so far
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Full ordered snapshot
    pub fn all_events(&self) -> &[TimelineEvent] {
        &self.events
    }

    /// Events with id greater than `cursor`, in id order
    ///
    /// Restartable: calling again with the same cursor yields the same
    /// prefix plus anything published in between.
    pub fn events_since(&self, cursor: u64) -> impl Iterator<Item = &TimelineEvent> {
        // ids are dense from 1, so the cursor is also a vec offset
        let start = (cursor as usize).min(self.events.len());
        self.events[start..].iter()
    }

    /// Events of one protocol class, for color-coded rendering
    pub fn events_with_protocol(&self, protocol: Protocol) -> Vec<&TimelineEvent> {
        self.events
            .iter()
            .filter(|e| e.protocol() == protocol)
            .collect()
    }

    /// Events of one payload kind
    pub fn events_of_kind(&self, kind: &str) -> Vec<&TimelineEvent> {
        self.events.iter().filter(|e| e.kind() == kind).collect()
    }

    /// SHA-256 digest of the serialized log
    ///
    /// Two runs with identical fixtures and trigger parameters produce
    /// identical digests.
    pub fn digest(&self) -> String {
        let serialized =
            serde_json::to_vec(&self.events).expect("timeline events always serialize");
        let mut hasher = Sha256::new();
        hasher.update(&serialized);
        format!("{:x}", hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::message::AllocateLotRequest;
    use crate::models::query::{QueryRecord, QueryResult, SystemId};

    fn activate_draft(site_id: &str) -> EventDraft {
        EventDraft::message(
            AgentId::External,
            AgentId::CroInterface,
            EventPayload::ActivateSite(ActivateSiteCommand {
                site_id: site_id.to_string(),
            }),
        )
    }

    #[test]
    fn test_publish_assigns_dense_ids() {
        let mut timeline = Timeline::new();
        for _ in 0..3 {
            timeline.publish(0, activate_draft("SITE-01")).unwrap();
        }

        let ids: Vec<u64> = timeline.all_events().iter().map(|e| e.id()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_malformed_empty_site_rejected() {
        let mut timeline = Timeline::new();
        let err = timeline.publish(0, activate_draft("")).unwrap_err();
        assert!(matches!(err, BusError::MalformedPayload { kind: "ActivateSite", .. }));
        assert!(timeline.is_empty());
    }

    #[test]
    fn test_malformed_zero_quantity_rejected() {
        let mut timeline = Timeline::new();
        let draft = EventDraft::message(
            AgentId::ClinicalOps,
            AgentId::Manufacturing,
            EventPayload::AllocateLotRequest(AllocateLotRequest {
                request_id: "REQ-0001".to_string(),
                study_id: "STUDY-ALPHA".to_string(),
                site_id: "SITE-01".to_string(),
                quantity: 0,
            }),
        );
        assert!(timeline.publish(0, draft).is_err());
    }

    #[test]
    fn test_agent_message_requires_target() {
        let mut timeline = Timeline::new();
        let draft = EventDraft {
            source: AgentId::External,
            target: None,
            payload: EventPayload::ActivateSite(ActivateSiteCommand {
                site_id: "SITE-01".to_string(),
            }),
        };
        assert!(timeline.publish(0, draft).is_err());
    }

    #[test]
    fn test_timestamp_regression_rejected() {
        let mut timeline = Timeline::new();
        timeline.publish(5, activate_draft("SITE-01")).unwrap();
        assert!(timeline.publish(4, activate_draft("SITE-02")).is_err());
    }

    #[test]
    fn test_events_since_cursor() {
        let mut timeline = Timeline::new();
        for _ in 0..5 {
            timeline.publish(0, activate_draft("SITE-01")).unwrap();
        }

        let tail: Vec<u64> = timeline.events_since(3).map(|e| e.id()).collect();
        assert_eq!(tail, vec![4, 5]);
        // Restartable: same cursor, same answer
        let again: Vec<u64> = timeline.events_since(3).map(|e| e.id()).collect();
        assert_eq!(again, tail);
        assert_eq!(timeline.events_since(99).count(), 0);
    }

    #[test]
    fn test_protocol_filter() {
        let mut timeline = Timeline::new();
        timeline.publish(0, activate_draft("SITE-01")).unwrap();
        timeline
            .publish(
                0,
                EventDraft::query(
                    AgentId::CroInterface,
                    QueryRecord {
                        system: SystemId::TrialRegistry,
                        operation: "get_trial_sites".to_string(),
                        result: QueryResult::Sites(Vec::new()),
                    },
                ),
            )
            .unwrap();

        assert_eq!(timeline.events_with_protocol(Protocol::AgentMessage).len(), 1);
        assert_eq!(timeline.events_with_protocol(Protocol::DirectQuery).len(), 1);
    }

    #[test]
    fn test_digest_stable() {
        let build = || {
            let mut timeline = Timeline::new();
            timeline.publish(0, activate_draft("SITE-01")).unwrap();
            timeline
        };
        assert_eq!(build().digest(), build().digest());
    }
}
