//! Clinical Operations Agent
//!
//! Owns the demand side of the chain: sizes the initial resupply order
//! when a site activates, turns the resulting allocation into a shipment
//! request, and records the final shipment plan. The only agent whose
//! request/response phase walks the full `Idle → Awaiting → Done` cycle
//! twice (allocation, then shipment).

use super::{Agent, OutboundMessage, SystemsGateway};
use crate::models::event::{AgentId, EventPayload, TimelineEvent};
use crate::models::message::{
    AllocateLotRequest, AllocateLotResponse, CreateShipmentRequest, ShipmentPlan, SiteActivated,
};
use crate::models::state::{AgentPhase, AgentSnapshot, AllocationRecord, ShipmentRecord};
use std::collections::BTreeSet;
use tracing::{debug, warn};

pub struct ClinicalOpsAgent {
    study_id: String,
    /// Order size = enrollment target × this multiplier, rounded up
    safety_stock_multiplier: f64,
    /// Days added to the release date to form the delivery target
    transit_buffer_days: usize,
    phase: AgentPhase,
    pending_requests: BTreeSet<String>,
    next_request: u64,
    allocations: Vec<AllocationRecord>,
    shipments: Vec<ShipmentRecord>,
}

impl ClinicalOpsAgent {
    pub fn new(study_id: &str, safety_stock_multiplier: f64, transit_buffer_days: usize) -> Self {
        Self {
            study_id: study_id.to_string(),
            safety_stock_multiplier,
            transit_buffer_days,
            phase: AgentPhase::Idle,
            pending_requests: BTreeSet::new(),
            next_request: 1,
            allocations: Vec::new(),
            shipments: Vec::new(),
        }
    }

    fn next_request_id(&mut self) -> String {
        let id = format!("REQ-{:04}", self.next_request);
        self.next_request += 1;
        id
    }

    /// Order quantity for an enrollment target
    ///
    /// Rounds up, with a small tolerance so that targets whose scaled
    /// value is a whole number (500 × 1.1 = 550) are not bumped by
    /// float representation error.
    fn order_quantity(&self, enrollment_target: u32) -> u32 {
        let scaled = enrollment_target as f64 * self.safety_stock_multiplier;
        (scaled - 1e-9).ceil().max(0.0) as u32
    }

    fn on_site_activated(
        &mut self,
        ev: &SiteActivated,
        gateway: &mut SystemsGateway<'_>,
    ) -> Vec<OutboundMessage> {
        // Inventory context informs the decision; the order is sized
        // from the enrollment target regardless.
        let summary = gateway.inventory_summary();
        let quantity = self.order_quantity(ev.enrollment_target);
        debug!(
            site_id = %ev.site_id,
            quantity,
            available = summary.total_units,
            "sizing initial resupply order"
        );

        let request_id = self.next_request_id();
        self.pending_requests.insert(request_id.clone());
        self.phase = AgentPhase::AwaitingResponse {
            request_id: request_id.clone(),
        };

        vec![OutboundMessage::new(
            AgentId::Manufacturing,
            EventPayload::AllocateLotRequest(AllocateLotRequest {
                request_id,
                study_id: self.study_id.clone(),
                site_id: ev.site_id.clone(),
                quantity,
            }),
        )]
    }

    fn on_allocation(&mut self, resp: &AllocateLotResponse) -> Vec<OutboundMessage> {
        if !self.pending_requests.remove(&resp.request_id) {
            warn!(request_id = %resp.request_id, "unsolicited allocation response dropped");
            return Vec::new();
        }

        self.allocations.push(AllocationRecord {
            request_id: resp.request_id.clone(),
            site_id: resp.site_id.clone(),
            batch_ids: resp.batch_ids.clone(),
            quantity: resp.allocated_quantity,
            release_day: resp.release_day,
            partial: resp.is_partial(),
        });

        if resp.batch_ids.is_empty() {
            // Nothing allocated at all: there is no shipment to plan
            warn!(request_id = %resp.request_id, "allocation came back empty, no shipment requested");
            self.phase = AgentPhase::Done;
            return Vec::new();
        }

        let request_id = self.next_request_id();
        self.pending_requests.insert(request_id.clone());
        self.phase = AgentPhase::AwaitingResponse {
            request_id: request_id.clone(),
        };

        vec![OutboundMessage::new(
            AgentId::Logistics,
            EventPayload::CreateShipmentRequest(CreateShipmentRequest {
                request_id,
                site_id: resp.site_id.clone(),
                batch_ids: resp.batch_ids.clone(),
                quantity: resp.allocated_quantity,
                target_delivery_day: resp.release_day + self.transit_buffer_days,
            }),
        )]
    }

    fn on_shipment_plan(&mut self, plan: &ShipmentPlan) -> Vec<OutboundMessage> {
        if !self.pending_requests.remove(&plan.request_id) {
            warn!(request_id = %plan.request_id, "unsolicited shipment plan dropped");
            return Vec::new();
        }

        self.shipments.push(ShipmentRecord {
            shipment_id: plan.shipment_id.clone(),
            site_id: plan.site_id.clone(),
            batch_ids: plan.batch_ids.clone(),
            departure_day: plan.departure_day,
            eta_day: plan.eta_day,
            cost_cents: plan.cost_cents,
            compliance_flagged: !plan.compliance_flags.is_empty(),
        });
        self.phase = AgentPhase::Done;
        Vec::new()
    }
}

impl Agent for ClinicalOpsAgent {
    fn id(&self) -> AgentId {
        AgentId::ClinicalOps
    }

    fn handle_event(
        &mut self,
        event: &TimelineEvent,
        gateway: &mut SystemsGateway<'_>,
    ) -> Vec<OutboundMessage> {
        match event.payload() {
            EventPayload::SiteActivated(ev) => self.on_site_activated(ev, gateway),
            EventPayload::AllocateLotResponse(resp) => self.on_allocation(resp),
            EventPayload::ShipmentPlan(plan) => self.on_shipment_plan(plan),
            _ => Vec::new(),
        }
    }

    fn snapshot(&self) -> AgentSnapshot {
        AgentSnapshot {
            phase: self.phase.clone(),
            pending_requests: self.pending_requests.clone(),
            allocations: self.allocations.clone(),
            shipments: self.shipments.clone(),
            ..AgentSnapshot::empty(self.id())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::FixtureSet;
    use crate::models::event::{EventDraft, Timeline};
    use crate::systems::MockSystems;

    fn agent() -> ClinicalOpsAgent {
        ClinicalOpsAgent::new("STUDY-ALPHA", 1.1, 10)
    }

    fn deliver(payload: EventPayload, agent: &mut ClinicalOpsAgent) -> Vec<OutboundMessage> {
        let systems = MockSystems::new(&FixtureSet::default());
        let mut timeline = Timeline::new();
        let event = timeline
            .publish(
                0,
                EventDraft::message(AgentId::CroInterface, AgentId::ClinicalOps, payload),
            )
            .unwrap()
            .clone();
        let mut gateway = SystemsGateway::new(&systems, 0);
        agent.handle_event(&event, &mut gateway)
    }

    fn site_activated(target: u32) -> EventPayload {
        EventPayload::SiteActivated(SiteActivated {
            study_id: "STUDY-ALPHA".to_string(),
            site_id: "SITE-01".to_string(),
            activation_day: 0,
            enrollment_target: target,
        })
    }

    #[test]
    fn test_order_quantity_safety_stock() {
        let a = agent();
        assert_eq!(a.order_quantity(500), 550);
        assert_eq!(a.order_quantity(0), 0);
        // Non-integral scaled values round up
        assert_eq!(a.order_quantity(501), 552); // 551.1 → 552
    }

    #[test]
    fn test_activation_produces_allocation_request() {
        let mut a = agent();
        let out = deliver(site_activated(500), &mut a);

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].target, AgentId::Manufacturing);
        let EventPayload::AllocateLotRequest(req) = &out[0].payload else {
            panic!("expected AllocateLotRequest");
        };
        assert_eq!(req.quantity, 550);
        assert_eq!(req.request_id, "REQ-0001");
        assert_eq!(
            a.snapshot().phase,
            AgentPhase::AwaitingResponse {
                request_id: "REQ-0001".to_string()
            }
        );
    }

    #[test]
    fn test_allocation_response_produces_shipment_request() {
        let mut a = agent();
        deliver(site_activated(500), &mut a);

        let resp = AllocateLotResponse {
            request_id: "REQ-0001".to_string(),
            study_id: "STUDY-ALPHA".to_string(),
            site_id: "SITE-01".to_string(),
            batch_ids: vec!["BATCH-001".to_string(), "BATCH-002".to_string()],
            allocated_quantity: 400,
            release_day: 5,
            constraints: BTreeSet::new(),
        };
        let out = deliver(EventPayload::AllocateLotResponse(resp), &mut a);

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].target, AgentId::Logistics);
        let EventPayload::CreateShipmentRequest(req) = &out[0].payload else {
            panic!("expected CreateShipmentRequest");
        };
        assert_eq!(req.target_delivery_day, 15); // release 5 + buffer 10
        assert_eq!(req.quantity, 400);
        assert_eq!(a.snapshot().allocations.len(), 1);
    }

    #[test]
    fn test_unsolicited_response_dropped() {
        let mut a = agent();
        let resp = AllocateLotResponse {
            request_id: "REQ-0042".to_string(),
            study_id: "STUDY-ALPHA".to_string(),
            site_id: "SITE-01".to_string(),
            batch_ids: vec!["BATCH-001".to_string()],
            allocated_quantity: 100,
            release_day: 5,
            constraints: BTreeSet::new(),
        };
        let out = deliver(EventPayload::AllocateLotResponse(resp), &mut a);
        assert!(out.is_empty());
        assert!(a.snapshot().allocations.is_empty());
    }

    #[test]
    fn test_empty_allocation_ends_chain_without_shipment() {
        let mut a = agent();
        deliver(site_activated(500), &mut a);

        let mut constraints = BTreeSet::new();
        constraints.insert(crate::models::message::CONSTRAINT_PARTIAL_ALLOCATION.to_string());
        let resp = AllocateLotResponse {
            request_id: "REQ-0001".to_string(),
            study_id: "STUDY-ALPHA".to_string(),
            site_id: "SITE-01".to_string(),
            batch_ids: Vec::new(),
            allocated_quantity: 0,
            release_day: 5,
            constraints,
        };
        let out = deliver(EventPayload::AllocateLotResponse(resp), &mut a);

        assert!(out.is_empty());
        assert_eq!(a.snapshot().phase, AgentPhase::Done);
        assert!(a.snapshot().allocations[0].partial);
    }
}
