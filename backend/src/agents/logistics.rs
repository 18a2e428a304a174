//! Logistics Agent
//!
//! Turns shipment requests into shipment plans: departure after a fixed
//! dispatch delay, ETA from the per-site transit lane, cost from the
//! rate card, and compliance flags copied from the rule check. A
//! non-empty rule set is informational; it never blocks the shipment.
//!
//! All money values are i64 (cents).

use super::{Agent, OutboundMessage, SystemsGateway};
use crate::models::event::{AgentId, EventPayload, TimelineEvent};
use crate::models::message::{CreateShipmentRequest, ShipmentPlan};
use crate::models::state::{AgentPhase, AgentSnapshot, ShipmentRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Shipment rate card (cents)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShippingRates {
    /// Flat cost per shipment
    pub base_cents: i64,
    /// Added per batch in the shipment
    pub per_batch_cents: i64,
    /// Added when the delivery window is at or under the expedite window
    pub expedite_fee_cents: i64,
    /// Window (days between departure and target delivery) at or below
    /// which the expedite fee applies
    pub expedite_window_days: usize,
}

impl Default for ShippingRates {
    fn default() -> Self {
        Self {
            base_cents: 50_000,        // $500 per shipment
            per_batch_cents: 12_000,   // $120 per batch
            expedite_fee_cents: 40_000, // $400 when expedited
            expedite_window_days: 2,
        }
    }
}

impl ShippingRates {
    /// Cost of a shipment departing `departure_day` with `batch_count`
    /// batches against a `target_delivery_day`
    pub fn shipment_cost(
        &self,
        batch_count: usize,
        departure_day: usize,
        target_delivery_day: usize,
    ) -> i64 {
        let window = target_delivery_day.saturating_sub(departure_day);
        let expedite = if window <= self.expedite_window_days {
            self.expedite_fee_cents
        } else {
            0
        };
        self.base_cents + self.per_batch_cents * batch_count as i64 + expedite
    }
}

pub struct LogisticsAgent {
    rates: ShippingRates,
    /// Days between accepting a request and the truck leaving
    departure_delay_days: usize,
    /// Transit days per site lane; sites off the table use the default
    transit_by_site: BTreeMap<String, usize>,
    default_transit_days: usize,
    next_shipment: u64,
    shipments: Vec<ShipmentRecord>,
}

impl LogisticsAgent {
    pub fn new(
        rates: ShippingRates,
        departure_delay_days: usize,
        transit_by_site: BTreeMap<String, usize>,
        default_transit_days: usize,
    ) -> Self {
        Self {
            rates,
            departure_delay_days,
            transit_by_site,
            default_transit_days,
            next_shipment: 1,
            shipments: Vec::new(),
        }
    }

    fn next_shipment_id(&mut self) -> String {
        let id = format!("SHP-{:04}", self.next_shipment);
        self.next_shipment += 1;
        id
    }

    fn transit_days(&self, site_id: &str) -> usize {
        match self.transit_by_site.get(site_id) {
            Some(days) => *days,
            None => {
                warn!(site_id, "no transit lane on file, using default");
                self.default_transit_days
            }
        }
    }

    fn on_shipment_request(
        &mut self,
        req: &CreateShipmentRequest,
        gateway: &mut SystemsGateway<'_>,
    ) -> Vec<OutboundMessage> {
        // Inventory context for the plan; stock was already reserved by
        // Manufacturing, so this is a read-only sanity view.
        let _depot = gateway.depot_inventory(&req.site_id);
        let compliance_flags = gateway.compliance_rules(&req.site_id);
        if !compliance_flags.is_empty() {
            warn!(site_id = %req.site_id, rules = compliance_flags.len(), "compliance rules active at plan time");
        }

        let departure_day = gateway.today() + self.departure_delay_days;
        let eta_day = departure_day + self.transit_days(&req.site_id);
        let cost_cents =
            self.rates
                .shipment_cost(req.batch_ids.len(), departure_day, req.target_delivery_day);

        let shipment_id = self.next_shipment_id();
        debug!(%shipment_id, eta_day, cost_cents, "shipment planned");

        self.shipments.push(ShipmentRecord {
            shipment_id: shipment_id.clone(),
            site_id: req.site_id.clone(),
            batch_ids: req.batch_ids.clone(),
            departure_day,
            eta_day,
            cost_cents,
            compliance_flagged: !compliance_flags.is_empty(),
        });

        vec![OutboundMessage::new(
            AgentId::ClinicalOps,
            EventPayload::ShipmentPlan(ShipmentPlan {
                request_id: req.request_id.clone(),
                shipment_id,
                site_id: req.site_id.clone(),
                batch_ids: req.batch_ids.clone(),
                departure_day,
                eta_day,
                cost_cents,
                compliance_flags,
            }),
        )]
    }
}

impl Agent for LogisticsAgent {
    fn id(&self) -> AgentId {
        AgentId::Logistics
    }

    fn handle_event(
        &mut self,
        event: &TimelineEvent,
        gateway: &mut SystemsGateway<'_>,
    ) -> Vec<OutboundMessage> {
        match event.payload() {
            EventPayload::CreateShipmentRequest(req) => self.on_shipment_request(req, gateway),
            _ => Vec::new(),
        }
    }

    fn snapshot(&self) -> AgentSnapshot {
        AgentSnapshot {
            phase: AgentPhase::Idle,
            shipments: self.shipments.clone(),
            ..AgentSnapshot::empty(self.id())
        }
    }
}
