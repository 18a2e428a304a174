//! Manufacturing/Execution Agent
//!
//! Answers allocation requests by FEFO (first-expiry-first-out): sort
//! stability-approved, unexpired candidates ascending by expiry and
//! consume greedily until the requested quantity is met. A shortfall is
//! `InsufficientSupply`, downgraded to a `partial_allocation` constraint
//! on the response rather than a failure of the run.

use super::{Agent, OutboundMessage, SystemsGateway};
use crate::models::event::{AgentId, EventPayload, TimelineEvent};
use crate::models::message::{
    AllocateLotRequest, AllocateLotResponse, CONSTRAINT_PARTIAL_ALLOCATION,
};
use crate::models::query::StabilityStatus;
use crate::models::state::{AgentPhase, AgentSnapshot, AllocationRecord};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;
use tracing::{debug, warn};

/// Units taken from one batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LotAllocation {
    pub batch_id: String,
    pub quantity: u32,
}

/// FEFO candidate: (batch id, expiry day, units available)
pub type FefoCandidate = (String, usize, u32);

/// Candidates ran out before the requested quantity was met
///
/// Carries everything that could be allocated so the caller can still
/// answer with a partial response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("insufficient supply: {shortfall} units short of request")]
pub struct InsufficientSupply {
    pub allocated: Vec<LotAllocation>,
    pub shortfall: u32,
}

/// Greedy FEFO allocation over pre-filtered candidates
///
/// Candidates are consumed in ascending expiry order (ties broken by
/// batch id, keeping the result independent of input order).
pub fn fefo_allocate(
    candidates: &[FefoCandidate],
    requested: u32,
) -> Result<Vec<LotAllocation>, InsufficientSupply> {
    let mut ordered: Vec<&FefoCandidate> = candidates.iter().collect();
    ordered.sort_by(|a, b| (a.1, &a.0).cmp(&(b.1, &b.0)));

    let mut allocated = Vec::new();
    let mut remaining = requested;
    for (batch_id, _, available) in ordered {
        if remaining == 0 {
            break;
        }
        let take = remaining.min(*available);
        if take > 0 {
            allocated.push(LotAllocation {
                batch_id: batch_id.clone(),
                quantity: take,
            });
            remaining -= take;
        }
    }

    if remaining > 0 {
        Err(InsufficientSupply {
            allocated,
            shortfall: remaining,
        })
    } else {
        Ok(allocated)
    }
}

pub struct ManufacturingAgent {
    /// Days between accepting a request and lot release
    processing_lead_days: usize,
    /// Units still unallocated per batch, debited as requests are served
    inventory: BTreeMap<String, u32>,
    allocations: Vec<AllocationRecord>,
}

impl ManufacturingAgent {
    pub fn new(processing_lead_days: usize) -> Self {
        Self {
            processing_lead_days,
            inventory: BTreeMap::new(),
            allocations: Vec::new(),
        }
    }

    fn on_allocate(
        &mut self,
        req: &AllocateLotRequest,
        gateway: &mut SystemsGateway<'_>,
    ) -> Vec<OutboundMessage> {
        let release_day = gateway.today() + self.processing_lead_days;
        let catalog = gateway.batch_catalog();

        // First request seeds the local stock ledger from the catalog;
        // later requests see what earlier allocations left behind.
        for batch in &catalog {
            self.inventory
                .entry(batch.batch_id.clone())
                .or_insert(batch.quantity_available);
        }

        let mut constraints = BTreeSet::new();
        let mut candidates: Vec<FefoCandidate> = Vec::new();
        for batch in &catalog {
            if batch.stability_status != StabilityStatus::Approved {
                continue;
            }
            // Lot must still be usable on the day it is released
            match gateway.check_batch_expiry(&batch.batch_id, release_day) {
                Ok(true) => {
                    let available = self.inventory.get(&batch.batch_id).copied().unwrap_or(0);
                    if available > 0 {
                        candidates.push((batch.batch_id.clone(), batch.expiry_day, available));
                    }
                }
                Ok(false) => {}
                Err(err) => {
                    warn!(batch_id = %batch.batch_id, %err, "expiry lookup failed, batch skipped");
                    constraints.insert(format!("unknown_batch:{}", batch.batch_id));
                }
            }
        }

        let lots = match fefo_allocate(&candidates, req.quantity) {
            Ok(lots) => lots,
            Err(short) => {
                debug!(
                    request_id = %req.request_id,
                    shortfall = short.shortfall,
                    "allocation short of requested quantity"
                );
                constraints.insert(CONSTRAINT_PARTIAL_ALLOCATION.to_string());
                short.allocated
            }
        };

        let allocated_quantity: u32 = lots.iter().map(|l| l.quantity).sum();
        for lot in &lots {
            if let Some(available) = self.inventory.get_mut(&lot.batch_id) {
                *available -= lot.quantity;
            }
        }

        let batch_ids: Vec<String> = lots.iter().map(|l| l.batch_id.clone()).collect();
        self.allocations.push(AllocationRecord {
            request_id: req.request_id.clone(),
            site_id: req.site_id.clone(),
            batch_ids: batch_ids.clone(),
            quantity: allocated_quantity,
            release_day,
            partial: constraints.contains(CONSTRAINT_PARTIAL_ALLOCATION),
        });

        vec![OutboundMessage::new(
            AgentId::ClinicalOps,
            EventPayload::AllocateLotResponse(AllocateLotResponse {
                request_id: req.request_id.clone(),
                study_id: req.study_id.clone(),
                site_id: req.site_id.clone(),
                batch_ids,
                allocated_quantity,
                release_day,
                constraints,
            }),
        )]
    }
}

impl Agent for ManufacturingAgent {
    fn id(&self) -> AgentId {
        AgentId::Manufacturing
    }

    fn handle_event(
        &mut self,
        event: &TimelineEvent,
        gateway: &mut SystemsGateway<'_>,
    ) -> Vec<OutboundMessage> {
        match event.payload() {
            EventPayload::AllocateLotRequest(req) => self.on_allocate(req, gateway),
            _ => Vec::new(),
        }
    }

    fn snapshot(&self) -> AgentSnapshot {
        AgentSnapshot {
            phase: AgentPhase::Idle,
            inventory: self.inventory.clone(),
            allocations: self.allocations.clone(),
            ..AgentSnapshot::empty(self.id())
        }
    }
}
