//! CRO Interface Agent
//!
//! Entry point of the causal chain. On the external activation trigger
//! it validates the site against the trial registry, pulls the 90-day
//! enrollment ramp, and notifies Clinical Operations.

use super::{Agent, OutboundMessage, SystemsGateway};
use crate::models::event::{AgentId, EventPayload, TimelineEvent};
use crate::models::message::SiteActivated;
use crate::models::state::{AgentPhase, AgentSnapshot};
use tracing::{debug, warn};

pub struct CroInterfaceAgent {
    study_id: String,
    phase: AgentPhase,
    /// Sites this agent has activated, in order
    activated_sites: Vec<String>,
}

impl CroInterfaceAgent {
    pub fn new(study_id: &str) -> Self {
        Self {
            study_id: study_id.to_string(),
            phase: AgentPhase::Idle,
            activated_sites: Vec::new(),
        }
    }

    pub fn activated_sites(&self) -> &[String] {
        &self.activated_sites
    }
}

impl Agent for CroInterfaceAgent {
    fn id(&self) -> AgentId {
        AgentId::CroInterface
    }

    fn handle_event(
        &mut self,
        event: &TimelineEvent,
        gateway: &mut SystemsGateway<'_>,
    ) -> Vec<OutboundMessage> {
        let EventPayload::ActivateSite(cmd) = event.payload() else {
            return Vec::new();
        };

        let sites = gateway.trial_sites();
        let Some(site) = sites.iter().find(|s| s.site_id == cmd.site_id) else {
            // Unknown site: downgrade to a no-op, the run quiesces
            warn!(site_id = %cmd.site_id, "activation requested for unregistered site");
            return Vec::new();
        };

        // The ramp forecast informs the forecast-accuracy metric; the
        // registry is authoritative for the enrollment target.
        if let Err(err) = gateway.enrollment_data(&cmd.site_id) {
            warn!(site_id = %cmd.site_id, %err, "enrollment forecast unavailable");
            return Vec::new();
        }

        debug!(site_id = %site.site_id, target = site.planned_enrollment, "site activated");
        self.phase = AgentPhase::Done;
        self.activated_sites.push(site.site_id.clone());

        vec![OutboundMessage::new(
            AgentId::ClinicalOps,
            EventPayload::SiteActivated(SiteActivated {
                study_id: self.study_id.clone(),
                site_id: site.site_id.clone(),
                activation_day: gateway.today(),
                enrollment_target: site.planned_enrollment,
            }),
        )]
    }

    fn snapshot(&self) -> AgentSnapshot {
        AgentSnapshot {
            phase: self.phase.clone(),
            ..AgentSnapshot::empty(self.id())
        }
    }
}
