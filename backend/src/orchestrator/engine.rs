//! Orchestrator engine
//!
//! Drives the fixed causal pipeline (site activation → allocation →
//! shipment) to quiescence:
//!
//! ```text
//! For each unconsumed bus event, in id order:
//! 1. Deliver to every agent whose wants() matches
//! 2. Publish the queries the agent issued while handling
//! 3. Publish the messages the agent returned
//! 4. Stop when no unconsumed events remain (fixed point)
//!    or the step bound is exceeded (SimulationDeadlock)
//! ```
//!
//! # Determinism
//!
//! The loop consumes events strictly in sequence-id order and agents are
//! consulted in a fixed order, so identical fixtures and trigger
//! parameters replay to an identical timeline.

use crate::agents::{
    Agent, ClinicalOpsAgent, CroInterfaceAgent, LogisticsAgent, ManufacturingAgent,
    ShippingRates, SystemsGateway,
};
use crate::core::time::SimClock;
use crate::fixtures::FixtureSet;
use crate::models::event::{AgentId, BusError, EventDraft, EventPayload, Timeline};
use crate::models::message::ActivateSiteCommand;
use crate::models::state::AgentSnapshot;
use crate::orchestrator::metrics::SimulationMetrics;
use crate::systems::MockSystems;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;
use tracing::debug;

// ============================================================================
// Configuration
// ============================================================================

/// Complete simulation configuration
///
/// Serializable so a scenario can live in a JSON file next to the run
/// that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Study identifier stamped on all messages
    pub study_id: String,

    /// Logical day the clock starts on
    pub start_day: usize,

    /// Upper bound on delivered events per run; exceeding it is a
    /// `SimulationDeadlock`
    pub max_steps: usize,

    /// Clinical Operations: order size = target × multiplier, rounded up
    pub safety_stock_multiplier: f64,

    /// Clinical Operations: delivery target = release day + this buffer
    pub transit_buffer_days: usize,

    /// Manufacturing: days from request acceptance to lot release
    pub processing_lead_days: usize,

    /// Logistics: days from request acceptance to departure
    pub departure_delay_days: usize,

    /// Logistics: transit days for sites without a lane on file
    pub default_transit_days: usize,

    /// Logistics rate card
    pub shipping_rates: ShippingRates,

    /// Immutable reference data for the run
    pub fixtures: FixtureSet,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            study_id: "STUDY-ALPHA".to_string(),
            start_day: 0,
            max_steps: 64,
            safety_stock_multiplier: 1.1,
            transit_buffer_days: 10,
            processing_lead_days: 5,
            departure_delay_days: 1,
            default_transit_days: 4,
            shipping_rates: ShippingRates::default(),
            fixtures: FixtureSet::default(),
        }
    }
}

/// Result of one `activate_site` run
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    /// Events delivered during this run
    pub steps: usize,

    /// Events published during this run (trigger included)
    pub events_published: usize,

    /// Metrics over the whole timeline so far
    pub metrics: SimulationMetrics,
}

/// Fatal simulation failures
///
/// Recoverable conditions (unknown site, shortfall) never surface here;
/// they are data on the timeline.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    /// Configuration validation failed
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// An agent produced a payload inconsistent with its kind
    #[error(transparent)]
    Malformed(#[from] BusError),

    /// The dispatch loop exceeded its step bound without quiescing.
    /// The partial timeline stays readable for diagnosis.
    #[error("simulation deadlock: {steps} steps without quiescence, {unconsumed} events unconsumed")]
    Deadlock { steps: usize, unconsumed: usize },
}

// ============================================================================
// Orchestrator
// ============================================================================

/// Owns the clock, the bus, the mock systems and the four agents
pub struct Orchestrator {
    config: SimulationConfig,
    clock: SimClock,
    systems: MockSystems,
    timeline: Timeline,

    cro: CroInterfaceAgent,
    clinical_ops: ClinicalOpsAgent,
    manufacturing: ManufacturingAgent,
    logistics: LogisticsAgent,

    /// Index of the next unconsumed timeline event
    cursor: usize,
    /// Events delivered across the lifetime of this orchestrator
    steps: usize,
}

impl Orchestrator {
    /// Create an orchestrator from a validated configuration
    ///
    /// # Example
    ///
    /// ```
    /// use trial_supply_simulator_core_rs::orchestrator::{Orchestrator, SimulationConfig};
    ///
    /// let mut orchestrator = Orchestrator::new(SimulationConfig::default()).unwrap();
    /// let report = orchestrator.activate_site("SITE-01").unwrap();
    /// assert!(report.metrics.order_to_delivery_days.is_some());
    /// ```
    pub fn new(config: SimulationConfig) -> Result<Self, SimulationError> {
        Self::validate_config(&config)?;

        let systems = MockSystems::new(&config.fixtures);
        let clock = SimClock::new(config.start_day);

        let cro = CroInterfaceAgent::new(&config.study_id);
        let clinical_ops = ClinicalOpsAgent::new(
            &config.study_id,
            config.safety_stock_multiplier,
            config.transit_buffer_days,
        );
        let manufacturing = ManufacturingAgent::new(config.processing_lead_days);
        let lanes = config
            .fixtures
            .sites
            .iter()
            .map(|s| (s.site_id.clone(), s.transit_days))
            .collect();
        let logistics = LogisticsAgent::new(
            config.shipping_rates.clone(),
            config.departure_delay_days,
            lanes,
            config.default_transit_days,
        );

        Ok(Self {
            config,
            clock,
            systems,
            timeline: Timeline::new(),
            cro,
            clinical_ops,
            manufacturing,
            logistics,
            cursor: 0,
            steps: 0,
        })
    }

    fn validate_config(config: &SimulationConfig) -> Result<(), SimulationError> {
        if config.study_id.is_empty() {
            return Err(SimulationError::InvalidConfig(
                "study_id must not be empty".to_string(),
            ));
        }

        if config.max_steps == 0 {
            return Err(SimulationError::InvalidConfig(
                "max_steps must be > 0".to_string(),
            ));
        }

        if config.safety_stock_multiplier <= 0.0 {
            return Err(SimulationError::InvalidConfig(
                "safety_stock_multiplier must be > 0".to_string(),
            ));
        }

        if config.fixtures.sites.is_empty() {
            return Err(SimulationError::InvalidConfig(
                "fixture set must contain at least one site".to_string(),
            ));
        }

        let mut site_ids = HashSet::new();
        for site in &config.fixtures.sites {
            if !site_ids.insert(&site.site_id) {
                return Err(SimulationError::InvalidConfig(format!(
                    "duplicate site id: {}",
                    site.site_id
                )));
            }
        }

        let mut batch_ids = HashSet::new();
        for batch in &config.fixtures.batches {
            if !batch_ids.insert(&batch.batch_id) {
                return Err(SimulationError::InvalidConfig(format!(
                    "duplicate batch id: {}",
                    batch.batch_id
                )));
            }
        }

        Ok(())
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Current simulated day
    pub fn current_day(&self) -> usize {
        self.clock.today()
    }

    /// Move the logical clock forward before the next trigger
    pub fn advance_days(&mut self, days: usize) {
        self.clock.advance_days(days);
    }

    /// The full event log
    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// The mock backend systems (read-only; exposes call counters)
    pub fn systems(&self) -> &MockSystems {
        &self.systems
    }

    /// Metrics recomputed from the timeline as it stands
    pub fn metrics(&self) -> SimulationMetrics {
        SimulationMetrics::compute(&self.timeline)
    }

    /// Read-only state snapshot for one agent
    pub fn agent_snapshot(&self, agent: AgentId) -> Option<AgentSnapshot> {
        match agent {
            AgentId::CroInterface => Some(self.cro.snapshot()),
            AgentId::ClinicalOps => Some(self.clinical_ops.snapshot()),
            AgentId::Manufacturing => Some(self.manufacturing.snapshot()),
            AgentId::Logistics => Some(self.logistics.snapshot()),
            AgentId::External => None,
        }
    }

    /// Snapshots of all four agents
    pub fn snapshots(&self) -> Vec<AgentSnapshot> {
        vec![
            self.cro.snapshot(),
            self.clinical_ops.snapshot(),
            self.manufacturing.snapshot(),
            self.logistics.snapshot(),
        ]
    }

    // ========================================================================
    // Trigger and dispatch loop
    // ========================================================================

    /// Inject the single external trigger and run to quiescence
    ///
    /// May be called repeatedly (optionally advancing the clock in
    /// between) to activate further sites on the same timeline.
    pub fn activate_site(&mut self, site_id: &str) -> Result<RunReport, SimulationError> {
        let events_before = self.timeline.len();
        let steps_before = self.steps;
        let day = self.clock.today();

        debug!(site_id, day, "activation trigger injected");
        self.timeline.publish(
            day,
            EventDraft::message(
                AgentId::External,
                AgentId::CroInterface,
                EventPayload::ActivateSite(ActivateSiteCommand {
                    site_id: site_id.to_string(),
                }),
            ),
        )?;

        self.run_to_quiescence()?;

        Ok(RunReport {
            steps: self.steps - steps_before,
            events_published: self.timeline.len() - events_before,
            metrics: self.metrics(),
        })
    }

    /// Deliver unconsumed events until the fixed point or the step bound
    fn run_to_quiescence(&mut self) -> Result<(), SimulationError> {
        while self.cursor < self.timeline.len() {
            if self.steps >= self.config.max_steps {
                return Err(SimulationError::Deadlock {
                    steps: self.steps,
                    unconsumed: self.timeline.len() - self.cursor,
                });
            }

            let event = self.timeline.all_events()[self.cursor].clone();
            self.cursor += 1;
            self.steps += 1;
            debug!(id = event.id(), kind = event.kind(), "delivering event");

            let day = self.clock.today();
            let mut outbound: Vec<EventDraft> = Vec::new();
            {
                let systems = &self.systems;
                let agents: [&mut dyn Agent; 4] = [
                    &mut self.cro,
                    &mut self.clinical_ops,
                    &mut self.manufacturing,
                    &mut self.logistics,
                ];
                for agent in agents {
                    if !agent.wants(&event) {
                        continue;
                    }
                    let source = agent.id();
                    let mut gateway = SystemsGateway::new(systems, day);
                    let messages = agent.handle_event(&event, &mut gateway);

                    // Queries precede the decisions they informed
                    for record in gateway.into_queries() {
                        outbound.push(EventDraft::query(source, record));
                    }
                    for message in messages {
                        outbound.push(EventDraft::message(source, message.target, message.payload));
                    }
                }
            }

            for draft in outbound {
                self.timeline.publish(day, draft)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_config_empty_study() {
        let config = SimulationConfig {
            study_id: String::new(),
            ..SimulationConfig::default()
        };
        assert!(matches!(
            Orchestrator::new(config),
            Err(SimulationError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_invalid_config_duplicate_site() {
        let mut config = SimulationConfig::default();
        let dup = config.fixtures.sites[0].clone();
        config.fixtures.sites.push(dup);
        assert!(matches!(
            Orchestrator::new(config),
            Err(SimulationError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_step_bound_surfaces_deadlock() {
        let config = SimulationConfig {
            max_steps: 1,
            ..SimulationConfig::default()
        };
        let mut orchestrator = Orchestrator::new(config).unwrap();

        let err = orchestrator.activate_site("SITE-01").unwrap_err();
        assert!(matches!(err, SimulationError::Deadlock { .. }));
        // Partial timeline stays readable for diagnosis
        assert!(!orchestrator.timeline().is_empty());
    }
}
