//! Derived metrics
//!
//! Metrics are a pure function of the timeline: nothing is accumulated
//! during the run, so the rendering collaborator can recompute them at
//! any point and always agree with the log. When a run activates more
//! than one site, the pairing metrics describe the first completed
//! chain; `compliance_events` counts every shipment plan.

use crate::models::event::{EventPayload, Timeline};
use crate::models::query::QueryResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Horizon of the forecast-accuracy proxy, in days
pub const FORECAST_ACCURACY_HORIZON_DAYS: usize = 7;

/// Metric values derived from a timeline
///
/// Pairing metrics are `None` until the corresponding events exist on
/// the log (e.g. after a trigger for an unregistered site).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationMetrics {
    /// Shipment ETA minus the activation day of the triggering event
    pub order_to_delivery_days: Option<usize>,

    /// Cost of the planned shipment (cents)
    pub shipment_cost_cents: Option<i64>,

    /// Shipments whose compliance rule set was non-empty at plan time
    pub compliance_events: usize,

    /// `min(allocated, forecast_7d) / forecast_7d`, clamped to [0, 1]
    pub forecast_accuracy: Option<f64>,
}

impl SimulationMetrics {
    /// Recompute all metrics from a timeline
    pub fn compute(timeline: &Timeline) -> Self {
        let mut activation_day = None;
        let mut eta_day = None;
        let mut shipment_cost_cents = None;
        let mut compliance_events = 0;
        let mut allocated_quantity = None;
        let mut forecast_7d = None;

        for event in timeline.all_events() {
            match event.payload() {
                EventPayload::SiteActivated(ev) => {
                    if activation_day.is_none() {
                        activation_day = Some(ev.activation_day);
                    }
                }
                EventPayload::AllocateLotResponse(resp) => {
                    if allocated_quantity.is_none() {
                        allocated_quantity = Some(resp.allocated_quantity);
                    }
                }
                EventPayload::ShipmentPlan(plan) => {
                    if eta_day.is_none() {
                        eta_day = Some(plan.eta_day);
                        shipment_cost_cents = Some(plan.cost_cents);
                    }
                    if !plan.compliance_flags.is_empty() {
                        compliance_events += 1;
                    }
                }
                EventPayload::DirectQuery(record) => {
                    if forecast_7d.is_none() {
                        if let QueryResult::Enrollment(data) = &record.result {
                            forecast_7d =
                                Some(data.cumulative_through(FORECAST_ACCURACY_HORIZON_DAYS));
                        }
                    }
                }
                _ => {}
            }
        }

        let order_to_delivery_days = match (activation_day, eta_day) {
            (Some(activated), Some(eta)) => Some(eta.saturating_sub(activated)),
            _ => None,
        };

        let forecast_accuracy = match (allocated_quantity, forecast_7d) {
            (Some(_), Some(0)) => Some(1.0),
            (Some(allocated), Some(forecast)) => {
                let ratio = allocated.min(forecast) as f64 / forecast as f64;
                Some(ratio.clamp(0.0, 1.0))
            }
            _ => None,
        };

        Self {
            order_to_delivery_days,
            shipment_cost_cents,
            compliance_events,
            forecast_accuracy,
        }
    }

    /// Name → value map for the metrics read API
    ///
    /// Metrics not yet computable report as 0.
    pub fn as_map(&self) -> BTreeMap<String, f64> {
        let mut map = BTreeMap::new();
        map.insert(
            "order_to_delivery_days".to_string(),
            self.order_to_delivery_days.unwrap_or(0) as f64,
        );
        map.insert(
            "shipment_cost_cents".to_string(),
            self.shipment_cost_cents.unwrap_or(0) as f64,
        );
        map.insert("compliance_events".to_string(), self.compliance_events as f64);
        map.insert(
            "forecast_accuracy".to_string(),
            self.forecast_accuracy.unwrap_or(0.0),
        );
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::event::{AgentId, EventDraft, Timeline};
    use crate::models::message::{ShipmentPlan, SiteActivated};
    use std::collections::BTreeSet;

    fn publish_activation(timeline: &mut Timeline, day: usize) {
        timeline
            .publish(
                day,
                EventDraft::message(
                    AgentId::CroInterface,
                    AgentId::ClinicalOps,
                    EventPayload::SiteActivated(SiteActivated {
                        study_id: "STUDY-ALPHA".to_string(),
                        site_id: "SITE-01".to_string(),
                        activation_day: day,
                        enrollment_target: 500,
                    }),
                ),
            )
            .unwrap();
    }

    fn publish_plan(timeline: &mut Timeline, eta_day: usize, flags: BTreeSet<String>) {
        timeline
            .publish(
                timeline.all_events().last().map(|e| e.day()).unwrap_or(0),
                EventDraft::message(
                    AgentId::Logistics,
                    AgentId::ClinicalOps,
                    EventPayload::ShipmentPlan(ShipmentPlan {
                        request_id: "REQ-0002".to_string(),
                        shipment_id: "SHP-0001".to_string(),
                        site_id: "SITE-01".to_string(),
                        batch_ids: vec!["BATCH-001".to_string()],
                        departure_day: 1,
                        eta_day,
                        cost_cents: 62_000,
                        compliance_flags: flags,
                    }),
                ),
            )
            .unwrap();
    }

    #[test]
    fn test_empty_timeline_yields_no_pairing_metrics() {
        let metrics = SimulationMetrics::compute(&Timeline::new());
        assert_eq!(metrics.order_to_delivery_days, None);
        assert_eq!(metrics.compliance_events, 0);
        assert_eq!(metrics.as_map()["order_to_delivery_days"], 0.0);
    }

    #[test]
    fn test_order_to_delivery_is_eta_minus_activation() {
        let mut timeline = Timeline::new();
        publish_activation(&mut timeline, 3);
        publish_plan(&mut timeline, 9, BTreeSet::new());

        let metrics = SimulationMetrics::compute(&timeline);
        assert_eq!(metrics.order_to_delivery_days, Some(6));
        assert_eq!(metrics.shipment_cost_cents, Some(62_000));
    }

    #[test]
    fn test_compliance_events_counted_from_flags() {
        let mut timeline = Timeline::new();
        publish_activation(&mut timeline, 0);
        publish_plan(&mut timeline, 5, BTreeSet::new());
        let mut flags = BTreeSet::new();
        flags.insert("temperature_excursion_review".to_string());
        publish_plan(&mut timeline, 6, flags);

        let metrics = SimulationMetrics::compute(&timeline);
        assert_eq!(metrics.compliance_events, 1);
    }
}
