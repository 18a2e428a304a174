//! Orchestrator: trigger injection, dispatch loop, derived metrics
//!
//! See `engine.rs` for the dispatch loop and `metrics.rs` for the
//! metric definitions.

pub mod engine;
pub mod metrics;

pub use engine::{Orchestrator, RunReport, SimulationConfig, SimulationError};
pub use metrics::{SimulationMetrics, FORECAST_ACCURACY_HORIZON_DAYS};
