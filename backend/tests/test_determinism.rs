//! Determinism tests
//!
//! The simulation consumes no randomness of its own, so identical
//! fixtures and trigger parameters must replay to byte-identical
//! timelines. The timeline digest is the equality witness.

use trial_supply_simulator_core_rs::{FixtureSet, Orchestrator, SimulationConfig};

fn digest_of(config: SimulationConfig, site_id: &str) -> String {
    let mut orchestrator = Orchestrator::new(config).unwrap();
    orchestrator.activate_site(site_id).unwrap();
    orchestrator.timeline().digest()
}

#[test]
fn test_identical_runs_identical_timelines() {
    let a = digest_of(SimulationConfig::default(), "SITE-01");
    let b = digest_of(SimulationConfig::default(), "SITE-01");
    assert_eq!(a, b);
}

#[test]
fn test_payload_values_replay_exactly() {
    let run = || {
        let mut orchestrator = Orchestrator::new(SimulationConfig::default()).unwrap();
        orchestrator.activate_site("SITE-01").unwrap();
        orchestrator
    };
    let first = run();
    let second = run();

    // Stronger than the digest: compare the decoded events themselves
    assert_eq!(
        first.timeline().all_events(),
        second.timeline().all_events()
    );
    assert_eq!(first.snapshots(), second.snapshots());
    assert_eq!(first.metrics(), second.metrics());
}

#[test]
fn test_different_trigger_site_changes_timeline() {
    let a = digest_of(SimulationConfig::default(), "SITE-01");
    let b = digest_of(SimulationConfig::default(), "SITE-02");
    assert_ne!(a, b);
}

#[test]
fn test_randomized_fixtures_replay_by_seed() {
    let config_for = |seed: u64| SimulationConfig {
        fixtures: FixtureSet::randomized(seed, 8),
        ..SimulationConfig::default()
    };

    let a = digest_of(config_for(42), "SITE-01");
    let b = digest_of(config_for(42), "SITE-01");
    let c = digest_of(config_for(43), "SITE-01");

    assert_eq!(a, b);
    assert_ne!(a, c);
}

#[test]
fn test_config_round_trips_through_json() {
    let config = SimulationConfig::default();
    let encoded = serde_json::to_string(&config).unwrap();
    let decoded: SimulationConfig = serde_json::from_str(&encoded).unwrap();
    assert_eq!(config, decoded);

    // A run from the decoded scenario matches the original
    assert_eq!(
        digest_of(config, "SITE-01"),
        digest_of(decoded, "SITE-01")
    );
}
