//! Immutable reference data
//!
//! The site roster, batch catalog and compliance rule table are loaded
//! once into a `FixtureSet` at orchestrator construction and never
//! mutated afterwards. Mock systems only ever read from it.
//!
//! The default set reproduces the canonical activation scenario; the
//! seeded generator produces varied batch catalogs for stress runs
//! without giving up replayability.

use crate::models::query::{BatchInfo, StabilityStatus};
use crate::rng::SimRng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// One trial site, including its shipping lane
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteDescriptor {
    pub site_id: String,
    pub name: String,
    /// Enrollment target used when the site is activated
    pub planned_enrollment: u32,
    /// Transit time from the depot to this site, in days
    pub transit_days: usize,
}

/// Complete immutable fixture set for one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixtureSet {
    pub sites: Vec<SiteDescriptor>,
    pub batches: Vec<BatchInfo>,
    /// Active compliance rule identifiers per site; absent or empty
    /// means fully compliant
    pub site_rules: BTreeMap<String, BTreeSet<String>>,
}

impl FixtureSet {
    /// Look up a site by id
    pub fn site(&self, site_id: &str) -> Option<&SiteDescriptor> {
        self.sites.iter().find(|s| s.site_id == site_id)
    }

    /// Total stability-approved units across the catalog
    pub fn total_approved_units(&self) -> u32 {
        self.batches
            .iter()
            .filter(|b| b.stability_status == StabilityStatus::Approved)
            .map(|b| b.quantity_available)
            .sum()
    }

    /// Catalog with batch quantities generated from a seeded PRNG
    ///
    /// Quantities fall in `[80, 200)` and expiries are staggered, in the
    /// manner of the production mock data. Same seed, same catalog.
    pub fn randomized(seed: u64, batch_count: usize) -> Self {
        let mut rng = SimRng::new(seed);
        let batches = (0..batch_count)
            .map(|i| BatchInfo {
                batch_id: format!("BATCH-{:03}", i + 1),
                expiry_day: 30 + i * 10 + rng.range_u32(0, 10) as usize,
                stability_status: StabilityStatus::Approved,
                quantity_available: rng.range_u32(80, 200),
            })
            .collect();

        Self {
            batches,
            ..Self::default()
        }
    }
}

impl Default for FixtureSet {
    /// Canonical fixtures: five US sites, three allocatable batches
    /// (expiry 30/45/60, quantities 200/200/300), one quarantined batch
    /// and one batch that expires before any feasible release date.
    fn default() -> Self {
        let sites = vec![
            site("SITE-01", "Lakeview Medical Center", 500, 4),
            site("SITE-02", "St. Aurelia University Hospital", 320, 6),
            site("SITE-03", "Harbor General Hospital", 410, 5),
            site("SITE-04", "Meridian Research Institute", 275, 7),
            site("SITE-05", "Cedar Ridge Clinic", 350, 3),
        ];

        let batches = vec![
            batch("BATCH-001", 30, StabilityStatus::Approved, 200),
            batch("BATCH-002", 45, StabilityStatus::Approved, 200),
            batch("BATCH-003", 60, StabilityStatus::Approved, 300),
            batch("BATCH-004", 90, StabilityStatus::Quarantined, 250),
            batch("BATCH-005", 2, StabilityStatus::Approved, 180),
        ];

        Self {
            sites,
            batches,
            site_rules: BTreeMap::new(),
        }
    }
}

fn site(site_id: &str, name: &str, planned_enrollment: u32, transit_days: usize) -> SiteDescriptor {
    SiteDescriptor {
        site_id: site_id.to_string(),
        name: name.to_string(),
        planned_enrollment,
        transit_days,
    }
}

fn batch(
    batch_id: &str,
    expiry_day: usize,
    stability_status: StabilityStatus,
    quantity_available: u32,
) -> BatchInfo {
    BatchInfo {
        batch_id: batch_id.to_string(),
        expiry_day,
        stability_status,
        quantity_available,
    }
}
