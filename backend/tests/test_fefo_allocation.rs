//! Property tests for FEFO allocation and shipment costing

use proptest::prelude::*;
use trial_supply_simulator_core_rs::{fefo_allocate, ShippingRates};

fn candidates_strategy() -> impl Strategy<Value = Vec<(String, usize, u32)>> {
    prop::collection::vec((1usize..120, 0u32..400), 1..12).prop_map(|raw| {
        raw.into_iter()
            .enumerate()
            .map(|(i, (expiry, available))| (format!("BATCH-{:03}", i + 1), expiry, available))
            .collect()
    })
}

proptest! {
    #[test]
    fn prop_fefo_meets_requested_quantity_when_supply_suffices(
        candidates in candidates_strategy(),
        requested in 0u32..1500,
    ) {
        let total: u32 = candidates.iter().map(|c| c.2).sum();
        let expiry_of = |batch_id: &str| {
            candidates.iter().find(|c| c.0 == batch_id).unwrap().1
        };

        match fefo_allocate(&candidates, requested) {
            Ok(lots) => {
                prop_assert!(requested <= total);
                let allocated: u32 = lots.iter().map(|l| l.quantity).sum();
                prop_assert_eq!(allocated, requested);

                // Batches are consumed in non-decreasing expiry order
                let expiries: Vec<usize> =
                    lots.iter().map(|l| expiry_of(&l.batch_id)).collect();
                prop_assert!(expiries.windows(2).all(|w| w[0] <= w[1]));

                // No lot exceeds what its batch had available
                for lot in &lots {
                    let available = candidates
                        .iter()
                        .find(|c| c.0 == lot.batch_id)
                        .unwrap()
                        .2;
                    prop_assert!(lot.quantity <= available);
                }
            }
            Err(short) => {
                prop_assert!(requested > total);
                let allocated: u32 = short.allocated.iter().map(|l| l.quantity).sum();
                prop_assert_eq!(allocated, total);
                prop_assert_eq!(short.shortfall, requested - total);
            }
        }
    }

    #[test]
    fn prop_shipment_cost_monotone_in_batch_count(
        batch_count in 0usize..20,
        departure in 0usize..30,
        target in 0usize..60,
    ) {
        let rates = ShippingRates::default();
        let cost_n = rates.shipment_cost(batch_count, departure, target);
        let cost_n1 = rates.shipment_cost(batch_count + 1, departure, target);
        prop_assert!(cost_n1 >= cost_n);
    }

    #[test]
    fn prop_tight_window_strictly_dearer(
        batch_count in 0usize..20,
        departure in 0usize..30,
    ) {
        let rates = ShippingRates::default();
        // Window of exactly the expedite threshold vs. one day wider
        let tight = rates.shipment_cost(batch_count, departure, departure + 2);
        let relaxed = rates.shipment_cost(batch_count, departure, departure + 3);
        prop_assert!(tight > relaxed);
    }
}
