//! Logical time for the simulation
//!
//! The simulation operates on whole logical days. There is no wall-clock
//! involvement anywhere: activation dates, release dates and ETAs are all
//! day indices relative to day 0.

use serde::{Deserialize, Serialize};

/// Day-granularity logical clock
///
/// # Example
/// ```
/// use trial_supply_simulator_core_rs::SimClock;
///
/// let mut clock = SimClock::new(0);
/// assert_eq!(clock.today(), 0);
///
/// clock.advance_days(3);
/// assert_eq!(clock.today(), 3);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimClock {
    /// Current simulated day (0-indexed)
    current_day: usize,
}

impl SimClock {
    /// Create a clock positioned at `start_day`
    pub fn new(start_day: usize) -> Self {
        Self {
            current_day: start_day,
        }
    }

    /// Current simulated day
    pub fn today(&self) -> usize {
        self.current_day
    }

    /// Advance the clock by one day
    pub fn advance_day(&mut self) {
        self.current_day += 1;
    }

    /// Advance the clock by `days` days
    pub fn advance_days(&mut self, days: usize) {
        self.current_day += days;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_at_given_day() {
        let clock = SimClock::new(7);
        assert_eq!(clock.today(), 7);
    }

    #[test]
    fn test_advance() {
        let mut clock = SimClock::new(0);
        clock.advance_day();
        clock.advance_days(4);
        assert_eq!(clock.today(), 5);
    }
}
