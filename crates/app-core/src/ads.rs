//! Interstitial ad cadence
//!
//! Counts user actions that could be followed by a full-screen ad and
//! allows one every `frequency_cap` actions. Showing the ad is left to the
//! platform layer.

/// Default number of actions per interstitial
pub const DEFAULT_FREQUENCY_CAP: u32 = 3;

/// Action counter deciding when an interstitial may be shown
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdCadence {
    frequency_cap: u32,
    counter: u32,
}

impl Default for AdCadence {
    fn default() -> Self {
        Self::new(DEFAULT_FREQUENCY_CAP)
    }
}

impl AdCadence {
    /// Allow one interstitial every `frequency_cap` actions
    ///
    /// A cap of zero is treated as one.
    pub fn new(frequency_cap: u32) -> Self {
        Self { frequency_cap: frequency_cap.max(1), counter: 0 }
    }

    /// Count an action; true when an interstitial is due
    pub fn register_action(&mut self) -> bool {
        self.counter = self.counter.wrapping_add(1);
        self.counter % self.frequency_cap == 0
    }

    /// Actions counted so far
    pub fn count(&self) -> u32 {
        self.counter
    }

    /// Actions per interstitial
    pub fn frequency_cap(&self) -> u32 {
        self.frequency_cap
    }

    /// Start counting again
    pub fn reset(&mut self) {
        self.counter = 0;
    }
}
