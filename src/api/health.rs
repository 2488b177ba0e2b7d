//! Shared health state for the /health endpoint.
//! Updated by the simulator, read by the API.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Default)]
pub struct HealthState {
    /// Count of simulation ticks applied since startup.
    pub sim_ticks: AtomicU64,
    /// Nanosecond timestamp of the last applied tick (0 = none yet).
    pub last_tick_at_ns: AtomicU64,
}

impl HealthState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_tick(&self, at_ns: u64) {
        self.sim_ticks.fetch_add(1, Ordering::Relaxed);
        self.last_tick_at_ns.store(at_ns, Ordering::Relaxed);
    }

    pub fn sim_ticks(&self) -> u64 {
        self.sim_ticks.load(Ordering::Relaxed)
    }

    pub fn last_tick_at_ns(&self) -> u64 {
        self.last_tick_at_ns.load(Ordering::Relaxed)
    }
}
