use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use rand::Rng;
use tokio::time::interval;
use tracing::debug;

use crate::api::health::HealthState;
use crate::config::{sim_deltas, Config};
use crate::state::CampaignStore;
use crate::types::{ActivityKind, MetricDelta};

// ---------------------------------------------------------------------------
// TickDraw
// ---------------------------------------------------------------------------

/// The random choices made for one tick, separated from their application
/// so a tick can be replayed deterministically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickDraw {
    pub impressions: u64,
    pub clicks: u64,
    pub conversions: u64,
    pub discount_applied: bool,
}

impl TickDraw {
    pub fn sample<R: Rng + ?Sized>(rng: &mut R, discount_probability: f64) -> Self {
        let impressions =
            rng.random_range(sim_deltas::IMPRESSIONS_MIN..=sim_deltas::IMPRESSIONS_MAX);
        let clicks = rng.random_range(0..=sim_deltas::CLICKS_MAX);
        let conversions = if rng.random_bool(sim_deltas::CONVERSION_PROBABILITY) {
            rng.random_range(0..=sim_deltas::CONVERSIONS_MAX)
        } else {
            0
        };
        let discount_applied = rng.random_bool(discount_probability);
        Self { impressions, clicks, conversions, discount_applied }
    }
}

/// Turn a draw into a concrete delta and apply it to the store. Revenue is
/// conversions × current average catalog price, discounted on discount
/// ticks. Returns the applied delta.
pub fn apply_tick(store: &CampaignStore, draw: &TickDraw) -> MetricDelta {
    let avg_price = store.avg_price();
    let factor = if draw.discount_applied { sim_deltas::DISCOUNT_FACTOR } else { 1.0 };
    let delta = MetricDelta {
        impressions: draw.impressions,
        clicks: draw.clicks,
        conversions: draw.conversions,
        revenue: draw.conversions as f64 * avg_price * factor,
    };
    store.apply_delta(&delta);
    delta
}

// ---------------------------------------------------------------------------
// Simulator
// ---------------------------------------------------------------------------

/// Background task that perturbs the campaign metrics on a fixed period,
/// standing in for a live ad-network feed. Runs for the lifetime of the
/// process; every operation on a tick is total, so the loop has no
/// failure path.
pub struct Simulator {
    cfg: Config,
    store: Arc<CampaignStore>,
    health: Arc<HealthState>,
}

impl Simulator {
    pub fn new(cfg: Config, store: Arc<CampaignStore>, health: Arc<HealthState>) -> Self {
        Self { cfg, store, health }
    }

    pub async fn run(self) {
        let mut ticker = interval(Duration::from_secs(self.cfg.sim_tick_secs));
        ticker.tick().await; // consume immediate first tick — first update lands one full period in

        loop {
            ticker.tick().await;
            self.tick();
        }
    }

    fn tick(&self) {
        let mut rng = rand::rng();
        let draw = TickDraw::sample(&mut rng, self.cfg.sim_discount_probability);
        let applied = apply_tick(&self.store, &draw);

        let kind = pick_activity(&mut rng);
        self.store.push_timeline(format!("{kind} updated"));
        self.health.record_tick(now_ns());

        debug!(
            impressions = applied.impressions,
            clicks = applied.clicks,
            conversions = applied.conversions,
            revenue = applied.revenue,
            discount = draw.discount_applied,
            activity = %kind,
            "tick applied",
        );
    }
}

fn pick_activity<R: Rng + ?Sized>(rng: &mut R) -> ActivityKind {
    ActivityKind::ALL[rng.random_range(0..ActivityKind::ALL.len())]
}

fn now_ns() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn deterministic_tick_from_seeded_dashboard() {
        // Seed metrics {1200, 210, 42, 4200}, avg catalog price 149.495.
        let store = CampaignStore::with_demo_seed();
        let draw = TickDraw { impressions: 10, clicks: 3, conversions: 1, discount_applied: false };

        let applied = apply_tick(&store, &draw);
        assert!((applied.revenue - 149.495).abs() < 1e-9);

        let m = store.metrics();
        assert_eq!(m.impressions, 1210);
        assert_eq!(m.clicks, 213);
        assert_eq!(m.conversions, 43);
        assert!((m.revenue - 4349.495).abs() < 1e-9);
    }

    #[test]
    fn discount_tick_scales_revenue() {
        let store = CampaignStore::with_demo_seed();
        let draw = TickDraw { impressions: 5, clicks: 0, conversions: 2, discount_applied: true };

        let applied = apply_tick(&store, &draw);
        assert!((applied.revenue - 2.0 * 149.495 * 0.9).abs() < 1e-9);
    }

    #[test]
    fn empty_catalog_yields_zero_revenue() {
        let store = CampaignStore::new();
        let draw = TickDraw { impressions: 5, clicks: 1, conversions: 2, discount_applied: false };

        let applied = apply_tick(&store, &draw);
        assert_eq!(applied.revenue, 0.0);
        assert_eq!(store.metrics().conversions, 2);
    }

    #[test]
    fn sampled_draws_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let draw = TickDraw::sample(&mut rng, 0.1);
            assert!((5..=24).contains(&draw.impressions));
            assert!(draw.clicks <= 7);
            assert!(draw.conversions <= 2);
        }
    }

    #[test]
    fn discount_probability_bounds() {
        let mut rng = StdRng::seed_from_u64(11);
        assert!((0..200).all(|_| !TickDraw::sample(&mut rng, 0.0).discount_applied));
        assert!((0..200).all(|_| TickDraw::sample(&mut rng, 1.0).discount_applied));
    }

    #[test]
    fn metrics_never_decrease_across_ticks() {
        let store = CampaignStore::with_demo_seed();
        let mut rng = StdRng::seed_from_u64(42);
        let mut prev = store.metrics();

        for _ in 0..25 {
            let draw = TickDraw::sample(&mut rng, 0.1);
            apply_tick(&store, &draw);
            let m = store.metrics();
            assert!(m.impressions >= prev.impressions);
            assert!(m.clicks >= prev.clicks);
            assert!(m.conversions >= prev.conversions);
            assert!(m.revenue >= prev.revenue);
            prev = m;
        }
    }
}
