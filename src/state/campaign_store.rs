use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::{SystemTime, UNIX_EPOCH};

use dashmap::DashMap;

use crate::config::{seed, TIMELINE_TAIL_LEN};
use crate::error::ProductError;
use crate::types::{
    DerivedRates, MetricDelta, Metrics, Product, ProductDraft, Snapshot, TimelineEntry,
};

// ---------------------------------------------------------------------------
// CampaignStore
// ---------------------------------------------------------------------------

/// All campaign state for one process. Created by the entry point and
/// shared as `Arc<CampaignStore>` with the simulator and the API — there
/// are no ambient globals.
pub struct CampaignStore {
    /// product_id → Product.
    products: DashMap<String, Product>,
    /// Product ids in insertion order, for stable snapshot ordering.
    product_order: Mutex<Vec<String>>,
    /// Monotonic sequence backing product id generation.
    next_seq: AtomicU64,
    metrics: RwLock<Metrics>,
    /// Append-only. Grows unbounded; only the tail is ever displayed.
    timeline: Mutex<Vec<TimelineEntry>>,
}

impl CampaignStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Store seeded the way a fresh dashboard starts: two catalog entries
    /// and non-zero campaign metrics. The timeline starts empty — seeding
    /// is not an event.
    pub fn with_demo_seed() -> Arc<Self> {
        let store = Self::new();
        for &(name, category, price, target_cpa) in seed::PRODUCTS {
            store.insert_product(name, category, price, target_cpa);
        }
        *store.metrics.write().expect("metrics lock poisoned") = Metrics {
            impressions: seed::IMPRESSIONS,
            clicks: seed::CLICKS,
            conversions: seed::CONVERSIONS,
            revenue: seed::REVENUE,
        };
        store
    }

    // -- products -----------------------------------------------------------

    /// Validate an add-product draft and append the product.
    ///
    /// Name and category are trimmed; price and target CPA are parsed from
    /// the raw strings the view submitted. Every rejection is a typed
    /// error — the caller decides how to present it.
    pub fn add_product(&self, draft: &ProductDraft) -> Result<Product, ProductError> {
        let name = draft.name.trim();
        if name.is_empty() {
            return Err(ProductError::EmptyName);
        }
        let category = draft.category.trim();
        if category.is_empty() {
            return Err(ProductError::EmptyCategory);
        }
        let price = parse_amount(&draft.price).ok_or_else(|| {
            ProductError::InvalidPrice(draft.price.trim().to_string())
        })?;
        if price < 0.0 {
            return Err(ProductError::NegativePrice);
        }
        let target_cpa = parse_amount(&draft.target_cpa).ok_or_else(|| {
            ProductError::InvalidTargetCpa(draft.target_cpa.trim().to_string())
        })?;
        if target_cpa < 0.0 {
            return Err(ProductError::NegativeTargetCpa);
        }

        let product = self.insert_product(name, category, price, target_cpa);
        self.push_timeline(format!("Added product: {} ({})", product.name, product.category));
        Ok(product)
    }

    fn insert_product(&self, name: &str, category: &str, price: f64, target_cpa: f64) -> Product {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        let product = Product {
            id: format!("P-{seq:05}"),
            name: name.to_string(),
            category: category.to_string(),
            price,
            target_cpa,
        };
        self.products.insert(product.id.clone(), product.clone());
        self.product_order
            .lock()
            .expect("product order lock poisoned")
            .push(product.id.clone());
        product
    }

    pub fn get_product(&self, product_id: &str) -> Option<Product> {
        self.products.get(product_id).map(|p| p.clone())
    }

    pub fn product_count(&self) -> usize {
        self.products.len()
    }

    /// Products in insertion order.
    pub fn products(&self) -> Vec<Product> {
        let order = self.product_order.lock().expect("product order lock poisoned");
        order
            .iter()
            .filter_map(|id| self.products.get(id).map(|p| p.clone()))
            .collect()
    }

    /// Mean catalog price, 0.0 when the catalog is empty.
    pub fn avg_price(&self) -> f64 {
        let count = self.products.len();
        if count == 0 {
            return 0.0;
        }
        let total: f64 = self.products.iter().map(|p| p.price).sum();
        total / count as f64
    }

    // -- metrics ------------------------------------------------------------

    /// Add each delta field to the aggregate. No validation, no clamping.
    pub fn apply_delta(&self, delta: &MetricDelta) {
        let mut m = self.metrics.write().expect("metrics lock poisoned");
        m.impressions += delta.impressions;
        m.clicks += delta.clicks;
        m.conversions += delta.conversions;
        m.revenue += delta.revenue;
    }

    pub fn metrics(&self) -> Metrics {
        self.metrics.read().expect("metrics lock poisoned").clone()
    }

    // -- timeline -----------------------------------------------------------

    pub fn push_timeline(&self, message: String) {
        self.timeline
            .lock()
            .expect("timeline lock poisoned")
            .push(TimelineEntry { at_ns: now_ns(), message });
    }

    pub fn timeline_len(&self) -> usize {
        self.timeline.lock().expect("timeline lock poisoned").len()
    }

    /// The most recent `limit` entries, newest first.
    pub fn timeline_tail(&self, limit: usize) -> Vec<TimelineEntry> {
        let timeline = self.timeline.lock().expect("timeline lock poisoned");
        timeline.iter().rev().take(limit).cloned().collect()
    }

    // -- snapshot -----------------------------------------------------------

    pub fn snapshot(&self) -> Snapshot {
        let metrics = self.metrics();
        let derived = DerivedRates::from_metrics(&metrics);
        Snapshot {
            products: self.products(),
            metrics,
            derived,
            timeline: self.timeline_tail(TIMELINE_TAIL_LEN),
        }
    }
}

impl Default for CampaignStore {
    fn default() -> Self {
        Self {
            products: DashMap::new(),
            product_order: Mutex::new(Vec::new()),
            next_seq: AtomicU64::new(1),
            metrics: RwLock::new(Metrics::default()),
            timeline: Mutex::new(Vec::new()),
        }
    }
}

/// Parse a currency amount from a raw form field. Rejects empty input and
/// non-finite values ("NaN" and "inf" parse as f64 but are not amounts).
fn parse_amount(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
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

    fn draft(name: &str, category: &str, price: &str, target_cpa: &str) -> ProductDraft {
        ProductDraft {
            name: name.to_string(),
            category: category.to_string(),
            price: price.to_string(),
            target_cpa: target_cpa.to_string(),
        }
    }

    #[test]
    fn valid_draft_appends_exactly_one_product() {
        let store = CampaignStore::new();
        let before = store.product_count();

        let product = store
            .add_product(&draft("Zen Desk Lamp", "Lighting", "49.99", "4.25"))
            .unwrap();

        assert_eq!(store.product_count(), before + 1);
        assert_eq!(product.name, "Zen Desk Lamp");
        assert_eq!(product.category, "Lighting");
        assert!((product.price - 49.99).abs() < 1e-12);
        assert!((product.target_cpa - 4.25).abs() < 1e-12);
        assert_eq!(store.get_product(&product.id).unwrap().name, "Zen Desk Lamp");
    }

    #[test]
    fn invalid_drafts_leave_count_unchanged() {
        let store = CampaignStore::new();

        let cases = [
            (draft("", "Audio", "10", "1"), ProductError::EmptyName),
            (draft("   ", "Audio", "10", "1"), ProductError::EmptyName),
            (draft("X", "", "10", "1"), ProductError::EmptyCategory),
            (
                draft("X", "Audio", "ten", "1"),
                ProductError::InvalidPrice("ten".to_string()),
            ),
            (
                draft("X", "Audio", "10", ""),
                ProductError::InvalidTargetCpa(String::new()),
            ),
            (draft("X", "Audio", "NaN", "1"), ProductError::InvalidPrice("NaN".to_string())),
            (draft("X", "Audio", "-5", "1"), ProductError::NegativePrice),
            (draft("X", "Audio", "10", "-0.5"), ProductError::NegativeTargetCpa),
        ];

        for (bad, expected) in cases {
            let err = store.add_product(&bad).unwrap_err();
            assert_eq!(err, expected, "draft {bad:?}");
        }
        assert_eq!(store.product_count(), 0);
        assert_eq!(store.timeline_len(), 0, "rejected drafts must not log events");
    }

    #[test]
    fn ids_are_unique_and_ordered() {
        let store = CampaignStore::new();
        let a = store.add_product(&draft("A", "C", "1", "1")).unwrap();
        let b = store.add_product(&draft("B", "C", "2", "1")).unwrap();
        assert_ne!(a.id, b.id);

        let products = store.products();
        assert_eq!(products.len(), 2);
        assert_eq!(products[0].id, a.id);
        assert_eq!(products[1].id, b.id);
    }

    #[test]
    fn add_product_logs_one_timeline_entry() {
        let store = CampaignStore::new();
        store.add_product(&draft("A", "Audio", "1", "1")).unwrap();
        let tail = store.timeline_tail(TIMELINE_TAIL_LEN);
        assert_eq!(tail.len(), 1);
        assert_eq!(tail[0].message, "Added product: A (Audio)");
    }

    #[test]
    fn apply_delta_accumulates() {
        let store = CampaignStore::new();
        store.apply_delta(&MetricDelta { impressions: 10, clicks: 3, conversions: 1, revenue: 5.5 });
        store.apply_delta(&MetricDelta { impressions: 7, clicks: 0, conversions: 0, revenue: 0.0 });

        let m = store.metrics();
        assert_eq!(m.impressions, 17);
        assert_eq!(m.clicks, 3);
        assert_eq!(m.conversions, 1);
        assert!((m.revenue - 5.5).abs() < 1e-12);
    }

    #[test]
    fn avg_price_empty_and_seeded() {
        let store = CampaignStore::new();
        assert_eq!(store.avg_price(), 0.0);

        let store = CampaignStore::with_demo_seed();
        assert!((store.avg_price() - 149.495).abs() < 1e-9);
    }

    #[test]
    fn demo_seed_matches_starting_dashboard() {
        let store = CampaignStore::with_demo_seed();
        assert_eq!(store.product_count(), 2);
        assert_eq!(store.timeline_len(), 0);

        let m = store.metrics();
        assert_eq!(m.impressions, 1200);
        assert_eq!(m.clicks, 210);
        assert_eq!(m.conversions, 42);
        assert!((m.revenue - 4200.0).abs() < 1e-12);
    }

    #[test]
    fn timeline_tail_is_newest_first_and_capped() {
        let store = CampaignStore::new();
        for i in 0..9 {
            store.push_timeline(format!("event {i}"));
        }

        let tail = store.timeline_tail(TIMELINE_TAIL_LEN);
        assert_eq!(tail.len(), 6);
        assert_eq!(tail[0].message, "event 8");
        assert_eq!(tail[5].message, "event 3");

        // Fewer entries than the cap: return all of them.
        let store = CampaignStore::new();
        store.push_timeline("only".to_string());
        let tail = store.timeline_tail(TIMELINE_TAIL_LEN);
        assert_eq!(tail.len(), 1);
    }

    #[test]
    fn snapshot_combines_all_views() {
        let store = CampaignStore::with_demo_seed();
        store.push_timeline("tick".to_string());

        let snap = store.snapshot();
        assert_eq!(snap.products.len(), 2);
        assert_eq!(snap.metrics.impressions, 1200);
        assert!((snap.derived.ctr - 0.175).abs() < 1e-12);
        assert!((snap.derived.cr - 0.2).abs() < 1e-12);
        assert_eq!(snap.timeline.len(), 1);
    }
}
