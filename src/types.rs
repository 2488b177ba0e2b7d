use serde::{Deserialize, Serialize};
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Product
// ---------------------------------------------------------------------------

/// A catalog entry. Append-only: products are never mutated or removed
/// after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub category: String,
    pub price: f64,
    pub target_cpa: f64,
}

/// Raw add-product intent exactly as the view collected it. Price and
/// target CPA arrive as strings; parsing and validation belong to the
/// store, not the view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductDraft {
    pub name: String,
    pub category: String,
    pub price: String,
    pub target_cpa: String,
}

// ---------------------------------------------------------------------------
// Campaign metrics
// ---------------------------------------------------------------------------

/// The single mutable metrics aggregate. clicks ≤ impressions and
/// conversions ≤ clicks is the intended reading but is not enforced:
/// tick deltas are drawn independently.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub impressions: u64,
    pub clicks: u64,
    pub conversions: u64,
    pub revenue: f64,
}

/// One tick's worth of increments. Unsigned counts keep every metric
/// monotonically non-decreasing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricDelta {
    pub impressions: u64,
    pub clicks: u64,
    pub conversions: u64,
    pub revenue: f64,
}

/// Rates derived from the metrics aggregate at snapshot time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DerivedRates {
    /// clicks / impressions, 0 when impressions = 0.
    pub ctr: f64,
    /// conversions / clicks, 0 when clicks = 0.
    pub cr: f64,
}

impl DerivedRates {
    pub fn from_metrics(m: &Metrics) -> Self {
        let ctr = if m.impressions > 0 {
            m.clicks as f64 / m.impressions as f64
        } else {
            0.0
        };
        let cr = if m.clicks > 0 {
            m.conversions as f64 / m.clicks as f64
        } else {
            0.0
        };
        Self { ctr, cr }
    }
}

// ---------------------------------------------------------------------------
// Timeline
// ---------------------------------------------------------------------------

/// Append-only log entry. The timestamp stays structured; views decide
/// how to format it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineEntry {
    /// Nanosecond UTC epoch timestamp.
    pub at_ns: u64,
    pub message: String,
}

/// Categorical label the ticker appends to the timeline each period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityKind {
    Impression,
    Click,
    Conversion,
    Revenue,
}

impl ActivityKind {
    pub const ALL: [ActivityKind; 4] = [
        ActivityKind::Impression,
        ActivityKind::Click,
        ActivityKind::Conversion,
        ActivityKind::Revenue,
    ];
}

impl std::fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ActivityKind::Impression => "Impression",
            ActivityKind::Click => "Click",
            ActivityKind::Conversion => "Conversion",
            ActivityKind::Revenue => "Revenue",
        };
        write!(f, "{s}")
    }
}

// ---------------------------------------------------------------------------
// Theme preference
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        };
        write!(f, "{s}")
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "dark" => Ok(Theme::Dark),
            "light" => Ok(Theme::Light),
            other => Err(other.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Snapshot — the read model pushed to views
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// Products in insertion order.
    pub products: Vec<Product>,
    pub metrics: Metrics,
    pub derived: DerivedRates,
    /// Timeline tail: the most recent entries, newest first.
    pub timeline: Vec<TimelineEntry>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_rates_zero_denominators() {
        let rates = DerivedRates::from_metrics(&Metrics::default());
        assert_eq!(rates.ctr, 0.0);
        assert_eq!(rates.cr, 0.0);

        // Impressions but no clicks: ctr defined, cr still 0.
        let m = Metrics { impressions: 100, clicks: 0, conversions: 0, revenue: 0.0 };
        let rates = DerivedRates::from_metrics(&m);
        assert_eq!(rates.ctr, 0.0);
        assert_eq!(rates.cr, 0.0);
    }

    #[test]
    fn derived_rates_in_unit_interval() {
        let m = Metrics { impressions: 1200, clicks: 210, conversions: 42, revenue: 4200.0 };
        let rates = DerivedRates::from_metrics(&m);
        assert!((rates.ctr - 0.175).abs() < 1e-12);
        assert!((rates.cr - 0.2).abs() < 1e-12);
        assert!(rates.ctr >= 0.0 && rates.ctr <= 1.0);
        assert!(rates.cr >= 0.0 && rates.cr <= 1.0);
    }

    #[test]
    fn theme_round_trips_and_rejects_unknown() {
        assert_eq!("dark".parse::<Theme>(), Ok(Theme::Dark));
        assert_eq!("light".parse::<Theme>(), Ok(Theme::Light));
        assert!("solarized".parse::<Theme>().is_err());
        assert_eq!(Theme::Dark.toggled(), Theme::Light);
        assert_eq!(Theme::Light.toggled(), Theme::Dark);
        assert_eq!(Theme::default(), Theme::Dark);
    }
}
