use crate::error::{AppError, Result};

/// Timeline entries included in a snapshot (and shown by views).
pub const TIMELINE_TAIL_LEN: usize = 6;

/// Simulation tick period (seconds) unless overridden via SIM_TICK_SECS.
pub const SIM_TICK_SECS: u64 = 4;

/// Probability that a tick's revenue is discounted, unless overridden via
/// SIM_DISCOUNT_PROBABILITY.
pub const SIM_DISCOUNT_PROBABILITY: f64 = 0.1;

/// Per-tick delta ranges (all inclusive).
pub mod sim_deltas {
    pub const IMPRESSIONS_MIN: u64 = 5;
    pub const IMPRESSIONS_MAX: u64 = 24;
    pub const CLICKS_MAX: u64 = 7;
    pub const CONVERSIONS_MAX: u64 = 2;

    /// Probability that a tick produces any conversions at all.
    pub const CONVERSION_PROBABILITY: f64 = 0.4;

    /// Revenue multiplier applied on discounted ticks.
    pub const DISCOUNT_FACTOR: f64 = 0.9;
}

/// Preference-store key for the view theme.
pub const THEME_KEY: &str = "theme";

/// Seed catalog and metrics the store starts from.
pub mod seed {
    pub const PRODUCTS: &[(&str, &str, f64, f64)] = &[
        ("Apex Wireless Headphones", "Audio", 199.99, 12.0),
        ("Nova Fitness Band", "Wearables", 99.0, 8.5),
    ];

    pub const IMPRESSIONS: u64 = 1200;
    pub const CLICKS: u64 = 210;
    pub const CONVERSIONS: u64 = 42;
    pub const REVENUE: f64 = 4200.0;
}

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub db_path: String,
    pub api_port: u16,
    /// Simulation tick period in seconds (SIM_TICK_SECS).
    pub sim_tick_secs: u64,
    /// Probability of the revenue discount branch (SIM_DISCOUNT_PROBABILITY).
    pub sim_discount_probability: f64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            db_path: std::env::var("DB_PATH").unwrap_or_else(|_| "adpulse.db".to_string()),
            api_port: std::env::var("API_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse::<u16>()
                .map_err(|_| AppError::Config("API_PORT must be a valid port number".to_string()))?,
            sim_tick_secs: std::env::var("SIM_TICK_SECS")
                .unwrap_or_else(|_| SIM_TICK_SECS.to_string())
                .parse::<u64>()
                .ok()
                .filter(|&secs| secs > 0)
                .ok_or_else(|| {
                    AppError::Config("SIM_TICK_SECS must be a positive integer".to_string())
                })?,
            sim_discount_probability: std::env::var("SIM_DISCOUNT_PROBABILITY")
                .ok()
                .and_then(|v| v.parse::<f64>().ok())
                .unwrap_or(SIM_DISCOUNT_PROBABILITY)
                .clamp(0.0, 1.0),
        })
    }
}
