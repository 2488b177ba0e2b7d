mod api;
mod config;
mod db;
mod error;
mod sim;
mod state;
mod types;

use std::sync::Arc;

use sqlx::sqlite::SqliteConnectOptions;
use sqlx::SqlitePool;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::api::health::HealthState;
use crate::api::routes::{router, ApiState};
use crate::config::Config;
use crate::db::ThemeStore;
use crate::error::Result;
use crate::sim::Simulator;
use crate::state::CampaignStore;

#[tokio::main]
async fn main() {
    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .init();

    if let Err(e) = run(cfg).await {
        error!("Fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run(cfg: Config) -> Result<()> {
    // --- Database setup (theme preference only) ---
    let options = SqliteConnectOptions::new()
        .filename(&cfg.db_path)
        .create_if_missing(true);
    let pool = SqlitePool::connect_with(options).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Database ready at {}", cfg.db_path);

    let prefs = ThemeStore::new(pool);
    let theme = prefs.load().await?;
    info!("Theme preference: {theme}");

    // --- In-memory campaign store ---
    let store = CampaignStore::with_demo_seed();
    info!(
        products = store.product_count(),
        "Campaign store seeded: {} products, metrics primed",
        store.product_count(),
    );

    let health = Arc::new(HealthState::new());

    // --- Simulation ticker (background, every SIM_TICK_SECS) ---
    let simulator = Simulator::new(cfg.clone(), Arc::clone(&store), Arc::clone(&health));
    tokio::spawn(async move { simulator.run().await });
    info!(
        tick_secs = cfg.sim_tick_secs,
        discount_probability = cfg.sim_discount_probability,
        "Simulation ticker started",
    );

    // --- HTTP API server ---
    let api_state = ApiState { store, health, prefs };
    let app = router(api_state);
    let bind_addr = format!("0.0.0.0:{}", cfg.api_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("HTTP API listening on {bind_addr}");

    axum::serve(listener, app).await?;

    Ok(())
}
