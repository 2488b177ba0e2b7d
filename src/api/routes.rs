use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::health::HealthState;
use crate::config::TIMELINE_TAIL_LEN;
use crate::db::ThemeStore;
use crate::error::AppError;
use crate::state::CampaignStore;
use crate::types::{Product, ProductDraft, Snapshot, Theme, TimelineEntry};

#[derive(Clone)]
pub struct ApiState {
    pub store: Arc<CampaignStore>,
    pub health: Arc<HealthState>,
    pub prefs: ThemeStore,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/snapshot", get(get_snapshot))
        .route("/products", get(get_products).post(add_product))
        .route("/products/:id", get(get_product))
        .route("/timeline", get(get_timeline))
        .route("/theme", get(get_theme).put(put_theme))
        .route("/health", get(get_health))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Query param structs
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct TimelineQuery {
    pub limit: Option<usize>,
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct ThemeResponse {
    pub theme: Theme,
}

/// Raw theme intent from the view. Kept as a string so an unknown value
/// maps to a 400 instead of a deserialization rejection.
#[derive(Deserialize)]
pub struct ThemeUpdate {
    pub theme: String,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub sim_ticks: u64,
    pub last_tick_at_ns: u64,
    pub products_tracked: usize,
    pub timeline_len: usize,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn get_snapshot(State(state): State<ApiState>) -> Json<Snapshot> {
    Json(state.store.snapshot())
}

async fn get_products(State(state): State<ApiState>) -> Json<Vec<Product>> {
    Json(state.store.products())
}

async fn add_product(
    State(state): State<ApiState>,
    Json(draft): Json<ProductDraft>,
) -> Result<(StatusCode, Json<Product>), AppError> {
    let product = state.store.add_product(&draft)?;
    info!(
        product_id = %product.id,
        name = %product.name,
        category = %product.category,
        "Product added",
    );
    Ok((StatusCode::CREATED, Json(product)))
}

async fn get_product(
    State(state): State<ApiState>,
    Path(product_id): Path<String>,
) -> Result<Json<Product>, AppError> {
    state
        .store
        .get_product(&product_id)
        .map(Json)
        .ok_or(AppError::ProductNotFound(product_id))
}

async fn get_timeline(
    State(state): State<ApiState>,
    Query(params): Query<TimelineQuery>,
) -> Json<Vec<TimelineEntry>> {
    let limit = params.limit.unwrap_or(TIMELINE_TAIL_LEN);
    Json(state.store.timeline_tail(limit))
}

async fn get_theme(State(state): State<ApiState>) -> Result<Json<ThemeResponse>, AppError> {
    let theme = state.prefs.load().await?;
    Ok(Json(ThemeResponse { theme }))
}

async fn put_theme(
    State(state): State<ApiState>,
    Json(update): Json<ThemeUpdate>,
) -> Result<Json<ThemeResponse>, AppError> {
    let theme: Theme = update.theme.parse().map_err(AppError::Theme)?;
    state.prefs.save(theme).await?;
    info!(theme = %theme, "Theme preference saved");
    Ok(Json(ThemeResponse { theme }))
}

async fn get_health(State(state): State<ApiState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        sim_ticks: state.health.sim_ticks(),
        last_tick_at_ns: state.health.last_tick_at_ns(),
        products_tracked: state.store.product_count(),
        timeline_len: state.store.timeline_len(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;

    async fn test_state() -> ApiState {
        let pool = sqlx::SqlitePool::connect("sqlite::memory:").await.unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();
        ApiState {
            store: CampaignStore::with_demo_seed(),
            health: Arc::new(HealthState::new()),
            prefs: ThemeStore::new(pool),
        }
    }

    fn draft(name: &str, category: &str, price: &str, target_cpa: &str) -> ProductDraft {
        ProductDraft {
            name: name.to_string(),
            category: category.to_string(),
            price: price.to_string(),
            target_cpa: target_cpa.to_string(),
        }
    }

    #[tokio::test]
    async fn snapshot_reflects_seeded_store() {
        let state = test_state().await;
        let Json(snap) = get_snapshot(State(state)).await;

        assert_eq!(snap.products.len(), 2);
        assert_eq!(snap.metrics.impressions, 1200);
        assert!((snap.derived.ctr - 0.175).abs() < 1e-12);
        assert!(snap.timeline.is_empty());
    }

    #[tokio::test]
    async fn add_product_returns_created() {
        let state = test_state().await;
        let before = state.store.product_count();

        let (status, Json(product)) = add_product(
            State(state.clone()),
            Json(draft("Terra Mug", "Kitchen", "24.50", "2.0")),
        )
        .await
        .unwrap();

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(product.name, "Terra Mug");
        assert_eq!(state.store.product_count(), before + 1);
    }

    #[tokio::test]
    async fn invalid_draft_maps_to_422() {
        let state = test_state().await;
        let before = state.store.product_count();

        let err = add_product(
            State(state.clone()),
            Json(draft("Terra Mug", "Kitchen", "cheap", "2.0")),
        )
        .await
        .unwrap_err();

        assert_eq!(err.into_response().status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(state.store.product_count(), before);
    }

    #[tokio::test]
    async fn unknown_product_maps_to_404() {
        let state = test_state().await;
        let err = get_product(State(state), Path("P-99999".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn timeline_defaults_to_tail_length() {
        let state = test_state().await;
        for i in 0..10 {
            state.store.push_timeline(format!("event {i}"));
        }

        let Json(entries) =
            get_timeline(State(state.clone()), Query(TimelineQuery { limit: None })).await;
        assert_eq!(entries.len(), TIMELINE_TAIL_LEN);
        assert_eq!(entries[0].message, "event 9");

        let Json(entries) =
            get_timeline(State(state), Query(TimelineQuery { limit: Some(2) })).await;
        assert_eq!(entries.len(), 2);
    }

    #[tokio::test]
    async fn theme_toggle_round_trips() {
        let state = test_state().await;

        let Json(initial) = get_theme(State(state.clone())).await.unwrap();
        assert_eq!(initial.theme, Theme::Dark);

        let Json(saved) = put_theme(
            State(state.clone()),
            Json(ThemeUpdate { theme: "light".to_string() }),
        )
        .await
        .unwrap();
        assert_eq!(saved.theme, Theme::Light);

        let Json(loaded) = get_theme(State(state)).await.unwrap();
        assert_eq!(loaded.theme, Theme::Light);
    }

    #[tokio::test]
    async fn unknown_theme_maps_to_400() {
        let state = test_state().await;
        let err = put_theme(
            State(state),
            Json(ThemeUpdate { theme: "sepia".to_string() }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn health_reports_store_counters() {
        let state = test_state().await;
        state.health.record_tick(123);
        state.store.push_timeline("tick".to_string());

        let Json(health) = get_health(State(state)).await;
        assert_eq!(health.status, "ok");
        assert_eq!(health.sim_ticks, 1);
        assert_eq!(health.last_tick_at_ns, 123);
        assert_eq!(health.products_tracked, 2);
        assert_eq!(health.timeline_len, 1);
    }
}
