use axum::{
    extract::{Query, State},
    http::HeaderMap,
    middleware,
    routing::get,
    Json, Router,
};
use brassline_core::analytics::{aggregate_day, day_bounds, summarize};
use brassline_core::{AnalyticsSummary, DailySnapshot};
use chrono::{Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{error::AppError, middleware::require_admin, state::AppState};

pub const CRON_SECRET_HEADER: &str = "x-cron-secret";

/// Snapshots returned alongside the live summary.
const RECENT_SNAPSHOTS: usize = 30;

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub summary: AnalyticsSummary,
    pub snapshots: Vec<DailySnapshot>,
}

#[derive(Debug, Deserialize)]
pub struct CronQuery {
    pub token: Option<String>,
    pub date: Option<NaiveDate>,
}

pub fn routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/summary", get(summary))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin))
}

pub fn cron_routes() -> Router<AppState> {
    Router::new().route("/analytics", get(run_daily_aggregation).post(run_daily_aggregation))
}

/// GET /api/analytics/summary
pub async fn summary(State(state): State<AppState>) -> Result<Json<SummaryResponse>, AppError> {
    let orders = state.repos.orders.list_orders(None).await?;
    let visits = state.repos.visits.count_visits().await?;
    let snapshots = state.repos.snapshots.list_snapshots(RECENT_SNAPSHOTS).await?;

    Ok(Json(SummaryResponse {
        summary: summarize(&orders, visits),
        snapshots,
    }))
}

/// The shared secret may arrive as `?token=` or in the `x-cron-secret` header.
fn authorize_cron(state: &AppState, headers: &HeaderMap, token: Option<&str>) -> Result<(), AppError> {
    let presented = token.or_else(|| {
        headers
            .get(CRON_SECRET_HEADER)
            .and_then(|v| v.to_str().ok())
    });

    match presented {
        Some(secret) if !state.cron_secret.is_empty() && secret == state.cron_secret => Ok(()),
        _ => Err(AppError::Authentication("Invalid cron token".into())),
    }
}

/// GET|POST /api/cron/analytics
/// Aggregates one UTC day (yesterday unless `?date=` is given). Re-running
/// a day replaces its snapshot.
pub async fn run_daily_aggregation(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<CronQuery>,
) -> Result<Json<DailySnapshot>, AppError> {
    authorize_cron(&state, &headers, query.token.as_deref())?;

    let today = Utc::now().date_naive();
    let date = query
        .date
        .unwrap_or_else(|| today.checked_sub_days(Days::new(1)).unwrap_or(today));
    let (from, to) = day_bounds(date);

    let visits = state.repos.visits.list_visits_between(from, to).await?;
    let orders = state.repos.orders.list_orders_between(from, to).await?;
    let snapshot = aggregate_day(date, &visits, &orders);
    state.repos.snapshots.save_snapshot(&snapshot).await?;

    tracing::info!(
        "Analytics snapshot for {}: {} visits, {} orders, {}p revenue",
        snapshot.date,
        snapshot.visits,
        snapshot.orders,
        snapshot.revenue_pence
    );
    Ok(Json(snapshot))
}
