use axum::{
    extract::State,
    middleware,
    routing::get,
    Json, Router,
};
use brassline_offer::{Discount, Offer};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    catalog::{create_document, delete_document, get_document, list_documents, update_document},
    error::AppError,
    middleware::require_admin,
    state::AppState,
};

/// What the storefront may show about a running promotion. Codes stay
/// private.
#[derive(Debug, Serialize)]
pub struct PromotionSummary {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub discount: Discount,
    pub min_order_pence: i64,
    pub ends_at: Option<DateTime<Utc>>,
}

pub fn routes(state: &AppState) -> Router<AppState> {
    let admin = Router::new()
        .route("/", get(list_documents::<Offer>).post(create_document::<Offer>))
        .route(
            "/{id}",
            get(get_document::<Offer>)
                .put(update_document::<Offer>)
                .patch(update_document::<Offer>)
                .delete(delete_document::<Offer>),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));

    Router::new()
        .route("/active", get(active_promotions))
        .merge(admin)
}

/// GET /api/offers/active
pub async fn active_promotions(
    State(state): State<AppState>,
) -> Result<Json<Vec<PromotionSummary>>, AppError> {
    let now = Utc::now();
    let promotions = state
        .repos
        .offers
        .list()
        .await?
        .into_iter()
        .filter(|o| {
            o.is_active
                && o.auto_apply
                && o.has_started(now)
                && !o.has_ended(now)
                && !o.usage_exhausted()
        })
        .map(|o| PromotionSummary {
            id: o.id,
            name: o.name,
            description: o.description,
            discount: o.discount,
            min_order_pence: o.min_order_pence,
            ends_at: o.ends_at,
        })
        .collect();

    Ok(Json(promotions))
}
