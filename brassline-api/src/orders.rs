use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware,
    routing::{get, post, put},
    Extension, Json, Router,
};
use brassline_order::{Order, OrderStatus, ShippingAddress};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    cart::{load_cart, load_evaluator},
    error::AppError,
    middleware::{require_admin, require_auth, Claims},
    state::AppState,
};

// ============================================================================
// Request Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct PlaceOrderRequest {
    pub customer_email: Option<String>,
    pub shipping_address: ShippingAddress,
}

#[derive(Debug, Deserialize)]
pub struct RefundRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: OrderStatus,
    pub note: Option<String>,
}

pub fn routes(state: &AppState) -> Router<AppState> {
    let customer = Router::new()
        .route("/", get(list_orders).post(place_order))
        .route("/{id}", get(get_order))
        .route("/{id}/refund", post(request_refund))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let admin = Router::new()
        .route("/{id}/status", put(update_status))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));

    customer.merge(admin)
}

/// Fetch an order the caller may see. Other customers' orders read as
/// missing.
async fn visible_order(state: &AppState, claims: &Claims, id: Uuid) -> Result<Order, AppError> {
    state
        .repos
        .orders
        .get_order(id)
        .await?
        .filter(|order| claims.is_admin() || order.belongs_to(&claims.sub))
        .ok_or_else(|| AppError::NotFound(format!("Order {} not found", id)))
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/orders
/// Checkout: snapshot the caller's cart into a pending order
pub async fn place_order(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<PlaceOrderRequest>,
) -> Result<(StatusCode, Json<Order>), AppError> {
    let now = Utc::now();

    let mut cart = load_cart(&state, &claims.sub).await?;
    let evaluator = load_evaluator(&state).await?;
    cart.reprice(&evaluator, &state.rules, now);

    let email = req.customer_email.or_else(|| claims.email.clone());
    let order = state.orders.place_order(&cart, email, req.shipping_address)?;
    state.repos.orders.create_order(&order).await?;

    for applied in order.applied_discounts.iter().filter(|d| d.amount_pence > 0) {
        if let Some(mut offer) = state.repos.offers.get(applied.offer_id).await? {
            offer.record_use();
            if let Err(e) = state.repos.offers.update(&offer).await {
                tracing::warn!("Failed to record use of offer {}: {}", offer.id, e);
            }
        }
    }

    state.repos.carts.delete_cart(&claims.sub).await?;

    tracing::info!(
        "Order {} placed by {} for {}p",
        order.order_number,
        order.customer_id,
        order.totals.total_pence
    );
    Ok((StatusCode::CREATED, Json(order)))
}

/// GET /api/orders
/// Customers see their own orders, admins see every order
pub async fn list_orders(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<Order>>, AppError> {
    let customer = (!claims.is_admin()).then_some(claims.sub.as_str());
    Ok(Json(state.repos.orders.list_orders(customer).await?))
}

/// GET /api/orders/{id}
pub async fn get_order(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, AppError> {
    Ok(Json(visible_order(&state, &claims, id).await?))
}

/// POST /api/orders/{id}/refund
pub async fn request_refund(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(req): Json<RefundRequest>,
) -> Result<Json<Order>, AppError> {
    let mut order = visible_order(&state, &claims, id).await?;
    if !order.belongs_to(&claims.sub) {
        return Err(AppError::Authorization(
            "Only the customer can request a refund".into(),
        ));
    }

    state.orders.request_refund(&mut order, &claims.sub, req.reason)?;
    state.repos.orders.update_order(&order).await?;

    tracing::info!("Refund requested for order {}", order.order_number);
    Ok(Json(order))
}

/// PUT /api/orders/{id}/status
pub async fn update_status(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(req): Json<StatusUpdateRequest>,
) -> Result<Json<Order>, AppError> {
    let mut order = visible_order(&state, &claims, id).await?;
    let from = order.status;

    state
        .orders
        .set_status(&mut order, req.status, &claims.sub, req.note)?;
    state.repos.orders.update_order(&order).await?;

    tracing::info!(
        "Order {} moved {} -> {} by {}",
        order.order_number,
        from,
        order.status,
        claims.sub
    );
    Ok(Json(order))
}
