use axum::{
    extract::{Path, State},
    middleware,
    routing::{get, post, put},
    Extension, Json, Router,
};
use brassline_catalog::ItemSelection;
use brassline_offer::DiscountEvaluator;
use brassline_order::{Cart, CartItem};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    catalog::resolve_selection,
    error::AppError,
    middleware::{require_auth, Claims},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct UpdateQuantityRequest {
    pub quantity: u32,
}

#[derive(Debug, Deserialize)]
pub struct ApplyCodeRequest {
    pub code: String,
}

pub fn routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(get_cart).delete(clear_cart))
        .route("/items", post(add_item))
        .route("/items/{item_id}", put(update_item).delete(remove_item))
        .route("/code", post(apply_code).delete(remove_code))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
}

/// Built from every stored offer; eligibility is the evaluator's job.
pub async fn load_evaluator(state: &AppState) -> Result<DiscountEvaluator, AppError> {
    Ok(DiscountEvaluator::new(state.repos.offers.list().await?))
}

pub async fn load_cart(state: &AppState, owner: &str) -> Result<Cart, AppError> {
    Ok(state
        .repos
        .carts
        .get_cart(owner)
        .await?
        .unwrap_or_else(|| Cart::new(owner)))
}

/// Reprice against the current offers and persist.
async fn reprice_and_save(state: &AppState, cart: &mut Cart) -> Result<(), AppError> {
    let evaluator = load_evaluator(state).await?;
    cart.reprice(&evaluator, &state.rules, Utc::now());
    state.repos.carts.save_cart(cart).await?;
    Ok(())
}

/// GET /api/cart
pub async fn get_cart(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Cart>, AppError> {
    let mut cart = load_cart(&state, &claims.sub).await?;
    let evaluator = load_evaluator(&state).await?;
    cart.reprice(&evaluator, &state.rules, Utc::now());
    Ok(Json(cart))
}

/// POST /api/cart/items
pub async fn add_item(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(selection): Json<ItemSelection>,
) -> Result<Json<Cart>, AppError> {
    let (product, config) = resolve_selection(&state, &selection).await?;
    let price = state.pricing.price(&config)?;

    let mut cart = load_cart(&state, &claims.sub).await?;
    let item = CartItem::new(product.name, product.category_id, selection, config, price);
    cart.add_item(item, &state.pricing)?;

    reprice_and_save(&state, &mut cart).await?;
    Ok(Json(cart))
}

/// PUT /api/cart/items/{item_id}
pub async fn update_item(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(item_id): Path<Uuid>,
    Json(req): Json<UpdateQuantityRequest>,
) -> Result<Json<Cart>, AppError> {
    let mut cart = load_cart(&state, &claims.sub).await?;
    cart.update_quantity(item_id, req.quantity, &state.pricing)?;

    reprice_and_save(&state, &mut cart).await?;
    Ok(Json(cart))
}

/// DELETE /api/cart/items/{item_id}
pub async fn remove_item(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(item_id): Path<Uuid>,
) -> Result<Json<Cart>, AppError> {
    let mut cart = load_cart(&state, &claims.sub).await?;
    cart.remove_item(item_id)?;

    reprice_and_save(&state, &mut cart).await?;
    Ok(Json(cart))
}

/// DELETE /api/cart
pub async fn clear_cart(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Cart>, AppError> {
    let mut cart = load_cart(&state, &claims.sub).await?;
    cart.clear();

    reprice_and_save(&state, &mut cart).await?;
    Ok(Json(cart))
}

/// POST /api/cart/code
pub async fn apply_code(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<ApplyCodeRequest>,
) -> Result<Json<Cart>, AppError> {
    let mut cart = load_cart(&state, &claims.sub).await?;
    let evaluator = load_evaluator(&state).await?;

    if let Err(e) = cart.apply_code(&req.code, &evaluator, &state.rules, Utc::now()) {
        tracing::warn!("Rejected discount code for {}: {}", claims.sub, e);
        return Err(e.into());
    }

    state.repos.carts.save_cart(&cart).await?;
    Ok(Json(cart))
}

/// DELETE /api/cart/code
pub async fn remove_code(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Cart>, AppError> {
    let mut cart = load_cart(&state, &claims.sub).await?;
    let evaluator = load_evaluator(&state).await?;
    cart.remove_code(&evaluator, &state.rules, Utc::now());

    state.repos.carts.save_cart(&cart).await?;
    Ok(Json(cart))
}
