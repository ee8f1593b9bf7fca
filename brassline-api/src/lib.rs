use axum::{http::Method, middleware::from_fn_with_state, routing::get, Json, Router};
use brassline_catalog::{Category, Finish, Material, Product};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod analytics;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod error;
pub mod middleware;
pub mod offers;
pub mod orders;
pub mod state;
pub mod tracking;
pub mod uploads;
pub mod worker;

pub use state::{AppState, AuthConfig, Repositories};

pub fn app(state: AppState) -> Router {
    // Outermost, so error responses carry CORS headers too
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::USER_AGENT,
            axum::http::HeaderName::from_static(tracking::VISITOR_HEADER),
            axum::http::HeaderName::from_static(analytics::CRON_SECRET_HEADER),
        ]);

    Router::new()
        .route("/health", get(health))
        .nest("/api/auth", auth::routes())
        .nest("/api/categories", catalog::collection_routes::<Category>(&state))
        .nest("/api/products", catalog::collection_routes::<Product>(&state))
        .nest("/api/materials", catalog::collection_routes::<Material>(&state))
        .nest("/api/finishes", catalog::collection_routes::<Finish>(&state))
        .nest("/api/configurations", catalog::configuration_routes(&state))
        .nest("/api/cart", cart::routes(&state))
        .nest("/api/orders", orders::routes(&state))
        .nest("/api/offers", offers::routes(&state))
        .nest("/api/analytics", analytics::routes(&state))
        .nest("/api/cron", analytics::cron_routes())
        .nest("/api/uploads", uploads::routes(&state))
        .layer(from_fn_with_state(state.clone(), tracking::track_visits))
        .layer(from_fn_with_state(state.clone(), error::attach_error_detail))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
