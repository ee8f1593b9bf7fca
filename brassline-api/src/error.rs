use axum::{
    body::Body,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use brassline_catalog::{CatalogError, PricingError};
use brassline_core::RepositoryError;
use brassline_offer::{DiscountRejection, OfferValidationError};
use brassline_order::{CartError, OrderError};
use serde_json::json;

use crate::state::AppState;

const INTERNAL_MESSAGE: &str = "Internal Server Error";

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Authentication(String),

    #[error("{0}")]
    Authorization(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    PayloadTooLarge(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Attached to 500 responses so the detail middleware can expose it in
/// development.
#[derive(Debug, Clone)]
struct InternalDetail(String);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Authentication(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Authorization(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, msg),
            AppError::Internal(err) => {
                tracing::error!("Internal Server Error: {:#}", err);
                let mut response = (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": INTERNAL_MESSAGE })),
                )
                    .into_response();
                response
                    .extensions_mut()
                    .insert(InternalDetail(format!("{:#}", err)));
                return response;
            }
        };

        (status, Json(json!({ "error": error_message }))).into_response()
    }
}

impl AppError {
    pub fn internal(msg: impl Into<String>) -> Self {
        AppError::Internal(anyhow::anyhow!(msg.into()))
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { .. } => AppError::NotFound(err.to_string()),
            RepositoryError::Conflict { .. } => AppError::Conflict(err.to_string()),
            RepositoryError::Serialization(_) | RepositoryError::Backend(_) => {
                AppError::Internal(err.into())
            }
        }
    }
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<PricingError> for AppError {
    fn from(err: PricingError) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<DiscountRejection> for AppError {
    fn from(err: DiscountRejection) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<OfferValidationError> for AppError {
    fn from(err: OfferValidationError) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<CartError> for AppError {
    fn from(err: CartError) -> Self {
        match err {
            CartError::ItemNotFound(_) => AppError::NotFound(err.to_string()),
            CartError::Empty => AppError::Validation(err.to_string()),
            CartError::Pricing(e) => e.into(),
            CartError::Discount(e) => e.into(),
        }
    }
}

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::InvalidTransition { .. } => AppError::Conflict(err.to_string()),
            OrderError::EmptyCart | OrderError::InvalidAddress(_) => {
                AppError::Validation(err.to_string())
            }
        }
    }
}

/// Outside development the internal detail is dropped; in development it is
/// merged into the JSON body under `"detail"`.
pub async fn attach_error_detail(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let mut response = next.run(req).await;
    let detail = response.extensions_mut().remove::<InternalDetail>();

    match detail {
        Some(InternalDetail(detail)) if state.development => {
            let (mut parts, _) = response.into_parts();
            parts.headers.remove(axum::http::header::CONTENT_LENGTH);
            let body = json!({ "error": INTERNAL_MESSAGE, "detail": detail });
            Response::from_parts(parts, Body::from(body.to_string()))
        }
        _ => response,
    }
}
