use axum::{extract::State, routing::post, Json, Router};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::AppError,
    middleware::auth::{Claims, Role},
    state::{AppState, AuthConfig},
};

#[derive(Debug, Serialize)]
struct AuthResponse {
    token: String,
    subject: String,
    expires_in: u64,
}

#[derive(Debug, Deserialize)]
struct AdminLoginRequest {
    api_key: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/guest", post(login_guest))
        .route("/admin", post(login_admin))
}

/// Mint an HS256 token. Shared by the login endpoints and the tests.
pub fn issue_token(
    auth: &AuthConfig,
    sub: impl Into<String>,
    email: Option<String>,
    role: Role,
) -> Result<String, AppError> {
    let claims = Claims {
        sub: sub.into(),
        email,
        role,
        exp: (Utc::now() + Duration::seconds(auth.expiration as i64)).timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(auth.secret.as_bytes()),
    )
    .map_err(|e| AppError::internal(format!("Token encoding failed: {}", e)))
}

async fn login_guest(State(state): State<AppState>) -> Result<Json<AuthResponse>, AppError> {
    let subject = format!("guest-{}", Uuid::new_v4());
    let token = issue_token(&state.auth, subject.clone(), None, Role::Customer)?;

    Ok(Json(AuthResponse {
        token,
        subject,
        expires_in: state.auth.expiration,
    }))
}

async fn login_admin(
    State(state): State<AppState>,
    Json(req): Json<AdminLoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    if state.auth.admin_api_key.is_empty() {
        return Err(AppError::Authorization("Admin login is disabled".into()));
    }
    if req.api_key != state.auth.admin_api_key {
        tracing::warn!("Rejected admin login attempt");
        return Err(AppError::Authentication("Invalid API key".into()));
    }

    let subject = "admin".to_string();
    let token = issue_token(&state.auth, subject.clone(), None, Role::Admin)?;

    Ok(Json(AuthResponse {
        token,
        subject,
        expires_in: state.auth.expiration,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{decode, DecodingKey, Validation};

    #[test]
    fn test_issue_token_round_trips_claims() {
        let auth = AuthConfig {
            secret: "secret".into(),
            expiration: 60,
            admin_api_key: String::new(),
        };
        let token = issue_token(&auth, "guest-1", Some("a@b.com".into()), Role::Customer).unwrap();

        let data = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(b"secret"),
            &Validation::default(),
        )
        .unwrap();
        assert_eq!(data.claims.sub, "guest-1");
        assert_eq!(data.claims.role, Role::Customer);
        assert_eq!(data.claims.email.as_deref(), Some("a@b.com"));
    }
}
