//! Authentication middleware
//!
//! JWT authentication and role-based access control middleware

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::AppState;
use shared::UserType;

/// Authenticated user information extracted from JWT
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub user_type: UserType,
}

impl AuthUser {
    /// Fails with 403 unless the user has one of `allowed`
    pub fn require(&self, allowed: &[UserType]) -> AppResult<()> {
        if shared::is_allowed(self.user_type, allowed) {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "You are not allowed to perform this action".to_string(),
            ))
        }
    }
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub user_type: UserType,
    pub exp: i64,
    pub iat: i64,
}

/// Decode and validate a JWT access token
pub fn decode_jwt(token: &str, secret: &str) -> AppResult<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| AppError::Unauthorized(format!("Invalid token: {}", e)))
}

fn bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Resolve a token to a live account
///
/// Blocked accounts are rejected even while their token is unexpired, and the
/// role is read from the database so a role change takes effect immediately.
async fn authenticate(state: &AppState, token: &str) -> AppResult<AuthUser> {
    let claims = decode_jwt(token, &state.config.jwt.secret)?;

    let user_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| AppError::Unauthorized("Invalid user ID in token".to_string()))?;

    let (user_type, is_deleted) = sqlx::query_as::<_, (String, bool)>(
        "SELECT user_type, is_deleted FROM users WHERE id = $1",
    )
    .bind(user_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::Unauthorized("User no longer exists".to_string()))?;

    if is_deleted {
        return Err(AppError::Unauthorized("Account is blocked".to_string()));
    }

    let user_type = user_type
        .parse::<UserType>()
        .map_err(AppError::Internal)?;

    Ok(AuthUser { user_id, user_type })
}

/// Authentication middleware that validates JWT tokens
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = match bearer_token(&request) {
        Some(token) => token.to_string(),
        None => {
            return AppError::Unauthorized("Missing or invalid Authorization header".to_string())
                .into_response()
        }
    };

    match authenticate(&state, &token).await {
        Ok(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}

/// Like [`auth_middleware`], but lets anonymous requests through
///
/// A request without an Authorization header continues unauthenticated; a
/// request that sends a bad token is still rejected.
pub async fn optional_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = match bearer_token(&request) {
        Some(token) => token.to_string(),
        None => return next.run(request).await,
    };

    match authenticate(&state, &token).await {
        Ok(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}

/// Extractor for authenticated user
/// Use this in handlers to get the current user
#[derive(Clone, Debug)]
pub struct CurrentUser(pub AuthUser);

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))
    }
}

/// Extractor for routes behind [`optional_auth_middleware`]
#[derive(Clone, Debug)]
pub struct MaybeUser(pub Option<AuthUser>);

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(parts.extensions.get::<AuthUser>().cloned()))
    }
}
