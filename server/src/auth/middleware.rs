//! Authentication Middleware

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::api::AppState;

use super::error::AuthError;
use super::jwt::validate_access_token;

/// Header carrying the shared secret for the internal surface.
pub const INTERNAL_TOKEN_HEADER: &str = "x-internal-token";

/// Authenticated user injected into request extensions.
///
/// User accounts live on the escrow platform; the token subject is all the
/// identity this service needs.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    /// User ID.
    pub id: Uuid,
}

/// Middleware to require authentication.
///
/// Extracts the Bearer token from the Authorization header, validates the
/// JWT, and injects `AuthUser` into request extensions.
///
/// # Usage
///
/// Apply to routes that require authentication:
/// ```ignore
/// Router::new()
///     .route("/protected", get(handler))
///     .layer(axum::middleware::from_fn_with_state(state, require_auth))
/// ```
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(AuthError::MissingAuthHeader)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(AuthError::InvalidAuthHeader)?;

    let claims = validate_access_token(token, &state.config.jwt_secret)?;

    let user_id: Uuid = claims.sub.parse().map_err(|_| AuthError::InvalidToken)?;

    request.extensions_mut().insert(AuthUser { id: user_id });

    Ok(next.run(request).await)
}

/// Middleware guarding the internal surface.
///
/// Platform services and compliance tooling authenticate with the shared
/// `x-internal-token` header. Requests fail closed when no internal token is
/// configured.
pub async fn require_internal(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let expected = state
        .config
        .internal_api_token
        .as_deref()
        .ok_or(AuthError::InvalidInternalToken)?;

    let presented = request
        .headers()
        .get(INTERNAL_TOKEN_HEADER)
        .and_then(|h| h.to_str().ok())
        .ok_or(AuthError::InvalidInternalToken)?;

    if presented != expected {
        return Err(AuthError::InvalidInternalToken);
    }

    Ok(next.run(request).await)
}

/// Extractor for the authenticated user in handlers.
///
/// ```ignore
/// async fn protected_handler(auth: AuthUser) -> impl IntoResponse {
///     format!("Hello, {}!", auth.id)
/// }
/// ```
impl<S> axum::extract::FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .copied()
            .ok_or(AuthError::MissingAuthHeader)
    }
}
