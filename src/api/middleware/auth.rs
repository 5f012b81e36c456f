//! Bearer token authentication middleware.
//!
//! Extracts `Authorization: Bearer <token>`, verifies the signature and
//! expiry, loads the identity by the embedded phone, enforces the
//! single-active-session rule, and injects `CurrentUser` into request
//! extensions for downstream handlers.

use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, CurrentUser};
use crate::auth::verify_token;
use crate::db::repository::identity;

/// Require a valid bearer token bound to the identity's current session.
///
/// Accesses `ApiContext` from request extensions (injected by the
/// Extension layer). On success: injects `CurrentUser`.
pub async fn require_auth(req: Request<axum::body::Body>, next: Next) -> Response {
    match require_auth_inner(req, next).await {
        Ok(resp) => resp,
        Err(err) => err.into_response(),
    }
}

async fn require_auth_inner(
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let ctx: ApiContext = req
        .extensions()
        .get::<ApiContext>()
        .cloned()
        .ok_or(ApiError::Internal("missing API context".into()))?;

    let token = req
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(ApiError::Unauthenticated)?
        .to_string();

    let claims = verify_token(ctx.token_secret(), &token)?;

    let conn = ctx.open_db()?;
    let user = identity::find_by_phone(&conn, &claims.sub)?
        .ok_or(ApiError::Unauthenticated)?;

    // Single active session: a token carrying a session id is rejected
    // once a newer login has stored a different id on the identity.
    if let Some(sid) = &claims.sid {
        if user.session_id.as_deref() != Some(sid.as_str()) {
            return Err(ApiError::SessionSuperseded);
        }
    }

    req.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(req).await)
}
