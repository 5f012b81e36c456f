//! API router.
//!
//! Returns a composable `Router` that can be mounted on any axum
//! server. Auth endpoints and the health check are unprotected; every
//! emergency endpoint sits behind the bearer-token middleware. The
//! WebSocket route authenticates itself via query token.
//!
//! Middleware uses `Extension<ApiContext>` (injected as the outermost
//! layer). Endpoint handlers use `State<ApiContext>` (via `with_state`).

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;
use crate::api::websocket;

/// Build the full API router around a shared `ApiContext`.
pub fn app_router(ctx: ApiContext) -> Router {
    build_router(ctx)
}

/// Build router from a pre-constructed `ApiContext`.
///
/// Used by integration tests that need the shared context (e.g. to
/// inspect the broadcast hub directly).
#[cfg(test)]
pub(crate) fn app_router_with_ctx(ctx: ApiContext) -> Router {
    build_router(ctx)
}

fn build_router(ctx: ApiContext) -> Router {
    // Protected routes. Extension must be outermost so the auth
    // middleware can extract ApiContext.
    //
    // NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
    let protected = Router::new()
        .route("/emergency/trigger", post(endpoints::emergency::trigger))
        .route("/emergency/status", post(endpoints::emergency::update_status))
        .route("/emergency/active", get(endpoints::emergency::active))
        .route(
            "/emergency/resolve/:alert_id",
            post(endpoints::emergency::resolve),
        )
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::auth::require_auth))
        .layer(axum::Extension(ctx.clone()));

    // Unprotected routes (no bearer token yet at this point in the flow)
    let unprotected = Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/auth/otp", post(endpoints::auth::request_otp))
        .route("/auth/check-user", post(endpoints::auth::check_user))
        .route("/auth/login", post(endpoints::auth::login))
        .route("/auth/register", post(endpoints::auth::register))
        .with_state(ctx.clone());

    // WebSocket upgrade route (query-token auth)
    let ws_routes = Router::new()
        .route("/emergency/ws/:client_id", get(websocket::ws_upgrade))
        .with_state(ctx);

    Router::new()
        .merge(protected)
        .merge(unprotected)
        .merge(ws_routes)
        .layer(CorsLayer::permissive())
}
