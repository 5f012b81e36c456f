//! WebSocket layer for real-time alert delivery to caretaker and
//! patient clients.
//!
//! Connection lifecycle:
//! 1. Client opens `GET /emergency/ws/:client_id?token=xxx`
//! 2. Token signature, expiry and session are checked before upgrade
//! 3. The connection is registered with the broadcast hub; a sender
//!    task forwards hub payloads to the socket
//! 4. Incoming frames are treated as keep-alive only; the receive loop
//!    unregisters the connection when the client goes away

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::auth::verify_token;
use crate::db::repository::identity;
use crate::emergency::hub::{BroadcastHub, CONNECTION_BUFFER};

/// Query parameters for WebSocket upgrade.
#[derive(Deserialize)]
pub struct WsAuthQuery {
    token: String,
}

/// WebSocket upgrade handler.
///
/// The bearer token is carried in the query string because browser
/// WebSocket clients cannot set an Authorization header. The same
/// session check as the HTTP middleware applies before upgrading.
pub async fn ws_upgrade(
    ws: WebSocketUpgrade,
    State(ctx): State<ApiContext>,
    Path(client_id): Path<String>,
    Query(query): Query<WsAuthQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let claims = verify_token(ctx.token_secret(), &query.token)?;

    let conn = ctx.open_db()?;
    let user = identity::find_by_phone(&conn, &claims.sub)?
        .ok_or(ApiError::Unauthenticated)?;
    if let Some(sid) = &claims.sid {
        if user.session_id.as_deref() != Some(sid.as_str()) {
            return Err(ApiError::SessionSuperseded);
        }
    }

    tracing::info!(user_id = user.id, %client_id, "WebSocket upgrade accepted");
    let hub = ctx.hub.clone();
    Ok(ws.on_upgrade(move |socket| handle_ws(socket, hub, client_id)))
}

/// Main WebSocket connection handler.
///
/// Spawns a sender task for channel to socket forwarding, then runs the
/// receive loop until the client disconnects. Incoming text frames are
/// discarded: clients only listen on this socket.
async fn handle_ws(socket: WebSocket, hub: Arc<BroadcastHub>, client_id: String) {
    let (ws_sink, mut ws_stream) = socket.split();
    let (tx, rx) = mpsc::channel::<String>(CONNECTION_BUFFER);

    let conn_id = hub.register(tx);

    // Sender task: reads serialized events from the hub's channel and
    // writes them to the socket. Exits once the hub drops the sender.
    let sender_handle = tokio::spawn(async move {
        let mut sink = ws_sink;
        let mut rx = rx;
        while let Some(payload) = rx.recv().await {
            if sink.send(Message::Text(payload)).await.is_err() {
                break;
            }
        }
        let _ = sink.close().await;
    });

    loop {
        match ws_stream.next().await {
            Some(Ok(Message::Close(_))) | None => break,
            Some(Err(_)) => break,
            // Keep-alive and client acks carry no meaning here
            Some(Ok(_)) => {}
        }
    }

    hub.unregister(conn_id);
    tracing::debug!(%client_id, conn_id, "WebSocket disconnected");
    let _ = sender_handle.await;
}
