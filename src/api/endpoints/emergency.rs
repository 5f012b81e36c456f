//! Emergency endpoints: trigger, status report, merged active view,
//! and resolve.

use std::str::FromStr;

use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, CurrentUser};
use crate::emergency::orchestrator::{self, TriggerOutcome};
use crate::emergency::visibility::{self, ActiveAlertView};
use crate::models::PatientStatusKind;

#[derive(Serialize)]
pub struct TriggerResponse {
    pub status: &'static str,
    pub alert_id: i64,
}

#[derive(Deserialize)]
pub struct StatusRequest {
    pub status: String,
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    pub current_status: PatientStatusKind,
}

#[derive(Serialize)]
pub struct ResolveResponse {
    pub status: &'static str,
}

/// `POST /emergency/trigger`. Idempotent per patient; a repeat trigger
/// rebroadcasts the open episode instead of duplicating it.
pub async fn trigger(
    State(ctx): State<ApiContext>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<TriggerResponse>, ApiError> {
    let conn = ctx.open_db()?;
    let outcome = orchestrator::trigger(&conn, &ctx.hub, &user)?;
    let (status, alert_id) = match outcome {
        TriggerOutcome::Triggered(id) => ("triggered", id),
        TriggerOutcome::AlreadyActive(id) => ("already_active", id),
    };
    Ok(Json(TriggerResponse { status, alert_id }))
}

/// `POST /emergency/status`. The status value is validated against the
/// four-element set before anything is written.
pub async fn update_status(
    State(ctx): State<ApiContext>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(req): Json<StatusRequest>,
) -> Result<Json<StatusResponse>, ApiError> {
    let new_status = PatientStatusKind::from_str(&req.status)
        .map_err(|_| ApiError::InvalidStatus(req.status.clone()))?;

    let conn = ctx.open_db()?;
    orchestrator::set_status(&conn, &ctx.hub, &user, new_status)?;
    Ok(Json(StatusResponse {
        status: "updated",
        current_status: new_status,
    }))
}

/// `GET /emergency/active`. Merged elevated view scoped to the caller's
/// visibility; empty for non-caretakers.
pub async fn active(
    State(ctx): State<ApiContext>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<Vec<ActiveAlertView>>, ApiError> {
    let conn = ctx.open_db()?;
    let views = visibility::active_for(&conn, &user)?;
    Ok(Json(views))
}

/// `POST /emergency/resolve/:alert_id`. The id may reference an alert
/// row or a status row; an id matching neither is a no-op success.
pub async fn resolve(
    State(ctx): State<ApiContext>,
    Extension(CurrentUser(_user)): Extension<CurrentUser>,
    Path(alert_id): Path<i64>,
) -> Result<Json<ResolveResponse>, ApiError> {
    let conn = ctx.open_db()?;
    orchestrator::resolve(&conn, alert_id)?;
    Ok(Json(ResolveResponse { status: "resolved" }))
}
