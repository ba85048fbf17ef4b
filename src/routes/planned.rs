// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Planned activity routes.

use super::extract::{IdPairPath, IdPath, ValidatedJson};
use crate::error::Result;
use crate::models::{NewPlannedActivity, PlannedActivity, PlannedActivityUpdate};
use crate::services::ActivityService;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::WithRejection;
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/plannedworkouts", post(create_planned))
        .route("/plannedworkouts/athlete/{athlete_id}", get(list_planned))
        .route(
            "/plannedworkouts/{id}",
            get(get_planned).put(update_planned).delete(delete_planned),
        )
        .route("/plannedworkouts/{id}/link/{completed_id}", post(link_planned))
}

fn service(state: &AppState) -> ActivityService {
    ActivityService::new(state.db.clone())
}

async fn create_planned(
    State(state): State<Arc<AppState>>,
    ValidatedJson(new): ValidatedJson<NewPlannedActivity>,
) -> Result<(StatusCode, Json<PlannedActivity>)> {
    let planned = service(&state).create_planned(new).await?;
    Ok((StatusCode::CREATED, Json(planned)))
}

/// All planned activities of an athlete, by scheduled date.
async fn list_planned(
    State(state): State<Arc<AppState>>,
    WithRejection(Path(athlete_id), _): IdPath,
) -> Result<Json<Vec<PlannedActivity>>> {
    let mut planned = state.db.list_planned_activities(athlete_id).await?;
    planned.sort_by_key(|p| p.scheduled_date);
    Ok(Json(planned))
}

async fn get_planned(
    State(state): State<Arc<AppState>>,
    WithRejection(Path(id), _): IdPath,
) -> Result<Json<PlannedActivity>> {
    Ok(Json(service(&state).get_planned(id).await?))
}

async fn update_planned(
    State(state): State<Arc<AppState>>,
    WithRejection(Path(id), _): IdPath,
    ValidatedJson(update): ValidatedJson<PlannedActivityUpdate>,
) -> Result<Json<PlannedActivity>> {
    Ok(Json(service(&state).update_planned(id, update).await?))
}

async fn link_planned(
    State(state): State<Arc<AppState>>,
    WithRejection(Path((id, completed_id)), _): IdPairPath,
) -> Result<Json<PlannedActivity>> {
    Ok(Json(service(&state).link_planned(id, completed_id).await?))
}

async fn delete_planned(
    State(state): State<Arc<AppState>>,
    WithRejection(Path(id), _): IdPath,
) -> Result<StatusCode> {
    service(&state).delete_planned(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
