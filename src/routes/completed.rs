// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Completed activity routes.

use super::extract::{IdPath, ValidatedJson};
use crate::error::Result;
use crate::models::{CompletedActivity, CompletedActivityUpdate, NewCompletedActivity};
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
        .route("/completedworkouts", post(create_completed))
        .route(
            "/completedworkouts/athlete/{athlete_id}",
            get(list_completed),
        )
        .route(
            "/completedworkouts/{id}",
            get(get_completed)
                .put(update_completed)
                .delete(delete_completed),
        )
}

async fn create_completed(
    State(state): State<Arc<AppState>>,
    ValidatedJson(new): ValidatedJson<NewCompletedActivity>,
) -> Result<(StatusCode, Json<CompletedActivity>)> {
    let completed = ActivityService::new(state.db.clone())
        .create_completed(new)
        .await?;
    Ok((StatusCode::CREATED, Json(completed)))
}

/// All completed activities of an athlete, newest first. Undated
/// activities sort last.
async fn list_completed(
    State(state): State<Arc<AppState>>,
    WithRejection(Path(athlete_id), _): IdPath,
) -> Result<Json<Vec<CompletedActivity>>> {
    let mut completed = state.db.list_completed_activities(athlete_id).await?;
    completed.sort_by_key(|c| std::cmp::Reverse(c.canonical_date()));
    Ok(Json(completed))
}

async fn get_completed(
    State(state): State<Arc<AppState>>,
    WithRejection(Path(id), _): IdPath,
) -> Result<Json<CompletedActivity>> {
    let completed = ActivityService::new(state.db.clone())
        .get_completed(id)
        .await?;
    Ok(Json(completed))
}

async fn update_completed(
    State(state): State<Arc<AppState>>,
    WithRejection(Path(id), _): IdPath,
    ValidatedJson(update): ValidatedJson<CompletedActivityUpdate>,
) -> Result<Json<CompletedActivity>> {
    let completed = ActivityService::new(state.db.clone())
        .update_completed(id, update)
        .await?;
    Ok(Json(completed))
}

async fn delete_completed(
    State(state): State<Arc<AppState>>,
    WithRejection(Path(id), _): IdPath,
) -> Result<StatusCode> {
    ActivityService::new(state.db.clone())
        .delete_completed(id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
