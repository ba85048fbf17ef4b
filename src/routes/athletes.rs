// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Athlete CRUD routes.

use super::extract::{IdPath, ValidatedJson};
use crate::error::{AppError, Result};
use crate::models::{Athlete, AthleteUpdate, NewAthlete};
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::WithRejection;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/athletes", post(create_athlete)).route(
        "/athletes/{id}",
        get(get_athlete).put(update_athlete).delete(delete_athlete),
    )
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CreatedResponse {
    pub id: Uuid,
}

/// Athlete as returned by the API. OAuth tokens are never exposed.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct AthleteResponse {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub ftp: Option<i32>,
    pub threshold_pace: Option<f64>,
    pub weight: Option<f64>,
    pub max_hr: Option<i32>,
    pub lthr: Option<i32>,
    pub strava_id: Option<String>,
    pub intervals_icu_id: Option<String>,
    pub preferred_sports: Vec<String>,
    pub timezone: Option<String>,
    pub weekly_training_hours: Option<f64>,
    pub ai_enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Athlete> for AthleteResponse {
    fn from(a: Athlete) -> Self {
        Self {
            id: a.id,
            email: a.email,
            name: a.name,
            ftp: a.ftp,
            threshold_pace: a.threshold_pace,
            weight: a.weight,
            max_hr: a.max_hr,
            lthr: a.lthr,
            strava_id: a.strava_id,
            intervals_icu_id: a.intervals_icu_id,
            preferred_sports: a.preferred_sports,
            timezone: a.timezone,
            weekly_training_hours: a.weekly_training_hours,
            ai_enabled: a.ai_enabled,
            created_at: a.created_at,
            updated_at: a.updated_at,
        }
    }
}

async fn create_athlete(
    State(state): State<Arc<AppState>>,
    ValidatedJson(new): ValidatedJson<NewAthlete>,
) -> Result<(StatusCode, Json<CreatedResponse>)> {
    let athlete = new.into_athlete(Utc::now());
    state.db.insert_athlete(&athlete).await?;

    tracing::info!(athlete_id = %athlete.id, "Created athlete");
    Ok((StatusCode::CREATED, Json(CreatedResponse { id: athlete.id })))
}

async fn load_athlete(state: &AppState, id: Uuid) -> Result<Athlete> {
    state
        .db
        .get_athlete(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Athlete {id}")))
}

async fn get_athlete(
    State(state): State<Arc<AppState>>,
    WithRejection(Path(id), _): IdPath,
) -> Result<Json<AthleteResponse>> {
    let athlete = load_athlete(&state, id).await?;
    Ok(Json(athlete.into()))
}

async fn update_athlete(
    State(state): State<Arc<AppState>>,
    WithRejection(Path(id), _): IdPath,
    ValidatedJson(update): ValidatedJson<AthleteUpdate>,
) -> Result<Json<AthleteResponse>> {
    let mut athlete = load_athlete(&state, id).await?;
    athlete.apply(update, Utc::now());
    if !state.db.replace_athlete(&athlete).await? {
        return Err(AppError::NotFound(format!("Athlete {id}")));
    }

    tracing::debug!(athlete_id = %id, "Updated athlete");
    Ok(Json(athlete.into()))
}

/// Delete an athlete and everything it owns.
async fn delete_athlete(
    State(state): State<Arc<AppState>>,
    WithRejection(Path(id), _): IdPath,
) -> Result<StatusCode> {
    let deleted = state
        .db
        .delete_athlete(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Athlete {id}")))?;

    tracing::info!(athlete_id = %id, documents = deleted, "Deleted athlete");
    Ok(StatusCode::NO_CONTENT)
}
