// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Timeline routes: merged planned + completed activities for an athlete.

use super::extract::IdPath;
use crate::error::{AppError, FieldError, Result};
use crate::models::TimelineResponse;
use crate::services::TimelineService;
use crate::time_utils::{parse_iso8601, DateRange};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use axum_extra::extract::WithRejection;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/activities/{athlete_id}", get(get_timeline))
        .route("/timeline/{athlete_id}", get(get_timeline))
}

/// Window query parameters. Kept as raw strings so each one gets its own
/// validation message.
#[derive(Debug, Deserialize)]
pub struct TimelineQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl TimelineQuery {
    fn range(&self) -> Result<DateRange> {
        let mut errors = Vec::new();
        let start = required_date("start_date", self.start_date.as_deref(), &mut errors);
        let end = required_date("end_date", self.end_date.as_deref(), &mut errors);

        match (start, end) {
            (Some(start), Some(end)) => Ok(DateRange::new(start, end)),
            _ => Err(AppError::Validation(errors)),
        }
    }
}

fn required_date(
    field: &str,
    raw: Option<&str>,
    errors: &mut Vec<FieldError>,
) -> Option<DateTime<Utc>> {
    let Some(raw) = raw else {
        errors.push(FieldError::new(field, "field required"));
        return None;
    };

    let parsed = parse_iso8601(raw);
    if parsed.is_none() {
        errors.push(FieldError::new(field, "invalid datetime"));
    }
    parsed
}

/// Merged timeline for an athlete within `[start_date, end_date]`.
async fn get_timeline(
    State(state): State<Arc<AppState>>,
    WithRejection(Path(athlete_id), _): IdPath,
    WithRejection(Query(query), _): WithRejection<Query<TimelineQuery>, AppError>,
) -> Result<Json<TimelineResponse>> {
    let range = query.range()?;

    let events = TimelineService::new(state.db.clone())
        .events(athlete_id, range)
        .await?;

    tracing::debug!(
        athlete_id = %athlete_id,
        start = %range.start,
        end = %range.end,
        count = events.len(),
        "Timeline served"
    );

    Ok(Json(TimelineResponse { events }))
}
