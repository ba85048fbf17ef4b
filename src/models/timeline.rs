// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Timeline event: the unified view over planned and completed activities.

use super::{CompletedActivity, PlannedActivity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub const UNTITLED_ACTIVITY: &str = "Untitled Activity";
pub const DEFAULT_EVENT_TYPE: &str = "Other";

/// Where an event stands.
///
/// `Missed` is part of the wire contract but is never derived yet: a plan
/// past its date without completion still reports `Planned`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum EventStatus {
    Planned,
    Completed,
    Missed,
}

/// Normalized figures shown for every event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct EventSummary {
    pub distance_m: Option<f64>,
    pub duration_s: Option<i64>,
    pub training_load: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct TimelineEvent {
    /// ID of the source activity
    pub id: Uuid,
    pub date: DateTime<Utc>,
    pub title: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub status: EventStatus,
    pub data: EventSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct TimelineResponse {
    pub events: Vec<TimelineEvent>,
}

impl From<PlannedActivity> for TimelineEvent {
    fn from(planned: PlannedActivity) -> Self {
        let status = if planned.completed {
            EventStatus::Completed
        } else {
            EventStatus::Planned
        };

        TimelineEvent {
            id: planned.id,
            date: planned.scheduled_date,
            title: planned.name,
            event_type: planned.activity_type.to_string(),
            status,
            data: EventSummary {
                distance_m: planned.target_distance,
                duration_s: planned.target_duration,
                training_load: planned.target_intensity,
            },
        }
    }
}

impl TimelineEvent {
    /// Project a completed activity; `None` if it has no canonical date.
    pub fn from_completed(completed: CompletedActivity) -> Option<Self> {
        let date = completed.canonical_date()?;

        Some(TimelineEvent {
            id: completed.id,
            date,
            title: completed
                .name
                .unwrap_or_else(|| UNTITLED_ACTIVITY.to_string()),
            event_type: completed
                .sport_type
                .unwrap_or_else(|| DEFAULT_EVENT_TYPE.to_string()),
            status: EventStatus::Completed,
            data: EventSummary {
                distance_m: completed.distance_m,
                duration_s: completed.moving_time_s,
                training_load: completed.icu_training_load,
            },
        })
    }
}
