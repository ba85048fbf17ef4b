// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Planned activity model: a scheduled, not-yet-performed session.

use super::{nullable, patch};
use crate::time_utils::iso8601;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Kind of planned session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum ActivityType {
    Ride,
    Run,
    Swim,
    Other,
}

impl ActivityType {
    pub fn as_str(self) -> &'static str {
        match self {
            ActivityType::Ride => "Ride",
            ActivityType::Run => "Run",
            ActivityType::Swim => "Swim",
            ActivityType::Other => "Other",
        }
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Training goal of a planned session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum ActivityGoal {
    Recovery,
    Endurance,
    Tempo,
    Threshold,
    #[serde(rename = "VO2 Max")]
    Vo2Max,
    Intervals,
    Long,
}

/// Stored planned activity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct PlannedActivity {
    /// Planned activity ID (also used as document ID)
    pub id: Uuid,
    /// Owning athlete
    pub athlete_id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    pub goal: Option<ActivityGoal>,
    pub zone: Option<i32>,
    /// Target duration in seconds
    pub target_duration: Option<i64>,
    /// Target distance (unit by convention)
    pub target_distance: Option<f64>,
    /// Target intensity (RPE, %FTP or zone, by convention)
    pub target_intensity: Option<f64>,
    pub scheduled_date: DateTime<Utc>,
    pub completed: bool,
    /// Completed activity that fulfilled this plan
    pub linked_activity_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Request body for creating a planned activity.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewPlannedActivity {
    pub athlete_id: Uuid,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub name: String,
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    pub goal: Option<ActivityGoal>,
    pub zone: Option<i32>,
    #[validate(range(min = 0, message = "must be non-negative"))]
    pub target_duration: Option<i64>,
    #[validate(range(min = 0.0, message = "must be non-negative"))]
    pub target_distance: Option<f64>,
    pub target_intensity: Option<f64>,
    #[serde(deserialize_with = "iso8601::deserialize")]
    pub scheduled_date: DateTime<Utc>,
    #[serde(default)]
    pub completed: bool,
}

impl NewPlannedActivity {
    pub fn into_planned(self, now: DateTime<Utc>) -> PlannedActivity {
        PlannedActivity {
            id: Uuid::new_v4(),
            athlete_id: self.athlete_id,
            name: self.name,
            activity_type: self.activity_type,
            goal: self.goal,
            zone: self.zone,
            target_duration: self.target_duration,
            target_distance: self.target_distance,
            target_intensity: self.target_intensity,
            scheduled_date: self.scheduled_date,
            completed: self.completed,
            linked_activity_id: None,
            created_at: now,
        }
    }
}

/// Partial update; only fields present in the body are applied.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct PlannedActivityUpdate {
    #[validate(length(min = 1, message = "must not be empty"))]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub activity_type: Option<ActivityType>,
    #[serde(default, deserialize_with = "nullable")]
    pub goal: Option<Option<ActivityGoal>>,
    #[serde(default, deserialize_with = "nullable")]
    pub zone: Option<Option<i32>>,
    #[serde(default, deserialize_with = "nullable")]
    pub target_duration: Option<Option<i64>>,
    #[serde(default, deserialize_with = "nullable")]
    pub target_distance: Option<Option<f64>>,
    #[serde(default, deserialize_with = "nullable")]
    pub target_intensity: Option<Option<f64>>,
    #[serde(default, deserialize_with = "iso8601::option")]
    pub scheduled_date: Option<DateTime<Utc>>,
    pub completed: Option<bool>,
    #[serde(default, deserialize_with = "nullable")]
    pub linked_activity_id: Option<Option<Uuid>>,
}

impl PlannedActivity {
    pub fn apply(&mut self, update: PlannedActivityUpdate) {
        patch(&mut self.name, update.name);
        patch(&mut self.activity_type, update.activity_type);
        patch(&mut self.goal, update.goal);
        patch(&mut self.zone, update.zone);
        patch(&mut self.target_duration, update.target_duration);
        patch(&mut self.target_distance, update.target_distance);
        patch(&mut self.target_intensity, update.target_intensity);
        patch(&mut self.scheduled_date, update.scheduled_date);
        patch(&mut self.completed, update.completed);
        patch(&mut self.linked_activity_id, update.linked_activity_id);
    }

    /// Mark as fulfilled by a recorded activity.
    pub fn link(&mut self, completed_id: Uuid) {
        self.linked_activity_id = Some(completed_id);
        self.completed = true;
    }
}
