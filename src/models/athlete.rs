// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Athlete model for storage and API.

use super::{nullable, patch};
use crate::time_utils::iso8601;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Athlete profile. Owns all planned and completed activities.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Athlete {
    /// Athlete ID (also used as document ID)
    pub id: Uuid,
    /// Unique email address
    pub email: String,
    pub name: Option<String>,

    // Performance metrics
    /// Functional threshold power (watts)
    pub ftp: Option<i32>,
    /// Threshold pace (seconds per km)
    pub threshold_pace: Option<f64>,
    /// Weight (kg)
    pub weight: Option<f64>,
    pub max_hr: Option<i32>,
    /// Lactate-threshold heart rate
    pub lthr: Option<i32>,

    // Integrations
    pub strava_id: Option<String>,
    pub intervals_icu_id: Option<String>,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub token_expires_at: Option<DateTime<Utc>>,

    // Preferences
    pub preferred_sports: Vec<String>,
    pub timezone: Option<String>,
    pub weekly_training_hours: Option<f64>,
    pub ai_enabled: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_timezone() -> Option<String> {
    Some("UTC".to_string())
}

fn default_ai_enabled() -> bool {
    true
}

/// Request body for creating an athlete.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewAthlete {
    /// Client-supplied ID; generated when absent
    pub id: Option<Uuid>,
    #[validate(email(message = "value is not a valid email address"))]
    pub email: String,
    pub name: Option<String>,
    #[validate(range(min = 0, message = "must be non-negative"))]
    pub ftp: Option<i32>,
    #[validate(range(min = 0.0, message = "must be non-negative"))]
    pub threshold_pace: Option<f64>,
    #[validate(range(min = 0.0, message = "must be non-negative"))]
    pub weight: Option<f64>,
    #[validate(range(min = 0, message = "must be non-negative"))]
    pub max_hr: Option<i32>,
    #[validate(range(min = 0, message = "must be non-negative"))]
    pub lthr: Option<i32>,
    pub strava_id: Option<String>,
    pub intervals_icu_id: Option<String>,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    #[serde(default, deserialize_with = "iso8601::option")]
    pub token_expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub preferred_sports: Vec<String>,
    #[serde(default = "default_timezone")]
    pub timezone: Option<String>,
    #[validate(range(min = 0.0, message = "must be non-negative"))]
    pub weekly_training_hours: Option<f64>,
    #[serde(default = "default_ai_enabled")]
    pub ai_enabled: bool,
}

impl NewAthlete {
    /// Build the stored athlete, stamping both timestamps with `now`.
    pub fn into_athlete(self, now: DateTime<Utc>) -> Athlete {
        Athlete {
            id: self.id.unwrap_or_else(Uuid::new_v4),
            email: self.email,
            name: self.name,
            ftp: self.ftp,
            threshold_pace: self.threshold_pace,
            weight: self.weight,
            max_hr: self.max_hr,
            lthr: self.lthr,
            strava_id: self.strava_id,
            intervals_icu_id: self.intervals_icu_id,
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            token_expires_at: self.token_expires_at,
            preferred_sports: self.preferred_sports,
            timezone: self.timezone,
            weekly_training_hours: self.weekly_training_hours,
            ai_enabled: self.ai_enabled,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update; only fields present in the body are applied.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct AthleteUpdate {
    #[serde(default, deserialize_with = "nullable")]
    pub name: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[validate(range(min = 0, message = "must be non-negative"))]
    pub ftp: Option<Option<i32>>,
    #[serde(default, deserialize_with = "nullable")]
    #[validate(range(min = 0.0, message = "must be non-negative"))]
    pub threshold_pace: Option<Option<f64>>,
    #[serde(default, deserialize_with = "nullable")]
    #[validate(range(min = 0.0, message = "must be non-negative"))]
    pub weight: Option<Option<f64>>,
    #[serde(default, deserialize_with = "nullable")]
    #[validate(range(min = 0, message = "must be non-negative"))]
    pub max_hr: Option<Option<i32>>,
    #[serde(default, deserialize_with = "nullable")]
    #[validate(range(min = 0, message = "must be non-negative"))]
    pub lthr: Option<Option<i32>>,
    pub preferred_sports: Option<Vec<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub timezone: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[validate(range(min = 0.0, message = "must be non-negative"))]
    pub weekly_training_hours: Option<Option<f64>>,
    pub ai_enabled: Option<bool>,
}

impl Athlete {
    /// Apply a partial update and refresh `updated_at`.
    pub fn apply(&mut self, update: AthleteUpdate, now: DateTime<Utc>) {
        patch(&mut self.name, update.name);
        patch(&mut self.ftp, update.ftp);
        patch(&mut self.threshold_pace, update.threshold_pace);
        patch(&mut self.weight, update.weight);
        patch(&mut self.max_hr, update.max_hr);
        patch(&mut self.lthr, update.lthr);
        patch(&mut self.preferred_sports, update.preferred_sports);
        patch(&mut self.timezone, update.timezone);
        patch(&mut self.weekly_training_hours, update.weekly_training_hours);
        patch(&mut self.ai_enabled, update.ai_enabled);
        self.updated_at = now;
    }
}
