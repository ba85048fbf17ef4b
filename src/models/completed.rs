// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Completed activity model: a recorded session, entered directly or
//! imported from Strava / Intervals.icu.

use super::{nullable, patch};
use crate::time_utils::iso8601;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Platform that produced a completed activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum ActivitySource {
    Strava,
    Intervals,
}

/// Stored completed activity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CompletedActivity {
    // Identifiers
    pub id: Uuid,
    pub athlete_id: Uuid,
    pub external_id: Option<String>,
    pub strava_id: Option<String>,
    pub intervals_id: Option<String>,
    pub source: ActivitySource,

    // Metadata
    pub name: Option<String>,
    pub description: Option<String>,
    pub sport_type: Option<String>,
    pub sub_type: Option<String>,
    /// Start instant as reported by the source (UTC)
    pub start_date: Option<DateTime<Utc>>,
    /// Start in the athlete's local wall-clock time
    pub start_date_local: Option<DateTime<Utc>>,
    pub timezone: Option<String>,
    pub trainer: Option<bool>,
    pub commute: Option<bool>,
    pub race: Option<bool>,

    // Summary metrics
    pub distance_m: Option<f64>,
    pub elapsed_time_s: Option<i64>,
    pub moving_time_s: Option<i64>,
    pub elevation_gain_m: Option<f64>,
    pub elevation_loss_m: Option<f64>,
    pub average_speed_mps: Option<f64>,
    pub max_speed_mps: Option<f64>,
    pub average_cadence: Option<f64>,
    pub average_temp_c: Option<f64>,
    pub max_temp_c: Option<f64>,
    pub min_temp_c: Option<f64>,
    pub average_hr_bpm: Option<f64>,
    pub max_hr_bpm: Option<f64>,
    pub average_power_w: Option<f64>,
    pub weighted_power_w: Option<f64>,
    pub max_power_w: Option<f64>,
    pub calories_kcal: Option<f64>,
    pub carbs_used_g: Option<f64>,

    // Intervals.icu training load
    pub icu_training_load: Option<f64>,
    pub icu_trimp: Option<f64>,
    pub icu_intensity: Option<f64>,
    pub icu_efficiency_factor: Option<f64>,
    pub icu_variability_index: Option<f64>,
    pub icu_joules: Option<f64>,
    pub icu_rpe: Option<f64>,

    // Device & gear
    pub device_name: Option<String>,
    pub gear_id: Option<String>,
    pub gear_name: Option<String>,
    pub gear_distance_m: Option<f64>,

    // Sync & housekeeping
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub last_sync: Option<DateTime<Utc>>,
    pub icu_sync_date: Option<DateTime<Utc>>,
    pub strava_sync_date: Option<DateTime<Utc>>,
    pub analyzed: bool,

    // Links
    pub strava_url: Option<String>,
    pub intervals_url: Option<String>,
}

impl CompletedActivity {
    /// The instant this activity is ordered and range-filtered by.
    ///
    /// Local wall-clock start wins over the UTC start so activities group
    /// under the day the athlete saw. `None` means the activity cannot be
    /// placed on a timeline.
    pub fn canonical_date(&self) -> Option<DateTime<Utc>> {
        self.start_date_local.or(self.start_date)
    }

    /// Platform identifiers that must be unique across all activities.
    pub fn unique_keys(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            ("external_id", self.external_id.as_deref()),
            ("strava_id", self.strava_id.as_deref()),
            ("intervals_id", self.intervals_id.as_deref()),
        ]
        .into_iter()
        .filter_map(|(field, value)| value.map(|v| (field, v)))
    }
}

/// Request body for recording a completed activity.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewCompletedActivity {
    pub athlete_id: Uuid,
    pub external_id: Option<String>,
    pub strava_id: Option<String>,
    pub intervals_id: Option<String>,
    pub source: ActivitySource,

    pub name: Option<String>,
    pub description: Option<String>,
    pub sport_type: Option<String>,
    pub sub_type: Option<String>,
    #[serde(default, deserialize_with = "iso8601::option")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "iso8601::option")]
    pub start_date_local: Option<DateTime<Utc>>,
    pub timezone: Option<String>,
    pub trainer: Option<bool>,
    pub commute: Option<bool>,
    pub race: Option<bool>,

    #[validate(range(min = 0.0, message = "must be non-negative"))]
    pub distance_m: Option<f64>,
    #[validate(range(min = 0, message = "must be non-negative"))]
    pub elapsed_time_s: Option<i64>,
    #[validate(range(min = 0, message = "must be non-negative"))]
    pub moving_time_s: Option<i64>,
    pub elevation_gain_m: Option<f64>,
    pub elevation_loss_m: Option<f64>,
    pub average_speed_mps: Option<f64>,
    pub max_speed_mps: Option<f64>,
    pub average_cadence: Option<f64>,
    pub average_temp_c: Option<f64>,
    pub max_temp_c: Option<f64>,
    pub min_temp_c: Option<f64>,
    pub average_hr_bpm: Option<f64>,
    pub max_hr_bpm: Option<f64>,
    pub average_power_w: Option<f64>,
    pub weighted_power_w: Option<f64>,
    pub max_power_w: Option<f64>,
    pub calories_kcal: Option<f64>,
    pub carbs_used_g: Option<f64>,

    pub icu_training_load: Option<f64>,
    pub icu_trimp: Option<f64>,
    pub icu_intensity: Option<f64>,
    pub icu_efficiency_factor: Option<f64>,
    pub icu_variability_index: Option<f64>,
    pub icu_joules: Option<f64>,
    pub icu_rpe: Option<f64>,

    pub device_name: Option<String>,
    pub gear_id: Option<String>,
    pub gear_name: Option<String>,
    pub gear_distance_m: Option<f64>,

    #[serde(default, deserialize_with = "iso8601::option")]
    pub last_sync: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "iso8601::option")]
    pub icu_sync_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "iso8601::option")]
    pub strava_sync_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub analyzed: bool,

    pub strava_url: Option<String>,
    pub intervals_url: Option<String>,
}

impl NewCompletedActivity {
    pub fn into_completed(self, now: DateTime<Utc>) -> CompletedActivity {
        CompletedActivity {
            id: Uuid::new_v4(),
            athlete_id: self.athlete_id,
            external_id: self.external_id,
            strava_id: self.strava_id,
            intervals_id: self.intervals_id,
            source: self.source,
            name: self.name,
            description: self.description,
            sport_type: self.sport_type,
            sub_type: self.sub_type,
            start_date: self.start_date,
            start_date_local: self.start_date_local,
            timezone: self.timezone,
            trainer: self.trainer,
            commute: self.commute,
            race: self.race,
            distance_m: self.distance_m,
            elapsed_time_s: self.elapsed_time_s,
            moving_time_s: self.moving_time_s,
            elevation_gain_m: self.elevation_gain_m,
            elevation_loss_m: self.elevation_loss_m,
            average_speed_mps: self.average_speed_mps,
            max_speed_mps: self.max_speed_mps,
            average_cadence: self.average_cadence,
            average_temp_c: self.average_temp_c,
            max_temp_c: self.max_temp_c,
            min_temp_c: self.min_temp_c,
            average_hr_bpm: self.average_hr_bpm,
            max_hr_bpm: self.max_hr_bpm,
            average_power_w: self.average_power_w,
            weighted_power_w: self.weighted_power_w,
            max_power_w: self.max_power_w,
            calories_kcal: self.calories_kcal,
            carbs_used_g: self.carbs_used_g,
            icu_training_load: self.icu_training_load,
            icu_trimp: self.icu_trimp,
            icu_intensity: self.icu_intensity,
            icu_efficiency_factor: self.icu_efficiency_factor,
            icu_variability_index: self.icu_variability_index,
            icu_joules: self.icu_joules,
            icu_rpe: self.icu_rpe,
            device_name: self.device_name,
            gear_id: self.gear_id,
            gear_name: self.gear_name,
            gear_distance_m: self.gear_distance_m,
            created_at: now,
            updated_at: None,
            last_sync: self.last_sync,
            icu_sync_date: self.icu_sync_date,
            strava_sync_date: self.strava_sync_date,
            analyzed: self.analyzed,
            strava_url: self.strava_url,
            intervals_url: self.intervals_url,
        }
    }
}

/// Partial update over the descriptive, date, metric and sync fields.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CompletedActivityUpdate {
    #[serde(default, deserialize_with = "nullable")]
    pub external_id: Option<Option<String>>,
    pub source: Option<ActivitySource>,
    #[serde(default, deserialize_with = "nullable")]
    pub name: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub sport_type: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub sub_type: Option<Option<String>>,
    #[serde(default, deserialize_with = "iso8601::nullable")]
    pub start_date: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "iso8601::nullable")]
    pub start_date_local: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "nullable")]
    pub timezone: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub distance_m: Option<Option<f64>>,
    #[serde(default, deserialize_with = "nullable")]
    pub elapsed_time_s: Option<Option<i64>>,
    #[serde(default, deserialize_with = "nullable")]
    pub moving_time_s: Option<Option<i64>>,
    #[serde(default, deserialize_with = "nullable")]
    pub icu_training_load: Option<Option<f64>>,
    #[serde(default, deserialize_with = "nullable")]
    pub icu_rpe: Option<Option<f64>>,
    #[serde(default, deserialize_with = "nullable")]
    pub gear_id: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub gear_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "iso8601::nullable")]
    pub last_sync: Option<Option<DateTime<Utc>>>,
    pub analyzed: Option<bool>,
}

impl CompletedActivity {
    /// Apply a partial update and stamp `updated_at`.
    pub fn apply(&mut self, update: CompletedActivityUpdate, now: DateTime<Utc>) {
        patch(&mut self.external_id, update.external_id);
        patch(&mut self.source, update.source);
        patch(&mut self.name, update.name);
        patch(&mut self.description, update.description);
        patch(&mut self.sport_type, update.sport_type);
        patch(&mut self.sub_type, update.sub_type);
        patch(&mut self.start_date, update.start_date);
        patch(&mut self.start_date_local, update.start_date_local);
        patch(&mut self.timezone, update.timezone);
        patch(&mut self.distance_m, update.distance_m);
        patch(&mut self.elapsed_time_s, update.elapsed_time_s);
        patch(&mut self.moving_time_s, update.moving_time_s);
        patch(&mut self.icu_training_load, update.icu_training_load);
        patch(&mut self.icu_rpe, update.icu_rpe);
        patch(&mut self.gear_id, update.gear_id);
        patch(&mut self.gear_name, update.gear_name);
        patch(&mut self.last_sync, update.last_sync);
        patch(&mut self.analyzed, update.analyzed);
        self.updated_at = Some(now);
    }
}
