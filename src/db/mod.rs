// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer.
//!
//! Storage is reached through three traits, one per entity kind, joined into
//! [`Store`]. Accessors return owned, fully materialized values.

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryDb;

use crate::error::AppError;
use crate::models::{Athlete, CompletedActivity, PlannedActivity};
use crate::time_utils::DateRange;
use async_trait::async_trait;
use uuid::Uuid;

/// Collection names as constants.
pub mod collections {
    pub const ATHLETES: &str = "athletes";
    pub const PLANNED_ACTIVITIES: &str = "planned_activities";
    pub const COMPLETED_ACTIVITIES: &str = "completed_activities";
    /// Reservations of unique field values, one document per value.
    pub const UNIQUE_KEYS: &str = "unique_keys";
}

#[async_trait]
pub trait AthleteStore: Send + Sync {
    async fn get_athlete(&self, id: Uuid) -> Result<Option<Athlete>, AppError>;

    /// Insert a new athlete. Fails with `Conflict` on a duplicate email or
    /// platform id.
    async fn insert_athlete(&self, athlete: &Athlete) -> Result<(), AppError>;

    /// Overwrite an existing athlete document. Returns `false`, writing
    /// nothing, if the athlete no longer exists.
    async fn replace_athlete(&self, athlete: &Athlete) -> Result<bool, AppError>;

    /// Delete an athlete together with all of its planned and completed
    /// activities. Returns the number of documents removed, or `None` if the
    /// athlete does not exist.
    async fn delete_athlete(&self, id: Uuid) -> Result<Option<usize>, AppError>;
}

#[async_trait]
pub trait PlannedActivityStore: Send + Sync {
    async fn get_planned_activity(&self, id: Uuid) -> Result<Option<PlannedActivity>, AppError>;

    async fn list_planned_activities(
        &self,
        athlete_id: Uuid,
    ) -> Result<Vec<PlannedActivity>, AppError>;

    /// Planned activities with `range.start <= scheduled_date <= range.end`.
    /// Order is unspecified; an empty result is not an error.
    async fn list_planned_activities_in_range(
        &self,
        athlete_id: Uuid,
        range: DateRange,
    ) -> Result<Vec<PlannedActivity>, AppError>;

    async fn insert_planned_activity(&self, activity: &PlannedActivity) -> Result<(), AppError>;

    /// Overwrite an existing planned activity. Returns `false`, writing
    /// nothing, if it no longer exists. A link to a completed activity that
    /// no longer exists fails with a validation error on `linked_activity_id`.
    async fn replace_planned_activity(&self, activity: &PlannedActivity)
        -> Result<bool, AppError>;

    async fn delete_planned_activity(&self, id: Uuid) -> Result<bool, AppError>;
}

#[async_trait]
pub trait CompletedActivityStore: Send + Sync {
    async fn get_completed_activity(
        &self,
        id: Uuid,
    ) -> Result<Option<CompletedActivity>, AppError>;

    async fn list_completed_activities(
        &self,
        athlete_id: Uuid,
    ) -> Result<Vec<CompletedActivity>, AppError>;

    /// Completed activities whose canonical date falls inside `range`.
    /// Activities without any start date are never returned.
    async fn list_completed_activities_in_range(
        &self,
        athlete_id: Uuid,
        range: DateRange,
    ) -> Result<Vec<CompletedActivity>, AppError>;

    /// Insert a new activity. Fails with `Conflict` if another activity
    /// already carries the same external, Strava or Intervals id.
    async fn insert_completed_activity(&self, activity: &CompletedActivity)
        -> Result<(), AppError>;

    /// Overwrite an existing activity. Returns `false`, writing nothing, if
    /// it no longer exists.
    async fn replace_completed_activity(
        &self,
        activity: &CompletedActivity,
    ) -> Result<bool, AppError>;

    /// Delete an activity and clear any planned activity linking to it.
    async fn delete_completed_activity(&self, id: Uuid) -> Result<bool, AppError>;
}

/// Full storage backend.
pub trait Store: AthleteStore + PlannedActivityStore + CompletedActivityStore {}

impl<T> Store for T where T: AthleteStore + PlannedActivityStore + CompletedActivityStore {}

/// Range test used by every backend for completed activities.
pub(crate) fn completed_in_range(activity: &CompletedActivity, range: &DateRange) -> bool {
    activity
        .canonical_date()
        .is_some_and(|date| range.contains(date))
}

fn conflict(collection: &str, field: &str, value: &str) -> AppError {
    AppError::Conflict(format!("{collection} with {field} {value:?} already exists"))
}

fn missing_link(completed_id: Uuid) -> AppError {
    AppError::invalid_field(
        "linked_activity_id",
        format!("completed activity {completed_id} does not exist"),
    )
}

/// Fields of an athlete that must be unique across athletes.
pub(crate) fn athlete_keys(athlete: &Athlete) -> Vec<(&'static str, String)> {
    [
        ("email", Some(athlete.email.as_str())),
        ("strava_id", athlete.strava_id.as_deref()),
        ("intervals_icu_id", athlete.intervals_icu_id.as_deref()),
    ]
    .into_iter()
    .filter_map(|(field, value)| value.map(|v| (field, v.to_string())))
    .collect()
}

pub(crate) fn completed_keys(activity: &CompletedActivity) -> Vec<(&'static str, String)> {
    activity
        .unique_keys()
        .map(|(field, value)| (field, value.to_string()))
        .collect()
}
