// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process store for local development and tests.
//!
//! All three collections sit behind one lock, so a cascade or unlink is a
//! single atomic write.

use super::{
    athlete_keys, collections, completed_in_range, conflict, missing_link, AthleteStore,
    CompletedActivityStore, PlannedActivityStore,
};
use crate::error::AppError;
use crate::models::{Athlete, CompletedActivity, PlannedActivity};
use crate::time_utils::DateRange;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    athletes: HashMap<Uuid, Athlete>,
    planned: HashMap<Uuid, PlannedActivity>,
    completed: HashMap<Uuid, CompletedActivity>,
}

/// Memory-backed store. Clones share the same data.
#[derive(Clone, Default)]
pub struct MemoryDb {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }
}

fn athlete_conflict(tables: &Tables, athlete: &Athlete) -> Option<AppError> {
    let taken: Vec<(&str, String)> = tables
        .athletes
        .values()
        .filter(|other| other.id != athlete.id)
        .flat_map(athlete_keys)
        .collect();

    athlete_keys(athlete)
        .into_iter()
        .find(|key| taken.contains(key))
        .map(|(field, value)| conflict(collections::ATHLETES, field, &value))
}

fn completed_conflict(tables: &Tables, activity: &CompletedActivity) -> Option<AppError> {
    let taken: Vec<(&str, &str)> = tables
        .completed
        .values()
        .filter(|other| other.id != activity.id)
        .flat_map(|other| other.unique_keys())
        .collect();

    activity
        .unique_keys()
        .find(|key| taken.contains(key))
        .map(|(field, value)| conflict(collections::COMPLETED_ACTIVITIES, field, value))
}

#[async_trait]
impl AthleteStore for MemoryDb {
    async fn get_athlete(&self, id: Uuid) -> Result<Option<Athlete>, AppError> {
        Ok(self.tables.read().await.athletes.get(&id).cloned())
    }

    async fn insert_athlete(&self, athlete: &Athlete) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;
        if tables.athletes.contains_key(&athlete.id) {
            return Err(conflict(
                collections::ATHLETES,
                "id",
                &athlete.id.to_string(),
            ));
        }
        if let Some(err) = athlete_conflict(&tables, athlete) {
            return Err(err);
        }
        tables.athletes.insert(athlete.id, athlete.clone());
        Ok(())
    }

    async fn replace_athlete(&self, athlete: &Athlete) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        if !tables.athletes.contains_key(&athlete.id) {
            return Ok(false);
        }
        if let Some(err) = athlete_conflict(&tables, athlete) {
            return Err(err);
        }
        tables.athletes.insert(athlete.id, athlete.clone());
        Ok(true)
    }

    async fn delete_athlete(&self, id: Uuid) -> Result<Option<usize>, AppError> {
        let mut tables = self.tables.write().await;
        if tables.athletes.remove(&id).is_none() {
            return Ok(None);
        }

        let planned_before = tables.planned.len();
        tables.planned.retain(|_, p| p.athlete_id != id);
        let completed_before = tables.completed.len();
        tables.completed.retain(|_, c| c.athlete_id != id);

        let deleted = 1
            + (planned_before - tables.planned.len())
            + (completed_before - tables.completed.len());
        tracing::debug!(athlete_id = %id, deleted, "Deleted athlete (memory)");
        Ok(Some(deleted))
    }
}

#[async_trait]
impl PlannedActivityStore for MemoryDb {
    async fn get_planned_activity(&self, id: Uuid) -> Result<Option<PlannedActivity>, AppError> {
        Ok(self.tables.read().await.planned.get(&id).cloned())
    }

    async fn list_planned_activities(
        &self,
        athlete_id: Uuid,
    ) -> Result<Vec<PlannedActivity>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .planned
            .values()
            .filter(|p| p.athlete_id == athlete_id)
            .cloned()
            .collect())
    }

    async fn list_planned_activities_in_range(
        &self,
        athlete_id: Uuid,
        range: DateRange,
    ) -> Result<Vec<PlannedActivity>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .planned
            .values()
            .filter(|p| p.athlete_id == athlete_id && range.contains(p.scheduled_date))
            .cloned()
            .collect())
    }

    async fn insert_planned_activity(&self, activity: &PlannedActivity) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;
        if tables.planned.contains_key(&activity.id) {
            return Err(conflict(
                collections::PLANNED_ACTIVITIES,
                "id",
                &activity.id.to_string(),
            ));
        }
        tables.planned.insert(activity.id, activity.clone());
        Ok(())
    }

    async fn replace_planned_activity(
        &self,
        activity: &PlannedActivity,
    ) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        if !tables.planned.contains_key(&activity.id) {
            return Ok(false);
        }
        if let Some(completed_id) = activity.linked_activity_id {
            if !tables.completed.contains_key(&completed_id) {
                return Err(missing_link(completed_id));
            }
        }
        tables.planned.insert(activity.id, activity.clone());
        Ok(true)
    }

    async fn delete_planned_activity(&self, id: Uuid) -> Result<bool, AppError> {
        Ok(self.tables.write().await.planned.remove(&id).is_some())
    }
}

#[async_trait]
impl CompletedActivityStore for MemoryDb {
    async fn get_completed_activity(
        &self,
        id: Uuid,
    ) -> Result<Option<CompletedActivity>, AppError> {
        Ok(self.tables.read().await.completed.get(&id).cloned())
    }

    async fn list_completed_activities(
        &self,
        athlete_id: Uuid,
    ) -> Result<Vec<CompletedActivity>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .completed
            .values()
            .filter(|c| c.athlete_id == athlete_id)
            .cloned()
            .collect())
    }

    async fn list_completed_activities_in_range(
        &self,
        athlete_id: Uuid,
        range: DateRange,
    ) -> Result<Vec<CompletedActivity>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .completed
            .values()
            .filter(|c| c.athlete_id == athlete_id && completed_in_range(c, &range))
            .cloned()
            .collect())
    }

    async fn insert_completed_activity(
        &self,
        activity: &CompletedActivity,
    ) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;
        if tables.completed.contains_key(&activity.id) {
            return Err(conflict(
                collections::COMPLETED_ACTIVITIES,
                "id",
                &activity.id.to_string(),
            ));
        }
        if let Some(err) = completed_conflict(&tables, activity) {
            return Err(err);
        }
        tables.completed.insert(activity.id, activity.clone());
        Ok(())
    }

    async fn replace_completed_activity(
        &self,
        activity: &CompletedActivity,
    ) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        if !tables.completed.contains_key(&activity.id) {
            return Ok(false);
        }
        if let Some(err) = completed_conflict(&tables, activity) {
            return Err(err);
        }
        tables.completed.insert(activity.id, activity.clone());
        Ok(true)
    }

    async fn delete_completed_activity(&self, id: Uuid) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        if tables.completed.remove(&id).is_none() {
            return Ok(false);
        }
        for planned in tables.planned.values_mut() {
            if planned.linked_activity_id == Some(id) {
                planned.linked_activity_id = None;
            }
        }
        Ok(true)
    }
}
