// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Activity write rules.
//!
//! Enforces the relations the stores don't check on their own:
//! 1. Activities belong to an existing athlete
//! 2. A planned activity only links to a completed activity of the same athlete

use crate::db::Store;
use crate::error::{AppError, Result};
use crate::models::{
    CompletedActivity, CompletedActivityUpdate, NewCompletedActivity, NewPlannedActivity,
    PlannedActivity, PlannedActivityUpdate,
};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone)]
pub struct ActivityService {
    db: Arc<dyn Store>,
}

impl ActivityService {
    pub fn new(db: Arc<dyn Store>) -> Self {
        Self { db }
    }

    // ─── Planned ─────────────────────────────────────────────────

    pub async fn create_planned(&self, new: NewPlannedActivity) -> Result<PlannedActivity> {
        self.require_athlete(new.athlete_id).await?;

        let planned = new.into_planned(Utc::now());
        self.db.insert_planned_activity(&planned).await?;

        tracing::info!(
            planned_id = %planned.id,
            athlete_id = %planned.athlete_id,
            scheduled_date = %planned.scheduled_date,
            "Created planned activity"
        );
        Ok(planned)
    }

    pub async fn get_planned(&self, id: Uuid) -> Result<PlannedActivity> {
        self.db
            .get_planned_activity(id)
            .await?
            .ok_or_else(|| planned_not_found(id))
    }

    pub async fn update_planned(
        &self,
        id: Uuid,
        update: PlannedActivityUpdate,
    ) -> Result<PlannedActivity> {
        let mut planned = self.get_planned(id).await?;

        if let Some(Some(completed_id)) = update.linked_activity_id {
            self.require_linkable(&planned, completed_id).await?;
        }

        planned.apply(update);
        if !self.db.replace_planned_activity(&planned).await? {
            return Err(planned_not_found(id));
        }

        tracing::debug!(planned_id = %id, "Updated planned activity");
        Ok(planned)
    }

    /// Mark a planned activity as fulfilled by `completed_id`.
    pub async fn link_planned(&self, id: Uuid, completed_id: Uuid) -> Result<PlannedActivity> {
        let mut planned = self.get_planned(id).await?;
        self.require_linkable(&planned, completed_id).await?;

        planned.link(completed_id);
        if !self.db.replace_planned_activity(&planned).await? {
            return Err(planned_not_found(id));
        }

        tracing::info!(
            planned_id = %id,
            completed_id = %completed_id,
            "Linked planned activity"
        );
        Ok(planned)
    }

    pub async fn delete_planned(&self, id: Uuid) -> Result<()> {
        if !self.db.delete_planned_activity(id).await? {
            return Err(planned_not_found(id));
        }
        tracing::info!(planned_id = %id, "Deleted planned activity");
        Ok(())
    }

    // ─── Completed ───────────────────────────────────────────────

    pub async fn create_completed(&self, new: NewCompletedActivity) -> Result<CompletedActivity> {
        self.require_athlete(new.athlete_id).await?;

        let completed = new.into_completed(Utc::now());
        self.db.insert_completed_activity(&completed).await?;

        tracing::info!(
            completed_id = %completed.id,
            athlete_id = %completed.athlete_id,
            source = ?completed.source,
            "Recorded completed activity"
        );
        Ok(completed)
    }

    pub async fn get_completed(&self, id: Uuid) -> Result<CompletedActivity> {
        self.db
            .get_completed_activity(id)
            .await?
            .ok_or_else(|| completed_not_found(id))
    }

    pub async fn update_completed(
        &self,
        id: Uuid,
        update: CompletedActivityUpdate,
    ) -> Result<CompletedActivity> {
        let mut completed = self.get_completed(id).await?;

        completed.apply(update, Utc::now());
        if !self.db.replace_completed_activity(&completed).await? {
            return Err(completed_not_found(id));
        }

        tracing::debug!(completed_id = %id, "Updated completed activity");
        Ok(completed)
    }

    pub async fn delete_completed(&self, id: Uuid) -> Result<()> {
        if !self.db.delete_completed_activity(id).await? {
            return Err(completed_not_found(id));
        }
        tracing::info!(completed_id = %id, "Deleted completed activity");
        Ok(())
    }

    // ─── Checks ──────────────────────────────────────────────────

    async fn require_athlete(&self, athlete_id: Uuid) -> Result<()> {
        match self.db.get_athlete(athlete_id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::NotFound(format!("Athlete {athlete_id}"))),
        }
    }

    async fn require_linkable(&self, planned: &PlannedActivity, completed_id: Uuid) -> Result<()> {
        let completed = self.db.get_completed_activity(completed_id).await?;

        match completed {
            None => Err(AppError::invalid_field(
                "linked_activity_id",
                format!("completed activity {completed_id} does not exist"),
            )),
            Some(c) if c.athlete_id != planned.athlete_id => Err(AppError::invalid_field(
                "linked_activity_id",
                "completed activity belongs to another athlete",
            )),
            Some(_) => Ok(()),
        }
    }
}

fn planned_not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Planned activity {id}"))
}

fn completed_not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Completed activity {id}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{AthleteStore, CompletedActivityStore, MemoryDb, PlannedActivityStore};
    use crate::models::{Athlete, NewAthlete};
    use crate::time_utils::DateRange;
    use async_trait::async_trait;
    use chrono::TimeZone;

    /// Store that deletes a planned activity's owner right after handing the
    /// plan out, so the caller's write lands after the cascade.
    struct CascadeAfterRead(MemoryDb);

    #[async_trait]
    impl AthleteStore for CascadeAfterRead {
        async fn get_athlete(&self, id: Uuid) -> Result<Option<Athlete>> {
            self.0.get_athlete(id).await
        }
        async fn insert_athlete(&self, athlete: &Athlete) -> Result<()> {
            self.0.insert_athlete(athlete).await
        }
        async fn replace_athlete(&self, athlete: &Athlete) -> Result<bool> {
            self.0.replace_athlete(athlete).await
        }
        async fn delete_athlete(&self, id: Uuid) -> Result<Option<usize>> {
            self.0.delete_athlete(id).await
        }
    }

    #[async_trait]
    impl PlannedActivityStore for CascadeAfterRead {
        async fn get_planned_activity(&self, id: Uuid) -> Result<Option<PlannedActivity>> {
            let planned = self.0.get_planned_activity(id).await?;
            if let Some(p) = &planned {
                self.0.delete_athlete(p.athlete_id).await?;
            }
            Ok(planned)
        }
        async fn list_planned_activities(&self, athlete_id: Uuid) -> Result<Vec<PlannedActivity>> {
            self.0.list_planned_activities(athlete_id).await
        }
        async fn list_planned_activities_in_range(
            &self,
            athlete_id: Uuid,
            range: DateRange,
        ) -> Result<Vec<PlannedActivity>> {
            self.0.list_planned_activities_in_range(athlete_id, range).await
        }
        async fn insert_planned_activity(&self, activity: &PlannedActivity) -> Result<()> {
            self.0.insert_planned_activity(activity).await
        }
        async fn replace_planned_activity(&self, activity: &PlannedActivity) -> Result<bool> {
            self.0.replace_planned_activity(activity).await
        }
        async fn delete_planned_activity(&self, id: Uuid) -> Result<bool> {
            self.0.delete_planned_activity(id).await
        }
    }

    #[async_trait]
    impl CompletedActivityStore for CascadeAfterRead {
        async fn get_completed_activity(&self, id: Uuid) -> Result<Option<CompletedActivity>> {
            self.0.get_completed_activity(id).await
        }
        async fn list_completed_activities(
            &self,
            athlete_id: Uuid,
        ) -> Result<Vec<CompletedActivity>> {
            self.0.list_completed_activities(athlete_id).await
        }
        async fn list_completed_activities_in_range(
            &self,
            athlete_id: Uuid,
            range: DateRange,
        ) -> Result<Vec<CompletedActivity>> {
            self.0
                .list_completed_activities_in_range(athlete_id, range)
                .await
        }
        async fn insert_completed_activity(&self, activity: &CompletedActivity) -> Result<()> {
            self.0.insert_completed_activity(activity).await
        }
        async fn replace_completed_activity(&self, activity: &CompletedActivity) -> Result<bool> {
            self.0.replace_completed_activity(activity).await
        }
        async fn delete_completed_activity(&self, id: Uuid) -> Result<bool> {
            self.0.delete_completed_activity(id).await
        }
    }

    async fn setup() -> (ActivityService, Arc<MemoryDb>, Uuid) {
        let db = Arc::new(MemoryDb::new());
        let athlete = serde_json::from_value::<NewAthlete>(serde_json::json!({
            "email": format!("{}@example.com", Uuid::new_v4()),
        }))
        .unwrap()
        .into_athlete(Utc::now());
        db.insert_athlete(&athlete).await.unwrap();

        (ActivityService::new(db.clone()), db, athlete.id)
    }

    fn new_planned(athlete_id: Uuid) -> NewPlannedActivity {
        serde_json::from_value(serde_json::json!({
            "athlete_id": athlete_id,
            "name": "Threshold intervals",
            "type": "Ride",
            "goal": "Threshold",
            "scheduled_date": Utc.with_ymd_and_hms(2026, 1, 8, 17, 0, 0).unwrap(),
        }))
        .unwrap()
    }

    fn new_completed(athlete_id: Uuid) -> NewCompletedActivity {
        serde_json::from_value(serde_json::json!({
            "athlete_id": athlete_id,
            "source": "strava",
            "name": "Threshold intervals",
            "start_date": "2026-01-08T17:05:00Z",
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_requires_athlete() {
        let (service, _, _) = setup().await;

        let err = service
            .create_planned(new_planned(Uuid::new_v4()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let err = service
            .create_completed(new_completed(Uuid::new_v4()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_link_marks_plan_completed() {
        let (service, _, athlete_id) = setup().await;
        let planned = service.create_planned(new_planned(athlete_id)).await.unwrap();
        let completed = service
            .create_completed(new_completed(athlete_id))
            .await
            .unwrap();

        let linked = service.link_planned(planned.id, completed.id).await.unwrap();
        assert!(linked.completed);
        assert_eq!(linked.linked_activity_id, Some(completed.id));

        let stored = service.get_planned(planned.id).await.unwrap();
        assert_eq!(stored, linked);
    }

    #[tokio::test]
    async fn test_link_rejects_other_athletes_activity() {
        let (service, db, athlete_id) = setup().await;
        let other = serde_json::from_value::<NewAthlete>(serde_json::json!({
            "email": "other@example.com",
        }))
        .unwrap()
        .into_athlete(Utc::now());
        db.insert_athlete(&other).await.unwrap();

        let planned = service.create_planned(new_planned(athlete_id)).await.unwrap();
        let foreign = service.create_completed(new_completed(other.id)).await.unwrap();

        let err = service
            .link_planned(planned.id, foreign.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = service
            .link_planned(planned.id, Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_update_checks_link_target() {
        let (service, _, athlete_id) = setup().await;
        let planned = service.create_planned(new_planned(athlete_id)).await.unwrap();

        let update: PlannedActivityUpdate = serde_json::from_value(serde_json::json!({
            "linked_activity_id": Uuid::new_v4(),
        }))
        .unwrap();
        let err = service.update_planned(planned.id, update).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let clear: PlannedActivityUpdate =
            serde_json::from_value(serde_json::json!({"linked_activity_id": null})).unwrap();
        let updated = service.update_planned(planned.id, clear).await.unwrap();
        assert_eq!(updated.linked_activity_id, None);
    }

    #[tokio::test]
    async fn test_missing_ids_are_not_found() {
        let (service, _, _) = setup().await;
        let id = Uuid::new_v4();

        assert!(matches!(
            service.get_planned(id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            service.delete_planned(id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            service
                .update_completed(id, CompletedActivityUpdate::default())
                .await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            service.delete_completed(id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_completed_unlinks_plan() {
        let (service, _, athlete_id) = setup().await;
        let planned = service.create_planned(new_planned(athlete_id)).await.unwrap();
        let completed = service
            .create_completed(new_completed(athlete_id))
            .await
            .unwrap();
        service.link_planned(planned.id, completed.id).await.unwrap();

        service.delete_completed(completed.id).await.unwrap();

        let stored = service.get_planned(planned.id).await.unwrap();
        assert_eq!(stored.linked_activity_id, None);
        assert!(stored.completed);
    }

    #[tokio::test]
    async fn test_update_racing_athlete_delete_is_not_found() {
        let (service, db, athlete_id) = setup().await;
        let planned = service.create_planned(new_planned(athlete_id)).await.unwrap();

        let racing = ActivityService::new(Arc::new(CascadeAfterRead(db.as_ref().clone())));
        let rename: PlannedActivityUpdate =
            serde_json::from_value(serde_json::json!({"name": "Renamed"})).unwrap();
        let err = racing.update_planned(planned.id, rename).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        assert!(db.get_athlete(athlete_id).await.unwrap().is_none());
        assert!(db.get_planned_activity(planned.id).await.unwrap().is_none());
        assert!(db.list_planned_activities(athlete_id).await.unwrap().is_empty());
    }
}
