// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore integration tests.
//!
//! These tests require the Firestore emulator to be running and
//! FIRESTORE_EMULATOR_HOST to point at it. Without it every test is skipped.

use chrono::{TimeZone, Utc};
use serde_json::json;
use training_timeline::db::{AthleteStore, CompletedActivityStore, PlannedActivityStore};
use training_timeline::error::AppError;
use training_timeline::models::{
    Athlete, CompletedActivity, NewAthlete, NewCompletedActivity, NewPlannedActivity,
    PlannedActivity,
};
use training_timeline::time_utils::DateRange;
use uuid::Uuid;

mod common;
use common::test_db;

/// Helper to create an athlete with a unique email.
fn test_athlete() -> Athlete {
    serde_json::from_value::<NewAthlete>(json!({
        "email": format!("{}@example.com", Uuid::new_v4()),
        "name": "Emulator Athlete",
    }))
    .unwrap()
    .into_athlete(Utc::now())
}

fn test_planned(athlete_id: Uuid, day: u32) -> PlannedActivity {
    serde_json::from_value::<NewPlannedActivity>(json!({
        "athlete_id": athlete_id,
        "name": format!("Day {day}"),
        "type": "Run",
        "scheduled_date": Utc.with_ymd_and_hms(2026, 1, day, 7, 0, 0).unwrap(),
    }))
    .unwrap()
    .into_planned(Utc::now())
}

fn test_completed(athlete_id: Uuid, day: Option<u32>) -> CompletedActivity {
    serde_json::from_value::<NewCompletedActivity>(json!({
        "athlete_id": athlete_id,
        "source": "strava",
        "strava_id": Uuid::new_v4().to_string(),
        "start_date_local": day.map(|d| Utc.with_ymd_and_hms(2026, 1, d, 9, 0, 0).unwrap()),
    }))
    .unwrap()
    .into_completed(Utc::now())
}

fn january(first: u32, last: u32) -> DateRange {
    DateRange::new(
        Utc.with_ymd_and_hms(2026, 1, first, 0, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2026, 1, last, 23, 59, 59).unwrap(),
    )
}

// ═══════════════════════════════════════════════════════════════════════════
// ATHLETE TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_athlete_roundtrip_and_conflict() {
    require_emulator!();

    let db = test_db().await;
    let athlete = test_athlete();

    assert!(db.get_athlete(athlete.id).await.unwrap().is_none());
    db.insert_athlete(&athlete).await.unwrap();
    assert_eq!(db.get_athlete(athlete.id).await.unwrap(), Some(athlete.clone()));

    let mut twin = test_athlete();
    twin.email = athlete.email.clone();
    let err = db.insert_athlete(&twin).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn test_athlete_delete_cascades() {
    require_emulator!();

    let db = test_db().await;
    let athlete = test_athlete();
    db.insert_athlete(&athlete).await.unwrap();

    let planned = test_planned(athlete.id, 3);
    let completed = test_completed(athlete.id, Some(3));
    db.insert_planned_activity(&planned).await.unwrap();
    db.insert_completed_activity(&completed).await.unwrap();

    assert_eq!(db.delete_athlete(athlete.id).await.unwrap(), Some(3));
    assert!(db.get_planned_activity(planned.id).await.unwrap().is_none());
    assert!(db
        .get_completed_activity(completed.id)
        .await
        .unwrap()
        .is_none());
    assert_eq!(db.delete_athlete(athlete.id).await.unwrap(), None);
}

// ═══════════════════════════════════════════════════════════════════════════
// ACTIVITY TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_range_queries() {
    require_emulator!();

    let db = test_db().await;
    let athlete = test_athlete();
    db.insert_athlete(&athlete).await.unwrap();

    for day in [1, 5, 10] {
        db.insert_planned_activity(&test_planned(athlete.id, day))
            .await
            .unwrap();
    }
    for day in [Some(2), Some(11), None] {
        db.insert_completed_activity(&test_completed(athlete.id, day))
            .await
            .unwrap();
    }

    let planned = db
        .list_planned_activities_in_range(athlete.id, january(1, 5))
        .await
        .unwrap();
    assert_eq!(planned.len(), 2);

    let completed = db
        .list_completed_activities_in_range(athlete.id, january(1, 10))
        .await
        .unwrap();
    assert_eq!(completed.len(), 1);

    assert_eq!(db.list_completed_activities(athlete.id).await.unwrap().len(), 3);

    db.delete_athlete(athlete.id).await.unwrap();
}

#[tokio::test]
async fn test_completed_delete_clears_links() {
    require_emulator!();

    let db = test_db().await;
    let athlete = test_athlete();
    db.insert_athlete(&athlete).await.unwrap();

    let completed = test_completed(athlete.id, Some(4));
    db.insert_completed_activity(&completed).await.unwrap();
    let mut planned = test_planned(athlete.id, 4);
    planned.link(completed.id);
    db.insert_planned_activity(&planned).await.unwrap();

    assert!(db.delete_completed_activity(completed.id).await.unwrap());
    let stored = db
        .get_planned_activity(planned.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.linked_activity_id, None);
    assert!(stored.completed);

    assert!(!db.delete_completed_activity(completed.id).await.unwrap());
    db.delete_athlete(athlete.id).await.unwrap();
}

#[tokio::test]
async fn test_delete_unlinks_more_plans_than_one_transaction_holds() {
    require_emulator!();

    let db = test_db().await;
    let athlete = test_athlete();
    db.insert_athlete(&athlete).await.unwrap();
    let completed = test_completed(athlete.id, Some(8));
    db.insert_completed_activity(&completed).await.unwrap();

    let mut plans = Vec::new();
    for i in 0..450 {
        let mut planned = test_planned(athlete.id, 1 + i % 28);
        planned.link(completed.id);
        db.insert_planned_activity(&planned).await.unwrap();
        plans.push(planned.id);
    }

    assert!(db.delete_completed_activity(completed.id).await.unwrap());
    let remaining = db.list_planned_activities(athlete.id).await.unwrap();
    assert_eq!(remaining.len(), plans.len());
    assert!(remaining.iter().all(|p| p.linked_activity_id.is_none()));

    db.delete_athlete(athlete.id).await.unwrap();
}

// ═══════════════════════════════════════════════════════════════════════════
// CONCURRENCY TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_replace_after_cascade_writes_nothing() {
    require_emulator!();

    let db = test_db().await;
    let athlete = test_athlete();
    db.insert_athlete(&athlete).await.unwrap();
    let planned = test_planned(athlete.id, 12);
    db.insert_planned_activity(&planned).await.unwrap();

    let mut stale = db.get_planned_activity(planned.id).await.unwrap().unwrap();
    db.delete_athlete(athlete.id).await.unwrap();

    stale.name = "Edited".into();
    assert!(!db.replace_planned_activity(&stale).await.unwrap());
    assert!(db.get_planned_activity(planned.id).await.unwrap().is_none());
    assert!(!db.replace_athlete(&athlete).await.unwrap());
    assert!(db.get_athlete(athlete.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_replace_keeping_deleted_link_fails() {
    require_emulator!();

    let db = test_db().await;
    let athlete = test_athlete();
    db.insert_athlete(&athlete).await.unwrap();
    let completed = test_completed(athlete.id, Some(13));
    db.insert_completed_activity(&completed).await.unwrap();
    let planned = test_planned(athlete.id, 13);
    db.insert_planned_activity(&planned).await.unwrap();

    let mut stale = db.get_planned_activity(planned.id).await.unwrap().unwrap();
    stale.link(completed.id);
    db.delete_completed_activity(completed.id).await.unwrap();

    let err = db.replace_planned_activity(&stale).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    let stored = db.get_planned_activity(planned.id).await.unwrap().unwrap();
    assert_eq!(stored.linked_activity_id, None);

    db.delete_athlete(athlete.id).await.unwrap();
}

#[tokio::test]
async fn test_concurrent_imports_keep_platform_id_unique() {
    require_emulator!();

    let db = test_db().await;
    let athlete = test_athlete();
    db.insert_athlete(&athlete).await.unwrap();

    let first = test_completed(athlete.id, Some(14));
    let mut second = test_completed(athlete.id, Some(14));
    second.strava_id = first.strava_id.clone();

    let (a, b) = tokio::join!(
        db.insert_completed_activity(&first),
        db.insert_completed_activity(&second)
    );
    assert_eq!(
        [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count(),
        1,
        "{a:?} {b:?}"
    );
    assert_eq!(db.list_completed_activities(athlete.id).await.unwrap().len(), 1);

    db.delete_athlete(athlete.id).await.unwrap();
}

#[tokio::test]
async fn test_deleted_activity_releases_platform_id() {
    require_emulator!();

    let db = test_db().await;
    let athlete = test_athlete();
    db.insert_athlete(&athlete).await.unwrap();

    let original = test_completed(athlete.id, Some(15));
    db.insert_completed_activity(&original).await.unwrap();
    let mut reimport = test_completed(athlete.id, Some(15));
    reimport.strava_id = original.strava_id.clone();

    let err = db.insert_completed_activity(&reimport).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    assert!(db.delete_completed_activity(original.id).await.unwrap());
    db.insert_completed_activity(&reimport).await.unwrap();

    let mut renamed = reimport.clone();
    renamed.strava_id = Some(Uuid::new_v4().to_string());
    assert!(db.replace_completed_activity(&renamed).await.unwrap());
    db.insert_completed_activity(&original).await.unwrap();

    db.delete_athlete(athlete.id).await.unwrap();
}
