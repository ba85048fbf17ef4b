// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Timeline aggregation.
//!
//! Merges an athlete's planned and completed activities inside a date window
//! into one chronologically ordered list of events:
//! 1. Fetch both activity kinds concurrently
//! 2. Project each record into a `TimelineEvent`
//! 3. Stable-sort by event date

use crate::db::Store;
use crate::error::Result;
use crate::models::{CompletedActivity, PlannedActivity, TimelineEvent};
use crate::time_utils::DateRange;
use std::sync::Arc;
use uuid::Uuid;

/// Builds merged timelines from the activity stores.
#[derive(Clone)]
pub struct TimelineService {
    db: Arc<dyn Store>,
}

impl TimelineService {
    pub fn new(db: Arc<dyn Store>) -> Self {
        Self { db }
    }

    /// All events for `athlete_id` inside `range`, oldest first.
    ///
    /// The athlete is not looked up: an unknown id yields an empty timeline.
    /// Any store failure fails the whole call.
    pub async fn events(&self, athlete_id: Uuid, range: DateRange) -> Result<Vec<TimelineEvent>> {
        let (planned, completed) = tokio::try_join!(
            self.db.list_planned_activities_in_range(athlete_id, range),
            self.db.list_completed_activities_in_range(athlete_id, range),
        )?;

        tracing::debug!(
            athlete_id = %athlete_id,
            planned = planned.len(),
            completed = completed.len(),
            "Merging timeline"
        );

        Ok(merge_events(planned, completed))
    }
}

/// Project and merge both activity kinds into one ordered event list.
///
/// Planned events are appended before completed ones and the sort is
/// stable, so on equal dates a plan precedes the recorded activity.
/// Completed activities without any start date are dropped.
pub fn merge_events(
    planned: Vec<PlannedActivity>,
    completed: Vec<CompletedActivity>,
) -> Vec<TimelineEvent> {
    let mut events: Vec<TimelineEvent> = Vec::with_capacity(planned.len() + completed.len());
    events.extend(planned.into_iter().map(TimelineEvent::from));
    events.extend(completed.into_iter().filter_map(TimelineEvent::from_completed));

    events.sort_by_key(|e| e.date);
    events
}
