// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod athlete;
pub mod completed;
pub mod planned;
pub mod timeline;

pub use athlete::{Athlete, AthleteUpdate, NewAthlete};
pub use completed::{ActivitySource, CompletedActivity, CompletedActivityUpdate, NewCompletedActivity};
pub use planned::{ActivityGoal, ActivityType, NewPlannedActivity, PlannedActivity, PlannedActivityUpdate};
pub use timeline::{EventStatus, EventSummary, TimelineEvent, TimelineResponse};

use serde::{Deserialize, Deserializer};

/// Deserialize a field that distinguishes "absent" from "explicitly null".
///
/// Use with `#[serde(default, deserialize_with = "nullable")]` on an
/// `Option<Option<T>>`: absent → `None`, `null` → `Some(None)`,
/// value → `Some(Some(v))`.
pub(crate) fn nullable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Apply a partial-update field onto its target if it was present.
pub(crate) fn patch<T>(target: &mut T, value: Option<T>) {
    if let Some(v) = value {
        *target = v;
    }
}
