// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Athletes (profile storage, cascading delete)
//! - Planned activities
//! - Completed activities (uniqueness of platform ids, link clearing)
//!
//! Dates are stored as RFC 3339 strings, which do not order reliably in
//! Firestore, so range filters run in process over the athlete's documents.
//!
//! Unique fields are reserved with one document per value in
//! `unique_keys`, written in the same transaction as the record that owns
//! it. Replaces read the current document inside their transaction and write
//! with an exists precondition, so a concurrent delete is never undone.

use super::{
    athlete_keys, collections, completed_in_range, completed_keys, conflict, missing_link,
    AthleteStore, CompletedActivityStore, PlannedActivityStore,
};
use crate::error::AppError;
use crate::models::{Athlete, CompletedActivity, PlannedActivity};
use crate::time_utils::DateRange;
use async_trait::async_trait;
use firestore::errors::FirestoreError;
use firestore::{FirestoreConsistencySelector, FirestoreTransaction, FirestoreWritePrecondition};
use futures_util::{future, TryStreamExt};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// Firestore limits batch/transaction writes to 500 operations.
// We use a safe limit of 400 to allow headroom.
const BATCH_SIZE: usize = 400;

fn db_err(e: impl std::fmt::Display) -> AppError {
    AppError::Database(e.to_string())
}

fn tx_err(e: impl std::fmt::Display) -> AppError {
    AppError::Database(format!("Failed to add write to transaction: {}", e))
}

/// Owner of one unique field value.
#[derive(Debug, Serialize, Deserialize)]
struct UniqueKey {
    collection: String,
    field: String,
    value: String,
    owner: Uuid,
}

/// Document id of the reservation for `value` in `collection.field`.
fn unique_key_id(collection: &str, field: &str, value: &str) -> Uuid {
    Uuid::new_v5(
        &Uuid::NAMESPACE_OID,
        format!("{collection}/{field}/{value}").as_bytes(),
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriteMode {
    Insert,
    Replace,
}

/// One write in a chunked batch.
enum BatchOp<'a> {
    Delete(&'static str, Uuid),
    /// Clear `linked_activity_id` on a planned activity that still exists.
    Unlink(&'a PlannedActivity),
}

/// Read a document, inside a transaction when `client` carries one.
async fn read_doc<T>(
    client: &firestore::FirestoreDb,
    collection: &str,
    id: Uuid,
) -> Result<Option<T>, AppError>
where
    T: DeserializeOwned + Send,
{
    client
        .fluent()
        .select()
        .by_id_in(collection)
        .obj()
        .one(&id.to_string())
        .await
        .map_err(db_err)
}

/// Stage a record write plus its key reservations.
///
/// Returns `false` when a replace finds the record gone; nothing is staged
/// then.
async fn stage_unique<T>(
    reader: &firestore::FirestoreDb,
    transaction: &mut FirestoreTransaction<'_>,
    collection: &'static str,
    id: Uuid,
    doc: &T,
    keys_of: fn(&T) -> Vec<(&'static str, String)>,
    mode: WriteMode,
) -> Result<bool, AppError>
where
    T: Serialize + DeserializeOwned + Send + Sync,
{
    let existing: Option<T> = read_doc(reader, collection, id).await?;
    let old_keys = match (mode, existing) {
        (WriteMode::Insert, Some(_)) => return Err(conflict(collection, "id", &id.to_string())),
        (WriteMode::Replace, None) => return Ok(false),
        (_, existing) => existing.as_ref().map(keys_of).unwrap_or_default(),
    };
    let new_keys = keys_of(doc);

    for (field, value) in new_keys.iter().filter(|key| !old_keys.contains(key)) {
        let key_id = unique_key_id(collection, field, value);
        let holder: Option<UniqueKey> = read_doc(reader, collections::UNIQUE_KEYS, key_id).await?;
        match holder {
            Some(holder) if holder.owner != id => return Err(conflict(collection, field, value)),
            Some(_) => continue,
            None => {}
        }

        let key = UniqueKey {
            collection: collection.to_string(),
            field: field.to_string(),
            value: value.clone(),
            owner: id,
        };
        reader
            .fluent()
            .update()
            .in_col(collections::UNIQUE_KEYS)
            .precondition(FirestoreWritePrecondition::Exists(false))
            .document_id(key_id.to_string())
            .object(&key)
            .add_to_transaction(transaction)
            .map_err(tx_err)?;
    }

    for (field, value) in old_keys.iter().filter(|key| !new_keys.contains(key)) {
        reader
            .fluent()
            .delete()
            .from(collections::UNIQUE_KEYS)
            .document_id(unique_key_id(collection, field, value).to_string())
            .add_to_transaction(transaction)
            .map_err(tx_err)?;
    }

    reader
        .fluent()
        .update()
        .in_col(collection)
        .precondition(FirestoreWritePrecondition::Exists(mode == WriteMode::Replace))
        .document_id(id.to_string())
        .object(doc)
        .add_to_transaction(transaction)
        .map_err(tx_err)?;

    Ok(true)
}

/// Stage a planned activity replace. The link target is read in the same
/// transaction, so a concurrent delete of it aborts the commit.
async fn stage_planned_replace(
    reader: &firestore::FirestoreDb,
    transaction: &mut FirestoreTransaction<'_>,
    activity: &PlannedActivity,
) -> Result<bool, AppError> {
    let current: Option<PlannedActivity> =
        read_doc(reader, collections::PLANNED_ACTIVITIES, activity.id).await?;
    if current.is_none() {
        return Ok(false);
    }

    if let Some(completed_id) = activity.linked_activity_id {
        let target: Option<CompletedActivity> =
            read_doc(reader, collections::COMPLETED_ACTIVITIES, completed_id).await?;
        if target.is_none() {
            return Err(missing_link(completed_id));
        }
    }

    reader
        .fluent()
        .update()
        .in_col(collections::PLANNED_ACTIVITIES)
        .precondition(FirestoreWritePrecondition::Exists(true))
        .document_id(activity.id.to_string())
        .object(activity)
        .add_to_transaction(transaction)
        .map_err(tx_err)?;

    Ok(true)
}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create an offline client for testing.
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    /// Begin a transaction, plus a client whose reads run inside it.
    async fn begin(
        &self,
    ) -> Result<(FirestoreTransaction<'_>, firestore::FirestoreDb), AppError> {
        let client = self.get_client()?;
        let transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;
        let reader = client.clone_with_consistency_selector(
            FirestoreConsistencySelector::Transaction(transaction.transaction_id().clone()),
        );
        Ok((transaction, reader))
    }

    // ─── Generic Helpers ─────────────────────────────────────────

    async fn get_doc<T>(&self, collection: &str, id: Uuid) -> Result<Option<T>, AppError>
    where
        T: DeserializeOwned + Send,
    {
        read_doc(self.get_client()?, collection, id).await
    }

    /// Commit what `staged` wrote, or roll back if it wrote nothing or failed.
    ///
    /// A precondition failure at commit means a concurrent writer got there
    /// first: a missing document reports `false`, a taken one `Conflict`.
    async fn finish(
        transaction: FirestoreTransaction<'_>,
        collection: &str,
        staged: Result<bool, AppError>,
    ) -> Result<bool, AppError> {
        match staged {
            Ok(true) => match transaction.commit().await {
                Ok(_) => Ok(true),
                Err(FirestoreError::DataNotFoundError(_)) => Ok(false),
                Err(FirestoreError::DataConflictError(_)) => Err(AppError::Conflict(format!(
                    "{collection} changed concurrently, retry the request"
                ))),
                Err(e) => Err(AppError::Database(format!("Transaction commit failed: {}", e))),
            },
            other => {
                if let Err(e) = transaction.rollback().await {
                    tracing::warn!(error = %e, collection, "Transaction rollback failed");
                }
                other
            }
        }
    }

    /// Write a record and its unique-key reservations in one transaction.
    async fn put_unique<T>(
        &self,
        collection: &'static str,
        id: Uuid,
        doc: &T,
        keys_of: fn(&T) -> Vec<(&'static str, String)>,
        mode: WriteMode,
    ) -> Result<bool, AppError>
    where
        T: Serialize + DeserializeOwned + Send + Sync,
    {
        let (mut transaction, reader) = self.begin().await?;
        let staged = stage_unique(&reader, &mut transaction, collection, id, doc, keys_of, mode).await;
        Self::finish(transaction, collection, staged).await
    }

    /// All documents in `collection` whose `field` equals `value`.
    async fn find_by_field<T>(
        &self,
        collection: &str,
        field: &'static str,
        value: String,
    ) -> Result<Vec<T>, AppError>
    where
        T: DeserializeOwned + Send,
    {
        self.get_client()?
            .fluent()
            .select()
            .from(collection)
            .filter(move |q| q.field(field).eq(value.clone()))
            .obj()
            .query()
            .await
            .map_err(db_err)
    }

    /// Documents owned by an athlete, filtered in process by `keep`.
    async fn owned_by<T, F>(
        &self,
        collection: &str,
        athlete_id: Uuid,
        mut keep: F,
    ) -> Result<Vec<T>, AppError>
    where
        T: DeserializeOwned + Send + 'static,
        F: FnMut(&T) -> bool + Send,
    {
        self.get_client()?
            .fluent()
            .select()
            .from(collection)
            .filter(move |q| q.field("athlete_id").eq(athlete_id.to_string()))
            .obj::<T>()
            .stream_query_with_errors()
            .await
            .map_err(db_err)?
            .map_err(db_err)
            .try_filter(|doc| future::ready(keep(doc)))
            .try_collect()
            .await
    }

    /// Apply writes in transactions of at most `BATCH_SIZE` operations.
    ///
    /// Chunks commit in order, so operations listed last only happen once
    /// every earlier chunk has committed.
    async fn commit_in_chunks(&self, ops: &[BatchOp<'_>]) -> Result<(), AppError> {
        let client = self.get_client()?;

        for chunk in ops.chunks(BATCH_SIZE) {
            let mut transaction = client
                .begin_transaction()
                .await
                .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

            for op in chunk {
                match op {
                    BatchOp::Delete(collection, id) => {
                        client
                            .fluent()
                            .delete()
                            .from(*collection)
                            .document_id(id.to_string())
                            .add_to_transaction(&mut transaction)
                            .map_err(tx_err)?;
                    }
                    BatchOp::Unlink(planned) => {
                        client
                            .fluent()
                            .update()
                            .fields(["linked_activity_id"])
                            .in_col(collections::PLANNED_ACTIVITIES)
                            .precondition(FirestoreWritePrecondition::Exists(true))
                            .document_id(planned.id.to_string())
                            .object(*planned)
                            .add_to_transaction(&mut transaction)
                            .map_err(tx_err)?;
                    }
                }
            }

            transaction.commit().await.map_err(|e| match e {
                FirestoreError::DataNotFoundError(_) => AppError::Conflict(
                    "a document changed during a batched write, retry the request".to_string(),
                ),
                other => AppError::Database(format!("Failed to commit batch: {}", other)),
            })?;
        }

        Ok(())
    }
}

fn key_deletes<'a>(
    collection: &'static str,
    keys: Vec<(&'static str, String)>,
) -> impl Iterator<Item = BatchOp<'a>> {
    keys.into_iter().map(move |(field, value)| {
        BatchOp::Delete(
            collections::UNIQUE_KEYS,
            unique_key_id(collection, field, &value),
        )
    })
}

// ─── Athlete Operations ──────────────────────────────────────

#[async_trait]
impl AthleteStore for FirestoreDb {
    async fn get_athlete(&self, id: Uuid) -> Result<Option<Athlete>, AppError> {
        self.get_doc(collections::ATHLETES, id).await
    }

    async fn insert_athlete(&self, athlete: &Athlete) -> Result<(), AppError> {
        self.put_unique(
            collections::ATHLETES,
            athlete.id,
            athlete,
            athlete_keys,
            WriteMode::Insert,
        )
        .await?;
        Ok(())
    }

    async fn replace_athlete(&self, athlete: &Athlete) -> Result<bool, AppError> {
        self.put_unique(
            collections::ATHLETES,
            athlete.id,
            athlete,
            athlete_keys,
            WriteMode::Replace,
        )
        .await
    }

    /// Cascade: planned activities, completed activities and their key
    /// reservations, then the athlete and its own reservations.
    async fn delete_athlete(&self, id: Uuid) -> Result<Option<usize>, AppError> {
        let Some(athlete) = self.get_athlete(id).await? else {
            return Ok(None);
        };

        let planned: Vec<PlannedActivity> = self
            .owned_by(collections::PLANNED_ACTIVITIES, id, |_: &PlannedActivity| true)
            .await?;
        let completed: Vec<CompletedActivity> = self
            .owned_by(collections::COMPLETED_ACTIVITIES, id, |_: &CompletedActivity| {
                true
            })
            .await?;

        let mut ops: Vec<BatchOp<'_>> = planned
            .iter()
            .map(|p| BatchOp::Delete(collections::PLANNED_ACTIVITIES, p.id))
            .collect();
        for c in &completed {
            ops.extend(key_deletes(collections::COMPLETED_ACTIVITIES, completed_keys(c)));
            ops.push(BatchOp::Delete(collections::COMPLETED_ACTIVITIES, c.id));
        }
        ops.extend(key_deletes(collections::ATHLETES, athlete_keys(&athlete)));
        ops.push(BatchOp::Delete(collections::ATHLETES, id));

        self.commit_in_chunks(&ops).await?;

        let deleted = 1 + planned.len() + completed.len();
        tracing::info!(
            athlete_id = %id,
            planned = planned.len(),
            completed = completed.len(),
            "Athlete deleted with all activities"
        );

        Ok(Some(deleted))
    }
}

// ─── Planned Activity Operations ─────────────────────────────

#[async_trait]
impl PlannedActivityStore for FirestoreDb {
    async fn get_planned_activity(&self, id: Uuid) -> Result<Option<PlannedActivity>, AppError> {
        self.get_doc(collections::PLANNED_ACTIVITIES, id).await
    }

    async fn list_planned_activities(
        &self,
        athlete_id: Uuid,
    ) -> Result<Vec<PlannedActivity>, AppError> {
        self.owned_by(collections::PLANNED_ACTIVITIES, athlete_id, |_: &PlannedActivity| {
            true
        })
        .await
    }

    async fn list_planned_activities_in_range(
        &self,
        athlete_id: Uuid,
        range: DateRange,
    ) -> Result<Vec<PlannedActivity>, AppError> {
        self.owned_by(
            collections::PLANNED_ACTIVITIES,
            athlete_id,
            move |p: &PlannedActivity| range.contains(p.scheduled_date),
        )
        .await
    }

    async fn insert_planned_activity(&self, activity: &PlannedActivity) -> Result<(), AppError> {
        let result: Result<PlannedActivity, FirestoreError> = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::PLANNED_ACTIVITIES)
            .precondition(FirestoreWritePrecondition::Exists(false))
            .document_id(activity.id.to_string())
            .object(activity)
            .execute()
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(FirestoreError::DataConflictError(_)) => Err(conflict(
                collections::PLANNED_ACTIVITIES,
                "id",
                &activity.id.to_string(),
            )),
            Err(e) => Err(db_err(e)),
        }
    }

    async fn replace_planned_activity(
        &self,
        activity: &PlannedActivity,
    ) -> Result<bool, AppError> {
        let (mut transaction, reader) = self.begin().await?;
        let staged = stage_planned_replace(&reader, &mut transaction, activity).await;
        Self::finish(transaction, collections::PLANNED_ACTIVITIES, staged).await
    }

    async fn delete_planned_activity(&self, id: Uuid) -> Result<bool, AppError> {
        let result = self
            .get_client()?
            .fluent()
            .delete()
            .from(collections::PLANNED_ACTIVITIES)
            .document_id(id.to_string())
            .precondition(FirestoreWritePrecondition::Exists(true))
            .execute()
            .await;

        match result {
            Ok(()) => Ok(true),
            Err(FirestoreError::DataNotFoundError(_)) => Ok(false),
            Err(e) => Err(db_err(e)),
        }
    }
}

// ─── Completed Activity Operations ───────────────────────────

#[async_trait]
impl CompletedActivityStore for FirestoreDb {
    async fn get_completed_activity(
        &self,
        id: Uuid,
    ) -> Result<Option<CompletedActivity>, AppError> {
        self.get_doc(collections::COMPLETED_ACTIVITIES, id).await
    }

    async fn list_completed_activities(
        &self,
        athlete_id: Uuid,
    ) -> Result<Vec<CompletedActivity>, AppError> {
        self.owned_by(
            collections::COMPLETED_ACTIVITIES,
            athlete_id,
            |_: &CompletedActivity| true,
        )
        .await
    }

    async fn list_completed_activities_in_range(
        &self,
        athlete_id: Uuid,
        range: DateRange,
    ) -> Result<Vec<CompletedActivity>, AppError> {
        self.owned_by(
            collections::COMPLETED_ACTIVITIES,
            athlete_id,
            move |c: &CompletedActivity| completed_in_range(c, &range),
        )
        .await
    }

    async fn insert_completed_activity(
        &self,
        activity: &CompletedActivity,
    ) -> Result<(), AppError> {
        self.put_unique(
            collections::COMPLETED_ACTIVITIES,
            activity.id,
            activity,
            completed_keys,
            WriteMode::Insert,
        )
        .await?;
        Ok(())
    }

    async fn replace_completed_activity(
        &self,
        activity: &CompletedActivity,
    ) -> Result<bool, AppError> {
        self.put_unique(
            collections::COMPLETED_ACTIVITIES,
            activity.id,
            activity,
            completed_keys,
            WriteMode::Replace,
        )
        .await
    }

    /// Unlink referencing plans, then delete the activity and its key
    /// reservations in the last chunk.
    async fn delete_completed_activity(&self, id: Uuid) -> Result<bool, AppError> {
        let Some(activity) = self.get_completed_activity(id).await? else {
            return Ok(false);
        };

        let mut linked: Vec<PlannedActivity> = self
            .find_by_field(
                collections::PLANNED_ACTIVITIES,
                "linked_activity_id",
                id.to_string(),
            )
            .await?;
        for planned in &mut linked {
            planned.linked_activity_id = None;
        }

        let mut ops: Vec<BatchOp<'_>> = linked.iter().map(BatchOp::Unlink).collect();
        ops.extend(key_deletes(
            collections::COMPLETED_ACTIVITIES,
            completed_keys(&activity),
        ));
        ops.push(BatchOp::Delete(collections::COMPLETED_ACTIVITIES, id));

        self.commit_in_chunks(&ops).await?;

        tracing::debug!(completed_id = %id, unlinked = linked.len(), "Deleted completed activity");
        Ok(true)
    }
}
