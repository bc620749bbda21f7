//! Cascading trip deletion with compensating rollback.
//!
//! The backing store has no multi-document transactions, so deleting a trip
//! and everything that references it is done in three steps:
//!
//! 1. check that the trip exists and belongs to the caller (no mutation yet),
//! 2. snapshot every child record in full,
//! 3. delete costs, lodgings, stops, trip days and finally the trip, one at a
//!    time and in that order.
//!
//! If any delete fails, the records already deleted are written back from
//! the snapshot. The caller gets [`TripDeletionError::DeletionFailed`] when
//! the rollback restored everything and
//! [`TripDeletionError::CriticalFailure`] when it did not.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::entity::{RepositoryError, Stored};
use crate::id::EntityId;
use crate::models::{Cost, Lodging, Stop, Trip, TripDay};
use crate::repos::{FamilyCounts, Repositories};
use crate::store::StoreError;

/// How rolled-back records get their identity back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RollbackIdentity {
    /// Recreate through `create`: new ids and fresh timestamps. Day
    /// references on restored stops and costs are rewritten to the new ids.
    #[default]
    Fresh,
    /// Write each record back at its original id with its original
    /// timestamps.
    Preserve,
}

impl fmt::Display for RollbackIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RollbackIdentity::Fresh => write!(f, "fresh"),
            RollbackIdentity::Preserve => write!(f, "preserve"),
        }
    }
}

impl FromStr for RollbackIdentity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fresh" => Ok(RollbackIdentity::Fresh),
            "preserve" => Ok(RollbackIdentity::Preserve),
            _ => Err(format!(
                "Invalid rollback identity: {}. Valid values: fresh, preserve",
                s
            )),
        }
    }
}

/// Best-effort reading of why a storage call failed.
///
/// Typed store errors map directly. Anything else is matched on its code and
/// message text, so the result is a hint for humans, not a contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCause {
    PermissionDenied,
    Unavailable,
    NotFound,
    Unknown,
}

const PERMISSION_HINTS: &[&str] = &["permission", "denied", "unauthorized", "forbidden"];
const UNAVAILABLE_HINTS: &[&str] = &[
    "unavailable",
    "network",
    "timeout",
    "timed out",
    "connection",
    "busy",
    "locked",
];
const NOT_FOUND_HINTS: &[&str] = &["not found", "not-found", "no such"];

impl FailureCause {
    pub fn classify(error: &RepositoryError) -> Self {
        match error.store_error() {
            Some(StoreError::PermissionDenied(_)) => FailureCause::PermissionDenied,
            Some(StoreError::Unavailable(_)) => FailureCause::Unavailable,
            Some(StoreError::NotFound { .. }) => FailureCause::NotFound,
            Some(StoreError::Backend { code, message }) => {
                Self::from_text(&format!("{} {}", code, message))
            }
            Some(StoreError::Malformed { .. }) | None => Self::from_text(&error.to_string()),
        }
    }

    fn from_text(text: &str) -> Self {
        let text = text.to_lowercase();
        let mentions = |hints: &[&str]| hints.iter().any(|hint| text.contains(hint));

        if mentions(PERMISSION_HINTS) {
            FailureCause::PermissionDenied
        } else if mentions(UNAVAILABLE_HINTS) {
            FailureCause::Unavailable
        } else if mentions(NOT_FOUND_HINTS) {
            FailureCause::NotFound
        } else {
            FailureCause::Unknown
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            FailureCause::PermissionDenied => "the store refused the operation",
            FailureCause::Unavailable => "the store is unavailable or the connection failed",
            FailureCause::NotFound => "a record disappeared while deleting",
            FailureCause::Unknown => "unexpected storage error",
        }
    }
}

impl fmt::Display for FailureCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// A record the rollback could not write back.
#[derive(Debug)]
pub struct RollbackFailure {
    pub collection: &'static str,
    pub original_id: EntityId,
    pub error: RepositoryError,
}

impl fmt::Display for RollbackFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}: {}", self.collection, self.original_id, self.error)
    }
}

#[derive(Error, Debug)]
pub enum TripDeletionError {
    #[error("Trip not found: {0}")]
    NotFound(EntityId),

    #[error("User '{user_id}' is not allowed to delete trip {trip_id}")]
    PermissionDenied { trip_id: EntityId, user_id: String },

    /// Failure before anything was deleted (reading the trip or the snapshot).
    #[error(transparent)]
    Storage(#[from] RepositoryError),

    #[error("Could not delete trip {trip_id} ({cause}); {restored} deleted record(s) were restored")]
    DeletionFailed {
        trip_id: EntityId,
        cause: FailureCause,
        restored: usize,
        #[source]
        source: RepositoryError,
    },

    #[error(
        "Could not delete trip {trip_id} ({cause}) and {failed} of {attempted} record(s) could not be restored; the trip may be partially deleted",
        failed = .rollback_errors.len()
    )]
    CriticalFailure {
        trip_id: EntityId,
        cause: FailureCause,
        attempted: usize,
        rollback_errors: Vec<RollbackFailure>,
        #[source]
        source: RepositoryError,
    },
}

impl TripDeletionError {
    /// True when data may have been lost and someone has to look at it.
    pub fn is_critical(&self) -> bool {
        matches!(self, TripDeletionError::CriticalFailure { .. })
    }

    pub fn cause(&self) -> Option<FailureCause> {
        match self {
            TripDeletionError::DeletionFailed { cause, .. }
            | TripDeletionError::CriticalFailure { cause, .. } => Some(*cause),
            TripDeletionError::Storage(e) => Some(FailureCause::classify(e)),
            _ => None,
        }
    }
}

/// What a successful cascade removed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CascadeSummary {
    pub trip_id: EntityId,
    pub trip_name: String,
    pub deleted: FamilyCounts,
}

impl fmt::Display for CascadeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Deleted trip '{}' ({}) with {}",
            self.trip_name, self.trip_id, self.deleted
        )
    }
}

/// A child record captured before deletion, in full.
#[derive(Debug, Clone)]
enum ChildRecord {
    Cost(Stored<Cost>),
    Lodging(Stored<Lodging>),
    Stop(Stored<Stop>),
    Day(Stored<TripDay>),
}

impl ChildRecord {
    fn id(&self) -> &EntityId {
        match self {
            ChildRecord::Cost(r) => &r.id,
            ChildRecord::Lodging(r) => &r.id,
            ChildRecord::Stop(r) => &r.id,
            ChildRecord::Day(r) => &r.id,
        }
    }

    fn collection(&self, repos: &Repositories) -> &'static str {
        match self {
            ChildRecord::Cost(_) => repos.costs.collection(),
            ChildRecord::Lodging(_) => repos.lodgings.collection(),
            ChildRecord::Stop(_) => repos.stops.collection(),
            ChildRecord::Day(_) => repos.days.collection(),
        }
    }

    /// Days before anything that may point at them.
    fn restore_rank(&self) -> u8 {
        match self {
            ChildRecord::Day(_) => 0,
            ChildRecord::Stop(_) => 1,
            ChildRecord::Lodging(_) => 2,
            ChildRecord::Cost(_) => 3,
        }
    }

    async fn delete(&self, repos: &Repositories) -> Result<(), RepositoryError> {
        match self {
            ChildRecord::Cost(r) => repos.costs.delete(&r.id).await,
            ChildRecord::Lodging(r) => repos.lodgings.delete(&r.id).await,
            ChildRecord::Stop(r) => repos.stops.delete(&r.id).await,
            ChildRecord::Day(r) => repos.days.delete(&r.id).await,
        }
    }
}

struct Snapshot {
    trip: Stored<Trip>,
    children: Vec<ChildRecord>,
    counts: FamilyCounts,
}

#[derive(Default)]
struct RollbackOutcome {
    restored: usize,
    failures: Vec<RollbackFailure>,
}

/// Deletes a trip and all of its children.
pub struct TripDeletion<'a> {
    repos: &'a Repositories,
    identity: RollbackIdentity,
}

impl<'a> TripDeletion<'a> {
    pub fn new(repos: &'a Repositories) -> Self {
        Self {
            repos,
            identity: RollbackIdentity::default(),
        }
    }

    pub fn with_identity(mut self, identity: RollbackIdentity) -> Self {
        self.identity = identity;
        self
    }

    pub async fn delete_trip(
        &self,
        trip_id: &EntityId,
        user_id: &str,
    ) -> Result<CascadeSummary, TripDeletionError> {
        let trip = self
            .repos
            .trips
            .read(trip_id)
            .await?
            .ok_or_else(|| TripDeletionError::NotFound(trip_id.clone()))?;

        if trip.data.user_id != user_id {
            tracing::warn!(%trip_id, user_id, "Refusing to delete trip owned by another user");
            return Err(TripDeletionError::PermissionDenied {
                trip_id: trip_id.clone(),
                user_id: user_id.to_string(),
            });
        }

        tracing::info!(%trip_id, "Taking snapshot of trip records");
        let snapshot = self.snapshot(trip).await?;
        tracing::info!(%trip_id, records = %snapshot.counts, "Snapshot taken");

        let mut deleted = Vec::with_capacity(snapshot.children.len());
        match self.delete_all(&snapshot, &mut deleted).await {
            Ok(()) => {
                tracing::info!(%trip_id, records = %snapshot.counts, "Trip deleted");
                Ok(CascadeSummary {
                    trip_id: trip_id.clone(),
                    trip_name: snapshot.trip.data.name,
                    deleted: snapshot.counts,
                })
            }
            Err(source) => Err(self.recover(trip_id, source, deleted).await),
        }
    }

    async fn snapshot(&self, trip: Stored<Trip>) -> Result<Snapshot, RepositoryError> {
        let (costs, lodgings, stops, days) = futures::try_join!(
            self.repos.costs.list_by_trip(&trip.id),
            self.repos.lodgings.list_by_trip(&trip.id),
            self.repos.stops.list_by_trip(&trip.id),
            self.repos.days.list_by_trip(&trip.id),
        )?;

        let counts = FamilyCounts {
            days: days.len(),
            stops: stops.len(),
            lodgings: lodgings.len(),
            costs: costs.len(),
        };

        // deletion order
        let children = costs
            .into_iter()
            .map(ChildRecord::Cost)
            .chain(lodgings.into_iter().map(ChildRecord::Lodging))
            .chain(stops.into_iter().map(ChildRecord::Stop))
            .chain(days.into_iter().map(ChildRecord::Day))
            .collect();

        Ok(Snapshot {
            trip,
            children,
            counts,
        })
    }

    /// Stops at the first failure. `deleted` holds everything removed so far.
    async fn delete_all(
        &self,
        snapshot: &Snapshot,
        deleted: &mut Vec<ChildRecord>,
    ) -> Result<(), RepositoryError> {
        for record in &snapshot.children {
            record.delete(self.repos).await?;
            tracing::debug!(
                collection = record.collection(self.repos),
                id = %record.id(),
                "Deleted"
            );
            deleted.push(record.clone());
        }

        self.repos.trips.delete(&snapshot.trip.id).await
    }

    async fn recover(
        &self,
        trip_id: &EntityId,
        source: RepositoryError,
        deleted: Vec<ChildRecord>,
    ) -> TripDeletionError {
        let cause = FailureCause::classify(&source);
        let attempted = deleted.len();
        tracing::warn!(
            %trip_id,
            error = %source,
            %cause,
            to_restore = attempted,
            identity = %self.identity,
            "Trip deletion failed, rolling back"
        );

        let outcome = self.rollback(deleted).await;

        if outcome.failures.is_empty() {
            tracing::info!(%trip_id, restored = outcome.restored, "Rollback complete");
            TripDeletionError::DeletionFailed {
                trip_id: trip_id.clone(),
                cause,
                restored: outcome.restored,
                source,
            }
        } else {
            tracing::error!(
                %trip_id,
                restored = outcome.restored,
                failed = outcome.failures.len(),
                "Rollback incomplete, trip data may be partially deleted"
            );
            TripDeletionError::CriticalFailure {
                trip_id: trip_id.clone(),
                cause,
                attempted,
                rollback_errors: outcome.failures,
                source,
            }
        }
    }

    /// Writes every deleted record back, continuing past failures.
    async fn rollback(&self, mut deleted: Vec<ChildRecord>) -> RollbackOutcome {
        deleted.sort_by_key(ChildRecord::restore_rank);

        let mut outcome = RollbackOutcome::default();
        let mut day_ids: HashMap<EntityId, EntityId> = HashMap::new();

        for record in deleted {
            let original_id = record.id().clone();
            let collection = record.collection(self.repos);

            match self.restore(&record, &mut day_ids).await {
                Ok(()) => outcome.restored += 1,
                Err(error) => {
                    tracing::error!(collection, id = %original_id, %error, "Could not restore record");
                    outcome.failures.push(RollbackFailure {
                        collection,
                        original_id,
                        error,
                    });
                }
            }
        }

        outcome
    }

    async fn restore(
        &self,
        record: &ChildRecord,
        day_ids: &mut HashMap<EntityId, EntityId>,
    ) -> Result<(), RepositoryError> {
        let repos = self.repos;
        if self.identity == RollbackIdentity::Preserve {
            return match record {
                ChildRecord::Cost(r) => repos.costs.restore(r).await,
                ChildRecord::Lodging(r) => repos.lodgings.restore(r).await,
                ChildRecord::Stop(r) => repos.stops.restore(r).await,
                ChildRecord::Day(r) => repos.days.restore(r).await,
            };
        }

        match record {
            ChildRecord::Day(r) => {
                let new_id = repos.days.create(&r.data).await?;
                day_ids.insert(r.id.clone(), new_id);
            }
            ChildRecord::Stop(r) => {
                let mut stop = r.data.clone();
                if let Some(new_day) = day_ids.get(&stop.day_id) {
                    stop.day_id = new_day.clone();
                }
                repos.stops.create(&stop).await?;
            }
            ChildRecord::Lodging(r) => {
                repos.lodgings.create(&r.data).await?;
            }
            ChildRecord::Cost(r) => {
                let mut cost = r.data.clone();
                if let Some(new_day) = cost.day_id.as_ref().and_then(|d| day_ids.get(d)) {
                    cost.day_id = Some(new_day.clone());
                }
                repos.costs.create(&cost).await?;
            }
        }
        Ok(())
    }
}
