//! Trip Journal Core Library
//!
//! Document-store persistence for trips and their days, stops, lodging and
//! costs, plus cascading trip deletion with rollback.

pub mod cascade;
pub mod entity;
pub mod id;
pub mod models;
pub mod repos;
pub mod store;

pub use cascade::{
    CascadeSummary, FailureCause, RollbackFailure, RollbackIdentity, TripDeletion,
    TripDeletionError,
};
pub use entity::{Entity, EntityStore, Operation, RepositoryError, Stored, TripScoped};
pub use id::{EntityId, IdError};
pub use models::{
    Cost, CostKind, Location, Lodging, Stop, Trip, TripDay, TripDayPatch, TripPatch, TripStatus,
};
pub use repos::{
    CostRepository, CostSummary, CurrencyTotals, FamilyCounts, LodgingRepository, Repositories,
    StopRepository, TripDayRepository, TripRepository,
};
pub use store::{
    Constraint, Direction, Document, DocumentStore, MemoryDocumentStore, StoreError,
};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
