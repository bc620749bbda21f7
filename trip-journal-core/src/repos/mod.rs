//! Per-entity repositories.
//!
//! Each repository is an [`EntityStore`] for one model plus query helpers
//! built from [`Constraint`]s.

mod cost_repo;
mod day_repo;
mod lodging_repo;
mod stop_repo;
mod trip_repo;

pub use cost_repo::{CostRepository, CostSummary, CurrencyTotals};
pub use day_repo::TripDayRepository;
pub use lodging_repo::LodgingRepository;
pub use stop_repo::StopRepository;
pub use trip_repo::TripRepository;

use serde::Serialize;
use std::fmt;
use std::sync::Arc;

use crate::entity::{EntityStore, RepositoryError, Stored, TripScoped};
use crate::id::EntityId;
use crate::store::{Clock, Constraint, DocumentStore, SystemClock};

pub const TRIP_ID: &str = "tripId";

impl<T: TripScoped> EntityStore<T> {
    /// All records belonging to a trip, in the entity's default trip order.
    pub async fn list_by_trip(&self, trip_id: &EntityId) -> Result<Vec<Stored<T>>, RepositoryError> {
        let mut constraints = vec![Constraint::where_eq(TRIP_ID, trip_id.as_str())];
        if let Some((field, direction)) = T::TRIP_ORDER {
            constraints.push(Constraint::order_by(field, direction));
        }
        self.list(&constraints).await
    }

    pub async fn count_by_trip(&self, trip_id: &EntityId) -> Result<usize, RepositoryError> {
        self.count(&[Constraint::where_eq(TRIP_ID, trip_id.as_str())])
            .await
    }
}

/// One repository per collection, all sharing a backend and clock.
#[derive(Clone)]
pub struct Repositories {
    pub trips: TripRepository,
    pub days: TripDayRepository,
    pub stops: StopRepository,
    pub lodgings: LodgingRepository,
    pub costs: CostRepository,
}

impl Repositories {
    pub fn new(backend: Arc<dyn DocumentStore>) -> Self {
        Self::with_clock(backend, Arc::new(SystemClock::new()))
    }

    pub fn with_clock(backend: Arc<dyn DocumentStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            trips: EntityStore::with_clock(Arc::clone(&backend), Arc::clone(&clock)),
            days: EntityStore::with_clock(Arc::clone(&backend), Arc::clone(&clock)),
            stops: EntityStore::with_clock(Arc::clone(&backend), Arc::clone(&clock)),
            lodgings: EntityStore::with_clock(Arc::clone(&backend), Arc::clone(&clock)),
            costs: EntityStore::with_clock(backend, clock),
        }
    }

    /// Child record counts for a trip, computed on demand.
    pub async fn family_counts(&self, trip_id: &EntityId) -> Result<FamilyCounts, RepositoryError> {
        let (days, stops, lodgings, costs) = futures::try_join!(
            self.days.count_by_trip(trip_id),
            self.stops.count_by_trip(trip_id),
            self.lodgings.count_by_trip(trip_id),
            self.costs.count_by_trip(trip_id),
        )?;
        Ok(FamilyCounts {
            days,
            stops,
            lodgings,
            costs,
        })
    }
}

/// Number of records of each kind that reference a trip.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FamilyCounts {
    pub days: usize,
    pub stops: usize,
    pub lodgings: usize,
    pub costs: usize,
}

impl FamilyCounts {
    pub fn total(&self) -> usize {
        self.days + self.stops + self.lodgings + self.costs
    }
}

impl fmt::Display for FamilyCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} day(s), {} stop(s), {} lodging(s), {} cost(s)",
            self.days, self.stops, self.lodgings, self.costs
        )
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::setup;
    use super::*;
    use crate::models::{Cost, CostKind, Lodging, Trip, TripDay};
    use chrono::NaiveDate;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
    }

    #[tokio::test]
    async fn test_family_counts() {
        let ctx = setup();
        let trip_id = ctx
            .repos
            .trips
            .create(&Trip::new("user1", "Coast", date(1)))
            .await
            .unwrap();
        let other_id = ctx
            .repos
            .trips
            .create(&Trip::new("user1", "Other", date(1)))
            .await
            .unwrap();

        for n in 1..=3 {
            ctx.repos
                .days
                .create(&TripDay::new(trip_id.clone(), n, date(n)))
                .await
                .unwrap();
        }
        ctx.repos
            .days
            .create(&TripDay::new(other_id.clone(), 1, date(1)))
            .await
            .unwrap();
        ctx.repos
            .lodgings
            .create(&Lodging::new(trip_id.clone(), "Inn", date(1), date(3)))
            .await
            .unwrap();
        ctx.repos
            .costs
            .create(&Cost::new(trip_id.clone(), CostKind::Planned, "food", 20.0, "EUR"))
            .await
            .unwrap();

        let counts = ctx.repos.family_counts(&trip_id).await.unwrap();
        assert_eq!(
            counts,
            FamilyCounts {
                days: 3,
                stops: 0,
                lodgings: 1,
                costs: 1
            }
        );
        assert_eq!(counts.total(), 5);
        assert_eq!(
            counts.to_string(),
            "3 day(s), 0 stop(s), 1 lodging(s), 1 cost(s)"
        );
    }
}
