use chrono::NaiveDate;

use super::TRIP_ID;
use crate::entity::{EntityStore, RepositoryError, Stored};
use crate::id::EntityId;
use crate::models::TripDay;
use crate::store::{Constraint, Direction};

pub type TripDayRepository = EntityStore<TripDay>;

impl EntityStore<TripDay> {
    /// Days of a trip that fall on `date`. Used to warn about collisions
    /// before adding a day; the store itself allows duplicates.
    pub async fn find_by_date(
        &self,
        trip_id: &EntityId,
        date: NaiveDate,
    ) -> Result<Vec<Stored<TripDay>>, RepositoryError> {
        self.list(&[
            Constraint::where_eq(TRIP_ID, trip_id.as_str()),
            Constraint::where_eq("date", date.to_string()),
        ])
        .await
    }

    /// One past the highest order number in the trip, or 1 for an empty trip.
    pub async fn next_order_number(&self, trip_id: &EntityId) -> Result<u32, RepositoryError> {
        let last = self
            .list(&[
                Constraint::where_eq(TRIP_ID, trip_id.as_str()),
                Constraint::order_by("orderNumber", Direction::Descending),
                Constraint::limit(1),
            ])
            .await?;

        match last.first() {
            None => Ok(1),
            Some(day) => day.data.order_number.checked_add(1).ok_or_else(|| {
                RepositoryError::OrderNumbersExhausted {
                    trip_id: trip_id.clone(),
                    last: day.data.order_number,
                }
            }),
        }
    }
}
