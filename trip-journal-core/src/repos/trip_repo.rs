use crate::entity::{EntityStore, RepositoryError, Stored};
use crate::models::{Trip, TripStatus};
use crate::store::{Constraint, Direction};

pub type TripRepository = EntityStore<Trip>;

const USER_ID: &str = "userId";

impl EntityStore<Trip> {
    /// A user's trips, most recent start date first.
    pub async fn list_by_user(&self, user_id: &str) -> Result<Vec<Stored<Trip>>, RepositoryError> {
        self.list(&[
            Constraint::where_eq(USER_ID, user_id),
            Constraint::order_by("startDate", Direction::Descending),
        ])
        .await
    }

    pub async fn list_by_status(
        &self,
        user_id: &str,
        status: TripStatus,
    ) -> Result<Vec<Stored<Trip>>, RepositoryError> {
        self.list(&[
            Constraint::where_eq(USER_ID, user_id),
            Constraint::where_eq("status", status.to_string()),
            Constraint::order_by("startDate", Direction::Descending),
        ])
        .await
    }

    pub async fn count_by_user(&self, user_id: &str) -> Result<usize, RepositoryError> {
        self.count(&[Constraint::where_eq(USER_ID, user_id)]).await
    }
}
