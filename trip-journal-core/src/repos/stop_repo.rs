use super::TRIP_ID;
use crate::entity::{EntityStore, RepositoryError, Stored};
use crate::id::EntityId;
use crate::models::Stop;
use crate::store::{Constraint, Direction};

pub type StopRepository = EntityStore<Stop>;

impl EntityStore<Stop> {
    pub async fn list_by_day(&self, day_id: &EntityId) -> Result<Vec<Stored<Stop>>, RepositoryError> {
        self.list(&[
            Constraint::where_eq("dayId", day_id.as_str()),
            Constraint::order_by("arrival", Direction::Ascending),
        ])
        .await
    }

    pub async fn list_by_category(
        &self,
        trip_id: &EntityId,
        category: &str,
    ) -> Result<Vec<Stored<Stop>>, RepositoryError> {
        self.list(&[
            Constraint::where_eq(TRIP_ID, trip_id.as_str()),
            Constraint::where_eq("category", category),
            Constraint::order_by("arrival", Direction::Ascending),
        ])
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::setup;
    use super::*;
    use chrono::{TimeZone, Utc};

    #[tokio::test]
    async fn test_list_by_day_and_category() {
        let ctx = setup();
        let trip_id = EntityId::generate();
        let day1 = EntityId::generate();
        let day2 = EntityId::generate();

        let at = |h| Utc.with_ymd_and_hms(2025, 5, 1, h, 0, 0).unwrap();
        let stops = [
            Stop::new(trip_id.clone(), day1.clone(), "Lunch", "food").with_arrival(at(13)),
            Stop::new(trip_id.clone(), day1.clone(), "Breakfast", "food").with_arrival(at(8)),
            Stop::new(trip_id.clone(), day1.clone(), "Castle", "sightseeing").with_arrival(at(10)),
            Stop::new(trip_id.clone(), day2.clone(), "Dinner", "food").with_arrival(at(20)),
        ];
        for stop in &stops {
            ctx.repos.stops.create(stop).await.unwrap();
        }

        let day1_stops = ctx.repos.stops.list_by_day(&day1).await.unwrap();
        let names: Vec<&str> = day1_stops.iter().map(|s| s.data.name.as_str()).collect();
        assert_eq!(names, vec!["Breakfast", "Castle", "Lunch"]);

        let food = ctx
            .repos
            .stops
            .list_by_category(&trip_id, "food")
            .await
            .unwrap();
        let names: Vec<&str> = food.iter().map(|s| s.data.name.as_str()).collect();
        assert_eq!(names, vec!["Breakfast", "Lunch", "Dinner"]);

        assert_eq!(ctx.repos.stops.count_by_trip(&trip_id).await.unwrap(), 4);
    }
}
