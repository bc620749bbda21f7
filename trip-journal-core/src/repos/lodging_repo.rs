use chrono::NaiveDate;

use crate::entity::{EntityStore, RepositoryError, Stored};
use crate::id::EntityId;
use crate::models::Lodging;

pub type LodgingRepository = EntityStore<Lodging>;

impl EntityStore<Lodging> {
    /// The lodging covering the night of `date`, if any.
    pub async fn find_for_night(
        &self,
        trip_id: &EntityId,
        date: NaiveDate,
    ) -> Result<Option<Stored<Lodging>>, RepositoryError> {
        let lodgings = self.list_by_trip(trip_id).await?;
        Ok(lodgings
            .into_iter()
            .find(|l| l.data.check_in <= date && date < l.data.check_out))
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::setup;
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 9, d).unwrap()
    }

    #[tokio::test]
    async fn test_list_by_trip_ordered_by_check_in() {
        let ctx = setup();
        let trip_id = EntityId::generate();
        for (name, from, to) in [("Second", 4, 6), ("First", 1, 4), ("Third", 6, 7)] {
            ctx.repos
                .lodgings
                .create(&Lodging::new(trip_id.clone(), name, date(from), date(to)))
                .await
                .unwrap();
        }

        let listed = ctx.repos.lodgings.list_by_trip(&trip_id).await.unwrap();
        let names: Vec<&str> = listed.iter().map(|l| l.data.name.as_str()).collect();
        assert_eq!(names, vec!["First", "Second", "Third"]);
    }

    #[tokio::test]
    async fn test_find_for_night() {
        let ctx = setup();
        let trip_id = EntityId::generate();
        ctx.repos
            .lodgings
            .create(&Lodging::new(trip_id.clone(), "Inn", date(1), date(3)))
            .await
            .unwrap();

        let night2 = ctx.repos.lodgings.find_for_night(&trip_id, date(2)).await.unwrap();
        assert_eq!(night2.map(|l| l.data.name), Some("Inn".to_string()));

        // check-out day is not a night at the inn
        let night3 = ctx.repos.lodgings.find_for_night(&trip_id, date(3)).await.unwrap();
        assert!(night3.is_none());
    }
}
