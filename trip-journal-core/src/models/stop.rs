use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::entity::{Entity, TripScoped};
use crate::id::EntityId;
use crate::store::Direction;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    pub address: Option<String>,
}

/// A place visited during a trip day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stop {
    pub trip_id: EntityId,
    pub day_id: EntityId,
    pub name: String,
    /// e.g. "food", "fuel", "sightseeing"
    pub category: String,
    pub location: Option<Location>,
    pub arrival: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub rating: Option<u8>,
}

impl Entity for Stop {
    const COLLECTION: &'static str = "stops";
    const LABEL: &'static str = "stop";
}

impl TripScoped for Stop {
    const TRIP_ORDER: Option<(&'static str, Direction)> = Some(("arrival", Direction::Ascending));

    fn trip_id(&self) -> &EntityId {
        &self.trip_id
    }
}

impl Stop {
    pub fn new(
        trip_id: EntityId,
        day_id: EntityId,
        name: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            trip_id,
            day_id,
            name: name.into(),
            category: category.into(),
            location: None,
            arrival: None,
            notes: None,
            rating: None,
        }
    }

    pub fn with_location(mut self, latitude: f64, longitude: f64) -> Self {
        self.location = Some(Location {
            latitude,
            longitude,
            address: None,
        });
        self
    }

    pub fn with_arrival(mut self, arrival: DateTime<Utc>) -> Self {
        self.arrival = Some(arrival);
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

impl fmt::Display for Stop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.name, self.category)?;
        if let Some(arrival) = self.arrival {
            write!(f, " at {}", arrival.format("%Y-%m-%d %H:%M"))?;
        }
        if let Some(location) = &self.location {
            write!(f, " ({:.5}, {:.5})", location.latitude, location.longitude)?;
        }
        if let Some(rating) = self.rating {
            write!(f, " {}/5", rating)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ids() -> (EntityId, EntityId) {
        (EntityId::parse("t1").unwrap(), EntityId::parse("d1").unwrap())
    }

    #[test]
    fn test_stop_display() {
        let (trip, day) = ids();
        let stop = Stop::new(trip, day, "Pastelaria", "food")
            .with_arrival(Utc.with_ymd_and_hms(2025, 5, 1, 9, 15, 0).unwrap())
            .with_location(38.5, -9.25);

        let output = format!("{}", stop);
        assert_eq!(
            output,
            "Pastelaria [food] at 2025-05-01 09:15 (38.50000, -9.25000)"
        );
    }

    #[test]
    fn test_stop_nested_location_serializes_nulls() {
        let (trip, day) = ids();
        let stop = Stop::new(trip, day, "Viewpoint", "sightseeing").with_location(1.0, 2.0);

        let json = serde_json::to_value(&stop).unwrap();
        assert_eq!(json["dayId"], "d1");
        assert_eq!(json["location"]["latitude"], 1.0);
        assert!(json["location"]["address"].is_null());
    }
}
