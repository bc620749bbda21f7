use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::entity::{Entity, TripScoped};
use crate::id::EntityId;
use crate::store::Direction;

/// One leg of a trip, ordered within the trip by `order_number`.
///
/// The store does not enforce unique order numbers or dates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripDay {
    pub trip_id: EntityId,
    pub order_number: u32,
    pub date: NaiveDate,
    pub title: Option<String>,
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub distance_km: Option<f64>,
    /// Free-form diary entry for the day
    pub diary: Option<String>,
}

impl Entity for TripDay {
    const COLLECTION: &'static str = "tripDays";
    const LABEL: &'static str = "trip day";
}

impl TripScoped for TripDay {
    const TRIP_ORDER: Option<(&'static str, Direction)> = Some(("orderNumber", Direction::Ascending));

    fn trip_id(&self) -> &EntityId {
        &self.trip_id
    }
}

impl TripDay {
    pub fn new(trip_id: EntityId, order_number: u32, date: NaiveDate) -> Self {
        Self {
            trip_id,
            order_number,
            date,
            title: None,
            origin: None,
            destination: None,
            distance_km: None,
            diary: None,
        }
    }

    pub fn with_leg(mut self, origin: impl Into<String>, destination: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self.destination = Some(destination.into());
        self
    }

    pub fn with_distance(mut self, km: f64) -> Self {
        self.distance_km = Some(km);
        self
    }

    pub fn with_diary(mut self, diary: impl Into<String>) -> Self {
        self.diary = Some(diary.into());
        self
    }
}

impl fmt::Display for TripDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Day {} ({})", self.order_number, self.date)?;
        if let Some(title) = &self.title {
            write!(f, " - {}", title)?;
        }
        if let (Some(origin), Some(destination)) = (&self.origin, &self.destination) {
            write!(f, ": {} -> {}", origin, destination)?;
        }
        if let Some(km) = self.distance_km {
            write!(f, " [{:.1} km]", km)?;
        }
        Ok(())
    }
}

/// Partial update for a trip day.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TripDayPatch {
    pub order_number: Option<u32>,
    pub date: Option<NaiveDate>,
    pub title: Option<String>,
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub distance_km: Option<f64>,
    pub diary: Option<String>,
}
