use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::entity::{Entity, TripScoped};
use crate::id::EntityId;
use crate::store::Direction;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lodging {
    pub trip_id: EntityId,
    pub name: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub address: Option<String>,
    pub price: Option<f64>,
    pub currency: Option<String>,
    pub booking_reference: Option<String>,
}

impl Entity for Lodging {
    const COLLECTION: &'static str = "lodgings";
    const LABEL: &'static str = "lodging";
}

impl TripScoped for Lodging {
    const TRIP_ORDER: Option<(&'static str, Direction)> = Some(("checkIn", Direction::Ascending));

    fn trip_id(&self) -> &EntityId {
        &self.trip_id
    }
}

impl Lodging {
    pub fn new(
        trip_id: EntityId,
        name: impl Into<String>,
        check_in: NaiveDate,
        check_out: NaiveDate,
    ) -> Self {
        Self {
            trip_id,
            name: name.into(),
            check_in,
            check_out,
            address: None,
            price: None,
            currency: None,
            booking_reference: None,
        }
    }

    pub fn with_price(mut self, price: f64, currency: impl Into<String>) -> Self {
        self.price = Some(price);
        self.currency = Some(currency.into());
        self
    }

    pub fn nights(&self) -> i64 {
        (self.check_out - self.check_in).num_days().max(0)
    }
}

impl fmt::Display for Lodging {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} to {} ({} night(s))",
            self.name,
            self.check_in,
            self.check_out,
            self.nights()
        )?;
        if let Some(price) = self.price {
            write!(
                f,
                ", {:.2} {}",
                price,
                self.currency.as_deref().unwrap_or("")
            )?;
        }
        Ok(())
    }
}
