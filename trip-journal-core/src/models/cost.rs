use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::entity::{Entity, TripScoped};
use crate::id::EntityId;
use crate::store::Direction;

/// Whether a cost was budgeted ahead of time or actually spent.
///
/// Only used for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CostKind {
    Planned,
    Actual,
}

impl fmt::Display for CostKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CostKind::Planned => write!(f, "planned"),
            CostKind::Actual => write!(f, "actual"),
        }
    }
}

impl FromStr for CostKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "planned" => Ok(CostKind::Planned),
            "actual" => Ok(CostKind::Actual),
            _ => Err(format!(
                "Invalid cost kind '{}'. Valid options: planned, actual",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cost {
    pub trip_id: EntityId,
    pub day_id: Option<EntityId>,
    pub kind: CostKind,
    pub category: String,
    pub description: Option<String>,
    pub amount: f64,
    pub currency: String,
    pub date: Option<NaiveDate>,
}

impl Entity for Cost {
    const COLLECTION: &'static str = "costs";
    const LABEL: &'static str = "cost";
}

impl TripScoped for Cost {
    const TRIP_ORDER: Option<(&'static str, Direction)> = None;

    fn trip_id(&self) -> &EntityId {
        &self.trip_id
    }
}

impl Cost {
    pub fn new(
        trip_id: EntityId,
        kind: CostKind,
        category: impl Into<String>,
        amount: f64,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            trip_id,
            day_id: None,
            kind,
            category: category.into(),
            description: None,
            amount,
            currency: currency.into(),
            date: None,
        }
    }

    pub fn with_day(mut self, day_id: EntityId) -> Self {
        self.day_id = Some(day_id);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }
}

impl fmt::Display for Cost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.2} {} ({}, {})",
            self.amount, self.currency, self.category, self.kind
        )?;
        if let Some(description) = &self.description {
            write!(f, " - {}", description)?;
        }
        Ok(())
    }
}
