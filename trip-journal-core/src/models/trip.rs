use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::entity::Entity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TripStatus {
    Planned,
    InProgress,
    Finished,
    Cancelled,
}

impl fmt::Display for TripStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TripStatus::Planned => write!(f, "planned"),
            TripStatus::InProgress => write!(f, "in_progress"),
            TripStatus::Finished => write!(f, "finished"),
            TripStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl FromStr for TripStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "planned" => Ok(TripStatus::Planned),
            "in_progress" => Ok(TripStatus::InProgress),
            "finished" => Ok(TripStatus::Finished),
            "cancelled" => Ok(TripStatus::Cancelled),
            _ => Err(format!(
                "Invalid trip status '{}'. Valid options: planned, in_progress, finished, cancelled",
                s
            )),
        }
    }
}

/// A planned or recorded trip. Owns days, stops, lodging and costs through
/// their `tripId` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
    pub user_id: String,
    pub name: String,
    pub description: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub status: TripStatus,
    pub origin: Option<String>,
    pub destination: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Entity for Trip {
    const COLLECTION: &'static str = "trips";
    const LABEL: &'static str = "trip";
}

impl Trip {
    pub fn new(user_id: impl Into<String>, name: impl Into<String>, start_date: NaiveDate) -> Self {
        Self {
            user_id: user_id.into(),
            name: name.into(),
            description: None,
            start_date,
            end_date: None,
            status: TripStatus::Planned,
            origin: None,
            destination: None,
            tags: Vec::new(),
        }
    }

    pub fn with_end_date(mut self, end_date: NaiveDate) -> Self {
        self.end_date = Some(end_date);
        self
    }

    pub fn with_route(mut self, origin: impl Into<String>, destination: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self.destination = Some(destination.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    /// Trip length in days, counting both ends.
    pub fn duration_days(&self) -> Option<i64> {
        self.end_date
            .map(|end| (end - self.start_date).num_days() + 1)
    }
}

impl fmt::Display for Trip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.name)?;
        writeln!(f, "{}", "=".repeat(self.name.len()))?;
        writeln!(f, "Status: {}", self.status)?;

        match (self.end_date, self.duration_days()) {
            (Some(end), Some(days)) => {
                writeln!(f, "Dates: {} to {} ({} days)", self.start_date, end, days)?
            }
            _ => writeln!(f, "Starts: {}", self.start_date)?,
        }

        if let (Some(origin), Some(destination)) = (&self.origin, &self.destination) {
            writeln!(f, "Route: {} -> {}", origin, destination)?;
        }

        if !self.tags.is_empty() {
            writeln!(f, "Tags: {}", self.tags.join(", "))?;
        }

        if let Some(description) = &self.description {
            writeln!(f, "\n{}", description)?;
        }

        Ok(())
    }
}

/// Partial update for a trip. `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TripPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub status: Option<TripStatus>,
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl TripPatch {
    pub fn status(status: TripStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.start_date.is_none()
            && self.end_date.is_none()
            && self.status.is_none()
            && self.origin.is_none()
            && self.destination.is_none()
            && self.tags.is_none()
    }
}
