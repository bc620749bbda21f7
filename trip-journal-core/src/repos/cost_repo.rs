use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use super::TRIP_ID;
use crate::entity::{EntityStore, RepositoryError, Stored};
use crate::id::EntityId;
use crate::models::{Cost, CostKind};
use crate::store::Constraint;

pub type CostRepository = EntityStore<Cost>;

/// Planned vs actual spend in one currency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CurrencyTotals {
    pub planned: f64,
    pub actual: f64,
}

impl CurrencyTotals {
    /// Positive when spending exceeded the plan.
    pub fn variance(&self) -> f64 {
        self.actual - self.planned
    }
}

/// Cost totals for a trip, keyed by currency code.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CostSummary {
    pub by_currency: BTreeMap<String, CurrencyTotals>,
}

impl CostSummary {
    pub fn from_costs<'a>(costs: impl IntoIterator<Item = &'a Cost>) -> Self {
        let mut by_currency: BTreeMap<String, CurrencyTotals> = BTreeMap::new();
        for cost in costs {
            let totals = by_currency.entry(cost.currency.to_uppercase()).or_default();
            match cost.kind {
                CostKind::Planned => totals.planned += cost.amount,
                CostKind::Actual => totals.actual += cost.amount,
            }
        }
        Self { by_currency }
    }
}

impl fmt::Display for CostSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.by_currency.is_empty() {
            return writeln!(f, "No costs recorded");
        }
        writeln!(
            f,
            "{:<8}  {:>12}  {:>12}  {:>12}",
            "CURRENCY", "PLANNED", "ACTUAL", "VARIANCE"
        )?;
        for (currency, totals) in &self.by_currency {
            writeln!(
                f,
                "{:<8}  {:>12.2}  {:>12.2}  {:>+12.2}",
                currency,
                totals.planned,
                totals.actual,
                totals.variance()
            )?;
        }
        Ok(())
    }
}

impl EntityStore<Cost> {
    pub async fn list_by_kind(
        &self,
        trip_id: &EntityId,
        kind: CostKind,
    ) -> Result<Vec<Stored<Cost>>, RepositoryError> {
        self.list(&[
            Constraint::where_eq(TRIP_ID, trip_id.as_str()),
            Constraint::where_eq("kind", kind.to_string()),
        ])
        .await
    }

    pub async fn list_by_category(
        &self,
        trip_id: &EntityId,
        category: &str,
    ) -> Result<Vec<Stored<Cost>>, RepositoryError> {
        self.list(&[
            Constraint::where_eq(TRIP_ID, trip_id.as_str()),
            Constraint::where_eq("category", category),
        ])
        .await
    }

    pub async fn summary(&self, trip_id: &EntityId) -> Result<CostSummary, RepositoryError> {
        let costs = self.list_by_trip(trip_id).await?;
        Ok(CostSummary::from_costs(costs.iter().map(|c| &c.data)))
    }
}
