use chrono::NaiveDate;
use clap::{Args, Subcommand};

use super::{owned_trip, print_json, OutputFormat};
use crate::config::Config;
use trip_journal_core::{Cost, CostKind, EntityId, Repositories};

#[derive(Args)]
pub struct CostCommand {
    #[command(subcommand)]
    pub command: CostSubcommand,
}

#[derive(Subcommand)]
pub enum CostSubcommand {
    /// Record a planned or actual cost
    Add {
        trip_id: EntityId,

        amount: f64,

        /// planned or actual
        #[arg(long, default_value = "actual")]
        kind: CostKind,

        /// Category (fuel, food, tolls, ...)
        #[arg(long, default_value = "other")]
        category: String,

        /// ISO currency code
        #[arg(long, default_value = "EUR")]
        currency: String,

        /// Day the cost belongs to
        #[arg(long)]
        day: Option<EntityId>,

        #[arg(long)]
        description: Option<String>,

        /// Date of the expense (YYYY-MM-DD)
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// List the costs of a trip
    List {
        trip_id: EntityId,

        #[arg(long)]
        kind: Option<CostKind>,

        #[arg(long)]
        category: Option<String>,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Planned vs actual totals per currency
    Summary {
        trip_id: EntityId,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Delete a cost
    Delete { cost_id: EntityId },
}

impl CostCommand {
    pub async fn run(
        &self,
        repos: &Repositories,
        config: &Config,
    ) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            CostSubcommand::Add {
                trip_id,
                amount,
                kind,
                category,
                currency,
                day,
                description,
                date,
            } => {
                if !amount.is_finite() || *amount < 0.0 {
                    return Err("Amount must be a non-negative number".into());
                }
                owned_trip(repos, trip_id, config).await?;

                let mut cost = Cost::new(
                    trip_id.clone(),
                    *kind,
                    category,
                    *amount,
                    currency.to_uppercase(),
                );
                if let Some(day) = day {
                    cost = cost.with_day(day.clone());
                }
                cost.description = description.clone();
                cost.date = *date;

                let id = repos.costs.create(&cost).await?;
                println!("Added cost {}:", id);
                println!("  {}", cost);
                Ok(())
            }

            CostSubcommand::List {
                trip_id,
                kind,
                category,
                format,
            } => {
                owned_trip(repos, trip_id, config).await?;
                let costs = match (kind, category) {
                    (Some(kind), _) => repos.costs.list_by_kind(trip_id, *kind).await?,
                    (None, Some(category)) => {
                        repos.costs.list_by_category(trip_id, category).await?
                    }
                    (None, None) => repos.costs.list_by_trip(trip_id).await?,
                };
                let costs: Vec<_> = costs
                    .into_iter()
                    .filter(|c| category.as_ref().map_or(true, |cat| &c.data.category == cat))
                    .collect();

                if costs.is_empty() {
                    println!("No costs found");
                    return Ok(());
                }

                match format {
                    OutputFormat::Json => print_json(&costs)?,
                    OutputFormat::Text => {
                        for cost in &costs {
                            println!("{}  {}", cost.id, cost.data);
                        }
                        println!("\nTotal: {} cost(s)", costs.len());
                    }
                }
                Ok(())
            }

            CostSubcommand::Summary { trip_id, format } => {
                let trip = owned_trip(repos, trip_id, config).await?;
                let summary = repos.costs.summary(trip_id).await?;

                match format {
                    OutputFormat::Json => print_json(&summary)?,
                    OutputFormat::Text => {
                        println!("Costs for '{}'\n", trip.data.name);
                        print!("{}", summary);
                    }
                }
                Ok(())
            }

            CostSubcommand::Delete { cost_id } => {
                let cost = repos
                    .costs
                    .read(cost_id)
                    .await?
                    .ok_or_else(|| format!("Cost not found: {}", cost_id))?;
                owned_trip(repos, &cost.data.trip_id, config).await?;

                repos.costs.delete(cost_id).await?;
                println!("Deleted cost: {}", cost.data);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{config_for, memory_repos};
    use super::*;
    use trip_journal_core::Trip;

    #[tokio::test]
    async fn test_add_normalizes_currency_and_rejects_negative() {
        let repos = memory_repos();
        let config = config_for("fay");
        let start = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let trip_id = repos
            .trips
            .create(&Trip::new("fay", "Lakes", start))
            .await
            .unwrap();

        let add = |amount: f64| CostCommand {
            command: CostSubcommand::Add {
                trip_id: trip_id.clone(),
                amount,
                kind: CostKind::Planned,
                category: "fuel".to_string(),
                currency: "chf".to_string(),
                day: None,
                description: None,
                date: Some(start),
            },
        };

        assert!(add(-5.0).run(&repos, &config).await.is_err());
        add(80.0).run(&repos, &config).await.unwrap();

        let costs = repos.costs.list_by_trip(&trip_id).await.unwrap();
        assert_eq!(costs.len(), 1);
        assert_eq!(costs[0].data.currency, "CHF");
        assert_eq!(costs[0].data.date, Some(start));
    }
}
