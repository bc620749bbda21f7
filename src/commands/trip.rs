use chrono::NaiveDate;
use clap::{Args, Subcommand};
use serde::Serialize;

use super::{confirm, owned_trip, print_json, OutputFormat};
use crate::config::Config;
use trip_journal_core::{
    CostSummary, EntityId, FamilyCounts, Lodging, Repositories, Stored, Trip, TripDay,
    TripDeletion, TripPatch, TripStatus,
};

#[derive(Args)]
pub struct TripCommand {
    #[command(subcommand)]
    pub command: TripSubcommand,
}

#[derive(Subcommand)]
pub enum TripSubcommand {
    /// Plan a new trip
    Create {
        /// Name of the trip
        name: String,

        /// First day (YYYY-MM-DD)
        #[arg(long)]
        start: NaiveDate,

        /// Last day (YYYY-MM-DD)
        #[arg(long)]
        end: Option<NaiveDate>,

        /// Where the trip starts
        #[arg(long)]
        origin: Option<String>,

        /// Where the trip ends
        #[arg(long)]
        destination: Option<String>,

        #[arg(long)]
        description: Option<String>,

        /// Tags (can be repeated)
        #[arg(long = "tag", value_name = "TAG")]
        tags: Vec<String>,
    },

    /// List your trips, newest first
    List {
        /// Only trips with this status
        #[arg(long)]
        status: Option<TripStatus>,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show a trip with its days, lodging and cost totals
    Show {
        trip_id: EntityId,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Change trip details
    Update {
        trip_id: EntityId,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        start: Option<NaiveDate>,

        #[arg(long)]
        end: Option<NaiveDate>,

        #[arg(long)]
        origin: Option<String>,

        #[arg(long)]
        destination: Option<String>,

        /// Replace the tags (can be repeated)
        #[arg(long = "tag", value_name = "TAG")]
        tags: Vec<String>,
    },

    /// Set the trip status (planned, in_progress, finished, cancelled)
    Status { trip_id: EntityId, status: TripStatus },

    /// Delete a trip and every day, stop, lodging and cost in it
    Delete {
        trip_id: EntityId,

        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TripDetails<'a> {
    #[serde(flatten)]
    trip: &'a Stored<Trip>,
    records: FamilyCounts,
    days: &'a [Stored<TripDay>],
    lodgings: &'a [Stored<Lodging>],
    costs: &'a CostSummary,
}

impl TripCommand {
    pub async fn run(
        &self,
        repos: &Repositories,
        config: &Config,
    ) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            TripSubcommand::Create {
                name,
                start,
                end,
                origin,
                destination,
                description,
                tags,
            } => {
                if name.trim().is_empty() {
                    return Err("Trip name cannot be empty".into());
                }
                if let Some(end) = end {
                    if end < start {
                        return Err("End date cannot be before start date".into());
                    }
                }

                let mut trip = Trip::new(&config.user_id.value, name.trim(), *start);
                trip.end_date = *end;
                trip.origin = origin.clone();
                trip.destination = destination.clone();
                trip.description = description.clone();
                if !tags.is_empty() {
                    trip = trip.with_tags(tags.clone());
                }

                let id = repos.trips.create(&trip).await?;
                println!("Created trip {}:", id);
                println!("{}", trip);
                Ok(())
            }

            TripSubcommand::List { status, format } => {
                let user = &config.user_id.value;
                let trips = match status {
                    Some(status) => repos.trips.list_by_status(user, *status).await?,
                    None => repos.trips.list_by_user(user).await?,
                };

                if trips.is_empty() {
                    println!("No trips found");
                    return Ok(());
                }

                match format {
                    OutputFormat::Json => print_json(&trips)?,
                    OutputFormat::Text => {
                        println!(
                            "{:<22}  {:<30}  {:<11}  {:<10}  END",
                            "ID", "NAME", "STATUS", "START"
                        );
                        println!("{}", "-".repeat(90));
                        for trip in &trips {
                            let name = if trip.data.name.chars().count() > 30 {
                                format!("{}...", trip.data.name.chars().take(27).collect::<String>())
                            } else {
                                trip.data.name.clone()
                            };
                            let end = trip
                                .data
                                .end_date
                                .map(|d| d.to_string())
                                .unwrap_or_else(|| "-".to_string());
                            println!(
                                "{:<22}  {:<30}  {:<11}  {:<10}  {}",
                                trip.id, name, trip.data.status, trip.data.start_date, end
                            );
                        }
                        println!("\nTotal: {} trip(s)", trips.len());
                    }
                }
                Ok(())
            }

            TripSubcommand::Show { trip_id, format } => {
                let trip = owned_trip(repos, trip_id, config).await?;
                let (records, days, lodgings, costs) = futures::try_join!(
                    repos.family_counts(trip_id),
                    repos.days.list_by_trip(trip_id),
                    repos.lodgings.list_by_trip(trip_id),
                    repos.costs.summary(trip_id),
                )?;

                match format {
                    OutputFormat::Json => print_json(&TripDetails {
                        trip: &trip,
                        records,
                        days: &days,
                        lodgings: &lodgings,
                        costs: &costs,
                    })?,
                    OutputFormat::Text => {
                        print!("{}", trip.data);
                        println!("\nRecords: {}", records);

                        if !days.is_empty() {
                            println!("\nDays:");
                            for day in &days {
                                println!("  {}", day.data);
                            }
                        }
                        if !lodgings.is_empty() {
                            println!("\nLodging:");
                            for lodging in &lodgings {
                                println!("  {}", lodging.data);
                            }
                        }
                        if !costs.by_currency.is_empty() {
                            println!("\nCosts:");
                            print!("{}", costs);
                        }
                    }
                }
                Ok(())
            }

            TripSubcommand::Update {
                trip_id,
                name,
                description,
                start,
                end,
                origin,
                destination,
                tags,
            } => {
                let patch = TripPatch {
                    name: name.clone(),
                    description: description.clone(),
                    start_date: *start,
                    end_date: *end,
                    status: None,
                    origin: origin.clone(),
                    destination: destination.clone(),
                    tags: (!tags.is_empty()).then(|| tags.clone()),
                };
                if patch.is_empty() {
                    return Err("Nothing to update. Provide at least one option.".into());
                }

                owned_trip(repos, trip_id, config).await?;
                repos.trips.update(trip_id, &patch).await?;

                let updated = owned_trip(repos, trip_id, config).await?;
                println!("Updated trip:");
                println!("{}", updated.data);
                Ok(())
            }

            TripSubcommand::Status { trip_id, status } => {
                let trip = owned_trip(repos, trip_id, config).await?;
                repos
                    .trips
                    .update(trip_id, &TripPatch::status(*status))
                    .await?;
                println!(
                    "Trip '{}': {} -> {}",
                    trip.data.name, trip.data.status, status
                );
                Ok(())
            }

            TripSubcommand::Delete { trip_id, force } => {
                // only prompt for the user's own trips; the cascade reports
                // NotFound and PermissionDenied
                let owned = repos
                    .trips
                    .read(trip_id)
                    .await?
                    .filter(|trip| trip.data.user_id == config.user_id.value);

                if let (false, Some(trip)) = (force, owned) {
                    let records = repos.family_counts(trip_id).await?;
                    let prompt = format!(
                        "Delete trip '{}' and its {}?",
                        trip.data.name, records
                    );
                    if !confirm(&prompt)? {
                        println!("Deletion cancelled.");
                        return Ok(());
                    }
                }

                let summary = TripDeletion::new(repos)
                    .with_identity(config.rollback_identity.value)
                    .delete_trip(trip_id, &config.user_id.value)
                    .await?;
                println!("{}", summary);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{config_for, memory_repos};
    use super::*;
    use trip_journal_core::TripDeletionError;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, d).unwrap()
    }

    #[tokio::test]
    async fn test_create_sets_owner_from_config() {
        let repos = memory_repos();
        let config = config_for("carol");

        let cmd = TripCommand {
            command: TripSubcommand::Create {
                name: "  Baltic loop ".to_string(),
                start: date(1),
                end: Some(date(9)),
                origin: None,
                destination: None,
                description: None,
                tags: vec!["ferry".to_string()],
            },
        };
        cmd.run(&repos, &config).await.unwrap();

        let trips = repos.trips.list_by_user("carol").await.unwrap();
        assert_eq!(trips.len(), 1);
        assert_eq!(trips[0].data.name, "Baltic loop");
        assert_eq!(trips[0].data.tags, vec!["ferry"]);
    }

    #[tokio::test]
    async fn test_create_rejects_end_before_start() {
        let repos = memory_repos();
        let cmd = TripCommand {
            command: TripSubcommand::Create {
                name: "Backwards".to_string(),
                start: date(5),
                end: Some(date(1)),
                origin: None,
                destination: None,
                description: None,
                tags: vec![],
            },
        };
        assert!(cmd.run(&repos, &config_for("carol")).await.is_err());
        assert_eq!(repos.trips.count(&[]).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_forced_delete_removes_family() {
        let repos = memory_repos();
        let config = config_for("carol");
        let trip_id = repos
            .trips
            .create(&Trip::new("carol", "Short", date(1)))
            .await
            .unwrap();
        repos
            .days
            .create(&TripDay::new(trip_id.clone(), 1, date(1)))
            .await
            .unwrap();

        let cmd = TripCommand {
            command: TripSubcommand::Delete {
                trip_id: trip_id.clone(),
                force: true,
            },
        };
        cmd.run(&repos, &config).await.unwrap();

        assert!(repos.trips.read(&trip_id).await.unwrap().is_none());
        assert_eq!(repos.family_counts(&trip_id).await.unwrap().total(), 0);
    }

    #[tokio::test]
    async fn test_delete_of_other_users_trip_is_permission_denied() {
        let repos = memory_repos();
        let trip_id = repos
            .trips
            .create(&Trip::new("alice", "Fjords", date(1)))
            .await
            .unwrap();

        let cmd = TripCommand {
            command: TripSubcommand::Delete {
                trip_id: trip_id.clone(),
                force: false,
            },
        };
        let err = cmd.run(&repos, &config_for("bob")).await.unwrap_err();

        assert!(matches!(
            err.downcast_ref::<TripDeletionError>(),
            Some(TripDeletionError::PermissionDenied { .. })
        ));
        assert!(repos.trips.read(&trip_id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_of_missing_trip_is_not_found() {
        let repos = memory_repos();
        let cmd = TripCommand {
            command: TripSubcommand::Delete {
                trip_id: EntityId::generate(),
                force: true,
            },
        };
        let err = cmd.run(&repos, &config_for("bob")).await.unwrap_err();

        assert!(matches!(
            err.downcast_ref::<TripDeletionError>(),
            Some(TripDeletionError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_update_without_options_fails() {
        let repos = memory_repos();
        let cmd = TripCommand {
            command: TripSubcommand::Update {
                trip_id: EntityId::generate(),
                name: None,
                description: None,
                start: None,
                end: None,
                origin: None,
                destination: None,
                tags: vec![],
            },
        };
        let err = cmd.run(&repos, &config_for("carol")).await.unwrap_err();
        assert!(err.to_string().contains("Nothing to update"));
    }
}
