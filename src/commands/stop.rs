use chrono::{DateTime, Utc};
use clap::{Args, Subcommand};

use super::{owned_trip, print_json, OutputFormat};
use crate::config::Config;
use trip_journal_core::{EntityId, Location, Repositories, Stop};

#[derive(Args)]
pub struct StopCommand {
    #[command(subcommand)]
    pub command: StopSubcommand,
}

#[derive(Subcommand)]
pub enum StopSubcommand {
    /// Add a stop to a trip day
    Add {
        trip_id: EntityId,

        /// Name of the place
        name: String,

        /// Day the stop belongs to
        #[arg(long)]
        day: EntityId,

        /// Category (food, sightseeing, fuel, ...)
        #[arg(long, default_value = "other")]
        category: String,

        #[arg(long, requires = "longitude", allow_hyphen_values = true)]
        latitude: Option<f64>,

        #[arg(long, requires = "latitude", allow_hyphen_values = true)]
        longitude: Option<f64>,

        #[arg(long)]
        address: Option<String>,

        /// Arrival time (RFC 3339, e.g. 2025-05-01T09:30:00Z)
        #[arg(long)]
        arrival: Option<DateTime<Utc>>,

        #[arg(long)]
        notes: Option<String>,

        /// Rating from 1 to 5
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=5))]
        rating: Option<u8>,
    },

    /// List the stops of a trip
    List {
        trip_id: EntityId,

        /// Only stops of this day
        #[arg(long)]
        day: Option<EntityId>,

        /// Only stops in this category
        #[arg(long)]
        category: Option<String>,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Delete a stop
    Delete { stop_id: EntityId },
}

impl StopCommand {
    pub async fn run(
        &self,
        repos: &Repositories,
        config: &Config,
    ) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            StopSubcommand::Add {
                trip_id,
                name,
                day,
                category,
                latitude,
                longitude,
                address,
                arrival,
                notes,
                rating,
            } => {
                owned_trip(repos, trip_id, config).await?;
                match repos.days.read(day).await? {
                    Some(d) if &d.data.trip_id == trip_id => {}
                    _ => return Err(format!("Day {} is not part of trip {}", day, trip_id).into()),
                }

                let mut stop = Stop::new(trip_id.clone(), day.clone(), name.trim(), category);
                if let (Some(latitude), Some(longitude)) = (latitude, longitude) {
                    stop.location = Some(Location {
                        latitude: *latitude,
                        longitude: *longitude,
                        address: address.clone(),
                    });
                }
                stop.arrival = *arrival;
                stop.notes = notes.clone();
                stop.rating = *rating;

                let id = repos.stops.create(&stop).await?;
                println!("Added stop {}:", id);
                println!("  {}", stop);
                Ok(())
            }

            StopSubcommand::List {
                trip_id,
                day,
                category,
                format,
            } => {
                owned_trip(repos, trip_id, config).await?;
                let stops = match (day, category) {
                    (Some(day), _) => repos.stops.list_by_day(day).await?,
                    (None, Some(category)) => {
                        repos.stops.list_by_category(trip_id, category).await?
                    }
                    (None, None) => repos.stops.list_by_trip(trip_id).await?,
                };
                let stops: Vec<_> = stops
                    .into_iter()
                    .filter(|s| &s.data.trip_id == trip_id)
                    .filter(|s| category.as_ref().map_or(true, |c| &s.data.category == c))
                    .collect();

                if stops.is_empty() {
                    println!("No stops found");
                    return Ok(());
                }

                match format {
                    OutputFormat::Json => print_json(&stops)?,
                    OutputFormat::Text => {
                        for stop in &stops {
                            println!("{}  {}", stop.id, stop.data);
                            if let Some(notes) = &stop.data.notes {
                                println!("    {}", notes);
                            }
                        }
                        println!("\nTotal: {} stop(s)", stops.len());
                    }
                }
                Ok(())
            }

            StopSubcommand::Delete { stop_id } => {
                let stop = repos
                    .stops
                    .read(stop_id)
                    .await?
                    .ok_or_else(|| format!("Stop not found: {}", stop_id))?;
                owned_trip(repos, &stop.data.trip_id, config).await?;

                repos.stops.delete(stop_id).await?;
                println!("Deleted stop: {}", stop.data.name);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{config_for, memory_repos};
    use super::*;
    use chrono::NaiveDate;
    use trip_journal_core::{Trip, TripDay};

    #[tokio::test]
    async fn test_add_rejects_day_of_other_trip() {
        let repos = memory_repos();
        let config = config_for("erin");
        let start = NaiveDate::from_ymd_opt(2025, 2, 1).unwrap();
        let trip_a = repos.trips.create(&Trip::new("erin", "A", start)).await.unwrap();
        let trip_b = repos.trips.create(&Trip::new("erin", "B", start)).await.unwrap();
        let day_b = repos
            .days
            .create(&TripDay::new(trip_b, 1, start))
            .await
            .unwrap();

        let add = |trip_id: &EntityId| StopCommand {
            command: StopSubcommand::Add {
                trip_id: trip_id.clone(),
                name: "Bakery".to_string(),
                day: day_b.clone(),
                category: "food".to_string(),
                latitude: Some(45.0),
                longitude: Some(7.5),
                address: None,
                arrival: None,
                notes: None,
                rating: Some(4),
            },
        };

        assert!(add(&trip_a).run(&repos, &config).await.is_err());
        assert_eq!(repos.stops.count(&[]).await.unwrap(), 0);

        let trip_b_id = repos.days.read(&day_b).await.unwrap().unwrap().data.trip_id;
        add(&trip_b_id).run(&repos, &config).await.unwrap();

        let stops = repos.stops.list_by_day(&day_b).await.unwrap();
        assert_eq!(stops.len(), 1);
        assert_eq!(stops[0].data.rating, Some(4));
        assert_eq!(stops[0].data.location.as_ref().map(|l| l.latitude), Some(45.0));
    }
}
