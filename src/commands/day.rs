use chrono::NaiveDate;
use clap::{Args, Subcommand};

use super::{owned_trip, print_json, OutputFormat};
use crate::config::Config;
use trip_journal_core::{EntityId, Repositories, TripDay, TripDayPatch};

#[derive(Args)]
pub struct DayCommand {
    #[command(subcommand)]
    pub command: DaySubcommand,
}

#[derive(Subcommand)]
pub enum DaySubcommand {
    /// Add a day to a trip
    Add {
        trip_id: EntityId,

        /// Date of the day (YYYY-MM-DD)
        #[arg(long)]
        date: NaiveDate,

        #[arg(long)]
        title: Option<String>,

        /// Where the day's leg starts
        #[arg(long)]
        origin: Option<String>,

        /// Where the day's leg ends
        #[arg(long)]
        destination: Option<String>,

        /// Distance covered in kilometres
        #[arg(long)]
        distance: Option<f64>,

        /// Position in the trip (default: after the last day)
        #[arg(long)]
        order: Option<u32>,

        /// Add the day even if the trip already has one on that date
        #[arg(long)]
        allow_duplicate_date: bool,
    },

    /// List the days of a trip in order
    List {
        trip_id: EntityId,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Write the diary entry for a day
    Diary { day_id: EntityId, text: String },

    /// Delete a single day
    Delete {
        day_id: EntityId,

        /// Delete even if stops still point at the day
        #[arg(long, short)]
        force: bool,
    },
}

impl DayCommand {
    pub async fn run(
        &self,
        repos: &Repositories,
        config: &Config,
    ) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            DaySubcommand::Add {
                trip_id,
                date,
                title,
                origin,
                destination,
                distance,
                order,
                allow_duplicate_date,
            } => {
                owned_trip(repos, trip_id, config).await?;

                if !allow_duplicate_date {
                    let existing = repos.days.find_by_date(trip_id, *date).await?;
                    if let Some(day) = existing.first() {
                        return Err(format!(
                            "Trip already has a day on {} ({}). Use --allow-duplicate-date to add another.",
                            date, day.id
                        )
                        .into());
                    }
                }

                let order_number = match order {
                    Some(n) => *n,
                    None => repos.days.next_order_number(trip_id).await?,
                };

                let mut day = TripDay::new(trip_id.clone(), order_number, *date);
                day.title = title.clone();
                day.origin = origin.clone();
                day.destination = destination.clone();
                day.distance_km = *distance;

                let id = repos.days.create(&day).await?;
                println!("Added day {}:", id);
                println!("  {}", day);
                Ok(())
            }

            DaySubcommand::List { trip_id, format } => {
                owned_trip(repos, trip_id, config).await?;
                let days = repos.days.list_by_trip(trip_id).await?;

                if days.is_empty() {
                    println!("No days found");
                    return Ok(());
                }

                match format {
                    OutputFormat::Json => print_json(&days)?,
                    OutputFormat::Text => {
                        for day in &days {
                            println!("{}  {}", day.id, day.data);
                            if let Some(diary) = &day.data.diary {
                                println!("    {}", diary);
                            }
                        }
                        let total_km: f64 = days.iter().filter_map(|d| d.data.distance_km).sum();
                        println!("\nTotal: {} day(s), {:.1} km", days.len(), total_km);
                    }
                }
                Ok(())
            }

            DaySubcommand::Diary { day_id, text } => {
                let day = repos
                    .days
                    .read(day_id)
                    .await?
                    .ok_or_else(|| format!("Day not found: {}", day_id))?;
                owned_trip(repos, &day.data.trip_id, config).await?;

                let patch = TripDayPatch {
                    diary: Some(text.clone()),
                    ..TripDayPatch::default()
                };
                repos.days.update(day_id, &patch).await?;
                println!("Updated diary for {}", day.data);
                Ok(())
            }

            DaySubcommand::Delete { day_id, force } => {
                let day = repos
                    .days
                    .read(day_id)
                    .await?
                    .ok_or_else(|| format!("Day not found: {}", day_id))?;
                owned_trip(repos, &day.data.trip_id, config).await?;

                let stops = repos.stops.list_by_day(day_id).await?;
                if !stops.is_empty() && !force {
                    return Err(format!(
                        "{} stop(s) belong to this day. Use --force to delete it anyway.",
                        stops.len()
                    )
                    .into());
                }

                repos.days.delete(day_id).await?;
                println!("Deleted {}", day.data);
                Ok(())
            }
        }
    }
}
