use chrono::NaiveDate;
use clap::{Args, Subcommand};

use super::{owned_trip, print_json, OutputFormat};
use crate::config::Config;
use trip_journal_core::{EntityId, Lodging, Repositories};

#[derive(Args)]
pub struct LodgingCommand {
    #[command(subcommand)]
    pub command: LodgingSubcommand,
}

#[derive(Subcommand)]
pub enum LodgingSubcommand {
    /// Add a place to stay
    Add {
        trip_id: EntityId,

        name: String,

        /// Check-in date (YYYY-MM-DD)
        #[arg(long)]
        check_in: NaiveDate,

        /// Check-out date (YYYY-MM-DD)
        #[arg(long)]
        check_out: NaiveDate,

        #[arg(long)]
        address: Option<String>,

        /// Total price
        #[arg(long, requires = "currency")]
        price: Option<f64>,

        #[arg(long)]
        currency: Option<String>,

        #[arg(long)]
        booking_reference: Option<String>,
    },

    /// List lodging by check-in date
    List {
        trip_id: EntityId,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Delete a lodging
    Delete { lodging_id: EntityId },
}

impl LodgingCommand {
    pub async fn run(
        &self,
        repos: &Repositories,
        config: &Config,
    ) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            LodgingSubcommand::Add {
                trip_id,
                name,
                check_in,
                check_out,
                address,
                price,
                currency,
                booking_reference,
            } => {
                if check_out < check_in {
                    return Err("Check-out cannot be before check-in".into());
                }
                owned_trip(repos, trip_id, config).await?;

                let mut lodging = Lodging::new(trip_id.clone(), name.trim(), *check_in, *check_out);
                lodging.address = address.clone();
                lodging.price = *price;
                lodging.currency = currency.as_ref().map(|c| c.to_uppercase());
                lodging.booking_reference = booking_reference.clone();

                let id = repos.lodgings.create(&lodging).await?;
                println!("Added lodging {}:", id);
                println!("  {}", lodging);
                Ok(())
            }

            LodgingSubcommand::List { trip_id, format } => {
                owned_trip(repos, trip_id, config).await?;
                let lodgings = repos.lodgings.list_by_trip(trip_id).await?;

                if lodgings.is_empty() {
                    println!("No lodging found");
                    return Ok(());
                }

                match format {
                    OutputFormat::Json => print_json(&lodgings)?,
                    OutputFormat::Text => {
                        for lodging in &lodgings {
                            println!("{}  {}", lodging.id, lodging.data);
                            if let Some(address) = &lodging.data.address {
                                println!("    {}", address);
                            }
                        }
                        let nights: i64 = lodgings.iter().map(|l| l.data.nights()).sum();
                        println!("\nTotal: {} lodging(s), {} night(s)", lodgings.len(), nights);
                    }
                }
                Ok(())
            }

            LodgingSubcommand::Delete { lodging_id } => {
                let lodging = repos
                    .lodgings
                    .read(lodging_id)
                    .await?
                    .ok_or_else(|| format!("Lodging not found: {}", lodging_id))?;
                owned_trip(repos, &lodging.data.trip_id, config).await?;

                repos.lodgings.delete(lodging_id).await?;
                println!("Deleted lodging: {}", lodging.data.name);
                Ok(())
            }
        }
    }
}
