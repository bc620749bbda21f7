mod config_cmd;
mod cost;
mod day;
mod lodging;
mod stop;
mod trip;

pub use config_cmd::ConfigCommand;
pub use cost::CostCommand;
pub use day::DayCommand;
pub use lodging::LodgingCommand;
pub use stop::StopCommand;
pub use trip::TripCommand;

use clap::ValueEnum;
use serde::Serialize;
use std::error::Error;
use std::io::{self, Write};

use crate::config::Config;
use trip_journal_core::{EntityId, Repositories, Stored, Trip};

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Load a trip the configured user owns. Other users' trips are reported as
/// missing.
pub(crate) async fn owned_trip(
    repos: &Repositories,
    trip_id: &EntityId,
    config: &Config,
) -> Result<Stored<Trip>, Box<dyn Error>> {
    match repos.trips.read(trip_id).await? {
        Some(trip) if trip.data.user_id == config.user_id.value => Ok(trip),
        _ => Err(format!("Trip not found: {}", trip_id).into()),
    }
}

pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), Box<dyn Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Ask a yes/no question on stdin. Anything but "y" is a no.
pub(crate) fn confirm(prompt: &str) -> Result<bool, Box<dyn Error>> {
    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}


#[cfg(test)]
mod tests {
    use super::test_support::{config_for, memory_repos};
    use super::*;
    use chrono::NaiveDate;

    #[tokio::test]
    async fn test_owned_trip_hides_other_users_trips() {
        let repos = memory_repos();
        let start = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let trip_id = repos
            .trips
            .create(&Trip::new("alice", "Rome", start))
            .await
            .unwrap();

        let trip = owned_trip(&repos, &trip_id, &config_for("alice")).await.unwrap();
        assert_eq!(trip.data.name, "Rome");

        let err = owned_trip(&repos, &trip_id, &config_for("bob"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Trip not found"));
    }
}
