mod cost;
mod lodging;
mod stop;
mod trip;
mod trip_day;

pub use cost::{Cost, CostKind};
pub use lodging::Lodging;
pub use stop::{Location, Stop};
pub use trip::{Trip, TripPatch, TripStatus};
pub use trip_day::{TripDay, TripDayPatch};
