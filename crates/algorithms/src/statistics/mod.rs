//! Statistics over zones
//!
//! - **zonal**: per-zone band means over polygon boundaries

pub mod zonal;

pub use zonal::{zonal_means, StatsTable, ZonalMean, ZonalParams, ZoneRow};
