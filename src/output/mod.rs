//! Output module for reporting on harvested data
//!
//! This module handles:
//! - Summarising the item and review stores
//! - Printing store statistics for `--stats`

pub mod stats;

pub use stats::{load_statistics, print_statistics, HarvestStatistics};
