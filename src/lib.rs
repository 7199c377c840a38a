//! Education statistics for a country's provinces: sample data synthesis,
//! CSV-backed table store, and the filter/aggregation pipeline behind the
//! dashboard's charts.

pub mod config;
pub mod data;
