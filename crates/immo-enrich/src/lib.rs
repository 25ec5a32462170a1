//! Cleaning, enrichment and export of scraped Tunisian real-estate listings.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
