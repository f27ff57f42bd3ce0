//! Survey attendance dashboard core.
//!
//! Loads survey records from the dashboard backend (or a JSON file), filters
//! them by facet, and recomputes every chart series, summary card and
//! insight for the filtered view.

pub mod aggregate;
pub mod cli;
pub mod config;
pub mod dashboard;
pub mod filter;
pub mod insights;
pub mod labels;
pub mod logger;
pub mod render;
pub mod source;
pub mod store;
