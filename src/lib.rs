//! Monthly solar/grid energy reporting: load a site workbook, normalize and
//! filter its rows, and derive the KPI, coupling and export figures.
pub mod config;
pub mod error;
pub mod filter;
pub mod loader;
pub mod metrics;
pub mod normalize;
pub mod output;
pub mod pipeline;
pub mod reports;
pub mod repository;
pub mod types;
pub mod util;

pub use error::{ReportError, Result};
