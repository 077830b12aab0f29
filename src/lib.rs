//! Sales Insight - CSV sales analysis
//!
//! Loads a sales CSV, validates and normalises it, then computes the
//! dashboard outputs (metrics, summaries, correlations, forecast) for the
//! active filters.

pub mod data;
pub mod error;
pub mod export;
pub mod session;
pub mod settings;
pub mod stats;

pub use error::{DashboardError, Result};
pub use session::{load_dataset, DashboardSession, DashboardSnapshot, ForecastOutcome};
pub use settings::DashboardSettings;
