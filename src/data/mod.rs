//! Data module - CSV intake, normalisation and filtering
//!
//! ```text
//!  CSV bytes ──► loader (read + validate) ──► processor (parse or null)
//!                                                   │
//!                                                   ▼
//!                                   Dataset ──► filter ──► FilteredView
//! ```

pub mod filter;
pub mod loader;
pub mod model;
pub mod processor;

pub use filter::{FilterCriteria, FilteredView};
pub use loader::{validate, DataLoader, RawTable};
pub use model::{CoercionReport, Dataset, Dimension, MonthKey, Record};
pub use processor::DataProcessor;
