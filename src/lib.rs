//! # Energy Forecast
//!
//! A Rust library for forecasting a time-indexed energy-consumption series
//! through several interchangeable model backends.
//!
//! ## Features
//!
//! - Tabular data cleaning (column drops, imputation, range filters)
//! - Lag, rolling-statistic, and calendar feature engineering
//! - Three forecasting backends behind one train/forecast contract
//!   (gradient-boosted trees, additive decomposition, sequence network)
//! - A forecast orchestrator with per-backend failure isolation
//! - Accuracy metrics (MAE, RMSE, R², MAPE)
//!
//! ## Quick Start
//!
//! ```no_run
//! use energy_forecast::artifact::ArtifactStore;
//! use energy_forecast::clean::{Cleaner, ImputeStrategy};
//! use energy_forecast::data::{SeriesFrame, SeriesLoader};
//! use energy_forecast::orchestrator::ForecastOrchestrator;
//!
//! # fn main() -> energy_forecast::Result<()> {
//! // Load data
//! let data = SeriesLoader::from_csv("readings.csv", "timestamp", "energy_kwh")?;
//!
//! // Clean it
//! let cleaner = Cleaner::new(ImputeStrategy::Mean);
//! let cleaned = cleaner.fit(data.dataframe()).transform(data.dataframe())?;
//! let data = SeriesFrame::new(cleaned, "timestamp", "energy_kwh")?;
//!
//! // Train every backend and forecast the next 24 hours
//! let store = ArtifactStore::new("models");
//! let orchestrator = ForecastOrchestrator::with_default_backends(&store);
//! orchestrator.train_all(&data);
//! let response = orchestrator.forecast_all(&data, 24);
//!
//! for (backend, report) in &response {
//!     println!("{}: success = {}", backend, report.is_success());
//! }
//! # Ok(())
//! # }
//! ```

pub mod artifact;
pub mod clean;
pub mod data;
pub mod error;
pub mod features;
pub mod metrics;
pub mod models;
pub mod orchestrator;

// Re-export commonly used types
pub use crate::artifact::{ArtifactSlot, ArtifactStore};
pub use crate::clean::{Cleaner, ImputeStrategy, RangeFilter};
pub use crate::data::{SeriesFrame, SeriesLoader};
pub use crate::error::{ForecastError, Result};
pub use crate::features::FeatureEngineer;
pub use crate::metrics::{evaluate_forecast, ForecastMetrics};
pub use crate::models::{BackendForecast, FeatureImportance, ModelBackend};
pub use crate::orchestrator::{BackendReport, ForecastOrchestrator};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
