//! Forecasting model backends sharing one train/forecast contract

use crate::data::SeriesFrame;
use crate::error::{ForecastError, Result};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::fmt::Debug;

pub mod additive;
pub mod gradient_tree;
pub mod sequence;

pub use additive::AdditiveBackend;
pub use gradient_tree::GradientTreeBackend;
pub use sequence::SequenceBackend;

/// How a forecast's `actual` values relate to its `timestamps`.
///
/// Backends that predict over already-observed history report values at the
/// predicted instants. Backends that extrapolate into the future cannot know
/// the true values there and return the trailing historical window instead;
/// that mismatch is surfaced here rather than left implicit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActualAlignment {
    /// `actual[i]` is the observed value at `timestamps[i]`
    PredictedTimestamps,
    /// `actual` is the last window of observed history, not the values at
    /// the (future) predicted timestamps
    TrailingHistory,
}

/// One (feature, score) entry of an importance ranking
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f64,
}

/// Result of one backend's forecast call: predictions, their timestamps, and
/// the paired actual values, all equal length and chronologically ascending.
#[derive(Debug, Clone, Serialize)]
pub struct BackendForecast {
    pub predicted: Vec<f64>,
    pub timestamps: Vec<DateTime<Utc>>,
    pub actual: Vec<f64>,
    pub feature_importance: Option<Vec<FeatureImportance>>,
    pub actual_alignment: ActualAlignment,
}

impl BackendForecast {
    /// Create a forecast result, validating the equal-length invariant
    pub fn new(
        predicted: Vec<f64>,
        timestamps: Vec<DateTime<Utc>>,
        actual: Vec<f64>,
        actual_alignment: ActualAlignment,
    ) -> Result<Self> {
        if predicted.len() != timestamps.len() || predicted.len() != actual.len() {
            return Err(ForecastError::ValidationError(format!(
                "Forecast arrays must have equal lengths (predicted {}, timestamps {}, actual {})",
                predicted.len(),
                timestamps.len(),
                actual.len()
            )));
        }

        Ok(Self {
            predicted,
            timestamps,
            actual,
            feature_importance: None,
            actual_alignment,
        })
    }

    /// Attach a feature-importance ranking
    pub fn with_importance(mut self, importance: Vec<FeatureImportance>) -> Self {
        self.feature_importance = Some(importance);
        self
    }

    /// Number of forecast points
    pub fn len(&self) -> usize {
        self.predicted.len()
    }

    /// Whether the forecast holds no points
    pub fn is_empty(&self) -> bool {
        self.predicted.is_empty()
    }
}

/// One interchangeable forecasting backend.
///
/// `train` fits on the given frame and overwrites the backend's artifact
/// slot; `forecast` loads the stored artifact and produces the last
/// `horizon` points. Backends share no mutable state and are safe to run in
/// any order.
pub trait ModelBackend: Debug + Send + Sync {
    /// Stable identifier used as the response key
    fn id(&self) -> &str;

    /// Fit on the frame and persist the trained artifact
    fn train(&self, data: &SeriesFrame) -> Result<()>;

    /// Forecast `horizon` steps using the persisted artifact
    fn forecast(&self, data: &SeriesFrame, horizon: usize) -> Result<BackendForecast>;
}

/// Future timestamps at one-hour steps, starting immediately after `last`
pub(crate) fn hourly_future_timestamps(
    last: DateTime<Utc>,
    horizon: usize,
) -> Vec<DateTime<Utc>> {
    (1..=horizon as i64)
        .map(|step| last + Duration::hours(step))
        .collect()
}
