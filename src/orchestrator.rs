//! Runs every configured backend against one frame, isolating failures

use crate::artifact::ArtifactStore;
use crate::data::SeriesFrame;
use crate::error::Result;
use crate::metrics::{evaluate_forecast, ForecastMetrics};
use crate::models::{
    additive, gradient_tree, sequence, ActualAlignment, AdditiveBackend, BackendForecast,
    FeatureImportance, GradientTreeBackend, ModelBackend, SequenceBackend,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// One backend's slot in the orchestration response: a full result or an
/// error descriptor, never both. The failure shape keeps the same keys with
/// empty arrays and null metrics so both serialize to one wire layout.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum BackendReport {
    Success {
        predicted: Vec<f64>,
        timestamps: Vec<DateTime<Utc>>,
        actual: Vec<f64>,
        metrics: ForecastMetrics,
        feature_importance: Option<Vec<FeatureImportance>>,
        actual_alignment: ActualAlignment,
    },
    Failure {
        error: String,
        predicted: Vec<f64>,
        timestamps: Vec<DateTime<Utc>>,
        actual: Vec<f64>,
        metrics: Option<ForecastMetrics>,
        feature_importance: Option<Vec<FeatureImportance>>,
    },
}

impl BackendReport {
    /// Whether this slot holds a full result
    pub fn is_success(&self) -> bool {
        matches!(self, BackendReport::Success { .. })
    }

    /// The error descriptor, if this slot holds a failure
    pub fn error(&self) -> Option<&str> {
        match self {
            BackendReport::Success { .. } => None,
            BackendReport::Failure { error, .. } => Some(error),
        }
    }

    fn success(forecast: BackendForecast, metrics: ForecastMetrics) -> Self {
        BackendReport::Success {
            predicted: forecast.predicted,
            timestamps: forecast.timestamps,
            actual: forecast.actual,
            metrics,
            feature_importance: forecast.feature_importance,
            actual_alignment: forecast.actual_alignment,
        }
    }

    fn failure(error: String) -> Self {
        BackendReport::Failure {
            error,
            predicted: Vec::new(),
            timestamps: Vec::new(),
            actual: Vec::new(),
            metrics: None,
            feature_importance: None,
        }
    }
}

/// Dispatches one dataset to a fixed, ordered set of backends and collects
/// per-backend results. A failing backend yields an error descriptor in its
/// slot and never aborts its siblings.
#[derive(Debug)]
pub struct ForecastOrchestrator {
    backends: Vec<Box<dyn ModelBackend>>,
}

impl ForecastOrchestrator {
    /// Create an orchestrator over an explicit backend list. Iteration order
    /// follows the list.
    pub fn new(backends: Vec<Box<dyn ModelBackend>>) -> Self {
        Self { backends }
    }

    /// The standard backend set, all storing artifacts in the given store
    pub fn with_default_backends(store: &ArtifactStore) -> Self {
        Self::new(vec![
            Box::new(GradientTreeBackend::new(store.slot(gradient_tree::BACKEND_ID))),
            Box::new(AdditiveBackend::new(store.slot(additive::BACKEND_ID))),
            Box::new(SequenceBackend::new(store.slot(sequence::BACKEND_ID))),
        ])
    }

    /// Identifiers of the configured backends, in execution order
    pub fn backend_ids(&self) -> Vec<&str> {
        self.backends.iter().map(|b| b.id()).collect()
    }

    /// Train every backend on the frame. Per-backend results are collected;
    /// one backend's failure does not stop the others.
    pub fn train_all(&self, data: &SeriesFrame) -> BTreeMap<String, Result<()>> {
        let mut response = BTreeMap::new();
        for backend in &self.backends {
            let outcome = backend.train(data);
            if let Err(err) = &outcome {
                log::warn!("training backend '{}' failed: {}", backend.id(), err);
            }
            response.insert(backend.id().to_string(), outcome);
        }
        response
    }

    /// Run every backend's forecast and metrics against the frame.
    ///
    /// Best-effort partial results: each backend runs independently and a
    /// failure is converted into an error descriptor in that backend's slot.
    /// The returned map holds one entry per configured backend.
    pub fn forecast_all(
        &self,
        data: &SeriesFrame,
        horizon: usize,
    ) -> BTreeMap<String, BackendReport> {
        let mut response = BTreeMap::new();

        for backend in &self.backends {
            let outcome = backend.forecast(data, horizon).and_then(|forecast| {
                let metrics = evaluate_forecast(&forecast.actual, &forecast.predicted)?;
                Ok((forecast, metrics))
            });

            let report = match outcome {
                Ok((forecast, metrics)) => {
                    log::debug!(
                        "backend '{}' produced {} points",
                        backend.id(),
                        forecast.len()
                    );
                    BackendReport::success(forecast, metrics)
                }
                Err(err) => {
                    log::warn!("backend '{}' failed: {}", backend.id(), err);
                    BackendReport::failure(err.to_string())
                }
            };

            response.insert(backend.id().to_string(), report);
        }

        response
    }
}
