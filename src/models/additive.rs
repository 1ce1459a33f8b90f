//! Additive-time-series backend: linear trend plus hour-of-day and
//! day-of-week effects, queried at exact future instants

use crate::artifact::ArtifactSlot;
use crate::data::SeriesFrame;
use crate::error::{ForecastError, Result};
use crate::models::{hourly_future_timestamps, ActualAlignment, BackendForecast, ModelBackend};
use chrono::{DateTime, Datelike, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// Response key for this backend
pub const BACKEND_ID: &str = "additive";

/// Additive decomposition backend
#[derive(Debug)]
pub struct AdditiveBackend {
    slot: ArtifactSlot,
}

impl AdditiveBackend {
    pub fn new(slot: ArtifactSlot) -> Self {
        Self { slot }
    }
}

impl ModelBackend for AdditiveBackend {
    fn id(&self) -> &str {
        BACKEND_ID
    }

    fn train(&self, data: &SeriesFrame) -> Result<()> {
        let (timestamps, values) = data.observations()?;
        let model = AdditiveModel::fit(&timestamps, &values)?;
        log::info!("trained '{}' on {} observations", BACKEND_ID, values.len());
        self.slot.save(&model)
    }

    fn forecast(&self, data: &SeriesFrame, horizon: usize) -> Result<BackendForecast> {
        let model: AdditiveModel = self.slot.load()?;
        let (timestamps, values) = data.observations()?;

        let last = *timestamps.last().ok_or_else(|| {
            ForecastError::InvalidData("No observations to forecast from".to_string())
        })?;

        // The decomposition handles multi-step natively: evaluate the model
        // at the future instants, no feedback loop
        let future = hourly_future_timestamps(last, horizon);
        let predicted: Vec<f64> = future.iter().map(|ts| model.predict(*ts)).collect();

        let take = horizon.min(values.len());
        let actual = values[values.len() - take..].to_vec();

        BackendForecast::new(
            predicted[..take].to_vec(),
            future[..take].to_vec(),
            actual,
            ActualAlignment::TrailingHistory,
        )
    }
}

/// Trained additive-decomposition artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct AdditiveModel {
    /// Timestamp the trend is anchored at
    origin: DateTime<Utc>,
    /// Trend slope, per hour
    slope: f64,
    intercept: f64,
    /// Mean trend residual per hour of day
    hour_effects: Vec<f64>,
    /// Mean remaining residual per day of week (0 = Monday)
    weekday_effects: Vec<f64>,
}

impl AdditiveModel {
    fn fit(timestamps: &[DateTime<Utc>], values: &[f64]) -> Result<Self> {
        if values.len() < 2 {
            return Err(ForecastError::InsufficientData {
                needed: 2,
                got: values.len(),
            });
        }

        let origin = timestamps[0];
        let t: Vec<f64> = timestamps
            .iter()
            .map(|ts| hours_since(origin, *ts))
            .collect();

        let n = values.len() as f64;
        let t_mean = t.iter().sum::<f64>() / n;
        let y_mean = values.iter().sum::<f64>() / n;

        let covariance: f64 = t
            .iter()
            .zip(values.iter())
            .map(|(ti, yi)| (ti - t_mean) * (yi - y_mean))
            .sum();
        let variance: f64 = t.iter().map(|ti| (ti - t_mean).powi(2)).sum();

        let slope = if variance > 0.0 {
            covariance / variance
        } else {
            0.0
        };
        let intercept = y_mean - slope * t_mean;

        let residuals: Vec<f64> = t
            .iter()
            .zip(values.iter())
            .map(|(ti, yi)| yi - (intercept + slope * ti))
            .collect();

        let hour_effects = bucket_means(24, &residuals, timestamps, |ts| ts.hour() as usize);

        let deseasoned: Vec<f64> = residuals
            .iter()
            .zip(timestamps.iter())
            .map(|(r, ts)| r - hour_effects[ts.hour() as usize])
            .collect();
        let weekday_effects = bucket_means(7, &deseasoned, timestamps, |ts| {
            ts.weekday().num_days_from_monday() as usize
        });

        Ok(Self {
            origin,
            slope,
            intercept,
            hour_effects,
            weekday_effects,
        })
    }

    fn predict(&self, ts: DateTime<Utc>) -> f64 {
        let t = hours_since(self.origin, ts);
        self.intercept
            + self.slope * t
            + self.hour_effects[ts.hour() as usize]
            + self.weekday_effects[ts.weekday().num_days_from_monday() as usize]
    }
}

fn hours_since(origin: DateTime<Utc>, ts: DateTime<Utc>) -> f64 {
    (ts - origin).num_seconds() as f64 / 3600.0
}

/// Mean value per bucket; buckets with no observations contribute zero
fn bucket_means<F>(
    buckets: usize,
    values: &[f64],
    timestamps: &[DateTime<Utc>],
    key: F,
) -> Vec<f64>
where
    F: Fn(&DateTime<Utc>) -> usize,
{
    let mut sums = vec![0.0; buckets];
    let mut counts = vec![0usize; buckets];

    for (value, ts) in values.iter().zip(timestamps.iter()) {
        let bucket = key(ts);
        sums[bucket] += value;
        counts[bucket] += 1;
    }

    sums.iter()
        .zip(counts.iter())
        .map(|(sum, &count)| if count > 0 { sum / count as f64 } else { 0.0 })
        .collect()
}
