//! Lag, rolling-statistic, and calendar feature derivation

use crate::data::{coerce_numeric_series, parse_timestamp_series};
use crate::error::Result;
use chrono::{DateTime, Datelike, Timelike, Utc};
use polars::prelude::*;

/// Default lag offsets, in rows
pub const DEFAULT_LAGS: [usize; 6] = [1, 2, 3, 6, 12, 24];
/// Default rolling-window widths, in rows
pub const DEFAULT_ROLLING_WINDOWS: [usize; 3] = [3, 6, 12];

/// Derives model features from a timestamp-indexed series
#[derive(Debug, Clone)]
pub struct FeatureEngineer {
    target_column: String,
    timestamp_column: String,
    lags: Vec<usize>,
    rolling_windows: Vec<usize>,
}

impl FeatureEngineer {
    /// Create a feature engineer with the default lag and window sets
    pub fn new(target_column: &str, timestamp_column: &str) -> Self {
        Self {
            target_column: target_column.to_string(),
            timestamp_column: timestamp_column.to_string(),
            lags: DEFAULT_LAGS.to_vec(),
            rolling_windows: DEFAULT_ROLLING_WINDOWS.to_vec(),
        }
    }

    /// Override the lag offsets
    pub fn with_lags(mut self, lags: Vec<usize>) -> Self {
        self.lags = lags;
        self
    }

    /// Override the rolling-window widths
    pub fn with_rolling_windows(mut self, windows: Vec<usize>) -> Self {
        self.rolling_windows = windows;
        self
    }

    /// Build the feature matrix: rows sorted ascending by timestamp, lag and
    /// rolling-mean columns for the configured sets, calendar integers, and
    /// every row with a missing value dropped. The rolling statistics are
    /// computed on the series shifted by one row, so a row's own target value
    /// never feeds its own rolling feature.
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        let timestamps = parse_timestamp_series(df.column(&self.timestamp_column)?)?;

        // Stable ascending sort; ties keep their original relative order
        let mut order: Vec<u32> = (0..timestamps.len() as u32).collect();
        order.sort_by_key(|&i| timestamps[i as usize]);

        let idx = IdxCa::from_vec("idx", order.clone());
        let mut out = df.take(&idx)?;

        let sorted_ts: Vec<DateTime<Utc>> =
            order.iter().map(|&i| timestamps[i as usize]).collect();
        let target = coerce_numeric_series(out.column(&self.target_column)?)?;
        let n = target.len();

        // Normalize the timestamp column to a datetime dtype
        let millis: Vec<i64> = sorted_ts.iter().map(|ts| ts.timestamp_millis()).collect();
        out.with_column(
            Series::new(&self.timestamp_column, millis)
                .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?,
        )?;

        for &lag in &self.lags {
            let values: Vec<Option<f64>> = (0..n)
                .map(|i| if i >= lag { target[i - lag] } else { None })
                .collect();
            let name = format!("{}_lag_{}", self.target_column, lag);
            out.with_column(Series::new(&name, values))?;
        }

        for &window in &self.rolling_windows {
            let values: Vec<Option<f64>> = (0..n)
                .map(|i| {
                    if i < window {
                        return None;
                    }
                    window_mean(&target[i - window..i])
                })
                .collect();
            let name = format!("{}_roll_mean_{}", self.target_column, window);
            out.with_column(Series::new(&name, values))?;
        }

        let hours: Vec<i32> = sorted_ts.iter().map(|ts| ts.hour() as i32).collect();
        let dows: Vec<i32> = sorted_ts
            .iter()
            .map(|ts| ts.weekday().num_days_from_monday() as i32)
            .collect();
        let months: Vec<i32> = sorted_ts.iter().map(|ts| ts.month() as i32).collect();
        let days: Vec<i32> = sorted_ts.iter().map(|ts| ts.day() as i32).collect();

        out.with_column(Series::new("hour", hours))?;
        out.with_column(Series::new("dayofweek", dows))?;
        out.with_column(Series::new("month", months))?;
        out.with_column(Series::new("day", days))?;

        // Drop every row carrying a missing value so the matrix is warm
        let mut any_null: Option<BooleanChunked> = None;
        for col in out.get_columns() {
            let nulls = col.is_null();
            any_null = Some(match any_null {
                Some(acc) => &acc | &nulls,
                None => nulls,
            });
        }

        if let Some(mask) = any_null {
            let keep: BooleanChunked = mask
                .into_iter()
                .map(|value| !value.unwrap_or(false))
                .collect();
            out = out.filter(&keep)?;
        }

        Ok(out)
    }
}

/// Mean of a fully-populated window; `None` if any entry is missing
fn window_mean(window: &[Option<f64>]) -> Option<f64> {
    let mut sum = 0.0;
    for value in window {
        sum += (*value)?;
    }
    Some(sum / window.len() as f64)
}
