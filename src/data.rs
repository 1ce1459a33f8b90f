//! Tabular series handling for forecasting

use crate::error::{ForecastError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;

/// A tabular batch of rows with a designated timestamp column and a
/// designated numeric target column.
#[derive(Debug, Clone)]
pub struct SeriesFrame {
    /// Data frame containing the raw rows
    df: DataFrame,
    /// Name of the timestamp column
    timestamp_column: String,
    /// Name of the target column
    target_column: String,
}

/// Loader for series data
#[derive(Debug)]
pub struct SeriesLoader;

impl SeriesLoader {
    /// Load series data from a CSV file
    pub fn from_csv<P: AsRef<Path>>(
        path: P,
        timestamp_column: &str,
        target_column: &str,
    ) -> Result<SeriesFrame> {
        let file = File::open(path)?;
        let df = CsvReader::new(file)
            .infer_schema(None)
            .has_header(true)
            .finish()?;

        SeriesFrame::new(df, timestamp_column, target_column)
    }
}

impl SeriesFrame {
    /// Create a new SeriesFrame from an existing DataFrame
    pub fn new(df: DataFrame, timestamp_column: &str, target_column: &str) -> Result<Self> {
        for column in [timestamp_column, target_column] {
            if df.column(column).is_err() {
                return Err(ForecastError::DataError(format!(
                    "Column '{}' not found in data",
                    column
                )));
            }
        }

        Ok(Self {
            df,
            timestamp_column: timestamp_column.to_string(),
            target_column: target_column.to_string(),
        })
    }

    /// Get the DataFrame
    pub fn dataframe(&self) -> &DataFrame {
        &self.df
    }

    /// Get the timestamp column name
    pub fn timestamp_column(&self) -> &str {
        &self.timestamp_column
    }

    /// Get the target column name
    pub fn target_column(&self) -> &str {
        &self.target_column
    }

    /// Get the number of rows
    pub fn len(&self) -> usize {
        self.df.height()
    }

    /// Check if the frame is empty
    pub fn is_empty(&self) -> bool {
        self.df.height() == 0
    }

    /// Parse the timestamp column into UTC datetimes, row for row.
    pub fn timestamps(&self) -> Result<Vec<DateTime<Utc>>> {
        let col = self.df.column(&self.timestamp_column)?;
        parse_timestamp_series(col)
    }

    /// Coerce the target column to f64, row for row. Values that cannot be
    /// converted (including nulls) come back as `None`.
    pub fn target_values(&self) -> Result<Vec<Option<f64>>> {
        let col = self.df.column(&self.target_column)?;
        coerce_numeric_series(col)
    }

    /// The (timestamp, target) observations this frame holds: sorted
    /// ascending by timestamp (stable) with non-coercible target rows
    /// dropped. Fails with `InvalidData` when nothing numeric remains.
    pub fn observations(&self) -> Result<(Vec<DateTime<Utc>>, Vec<f64>)> {
        let timestamps = self.timestamps()?;
        let values = self.target_values()?;

        let mut order: Vec<usize> = (0..timestamps.len()).collect();
        order.sort_by_key(|&i| timestamps[i]);

        let mut out_ts = Vec::with_capacity(order.len());
        let mut out_values = Vec::with_capacity(order.len());
        for &i in &order {
            if let Some(value) = values[i] {
                out_ts.push(timestamps[i]);
                out_values.push(value);
            }
        }

        if out_values.is_empty() {
            return Err(ForecastError::InvalidData(format!(
                "No valid numeric data found in column '{}'",
                self.target_column
            )));
        }

        Ok((out_ts, out_values))
    }

    /// Return a copy of this frame with rows stable-sorted ascending by
    /// timestamp.
    pub fn sorted_by_time(&self) -> Result<Self> {
        let timestamps = self.timestamps()?;
        let mut order: Vec<u32> = (0..timestamps.len() as u32).collect();
        order.sort_by_key(|&i| timestamps[i as usize]);

        let idx = IdxCa::from_vec("idx", order);
        let sorted = self.df.take(&idx)?;

        Ok(Self {
            df: sorted,
            timestamp_column: self.timestamp_column.clone(),
            target_column: self.target_column.clone(),
        })
    }
}

/// Parse a polars column into UTC datetimes. Handles native temporal
/// columns, epoch-millisecond integers, and common string formats.
pub(crate) fn parse_timestamp_series(col: &Series) -> Result<Vec<DateTime<Utc>>> {
    let mut out = Vec::with_capacity(col.len());

    match col.dtype() {
        DataType::Datetime(unit, _) => {
            let ca = col.datetime()?;
            for (i, value) in ca.into_iter().enumerate() {
                let raw = value.ok_or_else(|| missing_timestamp(col.name(), i))?;
                let (secs, nanos) = match unit {
                    TimeUnit::Nanoseconds => split_epoch(raw, 1_000_000_000),
                    TimeUnit::Microseconds => split_epoch(raw, 1_000_000),
                    TimeUnit::Milliseconds => split_epoch(raw, 1_000),
                };
                out.push(datetime_from_parts(col.name(), secs, nanos)?);
            }
        }
        DataType::Date => {
            let ca = col.date()?;
            for (i, value) in ca.into_iter().enumerate() {
                let days = value.ok_or_else(|| missing_timestamp(col.name(), i))?;
                out.push(datetime_from_parts(col.name(), days as i64 * 86_400, 0)?);
            }
        }
        DataType::Int64 | DataType::Int32 | DataType::UInt64 | DataType::UInt32 => {
            // Integers are read as epoch milliseconds
            let ca = col.cast(&DataType::Int64)?;
            for (i, value) in ca.i64()?.into_iter().enumerate() {
                let millis = value.ok_or_else(|| missing_timestamp(col.name(), i))?;
                let (secs, nanos) = split_epoch(millis, 1_000);
                out.push(datetime_from_parts(col.name(), secs, nanos)?);
            }
        }
        DataType::Utf8 => {
            let ca = col.utf8()?;
            for (i, value) in ca.into_iter().enumerate() {
                let text = value.ok_or_else(|| missing_timestamp(col.name(), i))?;
                let parsed = parse_timestamp_str(text).ok_or_else(|| {
                    ForecastError::DataError(format!(
                        "Cannot parse timestamp '{}' in column '{}'",
                        text,
                        col.name()
                    ))
                })?;
                out.push(parsed);
            }
        }
        other => {
            return Err(ForecastError::DataError(format!(
                "Column '{}' of type {} cannot be used as a timestamp",
                col.name(),
                other
            )))
        }
    }

    Ok(out)
}

/// Coerce a polars column into per-row `Option<f64>` values. Strings are
/// parsed; anything unconvertible becomes `None`.
pub(crate) fn coerce_numeric_series(col: &Series) -> Result<Vec<Option<f64>>> {
    match col.dtype() {
        dtype if dtype.is_numeric() => {
            let ca = col.cast(&DataType::Float64)?;
            Ok(ca.f64()?.into_iter().collect())
        }
        DataType::Utf8 => {
            let ca = col.utf8()?;
            Ok(ca
                .into_iter()
                .map(|value| value.and_then(|s| s.trim().parse::<f64>().ok()))
                .collect())
        }
        DataType::Boolean => {
            let ca = col.bool()?;
            Ok(ca
                .into_iter()
                .map(|value| value.map(|b| if b { 1.0 } else { 0.0 }))
                .collect())
        }
        _ => Ok(vec![None; col.len()]),
    }
}

/// Parse one timestamp string, trying the formats the upload layer emits.
pub(crate) fn parse_timestamp_str(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        let naive = date.and_hms_opt(0, 0, 0)?;
        return Some(Utc.from_utc_datetime(&naive));
    }

    None
}

fn split_epoch(raw: i64, per_second: i64) -> (i64, u32) {
    let secs = raw.div_euclid(per_second);
    let frac = raw.rem_euclid(per_second);
    let nanos = frac * (1_000_000_000 / per_second);
    (secs, nanos as u32)
}

fn datetime_from_parts(column: &str, secs: i64, nanos: u32) -> Result<DateTime<Utc>> {
    Utc.timestamp_opt(secs, nanos).single().ok_or_else(|| {
        ForecastError::DataError(format!(
            "Out-of-range timestamp in column '{}'",
            column
        ))
    })
}

fn missing_timestamp(column: &str, row: usize) -> ForecastError {
    ForecastError::DataError(format!(
        "Missing timestamp in column '{}' at row {}",
        column, row
    ))
}
