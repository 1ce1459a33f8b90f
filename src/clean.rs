//! Data cleaning: column drops, missing-value imputation, range filters

use crate::error::{ForecastError, Result};
use polars::prelude::*;
use std::cmp::Ordering;
use std::str::FromStr;

/// Strategy used to impute missing values in numeric columns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImputeStrategy {
    /// Replace with the column mean
    Mean,
    /// Replace with the column median
    Median,
    /// Replace with the most frequent value (smallest value on tied counts)
    Mode,
    /// Replace with zero
    Zero,
    /// Explicit no-op policy: leave missing values in place
    Skip,
}

impl FromStr for ImputeStrategy {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "mean" => Ok(ImputeStrategy::Mean),
            "median" => Ok(ImputeStrategy::Median),
            "mode" => Ok(ImputeStrategy::Mode),
            "zero" => Ok(ImputeStrategy::Zero),
            "skip" => Ok(ImputeStrategy::Skip),
            other => Err(ForecastError::UnsupportedConfiguration(format!(
                "Unknown imputation method '{}'",
                other
            ))),
        }
    }
}

/// Inclusive per-column range filter
#[derive(Debug, Clone, Copy, Default)]
pub struct RangeFilter {
    /// Inclusive lower bound
    pub min: Option<f64>,
    /// Inclusive upper bound
    pub max: Option<f64>,
}

impl RangeFilter {
    /// Keep rows with values at or above `min`
    pub fn at_least(min: f64) -> Self {
        Self {
            min: Some(min),
            max: None,
        }
    }

    /// Keep rows with values at or below `max`
    pub fn at_most(max: f64) -> Self {
        Self {
            min: None,
            max: Some(max),
        }
    }

    /// Keep rows with values inside `[min, max]`
    pub fn between(min: f64, max: f64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    fn contains(&self, value: f64) -> bool {
        self.min.map_or(true, |min| value >= min) && self.max.map_or(true, |max| value <= max)
    }
}

/// Cleans a tabular batch before feature engineering
#[derive(Debug, Clone)]
pub struct Cleaner {
    /// Columns removed up front; absent names are ignored
    drop_columns: Vec<String>,
    /// Imputation strategy for numeric columns with missing values
    impute: ImputeStrategy,
    /// Range filters applied after imputation, in insertion order
    filters: Vec<(String, RangeFilter)>,
}

impl Cleaner {
    /// Create a new cleaner with the given imputation strategy
    pub fn new(impute: ImputeStrategy) -> Self {
        Self {
            drop_columns: Vec::new(),
            impute,
            filters: Vec::new(),
        }
    }

    /// Add a column to drop during `transform`
    pub fn drop_column(mut self, name: &str) -> Self {
        self.drop_columns.push(name.to_string());
        self
    }

    /// Add an inclusive range filter on a column
    pub fn with_filter(mut self, column: &str, filter: RangeFilter) -> Self {
        self.filters.push((column.to_string(), filter));
        self
    }

    /// Stateless for this design; present for a future stateful-imputation path.
    pub fn fit(&self, _df: &DataFrame) -> &Self {
        self
    }

    /// Clean the given frame: drop columns, impute numeric nulls, apply
    /// range filters. Filtering a column that does not exist is an error.
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        let mut df = df.clone();

        for name in &self.drop_columns {
            if df.get_column_names().iter().any(|c| *c == name.as_str()) {
                df = df.drop(name)?;
            }
        }

        if self.impute != ImputeStrategy::Skip {
            let columns: Vec<String> = df
                .get_column_names()
                .iter()
                .map(|s| s.to_string())
                .collect();

            for name in columns {
                let col = df.column(&name)?;
                if !col.dtype().is_numeric() || col.null_count() == 0 {
                    continue;
                }

                let fill = match self.impute {
                    ImputeStrategy::Mean => col.mean(),
                    ImputeStrategy::Median => col.median(),
                    ImputeStrategy::Mode => mode_value(col)?,
                    ImputeStrategy::Zero => Some(0.0),
                    ImputeStrategy::Skip => unreachable!(),
                };

                // An all-null column has no statistic to impute from
                let Some(fill) = fill else { continue };

                let filled: Vec<f64> = col
                    .cast(&DataType::Float64)?
                    .f64()?
                    .into_iter()
                    .map(|value| value.unwrap_or(fill))
                    .collect();
                df.with_column(Series::new(&name, filled))?;
            }
        }

        for (name, bounds) in &self.filters {
            let col = df.column(name)?;
            let values = col.cast(&DataType::Float64)?;
            let mask: BooleanChunked = values
                .f64()?
                .into_iter()
                .map(|value| value.map_or(false, |v| bounds.contains(v)))
                .collect();
            df = df.filter(&mask)?;
        }

        Ok(df)
    }
}

/// Most frequent value in a numeric column; ties resolve to the smallest
/// value, matching the first-mode convention.
fn mode_value(col: &Series) -> Result<Option<f64>> {
    let mut values: Vec<f64> = col
        .cast(&DataType::Float64)?
        .f64()?
        .into_iter()
        .flatten()
        .collect();

    if values.is_empty() {
        return Ok(None);
    }

    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

    let mut best = values[0];
    let mut best_count = 0usize;
    let mut i = 0usize;
    while i < values.len() {
        let mut j = i + 1;
        while j < values.len() && values[j] == values[i] {
            j += 1;
        }
        if j - i > best_count {
            best_count = j - i;
            best = values[i];
        }
        i = j;
    }

    Ok(Some(best))
}
