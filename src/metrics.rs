//! Accuracy metrics for paired actual/predicted sequences

use crate::error::{ForecastError, Result};
use serde::Serialize;

/// Accuracy metrics from one forecast result.
///
/// Values are rounded for display stability at construction time: four
/// decimals for MAE/RMSE/R², two for MAPE. The underlying computation runs
/// at full precision.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastMetrics {
    /// Mean Absolute Error
    pub mae: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
    /// Coefficient of determination
    pub r2: f64,
    /// Mean Absolute Percentage Error; `None` whenever any actual value is
    /// exactly zero, where the percentage is undefined
    pub mape: Option<f64>,
}

/// Compute accuracy metrics from parallel actual/predicted sequences of
/// equal, non-zero length.
pub fn evaluate_forecast(actual: &[f64], predicted: &[f64]) -> Result<ForecastMetrics> {
    if actual.len() != predicted.len() || actual.is_empty() {
        return Err(ForecastError::ValidationError(
            "Actual and predicted values must have the same non-zero length".to_string(),
        ));
    }

    let n = actual.len() as f64;

    let mae = actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).abs())
        .sum::<f64>()
        / n;

    let mse = actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).powi(2))
        .sum::<f64>()
        / n;
    let rmse = mse.sqrt();

    let mean_actual = actual.iter().sum::<f64>() / n;
    let ss_res: f64 = actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).powi(2))
        .sum();
    let ss_tot: f64 = actual.iter().map(|a| (a - mean_actual).powi(2)).sum();
    let r2 = if ss_tot == 0.0 {
        if ss_res == 0.0 {
            1.0
        } else {
            0.0
        }
    } else {
        1.0 - ss_res / ss_tot
    };

    // The percentage error divides by each actual value, so a single zero
    // makes the whole figure undefined rather than infinite
    let mape = if actual.iter().any(|a| *a == 0.0) {
        None
    } else {
        Some(
            actual
                .iter()
                .zip(predicted.iter())
                .map(|(a, p)| ((a - p) / a).abs())
                .sum::<f64>()
                / n
                * 100.0,
        )
    };

    Ok(ForecastMetrics {
        mae: round_to(mae, 4),
        rmse: round_to(rmse, 4),
        r2: round_to(r2, 4),
        mape: mape.map(|value| round_to(value, 2)),
    })
}

fn round_to(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    (value * factor).round() / factor
}

impl std::fmt::Display for ForecastMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Forecast Accuracy Metrics:")?;
        writeln!(f, "  MAE:  {:.4}", self.mae)?;
        writeln!(f, "  RMSE: {:.4}", self.rmse)?;
        writeln!(f, "  R2:   {:.4}", self.r2)?;
        match self.mape {
            Some(mape) => writeln!(f, "  MAPE: {:.2}%", mape)?,
            None => writeln!(f, "  MAPE: undefined (zero actual)")?,
        }
        Ok(())
    }
}
