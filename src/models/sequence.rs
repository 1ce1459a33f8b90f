//! Sequence-network backend: a small windowed autoregressive network with a
//! persisted min-max scaler and a recursive multi-step forecast loop

use crate::artifact::ArtifactSlot;
use crate::data::SeriesFrame;
use crate::error::{ForecastError, Result};
use crate::models::{hourly_future_timestamps, ActualAlignment, BackendForecast, ModelBackend};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Response key for this backend
pub const BACKEND_ID: &str = "sequence";

/// Trailing window the network consumes
pub const WINDOW_SIZE: usize = 24;

/// Fitting parameters for the sequence network
#[derive(Debug, Clone)]
pub struct SequenceParams {
    /// Hidden layer width
    pub hidden_units: usize,
    /// Full passes over the training windows
    pub epochs: usize,
    /// SGD step size
    pub learning_rate: f64,
    /// Seed for weight initialisation
    pub seed: u64,
}

impl Default for SequenceParams {
    fn default() -> Self {
        Self {
            hidden_units: 8,
            epochs: 30,
            learning_rate: 0.05,
            seed: 42,
        }
    }
}

/// Sequence-network backend
#[derive(Debug)]
pub struct SequenceBackend {
    slot: ArtifactSlot,
    params: SequenceParams,
}

impl SequenceBackend {
    /// Create the backend with default fitting parameters
    pub fn new(slot: ArtifactSlot) -> Self {
        Self {
            slot,
            params: SequenceParams::default(),
        }
    }

    /// Create the backend with explicit fitting parameters
    pub fn with_params(slot: ArtifactSlot, params: SequenceParams) -> Self {
        Self { slot, params }
    }
}

impl ModelBackend for SequenceBackend {
    fn id(&self) -> &str {
        BACKEND_ID
    }

    fn train(&self, data: &SeriesFrame) -> Result<()> {
        let (_, values) = data.observations()?;

        if values.len() <= WINDOW_SIZE {
            return Err(ForecastError::InsufficientData {
                needed: WINDOW_SIZE + 1,
                got: values.len(),
            });
        }

        let scaler = MinMaxScaler::fit(&values);
        let scaled: Vec<f64> = values.iter().map(|v| scaler.transform(*v)).collect();

        let mut net = SequenceNet::new(WINDOW_SIZE, self.params.hidden_units, self.params.seed);
        net.fit(
            &scaled,
            self.params.epochs,
            self.params.learning_rate,
        );

        log::info!(
            "trained '{}' on {} windows ({} epochs)",
            BACKEND_ID,
            values.len() - WINDOW_SIZE,
            self.params.epochs
        );

        self.slot.save(&SequenceModel {
            scaler,
            net,
            window_size: WINDOW_SIZE,
        })
    }

    fn forecast(&self, data: &SeriesFrame, horizon: usize) -> Result<BackendForecast> {
        let model: SequenceModel = self.slot.load()?;
        let (timestamps, values) = data.observations()?;

        if values.len() < model.window_size {
            return Err(ForecastError::InsufficientData {
                needed: model.window_size,
                got: values.len(),
            });
        }

        let mut window: Vec<f64> = values[values.len() - model.window_size..]
            .iter()
            .map(|v| model.scaler.transform(*v))
            .collect();

        // Recursive loop: each step consumes the previous step's own scaled
        // prediction. The inverse scaling happens once at the end, not per
        // step, to keep repeated scale/unscale error out of the feedback.
        let mut scaled_predictions = Vec::with_capacity(horizon);
        for _ in 0..horizon {
            let next = model.net.forward(&window);
            scaled_predictions.push(next);
            window.remove(0);
            window.push(next);
        }

        let predicted: Vec<f64> = scaled_predictions
            .iter()
            .map(|p| model.scaler.inverse(*p))
            .collect();

        let last = *timestamps.last().ok_or_else(|| {
            ForecastError::InvalidData("No observations to forecast from".to_string())
        })?;
        let future = hourly_future_timestamps(last, horizon);

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

/// Min-max scaler mapping observed values into the network's input range.
///
/// A degenerate range (constant series) maps every value to 0.0 and inverts
/// back to the constant exactly, which keeps the recursive loop at a fixed
/// point on constant input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinMaxScaler {
    data_min: f64,
    data_max: f64,
}

impl MinMaxScaler {
    /// Fit the scaler to observed values
    pub fn fit(values: &[f64]) -> Self {
        let mut data_min = f64::INFINITY;
        let mut data_max = f64::NEG_INFINITY;
        for &value in values {
            data_min = data_min.min(value);
            data_max = data_max.max(value);
        }
        if values.is_empty() {
            data_min = 0.0;
            data_max = 0.0;
        }
        Self { data_min, data_max }
    }

    /// Scale one value into [0, 1]
    pub fn transform(&self, value: f64) -> f64 {
        let range = self.data_max - self.data_min;
        if range == 0.0 {
            0.0
        } else {
            (value - self.data_min) / range
        }
    }

    /// Map one scaled value back to the data range
    pub fn inverse(&self, value: f64) -> f64 {
        let range = self.data_max - self.data_min;
        if range == 0.0 {
            self.data_min
        } else {
            self.data_min + value * range
        }
    }
}

/// One-hidden-layer autoregressive network over a fixed trailing window
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SequenceNet {
    /// Input-to-hidden weights, one row per hidden unit
    w1: Vec<Vec<f64>>,
    b1: Vec<f64>,
    /// Hidden-to-output weights
    w2: Vec<f64>,
    b2: f64,
}

impl SequenceNet {
    fn new(window: usize, hidden: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let w1 = (0..hidden)
            .map(|_| (0..window).map(|_| rng.gen_range(-0.2..0.2)).collect())
            .collect();
        let w2 = (0..hidden).map(|_| rng.gen_range(-0.2..0.2)).collect();

        Self {
            w1,
            b1: vec![0.0; hidden],
            w2,
            b2: 0.0,
        }
    }

    fn hidden(&self, input: &[f64]) -> Vec<f64> {
        self.w1
            .iter()
            .zip(self.b1.iter())
            .map(|(weights, bias)| {
                let pre: f64 = bias
                    + weights
                        .iter()
                        .zip(input.iter())
                        .map(|(w, x)| w * x)
                        .sum::<f64>();
                pre.tanh()
            })
            .collect()
    }

    /// One-step-ahead prediction in scaled space
    fn forward(&self, input: &[f64]) -> f64 {
        let hidden = self.hidden(input);
        self.b2
            + self
                .w2
                .iter()
                .zip(hidden.iter())
                .map(|(w, h)| w * h)
                .sum::<f64>()
    }

    /// Plain SGD on squared error over all training windows
    fn fit(&mut self, scaled: &[f64], epochs: usize, learning_rate: f64) {
        let window = self.w1[0].len();

        for _ in 0..epochs {
            for start in 0..scaled.len() - window {
                let input = &scaled[start..start + window];
                let target = scaled[start + window];

                let hidden = self.hidden(input);
                let output = self.b2
                    + self
                        .w2
                        .iter()
                        .zip(hidden.iter())
                        .map(|(w, h)| w * h)
                        .sum::<f64>();
                let error = output - target;

                self.b2 -= learning_rate * error;
                for ((w2, h), (weights, bias)) in self
                    .w2
                    .iter_mut()
                    .zip(hidden.iter())
                    .zip(self.w1.iter_mut().zip(self.b1.iter_mut()))
                {
                    let grad_hidden = error * *w2 * (1.0 - h * h);
                    *w2 -= learning_rate * error * h;
                    *bias -= learning_rate * grad_hidden;
                    for (weight, x) in weights.iter_mut().zip(input.iter()) {
                        *weight -= learning_rate * grad_hidden * x;
                    }
                }
            }
        }
    }
}

/// Trained sequence-network artifact: the network and the scaler fitted
/// alongside it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct SequenceModel {
    scaler: MinMaxScaler,
    net: SequenceNet,
    window_size: usize,
}
