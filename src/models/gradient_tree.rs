//! Tree-regressor backend: boosted regression trees over calendar and lag
//! features, with split-gain feature importances

use crate::artifact::ArtifactSlot;
use crate::data::SeriesFrame;
use crate::error::{ForecastError, Result};
use crate::models::{ActualAlignment, BackendForecast, FeatureImportance, ModelBackend};
use chrono::{DateTime, Datelike, Timelike, Utc};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

/// Response key for this backend
pub const BACKEND_ID: &str = "gradient_tree";

const FEATURE_NAMES: [&str; 7] = [
    "hour",
    "day_of_week",
    "is_weekend",
    "lag_1",
    "lag_24",
    "rolling_mean_3",
    "rolling_std_3",
];

/// Longest lag in the feature set; rows before it are cold and dropped
const MAX_LAG: usize = 24;
const ROLL_WINDOW: usize = 3;

/// Fitting parameters for the boosted ensemble
#[derive(Debug, Clone)]
pub struct GradientTreeParams {
    /// Number of boosting rounds
    pub rounds: usize,
    /// Maximum tree depth
    pub depth: usize,
    /// Shrinkage applied to each tree's contribution
    pub learning_rate: f64,
    /// Minimum rows on each side of a split
    pub min_leaf: usize,
}

impl Default for GradientTreeParams {
    fn default() -> Self {
        Self {
            rounds: 50,
            depth: 3,
            learning_rate: 0.1,
            min_leaf: 2,
        }
    }
}

/// Gradient-boosted tree backend
#[derive(Debug)]
pub struct GradientTreeBackend {
    slot: ArtifactSlot,
    params: GradientTreeParams,
}

impl GradientTreeBackend {
    /// Create the backend with default fitting parameters
    pub fn new(slot: ArtifactSlot) -> Self {
        Self {
            slot,
            params: GradientTreeParams::default(),
        }
    }

    /// Create the backend with explicit fitting parameters
    pub fn with_params(slot: ArtifactSlot, params: GradientTreeParams) -> Self {
        Self { slot, params }
    }
}

impl ModelBackend for GradientTreeBackend {
    fn id(&self) -> &str {
        BACKEND_ID
    }

    fn train(&self, data: &SeriesFrame) -> Result<()> {
        let rows = supervised_rows(data)?;
        let model = GradientTreeModel::fit(&rows.features, &rows.targets, &self.params);
        log::info!(
            "trained '{}' on {} rows ({} boosting rounds)",
            BACKEND_ID,
            rows.targets.len(),
            self.params.rounds
        );
        self.slot.save(&model)
    }

    fn forecast(&self, data: &SeriesFrame, horizon: usize) -> Result<BackendForecast> {
        let model: GradientTreeModel = self.slot.load()?;
        let rows = supervised_rows(data)?;

        // Every lag comes from observed history, so all warm rows can be
        // predicted in one pass; the last `horizon` of them are the result
        let predicted: Vec<f64> = rows
            .features
            .iter()
            .map(|row| model.predict_row(row))
            .collect();

        let take = horizon.min(predicted.len());
        let start = predicted.len() - take;

        Ok(BackendForecast::new(
            predicted[start..].to_vec(),
            rows.timestamps[start..].to_vec(),
            rows.targets[start..].to_vec(),
            ActualAlignment::PredictedTimestamps,
        )?
        .with_importance(model.importance_ranking()))
    }
}

struct SupervisedRows {
    features: Vec<Vec<f64>>,
    targets: Vec<f64>,
    timestamps: Vec<DateTime<Utc>>,
}

/// Build the fixed feature set over the sorted series and drop the cold
/// prefix. Rolling statistics cover the window ending one row earlier, so a
/// row's own target never leaks into its features.
fn supervised_rows(data: &SeriesFrame) -> Result<SupervisedRows> {
    let (timestamps, values) = data.observations()?;

    if values.len() <= MAX_LAG {
        return Err(ForecastError::InsufficientData {
            needed: MAX_LAG + 1,
            got: values.len(),
        });
    }

    let mut features = Vec::with_capacity(values.len() - MAX_LAG);
    let mut targets = Vec::with_capacity(values.len() - MAX_LAG);
    let mut row_ts = Vec::with_capacity(values.len() - MAX_LAG);

    for i in MAX_LAG..values.len() {
        let window = &values[i - ROLL_WINDOW..i];
        let ts = timestamps[i];
        let day_of_week = ts.weekday().num_days_from_monday() as f64;

        features.push(vec![
            ts.hour() as f64,
            day_of_week,
            if day_of_week >= 5.0 { 1.0 } else { 0.0 },
            values[i - 1],
            values[i - MAX_LAG],
            window.mean(),
            window.std_dev(),
        ]);
        targets.push(values[i]);
        row_ts.push(ts);
    }

    Ok(SupervisedRows {
        features,
        targets,
        timestamps: row_ts,
    })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
enum TreeNode {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

impl TreeNode {
    fn predict(&self, row: &[f64]) -> f64 {
        match self {
            TreeNode::Leaf { value } => *value,
            TreeNode::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                if row[*feature] <= *threshold {
                    left.predict(row)
                } else {
                    right.predict(row)
                }
            }
        }
    }
}

/// Trained boosted-tree artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct GradientTreeModel {
    base_score: f64,
    learning_rate: f64,
    trees: Vec<TreeNode>,
    feature_names: Vec<String>,
    /// Split-gain share per feature, as percentages summing to 100
    importance: Vec<f64>,
}

impl GradientTreeModel {
    fn fit(features: &[Vec<f64>], targets: &[f64], params: &GradientTreeParams) -> Self {
        let n = targets.len();
        let base_score = targets.iter().sum::<f64>() / n as f64;

        let mut predictions = vec![base_score; n];
        let mut gains = vec![0.0; FEATURE_NAMES.len()];
        let mut trees = Vec::with_capacity(params.rounds);
        let rows: Vec<usize> = (0..n).collect();

        for _ in 0..params.rounds {
            let residuals: Vec<f64> = targets
                .iter()
                .zip(predictions.iter())
                .map(|(t, p)| t - p)
                .collect();

            let tree = build_tree(
                features,
                &residuals,
                &rows,
                params.depth,
                params.min_leaf,
                &mut gains,
            );

            for (i, prediction) in predictions.iter_mut().enumerate() {
                *prediction += params.learning_rate * tree.predict(&features[i]);
            }
            trees.push(tree);
        }

        let total_gain: f64 = gains.iter().sum();
        let importance = if total_gain > 0.0 {
            gains.iter().map(|g| g / total_gain * 100.0).collect()
        } else {
            gains
        };

        Self {
            base_score,
            learning_rate: params.learning_rate,
            trees,
            feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
            importance,
        }
    }

    fn predict_row(&self, row: &[f64]) -> f64 {
        self.base_score
            + self
                .trees
                .iter()
                .map(|tree| self.learning_rate * tree.predict(row))
                .sum::<f64>()
    }

    /// Importance ranking sorted by descending score, positive scores only
    fn importance_ranking(&self) -> Vec<FeatureImportance> {
        let mut ranking: Vec<FeatureImportance> = self
            .feature_names
            .iter()
            .zip(self.importance.iter())
            .filter(|(_, score)| **score > 0.0)
            .map(|(name, score)| FeatureImportance {
                feature: name.clone(),
                importance: *score,
            })
            .collect();
        ranking.sort_by(|a, b| {
            b.importance
                .partial_cmp(&a.importance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        ranking
    }
}

fn build_tree(
    features: &[Vec<f64>],
    residuals: &[f64],
    rows: &[usize],
    depth: usize,
    min_leaf: usize,
    gains: &mut [f64],
) -> TreeNode {
    let mean = rows.iter().map(|&r| residuals[r]).sum::<f64>() / rows.len() as f64;

    if depth == 0 || rows.len() < 2 * min_leaf {
        return TreeNode::Leaf { value: mean };
    }

    let parent_sse: f64 = rows.iter().map(|&r| (residuals[r] - mean).powi(2)).sum();

    let mut best: Option<(usize, f64, f64)> = None;
    for feature in 0..FEATURE_NAMES.len() {
        let mut ordered: Vec<(f64, f64)> = rows
            .iter()
            .map(|&r| (features[r][feature], residuals[r]))
            .collect();
        ordered.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

        let mut left_sum = 0.0;
        let mut left_sq = 0.0;
        let total_sum: f64 = ordered.iter().map(|(_, r)| r).sum();
        let total_sq: f64 = ordered.iter().map(|(_, r)| r * r).sum();

        for split in 1..ordered.len() {
            left_sum += ordered[split - 1].1;
            left_sq += ordered[split - 1].1 * ordered[split - 1].1;

            if split < min_leaf || ordered.len() - split < min_leaf {
                continue;
            }
            // Cannot split between equal feature values
            if ordered[split].0 <= ordered[split - 1].0 {
                continue;
            }

            let n_left = split as f64;
            let n_right = (ordered.len() - split) as f64;
            let right_sum = total_sum - left_sum;
            let right_sq = total_sq - left_sq;

            let sse_left = left_sq - left_sum * left_sum / n_left;
            let sse_right = right_sq - right_sum * right_sum / n_right;
            let gain = parent_sse - sse_left - sse_right;

            let threshold = (ordered[split - 1].0 + ordered[split].0) / 2.0;
            if gain > best.map_or(1e-12, |(_, _, g)| g) {
                best = Some((feature, threshold, gain));
            }
        }
    }

    match best {
        Some((feature, threshold, gain)) => {
            gains[feature] += gain;

            let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
                .iter()
                .copied()
                .partition(|&r| features[r][feature] <= threshold);

            TreeNode::Split {
                feature,
                threshold,
                left: Box::new(build_tree(
                    features,
                    residuals,
                    &left_rows,
                    depth - 1,
                    min_leaf,
                    gains,
                )),
                right: Box::new(build_tree(
                    features,
                    residuals,
                    &right_rows,
                    depth - 1,
                    min_leaf,
                    gains,
                )),
            }
        }
        None => TreeNode::Leaf { value: mean },
    }
}
