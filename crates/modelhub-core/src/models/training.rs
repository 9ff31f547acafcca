use serde::{Deserialize, Serialize};

/// A training run: one model trained on one dataset, with its scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct Training {
    pub id: i64,
    pub experiment_name: String,
    pub model_id: i64,
    #[serde(default)]
    pub model_name: String,
    pub dataset_id: i64,
    #[serde(default)]
    pub dataset_name: String,
    #[serde(default)]
    pub precision: f64,
    #[serde(default)]
    pub recall: f64,
}

impl Training {
    /// Harmonic mean of precision and recall; 0 when both are 0.
    pub fn f1_score(&self) -> f64 {
        let sum = self.precision + self.recall;
        if sum <= 0.0 {
            0.0
        } else {
            2.0 * self.precision * self.recall / sum
        }
    }
}

/// Payload for starting a training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct TrainingCreate {
    pub experiment_name: String,
    pub model_id: i64,
    pub dataset_id: i64,
}
