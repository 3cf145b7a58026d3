//! Ranked classifier output shared between the inference adapter and the presenter.

use std::ops::Deref;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of ranked predictions the classifier returns per image.
pub const TOP_K: usize = 5;

/// A single classifier label with its confidence as an integer percentage.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LabelPrediction {
    pub label: String,
    /// 0..=100
    pub confidence: u8,
}

impl LabelPrediction {
    pub fn new(label: impl Into<String>, confidence: u8) -> Self {
        Self {
            label: label.into(),
            confidence,
        }
    }

    /// Build a prediction from a raw probability in [0, 1], rounded to the
    /// nearest whole percent.
    pub fn from_probability(label: impl Into<String>, probability: f32) -> Self {
        let pct = (probability.clamp(0.0, 1.0) * 100.0).round() as u8;
        Self::new(label, pct)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PredictionError {
    #[error("expected {TOP_K} predictions, got {0}")]
    WrongLength(usize),

    #[error("confidence {confidence} at position {index} is above 100")]
    OutOfRange { index: usize, confidence: u8 },

    #[error("predictions not sorted by descending confidence at position {0}")]
    Unsorted(usize),
}

/// Exactly [`TOP_K`] predictions, highest confidence first.
///
/// The invariant is checked on construction, so anything holding a
/// `TopPredictions` can index `[0]` as the top label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<LabelPrediction>", into = "Vec<LabelPrediction>")]
pub struct TopPredictions(Vec<LabelPrediction>);

impl TopPredictions {
    /// The highest-confidence prediction.
    pub fn top(&self) -> &LabelPrediction {
        &self.0[0]
    }

    pub fn into_vec(self) -> Vec<LabelPrediction> {
        self.0
    }
}

impl TryFrom<Vec<LabelPrediction>> for TopPredictions {
    type Error = PredictionError;

    fn try_from(predictions: Vec<LabelPrediction>) -> Result<Self, Self::Error> {
        if predictions.len() != TOP_K {
            return Err(PredictionError::WrongLength(predictions.len()));
        }
        for (index, p) in predictions.iter().enumerate() {
            if p.confidence > 100 {
                return Err(PredictionError::OutOfRange {
                    index,
                    confidence: p.confidence,
                });
            }
        }
        if let Some(i) = predictions
            .windows(2)
            .position(|w| w[0].confidence < w[1].confidence)
        {
            return Err(PredictionError::Unsorted(i + 1));
        }
        Ok(Self(predictions))
    }
}

impl From<TopPredictions> for Vec<LabelPrediction> {
    fn from(top: TopPredictions) -> Self {
        top.0
    }
}

impl Deref for TopPredictions {
    type Target = [LabelPrediction];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// One preprocessing stage as shown on the result card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineStep {
    pub step: u8,
    pub label: String,
    pub detail: String,
}

impl PipelineStep {
    pub fn new(step: u8, label: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            step,
            label: label.into(),
            detail: detail.into(),
        }
    }
}

/// Descriptive metadata about the loaded classifier, shown next to results.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModelInfo {
    pub name: String,
    pub architecture: String,
    /// e.g. "Transfer Learning (ImageNet)".
    pub approach: String,
    /// Height, width, channels.
    pub input_shape: [u32; 3],
    pub classes: usize,
    /// Human-readable, e.g. "3.4 Million".
    pub parameters: String,
    pub layers: String,
    pub activation: String,
    pub runtime: String,
    pub pipeline: Vec<PipelineStep>,
}

impl ModelInfo {
    pub fn input_shape_display(&self) -> String {
        let [h, w, c] = self.input_shape;
        format!("{h} x {w} x {c}")
    }
}
