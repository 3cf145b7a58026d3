//! Turn ranked predictions into a displayable classification result.

use serde::{Deserialize, Serialize};

use crate::prediction::{LabelPrediction, TopPredictions};
use crate::severity::{SeverityThresholds, SeverityTier};

/// Everything the UI needs to render one classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationResult {
    pub predicted_label: String,
    pub confidence: u8,
    pub all_predictions: Vec<LabelPrediction>,
    pub severity: SeverityTier,
    pub recommendations: Vec<String>,
}

/// Maps the top prediction to a severity tier and recommendation list.
#[derive(Debug, Clone, Copy, Default)]
pub struct Presenter {
    thresholds: SeverityThresholds,
}

impl Presenter {
    pub fn new(thresholds: SeverityThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> SeverityThresholds {
        self.thresholds
    }

    pub fn present(&self, predictions: TopPredictions) -> ClassificationResult {
        let top = predictions.top();
        let severity = self.thresholds.tier(top.confidence);
        ClassificationResult {
            predicted_label: top.label.clone(),
            confidence: top.confidence,
            severity,
            recommendations: severity
                .recommendations()
                .iter()
                .map(|s| s.to_string())
                .collect(),
            all_predictions: predictions.into_vec(),
        }
    }
}

/// Present with the default thresholds.
pub fn present(predictions: TopPredictions) -> ClassificationResult {
    Presenter::default().present(predictions)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn top(label: &str, confidence: u8) -> TopPredictions {
        let rest = confidence.min(4);
        TopPredictions::try_from(vec![
            LabelPrediction::new(label, confidence),
            LabelPrediction::new("second", rest),
            LabelPrediction::new("third", rest),
            LabelPrediction::new("fourth", rest),
            LabelPrediction::new("fifth", rest),
        ])
        .unwrap()
    }

    #[test]
    fn high_confidence_is_high_tier() {
        let result = present(top("A", 85));
        assert_eq!(result.severity, SeverityTier::High);
        assert_eq!(result.predicted_label, "A");
        assert_eq!(result.confidence, 85);
        assert_eq!(result.recommendations.len(), 4);
        assert_eq!(
            result.recommendations[0],
            "High confidence classification detected — consult a specialist"
        );
        assert!(result.recommendations[3].contains("not a medical diagnosis"));
    }

    #[test]
    fn sixty_is_moderate() {
        assert_eq!(present(top("B", 60)).severity, SeverityTier::Moderate);
    }

    #[test]
    fn thirty_is_normal() {
        assert_eq!(present(top("C", 30)).severity, SeverityTier::Normal);
    }

    #[test]
    fn boundaries() {
        assert_eq!(present(top("x", 80)).severity, SeverityTier::Moderate);
        assert_eq!(present(top("x", 50)).severity, SeverityTier::Normal);
    }

    #[test]
    fn keeps_all_five_in_order() {
        let result = present(top("A", 85));
        let labels: Vec<&str> = result
            .all_predictions
            .iter()
            .map(|p| p.label.as_str())
            .collect();
        assert_eq!(labels, ["A", "second", "third", "fourth", "fifth"]);
    }

    #[test]
    fn present_is_pure() {
        let input = top("A", 72);
        let first = present(input.clone());
        let second = present(input);
        assert_eq!(first, second);
    }

    #[test]
    fn custom_presenter_thresholds() {
        let presenter = Presenter::new(SeverityThresholds {
            high_above: 60,
            moderate_above: 20,
        });
        assert_eq!(presenter.present(top("A", 65)).severity, SeverityTier::High);
    }

    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_value(present(top("A", 85))).unwrap();
        assert_eq!(json["predictedLabel"], "A");
        assert_eq!(json["severity"], "high");
        assert_eq!(json["allPredictions"].as_array().unwrap().len(), 5);
    }
}
