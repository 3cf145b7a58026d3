//! Turn a raw score vector into the top-5 label list.

use medscan_core::{LabelPrediction, TOP_K, TopPredictions};

use crate::error::InferenceError;

/// Tolerance when deciding whether scores already form a distribution.
const DISTRIBUTION_EPS: f32 = 1e-3;

/// Numerically stable softmax.
pub fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&x| (x - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    if sum > 0.0 {
        exps.into_iter().map(|e| e / sum).collect()
    } else {
        exps
    }
}

/// Return scores as probabilities, applying softmax unless they already
/// sum to one with every value in [0, 1].
pub fn to_probabilities(raw: &[f32]) -> Vec<f32> {
    let in_unit = raw.iter().all(|v| (0.0..=1.0).contains(v));
    let sum: f32 = raw.iter().sum();
    if in_unit && (sum - 1.0).abs() <= DISTRIBUTION_EPS {
        raw.to_vec()
    } else {
        softmax(raw)
    }
}

/// Pick the [`TOP_K`] highest probabilities and pair them with their labels.
///
/// Equal scores keep class-index order.
pub fn rank(probabilities: &[f32], labels: &[String]) -> Result<TopPredictions, InferenceError> {
    if probabilities.len() != labels.len() {
        return Err(InferenceError::LabelMismatch {
            outputs: probabilities.len(),
            labels: labels.len(),
        });
    }
    if probabilities.len() < TOP_K {
        return Err(InferenceError::TooFewClasses(probabilities.len()));
    }
    if let Some(i) = probabilities.iter().position(|p| !p.is_finite()) {
        return Err(InferenceError::NonFinite(i));
    }

    let mut order: Vec<usize> = (0..probabilities.len()).collect();
    order.sort_by(|&a, &b| probabilities[b].total_cmp(&probabilities[a]));

    let top: Vec<LabelPrediction> = order
        .into_iter()
        .take(TOP_K)
        .map(|i| LabelPrediction::from_probability(labels[i].clone(), probabilities[i]))
        .collect();

    Ok(TopPredictions::try_from(top)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("class_{i}")).collect()
    }

    #[test]
    fn softmax_sums_to_one() {
        let p = softmax(&[1.0, 2.0, 3.0]);
        let sum: f32 = p.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        assert!(p[2] > p[1] && p[1] > p[0]);
    }

    #[test]
    fn softmax_handles_large_logits() {
        let p = softmax(&[1000.0, 1000.0]);
        assert!((p[0] - 0.5).abs() < 1e-5);
        assert!(p.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn distribution_passes_through() {
        let raw = [0.7, 0.2, 0.1];
        assert_eq!(to_probabilities(&raw), raw.to_vec());
    }

    #[test]
    fn logits_get_softmaxed() {
        let p = to_probabilities(&[2.5, -1.0, 0.3]);
        let sum: f32 = p.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        assert!(p.iter().all(|v| *v >= 0.0));
    }

    #[test]
    fn rank_returns_top_five_descending() {
        let probs = [0.01, 0.60, 0.05, 0.20, 0.02, 0.08, 0.04];
        let top = rank(&probs, &labels(7)).unwrap();

        assert_eq!(top.len(), 5);
        let got: Vec<(&str, u8)> = top.iter().map(|p| (p.label.as_str(), p.confidence)).collect();
        assert_eq!(
            got,
            [
                ("class_1", 60),
                ("class_3", 20),
                ("class_5", 8),
                ("class_2", 5),
                ("class_6", 4),
            ]
        );
        assert!(top.windows(2).all(|w| w[0].confidence >= w[1].confidence));
        assert!(top.iter().all(|p| p.confidence <= 100));
    }

    #[test]
    fn rank_ties_keep_index_order() {
        let probs = [0.2; 5];
        let top = rank(&probs, &labels(5)).unwrap();
        let names: Vec<&str> = top.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(names, ["class_0", "class_1", "class_2", "class_3", "class_4"]);
    }

    #[test]
    fn rank_rejects_mismatch() {
        let err = rank(&[0.5, 0.5], &labels(3)).unwrap_err();
        assert!(matches!(
            err,
            InferenceError::LabelMismatch {
                outputs: 2,
                labels: 3
            }
        ));
    }

    #[test]
    fn rank_rejects_too_few_classes() {
        let err = rank(&[0.5, 0.3, 0.2], &labels(3)).unwrap_err();
        assert!(matches!(err, InferenceError::TooFewClasses(3)));
    }

    #[test]
    fn rank_rejects_nan() {
        let probs = [0.1, f32::NAN, 0.1, 0.1, 0.1, 0.6];
        let err = rank(&probs, &labels(6)).unwrap_err();
        assert!(matches!(err, InferenceError::NonFinite(1)));
    }
}
