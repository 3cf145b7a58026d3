use medscan_core::{PredictionError, TOP_K, UploadError};
use thiserror::Error;

/// The classifier could not produce predictions.
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("model failed to load: {0}")]
    Load(String),

    #[error("inference failed: {0}")]
    Inference(String),

    #[error("model has {0} classes, need at least {TOP_K}")]
    TooFewClasses(usize),

    #[error("model produced {outputs} scores for {labels} labels")]
    LabelMismatch { outputs: usize, labels: usize },

    #[error("model output contains a non-finite score at index {0}")]
    NonFinite(usize),

    #[error("ranked output rejected: {0}")]
    Ranking(#[from] PredictionError),

    #[error("inference task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("model lock poisoned by an earlier panic")]
    Poisoned,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "onnx")]
    #[error("model asset download failed: {0}")]
    Fetch(#[from] reqwest::Error),
}

/// The uploaded file was rejected before reaching the classifier.
#[derive(Debug, Error)]
pub enum InputError {
    #[error(transparent)]
    Rejected(#[from] UploadError),

    #[error("cannot read {path}: {source}")]
    Read {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Accepted for upload, but there is no local decoder for it (DICOM).
    #[error("{0} files cannot be analyzed locally; convert to JPEG or PNG first")]
    NoDecoder(&'static str),

    #[error("cannot decode image: {0}")]
    Decode(#[from] image::ImageError),
}
