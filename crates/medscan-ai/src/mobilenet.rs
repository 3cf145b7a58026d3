//! ONNX Runtime backend for MobileNet V2 image classification.
//!
//! The model directory must contain `model.onnx` and `labels.txt`. Exports
//! with a leading background class (1001 outputs for 1000 labels) are
//! handled by dropping the first score.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use image::DynamicImage;
use medscan_core::ModelInfo;
use ort::session::Session;
use ort::value::Tensor;
use tracing::info;

use crate::assets::{AssetSource, ensure_assets};
use crate::error::InferenceError;
use crate::labels::load_labels;
use crate::model::{ImageModel, ModelLoader};
use crate::preprocess::Preprocess;
use crate::ranking::to_probabilities;

pub const MODEL_FILE: &str = "model.onnx";
pub const LABELS_FILE: &str = "labels.txt";

/// MobileNet classifier session.
pub struct MobileNet {
    session: Session,
    input_name: String,
    labels: Vec<String>,
    preprocess: Preprocess,
    /// Scores to skip at the front of the output (background class).
    offset: usize,
}

impl MobileNet {
    /// Load a classifier from a directory containing `model.onnx` and `labels.txt`.
    pub fn load(model_dir: &Path, preprocess: Preprocess) -> anyhow::Result<Self> {
        let model_path = model_dir.join(MODEL_FILE);
        let labels_path = model_dir.join(LABELS_FILE);

        anyhow::ensure!(model_path.exists(), "{MODEL_FILE} not found in {model_dir:?}");
        anyhow::ensure!(labels_path.exists(), "{LABELS_FILE} not found in {model_dir:?}");

        let session = Session::builder()?.commit_from_file(&model_path)?;
        let input_name = session.inputs()[0].name().to_string();
        let labels = load_labels(&labels_path)?;

        // Compare the declared class count against the label file.
        let classes = infer_classes(session.outputs()[0].dtype()).unwrap_or(labels.len());
        let offset = match classes.checked_sub(labels.len()) {
            Some(0) => 0,
            Some(1) => 1,
            _ => anyhow::bail!(
                "model declares {classes} classes but {} has {} labels",
                labels_path.display(),
                labels.len()
            ),
        };

        info!(
            classes,
            offset,
            input = %input_name,
            model = %model_path.display(),
            "loaded classification model"
        );
        Ok(Self {
            session,
            input_name,
            labels,
            preprocess,
            offset,
        })
    }

    fn run(&mut self, image: &DynamicImage) -> anyhow::Result<Vec<f32>> {
        let shape = self.preprocess.shape();
        let data = self.preprocess.tensor_data(image);
        let input = Tensor::from_array((shape, data.into_boxed_slice()))?;

        let outputs = self
            .session
            .run(ort::inputs![self.input_name.as_str() => input])?;

        // Scores: [1, classes] (some exports add trailing unit dims).
        let (output_shape, output_data) = outputs[0].try_extract_tensor::<f32>()?;
        let dims: &[i64] = output_shape;
        anyhow::ensure!(
            dims.first() == Some(&1),
            "unexpected output shape: {dims:?}, expected batch of 1"
        );
        let expected = self.labels.len() + self.offset;
        anyhow::ensure!(
            output_data.len() == expected,
            "model produced {} scores, expected {expected}",
            output_data.len()
        );

        Ok(to_probabilities(&output_data[self.offset..]))
    }
}

impl ImageModel for MobileNet {
    fn info(&self) -> ModelInfo {
        ModelInfo {
            name: "MobileNet V2".into(),
            architecture: "Convolutional Neural Network (CNN)".into(),
            approach: "Transfer Learning (ImageNet)".into(),
            input_shape: [self.preprocess.height, self.preprocess.width, 3],
            classes: self.labels.len(),
            parameters: "3.4 Million".into(),
            layers: "53 Conv Layers".into(),
            activation: "ReLU6 + Softmax (output)".into(),
            runtime: "ONNX Runtime".into(),
            pipeline: self.preprocess.pipeline(),
        }
    }

    fn labels(&self) -> &[String] {
        &self.labels
    }

    fn infer(&mut self, image: &DynamicImage) -> Result<Vec<f32>, InferenceError> {
        self.run(image)
            .map_err(|e| InferenceError::Inference(format!("{e:#}")))
    }
}

/// Configuration for loading MobileNet from disk, fetching missing assets first.
#[derive(Debug, Clone)]
pub struct OnnxConfig {
    pub model_dir: PathBuf,
    pub model_url: Option<String>,
    pub labels_url: Option<String>,
    pub preprocess: Preprocess,
}

impl OnnxConfig {
    pub fn new(model_dir: impl Into<PathBuf>) -> Self {
        Self {
            model_dir: model_dir.into(),
            model_url: None,
            labels_url: None,
            preprocess: Preprocess::default(),
        }
    }

    fn assets(&self) -> AssetSource {
        AssetSource {
            model_path: self.model_dir.join(MODEL_FILE),
            model_url: self.model_url.clone(),
            labels_path: self.model_dir.join(LABELS_FILE),
            labels_url: self.labels_url.clone(),
        }
    }
}

/// [`ModelLoader`] that fetches missing assets, then opens an ONNX session.
pub struct OnnxLoader {
    config: OnnxConfig,
}

impl OnnxLoader {
    pub fn new(config: OnnxConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl ModelLoader for OnnxLoader {
    async fn load(&self) -> Result<Box<dyn ImageModel>, InferenceError> {
        ensure_assets(&self.config.assets()).await?;

        let dir = self.config.model_dir.clone();
        let preprocess = self.config.preprocess;
        let model = tokio::task::spawn_blocking(move || MobileNet::load(&dir, preprocess))
            .await?
            .map_err(|e| InferenceError::Load(format!("{e:#}")))?;
        Ok(Box::new(model))
    }
}

/// Try to infer the class count from the ONNX model output type.
fn infer_classes(output_type: &ort::value::ValueType) -> Option<usize> {
    match output_type {
        ort::value::ValueType::Tensor { shape, .. } => {
            // Largest positive dim; trailing unit dims and the batch dim are 1 or dynamic.
            shape
                .iter()
                .copied()
                .filter(|&d| d > 1)
                .max()
                .map(|d| d as usize)
        }
        _ => None,
    }
}
