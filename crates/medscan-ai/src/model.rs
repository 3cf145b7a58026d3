//! Seams between the classifier client and a concrete model backend.

use std::sync::Mutex;

use async_trait::async_trait;
use image::DynamicImage;
use medscan_core::{ModelInfo, TOP_K};

use crate::error::InferenceError;

/// A loaded, ready-to-run image classifier.
pub trait ImageModel: Send {
    fn info(&self) -> ModelInfo;

    /// Class names, indexed like the score vector from [`ImageModel::infer`].
    fn labels(&self) -> &[String];

    /// Run one forward pass and return a probability per class.
    fn infer(&mut self, image: &DynamicImage) -> Result<Vec<f32>, InferenceError>;
}

/// Produces an [`ImageModel`]; called at most once per successful
/// client initialization.
#[async_trait]
pub trait ModelLoader: Send + Sync {
    async fn load(&self) -> Result<Box<dyn ImageModel>, InferenceError>;
}

/// Shared handle to a loaded model.
///
/// Metadata is copied out at load time so readers never wait on the
/// session lock.
pub struct LoadedModel {
    info: ModelInfo,
    labels: Vec<String>,
    model: Mutex<Box<dyn ImageModel>>,
}

impl LoadedModel {
    pub fn new(model: Box<dyn ImageModel>) -> Result<Self, InferenceError> {
        let labels = model.labels().to_vec();
        if labels.len() < TOP_K {
            return Err(InferenceError::TooFewClasses(labels.len()));
        }
        Ok(Self {
            info: model.info(),
            labels,
            model: Mutex::new(model),
        })
    }

    pub fn info(&self) -> &ModelInfo {
        &self.info
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Blocking forward pass. Call from a blocking thread.
    pub fn infer(&self, image: &DynamicImage) -> Result<Vec<f32>, InferenceError> {
        let mut model = self.model.lock().map_err(|_| InferenceError::Poisoned)?;
        model.infer(image)
    }
}

impl std::fmt::Debug for LoadedModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedModel")
            .field("info", &self.info)
            .field("classes", &self.labels.len())
            .finish()
    }
}
