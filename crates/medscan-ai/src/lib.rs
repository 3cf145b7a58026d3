//! Image classification layer: a lazily loaded classifier behind a client,
//! with an ONNX Runtime MobileNet backend.

mod client;
mod error;
mod input;
pub mod labels;
mod model;
pub mod preprocess;
pub mod ranking;

pub use client::{ClassificationRequest, ClassifierClient};
pub use error::{InferenceError, InputError};
pub use input::open_image;
pub use model::{ImageModel, LoadedModel, ModelLoader};
pub use preprocess::{Normalization, Preprocess, TensorLayout};

#[cfg(feature = "onnx")]
pub mod assets;
#[cfg(feature = "onnx")]
mod mobilenet;
#[cfg(feature = "onnx")]
pub use mobilenet::{MobileNet, OnnxConfig, OnnxLoader};
