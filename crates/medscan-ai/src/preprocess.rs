//! Image to input tensor: resize, normalize, lay out as a batch of one.

use image::DynamicImage;
use image::imageops::FilterType;
use medscan_core::PipelineStep;

const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Channel order of the model input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TensorLayout {
    /// `[1, 3, H, W]` (ONNX model zoo exports).
    #[default]
    Nchw,
    /// `[1, H, W, 3]` (TensorFlow exports).
    Nhwc,
}

/// Pixel scaling applied after dividing by 255.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Normalization {
    /// Per-channel ImageNet mean/std.
    #[default]
    ImageNet,
    /// `[-1, 1]`, as the Keras MobileNet family expects.
    SignedUnit,
    /// `[0, 1]`.
    Unit,
}

impl Normalization {
    fn apply(&self, channel: usize, byte: u8) -> f32 {
        let v = byte as f32 / 255.0;
        match self {
            Self::ImageNet => (v - IMAGENET_MEAN[channel]) / IMAGENET_STD[channel],
            Self::SignedUnit => v * 2.0 - 1.0,
            Self::Unit => v,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preprocess {
    pub width: u32,
    pub height: u32,
    pub layout: TensorLayout,
    pub normalization: Normalization,
}

impl Default for Preprocess {
    fn default() -> Self {
        Self {
            width: 224,
            height: 224,
            layout: TensorLayout::default(),
            normalization: Normalization::default(),
        }
    }
}

impl Preprocess {
    /// Tensor shape for a batch of one.
    pub fn shape(&self) -> [i64; 4] {
        let (h, w) = (self.height as i64, self.width as i64);
        match self.layout {
            TensorLayout::Nchw => [1, 3, h, w],
            TensorLayout::Nhwc => [1, h, w, 3],
        }
    }

    /// Steps from raw upload to class scores, for display next to results.
    pub fn pipeline(&self) -> Vec<PipelineStep> {
        let normalize = match self.normalization {
            Normalization::ImageNet => "Pixels / 255, ImageNet mean/std",
            Normalization::SignedUnit => "Pixels / 255 -> [-1, 1]",
            Normalization::Unit => "Pixels / 255 -> [0, 1]",
        };
        let shape = self.shape().map(|d| d.to_string()).join(", ");
        vec![
            PipelineStep::new(1, "Load", "Raw image input"),
            PipelineStep::new(2, "Resize", format!("{} x {} px", self.width, self.height)),
            PipelineStep::new(3, "Normalize", normalize),
            PipelineStep::new(4, "Batch", format!("Shape: [{shape}]")),
            PipelineStep::new(5, "CNN Forward", "Convolutional feature extraction"),
            PipelineStep::new(6, "Softmax", "Class probabilities"),
        ]
    }

    /// Flat tensor data in [`Self::shape`] order.
    pub fn tensor_data(&self, image: &DynamicImage) -> Vec<f32> {
        let rgb = if image.width() == self.width && image.height() == self.height {
            image.to_rgb8()
        } else {
            image
                .resize_exact(self.width, self.height, FilterType::Triangle)
                .to_rgb8()
        };

        let (w, h) = (self.width as usize, self.height as usize);
        let plane = w * h;
        let mut data = vec![0.0f32; plane * 3];

        for (i, px) in rgb.pixels().enumerate() {
            for c in 0..3 {
                let v = self.normalization.apply(c, px.0[c]);
                let idx = match self.layout {
                    TensorLayout::Nchw => c * plane + i,
                    TensorLayout::Nhwc => i * 3 + c,
                };
                data[idx] = v;
            }
        }
        data
    }
}
