//! Lazily initialized classifier client.
//!
//! The client is constructed with a [`ModelLoader`] and performs the load on
//! the first call to [`ClassifierClient::initialize`] or
//! [`ClassifierClient::classify`]. Concurrent first calls share a single
//! load. A failed load leaves the client uninitialized, so a later call
//! starts a fresh attempt.

use std::sync::Arc;
use std::time::Instant;

use image::DynamicImage;
use medscan_core::{ModelInfo, ScanType, TopPredictions};
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::error::InferenceError;
use crate::model::{LoadedModel, ModelLoader};
use crate::ranking::rank;

/// One image to classify.
#[derive(Debug, Clone)]
pub struct ClassificationRequest {
    pub image: DynamicImage,
    /// Informational only; does not change inference.
    pub scan_type: Option<ScanType>,
}

impl ClassificationRequest {
    pub fn new(image: DynamicImage) -> Self {
        Self {
            image,
            scan_type: None,
        }
    }

    pub fn with_scan_type(mut self, scan_type: ScanType) -> Self {
        self.scan_type = Some(scan_type);
        self
    }
}

pub struct ClassifierClient {
    loader: Arc<dyn ModelLoader>,
    model: OnceCell<Arc<LoadedModel>>,
}

impl ClassifierClient {
    pub fn new(loader: impl ModelLoader + 'static) -> Self {
        Self::from_arc(Arc::new(loader))
    }

    pub fn from_arc(loader: Arc<dyn ModelLoader>) -> Self {
        Self {
            loader,
            model: OnceCell::new(),
        }
    }

    /// Whether the model has been loaded.
    pub fn is_ready(&self) -> bool {
        self.model.initialized()
    }

    /// Metadata of the loaded model, if any.
    pub fn model_info(&self) -> Option<&ModelInfo> {
        self.model.get().map(|m| m.info())
    }

    /// Load the model if needed and return the shared handle.
    ///
    /// Every successful call returns the same `Arc`.
    pub async fn initialize(&self) -> Result<Arc<LoadedModel>, InferenceError> {
        let loaded = self
            .model
            .get_or_try_init(|| async {
                let start = Instant::now();
                info!("loading classifier model");
                let model = self.loader.load().await.inspect_err(|e| {
                    warn!(error = %e, "classifier model failed to load");
                })?;
                let loaded = LoadedModel::new(model)?;
                info!(
                    model = %loaded.info().name,
                    classes = loaded.labels().len(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "classifier model ready"
                );
                Ok::<_, InferenceError>(Arc::new(loaded))
            })
            .await?;
        Ok(Arc::clone(loaded))
    }

    /// Classify one image into the five most likely labels.
    pub async fn classify(
        &self,
        request: ClassificationRequest,
    ) -> Result<TopPredictions, InferenceError> {
        let model = self.initialize().await?;
        if let Some(scan_type) = request.scan_type {
            debug!(scan_type = %scan_type, "classification requested");
        }

        let start = Instant::now();
        let worker = Arc::clone(&model);
        let image = request.image;
        let probabilities = tokio::task::spawn_blocking(move || worker.infer(&image)).await??;

        let top = rank(&probabilities, model.labels())?;
        info!(
            label = %top.top().label,
            confidence = top.top().confidence,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "image classified"
        );
        Ok(top)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ImageModel;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct FixedModel {
        labels: Vec<String>,
        scores: Vec<f32>,
    }

    impl ImageModel for FixedModel {
        fn info(&self) -> ModelInfo {
            ModelInfo {
                name: "fixed".into(),
                architecture: "test".into(),
                input_shape: [2, 2, 3],
                classes: self.labels.len(),
                runtime: "none".into(),
                ..Default::default()
            }
        }

        fn labels(&self) -> &[String] {
            &self.labels
        }

        fn infer(&mut self, _image: &DynamicImage) -> Result<Vec<f32>, InferenceError> {
            Ok(self.scores.clone())
        }
    }

    #[derive(Default)]
    struct CountingLoader {
        loads: Arc<AtomicUsize>,
        classes: usize,
        fail_first: bool,
        delay: Option<Duration>,
    }

    impl CountingLoader {
        fn with_classes(classes: usize) -> Self {
            Self {
                classes,
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl ModelLoader for CountingLoader {
        async fn load(&self) -> Result<Box<dyn ImageModel>, InferenceError> {
            let n = self.loads.fetch_add(1, Ordering::SeqCst);
            if let Some(d) = self.delay {
                tokio::time::sleep(d).await;
            }
            if self.fail_first && n == 0 {
                return Err(InferenceError::Load("weights unavailable".into()));
            }
            let labels: Vec<String> = (0..self.classes).map(|i| format!("class_{i}")).collect();
            // Descending weights, last class strongest.
            let total: f32 = (1..=self.classes).map(|i| i as f32).sum();
            let scores = (1..=self.classes).map(|i| i as f32 / total).collect();
            Ok(Box::new(FixedModel { labels, scores }))
        }
    }

    fn image() -> DynamicImage {
        DynamicImage::new_rgb8(4, 4)
    }

    #[tokio::test]
    async fn initialize_twice_returns_same_handle() {
        let loader = CountingLoader::with_classes(10);
        let loads = Arc::clone(&loader.loads);
        let client = ClassifierClient::new(loader);

        assert!(!client.is_ready());
        let a = client.initialize().await.unwrap();
        let b = client.initialize().await.unwrap();

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(loads.load(Ordering::SeqCst), 1);
        assert!(client.is_ready());
        assert_eq!(client.model_info().unwrap().name, "fixed");
    }

    #[tokio::test]
    async fn concurrent_first_calls_load_once() {
        let loader = CountingLoader {
            classes: 10,
            delay: Some(Duration::from_millis(20)),
            ..Default::default()
        };
        let loads = Arc::clone(&loader.loads);
        let client = ClassifierClient::new(loader);

        let handles = futures::future::join_all((0..8).map(|_| client.initialize())).await;

        assert_eq!(loads.load(Ordering::SeqCst), 1);
        let first = handles[0].as_ref().unwrap();
        for h in &handles {
            assert!(Arc::ptr_eq(first, h.as_ref().unwrap()));
        }
    }

    #[tokio::test]
    async fn classify_returns_five_sorted_percentages() {
        let client = ClassifierClient::new(CountingLoader::with_classes(10));
        let top = client
            .classify(ClassificationRequest::new(image()))
            .await
            .unwrap();

        assert_eq!(top.len(), 5);
        assert_eq!(top.top().label, "class_9");
        assert!(top.windows(2).all(|w| w[0].confidence >= w[1].confidence));
        assert!(top.iter().all(|p| p.confidence <= 100));
        // 10 / 55 ≈ 18%
        assert_eq!(top.top().confidence, 18);
    }

    #[tokio::test]
    async fn classify_loads_on_first_use() {
        let loader = CountingLoader::with_classes(6);
        let loads = Arc::clone(&loader.loads);
        let client = ClassifierClient::new(loader);

        client
            .classify(ClassificationRequest::new(image()))
            .await
            .unwrap();
        client
            .classify(ClassificationRequest::new(image()))
            .await
            .unwrap();
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn scan_type_hint_does_not_change_output() {
        let client = ClassifierClient::new(CountingLoader::with_classes(8));
        let plain = client
            .classify(ClassificationRequest::new(image()))
            .await
            .unwrap();
        let hinted = client
            .classify(ClassificationRequest::new(image()).with_scan_type(ScanType::ChestXray))
            .await
            .unwrap();
        assert_eq!(plain, hinted);
    }

    #[tokio::test]
    async fn failed_load_is_reported_and_retried_next_call() {
        let loader = CountingLoader {
            classes: 6,
            fail_first: true,
            ..Default::default()
        };
        let loads = Arc::clone(&loader.loads);
        let client = ClassifierClient::new(loader);

        let err = client
            .classify(ClassificationRequest::new(image()))
            .await
            .unwrap_err();
        assert!(matches!(err, InferenceError::Load(_)));
        assert!(!client.is_ready());

        client
            .classify(ClassificationRequest::new(image()))
            .await
            .unwrap();
        assert_eq!(loads.load(Ordering::SeqCst), 2);
        assert!(client.is_ready());
    }

    #[tokio::test]
    async fn model_with_fewer_than_five_classes_is_rejected() {
        let client = ClassifierClient::new(CountingLoader::with_classes(3));
        let err = client.initialize().await.unwrap_err();
        assert!(matches!(err, InferenceError::TooFewClasses(3)));
        assert!(!client.is_ready());
    }
}
