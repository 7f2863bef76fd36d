//! Classification of decoded images with a pretrained model.
//!
//! A `ModelProvider` knows how to load a model; the loaded `Classifier` runs
//! forward passes. `LazyModel` sits between the two and makes sure the model is
//! loaded once, on first use, and then reused for the rest of the process.
//!
//! # Usage
//!
//! ```rust,ignore
//! use snaplabel_core::inference::{LazyModel, OnnxModelProvider};
//!
//! let provider = OnnxModelProvider::new(config.model.clone(), config.model_variant_dir());
//! let model = LazyModel::new(Box::new(provider));
//! let results = model.classify(tensor, 3).await?;
//! ```

pub mod labels;
pub mod onnx;
pub mod preprocess;
pub mod ranking;

pub use labels::Labels;
pub use onnx::{OnnxClassifier, OnnxModelProvider};
pub use ranking::top_k;

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::OnceCell;

use crate::error::PipelineError;
use crate::pipeline::ImageTensor;
use crate::types::Classification;

/// A loaded model that maps a pixel tensor to ranked labels.
///
/// Implementations must be pure at fixed weights: the same tensor always
/// yields the same ordered output.
pub trait Classifier: Send + Sync {
    /// Return at most `k` predictions, most confident first.
    fn classify(&self, tensor: &ImageTensor, k: usize) -> Result<Vec<Classification>, PipelineError>;
}

/// Loads a classifier.
///
/// Uses `async_trait` because native async fn in trait is not object-safe.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Model name for logging.
    fn name(&self) -> &str;

    /// Load the model weights and return a ready classifier.
    async fn load(&self) -> Result<Arc<dyn Classifier>, PipelineError>;
}

/// Long-lived owner of the model handle with init-once semantics.
///
/// The first call to [`LazyModel::get`] loads the model; every later call
/// returns the same handle. A failed load leaves the cell empty, so the next
/// classification tries again.
pub struct LazyModel {
    provider: Box<dyn ModelProvider>,
    cell: OnceCell<Arc<dyn Classifier>>,
}

impl LazyModel {
    pub fn new(provider: Box<dyn ModelProvider>) -> Self {
        Self {
            provider,
            cell: OnceCell::new(),
        }
    }

    /// Get the loaded classifier, loading it on first use.
    pub async fn get(&self) -> Result<Arc<dyn Classifier>, PipelineError> {
        let classifier = self
            .cell
            .get_or_try_init(|| async {
                tracing::debug!("First use of {}; loading model", self.provider.name());
                self.provider.load().await
            })
            .await?;
        Ok(Arc::clone(classifier))
    }

    /// Whether the model has been loaded.
    pub fn is_loaded(&self) -> bool {
        self.cell.initialized()
    }

    /// Load the model (if needed) and classify `tensor`.
    ///
    /// The forward pass runs on the blocking pool but is awaited before
    /// returning, so it stays strictly after decoding.
    pub async fn classify(&self, tensor: ImageTensor, k: usize) -> Result<Vec<Classification>, PipelineError> {
        let classifier = self.get().await?;
        let name = self.provider.name().to_string();
        tokio::task::spawn_blocking(move || classifier.classify(&tensor, k))
            .await
            .map_err(|e| PipelineError::Inference {
                path: name.into(),
                message: format!("Task join error: {e}"),
            })?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MeanBrightness;

    impl Classifier for MeanBrightness {
        fn classify(&self, tensor: &ImageTensor, k: usize) -> Result<Vec<Classification>, PipelineError> {
            let n = tensor.data().len().max(1) as f32;
            let mean = tensor.data().iter().map(|&v| v as f32).sum::<f32>() / n / 255.0;
            let labels = Labels::new(vec!["bright".into(), "dark".into()]);
            Ok(top_k(&[mean, 1.0 - mean], &labels, 0, k))
        }
    }

    struct CountingProvider {
        loads: Arc<AtomicUsize>,
        fail_first: bool,
    }

    #[async_trait]
    impl ModelProvider for CountingProvider {
        fn name(&self) -> &str {
            "counting"
        }

        async fn load(&self) -> Result<Arc<dyn Classifier>, PipelineError> {
            let n = self.loads.fetch_add(1, Ordering::SeqCst);
            if self.fail_first && n == 0 {
                return Err(PipelineError::ModelLoad {
                    path: "counting".into(),
                    message: "flaky".into(),
                });
            }
            Ok(Arc::new(MeanBrightness))
        }
    }

    fn white() -> ImageTensor {
        ImageTensor::from_rgb(RgbImage::from_pixel(4, 4, image::Rgb([255, 255, 255])))
    }

    #[tokio::test]
    async fn test_model_loaded_once() {
        let loads = Arc::new(AtomicUsize::new(0));
        let model = LazyModel::new(Box::new(CountingProvider {
            loads: loads.clone(),
            fail_first: false,
        }));
        assert!(!model.is_loaded());

        model.classify(white(), 2).await.unwrap();
        model.classify(white(), 2).await.unwrap();

        assert!(model.is_loaded());
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_load_is_retried() {
        let loads = Arc::new(AtomicUsize::new(0));
        let model = LazyModel::new(Box::new(CountingProvider {
            loads: loads.clone(),
            fail_first: true,
        }));

        assert!(model.classify(white(), 2).await.is_err());
        assert!(!model.is_loaded());
        assert!(model.classify(white(), 2).await.is_ok());
        assert_eq!(loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_same_tensor_same_output() {
        let model = LazyModel::new(Box::new(CountingProvider {
            loads: Arc::new(AtomicUsize::new(0)),
            fail_first: false,
        }));
        let a = model.classify(white(), 2).await.unwrap();
        let b = model.classify(white(), 2).await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a[0].class_name, "bright");
    }
}
