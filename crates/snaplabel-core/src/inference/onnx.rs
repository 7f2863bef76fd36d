//! ONNX Runtime session management and classification.
//!
//! Loads an ImageNet classifier exported to ONNX and runs the forward pass over
//! a preprocessed `[1, 3, S, S]` tensor.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use ort::session::Session;
use ort::value::Value;

use super::labels::Labels;
use super::preprocess::preprocess;
use super::ranking::top_k;
use super::{Classifier, ModelProvider};
use crate::checksum::{self, Verification};
use crate::config::ModelConfig;
use crate::error::PipelineError;
use crate::math::softmax_in_place;
use crate::pipeline::ImageTensor;
use crate::types::Classification;

/// The model filename inside the variant directory.
pub const MODEL_FILENAME: &str = "model.onnx";

/// The label table filename inside the variant directory.
pub const LABELS_FILENAME: &str = "labels.txt";

/// Loads `{variant_dir}/model.onnx` and `{variant_dir}/labels.txt`.
pub struct OnnxModelProvider {
    config: ModelConfig,
    variant_dir: PathBuf,
}

impl OnnxModelProvider {
    pub fn new(config: ModelConfig, variant_dir: impl Into<PathBuf>) -> Self {
        Self {
            config,
            variant_dir: variant_dir.into(),
        }
    }

    pub fn model_path(&self) -> PathBuf {
        self.variant_dir.join(MODEL_FILENAME)
    }

    pub fn labels_path(&self) -> PathBuf {
        self.variant_dir.join(LABELS_FILENAME)
    }

    fn load_sync(config: ModelConfig, model_path: PathBuf, labels_path: PathBuf) -> Result<OnnxClassifier, PipelineError> {
        if !model_path.exists() {
            return Err(PipelineError::ModelLoad {
                path: model_path,
                message: "Model not found. Run `snaplabel models download` first.".to_string(),
            });
        }

        if let Some(expected) = config.blake3.as_deref() {
            let verification = checksum::verify(&model_path, expected).map_err(|e| {
                PipelineError::ModelLoad {
                    path: model_path.clone(),
                    message: format!("Checksum computation failed: {e}"),
                }
            })?;
            if let Verification::Mismatch { actual } = verification {
                return Err(PipelineError::ModelLoad {
                    path: model_path,
                    message: format!("Checksum mismatch: expected {expected}, got {actual}"),
                });
            }
        }

        let labels = if labels_path.exists() {
            Labels::load(&labels_path)?
        } else {
            tracing::warn!(
                "No label file at {:?}; predictions will use class indices",
                labels_path
            );
            Labels::default()
        };

        OnnxClassifier::load(&model_path, labels, config)
    }
}

#[async_trait]
impl ModelProvider for OnnxModelProvider {
    fn name(&self) -> &str {
        &self.config.name
    }

    async fn load(&self) -> Result<Arc<dyn Classifier>, PipelineError> {
        let config = self.config.clone();
        let model_path = self.model_path();
        let labels_path = self.labels_path();

        tracing::info!("Loading {} from {:?}", self.config.name, model_path);
        let classifier = tokio::task::spawn_blocking(move || {
            Self::load_sync(config, model_path, labels_path)
        })
        .await
        .map_err(|e| PipelineError::ModelLoad {
            path: self.model_path(),
            message: format!("Task join error: {e}"),
        })??;
        tracing::info!("{} loaded ({} labels)", self.config.name, classifier.labels.len());

        Ok(Arc::new(classifier))
    }
}

/// Wraps an ONNX Runtime session for classification.
///
/// Uses a `Mutex` because `Session::run` requires `&mut self`.
pub struct OnnxClassifier {
    session: Mutex<Session>,
    /// Name of the input tensor (detected from model metadata).
    input_name: String,
    labels: Labels,
    config: ModelConfig,
    model_path: PathBuf,
}

impl OnnxClassifier {
    /// Load a classifier from an ONNX file.
    pub fn load(model_path: &Path, labels: Labels, config: ModelConfig) -> Result<Self, PipelineError> {
        let session = Session::builder()
            .map_err(|e| PipelineError::ModelLoad {
                path: model_path.to_path_buf(),
                message: format!("Failed to create ONNX session builder: {e}"),
            })?
            .commit_from_file(model_path)
            .map_err(|e| PipelineError::ModelLoad {
                path: model_path.to_path_buf(),
                message: format!("Failed to load ONNX model: {e}"),
            })?;

        let input_name = session
            .inputs()
            .first()
            .map(|i| i.name().to_string())
            .unwrap_or_else(|| "input".to_string());

        tracing::debug!(
            "Loaded classifier from {:?} (input: {:?}, outputs: {:?})",
            model_path,
            input_name,
            session
                .outputs()
                .iter()
                .map(|o| o.name())
                .collect::<Vec<_>>()
        );

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            labels,
            config,
            model_path: model_path.to_path_buf(),
        })
    }

    fn inference_err(&self, message: String) -> PipelineError {
        PipelineError::Inference {
            path: self.model_path.clone(),
            message,
        }
    }

    /// Run the forward pass and return one score per output class.
    fn scores(&self, tensor: &ImageTensor) -> Result<Vec<f32>, PipelineError> {
        let input = preprocess(tensor, self.config.input_size, self.config.normalization);
        let shape: Vec<i64> = input.shape().iter().map(|&d| d as i64).collect();
        let flat_data: Vec<f32> = input.iter().copied().collect();

        let input_value = Value::from_array((shape, flat_data))
            .map_err(|e| self.inference_err(format!("Failed to create input tensor: {e}")))?;
        let inputs = ort::inputs![self.input_name.as_str() => input_value];

        let mut session = self
            .session
            .lock()
            .map_err(|e| self.inference_err(format!("Session lock poisoned: {e}")))?;

        let outputs = session
            .run(inputs)
            .map_err(|e| self.inference_err(format!("ONNX inference failed: {e}")))?;

        let (_, output) = outputs
            .iter()
            .next()
            .ok_or_else(|| self.inference_err("Model produced no outputs".to_string()))?;

        let (_, data) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| self.inference_err(format!("Failed to extract output tensor: {e}")))?;

        Ok(data.to_vec())
    }
}

impl Classifier for OnnxClassifier {
    fn classify(&self, tensor: &ImageTensor, k: usize) -> Result<Vec<Classification>, PipelineError> {
        if tensor.height() == 0 || tensor.width() == 0 {
            return Err(self.inference_err("Cannot classify an empty image".to_string()));
        }

        let mut scores = self.scores(tensor)?;
        if self.config.apply_softmax {
            softmax_in_place(&mut scores);
        }

        Ok(top_k(&scores, &self.labels, self.config.label_offset, k))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_model_reports_download_hint() {
        let dir = tempfile::tempdir().unwrap();
        let provider = OnnxModelProvider::new(ModelConfig::default(), dir.path());

        let err = provider.load().await.err().unwrap();
        assert!(matches!(err, PipelineError::ModelLoad { .. }));
        assert!(err.to_string().contains("models download"));
    }

    #[tokio::test]
    async fn test_pinned_checksum_mismatch_refuses_load() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(MODEL_FILENAME), b"not an onnx file").unwrap();
        let config = ModelConfig {
            blake3: Some("0".repeat(64)),
            ..ModelConfig::default()
        };

        let err = OnnxModelProvider::new(config, dir.path())
            .load()
            .await
            .err()
            .unwrap();
        assert!(err.to_string().contains("Checksum mismatch"));
    }

    #[test]
    fn test_paths_inside_variant_dir() {
        let provider = OnnxModelProvider::new(ModelConfig::default(), "/models/mobilenetv2-12");
        assert_eq!(
            provider.model_path(),
            PathBuf::from("/models/mobilenetv2-12/model.onnx")
        );
        assert_eq!(
            provider.labels_path(),
            PathBuf::from("/models/mobilenetv2-12/labels.txt")
        );
    }
}
