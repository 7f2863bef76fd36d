//! Sub-configuration structs with their defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Directory where models are stored
    pub model_dir: PathBuf,

    /// Image library the interactive picker browses
    pub library_dir: PathBuf,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("~/.snaplabel/models"),
            library_dir: PathBuf::from("~/Pictures"),
        }
    }
}

/// Pixel normalization applied before the forward pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Normalization {
    /// `p / 127.5 - 1`, i.e. pixels in [-1, 1] (TF MobileNet checkpoints)
    Unit,
    /// `(p / 255 - mean) / std` with the ImageNet channel statistics
    Imagenet,
}

/// Classification model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Model variant name; files live in `{model_dir}/{name}/`
    pub name: String,

    /// Square input edge the model expects
    pub input_size: u32,

    /// Pixel normalization for the model input
    pub normalization: Normalization,

    /// Apply softmax to the raw output (set false if the model already does)
    pub apply_softmax: bool,

    /// Number of leading output classes to skip (e.g. a background class)
    pub label_offset: usize,

    /// How many predictions to keep per image
    pub top_k: usize,

    /// Optional BLAKE3 pin for the downloaded model file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blake3: Option<String>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: "mobilenetv2-12".to_string(),
            input_size: 224,
            normalization: Normalization::Imagenet,
            apply_softmax: true,
            label_offset: 0,
            top_k: 3,
            blake3: None,
        }
    }
}

/// Resource limits to protect against problematic inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum file size in megabytes
    pub max_file_size_mb: u64,

    /// Maximum image dimension (width or height)
    pub max_image_dimension: u32,

    /// Decode timeout in milliseconds
    pub decode_timeout_ms: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: 50,
            max_image_dimension: 10000,
            decode_timeout_ms: 5000,
        }
    }
}

/// Image picker settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PickerConfig {
    /// Let the user crop the picked image before classification
    pub allows_editing: bool,

    /// File extensions the library picker lists
    pub supported_formats: Vec<String>,
}

impl Default for PickerConfig {
    fn default() -> Self {
        Self {
            allows_editing: true,
            supported_formats: vec![
                "jpg".to_string(),
                "jpeg".to_string(),
                "png".to_string(),
                "webp".to_string(),
                "gif".to_string(),
                "bmp".to_string(),
            ],
        }
    }
}

/// Output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Default output format ("json" or "jsonl")
    pub format: String,

    /// Pretty-print JSON output
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: "json".to_string(),
            pretty: false,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
