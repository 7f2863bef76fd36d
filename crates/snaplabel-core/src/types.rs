//! Core data types shared by the pipeline, controller and output.

use serde::{Deserialize, Serialize};

use crate::acquire::ImageRef;

/// One predicted label for the current image.
///
/// Serialized as `{"className": ..., "probability": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    /// Human-readable class label (e.g. "tabby, tabby cat")
    pub class_name: String,

    /// Confidence score from 0.0 to 1.0
    pub probability: f32,
}

impl Classification {
    pub fn new(class_name: impl Into<String>, probability: f32) -> Self {
        Self {
            class_name: class_name.into(),
            probability,
        }
    }
}

/// A classified image as written by the one-shot command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationRecord {
    /// The picked image
    pub image: ImageRef,

    /// Predictions, most confident first
    pub results: Vec<Classification>,
}
