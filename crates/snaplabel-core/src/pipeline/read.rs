//! Reading picked files as base64 text.
//!
//! The reader hands back text-safe contents; the decoder turns them back into a
//! byte buffer. Keeping the reader behind a trait lets a front end serve files
//! from somewhere other than the local filesystem.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

use crate::acquire::ImageRef;
use crate::error::PipelineError;

/// Source of picked file contents.
#[async_trait]
pub trait FileReader: Send + Sync {
    /// Size of the file in bytes, without reading its contents.
    async fn file_size(&self, image: &ImageRef) -> Result<u64, PipelineError>;

    /// Read the whole file and return it base64-encoded.
    async fn read_base64(&self, image: &ImageRef) -> Result<String, PipelineError>;
}

/// Reads files from the local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsReader;

#[async_trait]
impl FileReader for FsReader {
    async fn file_size(&self, image: &ImageRef) -> Result<u64, PipelineError> {
        let metadata = tokio::fs::metadata(image.path())
            .await
            .map_err(|e| read_error(e, image))?;
        Ok(metadata.len())
    }

    async fn read_base64(&self, image: &ImageRef) -> Result<String, PipelineError> {
        let bytes = tokio::fs::read(image.path())
            .await
            .map_err(|e| read_error(e, image))?;
        Ok(BASE64.encode(bytes))
    }
}

fn read_error(e: std::io::Error, image: &ImageRef) -> PipelineError {
    if e.kind() == std::io::ErrorKind::NotFound {
        PipelineError::FileNotFound(image.path().to_path_buf())
    } else {
        PipelineError::Read {
            path: image.path().to_path_buf(),
            message: e.to_string(),
        }
    }
}

/// Turn base64 text back into the raw byte buffer.
pub fn decode_base64(text: &str, image: &ImageRef) -> Result<Vec<u8>, PipelineError> {
    BASE64
        .decode(text.trim())
        .map_err(|e| PipelineError::Read {
            path: image.path().to_path_buf(),
            message: format!("Invalid base64 contents: {e}"),
        })
}
