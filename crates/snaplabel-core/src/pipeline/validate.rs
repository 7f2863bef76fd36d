//! Checks on the raw file buffer before it is handed to the image codec.

use std::path::Path;

use crate::config::LimitsConfig;
use crate::error::PipelineError;

/// Validates a picked file's bytes before decoding.
pub struct Validator {
    limits: LimitsConfig,
}

impl Validator {
    /// Create a new validator with the given limits.
    pub fn new(limits: LimitsConfig) -> Self {
        Self { limits }
    }

    /// Quick checks that reject obviously bad input.
    ///
    /// - buffer is not empty
    /// - size is within `max_file_size_mb`
    /// - header matches a known image signature
    pub fn validate(&self, bytes: &[u8], path: &Path) -> Result<(), PipelineError> {
        if bytes.is_empty() {
            return Err(PipelineError::EmptyFile(path.to_path_buf()));
        }

        self.check_size(bytes.len() as u64, path)?;

        if !is_known_image_header(bytes) {
            return Err(PipelineError::UnsupportedFormat {
                path: path.to_path_buf(),
                format: sniff_label(path),
            });
        }

        Ok(())
    }

    /// Reject files over `max_file_size_mb`. Runs on the reported size, so a
    /// huge file is turned away before anything is read.
    pub fn check_size(&self, len: u64, path: &Path) -> Result<(), PipelineError> {
        let max_bytes = self.limits.max_file_size_mb * 1024 * 1024;
        if len > max_bytes {
            return Err(PipelineError::FileTooLarge {
                path: path.to_path_buf(),
                size_mb: len / (1024 * 1024),
                max_mb: self.limits.max_file_size_mb,
            });
        }
        Ok(())
    }
}

/// Whether the leading bytes match a format the codec can decode.
fn is_known_image_header(bytes: &[u8]) -> bool {
    const SIGNATURES: &[&[u8]] = &[
        &[0xFF, 0xD8, 0xFF],                // JPEG
        &[0x89, b'P', b'N', b'G'],          // PNG
        b"GIF8",                            // GIF
        b"BM",                              // BMP
        &[b'I', b'I', 0x2A, 0x00],          // TIFF little-endian
        &[b'M', b'M', 0x00, 0x2A],          // TIFF big-endian
    ];

    if SIGNATURES.iter().any(|sig| bytes.starts_with(sig)) {
        return true;
    }

    // WebP: RIFF....WEBP
    bytes.len() >= 12 && bytes.starts_with(b"RIFF") && &bytes[8..12] == b"WEBP"
}

fn sniff_label(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("unknown")
        .to_lowercase()
}
