//! Image decoding: picked file → base64 text → byte buffer → pixel tensor.

use image::{DynamicImage, GenericImageView};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use super::read::{decode_base64, FileReader, FsReader};
use super::tensor::ImageTensor;
use super::validate::Validator;
use crate::acquire::{CropRect, PickedImage};
use crate::config::LimitsConfig;
use crate::error::PipelineError;

/// Image decoder with configurable limits and timeout.
pub struct ImageDecoder {
    limits: LimitsConfig,
    validator: Validator,
    reader: Arc<dyn FileReader>,
}

impl ImageDecoder {
    /// Create a decoder that reads from the local filesystem.
    pub fn new(limits: LimitsConfig) -> Self {
        Self::with_reader(limits, Arc::new(FsReader))
    }

    /// Create a decoder with a custom file reader.
    pub fn with_reader(limits: LimitsConfig, reader: Arc<dyn FileReader>) -> Self {
        Self {
            validator: Validator::new(limits.clone()),
            limits,
            reader,
        }
    }

    /// Read and decode a picked image into a `[height, width, 3]` tensor.
    pub async fn decode(&self, picked: &PickedImage) -> Result<ImageTensor, PipelineError> {
        let size = self.reader.file_size(&picked.image).await?;
        self.validator.check_size(size, picked.image.path())?;

        let text = self.reader.read_base64(&picked.image).await?;
        let bytes = decode_base64(&text, &picked.image)?;
        self.decode_bytes(bytes, picked.image.path(), picked.crop)
            .await
    }

    /// Decode an in-memory buffer with validation and timeout.
    pub async fn decode_bytes(
        &self,
        bytes: Vec<u8>,
        path: &Path,
        crop: Option<CropRect>,
    ) -> Result<ImageTensor, PipelineError> {
        self.validator.validate(&bytes, path)?;

        let path_owned = path.to_path_buf();
        let max_dim = self.limits.max_image_dimension;
        let timeout_duration = Duration::from_millis(self.limits.decode_timeout_ms);

        // On timeout the blocking task is detached, not aborted; it finishes
        // in the background and its result is dropped.
        let decode_result = timeout(
            timeout_duration,
            tokio::task::spawn_blocking(move || {
                Self::decode_bytes_sync(bytes, &path_owned, crop, max_dim)
            }),
        )
        .await;

        match decode_result {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => Err(PipelineError::Decode {
                path: path.to_path_buf(),
                message: format!("Task join error: {}", e),
            }),
            Err(_) => Err(PipelineError::Timeout {
                path: path.to_path_buf(),
                stage: "decode".to_string(),
                timeout_ms: self.limits.decode_timeout_ms,
            }),
        }
    }

    /// Synchronous decode (runs in spawn_blocking).
    fn decode_bytes_sync(
        bytes: Vec<u8>,
        path: &Path,
        crop: Option<CropRect>,
        max_dim: u32,
    ) -> Result<ImageTensor, PipelineError> {
        let decode_err = |message: String| PipelineError::Decode {
            path: path.to_path_buf(),
            message,
        };

        // Header-only pass: reject oversized images before any pixel buffer
        // is allocated.
        let (width, height) = image::ImageReader::new(Cursor::new(bytes.as_slice()))
            .with_guessed_format()
            .map_err(|e| decode_err(format!("Cannot detect image format: {}", e)))?
            .into_dimensions()
            .map_err(|e| decode_err(e.to_string()))?;
        if width > max_dim || height > max_dim {
            return Err(PipelineError::ImageTooLarge {
                path: path.to_path_buf(),
                width,
                height,
                max_dim,
            });
        }

        let mut limits = image::Limits::default();
        limits.max_image_width = Some(max_dim);
        limits.max_image_height = Some(max_dim);

        let mut reader = image::ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| decode_err(format!("Cannot detect image format: {}", e)))?;
        reader.limits(limits);
        let image = reader.decode().map_err(|e| decode_err(e.to_string()))?;

        let image = match crop {
            Some(rect) => apply_crop(image, rect, path)?,
            None => image,
        };

        Ok(ImageTensor::from_rgb(image.to_rgb8()))
    }
}

/// Crop to the user's rectangle, clamped to the image bounds.
fn apply_crop(image: DynamicImage, rect: CropRect, path: &Path) -> Result<DynamicImage, PipelineError> {
    let (width, height) = image.dimensions();
    let rect = rect.clamp_to(width, height).ok_or_else(|| PipelineError::Decode {
        path: PathBuf::from(path),
        message: format!("Crop {rect:?} lies outside the {width}x{height} image"),
    })?;
    Ok(image.crop_imm(rect.x, rect.y, rect.width, rect.height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquire::ImageRef;
    use image::{ImageFormat, RgbImage};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn encode(img: &RgbImage, format: ImageFormat) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, format).unwrap();
        buf.into_inner()
    }

    #[tokio::test]
    async fn test_decode_jpeg_file_to_hwc_tensor() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cat.jpg");
        std::fs::write(
            &path,
            encode(&RgbImage::new(224, 224), ImageFormat::Jpeg),
        )
        .unwrap();

        let decoder = ImageDecoder::new(LimitsConfig::default());
        let tensor = decoder
            .decode(&PickedImage::new(ImageRef::new(&path)))
            .await
            .unwrap();
        assert_eq!(tensor.shape(), [224, 224, 3]);
    }

    /// Reports a fixed size and counts content reads.
    struct SizedReader {
        size: u64,
        reads: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl FileReader for SizedReader {
        async fn file_size(&self, _image: &ImageRef) -> Result<u64, PipelineError> {
            Ok(self.size)
        }

        async fn read_base64(&self, _image: &ImageRef) -> Result<String, PipelineError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            Ok(String::new())
        }
    }

    #[tokio::test]
    async fn test_oversized_file_rejected_before_read() {
        let reader = Arc::new(SizedReader {
            size: 3 * 1024 * 1024 * 1024,
            reads: AtomicUsize::new(0),
        });
        let limits = LimitsConfig {
            max_file_size_mb: 50,
            ..LimitsConfig::default()
        };
        let decoder = ImageDecoder::with_reader(limits, reader.clone());

        let err = decoder
            .decode(&PickedImage::new(ImageRef::new("/photos/huge.jpg")))
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::FileTooLarge { max_mb: 50, .. }));
        assert_eq!(reader.reads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_format_detected_by_content() {
        // PNG bytes behind a .jpg name still decode
        let bytes = encode(&RgbImage::new(8, 4), ImageFormat::Png);
        let decoder = ImageDecoder::new(LimitsConfig::default());
        let tensor = decoder
            .decode_bytes(bytes, Path::new("misnamed.jpg"), None)
            .await
            .unwrap();
        assert_eq!(tensor.shape(), [4, 8, 3]);
    }

    #[tokio::test]
    async fn test_zero_byte_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("zero.jpg");
        std::fs::write(&path, b"").unwrap();

        let decoder = ImageDecoder::new(LimitsConfig::default());
        let err = decoder
            .decode(&PickedImage::new(ImageRef::new(&path)))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::EmptyFile(_)));
    }

    #[tokio::test]
    async fn test_corrupt_jpeg_fails() {
        let mut bytes = encode(&RgbImage::new(64, 64), ImageFormat::Jpeg);
        bytes.truncate(20);
        let decoder = ImageDecoder::new(LimitsConfig::default());
        let err = decoder
            .decode_bytes(bytes, Path::new("broken.jpg"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Decode { .. }));
    }

    #[tokio::test]
    async fn test_dimension_limit() {
        let limits = LimitsConfig {
            max_image_dimension: 16,
            ..LimitsConfig::default()
        };
        let bytes = encode(&RgbImage::new(32, 8), ImageFormat::Png);
        let err = ImageDecoder::new(limits)
            .decode_bytes(bytes, Path::new("wide.png"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::ImageTooLarge { width: 32, .. }));
    }

    #[tokio::test]
    async fn test_crop_applied_and_clamped() {
        let bytes = encode(&RgbImage::new(100, 60), ImageFormat::Png);
        let crop = CropRect {
            x: 80,
            y: 10,
            width: 50,
            height: 20,
        };
        let tensor = ImageDecoder::new(LimitsConfig::default())
            .decode_bytes(bytes, Path::new("crop.png"), Some(crop))
            .await
            .unwrap();
        assert_eq!(tensor.shape(), [20, 20, 3]);
    }

    #[tokio::test]
    async fn test_crop_outside_image_fails() {
        let bytes = encode(&RgbImage::new(10, 10), ImageFormat::Png);
        let crop = CropRect {
            x: 20,
            y: 0,
            width: 5,
            height: 5,
        };
        let err = ImageDecoder::new(LimitsConfig::default())
            .decode_bytes(bytes, Path::new("crop.png"), Some(crop))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("outside"));
    }
}
