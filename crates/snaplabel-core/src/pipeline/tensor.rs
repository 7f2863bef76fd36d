//! Dense pixel tensor produced by the decoder.

use image::RgbImage;
use ndarray::Array3;

/// Number of color channels (RGB).
pub const CHANNELS: usize = 3;

/// Decoded pixels laid out as `[height, width, channel]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageTensor {
    data: Array3<u8>,
}

impl ImageTensor {
    /// Build a tensor from an RGB8 image.
    pub fn from_rgb(image: RgbImage) -> Self {
        let (width, height) = image.dimensions();
        let data = Array3::from_shape_vec(
            (height as usize, width as usize, CHANNELS),
            image.into_raw(),
        )
        .unwrap_or_else(|_| Array3::zeros((0, 0, CHANNELS)));
        Self { data }
    }

    pub fn height(&self) -> usize {
        self.data.shape()[0]
    }

    pub fn width(&self) -> usize {
        self.data.shape()[1]
    }

    pub fn channels(&self) -> usize {
        self.data.shape()[2]
    }

    /// `[height, width, channels]`
    pub fn shape(&self) -> [usize; 3] {
        [self.height(), self.width(), self.channels()]
    }

    pub fn data(&self) -> &Array3<u8> {
        &self.data
    }

    /// Copy the pixels back into an `RgbImage` (for resizing).
    pub fn to_rgb_image(&self) -> RgbImage {
        let raw: Vec<u8> = self.data.iter().copied().collect();
        RgbImage::from_raw(self.width() as u32, self.height() as u32, raw)
            .unwrap_or_else(|| RgbImage::new(0, 0))
    }
}
