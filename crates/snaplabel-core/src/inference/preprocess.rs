//! Image preprocessing for the classification model.
//!
//! MobileNet-class ImageNet classifiers expect:
//! - Input size: `input_size × input_size` pixels (224 by default)
//! - Channel order: RGB
//! - Tensor layout: NCHW [batch, channels, height, width]
//! - Normalization: either [-1, 1] or ImageNet mean/std, per model export

use image::imageops::FilterType;
use ndarray::Array4;

use crate::config::Normalization;
use crate::pipeline::tensor::{ImageTensor, CHANNELS};

/// ImageNet per-channel mean.
const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];

/// ImageNet per-channel std.
const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Resize to `input_size × input_size` (bilinear), normalize, and lay out as
/// a `[1, 3, input_size, input_size]` tensor.
pub fn preprocess(tensor: &ImageTensor, input_size: u32, normalization: Normalization) -> Array4<f32> {
    let resized = image::imageops::resize(
        &tensor.to_rgb_image(),
        input_size,
        input_size,
        FilterType::Triangle,
    );

    let size = input_size as usize;
    Array4::from_shape_fn((1, CHANNELS, size, size), |(_, c, y, x)| {
        let value = resized.get_pixel(x as u32, y as u32)[c] as f32;
        normalize(value, c, normalization)
    })
}

fn normalize(value: f32, channel: usize, normalization: Normalization) -> f32 {
    match normalization {
        Normalization::Unit => value / 127.5 - 1.0,
        Normalization::Imagenet => (value / 255.0 - IMAGENET_MEAN[channel]) / IMAGENET_STD[channel],
    }
}
