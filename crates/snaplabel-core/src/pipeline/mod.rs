//! Image decoding pipeline.
//!
//! Turns a picked file into the pixel tensor the classifier consumes:
//! - **read**: file contents as base64 text behind the `FileReader` seam
//! - **validate**: size and signature checks on the raw buffer
//! - **decode**: codec decode with timeout, dimension limit and crop
//! - **tensor**: the `[height, width, 3]` pixel tensor

pub mod decode;
pub mod read;
pub mod tensor;
pub mod validate;

// Re-exports for convenient access
pub use decode::ImageDecoder;
pub use read::{FileReader, FsReader};
pub use tensor::ImageTensor;
pub use validate::Validator;
