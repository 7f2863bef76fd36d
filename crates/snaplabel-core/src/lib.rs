//! snaplabel core - on-device image classification.
//!
//! The user picks one picture; snaplabel decodes it into a pixel tensor, runs
//! a pretrained ImageNet classifier over it and shows the top labels with
//! their confidence.
//!
//! # Architecture
//!
//! ```text
//! ImagePicker → ImageDecoder (base64 → bytes → [H, W, 3]) → LazyModel → AppState → render
//! ```
//!
//! The `Controller` drives one cycle per button press and owns the screen
//! state; front ends subscribe to it and draw with [`render::render`].
//!
//! # Usage
//!
//! ```rust,ignore
//! use snaplabel_core::{acquire::PathPicker, Config, Controller};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> snaplabel_core::Result<()> {
//!     let config = Config::load()?;
//!     let controller = Controller::from_config(&config, Box::new(PathPicker::new("cat.jpg")));
//!
//!     controller.select_image().await;
//!     for result in controller.state().results {
//!         println!("{}: {:.2}", result.class_name, result.probability);
//!     }
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod acquire;
pub mod checksum;
pub mod config;
pub mod controller;
pub mod error;
pub mod inference;
pub mod math;
pub mod output;
pub mod pipeline;
pub mod render;
pub mod types;

// Re-exports for convenient access
pub use acquire::{ImagePicker, ImageRef, PickOptions, PickOutcome, PickedImage};
pub use config::Config;
pub use controller::{AppState, Controller, ControllerOptions, CycleOutcome, Phase};
pub use error::{ConfigError, PickError, PipelineError, Result, SnaplabelError};
pub use inference::{Classifier, LazyModel, ModelProvider};
pub use output::{OutputFormat, OutputWriter};
pub use pipeline::{ImageDecoder, ImageTensor};
pub use types::{Classification, ClassificationRecord};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
