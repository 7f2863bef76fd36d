//! Presentation state and the pick → decode → classify cycle.
//!
//! The controller owns the three pieces of screen state (selected image,
//! loading flag, result list) and is the only thing that mutates them. State
//! lives in a `watch` channel so any number of views can re-render on change.
//!
//! ```text
//! Idle ──select──▶ Acquiring ──picked──▶ Classifying ──▶ Idle (results)
//!                      │                      │
//!                      └──canceled/denied──▶ Idle ◀──error (logged)
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;

use crate::acquire::{
    CropRect, ImagePicker, ImageRef, PathPicker, PickOptions, PickOutcome, PickedImage,
};
use crate::config::Config;
use crate::error::{PickError, Result};
use crate::inference::{LazyModel, OnnxModelProvider};
use crate::pipeline::ImageDecoder;
use crate::types::Classification;

/// Where the current cycle is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// Waiting for the user; the select button is shown
    #[default]
    Idle,
    /// The picker is open
    Acquiring,
    /// Decoding and running the model
    Classifying,
}

/// Snapshot of everything the screen shows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppState {
    /// The last successfully picked image
    pub selected_image: Option<ImageRef>,
    /// Current cycle phase
    pub phase: Phase,
    /// Predictions for the selected image, most confident first
    pub results: Vec<Classification>,
}

impl AppState {
    /// True while a pick-or-classify cycle is in flight.
    pub fn is_loading(&self) -> bool {
        self.phase != Phase::Idle
    }
}

/// How a `select_image` call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// New results are on screen
    Classified { count: usize },
    /// The user backed out (or refused permission); nothing changed
    Canceled,
    /// Something broke; the error was logged and swallowed
    Failed,
    /// Another cycle was already running; this trigger was ignored
    Busy,
}

/// Settings the controller needs per cycle.
#[derive(Debug, Clone, Copy)]
pub struct ControllerOptions {
    pub pick: PickOptions,
    pub top_k: usize,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            pick: PickOptions {
                allows_editing: true,
            },
            top_k: 3,
        }
    }
}

/// Owns screen state and runs classification cycles.
pub struct Controller {
    state: watch::Sender<AppState>,
    picker: Box<dyn ImagePicker>,
    decoder: ImageDecoder,
    model: Arc<LazyModel>,
    options: ControllerOptions,
}

impl Controller {
    pub fn new(
        picker: Box<dyn ImagePicker>,
        decoder: ImageDecoder,
        model: Arc<LazyModel>,
        options: ControllerOptions,
    ) -> Self {
        let (state, _) = watch::channel(AppState::default());
        Self {
            state,
            picker,
            decoder,
            model,
            options,
        }
    }

    /// Build a controller backed by the configured ONNX model.
    pub fn from_config(config: &Config, picker: Box<dyn ImagePicker>) -> Self {
        let provider = OnnxModelProvider::new(config.model.clone(), config.model_variant_dir());
        let options = ControllerOptions {
            pick: PickOptions {
                allows_editing: config.picker.allows_editing,
            },
            top_k: config.model.top_k,
        };
        Self::new(
            picker,
            ImageDecoder::new(config.limits.clone()),
            Arc::new(LazyModel::new(Box::new(provider))),
            options,
        )
    }

    /// One-shot cycle over a file on disk.
    ///
    /// Builds a controller around a `PathPicker` for `path`, runs a single
    /// cycle and returns its outcome together with the final state.
    pub async fn classify_path(
        config: &Config,
        path: impl Into<PathBuf>,
        crop: Option<CropRect>,
    ) -> (CycleOutcome, AppState) {
        let picker = PathPicker::new(path).with_crop(crop);
        let controller = Self::from_config(config, Box::new(picker));
        let outcome = controller.select_image().await;
        (outcome, controller.state())
    }

    /// Subscribe to state snapshots.
    pub fn subscribe(&self) -> watch::Receiver<AppState> {
        self.state.subscribe()
    }

    /// Current state snapshot.
    pub fn state(&self) -> AppState {
        self.state.borrow().clone()
    }

    /// Handle one press of the select button.
    ///
    /// Never returns an error: failures are logged and reported as
    /// `CycleOutcome::Failed`. The loading flag is clear again on return,
    /// whatever the outcome.
    pub async fn select_image(&self) -> CycleOutcome {
        let Some(_loading) = self.begin_cycle() else {
            tracing::debug!("Select ignored: a cycle is already running");
            return CycleOutcome::Busy;
        };

        match self.run_cycle().await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!("Classification cycle failed: {e}");
                CycleOutcome::Failed
            }
        }
    }

    /// Flip Idle → Acquiring atomically; `None` if a cycle is in flight.
    fn begin_cycle(&self) -> Option<LoadingGuard<'_>> {
        let started = self.state.send_if_modified(|s| {
            if s.is_loading() {
                return false;
            }
            s.phase = Phase::Acquiring;
            true
        });
        started.then_some(LoadingGuard { state: &self.state })
    }

    async fn run_cycle(&self) -> Result<CycleOutcome> {
        tracing::debug!("Opening {} picker", self.picker.name());
        let picked = match self.picker.pick(&self.options.pick).await {
            Ok(PickOutcome::Picked(picked)) => picked,
            Ok(PickOutcome::Canceled) => {
                tracing::debug!("Pick canceled");
                return Ok(CycleOutcome::Canceled);
            }
            Err(PickError::PermissionDenied(path)) => {
                tracing::info!("Permission denied for {:?}; treating as cancel", path);
                return Ok(CycleOutcome::Canceled);
            }
            Err(e) => return Err(e.into()),
        };

        self.state.send_modify(|s| {
            s.selected_image = Some(picked.image.clone());
            s.phase = Phase::Classifying;
        });

        self.classify(&picked).await
    }

    async fn classify(&self, picked: &PickedImage) -> Result<CycleOutcome> {
        let start = std::time::Instant::now();
        let tensor = self.decoder.decode(picked).await?;
        tracing::trace!("  Decode: {:?}", start.elapsed());

        self.state.send_modify(|s| s.results.clear());

        let infer_start = std::time::Instant::now();
        let results = self.model.classify(tensor, self.options.top_k).await?;
        tracing::trace!("  Inference: {:?}", infer_start.elapsed());

        let count = results.len();
        tracing::debug!(
            "Classified {} in {:?} ({} labels)",
            picked.image.file_name(),
            start.elapsed(),
            count
        );
        self.state.send_modify(|s| s.results = results);

        Ok(CycleOutcome::Classified { count })
    }
}

/// Clears the loading flag when dropped, so every exit path ends Idle.
struct LoadingGuard<'a> {
    state: &'a watch::Sender<AppState>,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.state.send_modify(|s| s.phase = Phase::Idle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loading_follows_phase() {
        let mut state = AppState::default();
        assert!(!state.is_loading());
        state.phase = Phase::Acquiring;
        assert!(state.is_loading());
        state.phase = Phase::Classifying;
        assert!(state.is_loading());
    }

    #[tokio::test]
    async fn test_classify_path_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let (outcome, state) =
            Controller::classify_path(&Config::default(), dir.path().join("gone.jpg"), None).await;

        assert_eq!(outcome, CycleOutcome::Failed);
        assert!(!state.is_loading());
        assert!(state.selected_image.is_none());
    }

    #[tokio::test]
    async fn test_classify_path_zero_byte_fails_before_model_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("zero.jpg");
        std::fs::write(&path, b"").unwrap();
        let mut config = Config::default();
        config.general.model_dir = dir.path().join("no-models");

        let (outcome, state) = Controller::classify_path(&config, &path, None).await;

        assert_eq!(outcome, CycleOutcome::Failed);
        assert_eq!(state.phase, Phase::Idle);
        assert_eq!(state.selected_image.unwrap().path(), path.as_path());
        assert!(state.results.is_empty());
    }

    #[test]
    fn test_default_options_allow_editing() {
        let options = ControllerOptions::default();
        assert!(options.pick.allows_editing);
        assert_eq!(options.top_k, 3);
    }
}
