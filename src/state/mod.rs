//! Application state management.
//!
//! The app owns a single [`AppState`]: the startup configuration, the scene
//! being composed, the progress of the region load and the rotation animator.
//! The animator only exists once loading has settled.

use crate::animation::{Animator, FrameStep};
use crate::config::GlobeConfig;
use crate::geo::{assemble_outlines, OutlineBuilder};
use crate::loader::LoadOutcome;
use crate::scene::Scene;
use std::time::Duration;

/// Progress of the one-time region load.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadStatus {
    /// Requests are still in flight.
    Pending,
    /// At least one region loaded; its outlines are in the scene.
    Loaded {
        loaded: usize,
        failed: usize,
        batches: usize,
        elapsed: Duration,
    },
    /// Every region failed. The globe is shown without borders.
    NothingLoaded { failed: usize },
}

/// Root application state.
pub struct AppState {
    /// Configuration captured at startup
    pub config: GlobeConfig,

    /// Globe mesh and outline batches
    pub scene: Scene,

    pub load_status: LoadStatus,

    /// Started once loading has settled
    pub animator: Option<Animator>,

    /// Message shown in the canvas overlay
    pub status_message: String,
}

impl AppState {
    pub fn new(config: GlobeConfig) -> Self {
        let scene = Scene::from_config(&config);
        let status_message = format!("Loading {} regions...", config.regions.len());

        Self {
            config,
            scene,
            load_status: LoadStatus::Pending,
            animator: None,
            status_message,
        }
    }

    /// Turns the settled load into outlines and starts the animation.
    ///
    /// Outlines are assembled only after every region has settled, and the
    /// animation starts whatever the outcome.
    pub fn finish_loading(&mut self, outcome: LoadOutcome) {
        let builder = OutlineBuilder::from_config(&self.config);
        let failed = outcome.failed_count();

        self.load_status =
            match assemble_outlines(&outcome.documents, |doc| builder.build_or_skip(doc)) {
                Some(batches) => {
                    self.scene.add_outlines(batches);
                    LoadStatus::Loaded {
                        loaded: outcome.loaded_count(),
                        failed,
                        batches: self.scene.outlines().len(),
                        elapsed: outcome.elapsed,
                    }
                }
                None => LoadStatus::NothingLoaded { failed },
            };

        self.status_message = match &self.load_status {
            LoadStatus::Pending => String::new(),
            LoadStatus::Loaded {
                loaded, failed: 0, ..
            } => format!("Loaded {} regions", loaded),
            LoadStatus::Loaded { loaded, failed, .. } => {
                format!("Loaded {} regions ({} failed)", loaded, failed)
            }
            LoadStatus::NothingLoaded { .. } => {
                "No GeoJSON files were successfully loaded.".to_string()
            }
        };

        log::info!(
            "Scene ready: {} outline batches, {} segments",
            self.scene.outlines().len(),
            self.scene.segment_count()
        );

        self.animator = Some(Animator::new(
            self.config.rotation_per_frame,
            self.config.max_frames,
        ));
    }

    pub fn is_loading(&self) -> bool {
        self.load_status == LoadStatus::Pending
    }

    /// Advances the animation by one frame, if it is running.
    pub fn step_animation(&mut self) -> FrameStep {
        match self.animator.as_mut() {
            Some(animator) => animator.step(),
            None => FrameStep::Stopped,
        }
    }

    /// Current globe rotation about the Y axis.
    pub fn rotation_y(&self) -> f32 {
        self.animator.as_ref().map_or(0.0, Animator::rotation_y)
    }
}
