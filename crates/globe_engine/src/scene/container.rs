//! # Animated-Scene Container
//!
//! Owns one rendering context scoped to a screen region and everything
//! allocated through it.
//!
//! ## Lifecycle
//!
//! `initialize` → `Running` → (`tick` / `resize`)* → `dispose` → `Disposed`
//!
//! There is no value for the uninitialized state: a container only exists
//! once [`SceneContainer::initialize`] succeeded. Ticks and resizes after
//! disposal are ignored, a second dispose is a no-op, and dropping a running
//! container disposes it.
//!
//! Every animated parameter is a pure function of the elapsed time handed to
//! [`SceneContainer::tick`], so two containers built from the same seeded
//! config show the same frame for the same `t`.

use std::path::{Path, PathBuf};

use thiserror::Error;

use super::globe::GlobeScene;
use crate::assets::{ModelEvent, ModelRequest, ModelSource};
use crate::config::SceneConfig;
use crate::events::Region;
use crate::foundation::math::utils::rgb_from_hex;
use crate::foundation::time::FrameTime;
use crate::render::{
    Camera, CameraMatrices, FrameStats, LightingEnvironment, RenderBackend, RenderError,
};

/// Scene container errors
#[derive(Error, Debug)]
pub enum SceneError {
    /// Configuration failed validation
    #[error("Invalid scene configuration: {0}")]
    InvalidConfig(String),

    /// Region with zero width or height
    #[error("Cannot initialize a scene in a {width}x{height} region")]
    EmptyRegion {
        /// Region width
        width: u32,
        /// Region height
        height: u32,
    },

    /// Rendering backend failure
    #[error("Render error: {0}")]
    Render(#[from] RenderError),
}

/// Lifecycle state of a container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerState {
    /// Ticking and resizing
    Running,
    /// Resources released; every call is a no-op
    Disposed,
}

/// Progress of the optional globe model
#[derive(Debug, Clone, PartialEq)]
pub enum ModelStatus {
    /// No model configured
    NotRequested,
    /// Loading; progress in percent
    Pending {
        /// Percent of bytes read, 0 to 100
        progress: f32,
    },
    /// Attached to the globe
    Loaded {
        /// Elapsed time of the tick that attached it
        at: f32,
    },
    /// Loading failed; the scene keeps running without the model
    Failed {
        /// Error description
        reason: String,
    },
}

impl ModelStatus {
    /// Load progress in percent (100 once loaded)
    pub fn progress(&self) -> f32 {
        match self {
            Self::NotRequested | Self::Failed { .. } => 0.0,
            Self::Pending { progress } => *progress,
            Self::Loaded { .. } => 100.0,
        }
    }
}

/// Animated globe scene bound to one rendering context
pub struct SceneContainer {
    config: SceneConfig,
    backend: Box<dyn RenderBackend>,
    camera: Camera,
    scene: GlobeScene,
    region: Region,
    state: ContainerState,
    model_request: Option<ModelRequest>,
    model_status: ModelStatus,
    last_stats: FrameStats,
}

impl SceneContainer {
    /// Build the scene described by `config` into `backend`, sized to `region`
    ///
    /// On failure everything allocated so far is destroyed and the backend is
    /// released before the error is returned.
    pub fn initialize(config: SceneConfig, region: Region, mut backend: Box<dyn RenderBackend>) -> Result<Self, SceneError> {
        if let Err(err) = Self::validate_inputs(&config, region) {
            release_quietly(backend.as_mut());
            return Err(err);
        }

        let scene = match Self::prepare_backend(&config, region, backend.as_mut()) {
            Ok(scene) => scene,
            Err(err) => {
                release_quietly(backend.as_mut());
                return Err(err.into());
            }
        };

        let (model_request, model_status) = match &config.globe.model {
            Some(model) => match ModelRequest::spawn(ModelSource::File(PathBuf::from(&model.path))) {
                Ok(request) => (Some(request), ModelStatus::Pending { progress: 0.0 }),
                Err(err) => {
                    log::error!("Failed to start globe model load: {}", err);
                    (None, ModelStatus::Failed { reason: err.to_string() })
                }
            },
            None => (None, ModelStatus::NotRequested),
        };

        log::info!(
            "Scene container initialized at {}x{} ({} nodes)",
            region.width,
            region.height,
            scene.graph().len()
        );

        Ok(Self {
            camera: Camera::from_settings(&config.camera, region.aspect()),
            config,
            backend,
            scene,
            region,
            state: ContainerState::Running,
            model_request,
            model_status,
            last_stats: FrameStats::default(),
        })
    }

    fn validate_inputs(config: &SceneConfig, region: Region) -> Result<(), SceneError> {
        config.validate().map_err(SceneError::InvalidConfig)?;
        if region.is_empty() {
            return Err(SceneError::EmptyRegion {
                width: region.width,
                height: region.height,
            });
        }
        Ok(())
    }

    fn prepare_backend(config: &SceneConfig, region: Region, backend: &mut dyn RenderBackend) -> Result<GlobeScene, RenderError> {
        backend.resize_surface(region.width, region.height)?;
        backend.set_lighting(&LightingEnvironment::from_settings(&config.lighting))?;
        GlobeScene::build(config, backend)
    }

    /// Advance the scene to `time.elapsed` and render one frame
    ///
    /// Returns the frame statistics, or empty statistics after disposal.
    pub fn tick(&mut self, time: &FrameTime) -> Result<FrameStats, SceneError> {
        if self.state != ContainerState::Running {
            log::trace!("Tick ignored on disposed container");
            return Ok(FrameStats::default());
        }

        let t = time.elapsed;
        self.poll_model(t);
        self.scene.animate(t);
        self.scene.upload_trails(self.backend.as_mut())?;
        self.last_stats = self.render()?;
        Ok(self.last_stats)
    }

    fn poll_model(&mut self, t: f32) {
        let Some(request) = self.model_request.as_mut() else {
            return;
        };

        while let Some(event) = request.poll() {
            match event {
                ModelEvent::Progress { loaded, total } => {
                    let progress = if total == 0 { 100.0 } else { loaded as f32 / total as f32 * 100.0 };
                    self.model_status = ModelStatus::Pending { progress };
                }
                ModelEvent::Loaded(mesh) => {
                    let attached = match &self.config.globe.model {
                        Some(settings) => self.scene.attach_model(mesh, settings, self.backend.as_mut()),
                        None => Ok(()),
                    };
                    self.model_status = match attached {
                        Ok(()) => ModelStatus::Loaded { at: t },
                        Err(err) => {
                            log::error!("Failed to upload globe model: {}", err);
                            ModelStatus::Failed { reason: err.to_string() }
                        }
                    };
                }
                ModelEvent::Failed(err) => {
                    log::error!("Failed to load globe model: {}", err);
                    self.model_status = ModelStatus::Failed { reason: err.to_string() };
                }
            }
        }

        if request.is_finished() {
            self.model_request = None;
        }
    }

    fn render(&mut self) -> Result<FrameStats, RenderError> {
        let clear = rgb_from_hex(self.config.clear_color);
        let camera = CameraMatrices {
            view_projection: self.camera.get_view_projection_matrix(),
            position: self.camera.position,
        };

        let backend = self.backend.as_mut();
        backend.begin_frame([clear.x, clear.y, clear.z, self.config.clear_alpha], &camera)?;
        let drawn = self.scene.draw(backend);
        let stats = backend.end_frame();
        drawn?;
        stats
    }

    /// Match a new region: camera aspect becomes `width / height` and the
    /// surface is resized. Zero-area and unchanged regions are ignored.
    pub fn resize(&mut self, region: Region) -> Result<(), SceneError> {
        if self.state != ContainerState::Running {
            return Ok(());
        }
        if region.is_empty() {
            log::debug!("Ignoring resize to empty region {}x{}", region.width, region.height);
            return Ok(());
        }
        if region == self.region {
            return Ok(());
        }

        self.backend.resize_surface(region.width, region.height)?;
        self.camera.set_aspect_ratio(region.aspect());
        self.region = region;
        log::debug!("Scene container resized to {}x{}", region.width, region.height);
        Ok(())
    }

    /// Destroy every scene resource and release the rendering context.
    /// Calling it again does nothing.
    pub fn dispose(&mut self) {
        if self.state == ContainerState::Disposed {
            return;
        }

        self.model_request = None;
        self.scene.destroy_resources(self.backend.as_mut());
        if let Err(err) = self.backend.release() {
            log::warn!("Rendering context release failed: {}", err);
        }
        self.state = ContainerState::Disposed;
        log::info!("Scene container disposed");
    }

    /// Write the last rendered frame to an image file
    pub fn save_frame(&self, path: impl AsRef<Path>) -> Result<(), SceneError> {
        Ok(self.backend.save_frame(path.as_ref())?)
    }

    /// Lifecycle state
    pub fn state(&self) -> ContainerState {
        self.state
    }

    /// Globe model status
    pub fn model_status(&self) -> &ModelStatus {
        &self.model_status
    }

    /// Y rotation of the globe pivot, the primary animated parameter
    pub fn primary_rotation(&self) -> f32 {
        self.scene.globe_rotation()
    }

    /// Current camera aspect ratio
    pub fn aspect(&self) -> f32 {
        self.camera.aspect
    }

    /// Current region
    pub fn region(&self) -> Region {
        self.region
    }

    /// Statistics of the last rendered frame
    pub fn last_frame_stats(&self) -> FrameStats {
        self.last_stats
    }

    /// Animated scene
    pub fn scene(&self) -> &GlobeScene {
        &self.scene
    }

    /// Configuration the container was built from
    pub fn config(&self) -> &SceneConfig {
        &self.config
    }
}

impl Drop for SceneContainer {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn release_quietly(backend: &mut dyn RenderBackend) {
    if let Err(err) = backend.release() {
        log::warn!("Rendering context release failed: {}", err);
    }
}
