//! Shared fixtures for scene tests

use std::path::Path;
use std::time::{Duration, Instant};

use crate::config::SceneConfig;
use crate::events::Region;
use crate::foundation::math::Vec3;
use crate::foundation::time::FrameTime;
use crate::render::{
    BackendResult, CameraMatrices, DrawCall, FrameStats, GeometryHandle, LightingEnvironment, Material,
    MaterialHandle, Mesh, RenderBackend, RenderError, ResourceLedger, SoftwareBackend, Topology,
};
use crate::scene::{ModelStatus, SceneContainer};

/// Orbital preset without a model and with fixed seeds
pub fn offline_orbital() -> SceneConfig {
    SceneConfig::orbital().with_model(None).with_seed(42)
}

/// Boxed software backend plus its ledger
pub fn software_backend(width: u32, height: u32) -> (Box<dyn RenderBackend>, ResourceLedger) {
    let backend = SoftwareBackend::new(width, height);
    let ledger = backend.ledger();
    (Box::new(backend), ledger)
}

/// Initialize a container on a fresh software backend
pub fn container(config: SceneConfig, width: u32, height: u32) -> (SceneContainer, ResourceLedger) {
    let (backend, ledger) = software_backend(width, height);
    let container = SceneContainer::initialize(config, Region::new(width, height), backend)
        .expect("container should initialize");
    (container, ledger)
}

/// Tick with a short real sleep between frames until the model request settles
pub fn tick_until_model_settles(container: &mut SceneContainer, timeout: Duration) {
    let start = Instant::now();
    let mut t = 0.0;
    while start.elapsed() < timeout {
        container.tick(&FrameTime::at(t)).expect("tick should succeed");
        if !matches!(container.model_status(), ModelStatus::Pending { .. }) {
            return;
        }
        t += 1.0 / 60.0;
        std::thread::sleep(Duration::from_millis(10));
    }
}

/// Software backend that refuses to create more than `geometry_budget` geometries
pub struct LimitedBackend {
    inner: SoftwareBackend,
    geometry_budget: usize,
}

impl LimitedBackend {
    /// Backend that fails after `geometry_budget` geometries
    pub fn new(geometry_budget: usize) -> Self {
        Self {
            inner: SoftwareBackend::new(64, 64),
            geometry_budget,
        }
    }

    /// Ledger of the wrapped backend
    pub fn ledger(&self) -> ResourceLedger {
        self.inner.ledger()
    }
}

impl RenderBackend for LimitedBackend {
    fn create_geometry(&mut self, mesh: &Mesh, topology: Topology) -> BackendResult<GeometryHandle> {
        if self.geometry_budget == 0 {
            return Err(RenderError::InitializationFailed("geometry budget exhausted".to_string()));
        }
        self.geometry_budget -= 1;
        self.inner.create_geometry(mesh, topology)
    }

    fn update_geometry_positions(&mut self, handle: GeometryHandle, positions: &[Vec3]) -> BackendResult<()> {
        self.inner.update_geometry_positions(handle, positions)
    }

    fn destroy_geometry(&mut self, handle: GeometryHandle) -> BackendResult<()> {
        self.inner.destroy_geometry(handle)
    }

    fn create_material(&mut self, material: &Material) -> BackendResult<MaterialHandle> {
        self.inner.create_material(material)
    }

    fn destroy_material(&mut self, handle: MaterialHandle) -> BackendResult<()> {
        self.inner.destroy_material(handle)
    }

    fn resize_surface(&mut self, width: u32, height: u32) -> BackendResult<()> {
        self.inner.resize_surface(width, height)
    }

    fn surface_size(&self) -> (u32, u32) {
        self.inner.surface_size()
    }

    fn set_lighting(&mut self, lighting: &LightingEnvironment) -> BackendResult<()> {
        self.inner.set_lighting(lighting)
    }

    fn begin_frame(&mut self, clear_color: [f32; 4], camera: &CameraMatrices) -> BackendResult<()> {
        self.inner.begin_frame(clear_color, camera)
    }

    fn draw(&mut self, call: &DrawCall) -> BackendResult<()> {
        self.inner.draw(call)
    }

    fn end_frame(&mut self) -> BackendResult<FrameStats> {
        self.inner.end_frame()
    }

    fn save_frame(&self, path: &Path) -> BackendResult<()> {
        self.inner.save_frame(path)
    }

    fn release(&mut self) -> BackendResult<()> {
        self.inner.release()
    }

    fn is_released(&self) -> bool {
        self.inner.is_released()
    }
}
