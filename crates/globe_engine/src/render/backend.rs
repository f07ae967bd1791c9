//! Backend abstraction for the rendering system
//!
//! A backend owns one rendering context plus every resource created through
//! it. Callers hold only opaque handles and must destroy them before calling
//! [`RenderBackend::release`].

use std::path::Path;

use slotmap::new_key_type;

use super::{LightingEnvironment, Material, Mesh, RenderError, Topology};
use crate::foundation::math::{Mat4, Vec3};

/// Result type for backend operations
pub type BackendResult<T> = Result<T, RenderError>;

new_key_type! {
    /// Handle to a geometry resource stored in the backend
    pub struct GeometryHandle;

    /// Handle to a material resource stored in the backend
    pub struct MaterialHandle;
}

/// Camera data for one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraMatrices {
    /// Combined view-projection matrix
    pub view_projection: Mat4,
    /// Camera position in world space
    pub position: Vec3,
}

/// One drawable submitted between `begin_frame` and `end_frame`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawCall {
    /// Geometry to draw
    pub geometry: GeometryHandle,
    /// Material to shade it with
    pub material: MaterialHandle,
    /// Object-to-world transform
    pub model: Mat4,
    /// Opacity multiplier applied on top of the material opacity
    pub opacity: f32,
}

/// Statistics of one completed frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Draw calls submitted
    pub draw_calls: u32,
    /// Vertices transformed
    pub vertices_processed: u64,
    /// Pixels that passed clipping and depth testing
    pub pixels_written: u64,
}

/// Main rendering backend trait
pub trait RenderBackend {
    /// Upload a mesh and return an opaque handle
    fn create_geometry(&mut self, mesh: &Mesh, topology: Topology) -> BackendResult<GeometryHandle>;

    /// Overwrite the vertex positions of an existing geometry in place.
    /// The number of positions must equal the geometry's vertex count.
    fn update_geometry_positions(&mut self, handle: GeometryHandle, positions: &[Vec3]) -> BackendResult<()>;

    /// Free a geometry; unknown handles are an error
    fn destroy_geometry(&mut self, handle: GeometryHandle) -> BackendResult<()>;

    /// Upload a material and return an opaque handle
    fn create_material(&mut self, material: &Material) -> BackendResult<MaterialHandle>;

    /// Free a material; unknown handles are an error
    fn destroy_material(&mut self, handle: MaterialHandle) -> BackendResult<()>;

    /// Resize the drawing surface
    fn resize_surface(&mut self, width: u32, height: u32) -> BackendResult<()>;

    /// Current surface size (width, height)
    fn surface_size(&self) -> (u32, u32);

    /// Replace the light set used for shading
    fn set_lighting(&mut self, lighting: &LightingEnvironment) -> BackendResult<()>;

    /// Clear the surface and start recording a frame
    fn begin_frame(&mut self, clear_color: [f32; 4], camera: &CameraMatrices) -> BackendResult<()>;

    /// Draw one object into the current frame
    fn draw(&mut self, call: &DrawCall) -> BackendResult<()>;

    /// Finish and present the current frame
    fn end_frame(&mut self) -> BackendResult<FrameStats>;

    /// Write the last presented frame to an image file
    fn save_frame(&self, path: &Path) -> BackendResult<()>;

    /// Release the rendering context. Every later call fails with
    /// [`RenderError::ContextReleased`].
    fn release(&mut self) -> BackendResult<()>;

    /// True once [`RenderBackend::release`] succeeded
    fn is_released(&self) -> bool;
}
