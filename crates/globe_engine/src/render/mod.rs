//! # Rendering System
//!
//! Backend-agnostic rendering primitives (camera, lights, meshes, materials)
//! and the [`RenderBackend`] trait that owns every context-scoped resource.
//!
//! ## Resource Ownership
//!
//! Geometry and material data live inside the backend and are referenced by
//! slot-map handles. Whoever creates a handle is responsible for destroying
//! it before the backend is released; the backend rejects unknown handles so
//! a double destroy surfaces as [`RenderError::UnknownResource`] instead of
//! silently corrupting state.
//!
//! ## Backends
//!
//! - [`SoftwareBackend`]: CPU triangle rasterizer writing into an RGBA
//!   framebuffer. Used headless and in tests.

pub mod backend;
pub mod camera;
pub mod lighting;
pub mod material;
pub mod mesh;
pub mod software;

pub use backend::{
    BackendResult, CameraMatrices, DrawCall, FrameStats, GeometryHandle, MaterialHandle,
    RenderBackend,
};
pub use camera::Camera;
pub use lighting::{Light, LightType, LightingEnvironment};
pub use material::{Material, MaterialFlags};
pub use mesh::{Mesh, Topology, Vertex};
pub use software::{LedgerCounts, ResourceLedger, SoftwareBackend};

use thiserror::Error;

/// Rendering system error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    /// Surface or context could not be set up
    #[error("Renderer initialization failed: {0}")]
    InitializationFailed(String),

    /// A handle that was never created, or was already destroyed
    #[error("Unknown {kind} handle")]
    UnknownResource {
        /// Resource kind ("geometry" or "material")
        kind: &'static str,
    },

    /// Position upload did not match the geometry's vertex count
    #[error("Geometry has {expected} vertices, received {actual} positions")]
    GeometrySizeMismatch {
        /// Vertex count of the geometry
        expected: usize,
        /// Number of positions supplied
        actual: usize,
    },

    /// Operation attempted after the context was released
    #[error("Rendering context already released")]
    ContextReleased,

    /// Surface dimensions the backend cannot use
    #[error("Invalid surface size {width}x{height}")]
    InvalidSurfaceSize {
        /// Requested width
        width: u32,
        /// Requested height
        height: u32,
    },

    /// Frame call sequence violated (draw outside begin/end)
    #[error("Frame sequencing error: {0}")]
    FrameSequence(String),

    /// Writing the framebuffer to disk failed
    #[error("Frame output failed: {0}")]
    FrameOutput(String),
}

/// Result type for rendering operations
pub type RenderResult<T> = Result<T, RenderError>;
