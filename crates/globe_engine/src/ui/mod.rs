//! UI state shown around a scene
//!
//! Only logic lives here; drawing the overlay is left to the embedding
//! application.

pub mod loading_overlay;

pub use loading_overlay::{LoadingOverlay, OverlayPhase, STATUS_MESSAGES};
