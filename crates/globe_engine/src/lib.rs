//! # Globe Engine
//!
//! Animated 3D globe scenes bound to a screen region, with an explicit
//! lifecycle and a headless software renderer.
//!
//! ## Features
//!
//! - **Scene Container**: `initialize`, `tick`, `resize` and `dispose` with
//!   guaranteed resource release
//! - **Deterministic Animation**: every animated value is a pure function of
//!   elapsed time
//! - **Frame Scheduler**: per-frame tasks that are cancelled before their
//!   owner is torn down
//! - **Viewport Bus**: one owner for window size and scroll position
//! - **Background Model Loading**: OBJ globe models parsed off the frame loop
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use globe_engine::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut host = SceneHost::new(1280, 720);
//!     let backend = Box::new(SoftwareBackend::new(1280, 720));
//!     let id = host.mount(SceneConfig::orbital(), RegionLayout::FillViewport, backend)?;
//!
//!     let mut clock = FrameClock::fixed_rate(60);
//!     for _ in 0..120 {
//!         host.run_frame(&clock.next_frame());
//!     }
//!
//!     host.unmount(id);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod foundation;
pub mod config;
pub mod assets;
pub mod render;
pub mod scene;
pub mod events;
pub mod scheduler;
pub mod host;
pub mod ui;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        config::{Config, ConfigError, SceneConfig},
        events::{Region, RegionLayout, ViewportBus},
        foundation::{
            math::{Vec3, Mat4},
            time::{FrameClock, FrameTime},
        },
        host::{MountId, SceneHost},
        render::{RenderBackend, RenderError, SoftwareBackend},
        scene::{ContainerState, ModelStatus, SceneContainer, SceneError},
        scheduler::{FrameScheduler, FrameTask, TaskControl},
        ui::{LoadingOverlay, OverlayPhase},
    };
}
