//! Animated globe scenes
//!
//! [`SceneContainer`] is the lifecycle owner; [`GlobeScene`] builds and
//! animates the nodes; [`SceneGraph`] stores them.

pub mod container;
pub mod globe;
pub mod scene_graph;
pub mod trail;

pub use container::{ContainerState, ModelStatus, SceneContainer, SceneError};
pub use globe::{glow_pulse, satellite_position, GlobeScene, SceneResources};
pub use scene_graph::{Drawable, NodeId, RenderItem, SceneGraph, SceneNode};
pub use trail::Trail;

#[cfg(test)]
mod tests;
