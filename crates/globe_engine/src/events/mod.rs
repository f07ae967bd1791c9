//! Viewport events
//!
//! Window size and scroll position have exactly one owner, the
//! [`ViewportBus`]. Everything that needs them subscribes there instead of
//! listening to the window on its own.

pub mod viewport;

pub use viewport::{Region, RegionLayout, SubscriptionId, ViewportBus, ViewportState, DEFAULT_MIN_HEIGHT};
