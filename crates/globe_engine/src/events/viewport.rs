//! Viewport bus
//!
//! Holds the single [`ViewportState`] and fans size changes out to
//! subscribers as resolved [`Region`]s. Delivery is explicit: publishing
//! returns the notifications instead of invoking callbacks, so the caller
//! decides when each container resizes.

use serde::{Deserialize, Serialize};
use slotmap::{new_key_type, SlotMap};

/// Minimum height of a scene region, in pixels
pub const DEFAULT_MIN_HEIGHT: u32 = 300;

new_key_type! {
    /// Handle to a viewport subscription
    pub struct SubscriptionId;
}

/// On-screen area of one container, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Region {
    /// Width
    pub width: u32,
    /// Height
    pub height: u32,
}

impl Region {
    /// Create a region
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// True if either side is zero
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Width over height; 1.0 for empty regions
    pub fn aspect(&self) -> f32 {
        if self.is_empty() {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }
}

/// Window-level state
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ViewportState {
    /// Window width
    pub width: u32,
    /// Window height
    pub height: u32,
    /// Vertical scroll offset
    pub scroll_y: f32,
}

/// How a subscriber's region follows the viewport
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RegionLayout {
    /// Constant size regardless of the viewport
    Fixed {
        /// Width
        width: u32,
        /// Height
        height: u32,
    },
    /// The whole viewport
    FillViewport,
    /// A fraction of the viewport on each axis
    Fraction {
        /// Fraction of the viewport width
        width: f32,
        /// Fraction of the viewport height
        height: f32,
    },
}

#[derive(Debug, Clone, Copy)]
struct Subscriber {
    layout: RegionLayout,
    region: Region,
}

/// Single source of viewport size and scroll state
#[derive(Debug)]
pub struct ViewportBus {
    state: ViewportState,
    min_height: u32,
    subscribers: SlotMap<SubscriptionId, Subscriber>,
}

impl ViewportBus {
    /// Bus for a viewport of the given size
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            state: ViewportState {
                width,
                height,
                scroll_y: 0.0,
            },
            min_height: DEFAULT_MIN_HEIGHT,
            subscribers: SlotMap::with_key(),
        }
    }

    /// Override the minimum region height
    pub fn with_min_height(mut self, min_height: u32) -> Self {
        self.min_height = min_height;
        self
    }

    /// Current viewport state
    pub fn state(&self) -> ViewportState {
        self.state
    }

    /// Region a layout resolves to for the current viewport
    pub fn resolve(&self, layout: RegionLayout) -> Region {
        let (width, height) = match layout {
            RegionLayout::Fixed { width, height } => (width, height),
            RegionLayout::FillViewport => (self.state.width, self.state.height),
            RegionLayout::Fraction { width, height } => (
                (self.state.width as f32 * width.max(0.0)).round() as u32,
                (self.state.height as f32 * height.max(0.0)).round() as u32,
            ),
        };
        Region::new(width, height.max(self.min_height))
    }

    /// Register a layout; its current region is available via [`Self::region_of`]
    pub fn subscribe(&mut self, layout: RegionLayout) -> SubscriptionId {
        let region = self.resolve(layout);
        let id = self.subscribers.insert(Subscriber { layout, region });
        log::debug!("Viewport subscription {:?} with {:?} -> {}x{}", id, layout, region.width, region.height);
        id
    }

    /// Remove a subscription; `false` if it was not registered
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.remove(id).is_some()
    }

    /// Number of live subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Last region delivered to a subscriber
    pub fn region_of(&self, id: SubscriptionId) -> Option<Region> {
        self.subscribers.get(id).map(|subscriber| subscriber.region)
    }

    /// Record a new viewport size. Returns the subscribers whose region
    /// changed, with their new region; an unchanged size returns nothing.
    pub fn publish_resize(&mut self, width: u32, height: u32) -> Vec<(SubscriptionId, Region)> {
        if (self.state.width, self.state.height) == (width, height) {
            return Vec::new();
        }
        self.state.width = width;
        self.state.height = height;
        log::trace!("Viewport resized to {}x{}", width, height);

        let mut changed = Vec::new();
        let resolved: Vec<(SubscriptionId, Region)> = self
            .subscribers
            .iter()
            .map(|(id, subscriber)| (id, self.resolve(subscriber.layout)))
            .collect();
        for (id, region) in resolved {
            if let Some(subscriber) = self.subscribers.get_mut(id) {
                if subscriber.region != region {
                    subscriber.region = region;
                    changed.push((id, region));
                }
            }
        }
        changed
    }

    /// Record a new vertical scroll offset
    pub fn publish_scroll(&mut self, scroll_y: f32) {
        self.state.scroll_y = scroll_y;
    }

    /// True once the page is scrolled past `threshold` pixels
    pub fn is_scrolled(&self, threshold: f32) -> bool {
        self.state.scroll_y > threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layouts_resolve_with_min_height() {
        let bus = ViewportBus::new(1200, 800);
        assert_eq!(bus.resolve(RegionLayout::FillViewport), Region::new(1200, 800));
        assert_eq!(
            bus.resolve(RegionLayout::Fraction { width: 0.5, height: 0.25 }),
            Region::new(600, 300),
            "200px tall fraction is clamped to the minimum height"
        );
        assert_eq!(bus.resolve(RegionLayout::Fixed { width: 100, height: 50 }), Region::new(100, 300));
    }

    #[test]
    fn test_unchanged_resize_yields_nothing() {
        let mut bus = ViewportBus::new(800, 600);
        bus.subscribe(RegionLayout::FillViewport);
        assert!(bus.publish_resize(800, 600).is_empty());
    }

    #[test]
    fn test_resize_notifies_only_changed_regions() {
        let mut bus = ViewportBus::new(800, 600);
        let fill = bus.subscribe(RegionLayout::FillViewport);
        let fixed = bus.subscribe(RegionLayout::Fixed { width: 300, height: 300 });

        let notifications = bus.publish_resize(1024, 768);
        assert_eq!(notifications, vec![(fill, Region::new(1024, 768))]);
        assert_eq!(bus.region_of(fixed), Some(Region::new(300, 300)));
    }

    #[test]
    fn test_unsubscribe_twice() {
        let mut bus = ViewportBus::new(800, 600);
        let id = bus.subscribe(RegionLayout::FillViewport);
        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        assert_eq!(bus.subscriber_count(), 0);
        assert!(bus.publish_resize(10, 10).is_empty());
    }

    #[test]
    fn test_scroll_threshold() {
        let mut bus = ViewportBus::new(800, 600);
        assert!(!bus.is_scrolled(50.0));
        bus.publish_scroll(51.0);
        assert!(bus.is_scrolled(50.0));
        bus.publish_scroll(50.0);
        assert!(!bus.is_scrolled(50.0), "Exactly at the threshold is not past it");
    }

    #[test]
    fn test_region_aspect_of_empty_region_is_finite() {
        assert_eq!(Region::new(0, 300).aspect(), 1.0);
        assert!(Region::new(0, 0).is_empty());
    }
}
