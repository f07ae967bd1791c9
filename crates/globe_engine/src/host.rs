//! # Scene Host
//!
//! Ties the pieces of a mounted scene together:
//!
//! - **mount**: resolve the region from the viewport bus, initialize the
//!   container, subscribe its layout, start its frame task
//! - **unmount**: cancel the frame task, unsubscribe, dispose the container
//!
//! The container lives inside its frame task, so once the task is cancelled
//! nothing can tick it against a released context.

use slotmap::{new_key_type, SlotMap};

use crate::config::SceneConfig;
use crate::events::{Region, RegionLayout, SubscriptionId, ViewportBus, ViewportState};
use crate::foundation::time::FrameTime;
use crate::render::RenderBackend;
use crate::scene::{SceneContainer, SceneError};
use crate::scheduler::{FrameScheduler, FrameTask, TaskControl, TaskHandle};

new_key_type! {
    /// Handle to a mounted scene
    pub struct MountId;
}

/// Frame task owning one container
pub struct SceneTask {
    container: SceneContainer,
}

impl SceneTask {
    /// The container driven by this task
    pub fn container(&self) -> &SceneContainer {
        &self.container
    }
}

impl FrameTask for SceneTask {
    fn run(&mut self, time: &FrameTime) -> TaskControl {
        match self.container.tick(time) {
            Ok(_) => TaskControl::Continue,
            Err(err) => {
                log::error!("Scene tick failed, stopping its frame task: {}", err);
                TaskControl::Stop
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Mount {
    task: TaskHandle,
    subscription: SubscriptionId,
}

/// Owner of every mounted scene, the viewport bus and the frame scheduler
pub struct SceneHost {
    bus: ViewportBus,
    scheduler: FrameScheduler<SceneTask>,
    mounts: SlotMap<MountId, Mount>,
}

impl SceneHost {
    /// Host for a viewport of the given size
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_bus(ViewportBus::new(width, height))
    }

    /// Host using a preconfigured viewport bus
    pub fn with_bus(bus: ViewportBus) -> Self {
        Self {
            bus,
            scheduler: FrameScheduler::new(),
            mounts: SlotMap::with_key(),
        }
    }

    /// Mount a scene whose region follows `layout`
    pub fn mount(
        &mut self,
        config: SceneConfig,
        layout: RegionLayout,
        backend: Box<dyn RenderBackend>,
    ) -> Result<MountId, SceneError> {
        let region = self.bus.resolve(layout);
        let container = SceneContainer::initialize(config, region, backend)?;
        let subscription = self.bus.subscribe(layout);
        let task = self.scheduler.start(SceneTask { container });
        let id = self.mounts.insert(Mount { task, subscription });
        log::info!("Mounted scene {:?} at {}x{}", id, region.width, region.height);
        Ok(id)
    }

    /// Tear a scene down; `false` for unknown or already unmounted ids
    pub fn unmount(&mut self, id: MountId) -> bool {
        let Some(mount) = self.mounts.remove(id) else {
            return false;
        };

        let task = self.scheduler.cancel(mount.task);
        self.bus.unsubscribe(mount.subscription);
        if let Some(mut task) = task {
            task.container.dispose();
        }
        log::info!("Unmounted scene {:?}", id);
        true
    }

    /// Unmount every scene
    pub fn unmount_all(&mut self) {
        let ids: Vec<MountId> = self.mounts.keys().collect();
        for id in ids {
            self.unmount(id);
        }
    }

    /// Publish a new window size and resize the affected containers
    pub fn resize_viewport(&mut self, width: u32, height: u32) {
        for (subscription, region) in self.bus.publish_resize(width, height) {
            self.resize_subscriber(subscription, region);
        }
    }

    fn resize_subscriber(&mut self, subscription: SubscriptionId, region: Region) {
        let Some(mount) = self.mounts.values().find(|mount| mount.subscription == subscription) else {
            return;
        };
        if let Some(task) = self.scheduler.task_mut(mount.task) {
            if let Err(err) = task.container.resize(region) {
                log::error!("Scene resize to {}x{} failed: {}", region.width, region.height, err);
            }
        }
    }

    /// Publish a new scroll offset
    pub fn scroll_to(&mut self, scroll_y: f32) {
        self.bus.publish_scroll(scroll_y);
    }

    /// True once scrolled past `threshold` pixels
    pub fn is_scrolled(&self, threshold: f32) -> bool {
        self.bus.is_scrolled(threshold)
    }

    /// Current viewport state
    pub fn viewport(&self) -> ViewportState {
        self.bus.state()
    }

    /// Tick every mounted scene once; returns how many ran. Scenes whose tick
    /// failed are unmounted.
    pub fn run_frame(&mut self, time: &FrameTime) -> usize {
        let report = self.scheduler.run_frame(time);

        for (handle, mut task) in report.finished {
            task.container.dispose();
            let stopped: Vec<MountId> = self
                .mounts
                .iter()
                .filter(|(_, mount)| mount.task == handle)
                .map(|(id, _)| id)
                .collect();
            for id in stopped {
                if let Some(mount) = self.mounts.remove(id) {
                    self.bus.unsubscribe(mount.subscription);
                    log::warn!("Scene {:?} unmounted after a failed frame", id);
                }
            }
        }

        report.ran
    }

    /// Number of mounted scenes
    pub fn mounted_count(&self) -> usize {
        self.mounts.len()
    }

    /// Number of registered frame tasks
    pub fn active_tasks(&self) -> usize {
        self.scheduler.active_count()
    }

    /// Number of viewport subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.bus.subscriber_count()
    }

    /// Container of a mounted scene
    pub fn container(&self, id: MountId) -> Option<&SceneContainer> {
        let mount = self.mounts.get(id)?;
        self.scheduler.task(mount.task).map(SceneTask::container)
    }
}

impl Drop for SceneHost {
    fn drop(&mut self) {
        self.unmount_all();
    }
}
