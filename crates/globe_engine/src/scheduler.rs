//! Frame scheduling
//!
//! Refresh callbacks are explicit tasks. A task runs once per frame, in the
//! order it was started, until it is cancelled or asks to stop. Cancelling
//! hands the task back so its owner can tear it down deterministically.

use slotmap::{new_key_type, SlotMap};

use crate::foundation::time::FrameTime;

new_key_type! {
    /// Handle to a scheduled task
    pub struct TaskHandle;
}

/// What a task wants after running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskControl {
    /// Run again next frame
    Continue,
    /// Remove the task; it is returned in the frame report
    Stop,
}

/// Work executed once per frame
pub trait FrameTask {
    /// Run for one frame
    fn run(&mut self, time: &FrameTime) -> TaskControl;
}

impl<F> FrameTask for F
where
    F: FnMut(&FrameTime) -> TaskControl,
{
    fn run(&mut self, time: &FrameTime) -> TaskControl {
        self(time)
    }
}

/// Outcome of one [`FrameScheduler::run_frame`]
#[derive(Debug)]
pub struct FrameReport<T> {
    /// Tasks that ran
    pub ran: usize,
    /// Tasks that returned [`TaskControl::Stop`], now removed
    pub finished: Vec<(TaskHandle, T)>,
}

/// Ordered set of per-frame tasks
#[derive(Debug)]
pub struct FrameScheduler<T> {
    tasks: SlotMap<TaskHandle, T>,
    order: Vec<TaskHandle>,
}

impl<T> Default for FrameScheduler<T> {
    fn default() -> Self {
        Self {
            tasks: SlotMap::with_key(),
            order: Vec::new(),
        }
    }
}

impl<T: FrameTask> FrameScheduler<T> {
    /// Create an empty scheduler
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a task; it first runs on the next frame
    pub fn start(&mut self, task: T) -> TaskHandle {
        let handle = self.tasks.insert(task);
        self.order.push(handle);
        log::trace!("Frame task {:?} started", handle);
        handle
    }

    /// Deregister a task and hand it back. A cancelled handle never runs
    /// again; cancelling twice returns `None`.
    pub fn cancel(&mut self, handle: TaskHandle) -> Option<T> {
        let task = self.tasks.remove(handle)?;
        self.order.retain(|&h| h != handle);
        log::trace!("Frame task {:?} cancelled", handle);
        Some(task)
    }

    /// True while the task is registered
    pub fn is_active(&self, handle: TaskHandle) -> bool {
        self.tasks.contains_key(handle)
    }

    /// Number of registered tasks
    pub fn active_count(&self) -> usize {
        self.tasks.len()
    }

    /// Borrow a registered task
    pub fn task(&self, handle: TaskHandle) -> Option<&T> {
        self.tasks.get(handle)
    }

    /// Mutably borrow a registered task
    pub fn task_mut(&mut self, handle: TaskHandle) -> Option<&mut T> {
        self.tasks.get_mut(handle)
    }

    /// Run every registered task once, in start order
    pub fn run_frame(&mut self, time: &FrameTime) -> FrameReport<T> {
        let mut ran = 0;
        let mut stopped = Vec::new();

        for &handle in &self.order {
            if let Some(task) = self.tasks.get_mut(handle) {
                ran += 1;
                if task.run(time) == TaskControl::Stop {
                    stopped.push(handle);
                }
            }
        }

        let finished = stopped
            .into_iter()
            .filter_map(|handle| self.cancel(handle).map(|task| (handle, task)))
            .collect();

        FrameReport { ran, finished }
    }
}
