//! Collaborators supplied by the host shell.
//!
//! The engine never talks to the system directly. Everything it needs from outside goes through
//! the traits here, and everything that arrives asynchronously is funneled through a
//! [`TaskEvent`] channel that the owner thread drains.

use crate::geometry::Rect;
use crate::task::{ComponentName, IconHandle, RawTaskDescriptor, TaskId, UserId};

/// Events produced by background workers.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskEvent {
    /// The running task stack changed; the list must be fetched again.
    TaskStackChanged,
    TaskRemoved(TaskId),
    IconLoaded { task: TaskId, icon: IconHandle },
}

pub trait TaskSource {
    /// Returns up to `limit` running tasks, most recent last.
    fn list_running_tasks(&mut self, limit: usize) -> Vec<RawTaskDescriptor>;

    /// Starts delivering task stack events to `sender`.
    fn subscribe(&mut self, sender: async_channel::Sender<TaskEvent>);

    fn unsubscribe(&mut self);
}

pub trait IconProvider {
    /// Looks up the icon for a component. May return a placeholder and deliver the real icon
    /// later as [`TaskEvent::IconLoaded`].
    fn icon_for(&mut self, component: &ComponentName, user: UserId) -> anyhow::Result<IconHandle>;
}

pub trait SurfaceTransformApplier {
    /// Positions the live surfaces of `targets`. Called at most once per frame.
    fn apply_transform(&mut self, targets: &[TaskId], progress: f64, rect: Rect, alpha: f64);

    /// The overview was torn down; any surface state can be dropped.
    fn on_overview_reset(&mut self) {}
}

pub trait TaskRemovalSink {
    /// Asks the system to end a task. Fire and forget.
    fn remove_task(&mut self, task: TaskId);
}

/// Everything the engine borrows from its host.
pub struct Collaborators {
    pub task_source: Box<dyn TaskSource>,
    pub icons: Box<dyn IconProvider>,
    pub surfaces: Box<dyn SurfaceTransformApplier>,
    pub removal: Box<dyn TaskRemovalSink>,
}
