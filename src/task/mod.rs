//! Task records mirroring the system's running task stack.

use std::fmt;
use std::sync::Arc;

mod list;
pub use list::{TaskList, TaskListSnapshot};

/// Stable task identifier assigned by the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(pub i32);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct UserId(pub u32);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ComponentName {
    pub package: String,
    pub class: String,
}

impl ComponentName {
    pub fn new(package: impl Into<String>, class: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            class: class.into(),
        }
    }
}

impl fmt::Display for ComponentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.package, self.class)
    }
}

/// Icon owned by an external cache; tiles only hold a reference to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IconHandle {
    Placeholder,
    Loaded(Arc<str>),
}

impl IconHandle {
    pub fn is_placeholder(&self) -> bool {
        matches!(self, IconHandle::Placeholder)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaskRecord {
    pub id: TaskId,
    pub base_component: ComponentName,
    /// Activity currently on top of the task, when it differs from the launching one.
    pub top_component: Option<ComponentName>,
    pub user: UserId,
    pub icon: Option<IconHandle>,
    pub dockable: bool,
}

impl TaskRecord {
    pub fn new(id: TaskId, base_component: ComponentName) -> Self {
        Self {
            id,
            base_component,
            top_component: None,
            user: UserId::default(),
            icon: None,
            dockable: true,
        }
    }

    pub fn package(&self) -> &str {
        &self.base_component.package
    }

    /// Component whose icon represents the task.
    pub fn icon_component(&self) -> &ComponentName {
        self.top_component.as_ref().unwrap_or(&self.base_component)
    }
}

/// Task as reported by the task source, before it enters the model.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTaskDescriptor {
    pub id: TaskId,
    pub base_component: ComponentName,
    pub top_component: Option<ComponentName>,
    pub user: UserId,
    pub dockable: bool,
}

impl From<RawTaskDescriptor> for TaskRecord {
    fn from(raw: RawTaskDescriptor) -> Self {
        Self {
            id: raw.id,
            base_component: raw.base_component,
            top_component: raw.top_component,
            user: raw.user,
            icon: None,
            dockable: raw.dockable,
        }
    }
}

#[cfg(test)]
pub(crate) fn test_task(id: i32) -> TaskRecord {
    TaskRecord::new(
        TaskId(id),
        ComponentName::new(format!("com.example.app{id}"), "MainActivity"),
    )
}
