//! Task tile view-model.

use std::fmt;

use super::animated_value::AnimatedValue;
use super::pool::Poolable;
use crate::animation::Clock;
use crate::task::{IconHandle, TaskId};

mod animation;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Visible,
    Hidden,
}

/// One slot of the task strip.
///
/// A tile is bound to at most one task at a time. Its visual state is a set of independently
/// animated properties; `recycle` brings all of them back to the baseline.
#[derive(Debug)]
pub struct TaskTile {
    task: Option<TaskId>,
    icon: Option<IconHandle>,
    visibility: Visibility,

    alpha: AnimatedValue,
    translation_x: AnimatedValue,
    translation_y: AnimatedValue,
    icon_scale: AnimatedValue,
    scale: f64,
    fullscreen_progress: f64,

    /// Task in the foreground of the current gesture session.
    running_pinned: bool,
    /// Drawn above its siblings, e.g. while being dismissed.
    z_bump: bool,
    /// Thumbnail and icon data are loaded because the tile is in the visible range.
    data_loaded: bool,

    clock: Clock,
}

impl TaskTile {
    pub fn new(clock: Clock) -> Self {
        Self {
            task: None,
            icon: None,
            visibility: Visibility::Visible,
            alpha: AnimatedValue::new(1.),
            translation_x: AnimatedValue::new(0.),
            translation_y: AnimatedValue::new(0.),
            icon_scale: AnimatedValue::new(1.),
            scale: 1.,
            fullscreen_progress: 0.,
            running_pinned: false,
            z_bump: false,
            data_loaded: false,
            clock,
        }
    }

    pub fn bind(&mut self, task: TaskId) {
        if self.task != Some(task) {
            self.icon = None;
            self.data_loaded = false;
        }
        self.task = Some(task);
    }

    pub fn task(&self) -> Option<TaskId> {
        self.task
    }

    pub fn icon(&self) -> Option<&IconHandle> {
        self.icon.as_ref()
    }

    pub fn set_icon(&mut self, icon: Option<IconHandle>) {
        self.icon = icon;
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn set_visibility(&mut self, visibility: Visibility) {
        self.visibility = visibility;
    }

    pub fn is_data_loaded(&self) -> bool {
        self.data_loaded
    }

    pub fn set_data_loaded(&mut self, loaded: bool) {
        self.data_loaded = loaded;
        if !loaded {
            self.icon = None;
        }
    }

    pub fn alpha(&self) -> f64 {
        self.alpha.current().clamp(0., 1.)
    }

    pub fn translation_x(&self) -> f64 {
        self.translation_x.current()
    }

    pub fn translation_y(&self) -> f64 {
        self.translation_y.current()
    }

    pub fn icon_scale(&self) -> f64 {
        self.icon_scale.current()
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn set_scale(&mut self, scale: f64) {
        self.scale = scale;
    }

    pub fn fullscreen_progress(&self) -> f64 {
        self.fullscreen_progress
    }

    pub fn set_fullscreen_progress(&mut self, progress: f64) {
        self.fullscreen_progress = progress.clamp(0., 1.);
    }

    pub fn is_running_pinned(&self) -> bool {
        self.running_pinned
    }

    pub fn set_running_pinned(&mut self, pinned: bool) {
        self.running_pinned = pinned;
    }

    pub fn z_bump(&self) -> bool {
        self.z_bump
    }

    pub fn set_z_bump(&mut self, value: bool) {
        self.z_bump = value;
    }

    /// Puts the visual state back to the baseline, keeping the binding.
    pub fn reset_visuals(&mut self) {
        self.alpha = AnimatedValue::new(1.);
        self.translation_x = AnimatedValue::new(0.);
        self.translation_y = AnimatedValue::new(0.);
        self.icon_scale = AnimatedValue::new(1.);
        self.scale = 1.;
        self.fullscreen_progress = 0.;
        self.visibility = Visibility::Visible;
        self.z_bump = false;
    }
}

impl Poolable for TaskTile {
    fn recycle(&mut self) {
        self.reset_visuals();
        self.task = None;
        self.icon = None;
        self.running_pinned = false;
        self.data_loaded = false;
    }
}

impl fmt::Display for TaskTile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.task {
            Some(task) => write!(f, "task {task}")?,
            None => write!(f, "unbound")?,
        }
        if self.running_pinned {
            write!(f, " [running]")?;
        }
        if self.visibility == Visibility::Hidden {
            write!(f, " [hidden]")?;
        }
        if self.data_loaded {
            write!(f, " [loaded]")?;
        }
        write!(
            f,
            " alpha={:.2} tx={:.1} ty={:.1}",
            self.alpha(),
            self.translation_x(),
            self.translation_y()
        )
    }
}
