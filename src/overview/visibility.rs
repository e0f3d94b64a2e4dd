//! Tracking which tiles are on screen.

use std::collections::HashSet;
use std::ops::RangeInclusive;

use super::paged::PageLayout;
use super::pool::TileId;
use crate::task::TaskId;

/// Receives visibility transitions, in page order within one pass.
pub trait VisibilityListener {
    fn on_visibility_gained(&mut self, page: usize, tile: TileId, task: TaskId);
    fn on_visibility_lost(&mut self, page: usize, tile: TileId, task: TaskId);
}

/// Pages intersecting the viewport at `scroll`, widened by `preload` pages on both sides.
pub fn compute_visible_range(
    layout: &PageLayout,
    scroll: f64,
    count: usize,
    preload: usize,
) -> Option<RangeInclusive<usize>> {
    let width = layout.viewport.x;
    let mut visible = (0..count).filter(|&page| {
        let rect = layout.tile_rect(page, scroll);
        rect.right() > 0. && rect.left() < width
    });

    let first = visible.next()?;
    let last = visible.last().unwrap_or(first);

    let lower = first.saturating_sub(preload);
    let upper = last.saturating_add(preload).min(count - 1);
    Some(lower..=upper)
}

#[derive(Debug, Default)]
pub struct VisibilityTracker {
    visible: HashSet<TaskId>,
}

impl VisibilityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_visible(&self, task: TaskId) -> bool {
        self.visible.contains(&task)
    }

    pub fn visible_count(&self) -> usize {
        self.visible.len()
    }

    /// Compares `range` with the previous pass and reports the tiles that changed.
    ///
    /// `tiles` are the bound tiles in page order. The `excluded` task is left untouched.
    pub fn reconcile(
        &mut self,
        tiles: &[(TileId, TaskId)],
        range: Option<RangeInclusive<usize>>,
        excluded: Option<TaskId>,
        listener: &mut dyn VisibilityListener,
    ) {
        let _span = tracy_client::span!("VisibilityTracker::reconcile");

        let present: HashSet<TaskId> = tiles.iter().map(|&(_, task)| task).collect();
        self.visible.retain(|task| {
            let keep = present.contains(task);
            if !keep {
                trace!("task {task} left the strip while visible");
            }
            keep
        });

        for (page, &(tile, task)) in tiles.iter().enumerate() {
            if Some(task) == excluded {
                continue;
            }

            let now_visible = range.as_ref().is_some_and(|range| range.contains(&page));
            let was_visible = self.visible.contains(&task);

            if now_visible && !was_visible {
                self.visible.insert(task);
                listener.on_visibility_gained(page, tile, task);
            } else if !now_visible && was_visible {
                self.visible.remove(&task);
                listener.on_visibility_lost(page, tile, task);
            }
        }
    }

    /// Forgets every tile without reporting anything.
    pub fn clear(&mut self) {
        self.visible.clear();
    }
}
