//! Dismissing a tile and closing the gap it leaves.
//!
//! A dismiss is one progress animation from 0 to 1 that every affected property is derived from:
//! the dismissed tile fades and slides up, and siblings slide sideways so that when the tile is
//! finally removed and the strip jumps to its new page, nothing moves on screen.

use std::time::Duration;

use super::paged::PageLayout;
use super::pool::TileId;
use super::tile::Visibility;
use super::{RecentsEvent, RecentsView};
use crate::animation::{Animation, Curve};
use crate::error::RecentsError;
use crate::task::TaskId;

/// Page that stays centered once `dismissed` is removed from `count` pages.
///
/// Removing a page before the current one, or the current one when it is the last, shifts the
/// current page down by one.
pub fn page_to_snap_to(current: usize, dismissed: usize, count: usize) -> usize {
    let is_last = current + 1 == count;
    if dismissed < current || (dismissed == current && is_last) {
        current.saturating_sub(1)
    } else {
        current
    }
}

/// Horizontal offset that moves `page` from where it is now to where it ends up after
/// `dismissed` is removed and the strip jumps to `snap_page`.
pub fn sibling_shift(
    layout: &PageLayout,
    scroll: f64,
    page: usize,
    dismissed: usize,
    snap_page: usize,
) -> f64 {
    let new_page = if page > dismissed { page - 1 } else { page };
    let before = layout.page_scroll(page) - scroll;
    let after = layout.page_scroll(new_page) - layout.page_scroll(snap_page);
    after - before
}

#[derive(Debug, Clone, Copy)]
struct SiblingShift {
    tile: TileId,
    from: f64,
    to: f64,
}

#[derive(Debug)]
pub struct PendingDismiss {
    tile: TileId,
    task: TaskId,
    animate_tile: bool,
    remove: bool,
    progress: Animation,
    start_alpha: f64,
    start_y: f64,
    tile_height: f64,
    shifts: Vec<SiblingShift>,
    fade: Curve,
    slide: Curve,
    shift: Curve,
    snap_page: usize,
}

impl PendingDismiss {
    pub fn tile(&self) -> TileId {
        self.tile
    }

    pub fn task(&self) -> TaskId {
        self.task
    }

    pub fn snap_page(&self) -> usize {
        self.snap_page
    }
}

impl RecentsView {
    /// Dismisses the task shown by `tile`.
    ///
    /// With `animate` the tile fades and slides out; otherwise it's hidden right away while its
    /// siblings still close the gap. With `remove` the task is also ended through the removal
    /// sink. Returns `false` if nothing was started.
    pub fn dismiss_task(&mut self, tile: TileId, animate: bool, remove: bool) -> bool {
        self.dismiss_task_with_duration(tile, animate, remove, None)
    }

    pub fn dismiss_task_with_duration(
        &mut self,
        tile: TileId,
        animate: bool,
        remove: bool,
        duration: Option<Duration>,
    ) -> bool {
        let _span = tracy_client::span!("RecentsView::dismiss_task");

        if self.pending_dismiss.is_some() {
            debug!("force-finishing the previous dismiss");
            self.finish_dismiss(false);
        }

        match self.build_dismiss(tile, animate, remove, duration) {
            Ok(pending) => {
                debug!(
                    "dismissing task {} (animate: {animate}, remove: {remove})",
                    pending.task
                );
                self.pending_dismiss = Some(pending);
                self.advance_dismiss();
                true
            }
            Err(err) => {
                warn!("error dismissing tile {tile}: {err}");
                false
            }
        }
    }

    /// Aborts the in-flight dismiss, putting the tile back.
    pub fn cancel_dismiss(&mut self) {
        if self.pending_dismiss.is_some() {
            self.finish_dismiss(false);
        }
    }

    fn build_dismiss(
        &mut self,
        tile: TileId,
        animate: bool,
        remove: bool,
        duration: Option<Duration>,
    ) -> Result<PendingDismiss, RecentsError> {
        let page = self.page_of_tile(tile).ok_or(RecentsError::UnknownTile(tile))?;
        let task = self
            .pool
            .get(tile)
            .and_then(|tile| tile.task())
            .ok_or(RecentsError::UnknownTile(tile))?;

        let count = self.slots.len();
        self.container.stop_settling(count);

        let layout = *self.container.layout();
        let scroll = self.container.scroll();
        let current = self.container.current_index();
        let snap_page = page_to_snap_to(current, page, count);

        let mut shifts = Vec::new();
        for (other, slot) in self.slots.iter().enumerate() {
            if other == page {
                continue;
            }
            let to = sibling_shift(&layout, scroll, other, page, snap_page);
            if to == 0. {
                continue;
            }
            let Some(tile) = self.pool.get(slot.tile) else {
                continue;
            };
            shifts.push(SiblingShift {
                tile: slot.tile,
                from: tile.translation_x(),
                to,
            });
        }

        let animations = &self.options.animations;
        let config = animations.dismiss_slide;
        let progress = match duration {
            Some(duration) if !config.off => Animation::ease(
                self.clock.clone(),
                0.,
                1.,
                0.,
                duration.as_millis() as u64,
                Curve::Linear,
            ),
            _ => Animation::new(self.clock.clone(), 0., 1., 0., linear_progress(config)),
        };

        let slot = &mut self.slots[page];
        slot.occupied = false;

        let tile_height = layout.tile_size.y;
        let (start_alpha, start_y) = match self.pool.get_mut(tile) {
            Some(tile) => {
                tile.stop_animations();
                tile.set_z_bump(true);
                if !animate {
                    tile.set_visibility(Visibility::Hidden);
                }
                (tile.alpha(), tile.translation_y())
            }
            None => (1., 0.),
        };

        Ok(PendingDismiss {
            tile,
            task,
            animate_tile: animate,
            remove,
            progress,
            start_alpha,
            start_y,
            tile_height,
            shifts,
            fade: Curve::from_config_or(animations.dismiss_fade, Curve::Accel2),
            slide: Curve::from_config_or(animations.dismiss_slide, Curve::Linear),
            shift: Curve::from_config_or(animations.dismiss_shift, Curve::Accel),
            snap_page,
        })
    }

    /// Applies the dismiss progress to the tiles and finishes it once done.
    pub(super) fn advance_dismiss(&mut self) {
        let Some(pending) = &self.pending_dismiss else {
            return;
        };

        let progress = pending.progress.clamped_value().clamp(0., 1.);

        if pending.animate_tile {
            if let Some(tile) = self.pool.get_mut(pending.tile) {
                let fade = pending.fade.clamp_to_progress(progress, 0., 0.5);
                tile.set_alpha(pending.start_alpha * (1. - fade));
                let slide = pending.slide.y(progress);
                let end_y = -pending.tile_height;
                tile.set_translation_y(pending.start_y + (end_y - pending.start_y) * slide);
            }
        }

        let shift = pending.shift.y(progress);
        for sibling in &pending.shifts {
            match self.pool.get_mut(sibling.tile) {
                Some(tile) => {
                    tile.set_translation_x(sibling.from + (sibling.to - sibling.from) * shift)
                }
                None => trace!("dismiss sibling {} vanished", sibling.tile),
            }
        }

        if pending.progress.is_done() {
            self.finish_dismiss(true);
        }
    }

    /// Ends the in-flight dismiss, removing the tile on success and restoring it otherwise.
    pub(super) fn finish_dismiss(&mut self, success: bool) {
        let Some(pending) = self.pending_dismiss.take() else {
            return;
        };
        let task = pending.task;

        if success {
            if pending.remove {
                self.collaborators.removal.remove_task(task);
                if let Some(snapshot) = &mut self.deferred_snapshot {
                    snapshot.retain(|record| record.id != task);
                }
            }

            match self.page_of_tile(pending.tile) {
                Some(page) => {
                    let slot = self.slots.remove(page);
                    self.model.remove(task);
                    self.pool.release(slot.tile);
                }
                None => warn!("dismissed tile of task {task} already gone"),
            }
            if self.running_task == Some(task) {
                self.running_task = None;
                self.live_tile = None;
            }

            self.events.push(RecentsEvent::TaskDismissed {
                task,
                removed: pending.remove,
            });

            if self.slots.is_empty() {
                debug!("dismissed the last task, returning home");
                self.container.jump_to_page(0);
                self.events.push(RecentsEvent::ReturnHome);
            } else {
                let page = pending.snap_page.min(self.slots.len() - 1);
                self.container.jump_to_page(page);
            }
            self.settle_siblings(&pending);
            self.update_empty_message();
        } else {
            debug!("dismiss of task {task} cancelled");
            if let Some(page) = self.page_of_tile(pending.tile) {
                self.slots[page].occupied = true;
            }
            if let Some(tile) = self.pool.get_mut(pending.tile) {
                tile.set_visibility(Visibility::Visible);
                tile.set_z_bump(false);
                tile.set_alpha(pending.start_alpha);
                tile.set_translation_x(0.);
                tile.set_translation_y(pending.start_y);
            }
            self.settle_siblings(&pending);
            self.events.push(RecentsEvent::DismissCancelled(task));
        }

        self.reset_task_visuals();
        self.update_visibility();
    }

    /// Takes the gap-closing shift off the siblings, the running tile included.
    fn settle_siblings(&mut self, pending: &PendingDismiss) {
        for sibling in &pending.shifts {
            if let Some(tile) = self.pool.get_mut(sibling.tile) {
                tile.set_translation_x(0.);
            }
        }
    }
}

/// Dismiss progress runs linearly; the curves are applied per property.
fn linear_progress(config: recents_config::Animation) -> recents_config::Animation {
    match config.kind {
        recents_config::AnimationKind::Easing(mut params) => {
            params.curve = recents_config::AnimationCurve::Linear;
            recents_config::Animation {
                off: config.off,
                kind: recents_config::AnimationKind::Easing(params),
            }
        }
        recents_config::AnimationKind::Spring(_) => config,
    }
}
