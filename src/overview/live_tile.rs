//! Live tile: the running app's surface following its tile during a swipe-up gesture.

use std::time::Duration;

use glam::DVec2;

use super::RecentsView;
use crate::geometry::Rect;
use crate::task::TaskId;

#[derive(Debug, Clone, Copy)]
pub struct LiveTile {
    task: TaskId,
    /// Gesture progress, 0 with the app fullscreen and 1 with it shrunk into its tile.
    progress: f64,
    /// Clock time of the last transform pushed to the surfaces.
    last_applied: Option<Duration>,
}

impl LiveTile {
    pub fn task(&self) -> TaskId {
        self.task
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }
}

impl RecentsView {
    /// Starts mirroring the running task's surface onto its tile.
    pub fn on_gesture_animation_start(&mut self, running: TaskId) {
        let _span = tracy_client::span!("RecentsView::on_gesture_animation_start");
        debug!("gesture started from task {running}");

        self.running_task = Some(running);
        if !self.model.contains(running) {
            self.reload_tasks();
        }
        self.pin_running_task();

        let Some(page) = self.page_of_task(running) else {
            warn!("running task {running} is not in the task list, no live tile");
            return;
        };

        self.container.jump_to_page(page);
        let config = self.options.animations.icon_scale;
        if let Some(tile) = self.tile_mut(page) {
            tile.set_fullscreen_progress(1.);
            tile.animate_icon_scale(0., config);
        }

        self.live_tile = Some(LiveTile {
            task: running,
            progress: 0.,
            last_applied: None,
        });
        self.update_visibility();
        self.update_live_tile();
    }

    /// Moves the live tile along the gesture.
    pub fn update_gesture_progress(&mut self, progress: f64) {
        let Some(live) = &mut self.live_tile else {
            return;
        };
        let progress = progress.clamp(0., 1.);
        live.progress = progress;
        live.last_applied = None;

        let task = live.task;
        if let Some(page) = self.page_of_task(task) {
            if let Some(tile) = self.tile_mut(page) {
                tile.set_fullscreen_progress(1. - progress);
            }
        }
        self.update_live_tile();
    }

    /// The gesture settled in the overview; the tile goes back to static content.
    pub fn on_gesture_animation_end(&mut self) {
        debug!("gesture ended");
        self.end_live_tile();
    }

    /// The gesture was abandoned; the running task is no longer pinned.
    pub fn on_gesture_animation_cancelled(&mut self) {
        debug!("gesture cancelled");
        self.end_live_tile();

        self.running_task = None;
        self.pin_running_task();
        self.reset_task_visuals();
    }

    pub fn is_live_tile_active(&self) -> bool {
        self.live_tile.is_some()
    }

    fn pin_running_task(&mut self) {
        let running = self.running_task;
        for (_, tile) in self.pool.iter_mut() {
            let pinned = running.is_some() && tile.task() == running;
            tile.set_running_pinned(pinned);
        }
    }

    fn end_live_tile(&mut self) {
        let Some(live) = self.live_tile.take() else {
            return;
        };

        let config = self.options.animations.icon_scale;
        if let Some(page) = self.page_of_task(live.task) {
            if let Some(tile) = self.tile_mut(page) {
                tile.set_fullscreen_progress(0.);
                tile.animate_icon_scale(1., config);
            }
        }
        self.update_visibility();
    }

    /// Pushes the live tile transform to the surfaces, at most once per clock tick.
    pub(super) fn update_live_tile(&mut self) {
        let now = self.clock.now();
        let Some(live) = &mut self.live_tile else {
            return;
        };
        if live.last_applied == Some(now) {
            return;
        }

        let task = live.task;
        let progress = live.progress;
        let Some(page) = self.model.index_of(task) else {
            trace!("live tile task {task} vanished");
            return;
        };
        let Some(tile) = self.slots.get(page).and_then(|slot| self.pool.get(slot.tile)) else {
            return;
        };
        live.last_applied = Some(now);

        let layout = self.container.layout();
        let tile_rect = layout
            .tile_rect(page, self.container.scroll())
            .translated(DVec2::new(tile.translation_x(), tile.translation_y()));
        let fullscreen = Rect::from_size(layout.viewport);
        let rect = Rect::new(
            fullscreen.loc.lerp(tile_rect.loc, progress),
            fullscreen.size.lerp(tile_rect.size, progress),
        );

        self.collaborators
            .surfaces
            .apply_transform(&[task], progress, rect, tile.alpha());
    }
}
