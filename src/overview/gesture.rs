//! Touch and key input for the strip.

use glam::DVec2;

use super::paged::{relative_page, PagedContainer};
use super::pool::TileId;
use super::{RecentsEvent, RecentsView};
use crate::input::{action_for_key, KeyAction, KeyEvent, TouchEvent, TouchIntent, TouchTarget};

/// Vertical swipe on one tile.
#[derive(Debug, Clone, Copy)]
pub struct TileSwipe {
    tile: TileId,
}

/// Long-press drag of one tile along the strip.
#[derive(Debug, Clone, Copy)]
pub struct ReorderDrag {
    tile: TileId,
}

struct HitTest<'a> {
    container: &'a PagedContainer,
    count: usize,
}

impl TouchTarget for HitTest<'_> {
    fn tile_at(&self, pos: DVec2) -> Option<usize> {
        self.container.page_at(pos, self.count)
    }

    fn in_dead_zone(&self, pos: DVec2) -> bool {
        self.tile_at(pos).is_some()
    }
}

impl RecentsView {
    /// Feeds a touch event to the strip. Returns `false` if the overview doesn't take touches
    /// right now.
    pub fn handle_touch(&mut self, event: &TouchEvent) -> bool {
        let _span = tracy_client::span!("RecentsView::handle_touch");

        if !self.is_overview_active() {
            return false;
        }

        if self.is_interaction_disabled() {
            trace!("ignoring touch while interaction is disabled");
            for intent in self.recognizer.reset() {
                self.apply_intent(intent);
            }
            return false;
        }

        let target = HitTest {
            container: &self.container,
            count: self.slots.len(),
        };
        let intents = self.recognizer.on_touch(event, &target);
        for intent in intents {
            self.apply_intent(intent);
        }
        true
    }

    /// Handles a key press. Returns whether it did anything.
    pub fn dispatch_key_event(&mut self, event: KeyEvent) -> bool {
        if !self.is_overview_active() || self.is_interaction_disabled() {
            return false;
        }
        if self.container.is_dragging() {
            return false;
        }

        let Some(action) = action_for_key(event, self.options.rtl) else {
            return false;
        };
        trace!("key {event:?} -> {action:?}");

        let current = self.container.current_index();
        match action {
            KeyAction::SnapRelative { delta, cycle } => {
                let from = self.container.next_index().unwrap_or(current);
                match relative_page(from, self.slots.len(), delta, cycle) {
                    Some(page) => {
                        self.container.snap_to_page(page, 0., self.snap_animation());
                        true
                    }
                    None => false,
                }
            }
            KeyAction::DismissCurrent => match self.tile_id_at(current) {
                Some(tile) => self.dismiss_task(tile, true, true),
                None => false,
            },
            KeyAction::LaunchCurrent => self.launch_page(current),
            KeyAction::ReturnHome => {
                self.events.push(RecentsEvent::ReturnHome);
                true
            }
        }
    }

    fn is_interaction_disabled(&self) -> bool {
        self.coordinator.state().disables_interaction()
            || self
                .coordinator
                .target_state()
                .is_some_and(|state| state.disables_interaction())
    }

    pub(super) fn apply_intent(&mut self, intent: TouchIntent) {
        let count = self.slots.len();

        match intent {
            TouchIntent::StopSettling => self.container.stop_settling(count),
            TouchIntent::ScrollBegin => {
                if count > 0 {
                    self.container.begin_drag();
                }
            }
            TouchIntent::ScrollBy(delta) => self.container.drag_by(f64::from(delta), count),
            TouchIntent::ScrollEnd { delta, velocity } => {
                if self.container.is_dragging() {
                    let page = self.container.end_drag(
                        delta,
                        velocity,
                        count,
                        &self.options.fling,
                        self.snap_animation(),
                    );
                    trace!("drag released, settling on page {page}");
                }
            }
            TouchIntent::ScrollCancel => self.container.cancel_drag(self.snap_animation()),
            TouchIntent::Tap(page) => {
                self.launch_page(page);
            }
            TouchIntent::ReturnHome => self.events.push(RecentsEvent::ReturnHome),
            TouchIntent::TileSwipeBegin(page) => {
                let Some(tile) = self.tile_id_at(page) else {
                    return;
                };
                if let Some(tile) = self.pool.get_mut(tile) {
                    tile.stop_animations();
                }
                self.swipe = Some(TileSwipe { tile });
            }
            TouchIntent::TileSwipeUpdate { offset, .. } => {
                let Some(swipe) = self.swipe else {
                    return;
                };
                let height = self.container.layout().tile_size.y;
                if let Some(tile) = self.pool.get_mut(swipe.tile) {
                    tile.set_translation_y(offset);
                    tile.set_alpha(1. - (-offset / height).clamp(0., 1.));
                }
            }
            TouchIntent::TileSwipeEnd {
                offset, velocity, ..
            } => self.end_tile_swipe(offset, velocity),
            TouchIntent::TileSwipeCancel(_) => {
                if let Some(swipe) = self.swipe.take() {
                    self.settle_tile(swipe.tile, 0.);
                }
            }
            TouchIntent::ReorderBegin(page) => {
                if self.pending_dismiss.is_some() {
                    debug!("not reordering during a dismiss");
                    return;
                }
                let Some(tile) = self.tile_id_at(page) else {
                    return;
                };
                self.slots[page].occupied = false;
                if let Some(tile) = self.pool.get_mut(tile) {
                    tile.stop_animations();
                    tile.set_z_bump(true);
                }
                self.reorder = Some(ReorderDrag { tile });
            }
            TouchIntent::ReorderUpdate { offset, .. } => {
                if let Some(drag) = self.reorder {
                    if let Some(tile) = self.pool.get_mut(drag.tile) {
                        tile.set_translation_x(offset);
                    }
                }
            }
            TouchIntent::ReorderEnd { offset, .. } => self.end_reorder(offset),
            TouchIntent::ReorderCancel(_) => {
                if let Some(drag) = self.reorder.take() {
                    self.drop_in_place(drag.tile);
                }
            }
        }
    }

    fn launch_page(&mut self, page: usize) -> bool {
        match self.model.get(page) {
            Some(record) => {
                debug!("launching task {}", record.id);
                self.events.push(RecentsEvent::LaunchTask(record.id));
                true
            }
            None => false,
        }
    }

    fn end_tile_swipe(&mut self, offset: f64, velocity: f64) {
        let Some(swipe) = self.swipe.take() else {
            return;
        };

        let threshold = self.options.dismiss_fraction * self.container.layout().tile_size.y;
        let min_fling = self.options.fling.min_fling_velocity;

        if offset < -threshold || velocity < -min_fling {
            self.dismiss_task(swipe.tile, true, true);
            return;
        }

        if offset > threshold {
            if let Some(page) = self.page_of_tile(swipe.tile) {
                self.launch_page(page);
            }
        }
        self.settle_tile(swipe.tile, velocity);
    }

    fn settle_tile(&mut self, tile: TileId, velocity: f64) {
        let config = self.options.animations.tile_settle;
        if let Some(tile) = self.pool.get_mut(tile) {
            tile.animate_translation_x(0., config);
            tile.animate_translation_y(0., velocity, config);
            tile.animate_alpha(1., config);
        }
    }

    /// Puts a picked-up tile back on its own page.
    fn drop_in_place(&mut self, tile: TileId) {
        if let Some(page) = self.page_of_tile(tile) {
            self.slots[page].occupied = true;
        }
        let config = self.options.animations.tile_settle;
        if let Some(tile) = self.pool.get_mut(tile) {
            tile.set_z_bump(false);
            tile.animate_translation_x(0., config);
        }
    }

    fn end_reorder(&mut self, offset: f64) {
        let Some(drag) = self.reorder.take() else {
            return;
        };
        let Some(from) = self.page_of_tile(drag.tile) else {
            warn!("reordered tile {} vanished", drag.tile);
            return;
        };
        if self.pending_dismiss.is_some() {
            self.drop_in_place(drag.tile);
            return;
        }

        let layout = *self.container.layout();
        let count = self.slots.len();
        let shift = (offset * layout.sign() / layout.stride()).round() as isize;
        let to = (from as isize + shift).clamp(0, count as isize - 1) as usize;
        if to == from {
            self.drop_in_place(drag.tile);
            return;
        }

        if let Err(err) = self.model.move_task(from, to) {
            warn!("error moving task from {from} to {to}: {err}");
            self.drop_in_place(drag.tile);
            return;
        }
        let old_order: Vec<TileId> = self.slots.iter().map(|slot| slot.tile).collect();
        let slot = self.slots.remove(from);
        self.slots.insert(to, slot);

        let settle = self.options.animations.tile_settle;
        let shift_config = self.options.animations.dismiss_shift;
        for (new_page, slot) in self.slots.iter_mut().enumerate() {
            slot.occupied = true;
            let Some(old_page) = old_order.iter().position(|&tile| tile == slot.tile) else {
                continue;
            };
            let Some(tile) = self.pool.get_mut(slot.tile) else {
                continue;
            };

            // Keep the tile where it is on screen, then let it slide into its new page.
            let delta = layout.page_scroll(old_page) - layout.page_scroll(new_page);
            if delta != 0. {
                tile.set_translation_x(tile.translation_x() + delta);
            }

            if slot.tile == drag.tile {
                tile.set_z_bump(false);
                tile.animate_translation_x(0., settle);
            } else if delta != 0. {
                tile.animate_translation_x(0., shift_config);
            }
        }

        let task = self.model.tasks()[to].id;
        debug!("moved task {task} from page {from} to {to}");
        self.events.push(RecentsEvent::TaskReordered { task, to });
        self.update_visibility();
    }
}
