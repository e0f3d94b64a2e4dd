//! Applying fresh task lists to the strip.

use std::collections::{HashMap, HashSet};

use super::tile::TaskTile;
use super::{RecentsEvent, RecentsView, Slot};
use crate::task::{TaskId, TaskRecord};

impl RecentsView {
    /// Replaces the shown tasks with `tasks`, in page order.
    pub fn set_dataset(&mut self, tasks: Vec<TaskRecord>) {
        self.apply_snapshot(tasks);
    }

    /// Brings the strip in line with `tasks`.
    ///
    /// Tiles are matched to tasks by id, so a task that stays keeps its tile and whatever that
    /// tile is doing. While a structural change is in flight the snapshot is parked and the
    /// latest one is applied once the change finishes.
    pub(super) fn apply_snapshot(&mut self, mut tasks: Vec<TaskRecord>) {
        let _span = tracy_client::span!("RecentsView::apply_snapshot");

        if self.is_structurally_busy() {
            debug!("structural change in flight, deferring snapshot");
            self.deferred_snapshot = Some(tasks);
            return;
        }

        let mut seen = HashSet::new();
        tasks.retain(|task| {
            let first = seen.insert(task.id);
            if !first {
                warn!("dropping duplicate task {} from snapshot", task.id);
            }
            first
        });

        let max = self.options.max_task_count;
        if tasks.len() > max {
            debug!("snapshot has {} tasks, keeping the last {max}", tasks.len());
            tasks.drain(..tasks.len() - max);
        }

        if tasks.is_empty() {
            self.apply_empty_snapshot();
            return;
        }

        let old: HashMap<TaskId, Slot> = self
            .slots
            .iter()
            .zip(self.model.tasks())
            .map(|(slot, record)| (record.id, *slot))
            .collect();
        let kept = tasks.iter().filter(|task| old.contains_key(&task.id)).count();
        let needed = tasks.len() - kept;
        let freed = self.slots.len() - kept;
        if needed > self.pool.available() + freed {
            error!(
                "snapshot needs {needed} new tiles but only {} are available, keeping the old one",
                self.pool.available() + freed
            );
            return;
        }

        let current_task = self
            .model
            .get(self.container.current_index())
            .map(|record| record.id);

        // Release first so that new tasks can reuse those tiles.
        let new_ids: HashSet<TaskId> = tasks.iter().map(|task| task.id).collect();
        for (slot, record) in self.slots.iter().zip(self.model.tasks()) {
            if !new_ids.contains(&record.id) {
                trace!("releasing tile of task {}", record.id);
                self.pool.release(slot.tile);
            }
        }

        let mut slots = Vec::with_capacity(tasks.len());
        for task in &tasks {
            let tile = match old.get(&task.id) {
                Some(slot) => slot.tile,
                None => {
                    let clock = self.clock.clone();
                    match self.pool.acquire(|| TaskTile::new(clock)) {
                        Ok(tile) => tile,
                        Err(err) => {
                            // The feasibility check above rules this out.
                            error!("error acquiring tile for task {}: {err}", task.id);
                            continue;
                        }
                    }
                }
            };

            if let Some(tile) = self.pool.get_mut(tile) {
                tile.bind(task.id);
                tile.set_running_pinned(Some(task.id) == self.running_task);
            }
            slots.push(Slot {
                tile,
                occupied: true,
            });
        }

        if slots.len() != tasks.len() {
            let bound: HashSet<TaskId> = slots
                .iter()
                .filter_map(|slot| self.pool.get(slot.tile).and_then(TaskTile::task))
                .collect();
            tasks.retain(|task| bound.contains(&task.id));
        }

        self.slots = slots;
        let generation = self.model.replace(tasks);
        trace!("applied snapshot, generation {generation}");

        let page = current_task
            .and_then(|task| self.page_of_task(task))
            .unwrap_or(self.container.current_index())
            .min(self.slots.len().saturating_sub(1));
        if page != self.container.current_index() {
            self.container.jump_to_page(page);
        } else {
            self.container.clamp_to_count(self.slots.len());
        }

        self.reset_task_visuals();
        self.update_visibility();
        self.update_empty_message();
    }

    fn apply_empty_snapshot(&mut self) {
        let was_empty = self.model.is_empty();

        self.release_all_tiles();
        self.model.replace(Vec::new());
        self.container.jump_to_page(0);

        if !was_empty {
            debug!("no tasks left, returning home");
            self.events.push(RecentsEvent::ReturnHome);
        }
        self.update_empty_message();
    }
}
