//! The task overview.
//!
//! [`RecentsView`] owns every piece of overview state: the tile pool, the task model, the paged
//! container and the gesture, dismiss and state machinery driving them. It is single-threaded;
//! anything arriving from other threads comes in through the [`TaskEvent`] channel and is applied
//! in [`RecentsView::dispatch_task_events`].
//!
//! The implementation is split by concern, each file adding an `impl RecentsView` block:
//!
//! - `reconcile.rs` applies fresh task lists,
//! - `dismiss.rs` removes a tile and closes the gap,
//! - `gesture.rs` turns touch and key input into scrolling and actions,
//! - `live_tile.rs` mirrors the running app's surface while a gesture is in progress.

use std::fmt::Write as _;
use std::time::Duration;

use glam::DVec2;
use recents_config::Config;

use self::animated_value::AnimatedValue;
use self::dismiss::PendingDismiss;
use self::gesture::{ReorderDrag, TileSwipe};
use self::live_tile::LiveTile;
use self::paged::{FlingParams, PageLayout, PagedContainer};
use self::pool::{TaskViewPool, TileId};
use self::state::{
    EndAction, LauncherState, StateAnimationController, StateTransitionCoordinator, StateVisuals,
    TransitionOutcome,
};
use self::tile::TaskTile;
use self::visibility::{compute_visible_range, VisibilityListener, VisibilityTracker};
use crate::animation::Clock;
use crate::error::RecentsError;
use crate::host::{Collaborators, IconProvider, TaskEvent};
use crate::input::{GestureConfig, GestureRecognizer};
use crate::task::{IconHandle, TaskId, TaskList, TaskRecord};

pub mod animated_value;
pub mod dismiss;
pub mod gesture;
pub mod live_tile;
pub mod paged;
pub mod pool;
pub mod reconcile;
pub mod state;
pub mod tile;
pub mod visibility;

#[cfg(test)]
mod tests;

/// Runtime options with density applied.
#[derive(Debug, Clone, PartialEq)]
pub struct Options {
    pub max_task_count: usize,
    pub preload_pages: usize,
    pub task_size_fraction: f64,
    /// Gap between pages in pixels.
    pub gap: f64,
    pub rtl: bool,
    /// Touch slop in pixels.
    pub touch_slop: f64,
    pub long_press: Duration,
    /// Velocities in pixels per second.
    pub fling: FlingParams,
    pub dismiss_fraction: f64,
    pub animations: recents_config::Animations,
}

impl Default for Options {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl Options {
    pub fn from_config(config: &Config) -> Self {
        let density = config.layout.density.0;
        let gestures = &config.gestures;

        Self {
            max_task_count: config.recents.max_task_count.get(),
            preload_pages: usize::from(config.recents.preload_pages),
            task_size_fraction: config.layout.task_size_fraction.0,
            gap: config.layout.gap.0 * density,
            rtl: config.layout.right_to_left,
            touch_slop: gestures.touch_slop.0 * density,
            long_press: Duration::from_millis(u64::from(gestures.long_press_ms)),
            fling: FlingParams {
                min_fling_velocity: gestures.min_fling_velocity.0 * density,
                fling_threshold_velocity: gestures.fling_threshold_velocity.0 * density,
                significant_move: gestures.significant_move_fraction.0,
                return_to_original: gestures.return_to_original_fraction.0,
            },
            dismiss_fraction: gestures.dismiss_fraction.0,
            animations: config.animations,
        }
    }

    fn gesture_config(&self) -> GestureConfig {
        GestureConfig {
            touch_slop: self.touch_slop,
            long_press: self.long_press,
        }
    }

    fn page_layout(&self, viewport: DVec2) -> PageLayout {
        PageLayout::new(viewport, self.task_size_fraction, self.gap, self.rtl)
    }
}

/// Notifications for the host shell.
#[derive(Debug, Clone, PartialEq)]
pub enum RecentsEvent {
    ReturnHome,
    LaunchTask(TaskId),
    TaskDismissed { task: TaskId, removed: bool },
    DismissCancelled(TaskId),
    TaskReordered { task: TaskId, to: usize },
    StateChanged(LauncherState),
    PageChanged(usize),
}

/// One page of the strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Slot {
    tile: TileId,
    /// Cleared while the tile is picked up for a dismiss or a reorder.
    occupied: bool,
}

pub struct RecentsView {
    clock: Clock,
    options: Options,
    pool: TaskViewPool<TaskTile>,
    model: TaskList,
    /// Pages in order; always parallel to `model`.
    slots: Vec<Slot>,
    container: PagedContainer,
    visibility: VisibilityTracker,
    recognizer: GestureRecognizer,
    coordinator: StateTransitionCoordinator,
    pending_dismiss: Option<PendingDismiss>,
    /// Latest snapshot that arrived while a structural change was in flight.
    deferred_snapshot: Option<Vec<TaskRecord>>,
    swipe: Option<TileSwipe>,
    reorder: Option<ReorderDrag>,
    live_tile: Option<LiveTile>,
    running_task: Option<TaskId>,
    collaborators: Collaborators,
    events: Vec<RecentsEvent>,
    task_events_tx: async_channel::Sender<TaskEvent>,
    task_events_rx: async_channel::Receiver<TaskEvent>,
    listening: bool,
    needs_reload: bool,
    empty_message_alpha: AnimatedValue,
}

/// Loads and unloads tile data as tiles scroll in and out of view.
struct DataLoader<'a> {
    pool: &'a mut TaskViewPool<TaskTile>,
    model: &'a mut TaskList,
    icons: &'a mut dyn IconProvider,
}

impl VisibilityListener for DataLoader<'_> {
    fn on_visibility_gained(&mut self, page: usize, tile: TileId, task: TaskId) {
        let Some(tile) = self.pool.get_mut(tile) else {
            warn!("tile for task {task} vanished before loading");
            return;
        };
        tile.set_data_loaded(true);

        let Some(record) = self.model.get(page).filter(|record| record.id == task) else {
            warn!("task {task} is not at page {page}");
            return;
        };
        let cached = record.icon.clone();
        let component = record.icon_component().clone();
        let user = record.user;

        let icon = match cached {
            Some(icon) => icon,
            None => match self.icons.icon_for(&component, user) {
                Ok(icon) => {
                    if let Err(err) = self.model.set_icon(task, icon.clone()) {
                        trace!("not caching icon: {err}");
                    }
                    icon
                }
                Err(err) => {
                    warn!("error loading icon for task {task}: {err:?}");
                    IconHandle::Placeholder
                }
            },
        };
        tile.set_icon(Some(icon));
    }

    fn on_visibility_lost(&mut self, _page: usize, tile: TileId, task: TaskId) {
        match self.pool.get_mut(tile) {
            Some(tile) => tile.set_data_loaded(false),
            None => trace!("tile for task {task} already released"),
        }
    }
}

impl RecentsView {
    pub fn new(
        clock: Clock,
        config: &Config,
        viewport: DVec2,
        collaborators: Collaborators,
    ) -> Self {
        let options = Options::from_config(config);
        let mut clock = clock;
        apply_clock_options(&mut clock, &options);

        let (task_events_tx, task_events_rx) = async_channel::unbounded();

        Self {
            pool: TaskViewPool::new(options.max_task_count),
            model: TaskList::new(),
            slots: Vec::new(),
            container: PagedContainer::new(options.page_layout(viewport), clock.clone()),
            visibility: VisibilityTracker::new(),
            recognizer: GestureRecognizer::new(options.gesture_config()),
            coordinator: StateTransitionCoordinator::new(
                LauncherState::Normal,
                clock.clone(),
                options.animations.state_transition,
            ),
            pending_dismiss: None,
            deferred_snapshot: None,
            swipe: None,
            reorder: None,
            live_tile: None,
            running_task: None,
            collaborators,
            events: Vec::new(),
            task_events_tx,
            task_events_rx,
            listening: false,
            needs_reload: false,
            empty_message_alpha: AnimatedValue::new(0.),
            options,
            clock,
        }
    }

    pub fn update_config(&mut self, config: &Config) {
        let options = Options::from_config(config);
        if options == self.options {
            return;
        }

        apply_clock_options(&mut self.clock, &options);
        self.recognizer.update_config(options.gesture_config());
        self.coordinator
            .set_config(options.animations.state_transition);
        let viewport = self.container.layout().viewport;
        self.container.set_layout(options.page_layout(viewport));

        let rebuild = options.max_task_count != self.options.max_task_count;
        if rebuild {
            debug!(
                "max task count changed to {}, rebuilding the strip",
                options.max_task_count
            );
            self.cancel_structural_changes();
            self.release_all_tiles();
            self.pool = TaskViewPool::new(options.max_task_count);
            self.needs_reload = self.listening;
        }

        self.options = options;

        if rebuild {
            let tasks = match self.deferred_snapshot.take() {
                Some(tasks) => tasks,
                None => self.model.tasks().to_vec(),
            };
            // Slots are empty now, so every task gets a fresh tile.
            self.apply_snapshot(tasks);
        }
        self.update_visibility();
    }

    pub fn set_viewport(&mut self, viewport: DVec2) {
        self.container.set_layout(self.options.page_layout(viewport));
        self.update_visibility();
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn state(&self) -> LauncherState {
        self.coordinator.state()
    }

    pub fn state_visuals(&self) -> StateVisuals {
        self.coordinator.visuals()
    }

    pub fn container(&self) -> &PagedContainer {
        &self.container
    }

    pub fn current_page(&self) -> usize {
        self.container.current_index()
    }

    pub fn task_count(&self) -> usize {
        self.model.len()
    }

    pub fn generation(&self) -> u64 {
        self.model.generation()
    }

    pub fn running_task(&self) -> Option<TaskId> {
        self.running_task
    }

    pub fn empty_message_alpha(&self) -> f64 {
        self.empty_message_alpha.current()
    }

    pub fn tile_id_at(&self, page: usize) -> Option<TileId> {
        self.slots.get(page).map(|slot| slot.tile)
    }

    pub fn tile(&self, id: TileId) -> Option<&TaskTile> {
        self.pool.get(id)
    }

    pub fn tile_at(&self, page: usize) -> Option<&TaskTile> {
        self.tile_id_at(page).and_then(|id| self.pool.get(id))
    }

    /// Whether the page is holding its tile, as opposed to the tile being picked up.
    pub fn is_page_occupied(&self, page: usize) -> bool {
        self.slots.get(page).is_some_and(|slot| slot.occupied)
    }

    /// Bound tiles in page order.
    pub fn tiles(&self) -> impl Iterator<Item = (usize, &TaskTile)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(page, slot)| self.pool.get(slot.tile).map(|tile| (page, tile)))
    }

    pub fn task_ids(&self) -> Vec<TaskId> {
        self.model.tasks().iter().map(|task| task.id).collect()
    }

    /// Looks up the task at `index` as seen by a caller holding `generation`.
    ///
    /// A stale generation schedules a reload from the task source.
    pub fn task_at(&mut self, index: usize, generation: u64) -> Result<&TaskRecord, RecentsError> {
        let result = self.model.task_at(index, generation);
        if let Err(err) = &result {
            warn!("task lookup failed: {err}");
            if matches!(err, RecentsError::StaleGeneration { .. }) {
                self.needs_reload = true;
            }
        }
        result
    }

    pub fn take_events(&mut self) -> Vec<RecentsEvent> {
        std::mem::take(&mut self.events)
    }

    /// Whether anything is still moving and the host should keep ticking.
    pub fn are_animations_ongoing(&self) -> bool {
        !self.container.is_settled()
            || self.pending_dismiss.is_some()
            || self.coordinator.is_in_transition()
            || self.empty_message_alpha.is_animation_ongoing()
            || self.pool.iter().any(|(_, tile)| tile.are_animations_ongoing())
    }

    /// Drains the task event channel on the owner thread.
    pub fn dispatch_task_events(&mut self) {
        let _span = tracy_client::span!("RecentsView::dispatch_task_events");

        while let Ok(event) = self.task_events_rx.try_recv() {
            if !self.listening {
                trace!("dropping {event:?} while not listening");
                continue;
            }

            match event {
                TaskEvent::TaskStackChanged => self.needs_reload = true,
                TaskEvent::TaskRemoved(task) => {
                    if let Some(snapshot) = &mut self.deferred_snapshot {
                        snapshot.retain(|record| record.id != task);
                    } else if self.model.contains(task) {
                        let tasks = self
                            .model
                            .tasks()
                            .iter()
                            .filter(|record| record.id != task)
                            .cloned()
                            .collect();
                        self.apply_snapshot(tasks);
                    }
                }
                TaskEvent::IconLoaded { task, icon } => self.on_icon_loaded(task, icon),
            }
        }

        if self.needs_reload && self.listening {
            self.reload_tasks();
        }
    }

    /// Fetches the running tasks from the task source and applies them.
    pub fn reload_tasks(&mut self) {
        self.needs_reload = false;

        let raw = self
            .collaborators
            .task_source
            .list_running_tasks(self.options.max_task_count);
        let tasks = raw
            .into_iter()
            .map(|raw| {
                let mut record = TaskRecord::from(raw);
                if let Some(known) = self.model.index_of(record.id) {
                    record.icon = self.model.tasks()[known].icon.clone();
                }
                record
            })
            .collect();

        self.apply_snapshot(tasks);
    }

    pub fn go_to_state(
        &mut self,
        target: LauncherState,
        animate: bool,
        on_complete: Option<EndAction>,
    ) {
        let _span = tracy_client::span!("RecentsView::go_to_state");

        self.on_state_transition_start(target);
        if let Some(outcome) = self.coordinator.go_to_state(target, animate, on_complete) {
            self.on_state_transition_end(outcome);
        }
    }

    /// Creates a transition to `target` for the host to scrub, e.g. from a swipe.
    pub fn create_state_controller(&mut self, target: LauncherState) -> StateAnimationController {
        self.on_state_transition_start(target);
        self.coordinator.create_controller(target)
    }

    pub fn advance_animations(&mut self) {
        let _span = tracy_client::span!("RecentsView::advance_animations");

        if let Some(page) = self.container.advance_animations() {
            self.events.push(RecentsEvent::PageChanged(page));
        }
        self.recognizer.advance(self.container.is_settled());
        if let Some(intent) = self.recognizer.check_long_press(self.clock.now_unadjusted()) {
            self.apply_intent(intent);
        }

        for (_, tile) in self.pool.iter_mut() {
            tile.advance_animations();
        }

        self.advance_dismiss();

        if let Some(outcome) = self.coordinator.advance_animations() {
            self.on_state_transition_end(outcome);
        }
        let progress = self.coordinator.transition_fraction().unwrap_or(1.);
        self.container.set_transition_progress(progress);

        self.empty_message_alpha.advance();

        if !self.is_structurally_busy() {
            if let Some(tasks) = self.deferred_snapshot.take() {
                debug!("applying deferred snapshot");
                self.apply_snapshot(tasks);
            }
        }

        self.update_live_tile();
        self.update_visibility();
    }

    fn on_state_transition_start(&mut self, target: LauncherState) {
        if target.is_overview_ui() && !self.listening {
            debug!("entering {target}, listening for task changes");
            self.listening = true;
            self.collaborators
                .task_source
                .subscribe(self.task_events_tx.clone());
            self.reload_tasks();
        }

        if target.disables_interaction() {
            for intent in self.recognizer.reset() {
                self.apply_intent(intent);
            }
        }
    }

    fn on_state_transition_end(&mut self, outcome: TransitionOutcome) {
        match outcome {
            TransitionOutcome::Completed { from, to } => {
                if to.resets_overview() {
                    self.reset();
                } else if to.is_overview_ui() {
                    let config = self.options.animations.icon_scale;
                    for (_, tile) in self.pool.iter_mut() {
                        tile.animate_icon_scale(1., config);
                    }
                }

                if from != to {
                    self.events.push(RecentsEvent::StateChanged(to));
                }
                self.update_visibility();
            }
            TransitionOutcome::Reverted(state) => {
                trace!("transition reverted, staying in {state}");
            }
        }
    }

    /// Tears the overview down after leaving it.
    pub fn reset(&mut self) {
        let _span = tracy_client::span!("RecentsView::reset");
        debug!("resetting overview");

        self.cancel_structural_changes();
        self.live_tile = None;
        self.running_task = None;
        self.release_all_tiles();
        self.model.replace(Vec::new());
        self.container.jump_to_page(0);
        self.deferred_snapshot = None;
        self.needs_reload = false;
        self.empty_message_alpha = AnimatedValue::new(0.);

        if self.listening {
            self.listening = false;
            self.collaborators.task_source.unsubscribe();
        }
        self.collaborators.surfaces.on_overview_reset();
    }

    fn cancel_structural_changes(&mut self) {
        for intent in self.recognizer.reset() {
            self.apply_intent(intent);
        }
        if self.pending_dismiss.is_some() {
            self.finish_dismiss(false);
        }
        self.swipe = None;
        self.reorder = None;
    }

    fn release_all_tiles(&mut self) {
        for slot in self.slots.drain(..) {
            self.pool.release(slot.tile);
        }
        self.visibility.clear();
    }

    fn on_icon_loaded(&mut self, task: TaskId, icon: IconHandle) {
        if let Err(err) = self.model.set_icon(task, icon.clone()) {
            trace!("dropping loaded icon: {err}");
            return;
        }

        if let Some(page) = self.page_of_task(task) {
            if let Some(tile) = self.tile_mut(page) {
                if tile.is_data_loaded() {
                    tile.set_icon(Some(icon));
                }
            }
        }
    }

    fn is_overview_active(&self) -> bool {
        self.coordinator.state().is_overview_ui()
            || self
                .coordinator
                .target_state()
                .is_some_and(LauncherState::is_overview_ui)
    }

    /// A structural change is in flight, so the page list must not change under it.
    fn is_structurally_busy(&self) -> bool {
        self.pending_dismiss.is_some()
            || self.reorder.is_some()
            || self.swipe.is_some()
            || self.container.is_dragging()
    }

    fn page_of_tile(&self, tile: TileId) -> Option<usize> {
        self.slots.iter().position(|slot| slot.tile == tile)
    }

    fn page_of_task(&self, task: TaskId) -> Option<usize> {
        self.model.index_of(task)
    }

    fn tile_mut(&mut self, page: usize) -> Option<&mut TaskTile> {
        let id = self.slots.get(page)?.tile;
        self.pool.get_mut(id)
    }

    fn snap_animation(&self) -> recents_config::Animation {
        self.options.animations.page_snap
    }

    /// Puts every tile back to its resting look, except the running one.
    fn reset_task_visuals(&mut self) {
        for slot in &mut self.slots {
            slot.occupied = true;
            let Some(tile) = self.pool.get_mut(slot.tile) else {
                continue;
            };
            if tile.is_running_pinned() {
                continue;
            }
            tile.reset_visuals();
        }
    }

    fn update_visibility(&mut self) {
        let count = self.slots.len();
        let range = if self.is_overview_active() {
            compute_visible_range(
                self.container.layout(),
                self.container.scroll(),
                count,
                self.options.preload_pages,
            )
        } else {
            None
        };

        let tiles: Vec<(TileId, TaskId)> = self
            .slots
            .iter()
            .zip(self.model.tasks())
            .map(|(slot, record)| (slot.tile, record.id))
            .collect();
        let excluded = self.live_tile.as_ref().map(LiveTile::task);

        let mut loader = DataLoader {
            pool: &mut self.pool,
            model: &mut self.model,
            icons: self.collaborators.icons.as_mut(),
        };
        self.visibility.reconcile(&tiles, range, excluded, &mut loader);
    }

    fn update_empty_message(&mut self) {
        let target = if self.model.is_empty() && self.is_overview_active() {
            1.
        } else {
            0.
        };
        if self.empty_message_alpha.target() == target {
            return;
        }

        self.empty_message_alpha.animate_to(
            self.clock.clone(),
            target,
            0.,
            self.options.animations.empty_message,
        );
    }

    /// Human-readable dump of the strip, one line per page.
    pub fn describe(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "state={} page={} generation={} scroll={:.1}",
            self.coordinator.state(),
            self.container.current_index(),
            self.model.generation(),
            self.container.scroll(),
        );
        for (page, slot) in self.slots.iter().enumerate() {
            let _ = write!(out, "{page}: ");
            match self.pool.get(slot.tile) {
                Some(tile) => {
                    let _ = write!(out, "{tile}");
                }
                None => {
                    let _ = write!(out, "<stale tile {}>", slot.tile);
                }
            }
            if !slot.occupied {
                let _ = write!(out, " [picked up]");
            }
            out.push('\n');
        }
        out
    }

    #[cfg(test)]
    pub fn verify_invariants(&self) {
        use std::collections::HashSet;

        let live = self.pool.live_count();
        assert!(live <= self.options.max_task_count, "pool over capacity");
        assert_eq!(live, self.slots.len(), "every live tile must be on a page");
        assert_eq!(
            self.slots.len(),
            self.model.len(),
            "pages must match the model"
        );

        let mut seen = HashSet::new();
        let mut pinned = 0;
        for (slot, record) in self.slots.iter().zip(self.model.tasks()) {
            let tile = self.pool.get(slot.tile).expect("slot tile must be live");
            assert_eq!(tile.task(), Some(record.id), "tile bound to the wrong task");
            assert!(seen.insert(record.id), "task {} bound twice", record.id);

            if tile.is_running_pinned() {
                pinned += 1;
                assert_eq!(Some(record.id), self.running_task);
            }
        }
        assert!(pinned <= 1, "more than one pinned tile");

        if self.slots.is_empty() {
            assert_eq!(self.container.current_index(), 0);
        } else {
            assert!(self.container.current_index() < self.slots.len());
        }

        if let Some(pending) = &self.pending_dismiss {
            assert!(self.page_of_tile(pending.tile()).is_some());
        }

        let at_rest =
            !self.are_animations_ongoing() && self.reorder.is_none() && self.swipe.is_none();
        if at_rest {
            for slot in self.slots.iter().filter(|slot| slot.occupied) {
                let Some(tile) = self.pool.get(slot.tile) else {
                    continue;
                };
                assert_eq!(
                    tile.translation_x(),
                    0.,
                    "{tile} left off its page at rest"
                );
            }
        }
    }
}

fn apply_clock_options(clock: &mut Clock, options: &Options) {
    let slowdown = options.animations.slowdown;
    clock.set_rate(if slowdown > 0. { 1. / slowdown } else { 1. });
    clock.set_complete_instantly(options.animations.off);
}
