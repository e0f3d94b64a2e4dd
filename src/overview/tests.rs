use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use approx::assert_abs_diff_eq;
use glam::DVec2;
use proptest::prelude::*;
use proptest_derive::Arbitrary;

use super::tile::Visibility;
use super::*;
use crate::geometry::Rect;
use crate::host::testing::{collaborators, raw_task, SharedLog};
use crate::input::{Key, KeyEvent, Modifiers, Pointer, TouchAction, TouchEvent};
use crate::task::test_task;

const VIEWPORT: DVec2 = DVec2::new(1000., 2000.);
// Default layout: 700 x 1400 tiles, 24 px gap.
const STRIDE: f64 = 724.;

struct Harness {
    view: RecentsView,
    log: SharedLog,
    clock: Clock,
    now: Duration,
}

impl Harness {
    fn new() -> Self {
        Self::with_config(&Config::default())
    }

    fn with_config(config: &Config) -> Self {
        let clock = Clock::with_time(Duration::ZERO);
        let (collaborators, log) = collaborators();
        let mut view = RecentsView::new(clock.clone(), config, VIEWPORT, collaborators);
        view.go_to_state(LauncherState::Overview, false, None);
        view.take_events();

        Self {
            view,
            log,
            clock,
            now: Duration::ZERO,
        }
    }

    fn with_tasks(ids: &[i32]) -> Self {
        let mut h = Self::new();
        h.set_tasks(ids);
        h
    }

    fn set_tasks(&mut self, ids: &[i32]) {
        let tasks = ids.iter().map(|&id| test_task(id)).collect();
        self.view.set_dataset(tasks);
    }

    fn ids(&self) -> Vec<i32> {
        self.view.task_ids().into_iter().map(|task| task.0).collect()
    }

    fn advance(&mut self, ms: u64) {
        self.now += Duration::from_millis(ms);
        self.clock.set_unadjusted(self.now);
        self.view.advance_animations();
    }

    fn settle(&mut self) {
        self.advance(3000);
    }

    fn touch(&mut self, action: TouchAction, pos: DVec2) -> bool {
        let event = TouchEvent::new(action, self.now, &[Pointer { id: 0, pos }]);
        self.view.handle_touch(&event)
    }

    /// Presses at `from`, moves to `to` in `steps` moves 10 ms apart, then releases.
    fn drag(&mut self, from: DVec2, to: DVec2, steps: u32) {
        self.touch(TouchAction::Down, from);
        for step in 1..=steps {
            self.now += Duration::from_millis(10);
            self.clock.set_unadjusted(self.now);
            let pos = from.lerp(to, f64::from(step) / f64::from(steps));
            self.touch(TouchAction::Move, pos);
        }
        self.touch(TouchAction::Up, to);
    }

    fn tap(&mut self, pos: DVec2) {
        self.touch(TouchAction::Down, pos);
        self.touch(TouchAction::Up, pos);
    }

    fn key(&mut self, key: Key) -> bool {
        self.view.dispatch_key_event(KeyEvent::new(key))
    }

    fn events(&mut self) -> Vec<RecentsEvent> {
        self.view.take_events()
    }
}

fn center() -> DVec2 {
    VIEWPORT / 2.
}

#[test]
fn empty_overview() {
    let h = Harness::new();
    assert_eq!(h.view.task_count(), 0);
    assert_eq!(h.view.state(), LauncherState::Overview);
    assert!(h.log.borrow().subscribed.is_some());
    assert_eq!(h.log.borrow().list_calls, 1);
    h.view.verify_invariants();
}

#[test]
fn dataset_binds_visible_tiles() {
    let h = Harness::with_tasks(&[1, 2, 3]);
    h.view.verify_invariants();
    insta::assert_snapshot!(h.view.describe().trim_end(), @r"
    state=overview page=0 generation=2 scroll=0.0
    0: task 1 [loaded] alpha=1.00 tx=0.0 ty=0.0
    1: task 2 [loaded] alpha=1.00 tx=0.0 ty=0.0
    2: task 3 [loaded] alpha=1.00 tx=0.0 ty=0.0
    ");

    let tile = h.view.tile_at(1).unwrap();
    assert_eq!(
        tile.icon(),
        Some(&IconHandle::Loaded("com.example.app2".into()))
    );
}

#[test]
fn only_nearby_pages_load_data() {
    let h = Harness::with_tasks(&[1, 2, 3, 4, 5, 6]);
    let loaded: Vec<bool> = h.view.tiles().map(|(_, t)| t.is_data_loaded()).collect();
    // Pages 0 and 1 are on screen, page 2 is preloaded.
    assert_eq!(loaded, [true, true, true, false, false, false]);
}

#[test]
fn failing_icon_shows_placeholder() {
    let mut h = Harness::new();
    h.log
        .borrow_mut()
        .failing_icons
        .push(String::from("com.example.app2"));
    h.set_tasks(&[1, 2]);

    assert_eq!(
        h.view.tile_at(1).unwrap().icon(),
        Some(&IconHandle::Placeholder)
    );
    assert!(h.view.tile_at(1).unwrap().is_data_loaded());
}

#[test]
fn snapshot_keeps_most_recent_tasks() {
    let mut config = Config::default();
    config.recents.max_task_count = recents_config::TaskCount(3);
    let mut h = Harness::with_config(&config);
    h.set_tasks(&[1, 2, 3, 4, 5]);
    assert_eq!(h.ids(), [3, 4, 5]);
    h.view.verify_invariants();
}

#[test]
fn lowering_max_task_count_rebuilds_the_strip() {
    let mut h = Harness::with_tasks(&[1, 2, 3]);
    h.view.container.jump_to_page(2);

    let mut config = Config::default();
    config.recents.max_task_count = recents_config::TaskCount(2);
    h.view.update_config(&config);

    assert_eq!(h.ids(), [2, 3]);
    assert_eq!(h.view.tiles().count(), 2);
    assert_eq!(h.view.current_page(), 1);
    h.view.verify_invariants();

    config.recents.max_task_count = recents_config::TaskCount(4);
    h.view.update_config(&config);
    assert_eq!(h.ids(), [2, 3]);
    h.view.verify_invariants();
}

#[test]
fn duplicate_ids_are_dropped() {
    let h = Harness::with_tasks(&[1, 2, 1, 3]);
    assert_eq!(h.ids(), [1, 2, 3]);
    h.view.verify_invariants();
}

#[test]
fn reused_tiles_keep_their_binding() {
    let mut h = Harness::with_tasks(&[1, 2, 3]);
    let tile3 = h.view.tile_id_at(2).unwrap();

    h.set_tasks(&[3, 4]);
    assert_eq!(h.view.tile_id_at(0), Some(tile3));
    assert_eq!(h.view.tile_at(1).unwrap().task(), Some(TaskId(4)));
    h.view.verify_invariants();
}

#[test]
fn current_task_stays_current() {
    let mut h = Harness::with_tasks(&[1, 2, 3]);
    h.view.container.jump_to_page(1);

    h.set_tasks(&[0, 1, 2, 3]);
    assert_eq!(h.view.current_page(), 2);
    assert_eq!(h.view.tile_at(2).unwrap().task(), Some(TaskId(2)));

    h.set_tasks(&[1]);
    assert_eq!(h.view.current_page(), 0);
}

#[test]
fn pinned_tile_survives_reconciliation() {
    let mut h = Harness::with_tasks(&[1, 2, 3]);
    h.view.on_gesture_animation_start(TaskId(2));
    h.view.on_gesture_animation_end();

    let tile1 = h.view.tile_id_at(0).unwrap();
    let tile2 = h.view.tile_id_at(1).unwrap();
    {
        let tile = h.view.pool.get_mut(tile2).unwrap();
        tile.set_alpha(0.37);
        tile.set_scale(0.8);
    }
    let alpha = h.view.tile(tile2).unwrap().alpha();
    let scale = h.view.tile(tile2).unwrap().scale();

    h.set_tasks(&[2, 3, 4]);

    let pinned = h.view.tile(tile2).unwrap();
    assert!(pinned.is_running_pinned());
    assert_eq!(pinned.alpha().to_bits(), alpha.to_bits());
    assert_eq!(pinned.scale().to_bits(), scale.to_bits());
    assert_eq!(h.view.tile_id_at(0), Some(tile2));

    assert!(h.view.tile(tile1).is_none());
    assert_eq!(h.view.tile_at(2).unwrap().task(), Some(TaskId(4)));
    h.view.verify_invariants();
}

#[test]
fn fling_advances_one_page() {
    let mut h = Harness::with_tasks(&[1, 2, 3, 4, 5]);
    h.view.container.jump_to_page(2);

    // 100 px to the left in 50 ms: 2000 px/s, not a significant move by distance.
    h.drag(DVec2::new(600., 1000.), DVec2::new(500., 1000.), 5);
    h.settle();

    assert_eq!(h.view.current_page(), 3);
    assert_eq!(h.events(), [RecentsEvent::PageChanged(3)]);
    assert_abs_diff_eq!(h.view.container().scroll(), 3. * STRIDE);
}

#[test]
fn slow_drag_snaps_back() {
    let mut h = Harness::with_tasks(&[1, 2, 3, 4, 5]);
    h.view.container.jump_to_page(2);

    // 100 px over 1 s.
    h.touch(TouchAction::Down, DVec2::new(600., 1000.));
    for step in 1..=10 {
        h.now += Duration::from_millis(100);
        h.clock.set_unadjusted(h.now);
        h.touch(
            TouchAction::Move,
            DVec2::new(600. - 10. * f64::from(step), 1000.),
        );
    }
    h.now += Duration::from_millis(200);
    h.touch(TouchAction::Up, DVec2::new(500., 1000.));
    h.settle();

    assert_eq!(h.view.current_page(), 2);
    assert!(h.events().is_empty());
}

#[test]
fn tap_launches_and_outside_returns_home() {
    let mut h = Harness::with_tasks(&[1, 2]);
    h.tap(center());
    assert_eq!(h.events(), [RecentsEvent::LaunchTask(TaskId(1))]);

    h.tap(DVec2::new(500., 100.));
    assert_eq!(h.events(), [RecentsEvent::ReturnHome]);
}

#[test]
fn swipe_up_dismisses() {
    let mut h = Harness::with_tasks(&[1, 2]);
    h.drag(center(), DVec2::new(500., 200.), 8);
    h.advance(400);

    assert_eq!(h.ids(), [2]);
    assert_eq!(h.log.borrow().removed, [TaskId(1)]);
    assert_eq!(
        h.events(),
        [RecentsEvent::TaskDismissed {
            task: TaskId(1),
            removed: true
        }]
    );
    h.view.verify_invariants();
}

#[test]
fn short_swipe_settles_back() {
    let mut h = Harness::with_tasks(&[1, 2]);
    h.touch(TouchAction::Down, center());
    for step in 1..=4 {
        h.now += Duration::from_millis(100);
        h.clock.set_unadjusted(h.now);
        h.touch(TouchAction::Move, center() - DVec2::new(0., 50. * f64::from(step)));
    }
    h.now += Duration::from_millis(200);
    h.touch(TouchAction::Up, center() - DVec2::new(0., 200.));

    let tile = h.view.tile_at(0).unwrap();
    assert!(tile.alpha() < 1.);
    h.settle();

    let tile = h.view.tile_at(0).unwrap();
    assert_abs_diff_eq!(tile.translation_y(), 0.);
    assert_abs_diff_eq!(tile.alpha(), 1.);
    assert_eq!(h.ids(), [1, 2]);
    assert!(h.events().is_empty());
}

#[test]
fn long_press_reorders() {
    let mut h = Harness::with_tasks(&[1, 2, 3]);
    h.touch(TouchAction::Down, center());
    h.advance(500);
    assert!(!h.view.is_page_occupied(0));

    h.now += Duration::from_millis(10);
    h.touch(TouchAction::Move, center() + DVec2::new(STRIDE, 0.));
    h.touch(TouchAction::Up, center() + DVec2::new(STRIDE, 0.));

    assert_eq!(h.ids(), [2, 1, 3]);
    assert_eq!(
        h.events(),
        [RecentsEvent::TaskReordered {
            task: TaskId(1),
            to: 1
        }]
    );

    // Task 2 took the first page but is still drawn where it was.
    assert_abs_diff_eq!(h.view.tile_at(0).unwrap().translation_x(), STRIDE);
    assert_abs_diff_eq!(h.view.tile_at(1).unwrap().translation_x(), 0.);

    h.settle();
    assert_abs_diff_eq!(h.view.tile_at(0).unwrap().translation_x(), 0.);
    assert!(h.view.is_page_occupied(0));
    assert!(h.view.is_page_occupied(1));
    h.view.verify_invariants();
}

#[test]
fn touch_ignored_while_interaction_disabled() {
    let mut h = Harness::with_tasks(&[1, 2]);
    h.view
        .go_to_state(LauncherState::QuickSwitch, false, None);
    assert!(!h.touch(TouchAction::Down, center()));
    assert!(!h.key(Key::Tab));
}

#[test]
fn keyboard_navigation() {
    let mut h = Harness::with_tasks(&[1, 2, 3]);

    assert!(h.key(Key::Tab));
    h.settle();
    assert_eq!(h.view.current_page(), 1);

    assert!(h.view.dispatch_key_event(KeyEvent::with_modifiers(Key::Tab, Modifiers::SHIFT)));
    h.settle();
    assert_eq!(h.view.current_page(), 0);
    h.events();

    assert!(h.key(Key::Enter));
    assert!(h.key(Key::Escape));
    assert_eq!(
        h.events(),
        [
            RecentsEvent::LaunchTask(TaskId(1)),
            RecentsEvent::ReturnHome
        ]
    );

    assert!(!h.key(Key::Up));
}

#[test]
fn tab_at_the_end_without_cycling_is_unhandled() {
    let mut h = Harness::with_tasks(&[1, 2, 3]);
    h.view.container.jump_to_page(2);

    assert!(!h.key(Key::Tab));
    assert_eq!(h.view.current_page(), 2);
    assert_eq!(h.view.container().next_index(), None);

    let alt_tab = KeyEvent::with_modifiers(Key::Tab, Modifiers::ALT);
    assert!(h.view.dispatch_key_event(alt_tab));
    h.settle();
    assert_eq!(h.view.current_page(), 0);
}

#[test]
fn delete_key_dismisses_current() {
    let mut h = Harness::with_tasks(&[1, 2, 3]);
    assert!(h.key(Key::Delete));
    h.advance(400);
    assert_eq!(h.ids(), [2, 3]);
}

#[test]
fn dismiss_animation_frame() {
    let mut h = Harness::with_tasks(&[1, 2, 3]);
    let tile = h.view.tile_id_at(1).unwrap();
    assert!(h.view.dismiss_task(tile, true, true));

    h.advance(150);
    insta::assert_snapshot!(h.view.describe().trim_end(), @r"
    state=overview page=0 generation=2 scroll=0.0
    0: task 1 [loaded] alpha=1.00 tx=0.0 ty=0.0
    1: task 2 [loaded] alpha=0.00 tx=0.0 ty=-700.0 [picked up]
    2: task 3 [loaded] alpha=1.00 tx=-181.0 ty=0.0
    ");
}

#[test]
fn dismiss_closes_the_gap_without_jumping() {
    let mut h = Harness::with_tasks(&[1, 2, 3, 4]);
    h.view.container.jump_to_page(3);
    let scroll = h.view.container().scroll();
    let layout = *h.view.container().layout();
    let before = layout.tile_rect(2, scroll).left();

    // Dismissing the last page while on it pulls the previous ones along.
    let tile = h.view.tile_id_at(3).unwrap();
    h.view.dismiss_task(tile, true, true);
    h.advance(400);

    assert_eq!(h.view.current_page(), 2);
    let scroll = h.view.container().scroll();
    let tile = h.view.tile_at(2).unwrap();
    assert_abs_diff_eq!(tile.translation_x(), 0.);
    assert_abs_diff_eq!(
        layout.tile_rect(2, scroll).left(),
        before + STRIDE,
        epsilon = 1e-9
    );
    h.view.verify_invariants();
}

#[test]
fn dismissing_the_last_task_returns_home_once() {
    let mut h = Harness::with_tasks(&[1]);
    let tile = h.view.tile_id_at(0).unwrap();
    h.view.dismiss_task(tile, true, true);

    h.advance(400);
    h.settle();

    let events = h.events();
    let homes = events
        .iter()
        .filter(|event| **event == RecentsEvent::ReturnHome)
        .count();
    assert_eq!(homes, 1);
    assert_eq!(h.view.task_count(), 0);
    assert_eq!(h.log.borrow().removed, [TaskId(1)]);
    h.view.verify_invariants();
}

#[test]
fn dismiss_without_removal_keeps_the_system_task() {
    let mut h = Harness::with_tasks(&[1, 2]);
    let tile = h.view.tile_id_at(0).unwrap();
    h.view.dismiss_task(tile, false, false);
    assert_eq!(h.view.tile(tile).unwrap().visibility(), Visibility::Hidden);

    h.advance(400);
    assert_eq!(h.ids(), [2]);
    assert!(h.log.borrow().removed.is_empty());
}

#[test]
fn cancelled_dismiss_restores_tile() {
    let mut h = Harness::with_tasks(&[1, 2, 3]);
    let tile = h.view.tile_id_at(1).unwrap();
    h.view.dismiss_task(tile, true, false);
    h.advance(150);
    assert!(!h.view.is_page_occupied(1));

    h.view.cancel_dismiss();

    let restored = h.view.tile(tile).unwrap();
    assert_eq!(restored.visibility(), Visibility::Visible);
    assert!(!restored.z_bump());
    assert_abs_diff_eq!(restored.alpha(), 1.);
    assert!(h.view.is_page_occupied(1));
    assert_eq!(h.ids(), [1, 2, 3]);
    assert_eq!(h.events(), [RecentsEvent::DismissCancelled(TaskId(2))]);
    h.view.verify_invariants();
}

#[test]
fn dismiss_next_to_the_running_tile_closes_the_gap() {
    let mut h = Harness::with_tasks(&[1, 2, 3]);
    h.view.on_gesture_animation_start(TaskId(3));
    h.view.on_gesture_animation_end();
    h.view.container.jump_to_page(1);

    let tile = h.view.tile_id_at(1).unwrap();
    h.view.dismiss_task(tile, true, true);
    h.advance(400);
    h.settle();

    assert_eq!(h.ids(), [1, 3]);
    let running = h.view.tile_at(1).unwrap();
    assert!(running.is_running_pinned());
    assert_abs_diff_eq!(running.translation_x(), 0.);
    h.view.verify_invariants();
}

#[test]
fn cancelled_dismiss_restores_the_running_tile() {
    let mut h = Harness::with_tasks(&[1, 2, 3]);
    h.view.on_gesture_animation_start(TaskId(2));
    h.view.on_gesture_animation_end();

    let tile = h.view.tile_id_at(1).unwrap();
    h.view.dismiss_task(tile, true, false);
    h.advance(150);
    h.view.cancel_dismiss();
    h.settle();

    let restored = h.view.tile(tile).unwrap();
    assert!(restored.is_running_pinned());
    assert_eq!(restored.visibility(), Visibility::Visible);
    assert_abs_diff_eq!(restored.alpha(), 1.);
    assert_abs_diff_eq!(restored.translation_y(), 0.);
    assert_abs_diff_eq!(h.view.tile_at(2).unwrap().translation_x(), 0.);
    assert_eq!(h.ids(), [1, 2, 3]);
    h.view.verify_invariants();
}

#[test]
fn second_dismiss_cancels_the_first() {
    let mut h = Harness::with_tasks(&[1, 2, 3]);
    let first = h.view.tile_id_at(0).unwrap();
    let second = h.view.tile_id_at(1).unwrap();
    h.view.dismiss_task(first, true, true);
    h.advance(100);
    h.view.dismiss_task(second, true, true);
    h.advance(400);

    assert_eq!(h.ids(), [1, 3]);
    assert_eq!(
        h.events(),
        [
            RecentsEvent::DismissCancelled(TaskId(1)),
            RecentsEvent::TaskDismissed {
                task: TaskId(2),
                removed: true
            }
        ]
    );
}

#[test]
fn snapshot_during_dismiss_is_deferred() {
    let mut h = Harness::with_tasks(&[1, 2, 3]);
    let tile = h.view.tile_id_at(0).unwrap();
    h.view.dismiss_task(tile, true, true);

    // Still lists the task being removed.
    h.set_tasks(&[1, 2, 3, 4]);
    assert_eq!(h.ids(), [1, 2, 3]);

    h.advance(400);
    assert_eq!(h.ids(), [2, 3, 4]);
    h.view.verify_invariants();
}

#[test]
fn task_removed_while_a_snapshot_is_deferred() {
    let mut h = Harness::with_tasks(&[1, 2, 3]);
    let sender = h.log.borrow().subscribed.clone().unwrap();
    let tile = h.view.tile_id_at(0).unwrap();
    h.view.dismiss_task(tile, true, true);

    h.set_tasks(&[1, 2, 3, 4]);
    sender.try_send(TaskEvent::TaskRemoved(TaskId(3))).unwrap();
    h.view.dispatch_task_events();
    assert_eq!(h.ids(), [1, 2, 3]);

    h.advance(400);
    assert_eq!(h.ids(), [2, 4]);
    h.view.verify_invariants();
}

#[test]
fn stale_generation_triggers_reload() {
    let mut h = Harness::with_tasks(&[1, 2]);
    let generation = h.view.generation();
    assert_eq!(h.view.task_at(1, generation).unwrap().id, TaskId(2));

    h.set_tasks(&[1, 2, 3]);
    let err = h.view.task_at(1, generation).unwrap_err();
    assert_eq!(
        err,
        RecentsError::StaleGeneration {
            held: generation,
            current: generation + 1
        }
    );

    h.log.borrow_mut().tasks = vec![raw_task(5), raw_task(6)];
    h.view.dispatch_task_events();
    assert_eq!(h.ids(), [5, 6]);
}

#[test]
fn task_events_from_the_source() {
    let mut h = Harness::new();
    let sender = h.log.borrow().subscribed.clone().unwrap();

    h.log.borrow_mut().tasks = vec![raw_task(1), raw_task(2), raw_task(3)];
    sender.try_send(TaskEvent::TaskStackChanged).unwrap();
    h.view.dispatch_task_events();
    assert_eq!(h.ids(), [1, 2, 3]);

    sender.try_send(TaskEvent::TaskRemoved(TaskId(2))).unwrap();
    h.view.dispatch_task_events();
    assert_eq!(h.ids(), [1, 3]);

    let icon = IconHandle::Loaded("fresh".into());
    sender
        .try_send(TaskEvent::IconLoaded {
            task: TaskId(3),
            icon: icon.clone(),
        })
        .unwrap();
    h.view.dispatch_task_events();
    assert_eq!(h.view.tile_at(1).unwrap().icon(), Some(&icon));
}

#[test]
fn leaving_the_overview_resets_it() {
    let mut h = Harness::with_tasks(&[1, 2]);
    let sender = h.log.borrow().subscribed.clone().unwrap();

    h.view.go_to_state(LauncherState::Normal, true, None);
    assert_eq!(h.view.task_count(), 2);
    h.settle();

    assert_eq!(h.events(), [RecentsEvent::StateChanged(LauncherState::Normal)]);
    assert_eq!(h.view.task_count(), 0);
    assert!(h.log.borrow().subscribed.is_none());
    assert_eq!(h.log.borrow().resets, 1);

    // Events arriving afterwards are dropped.
    let calls = h.log.borrow().list_calls;
    sender.try_send(TaskEvent::TaskStackChanged).unwrap();
    h.view.dispatch_task_events();
    assert_eq!(h.log.borrow().list_calls, calls);
    h.view.verify_invariants();
}

#[test]
fn state_end_action_runs_once() {
    let mut h = Harness::new();
    let runs = Rc::new(Cell::new(0));
    let counter = runs.clone();
    h.view.go_to_state(
        LauncherState::OverviewPeek,
        true,
        Some(Box::new(move |_| counter.set(counter.get() + 1))),
    );
    assert_eq!(runs.get(), 0);

    h.settle();
    h.settle();
    assert_eq!(runs.get(), 1);
    assert_eq!(h.view.state(), LauncherState::OverviewPeek);
    assert_abs_diff_eq!(h.view.state_visuals().overview_scale, 0.9);
}

#[test]
fn live_tile_follows_the_gesture() {
    let mut h = Harness::with_tasks(&[1, 2, 3]);
    h.view.on_gesture_animation_start(TaskId(2));

    assert!(h.view.is_live_tile_active());
    assert_eq!(h.view.current_page(), 1);
    assert_eq!(h.view.running_task(), Some(TaskId(2)));
    assert_eq!(h.log.borrow().transforms.len(), 1);
    {
        let log = h.log.borrow();
        let (targets, progress, rect, _) = &log.transforms[0];
        assert_eq!(targets, &[TaskId(2)]);
        assert_eq!(*progress, 0.);
        assert_eq!(*rect, Rect::from_size(VIEWPORT));
    }

    // Once per tick.
    h.view.advance_animations();
    assert_eq!(h.log.borrow().transforms.len(), 1);

    h.view.update_gesture_progress(1.);
    {
        let log = h.log.borrow();
        let (_, progress, rect, _) = log.transforms.last().unwrap();
        assert_eq!(*progress, 1.);
        assert_eq!(rect.loc, DVec2::new(150., 300.));
        assert_eq!(rect.size, DVec2::new(700., 1400.));
    }

    h.view.on_gesture_animation_end();
    let count = h.log.borrow().transforms.len();
    h.advance(16);
    assert_eq!(h.log.borrow().transforms.len(), count);
    assert!(h.view.tile_at(1).unwrap().is_running_pinned());
    h.view.verify_invariants();
}

#[test]
fn cancelled_gesture_unpins() {
    let mut h = Harness::with_tasks(&[1, 2, 3]);
    h.view.on_gesture_animation_start(TaskId(3));
    h.view.on_gesture_animation_cancelled();

    assert!(!h.view.is_live_tile_active());
    assert_eq!(h.view.running_task(), None);
    assert!(h.view.tiles().all(|(_, tile)| !tile.is_running_pinned()));
    h.view.verify_invariants();
}

#[test]
fn gesture_from_unknown_task_reloads() {
    let mut h = Harness::with_tasks(&[1]);
    h.log.borrow_mut().tasks = vec![raw_task(1), raw_task(7)];
    h.view.on_gesture_animation_start(TaskId(7));

    assert_eq!(h.ids(), [1, 7]);
    assert!(h.view.tile_at(1).unwrap().is_running_pinned());
    h.view.verify_invariants();
}

#[derive(Debug, Clone, Arbitrary)]
enum Op {
    SetTasks(#[proptest(strategy = "proptest::collection::vec(0..12i32, 0..12)")] Vec<i32>),
    StackChanged(#[proptest(strategy = "proptest::collection::vec(0..12i32, 0..12)")] Vec<i32>),
    RemoveTask(#[proptest(strategy = "0..12i32")] i32),
    Dismiss {
        #[proptest(strategy = "0..10usize")]
        page: usize,
        animate: bool,
        remove: bool,
    },
    CancelDismiss,
    Advance(#[proptest(strategy = "0..400u64")] u64),
    Fling(#[proptest(strategy = "-300f64..300.")] f64),
    SwipeUp,
    Tap(#[proptest(strategy = "0f64..1000.")] f64),
    LongPressMove(#[proptest(strategy = "-1500f64..1500.")] f64),
    Key(#[proptest(strategy = "0..8usize")] usize),
    GestureStart(#[proptest(strategy = "0..12i32")] i32),
    GestureProgress(#[proptest(strategy = "0f64..1.")] f64),
    GestureEnd,
    GestureCancel,
    GoToState(#[proptest(strategy = "0..4usize")] usize),
}

fn key_for(index: usize) -> KeyEvent {
    match index {
        0 => KeyEvent::new(Key::Tab),
        1 => KeyEvent::with_modifiers(Key::Tab, Modifiers::SHIFT),
        2 => KeyEvent::with_modifiers(Key::Tab, Modifiers::ALT),
        3 => KeyEvent::new(Key::Left),
        4 => KeyEvent::new(Key::Right),
        5 => KeyEvent::new(Key::Enter),
        6 => KeyEvent::new(Key::Escape),
        _ => KeyEvent::new(Key::Delete),
    }
}

fn state_for(index: usize) -> LauncherState {
    match index {
        0 => LauncherState::Overview,
        1 => LauncherState::OverviewPeek,
        2 => LauncherState::QuickSwitch,
        _ => LauncherState::Normal,
    }
}

fn apply(h: &mut Harness, op: Op) {
    match op {
        Op::SetTasks(ids) => h.set_tasks(&ids),
        Op::StackChanged(ids) => {
            h.log.borrow_mut().tasks = ids.into_iter().map(raw_task).collect();
            let sender = h.log.borrow().subscribed.clone();
            if let Some(sender) = sender {
                sender.try_send(TaskEvent::TaskStackChanged).unwrap();
            }
            h.view.dispatch_task_events();
        }
        Op::RemoveTask(id) => {
            let sender = h.log.borrow().subscribed.clone();
            if let Some(sender) = sender {
                sender.try_send(TaskEvent::TaskRemoved(TaskId(id))).unwrap();
            }
            h.view.dispatch_task_events();
        }
        Op::Dismiss {
            page,
            animate,
            remove,
        } => {
            if let Some(tile) = h.view.tile_id_at(page) {
                h.view.dismiss_task(tile, animate, remove);
            }
        }
        Op::CancelDismiss => h.view.cancel_dismiss(),
        Op::Advance(ms) => h.advance(ms),
        Op::Fling(dx) => h.drag(center(), center() + DVec2::new(dx, 0.), 5),
        Op::SwipeUp => h.drag(center(), center() - DVec2::new(0., 900.), 6),
        Op::Tap(x) => h.tap(DVec2::new(x, 1000.)),
        Op::LongPressMove(dx) => {
            h.touch(TouchAction::Down, center());
            h.advance(500);
            h.touch(TouchAction::Move, center() + DVec2::new(dx, 0.));
            h.touch(TouchAction::Up, center() + DVec2::new(dx, 0.));
        }
        Op::Key(index) => {
            h.view.dispatch_key_event(key_for(index));
        }
        Op::GestureStart(id) => h.view.on_gesture_animation_start(TaskId(id)),
        Op::GestureProgress(progress) => h.view.update_gesture_progress(progress),
        Op::GestureEnd => h.view.on_gesture_animation_end(),
        Op::GestureCancel => h.view.on_gesture_animation_cancelled(),
        Op::GoToState(index) => h.view.go_to_state(state_for(index), true, None),
    }
}

#[track_caller]
fn check_ops(ops: impl IntoIterator<Item = Op>) -> Harness {
    let mut h = Harness::new();
    for op in ops {
        apply(&mut h, op);
        h.view.verify_invariants();
    }
    h.settle();
    h.view.verify_invariants();
    h
}

#[test]
fn ops_smoke() {
    let h = check_ops([
        Op::SetTasks(vec![1, 2, 3, 4]),
        Op::GestureStart(4),
        Op::GestureProgress(0.5),
        Op::Dismiss {
            page: 1,
            animate: true,
            remove: true,
        },
        Op::SetTasks(vec![2, 3, 4, 5]),
        Op::Fling(-200.),
        Op::Advance(300),
        Op::GestureEnd,
        Op::LongPressMove(-800.),
        Op::SwipeUp,
        Op::Advance(300),
    ]);
    assert!(!h.view.are_animations_ongoing());
}

#[test]
fn ops_dismiss_then_leave() {
    let h = check_ops([
        Op::SetTasks(vec![1, 2]),
        Op::Dismiss {
            page: 0,
            animate: true,
            remove: false,
        },
        Op::GoToState(3),
        Op::Advance(100),
    ]);
    assert_eq!(h.view.state(), LauncherState::Normal);
    assert_eq!(h.view.task_count(), 0);
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        ..ProptestConfig::default()
    })]

    #[test]
    fn random_operations(ops in proptest::collection::vec(any::<Op>(), 1..40)) {
        check_ops(ops);
    }
}
