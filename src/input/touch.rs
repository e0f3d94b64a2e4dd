//! Touch recognition for the task strip.
//!
//! [`GestureRecognizer`] consumes raw [`TouchEvent`]s and turns them into [`TouchIntent`]s:
//! horizontal scrolling with flings, taps, vertical swipes on a single tile, and long-press
//! reordering. It knows nothing about pages or tiles beyond what a [`TouchTarget`] answers about
//! a point, so the container geometry stays in one place.

use std::time::Duration;

use arrayvec::ArrayVec;
use glam::DVec2;

use super::swipe_tracker::SwipeTracker;

pub const MAX_POINTERS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pointer {
    pub id: u32,
    pub pos: DVec2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchAction {
    /// First pointer went down.
    Down,
    Move,
    /// Last pointer went up.
    Up,
    Cancel,
    /// A secondary pointer went down.
    PointerDown(u32),
    /// A pointer went up while others remain.
    PointerUp(u32),
}

/// One touch frame with the positions of every pointer currently down.
#[derive(Debug, Clone, PartialEq)]
pub struct TouchEvent {
    pub action: TouchAction,
    pub time: Duration,
    pub pointers: ArrayVec<Pointer, MAX_POINTERS>,
    /// The sequence started inside a system edge-navigation region.
    pub from_edge_navigation: bool,
}

impl TouchEvent {
    pub fn new(action: TouchAction, time: Duration, pointers: &[Pointer]) -> Self {
        Self {
            action,
            time,
            pointers: pointers.iter().copied().take(MAX_POINTERS).collect(),
            from_edge_navigation: false,
        }
    }

    pub fn down(pos: DVec2, time: Duration) -> Self {
        Self::new(TouchAction::Down, time, &[Pointer { id: 0, pos }])
    }

    pub fn moved(pos: DVec2, time: Duration) -> Self {
        Self::new(TouchAction::Move, time, &[Pointer { id: 0, pos }])
    }

    pub fn up(pos: DVec2, time: Duration) -> Self {
        Self::new(TouchAction::Up, time, &[Pointer { id: 0, pos }])
    }

    pub fn cancel(time: Duration) -> Self {
        Self::new(TouchAction::Cancel, time, &[])
    }

    pub fn pointer(&self, id: u32) -> Option<Pointer> {
        self.pointers.iter().copied().find(|p| p.id == id)
    }
}

/// Hit-testing answers the recognizer needs from the container.
pub trait TouchTarget {
    /// Page of the tile under `pos`.
    fn tile_at(&self, pos: DVec2) -> Option<usize>;
    /// Whether `pos` is inside the dead zone, where a touch must not return home.
    fn in_dead_zone(&self, pos: DVec2) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureConfig {
    /// Movement in pixels before a touch turns into a drag.
    pub touch_slop: f64,
    pub long_press: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchPhase {
    Idle,
    Down,
    Moving,
    Tap,
    FlingSettling,
    Snapped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragMode {
    None,
    Reorder,
}

/// State of the touch sequence between pointer-down and pointer-up.
#[derive(Debug, Clone)]
pub struct GestureSession {
    pub active_pointer: u32,
    pub down: DVec2,
    pub last: DVec2,
    pub down_time: Duration,
    pub drag_mode: DragMode,
    /// Horizontal scroll drag in progress.
    pub is_being_dragged: bool,
    tracker_x: SwipeTracker,
    tracker_y: SwipeTracker,
    pressed_tile: Option<usize>,
    swiped_tile: Option<usize>,
    touch_down_starts_home: bool,
    moved: bool,
    /// Fractional scroll carried over to the next event.
    scroll_remainder: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TouchIntent {
    /// Stop an in-flight fling where it is.
    StopSettling,
    ScrollBegin,
    /// Scroll by whole pixels.
    ScrollBy(i32),
    /// Release of a horizontal drag. `delta` and `velocity` are in finger space.
    ScrollEnd {
        delta: f64,
        velocity: f64,
    },
    ScrollCancel,
    Tap(usize),
    ReturnHome,
    TileSwipeBegin(usize),
    TileSwipeUpdate {
        page: usize,
        offset: f64,
    },
    TileSwipeEnd {
        page: usize,
        offset: f64,
        velocity: f64,
    },
    TileSwipeCancel(usize),
    ReorderBegin(usize),
    ReorderUpdate {
        page: usize,
        offset: f64,
    },
    ReorderEnd {
        page: usize,
        offset: f64,
    },
    ReorderCancel(usize),
}

pub type Intents = ArrayVec<TouchIntent, 4>;

#[derive(Debug)]
pub struct GestureRecognizer {
    config: GestureConfig,
    phase: TouchPhase,
    session: Option<GestureSession>,
}

impl GestureSession {
    fn new(pointer: Pointer, time: Duration) -> Self {
        let mut tracker_x = SwipeTracker::new();
        let mut tracker_y = SwipeTracker::new();
        tracker_x.push(0., time);
        tracker_y.push(0., time);

        Self {
            active_pointer: pointer.id,
            down: pointer.pos,
            last: pointer.pos,
            down_time: time,
            drag_mode: DragMode::None,
            is_being_dragged: false,
            tracker_x,
            tracker_y,
            pressed_tile: None,
            swiped_tile: None,
            touch_down_starts_home: false,
            moved: false,
            scroll_remainder: 0.,
        }
    }

    pub fn touch_down_starts_home(&self) -> bool {
        self.touch_down_starts_home
    }

    pub fn velocity(&self) -> DVec2 {
        DVec2::new(self.tracker_x.velocity(), self.tracker_y.velocity())
    }

    fn track(&mut self, pos: DVec2, time: Duration) {
        let delta = pos - self.last;
        self.tracker_x.push(delta.x, time);
        self.tracker_y.push(delta.y, time);
    }

    fn cancel_intent(&self) -> Option<TouchIntent> {
        if let (DragMode::Reorder, Some(page)) = (self.drag_mode, self.pressed_tile) {
            Some(TouchIntent::ReorderCancel(page))
        } else if let Some(page) = self.swiped_tile {
            Some(TouchIntent::TileSwipeCancel(page))
        } else if self.is_being_dragged {
            Some(TouchIntent::ScrollCancel)
        } else {
            None
        }
    }
}

impl GestureRecognizer {
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config,
            phase: TouchPhase::Idle,
            session: None,
        }
    }

    pub fn phase(&self) -> TouchPhase {
        self.phase
    }

    pub fn session(&self) -> Option<&GestureSession> {
        self.session.as_ref()
    }

    pub fn update_config(&mut self, config: GestureConfig) {
        self.config = config;
    }

    pub fn on_touch(&mut self, event: &TouchEvent, target: &dyn TouchTarget) -> Intents {
        let _span = tracy_client::span!("GestureRecognizer::on_touch");

        let mut intents = Intents::new();

        match event.action {
            TouchAction::Down => self.on_down(event, target, &mut intents),
            TouchAction::Move => self.on_move(event, &mut intents),
            TouchAction::Up => self.on_up(event, &mut intents),
            TouchAction::Cancel => self.cancel(&mut intents),
            TouchAction::PointerDown(id) => {
                trace!("secondary pointer {id} down");
            }
            TouchAction::PointerUp(id) => self.on_secondary_up(id, event),
        }

        intents
    }

    /// Promotes a stationary press into a reorder drag once the long-press timeout passes.
    pub fn check_long_press(&mut self, now: Duration) -> Option<TouchIntent> {
        let session = self.session.as_mut()?;
        if session.moved || session.drag_mode != DragMode::None {
            return None;
        }

        let page = session.pressed_tile?;
        if now.saturating_sub(session.down_time) < self.config.long_press {
            return None;
        }

        debug!("long press on page {page}, starting reorder");
        session.drag_mode = DragMode::Reorder;
        session.moved = true;
        session.touch_down_starts_home = false;
        self.phase = TouchPhase::Moving;
        Some(TouchIntent::ReorderBegin(page))
    }

    /// Advances the transient phases after the container has settled.
    pub fn advance(&mut self, scroll_settled: bool) {
        self.phase = match self.phase {
            TouchPhase::FlingSettling if scroll_settled => TouchPhase::Snapped,
            TouchPhase::Tap | TouchPhase::Snapped => TouchPhase::Idle,
            phase => phase,
        };
    }

    /// Abandons the current sequence, e.g. when interaction gets disabled.
    pub fn reset(&mut self) -> Intents {
        let mut intents = Intents::new();
        self.cancel(&mut intents);
        intents
    }

    fn on_down(&mut self, event: &TouchEvent, target: &dyn TouchTarget, intents: &mut Intents) {
        let Some(pointer) = event.pointers.first().copied() else {
            trace!("ignoring down event without pointers");
            return;
        };

        if self.session.is_some() {
            debug!("new touch sequence while the previous one is active, cancelling it");
            self.cancel(intents);
        }

        if self.phase == TouchPhase::FlingSettling {
            intents.push(TouchIntent::StopSettling);
        }

        let mut session = GestureSession::new(pointer, event.time);
        session.pressed_tile = target.tile_at(pointer.pos);
        session.touch_down_starts_home =
            !target.in_dead_zone(pointer.pos) && !event.from_edge_navigation;

        self.session = Some(session);
        self.phase = TouchPhase::Down;
    }

    fn on_move(&mut self, event: &TouchEvent, intents: &mut Intents) {
        let slop = self.config.touch_slop;
        let Some(session) = self.session.as_mut() else {
            return;
        };

        let Some(pointer) = event.pointer(session.active_pointer) else {
            trace!("move without the active pointer {}", session.active_pointer);
            return;
        };
        let pos = pointer.pos;
        session.track(pos, event.time);

        let total = pos - session.down;

        if session.drag_mode == DragMode::Reorder {
            if let Some(page) = session.pressed_tile {
                intents.push(TouchIntent::ReorderUpdate {
                    page,
                    offset: total.x,
                });
            }
        } else if let Some(page) = session.swiped_tile {
            intents.push(TouchIntent::TileSwipeUpdate {
                page,
                offset: total.y,
            });
        } else if session.is_being_dragged {
            let delta = session.last.x - pos.x + session.scroll_remainder;
            let whole = delta.trunc();
            session.scroll_remainder = delta - whole;
            if whole != 0. {
                intents.push(TouchIntent::ScrollBy(whole as i32));
            }
        } else if !session.moved {
            if total.x.abs() > slop && total.x.abs() >= total.y.abs() {
                session.moved = true;
                session.is_being_dragged = true;
                session.touch_down_starts_home = false;
                session.scroll_remainder = 0.;
                self.phase = TouchPhase::Moving;
                intents.push(TouchIntent::ScrollBegin);
            } else if total.y.abs() > slop {
                session.moved = true;
                session.touch_down_starts_home = false;
                self.phase = TouchPhase::Moving;

                if let Some(page) = session.pressed_tile {
                    session.swiped_tile = Some(page);
                    intents.push(TouchIntent::TileSwipeBegin(page));
                    intents.push(TouchIntent::TileSwipeUpdate {
                        page,
                        offset: total.y,
                    });
                }
            }
        }

        session.last = pos;

        if !session.moved {
            if let Some(intent) = self.check_long_press(event.time) {
                intents.push(intent);
            }
        }
    }

    fn on_up(&mut self, event: &TouchEvent, intents: &mut Intents) {
        let Some(mut session) = self.session.take() else {
            return;
        };

        let pos = match event.pointer(session.active_pointer) {
            Some(pointer) => {
                session.track(pointer.pos, event.time);
                pointer.pos
            }
            None => session.last,
        };
        let total = pos - session.down;

        if session.drag_mode == DragMode::Reorder {
            if let Some(page) = session.pressed_tile {
                intents.push(TouchIntent::ReorderEnd {
                    page,
                    offset: total.x,
                });
            }
            self.phase = TouchPhase::Snapped;
        } else if let Some(page) = session.swiped_tile {
            intents.push(TouchIntent::TileSwipeEnd {
                page,
                offset: total.y,
                velocity: session.tracker_y.velocity(),
            });
            self.phase = TouchPhase::Snapped;
        } else if session.is_being_dragged {
            intents.push(TouchIntent::ScrollEnd {
                delta: total.x,
                velocity: session.tracker_x.velocity(),
            });
            self.phase = TouchPhase::FlingSettling;
        } else if !session.moved {
            if let Some(page) = session.pressed_tile {
                intents.push(TouchIntent::Tap(page));
            } else if session.touch_down_starts_home {
                intents.push(TouchIntent::ReturnHome);
            }
            self.phase = TouchPhase::Tap;
        } else {
            self.phase = TouchPhase::Idle;
        }
    }

    fn on_secondary_up(&mut self, id: u32, event: &TouchEvent) {
        let Some(session) = self.session.as_mut() else {
            return;
        };

        if id != session.active_pointer {
            return;
        }

        let Some(next) = event.pointers.iter().find(|p| p.id != id) else {
            trace!("active pointer {id} went up with no pointer left to take over");
            return;
        };

        // Keep the accumulated offset continuous for the new pointer.
        let offset = session.last - session.down;
        session.active_pointer = next.id;
        session.last = next.pos;
        session.down = next.pos - offset;
        session.scroll_remainder = 0.;

        // The jump between pointers must not register as velocity.
        session.tracker_x = SwipeTracker::new();
        session.tracker_y = SwipeTracker::new();
        session.tracker_x.push(0., event.time);
        session.tracker_y.push(0., event.time);

        debug!("active pointer {id} went up, continuing with {}", next.id);
    }

    fn cancel(&mut self, intents: &mut Intents) {
        if let Some(session) = self.session.take() {
            if let Some(intent) = session.cancel_intent() {
                intents.push(intent);
            }
        }
        self.phase = TouchPhase::Idle;
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    /// One 100 px wide tile per 100 px, starting at x = 0, between y = 100 and y = 300.
    struct Strip;

    impl TouchTarget for Strip {
        fn tile_at(&self, pos: DVec2) -> Option<usize> {
            if (0. ..300.).contains(&pos.x) && (100. ..300.).contains(&pos.y) {
                Some((pos.x / 100.) as usize)
            } else {
                None
            }
        }

        fn in_dead_zone(&self, pos: DVec2) -> bool {
            self.tile_at(pos).is_some()
        }
    }

    fn recognizer() -> GestureRecognizer {
        GestureRecognizer::new(GestureConfig {
            touch_slop: 8.,
            long_press: Duration::from_millis(400),
        })
    }

    fn ms(ms: u64) -> Duration {
        Duration::from_millis(ms)
    }

    fn p(x: f64, y: f64) -> DVec2 {
        DVec2::new(x, y)
    }

    #[test]
    fn tap_on_tile() {
        let mut r = recognizer();
        assert!(r.on_touch(&TouchEvent::down(p(150., 200.), ms(0)), &Strip).is_empty());
        assert_eq!(r.phase(), TouchPhase::Down);

        let intents = r.on_touch(&TouchEvent::moved(p(153., 202.), ms(10)), &Strip);
        assert!(intents.is_empty());

        let intents = r.on_touch(&TouchEvent::up(p(153., 202.), ms(20)), &Strip);
        assert_eq!(intents.as_slice(), &[TouchIntent::Tap(1)]);
        assert_eq!(r.phase(), TouchPhase::Tap);

        r.advance(true);
        assert_eq!(r.phase(), TouchPhase::Idle);
    }

    #[test]
    fn tap_outside_tiles_returns_home() {
        let mut r = recognizer();
        r.on_touch(&TouchEvent::down(p(150., 20.), ms(0)), &Strip);
        assert!(r.session().unwrap().touch_down_starts_home());

        let intents = r.on_touch(&TouchEvent::up(p(150., 20.), ms(20)), &Strip);
        assert_eq!(intents.as_slice(), &[TouchIntent::ReturnHome]);
    }

    #[test]
    fn edge_navigation_never_returns_home() {
        let mut r = recognizer();
        let mut down = TouchEvent::down(p(150., 20.), ms(0));
        down.from_edge_navigation = true;
        r.on_touch(&down, &Strip);

        let intents = r.on_touch(&TouchEvent::up(p(150., 20.), ms(20)), &Strip);
        assert!(intents.is_empty());
    }

    #[test]
    fn drag_cancels_start_home() {
        let mut r = recognizer();
        r.on_touch(&TouchEvent::down(p(150., 20.), ms(0)), &Strip);

        let intents = r.on_touch(&TouchEvent::moved(p(130., 20.), ms(10)), &Strip);
        assert_eq!(intents.as_slice(), &[TouchIntent::ScrollBegin]);
        assert!(!r.session().unwrap().touch_down_starts_home());
        assert_eq!(r.phase(), TouchPhase::Moving);

        let intents = r.on_touch(&TouchEvent::up(p(130., 20.), ms(20)), &Strip);
        assert!(matches!(intents[0], TouchIntent::ScrollEnd { .. }));
        assert_eq!(r.phase(), TouchPhase::FlingSettling);
    }

    #[test]
    fn scroll_carries_fractional_remainder() {
        let mut r = recognizer();
        r.on_touch(&TouchEvent::down(p(200., 200.), ms(0)), &Strip);
        r.on_touch(&TouchEvent::moved(p(190., 200.), ms(10)), &Strip);

        let mut total = 0;
        let mut x = 190.;
        for i in 0..16 {
            x -= 0.25;
            let intents = r.on_touch(&TouchEvent::moved(p(x, 200.), ms(20 + i * 10)), &Strip);
            for intent in intents {
                if let TouchIntent::ScrollBy(delta) = intent {
                    total += delta;
                }
            }
        }

        // 16 × 0.25 px, nothing lost to truncation.
        assert_eq!(total, 4);
    }

    #[test]
    fn fling_velocity_is_reported() {
        let mut r = recognizer();
        r.on_touch(&TouchEvent::down(p(250., 200.), ms(0)), &Strip);
        r.on_touch(&TouchEvent::moved(p(234., 200.), ms(10)), &Strip);
        r.on_touch(&TouchEvent::moved(p(218., 200.), ms(20)), &Strip);

        let intents = r.on_touch(&TouchEvent::up(p(202., 200.), ms(30)), &Strip);
        let TouchIntent::ScrollEnd { delta, velocity } = intents[0] else {
            panic!("expected a scroll end, got {intents:?}");
        };
        assert_eq!(delta, -48.);
        assert_abs_diff_eq!(velocity, -1600., epsilon = 1e-6);
    }

    #[test]
    fn vertical_swipe_on_tile() {
        let mut r = recognizer();
        r.on_touch(&TouchEvent::down(p(50., 200.), ms(0)), &Strip);

        let intents = r.on_touch(&TouchEvent::moved(p(52., 150.), ms(10)), &Strip);
        assert_eq!(
            intents.as_slice(),
            &[
                TouchIntent::TileSwipeBegin(0),
                TouchIntent::TileSwipeUpdate {
                    page: 0,
                    offset: -50.
                },
            ]
        );

        let intents = r.on_touch(&TouchEvent::up(p(52., 100.), ms(20)), &Strip);
        let TouchIntent::TileSwipeEnd { page, offset, .. } = intents[0] else {
            panic!("expected a tile swipe end, got {intents:?}");
        };
        assert_eq!(page, 0);
        assert_eq!(offset, -100.);
    }

    #[test]
    fn long_press_starts_reorder() {
        let mut r = recognizer();
        r.on_touch(&TouchEvent::down(p(50., 200.), ms(0)), &Strip);
        assert_eq!(r.check_long_press(ms(399)), None);
        assert_eq!(r.check_long_press(ms(400)), Some(TouchIntent::ReorderBegin(0)));
        assert_eq!(r.session().unwrap().drag_mode, DragMode::Reorder);

        let intents = r.on_touch(&TouchEvent::moved(p(180., 200.), ms(450)), &Strip);
        assert_eq!(
            intents.as_slice(),
            &[TouchIntent::ReorderUpdate {
                page: 0,
                offset: 130.
            }]
        );

        let intents = r.on_touch(&TouchEvent::up(p(180., 200.), ms(460)), &Strip);
        assert_eq!(
            intents.as_slice(),
            &[TouchIntent::ReorderEnd {
                page: 0,
                offset: 130.
            }]
        );
    }

    #[test]
    fn long_press_needs_a_tile() {
        let mut r = recognizer();
        r.on_touch(&TouchEvent::down(p(50., 20.), ms(0)), &Strip);
        assert_eq!(r.check_long_press(ms(1000)), None);
    }

    #[test]
    fn secondary_pointer_up_reassigns_and_resets_velocity() {
        let mut r = recognizer();
        r.on_touch(&TouchEvent::down(p(250., 200.), ms(0)), &Strip);
        r.on_touch(&TouchEvent::moved(p(230., 200.), ms(10)), &Strip);

        let both = [
            Pointer {
                id: 0,
                pos: p(230., 200.),
            },
            Pointer {
                id: 1,
                pos: p(40., 200.),
            },
        ];
        r.on_touch(
            &TouchEvent::new(TouchAction::PointerDown(1), ms(12), &both),
            &Strip,
        );
        r.on_touch(
            &TouchEvent::new(TouchAction::PointerUp(0), ms(14), &both),
            &Strip,
        );

        let session = r.session().unwrap();
        assert_eq!(session.active_pointer, 1);
        assert_eq!(session.last, p(40., 200.));
        assert_eq!(session.velocity(), DVec2::ZERO);

        // Moving the remaining pointer continues the same drag without a jump.
        let one = [Pointer {
            id: 1,
            pos: p(30., 200.),
        }];
        let intents = r.on_touch(&TouchEvent::new(TouchAction::Move, ms(24), &one), &Strip);
        assert_eq!(intents.as_slice(), &[TouchIntent::ScrollBy(10)]);
    }

    #[test]
    fn down_during_fling_stops_it() {
        let mut r = recognizer();
        r.on_touch(&TouchEvent::down(p(250., 200.), ms(0)), &Strip);
        r.on_touch(&TouchEvent::moved(p(200., 200.), ms(10)), &Strip);
        r.on_touch(&TouchEvent::up(p(150., 200.), ms(20)), &Strip);
        assert_eq!(r.phase(), TouchPhase::FlingSettling);

        let intents = r.on_touch(&TouchEvent::down(p(150., 200.), ms(30)), &Strip);
        assert_eq!(intents.as_slice(), &[TouchIntent::StopSettling]);
    }

    #[test]
    fn settling_then_snapped_then_idle() {
        let mut r = recognizer();
        r.on_touch(&TouchEvent::down(p(250., 200.), ms(0)), &Strip);
        r.on_touch(&TouchEvent::moved(p(200., 200.), ms(10)), &Strip);
        r.on_touch(&TouchEvent::up(p(200., 200.), ms(20)), &Strip);

        r.advance(false);
        assert_eq!(r.phase(), TouchPhase::FlingSettling);
        r.advance(true);
        assert_eq!(r.phase(), TouchPhase::Snapped);
        r.advance(true);
        assert_eq!(r.phase(), TouchPhase::Idle);
    }

    #[test]
    fn cancel_reports_the_active_drag() {
        let mut r = recognizer();
        r.on_touch(&TouchEvent::down(p(250., 200.), ms(0)), &Strip);
        r.on_touch(&TouchEvent::moved(p(200., 200.), ms(10)), &Strip);

        let intents = r.on_touch(&TouchEvent::cancel(ms(20)), &Strip);
        assert_eq!(intents.as_slice(), &[TouchIntent::ScrollCancel]);
        assert_eq!(r.phase(), TouchPhase::Idle);
        assert!(r.session().is_none());
    }
}
