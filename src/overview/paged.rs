//! Horizontally paged strip geometry and scrolling.

use glam::DVec2;
use ordered_float::OrderedFloat;

use super::animated_value::AnimatedValue;
use crate::animation::{Animation, Clock};
use crate::geometry::Rect;
use crate::rubber_band::RubberBand;

const OVERSCROLL_STIFFNESS: f64 = 0.5;

/// Page geometry of the task strip.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageLayout {
    pub viewport: DVec2,
    pub tile_size: DVec2,
    pub gap: f64,
    pub rtl: bool,
}

/// Thresholds for deciding where a released drag settles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlingParams {
    /// Velocity above which a release counts as a fling to the neighboring page.
    pub min_fling_velocity: f64,
    /// Velocity above which a flick against the drag direction returns to the original page.
    pub fling_threshold_velocity: f64,
    /// Fraction of the page width a drag must cover to change pages without a fling.
    pub significant_move: f64,
    /// Fraction of the page width beyond which a reversing flick returns to the original page.
    pub return_to_original: f64,
}

/// Scroll state of the strip.
#[derive(Debug)]
pub struct PagedContainer {
    layout: PageLayout,
    scroll: AnimatedValue,
    current_index: usize,
    /// Page being snapped to.
    next_index: Option<usize>,
    is_switching: bool,
    /// Progress of the state transition into the overview, in `[0, 1]`.
    transition_progress: f64,
    clock: Clock,
}

impl PageLayout {
    pub fn new(viewport: DVec2, task_size_fraction: f64, gap: f64, rtl: bool) -> Self {
        Self {
            viewport,
            tile_size: (viewport * task_size_fraction).round(),
            gap,
            rtl,
        }
    }

    /// Distance between the left edges of neighboring tiles.
    pub fn stride(&self) -> f64 {
        self.tile_size.x + self.gap
    }

    /// Direction in which page scroll positions grow.
    pub fn sign(&self) -> f64 {
        if self.rtl {
            -1.
        } else {
            1.
        }
    }

    /// Scroll position at which `page` is centered.
    pub fn page_scroll(&self, page: usize) -> f64 {
        self.sign() * page as f64 * self.stride()
    }

    pub fn scroll_bounds(&self, count: usize) -> (f64, f64) {
        if count == 0 {
            return (0., 0.);
        }

        let last = self.page_scroll(count - 1);
        (last.min(0.), last.max(0.))
    }

    /// Screen rectangle of `page` at the given scroll.
    pub fn tile_rect(&self, page: usize, scroll: f64) -> Rect {
        let x = self.page_scroll(page) - scroll + (self.viewport.x - self.tile_size.x) / 2.;
        let y = (self.viewport.y - self.tile_size.y) / 2.;
        Rect::new(DVec2::new(x, y), self.tile_size)
    }

    pub fn nearest_page(&self, scroll: f64, count: usize) -> usize {
        (0..count)
            .min_by_key(|&page| OrderedFloat((self.page_scroll(page) - scroll).abs()))
            .unwrap_or(0)
    }

    pub fn rubber_band(&self) -> RubberBand {
        RubberBand {
            stiffness: OVERSCROLL_STIFFNESS,
            limit: self.viewport.x / 4.,
        }
    }
}

/// Decides the page a released drag settles on.
///
/// `delta` and `velocity` point towards higher page indices when positive.
pub fn settle_page(
    current: usize,
    count: usize,
    nearest: usize,
    delta: f64,
    velocity: f64,
    page_width: f64,
    params: &FlingParams,
) -> usize {
    if count == 0 {
        return 0;
    }

    let is_significant_move = delta.abs() > page_width * params.significant_move;
    let is_fling = velocity.abs() > params.min_fling_velocity;
    let return_to_original = delta.abs() > page_width * params.return_to_original
        && velocity.abs() > params.fling_threshold_velocity
        && velocity.signum() != delta.signum();

    let towards_prev = (is_significant_move && delta < 0. && !is_fling) || (is_fling && velocity < 0.);
    let towards_next = (is_significant_move && delta > 0. && !is_fling) || (is_fling && velocity > 0.);

    if towards_prev && current > 0 {
        if return_to_original {
            current
        } else {
            current - 1
        }
    } else if towards_next && current + 1 < count {
        if return_to_original {
            current
        } else {
            current + 1
        }
    } else {
        nearest.min(count - 1)
    }
}

/// Index `delta` pages away from `current`, wrapping around only when `cycle` is set.
pub fn relative_page(current: usize, count: usize, delta: isize, cycle: bool) -> Option<usize> {
    if count == 0 {
        return None;
    }

    let target = current as isize + delta;
    if cycle {
        Some(target.rem_euclid(count as isize) as usize)
    } else if (0..count as isize).contains(&target) {
        Some(target as usize)
    } else {
        None
    }
}

impl PagedContainer {
    pub fn new(layout: PageLayout, clock: Clock) -> Self {
        Self {
            layout,
            scroll: AnimatedValue::new(0.),
            current_index: 0,
            next_index: None,
            is_switching: false,
            transition_progress: 0.,
            clock,
        }
    }

    pub fn layout(&self) -> &PageLayout {
        &self.layout
    }

    pub fn set_layout(&mut self, layout: PageLayout) {
        self.layout = layout;
        self.jump_to_page(self.current_index);
    }

    pub fn scroll(&self) -> f64 {
        self.scroll.current()
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn next_index(&self) -> Option<usize> {
        self.next_index
    }

    pub fn is_switching(&self) -> bool {
        self.is_switching
    }

    pub fn is_dragging(&self) -> bool {
        self.scroll.is_gesture()
    }

    pub fn is_settled(&self) -> bool {
        self.scroll.is_static()
    }

    pub fn transition_progress(&self) -> f64 {
        self.transition_progress
    }

    pub fn set_transition_progress(&mut self, progress: f64) {
        self.transition_progress = progress.clamp(0., 1.);
    }

    /// Page whose tile contains `pos` on screen.
    pub fn page_at(&self, pos: DVec2, count: usize) -> Option<usize> {
        let scroll = self.scroll();
        (0..count).find(|&page| self.layout.tile_rect(page, scroll).contains(pos))
    }

    /// Moves to `page` without animating.
    pub fn jump_to_page(&mut self, page: usize) {
        self.current_index = page;
        self.next_index = None;
        self.is_switching = false;
        self.scroll = AnimatedValue::new(self.layout.page_scroll(page));
    }

    /// Animates to `page`, continuing with `velocity` in scroll units per second.
    pub fn snap_to_page(&mut self, page: usize, velocity: f64, config: recents_config::Animation) {
        let from = self.scroll();
        let to = self.layout.page_scroll(page);
        trace!("snapping to page {page}: {from} -> {to}, velocity {velocity}");

        self.next_index = Some(page);
        self.is_switching = page != self.current_index;
        self.scroll =
            AnimatedValue::Animation(Animation::new(self.clock.clone(), from, to, velocity, config));
    }

    pub fn begin_drag(&mut self) {
        self.scroll.begin_gesture();
        self.next_index = None;
    }

    /// Applies a drag step of `delta` scroll units, damped past the ends.
    pub fn drag_by(&mut self, delta: f64, count: usize) {
        let (min, max) = self.layout.scroll_bounds(count);
        let rubber_band = self.layout.rubber_band();

        if let AnimatedValue::Gesture(gesture) = &mut self.scroll {
            gesture.raw += delta;
            gesture.current = rubber_band.clamp(min, max, gesture.raw);
        }
    }

    /// Ends a drag. `delta` and `velocity` are finger movement along x; returns the target page.
    pub fn end_drag(
        &mut self,
        delta: f64,
        velocity: f64,
        count: usize,
        params: &FlingParams,
        config: recents_config::Animation,
    ) -> usize {
        if count == 0 {
            self.jump_to_page(0);
            return 0;
        }

        // Moving the finger towards the start of the text direction advances pages.
        let sign = self.layout.sign();
        let page_delta = -delta * sign;
        let page_velocity = -velocity * sign;

        let scroll = self.scroll();
        let nearest = self.layout.nearest_page(scroll, count);
        let page = settle_page(
            self.current_index.min(count - 1),
            count,
            nearest,
            page_delta,
            page_velocity,
            self.layout.tile_size.x,
            params,
        );

        // Scroll velocity runs opposite to the finger.
        let (min, max) = self.layout.scroll_bounds(count);
        let velocity = -velocity * self.layout.rubber_band().clamp_derivative(min, max, scroll);
        self.snap_to_page(page, velocity, config);
        page
    }

    pub fn cancel_drag(&mut self, config: recents_config::Animation) {
        if self.is_dragging() {
            self.snap_to_page(self.current_index, 0., config);
        }
    }

    /// Stops a fling in place, keeping whichever page ends up closest as current.
    pub fn stop_settling(&mut self, count: usize) {
        if self.scroll.is_animation_ongoing() {
            self.scroll.stop_anim_and_gesture();
            if count > 0 {
                self.current_index = self.layout.nearest_page(self.scroll(), count);
            }
            self.next_index = None;
            self.is_switching = false;
        }
    }

    /// Keeps the current page in range after the page count changed.
    pub fn clamp_to_count(&mut self, count: usize) {
        let max = count.saturating_sub(1);
        if self.current_index > max || self.next_index.is_some_and(|next| next > max) {
            self.jump_to_page(max.min(self.current_index));
        }
    }

    /// Retires a finished snap. Returns the new current page if it changed.
    pub fn advance_animations(&mut self) -> Option<usize> {
        if !self.scroll.advance() {
            return None;
        }

        self.is_switching = false;
        let next = self.next_index.take()?;
        if next == self.current_index {
            return None;
        }

        self.current_index = next;
        Some(next)
    }
}
