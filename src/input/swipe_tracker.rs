use std::collections::VecDeque;
use std::time::Duration;

use crate::animation::FLING_DECELERATION;

const HISTORY_LIMIT: Duration = Duration::from_millis(150);

/// Tracks one axis of pointer movement to estimate velocity.
#[derive(Debug, Clone, Default)]
pub struct SwipeTracker {
    history: VecDeque<Event>,
    pos: f64,
}

#[derive(Debug, Clone, Copy)]
struct Event {
    delta: f64,
    timestamp: Duration,
}

impl SwipeTracker {
    pub fn new() -> Self {
        Self {
            history: VecDeque::new(),
            pos: 0.,
        }
    }

    /// Pushes a new reading into the tracker.
    pub fn push(&mut self, delta: f64, timestamp: Duration) {
        // For the events that we care about, timestamps should always increase
        // monotonically.
        if let Some(last) = self.history.back() {
            if timestamp < last.timestamp {
                trace!(
                    "ignoring event with timestamp {timestamp:?} earlier than last {:?}",
                    last.timestamp
                );
                return;
            }
        }

        self.history.push_back(Event { delta, timestamp });
        self.pos += delta;

        self.trim_history();
    }

    /// Returns the current gesture position.
    pub fn pos(&self) -> f64 {
        self.pos
    }

    /// Computes the current gesture velocity in units per second.
    pub fn velocity(&self) -> f64 {
        let (Some(first), Some(last)) = (self.history.front(), self.history.back()) else {
            return 0.;
        };

        let total_time = (last.timestamp - first.timestamp).as_secs_f64();
        if total_time == 0. {
            return 0.;
        }

        // The first event's delta happened before the tracked time window started.
        let total_delta = self.history.iter().skip(1).map(|event| event.delta).sum::<f64>();
        total_delta / total_time
    }

    /// Computes the gesture end position after decelerating to a halt.
    pub fn projected_end_pos(&self) -> f64 {
        let vel = self.velocity();
        self.pos - vel / (1000. * FLING_DECELERATION.ln())
    }

    fn trim_history(&mut self) {
        let _span = tracy_client::span!("SwipeTracker::trim_history");

        let Some(&Event { timestamp: now, .. }) = self.history.back() else {
            return;
        };

        while let Some(first) = self.history.front() {
            if now <= first.timestamp + HISTORY_LIMIT {
                break;
            }

            let _ = self.history.pop_front();
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    fn ms(ms: u64) -> Duration {
        Duration::from_millis(ms)
    }

    #[test]
    fn velocity_in_units_per_second() {
        let mut tracker = SwipeTracker::new();
        tracker.push(0., ms(0));
        tracker.push(16., ms(10));
        tracker.push(16., ms(20));

        assert_eq!(tracker.pos(), 32.);
        assert_abs_diff_eq!(tracker.velocity(), 1600., epsilon = 1e-9);
        assert!(tracker.projected_end_pos() > tracker.pos());
    }

    #[test]
    fn old_events_are_trimmed() {
        let mut tracker = SwipeTracker::new();
        tracker.push(0., ms(0));
        tracker.push(100., ms(10));
        tracker.push(0., ms(500));
        tracker.push(10., ms(510));

        assert_eq!(tracker.pos(), 110.);
        assert_abs_diff_eq!(tracker.velocity(), 1000., epsilon = 1e-9);
    }

    #[test]
    fn out_of_order_events_are_ignored() {
        let mut tracker = SwipeTracker::new();
        tracker.push(10., ms(20));
        tracker.push(10., ms(10));
        assert_eq!(tracker.pos(), 10.);
        assert_eq!(tracker.velocity(), 0.);
    }
}
