use std::time::Duration;

use keyframe::functions::{EaseInQuad, EaseInQuart, EaseOutCubic, EaseOutQuad, EaseOutQuart};
use keyframe::EasingFunction;
use recents_config::AnimationCurve;

mod spring;
pub use spring::{Spring, SpringParams};

mod clock;
pub use clock::Clock;

/// Deceleration rate of a free fling, per millisecond.
pub const FLING_DECELERATION: f64 = 0.998;

/// Velocity in units per second below which a deceleration counts as stopped.
pub const DECELERATION_THRESHOLD: f64 = 0.1;

#[derive(Debug, Clone)]
pub struct Animation {
    from: f64,
    to: f64,
    initial_velocity: f64,
    is_off: bool,
    duration: Duration,
    /// Time until the animation first reaches `to`.
    ///
    /// Best effort; not always exactly precise.
    clamped_duration: Duration,
    start_time: Duration,
    clock: Clock,
    kind: Kind,
}

#[derive(Debug, Clone, Copy)]
enum Kind {
    Easing {
        curve: Curve,
    },
    Spring(Spring),
    Deceleration {
        initial_velocity: f64,
        deceleration_rate: f64,
    },
}

/// Named interpolators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Curve {
    Linear,
    Accel,
    Accel2,
    Deaccel,
    Deaccel15,
    Deaccel2,
    AccelDeaccel,
    EaseOutExpo,
}

impl Animation {
    pub fn new(
        clock: Clock,
        from: f64,
        to: f64,
        initial_velocity: f64,
        config: recents_config::Animation,
    ) -> Self {
        let mut rv = Self::ease(clock, from, to, initial_velocity, 0, Curve::Linear);
        if config.off {
            rv.is_off = true;
            return rv;
        }

        rv.replace_config(config);
        rv
    }

    pub fn replace_config(&mut self, config: recents_config::Animation) {
        self.is_off = config.off;
        if config.off {
            self.duration = Duration::ZERO;
            self.clamped_duration = Duration::ZERO;
            return;
        }

        let start_time = self.start_time;

        match config.kind {
            recents_config::AnimationKind::Spring(p) => {
                let params =
                    SpringParams::new(p.damping_ratio.0, f64::from(p.stiffness), p.epsilon.0);

                let spring = Spring {
                    from: self.from,
                    to: self.to,
                    initial_velocity: self.initial_velocity,
                    params,
                };
                *self = Self::spring(self.clock.clone(), spring);
            }
            recents_config::AnimationKind::Easing(p) => {
                *self = Self::ease(
                    self.clock.clone(),
                    self.from,
                    self.to,
                    self.initial_velocity,
                    u64::from(p.duration_ms),
                    Curve::from(p.curve),
                );
            }
        }

        self.start_time = start_time;
    }

    /// Restarts the animation using the previous config.
    pub fn restarted(&self, from: f64, to: f64, initial_velocity: f64) -> Self {
        if self.is_off {
            return self.clone();
        }

        // Kind is the only thing that we need to restart from scratch.
        match self.kind {
            Kind::Easing { curve } => Self::ease(
                self.clock.clone(),
                from,
                to,
                initial_velocity,
                self.duration.as_millis() as u64,
                curve,
            ),
            Kind::Spring(spring) => {
                let spring = Spring {
                    from,
                    to,
                    initial_velocity,
                    params: spring.params,
                };
                Self::spring(self.clock.clone(), spring)
            }
            Kind::Deceleration {
                deceleration_rate, ..
            } => {
                Self::decelerate(
                    self.clock.clone(),
                    from,
                    initial_velocity,
                    deceleration_rate,
                    DECELERATION_THRESHOLD,
                )
            }
        }
    }

    pub fn ease(
        clock: Clock,
        from: f64,
        to: f64,
        initial_velocity: f64,
        duration_ms: u64,
        curve: Curve,
    ) -> Self {
        // FIXME: ideally we would use the initial velocity here too.
        let duration = Duration::from_millis(duration_ms);
        let kind = Kind::Easing { curve };

        Self {
            from,
            to,
            initial_velocity,
            is_off: false,
            duration,
            clamped_duration: duration,
            start_time: clock.now(),
            clock,
            kind,
        }
    }

    pub fn spring(clock: Clock, spring: Spring) -> Self {
        let _span = tracy_client::span!("Animation::spring");

        let duration = spring.duration();
        let clamped_duration = spring.clamped_duration().unwrap_or(duration);
        let kind = Kind::Spring(spring);

        Self {
            from: spring.from,
            to: spring.to,
            initial_velocity: spring.initial_velocity,
            is_off: false,
            duration,
            clamped_duration,
            start_time: clock.now(),
            clock,
            kind,
        }
    }

    /// Free deceleration from `from` with `initial_velocity` in units per second.
    pub fn decelerate(
        clock: Clock,
        from: f64,
        initial_velocity: f64,
        deceleration_rate: f64,
        threshold: f64,
    ) -> Self {
        let duration_s = if initial_velocity == 0. {
            0.
        } else {
            let coeff = 1000. * deceleration_rate.ln();
            (-coeff * threshold / initial_velocity.abs()).ln() / coeff
        };
        let duration = Duration::from_secs_f64(duration_s.max(0.));

        let to = from - initial_velocity / (1000. * deceleration_rate.ln());

        let kind = Kind::Deceleration {
            initial_velocity,
            deceleration_rate,
        };

        Self {
            from,
            to,
            initial_velocity,
            is_off: false,
            duration,
            clamped_duration: duration,
            start_time: clock.now(),
            clock,
            kind,
        }
    }

    pub fn is_done(&self) -> bool {
        if self.clock.should_complete_instantly() {
            return true;
        }

        self.clock.now() >= self.start_time.saturating_add(self.duration)
    }

    pub fn is_clamped_done(&self) -> bool {
        if self.clock.should_complete_instantly() {
            return true;
        }

        self.clock.now() >= self.start_time.saturating_add(self.clamped_duration)
    }

    pub fn value_at(&self, at: Duration) -> f64 {
        if at <= self.start_time {
            // Return from when at == start_time so that when the animations are off, the behavior
            // within a single event loop cycle (i.e. no time had passed since the start of an
            // animation) matches the behavior when the animations are on.
            return self.from;
        } else if self.start_time.saturating_add(self.duration) <= at {
            return self.to;
        }

        if self.clock.should_complete_instantly() {
            return self.to;
        }

        let passed = at.saturating_sub(self.start_time);

        match self.kind {
            Kind::Easing { curve } => {
                let passed = passed.as_secs_f64();
                let total = self.duration.as_secs_f64();
                let x = (passed / total).clamp(0., 1.);
                curve.y(x) * (self.to - self.from) + self.from
            }
            Kind::Spring(spring) => {
                let value = spring.value_at(passed);

                // Protect against numerical instability.
                if value.is_finite() {
                    value
                } else {
                    warn!("spring animation produced a non-finite value, jumping to the end");
                    self.to
                }
            }
            Kind::Deceleration {
                initial_velocity,
                deceleration_rate,
            } => {
                let passed = passed.as_secs_f64();
                let coeff = 1000. * deceleration_rate.ln();
                self.from + (deceleration_rate.powf(1000. * passed) - 1.) / coeff * initial_velocity
            }
        }
    }

    pub fn value(&self) -> f64 {
        self.value_at(self.clock.now())
    }

    /// Returns a value that stops at the target value after first reaching it.
    ///
    /// Best effort; not always exactly precise.
    pub fn clamped_value(&self) -> f64 {
        if self.is_clamped_done() {
            return self.to;
        }

        self.value()
    }

    /// Linear progress of the animation in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        if self.is_done() {
            return 1.;
        }

        let passed = self.clock.now().saturating_sub(self.start_time);
        (passed.as_secs_f64() / self.duration.as_secs_f64()).clamp(0., 1.)
    }

    pub fn to(&self) -> f64 {
        self.to
    }

    pub fn from(&self) -> f64 {
        self.from
    }

    pub fn start_time(&self) -> Duration {
        self.start_time
    }

    pub fn end_time(&self) -> Duration {
        self.start_time.saturating_add(self.duration)
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn offset(&mut self, offset: f64) {
        self.from += offset;
        self.to += offset;

        if let Kind::Spring(spring) = &mut self.kind {
            spring.from += offset;
            spring.to += offset;
        }
    }
}

impl Curve {
    pub fn y(self, x: f64) -> f64 {
        match self {
            Curve::Linear => x,
            Curve::Accel => EaseInQuad.y(x),
            Curve::Accel2 => EaseInQuart.y(x),
            Curve::Deaccel => EaseOutQuad.y(x),
            Curve::Deaccel15 => EaseOutCubic.y(x),
            Curve::Deaccel2 => EaseOutQuart.y(x),
            Curve::AccelDeaccel => ((x + 1.) * std::f64::consts::PI).cos() / 2. + 0.5,
            Curve::EaseOutExpo => {
                if x == 1. {
                    1.
                } else {
                    1. - 2f64.powf(-10. * x)
                }
            }
        }
    }

    /// Evaluates the curve over the `[start, end]` sub-range of the overall progress.
    pub fn clamp_to_progress(self, progress: f64, start: f64, end: f64) -> f64 {
        if progress <= start {
            return 0.;
        }
        if progress >= end {
            return 1.;
        }
        self.y((progress - start) / (end - start))
    }

    /// Curve configured for an easing animation, or `fallback` for springs.
    pub fn from_config_or(config: recents_config::Animation, fallback: Curve) -> Curve {
        match config.kind {
            recents_config::AnimationKind::Easing(p) => Curve::from(p.curve),
            recents_config::AnimationKind::Spring(_) => fallback,
        }
    }
}

impl From<AnimationCurve> for Curve {
    fn from(value: AnimationCurve) -> Self {
        match value {
            AnimationCurve::Linear => Curve::Linear,
            AnimationCurve::Accel => Curve::Accel,
            AnimationCurve::Accel2 => Curve::Accel2,
            AnimationCurve::Deaccel => Curve::Deaccel,
            AnimationCurve::Deaccel15 => Curve::Deaccel15,
            AnimationCurve::Deaccel2 => Curve::Deaccel2,
            AnimationCurve::AccelDeaccel => Curve::AccelDeaccel,
            AnimationCurve::EaseOutExpo => Curve::EaseOutExpo,
        }
    }
}
