//! A value that can be static, animating, or following a finger.

use crate::animation::{Animation, Clock};

/// State of a finger-controlled value.
#[derive(Debug, Clone)]
pub struct ValueGesture {
    /// Value as shown, after overscroll damping.
    pub current: f64,
    /// Undamped value accumulated from the finger.
    pub raw: f64,
    /// Value when the gesture started, for restoring on cancel.
    pub stationary: f64,
}

#[derive(Debug, Clone)]
pub enum AnimatedValue {
    Static(f64),
    Animation(Animation),
    Gesture(ValueGesture),
}

impl ValueGesture {
    pub fn new(value: f64) -> Self {
        Self {
            current: value,
            raw: value,
            stationary: value,
        }
    }
}

impl AnimatedValue {
    pub fn new(value: f64) -> Self {
        Self::Static(value)
    }

    pub fn current(&self) -> f64 {
        match self {
            AnimatedValue::Static(value) => *value,
            AnimatedValue::Animation(anim) => anim.value(),
            AnimatedValue::Gesture(gesture) => gesture.current,
        }
    }

    /// Returns the value this is heading towards.
    pub fn target(&self) -> f64 {
        match self {
            AnimatedValue::Static(value) => *value,
            AnimatedValue::Animation(anim) => anim.to(),
            AnimatedValue::Gesture(gesture) => gesture.current,
        }
    }

    /// Returns a value that doesn't depend on an in-progress animation or gesture.
    pub fn stationary(&self) -> f64 {
        match self {
            AnimatedValue::Static(value) => *value,
            AnimatedValue::Animation(anim) => anim.to(),
            AnimatedValue::Gesture(gesture) => gesture.stationary,
        }
    }

    pub fn is_static(&self) -> bool {
        matches!(self, Self::Static(_))
    }

    pub fn is_gesture(&self) -> bool {
        matches!(self, Self::Gesture(_))
    }

    pub fn is_animation_ongoing(&self) -> bool {
        matches!(self, Self::Animation(_))
    }

    pub fn animation(&self) -> Option<&Animation> {
        match self {
            AnimatedValue::Animation(anim) => Some(anim),
            _ => None,
        }
    }

    /// Replaces a finished animation with its final value.
    ///
    /// Returns `true` if an animation finished.
    pub fn advance(&mut self) -> bool {
        if let AnimatedValue::Animation(anim) = self {
            if anim.is_done() {
                *self = AnimatedValue::Static(anim.to());
                return true;
            }
        }
        false
    }

    /// Starts following a finger from the current value.
    pub fn begin_gesture(&mut self) {
        *self = AnimatedValue::Gesture(ValueGesture::new(self.current()));
    }

    /// Cancels the ongoing gesture, keeping the current value.
    pub fn cancel_gesture(&mut self) {
        if let AnimatedValue::Gesture(gesture) = self {
            *self = AnimatedValue::Static(gesture.current);
        }
    }

    /// Stops any animation or gesture at the current value.
    pub fn stop_anim_and_gesture(&mut self) {
        *self = AnimatedValue::Static(self.current());
    }

    /// Animates from the current value to `to`.
    pub fn animate_to(
        &mut self,
        clock: Clock,
        to: f64,
        velocity: f64,
        config: recents_config::Animation,
    ) {
        let from = self.current();
        *self = AnimatedValue::Animation(Animation::new(clock, from, to, velocity, config));
    }
}
