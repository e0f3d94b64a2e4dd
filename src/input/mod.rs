//! Raw input models and recognizers.

pub mod keyboard;
pub mod swipe_tracker;
pub mod touch;

pub use keyboard::{action_for_key, Key, KeyAction, KeyEvent, Modifiers};
pub use touch::{
    DragMode, GestureConfig, GestureRecognizer, GestureSession, Pointer, TouchAction, TouchEvent,
    TouchIntent, TouchPhase, TouchTarget,
};
