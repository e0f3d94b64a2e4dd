//! Paged task switcher engine: the recents strip, its gestures, and its state transitions.
//!
//! The entry point is [`overview::RecentsView`], which a host shell drives from its owner thread
//! with input events, task lists and frame ticks, and which reports back through
//! [`overview::RecentsEvent`]s and the collaborator traits in [`host`].

#[macro_use]
extern crate tracing;

pub mod animation;
pub mod error;
pub mod geometry;
pub mod host;
pub mod input;
pub mod overview;
pub mod rubber_band;
pub mod task;
