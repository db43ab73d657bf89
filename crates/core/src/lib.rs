//! Core state machines for stacked-screens navigation.
//!
//! This crate is the gesture and navigation core of a mobile-style
//! "stacked screens" UI: a screen stack with push/pop/replace semantics,
//! an edge-swipe-to-pop gesture, a swipeable tab strip, and the
//! transition bookkeeping that ties them together. Rendering, styling
//! and event-source wiring are external collaborators: they feed raw
//! pointer samples and animation signals in, and consume progress
//! values, committed actions and stack snapshots.
//!
//! The flow, leaves first:
//!
//! - [`input`] normalizes raw samples into a uniform event stream,
//! - [`gesture`] classifies that stream into a direction-locked swipe,
//! - [`policy`] turns a finished swipe into exactly one commit or cancel,
//! - [`stack`] and [`tabs`] apply committed actions,
//! - [`transition`] tracks what the presentation layer is animating,
//! - [`navigator`] assembles one navigation stack end to end.
//!
//! Everything is single-threaded and event-driven: handlers run one at a
//! time in arrival order, and late events for torn-down surfaces are
//! dropped rather than raced.

use std::sync::atomic::{AtomicU64, Ordering};

pub mod gesture;
pub mod input;
pub mod logging;
pub mod navigator;
pub mod policy;
pub mod settings;
pub mod stack;
pub mod tabs;
pub mod transition;

pub use stack::{NavbarOptions, NavigationError, PushOptions};

/// Monotonic id source for handles and registrations.
#[derive(Debug)]
pub struct IdFeeder(AtomicU64);

impl Default for IdFeeder {
    fn default() -> Self {
        IdFeeder::new()
    }
}

impl IdFeeder {
    pub const fn new() -> IdFeeder {
        IdFeeder(AtomicU64::new(1))
    }

    pub fn next(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed)
    }
}

/// A gesture's terminal, policy-approved outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommittedAction {
    /// Pop the top screen off the stack.
    Pop,
    /// Switch the tab strip to `index`.
    SwitchTab { index: usize },
    /// The gesture canceled; nothing changes.
    None,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_feeder_is_monotonic() {
        let feeder = IdFeeder::new();
        let a = feeder.next();
        let b = feeder.next();
        assert!(b > a);
    }
}
