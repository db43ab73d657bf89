//! Swipe recognition state machine.
//!
//! [`SwipeRecognizer`] classifies a stream of [`TouchEvent`]s into one of
//! four phases: `idle`, `tracking` (touch down, direction unknown),
//! `swiping` (direction locked to the horizontal axis) and `canceled`
//! (wrong direction or out-of-surface input). While swiping it exposes a
//! continuous progress value; on touch end it hands the final displacement
//! to the caller exactly once, for the commit policy to judge.
//!
//! The same recognizer drives both the edge-swipe-to-pop gesture on the
//! screen stack and the horizontal tab-switch gesture; only the commit
//! policies differ (see [`crate::policy`]).

use crate::input::{TouchEvent, TouchSample};

/// Displacements shorter than this are noise; no classification happens.
pub const DEAD_ZONE_PX: f64 = 10.0;

/// Upper bound of the classification window. Once the touch has traveled
/// farther than this without a decision, the gesture stays in `tracking`
/// for the rest of the cycle: it can no longer commit, but it is not
/// canceled either.
pub const CLASSIFY_WINDOW_MAX_PX: f64 = 50.0;

/// A displacement classifies as horizontal when `|dy| / |dx|` is below
/// this ratio; anything steeper cancels the gesture.
pub const AXIS_LOCK_RATIO: f64 = 0.5;

/// Recognizer phase. At most one touch sequence is live at a time;
/// `Canceled` is terminal for the current sequence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GesturePhase {
    Idle,
    Tracking { x0: f64, y0: f64, started_at: f64 },
    Swiping { x0: f64, dx: f64, started_at: f64 },
    Canceled,
}

impl GesturePhase {
    pub fn is_swiping(&self) -> bool {
        matches!(self, GesturePhase::Swiping { .. })
    }
}

/// Terminal measurement of a swipe, produced once per gesture on touch end.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureEnd {
    /// Net horizontal displacement at release, in logical pixels.
    pub dx: f64,
    /// Time between touch start and release, in milliseconds.
    pub elapsed_ms: f64,
}

/// The direction-locking swipe state machine.
///
/// `idle → tracking → {swiping | canceled} → idle`; both a canceled
/// sequence and a committed one return to `idle` on touch end.
#[derive(Debug)]
pub struct SwipeRecognizer {
    phase: GesturePhase,
}

impl Default for SwipeRecognizer {
    fn default() -> Self {
        SwipeRecognizer::new()
    }
}

impl SwipeRecognizer {
    pub fn new() -> SwipeRecognizer {
        SwipeRecognizer {
            phase: GesturePhase::Idle,
        }
    }

    /// Rebuilds a recognizer from a stored phase. This is how the pure
    /// tab reducer runs the same state machine without holding one.
    pub fn from_phase(phase: GesturePhase) -> SwipeRecognizer {
        SwipeRecognizer { phase }
    }

    pub fn phase(&self) -> GesturePhase {
        self.phase
    }

    /// Continuous progress while swiping: `dx / reference_width`, clamped
    /// to `[-1, 1]`. `None` in every other phase. Sign interpretation is
    /// the caller's: the screen stack reads positive as pop intent, the
    /// tab strip reads negative as next-tab.
    pub fn progress(&self, reference_width: f64) -> Option<f64> {
        match self.phase {
            GesturePhase::Swiping { dx, .. } if reference_width > 0.0 => {
                Some((dx / reference_width).clamp(-1.0, 1.0))
            }
            _ => None,
        }
    }

    /// Feeds one event through the state machine.
    ///
    /// Returns `Some(GestureEnd)` exactly when a touch end releases a live
    /// swipe; the caller passes it to a commit policy. Every touch end
    /// returns the recognizer to `Idle` regardless of outcome.
    pub fn handle(&mut self, event: &TouchEvent) -> Option<GestureEnd> {
        match *event {
            TouchEvent::Start(sample) => {
                self.on_start(sample);
                None
            }
            TouchEvent::Move(sample) => {
                self.on_move(sample);
                None
            }
            TouchEvent::End { timestamp } => self.on_end(timestamp),
        }
    }

    fn on_start(&mut self, sample: TouchSample) {
        if sample.x < 0.0 {
            tracing::debug!(x = sample.x, "touch start out of surface, canceling");
            self.phase = GesturePhase::Canceled;
            return;
        }

        // A fresh touch start supersedes whatever the previous sequence
        // left behind, including a terminal `Canceled`.
        self.phase = GesturePhase::Tracking {
            x0: sample.x,
            y0: sample.y,
            started_at: sample.timestamp,
        };
    }

    fn on_move(&mut self, sample: TouchSample) {
        if sample.x < 0.0 {
            self.phase = GesturePhase::Canceled;
            return;
        }

        match self.phase {
            GesturePhase::Idle => {
                // Tolerated as an implicit start: the surface may have
                // missed the start event. See DESIGN.md.
                tracing::debug!("move while idle, treating as implicit start");
                self.phase = GesturePhase::Tracking {
                    x0: sample.x,
                    y0: sample.y,
                    started_at: sample.timestamp,
                };
            }
            GesturePhase::Tracking { x0, y0, started_at } => {
                let dx = sample.x - x0;
                let dy = sample.y - y0;
                let distance = (dx * dx + dy * dy).sqrt();

                if distance < DEAD_ZONE_PX || distance > CLASSIFY_WINDOW_MAX_PX {
                    // Not enough signal yet, or the classification window
                    // has passed; either way, stay put.
                    return;
                }

                if dy.abs() / dx.abs() < AXIS_LOCK_RATIO {
                    self.phase = GesturePhase::Swiping {
                        x0,
                        dx: 0.0,
                        started_at,
                    };
                } else {
                    self.phase = GesturePhase::Canceled;
                }
            }
            GesturePhase::Swiping { x0, started_at, .. } => {
                self.phase = GesturePhase::Swiping {
                    x0,
                    dx: sample.x - x0,
                    started_at,
                };
            }
            GesturePhase::Canceled => {}
        }
    }

    fn on_end(&mut self, timestamp: f64) -> Option<GestureEnd> {
        let end = match self.phase {
            GesturePhase::Swiping { dx, started_at, .. } => Some(GestureEnd {
                dx,
                elapsed_ms: timestamp - started_at,
            }),
            _ => None,
        };

        self.phase = GesturePhase::Idle;
        end
    }
}
