//! Raw pointer-sample normalization.
//!
//! The presentation layer feeds raw `(x, y, timestamp)` samples from whatever
//! input source it has (touch events, pointer events, a replay harness). The
//! [`GestureSampler`] turns that feed into a uniform [`TouchEvent`] stream and
//! nothing else: it carries no gesture policy, it only canonicalizes values so
//! the recognizer downstream can rely on them.
//!
//! Malformed samples (NaN or negative coordinates) are never surfaced as
//! errors. They are canonicalized to the out-of-surface sentinel, which the
//! recognizer treats as an implicit cancel.

/// Sentinel x coordinate for samples that fell outside the touch surface or
/// arrived malformed. The recognizer cancels the gesture when it sees it.
pub const OUT_OF_SURFACE: f64 = -1.0;

/// One normalized pointer sample. Coordinates are logical pixels, the
/// timestamp is in milliseconds on the caller's clock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchSample {
    pub x: f64,
    pub y: f64,
    pub timestamp: f64,
}

/// A normalized input event, ready for the recognizer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TouchEvent {
    Start(TouchSample),
    Move(TouchSample),
    End { timestamp: f64 },
}

/// Normalizes a raw sample feed into [`TouchEvent`]s.
///
/// Guarantees on the output stream:
///
/// - coordinates are finite; NaN/infinite input collapses to
///   [`OUT_OF_SURFACE`],
/// - timestamps are finite and monotonically non-decreasing within the
///   sampler's lifetime (a clock that jumps backwards is clamped to the last
///   seen value).
#[derive(Debug, Default)]
pub struct GestureSampler {
    last_timestamp: f64,
}

impl GestureSampler {
    pub fn new() -> GestureSampler {
        GestureSampler::default()
    }

    pub fn touch_start(&mut self, x: f64, y: f64, timestamp: f64) -> TouchEvent {
        TouchEvent::Start(self.sample(x, y, timestamp))
    }

    pub fn touch_move(&mut self, x: f64, y: f64, timestamp: f64) -> TouchEvent {
        TouchEvent::Move(self.sample(x, y, timestamp))
    }

    pub fn touch_end(&mut self, timestamp: f64) -> TouchEvent {
        TouchEvent::End {
            timestamp: self.clamp_timestamp(timestamp),
        }
    }

    fn sample(&mut self, x: f64, y: f64, timestamp: f64) -> TouchSample {
        let (x, y) = if x.is_finite() && y.is_finite() {
            (x, y)
        } else {
            tracing::debug!(x, y, "malformed sample, canonicalizing out of surface");
            (OUT_OF_SURFACE, 0.0)
        };

        TouchSample {
            x,
            y,
            timestamp: self.clamp_timestamp(timestamp),
        }
    }

    fn clamp_timestamp(&mut self, timestamp: f64) -> f64 {
        if timestamp.is_finite() && timestamp >= self.last_timestamp {
            self.last_timestamp = timestamp;
        }
        self.last_timestamp
    }
}
