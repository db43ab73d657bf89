//! Commit policies for terminated gestures.
//!
//! A policy is a pure function of a gesture's terminal measurement; it is
//! invoked exactly once per touch end and produces exactly one outcome.
//! The screen stack and the tab strip deliberately use different rules:
//!
//! - [`PopCommitPolicy`] combines release velocity with a fraction of the
//!   dragged frame's width,
//! - [`TabCommitPolicy`] looks only at the final accumulated displacement
//!   against an absolute pixel threshold.
//!
//! The asymmetry is observable behavior carried over from the navigator
//! this core was built for; the two rules are kept as independently
//! tunable policies rather than unified.
//!
//! All comparisons are strict; a measurement that lands exactly on a
//! threshold does not commit (except the tab previous-tab rule, whose
//! `>=` is part of its observable contract).

use crate::gesture::GestureEnd;

/// Outcome of a pop gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitDecision {
    Commit,
    Cancel,
}

/// Outcome of a tab swipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabDecision {
    /// Switch to `active_tab_index + 1`.
    Next,
    /// Switch to `active_tab_index - 1`.
    Previous,
    Cancel,
}

/// Edge-swipe-to-pop rule: commit iff the release velocity exceeds
/// `velocity_threshold` px/ms, or the displacement covers more than
/// `distance_fraction` of the dragged frame's width.
///
/// The frame width is sampled once at touch start and must not be
/// re-measured during the drag; pass that sampled value here.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PopCommitPolicy {
    pub velocity_threshold: f64,
    pub distance_fraction: f64,
}

impl Default for PopCommitPolicy {
    fn default() -> Self {
        PopCommitPolicy {
            velocity_threshold: 1.0,
            distance_fraction: 0.4,
        }
    }
}

impl PopCommitPolicy {
    pub fn decide(&self, end: GestureEnd, frame_width: f64) -> CommitDecision {
        let velocity = if end.elapsed_ms > 0.0 {
            end.dx / end.elapsed_ms
        } else {
            // Zero or garbage elapsed time carries no velocity signal.
            0.0
        };

        let fraction = if frame_width > 0.0 {
            end.dx / frame_width
        } else {
            0.0
        };

        if velocity > self.velocity_threshold || fraction > self.distance_fraction {
            CommitDecision::Commit
        } else {
            CommitDecision::Cancel
        }
    }
}

/// Tab-switch rule: commit on the final accumulated displacement only.
///
/// `dx < -distance_px` switches to the next tab, `dx >= distance_px` to
/// the previous one, and each direction is additionally guarded by that
/// neighbor actually existing. The threshold is an absolute pixel
/// distance, deliberately not normalized by the container width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TabCommitPolicy {
    pub distance_px: f64,
}

impl Default for TabCommitPolicy {
    fn default() -> Self {
        TabCommitPolicy { distance_px: 100.0 }
    }
}

impl TabCommitPolicy {
    pub fn decide(&self, dx: f64, active_tab_index: usize, tab_count: usize) -> TabDecision {
        let has_next = active_tab_index + 1 < tab_count;
        let has_previous = active_tab_index > 0;

        if dx < -self.distance_px && has_next {
            TabDecision::Next
        } else if dx >= self.distance_px && has_previous {
            TabDecision::Previous
        } else {
            TabDecision::Cancel
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn end(dx: f64, elapsed_ms: f64) -> GestureEnd {
        GestureEnd { dx, elapsed_ms }
    }

    #[test]
    fn test_pop_distance_rule_dominates_at_zero_velocity() {
        let policy = PopCommitPolicy::default();
        // dx / frame_width = 0.41, velocity = 0.41 px/ms over a full second.
        let decision = policy.decide(end(410.0, 1000.0), 1000.0);
        assert_eq!(decision, CommitDecision::Commit);
    }

    #[test]
    fn test_pop_velocity_rule_dominates_at_short_distance() {
        let policy = PopCommitPolicy::default();
        // dx / frame_width = 0.1, velocity = 1.5 px/ms.
        let decision = policy.decide(end(100.0, 100.0 / 1.5), 1000.0);
        assert_eq!(decision, CommitDecision::Commit);
    }

    #[test]
    fn test_pop_cancels_when_neither_rule_fires() {
        let policy = PopCommitPolicy::default();
        // dx / frame_width = 0.1, velocity = 0.5 px/ms.
        let decision = policy.decide(end(100.0, 200.0), 1000.0);
        assert_eq!(decision, CommitDecision::Cancel);
    }

    #[test]
    fn test_pop_threshold_ties_do_not_commit() {
        let policy = PopCommitPolicy::default();
        // Exactly 1.0 px/ms and exactly 0.4 of the frame.
        let decision = policy.decide(end(400.0, 400.0), 1000.0);
        assert_eq!(decision, CommitDecision::Cancel);
    }

    #[test]
    fn test_pop_ignores_degenerate_frame_width() {
        let policy = PopCommitPolicy::default();
        let decision = policy.decide(end(100.0, 1000.0), 0.0);
        assert_eq!(decision, CommitDecision::Cancel);
    }

    #[test]
    fn test_pop_ignores_degenerate_elapsed_time() {
        let policy = PopCommitPolicy::default();
        let decision = policy.decide(end(100.0, 0.0), 1000.0);
        assert_eq!(decision, CommitDecision::Cancel);
    }

    #[test]
    fn test_tab_next_commits_past_threshold() {
        let policy = TabCommitPolicy::default();
        assert_eq!(policy.decide(-101.0, 0, 3), TabDecision::Next);
    }

    #[test]
    fn test_tab_next_requires_a_next_tab() {
        let policy = TabCommitPolicy::default();
        assert_eq!(policy.decide(-101.0, 2, 3), TabDecision::Cancel);
    }

    #[test]
    fn test_tab_previous_commits_at_threshold() {
        let policy = TabCommitPolicy::default();
        // The previous-tab rule is inclusive.
        assert_eq!(policy.decide(100.0, 1, 3), TabDecision::Previous);
    }

    #[test]
    fn test_tab_previous_requires_a_previous_tab() {
        let policy = TabCommitPolicy::default();
        assert_eq!(policy.decide(101.0, 0, 3), TabDecision::Cancel);
    }

    #[test]
    fn test_tab_next_threshold_tie_cancels() {
        let policy = TabCommitPolicy::default();
        assert_eq!(policy.decide(-100.0, 0, 3), TabDecision::Cancel);
    }

    #[test]
    fn test_tab_short_swipe_cancels_anywhere() {
        let policy = TabCommitPolicy::default();
        for index in 0..3 {
            assert_eq!(policy.decide(99.0, index, 3), TabDecision::Cancel);
            assert_eq!(policy.decide(-99.0, index, 3), TabDecision::Cancel);
        }
    }
}
