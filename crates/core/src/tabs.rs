//! Swipeable tab strip state.
//!
//! The tab strip runs the same direction-locked swipe machine as the
//! screen stack, specialized for horizontal tab switching: a committed
//! left swipe selects the next tab, a committed right swipe the previous
//! one, judged by [`TabCommitPolicy`] on the final displacement.
//!
//! The core is [`apply`], a pure function from `(state, action)` to
//! `(state, effects)`. [`TabStore`] is the thin stateful wrapper around
//! it: it queues the emitted effects and delivers them synchronously, in
//! order, to subscribers after every dispatch. Dispatch is sequential;
//! there is no concurrent reordering to defend against.

use std::collections::VecDeque;

use crate::gesture::{GesturePhase, SwipeRecognizer};
use crate::input::{TouchEvent, TouchSample, OUT_OF_SURFACE};
use crate::policy::{TabCommitPolicy, TabDecision};
use crate::IdFeeder;

lazy_static::lazy_static! {
    static ref SUBSCRIPTION_IDS: IdFeeder = IdFeeder::new();
}

/// Tab strip state: the tab bookkeeping plus the live gesture phase.
///
/// Invariants: `tab_count >= 1` and `active_tab_index < tab_count`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TabState {
    pub tab_count: usize,
    pub active_tab_index: usize,
    pub phase: GesturePhase,
}

impl TabState {
    pub fn new(tab_count: usize) -> TabState {
        TabState {
            tab_count: tab_count.max(1),
            active_tab_index: 0,
            phase: GesturePhase::Idle,
        }
    }
}

/// Actions accepted by the reducer. Touch actions carry raw coordinates;
/// the reducer canonicalizes them the way the sampler would.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TabAction {
    TouchStart { x: f64, y: f64, timestamp: f64 },
    TouchMove { x: f64, y: f64, timestamp: f64 },
    TouchEnd { timestamp: f64 },
    /// External selection, e.g. a tap on a tab button.
    SelectTab { index: usize },
}

/// Effects emitted by [`apply`], delivered through the store's queue.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TabEffect {
    /// Continuous drag displacement while a swipe is live. Negative dx
    /// drags toward the next tab.
    Progress { dx: f64 },
    /// The active tab changed, by commit or by external selection.
    Switched { from: usize, to: usize },
    /// A live swipe ended or was invalidated without a commit; visuals
    /// snap back.
    Canceled,
}

/// The pure tab reducer: no side effects, no hidden state.
pub fn apply(
    state: &TabState,
    action: &TabAction,
    policy: &TabCommitPolicy,
) -> (TabState, Vec<TabEffect>) {
    let mut next = *state;
    let mut effects = Vec::new();

    let event = match *action {
        TabAction::SelectTab { index } => {
            if index < state.tab_count && index != state.active_tab_index {
                next.active_tab_index = index;
                effects.push(TabEffect::Switched {
                    from: state.active_tab_index,
                    to: index,
                });
            }
            return (next, effects);
        }
        TabAction::TouchStart { x, y, timestamp } => {
            TouchEvent::Start(canonical_sample(x, y, timestamp))
        }
        TabAction::TouchMove { x, y, timestamp } => {
            TouchEvent::Move(canonical_sample(x, y, timestamp))
        }
        TabAction::TouchEnd { timestamp } => TouchEvent::End { timestamp },
    };

    let was_swiping = state.phase.is_swiping();
    let mut recognizer = SwipeRecognizer::from_phase(state.phase);
    let end = recognizer.handle(&event);
    next.phase = recognizer.phase();

    if let Some(end) = end {
        match policy.decide(end.dx, state.active_tab_index, state.tab_count) {
            TabDecision::Next => {
                next.active_tab_index = state.active_tab_index + 1;
                effects.push(TabEffect::Switched {
                    from: state.active_tab_index,
                    to: next.active_tab_index,
                });
            }
            TabDecision::Previous => {
                next.active_tab_index = state.active_tab_index - 1;
                effects.push(TabEffect::Switched {
                    from: state.active_tab_index,
                    to: next.active_tab_index,
                });
            }
            TabDecision::Cancel => effects.push(TabEffect::Canceled),
        }
    } else if let GesturePhase::Swiping { dx, .. } = next.phase {
        effects.push(TabEffect::Progress { dx });
    } else if was_swiping {
        // The swipe died without reaching the policy (out-of-surface
        // input); the strip still has to snap back.
        effects.push(TabEffect::Canceled);
    }

    (next, effects)
}

fn canonical_sample(x: f64, y: f64, timestamp: f64) -> TouchSample {
    let (x, y) = if x.is_finite() && y.is_finite() {
        (x, y)
    } else {
        (OUT_OF_SURFACE, 0.0)
    };
    TouchSample { x, y, timestamp }
}

/// Handle returned by [`TabStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionId(u64);

type Subscriber = Box<dyn FnMut(&TabState, &TabEffect)>;

/// Stateful wrapper around [`apply`].
///
/// Effects pass through an explicit queue: `dispatch` applies the
/// reducer, enqueues whatever it emitted, then drains the queue to the
/// subscribers in registration order. Subscribers run synchronously on
/// the dispatching call.
pub struct TabStore {
    state: TabState,
    policy: TabCommitPolicy,
    effects: VecDeque<TabEffect>,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
}

impl TabStore {
    pub fn new(tab_count: usize) -> TabStore {
        TabStore::with_policy(tab_count, TabCommitPolicy::default())
    }

    pub fn with_policy(tab_count: usize, policy: TabCommitPolicy) -> TabStore {
        TabStore {
            state: TabState::new(tab_count),
            policy,
            effects: VecDeque::new(),
            subscribers: Vec::new(),
        }
    }

    pub fn state(&self) -> &TabState {
        &self.state
    }

    /// Applies one action. Returns the newly active tab index when the
    /// action committed a switch, `None` otherwise.
    pub fn dispatch(&mut self, action: TabAction) -> Option<usize> {
        let (state, effects) = apply(&self.state, &action, &self.policy);
        self.state = state;

        let mut committed = None;
        for effect in effects {
            if let TabEffect::Switched { to, .. } = effect {
                committed = Some(to);
            }
            self.effects.push_back(effect);
        }

        while let Some(effect) = self.effects.pop_front() {
            for (_, subscriber) in self.subscribers.iter_mut() {
                subscriber(&self.state, &effect);
            }
        }

        committed
    }

    /// Selects a tab directly, bypassing the gesture machinery.
    pub fn select_tab(&mut self, index: usize) -> Option<usize> {
        self.dispatch(TabAction::SelectTab { index })
    }

    pub fn subscribe<F>(&mut self, subscriber: F) -> SubscriptionId
    where
        F: FnMut(&TabState, &TabEffect) + 'static,
    {
        let id = SubscriptionId(SUBSCRIPTION_IDS.next());
        self.subscribers.push((id, Box::new(subscriber)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) {
        self.subscribers.retain(|(sid, _)| *sid != id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn start(x: f64) -> TabAction {
        TabAction::TouchStart {
            x,
            y: 0.0,
            timestamp: 0.0,
        }
    }

    fn mv(x: f64, timestamp: f64) -> TabAction {
        TabAction::TouchMove {
            x,
            y: 0.0,
            timestamp,
        }
    }

    fn end(timestamp: f64) -> TabAction {
        TabAction::TouchEnd { timestamp }
    }

    /// Start at `x0`, lock the swipe, drag to a final displacement of
    /// `dx`, release.
    fn swipe(store: &mut TabStore, x0: f64, dx: f64) -> Option<usize> {
        store.dispatch(start(x0));
        let lock_x = x0 + if dx < 0.0 { -20.0 } else { 20.0 };
        store.dispatch(mv(lock_x, 10.0));
        store.dispatch(mv(x0 + dx, 50.0));
        store.dispatch(end(100.0))
    }

    #[test]
    fn test_swipe_left_past_threshold_switches_to_next_tab() {
        let mut store = TabStore::new(3);
        let committed = swipe(&mut store, 200.0, -101.0);
        assert_eq!(committed, Some(1));
        assert_eq!(store.state().active_tab_index, 1);
        assert_eq!(store.state().phase, GesturePhase::Idle);
    }

    #[test]
    fn test_swipe_left_on_last_tab_cancels() {
        let mut store = TabStore::new(3);
        store.select_tab(2);
        let committed = swipe(&mut store, 200.0, -101.0);
        assert_eq!(committed, None);
        assert_eq!(store.state().active_tab_index, 2);
    }

    #[test]
    fn test_short_swipe_cancels_regardless_of_position() {
        let mut store = TabStore::new(3);
        store.select_tab(1);
        assert_eq!(swipe(&mut store, 200.0, 99.0), None);
        assert_eq!(store.state().active_tab_index, 1);
        assert_eq!(swipe(&mut store, 200.0, -99.0), None);
        assert_eq!(store.state().active_tab_index, 1);
    }

    #[test]
    fn test_swipe_right_at_threshold_switches_to_previous_tab() {
        let mut store = TabStore::new(3);
        store.select_tab(2);
        assert_eq!(swipe(&mut store, 200.0, 100.0), Some(1));
        assert_eq!(store.state().active_tab_index, 1);
    }

    #[test]
    fn test_every_touch_sequence_ends_idle() {
        let mut store = TabStore::new(2);
        for dx in [-150.0, -50.0, 0.0, 50.0, 150.0] {
            swipe(&mut store, 300.0, dx);
            assert_eq!(store.state().phase, GesturePhase::Idle, "dx={}", dx);
        }
    }

    #[test]
    fn test_apply_is_pure() {
        let policy = TabCommitPolicy::default();
        let state = TabState::new(3);
        let action = start(100.0);

        let (a, _) = apply(&state, &action, &policy);
        let (b, _) = apply(&state, &action, &policy);
        assert_eq!(a, b);
        assert_eq!(state.phase, GesturePhase::Idle);
    }

    #[test]
    fn test_progress_effects_stream_during_swipe() {
        let mut store = TabStore::new(2);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        store.subscribe(move |_, effect| {
            if let TabEffect::Progress { dx } = *effect {
                sink.borrow_mut().push(dx);
            }
        });

        store.dispatch(start(200.0));
        // The classifying move resets dx to zero; progress starts there.
        store.dispatch(mv(180.0, 10.0));
        store.dispatch(mv(150.0, 20.0));
        store.dispatch(mv(120.0, 30.0));

        assert_eq!(*seen.borrow(), vec![0.0, -50.0, -80.0]);
    }

    #[test]
    fn test_subscribers_see_effects_in_order_with_new_state() {
        let mut store = TabStore::new(3);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        store.subscribe(move |state, effect| {
            sink.borrow_mut().push((state.active_tab_index, *effect));
        });

        swipe(&mut store, 200.0, -101.0);

        let log = seen.borrow();
        assert!(matches!(
            log.last(),
            Some((1, TabEffect::Switched { from: 0, to: 1 }))
        ));
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let mut store = TabStore::new(3);
        let count = Rc::new(RefCell::new(0usize));
        let sink = Rc::clone(&count);
        let id = store.subscribe(move |_, _| *sink.borrow_mut() += 1);

        store.select_tab(1);
        let seen = *count.borrow();
        assert!(seen > 0);

        store.unsubscribe(id);
        store.select_tab(2);
        assert_eq!(*count.borrow(), seen);
    }

    #[test]
    fn test_select_tab_out_of_range_is_ignored() {
        let mut store = TabStore::new(2);
        assert_eq!(store.select_tab(5), None);
        assert_eq!(store.state().active_tab_index, 0);
    }

    #[test]
    fn test_canceled_effect_on_swipe_that_misses_threshold() {
        let mut store = TabStore::new(2);
        let canceled = Rc::new(RefCell::new(false));
        let sink = Rc::clone(&canceled);
        store.subscribe(move |_, effect| {
            if matches!(effect, TabEffect::Canceled) {
                *sink.borrow_mut() = true;
            }
        });

        swipe(&mut store, 200.0, -50.0);
        assert!(*canceled.borrow());
    }

    #[test]
    fn test_tab_count_is_clamped_to_one() {
        let store = TabStore::new(0);
        assert_eq!(store.state().tab_count, 1);
    }
}
