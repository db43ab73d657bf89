//! Per-instance visual transition tracking.
//!
//! The [`TransitionCoordinator`] mirrors what the presentation layer is
//! animating, independent of any gesture: a pushed instance goes
//! `idle → entering → idle`, a popped one `idle → exiting → destroyed`.
//! The coordinator never produces animation frames; it only consumes
//! opaque "animation finished" signals and owns popped instances until
//! their exit completes, so nothing is destroyed mid-animation.
//!
//! The navbar's padding animation is tracked as a separate sub-state keyed
//! on the `padding-top` property; start/end signals for any other animated
//! property are ignored.

use fxhash::FxHashMap;

use crate::stack::ScreenInstance;

/// The animated property that drives the navbar sub-state.
pub const NAVBAR_TRANSITION_PROPERTY: &str = "padding-top";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransitionState {
    #[default]
    Idle,
    Entering,
    Exiting,
    Destroyed,
}

/// Navbar padding sub-state. The end signal lands on `ExitActive`, not
/// `Idle`; [`TransitionCoordinator::reset_navbar`] is the explicit way
/// back. This mirrors the original navigator's observable behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NavbarTransition {
    #[default]
    Idle,
    EnterActive,
    ExitActive,
}

#[derive(Debug)]
pub struct TransitionCoordinator {
    states: FxHashMap<String, TransitionState>,
    /// Popped instances kept alive while their exit animation runs.
    exiting: FxHashMap<String, ScreenInstance>,
    navbar: NavbarTransition,
    should_animate: bool,
}

impl Default for TransitionCoordinator {
    fn default() -> Self {
        TransitionCoordinator::new(true)
    }
}

impl TransitionCoordinator {
    pub fn new(should_animate: bool) -> TransitionCoordinator {
        TransitionCoordinator {
            states: FxHashMap::default(),
            exiting: FxHashMap::default(),
            navbar: NavbarTransition::default(),
            should_animate,
        }
    }

    /// When animations are gated off, transitions collapse to their
    /// terminal state immediately instead of waiting for a finished
    /// signal.
    pub fn set_should_animate(&mut self, should_animate: bool) {
        self.should_animate = should_animate;
    }

    pub fn state(&self, instance_id: &str) -> TransitionState {
        self.states
            .get(instance_id)
            .copied()
            .unwrap_or(TransitionState::Idle)
    }

    pub fn navbar_transition(&self) -> NavbarTransition {
        self.navbar
    }

    /// Number of popped instances still awaiting destruction.
    pub fn exiting_count(&self) -> usize {
        self.exiting.len()
    }

    /// Starts the enter transition for a freshly pushed instance.
    pub fn begin_enter(&mut self, instance_id: &str) {
        let state = if self.should_animate {
            TransitionState::Entering
        } else {
            TransitionState::Idle
        };
        self.states.insert(instance_id.to_string(), state);
    }

    /// Takes ownership of a popped instance for the duration of its exit
    /// animation. Returns it immediately when animations are gated off;
    /// otherwise it is released by [`Self::animation_finished`].
    pub fn begin_exit(&mut self, instance: ScreenInstance) -> Option<ScreenInstance> {
        let id = instance.id().to_string();
        if !self.should_animate {
            self.states.insert(id, TransitionState::Destroyed);
            return Some(instance);
        }

        self.states.insert(id.clone(), TransitionState::Exiting);
        self.exiting.insert(id, instance);
        None
    }

    /// Consumes an opaque "animation finished" signal for one instance.
    ///
    /// An entering instance settles to `Idle`; an exiting one is
    /// destroyed and returned so the caller can drop it. Signals for
    /// unknown or already-settled instances are stale and ignored.
    pub fn animation_finished(&mut self, instance_id: &str) -> Option<ScreenInstance> {
        match self.state(instance_id) {
            TransitionState::Entering => {
                self.states
                    .insert(instance_id.to_string(), TransitionState::Idle);
                None
            }
            TransitionState::Exiting => {
                self.states
                    .insert(instance_id.to_string(), TransitionState::Destroyed);
                self.exiting.remove(instance_id)
            }
            state => {
                tracing::debug!(instance_id, ?state, "stale animation-finished signal");
                None
            }
        }
    }

    /// A property animation started on the top screen's main surface.
    pub fn on_property_start(&mut self, property: &str) {
        if property == NAVBAR_TRANSITION_PROPERTY {
            self.navbar = NavbarTransition::EnterActive;
        }
    }

    /// A property animation ended on the top screen's main surface.
    pub fn on_property_end(&mut self, property: &str) {
        if property == NAVBAR_TRANSITION_PROPERTY {
            self.navbar = NavbarTransition::ExitActive;
        }
    }

    pub fn reset_navbar(&mut self) {
        self.navbar = NavbarTransition::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stack::{PushOptions, ScreenStack};

    fn popped_instance() -> ScreenInstance {
        let mut stack = ScreenStack::new();
        stack.registry_mut().register("/");
        stack.registry_mut().register("/detail");
        stack.push("/", PushOptions::default()).unwrap();
        stack.push("/detail", PushOptions::default()).unwrap();
        stack.pop().unwrap()
    }

    #[test]
    fn test_enter_settles_to_idle() {
        let mut coordinator = TransitionCoordinator::new(true);
        coordinator.begin_enter("a");
        assert_eq!(coordinator.state("a"), TransitionState::Entering);
        assert!(coordinator.animation_finished("a").is_none());
        assert_eq!(coordinator.state("a"), TransitionState::Idle);
    }

    #[test]
    fn test_exit_defers_destruction_until_animation_finished() {
        let mut coordinator = TransitionCoordinator::new(true);
        let instance = popped_instance();
        let id = instance.id().to_string();

        assert!(coordinator.begin_exit(instance).is_none());
        assert_eq!(coordinator.state(&id), TransitionState::Exiting);
        assert_eq!(coordinator.exiting_count(), 1);

        let destroyed = coordinator.animation_finished(&id).unwrap();
        assert_eq!(destroyed.id(), id);
        assert_eq!(coordinator.state(&id), TransitionState::Destroyed);
        assert_eq!(coordinator.exiting_count(), 0);
    }

    #[test]
    fn test_animation_gate_collapses_transitions() {
        let mut coordinator = TransitionCoordinator::new(false);
        coordinator.begin_enter("a");
        assert_eq!(coordinator.state("a"), TransitionState::Idle);

        let instance = popped_instance();
        let id = instance.id().to_string();
        assert!(coordinator.begin_exit(instance).is_some());
        assert_eq!(coordinator.state(&id), TransitionState::Destroyed);
    }

    #[test]
    fn test_stale_finished_signal_is_ignored() {
        let mut coordinator = TransitionCoordinator::new(true);
        assert!(coordinator.animation_finished("ghost").is_none());
        assert_eq!(coordinator.state("ghost"), TransitionState::Idle);
    }

    #[test]
    fn test_duplicate_finished_signal_is_ignored() {
        let mut coordinator = TransitionCoordinator::new(true);
        let instance = popped_instance();
        let id = instance.id().to_string();
        coordinator.begin_exit(instance);
        assert!(coordinator.animation_finished(&id).is_some());
        assert!(coordinator.animation_finished(&id).is_none());
    }

    #[test]
    fn test_navbar_substate_tracks_padding_top_only() {
        let mut coordinator = TransitionCoordinator::new(true);
        coordinator.on_property_start("opacity");
        assert_eq!(coordinator.navbar_transition(), NavbarTransition::Idle);

        coordinator.on_property_start(NAVBAR_TRANSITION_PROPERTY);
        assert_eq!(
            coordinator.navbar_transition(),
            NavbarTransition::EnterActive
        );

        coordinator.on_property_end("transform");
        assert_eq!(
            coordinator.navbar_transition(),
            NavbarTransition::EnterActive
        );

        coordinator.on_property_end(NAVBAR_TRANSITION_PROPERTY);
        assert_eq!(coordinator.navbar_transition(), NavbarTransition::ExitActive);

        coordinator.reset_navbar();
        assert_eq!(coordinator.navbar_transition(), NavbarTransition::Idle);
    }
}
