//! The per-navigator assembly.
//!
//! A [`Navigator`] owns one screen stack, one transition coordinator and
//! one edge-swipe gesture pipeline, and wires committed gestures back
//! into the stack. Outcomes and intents bubble to the embedder on a
//! [`Bus`]; continuous visual values go through a single-slot
//! [`ProgressMailbox`] and the [`OffsetSurfaceRegistry`], so an expensive
//! renderer can lag behind the sample stream without work piling up.
//!
//! The edge surface is conditionally *instantiated*, not merely disabled:
//! when the top screen is the root, is presented modally, or opts out via
//! `prevent_swipe_back`, [`Navigator::edge_surface`] is `None` and any
//! in-flight touch events are dropped as stale.

use std::collections::VecDeque;

use fxhash::FxHashMap;

use crate::gesture::SwipeRecognizer;
use crate::input::GestureSampler;
use crate::policy::{CommitDecision, PopCommitPolicy};
use crate::settings::NavigatorSettings;
use crate::stack::{
    NavigationError, PushOptions, RegistrationId, ScreenStack, StackEntry,
};
use crate::transition::{TransitionCoordinator, TransitionState};
use crate::{CommittedAction, IdFeeder};

lazy_static::lazy_static! {
    static ref SURFACE_HANDLES: IdFeeder = IdFeeder::new();
}

/// Outcomes and intents delivered to the embedder, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Pushed { id: String },
    Popped { id: String },
    Replaced { old_id: Option<String>, new_id: String },
    /// An exited instance finished animating and was dropped.
    Destroyed { id: String },
    /// A pop gesture ended without committing; visuals snap back.
    SwipeCanceled,
    /// The navbar title was tapped and the screen allows scroll-to-top.
    ScrollToTop,
    /// The close button was activated on the root screen.
    CloseRequested,
}

/// Ordered event queue, drained by the embedder.
pub type Bus = VecDeque<Event>;

/// Dim-layer opacity for a given pop progress, `0.2` at rest fading to
/// transparent as the drag approaches commit.
pub fn dim_opacity(progress: f64) -> f64 {
    0.2 * (1.0 - progress.clamp(0.0, 1.0))
}

/// Parallax offset fraction for under-top surfaces: `-1` at rest (fully
/// shifted behind the top screen), `0` when the drag reaches the full
/// frame width. The pixel distance behind one unit is the renderer's
/// concern.
pub fn under_top_offset(progress: f64) -> f64 {
    -(1.0 - progress.clamp(0.0, 1.0))
}

/// Single-slot mailbox for throttled visual updates.
///
/// While an update is pending, later samples overwrite the payload
/// instead of queuing more work: last sample wins, at most one in-flight
/// update per gesture.
#[derive(Debug, Default)]
pub struct ProgressMailbox {
    pending: Option<f64>,
}

impl ProgressMailbox {
    pub fn post(&mut self, progress: f64) {
        self.pending = Some(progress);
    }

    pub fn take(&mut self) -> Option<f64> {
        self.pending.take()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

/// Handle to a registered sibling offset surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceHandle(u64);

/// Registry of the sibling surfaces that shift in parallax while the top
/// screen is dragged.
///
/// Owned by the navigator and addressed by handle; surfaces register on
/// mount and deregister on unmount. Writers snapshot the handle set
/// before iterating, so a surface disappearing mid-drag is tolerated.
#[derive(Debug, Default)]
pub struct OffsetSurfaceRegistry {
    offsets: FxHashMap<SurfaceHandle, f64>,
}

impl OffsetSurfaceRegistry {
    pub fn register(&mut self) -> SurfaceHandle {
        let handle = SurfaceHandle(SURFACE_HANDLES.next());
        self.offsets.insert(handle, under_top_offset(0.0));
        handle
    }

    pub fn deregister(&mut self, handle: SurfaceHandle) {
        self.offsets.remove(&handle);
    }

    pub fn snapshot(&self) -> Vec<SurfaceHandle> {
        self.offsets.keys().copied().collect()
    }

    /// Updates one surface's offset. A handle that was deregistered
    /// between snapshot and write is stale and ignored.
    pub fn set_offset(&mut self, handle: SurfaceHandle, offset: f64) {
        match self.offsets.get_mut(&handle) {
            Some(slot) => *slot = offset,
            None => tracing::debug!(?handle, "offset write to deregistered surface"),
        }
    }

    pub fn offset(&self, handle: SurfaceHandle) -> Option<f64> {
        self.offsets.get(&handle).copied()
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }
}

/// The touch-sensitive strip a pop gesture originates from. Exists only
/// while the top screen is eligible for swipe-back.
#[derive(Debug)]
pub struct EdgeSurface {
    instance_id: String,
    /// Width of the dragged frame, sampled at touch start.
    frame_width: f64,
    /// Latched once a gesture commits a pop; the surface never re-arms
    /// for this instance, suppressing duplicate pops from residual touch
    /// bounces.
    popped: bool,
}

impl EdgeSurface {
    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    pub fn is_popped(&self) -> bool {
        self.popped
    }
}

/// One stacked-screens navigator instance.
pub struct Navigator {
    settings: NavigatorSettings,
    stack: ScreenStack,
    transitions: TransitionCoordinator,
    sampler: GestureSampler,
    recognizer: SwipeRecognizer,
    pop_policy: PopCommitPolicy,
    mailbox: ProgressMailbox,
    offsets: OffsetSurfaceRegistry,
    edge: Option<EdgeSurface>,
    bus: Bus,
    viewport_width: f64,
}

impl Navigator {
    pub fn new(settings: NavigatorSettings) -> Navigator {
        let pop_policy = settings.swipe_back.policy();
        let should_animate = settings.should_animate;
        Navigator {
            settings,
            stack: ScreenStack::new(),
            transitions: TransitionCoordinator::new(should_animate),
            sampler: GestureSampler::new(),
            recognizer: SwipeRecognizer::new(),
            pop_policy,
            mailbox: ProgressMailbox::default(),
            offsets: OffsetSurfaceRegistry::default(),
            edge: None,
            bus: Bus::new(),
            viewport_width: 0.0,
        }
    }

    pub fn settings(&self) -> &NavigatorSettings {
        &self.settings
    }

    pub fn stack(&self) -> &ScreenStack {
        &self.stack
    }

    pub fn transitions(&self) -> &TransitionCoordinator {
        &self.transitions
    }

    /// The renderer reports its container width here; the edge gesture
    /// samples it at touch start.
    pub fn set_viewport_width(&mut self, width: f64) {
        self.viewport_width = width;
    }

    pub fn register_screen(&mut self, path: &str) -> RegistrationId {
        self.stack.registry_mut().register(path)
    }

    pub fn unregister_screen(&mut self, id: RegistrationId) {
        self.stack.registry_mut().unregister(id);
    }

    pub fn snapshot(&self) -> Vec<StackEntry> {
        self.stack.snapshot()
    }

    pub fn pop_event(&mut self) -> Option<Event> {
        self.bus.pop_front()
    }

    /// Pushes a new screen and starts its enter transition.
    pub fn push(&mut self, path: &str, options: PushOptions) -> Result<String, NavigationError> {
        let id = self.stack.push(path, options)?;
        self.transitions.begin_enter(&id);
        if !self.settings.should_animate {
            self.stack.settle_transition();
        }
        self.bus.push_back(Event::Pushed { id: id.clone() });
        self.rearm_edge_surface();
        Ok(id)
    }

    /// Pops the top screen. The instance stays alive inside the
    /// transition coordinator until its exit animation finishes.
    pub fn pop(&mut self) -> Result<String, NavigationError> {
        let instance = self.stack.pop()?;
        let id = instance.id().to_string();
        if let Some(destroyed) = self.transitions.begin_exit(instance) {
            self.stack.settle_transition();
            self.bus.push_back(Event::Destroyed {
                id: destroyed.id().to_string(),
            });
        }
        self.bus.push_back(Event::Popped { id: id.clone() });
        self.rearm_edge_surface();
        Ok(id)
    }

    /// Atomic pop+push: one transition cycle, no intermediate state.
    pub fn replace(&mut self, path: &str, options: PushOptions) -> Result<String, NavigationError> {
        let outcome = self.stack.replace(path, options)?;
        let old_id = match outcome.old {
            Some(instance) => {
                let id = instance.id().to_string();
                if let Some(destroyed) = self.transitions.begin_exit(instance) {
                    self.bus.push_back(Event::Destroyed {
                        id: destroyed.id().to_string(),
                    });
                }
                Some(id)
            }
            None => None,
        };
        self.transitions.begin_enter(&outcome.new_id);
        if !self.settings.should_animate {
            self.stack.settle_transition();
        }
        self.bus.push_back(Event::Replaced {
            old_id,
            new_id: outcome.new_id.clone(),
        });
        self.rearm_edge_surface();
        Ok(outcome.new_id)
    }

    /// Opaque "animation finished" signal from the presentation layer.
    pub fn on_animation_finished(&mut self, instance_id: &str) {
        let known = matches!(
            self.transitions.state(instance_id),
            TransitionState::Entering | TransitionState::Exiting
        );
        if !known {
            tracing::debug!(instance_id, "animation-finished for unknown instance");
            return;
        }

        if let Some(destroyed) = self.transitions.animation_finished(instance_id) {
            self.bus.push_back(Event::Destroyed {
                id: destroyed.id().to_string(),
            });
        }
        self.stack.settle_transition();
        self.rearm_edge_surface();
    }

    pub fn on_animation_property_start(&mut self, property: &str) {
        self.transitions.on_property_start(property);
    }

    pub fn on_animation_property_end(&mut self, property: &str) {
        self.transitions.on_property_end(property);
    }

    /// The edge surface for the current top screen, if one exists. Absence
    /// is structural: collaborators observe `None`, not an inert surface.
    pub fn edge_surface(&self) -> Option<&EdgeSurface> {
        self.edge.as_ref()
    }

    pub fn on_touch_start(&mut self, x: f64, y: f64, timestamp: f64) {
        let width = self.viewport_width;
        let Some(edge) = self.armed_edge_mut() else {
            return;
        };
        edge.frame_width = width;
        let event = self.sampler.touch_start(x, y, timestamp);
        self.recognizer.handle(&event);
    }

    pub fn on_touch_move(&mut self, x: f64, y: f64, timestamp: f64) {
        if self.armed_edge_mut().is_none() {
            return;
        }
        let event = self.sampler.touch_move(x, y, timestamp);
        self.recognizer.handle(&event);
        self.publish_drag_visuals();
    }

    /// Ends the gesture and resolves it through the commit policy,
    /// exactly once. Returns the committed action, if any.
    pub fn on_touch_end(&mut self, timestamp: f64) -> CommittedAction {
        let frame_width = match self.armed_edge_mut() {
            Some(edge) => edge.frame_width,
            None => return CommittedAction::None,
        };

        let event = self.sampler.touch_end(timestamp);
        let Some(end) = self.recognizer.handle(&event) else {
            self.reset_drag_visuals();
            return CommittedAction::None;
        };

        match self.pop_policy.decide(end, frame_width) {
            CommitDecision::Commit => {
                if let Some(edge) = self.edge.as_mut() {
                    edge.popped = true;
                }
                self.reset_drag_visuals();
                match self.pop() {
                    Ok(_) => CommittedAction::Pop,
                    Err(err) => {
                        // The edge only exists above the root, so this is
                        // a stale commit against a torn-down stack.
                        tracing::debug!(%err, "commit raced stack teardown");
                        CommittedAction::None
                    }
                }
            }
            CommitDecision::Cancel => {
                self.bus.push_back(Event::SwipeCanceled);
                self.reset_drag_visuals();
                CommittedAction::None
            }
        }
    }

    /// Continuous pop progress, if a drag is live. Positive means pop
    /// intent.
    pub fn progress(&self) -> Option<f64> {
        let edge = self.edge.as_ref()?;
        self.recognizer.progress(edge.frame_width)
    }

    /// Drains the pending coalesced visual update, if any.
    pub fn take_pending_progress(&mut self) -> Option<f64> {
        self.mailbox.take()
    }

    pub fn register_offset_surface(&mut self) -> SurfaceHandle {
        self.offsets.register()
    }

    pub fn deregister_offset_surface(&mut self, handle: SurfaceHandle) {
        self.offsets.deregister(handle);
    }

    pub fn surface_offset(&self, handle: SurfaceHandle) -> Option<f64> {
        self.offsets.offset(handle)
    }

    /// Navbar title tap: scrolls the top frame back to the top unless the
    /// screen opted out.
    pub fn on_navbar_top_click(&mut self) {
        let Some(top) = self.stack.top() else {
            return;
        };
        if !top.navbar().disable_scroll_to_top {
            self.bus.push_back(Event::ScrollToTop);
        }
    }

    /// Close button on the root screen; the embedder decides what closing
    /// the navigator means.
    pub fn request_close(&mut self) {
        self.bus.push_back(Event::CloseRequested);
    }

    /// The edge surface, if it exists and has not latched a pop.
    fn armed_edge_mut(&mut self) -> Option<&mut EdgeSurface> {
        match self.edge.as_mut() {
            Some(edge) if !edge.popped => Some(edge),
            Some(_) => {
                tracing::debug!("touch on latched edge surface dropped");
                None
            }
            None => {
                tracing::debug!("touch without edge surface dropped");
                None
            }
        }
    }

    fn publish_drag_visuals(&mut self) {
        let Some(progress) = self.progress() else {
            return;
        };
        self.mailbox.post(progress);
        for handle in self.offsets.snapshot() {
            self.offsets.set_offset(handle, under_top_offset(progress));
        }
    }

    fn reset_drag_visuals(&mut self) {
        self.mailbox.post(0.0);
        for handle in self.offsets.snapshot() {
            self.offsets.set_offset(handle, under_top_offset(0.0));
        }
    }

    /// Recomputes whether the top screen carries an edge surface. Called
    /// after every stack mutation and transition settle. A latched
    /// surface is left in place while its instance is still exiting.
    fn rearm_edge_surface(&mut self) {
        if let Some(edge) = &self.edge {
            if edge.popped
                && self.transitions.state(&edge.instance_id) == TransitionState::Exiting
            {
                return;
            }
        }

        let top_index = self.stack.len().wrapping_sub(1);
        let eligible = self.stack.edge_swipe_enabled(top_index);
        let top_id = self.stack.top().map(|top| top.id().to_string());

        self.edge = match (eligible, top_id) {
            (true, Some(instance_id)) => {
                let keep = self
                    .edge
                    .take()
                    .filter(|edge| edge.instance_id == instance_id);
                Some(keep.unwrap_or(EdgeSurface {
                    instance_id,
                    frame_width: 0.0,
                    popped: false,
                }))
            }
            _ => None,
        };
    }
}
