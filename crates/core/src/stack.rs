//! Screen registry and navigation stack.
//!
//! A [`ScreenStack`] owns the ordered list of live [`ScreenInstance`]s.
//! Insertion order is navigation order: the last element is the top, the
//! first is the root, and the root is never popped. Instances are created
//! on push and handed back to the caller on pop so their exit animation
//! can run before actual destruction (see [`crate::transition`]).
//!
//! Paths must be registered in the [`ScreenRegistry`] before they can be
//! pushed; the registry is the static path → screen mapping, distinct from
//! the per-navigation instances.

use indexmap::IndexMap;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use thiserror::Error;
use uuid::Uuid;

use crate::IdFeeder;

lazy_static::lazy_static! {
    static ref REGISTRATION_IDS: IdFeeder = IdFeeder::new();
}

/// Navigation failures surfaced to the caller. All are local and
/// recoverable; the stack is left unchanged by a failed operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NavigationError {
    #[error("no screen registered for path `{0}`")]
    InvalidPath(String),
    #[error("cannot pop the root screen")]
    CannotPopRoot,
}

/// Handle returned by [`ScreenRegistry::register`], used to unregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegistrationId(u64);

/// A registered screen definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenDescriptor {
    pub path: String,
    registration: RegistrationId,
}

/// Static path → screen mapping, in registration order.
#[derive(Debug, Default)]
pub struct ScreenRegistry {
    screens: IndexMap<String, ScreenDescriptor>,
}

impl ScreenRegistry {
    pub fn new() -> ScreenRegistry {
        ScreenRegistry::default()
    }

    /// Registers a screen for `path`, replacing any previous registration
    /// for the same path. Returns the handle needed to unregister.
    pub fn register(&mut self, path: &str) -> RegistrationId {
        let registration = RegistrationId(REGISTRATION_IDS.next());
        self.screens.insert(
            path.to_string(),
            ScreenDescriptor {
                path: path.to_string(),
                registration,
            },
        );
        registration
    }

    /// Removes the registration behind `id`. A stale id is a no-op: the
    /// path may have been re-registered since.
    pub fn unregister(&mut self, id: RegistrationId) {
        self.screens
            .retain(|_, descriptor| descriptor.registration != id);
    }

    pub fn find(&self, path: &str) -> Option<&ScreenDescriptor> {
        self.screens.get(path)
    }

    pub fn is_empty(&self) -> bool {
        self.screens.is_empty()
    }
}

/// Per-screen navbar options, the screen-helmet surface of the original
/// navigator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NavbarOptions {
    pub visible: bool,
    pub no_back_button: bool,
    pub no_close_button: bool,
    pub prevent_swipe_back: bool,
    pub disable_scroll_to_top: bool,
}

/// Options for a push or replace.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PushOptions {
    /// Presented modally rather than pushed; a presented screen never
    /// grows an edge-swipe surface.
    pub present: bool,
    pub navbar: NavbarOptions,
}

/// One entry in the navigation stack.
///
/// Owned exclusively by the stack while mounted; ownership moves to the
/// transition coordinator on pop so the exit animation can complete
/// before the instance is dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenInstance {
    id: String,
    path: String,
    present: bool,
    navbar: NavbarOptions,
}

impl ScreenInstance {
    fn new(path: &str, options: PushOptions) -> ScreenInstance {
        ScreenInstance {
            id: Uuid::now_v7().to_string(),
            path: path.to_string(),
            present: options.present,
            navbar: options.navbar,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_present(&self) -> bool {
        self.present
    }

    pub fn navbar(&self) -> &NavbarOptions {
        &self.navbar
    }
}

/// One row of a stack snapshot, with all position-derived flags resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackEntry {
    pub id: String,
    pub path: String,
    pub is_top: bool,
    pub is_under_top: bool,
    pub is_root: bool,
    pub is_present: bool,
    pub navbar_visible: bool,
    pub back_button_visible: bool,
    pub close_button_visible: bool,
    pub edge_swipe_enabled: bool,
}

/// Outcome of [`ScreenStack::replace`].
#[derive(Debug)]
pub struct ReplaceOutcome {
    /// The replaced top, for deferred destruction. `None` when the stack
    /// was empty and the replace degenerated to a plain push.
    pub old: Option<ScreenInstance>,
    pub new_id: String,
}

/// The ordered stack of live screen instances.
#[derive(Debug, Default)]
pub struct ScreenStack {
    registry: ScreenRegistry,
    instances: Vec<ScreenInstance>,
    /// Set by every mutation, cleared when the presentation layer reports
    /// the transition finished. While set, the instance below the top is
    /// the under-top and stays mounted.
    transition_active: bool,
}

impl ScreenStack {
    pub fn new() -> ScreenStack {
        ScreenStack::default()
    }

    pub fn registry(&self) -> &ScreenRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ScreenRegistry {
        &mut self.registry
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn top(&self) -> Option<&ScreenInstance> {
        self.instances.last()
    }

    /// The instance below the top, only while a transition is animating.
    pub fn under_top(&self) -> Option<&ScreenInstance> {
        if self.transition_active && self.instances.len() >= 2 {
            self.instances.get(self.instances.len() - 2)
        } else {
            None
        }
    }

    pub fn transition_active(&self) -> bool {
        self.transition_active
    }

    /// Called when the presentation layer reports that the current
    /// push/pop transition finished; releases the under-top.
    pub fn settle_transition(&mut self) {
        self.transition_active = false;
    }

    /// Looks up the static screen definition for `path`.
    pub fn find_screen(&self, path: &str) -> Option<&ScreenDescriptor> {
        self.registry.find(path)
    }

    /// Appends a new instance for `path` and returns its id.
    ///
    /// Fails with [`NavigationError::InvalidPath`] when no screen is
    /// registered for the path; the stack is unchanged in that case.
    pub fn push(&mut self, path: &str, options: PushOptions) -> Result<String, NavigationError> {
        if self.registry.find(path).is_none() {
            return Err(NavigationError::InvalidPath(path.to_string()));
        }

        let instance = ScreenInstance::new(path, options);
        let id = instance.id.clone();
        tracing::debug!(%id, path, "push");

        self.instances.push(instance);
        self.transition_active = self.instances.len() >= 2;
        Ok(id)
    }

    /// Removes and returns the top instance.
    ///
    /// Fails with [`NavigationError::CannotPopRoot`] when the stack holds
    /// one instance or none. The returned instance must be kept alive
    /// until its exit animation completes.
    pub fn pop(&mut self) -> Result<ScreenInstance, NavigationError> {
        if self.instances.len() <= 1 {
            return Err(NavigationError::CannotPopRoot);
        }

        let Some(instance) = self.instances.pop() else {
            return Err(NavigationError::CannotPopRoot);
        };
        tracing::debug!(id = %instance.id, path = %instance.path, "pop");
        self.transition_active = true;
        Ok(instance)
    }

    /// Atomic pop+push: the top is swapped in place, with no intermediate
    /// state where neither the old nor the new top is mounted. On an
    /// empty stack this degenerates to a plain push.
    ///
    /// The path is validated before anything is removed, so a failed
    /// replace leaves the stack untouched.
    pub fn replace(
        &mut self,
        path: &str,
        options: PushOptions,
    ) -> Result<ReplaceOutcome, NavigationError> {
        if self.registry.find(path).is_none() {
            return Err(NavigationError::InvalidPath(path.to_string()));
        }

        let instance = ScreenInstance::new(path, options);
        let new_id = instance.id.clone();

        let old = match self.instances.last_mut() {
            Some(top) => Some(std::mem::replace(top, instance)),
            None => {
                self.instances.push(instance);
                None
            }
        };
        tracing::debug!(%new_id, path, "replace");

        self.transition_active = true;
        Ok(ReplaceOutcome { old, new_id })
    }

    /// Whether the instance at `index` carries an edge-swipe surface.
    /// The surface is structurally absent, not merely inert, when this is
    /// false; see [`crate::navigator::Navigator`].
    pub fn edge_swipe_enabled(&self, index: usize) -> bool {
        let Some(instance) = self.instances.get(index) else {
            return false;
        };
        index != 0 && !instance.present && !instance.navbar.prevent_swipe_back
    }

    /// Resolves every position-derived flag into a flat snapshot for the
    /// presentation layer.
    pub fn snapshot(&self) -> Vec<StackEntry> {
        let len = self.instances.len();
        self.instances
            .iter()
            .enumerate()
            .map(|(index, instance)| {
                let is_root = index == 0;
                let is_top = index + 1 == len;
                let is_under_top = self.transition_active && len >= 2 && index + 2 == len;
                StackEntry {
                    id: instance.id.clone(),
                    path: instance.path.clone(),
                    is_top,
                    is_under_top,
                    is_root,
                    is_present: instance.present,
                    navbar_visible: instance.navbar.visible,
                    back_button_visible: !is_root && !instance.navbar.no_back_button,
                    close_button_visible: is_root && !instance.navbar.no_close_button,
                    edge_swipe_enabled: self.edge_swipe_enabled(index),
                }
            })
            .collect()
    }

    /// Paths of the mounted instances, bottom to top. Handy for
    /// composition comparisons in tests and debugging output.
    pub fn paths(&self) -> Vec<&str> {
        self.instances.iter().map(|i| i.path.as_str()).collect()
    }
}

const SCREEN_INSTANCE_ID_KEY: &str = "_si";
const IS_PRESENT_KEY: &str = "_present";

// Characters that must not appear raw in a query component.
const QUERY_COMPONENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'&')
    .add(b'+')
    .add(b'=');

/// Query-string codec for the navigator's routing keys: the screen
/// instance id under `_si` and the modal flag under `_present`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScreenRoute {
    pub screen_instance_id: Option<String>,
    pub present: bool,
}

impl ScreenRoute {
    pub fn new(screen_instance_id: Option<&str>, present: bool) -> ScreenRoute {
        ScreenRoute {
            screen_instance_id: screen_instance_id.map(str::to_string),
            present,
        }
    }

    /// Serializes the route as a query string. The `_present` key is only
    /// written when set; absence means a plain push.
    pub fn to_query(&self) -> String {
        let mut pairs = Vec::new();
        if let Some(ref id) = self.screen_instance_id {
            pairs.push(format!(
                "{}={}",
                SCREEN_INSTANCE_ID_KEY,
                utf8_percent_encode(id, QUERY_COMPONENT)
            ));
        }
        if self.present {
            pairs.push(format!("{}=true", IS_PRESENT_KEY));
        }
        pairs.join("&")
    }

    /// Parses a query string, ignoring unrelated keys and undecodable
    /// values.
    pub fn parse(query: &str) -> ScreenRoute {
        let mut route = ScreenRoute::default();
        for pair in query.trim_start_matches('?').split('&') {
            let Some((key, value)) = pair.split_once('=') else {
                continue;
            };
            match key {
                SCREEN_INSTANCE_ID_KEY => {
                    if let Ok(decoded) = percent_decode_str(value).decode_utf8() {
                        route.screen_instance_id = Some(decoded.into_owned());
                    }
                }
                IS_PRESENT_KEY => {
                    route.present = value == "true";
                }
                _ => {}
            }
        }
        route
    }
}
