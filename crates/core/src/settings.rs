//! Navigator configuration.
//!
//! A [`NavigatorSettings`] is consumed read-only by the navigator; the
//! aria labels are carried opaquely for the presentation layer. All
//! fields have defaults, so a partial TOML file (or none at all) is
//! valid:
//!
//! ```toml
//! theme = "Android"
//! animation-duration-ms = 300
//!
//! [swipe-back]
//! distance-fraction = 0.35
//!
//! [logging]
//! enabled = true
//! level = "debug"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Error};
use serde::{Deserialize, Serialize};

use crate::policy::{PopCommitPolicy, TabCommitPolicy};

/// Transition styling family. Button layout and animations differ per
/// theme in the presentation layer; the core only carries the choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Theme {
    #[default]
    Cupertino,
    Android,
    Web,
}

/// Tunables for the edge-swipe-to-pop commit rule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SwipeBackSettings {
    pub velocity_threshold: f64,
    pub distance_fraction: f64,
}

impl Default for SwipeBackSettings {
    fn default() -> Self {
        let policy = PopCommitPolicy::default();
        SwipeBackSettings {
            velocity_threshold: policy.velocity_threshold,
            distance_fraction: policy.distance_fraction,
        }
    }
}

impl SwipeBackSettings {
    pub fn policy(&self) -> PopCommitPolicy {
        PopCommitPolicy {
            velocity_threshold: self.velocity_threshold,
            distance_fraction: self.distance_fraction,
        }
    }
}

/// Tunables for the tab-switch commit rule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct TabSwipeSettings {
    pub distance_px: f64,
}

impl Default for TabSwipeSettings {
    fn default() -> Self {
        TabSwipeSettings {
            distance_px: TabCommitPolicy::default().distance_px,
        }
    }
}

impl TabSwipeSettings {
    pub fn policy(&self) -> TabCommitPolicy {
        TabCommitPolicy {
            distance_px: self.distance_px,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct LoggingSettings {
    pub enabled: bool,
    pub level: String,
    /// Log files land here when set; stderr otherwise.
    pub directory: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        LoggingSettings {
            enabled: false,
            level: "info".to_string(),
            directory: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct NavigatorSettings {
    pub theme: Theme,
    pub back_button_aria_label: String,
    pub close_button_aria_label: String,
    pub animation_duration_ms: u64,
    /// Gates all transitions; when false they resolve immediately.
    pub should_animate: bool,
    pub swipe_back: SwipeBackSettings,
    pub tab_swipe: TabSwipeSettings,
    pub logging: LoggingSettings,
}

impl Default for NavigatorSettings {
    fn default() -> Self {
        NavigatorSettings {
            theme: Theme::default(),
            back_button_aria_label: "Go back".to_string(),
            close_button_aria_label: "Close".to_string(),
            animation_duration_ms: 300,
            should_animate: true,
            swipe_back: SwipeBackSettings::default(),
            tab_swipe: TabSwipeSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

/// Loads settings from a TOML file.
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<NavigatorSettings, Error> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .with_context(|| format!("can't read settings from {}", path.display()))?;
    toml::from_str(&text)
        .with_context(|| format!("can't parse settings from {}", path.display()))
}

/// Saves settings as TOML.
pub fn save_settings<P: AsRef<Path>>(path: P, settings: &NavigatorSettings) -> Result<(), Error> {
    let path = path.as_ref();
    let text = toml::to_string_pretty(settings).context("can't serialize settings")?;
    fs::write(path, text).with_context(|| format!("can't write settings to {}", path.display()))
}
