//! Installer configuration.
//!
//! Defaults come from the running process; environment variables let a host
//! override detection when it knows better (emulators, vendor builds that
//! misreport the SDK level, or engine builds where the visibility-callback
//! heuristic no longer holds).

use artsync_types::{ApiLevel, Arch};
use log::warn;

/// Overrides `ApiLevel::detect()`.
pub const ENV_API_LEVEL: &str = "ARTSYNC_API_LEVEL";
/// Forces (`1`/`true`) or suppresses (`0`/`false`) the visibility-callback hooks.
pub const ENV_VISIBILITY_CALLBACKS: &str = "ARTSYNC_VISIBILITY_CALLBACKS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Explicit API level. `None` means detect at init time.
    pub api_level: Option<ApiLevel>,
    pub arch: Arch,
    /// Overrides the capability table's decision for the visibility callbacks.
    pub visibility_callbacks: Option<bool>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_level: None,
            arch: Arch::current(),
            visibility_callbacks: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Config::default();

        if let Some(value) = lookup(ENV_API_LEVEL) {
            match ApiLevel::parse(&value) {
                Some(level) => config.api_level = Some(level),
                None => warn!("Ignoring invalid {}={:?}", ENV_API_LEVEL, value),
            }
        }

        if let Some(value) = lookup(ENV_VISIBILITY_CALLBACKS) {
            match parse_switch(&value) {
                Some(on) => config.visibility_callbacks = Some(on),
                None => warn!("Ignoring invalid {}={:?}", ENV_VISIBILITY_CALLBACKS, value),
            }
        }

        config
    }

    pub fn with_api_level(mut self, level: ApiLevel) -> Self {
        self.api_level = Some(level);
        self
    }

    pub fn with_arch(mut self, arch: Arch) -> Self {
        self.arch = arch;
        self
    }

    pub fn with_visibility_callbacks(mut self, enabled: bool) -> Self {
        self.visibility_callbacks = Some(enabled);
        self
    }

    /// Configured level, falling back to detection.
    pub fn resolve_api_level(&self) -> Option<ApiLevel> {
        self.api_level.or_else(ApiLevel::detect)
    }
}

fn parse_switch(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}
