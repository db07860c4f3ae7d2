//! Which engine entry points to intercept on which runtime.
//!
//! The table is consulted once at initialization. Each row gates one feature
//! on an API-level range and, for some, on not running an x86 build; rows marked
//! `required` abort initialization when none of their symbols can be hooked.

use std::fmt;

use artsync_types::{ApiLevel, Arch};

use crate::config::Config;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    /// Veto quick code for hooked methods in ClassLinker::ShouldUseInterpreterEntrypoint.
    ShouldUseInterpreterEntrypoint,
    /// Restore frozen entry points after ClassLinker::FixupStaticTrampolines.
    FixupStaticTrampolines,
    /// Redirect native registration to the backup.
    RegisterNative,
    /// Redirect native unregistration to the backup.
    UnregisterNative,
    /// Restore every pending class after the visibly-initialized callbacks, which
    /// may have the static trampoline fix-up inlined into them.
    VisiblyInitializedCallbacks,
}

impl Feature {
    pub fn as_str(self) -> &'static str {
        match self {
            Feature::ShouldUseInterpreterEntrypoint => "ShouldUseInterpreterEntrypoint",
            Feature::FixupStaticTrampolines => "FixupStaticTrampolines",
            Feature::RegisterNative => "RegisterNative",
            Feature::UnregisterNative => "UnregisterNative",
            Feature::VisiblyInitializedCallbacks => "VisiblyInitializedCallbacks",
        }
    }

    fn config_override(self, config: &Config) -> Option<bool> {
        match self {
            Feature::VisiblyInitializedCallbacks => config.visibility_callbacks,
            _ => None,
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Capability {
    pub feature: Feature,
    pub min_api: Option<ApiLevel>,
    /// Exclusive upper bound.
    pub max_api: Option<ApiLevel>,
    /// Skip on x86 and x86_64.
    pub skip_on_x86: bool,
    pub required: bool,
}

impl Capability {
    pub fn applies(&self, api: ApiLevel, arch: Arch) -> bool {
        if self.min_api.is_some_and(|min| !api.at_least(min)) {
            return false;
        }
        if self.max_api.is_some_and(|max| api.at_least(max)) {
            return false;
        }
        !(self.skip_on_x86 && arch.is_x86_family())
    }
}

/// Installation order matters: later rows may rely on earlier ones.
pub static CAPABILITIES: &[Capability] = &[
    Capability {
        feature: Feature::ShouldUseInterpreterEntrypoint,
        min_api: Some(ApiLevel::N),
        max_api: Some(ApiLevel::T),
        skip_on_x86: false,
        required: false,
    },
    Capability {
        feature: Feature::FixupStaticTrampolines,
        min_api: None,
        max_api: None,
        skip_on_x86: false,
        required: true,
    },
    Capability {
        feature: Feature::RegisterNative,
        min_api: None,
        max_api: None,
        skip_on_x86: false,
        required: true,
    },
    Capability {
        feature: Feature::UnregisterNative,
        min_api: None,
        max_api: None,
        skip_on_x86: false,
        required: true,
    },
    // The fix-up is not inlined into these callbacks on x86 builds. Observed
    // on specific engine builds only; revalidate on new releases.
    Capability {
        feature: Feature::VisiblyInitializedCallbacks,
        min_api: Some(ApiLevel::R),
        max_api: None,
        skip_on_x86: true,
        required: false,
    },
];

/// Rows of `CAPABILITIES` to install for this runtime, in table order.
pub fn active_features(api: ApiLevel, config: &Config) -> Vec<&'static Capability> {
    CAPABILITIES
        .iter()
        .filter(|cap| {
            cap.feature
                .config_override(config)
                .unwrap_or_else(|| cap.applies(api, config.arch))
        })
        .collect()
}
