//! Android API level detection via the `ro.build.version.sdk` system property.
//!
//! The hook layer runs inside the app process, so the property can be read
//! directly. On non-Android hosts detection yields `None` and callers must
//! supply the level explicitly.

use std::fmt;
use std::sync::OnceLock;

use log::debug;

/// Android API level (SDK_INT).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ApiLevel(pub u32);

impl ApiLevel {
    pub const L: ApiLevel = ApiLevel(21);
    pub const N: ApiLevel = ApiLevel(24);
    pub const O: ApiLevel = ApiLevel(26);
    pub const P: ApiLevel = ApiLevel(28);
    pub const Q: ApiLevel = ApiLevel(29);
    pub const R: ApiLevel = ApiLevel(30);
    pub const S: ApiLevel = ApiLevel(31);
    pub const T: ApiLevel = ApiLevel(33);
    pub const U: ApiLevel = ApiLevel(34);

    pub const fn new(level: u32) -> Self {
        Self(level)
    }

    /// Check if this level is at least `other`.
    pub const fn at_least(self, other: ApiLevel) -> bool {
        self.0 >= other.0
    }

    /// Parse a property value like "33" (surrounding whitespace allowed).
    pub fn parse(value: &str) -> Option<Self> {
        let level: u32 = value.trim().parse().ok()?;
        if level == 0 {
            return None;
        }
        Some(Self(level))
    }

    /// Detect the running device's API level. Result is cached after first call.
    pub fn detect() -> Option<ApiLevel> {
        static API_LEVEL: OnceLock<Option<ApiLevel>> = OnceLock::new();
        *API_LEVEL.get_or_init(|| {
            let value = read_sdk_property()?;
            match ApiLevel::parse(&value) {
                Some(level) => {
                    debug!("Detected API level: {}", level);
                    Some(level)
                }
                None => {
                    debug!("Failed to parse API level from: {:?}", value);
                    None
                }
            }
        })
    }
}

impl fmt::Display for ApiLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(target_os = "android")]
fn read_sdk_property() -> Option<String> {
    use std::ffi::CStr;

    const PROP_VALUE_MAX: usize = 92;
    let mut buf = [0 as libc::c_char; PROP_VALUE_MAX];
    let len = unsafe { libc::__system_property_get(c"ro.build.version.sdk".as_ptr(), buf.as_mut_ptr()) };
    if len <= 0 {
        debug!("ro.build.version.sdk is not set");
        return None;
    }
    let value = unsafe { CStr::from_ptr(buf.as_ptr()) };
    Some(value.to_string_lossy().into_owned())
}

#[cfg(not(target_os = "android"))]
fn read_sdk_property() -> Option<String> {
    debug!("Not running on Android; API level must be configured");
    None
}
