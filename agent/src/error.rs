use thiserror::Error;

use crate::capability::Feature;

#[derive(Debug, Error)]
pub enum InitError {
    #[error("API level is not configured and could not be detected")]
    UnknownApiLevel,

    #[error("no symbol for required feature {feature} resolved (tried: {})", candidates.join(", "))]
    MissingSymbol {
        feature: Feature,
        candidates: Vec<&'static str>,
    },

    #[error("failed to hook {symbol} at {address:#x}")]
    HookFailed { symbol: &'static str, address: usize },

    #[error("SetEntryPointsToInterpreter is unavailable and trampoline {0} could not be resolved")]
    MissingTrampoline(&'static str),

    #[error("entry-point synchronizer is already initialized")]
    AlreadyInitialized,
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("module not loaded: {0}")]
    ModuleNotLoaded(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse ELF image {path}: {reason}")]
    Parse { path: String, reason: String },
}

pub type Result<T> = std::result::Result<T, InitError>;
