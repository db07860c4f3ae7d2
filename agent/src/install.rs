//! One-shot, process-wide installation of the synchronizer hooks.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use artsync_types::{ApiLevel, Method};
use log::{debug, error, info, warn};

use crate::capability::{self, Capability, Feature};
use crate::config::Config;
use crate::error::{InitError, Result};
use crate::handler::HookHandler;
use crate::interpreter::InterpreterEntry;
use crate::runtime::{BackupRegistry, Runtime};
use crate::stubs;
use crate::sync::Synchronizer;

/// Global synchronizer, reachable from the `extern "C"` stubs.
static SYNCHRONIZER: OnceLock<Synchronizer> = OnceLock::new();
// Set only once every required hook is in place; stubs stay pass-through until then.
static ACTIVE: AtomicBool = AtomicBool::new(false);
static INIT_STARTED: AtomicBool = AtomicBool::new(false);

/// The installed synchronizer, if initialization completed successfully.
pub fn synchronizer() -> Option<&'static Synchronizer> {
    if ACTIVE.load(Ordering::Acquire) {
        SYNCHRONIZER.get()
    } else {
        None
    }
}

/// Force `method` onto the interpreter using the installed synchronizer.
///
/// Returns false when not initialized or when no interpreter entry is
/// available on this runtime. Callers must not assume deoptimization happened.
pub fn set_entry_points_to_interpreter(method: Method) -> bool {
    match synchronizer() {
        Some(sync) => sync.set_entry_points_to_interpreter(method),
        None => {
            warn!("Cannot deoptimize {}: synchronizer not initialized", method);
            false
        }
    }
}

/// Install the synchronizer hooks. Returns false on any fatal failure.
///
/// Intended to be called once, at load time.
pub fn init(
    handler: HookHandler<'_>,
    runtime: Arc<dyn Runtime>,
    registry: Arc<dyn BackupRegistry>,
    config: &Config,
) -> bool {
    let _ = env_logger::try_init();

    match try_init(handler, runtime, registry, config) {
        Ok(_) => true,
        Err(e) => {
            error!("Failed to initialize entry-point synchronizer: {}", e);
            false
        }
    }
}

/// Install the synchronizer hooks, reporting why initialization failed.
pub fn try_init(
    handler: HookHandler<'_>,
    runtime: Arc<dyn Runtime>,
    registry: Arc<dyn BackupRegistry>,
    config: &Config,
) -> Result<&'static Synchronizer> {
    if INIT_STARTED.swap(true, Ordering::SeqCst) {
        return Err(InitError::AlreadyInitialized);
    }

    let api = config.resolve_api_level().ok_or(InitError::UnknownApiLevel)?;
    info!("Initializing entry-point synchronizer for API {} on {}", api, config.arch);

    let interpreter = InterpreterEntry::resolve(&handler)?;
    let sync = SYNCHRONIZER.get_or_init(|| Synchronizer::new(runtime, registry, interpreter));

    install_features(&handler, api, config)?;

    ACTIVE.store(true, Ordering::Release);
    Ok(sync)
}

/// Hook every feature active for `api`. Returns the installed features.
pub(crate) fn install_features(handler: &HookHandler<'_>, api: ApiLevel, config: &Config) -> Result<Vec<Feature>> {
    let mut installed = Vec::new();
    for cap in capability::active_features(api, config) {
        match install_feature(handler, cap) {
            Ok(Some(symbol)) => {
                info!("Hooked {} via {}", cap.feature, symbol);
                installed.push(cap.feature);
            }
            Ok(None) => debug!("Optional feature {} unavailable on this runtime", cap.feature),
            Err(e) => return Err(e),
        }
    }
    Ok(installed)
}

/// Hook the first candidate of `cap` that both resolves and hooks.
///
/// `Ok(None)` means an optional feature had no usable candidate.
fn install_feature(handler: &HookHandler<'_>, cap: &Capability) -> Result<Option<&'static str>> {
    let candidates = stubs::candidates(cap.feature);
    let mut failed_hook = None;

    for stub in &candidates {
        let Some(target) = handler.resolve(stub.symbol) else {
            debug!("{} not found", stub.symbol);
            continue;
        };
        match handler.hook(target, stub.replacement) {
            Some(original) => {
                (stub.bind)(original);
                return Ok(Some(stub.symbol));
            }
            None => {
                warn!("Failed to hook {} at {:#x}", stub.symbol, target);
                failed_hook = Some(InitError::HookFailed {
                    symbol: stub.symbol,
                    address: target,
                });
            }
        }
    }

    if !cap.required {
        return Ok(None);
    }
    Err(failed_hook.unwrap_or_else(|| InitError::MissingSymbol {
        feature: cap.feature,
        candidates: candidates.iter().map(|s| s.symbol).collect(),
    }))
}
