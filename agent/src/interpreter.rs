//! Forcing a method onto the interpreter.
//!
//! The engine's own `ClassLinker::SetEntryPointsToInterpreter` is preferred.
//! Where it is not exported (observed on API 33), the same effect is achieved
//! by pointing the method at one of two generic trampolines.

use std::ffi::c_void;

use artsync_types::{EntryPoint, Method};
use log::{debug, warn};

use crate::error::{InitError, Result};
use crate::handler::HookHandler;
use crate::runtime::Runtime;
use crate::symbols::interpreter as sym;

/// `void ClassLinker::SetEntryPointsToInterpreter(ArtMethod*) const`
pub type SetEntryPointsToInterpreterFn = unsafe extern "C" fn(class_linker: *mut c_void, method: *mut c_void);

/// Process-wide trampoline addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trampolines {
    pub interpreter_bridge: EntryPoint,
    pub generic_jni: EntryPoint,
}

impl Trampolines {
    pub fn is_sentinel(&self, entry: EntryPoint) -> bool {
        entry == self.interpreter_bridge || entry == self.generic_jni
    }
}

#[derive(Clone, Copy, Default)]
pub struct InterpreterEntry {
    routine: Option<SetEntryPointsToInterpreterFn>,
    trampolines: Option<Trampolines>,
}

impl InterpreterEntry {
    pub fn new(routine: Option<SetEntryPointsToInterpreterFn>, trampolines: Option<Trampolines>) -> Self {
        Self { routine, trampolines }
    }

    /// Resolve the engine routine and the trampolines.
    ///
    /// The trampolines are looked up even when the routine exists, since the
    /// synchronizer compares against them; they are only mandatory without it.
    pub fn resolve(handler: &HookHandler<'_>) -> Result<Self> {
        let routine = handler.resolve(sym::SET_ENTRY_POINTS_TO_INTERPRETER).map(|addr| {
            debug!("{} = {:#x}", sym::SET_ENTRY_POINTS_TO_INTERPRETER, addr);
            // SAFETY: the symbol has this signature on every release exporting it.
            unsafe { std::mem::transmute::<usize, SetEntryPointsToInterpreterFn>(addr) }
        });

        let bridge = handler.resolve(sym::QUICK_TO_INTERPRETER_BRIDGE);
        let generic_jni = handler.resolve(sym::QUICK_GENERIC_JNI_TRAMPOLINE);

        let trampolines = match (bridge, generic_jni) {
            (Some(bridge), Some(generic_jni)) => {
                debug!("{} = {:#x}", sym::QUICK_TO_INTERPRETER_BRIDGE, bridge);
                debug!("{} = {:#x}", sym::QUICK_GENERIC_JNI_TRAMPOLINE, generic_jni);
                Some(Trampolines {
                    interpreter_bridge: EntryPoint::new(bridge),
                    generic_jni: EntryPoint::new(generic_jni),
                })
            }
            _ if routine.is_some() => None,
            (None, _) => return Err(InitError::MissingTrampoline(sym::QUICK_TO_INTERPRETER_BRIDGE)),
            (_, None) => return Err(InitError::MissingTrampoline(sym::QUICK_GENERIC_JNI_TRAMPOLINE)),
        };

        Ok(Self { routine, trampolines })
    }

    pub fn trampolines(&self) -> Option<Trampolines> {
        self.trampolines
    }

    pub fn has_routine(&self) -> bool {
        self.routine.is_some()
    }

    /// Whether `entry` is one of the interpreter-bound trampolines.
    ///
    /// Unknown trampolines never match, so callers err towards re-applying.
    pub fn is_interpreter_bound(&self, entry: EntryPoint) -> bool {
        self.trampolines.is_some_and(|t| t.is_sentinel(entry))
    }

    /// Point `method` at the interpreter. Returns false if neither the engine
    /// routine nor the trampolines are available.
    pub fn set_entry_points_to_interpreter(&self, runtime: &dyn Runtime, method: Method) -> bool {
        if let Some(routine) = self.routine {
            // SAFETY: the routine does not use its receiver.
            unsafe { routine(std::ptr::null_mut(), method.as_ptr()) };
            return true;
        }

        let Some(trampolines) = self.trampolines else {
            warn!("Cannot deoptimize {}: no interpreter entry available", method);
            return false;
        };

        let target = if runtime.access_flags(method).is_native() {
            trampolines.generic_jni
        } else {
            trampolines.interpreter_bridge
        };
        debug!(
            "deoptimize {}method {} from {} to {}",
            if target == trampolines.generic_jni { "native " } else { "" },
            runtime.pretty_method(method),
            runtime.entry_point(method),
            target
        );
        runtime.set_entry_point(method, target);
        true
    }
}
