//! Entry-point reconciliation between hooked methods and their backups.
//!
//! The engine rewrites entry points on its own schedule: class-wide static
//! trampoline fix-ups, native (un)registration, JIT and deoptimization. None
//! of that can be suppressed at the source, so every intercepted event is
//! followed by an observe-then-correct pass here.

use std::sync::Arc;

use artsync_types::{ClassDef, ClassPtr, EntryPoint, Method, Thread};
use log::debug;

use crate::interpreter::InterpreterEntry;
use crate::runtime::{BackupRegistry, Runtime};

/// Outcome of reconciling one pending entry. Returned for diagnostics and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Restored {
    /// Entry point reset; nothing else to do.
    Reset,
    /// The engine's new entry point was copied onto the backup.
    Propagated { backup: Method, entry: EntryPoint },
    /// A deoptimized method was sent back to the interpreter.
    Redeoptimized { ok: bool },
}

pub struct Synchronizer {
    runtime: Arc<dyn Runtime>,
    registry: Arc<dyn BackupRegistry>,
    interpreter: InterpreterEntry,
}

impl Synchronizer {
    pub fn new(
        runtime: Arc<dyn Runtime>,
        registry: Arc<dyn BackupRegistry>,
        interpreter: InterpreterEntry,
    ) -> Self {
        Self {
            runtime,
            registry,
            interpreter,
        }
    }

    pub fn runtime(&self) -> &dyn Runtime {
        self.runtime.as_ref()
    }

    pub fn is_hooked(&self, method: Method) -> bool {
        self.registry.backup_of(method).is_some()
    }

    /// Method native (un)registration should be recorded against.
    ///
    /// A hooked method's own native slot is unused once its entry point is
    /// redirected; registering there would send later native calls back
    /// through the hook. The backup is what actually runs the native code.
    pub fn registration_target(&self, method: Method) -> Method {
        match self.registry.backup_of(method) {
            Some(backup) => {
                debug!("propagate native method: {}", self.runtime.pretty_method(backup));
                backup
            }
            None => method,
        }
    }

    /// Replacement decision for ClassLinker::ShouldUseInterpreterEntrypoint.
    ///
    /// Returns `Some(false)` to veto quick code for a hooked method, or `None`
    /// to let the engine decide.
    pub fn should_use_interpreter_entrypoint(&self, method: Method, quick_code: EntryPoint) -> Option<bool> {
        if !quick_code.is_null() && self.is_hooked(method) {
            Some(false)
        } else {
            None
        }
    }

    /// Class definition of `class`, or `None` for a null or definition-less class.
    pub fn class_def_of(&self, class: Option<ClassPtr>) -> Option<ClassDef> {
        class.and_then(|c| self.runtime.class_def(c))
    }

    /// Undo fix-up side effects on every method frozen for this scope.
    pub fn restore_backup(&self, class_def: Option<ClassDef>, thread: Option<Thread>) -> Vec<Restored> {
        let pending = self.registry.pop_pending(class_def, thread);
        if pending.is_empty() {
            return Vec::new();
        }

        let mut outcomes = Vec::with_capacity(pending.len());
        for entry in pending {
            let method = entry.method;
            let old_entry = entry.old_entry;

            let new_entry = self.runtime.entry_point(method);
            self.runtime.set_entry_point(method, old_entry);

            let deoptimized = self.runtime.is_deoptimized(method);
            let outcome = if let Some(backup) = self.registry.backup_of(method) {
                // A deoptimized backup is already interpreter-bound.
                if !deoptimized && new_entry != old_entry {
                    debug!("propagate entrypoint for orig {} backup {}", method, backup);
                    self.runtime.set_entry_point(backup, new_entry);
                    Restored::Propagated {
                        backup,
                        entry: new_entry,
                    }
                } else {
                    Restored::Reset
                }
            } else if deoptimized && !self.interpreter.is_interpreter_bound(new_entry) {
                debug!("re-deoptimize for {}", method);
                Restored::Redeoptimized {
                    ok: self
                        .interpreter
                        .set_entry_points_to_interpreter(self.runtime.as_ref(), method),
                }
            } else {
                Restored::Reset
            };
            outcomes.push(outcome);
        }
        outcomes
    }

    pub fn set_entry_points_to_interpreter(&self, method: Method) -> bool {
        self.interpreter
            .set_entry_points_to_interpreter(self.runtime.as_ref(), method)
    }
}
