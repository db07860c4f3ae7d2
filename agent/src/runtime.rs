//! Engine-side collaborators the synchronizer reads and writes through.

use artsync_types::{AccessFlags, ClassDef, ClassPtr, EntryPoint, Method, PendingRestore, Thread};

/// Accessors on engine objects.
///
/// Implementations read and write the engine's own method fields; the
/// synchronizer never caches what they return.
pub trait Runtime: Send + Sync {
    fn entry_point(&self, method: Method) -> EntryPoint;

    fn set_entry_point(&self, method: Method, entry: EntryPoint);

    fn access_flags(&self, method: Method) -> AccessFlags;

    /// Whether the engine currently forces this method through the interpreter.
    fn is_deoptimized(&self, method: Method) -> bool;

    /// Human-readable signature, for logs only.
    fn pretty_method(&self, method: Method) -> String {
        method.to_string()
    }

    /// Class-definition identity of a class object, if it has one.
    fn class_def(&self, class: ClassPtr) -> Option<ClassDef>;
}

/// Hook bookkeeping owned by the install path.
///
/// The synchronizer only queries it. `pop_pending` is the single ownership
/// transfer: once an entry is returned, no other call may see it.
pub trait BackupRegistry: Send + Sync {
    /// Backup of a hooked method, or `None` if `method` is not hooked.
    fn backup_of(&self, method: Method) -> Option<Method>;

    /// Take every pending restoration for the given scope.
    ///
    /// `Some(class_def)` scopes to one class definition. `None` is a global
    /// sweep: every class's entries, plus any deferred to `thread`.
    fn pop_pending(&self, class_def: Option<ClassDef>, thread: Option<Thread>) -> Vec<PendingRestore>;
}
