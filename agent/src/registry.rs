//! In-memory backup table.
//!
//! Reference implementation of `BackupRegistry` for hosts that do not keep
//! their own. The install path records hooked methods and frozen entry points
//! here; the synchronizer drains them.

use std::collections::HashMap;
use std::sync::{Mutex, RwLock};

use artsync_types::{ClassDef, EntryPoint, Method, PendingRestore, Thread};
use log::debug;

use crate::runtime::BackupRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum PendingKey {
    Class(ClassDef),
    /// Class initialized by this thread, awaiting its visibility callback.
    Thread(Thread),
}

#[derive(Default)]
pub struct BackupTable {
    backups: RwLock<HashMap<Method, Method>>,
    pending: Mutex<HashMap<PendingKey, Vec<PendingRestore>>>,
}

impl BackupTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `backup` for `target`. Returns the previous backup, if any.
    pub fn insert_backup(&self, target: Method, backup: Method) -> Option<Method> {
        self.backups
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(target, backup)
    }

    pub fn remove_backup(&self, target: Method) -> Option<Method> {
        self.backups
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&target)
    }

    /// Freeze `method` at `old_entry` until `class_def`'s next trampoline fix-up.
    pub fn push_pending(&self, class_def: ClassDef, method: Method, old_entry: EntryPoint) {
        self.pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entry(PendingKey::Class(class_def))
            .or_default()
            .push(PendingRestore::new(method, old_entry));
    }

    /// Move `class_def`'s pending entries under `thread`.
    ///
    /// Used when the class was initialized by `thread` but the fix-up only
    /// runs once the class becomes visibly initialized. Returns the number of
    /// entries moved.
    pub fn defer_to_thread(&self, class_def: ClassDef, thread: Thread) -> usize {
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        let Some(entries) = pending.remove(&PendingKey::Class(class_def)) else {
            return 0;
        };
        let moved = entries.len();
        pending
            .entry(PendingKey::Thread(thread))
            .or_default()
            .extend(entries);
        debug!("Deferred {} restoration(s) of class {} to thread {}", moved, class_def, thread);
        moved
    }

    pub fn pending_count(&self, class_def: ClassDef) -> usize {
        self.pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&PendingKey::Class(class_def))
            .map_or(0, Vec::len)
    }
}

impl BackupRegistry for BackupTable {
    fn backup_of(&self, method: Method) -> Option<Method> {
        self.backups
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&method)
            .copied()
    }

    fn pop_pending(&self, class_def: Option<ClassDef>, thread: Option<Thread>) -> Vec<PendingRestore> {
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(class_def) = class_def {
            return pending.remove(&PendingKey::Class(class_def)).unwrap_or_default();
        }

        // Entries deferred to other threads wait for their own callback.
        let mut drained = Vec::new();
        pending.retain(|key, entries| {
            let take = match key {
                PendingKey::Class(_) => true,
                PendingKey::Thread(owner) => thread == Some(*owner),
            };
            if take {
                drained.append(entries);
            }
            !take
        });
        drained
    }
}
