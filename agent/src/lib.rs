//! Entry-point synchronization for hooked ART methods.
//!
//! A hooking framework that redirects an ART method to a replacement keeps a
//! backup copy of the original method. The engine does not know about that
//! copy, so several of its internal routines leave the two out of step:
//! static trampolines are fixed up on the hooked method only, native code is
//! registered against the hooked method, and the interpreter-entry check does
//! not know the hooked method must stay compiled. This crate hooks those
//! routines and keeps the pair consistent.
//!
//! The host supplies a [`HookHandler`] (symbol resolver and inline hooker), a
//! [`Runtime`] (raw access to `ArtMethod` fields) and a [`BackupRegistry`]
//! (hooked-to-backup mapping plus pending restores), then calls [`init`] once.

pub mod capability;
pub mod config;
pub mod error;
pub mod handler;
pub mod install;
pub mod interpreter;
pub mod native;
pub mod registry;
pub mod runtime;
mod stubs;
pub mod symbols;
pub mod sync;


pub use artsync_types as types;

pub use capability::{Capability, Feature};
pub use config::Config;
pub use error::{InitError, ResolveError};
pub use handler::{HookHandler, InlineHooker, SymbolResolver};
pub use install::{init, set_entry_points_to_interpreter, synchronizer, try_init};
pub use interpreter::{InterpreterEntry, Trampolines};
pub use native::{DlsymResolver, ElfResolver};
pub use registry::BackupTable;
pub use runtime::{BackupRegistry, Runtime};
pub use sync::{Restored, Synchronizer};
