//! Common types shared between the artsync hook layer and its collaborators.
//!
//! Everything here is a thin, copyable view of an engine-owned object. None of
//! these types own the memory they point at.

pub mod handle;
pub mod platform;
pub mod version;

pub use handle::*;
pub use platform::Arch;
pub use version::ApiLevel;
