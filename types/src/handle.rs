//! Address-sized handles for engine objects.
//!
//! The engine owns methods, classes and threads; these wrappers only carry
//! their addresses across the hook boundary. All of them are `repr(transparent)`
//! over `usize` so they can be passed where the engine passes a pointer.

use std::ffi::c_void;
use std::fmt;

macro_rules! address_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[repr(transparent)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(usize);

        impl $name {
            pub const fn new(address: usize) -> Self {
                Self(address)
            }

            /// Wrap a raw engine pointer. Null maps to `None`.
            pub fn from_ptr(ptr: *const c_void) -> Option<Self> {
                if ptr.is_null() {
                    None
                } else {
                    Some(Self(ptr as usize))
                }
            }

            pub const fn address(self) -> usize {
                self.0
            }

            pub fn as_ptr(self) -> *mut c_void {
                self.0 as *mut c_void
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{:#x}", self.0)
            }
        }
    };
}

address_handle!(
    /// An engine method object (`ArtMethod*`).
    Method
);

address_handle!(
    /// An engine class object (`mirror::Class*`).
    ClassPtr
);

address_handle!(
    /// Class-definition identity (`dex::ClassDef*`). Key for pending restorations.
    ClassDef
);

address_handle!(
    /// An engine thread (`Thread*`).
    Thread
);

/// Executable address the engine jumps to when a method is invoked.
///
/// Unlike the other handles, null is a legitimate value here ("no code yet").
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct EntryPoint(usize);

impl EntryPoint {
    pub const NULL: EntryPoint = EntryPoint(0);

    pub const fn new(address: usize) -> Self {
        Self(address)
    }

    pub fn from_ptr(ptr: *const c_void) -> Self {
        Self(ptr as usize)
    }

    pub const fn address(self) -> usize {
        self.0
    }

    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    pub fn as_ptr(self) -> *const c_void {
        self.0 as *const c_void
    }
}

impl fmt::Display for EntryPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Method access flags as stored in the method object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AccessFlags(u32);

impl AccessFlags {
    pub const PUBLIC: u32 = 0x0001;
    pub const STATIC: u32 = 0x0008;
    pub const NATIVE: u32 = 0x0100;

    pub const fn new(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn is_native(self) -> bool {
        self.0 & Self::NATIVE != 0
    }
}

/// A method whose entry point was frozen before a class-wide trampoline fix-up.
///
/// `old_entry` is the baseline used to tell a real engine update apart from
/// fix-up churn once the fix-up has run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingRestore {
    pub method: Method,
    pub old_entry: EntryPoint,
}

impl PendingRestore {
    pub const fn new(method: Method, old_entry: EntryPoint) -> Self {
        Self { method, old_entry }
    }
}
