//! CPU architecture of the host process.
//!
//! Centralizes architecture-dependent decisions so the hook layer can consult
//! a value instead of scattering `#[cfg]` blocks.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arch {
    Arm,
    Arm64,
    X86,
    X86_64,
    Riscv64,
}

impl Arch {
    /// Architecture this library was compiled for.
    pub const fn current() -> Self {
        if cfg!(target_arch = "aarch64") {
            Arch::Arm64
        } else if cfg!(target_arch = "arm") {
            Arch::Arm
        } else if cfg!(target_arch = "x86") {
            Arch::X86
        } else if cfg!(target_arch = "riscv64") {
            Arch::Riscv64
        } else {
            Arch::X86_64
        }
    }

    pub const fn is_64bit(self) -> bool {
        matches!(self, Arch::Arm64 | Arch::X86_64 | Arch::Riscv64)
    }

    pub const fn is_x86_family(self) -> bool {
        matches!(self, Arch::X86 | Arch::X86_64)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Arch::Arm => "arm",
            Arch::Arm64 => "arm64",
            Arch::X86 => "x86",
            Arch::X86_64 => "x86_64",
            Arch::Riscv64 => "riscv64",
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
