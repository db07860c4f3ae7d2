//! Symbol resolution against modules loaded in the current process.

mod dlsym;
mod elf;

pub use dlsym::DlsymResolver;
pub use elf::ElfResolver;
