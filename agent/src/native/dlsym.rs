use std::ffi::CString;

use crate::handler::SymbolResolver;

/// Resolves exported symbols through `dlsym(RTLD_DEFAULT, ...)`.
///
/// Only sees the dynamic symbol table, so hidden libart internals are
/// usually out of reach; see [`super::ElfResolver`] for those.
#[derive(Debug, Default, Clone, Copy)]
pub struct DlsymResolver;

impl DlsymResolver {
    pub fn new() -> Self {
        Self
    }
}

impl SymbolResolver for DlsymResolver {
    fn resolve(&self, symbol: &str) -> Option<usize> {
        let cstr = CString::new(symbol).ok()?;
        // SAFETY: RTLD_DEFAULT is always a valid handle and `cstr` is NUL-terminated.
        let p = unsafe { libc::dlsym(libc::RTLD_DEFAULT, cstr.as_ptr()) };
        if p.is_null() { None } else { Some(p as usize) }
    }
}
