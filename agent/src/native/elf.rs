//! Symbol lookup through a module's on-disk ELF image.
//!
//! libart hides most of the internals hooked here from the dynamic symbol
//! table, so `dlsym` alone is not enough. The module's file is parsed with
//! the `object` crate and both `.dynsym` and `.symtab` are indexed; addresses
//! are relocated by the load bias reported by the dynamic loader.

use std::collections::HashMap;
use std::fmt;

use log::debug;
use object::{Object, ObjectSymbol};

use crate::error::ResolveError;
use crate::handler::SymbolResolver;

/// A loaded module as reported by `dl_iterate_phdr`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct LoadedModule {
    path: String,
    bias: usize,
}

fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// `libart.so` matches `/apex/.../libart.so`; `libc.so` also matches `libc.so.6`.
fn module_matches(path: &str, name: &str) -> bool {
    let base = basename(path);
    base == name
        || path.ends_with(&format!("/{name}"))
        || base.strip_prefix(name).is_some_and(|rest| rest.starts_with('.'))
}

#[cfg(any(target_os = "linux", target_os = "android"))]
fn find_loaded_module(name: &str) -> Option<LoadedModule> {
    use std::ffi::{CStr, c_void};

    struct Ctx<'a> {
        name: &'a str,
        found: Option<LoadedModule>,
    }

    unsafe extern "C" fn callback(info: *mut libc::dl_phdr_info, _size: libc::size_t, data: *mut c_void) -> libc::c_int {
        // SAFETY: `data` is the `Ctx` passed below and `info` is valid for this call.
        let (ctx, info) = unsafe { (&mut *(data as *mut Ctx), &*info) };

        if info.dlpi_name.is_null() {
            return 0;
        }
        // SAFETY: the loader hands out NUL-terminated names.
        let path = unsafe { CStr::from_ptr(info.dlpi_name) }.to_string_lossy();
        // Empty name is the main executable.
        let path = if path.is_empty() {
            match std::fs::read_link("/proc/self/exe") {
                Ok(p) => p.to_string_lossy().into_owned(),
                Err(_) => return 0,
            }
        } else {
            path.into_owned()
        };

        if !module_matches(&path, ctx.name) {
            return 0;
        }
        ctx.found = Some(LoadedModule {
            path,
            bias: info.dlpi_addr as usize,
        });
        1 // stop iteration
    }

    let mut ctx = Ctx { name, found: None };
    // SAFETY: the callback only touches `ctx` for the duration of the call.
    unsafe {
        libc::dl_iterate_phdr(Some(callback), &mut ctx as *mut Ctx as *mut c_void);
    }
    ctx.found
}

#[cfg(not(any(target_os = "linux", target_os = "android")))]
fn find_loaded_module(_name: &str) -> Option<LoadedModule> {
    None
}

/// Resolves symbols, including hidden ones, of a single loaded module.
pub struct ElfResolver {
    path: String,
    bias: usize,
    symbols: HashMap<String, u64>,
}

impl ElfResolver {
    /// Index the symbols of the loaded module whose file name matches `name`.
    pub fn for_module(name: &str) -> Result<Self, ResolveError> {
        let module = find_loaded_module(name).ok_or_else(|| ResolveError::ModuleNotLoaded(name.to_string()))?;
        let data = std::fs::read(&module.path).map_err(|source| ResolveError::Io {
            path: module.path.clone(),
            source,
        })?;
        Self::from_image(module.path, module.bias, &data)
    }

    /// Index an ELF image already in memory, loaded at `bias`.
    pub fn from_image(path: String, bias: usize, data: &[u8]) -> Result<Self, ResolveError> {
        let obj = object::File::parse(data).map_err(|e| ResolveError::Parse {
            path: path.clone(),
            reason: e.to_string(),
        })?;

        let mut symbols = HashMap::new();
        // Exported definitions win over same-named local ones.
        for sym in obj.dynamic_symbols().chain(obj.symbols()) {
            if sym.is_undefined() || sym.address() == 0 {
                continue;
            }
            let name = match sym.name() {
                Ok(n) if !n.is_empty() => n,
                _ => continue,
            };
            symbols.entry(name.to_string()).or_insert(sym.address());
        }

        debug!("Indexed {} symbols from {} (bias {:#x})", symbols.len(), path, bias);
        Ok(Self { path, bias, symbols })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn bias(&self) -> usize {
        self.bias
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

impl fmt::Debug for ElfResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElfResolver")
            .field("path", &self.path)
            .field("bias", &format_args!("{:#x}", self.bias))
            .field("symbols", &self.symbols.len())
            .finish()
    }
}

impl SymbolResolver for ElfResolver {
    fn resolve(&self, symbol: &str) -> Option<usize> {
        self.symbols.get(symbol).map(|&value| self.bias.wrapping_add(value as usize))
    }
}
