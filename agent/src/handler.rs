//! Capabilities the installer borrows from its host.
//!
//! The host owns the inline-hook engine and decides how libart symbols are
//! looked up. The installer only needs two operations from it.

/// Maps a mangled libart symbol to its address in this process.
pub trait SymbolResolver {
    /// Returns `None` when the symbol does not exist on this runtime.
    fn resolve(&self, symbol: &str) -> Option<usize>;
}

/// Installs an inline redirection at a resolved function address.
pub trait InlineHooker {
    /// Redirect `target` to `replacement`, returning a callable address that
    /// runs the original code. `None` means the hook was not installed.
    fn hook(&self, target: usize, replacement: usize) -> Option<usize>;
}

/// The pair of host capabilities handed to `init`.
#[derive(Clone, Copy)]
pub struct HookHandler<'a> {
    pub resolver: &'a dyn SymbolResolver,
    pub hooker: &'a dyn InlineHooker,
}

impl<'a> HookHandler<'a> {
    pub fn new(resolver: &'a dyn SymbolResolver, hooker: &'a dyn InlineHooker) -> Self {
        Self { resolver, hooker }
    }

    pub fn resolve(&self, symbol: &str) -> Option<usize> {
        self.resolver.resolve(symbol).filter(|&addr| addr != 0)
    }

    pub fn hook(&self, target: usize, replacement: usize) -> Option<usize> {
        self.hooker
            .hook(target, replacement)
            .filter(|&original| original != 0)
    }
}

impl<F> SymbolResolver for F
where
    F: Fn(&str) -> Option<usize>,
{
    fn resolve(&self, symbol: &str) -> Option<usize> {
        self(symbol)
    }
}
