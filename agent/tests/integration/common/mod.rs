//! Common test utilities for integration tests.
//!
//! The installer publishes process-wide state, so every test in a binary
//! shares one fixture, and each binary installs one set of call-site shapes.
//! Tests keep out of each other's way by allocating their own methods,
//! classes and threads.

#![allow(dead_code)]

use std::collections::HashMap;
use std::ffi::c_void;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

use artsync::symbols::{self, fixup_static_trampolines, interpreter, register_native, unregister_native, visibly_initialized};
use artsync::types::{AccessFlags, ApiLevel, Arch, ClassDef, ClassPtr, EntryPoint, Method, Thread};
use artsync::{BackupTable, Config, HookHandler, InlineHooker, Runtime, SymbolResolver, Synchronizer};

pub const BRIDGE: EntryPoint = EntryPoint::new(0xb000);
pub const GENERIC_JNI: EntryPoint = EntryPoint::new(0xc000);

// =============================================================================
// Engine stand-in
// =============================================================================

#[derive(Debug, Clone, Copy)]
struct MethodState {
    entry: EntryPoint,
    flags: AccessFlags,
    deoptimized: bool,
}

pub struct TestRuntime {
    methods: Mutex<HashMap<Method, MethodState>>,
    class_defs: Mutex<HashMap<ClassPtr, ClassDef>>,
    next: AtomicUsize,
}

impl TestRuntime {
    fn new() -> Self {
        Self {
            methods: Mutex::new(HashMap::new()),
            class_defs: Mutex::new(HashMap::new()),
            next: AtomicUsize::new(0x40_0000),
        }
    }

    pub fn add_method(&self, entry: usize, flags: u32) -> Method {
        let method = Method::new(self.next.fetch_add(0x40, Ordering::Relaxed));
        self.methods.lock().unwrap().insert(
            method,
            MethodState {
                entry: EntryPoint::new(entry),
                flags: AccessFlags::new(flags),
                deoptimized: false,
            },
        );
        method
    }

    pub fn set_deoptimized(&self, method: Method) {
        if let Some(m) = self.methods.lock().unwrap().get_mut(&method) {
            m.deoptimized = true;
        }
    }

    pub fn add_class(&self, class: usize, class_def: usize) -> (ClassPtr, ClassDef) {
        let (class, class_def) = (ClassPtr::new(class), ClassDef::new(class_def));
        self.class_defs.lock().unwrap().insert(class, class_def);
        (class, class_def)
    }
}

impl Runtime for TestRuntime {
    fn entry_point(&self, method: Method) -> EntryPoint {
        self.methods
            .lock()
            .unwrap()
            .get(&method)
            .map_or(EntryPoint::NULL, |m| m.entry)
    }

    fn set_entry_point(&self, method: Method, entry: EntryPoint) {
        if let Some(m) = self.methods.lock().unwrap().get_mut(&method) {
            m.entry = entry;
        }
    }

    fn access_flags(&self, method: Method) -> AccessFlags {
        self.methods
            .lock()
            .unwrap()
            .get(&method)
            .map_or(AccessFlags::default(), |m| m.flags)
    }

    fn is_deoptimized(&self, method: Method) -> bool {
        self.methods
            .lock()
            .unwrap()
            .get(&method)
            .is_some_and(|m| m.deoptimized)
    }

    fn class_def(&self, class: ClassPtr) -> Option<ClassDef> {
        self.class_defs.lock().unwrap().get(&class).copied()
    }
}

// =============================================================================
// Engine originals
// =============================================================================

/// Calls that reached the engine's own code through the hook trampolines.
#[derive(Default)]
pub struct EngineLog {
    /// `(method, native)` for every registration.
    pub registered: Mutex<Vec<(usize, usize)>>,
    pub unregistered: Mutex<Vec<usize>>,
    /// `(method, thread)` as seen by shapes that take both.
    pub thread_args: Mutex<Vec<(usize, usize)>>,
    /// `(method, is_fast)` as seen by shapes that take the flag.
    pub fast_flags: Mutex<Vec<(usize, bool)>>,
    pub fixed_up: Mutex<Vec<usize>>,
    pub made_visible: Mutex<Vec<usize>>,
    /// `(thread, adjustment)` for every visibility-counter adjustment.
    pub adjustments: Mutex<Vec<(usize, isize)>>,
    /// Entry points the engine's fix-up writes, per class.
    pub fixups: Mutex<HashMap<usize, Vec<(Method, EntryPoint)>>>,
}

static ENGINE: OnceLock<EngineLog> = OnceLock::new();

pub fn engine() -> &'static EngineLog {
    ENGINE.get_or_init(EngineLog::default)
}

/// Queue the entry point the engine's fix-up of `class` will write for `method`.
pub fn engine_will_write(class: usize, method: Method, entry: usize) {
    engine()
        .fixups
        .lock()
        .unwrap()
        .entry(class)
        .or_default()
        .push((method, EntryPoint::new(entry)));
}

/// Run the engine's side of a static trampoline fix-up for `class`.
pub fn engine_fixup(class: usize) {
    engine().fixed_up.lock().unwrap().push(class);
    let writes = engine().fixups.lock().unwrap().remove(&class).unwrap_or_default();
    if let Some(fixture) = FIXTURE.get() {
        for (method, entry) in writes {
            fixture.runtime.set_entry_point(method, entry);
        }
    }
}

unsafe extern "C" fn original_should_use_interpreter_entrypoint(_method: *mut c_void, _quick_code: *const c_void) -> bool {
    true
}

unsafe extern "C" fn original_register_native(
    _class_linker: *mut c_void,
    _thread: *mut c_void,
    method: *mut c_void,
    native_method: *const c_void,
) -> *const c_void {
    engine()
        .registered
        .lock()
        .unwrap()
        .push((method as usize, native_method as usize));
    native_method
}

unsafe extern "C" fn original_unregister_native(
    _class_linker: *mut c_void,
    _thread: *mut c_void,
    method: *mut c_void,
) -> *const c_void {
    engine().unregistered.lock().unwrap().push(method as usize);
    std::ptr::null()
}

unsafe extern "C" fn original_fixup_static_trampolines(_class_linker: *mut c_void, _thread: *mut c_void, class: *mut c_void) {
    engine_fixup(class as usize);
}

unsafe extern "C" fn original_mark_visibly_initialized(_callback: *mut c_void, thread: *mut c_void) {
    engine().made_visible.lock().unwrap().push(thread as usize);
}

// =============================================================================
// Host stand-in
// =============================================================================

/// Symbol table and inline hooker over fake libart addresses.
pub struct TestHost {
    symbols: HashMap<&'static str, usize>,
    originals: HashMap<usize, usize>,
    hooked: Mutex<HashMap<usize, usize>>,
}

impl TestHost {
    /// A host exporting only the interpreter trampolines.
    pub fn new() -> Self {
        let mut symbols = HashMap::new();
        symbols.insert(interpreter::QUICK_TO_INTERPRETER_BRIDGE, BRIDGE.address());
        symbols.insert(interpreter::QUICK_GENERIC_JNI_TRAMPOLINE, GENERIC_JNI.address());
        Self {
            symbols,
            originals: HashMap::new(),
            hooked: Mutex::new(HashMap::new()),
        }
    }

    /// Export `symbol` at `address`, backed by the fake engine function `original`.
    pub fn with(mut self, symbol: &'static str, address: usize, original: usize) -> Self {
        self.symbols.insert(symbol, address);
        self.originals.insert(address, original);
        self
    }

    /// The class-linker member shapes, plus every optional hook.
    pub fn class_linker_shapes() -> Self {
        Self::new()
            .with(
                symbols::SHOULD_USE_INTERPRETER_ENTRYPOINT,
                0x7000_1000,
                original_should_use_interpreter_entrypoint as *const () as usize,
            )
            .with(
                register_native::CLASS_LINKER,
                0x7000_2000,
                original_register_native as *const () as usize,
            )
            .with(
                unregister_native::CLASS_LINKER,
                0x7000_3000,
                original_unregister_native as *const () as usize,
            )
            .with(
                fixup_static_trampolines::WITH_THREAD,
                0x7000_4000,
                original_fixup_static_trampolines as *const () as usize,
            )
            .with(
                visibly_initialized::MARK_VISIBLY_INITIALIZED,
                0x7000_5000,
                original_mark_visibly_initialized as *const () as usize,
            )
    }

    /// Address the engine now jumps to when calling `symbol`.
    pub fn replacement(&self, symbol: &str) -> usize {
        let target = self.symbols[symbol];
        self.hooked.lock().unwrap()[&target]
    }

    pub fn is_hooked(&self, symbol: &str) -> bool {
        self.symbols
            .get(symbol)
            .is_some_and(|target| self.hooked.lock().unwrap().contains_key(target))
    }

    pub fn hook_count(&self) -> usize {
        self.hooked.lock().unwrap().len()
    }
}

impl SymbolResolver for TestHost {
    fn resolve(&self, symbol: &str) -> Option<usize> {
        self.symbols.get(symbol).copied()
    }
}

impl InlineHooker for TestHost {
    fn hook(&self, target: usize, replacement: usize) -> Option<usize> {
        let original = *self.originals.get(&target)?;
        self.hooked.lock().unwrap().insert(target, replacement);
        Some(original)
    }
}

// =============================================================================
// Fixture
// =============================================================================

pub struct Fixture {
    pub runtime: Arc<TestRuntime>,
    pub table: Arc<BackupTable>,
    pub host: TestHost,
    pub sync: &'static Synchronizer,
}

static FIXTURE: OnceLock<Fixture> = OnceLock::new();
static SERIAL: Mutex<()> = Mutex::new(());

pub fn config() -> Config {
    Config::default()
        .with_api_level(ApiLevel::S)
        .with_arch(Arch::Arm64)
}

/// Installs the class-linker shapes on first use.
pub fn fixture() -> &'static Fixture {
    fixture_with(TestHost::class_linker_shapes)
}

/// Installs the hooks `host` exports on first use. API S on arm64 activates
/// every feature. Each test binary installs exactly one host.
pub fn fixture_with(host: fn() -> TestHost) -> &'static Fixture {
    FIXTURE.get_or_init(|| {
        let _ = env_logger::builder().is_test(true).try_init();

        let runtime = Arc::new(TestRuntime::new());
        let table = Arc::new(BackupTable::new());
        let host = host();
        let sync = artsync::try_init(
            HookHandler::new(&host, &host),
            runtime.clone(),
            table.clone(),
            &config(),
        )
        .expect("installation should succeed");

        Fixture {
            runtime,
            table,
            host,
            sync,
        }
    })
}

/// Held by tests that queue restorations. A visibility callback sweeps every
/// class, so those tests cannot overlap.
pub fn serial() -> MutexGuard<'static, ()> {
    SERIAL.lock().unwrap_or_else(|e| e.into_inner())
}

/// A hooked method with its backup; both start at `entry`.
pub fn hooked_method(fixture: &Fixture, entry: usize, flags: u32) -> (Method, Method) {
    let target = fixture.runtime.add_method(entry, flags);
    let backup = fixture.runtime.add_method(entry, flags);
    fixture.table.insert_backup(target, backup);
    (target, backup)
}

pub fn entry(fixture: &Fixture, method: Method) -> usize {
    fixture.runtime.entry_point(method).address()
}

pub fn thread(address: usize) -> Thread {
    Thread::new(address)
}

pub fn ptr(address: usize) -> *mut c_void {
    address as *mut c_void
}

/// The installed replacement for `symbol`, typed the way the engine calls it.
///
/// # Safety
/// `F` must be the function-pointer type of `symbol`.
pub unsafe fn replacement_fn<F: Copy>(fixture: &Fixture, symbol: &str) -> F {
    let addr = fixture.host.replacement(symbol);
    unsafe { std::mem::transmute_copy::<usize, F>(&addr) }
}
