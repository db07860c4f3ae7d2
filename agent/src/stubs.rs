//! Replacement functions installed over libart internals.
//!
//! Each engine call-site shape gets a thin `extern "C"` adapter that
//! translates the engine's argument order into one canonical synchronizer
//! call, then runs the original through the trampoline the hooker returned.
//! Until a synchronizer is published every adapter is a pure pass-through.

use std::ffi::c_void;
use std::sync::OnceLock;

use artsync_types::{ClassPtr, EntryPoint, Method, Thread};
use log::{trace, warn};

use crate::capability::Feature;
use crate::install::synchronizer;
use crate::symbols::{self, fixup_static_trampolines, register_native, unregister_native, visibly_initialized};

/// `ObjPtr<mirror::Class>`, passed by value as a single pointer.
#[repr(transparent)]
#[derive(Clone, Copy)]
pub struct ObjPtr(*mut c_void);

/// Shapes of the native (un)registration entry points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeCallSite {
    /// `ClassLinker::{Un}RegisterNative(Thread*, ArtMethod*, ...)`
    ClassLinker,
    /// `ArtMethod::{Un}RegisterNative(...)` returning the previous pointer.
    Method,
    /// `ArtMethod::RegisterNative(const void*, bool)` returning nothing.
    MethodFast,
    /// `mirror::ArtMethod::{Un}RegisterNative(Thread*, ...)`
    MirrorWithThread,
}

/// Shapes of `ClassLinker::FixupStaticTrampolines`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixupCallSite {
    WithThread,
    ObjPtr,
    Raw,
}

/// Slot for the trampoline returned by the hooker.
pub(crate) struct Original<F>(OnceLock<F>);

impl<F: Copy> Original<F> {
    const fn new() -> Self {
        Self(OnceLock::new())
    }

    fn bind(&self, address: usize) {
        debug_assert_eq!(std::mem::size_of::<F>(), std::mem::size_of::<usize>());
        // SAFETY: F is the function-pointer type of the hooked symbol.
        let f = unsafe { std::mem::transmute_copy::<usize, F>(&address) };
        let _ = self.0.set(f);
    }

    fn get(&self) -> Option<F> {
        self.0.get().copied()
    }
}

/// One candidate hook for a feature.
pub(crate) struct HookStub {
    pub symbol: &'static str,
    pub replacement: usize,
    pub bind: fn(usize),
}

/// Candidates for `feature`, in preference order. The first that resolves and
/// hooks is the only one installed.
pub(crate) fn candidates(feature: Feature) -> Vec<HookStub> {
    match feature {
        Feature::ShouldUseInterpreterEntrypoint => vec![HookStub {
            symbol: symbols::SHOULD_USE_INTERPRETER_ENTRYPOINT,
            replacement: should_use_interpreter_entrypoint as *const () as usize,
            bind: |addr| SHOULD_USE_INTERPRETER_ENTRYPOINT.bind(addr),
        }],
        Feature::FixupStaticTrampolines => vec![
            HookStub {
                symbol: fixup_static_trampolines::WITH_THREAD,
                replacement: fixup_static_trampolines_with_thread as *const () as usize,
                bind: |addr| FIXUP_WITH_THREAD.bind(addr),
            },
            HookStub {
                symbol: fixup_static_trampolines::OBJ_PTR,
                replacement: fixup_static_trampolines_obj_ptr as *const () as usize,
                bind: |addr| FIXUP_OBJ_PTR.bind(addr),
            },
            HookStub {
                symbol: fixup_static_trampolines::RAW,
                replacement: fixup_static_trampolines_raw as *const () as usize,
                bind: |addr| FIXUP_RAW.bind(addr),
            },
        ],
        Feature::RegisterNative => vec![
            HookStub {
                symbol: register_native::CLASS_LINKER,
                replacement: register_native_class_linker as *const () as usize,
                bind: |addr| REGISTER_CLASS_LINKER.bind(addr),
            },
            HookStub {
                symbol: register_native::METHOD,
                replacement: register_native_method as *const () as usize,
                bind: |addr| REGISTER_METHOD.bind(addr),
            },
            HookStub {
                symbol: register_native::METHOD_FAST,
                replacement: register_native_method_fast as *const () as usize,
                bind: |addr| REGISTER_METHOD_FAST.bind(addr),
            },
            HookStub {
                symbol: register_native::MIRROR_WITH_THREAD,
                replacement: register_native_mirror as *const () as usize,
                bind: |addr| REGISTER_MIRROR.bind(addr),
            },
        ],
        Feature::UnregisterNative => vec![
            HookStub {
                symbol: unregister_native::CLASS_LINKER,
                replacement: unregister_native_class_linker as *const () as usize,
                bind: |addr| UNREGISTER_CLASS_LINKER.bind(addr),
            },
            // Also covers the void-returning release: the caller ignores the
            // return register there.
            HookStub {
                symbol: unregister_native::METHOD,
                replacement: unregister_native_method as *const () as usize,
                bind: |addr| UNREGISTER_METHOD.bind(addr),
            },
            HookStub {
                symbol: unregister_native::MIRROR_WITH_THREAD,
                replacement: unregister_native_mirror as *const () as usize,
                bind: |addr| UNREGISTER_MIRROR.bind(addr),
            },
        ],
        Feature::VisiblyInitializedCallbacks => vec![
            HookStub {
                symbol: visibly_initialized::ADJUST_THREAD_VISIBILITY_COUNTER,
                replacement: adjust_thread_visibility_counter as *const () as usize,
                bind: |addr| ADJUST_THREAD_VISIBILITY_COUNTER.bind(addr),
            },
            HookStub {
                symbol: visibly_initialized::MARK_VISIBLY_INITIALIZED,
                replacement: mark_visibly_initialized as *const () as usize,
                bind: |addr| MARK_VISIBLY_INITIALIZED.bind(addr),
            },
        ],
    }
}

// =============================================================================
// CANONICAL OPERATIONS
// =============================================================================

fn registration_target(site: NativeCallSite, method: *mut c_void) -> *mut c_void {
    let (Some(sync), Some(m)) = (synchronizer(), Method::from_ptr(method)) else {
        return method;
    };
    let target = sync.registration_target(m);
    if target != m {
        trace!("{:?}: registering against backup {} instead of {}", site, target, m);
    }
    target.as_ptr()
}

fn after_fixup(site: FixupCallSite, class: *mut c_void, thread: *mut c_void) {
    let Some(sync) = synchronizer() else {
        return;
    };
    // A class without a definition has nothing queued; never fall through to
    // the global sweep from here.
    let Some(class_def) = sync.class_def_of(ClassPtr::from_ptr(class)) else {
        return;
    };
    let restored = sync.restore_backup(Some(class_def), Thread::from_ptr(thread));
    if !restored.is_empty() {
        trace!("{:?}: restored {} method(s) of class {}", site, restored.len(), class_def);
    }
}

fn after_visibility_callback(thread: *mut c_void) {
    if let Some(sync) = synchronizer() {
        sync.restore_backup(None, Thread::from_ptr(thread));
    }
}

fn missing_original(symbol: &str) {
    warn!("{} called before its original was bound", symbol);
}

// =============================================================================
// SHOULD USE INTERPRETER ENTRYPOINT
// =============================================================================

type ShouldUseInterpreterEntrypointFn = unsafe extern "C" fn(*mut c_void, *const c_void) -> bool;

static SHOULD_USE_INTERPRETER_ENTRYPOINT: Original<ShouldUseInterpreterEntrypointFn> = Original::new();

unsafe extern "C" fn should_use_interpreter_entrypoint(method: *mut c_void, quick_code: *const c_void) -> bool {
    if let (Some(sync), Some(m)) = (synchronizer(), Method::from_ptr(method)) {
        if let Some(verdict) = sync.should_use_interpreter_entrypoint(m, EntryPoint::from_ptr(quick_code)) {
            return verdict;
        }
    }
    match SHOULD_USE_INTERPRETER_ENTRYPOINT.get() {
        Some(original) => unsafe { original(method, quick_code) },
        None => {
            missing_original(symbols::SHOULD_USE_INTERPRETER_ENTRYPOINT);
            false
        }
    }
}

// =============================================================================
// REGISTER NATIVE
// =============================================================================

type RegisterNativeClassLinkerFn =
    unsafe extern "C" fn(*mut c_void, *mut c_void, *mut c_void, *const c_void) -> *const c_void;
type RegisterNativeMethodFn = unsafe extern "C" fn(*mut c_void, *const c_void) -> *const c_void;
type RegisterNativeMethodFastFn = unsafe extern "C" fn(*mut c_void, *const c_void, bool);
type RegisterNativeMirrorFn = unsafe extern "C" fn(*mut c_void, *mut c_void, *const c_void, bool);

static REGISTER_CLASS_LINKER: Original<RegisterNativeClassLinkerFn> = Original::new();
static REGISTER_METHOD: Original<RegisterNativeMethodFn> = Original::new();
static REGISTER_METHOD_FAST: Original<RegisterNativeMethodFastFn> = Original::new();
static REGISTER_MIRROR: Original<RegisterNativeMirrorFn> = Original::new();

unsafe extern "C" fn register_native_class_linker(
    class_linker: *mut c_void,
    thread: *mut c_void,
    method: *mut c_void,
    native_method: *const c_void,
) -> *const c_void {
    let method = registration_target(NativeCallSite::ClassLinker, method);
    match REGISTER_CLASS_LINKER.get() {
        Some(original) => unsafe { original(class_linker, thread, method, native_method) },
        None => {
            missing_original(register_native::CLASS_LINKER);
            std::ptr::null()
        }
    }
}

unsafe extern "C" fn register_native_method(method: *mut c_void, native_method: *const c_void) -> *const c_void {
    let method = registration_target(NativeCallSite::Method, method);
    match REGISTER_METHOD.get() {
        Some(original) => unsafe { original(method, native_method) },
        None => {
            missing_original(register_native::METHOD);
            std::ptr::null()
        }
    }
}

unsafe extern "C" fn register_native_method_fast(method: *mut c_void, native_method: *const c_void, is_fast: bool) {
    let method = registration_target(NativeCallSite::MethodFast, method);
    match REGISTER_METHOD_FAST.get() {
        Some(original) => unsafe { original(method, native_method, is_fast) },
        None => missing_original(register_native::METHOD_FAST),
    }
}

unsafe extern "C" fn register_native_mirror(
    method: *mut c_void,
    thread: *mut c_void,
    native_method: *const c_void,
    is_fast: bool,
) {
    let method = registration_target(NativeCallSite::MirrorWithThread, method);
    match REGISTER_MIRROR.get() {
        Some(original) => unsafe { original(method, thread, native_method, is_fast) },
        None => missing_original(register_native::MIRROR_WITH_THREAD),
    }
}

// =============================================================================
// UNREGISTER NATIVE
// =============================================================================

type UnregisterNativeClassLinkerFn = unsafe extern "C" fn(*mut c_void, *mut c_void, *mut c_void) -> *const c_void;
type UnregisterNativeMethodFn = unsafe extern "C" fn(*mut c_void) -> *const c_void;
type UnregisterNativeMirrorFn = unsafe extern "C" fn(*mut c_void, *mut c_void);

static UNREGISTER_CLASS_LINKER: Original<UnregisterNativeClassLinkerFn> = Original::new();
static UNREGISTER_METHOD: Original<UnregisterNativeMethodFn> = Original::new();
static UNREGISTER_MIRROR: Original<UnregisterNativeMirrorFn> = Original::new();

unsafe extern "C" fn unregister_native_class_linker(
    class_linker: *mut c_void,
    thread: *mut c_void,
    method: *mut c_void,
) -> *const c_void {
    let method = registration_target(NativeCallSite::ClassLinker, method);
    match UNREGISTER_CLASS_LINKER.get() {
        Some(original) => unsafe { original(class_linker, thread, method) },
        None => {
            missing_original(unregister_native::CLASS_LINKER);
            std::ptr::null()
        }
    }
}

unsafe extern "C" fn unregister_native_method(method: *mut c_void) -> *const c_void {
    let method = registration_target(NativeCallSite::Method, method);
    match UNREGISTER_METHOD.get() {
        Some(original) => unsafe { original(method) },
        None => {
            missing_original(unregister_native::METHOD);
            std::ptr::null()
        }
    }
}

unsafe extern "C" fn unregister_native_mirror(method: *mut c_void, thread: *mut c_void) {
    let method = registration_target(NativeCallSite::MirrorWithThread, method);
    match UNREGISTER_MIRROR.get() {
        Some(original) => unsafe { original(method, thread) },
        None => missing_original(unregister_native::MIRROR_WITH_THREAD),
    }
}

// =============================================================================
// FIXUP STATIC TRAMPOLINES
// =============================================================================

type FixupWithThreadFn = unsafe extern "C" fn(*mut c_void, *mut c_void, ObjPtr);
type FixupObjPtrFn = unsafe extern "C" fn(*mut c_void, ObjPtr);
type FixupRawFn = unsafe extern "C" fn(*mut c_void, *mut c_void);

static FIXUP_WITH_THREAD: Original<FixupWithThreadFn> = Original::new();
static FIXUP_OBJ_PTR: Original<FixupObjPtrFn> = Original::new();
static FIXUP_RAW: Original<FixupRawFn> = Original::new();

unsafe extern "C" fn fixup_static_trampolines_with_thread(
    class_linker: *mut c_void,
    thread: *mut c_void,
    class: ObjPtr,
) {
    match FIXUP_WITH_THREAD.get() {
        Some(original) => unsafe { original(class_linker, thread, class) },
        None => return missing_original(fixup_static_trampolines::WITH_THREAD),
    }
    after_fixup(FixupCallSite::WithThread, class.0, thread);
}

unsafe extern "C" fn fixup_static_trampolines_obj_ptr(class_linker: *mut c_void, class: ObjPtr) {
    match FIXUP_OBJ_PTR.get() {
        Some(original) => unsafe { original(class_linker, class) },
        None => return missing_original(fixup_static_trampolines::OBJ_PTR),
    }
    after_fixup(FixupCallSite::ObjPtr, class.0, std::ptr::null_mut());
}

unsafe extern "C" fn fixup_static_trampolines_raw(class_linker: *mut c_void, class: *mut c_void) {
    match FIXUP_RAW.get() {
        Some(original) => unsafe { original(class_linker, class) },
        None => return missing_original(fixup_static_trampolines::RAW),
    }
    after_fixup(FixupCallSite::Raw, class, std::ptr::null_mut());
}

// =============================================================================
// VISIBLY INITIALIZED CALLBACKS
// =============================================================================

type AdjustThreadVisibilityCounterFn = unsafe extern "C" fn(*mut c_void, *mut c_void, isize);
type MarkVisiblyInitializedFn = unsafe extern "C" fn(*mut c_void, *mut c_void);

static ADJUST_THREAD_VISIBILITY_COUNTER: Original<AdjustThreadVisibilityCounterFn> = Original::new();
static MARK_VISIBLY_INITIALIZED: Original<MarkVisiblyInitializedFn> = Original::new();

unsafe extern "C" fn adjust_thread_visibility_counter(callback: *mut c_void, thread: *mut c_void, adjustment: isize) {
    match ADJUST_THREAD_VISIBILITY_COUNTER.get() {
        Some(original) => unsafe { original(callback, thread, adjustment) },
        None => return missing_original(visibly_initialized::ADJUST_THREAD_VISIBILITY_COUNTER),
    }
    after_visibility_callback(thread);
}

unsafe extern "C" fn mark_visibly_initialized(callback: *mut c_void, thread: *mut c_void) {
    match MARK_VISIBLY_INITIALIZED.get() {
        Some(original) => unsafe { original(callback, thread) },
        None => return missing_original(visibly_initialized::MARK_VISIBLY_INITIALIZED),
    }
    after_visibility_callback(thread);
}
