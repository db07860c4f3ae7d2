//! Mangled names of the libart internals the synchronizer intercepts.
//!
//! Several entry points exist in more than one shape across releases; each
//! group lists every spelling that has shipped. Which one a given device
//! exports depends on the release and on how the engine was compiled.

/// ClassLinker::ShouldUseInterpreterEntrypoint(ArtMethod*, const void*)
pub const SHOULD_USE_INTERPRETER_ENTRYPOINT: &str =
    "_ZN3art11ClassLinker30ShouldUseInterpreterEntrypointEPNS_9ArtMethodEPKv";

pub mod register_native {
    /// ClassLinker::RegisterNative(Thread*, ArtMethod*, const void*) -> const void*
    pub const CLASS_LINKER: &str =
        "_ZN3art11ClassLinker14RegisterNativeEPNS_6ThreadEPNS_9ArtMethodEPKv";

    /// ArtMethod::RegisterNative(const void*) -> const void*
    pub const METHOD: &str = "_ZN3art9ArtMethod14RegisterNativeEPKv";

    /// ArtMethod::RegisterNative(const void*, bool)
    pub const METHOD_FAST: &str = "_ZN3art9ArtMethod14RegisterNativeEPKvb";

    /// mirror::ArtMethod::RegisterNative(Thread*, const void*, bool)
    pub const MIRROR_WITH_THREAD: &str =
        "_ZN3art6mirror9ArtMethod14RegisterNativeEPNS_6ThreadEPKvb";
}

pub mod unregister_native {
    /// ClassLinker::UnregisterNative(Thread*, ArtMethod*) -> const void*
    pub const CLASS_LINKER: &str =
        "_ZN3art11ClassLinker16UnregisterNativeEPNS_6ThreadEPNS_9ArtMethodE";

    /// ArtMethod::UnregisterNative(). Returns `const void*` on releases that
    /// have the returning RegisterNative and nothing on older ones; the
    /// mangled name is the same for both.
    pub const METHOD: &str = "_ZN3art9ArtMethod16UnregisterNativeEv";

    /// mirror::ArtMethod::UnregisterNative(Thread*)
    pub const MIRROR_WITH_THREAD: &str = "_ZN3art6mirror9ArtMethod16UnregisterNativeEPNS_6ThreadE";
}

pub mod fixup_static_trampolines {
    /// ClassLinker::FixupStaticTrampolines(Thread*, ObjPtr<mirror::Class>)
    pub const WITH_THREAD: &str =
        "_ZN3art11ClassLinker22FixupStaticTrampolinesEPNS_6ThreadENS_6ObjPtrINS_6mirror5ClassEEE";

    /// ClassLinker::FixupStaticTrampolines(ObjPtr<mirror::Class>)
    pub const OBJ_PTR: &str =
        "_ZN3art11ClassLinker22FixupStaticTrampolinesENS_6ObjPtrINS_6mirror5ClassEEE";

    /// ClassLinker::FixupStaticTrampolines(mirror::Class*)
    pub const RAW: &str = "_ZN3art11ClassLinker22FixupStaticTrampolinesEPNS_6mirror5ClassE";
}

pub mod visibly_initialized {
    /// VisiblyInitializedCallback::AdjustThreadVisibilityCounter(Thread*, int), 32-bit
    pub const ADJUST_THREAD_VISIBILITY_COUNTER_32: &str =
        "_ZN3art11ClassLinker26VisiblyInitializedCallback29AdjustThreadVisibilityCounterEPNS_6ThreadEi";

    /// VisiblyInitializedCallback::AdjustThreadVisibilityCounter(Thread*, long), 64-bit
    pub const ADJUST_THREAD_VISIBILITY_COUNTER_64: &str =
        "_ZN3art11ClassLinker26VisiblyInitializedCallback29AdjustThreadVisibilityCounterEPNS_6ThreadEl";

    /// VisiblyInitializedCallback::MarkVisiblyInitialized(Thread*)
    pub const MARK_VISIBLY_INITIALIZED: &str =
        "_ZN3art11ClassLinker26VisiblyInitializedCallback22MarkVisiblyInitializedEPNS_6ThreadE";

    /// Spelling of AdjustThreadVisibilityCounter for the compiled pointer width
    /// (the adjustment is `ssize_t`).
    pub const ADJUST_THREAD_VISIBILITY_COUNTER: &str = if cfg!(target_pointer_width = "64") {
        ADJUST_THREAD_VISIBILITY_COUNTER_64
    } else {
        ADJUST_THREAD_VISIBILITY_COUNTER_32
    };
}

pub mod interpreter {
    /// ClassLinker::SetEntryPointsToInterpreter(ArtMethod*) const
    pub const SET_ENTRY_POINTS_TO_INTERPRETER: &str =
        "_ZNK3art11ClassLinker27SetEntryPointsToInterpreterEPNS_9ArtMethodE";

    pub const QUICK_TO_INTERPRETER_BRIDGE: &str = "art_quick_to_interpreter_bridge";

    pub const QUICK_GENERIC_JNI_TRAMPOLINE: &str = "art_quick_generic_jni_trampoline";
}
