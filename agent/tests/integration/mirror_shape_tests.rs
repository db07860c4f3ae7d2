//! `mirror::ArtMethod` shapes: the method comes before the thread. Also the
//! `ObjPtr<Class>` fix-up, which passes the class by value.

use std::ffi::c_void;

use artsync::symbols::{fixup_static_trampolines, register_native, unregister_native, visibly_initialized};
use artsync::types::{AccessFlags, EntryPoint};

use crate::common::*;

type RegisterNativeFn = unsafe extern "C" fn(*mut c_void, *mut c_void, *const c_void, bool);
type UnregisterNativeFn = unsafe extern "C" fn(*mut c_void, *mut c_void);
type FixupObjPtrFn = unsafe extern "C" fn(*mut c_void, *mut c_void);

unsafe extern "C" fn original_register_native(method: *mut c_void, thread: *mut c_void, native_method: *const c_void, is_fast: bool) {
    let engine = engine();
    engine
        .registered
        .lock()
        .unwrap()
        .push((method as usize, native_method as usize));
    engine.thread_args.lock().unwrap().push((method as usize, thread as usize));
    engine.fast_flags.lock().unwrap().push((method as usize, is_fast));
}

unsafe extern "C" fn original_unregister_native(method: *mut c_void, thread: *mut c_void) {
    engine().unregistered.lock().unwrap().push(method as usize);
    engine().thread_args.lock().unwrap().push((method as usize, thread as usize));
}

/// `ObjPtr<mirror::Class>` is a single pointer passed by value.
unsafe extern "C" fn original_fixup_static_trampolines(_class_linker: *mut c_void, class: *mut c_void) {
    engine_fixup(class as usize);
}

fn host() -> TestHost {
    TestHost::new()
        .with(
            register_native::MIRROR_WITH_THREAD,
            0x7200_1000,
            original_register_native as *const () as usize,
        )
        .with(
            unregister_native::MIRROR_WITH_THREAD,
            0x7200_2000,
            original_unregister_native as *const () as usize,
        )
        .with(
            fixup_static_trampolines::OBJ_PTR,
            0x7200_3000,
            original_fixup_static_trampolines as *const () as usize,
        )
}

fn setup() -> &'static Fixture {
    fixture_with(host)
}

#[test]
fn test_mirror_shapes_are_the_ones_hooked() {
    let fixture = setup();
    // The visibility callbacks are optional and not exported here.
    assert_eq!(fixture.host.hook_count(), 3);
    assert!(!fixture.host.is_hooked(visibly_initialized::MARK_VISIBLY_INITIALIZED));
    assert!(artsync::synchronizer().is_some());
}

#[test]
fn test_register_native_keeps_thread_and_flag() {
    let fixture = setup();
    let (target, backup) = hooked_method(fixture, 0x8100, AccessFlags::NATIVE);
    let native = 0x5eed_2001usize;

    let register: RegisterNativeFn = unsafe { replacement_fn(fixture, register_native::MIRROR_WITH_THREAD) };
    unsafe { register(target.as_ptr(), thread(0x7a01).as_ptr(), native as *const c_void, true) };

    let engine = engine();
    assert!(engine.registered.lock().unwrap().contains(&(backup.address(), native)));
    assert!(engine.thread_args.lock().unwrap().contains(&(backup.address(), 0x7a01)));
    assert!(engine.fast_flags.lock().unwrap().contains(&(backup.address(), true)));
    assert!(!engine.registered.lock().unwrap().iter().any(|(m, _)| *m == target.address()));
}

#[test]
fn test_unregister_native_keeps_thread() {
    let fixture = setup();
    let (target, backup) = hooked_method(fixture, 0x8200, AccessFlags::NATIVE);

    let unregister: UnregisterNativeFn = unsafe { replacement_fn(fixture, unregister_native::MIRROR_WITH_THREAD) };
    unsafe { unregister(target.as_ptr(), thread(0x7a02).as_ptr()) };

    let engine = engine();
    assert!(engine.unregistered.lock().unwrap().contains(&backup.address()));
    assert!(engine.thread_args.lock().unwrap().contains(&(backup.address(), 0x7a02)));
}

#[test]
fn test_obj_ptr_fixup_restores_class() {
    let _serial = serial();
    let fixture = setup();
    let (class, class_def) = fixture.runtime.add_class(0xb300, 0xe300);
    let (target, backup) = hooked_method(fixture, 0x1300, AccessFlags::STATIC);
    fixture.table.push_pending(class_def, target, EntryPoint::new(0x1300));
    engine_will_write(class.address(), target, 0x2300);

    let fixup: FixupObjPtrFn = unsafe { replacement_fn(fixture, fixup_static_trampolines::OBJ_PTR) };
    unsafe { fixup(ptr(0xc1), class.as_ptr()) };

    assert!(engine().fixed_up.lock().unwrap().contains(&class.address()));
    assert_eq!(entry(fixture, target), 0x1300);
    assert_eq!(entry(fixture, backup), 0x2300);
    assert_eq!(fixture.table.pending_count(class_def), 0);
}
