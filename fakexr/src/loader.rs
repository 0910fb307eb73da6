//! C entry points over [`Runtime`], for driving the `openxr` crate itself in tests.
//!
//! Pass [`get_instance_proc_addr`] to `openxr::Entry::from_get_instance_proc_addr` after
//! [`install`]ing the runtime the calls should land on. There is one instance and one session
//! per thread, the handles of everything else come from the runtime.

use crate::{Runtime, UserPath, HAND_JOINT_COUNT};
use openxr_sys as xr;
use paste::paste;
use std::cell::RefCell;
use std::ffi::{c_char, c_void, CStr};
use std::rc::Rc;

fn instance_handle() -> xr::Instance {
    xr::Instance::from_raw(1)
}

fn session_handle() -> xr::Session {
    xr::Session::from_raw(1)
}

fn system_id() -> xr::SystemId {
    xr::SystemId::from_raw(1)
}

const EXTENSIONS: [&[u8]; 3] = [
    xr::EXT_HAND_TRACKING_EXTENSION_NAME,
    xr::FB_HAND_TRACKING_AIM_EXTENSION_NAME,
    xr::MND_HEADLESS_EXTENSION_NAME,
];

thread_local! {
    static RUNTIME: RefCell<Option<Rc<Runtime>>> = const { RefCell::new(None) };
}

/// Routes this thread's OpenXR calls to `runtime`.
pub fn install(runtime: Rc<Runtime>) {
    RUNTIME.with_borrow_mut(|current| *current = Some(runtime));
}

fn with_runtime(f: impl FnOnce(&Runtime) -> Result<(), xr::Result>) -> xr::Result {
    let Some(runtime) = RUNTIME.with_borrow(Option::clone) else {
        println!("no fake runtime installed on this thread");
        return xr::Result::ERROR_RUNTIME_FAILURE;
    };
    match f(&runtime) {
        Ok(()) => xr::Result::SUCCESS,
        Err(e) => e,
    }
}

fn check_instance(instance: xr::Instance) -> Result<(), xr::Result> {
    (instance == instance_handle())
        .then_some(())
        .ok_or(xr::Result::ERROR_HANDLE_INVALID)
}

fn check_session(session: xr::Session) -> Result<(), xr::Result> {
    (session == session_handle())
        .then_some(())
        .ok_or(xr::Result::ERROR_HANDLE_INVALID)
}

fn input<'a, T>(ptr: *const T) -> Result<&'a T, xr::Result> {
    unsafe { ptr.as_ref() }.ok_or(xr::Result::ERROR_VALIDATION_FAILURE)
}

fn output<'a, T>(ptr: *mut T) -> Result<&'a mut T, xr::Result> {
    unsafe { ptr.as_mut() }.ok_or(xr::Result::ERROR_VALIDATION_FAILURE)
}

fn slice<'a, T>(ptr: *const T, len: u32) -> Result<&'a [T], xr::Result> {
    match (ptr.is_null(), len) {
        (_, 0) => Ok(&[]),
        (true, _) => Err(xr::Result::ERROR_VALIDATION_FAILURE),
        (false, len) => Ok(unsafe { std::slice::from_raw_parts(ptr, len as usize) }),
    }
}

fn read_name(name: &[c_char]) -> Result<String, xr::Result> {
    let bytes = unsafe { std::slice::from_raw_parts(name.as_ptr().cast::<u8>(), name.len()) };
    CStr::from_bytes_until_nul(bytes)
        .ok()
        .and_then(|s| s.to_str().ok())
        .map(str::to_owned)
        .ok_or(xr::Result::ERROR_NAME_INVALID)
}

fn write_name(dst: &mut [c_char], name: &[u8]) {
    let name = name.strip_suffix(&[0]).unwrap_or(name);
    let len = name.len().min(dst.len() - 1);
    for (dst, src) in dst.iter_mut().zip(&name[..len]) {
        *dst = *src as c_char;
    }
    dst[len] = 0;
}

/// Finds a structure of type `ty` in an output `next` chain.
fn find_in_chain<T>(mut next: *mut c_void, ty: xr::StructureType) -> Option<*mut T> {
    while !next.is_null() {
        let base = next.cast::<xr::BaseOutStructure>();
        let (found, following) = unsafe { ((*base).ty, (*base).next) };
        if found == ty {
            return Some(next.cast());
        }
        next = following.cast();
    }
    None
}

macro_rules! fn_unimplemented_impl {
    ($($param:ident),+) => {
        fn_unimplemented_impl!($($param),+  -> []);
    };
    ($param:ident $(,$rest:ident)* -> [$($params:ident),*]) => {
        paste! {
            #[allow(dead_code)]
            trait [<FnUnimplemented $param>]<$($params,)* $param> {
                extern "system" fn unimplemented($(_: $params,)* _: $param) -> xr::Result {
                    unimplemented!()
                }
            }

            impl<$($params,)* $param> [<FnUnimplemented $param>]<$($params,)* $param> for unsafe extern "system" fn($($params,)* $param) -> xr::Result {}
        }

        fn_unimplemented_impl!($($rest),* -> [$($params,)* $param]);
    };
    (-> [$($params:ident),+]) => {}
}

fn_unimplemented_impl!(A, B, C, D, E, F);

pub extern "system" fn get_instance_proc_addr(
    instance: xr::Instance,
    name: *const c_char,
    function: *mut Option<xr::pfn::VoidFunction>,
) -> xr::Result {
    let name = unsafe { CStr::from_ptr(name) };

    /// Match arms for the functions we hand out. Names in parentheses get a stub that panics
    /// when called, so the `openxr` crate can still load them.
    macro_rules! get_fn {
        ([$($func:tt),+] $pat:pat => $expr:expr) => {
            get_fn!(@arm [$($func),+] -> [] {$pat => $expr})
        };
        (@arm [$name:ident $(,$rest:tt)*] -> [$($arms:tt),*] {$pat:pat => $expr:expr}) => {
            get_fn!(
                @arm
                [$($rest),*] ->
                [
                    $($arms,)*
                    [
                        x if x == const {
                            CStr::from_bytes_with_nul_unchecked(concat!("xr", stringify!($name), "\0").as_bytes())
                        } => Some(std::mem::transmute( paste! { [<$name:snake>] as xr::pfn::$name }))
                    ]
                ]
                {$pat => $expr}
            )
        };
        (@arm [($name:ident) $(,$rest:tt)*] -> [$($arms:tt),*] {$pat:pat => $expr:expr}) => {
            get_fn!(
                @arm
                [$($rest),*] ->
                [
                    $($arms,)*
                    [
                        x if x == const {
                            CStr::from_bytes_with_nul_unchecked(concat!("xr", stringify!($name), "\0").as_bytes())
                        } => Some(std::mem::transmute(xr::pfn::$name::unimplemented as xr::pfn::$name))
                    ]
                ]
                {$pat => $expr}
            )
        };
        (@arm []-> [$([$($arms:tt)*]),+] {$pat:pat => $expr:expr}) => {
            match name {
                $($($arms)*,)+
                $pat => $expr
            }
        }
    }

    if instance == xr::Instance::NULL {
        unsafe {
            *function = get_fn!([CreateInstance, EnumerateInstanceExtensionProperties, (EnumerateApiLayerProperties)]
                other => {
                    println!("unknown func without instance: {other:?}");
                    return xr::Result::ERROR_HANDLE_INVALID;
                }
            );
        }
    } else {
        unsafe {
            *function = get_fn![[
                GetInstanceProcAddr,
                CreateInstance,
                DestroyInstance,
                EnumerateInstanceExtensionProperties,
                (EnumerateApiLayerProperties),
                GetSystem,
                GetSystemProperties,
                CreateSession,
                DestroySession,
                (BeginSession),
                (EndSession),
                (RequestExitSession),
                (PollEvent),
                (ResultToString),
                (StructureTypeToString),
                (GetInstanceProperties),
                (EnumerateEnvironmentBlendModes),
                (EnumerateReferenceSpaces),
                CreateReferenceSpace,
                (GetReferenceSpaceBoundsRect),
                CreateActionSpace,
                LocateSpace,
                DestroySpace,
                (EnumerateViewConfigurations),
                (GetViewConfigurationProperties),
                (EnumerateViewConfigurationViews),
                (EnumerateSwapchainFormats),
                (CreateSwapchain),
                (DestroySwapchain),
                (EnumerateSwapchainImages),
                (AcquireSwapchainImage),
                (WaitSwapchainImage),
                (ReleaseSwapchainImage),
                (WaitFrame),
                (BeginFrame),
                (EndFrame),
                (LocateViews),
                StringToPath,
                PathToString,
                CreateActionSet,
                DestroyActionSet,
                CreateAction,
                DestroyAction,
                SuggestInteractionProfileBindings,
                AttachSessionActionSets,
                GetCurrentInteractionProfile,
                GetActionStateBoolean,
                GetActionStateFloat,
                GetActionStateVector2f,
                GetActionStatePose,
                SyncActions,
                (EnumerateBoundSourcesForAction),
                (GetInputSourceLocalizedName),
                ApplyHapticFeedback,
                (StopHapticFeedback),
                CreateHandTrackerEXT,
                DestroyHandTrackerEXT,
                LocateHandJointsEXT
                ]

                other => {
                    println!("unknown func: {other:?}");
                    return xr::Result::ERROR_FUNCTION_UNSUPPORTED;
                }
            ]
        }
    }

    xr::Result::SUCCESS
}

extern "system" fn enumerate_instance_extension_properties(
    layer_name: *const c_char,
    property_capacity_input: u32,
    property_count_output: *mut u32,
    properties: *mut xr::ExtensionProperties,
) -> xr::Result {
    if !layer_name.is_null() {
        return xr::Result::ERROR_API_LAYER_NOT_PRESENT;
    }
    unsafe { *property_count_output = EXTENSIONS.len() as u32 };
    if property_capacity_input == 0 {
        return xr::Result::SUCCESS;
    }
    if (property_capacity_input as usize) < EXTENSIONS.len() {
        return xr::Result::ERROR_SIZE_INSUFFICIENT;
    }

    let props =
        unsafe { std::slice::from_raw_parts_mut(properties, property_capacity_input as usize) };
    for (prop, name) in props.iter_mut().zip(EXTENSIONS) {
        prop.extension_version = 1;
        write_name(&mut prop.extension_name, name);
    }
    xr::Result::SUCCESS
}

extern "system" fn create_instance(
    info: *const xr::InstanceCreateInfo,
    instance: *mut xr::Instance,
) -> xr::Result {
    with_runtime(|_| {
        input(info)?;
        *output(instance)? = instance_handle();
        Ok(())
    })
}

extern "system" fn destroy_instance(instance: xr::Instance) -> xr::Result {
    with_runtime(|_| check_instance(instance))
}

extern "system" fn get_system(
    instance: xr::Instance,
    info: *const xr::SystemGetInfo,
    system_id: *mut xr::SystemId,
) -> xr::Result {
    with_runtime(|_| {
        check_instance(instance)?;
        if input(info)?.form_factor != xr::FormFactor::HEAD_MOUNTED_DISPLAY {
            return Err(xr::Result::ERROR_FORM_FACTOR_UNSUPPORTED);
        }
        *output(system_id)? = system_id();
        Ok(())
    })
}

extern "system" fn get_system_properties(
    instance: xr::Instance,
    system_id: xr::SystemId,
    properties: *mut xr::SystemProperties,
) -> xr::Result {
    with_runtime(|runtime| {
        check_instance(instance)?;
        if system_id != self::system_id() {
            return Err(xr::Result::ERROR_SYSTEM_INVALID);
        }
        let properties = output(properties)?;
        properties.system_id = system_id;
        properties.vendor_id = 0;
        write_name(&mut properties.system_name, runtime.system_name().as_bytes());
        properties.tracking_properties = xr::SystemTrackingProperties {
            orientation_tracking: true.into(),
            position_tracking: true.into(),
        };

        if let Some(hand) = find_in_chain::<xr::SystemHandTrackingPropertiesEXT>(
            properties.next,
            xr::SystemHandTrackingPropertiesEXT::TYPE,
        ) {
            let (joints, _) = runtime.hand_tracking_support();
            unsafe { (*hand).supports_hand_tracking = joints.into() };
        }
        Ok(())
    })
}

extern "system" fn create_session(
    instance: xr::Instance,
    info: *const xr::SessionCreateInfo,
    session: *mut xr::Session,
) -> xr::Result {
    with_runtime(|_| {
        check_instance(instance)?;
        if input(info)?.system_id != system_id() {
            return Err(xr::Result::ERROR_SYSTEM_INVALID);
        }
        *output(session)? = session_handle();
        Ok(())
    })
}

extern "system" fn destroy_session(session: xr::Session) -> xr::Result {
    with_runtime(|_| check_session(session))
}

extern "system" fn string_to_path(
    instance: xr::Instance,
    string: *const c_char,
    path: *mut xr::Path,
) -> xr::Result {
    with_runtime(|runtime| {
        check_instance(instance)?;
        if string.is_null() {
            return Err(xr::Result::ERROR_VALIDATION_FAILURE);
        }
        let string = unsafe { CStr::from_ptr(string) }
            .to_str()
            .map_err(|_| xr::Result::ERROR_PATH_FORMAT_INVALID)?;
        *output(path)? = runtime.string_to_path(string)?;
        Ok(())
    })
}

extern "system" fn path_to_string(
    instance: xr::Instance,
    path: xr::Path,
    capacity: u32,
    count: *mut u32,
    buffer: *mut c_char,
) -> xr::Result {
    with_runtime(|runtime| {
        check_instance(instance)?;
        let value = runtime.path_to_string(path)?;
        let len = value.len() + 1;
        *output(count)? = len as u32;
        if capacity == 0 {
            return Ok(());
        }
        if (capacity as usize) < len || buffer.is_null() {
            return Err(xr::Result::ERROR_SIZE_INSUFFICIENT);
        }
        let out = unsafe { std::slice::from_raw_parts_mut(buffer, capacity as usize) };
        write_name(out, value.as_bytes());
        Ok(())
    })
}

extern "system" fn create_action_set(
    instance: xr::Instance,
    info: *const xr::ActionSetCreateInfo,
    set: *mut xr::ActionSet,
) -> xr::Result {
    with_runtime(|runtime| {
        check_instance(instance)?;
        let info = input(info)?;
        let name = read_name(&info.action_set_name)?;
        let localized = read_name(&info.localized_action_set_name)?;
        *output(set)? = runtime.create_action_set(&name, &localized, info.priority)?;
        Ok(())
    })
}

extern "system" fn destroy_action_set(set: xr::ActionSet) -> xr::Result {
    with_runtime(|runtime| runtime.release_action_set(set))
}

extern "system" fn create_action(
    set: xr::ActionSet,
    info: *const xr::ActionCreateInfo,
    action: *mut xr::Action,
) -> xr::Result {
    with_runtime(|runtime| {
        let info = input(info)?;
        let name = read_name(&info.action_name)?;
        let subaction_paths = slice(info.subaction_paths, info.count_subaction_paths)?;
        *output(action)? =
            runtime.create_action(set, info.action_type, &name, subaction_paths)?;
        Ok(())
    })
}

extern "system" fn destroy_action(action: xr::Action) -> xr::Result {
    with_runtime(|runtime| runtime.release_action(action))
}

extern "system" fn suggest_interaction_profile_bindings(
    instance: xr::Instance,
    suggested: *const xr::InteractionProfileSuggestedBinding,
) -> xr::Result {
    with_runtime(|runtime| {
        check_instance(instance)?;
        let suggested = input(suggested)?;
        let bindings: Vec<_> = slice(
            suggested.suggested_bindings,
            suggested.count_suggested_bindings,
        )?
        .iter()
        .map(|b| (b.action, b.binding))
        .collect();
        runtime.suggest_bindings(suggested.interaction_profile, &bindings)
    })
}

extern "system" fn attach_session_action_sets(
    session: xr::Session,
    info: *const xr::SessionActionSetsAttachInfo,
) -> xr::Result {
    with_runtime(|runtime| {
        check_session(session)?;
        let info = input(info)?;
        runtime.attach_action_sets(slice(info.action_sets, info.count_action_sets)?)
    })
}

extern "system" fn sync_actions(
    session: xr::Session,
    info: *const xr::ActionsSyncInfo,
) -> xr::Result {
    with_runtime(|runtime| {
        check_session(session)?;
        let info = input(info)?;
        for active in slice(info.active_action_sets, info.count_active_action_sets)? {
            runtime.sync_actions(active.action_set)?;
        }
        Ok(())
    })
}

extern "system" fn get_current_interaction_profile(
    session: xr::Session,
    top_level_user_path: xr::Path,
    state: *mut xr::InteractionProfileState,
) -> xr::Result {
    with_runtime(|runtime| {
        check_session(session)?;
        output(state)?.interaction_profile =
            runtime.current_interaction_profile(top_level_user_path)?;
        Ok(())
    })
}

macro_rules! get_action_state {
    ($name:ident, $state:ty, $query:ident, |$value:ident| $convert:expr) => {
        extern "system" fn $name(
            session: xr::Session,
            info: *const xr::ActionStateGetInfo,
            state: *mut $state,
        ) -> xr::Result {
            with_runtime(|runtime| {
                check_session(session)?;
                let info = input(info)?;
                let report = runtime.$query(info.action, info.subaction_path)?;
                let state = output(state)?;
                let $value = report.current_state;
                state.current_state = $convert;
                state.changed_since_last_sync = report.changed_since_last_sync.into();
                state.last_change_time = xr::Time::from_nanos(0);
                state.is_active = report.is_active.into();
                Ok(())
            })
        }
    };
}

get_action_state!(get_action_state_boolean, xr::ActionStateBoolean, bool_state, |v| v.into());
get_action_state!(get_action_state_float, xr::ActionStateFloat, float_state, |v| v);
get_action_state!(get_action_state_vector2f, xr::ActionStateVector2f, vector2_state, |v| v);

extern "system" fn get_action_state_pose(
    session: xr::Session,
    info: *const xr::ActionStateGetInfo,
    state: *mut xr::ActionStatePose,
) -> xr::Result {
    with_runtime(|runtime| {
        check_session(session)?;
        let info = input(info)?;
        output(state)?.is_active = runtime.pose_active(info.action, info.subaction_path)?.into();
        Ok(())
    })
}

extern "system" fn apply_haptic_feedback(
    session: xr::Session,
    info: *const xr::HapticActionInfo,
    feedback: *const xr::HapticBaseHeader,
) -> xr::Result {
    with_runtime(|runtime| {
        check_session(session)?;
        let info = input(info)?;
        if input(feedback)?.ty != xr::HapticVibration::TYPE {
            return Err(xr::Result::ERROR_VALIDATION_FAILURE);
        }
        let vibration = input(feedback.cast::<xr::HapticVibration>())?;
        runtime.apply_haptic(
            info.action,
            info.subaction_path,
            vibration.amplitude,
            vibration.duration.as_nanos(),
            vibration.frequency,
        )
    })
}

extern "system" fn create_action_space(
    session: xr::Session,
    info: *const xr::ActionSpaceCreateInfo,
    space: *mut xr::Space,
) -> xr::Result {
    with_runtime(|runtime| {
        check_session(session)?;
        let info = input(info)?;
        *output(space)? = runtime.create_action_space(info.action, info.subaction_path)?;
        Ok(())
    })
}

extern "system" fn create_reference_space(
    session: xr::Session,
    info: *const xr::ReferenceSpaceCreateInfo,
    space: *mut xr::Space,
) -> xr::Result {
    with_runtime(|runtime| {
        check_session(session)?;
        input(info)?;
        *output(space)? = runtime.create_reference_space()?;
        Ok(())
    })
}

extern "system" fn destroy_space(space: xr::Space) -> xr::Result {
    with_runtime(|runtime| runtime.release_space(space))
}

extern "system" fn locate_space(
    space: xr::Space,
    base: xr::Space,
    time: xr::Time,
    location: *mut xr::SpaceLocation,
) -> xr::Result {
    with_runtime(|runtime| {
        let located = runtime.locate_space(space, base, time)?;
        let location = output(location)?;
        location.location_flags = located.location_flags;
        location.pose = located.pose;
        Ok(())
    })
}

extern "system" fn create_hand_tracker_ext(
    session: xr::Session,
    info: *const xr::HandTrackerCreateInfoEXT,
    tracker: *mut xr::HandTrackerEXT,
) -> xr::Result {
    with_runtime(|runtime| {
        check_session(session)?;
        let hand = match input(info)?.hand {
            xr::HandEXT::LEFT => UserPath::LeftHand,
            xr::HandEXT::RIGHT => UserPath::RightHand,
            _ => return Err(xr::Result::ERROR_VALIDATION_FAILURE),
        };
        *output(tracker)? = runtime.create_hand_tracker(hand)?;
        Ok(())
    })
}

extern "system" fn destroy_hand_tracker_ext(tracker: xr::HandTrackerEXT) -> xr::Result {
    with_runtime(|runtime| runtime.release_hand_tracker(tracker))
}

extern "system" fn locate_hand_joints_ext(
    tracker: xr::HandTrackerEXT,
    info: *const xr::HandJointsLocateInfoEXT,
    locations: *mut xr::HandJointLocationsEXT,
) -> xr::Result {
    with_runtime(|runtime| {
        let info = input(info)?;
        let locations = output(locations)?;
        if locations.joint_count as usize != HAND_JOINT_COUNT || locations.joint_locations.is_null()
        {
            return Err(xr::Result::ERROR_VALIDATION_FAILURE);
        }
        let aim_out = find_in_chain::<xr::HandTrackingAimStateFB>(
            locations.next,
            xr::HandTrackingAimStateFB::TYPE,
        );

        let located =
            runtime.locate_hand_joints(tracker, info.base_space, info.time, aim_out.is_some())?;
        let Some((joints, aim)) = located else {
            locations.is_active = false.into();
            return Ok(());
        };

        locations.is_active = true.into();
        let out =
            unsafe { std::slice::from_raw_parts_mut(locations.joint_locations, HAND_JOINT_COUNT) };
        out.copy_from_slice(&joints);

        if let Some(aim_out) = aim_out {
            let aim_out = unsafe { &mut *aim_out };
            match aim {
                Some(aim) => {
                    aim_out.status = aim.status;
                    aim_out.aim_pose = aim.aim_pose;
                    aim_out.pinch_strength_index = aim.pinch_strength_index;
                }
                None => aim_out.status = xr::HandTrackingAimFlagsFB::EMPTY,
            }
        }
        Ok(())
    })
}
