//! [`Runtime`] backed by a live OpenXR session.
//!
//! The typed `openxr` objects are owned here and looked up by their raw handle, which is what
//! the input core passes around.

use crate::runtime::{
    ActionHandle, ActionSetHandle, AimState, Hand, HandJointsSample, HandTrackerHandle,
    HandTrackingRequest, HandTrackingSupport, Runtime, SpaceHandle, SuggestedBinding, Vibration,
};
use log::{debug, info, warn};
use openxr as xr;
use std::cell::RefCell;
use std::collections::HashMap;

enum AnyAction {
    Bool(xr::Action<bool>),
    Float(xr::Action<f32>),
    Vector2(xr::Action<xr::Vector2f>),
    Pose(xr::Action<xr::Posef>),
    Haptic(xr::Action<xr::Haptic>),
}

impl AnyAction {
    fn binding(&self, path: xr::Path) -> xr::Binding<'_> {
        match self {
            AnyAction::Bool(a) => xr::Binding::new(a, path),
            AnyAction::Float(a) => xr::Binding::new(a, path),
            AnyAction::Vector2(a) => xr::Binding::new(a, path),
            AnyAction::Pose(a) => xr::Binding::new(a, path),
            AnyAction::Haptic(a) => xr::Binding::new(a, path),
        }
    }
}

struct ActionEntry {
    set: u64,
    action: AnyAction,
}

#[derive(Default)]
struct Objects {
    sets: HashMap<u64, xr::ActionSet>,
    actions: HashMap<u64, ActionEntry>,
    spaces: HashMap<u64, xr::Space>,
    hand_trackers: HashMap<u64, xr::HandTracker>,
}

pub struct OpenXrData<G: xr::Graphics> {
    instance: xr::Instance,
    session: xr::Session<G>,
    system_name: String,
    hand_tracking: HandTrackingSupport,
    objects: RefCell<Objects>,
}

fn cvt(result: xr::sys::Result) -> xr::Result<()> {
    if result.into_raw() >= 0 {
        Ok(())
    } else {
        Err(result)
    }
}

impl<G: xr::Graphics> OpenXrData<G> {
    /// `instance` should have XR_EXT_hand_tracking (and optionally XR_FB_hand_tracking_aim)
    /// enabled for hand tracking to be used.
    pub fn new(
        instance: xr::Instance,
        system: xr::SystemId,
        session: xr::Session<G>,
    ) -> xr::Result<Self> {
        let system_name = instance.system_properties(system)?.system_name;

        let joints = instance.exts().ext_hand_tracking.is_some()
            && instance.supports_hand_tracking(system)?;
        let hand_tracking = match (joints, instance.exts().fb_hand_tracking_aim.is_some()) {
            (false, _) => HandTrackingSupport::None,
            (true, false) => HandTrackingSupport::Joints,
            (true, true) => HandTrackingSupport::JointsWithAim,
        };
        info!("OpenXR system {system_name:?}, hand tracking: {hand_tracking:?}");

        Ok(Self {
            instance,
            session,
            system_name,
            hand_tracking,
            objects: RefCell::default(),
        })
    }

    #[inline]
    pub fn instance(&self) -> &xr::Instance {
        &self.instance
    }

    #[inline]
    pub fn session(&self) -> &xr::Session<G> {
        &self.session
    }
}

impl<G: xr::Graphics> Drop for OpenXrData<G> {
    fn drop(&mut self) {
        // Children before parents.
        let objects = self.objects.get_mut();
        objects.hand_trackers.clear();
        objects.spaces.clear();
        objects.actions.clear();
        objects.sets.clear();
    }
}

impl<G: xr::Graphics> Runtime for OpenXrData<G> {
    fn system_name(&self) -> &str {
        &self.system_name
    }

    fn string_to_path(&self, path: &str) -> xr::Result<xr::Path> {
        self.instance.string_to_path(path)
    }

    fn path_to_string(&self, path: xr::Path) -> xr::Result<String> {
        self.instance.path_to_string(path)
    }

    fn create_action_set(
        &self,
        name: &str,
        localized_name: &str,
        priority: u32,
    ) -> xr::Result<ActionSetHandle> {
        let set = self
            .instance
            .create_action_set(name, localized_name, priority)?;
        let handle = set.as_raw();
        self.objects
            .borrow_mut()
            .sets
            .insert(handle.into_raw(), set);
        Ok(handle)
    }

    fn destroy_action_set(&self, set: ActionSetHandle) {
        let mut objects = self.objects.borrow_mut();
        let raw = set.into_raw();
        objects.actions.retain(|_, entry| entry.set != raw);
        if objects.sets.remove(&raw).is_none() {
            warn!("tried to destroy unknown action set {raw:#x}");
        }
    }

    fn create_action(
        &self,
        set: ActionSetHandle,
        ty: xr::sys::ActionType,
        name: &str,
        subaction_paths: &[xr::Path],
    ) -> xr::Result<ActionHandle> {
        let mut objects = self.objects.borrow_mut();
        let raw_set = set.into_raw();
        let set = objects
            .sets
            .get(&raw_set)
            .ok_or(xr::sys::Result::ERROR_HANDLE_INVALID)?;

        let action = match ty {
            xr::sys::ActionType::BOOLEAN_INPUT => {
                AnyAction::Bool(set.create_action(name, name, subaction_paths)?)
            }
            xr::sys::ActionType::FLOAT_INPUT => {
                AnyAction::Float(set.create_action(name, name, subaction_paths)?)
            }
            xr::sys::ActionType::VECTOR2F_INPUT => {
                AnyAction::Vector2(set.create_action(name, name, subaction_paths)?)
            }
            xr::sys::ActionType::POSE_INPUT => {
                AnyAction::Pose(set.create_action(name, name, subaction_paths)?)
            }
            xr::sys::ActionType::VIBRATION_OUTPUT => {
                AnyAction::Haptic(set.create_action(name, name, subaction_paths)?)
            }
            _ => return Err(xr::sys::Result::ERROR_VALIDATION_FAILURE),
        };

        let handle = match &action {
            AnyAction::Bool(a) => a.as_raw(),
            AnyAction::Float(a) => a.as_raw(),
            AnyAction::Vector2(a) => a.as_raw(),
            AnyAction::Pose(a) => a.as_raw(),
            AnyAction::Haptic(a) => a.as_raw(),
        };
        objects.actions.insert(
            handle.into_raw(),
            ActionEntry {
                set: raw_set,
                action,
            },
        );
        Ok(handle)
    }

    fn suggest_bindings(
        &self,
        interaction_profile: xr::Path,
        bindings: &[SuggestedBinding],
    ) -> xr::Result<()> {
        let objects = self.objects.borrow();
        let bindings = bindings
            .iter()
            .map(|b| {
                objects
                    .actions
                    .get(&b.action.into_raw())
                    .map(|entry| entry.action.binding(b.binding))
                    .ok_or(xr::sys::Result::ERROR_HANDLE_INVALID)
            })
            .collect::<xr::Result<Vec<_>>>()?;
        self.instance
            .suggest_interaction_profile_bindings(interaction_profile, &bindings)
    }

    fn attach_action_sets(&self, sets: &[ActionSetHandle]) -> xr::Result<()> {
        let objects = self.objects.borrow();
        let sets = sets
            .iter()
            .map(|s| {
                objects
                    .sets
                    .get(&s.into_raw())
                    .ok_or(xr::sys::Result::ERROR_HANDLE_INVALID)
            })
            .collect::<xr::Result<Vec<_>>>()?;
        self.session.attach_action_sets(&sets)
    }

    fn sync_actions(&self, set: ActionSetHandle) -> xr::Result<()> {
        let objects = self.objects.borrow();
        let set = objects
            .sets
            .get(&set.into_raw())
            .ok_or(xr::sys::Result::ERROR_HANDLE_INVALID)?;
        self.session.sync_actions(&[xr::ActiveActionSet::new(set)])
    }

    fn current_interaction_profile(&self, user_path: xr::Path) -> xr::Result<xr::Path> {
        self.session.current_interaction_profile(user_path)
    }

    fn bool_state(
        &self,
        action: ActionHandle,
        subaction_path: xr::Path,
    ) -> xr::Result<xr::ActionState<bool>> {
        match self.objects.borrow().actions.get(&action.into_raw()) {
            Some(ActionEntry {
                action: AnyAction::Bool(a),
                ..
            }) => a.state(&self.session, subaction_path),
            Some(_) => Err(xr::sys::Result::ERROR_ACTION_TYPE_MISMATCH),
            None => Err(xr::sys::Result::ERROR_HANDLE_INVALID),
        }
    }

    fn float_state(
        &self,
        action: ActionHandle,
        subaction_path: xr::Path,
    ) -> xr::Result<xr::ActionState<f32>> {
        match self.objects.borrow().actions.get(&action.into_raw()) {
            Some(ActionEntry {
                action: AnyAction::Float(a),
                ..
            }) => a.state(&self.session, subaction_path),
            Some(_) => Err(xr::sys::Result::ERROR_ACTION_TYPE_MISMATCH),
            None => Err(xr::sys::Result::ERROR_HANDLE_INVALID),
        }
    }

    fn vector2_state(
        &self,
        action: ActionHandle,
        subaction_path: xr::Path,
    ) -> xr::Result<xr::ActionState<xr::Vector2f>> {
        match self.objects.borrow().actions.get(&action.into_raw()) {
            Some(ActionEntry {
                action: AnyAction::Vector2(a),
                ..
            }) => a.state(&self.session, subaction_path),
            Some(_) => Err(xr::sys::Result::ERROR_ACTION_TYPE_MISMATCH),
            None => Err(xr::sys::Result::ERROR_HANDLE_INVALID),
        }
    }

    fn pose_active(&self, action: ActionHandle, subaction_path: xr::Path) -> xr::Result<bool> {
        match self.objects.borrow().actions.get(&action.into_raw()) {
            Some(ActionEntry {
                action: AnyAction::Pose(a),
                ..
            }) => a.is_active(&self.session, subaction_path),
            Some(_) => Err(xr::sys::Result::ERROR_ACTION_TYPE_MISMATCH),
            None => Err(xr::sys::Result::ERROR_HANDLE_INVALID),
        }
    }

    fn apply_haptic(
        &self,
        action: ActionHandle,
        subaction_path: xr::Path,
        vibration: Vibration,
    ) -> xr::Result<()> {
        match self.objects.borrow().actions.get(&action.into_raw()) {
            Some(ActionEntry {
                action: AnyAction::Haptic(a),
                ..
            }) => a.apply_feedback(
                &self.session,
                subaction_path,
                &xr::HapticVibration::new()
                    .amplitude(vibration.amplitude)
                    .frequency(vibration.frequency)
                    .duration(vibration.duration),
            ),
            Some(_) => Err(xr::sys::Result::ERROR_ACTION_TYPE_MISMATCH),
            None => Err(xr::sys::Result::ERROR_HANDLE_INVALID),
        }
    }

    fn create_action_space(
        &self,
        action: ActionHandle,
        subaction_path: xr::Path,
    ) -> xr::Result<SpaceHandle> {
        let mut objects = self.objects.borrow_mut();
        let space = match objects.actions.get(&action.into_raw()) {
            Some(ActionEntry {
                action: AnyAction::Pose(a),
                ..
            }) => a.create_space(&self.session, subaction_path, xr::Posef::IDENTITY)?,
            Some(_) => return Err(xr::sys::Result::ERROR_ACTION_TYPE_MISMATCH),
            None => return Err(xr::sys::Result::ERROR_HANDLE_INVALID),
        };
        let handle = space.as_raw();
        objects.spaces.insert(handle.into_raw(), space);
        Ok(handle)
    }

    fn create_reference_space(&self, ty: xr::ReferenceSpaceType) -> xr::Result<SpaceHandle> {
        let space = self
            .session
            .create_reference_space(ty, xr::Posef::IDENTITY)?;
        let handle = space.as_raw();
        self.objects
            .borrow_mut()
            .spaces
            .insert(handle.into_raw(), space);
        Ok(handle)
    }

    fn destroy_space(&self, space: SpaceHandle) {
        if self
            .objects
            .borrow_mut()
            .spaces
            .remove(&space.into_raw())
            .is_none()
        {
            warn!("tried to destroy unknown space {:#x}", space.into_raw());
        }
    }

    fn locate_space(
        &self,
        space: SpaceHandle,
        base: SpaceHandle,
        time: xr::Time,
    ) -> xr::Result<xr::SpaceLocation> {
        let objects = self.objects.borrow();
        let (Some(space), Some(base)) = (
            objects.spaces.get(&space.into_raw()),
            objects.spaces.get(&base.into_raw()),
        ) else {
            return Err(xr::sys::Result::ERROR_HANDLE_INVALID);
        };
        space.locate(base, time)
    }

    fn hand_tracking_support(&self) -> HandTrackingSupport {
        self.hand_tracking
    }

    fn create_hand_tracker(&self, hand: Hand) -> xr::Result<HandTrackerHandle> {
        if self.hand_tracking == HandTrackingSupport::None {
            return Err(xr::sys::Result::ERROR_EXTENSION_NOT_PRESENT);
        }
        let tracker = self.session.create_hand_tracker(hand.into())?;
        let handle = tracker.as_raw();
        debug!("created hand tracker for {} hand", hand.name());
        self.objects
            .borrow_mut()
            .hand_trackers
            .insert(handle.into_raw(), tracker);
        Ok(handle)
    }

    fn destroy_hand_tracker(&self, tracker: HandTrackerHandle) {
        if self
            .objects
            .borrow_mut()
            .hand_trackers
            .remove(&tracker.into_raw())
            .is_none()
        {
            warn!("tried to destroy unknown hand tracker {:#x}", tracker.into_raw());
        }
    }

    fn locate_hand_joints(
        &self,
        tracker: HandTrackerHandle,
        base: SpaceHandle,
        time: xr::Time,
        request: &HandTrackingRequest,
    ) -> xr::Result<Option<HandJointsSample>> {
        let objects = self.objects.borrow();
        let (Some(tracker), Some(base)) = (
            objects.hand_trackers.get(&tracker.into_raw()),
            objects.spaces.get(&base.into_raw()),
        ) else {
            return Err(xr::sys::Result::ERROR_HANDLE_INVALID);
        };
        let ext = self
            .instance
            .exts()
            .ext_hand_tracking
            .as_ref()
            .ok_or(xr::sys::Result::ERROR_EXTENSION_NOT_PRESENT)?;

        let want_aim =
            request.aim_state && self.hand_tracking == HandTrackingSupport::JointsWithAim;
        let mut aim = xr::sys::HandTrackingAimStateFB {
            ty: xr::sys::HandTrackingAimStateFB::TYPE,
            next: std::ptr::null_mut(),
            status: xr::sys::HandTrackingAimFlagsFB::EMPTY,
            aim_pose: xr::Posef::IDENTITY,
            pinch_strength_index: 0.0,
            pinch_strength_middle: 0.0,
            pinch_strength_ring: 0.0,
            pinch_strength_little: 0.0,
        };
        let mut joints = [xr::HandJointLocation {
            location_flags: xr::SpaceLocationFlags::EMPTY,
            pose: xr::Posef::IDENTITY,
            radius: 0.0,
        }; xr::HAND_JOINT_COUNT];
        let mut locations = xr::sys::HandJointLocationsEXT {
            ty: xr::sys::HandJointLocationsEXT::TYPE,
            next: if want_aim {
                &mut aim as *mut _ as *mut std::ffi::c_void
            } else {
                std::ptr::null_mut()
            },
            is_active: false.into(),
            joint_count: xr::HAND_JOINT_COUNT as u32,
            joint_locations: joints.as_mut_ptr(),
        };
        let info = xr::sys::HandJointsLocateInfoEXT {
            ty: xr::sys::HandJointsLocateInfoEXT::TYPE,
            next: std::ptr::null(),
            base_space: base.as_raw(),
            time,
        };

        // SAFETY: every pointer in `info` and `locations` outlives the call, and `joints` has
        // room for `joint_count` entries.
        cvt(unsafe { (ext.locate_hand_joints)(tracker.as_raw(), &info, &mut locations) })?;
        if !bool::from(locations.is_active) {
            return Ok(None);
        }

        let aim = want_aim.then(|| AimState {
            valid: aim.status.contains(xr::sys::HandTrackingAimFlagsFB::VALID),
            system_gesture: aim
                .status
                .contains(xr::sys::HandTrackingAimFlagsFB::SYSTEM_GESTURE),
            index_pinching: aim
                .status
                .contains(xr::sys::HandTrackingAimFlagsFB::INDEX_PINCHING),
            aim_pose: aim.aim_pose,
            pinch_strength_index: aim.pinch_strength_index,
        });
        Ok(Some(HandJointsSample { joints, aim }))
    }
}
