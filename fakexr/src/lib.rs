//! An in-memory XR runtime for tests.
//!
//! Handles are slotmap keys, so stale handles are detected. Action states and interaction
//! profiles set by a test only become visible after the next `sync_actions`, like in a real
//! runtime.

pub mod loader;

use openxr_sys as xr;
use slotmap::{DefaultKey, Key, KeyData, SlotMap};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;

pub const HAND_JOINT_COUNT: usize = 26;
pub type HandJoints = [xr::HandJointLocationEXT; HAND_JOINT_COUNT];

fn tracked() -> xr::SpaceLocationFlags {
    xr::SpaceLocationFlags::POSITION_VALID
        | xr::SpaceLocationFlags::POSITION_TRACKED
        | xr::SpaceLocationFlags::ORIENTATION_VALID
        | xr::SpaceLocationFlags::ORIENTATION_TRACKED
}

const EYE_GAZE_POSE: &str = "/user/eyes_ext/input/gaze_ext/pose";

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ActionState {
    Bool(bool),
    Pose,
    Float(f32),
    Vector2(f32, f32),
    Haptic,
}

impl From<bool> for ActionState {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f32> for ActionState {
    fn from(value: f32) -> Self {
        Self::Float(value)
    }
}

impl ActionState {
    fn default_for(ty: xr::ActionType) -> Self {
        match ty {
            xr::ActionType::BOOLEAN_INPUT => Self::Bool(false),
            xr::ActionType::FLOAT_INPUT => Self::Float(0.0),
            xr::ActionType::VECTOR2F_INPUT => Self::Vector2(0.0, 0.0),
            xr::ActionType::POSE_INPUT => Self::Pose,
            _ => Self::Haptic,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum UserPath {
    /// /user/hand/left
    LeftHand,
    /// /user/hand/right
    RightHand,
}

impl UserPath {
    pub fn from_path(s: &str) -> Option<Self> {
        match s {
            "/user/hand/left" => Some(Self::LeftHand),
            "/user/hand/right" => Some(Self::RightHand),
            _ => None,
        }
    }

    pub fn to_path(self) -> &'static str {
        match self {
            Self::LeftHand => "/user/hand/left",
            Self::RightHand => "/user/hand/right",
        }
    }
}

/// Result of an action state query.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct StateReport<T> {
    pub current_state: T,
    pub changed_since_last_sync: bool,
    pub is_active: bool,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Location {
    pub location_flags: xr::SpaceLocationFlags,
    pub pose: xr::Posef,
}

impl Location {
    const UNTRACKED: Self = Self {
        location_flags: xr::SpaceLocationFlags::EMPTY,
        pose: xr::Posef::IDENTITY,
    };
}

/// What XR_FB_hand_tracking_aim reports for a hand.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct AimState {
    pub status: xr::HandTrackingAimFlagsFB,
    pub aim_pose: xr::Posef,
    pub pinch_strength_index: f32,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct HapticEvent {
    pub action: xr::Action,
    pub hand: Option<UserPath>,
    pub amplitude: f32,
    pub duration: i64,
    pub frequency: f32,
}

#[derive(Default)]
struct LeftRight<T> {
    left: T,
    right: T,
}

impl<T> LeftRight<T> {
    fn get(&self, hand: UserPath) -> &T {
        match hand {
            UserPath::LeftHand => &self.left,
            UserPath::RightHand => &self.right,
        }
    }

    fn get_mut(&mut self, hand: UserPath) -> &mut T {
        match hand {
            UserPath::LeftHand => &mut self.left,
            UserPath::RightHand => &mut self.right,
        }
    }
}

struct ActionSetData {
    name: String,
}

struct ActionData {
    set: DefaultKey,
    name: String,
    ty: xr::ActionType,
    subaction_paths: Vec<xr::Path>,
    suggested: HashMap<xr::Path, Vec<xr::Path>>,
    state: LeftRight<Option<ActionState>>,
    changed: LeftRight<bool>,
    pending_state: LeftRight<Option<ActionState>>,
    deactivated: bool,
}

enum SpaceData {
    Reference,
    Action {
        action: DefaultKey,
        subaction_path: xr::Path,
    },
}

struct HandData {
    /// `Some(NULL)` unbinds the profile at the next sync.
    pending_profile: Option<xr::Path>,
    profile: xr::Path,
    grip_pose: xr::Posef,
    aim_pose: xr::Posef,
    pose_flags: xr::SpaceLocationFlags,
    joints: Option<Box<HandJoints>>,
    aim_state: Option<AimState>,
}

impl Default for HandData {
    fn default() -> Self {
        Self {
            pending_profile: None,
            profile: xr::Path::NULL,
            grip_pose: xr::Posef::IDENTITY,
            aim_pose: xr::Posef::IDENTITY,
            pose_flags: tracked(),
            joints: None,
            aim_state: None,
        }
    }
}

#[derive(Default)]
struct State {
    paths: SlotMap<DefaultKey, String>,
    path_lookup: HashMap<String, DefaultKey>,
    action_sets: SlotMap<DefaultKey, ActionSetData>,
    actions: SlotMap<DefaultKey, ActionData>,
    spaces: SlotMap<DefaultKey, SpaceData>,
    hand_trackers: SlotMap<DefaultKey, UserPath>,
    attached_sets: Option<Vec<DefaultKey>>,
    hands: LeftRight<HandData>,
    gaze: Option<xr::Posef>,
    haptics: Vec<HapticEvent>,
    created_actions: usize,
    destroyed_action_sets: usize,
    created_spaces: usize,
    destroyed_spaces: usize,
    destroyed_hand_trackers: usize,
}

impl State {
    fn path_value(&self, path: xr::Path) -> Result<Option<&str>, xr::Result> {
        if path == xr::Path::NULL {
            return Ok(None);
        }
        self.paths
            .get(from_raw(path.into_raw()))
            .map(|s| Some(s.as_str()))
            .ok_or(xr::Result::ERROR_PATH_INVALID)
    }

    fn user_path(&self, path: xr::Path) -> Result<Option<UserPath>, xr::Result> {
        Ok(self.path_value(path)?.and_then(UserPath::from_path))
    }

    fn intern(&mut self, path: &str) -> xr::Path {
        let key = match self.path_lookup.get(path) {
            Some(key) => *key,
            None => {
                let key = self.paths.insert(path.to_owned());
                self.path_lookup.insert(path.to_owned(), key);
                key
            }
        };
        xr::Path::from_raw(key.data().as_ffi())
    }

    fn is_attached(&self, set: DefaultKey) -> bool {
        self.attached_sets
            .as_ref()
            .is_some_and(|sets| sets.contains(&set))
    }

    /// Looks up an attached action and checks that `subaction_path` was declared for it.
    fn queryable_action(
        &self,
        action: xr::Action,
        subaction_path: xr::Path,
    ) -> Result<&ActionData, xr::Result> {
        let data = self
            .actions
            .get(from_raw(action.into_raw()))
            .ok_or(xr::Result::ERROR_HANDLE_INVALID)?;
        if !self.is_attached(data.set) {
            return Err(xr::Result::ERROR_ACTIONSET_NOT_ATTACHED);
        }
        if subaction_path != xr::Path::NULL && !data.subaction_paths.contains(&subaction_path) {
            return Err(xr::Result::ERROR_PATH_UNSUPPORTED);
        }
        Ok(data)
    }

    /// Binding of `action` for `hand` under the hand's current interaction profile.
    fn bound_path(&self, action: &ActionData, hand: UserPath) -> Option<String> {
        let profile = self.hands.get(hand).profile;
        if profile == xr::Path::NULL {
            return None;
        }
        action.suggested.get(&profile)?.iter().find_map(|p| {
            let value = self.path_value(*p).ok()??;
            value.starts_with(hand.to_path()).then(|| value.to_owned())
        })
    }

    fn report<T>(
        &self,
        action: xr::Action,
        subaction_path: xr::Path,
        extract: impl FnOnce(ActionState) -> Option<T>,
    ) -> Result<StateReport<T>, xr::Result> {
        let data = self.queryable_action(action, subaction_path)?;
        let hand = self.user_path(subaction_path)?.unwrap_or(UserPath::LeftHand);
        let state = data
            .state
            .get(hand)
            .unwrap_or(ActionState::default_for(data.ty));
        let current_state = extract(state).ok_or(xr::Result::ERROR_ACTION_TYPE_MISMATCH)?;

        let is_active = !data.deactivated
            && match self.user_path(subaction_path)? {
                Some(hand) => self.bound_path(data, hand).is_some(),
                None => [UserPath::LeftHand, UserPath::RightHand]
                    .into_iter()
                    .any(|hand| self.bound_path(data, hand).is_some()),
            };

        Ok(StateReport {
            current_state,
            changed_since_last_sync: *data.changed.get(hand),
            is_active,
        })
    }
}

fn from_raw(raw: u64) -> DefaultKey {
    KeyData::from_ffi(raw).into()
}

fn to_raw(key: DefaultKey) -> u64 {
    key.data().as_ffi()
}

pub struct Runtime {
    system_name: String,
    hand_tracking: Cell<(bool, bool)>,
    fail_action_creation: Cell<bool>,
    fail_sync: Cell<bool>,
    state: RefCell<State>,
}

impl Runtime {
    pub fn new(system_name: &str) -> Self {
        Self {
            system_name: system_name.to_owned(),
            hand_tracking: Cell::new((false, false)),
            fail_action_creation: Cell::new(false),
            fail_sync: Cell::new(false),
            state: RefCell::default(),
        }
    }

    pub fn system_name(&self) -> &str {
        &self.system_name
    }

    // Runtime API

    pub fn string_to_path(&self, path: &str) -> Result<xr::Path, xr::Result> {
        if !path.starts_with('/') || path.ends_with('/') || path.contains("//") {
            return Err(xr::Result::ERROR_PATH_FORMAT_INVALID);
        }
        Ok(self.state.borrow_mut().intern(path))
    }

    pub fn path_to_string(&self, path: xr::Path) -> Result<String, xr::Result> {
        self.state
            .borrow()
            .path_value(path)?
            .map(str::to_owned)
            .ok_or(xr::Result::ERROR_PATH_INVALID)
    }

    pub fn create_action_set(
        &self,
        name: &str,
        _localized: &str,
        _priority: u32,
    ) -> Result<xr::ActionSet, xr::Result> {
        let mut state = self.state.borrow_mut();
        if state.action_sets.values().any(|s| s.name == name) {
            return Err(xr::Result::ERROR_NAME_DUPLICATED);
        }
        let key = state.action_sets.insert(ActionSetData {
            name: name.to_owned(),
        });
        Ok(xr::ActionSet::from_raw(to_raw(key)))
    }

    #[track_caller]
    pub fn destroy_action_set(&self, set: xr::ActionSet) {
        assert!(
            self.release_action_set(set).is_ok(),
            "action set destroyed twice or never created"
        );
    }

    /// Like [`Self::destroy_action_set`], reporting unknown handles instead of panicking.
    pub fn release_action_set(&self, set: xr::ActionSet) -> Result<(), xr::Result> {
        let mut state = self.state.borrow_mut();
        let key = from_raw(set.into_raw());
        state
            .action_sets
            .remove(key)
            .ok_or(xr::Result::ERROR_HANDLE_INVALID)?;
        state.actions.retain(|_, action| action.set != key);
        state.destroyed_action_sets += 1;
        Ok(())
    }

    /// Actions normally go away with their set, this drops one early.
    pub fn release_action(&self, action: xr::Action) -> Result<(), xr::Result> {
        self.state
            .borrow_mut()
            .actions
            .remove(from_raw(action.into_raw()))
            .map(|_| ())
            .ok_or(xr::Result::ERROR_HANDLE_INVALID)
    }

    pub fn create_action(
        &self,
        set: xr::ActionSet,
        ty: xr::ActionType,
        name: &str,
        subaction_paths: &[xr::Path],
    ) -> Result<xr::Action, xr::Result> {
        if self.fail_action_creation.get() {
            return Err(xr::Result::ERROR_RUNTIME_FAILURE);
        }
        let mut state = self.state.borrow_mut();
        let set = from_raw(set.into_raw());
        if !state.action_sets.contains_key(set) {
            return Err(xr::Result::ERROR_HANDLE_INVALID);
        }
        if state.is_attached(set) {
            return Err(xr::Result::ERROR_ACTIONSETS_ALREADY_ATTACHED);
        }
        if state
            .actions
            .values()
            .any(|a| a.set == set && a.name == name)
        {
            return Err(xr::Result::ERROR_NAME_DUPLICATED);
        }

        let key = state.actions.insert(ActionData {
            set,
            name: name.to_owned(),
            ty,
            subaction_paths: subaction_paths.to_vec(),
            suggested: HashMap::new(),
            state: Default::default(),
            changed: Default::default(),
            pending_state: Default::default(),
            deactivated: false,
        });
        state.created_actions += 1;
        Ok(xr::Action::from_raw(to_raw(key)))
    }

    /// Replaces any earlier suggestion for `profile`.
    pub fn suggest_bindings(
        &self,
        profile: xr::Path,
        bindings: &[(xr::Action, xr::Path)],
    ) -> Result<(), xr::Result> {
        let mut state = self.state.borrow_mut();
        if state.attached_sets.is_some() {
            return Err(xr::Result::ERROR_ACTIONSETS_ALREADY_ATTACHED);
        }
        if state.path_value(profile)?.is_none() {
            return Err(xr::Result::ERROR_PATH_UNSUPPORTED);
        }

        for (action, binding) in bindings {
            let data = state
                .actions
                .get(from_raw(action.into_raw()))
                .ok_or(xr::Result::ERROR_HANDLE_INVALID)?;
            let value = state
                .path_value(*binding)?
                .ok_or(xr::Result::ERROR_PATH_UNSUPPORTED)?;
            if !data.subaction_paths.is_empty()
                && !data.subaction_paths.iter().any(|p| {
                    state
                        .path_value(*p)
                        .ok()
                        .flatten()
                        .is_some_and(|user| value.starts_with(user))
                })
            {
                return Err(xr::Result::ERROR_PATH_UNSUPPORTED);
            }
        }

        for action in state.actions.values_mut() {
            action.suggested.remove(&profile);
        }
        for (action, binding) in bindings {
            if let Some(data) = state.actions.get_mut(from_raw(action.into_raw())) {
                data.suggested.entry(profile).or_default().push(*binding);
            }
        }
        Ok(())
    }

    pub fn attach_action_sets(&self, sets: &[xr::ActionSet]) -> Result<(), xr::Result> {
        let mut state = self.state.borrow_mut();
        if state.attached_sets.is_some() {
            return Err(xr::Result::ERROR_ACTIONSETS_ALREADY_ATTACHED);
        }
        let keys: Vec<DefaultKey> = sets.iter().map(|s| from_raw(s.into_raw())).collect();
        if keys.iter().any(|k| !state.action_sets.contains_key(*k)) {
            return Err(xr::Result::ERROR_HANDLE_INVALID);
        }
        state.attached_sets = Some(keys);
        Ok(())
    }

    pub fn sync_actions(&self, set: xr::ActionSet) -> Result<(), xr::Result> {
        if self.fail_sync.get() {
            return Err(xr::Result::ERROR_SESSION_LOST);
        }
        let mut state = self.state.borrow_mut();
        let set = from_raw(set.into_raw());
        if !state.is_attached(set) {
            return Err(xr::Result::ERROR_ACTIONSET_NOT_ATTACHED);
        }

        for hand in [UserPath::LeftHand, UserPath::RightHand] {
            let data = state.hands.get_mut(hand);
            if let Some(profile) = data.pending_profile.take() {
                data.profile = profile;
            }
        }

        for action in state.actions.values_mut().filter(|a| a.set == set) {
            for hand in [UserPath::LeftHand, UserPath::RightHand] {
                let pending = action.pending_state.get_mut(hand).take();
                let changed = match pending {
                    Some(new) if *action.state.get(hand) != Some(new) => {
                        *action.state.get_mut(hand) = Some(new);
                        true
                    }
                    _ => false,
                };
                *action.changed.get_mut(hand) = changed;
            }
        }
        Ok(())
    }

    pub fn current_interaction_profile(&self, user_path: xr::Path) -> Result<xr::Path, xr::Result> {
        let state = self.state.borrow();
        if state.attached_sets.is_none() {
            return Err(xr::Result::ERROR_ACTIONSET_NOT_ATTACHED);
        }
        Ok(match state.user_path(user_path)? {
            Some(hand) => state.hands.get(hand).profile,
            None => xr::Path::NULL,
        })
    }

    pub fn bool_state(
        &self,
        action: xr::Action,
        subaction_path: xr::Path,
    ) -> Result<StateReport<bool>, xr::Result> {
        self.state
            .borrow()
            .report(action, subaction_path, |s| match s {
                ActionState::Bool(b) => Some(b),
                _ => None,
            })
    }

    pub fn float_state(
        &self,
        action: xr::Action,
        subaction_path: xr::Path,
    ) -> Result<StateReport<f32>, xr::Result> {
        self.state
            .borrow()
            .report(action, subaction_path, |s| match s {
                ActionState::Float(f) => Some(f),
                _ => None,
            })
    }

    pub fn vector2_state(
        &self,
        action: xr::Action,
        subaction_path: xr::Path,
    ) -> Result<StateReport<xr::Vector2f>, xr::Result> {
        self.state
            .borrow()
            .report(action, subaction_path, |s| match s {
                ActionState::Vector2(x, y) => Some(xr::Vector2f { x, y }),
                _ => None,
            })
    }

    pub fn pose_active(
        &self,
        action: xr::Action,
        subaction_path: xr::Path,
    ) -> Result<bool, xr::Result> {
        let state = self.state.borrow();
        let data = state.queryable_action(action, subaction_path)?;
        if data.ty != xr::ActionType::POSE_INPUT {
            return Err(xr::Result::ERROR_ACTION_TYPE_MISMATCH);
        }
        if data.deactivated {
            return Ok(false);
        }
        Ok(match state.user_path(subaction_path)? {
            Some(hand) => state.bound_path(data, hand).is_some(),
            None => state.gaze.is_some() && has_gaze_binding(&state, data),
        })
    }

    pub fn apply_haptic(
        &self,
        action: xr::Action,
        subaction_path: xr::Path,
        amplitude: f32,
        duration: i64,
        frequency: f32,
    ) -> Result<(), xr::Result> {
        let mut state = self.state.borrow_mut();
        let data = state.queryable_action(action, subaction_path)?;
        if data.ty != xr::ActionType::VIBRATION_OUTPUT {
            return Err(xr::Result::ERROR_ACTION_TYPE_MISMATCH);
        }
        let hand = state.user_path(subaction_path)?;
        state.haptics.push(HapticEvent {
            action,
            hand,
            amplitude,
            duration,
            frequency,
        });
        Ok(())
    }

    pub fn create_action_space(
        &self,
        action: xr::Action,
        subaction_path: xr::Path,
    ) -> Result<xr::Space, xr::Result> {
        let mut state = self.state.borrow_mut();
        let key = from_raw(action.into_raw());
        let data = state
            .actions
            .get(key)
            .ok_or(xr::Result::ERROR_HANDLE_INVALID)?;
        if data.ty != xr::ActionType::POSE_INPUT {
            return Err(xr::Result::ERROR_ACTION_TYPE_MISMATCH);
        }
        if subaction_path != xr::Path::NULL && !data.subaction_paths.contains(&subaction_path) {
            return Err(xr::Result::ERROR_PATH_UNSUPPORTED);
        }
        let space = state.spaces.insert(SpaceData::Action {
            action: key,
            subaction_path,
        });
        state.created_spaces += 1;
        Ok(xr::Space::from_raw(to_raw(space)))
    }

    pub fn create_reference_space(&self) -> Result<xr::Space, xr::Result> {
        let mut state = self.state.borrow_mut();
        let space = state.spaces.insert(SpaceData::Reference);
        state.created_spaces += 1;
        Ok(xr::Space::from_raw(to_raw(space)))
    }

    #[track_caller]
    pub fn destroy_space(&self, space: xr::Space) {
        assert!(
            self.release_space(space).is_ok(),
            "space destroyed twice or never created"
        );
    }

    pub fn release_space(&self, space: xr::Space) -> Result<(), xr::Result> {
        let mut state = self.state.borrow_mut();
        state
            .spaces
            .remove(from_raw(space.into_raw()))
            .ok_or(xr::Result::ERROR_HANDLE_INVALID)?;
        state.destroyed_spaces += 1;
        Ok(())
    }

    /// Poses are reported relative to the base space's origin, whatever the base is.
    pub fn locate_space(
        &self,
        space: xr::Space,
        base: xr::Space,
        _time: xr::Time,
    ) -> Result<Location, xr::Result> {
        let state = self.state.borrow();
        if !state.spaces.contains_key(from_raw(base.into_raw())) {
            return Err(xr::Result::ERROR_HANDLE_INVALID);
        }
        let space = state
            .spaces
            .get(from_raw(space.into_raw()))
            .ok_or(xr::Result::ERROR_HANDLE_INVALID)?;

        let (action, subaction_path) = match space {
            SpaceData::Reference => {
                return Ok(Location {
                    location_flags: tracked(),
                    pose: xr::Posef::IDENTITY,
                })
            }
            SpaceData::Action {
                action,
                subaction_path,
            } => (*action, *subaction_path),
        };
        let Some(data) = state.actions.get(action) else {
            return Ok(Location::UNTRACKED);
        };

        let Some(hand) = state.user_path(subaction_path)? else {
            return Ok(match state.gaze {
                Some(pose) if has_gaze_binding(&state, data) => Location {
                    location_flags: tracked(),
                    pose,
                },
                _ => Location::UNTRACKED,
            });
        };

        let Some(binding) = state.bound_path(data, hand) else {
            return Ok(Location::UNTRACKED);
        };
        let hand_data = state.hands.get(hand);
        let pose = match binding.strip_prefix(hand.to_path()) {
            Some("/input/grip/pose") => hand_data.grip_pose,
            Some("/input/aim/pose") => hand_data.aim_pose,
            _ => panic!("unrecognized pose binding {binding} for action {:?}", data.name),
        };

        Ok(Location {
            location_flags: hand_data.pose_flags,
            pose,
        })
    }

    pub fn create_hand_tracker(&self, hand: UserPath) -> Result<xr::HandTrackerEXT, xr::Result> {
        if !self.hand_tracking.get().0 {
            return Err(xr::Result::ERROR_FEATURE_UNSUPPORTED);
        }
        let key = self.state.borrow_mut().hand_trackers.insert(hand);
        Ok(xr::HandTrackerEXT::from_raw(to_raw(key)))
    }

    #[track_caller]
    pub fn destroy_hand_tracker(&self, tracker: xr::HandTrackerEXT) {
        assert!(
            self.release_hand_tracker(tracker).is_ok(),
            "hand tracker destroyed twice or never created"
        );
    }

    pub fn release_hand_tracker(&self, tracker: xr::HandTrackerEXT) -> Result<(), xr::Result> {
        let mut state = self.state.borrow_mut();
        state
            .hand_trackers
            .remove(from_raw(tracker.into_raw()))
            .ok_or(xr::Result::ERROR_HANDLE_INVALID)?;
        state.destroyed_hand_trackers += 1;
        Ok(())
    }

    /// `Ok(None)` while the hand isn't tracked. The aim state is only returned when asked for
    /// and supported.
    pub fn locate_hand_joints(
        &self,
        tracker: xr::HandTrackerEXT,
        base: xr::Space,
        _time: xr::Time,
        with_aim: bool,
    ) -> Result<Option<(HandJoints, Option<AimState>)>, xr::Result> {
        let state = self.state.borrow();
        if !state.spaces.contains_key(from_raw(base.into_raw())) {
            return Err(xr::Result::ERROR_HANDLE_INVALID);
        }
        let hand = *state
            .hand_trackers
            .get(from_raw(tracker.into_raw()))
            .ok_or(xr::Result::ERROR_HANDLE_INVALID)?;
        let data = state.hands.get(hand);
        let aim = if with_aim && self.hand_tracking.get().1 {
            data.aim_state
        } else {
            None
        };
        Ok(data.joints.as_deref().map(|joints| (*joints, aim)))
    }

    // Test controls

    pub fn set_hand_tracking_support(&self, joints: bool, aim: bool) {
        self.hand_tracking.set((joints, joints && aim));
    }

    pub fn hand_tracking_support(&self) -> (bool, bool) {
        self.hand_tracking.get()
    }

    pub fn fail_action_creation(&self, fail: bool) {
        self.fail_action_creation.set(fail);
    }

    /// Makes every `sync_actions` fail, as if the session was lost.
    pub fn fail_sync(&self, fail: bool) {
        self.fail_sync.set(fail);
    }

    /// Becomes visible at the next sync.
    #[track_caller]
    pub fn set_action_state(&self, action: xr::Action, state: ActionState, hand: UserPath) {
        let mut s = self.state.borrow_mut();
        let data = s
            .actions
            .get_mut(from_raw(action.into_raw()))
            .expect("setting state of unknown action");
        assert_eq!(
            std::mem::discriminant(&state),
            std::mem::discriminant(&ActionState::default_for(data.ty)),
            "wrong state type for action {:?}",
            data.name
        );
        *data.pending_state.get_mut(hand) = Some(state);
        data.deactivated = false;
    }

    pub fn deactivate_action(&self, action: xr::Action) {
        if let Some(data) = self
            .state
            .borrow_mut()
            .actions
            .get_mut(from_raw(action.into_raw()))
        {
            data.deactivated = true;
        }
    }

    /// Becomes visible at the next sync.
    pub fn set_interaction_profile(&self, hand: UserPath, profile: &str) {
        let mut state = self.state.borrow_mut();
        let profile = state.intern(profile);
        state.hands.get_mut(hand).pending_profile = Some(profile);
    }

    pub fn clear_interaction_profile(&self, hand: UserPath) {
        self.state.borrow_mut().hands.get_mut(hand).pending_profile = Some(xr::Path::NULL);
    }

    pub fn set_grip(&self, hand: UserPath, pose: xr::Posef) {
        self.state.borrow_mut().hands.get_mut(hand).grip_pose = pose;
    }

    pub fn set_aim(&self, hand: UserPath, pose: xr::Posef) {
        self.state.borrow_mut().hands.get_mut(hand).aim_pose = pose;
    }

    /// Flags reported when locating this hand's grip and aim.
    pub fn set_pose_flags(&self, hand: UserPath, flags: xr::SpaceLocationFlags) {
        self.state.borrow_mut().hands.get_mut(hand).pose_flags = flags;
    }

    pub fn set_gaze(&self, pose: Option<xr::Posef>) {
        self.state.borrow_mut().gaze = pose;
    }

    pub fn set_hand_joints(&self, hand: UserPath, joints: Option<HandJoints>) {
        self.state.borrow_mut().hands.get_mut(hand).joints = joints.map(Box::new);
    }

    pub fn set_aim_state(&self, hand: UserPath, aim: Option<AimState>) {
        self.state.borrow_mut().hands.get_mut(hand).aim_state = aim;
    }

    // Inspection

    pub fn find_action(&self, name: &str) -> Option<xr::Action> {
        self.state
            .borrow()
            .actions
            .iter()
            .find(|(_, a)| a.name == name)
            .map(|(key, _)| xr::Action::from_raw(to_raw(key)))
    }

    pub fn action_name(&self, action: xr::Action) -> Option<String> {
        self.state
            .borrow()
            .actions
            .get(from_raw(action.into_raw()))
            .map(|a| a.name.clone())
    }

    pub fn action_subaction_paths(&self, action: xr::Action) -> Vec<String> {
        let state = self.state.borrow();
        state
            .actions
            .get(from_raw(action.into_raw()))
            .map(|a| {
                a.subaction_paths
                    .iter()
                    .filter_map(|p| state.path_value(*p).ok().flatten().map(str::to_owned))
                    .collect()
            })
            .unwrap_or_default()
    }

    #[track_caller]
    pub fn get_suggested_bindings(&self, action: xr::Action, profile: &str) -> Vec<String> {
        let state = self.state.borrow();
        let data = state
            .actions
            .get(from_raw(action.into_raw()))
            .expect("unknown action");
        let profile_path = state
            .path_lookup
            .get(profile)
            .map(|key| xr::Path::from_raw(to_raw(*key)))
            .unwrap_or(xr::Path::NULL);

        data.suggested
            .get(&profile_path)
            .unwrap_or_else(|| {
                panic!(
                    "No suggested bindings for profile {profile} for action {:?}",
                    data.name
                )
            })
            .iter()
            .filter_map(|path| state.path_value(*path).ok().flatten().map(str::to_owned))
            .collect()
    }

    pub fn has_suggested_bindings(&self, action: xr::Action, profile: &str) -> bool {
        let state = self.state.borrow();
        let Some(key) = state.path_lookup.get(profile) else {
            return false;
        };
        state
            .actions
            .get(from_raw(action.into_raw()))
            .is_some_and(|a| a.suggested.contains_key(&xr::Path::from_raw(to_raw(*key))))
    }

    pub fn action_count(&self) -> usize {
        self.state.borrow().actions.len()
    }

    pub fn created_action_count(&self) -> usize {
        self.state.borrow().created_actions
    }

    pub fn live_action_set_count(&self) -> usize {
        self.state.borrow().action_sets.len()
    }

    pub fn destroyed_action_set_count(&self) -> usize {
        self.state.borrow().destroyed_action_sets
    }

    pub fn live_space_count(&self) -> usize {
        self.state.borrow().spaces.len()
    }

    pub fn created_space_count(&self) -> usize {
        self.state.borrow().created_spaces
    }

    pub fn destroyed_space_count(&self) -> usize {
        self.state.borrow().destroyed_spaces
    }

    pub fn live_hand_tracker_count(&self) -> usize {
        self.state.borrow().hand_trackers.len()
    }

    pub fn destroyed_hand_tracker_count(&self) -> usize {
        self.state.borrow().destroyed_hand_trackers
    }

    pub fn haptic_events(&self) -> Vec<HapticEvent> {
        self.state.borrow().haptics.clone()
    }
}

fn has_gaze_binding(state: &State, action: &ActionData) -> bool {
    action
        .suggested
        .values()
        .flatten()
        .any(|p| state.path_value(*p).ok().flatten() == Some(EYE_GAZE_POSE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_is_visible_after_sync() {
        let runtime = Runtime::new("Test");
        let left = runtime.string_to_path("/user/hand/left").unwrap();
        let set = runtime.create_action_set("set", "set", 0).unwrap();
        let action = runtime
            .create_action(set, xr::ActionType::BOOLEAN_INPUT, "click", &[left])
            .unwrap();
        let profile = runtime
            .string_to_path("/interaction_profiles/khr/simple_controller")
            .unwrap();
        let binding = runtime
            .string_to_path("/user/hand/left/input/select/click")
            .unwrap();
        runtime.suggest_bindings(profile, &[(action, binding)]).unwrap();

        assert_eq!(
            runtime.bool_state(action, left),
            Err(xr::Result::ERROR_ACTIONSET_NOT_ATTACHED)
        );
        runtime.attach_action_sets(&[set]).unwrap();

        runtime.set_interaction_profile(
            UserPath::LeftHand,
            "/interaction_profiles/khr/simple_controller",
        );
        runtime.set_action_state(action, true.into(), UserPath::LeftHand);
        let state = runtime.bool_state(action, left).unwrap();
        assert!(!state.current_state);
        assert!(!state.is_active);

        runtime.sync_actions(set).unwrap();
        let state = runtime.bool_state(action, left).unwrap();
        assert!(state.current_state);
        assert!(state.changed_since_last_sync);
        assert!(state.is_active);
        assert_eq!(
            runtime.get_suggested_bindings(action, "/interaction_profiles/khr/simple_controller"),
            ["/user/hand/left/input/select/click"]
        );
    }

    #[test]
    fn undeclared_subaction_path_is_unsupported() {
        let runtime = Runtime::new("Test");
        let left = runtime.string_to_path("/user/hand/left").unwrap();
        let right = runtime.string_to_path("/user/hand/right").unwrap();
        let set = runtime.create_action_set("set", "set", 0).unwrap();
        let action = runtime
            .create_action(set, xr::ActionType::FLOAT_INPUT, "value", &[left])
            .unwrap();
        runtime.attach_action_sets(&[set]).unwrap();

        assert!(runtime.float_state(action, left).is_ok());
        assert_eq!(
            runtime.float_state(action, right),
            Err(xr::Result::ERROR_PATH_UNSUPPORTED)
        );
        assert_eq!(
            runtime.bool_state(action, left),
            Err(xr::Result::ERROR_ACTION_TYPE_MISMATCH)
        );
    }

    #[test]
    fn destroying_a_set_destroys_its_actions() {
        let runtime = Runtime::new("Test");
        let set = runtime.create_action_set("set", "set", 0).unwrap();
        runtime
            .create_action(set, xr::ActionType::POSE_INPUT, "pose", &[])
            .unwrap();
        assert_eq!(runtime.action_count(), 1);
        runtime.destroy_action_set(set);
        assert_eq!(runtime.action_count(), 0);
        assert_eq!(runtime.destroyed_action_set_count(), 1);
    }
}
