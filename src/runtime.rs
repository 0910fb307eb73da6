//! The synchronous query surface the input core needs from an XR runtime.
//!
//! Everything here is called from the thread owning the session, once per frame at most for the
//! per-frame queries. Handles are the raw OpenXR handle types so that any backend (the real
//! `openxr` one in [`crate::openxr_data`], or a fake one in tests) can hand them out.

use openxr as xr;

pub type ActionSetHandle = xr::sys::ActionSet;
pub type ActionHandle = xr::sys::Action;
pub type SpaceHandle = xr::sys::Space;
pub type HandTrackerHandle = xr::sys::HandTrackerEXT;

#[repr(u32)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Hand {
    Left = 0,
    Right,
}

impl Hand {
    pub const ALL: [Hand; 2] = [Hand::Left, Hand::Right];

    #[inline]
    pub fn user_path(self) -> &'static str {
        match self {
            Hand::Left => "/user/hand/left",
            Hand::Right => "/user/hand/right",
        }
    }

    #[inline]
    pub fn name(self) -> &'static str {
        match self {
            Hand::Left => "left",
            Hand::Right => "right",
        }
    }
}

impl From<Hand> for xr::Hand {
    fn from(value: Hand) -> Self {
        match value {
            Hand::Left => xr::Hand::LEFT,
            Hand::Right => xr::Hand::RIGHT,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum HandTrackingSupport {
    None,
    /// Plain joint locations (XR_EXT_hand_tracking).
    Joints,
    /// Joint locations plus the runtime computed aim (XR_FB_hand_tracking_aim).
    JointsWithAim,
}

/// Extra data a hand joint query should ask the runtime for.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct HandTrackingRequest {
    pub aim_state: bool,
}

/// Aim data computed by the runtime itself, only filled in when requested.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct AimState {
    pub valid: bool,
    pub system_gesture: bool,
    pub index_pinching: bool,
    pub aim_pose: xr::Posef,
    pub pinch_strength_index: f32,
}

impl Default for AimState {
    fn default() -> Self {
        Self {
            valid: false,
            system_gesture: false,
            index_pinching: false,
            aim_pose: xr::Posef::IDENTITY,
            pinch_strength_index: 0.0,
        }
    }
}

pub struct HandJointsSample {
    pub joints: xr::HandJointLocations,
    pub aim: Option<AimState>,
}

impl HandJointsSample {
    #[inline]
    pub fn joint(&self, joint: xr::HandJoint) -> &xr::HandJointLocation {
        &self.joints[joint.into_raw() as usize]
    }

    pub fn is_joint_position_valid(&self, joint: xr::HandJoint) -> bool {
        self.joint(joint)
            .location_flags
            .contains(xr::SpaceLocationFlags::POSITION_VALID)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SuggestedBinding {
    pub action: ActionHandle,
    pub binding: xr::Path,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Vibration {
    pub amplitude: f32,
    pub duration: xr::Duration,
    pub frequency: f32,
}

pub trait Runtime {
    /// Name the runtime reports for the current system, used to pick system specific profiles.
    fn system_name(&self) -> &str;

    fn string_to_path(&self, path: &str) -> xr::Result<xr::Path>;
    fn path_to_string(&self, path: xr::Path) -> xr::Result<String>;

    fn create_action_set(
        &self,
        name: &str,
        localized_name: &str,
        priority: u32,
    ) -> xr::Result<ActionSetHandle>;
    fn destroy_action_set(&self, set: ActionSetHandle);

    fn create_action(
        &self,
        set: ActionSetHandle,
        ty: xr::sys::ActionType,
        name: &str,
        subaction_paths: &[xr::Path],
    ) -> xr::Result<ActionHandle>;

    fn suggest_bindings(
        &self,
        interaction_profile: xr::Path,
        bindings: &[SuggestedBinding],
    ) -> xr::Result<()>;
    fn attach_action_sets(&self, sets: &[ActionSetHandle]) -> xr::Result<()>;
    fn sync_actions(&self, set: ActionSetHandle) -> xr::Result<()>;

    /// Returns [`xr::Path::NULL`] if no profile is currently bound for the user path.
    fn current_interaction_profile(&self, user_path: xr::Path) -> xr::Result<xr::Path>;

    fn bool_state(
        &self,
        action: ActionHandle,
        subaction_path: xr::Path,
    ) -> xr::Result<xr::ActionState<bool>>;
    fn float_state(
        &self,
        action: ActionHandle,
        subaction_path: xr::Path,
    ) -> xr::Result<xr::ActionState<f32>>;
    fn vector2_state(
        &self,
        action: ActionHandle,
        subaction_path: xr::Path,
    ) -> xr::Result<xr::ActionState<xr::Vector2f>>;
    fn pose_active(&self, action: ActionHandle, subaction_path: xr::Path) -> xr::Result<bool>;

    fn apply_haptic(
        &self,
        action: ActionHandle,
        subaction_path: xr::Path,
        vibration: Vibration,
    ) -> xr::Result<()>;

    fn create_action_space(
        &self,
        action: ActionHandle,
        subaction_path: xr::Path,
    ) -> xr::Result<SpaceHandle>;
    fn create_reference_space(&self, ty: xr::ReferenceSpaceType) -> xr::Result<SpaceHandle>;
    fn destroy_space(&self, space: SpaceHandle);
    fn locate_space(
        &self,
        space: SpaceHandle,
        base: SpaceHandle,
        time: xr::Time,
    ) -> xr::Result<xr::SpaceLocation>;

    fn hand_tracking_support(&self) -> HandTrackingSupport;
    fn create_hand_tracker(&self, hand: Hand) -> xr::Result<HandTrackerHandle>;
    fn destroy_hand_tracker(&self, tracker: HandTrackerHandle);

    /// Returns `None` when the runtime reports the hand as not currently tracked.
    fn locate_hand_joints(
        &self,
        tracker: HandTrackerHandle,
        base: SpaceHandle,
        time: xr::Time,
        request: &HandTrackingRequest,
    ) -> xr::Result<Option<HandJointsSample>>;
}

/// Errors that make the input system unusable. These only happen while setting things up.
#[derive(Debug)]
pub enum InitError {
    PathConversionFailed {
        path: String,
        result: xr::sys::Result,
    },
    ActionSetCreationFailed(xr::sys::Result),
    ActionCreationFailed {
        name: String,
        result: xr::sys::Result,
    },
    AttachFailed(xr::sys::Result),
    SpaceCreationFailed(xr::sys::Result),
    HandTrackerCreationFailed(xr::sys::Result),
}

impl std::fmt::Display for InitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PathConversionFailed { path, result } => {
                write!(f, "failed to convert {path:?} to an OpenXR path: {result}")
            }
            Self::ActionSetCreationFailed(result) => {
                write!(f, "failed to create action set: {result}")
            }
            Self::ActionCreationFailed { name, result } => {
                write!(f, "failed to create action {name:?}: {result}")
            }
            Self::AttachFailed(result) => write!(f, "failed to attach action sets: {result}"),
            Self::SpaceCreationFailed(result) => write!(f, "failed to create space: {result}"),
            Self::HandTrackerCreationFailed(result) => {
                write!(f, "failed to create hand tracker: {result}")
            }
        }
    }
}

impl std::error::Error for InitError {}

/// Convenience for setup code: converts a path string, turning failures into an [`InitError`].
pub(crate) fn init_path(runtime: &impl Runtime, path: &str) -> Result<xr::Path, InitError> {
    runtime
        .string_to_path(path)
        .map_err(|result| InitError::PathConversionFailed {
            path: path.to_owned(),
            result,
        })
}
