use super::gesture::tests::open_hand;
use super::profiles::{htc, oculus, simple_controller};
use super::{FrameState, Input, LegacyInput};
use crate::config::InputConfig;
use crate::convert::{mat4_to_pose, quat_to_xr, vec3_to_xr};
use crate::delegate::{Button, CapabilityFlags, DeviceType, PointerMode, RenderMode, TargetRayMode};
use crate::report::{ControllerEvent, GenericControllerReport, ReportRecorder};
use crate::runtime::{
    ActionHandle, ActionSetHandle, AimState, Hand, HandJointsSample, HandTrackerHandle,
    HandTrackingRequest, HandTrackingSupport, InitError, Runtime, SpaceHandle, SuggestedBinding,
    Vibration,
};
use fakexr::UserPath::*;
use glam::{Mat4, Quat, Vec2, Vec3};
use openxr as xr;
use std::rc::Rc;

fn user_path(hand: Hand) -> fakexr::UserPath {
    match hand {
        Hand::Left => LeftHand,
        Hand::Right => RightHand,
    }
}

fn action_state<T>(report: fakexr::StateReport<T>) -> xr::ActionState<T> {
    xr::ActionState {
        current_state: report.current_state,
        changed_since_last_sync: report.changed_since_last_sync,
        last_change_time: xr::Time::from_nanos(0),
        is_active: report.is_active,
    }
}

impl Runtime for fakexr::Runtime {
    fn system_name(&self) -> &str {
        fakexr::Runtime::system_name(self)
    }

    fn string_to_path(&self, path: &str) -> xr::Result<xr::Path> {
        fakexr::Runtime::string_to_path(self, path)
    }

    fn path_to_string(&self, path: xr::Path) -> xr::Result<String> {
        fakexr::Runtime::path_to_string(self, path)
    }

    fn create_action_set(
        &self,
        name: &str,
        localized_name: &str,
        priority: u32,
    ) -> xr::Result<ActionSetHandle> {
        fakexr::Runtime::create_action_set(self, name, localized_name, priority)
    }

    fn destroy_action_set(&self, set: ActionSetHandle) {
        fakexr::Runtime::destroy_action_set(self, set)
    }

    fn create_action(
        &self,
        set: ActionSetHandle,
        ty: xr::sys::ActionType,
        name: &str,
        subaction_paths: &[xr::Path],
    ) -> xr::Result<ActionHandle> {
        fakexr::Runtime::create_action(self, set, ty, name, subaction_paths)
    }

    fn suggest_bindings(
        &self,
        interaction_profile: xr::Path,
        bindings: &[SuggestedBinding],
    ) -> xr::Result<()> {
        let bindings: Vec<_> = bindings.iter().map(|b| (b.action, b.binding)).collect();
        fakexr::Runtime::suggest_bindings(self, interaction_profile, &bindings)
    }

    fn attach_action_sets(&self, sets: &[ActionSetHandle]) -> xr::Result<()> {
        fakexr::Runtime::attach_action_sets(self, sets)
    }

    fn sync_actions(&self, set: ActionSetHandle) -> xr::Result<()> {
        fakexr::Runtime::sync_actions(self, set)
    }

    fn current_interaction_profile(&self, user_path: xr::Path) -> xr::Result<xr::Path> {
        fakexr::Runtime::current_interaction_profile(self, user_path)
    }

    fn bool_state(
        &self,
        action: ActionHandle,
        subaction_path: xr::Path,
    ) -> xr::Result<xr::ActionState<bool>> {
        fakexr::Runtime::bool_state(self, action, subaction_path).map(action_state)
    }

    fn float_state(
        &self,
        action: ActionHandle,
        subaction_path: xr::Path,
    ) -> xr::Result<xr::ActionState<f32>> {
        fakexr::Runtime::float_state(self, action, subaction_path).map(action_state)
    }

    fn vector2_state(
        &self,
        action: ActionHandle,
        subaction_path: xr::Path,
    ) -> xr::Result<xr::ActionState<xr::Vector2f>> {
        fakexr::Runtime::vector2_state(self, action, subaction_path).map(action_state)
    }

    fn pose_active(&self, action: ActionHandle, subaction_path: xr::Path) -> xr::Result<bool> {
        fakexr::Runtime::pose_active(self, action, subaction_path)
    }

    fn apply_haptic(
        &self,
        action: ActionHandle,
        subaction_path: xr::Path,
        vibration: Vibration,
    ) -> xr::Result<()> {
        fakexr::Runtime::apply_haptic(
            self,
            action,
            subaction_path,
            vibration.amplitude,
            vibration.duration.as_nanos(),
            vibration.frequency,
        )
    }

    fn create_action_space(
        &self,
        action: ActionHandle,
        subaction_path: xr::Path,
    ) -> xr::Result<SpaceHandle> {
        fakexr::Runtime::create_action_space(self, action, subaction_path)
    }

    fn create_reference_space(&self, _: xr::ReferenceSpaceType) -> xr::Result<SpaceHandle> {
        fakexr::Runtime::create_reference_space(self)
    }

    fn destroy_space(&self, space: SpaceHandle) {
        fakexr::Runtime::destroy_space(self, space)
    }

    fn locate_space(
        &self,
        space: SpaceHandle,
        base: SpaceHandle,
        time: xr::Time,
    ) -> xr::Result<xr::SpaceLocation> {
        fakexr::Runtime::locate_space(self, space, base, time).map(|location| xr::SpaceLocation {
            location_flags: location.location_flags,
            pose: location.pose,
        })
    }

    fn hand_tracking_support(&self) -> HandTrackingSupport {
        match fakexr::Runtime::hand_tracking_support(self) {
            (false, _) => HandTrackingSupport::None,
            (true, false) => HandTrackingSupport::Joints,
            (true, true) => HandTrackingSupport::JointsWithAim,
        }
    }

    fn create_hand_tracker(&self, hand: Hand) -> xr::Result<HandTrackerHandle> {
        fakexr::Runtime::create_hand_tracker(self, user_path(hand))
    }

    fn destroy_hand_tracker(&self, tracker: HandTrackerHandle) {
        fakexr::Runtime::destroy_hand_tracker(self, tracker)
    }

    fn locate_hand_joints(
        &self,
        tracker: HandTrackerHandle,
        base: SpaceHandle,
        time: xr::Time,
        request: &HandTrackingRequest,
    ) -> xr::Result<Option<HandJointsSample>> {
        let located =
            fakexr::Runtime::locate_hand_joints(self, tracker, base, time, request.aim_state)?;
        Ok(located.map(|(joints, aim)| HandJointsSample {
            joints,
            aim: aim.map(|aim| AimState {
                valid: aim.status.contains(xr::sys::HandTrackingAimFlagsFB::VALID),
                system_gesture: aim
                    .status
                    .contains(xr::sys::HandTrackingAimFlagsFB::SYSTEM_GESTURE),
                index_pinching: aim
                    .status
                    .contains(xr::sys::HandTrackingAimFlagsFB::INDEX_PINCHING),
                aim_pose: aim.aim_pose,
                pinch_strength_index: aim.pinch_strength_index,
            }),
        }))
    }
}

fn pose(position: Vec3) -> xr::Posef {
    xr::Posef {
        orientation: quat_to_xr(Quat::IDENTITY),
        position: vec3_to_xr(position),
    }
}

fn frame(runtime: &fakexr::Runtime) -> FrameState {
    FrameState {
        time: xr::Time::from_nanos(1),
        base_space: Runtime::create_reference_space(runtime, xr::ReferenceSpaceType::STAGE)
            .unwrap(),
        head: Mat4::IDENTITY,
        render_mode: RenderMode::Immersive,
        pointer_mode: PointerMode::TrackedPointer,
        hand_tracking_enabled: true,
    }
}

struct Fixture {
    runtime: Rc<fakexr::Runtime>,
    input: Input<fakexr::Runtime>,
    recorder: ReportRecorder,
    frame: FrameState,
}

impl Fixture {
    fn new() -> Self {
        Self::with_runtime(fakexr::Runtime::new("Test System"), false)
    }

    fn with_runtime(runtime: fakexr::Runtime, eye_tracking: bool) -> Self {
        crate::init_logging();
        let runtime = Rc::new(runtime);
        let mut recorder = ReportRecorder::new();
        let input = Input::new(
            runtime.clone(),
            &InputConfig::default(),
            eye_tracking,
            &mut recorder,
        )
        .unwrap();
        let frame = frame(&runtime);

        Self {
            runtime,
            input,
            recorder,
            frame,
        }
    }

    #[track_caller]
    fn action(&self, name: &str) -> xr::sys::Action {
        self.runtime
            .find_action(name)
            .unwrap_or_else(|| panic!("no action named {name:?}"))
    }

    fn set_state(&self, name: &str, hand: fakexr::UserPath, state: impl Into<fakexr::ActionState>) {
        self.runtime
            .set_action_state(self.action(name), state.into(), hand);
    }

    fn bind(&mut self, hand: fakexr::UserPath, profile: &str) {
        self.runtime.set_interaction_profile(hand, profile);
        self.input.interaction_profile_changed();
    }

    fn update(&mut self) {
        self.recorder.begin_frame();
        self.input.update(&self.frame, &mut self.recorder).unwrap();
    }

    #[track_caller]
    fn controller(&self, index: usize) -> &GenericControllerReport {
        self.recorder.controller(index).unwrap()
    }

    fn events(&self, index: usize) -> Vec<ControllerEvent> {
        self.recorder.events_for(index).collect()
    }

    #[track_caller]
    fn verify_bindings(&self, profile: &str, action: &str, expected: &[&str]) {
        let mut bindings = self.runtime.get_suggested_bindings(self.action(action), profile);
        bindings.sort();
        let mut expected: Vec<String> = expected.iter().map(|s| s.to_string()).collect();
        expected.sort();
        assert_eq!(bindings, expected, "bindings of {action} for {profile}");
    }
}

#[test]
fn controllers_are_created_disabled() {
    let f = Fixture::new();
    assert_eq!(f.recorder.controller_count(), 2);

    let right = f.controller(0);
    assert!(!right.enabled);
    assert!(!right.left_handed);
    assert_eq!(right.target_ray_mode, Some(TargetRayMode::TrackedPointer));
    assert!(f.controller(1).left_handed);
    assert!(!f.input.are_controllers_ready());
}

#[test]
fn suggests_bindings_per_hand() {
    let f = Fixture::new();
    f.verify_bindings(
        simple_controller::KHR_SIMPLE.path,
        "button_trigger_click",
        &[
            "/user/hand/left/input/select/click",
            "/user/hand/right/input/select/click",
        ],
    );
    f.verify_bindings(
        htc::VIVE_WAND.path,
        "grip",
        &[
            "/user/hand/left/input/grip/pose",
            "/user/hand/right/input/grip/pose",
        ],
    );
    f.verify_bindings(
        htc::VIVE_WAND.path,
        "axis_trackpad",
        &["/user/hand/left/input/trackpad", "/user/hand/right/input/trackpad"],
    );
    // One sided controls get one sided actions.
    f.verify_bindings(
        htc::VIVE_FOCUS3.path,
        "button_left_x_click",
        &["/user/hand/left/input/x/click"],
    );
    assert_eq!(
        f.runtime.action_subaction_paths(f.action("button_left_x_click")),
        ["/user/hand/left"]
    );
    f.verify_bindings(
        "/interaction_profiles/ext/hand_interaction_ext",
        "button_trigger_ready_ext",
        &[
            "/user/hand/left/input/pinch_ext/ready_ext",
            "/user/hand/right/input/pinch_ext/ready_ext",
        ],
    );
}

#[test]
fn actions_are_shared_between_profiles() {
    let f = Fixture::new();
    let trigger_click = f.action("button_trigger_click");
    assert!(f
        .runtime
        .has_suggested_bindings(trigger_click, simple_controller::KHR_SIMPLE.path));
    assert!(f
        .runtime
        .has_suggested_bindings(trigger_click, htc::VIVE_WAND.path));

    // Every requested action was created exactly once.
    assert_eq!(f.input.action_count(), f.runtime.action_count());
    assert_eq!(f.runtime.created_action_count(), f.runtime.action_count());
}

#[test]
fn profile_switch_changes_reported_controller() {
    let mut f = Fixture::new();
    f.bind(RightHand, simple_controller::KHR_SIMPLE.path);
    f.update();

    let right = f.controller(0);
    assert!(right.enabled);
    assert_eq!(right.model, Some("vr_controller_oculusgo.obj"));
    assert_eq!(right.device_type, DeviceType::OculusGo);
    assert_eq!(right.input_profiles, ["generic-button"]);
    // trigger and menu, plus squeeze, touchpad and thumbstick slots
    assert_eq!(right.button_count, 5);
    assert!(f.input.are_controllers_ready());
    assert!(f.input.has_physical_controllers());
    assert_eq!(f.input.controller_model_name(0), Some("vr_controller_oculusgo.obj"));

    // Not picked up until the change is signalled.
    f.runtime
        .set_interaction_profile(RightHand, oculus::TOUCH_QUEST.path);
    f.update();
    assert_eq!(f.controller(0).button_count, 5);

    f.input.interaction_profile_changed();
    f.update();
    let right = f.controller(0);
    assert!(right.enabled);
    assert_eq!(right.device_type, DeviceType::OculusQuest);
    assert_eq!(right.input_profiles[0], "oculus-touch-v2");
    // six buttons on the right controller, plus the touchpad slot
    assert_eq!(right.button_count, 7);
    assert!(std::ptr::eq(
        f.input.active_profile(0).unwrap(),
        &oculus::TOUCH_QUEST
    ));
}

#[test]
fn system_specific_descriptor_is_used() {
    let mut f = Fixture::with_runtime(fakexr::Runtime::new("Oculus Quest2"), false);
    f.bind(LeftHand, oculus::TOUCH_QUEST2.path);
    f.update();

    let left = f.controller(1);
    assert_eq!(left.device_type, DeviceType::OculusQuest2);
    assert_eq!(left.model, Some("vr_controller_oculusquest2_left.obj"));
    assert_eq!(left.haptic_count, 1);
}

#[test]
fn unrecognized_profile_disables_hand() {
    let mut f = Fixture::new();
    f.bind(RightHand, "/interaction_profiles/unknown/controller");
    f.update();

    let right = f.controller(0);
    assert!(!right.enabled);
    assert_eq!(right.model, None);
    assert_eq!(right.device_type, DeviceType::Unknown);
    assert!(f.input.active_profile(0).is_none());
    assert!(!f.input.are_controllers_ready());
}

#[test]
fn value_only_buttons_use_click_threshold() {
    let mut f = Fixture::new();
    f.bind(RightHand, oculus::TOUCH_QUEST.path);
    f.set_state("button_squeeze_value", RightHand, 0.95_f32);
    f.update();

    let squeeze = *f.controller(0).button(Button::Squeeze).unwrap();
    assert!(squeeze.pressed);
    assert!(squeeze.touched);
    assert_eq!(squeeze.value, 0.95);

    f.set_state("button_squeeze_value", RightHand, 0.5_f32);
    f.update();
    let squeeze = *f.controller(0).button(Button::Squeeze).unwrap();
    assert!(!squeeze.pressed);
    assert!(squeeze.touched);
    assert_eq!(squeeze.value, 0.5);

    // The trigger has a touch sensor, which wins over the value.
    f.set_state("button_trigger_value", RightHand, 0.2_f32);
    f.set_state("button_trigger_touch", RightHand, false);
    f.update();
    let trigger = *f.controller(0).button(Button::Trigger).unwrap();
    assert!(!trigger.touched);
    assert_eq!(trigger.value, 0.2);
}

#[test]
fn select_and_squeeze_events_only_while_immersive() {
    let mut f = Fixture::new();
    f.bind(RightHand, htc::VIVE_WAND.path);
    f.frame.render_mode = RenderMode::StandAlone;
    f.set_state("button_trigger_click", RightHand, true);
    f.update();
    assert!(f.controller(0).button(Button::Trigger).unwrap().pressed);
    assert!(f.events(0).iter().all(|e| *e == ControllerEvent::TouchEnd));

    f.frame.render_mode = RenderMode::Immersive;
    f.update();
    assert!(f.events(0).contains(&ControllerEvent::SelectStart));

    f.update();
    assert!(!f.events(0).contains(&ControllerEvent::SelectStart));

    f.set_state("button_trigger_click", RightHand, false);
    f.set_state("button_squeeze_click", RightHand, true);
    f.update();
    let events = f.events(0);
    assert!(events.contains(&ControllerEvent::SelectStop));
    assert!(events.contains(&ControllerEvent::SqueezeStart));
}

#[test]
fn missing_buttons_get_placeholders() {
    let mut f = Fixture::new();
    f.bind(RightHand, simple_controller::KHR_SIMPLE.path);
    f.update();

    let right = f.controller(0);
    let placeholders: Vec<_> = right.placeholders().map(|b| b.button).collect();
    assert_eq!(placeholders, [Button::Squeeze, Button::Touchpad, Button::Others]);
    assert!(right.placeholders().all(|b| !b.pressed && b.value == 0.0));

    // The menu button is reserved for the application menu.
    assert_eq!(right.button(Button::App).unwrap().immersive_index, None);
    assert_eq!(right.button(Button::Trigger).unwrap().immersive_index, Some(0));
    assert_eq!(right.axes, [0.0; 4]);
}

#[test]
fn axes_follow_gamepad_conventions() {
    let mut f = Fixture::new();
    f.bind(RightHand, htc::VIVE_WAND.path);
    f.bind(LeftHand, oculus::TOUCH_QUEST.path);
    f.set_state("axis_trackpad", RightHand, fakexr::ActionState::Vector2(0.5, 0.25));
    f.set_state("button_trackpad_touch", RightHand, true);
    f.set_state("axis_thumbstick", LeftHand, fakexr::ActionState::Vector2(0.3, 0.6));
    f.update();

    let right = f.controller(0);
    assert_eq!(right.axes, [0.5, -0.25, 0.0, 0.0]);
    assert_eq!(right.touch_position, Some(Vec2::new(0.5, -0.25)));

    let left = f.controller(1);
    assert_eq!(left.axes, [0.0, 0.0, 0.3, -0.6]);
    assert_eq!(left.scrolled_delta, Vec2::new(-0.3, 0.6));

    // Clicking the trackpad ends the touch.
    f.set_state("button_trackpad_click", RightHand, true);
    f.update();
    assert_eq!(f.controller(0).touch_position, None);
    assert!(f.events(0).contains(&ControllerEvent::TouchEnd));
}

#[test]
fn tracked_controller_pose() {
    let mut f = Fixture::new();
    f.bind(RightHand, simple_controller::KHR_SIMPLE.path);
    f.runtime.set_aim(RightHand, pose(Vec3::new(0.1, 1.0, -0.3)));
    f.runtime.set_grip(RightHand, pose(Vec3::new(0.1, 0.9, -0.2)));
    f.update();

    let right = f.controller(0);
    assert_eq!(
        right.capability_flags,
        CapabilityFlags::ORIENTATION
            | CapabilityFlags::POSITION
            | CapabilityFlags::GRIP_SPACE_POSITION
    );
    assert!(right
        .transform
        .transform_point3(Vec3::ZERO)
        .abs_diff_eq(Vec3::new(0.1, 1.0, -0.3), 1e-6));
    assert!(right
        .beam_transform
        .transform_point3(Vec3::ZERO)
        .abs_diff_eq(Vec3::new(0.1, 0.9, -0.2), 1e-6));

    // Outside of a session the pose is lifted to standing height.
    f.frame.render_mode = RenderMode::StandAlone;
    f.update();
    assert!(f
        .controller(0)
        .transform
        .transform_point3(Vec3::ZERO)
        .abs_diff_eq(Vec3::new(0.1, 2.7, -0.3), 1e-5));
}

#[test]
fn orientation_only_controller_uses_arm_model() {
    let mut f = Fixture::new();
    f.bind(RightHand, simple_controller::KHR_SIMPLE.path);
    f.runtime.set_pose_flags(
        RightHand,
        xr::SpaceLocationFlags::ORIENTATION_VALID | xr::SpaceLocationFlags::ORIENTATION_TRACKED,
    );
    f.update();

    let right = f.controller(0);
    assert!(right.enabled);
    assert_eq!(
        right.capability_flags,
        CapabilityFlags::ORIENTATION | CapabilityFlags::POSITION_EMULATED
    );
    let position = right.transform.transform_point3(Vec3::ZERO);
    assert!(
        position.abs_diff_eq(Vec3::new(0.195, -0.5, -0.225), 1e-5),
        "{position}"
    );

    f.runtime
        .set_pose_flags(RightHand, xr::SpaceLocationFlags::EMPTY);
    f.update();
    assert!(!f.controller(0).enabled);
}

#[test]
fn pose_spaces_are_created_once_and_destroyed_with_input() {
    let mut f = Fixture::new();
    f.bind(RightHand, simple_controller::KHR_SIMPLE.path);
    for _ in 0..3 {
        f.update();
    }
    // the base space, plus grip and aim of the right hand
    assert_eq!(f.runtime.created_space_count(), 3);

    let Fixture { runtime, input, .. } = f;
    drop(input);
    assert_eq!(runtime.destroyed_space_count(), 2);
    assert_eq!(runtime.live_space_count(), 1);
    assert_eq!(runtime.live_action_set_count(), 0);
    assert_eq!(runtime.action_count(), 0);
}

#[test]
fn haptics_need_a_haptic_output() {
    let mut f = Fixture::new();
    f.bind(RightHand, oculus::TOUCH_QUEST.path);
    f.bind(LeftHand, oculus::TOUCH_QUEST.path);
    f.update();

    assert_eq!(f.controller(0).haptic_count, 1);
    assert_eq!(f.controller(1).haptic_count, 0);
    assert!(f
        .input
        .apply_haptic_feedback(0, 1.5, xr::Duration::from_nanos(20_000_000)));
    // Quest 1 controllers only vibrate on the right.
    assert!(!f
        .input
        .apply_haptic_feedback(1, 0.5, xr::Duration::from_nanos(20_000_000)));
    assert!(!f
        .input
        .apply_haptic_feedback(7, 0.5, xr::Duration::from_nanos(20_000_000)));

    let events = f.runtime.haptic_events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].action, f.action("haptic"));
    assert_eq!(events[0].hand, Some(RightHand));
    assert_eq!(events[0].amplitude, 1.0);
    assert_eq!(events[0].duration, 20_000_000);
    assert_eq!(events[0].frequency, 0.0);
}

#[test]
fn tracked_hand_stands_in_for_missing_controller() {
    let runtime = fakexr::Runtime::new("Test System");
    runtime.set_hand_tracking_support(true, false);
    let mut f = Fixture::with_runtime(runtime, false);
    f.runtime.set_hand_joints(RightHand, Some(open_hand(0.0).joints));
    f.update();

    let right = f.controller(0);
    assert!(right.enabled);
    assert_eq!(
        right.capability_flags,
        CapabilityFlags::ORIENTATION | CapabilityFlags::POSITION
    );
    assert_eq!(right.button_count, 2);
    let trigger = right.button(Button::Trigger).unwrap();
    assert!(trigger.pressed);
    assert_eq!(trigger.value, 1.0);
    assert_eq!(right.pinch_factor, 1.0);
    assert!(right.button(Button::App).is_some());
    assert_eq!(f.events(0), [ControllerEvent::SelectStart]);
    // No joints for the left hand.
    assert!(!f.controller(1).enabled);

    // Hand interaction profiles have no controller model and go through the same path.
    f.bind(RightHand, "/interaction_profiles/ext/hand_interaction_ext");
    f.update();
    assert!(f.controller(0).enabled);
    assert!(!f.input.has_physical_controllers());

    // Without joints the profile's own buttons keep the hand going.
    f.frame.hand_tracking_enabled = false;
    f.update();
    let right = f.controller(0);
    assert!(right.enabled);
    assert!(right.button(Button::App).is_none());

    f.runtime.clear_interaction_profile(RightHand);
    f.input.interaction_profile_changed();
    f.update();
    assert!(!f.controller(0).enabled);

    let Fixture { runtime, input, .. } = f;
    assert_eq!(runtime.live_hand_tracker_count(), 2);
    drop(input);
    assert_eq!(runtime.live_hand_tracker_count(), 0);
    assert_eq!(runtime.destroyed_hand_tracker_count(), 2);
}

#[test]
fn hand_interaction_buttons_without_joints() {
    let mut f = Fixture::new();
    f.bind(RightHand, "/interaction_profiles/ext/hand_interaction_ext");
    f.set_state("button_trigger_value", RightHand, 1.0_f32);
    f.set_state("button_trigger_ready_ext", RightHand, true);
    f.update();

    let right = f.controller(0);
    assert!(right.enabled);
    assert!(right.button(Button::Trigger).unwrap().pressed);
    assert!(f.events(0).contains(&ControllerEvent::SelectStart));

    // A pinch that isn't ready doesn't count, whatever its value.
    f.set_state("button_trigger_ready_ext", RightHand, false);
    f.update();
    assert!(!f.controller(0).button(Button::Trigger).unwrap().pressed);
    assert!(f.events(0).contains(&ControllerEvent::SelectStop));

    f.bind(LeftHand, "/interaction_profiles/microsoft/hand_interaction");
    f.set_state("button_squeeze_value", LeftHand, 1.0_f32);
    f.update();
    let left = f.controller(1);
    assert!(left.enabled);
    assert!(left.button(Button::Squeeze).unwrap().pressed);
    assert!(f.events(1).contains(&ControllerEvent::SqueezeStart));
}

#[test]
fn tracked_hand_releases_controller_squeeze() {
    let runtime = fakexr::Runtime::new("Test System");
    runtime.set_hand_tracking_support(true, false);
    let mut f = Fixture::with_runtime(runtime, false);
    f.bind(RightHand, htc::VIVE_WAND.path);
    f.set_state("button_squeeze_click", RightHand, true);
    f.update();
    assert!(f.events(0).contains(&ControllerEvent::SqueezeStart));

    // The controller is put down and the tracked hand takes over.
    f.runtime.set_hand_joints(RightHand, Some(open_hand(0.0).joints));
    f.runtime.clear_interaction_profile(RightHand);
    f.input.interaction_profile_changed();
    f.update();
    assert!(f.controller(0).enabled);
    assert!(f.events(0).contains(&ControllerEvent::SqueezeStop));

    f.update();
    assert!(!f.events(0).contains(&ControllerEvent::SqueezeStop));
}

#[test]
fn failed_sync_disables_controllers() {
    let mut f = Fixture::new();
    f.bind(RightHand, htc::VIVE_WAND.path);
    f.bind(LeftHand, htc::VIVE_WAND.path);
    f.update();
    assert!(f.controller(0).enabled);
    assert!(f.controller(1).enabled);

    f.runtime.fail_sync(true);
    f.recorder.begin_frame();
    assert_eq!(
        f.input.update(&f.frame, &mut f.recorder),
        Err(xr::sys::Result::ERROR_SESSION_LOST)
    );
    assert!(!f.controller(0).enabled);
    assert!(!f.controller(1).enabled);

    f.runtime.fail_sync(false);
    f.update();
    assert!(f.controller(0).enabled);
}

#[test]
fn runtime_aim_state_is_used_when_supported() {
    let runtime = fakexr::Runtime::new("Test System");
    runtime.set_hand_tracking_support(true, true);
    let mut f = Fixture::with_runtime(runtime, false);
    let aim_position = Vec3::new(0.2, 1.2, -0.4);
    f.runtime.set_hand_joints(LeftHand, Some(open_hand(0.08).joints));
    f.runtime.set_aim_state(
        LeftHand,
        Some(fakexr::AimState {
            status: xr::sys::HandTrackingAimFlagsFB::VALID
                | xr::sys::HandTrackingAimFlagsFB::INDEX_PINCHING,
            aim_pose: mat4_to_pose(Mat4::from_translation(aim_position)),
            pinch_strength_index: 0.95,
        }),
    );
    f.update();

    let left = f.controller(1);
    assert!(left.enabled);
    assert!(left
        .transform
        .transform_point3(Vec3::ZERO)
        .abs_diff_eq(aim_position, 1e-6));
    assert!(left.button(Button::Trigger).unwrap().pressed);
    assert_eq!(left.pinch_factor, 0.95);

    // Without a valid aim the hand can't point.
    f.runtime.set_aim_state(LeftHand, None);
    f.update();
    assert!(!f.controller(1).enabled);
}

#[test]
fn eye_gaze_takes_over_first_pointer() {
    let mut f = Fixture::with_runtime(fakexr::Runtime::new("Test System"), true);
    f.verify_bindings(
        super::EYE_GAZE_PROFILE,
        "user_intent",
        &["/user/eyes_ext/input/gaze_ext/pose"],
    );
    f.bind(RightHand, simple_controller::KHR_SIMPLE.path);
    f.runtime.set_aim(RightHand, pose(Vec3::new(0.1, 1.0, -0.3)));
    f.runtime.set_gaze(Some(pose(Vec3::ZERO)));
    f.frame.head = Mat4::from_translation(Vec3::new(0.0, 1.6, 0.0));
    f.frame.pointer_mode = PointerMode::TrackedEye;
    f.update();

    let right = f.controller(0);
    assert!(right.enabled);
    assert_eq!(right.target_ray_mode, Some(TargetRayMode::Gaze));
    assert!(right
        .transform
        .transform_point3(Vec3::ZERO)
        .abs_diff_eq(Vec3::new(0.0, 1.6, 0.0), 1e-5));
    // Buttons are still read from the controller.
    assert_eq!(right.button_count, 5);

    f.runtime.set_gaze(None);
    f.update();
    let right = f.controller(0);
    assert_eq!(right.target_ray_mode, Some(TargetRayMode::TrackedPointer));
    assert!(right
        .transform
        .transform_point3(Vec3::ZERO)
        .abs_diff_eq(Vec3::new(0.1, 1.0, -0.3), 1e-5));
}

#[test]
fn eye_gaze_ignored_in_tracked_pointer_mode() {
    let mut f = Fixture::with_runtime(fakexr::Runtime::new("Test System"), true);
    f.bind(RightHand, simple_controller::KHR_SIMPLE.path);
    f.runtime.set_gaze(Some(pose(Vec3::ZERO)));
    f.update();
    assert_eq!(
        f.controller(0).target_ray_mode,
        Some(TargetRayMode::TrackedPointer)
    );
}

#[test]
fn failed_action_creation_is_an_init_error() {
    let runtime = Rc::new(fakexr::Runtime::new("Test System"));
    runtime.fail_action_creation(true);
    let mut recorder = ReportRecorder::new();

    let result = Input::new(runtime.clone(), &InputConfig::default(), false, &mut recorder);
    assert!(matches!(
        result,
        Err(InitError::ActionCreationFailed { .. })
    ));
    let result = LegacyInput::new(runtime.clone(), &InputConfig::default(), &mut recorder);
    assert!(matches!(
        result,
        Err(InitError::ActionCreationFailed { .. })
    ));

    // Nothing is left behind.
    assert_eq!(runtime.live_action_set_count(), 0);
    assert_eq!(recorder.controller_count(), 0);
}

#[test]
fn malformed_path_is_an_init_error() {
    let runtime = Rc::new(fakexr::Runtime::new("Test System"));
    let result = crate::runtime::init_path(&*runtime, "user/hand/left/");
    assert!(matches!(
        result,
        Err(InitError::PathConversionFailed { ref path, .. }) if path == "user/hand/left/"
    ));
}

struct LegacyFixture {
    runtime: Rc<fakexr::Runtime>,
    input: LegacyInput<fakexr::Runtime>,
    recorder: ReportRecorder,
    frame: FrameState,
}

impl LegacyFixture {
    fn new() -> Self {
        crate::init_logging();
        let runtime = Rc::new(fakexr::Runtime::new("Test System"));
        let mut recorder = ReportRecorder::new();
        let input =
            LegacyInput::new(runtime.clone(), &InputConfig::default(), &mut recorder).unwrap();
        let frame = frame(&runtime);
        Self {
            runtime,
            input,
            recorder,
            frame,
        }
    }

    fn set_state(&self, name: &str, hand: fakexr::UserPath, state: impl Into<fakexr::ActionState>) {
        let action = self.runtime.find_action(name).unwrap();
        self.runtime.set_action_state(action, state.into(), hand);
    }

    fn update(&mut self) {
        self.recorder.begin_frame();
        self.input.update(&self.frame, &mut self.recorder).unwrap();
    }
}

#[test]
fn legacy_reports_fixed_controller() {
    let mut f = LegacyFixture::new();
    for index in [0, 1] {
        let report = f.recorder.controller(index).unwrap();
        assert_eq!(report.model, Some("vr_controller_vive.obj"));
        assert_eq!(report.input_profiles, htc::VIVE_WAND.input_profiles);
        assert_eq!(report.haptic_count, 1);
        assert!(!report.enabled);
    }

    let trigger = f.runtime.find_action("trigger").unwrap();
    let mut bindings =
        f.runtime
            .get_suggested_bindings(trigger, simple_controller::KHR_SIMPLE.path);
    bindings.sort();
    assert_eq!(
        bindings,
        [
            "/user/hand/left/input/select/click",
            "/user/hand/right/input/select/click"
        ]
    );
    assert!(f.runtime.has_suggested_bindings(trigger, htc::VIVE_WAND.path));

    f.runtime.set_interaction_profile(RightHand, htc::VIVE_WAND.path);
    f.set_state("trigger", RightHand, 0.93_f32);
    f.update();

    let right = f.recorder.controller(0).unwrap();
    assert!(right.enabled);
    assert_eq!(right.button_count, 5);
    let trigger = right.button(Button::Trigger).unwrap();
    assert!(!trigger.pressed);
    assert_eq!(trigger.value, 0.93);
    assert_eq!(right.button(Button::App).unwrap().immersive_index, None);
    assert_eq!(right.placeholders().count(), 1);
    // The left hand has no profile, so nothing to locate.
    assert!(!f.recorder.controller(1).unwrap().enabled);

    // Legacy clicks need a firmer press.
    f.set_state("trigger", RightHand, 0.96_f32);
    f.set_state("squeeze", RightHand, 1.0_f32);
    f.update();
    let right = f.recorder.controller(0).unwrap();
    assert!(right.button(Button::Trigger).unwrap().pressed);
    assert!(right.button(Button::Squeeze).unwrap().pressed);
    let events: Vec<_> = f.recorder.events_for(0).collect();
    assert!(events.contains(&ControllerEvent::SelectStart));
    assert!(events.contains(&ControllerEvent::SqueezeStart));

    f.set_state("trackpad", RightHand, fakexr::ActionState::Vector2(-0.5, 0.5));
    f.set_state("trackpad_touch", RightHand, true);
    f.update();
    let right = f.recorder.controller(0).unwrap();
    assert_eq!(right.axes, [-0.5, -0.5, 0.0, 0.0]);
    assert_eq!(right.touch_position, Some(Vec2::new(-0.5, -0.5)));
}

#[test]
fn legacy_failed_sync_disables_controllers() {
    let mut f = LegacyFixture::new();
    f.runtime.set_interaction_profile(RightHand, htc::VIVE_WAND.path);
    f.update();
    assert!(f.recorder.controller(0).unwrap().enabled);

    f.runtime.fail_sync(true);
    f.recorder.begin_frame();
    assert!(f.input.update(&f.frame, &mut f.recorder).is_err());
    assert!(!f.recorder.controller(0).unwrap().enabled);
    assert!(!f.recorder.controller(1).unwrap().enabled);
}

#[test]
fn legacy_haptics() {
    let f = LegacyFixture::new();
    assert!(f
        .input
        .apply_haptic_feedback(1, 0.25, xr::Duration::from_nanos(1_000)));
    assert!(!f
        .input
        .apply_haptic_feedback(2, 0.25, xr::Duration::from_nanos(1_000)));

    let events = f.runtime.haptic_events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].hand, Some(LeftHand));
    assert_eq!(events[0].amplitude, 0.25);
}
