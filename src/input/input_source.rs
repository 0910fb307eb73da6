//! One hand's poll, translate and report cycle.

use super::action_set::{ActionSet, ButtonActions, ButtonComponent};
use super::elbow;
use super::gesture::create_gesture_manager;
use super::hand_tracking::HandTracking;
use super::profiles::{
    profile_from_path, AxisType, ButtonDescriptor, ButtonType, HandScope, ProfileDescriptor,
    PATH_AIM_POSE, PATH_GRIP_POSE,
};
use super::state::{resolve_button_state, AxesFrame, ButtonSample, ButtonState, Edge, EdgeTrigger};
use super::{FrameState, SuggestionMap};
use crate::config::InputConfig;
use crate::convert::pose_to_mat4;
use crate::delegate::{
    immersive, Button, ButtonReport, CapabilityFlags, ControllerDelegate, DeviceType, RenderMode,
};
use crate::runtime::{
    init_path, ActionHandle, Hand, InitError, Runtime, SpaceHandle, SuggestedBinding, Vibration,
};
use glam::{Mat4, Vec3};
use log::{debug, info, trace, warn};
use openxr as xr;
use std::collections::HashMap;
use std::rc::Rc;

/// XR_FREQUENCY_UNSPECIFIED
const FREQUENCY_UNSPECIFIED: f32 = 0.0;

/// Grip and aim spaces of one hand, created on first use and destroyed with their owner.
pub(super) struct PoseSpaces<R: Runtime> {
    runtime: Rc<R>,
    hand: Hand,
    subaction_path: xr::Path,
    grip_action: ActionHandle,
    aim_action: ActionHandle,
    /// (grip, aim)
    spaces: Option<(SpaceHandle, SpaceHandle)>,
    creation_failed: bool,
}

/// Where a controller is this frame.
#[derive(Copy, Clone, Debug, PartialEq)]
pub(super) struct ControllerPose {
    pub flags: CapabilityFlags,
    pub transform: Mat4,
    pub beam: Mat4,
}

impl<R: Runtime> PoseSpaces<R> {
    pub fn new(
        runtime: Rc<R>,
        hand: Hand,
        subaction_path: xr::Path,
        grip_action: ActionHandle,
        aim_action: ActionHandle,
    ) -> Self {
        Self {
            runtime,
            hand,
            subaction_path,
            grip_action,
            aim_action,
            spaces: None,
            creation_failed: false,
        }
    }

    fn get(&mut self) -> Option<(SpaceHandle, SpaceHandle)> {
        if self.spaces.is_some() {
            return self.spaces;
        }

        let grip = self
            .runtime
            .create_action_space(self.grip_action, self.subaction_path);
        let aim = self
            .runtime
            .create_action_space(self.aim_action, self.subaction_path);
        match (grip, aim) {
            (Ok(grip), Ok(aim)) => {
                debug!("created {} hand pose spaces", self.hand.name());
                self.spaces = Some((grip, aim));
            }
            (grip, aim) => {
                for space in [grip.as_ref().ok(), aim.as_ref().ok()].into_iter().flatten() {
                    self.runtime.destroy_space(*space);
                }
                if !self.creation_failed {
                    let err = grip.err().or(aim.err());
                    warn!(
                        "failed to create {} hand pose spaces: {err:?}",
                        self.hand.name()
                    );
                    self.creation_failed = true;
                }
            }
        }
        self.spaces
    }

    /// Locates the controller, falling back to the arm model when only its orientation is
    /// known. `None` if even the orientation is unavailable.
    pub fn locate(
        &mut self,
        frame: &FrameState,
        average_height: f32,
    ) -> Option<ControllerPose> {
        let (grip, aim) = self.get()?;

        let location = self
            .runtime
            .locate_space(aim, frame.base_space, frame.time)
            .inspect_err(|e| trace!("failed to locate {} aim: {e}", self.hand.name()))
            .ok()?;
        if !location
            .location_flags
            .contains(xr::SpaceLocationFlags::ORIENTATION_VALID)
        {
            return None;
        }

        let standing = |m: Mat4| match frame.render_mode {
            RenderMode::StandAlone => {
                Mat4::from_translation(Vec3::new(0.0, average_height, 0.0)) * m
            }
            RenderMode::Immersive => m,
        };

        let mut flags = CapabilityFlags::ORIENTATION;
        let mut transform = pose_to_mat4(location.pose);
        if location
            .location_flags
            .contains(xr::SpaceLocationFlags::POSITION_VALID)
        {
            flags |= CapabilityFlags::POSITION;
            transform = standing(transform);
        } else {
            flags |= CapabilityFlags::POSITION_EMULATED;
            transform = elbow::controller_transform(self.hand, &frame.head, &transform);
        }

        let mut beam = transform;
        if self
            .runtime
            .pose_active(self.grip_action, self.subaction_path)
            .unwrap_or(false)
        {
            match self.runtime.locate_space(grip, frame.base_space, frame.time) {
                Ok(grip)
                    if grip.location_flags.contains(
                        xr::SpaceLocationFlags::POSITION_VALID
                            | xr::SpaceLocationFlags::ORIENTATION_VALID,
                    ) =>
                {
                    flags |= CapabilityFlags::GRIP_SPACE_POSITION;
                    beam = standing(pose_to_mat4(grip.pose));
                }
                Ok(_) => {}
                Err(e) => trace!("failed to locate {} grip: {e}", self.hand.name()),
            }
        }

        Some(ControllerPose {
            flags,
            transform,
            beam,
        })
    }
}

impl<R: Runtime> Drop for PoseSpaces<R> {
    fn drop(&mut self) {
        if let Some((grip, aim)) = self.spaces.take() {
            self.runtime.destroy_space(grip);
            self.runtime.destroy_space(aim);
        }
    }
}

/// Select/squeeze edges only exist while presenting.
pub(super) fn immersive_edge(
    trigger: &mut EdgeTrigger,
    pressed: bool,
    render_mode: RenderMode,
) -> Option<Edge> {
    if render_mode != RenderMode::Immersive {
        return None;
    }
    trigger.update(pressed)
}

pub(super) fn report_select(
    delegate: &mut impl ControllerDelegate,
    index: usize,
    edge: Option<Edge>,
) {
    match edge {
        Some(Edge::Start) => delegate.set_select_action_start(index),
        Some(Edge::Stop) => delegate.set_select_action_stop(index),
        None => {}
    }
}

pub(super) fn report_squeeze(
    delegate: &mut impl ControllerDelegate,
    index: usize,
    edge: Option<Edge>,
) {
    match edge {
        Some(Edge::Start) => delegate.set_squeeze_action_start(index),
        Some(Edge::Stop) => delegate.set_squeeze_action_stop(index),
        None => {}
    }
}

#[derive(Clone, Debug)]
pub enum ProfileBinding {
    /// The runtime hasn't bound anything to this hand.
    Unbound,
    /// Bound to a profile missing from the table. The hand stays disabled.
    Unrecognized(String),
    Active(&'static ProfileDescriptor),
}

pub struct InputSource<R: Runtime> {
    runtime: Rc<R>,
    hand: Hand,
    index: usize,
    subaction_path: xr::Path,
    grip_action: ActionHandle,
    aim_action: ActionHandle,
    haptic_action: ActionHandle,
    spaces: PoseSpaces<R>,
    profiles: Vec<&'static ProfileDescriptor>,
    button_actions: HashMap<(ButtonType, HandScope), ButtonActions>,
    axis_actions: HashMap<(AxisType, HandScope), ActionHandle>,
    binding: ProfileBinding,
    select: EdgeTrigger,
    squeeze: EdgeTrigger,
    hand_tracking: Option<HandTracking<R>>,
    click_threshold: f32,
    average_height: f32,
}

impl<R: Runtime> InputSource<R> {
    pub fn new(
        runtime: Rc<R>,
        action_set: &mut ActionSet<R>,
        hand: Hand,
        index: usize,
        profiles: Vec<&'static ProfileDescriptor>,
        config: &InputConfig,
    ) -> Result<Self, InitError> {
        let grip_action = action_set.get_or_create_action(
            xr::sys::ActionType::POSE_INPUT,
            "grip",
            HandScope::BOTH,
        )?;
        let aim_action = action_set.get_or_create_action(
            xr::sys::ActionType::POSE_INPUT,
            "aim",
            HandScope::BOTH,
        )?;
        let haptic_action = action_set.get_or_create_action(
            xr::sys::ActionType::VIBRATION_OUTPUT,
            "haptic",
            HandScope::BOTH,
        )?;

        let mut button_actions: HashMap<_, ButtonActions> = HashMap::new();
        let mut axis_actions = HashMap::new();
        for profile in &profiles {
            for button in profile.buttons_for(hand) {
                let actions =
                    action_set.get_or_create_button_actions(button.ty, button.flags, button.hand)?;
                button_actions
                    .entry((button.ty, button.hand))
                    .or_default()
                    .merge(actions);
            }
            for axis in profile.axes_for(hand) {
                let action = action_set.get_or_create_axis_action(axis.ty, axis.hand)?;
                axis_actions.insert((axis.ty, axis.hand), action);
            }
        }

        let hand_tracking = create_gesture_manager(runtime.hand_tracking_support(), config)
            .map(|gestures| HandTracking::new(runtime.clone(), hand, gestures));

        let subaction_path = action_set.subaction_path(hand);
        Ok(Self {
            spaces: PoseSpaces::new(runtime.clone(), hand, subaction_path, grip_action, aim_action),
            runtime,
            hand,
            index,
            subaction_path,
            grip_action,
            aim_action,
            haptic_action,
            profiles,
            button_actions,
            axis_actions,
            binding: ProfileBinding::Unbound,
            select: EdgeTrigger::default(),
            squeeze: EdgeTrigger::default(),
            hand_tracking,
            click_threshold: config.click_threshold,
            average_height: config.average_height,
        })
    }

    #[inline]
    pub fn hand(&self) -> Hand {
        self.hand
    }

    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn binding(&self) -> &ProfileBinding {
        &self.binding
    }

    pub fn active_profile(&self) -> Option<&'static ProfileDescriptor> {
        match self.binding {
            ProfileBinding::Active(profile) => Some(profile),
            _ => None,
        }
    }

    pub fn controller_model_name(&self) -> Option<&'static str> {
        self.active_profile()?.model(self.hand)
    }

    /// Whether a real controller (as opposed to a tracked hand) is bound.
    pub fn has_physical_controller(&self) -> bool {
        self.controller_model_name().is_some()
    }

    /// Adds this hand's bindings for every known profile.
    pub fn suggest_bindings(&self, suggestions: &mut SuggestionMap) -> Result<(), InitError> {
        let user_path = self.hand.user_path();
        let path = |sub: &str| init_path(&*self.runtime, &format!("{user_path}/{sub}"));

        for profile in &self.profiles {
            let bindings = suggestions.entry(profile.path).or_default();
            let mut push = |action, binding| bindings.push(SuggestedBinding { action, binding });

            push(self.grip_action, path(PATH_GRIP_POSE)?);
            push(self.aim_action, path(PATH_AIM_POSE)?);

            for button in profile.buttons_for(self.hand) {
                let Some(actions) = self.button_actions.get(&(button.ty, button.hand)) else {
                    continue;
                };
                for component in ButtonComponent::ALL {
                    if !button.flags.contains(component.flag()) {
                        continue;
                    }
                    if let Some(action) = actions.get(component) {
                        push(
                            action,
                            path(&format!("{}/{}", button.path, component.path_suffix()))?,
                        );
                    }
                }
            }

            for axis in profile.axes_for(self.hand) {
                if let Some(action) = self.axis_actions.get(&(axis.ty, axis.hand)) {
                    push(*action, path(axis.path)?);
                }
            }

            for haptic in profile.haptics_for(self.hand) {
                push(self.haptic_action, path(haptic.path)?);
            }
        }
        Ok(())
    }

    /// Looks up which profile the runtime bound to this hand and tells the delegate about it.
    pub fn update_interaction_profile(&mut self, delegate: &mut impl ControllerDelegate) {
        self.binding = self.query_binding();
        match &self.binding {
            ProfileBinding::Active(profile) => {
                info!(
                    "{} hand bound to {} ({:?})",
                    self.hand.name(),
                    profile.path,
                    profile.device_type
                );
                delegate.set_controller_model(self.index, profile.model(self.hand));
                delegate.set_device_type(self.index, profile.device_type);
                delegate.set_input_profiles(self.index, profile.input_profiles);
                delegate.set_haptic_count(self.index, profile.haptics_for(self.hand).count());
            }
            ProfileBinding::Unrecognized(path) => {
                warn!(
                    "{} hand bound to unsupported interaction profile {path}",
                    self.hand.name()
                );
                self.report_unbound(delegate);
            }
            ProfileBinding::Unbound => {
                debug!("no interaction profile bound to {} hand", self.hand.name());
                self.report_unbound(delegate);
            }
        }
    }

    fn report_unbound(&self, delegate: &mut impl ControllerDelegate) {
        delegate.set_controller_model(self.index, None);
        delegate.set_device_type(self.index, DeviceType::Unknown);
        delegate.set_input_profiles(self.index, &[]);
        delegate.set_haptic_count(self.index, 0);
    }

    fn query_binding(&self) -> ProfileBinding {
        let path = match self.runtime.current_interaction_profile(self.subaction_path) {
            Ok(path) => path,
            Err(e) => {
                warn!(
                    "failed to get {} hand interaction profile: {e}",
                    self.hand.name()
                );
                return ProfileBinding::Unbound;
            }
        };
        if path == xr::Path::NULL {
            return ProfileBinding::Unbound;
        }

        let path = match self.runtime.path_to_string(path) {
            Ok(path) => path,
            Err(e) => {
                warn!("failed to convert interaction profile path: {e}");
                return ProfileBinding::Unbound;
            }
        };
        match profile_from_path(&self.profiles, &path) {
            Some(profile) => ProfileBinding::Active(profile),
            None => ProfileBinding::Unrecognized(path),
        }
    }

    /// Polls this hand and reports it. With `skip_pose` the transforms are left for the caller
    /// to report (eye gaze pointer).
    pub fn update(
        &mut self,
        frame: &FrameState,
        skip_pose: bool,
        delegate: &mut impl ControllerDelegate,
    ) {
        crate::tracy_span!("InputSource::update");
        let enabled = match self.active_profile() {
            Some(profile) if profile.model(self.hand).is_some() => {
                self.update_controller(profile, frame, skip_pose, delegate)
            }
            _ if matches!(self.binding, ProfileBinding::Unrecognized(_)) => false,
            // Hand interaction profiles: joints first, then their own buttons without them.
            Some(profile) => {
                self.update_hand(frame, skip_pose, delegate)
                    || (profile.buttons_for(self.hand).next().is_some()
                        && self.update_controller(profile, frame, skip_pose, delegate))
            }
            None => self.update_hand(frame, skip_pose, delegate),
        };
        delegate.set_enabled(self.index, enabled);
    }

    fn update_controller(
        &mut self,
        profile: &'static ProfileDescriptor,
        frame: &FrameState,
        skip_pose: bool,
        delegate: &mut impl ControllerDelegate,
    ) -> bool {
        let Some(pose) = self.spaces.locate(frame, self.average_height) else {
            return false;
        };
        delegate.set_capability_flags(self.index, pose.flags);
        if !skip_pose {
            delegate.set_transform(self.index, pose.transform);
            delegate.set_immersive_beam_transform(self.index, pose.beam);
        }

        let mut count = 0;
        let mut trackpad = None;
        for button in profile.buttons_for(self.hand) {
            let Some(state) = self.button_state(button) else {
                continue;
            };
            count += 1;

            delegate.set_button_state(
                self.index,
                ButtonReport {
                    button: button.output_button(),
                    immersive_index: if button.reserved {
                        None
                    } else {
                        button.ty.immersive_index()
                    },
                    pressed: state.clicked,
                    touched: state.touched,
                    value: state.value,
                    present: true,
                },
            );

            match button.ty {
                ButtonType::Trigger => {
                    let edge = immersive_edge(&mut self.select, state.clicked, frame.render_mode);
                    report_select(delegate, self.index, edge);
                }
                ButtonType::Squeeze => {
                    let edge = immersive_edge(&mut self.squeeze, state.clicked, frame.render_mode);
                    report_squeeze(delegate, self.index, edge);
                }
                ButtonType::Trackpad => trackpad = Some(state),
                _ => {}
            }
        }

        for ty in ButtonType::EXPECTED {
            if !profile.has_button(ty, self.hand) {
                delegate.set_button_state(
                    self.index,
                    ButtonReport::placeholder(ty.default_output(), ty.immersive_index()),
                );
                count += 1;
            }
        }
        delegate.set_button_count(self.index, count);

        let axes = self.read_axes(profile, trackpad, delegate);
        delegate.set_axes(self.index, axes.as_slice());
        true
    }

    fn button_state(&self, button: &ButtonDescriptor) -> Option<ButtonState> {
        let Some(actions) = self.button_actions.get(&(button.ty, button.hand)) else {
            crate::warn_once!("no actions for {:?} button", button.ty);
            return None;
        };

        let read_bool = |component: ButtonComponent| {
            let action = actions.get(component)?;
            if !button.flags.contains(component.flag()) {
                return None;
            }
            self.runtime
                .bool_state(action, self.subaction_path)
                .inspect_err(|e| {
                    trace!("failed to read {:?} {component:?}: {e}", button.ty)
                })
                .ok()
                .map(|s| s.current_state)
        };

        let value = actions
            .value
            .filter(|_| button.flags.contains(ButtonComponent::Value.flag()))
            .and_then(|action| {
                self.runtime
                    .float_state(action, self.subaction_path)
                    .inspect_err(|e| trace!("failed to read {:?} value: {e}", button.ty))
                    .ok()
            })
            .map(|s| s.current_state);

        let sample = ButtonSample {
            click: read_bool(ButtonComponent::Click),
            touch: read_bool(ButtonComponent::Touch),
            value,
            ready: read_bool(ButtonComponent::Ready),
        };
        let state = resolve_button_state(sample, self.click_threshold);
        if state.is_none() {
            crate::warn_once!(
                "could not read any component of {:?} on {}",
                button.ty,
                button.path
            );
        }
        state
    }

    fn read_axes(
        &self,
        profile: &'static ProfileDescriptor,
        trackpad: Option<ButtonState>,
        delegate: &mut impl ControllerDelegate,
    ) -> AxesFrame {
        let mut axes = AxesFrame::default();
        for axis in profile.axes_for(self.hand) {
            let Some(action) = self.axis_actions.get(&(axis.ty, axis.hand)) else {
                continue;
            };
            let value = match self.runtime.vector2_state(*action, self.subaction_path) {
                Ok(state) => state.current_state,
                Err(e) => {
                    crate::warn_once!("failed to read axis {}: {}", axis.path, e);
                    continue;
                }
            };

            // Up is positive for the runtime and negative for gamepads.
            match axis.ty {
                AxisType::Trackpad => {
                    axes.set_pair(immersive::AXIS_TOUCHPAD_X, value.x, -value.y);
                    match trackpad {
                        Some(state) if state.touched && !state.clicked => {
                            delegate.set_touch_position(self.index, value.x, -value.y)
                        }
                        _ => delegate.end_touch(self.index),
                    }
                }
                AxisType::Thumbstick => {
                    axes.set_pair(immersive::AXIS_THUMBSTICK_X, value.x, -value.y);
                    delegate.set_scrolled_delta(self.index, -value.x, value.y);
                }
            }
        }
        axes
    }

    fn update_hand(
        &mut self,
        frame: &FrameState,
        skip_pose: bool,
        delegate: &mut impl ControllerDelegate,
    ) -> bool {
        if !frame.hand_tracking_enabled {
            return false;
        }
        let Some(tracking) = self.hand_tracking.as_mut() else {
            return false;
        };
        let Some(hand) = tracking.update(frame.base_space, frame.time, &frame.head) else {
            return false;
        };

        let transform = match frame.render_mode {
            RenderMode::StandAlone => {
                Mat4::from_translation(Vec3::new(0.0, self.average_height, 0.0)) * hand.aim
            }
            RenderMode::Immersive => hand.aim,
        };
        delegate.set_capability_flags(
            self.index,
            CapabilityFlags::ORIENTATION | CapabilityFlags::POSITION,
        );
        if !skip_pose {
            delegate.set_transform(self.index, transform);
            delegate.set_immersive_beam_transform(self.index, transform);
        }

        let pinching = hand.pinch.pinching;
        delegate.set_button_state(
            self.index,
            ButtonReport {
                button: Button::Trigger,
                immersive_index: Some(immersive::TRIGGER),
                pressed: pinching,
                touched: pinching,
                value: hand.pinch.factor,
                present: true,
            },
        );
        delegate.set_button_state(
            self.index,
            ButtonReport {
                button: Button::App,
                immersive_index: None,
                pressed: hand.system_gesture,
                touched: hand.system_gesture,
                value: if hand.system_gesture { 1.0 } else { 0.0 },
                present: true,
            },
        );
        delegate.set_button_count(self.index, 2);
        delegate.set_pinch_factor(self.index, hand.pinch.factor);
        delegate.set_axes(self.index, AxesFrame::default().as_slice());

        let edge = immersive_edge(&mut self.select, pinching, frame.render_mode);
        report_select(delegate, self.index, edge);
        // Hands have no squeeze, release one held by a controller.
        let edge = immersive_edge(&mut self.squeeze, false, frame.render_mode);
        report_squeeze(delegate, self.index, edge);
        true
    }

    /// Returns whether the active profile has a haptic output for this hand to send it to.
    pub fn apply_haptic(&self, amplitude: f32, duration: xr::Duration) -> bool {
        let Some(profile) = self.active_profile() else {
            return false;
        };
        if profile.haptics_for(self.hand).next().is_none() {
            return false;
        }

        let vibration = Vibration {
            amplitude: amplitude.clamp(0.0, 1.0),
            duration,
            frequency: FREQUENCY_UNSPECIFIED,
        };
        match self
            .runtime
            .apply_haptic(self.haptic_action, self.subaction_path, vibration)
        {
            Ok(()) => true,
            Err(e) => {
                warn!("failed to apply {} haptic feedback: {e}", self.hand.name());
                false
            }
        }
    }
}
