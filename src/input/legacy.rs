//! Input for platforms exposing a single fixed controller. Actions are created directly, one per
//! control, and bound to that controller's profile plus the simple controller fallback.

use super::action_set::ActionSet;
use super::input_source::{immersive_edge, report_select, report_squeeze, PoseSpaces};
use super::profiles::htc::VIVE_WAND;
use super::profiles::ButtonType;
use super::state::{resolve_button_state, AxesFrame, ButtonSample, ButtonState, EdgeTrigger};
use super::FrameState;
use crate::config::InputConfig;
use crate::delegate::{
    immersive, Button, ButtonReport, ControllerDelegate, TargetRayMode,
};
use crate::runtime::{
    init_path, ActionHandle, ActionSetHandle, Hand, InitError, Runtime, SuggestedBinding,
    Vibration,
};
use log::{debug, info, trace, warn};
use openxr as xr;
use std::rc::Rc;

const LEGACY_SIMPLE_PROFILE: &str = "/interaction_profiles/khr/simple_controller";

macro_rules! legacy_actions_and_bindings {
    ($($field:ident: $ty:ident),+$(,)?) => {
        struct LegacyActions {
            $($field: ActionHandle),+
        }

        impl LegacyActions {
            fn new<R: Runtime>(
                runtime: &R,
                set: ActionSetHandle,
                subaction_paths: &[xr::Path],
            ) -> Result<Self, InitError> {
                Ok(Self {
                    $($field: create_action(
                        runtime,
                        set,
                        xr::sys::ActionType::$ty,
                        stringify!($field),
                        subaction_paths,
                    )?),+
                })
            }
        }

        /// Binding paths relative to a hand's user path.
        #[derive(Default)]
        struct LegacyBindings {
            $($field: &'static [&'static str]),+
        }

        impl LegacyBindings {
            fn binding_iter<'a>(
                &'a self,
                actions: &'a LegacyActions,
            ) -> impl Iterator<Item = (ActionHandle, &'static str)> + 'a {
                std::iter::empty()
                $(
                    .chain(self.$field.iter().map(|path| (actions.$field, *path)))
                )+
            }
        }
    }
}

legacy_actions_and_bindings! {
    grip_pose: POSE_INPUT,
    aim_pose: POSE_INPUT,
    trigger: FLOAT_INPUT,
    squeeze: FLOAT_INPUT,
    menu: BOOLEAN_INPUT,
    trackpad: VECTOR2F_INPUT,
    trackpad_click: BOOLEAN_INPUT,
    trackpad_touch: BOOLEAN_INPUT,
    haptic: VIBRATION_OUTPUT,
}

fn create_action<R: Runtime>(
    runtime: &R,
    set: ActionSetHandle,
    ty: xr::sys::ActionType,
    name: &str,
    subaction_paths: &[xr::Path],
) -> Result<ActionHandle, InitError> {
    runtime
        .create_action(set, ty, name, subaction_paths)
        .map_err(|result| InitError::ActionCreationFailed {
            name: name.to_owned(),
            result,
        })
}

fn hardware_bindings() -> LegacyBindings {
    LegacyBindings {
        grip_pose: &["input/grip/pose"],
        aim_pose: &["input/aim/pose"],
        trigger: &["input/trigger/value"],
        squeeze: &["input/squeeze/click"],
        menu: &["input/menu/click"],
        trackpad: &["input/trackpad"],
        trackpad_click: &["input/trackpad/click"],
        trackpad_touch: &["input/trackpad/touch"],
        haptic: &["output/haptic"],
    }
}

fn simple_bindings() -> LegacyBindings {
    LegacyBindings {
        grip_pose: &["input/grip/pose"],
        aim_pose: &["input/aim/pose"],
        trigger: &["input/select/click"],
        menu: &["input/menu/click"],
        haptic: &["output/haptic"],
        ..Default::default()
    }
}

struct LegacyHand<R: Runtime> {
    hand: Hand,
    index: usize,
    subaction_path: xr::Path,
    spaces: PoseSpaces<R>,
    select: EdgeTrigger,
    squeeze: EdgeTrigger,
}

pub struct LegacyInput<R: Runtime> {
    runtime: Rc<R>,
    hands: Vec<LegacyHand<R>>,
    actions: LegacyActions,
    click_threshold: f32,
    average_height: f32,
    // Dropped last, taking its actions with it.
    action_set: ActionSet<R>,
}

impl<R: Runtime> LegacyInput<R> {
    pub fn new(
        runtime: Rc<R>,
        config: &InputConfig,
        delegate: &mut impl ControllerDelegate,
    ) -> Result<Self, InitError> {
        debug!("creating legacy actions");
        let action_set = ActionSet::new(runtime.clone(), "xrcontroller_legacy")?;
        let subaction_paths = [
            action_set.subaction_path(Hand::Left),
            action_set.subaction_path(Hand::Right),
        ];
        let actions = LegacyActions::new(&*runtime, action_set.handle(), &subaction_paths)?;

        for (profile, bindings) in [
            (LEGACY_SIMPLE_PROFILE, simple_bindings()),
            (VIVE_WAND.path, hardware_bindings()),
        ] {
            let mut suggested = Vec::new();
            for hand in Hand::ALL {
                for (action, path) in bindings.binding_iter(&actions) {
                    suggested.push(SuggestedBinding {
                        action,
                        binding: init_path(&*runtime, &format!("{}/{path}", hand.user_path()))?,
                    });
                }
            }
            let profile_path = init_path(&*runtime, profile)?;
            if let Err(e) = runtime.suggest_bindings(profile_path, &suggested) {
                warn!("failed to suggest legacy bindings for {profile}: {e}");
            }
        }

        runtime
            .attach_action_sets(&[action_set.handle()])
            .map_err(InitError::AttachFailed)?;

        let hands = [Hand::Right, Hand::Left]
            .into_iter()
            .enumerate()
            .map(|(index, hand)| {
                let subaction_path = action_set.subaction_path(hand);
                let name = format!("{} legacy controller", hand.name());
                delegate.create_controller(index, index, &name);
                delegate.set_left_handed(index, hand == Hand::Left);
                delegate.set_target_ray_mode(index, TargetRayMode::TrackedPointer);
                delegate.set_controller_model(index, VIVE_WAND.model(hand));
                delegate.set_device_type(index, VIVE_WAND.device_type);
                delegate.set_input_profiles(index, VIVE_WAND.input_profiles);
                delegate.set_haptic_count(index, 1);
                delegate.set_enabled(index, false);
                LegacyHand {
                    hand,
                    index,
                    subaction_path,
                    spaces: PoseSpaces::new(
                        runtime.clone(),
                        hand,
                        subaction_path,
                        actions.grip_pose,
                        actions.aim_pose,
                    ),
                    select: EdgeTrigger::default(),
                    squeeze: EdgeTrigger::default(),
                }
            })
            .collect();

        info!("legacy input ready");
        Ok(Self {
            runtime,
            hands,
            actions,
            click_threshold: config.legacy_click_threshold,
            average_height: config.average_height,
            action_set,
        })
    }

    pub fn update(
        &mut self,
        frame: &FrameState,
        delegate: &mut impl ControllerDelegate,
    ) -> xr::Result<()> {
        crate::tracy_span!("LegacyInput::update");
        if let Err(e) = self.runtime.sync_actions(self.action_set.handle()) {
            warn!("failed to sync legacy actions: {e}");
            for hand in &self.hands {
                delegate.set_enabled(hand.index, false);
            }
            return Err(e);
        }

        for hand in &mut self.hands {
            let Some(pose) = hand.spaces.locate(frame, self.average_height) else {
                delegate.set_enabled(hand.index, false);
                continue;
            };
            delegate.set_capability_flags(hand.index, pose.flags);
            delegate.set_transform(hand.index, pose.transform);
            delegate.set_immersive_beam_transform(hand.index, pose.beam);

            let read_float = |action| {
                self.runtime
                    .float_state(action, hand.subaction_path)
                    .inspect_err(|e| trace!("legacy float read failed: {e}"))
                    .ok()
                    .map(|s| s.current_state)
            };
            let read_bool = |action| {
                self.runtime
                    .bool_state(action, hand.subaction_path)
                    .inspect_err(|e| trace!("legacy bool read failed: {e}"))
                    .ok()
                    .map(|s| s.current_state)
            };

            let trigger = resolve_button_state(
                ButtonSample {
                    value: read_float(self.actions.trigger),
                    ..Default::default()
                },
                self.click_threshold,
            );
            let squeeze = resolve_button_state(
                ButtonSample {
                    value: read_float(self.actions.squeeze),
                    ..Default::default()
                },
                self.click_threshold,
            );
            let trackpad = resolve_button_state(
                ButtonSample {
                    click: read_bool(self.actions.trackpad_click),
                    touch: read_bool(self.actions.trackpad_touch),
                    ..Default::default()
                },
                self.click_threshold,
            );
            let menu = resolve_button_state(
                ButtonSample {
                    click: read_bool(self.actions.menu),
                    ..Default::default()
                },
                self.click_threshold,
            );

            let mut count = 0;
            let mut report = |button, immersive_index, state: Option<ButtonState>| {
                if let Some(state) = state {
                    delegate.set_button_state(
                        hand.index,
                        ButtonReport {
                            button,
                            immersive_index,
                            pressed: state.clicked,
                            touched: state.touched,
                            value: state.value,
                            present: true,
                        },
                    );
                    count += 1;
                }
            };
            report(Button::Trigger, Some(immersive::TRIGGER), trigger);
            report(Button::Squeeze, Some(immersive::SQUEEZE), squeeze);
            report(Button::Touchpad, Some(immersive::TOUCHPAD), trackpad);
            report(Button::App, None, menu);

            // The wand has no thumbstick, keep its slot.
            let thumbstick = ButtonType::Thumbstick;
            delegate.set_button_state(
                hand.index,
                ButtonReport::placeholder(
                    thumbstick.default_output(),
                    thumbstick.immersive_index(),
                ),
            );
            count += 1;
            delegate.set_button_count(hand.index, count);

            let edge = immersive_edge(
                &mut hand.select,
                trigger.is_some_and(|s| s.clicked),
                frame.render_mode,
            );
            report_select(delegate, hand.index, edge);
            let edge = immersive_edge(
                &mut hand.squeeze,
                squeeze.is_some_and(|s| s.clicked),
                frame.render_mode,
            );
            report_squeeze(delegate, hand.index, edge);

            let mut axes = AxesFrame::default();
            match self.runtime.vector2_state(self.actions.trackpad, hand.subaction_path) {
                Ok(state) => {
                    let value = state.current_state;
                    axes.set_pair(immersive::AXIS_TOUCHPAD_X, value.x, -value.y);
                    match trackpad {
                        Some(s) if s.touched && !s.clicked => {
                            delegate.set_touch_position(hand.index, value.x, -value.y)
                        }
                        _ => delegate.end_touch(hand.index),
                    }
                }
                Err(e) => trace!("legacy trackpad read failed: {e}"),
            }
            delegate.set_axes(hand.index, axes.as_slice());
            delegate.set_enabled(hand.index, true);
        }
        Ok(())
    }

    pub fn apply_haptic_feedback(
        &self,
        index: usize,
        amplitude: f32,
        duration: xr::Duration,
    ) -> bool {
        let Some(hand) = self.hands.iter().find(|h| h.index == index) else {
            debug!("haptic feedback for unknown legacy controller {index}");
            return false;
        };
        let vibration = Vibration {
            amplitude: amplitude.clamp(0.0, 1.0),
            duration,
            frequency: 0.0,
        };
        match self
            .runtime
            .apply_haptic(self.actions.haptic, hand.subaction_path, vibration)
        {
            Ok(()) => true,
            Err(e) => {
                warn!("failed to apply {} legacy haptic feedback: {e}", hand.hand.name());
                false
            }
        }
    }
}
