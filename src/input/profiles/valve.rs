use super::{
    AxisDescriptor, AxisType, ButtonDescriptor, ButtonFlags, ButtonType, HandScope,
    HapticDescriptor, ProfileDescriptor, PATH_BUTTON_A, PATH_BUTTON_B, PATH_HAPTIC,
    PATH_SQUEEZE, PATH_THUMBSTICK, PATH_TRACKPAD, PATH_TRIGGER,
};
use crate::delegate::{DeviceType, DoF};

/// Index "knuckles" controllers. The trackpad has force sensing instead of a click.
pub static INDEX: ProfileDescriptor = ProfileDescriptor {
    path: "/interaction_profiles/valve/index_controller",
    system_filter: None,
    dof: DoF::Six,
    left_model: Some("vr_controller_index_left.obj"),
    right_model: Some("vr_controller_index_right.obj"),
    device_type: DeviceType::ValveIndex,
    input_profiles: &["valve-index", "generic-trigger-squeeze-touchpad-thumbstick"],
    buttons: &[
        ButtonDescriptor::new(ButtonType::Trigger, PATH_TRIGGER, ButtonFlags::ALL, HandScope::BOTH),
        ButtonDescriptor::new(
            ButtonType::Squeeze,
            PATH_SQUEEZE,
            ButtonFlags::VALUE,
            HandScope::BOTH,
        ),
        ButtonDescriptor::new(
            ButtonType::Trackpad,
            PATH_TRACKPAD,
            ButtonFlags::TOUCH,
            HandScope::BOTH,
        ),
        ButtonDescriptor::new(
            ButtonType::Thumbstick,
            PATH_THUMBSTICK,
            ButtonFlags::CLICK_TOUCH,
            HandScope::BOTH,
        ),
        ButtonDescriptor::new(
            ButtonType::A,
            PATH_BUTTON_A,
            ButtonFlags::CLICK_TOUCH,
            HandScope::BOTH,
        ),
        ButtonDescriptor::new(
            ButtonType::B,
            PATH_BUTTON_B,
            ButtonFlags::CLICK_TOUCH,
            HandScope::BOTH,
        ),
    ],
    axes: &[
        AxisDescriptor::new(AxisType::Trackpad, PATH_TRACKPAD, HandScope::BOTH),
        AxisDescriptor::new(AxisType::Thumbstick, PATH_THUMBSTICK, HandScope::BOTH),
    ],
    haptics: &[HapticDescriptor {
        path: PATH_HAPTIC,
        hand: HandScope::BOTH,
    }],
};
