use super::{
    AxisDescriptor, AxisType, ButtonDescriptor, ButtonFlags, ButtonType, HandScope,
    HapticDescriptor, ProfileDescriptor, PATH_BUTTON_A, PATH_BUTTON_B, PATH_BUTTON_X,
    PATH_BUTTON_Y, PATH_HAPTIC, PATH_MENU, PATH_SQUEEZE, PATH_THUMBREST, PATH_THUMBSTICK,
    PATH_TRACKPAD, PATH_TRIGGER,
};
use crate::delegate::{DeviceType, DoF};

const HAPTICS: &[HapticDescriptor] = &[HapticDescriptor {
    path: PATH_HAPTIC,
    hand: HandScope::BOTH,
}];

pub static VIVE_FOCUS3: ProfileDescriptor = ProfileDescriptor {
    path: "/interaction_profiles/htc/vive_focus3_controller",
    system_filter: None,
    dof: DoF::Six,
    left_model: Some("vr_controller_focus3_left.obj"),
    right_model: Some("vr_controller_focus3_right.obj"),
    device_type: DeviceType::ViveFocus3,
    input_profiles: &["htc-vive-focus-3", "generic-trigger-squeeze-thumbstick"],
    buttons: &[
        ButtonDescriptor::new(ButtonType::Trigger, PATH_TRIGGER, ButtonFlags::ALL, HandScope::BOTH),
        ButtonDescriptor::new(ButtonType::Squeeze, PATH_SQUEEZE, ButtonFlags::ALL, HandScope::BOTH),
        ButtonDescriptor::new(
            ButtonType::Thumbstick,
            PATH_THUMBSTICK,
            ButtonFlags::CLICK_TOUCH,
            HandScope::BOTH,
        ),
        ButtonDescriptor::new(
            ButtonType::Thumbrest,
            PATH_THUMBREST,
            ButtonFlags::TOUCH,
            HandScope::BOTH,
        ),
        ButtonDescriptor::new(ButtonType::X, PATH_BUTTON_X, ButtonFlags::CLICK, HandScope::LEFT),
        ButtonDescriptor::new(ButtonType::Y, PATH_BUTTON_Y, ButtonFlags::CLICK, HandScope::LEFT),
        ButtonDescriptor::new(ButtonType::A, PATH_BUTTON_A, ButtonFlags::CLICK, HandScope::RIGHT),
        ButtonDescriptor::new(ButtonType::B, PATH_BUTTON_B, ButtonFlags::CLICK, HandScope::RIGHT),
        ButtonDescriptor::app(ButtonType::Menu, PATH_MENU, ButtonFlags::CLICK, HandScope::LEFT),
    ],
    axes: &[AxisDescriptor::new(AxisType::Thumbstick, PATH_THUMBSTICK, HandScope::BOTH)],
    haptics: HAPTICS,
};

/// The original Vive wands.
pub static VIVE_WAND: ProfileDescriptor = ProfileDescriptor {
    path: "/interaction_profiles/htc/vive_controller",
    system_filter: None,
    dof: DoF::Six,
    left_model: Some("vr_controller_vive.obj"),
    right_model: Some("vr_controller_vive.obj"),
    device_type: DeviceType::Unknown,
    input_profiles: &["htc-vive", "generic-trigger-squeeze-touchpad"],
    buttons: &[
        ButtonDescriptor::new(
            ButtonType::Trigger,
            PATH_TRIGGER,
            ButtonFlags::CLICK_VALUE,
            HandScope::BOTH,
        ),
        ButtonDescriptor::new(
            ButtonType::Squeeze,
            PATH_SQUEEZE,
            ButtonFlags::CLICK,
            HandScope::BOTH,
        ),
        ButtonDescriptor::new(
            ButtonType::Trackpad,
            PATH_TRACKPAD,
            ButtonFlags::CLICK_TOUCH,
            HandScope::BOTH,
        ),
        ButtonDescriptor::app(ButtonType::Menu, PATH_MENU, ButtonFlags::CLICK, HandScope::BOTH),
    ],
    axes: &[AxisDescriptor::new(AxisType::Trackpad, PATH_TRACKPAD, HandScope::BOTH)],
    haptics: HAPTICS,
};
