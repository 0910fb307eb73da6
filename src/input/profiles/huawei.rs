use super::{
    AxisDescriptor, AxisType, ButtonDescriptor, ButtonFlags, ButtonType, HandScope,
    HapticDescriptor, ProfileDescriptor, PATH_BACK, PATH_BUTTON_A, PATH_BUTTON_B, PATH_BUTTON_X,
    PATH_BUTTON_Y, PATH_HAPTIC, PATH_MENU, PATH_THUMBSTICK, PATH_TRACKPAD, PATH_TRIGGER,
};
use crate::delegate::{DeviceType, DoF};

const SYSTEM: &str = "Haliday: G3HMD by Huawei";

const HAPTICS: &[HapticDescriptor] = &[HapticDescriptor {
    path: PATH_HAPTIC,
    hand: HandScope::BOTH,
}];

pub static HVR_6DOF: ProfileDescriptor = ProfileDescriptor {
    path: "/interaction_profiles/huawei/6dof_controller",
    system_filter: Some(SYSTEM),
    dof: DoF::Six,
    left_model: Some("hvr_6dof_left.obj"),
    right_model: Some("hvr_6dof_right.obj"),
    device_type: DeviceType::OculusQuest,
    input_profiles: &[
        "oculus-touch-v3",
        "oculus-touch-v2",
        "oculus-touch",
        "generic-trigger-squeeze-thumbstick",
    ],
    buttons: &[
        ButtonDescriptor::new(
            ButtonType::X,
            PATH_BUTTON_X,
            ButtonFlags::CLICK_TOUCH,
            HandScope::LEFT,
        ),
        ButtonDescriptor::new(
            ButtonType::Y,
            PATH_BUTTON_Y,
            ButtonFlags::CLICK_TOUCH,
            HandScope::LEFT,
        ),
        ButtonDescriptor::new(ButtonType::Menu, PATH_MENU, ButtonFlags::CLICK, HandScope::LEFT),
        ButtonDescriptor::new(
            ButtonType::A,
            PATH_BUTTON_A,
            ButtonFlags::CLICK_TOUCH,
            HandScope::RIGHT,
        ),
        ButtonDescriptor::new(
            ButtonType::B,
            PATH_BUTTON_B,
            ButtonFlags::CLICK_TOUCH,
            HandScope::RIGHT,
        ),
        // The runtime exposes the right menu button as home.
        ButtonDescriptor::app(ButtonType::Menu, "input/home", ButtonFlags::CLICK, HandScope::RIGHT),
        ButtonDescriptor::new(ButtonType::Trigger, PATH_TRIGGER, ButtonFlags::ALL, HandScope::BOTH),
        ButtonDescriptor::new(
            ButtonType::Thumbstick,
            PATH_THUMBSTICK,
            ButtonFlags::CLICK_TOUCH,
            HandScope::BOTH,
        ),
        ButtonDescriptor::new(ButtonType::Squeeze, "input/grip", ButtonFlags::ALL, HandScope::BOTH),
    ],
    axes: &[AxisDescriptor::new(AxisType::Thumbstick, PATH_THUMBSTICK, HandScope::BOTH)],
    haptics: HAPTICS,
};

/// Single right handed pointer with a touchpad.
pub static HVR_3DOF: ProfileDescriptor = ProfileDescriptor {
    path: "/interaction_profiles/huawei/controller",
    system_filter: Some(SYSTEM),
    dof: DoF::Three,
    left_model: None,
    right_model: Some("vr_controller_focus.obj"),
    device_type: DeviceType::ViveFocus,
    input_profiles: &["generic-trigger-touchpad"],
    buttons: &[
        ButtonDescriptor::new(
            ButtonType::Trigger,
            PATH_TRIGGER,
            ButtonFlags::VALUE_TOUCH,
            HandScope::BOTH,
        ),
        ButtonDescriptor::new(
            ButtonType::Trackpad,
            PATH_TRACKPAD,
            ButtonFlags::CLICK_TOUCH,
            HandScope::BOTH,
        ),
        ButtonDescriptor::app(ButtonType::Back, PATH_BACK, ButtonFlags::ALL, HandScope::BOTH),
    ],
    axes: &[AxisDescriptor::new(AxisType::Trackpad, PATH_TRACKPAD, HandScope::BOTH)],
    haptics: HAPTICS,
};
