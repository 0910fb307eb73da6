use super::{
    AxisDescriptor, AxisType, ButtonDescriptor, ButtonFlags, ButtonType, HandScope,
    HapticDescriptor, ProfileDescriptor, PATH_HAPTIC, PATH_MENU, PATH_SQUEEZE, PATH_THUMBSTICK,
    PATH_TRACKPAD, PATH_TRIGGER,
};
use crate::delegate::{DeviceType, DoF};

pub static MOTION_CONTROLLER: ProfileDescriptor = ProfileDescriptor {
    path: "/interaction_profiles/microsoft/motion_controller",
    system_filter: None,
    dof: DoF::Six,
    left_model: Some("vr_controller_wmr_left.obj"),
    right_model: Some("vr_controller_wmr_right.obj"),
    device_type: DeviceType::WindowsMr,
    input_profiles: &[
        "microsoft-mixed-reality",
        "generic-trigger-squeeze-touchpad-thumbstick",
    ],
    buttons: &[
        ButtonDescriptor::new(
            ButtonType::Trigger,
            PATH_TRIGGER,
            ButtonFlags::VALUE,
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
        ButtonDescriptor::new(
            ButtonType::Thumbstick,
            PATH_THUMBSTICK,
            ButtonFlags::CLICK,
            HandScope::BOTH,
        ),
        ButtonDescriptor::app(ButtonType::Menu, PATH_MENU, ButtonFlags::CLICK, HandScope::BOTH),
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
