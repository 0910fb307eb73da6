use super::{
    AxisDescriptor, AxisType, ButtonDescriptor, ButtonFlags, ButtonType, HandScope,
    HapticDescriptor, ProfileDescriptor, PATH_BACK, PATH_BUTTON_A, PATH_BUTTON_B, PATH_BUTTON_X,
    PATH_BUTTON_Y, PATH_HAPTIC, PATH_SQUEEZE, PATH_THUMBSTICK, PATH_TRIGGER,
};
use crate::delegate::{DeviceType, DoF};

/// Made for the Pico 4, the Neo 3 controllers use the same profile.
pub static PICO4: ProfileDescriptor = ProfileDescriptor {
    path: "/interaction_profiles/pico/neo3_controller",
    system_filter: Some("Pico: PICO HMD"),
    dof: DoF::Six,
    left_model: Some("vr_controller_pico4_left.obj"),
    right_model: Some("vr_controller_pico4_right.obj"),
    device_type: DeviceType::PicoXr,
    input_profiles: &["generic-trigger-squeeze-thumbstick"],
    buttons: &[
        ButtonDescriptor::new(
            ButtonType::Trigger,
            PATH_TRIGGER,
            ButtonFlags::VALUE_TOUCH,
            HandScope::BOTH,
        ),
        ButtonDescriptor::new(
            ButtonType::Squeeze,
            PATH_SQUEEZE,
            ButtonFlags::VALUE,
            HandScope::BOTH,
        ),
        ButtonDescriptor::new(
            ButtonType::Thumbstick,
            PATH_THUMBSTICK,
            ButtonFlags::CLICK_TOUCH,
            HandScope::BOTH,
        ),
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
        ButtonDescriptor::app(ButtonType::Back, PATH_BACK, ButtonFlags::CLICK, HandScope::BOTH),
    ],
    axes: &[AxisDescriptor::new(AxisType::Thumbstick, PATH_THUMBSTICK, HandScope::BOTH)],
    haptics: &[HapticDescriptor {
        path: PATH_HAPTIC,
        hand: HandScope::BOTH,
    }],
};
