use super::{
    AxisDescriptor, AxisType, ButtonDescriptor, ButtonFlags, ButtonType, HandScope,
    HapticDescriptor, ProfileDescriptor, PATH_BUTTON_A, PATH_BUTTON_B, PATH_BUTTON_X,
    PATH_BUTTON_Y, PATH_HAPTIC, PATH_MENU, PATH_SQUEEZE, PATH_THUMBREST, PATH_THUMBSTICK,
    PATH_TRIGGER,
};
use crate::delegate::{DeviceType, DoF};

const TOUCH_AXES: &[AxisDescriptor] = &[AxisDescriptor::new(
    AxisType::Thumbstick,
    PATH_THUMBSTICK,
    HandScope::BOTH,
)];

const BOTH_HAPTICS: &[HapticDescriptor] = &[HapticDescriptor {
    path: PATH_HAPTIC,
    hand: HandScope::BOTH,
}];

const TOUCH_BUTTONS: &[ButtonDescriptor] = &[
    ButtonDescriptor::new(
        ButtonType::Trigger,
        PATH_TRIGGER,
        ButtonFlags::VALUE_TOUCH,
        HandScope::BOTH,
    ),
    ButtonDescriptor::new(ButtonType::Squeeze, PATH_SQUEEZE, ButtonFlags::VALUE, HandScope::BOTH),
    ButtonDescriptor::new(
        ButtonType::Thumbstick,
        PATH_THUMBSTICK,
        ButtonFlags::CLICK_TOUCH,
        HandScope::BOTH,
    ),
    ButtonDescriptor::new(ButtonType::X, PATH_BUTTON_X, ButtonFlags::CLICK_TOUCH, HandScope::LEFT),
    ButtonDescriptor::new(ButtonType::Y, PATH_BUTTON_Y, ButtonFlags::CLICK_TOUCH, HandScope::LEFT),
    ButtonDescriptor::new(ButtonType::A, PATH_BUTTON_A, ButtonFlags::CLICK_TOUCH, HandScope::RIGHT),
    ButtonDescriptor::new(ButtonType::B, PATH_BUTTON_B, ButtonFlags::CLICK_TOUCH, HandScope::RIGHT),
    ButtonDescriptor::new(
        ButtonType::Thumbrest,
        PATH_THUMBREST,
        ButtonFlags::TOUCH,
        HandScope::BOTH,
    ),
    ButtonDescriptor::app(ButtonType::Menu, PATH_MENU, ButtonFlags::CLICK, HandScope::LEFT),
];

/// Quest 1 Touch controllers (oculus-touch-v2).
pub static TOUCH_QUEST: ProfileDescriptor = ProfileDescriptor {
    path: "/interaction_profiles/oculus/touch_controller",
    system_filter: Some("Oculus Quest"),
    dof: DoF::Six,
    left_model: Some("vr_controller_oculusquest_left.obj"),
    right_model: Some("vr_controller_oculusquest_right.obj"),
    device_type: DeviceType::OculusQuest,
    input_profiles: &[
        "oculus-touch-v2",
        "oculus-touch",
        "generic-trigger-squeeze-thumbstick",
    ],
    // The Quest 1 runtime reports the face buttons under swapped types.
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
            ButtonType::A,
            PATH_BUTTON_X,
            ButtonFlags::CLICK_TOUCH,
            HandScope::LEFT,
        ),
        ButtonDescriptor::new(
            ButtonType::B,
            PATH_BUTTON_Y,
            ButtonFlags::CLICK_TOUCH,
            HandScope::LEFT,
        ),
        ButtonDescriptor::new(
            ButtonType::X,
            PATH_BUTTON_A,
            ButtonFlags::CLICK_TOUCH,
            HandScope::RIGHT,
        ),
        ButtonDescriptor::new(
            ButtonType::Y,
            PATH_BUTTON_B,
            ButtonFlags::CLICK_TOUCH,
            HandScope::RIGHT,
        ),
        ButtonDescriptor::new(
            ButtonType::Thumbrest,
            PATH_THUMBREST,
            ButtonFlags::TOUCH,
            HandScope::BOTH,
        ),
        ButtonDescriptor::app(ButtonType::Menu, PATH_MENU, ButtonFlags::CLICK, HandScope::LEFT),
    ],
    axes: TOUCH_AXES,
    haptics: &[HapticDescriptor {
        path: PATH_HAPTIC,
        hand: HandScope::RIGHT,
    }],
};

/// Quest 2 Touch controllers (oculus-touch-v3).
pub static TOUCH_QUEST2: ProfileDescriptor = ProfileDescriptor {
    path: "/interaction_profiles/oculus/touch_controller",
    system_filter: Some("Oculus Quest2"),
    dof: DoF::Six,
    left_model: Some("vr_controller_oculusquest2_left.obj"),
    right_model: Some("vr_controller_oculusquest2_right.obj"),
    device_type: DeviceType::OculusQuest2,
    input_profiles: &[
        "oculus-touch-v3",
        "oculus-touch-v2",
        "oculus-touch",
        "generic-trigger-squeeze-thumbstick",
    ],
    buttons: TOUCH_BUTTONS,
    axes: TOUCH_AXES,
    haptics: BOTH_HAPTICS,
};

pub static TOUCH_PRO: ProfileDescriptor = ProfileDescriptor {
    path: "/interaction_profiles/facebook/touch_controller_pro",
    system_filter: None,
    dof: DoF::Six,
    left_model: Some("vr_controller_questpro_left.obj"),
    right_model: Some("vr_controller_questpro_right.obj"),
    device_type: DeviceType::MetaQuestPro,
    input_profiles: &[
        "meta-quest-touch-pro",
        "oculus-touch-v2",
        "oculus-touch",
        "generic-trigger-squeeze-thumbstick",
    ],
    buttons: TOUCH_BUTTONS,
    axes: TOUCH_AXES,
    haptics: BOTH_HAPTICS,
};

pub static TOUCH_PLUS: ProfileDescriptor = ProfileDescriptor {
    path: "/interaction_profiles/meta/touch_controller_plus",
    system_filter: None,
    dof: DoF::Six,
    left_model: Some("vr_controller_quest3_left.obj"),
    right_model: Some("vr_controller_quest3_right.obj"),
    device_type: DeviceType::MetaQuest3,
    input_profiles: &[
        "meta-quest-touch-plus",
        "oculus-touch-v3",
        "oculus-touch",
        "generic-trigger-squeeze-thumbstick",
    ],
    buttons: TOUCH_BUTTONS,
    axes: TOUCH_AXES,
    haptics: BOTH_HAPTICS,
};
