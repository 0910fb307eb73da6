use super::{
    ButtonDescriptor, ButtonFlags, ButtonType, HandScope, HapticDescriptor, ProfileDescriptor,
    PATH_HAPTIC, PATH_MENU, PATH_SELECT,
};
use crate::delegate::{DeviceType, DoF};

/// Fallback usable by any controller the runtime can't map to something more specific.
pub static KHR_SIMPLE: ProfileDescriptor = ProfileDescriptor {
    path: "/interaction_profiles/khr/simple_controller",
    system_filter: None,
    dof: DoF::Three,
    left_model: Some("vr_controller_oculusgo.obj"),
    right_model: Some("vr_controller_oculusgo.obj"),
    device_type: DeviceType::OculusGo,
    input_profiles: &["generic-button"],
    buttons: &[
        ButtonDescriptor::new(
            ButtonType::Trigger,
            PATH_SELECT,
            ButtonFlags::CLICK,
            HandScope::BOTH,
        ),
        ButtonDescriptor::app(ButtonType::Menu, PATH_MENU, ButtonFlags::CLICK, HandScope::BOTH),
    ],
    axes: &[],
    haptics: &[HapticDescriptor {
        path: PATH_HAPTIC,
        hand: HandScope::BOTH,
    }],
};
