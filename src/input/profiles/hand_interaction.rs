//! Profiles for hands tracked without a controller. They have no controller model, so hands
//! bound to them are reported through hand tracking, or through these buttons when no joints
//! are available.

use super::{
    ButtonDescriptor, ButtonFlags, ButtonType, HandScope, ProfileDescriptor, PATH_SELECT,
    PATH_SQUEEZE,
};
use crate::delegate::{DeviceType, DoF};

const VALUE_READY: ButtonFlags = ButtonFlags::VALUE.union(ButtonFlags::READY);

pub static EXT_HAND_INTERACTION: ProfileDescriptor = ProfileDescriptor {
    path: "/interaction_profiles/ext/hand_interaction_ext",
    system_filter: None,
    dof: DoF::Six,
    left_model: None,
    right_model: None,
    device_type: DeviceType::HandTracking,
    input_profiles: &["generic-hand-select-grasp", "generic-hand-select", "generic-hand"],
    buttons: &[
        ButtonDescriptor::new(ButtonType::Trigger, "input/pinch_ext", VALUE_READY, HandScope::BOTH),
        ButtonDescriptor::new(ButtonType::Squeeze, "input/grasp_ext", VALUE_READY, HandScope::BOTH),
    ],
    axes: &[],
    haptics: &[],
};

pub static MSFT_HAND_INTERACTION: ProfileDescriptor = ProfileDescriptor {
    path: "/interaction_profiles/microsoft/hand_interaction",
    system_filter: None,
    dof: DoF::Six,
    left_model: None,
    right_model: None,
    device_type: DeviceType::HandTracking,
    input_profiles: &["generic-hand-select-grasp", "generic-hand-select", "generic-hand"],
    buttons: &[
        ButtonDescriptor::new(
            ButtonType::Trigger,
            PATH_SELECT,
            ButtonFlags::VALUE,
            HandScope::BOTH,
        ),
        ButtonDescriptor::new(
            ButtonType::Squeeze,
            PATH_SQUEEZE,
            ButtonFlags::VALUE,
            HandScope::BOTH,
        ),
    ],
    axes: &[],
    haptics: &[],
};
