//! The write-only surface controller state is reported through.

use bitflags::bitflags;
use glam::Mat4;

/// Canonical button ids understood by the application layer.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Button {
    Trigger,
    Squeeze,
    Touchpad,
    App,
    A,
    B,
    X,
    Y,
    Others,
}

/// Button indices of the WebXR standard gamepad mapping.
pub mod immersive {
    pub const TRIGGER: u8 = 0;
    pub const SQUEEZE: u8 = 1;
    pub const TOUCHPAD: u8 = 2;
    pub const THUMBSTICK: u8 = 3;
    pub const A: u8 = 4;
    pub const B: u8 = 5;
    pub const THUMBREST: u8 = 6;

    pub const AXIS_TOUCHPAD_X: usize = 0;
    pub const AXIS_TOUCHPAD_Y: usize = 1;
    pub const AXIS_THUMBSTICK_X: usize = 2;
    pub const AXIS_THUMBSTICK_Y: usize = 3;
    /// Number of fixed axis slots. Anything else is appended after these.
    pub const AXIS_SLOTS: usize = 4;
}

bitflags! {
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
    pub struct CapabilityFlags: u32 {
        const ORIENTATION = 1 << 0;
        const POSITION = 1 << 1;
        /// Position comes from a body model rather than from tracking.
        const POSITION_EMULATED = 1 << 2;
        const GRIP_SPACE_POSITION = 1 << 3;
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TargetRayMode {
    Gaze,
    TrackedPointer,
    Screen,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RenderMode {
    /// Regular browsing, positions are relative to the floor.
    StandAlone,
    /// A WebXR session is presenting.
    Immersive,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PointerMode {
    TrackedPointer,
    TrackedEye,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DeviceType {
    Unknown,
    OculusGo,
    OculusQuest,
    OculusQuest2,
    MetaQuestPro,
    MetaQuest3,
    PicoXr,
    ViveFocus,
    ViveFocus3,
    ValveIndex,
    WindowsMr,
    HandTracking,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DoF {
    Three,
    Six,
}

/// State of a single button for one frame.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ButtonReport {
    pub button: Button,
    pub immersive_index: Option<u8>,
    pub pressed: bool,
    pub touched: bool,
    pub value: f32,
    /// False for placeholder slots of controls the current controller doesn't have.
    pub present: bool,
}

impl ButtonReport {
    pub fn placeholder(button: Button, immersive_index: Option<u8>) -> Self {
        Self {
            button,
            immersive_index,
            pressed: false,
            touched: false,
            value: 0.0,
            present: false,
        }
    }
}

/// Receives per controller state. `index` is the controller index handed to
/// [`ControllerDelegate::create_controller`].
pub trait ControllerDelegate {
    fn create_controller(&mut self, index: usize, model_index: usize, name: &str);
    fn set_enabled(&mut self, index: usize, enabled: bool);
    fn set_left_handed(&mut self, index: usize, left_handed: bool);
    fn set_target_ray_mode(&mut self, index: usize, mode: TargetRayMode);
    fn set_capability_flags(&mut self, index: usize, flags: CapabilityFlags);
    fn set_transform(&mut self, index: usize, transform: Mat4);
    fn set_immersive_beam_transform(&mut self, index: usize, transform: Mat4);
    fn set_button_state(&mut self, index: usize, state: ButtonReport);
    fn set_button_count(&mut self, index: usize, count: usize);
    fn set_haptic_count(&mut self, index: usize, count: usize);
    fn set_axes(&mut self, index: usize, axes: &[f32]);
    fn set_touch_position(&mut self, index: usize, x: f32, y: f32);
    fn end_touch(&mut self, index: usize);
    fn set_scrolled_delta(&mut self, index: usize, x: f32, y: f32);
    fn set_select_action_start(&mut self, index: usize);
    fn set_select_action_stop(&mut self, index: usize);
    fn set_squeeze_action_start(&mut self, index: usize);
    fn set_squeeze_action_stop(&mut self, index: usize);
    fn set_pinch_factor(&mut self, index: usize, factor: f32);
    fn set_controller_model(&mut self, index: usize, model: Option<&'static str>);
    fn set_device_type(&mut self, index: usize, device_type: DeviceType);
    fn set_input_profiles(&mut self, index: usize, profiles: &'static [&'static str]);
}
