pub mod hand_interaction;
pub mod htc;
pub mod huawei;
pub mod microsoft;
pub mod oculus;
pub mod pico;
pub mod simple_controller;
pub mod valve;

use crate::delegate::{immersive, Button, DeviceType, DoF};
use crate::runtime::Hand;
use bitflags::bitflags;

pub const PATH_GRIP_POSE: &str = "input/grip/pose";
pub const PATH_AIM_POSE: &str = "input/aim/pose";
pub const PATH_TRIGGER: &str = "input/trigger";
pub const PATH_SQUEEZE: &str = "input/squeeze";
pub const PATH_THUMBSTICK: &str = "input/thumbstick";
pub const PATH_THUMBREST: &str = "input/thumbrest";
pub const PATH_TRACKPAD: &str = "input/trackpad";
pub const PATH_SELECT: &str = "input/select";
pub const PATH_MENU: &str = "input/menu";
pub const PATH_BACK: &str = "input/back";
pub const PATH_HAPTIC: &str = "output/haptic";
pub const PATH_BUTTON_A: &str = "input/a";
pub const PATH_BUTTON_B: &str = "input/b";
pub const PATH_BUTTON_X: &str = "input/x";
pub const PATH_BUTTON_Y: &str = "input/y";

bitflags! {
    /// Components a button exposes.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
    pub struct ButtonFlags: u8 {
        const CLICK = 1 << 0;
        const TOUCH = 1 << 1;
        const VALUE = 1 << 2;
        /// Hand interaction gestures report whether they're currently meaningful.
        const READY = 1 << 3;

        const CLICK_TOUCH = Self::CLICK.bits() | Self::TOUCH.bits();
        const CLICK_VALUE = Self::CLICK.bits() | Self::VALUE.bits();
        const VALUE_TOUCH = Self::VALUE.bits() | Self::TOUCH.bits();
        const ALL = Self::CLICK.bits() | Self::TOUCH.bits() | Self::VALUE.bits();
    }

    /// The hands a control (or an action) exists for.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
    pub struct HandScope: u8 {
        const LEFT = 1 << 0;
        const RIGHT = 1 << 1;
        const BOTH = Self::LEFT.bits() | Self::RIGHT.bits();
    }
}

impl From<Hand> for HandScope {
    fn from(hand: Hand) -> Self {
        match hand {
            Hand::Left => HandScope::LEFT,
            Hand::Right => HandScope::RIGHT,
        }
    }
}

impl HandScope {
    #[inline]
    pub fn includes(self, hand: Hand) -> bool {
        self.contains(hand.into())
    }

    pub fn hands(self) -> impl Iterator<Item = Hand> {
        Hand::ALL.into_iter().filter(move |h| self.includes(*h))
    }

    /// Qualifier used in action names, empty for actions shared by both hands.
    pub fn name_qualifier(self) -> &'static str {
        if self == HandScope::LEFT {
            "left_"
        } else if self == HandScope::RIGHT {
            "right_"
        } else {
            ""
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ButtonType {
    Trigger,
    Squeeze,
    Menu,
    Back,
    Trackpad,
    Thumbstick,
    Thumbrest,
    A,
    B,
    X,
    Y,
}

impl ButtonType {
    pub const ALL: [ButtonType; 11] = [
        ButtonType::Trigger,
        ButtonType::Squeeze,
        ButtonType::Menu,
        ButtonType::Back,
        ButtonType::Trackpad,
        ButtonType::Thumbstick,
        ButtonType::Thumbrest,
        ButtonType::A,
        ButtonType::B,
        ButtonType::X,
        ButtonType::Y,
    ];

    /// Controls every controller is expected to have. Profiles lacking one still report an
    /// empty slot for it.
    pub const EXPECTED: [ButtonType; 3] = [
        ButtonType::Squeeze,
        ButtonType::Trackpad,
        ButtonType::Thumbstick,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ButtonType::Trigger => "trigger",
            ButtonType::Squeeze => "squeeze",
            ButtonType::Menu => "menu",
            ButtonType::Back => "back",
            ButtonType::Trackpad => "trackpad",
            ButtonType::Thumbstick => "thumbstick",
            ButtonType::Thumbrest => "thumbrest",
            ButtonType::A => "a",
            ButtonType::B => "b",
            ButtonType::X => "x",
            ButtonType::Y => "y",
        }
    }

    pub fn default_output(self) -> Button {
        match self {
            ButtonType::Trigger => Button::Trigger,
            ButtonType::Squeeze => Button::Squeeze,
            ButtonType::Menu => Button::App,
            ButtonType::Back => Button::Y,
            ButtonType::Trackpad => Button::Touchpad,
            ButtonType::Thumbstick | ButtonType::Thumbrest => Button::Others,
            ButtonType::A => Button::A,
            ButtonType::B => Button::B,
            ButtonType::X => Button::X,
            ButtonType::Y => Button::Y,
        }
    }

    /// Index in the standard gamepad mapping. X and Y share the A and B slots, since a single
    /// controller never has both pairs.
    pub fn immersive_index(self) -> Option<u8> {
        match self {
            ButtonType::Trigger => Some(immersive::TRIGGER),
            ButtonType::Squeeze => Some(immersive::SQUEEZE),
            ButtonType::Menu | ButtonType::Back => None,
            ButtonType::Trackpad => Some(immersive::TOUCHPAD),
            ButtonType::Thumbstick => Some(immersive::THUMBSTICK),
            ButtonType::Thumbrest => Some(immersive::THUMBREST),
            ButtonType::A | ButtonType::X => Some(immersive::A),
            ButtonType::B | ButtonType::Y => Some(immersive::B),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum AxisType {
    Trackpad,
    Thumbstick,
}

impl AxisType {
    pub const ALL: [AxisType; 2] = [AxisType::Trackpad, AxisType::Thumbstick];

    pub fn name(self) -> &'static str {
        match self {
            AxisType::Trackpad => "trackpad",
            AxisType::Thumbstick => "thumbstick",
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ButtonDescriptor {
    pub ty: ButtonType,
    /// Relative to the hand's user path, without the component (`input/trigger`).
    pub path: &'static str,
    pub flags: ButtonFlags,
    pub hand: HandScope,
    /// Replaces [`ButtonType::default_output`].
    pub output: Option<Button>,
    /// Drives the application menu/back affordance rather than a gamepad button.
    pub reserved: bool,
}

impl ButtonDescriptor {
    pub const fn new(
        ty: ButtonType,
        path: &'static str,
        flags: ButtonFlags,
        hand: HandScope,
    ) -> Self {
        Self {
            ty,
            path,
            flags,
            hand,
            output: None,
            reserved: false,
        }
    }

    /// Shorthand for menu style buttons mapped to [`Button::App`].
    pub const fn app(
        ty: ButtonType,
        path: &'static str,
        flags: ButtonFlags,
        hand: HandScope,
    ) -> Self {
        Self {
            output: Some(Button::App),
            reserved: true,
            ..Self::new(ty, path, flags, hand)
        }
    }

    pub fn output_button(&self) -> Button {
        self.output.unwrap_or(self.ty.default_output())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct AxisDescriptor {
    pub ty: AxisType,
    /// The vector2 path (`input/thumbstick`).
    pub path: &'static str,
    pub hand: HandScope,
}

impl AxisDescriptor {
    pub const fn new(ty: AxisType, path: &'static str, hand: HandScope) -> Self {
        Self { ty, path, hand }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct HapticDescriptor {
    pub path: &'static str,
    pub hand: HandScope,
}

pub struct ProfileDescriptor {
    pub path: &'static str,
    /// System name this variant of the profile is meant for. Several descriptors can share a
    /// path and differ only in this.
    pub system_filter: Option<&'static str>,
    pub dof: DoF,
    pub left_model: Option<&'static str>,
    pub right_model: Option<&'static str>,
    pub device_type: DeviceType,
    /// WebXR input profile names, most specific first.
    pub input_profiles: &'static [&'static str],
    pub buttons: &'static [ButtonDescriptor],
    pub axes: &'static [AxisDescriptor],
    pub haptics: &'static [HapticDescriptor],
}

impl std::fmt::Debug for ProfileDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileDescriptor")
            .field("path", &self.path)
            .field("system_filter", &self.system_filter)
            .finish_non_exhaustive()
    }
}

impl ProfileDescriptor {
    pub fn model(&self, hand: Hand) -> Option<&'static str> {
        match hand {
            Hand::Left => self.left_model,
            Hand::Right => self.right_model,
        }
    }

    pub fn buttons_for(&self, hand: Hand) -> impl Iterator<Item = &'static ButtonDescriptor> {
        self.buttons.iter().filter(move |b| b.hand.includes(hand))
    }

    pub fn axes_for(&self, hand: Hand) -> impl Iterator<Item = &'static AxisDescriptor> {
        self.axes.iter().filter(move |a| a.hand.includes(hand))
    }

    pub fn haptics_for(&self, hand: Hand) -> impl Iterator<Item = &'static HapticDescriptor> {
        self.haptics.iter().filter(move |h| h.hand.includes(hand))
    }

    pub fn has_button(&self, ty: ButtonType, hand: Hand) -> bool {
        self.buttons_for(hand).any(|b| b.ty == ty)
    }
}

pub struct Profiles {
    pub list: &'static [&'static ProfileDescriptor],
}

impl Profiles {
    #[inline]
    pub fn get() -> &'static Self {
        // Add supported interaction profiles here.
        static P: Profiles = Profiles {
            list: &[
                &oculus::TOUCH_QUEST,
                &oculus::TOUCH_QUEST2,
                &oculus::TOUCH_PRO,
                &oculus::TOUCH_PLUS,
                &pico::PICO4,
                &htc::VIVE_FOCUS3,
                &htc::VIVE_WAND,
                &valve::INDEX,
                &microsoft::MOTION_CONTROLLER,
                &huawei::HVR_6DOF,
                &huawei::HVR_3DOF,
                &hand_interaction::EXT_HAND_INTERACTION,
                &hand_interaction::MSFT_HAND_INTERACTION,
                &simple_controller::KHR_SIMPLE,
            ],
        };
        &P
    }

    /// The descriptors usable on `system_name`, at most one per profile path.
    ///
    /// When several descriptors share a path, one whose filter names this system wins over an
    /// unfiltered one, which wins over one meant for another system.
    pub fn for_system(&self, system_name: &str) -> Vec<&'static ProfileDescriptor> {
        let rank = |p: &ProfileDescriptor| match p.system_filter {
            Some(filter) if filter == system_name => 0,
            None => 1,
            Some(_) => 2,
        };

        let mut ranked: Vec<&'static ProfileDescriptor> = self.list.to_vec();
        // stable, so table order is kept between equally ranked entries
        ranked.sort_by_key(|p| rank(p));

        let mut selected: Vec<&'static ProfileDescriptor> = Vec::with_capacity(ranked.len());
        for profile in ranked {
            if !selected.iter().any(|p| p.path == profile.path) {
                selected.push(profile);
            }
        }
        // Keep the table order for what remains.
        selected.sort_by_key(|p| {
            self.list
                .iter()
                .position(|q| std::ptr::eq(*q, *p))
                .unwrap_or(usize::MAX)
        });
        selected
    }
}

/// Finds the descriptor for a bound interaction profile among `profiles`.
pub fn profile_from_path(
    profiles: &[&'static ProfileDescriptor],
    path: &str,
) -> Option<&'static ProfileDescriptor> {
    profiles.iter().copied().find(|p| p.path == path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn enumerated_types_have_unique_names() {
        let names: HashSet<_> = ButtonType::ALL.iter().map(|t| t.name()).collect();
        assert_eq!(names.len(), ButtonType::ALL.len());
        let names: HashSet<_> = AxisType::ALL.iter().map(|t| t.name()).collect();
        assert_eq!(names.len(), AxisType::ALL.len());
    }

    #[test]
    fn descriptors_only_reference_known_types() {
        for profile in Profiles::get().list {
            for button in profile.buttons {
                assert!(
                    ButtonType::ALL.contains(&button.ty),
                    "{}: {button:?}",
                    profile.path
                );
                assert!(!button.flags.is_empty(), "{}: {button:?}", profile.path);
                assert!(!button.hand.is_empty(), "{}: {button:?}", profile.path);
            }
            for axis in profile.axes {
                assert!(AxisType::ALL.contains(&axis.ty), "{}: {axis:?}", profile.path);
            }
        }
    }

    #[test]
    fn no_button_is_declared_twice_for_a_hand() {
        for profile in Profiles::get().list {
            for hand in Hand::ALL {
                let mut seen = HashSet::new();
                for button in profile.buttons_for(hand) {
                    assert!(
                        seen.insert(button.ty),
                        "{} declares {:?} twice for {hand:?}",
                        profile.path,
                        button.ty
                    );
                }
            }
        }
    }

    #[test]
    fn profile_paths_are_interaction_profiles() {
        for profile in Profiles::get().list {
            assert!(
                profile.path.starts_with("/interaction_profiles/"),
                "{}",
                profile.path
            );
            assert!(!profile.input_profiles.is_empty(), "{}", profile.path);
        }
    }

    #[test]
    fn system_filter_prefers_matching_descriptor() {
        let profiles = Profiles::get();
        let touch = |system| {
            profile_from_path(
                &profiles.for_system(system),
                "/interaction_profiles/oculus/touch_controller",
            )
            .unwrap()
        };

        assert!(std::ptr::eq(touch("Oculus Quest2"), &oculus::TOUCH_QUEST2));
        assert!(std::ptr::eq(touch("Oculus Quest"), &oculus::TOUCH_QUEST));
        // Nothing matches, so the first entry in the table is used.
        assert!(std::ptr::eq(touch("Some Headset"), &oculus::TOUCH_QUEST));
    }

    #[test]
    fn one_descriptor_per_path() {
        let selected = Profiles::get().for_system("Oculus Quest2");
        let paths: HashSet<_> = selected.iter().map(|p| p.path).collect();
        assert_eq!(paths.len(), selected.len());
        assert_eq!(selected.len(), Profiles::get().list.len() - 1);
    }

    #[test]
    fn output_button_override() {
        let menu = ButtonDescriptor::app(
            ButtonType::Back,
            PATH_BACK,
            ButtonFlags::CLICK,
            HandScope::BOTH,
        );
        assert_eq!(menu.output_button(), Button::App);
        assert!(menu.reserved);

        let back = ButtonDescriptor::new(
            ButtonType::Back,
            PATH_BACK,
            ButtonFlags::CLICK,
            HandScope::BOTH,
        );
        assert_eq!(back.output_button(), Button::Y);
        assert_eq!(ButtonType::X.immersive_index(), ButtonType::A.immersive_index());
        assert_eq!(ButtonType::Menu.immersive_index(), None);
    }
}
