//! Frame to frame state transitions that don't need a runtime to be exercised.

use crate::delegate::immersive;

/// Raw components of a button as read this frame. `None` means the component is either not
/// declared by the profile or couldn't be read.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct ButtonSample {
    pub click: Option<bool>,
    pub touch: Option<bool>,
    pub value: Option<f32>,
    pub ready: Option<bool>,
}

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct ButtonState {
    pub clicked: bool,
    pub touched: bool,
    pub value: f32,
}

impl ButtonState {
    pub const RELEASED: Self = Self {
        clicked: false,
        touched: false,
        value: 0.0,
    };
}

/// Fills in whatever components the hardware didn't provide from the ones it did.
///
/// Returns `None` if none of the click, touch or value components could be read.
pub fn resolve_button_state(sample: ButtonSample, click_threshold: f32) -> Option<ButtonState> {
    if sample.click.is_none() && sample.touch.is_none() && sample.value.is_none() {
        return None;
    }

    // Gestures that aren't ready yet (hand interaction) must not leak half formed values.
    if sample.ready == Some(false) {
        return Some(ButtonState::RELEASED);
    }

    let clicked = match (sample.click, sample.value) {
        (Some(clicked), _) => clicked,
        (None, Some(value)) => value > click_threshold,
        (None, None) => false,
    };
    let touched = sample
        .touch
        .unwrap_or_else(|| clicked || sample.value.is_some_and(|v| v > 0.0));
    let value = sample
        .value
        .unwrap_or(if clicked { 1.0 } else { 0.0 });

    Some(ButtonState {
        clicked,
        touched,
        value,
    })
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Edge {
    Start,
    Stop,
}

/// Turns a level (pressed or not) into start/stop events.
#[derive(Copy, Clone, Debug, Default)]
pub struct EdgeTrigger {
    started: bool,
}

impl EdgeTrigger {
    pub fn update(&mut self, pressed: bool) -> Option<Edge> {
        if pressed == self.started {
            return None;
        }
        self.started = pressed;
        Some(if pressed { Edge::Start } else { Edge::Stop })
    }

    pub fn is_started(&self) -> bool {
        self.started
    }
}

/// Axis values for one frame: the fixed touchpad and thumbstick slots, followed by any extra
/// axes in the order they were added.
#[derive(Clone, Debug, PartialEq)]
pub struct AxesFrame {
    values: Vec<f32>,
    filled: [bool; immersive::AXIS_SLOTS / 2],
}

impl Default for AxesFrame {
    fn default() -> Self {
        Self {
            values: vec![0.0; immersive::AXIS_SLOTS],
            filled: [false; immersive::AXIS_SLOTS / 2],
        }
    }
}

impl AxesFrame {
    /// Writes a pair into the fixed slot starting at `x_slot`, or appends it if that slot is
    /// already taken this frame.
    pub fn set_pair(&mut self, x_slot: usize, x: f32, y: f32) {
        let pair = x_slot / 2;
        if self.filled[pair] {
            self.push_pair(x, y);
            return;
        }
        self.filled[pair] = true;
        self.values[x_slot] = x;
        self.values[x_slot + 1] = y;
    }

    pub fn push_pair(&mut self, x: f32, y: f32) {
        self.values.extend([x, y]);
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }
}
