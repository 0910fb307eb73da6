use crate::delegate::{
    Button, ButtonReport, CapabilityFlags, ControllerDelegate, DeviceType, TargetRayMode,
};
use glam::{Mat4, Vec2};
use log::trace;

/// Everything known about one controller, as last reported.
#[derive(Clone, Debug)]
pub struct GenericControllerReport {
    pub name: String,
    pub model_index: usize,
    pub enabled: bool,
    pub left_handed: bool,
    pub target_ray_mode: Option<TargetRayMode>,
    pub capability_flags: CapabilityFlags,
    pub transform: Mat4,
    pub beam_transform: Mat4,
    /// Buttons reported since the last [`ReportRecorder::begin_frame`], in report order.
    pub buttons: Vec<ButtonReport>,
    pub button_count: usize,
    pub haptic_count: usize,
    pub axes: Vec<f32>,
    /// `None` while the touchpad isn't touched.
    pub touch_position: Option<Vec2>,
    pub scrolled_delta: Vec2,
    pub pinch_factor: f32,
    pub model: Option<&'static str>,
    pub device_type: DeviceType,
    pub input_profiles: &'static [&'static str],
}

impl GenericControllerReport {
    fn new(name: &str, model_index: usize) -> Self {
        Self {
            name: name.to_owned(),
            model_index,
            enabled: false,
            left_handed: false,
            target_ray_mode: None,
            capability_flags: CapabilityFlags::empty(),
            transform: Mat4::IDENTITY,
            beam_transform: Mat4::IDENTITY,
            buttons: Vec::new(),
            button_count: 0,
            haptic_count: 0,
            axes: Vec::new(),
            touch_position: None,
            scrolled_delta: Vec2::ZERO,
            pinch_factor: 0.0,
            model: None,
            device_type: DeviceType::Unknown,
            input_profiles: &[],
        }
    }

    /// First reported state of `button`, ignoring placeholders.
    pub fn button(&self, button: Button) -> Option<&ButtonReport> {
        self.buttons.iter().find(|b| b.present && b.button == button)
    }

    pub fn placeholders(&self) -> impl Iterator<Item = &ButtonReport> {
        self.buttons.iter().filter(|b| !b.present)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ControllerEvent {
    SelectStart,
    SelectStop,
    SqueezeStart,
    SqueezeStop,
    TouchEnd,
}

/// A [`ControllerDelegate`] that stores what it is told, for consumers that would rather poll.
#[derive(Default)]
pub struct ReportRecorder {
    controllers: Vec<Option<GenericControllerReport>>,
    events: Vec<(usize, ControllerEvent)>,
}

impl ReportRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn controller(&self, index: usize) -> Option<&GenericControllerReport> {
        self.controllers.get(index).and_then(Option::as_ref)
    }

    pub fn controller_count(&self) -> usize {
        self.controllers.iter().flatten().count()
    }

    /// Events in the order they were reported since the last [`Self::begin_frame`].
    pub fn events(&self) -> &[(usize, ControllerEvent)] {
        &self.events
    }

    pub fn events_for(&self, index: usize) -> impl Iterator<Item = ControllerEvent> + '_ {
        self.events
            .iter()
            .filter(move |(i, _)| *i == index)
            .map(|(_, e)| *e)
    }

    /// Drops per frame data (buttons and events) so the next update starts clean.
    pub fn begin_frame(&mut self) {
        self.events.clear();
        for report in self.controllers.iter_mut().flatten() {
            report.buttons.clear();
        }
    }

    fn report(&mut self, index: usize) -> Option<&mut GenericControllerReport> {
        let report = self.controllers.get_mut(index).and_then(Option::as_mut);
        if report.is_none() {
            trace!("ignoring state for unknown controller {index}");
        }
        report
    }

    fn push_event(&mut self, index: usize, event: ControllerEvent) {
        if self.report(index).is_some() {
            self.events.push((index, event));
        }
    }
}

impl ControllerDelegate for ReportRecorder {
    fn create_controller(&mut self, index: usize, model_index: usize, name: &str) {
        if self.controllers.len() <= index {
            self.controllers.resize_with(index + 1, || None);
        }
        self.controllers[index] = Some(GenericControllerReport::new(name, model_index));
    }

    fn set_enabled(&mut self, index: usize, enabled: bool) {
        if let Some(r) = self.report(index) {
            r.enabled = enabled;
        }
    }

    fn set_left_handed(&mut self, index: usize, left_handed: bool) {
        if let Some(r) = self.report(index) {
            r.left_handed = left_handed;
        }
    }

    fn set_target_ray_mode(&mut self, index: usize, mode: TargetRayMode) {
        if let Some(r) = self.report(index) {
            r.target_ray_mode = Some(mode);
        }
    }

    fn set_capability_flags(&mut self, index: usize, flags: CapabilityFlags) {
        if let Some(r) = self.report(index) {
            r.capability_flags = flags;
        }
    }

    fn set_transform(&mut self, index: usize, transform: Mat4) {
        if let Some(r) = self.report(index) {
            r.transform = transform;
        }
    }

    fn set_immersive_beam_transform(&mut self, index: usize, transform: Mat4) {
        if let Some(r) = self.report(index) {
            r.beam_transform = transform;
        }
    }

    fn set_button_state(&mut self, index: usize, state: ButtonReport) {
        if let Some(r) = self.report(index) {
            r.buttons.push(state);
        }
    }

    fn set_button_count(&mut self, index: usize, count: usize) {
        if let Some(r) = self.report(index) {
            r.button_count = count;
        }
    }

    fn set_haptic_count(&mut self, index: usize, count: usize) {
        if let Some(r) = self.report(index) {
            r.haptic_count = count;
        }
    }

    fn set_axes(&mut self, index: usize, axes: &[f32]) {
        if let Some(r) = self.report(index) {
            r.axes.clear();
            r.axes.extend_from_slice(axes);
        }
    }

    fn set_touch_position(&mut self, index: usize, x: f32, y: f32) {
        if let Some(r) = self.report(index) {
            r.touch_position = Some(Vec2::new(x, y));
        }
    }

    fn end_touch(&mut self, index: usize) {
        if let Some(r) = self.report(index) {
            r.touch_position = None;
        }
        self.push_event(index, ControllerEvent::TouchEnd);
    }

    fn set_scrolled_delta(&mut self, index: usize, x: f32, y: f32) {
        if let Some(r) = self.report(index) {
            r.scrolled_delta = Vec2::new(x, y);
        }
    }

    fn set_select_action_start(&mut self, index: usize) {
        self.push_event(index, ControllerEvent::SelectStart);
    }

    fn set_select_action_stop(&mut self, index: usize) {
        self.push_event(index, ControllerEvent::SelectStop);
    }

    fn set_squeeze_action_start(&mut self, index: usize) {
        self.push_event(index, ControllerEvent::SqueezeStart);
    }

    fn set_squeeze_action_stop(&mut self, index: usize) {
        self.push_event(index, ControllerEvent::SqueezeStop);
    }

    fn set_pinch_factor(&mut self, index: usize, factor: f32) {
        if let Some(r) = self.report(index) {
            r.pinch_factor = factor;
        }
    }

    fn set_controller_model(&mut self, index: usize, model: Option<&'static str>) {
        if let Some(r) = self.report(index) {
            r.model = model;
        }
    }

    fn set_device_type(&mut self, index: usize, device_type: DeviceType) {
        if let Some(r) = self.report(index) {
            r.device_type = device_type;
        }
    }

    fn set_input_profiles(&mut self, index: usize, profiles: &'static [&'static str]) {
        if let Some(r) = self.report(index) {
            r.input_profiles = profiles;
        }
    }
}
