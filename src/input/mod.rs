mod action_set;
mod elbow;
mod eye_gaze;
mod gesture;
mod hand_tracking;
mod input_source;
mod legacy;
pub mod profiles;
mod state;

#[cfg(test)]
mod tests;

pub use action_set::{ActionSet, ButtonActions, ButtonComponent};
pub use eye_gaze::EYE_GAZE_PROFILE;
pub use gesture::{look_at, GestureManager, Pinch, PinchDetector};
pub use input_source::{InputSource, ProfileBinding};
pub use legacy::LegacyInput;
pub use state::{resolve_button_state, ButtonSample, ButtonState, Edge, EdgeTrigger};

use crate::config::InputConfig;
use crate::delegate::{ControllerDelegate, PointerMode, RenderMode, TargetRayMode};
use crate::runtime::{init_path, Hand, InitError, Runtime, SpaceHandle, SuggestedBinding};
use eye_gaze::EyeGaze;
use glam::Mat4;
use log::{debug, info, warn};
use openxr as xr;
use profiles::{ProfileDescriptor, Profiles};
use std::collections::BTreeMap;
use std::rc::Rc;

/// Bindings to suggest, grouped by interaction profile path.
pub type SuggestionMap = BTreeMap<&'static str, Vec<SuggestedBinding>>;

/// Everything a frame's update needs to know besides the runtime state.
#[derive(Copy, Clone, Debug)]
pub struct FrameState {
    /// Predicted display time.
    pub time: xr::Time,
    /// Space poses are reported in.
    pub base_space: SpaceHandle,
    /// Head pose in the base space.
    pub head: Mat4,
    pub render_mode: RenderMode,
    pub pointer_mode: PointerMode,
    pub hand_tracking_enabled: bool,
}

/// Controller order: the right hand is controller 0.
const SOURCE_HANDS: [Hand; 2] = [Hand::Right, Hand::Left];

pub struct Input<R: Runtime> {
    runtime: Rc<R>,
    sources: Vec<InputSource<R>>,
    eye_gaze: Option<EyeGaze<R>>,
    profiles_dirty: bool,
    profiles_resolved: bool,
    gaze_pointer: bool,
    // Declared last so actions outlive the spaces created from them.
    action_set: ActionSet<R>,
}

impl<R: Runtime> Input<R> {
    /// Creates every action, suggests bindings for every known profile and attaches the
    /// action set. Any failure here leaves input unusable.
    pub fn new(
        runtime: Rc<R>,
        config: &InputConfig,
        eye_tracking_supported: bool,
        delegate: &mut impl ControllerDelegate,
    ) -> Result<Self, InitError> {
        let profiles: Vec<&'static ProfileDescriptor> =
            Profiles::get().for_system(runtime.system_name());
        debug!(
            "using {} interaction profiles for system {:?}",
            profiles.len(),
            runtime.system_name()
        );

        let mut action_set = ActionSet::new(runtime.clone(), "xrcontroller")?;
        let sources = SOURCE_HANDS
            .into_iter()
            .enumerate()
            .map(|(index, hand)| {
                InputSource::new(
                    runtime.clone(),
                    &mut action_set,
                    hand,
                    index,
                    profiles.clone(),
                    config,
                )
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut eye_gaze = if eye_tracking_supported {
            Some(EyeGaze::new(
                runtime.clone(),
                &mut action_set,
                config.gaze_filter,
            )?)
        } else {
            None
        };

        let mut suggestions = SuggestionMap::new();
        for source in &sources {
            source.suggest_bindings(&mut suggestions)?;
        }
        if let Some(gaze) = &eye_gaze {
            gaze.suggest_bindings(&mut suggestions)?;
        }
        for (profile, bindings) in &suggestions {
            let path = init_path(&*runtime, profile)?;
            // A runtime may not know every profile, that only costs us that profile.
            if let Err(e) = runtime.suggest_bindings(path, bindings) {
                warn!("failed to suggest bindings for {profile}: {e}");
            }
        }

        runtime
            .attach_action_sets(&[action_set.handle()])
            .map_err(InitError::AttachFailed)?;
        if let Some(gaze) = &mut eye_gaze {
            gaze.create_spaces()?;
        }

        for source in &sources {
            let index = source.index();
            let hand = source.hand();
            delegate.create_controller(index, index, &format!("{} controller", hand.name()));
            delegate.set_left_handed(index, hand == Hand::Left);
            delegate.set_target_ray_mode(index, TargetRayMode::TrackedPointer);
            delegate.set_enabled(index, false);
        }

        info!(
            "input ready with {} actions across {} interaction profiles",
            action_set.action_count(),
            suggestions.len()
        );
        Ok(Self {
            runtime,
            sources,
            eye_gaze,
            profiles_dirty: true,
            profiles_resolved: false,
            gaze_pointer: false,
            action_set,
        })
    }

    /// Call when the runtime reports an interaction profile change. Bound profiles are looked
    /// up again at the next update.
    pub fn interaction_profile_changed(&mut self) {
        self.profiles_dirty = true;
    }

    /// Syncs actions and reports every controller.
    pub fn update(
        &mut self,
        frame: &FrameState,
        delegate: &mut impl ControllerDelegate,
    ) -> xr::Result<()> {
        crate::tracy_span!("Input::update");
        if let Err(e) = self.runtime.sync_actions(self.action_set.handle()) {
            warn!("failed to sync actions: {e}");
            for source in &self.sources {
                delegate.set_enabled(source.index(), false);
            }
            return Err(e);
        }

        if self.profiles_dirty {
            for source in &mut self.sources {
                source.update_interaction_profile(delegate);
            }
            self.profiles_dirty = false;
            self.profiles_resolved = true;
        }

        let gaze = match (frame.pointer_mode, &mut self.eye_gaze) {
            (PointerMode::TrackedEye, Some(eye_gaze)) => eye_gaze.update(frame.time, &frame.head),
            _ => None,
        };

        for source in &mut self.sources {
            let skip_pose = gaze.is_some() && source.index() == 0;
            source.update(frame, skip_pose, delegate);
        }

        if gaze.is_some() != self.gaze_pointer {
            self.gaze_pointer = gaze.is_some();
            let mode = if self.gaze_pointer {
                TargetRayMode::Gaze
            } else {
                TargetRayMode::TrackedPointer
            };
            delegate.set_target_ray_mode(0, mode);
        }
        if let Some(gaze) = gaze {
            delegate.set_transform(0, gaze);
            delegate.set_immersive_beam_transform(0, gaze);
        }
        Ok(())
    }

    fn source(&self, index: usize) -> Option<&InputSource<R>> {
        self.sources.iter().find(|s| s.index() == index)
    }

    pub fn active_profile(&self, index: usize) -> Option<&'static ProfileDescriptor> {
        self.source(index)?.active_profile()
    }

    pub fn controller_model_count(&self) -> usize {
        self.sources.len()
    }

    pub fn controller_model_name(&self, index: usize) -> Option<&'static str> {
        self.source(index)?.controller_model_name()
    }

    /// Whether profiles were resolved and at least one hand has a recognized one.
    pub fn are_controllers_ready(&self) -> bool {
        self.profiles_resolved && self.sources.iter().any(|s| s.active_profile().is_some())
    }

    pub fn has_physical_controllers(&self) -> bool {
        self.sources.iter().any(InputSource::has_physical_controller)
    }

    /// Returns whether the vibration reached a haptic output.
    pub fn apply_haptic_feedback(
        &self,
        index: usize,
        amplitude: f32,
        duration: xr::Duration,
    ) -> bool {
        match self.source(index) {
            Some(source) => source.apply_haptic(amplitude, duration),
            None => {
                debug!("haptic feedback for unknown controller {index}");
                false
            }
        }
    }

    /// Number of distinct actions in the shared action set.
    pub fn action_count(&self) -> usize {
        self.action_set.action_count()
    }
}
