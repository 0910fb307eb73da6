//! Eye tracking used as a pointer (XR_EXT_eye_gaze_interaction).

use super::action_set::ActionSet;
use super::profiles::HandScope;
use super::SuggestionMap;
use crate::config::FilterParams;
use crate::convert::{quat_from_xr, vec3_from_xr};
use crate::filter::OneEuroFilterQuaternion;
use crate::runtime::{init_path, ActionHandle, InitError, Runtime, SpaceHandle, SuggestedBinding};
use glam::{Mat4, Quat};
use log::{debug, trace};
use openxr as xr;
use std::rc::Rc;

pub const EYE_GAZE_PROFILE: &str = "/interaction_profiles/ext/eye_gaze_interaction";
const EYE_GAZE_POSE: &str = "/user/eyes_ext/input/gaze_ext/pose";

pub struct EyeGaze<R: Runtime> {
    runtime: Rc<R>,
    action: ActionHandle,
    action_space: Option<SpaceHandle>,
    /// The gaze is located relative to the head, then moved into the base space.
    view_space: Option<SpaceHandle>,
    filter: OneEuroFilterQuaternion,
}

impl<R: Runtime> EyeGaze<R> {
    pub fn new(
        runtime: Rc<R>,
        action_set: &mut ActionSet<R>,
        filter: FilterParams,
    ) -> Result<Self, InitError> {
        // The eyes aren't a hand, so the action has no subaction paths.
        let action = action_set.get_or_create_action(
            xr::sys::ActionType::POSE_INPUT,
            "user_intent",
            HandScope::empty(),
        )?;

        Ok(Self {
            runtime,
            action,
            action_space: None,
            view_space: None,
            filter: OneEuroFilterQuaternion::new(filter),
        })
    }

    pub fn suggest_bindings(&self, suggestions: &mut SuggestionMap) -> Result<(), InitError> {
        let binding = init_path(&*self.runtime, EYE_GAZE_POSE)?;
        suggestions
            .entry(EYE_GAZE_PROFILE)
            .or_default()
            .push(SuggestedBinding {
                action: self.action,
                binding,
            });
        Ok(())
    }

    /// Only possible once the action set is attached.
    pub fn create_spaces(&mut self) -> Result<(), InitError> {
        if self.action_space.is_none() {
            self.action_space = Some(
                self.runtime
                    .create_action_space(self.action, xr::Path::NULL)
                    .map_err(InitError::SpaceCreationFailed)?,
            );
        }
        if self.view_space.is_none() {
            self.view_space = Some(
                self.runtime
                    .create_reference_space(xr::ReferenceSpaceType::VIEW)
                    .map_err(InitError::SpaceCreationFailed)?,
            );
        }
        debug!("created eye gaze spaces");
        Ok(())
    }

    /// World space gaze ray, or `None` while the eyes aren't tracked.
    pub fn update(&mut self, time: xr::Time, head: &Mat4) -> Option<Mat4> {
        let (Some(space), Some(view)) = (self.action_space, self.view_space) else {
            return None;
        };

        match self.runtime.pose_active(self.action, xr::Path::NULL) {
            Ok(true) => {}
            Ok(false) => return None,
            Err(e) => {
                trace!("failed to query eye gaze state: {e}");
                return None;
            }
        }

        let location = match self.runtime.locate_space(space, view, time) {
            Ok(location) => location,
            Err(e) => {
                trace!("failed to locate eye gaze: {e}");
                return None;
            }
        };
        if !location.location_flags.contains(
            xr::SpaceLocationFlags::POSITION_VALID | xr::SpaceLocationFlags::ORIENTATION_VALID,
        ) {
            return None;
        }

        let (_, head_rotation, _) = head.to_scale_rotation_translation();
        let position = head.transform_point3(vec3_from_xr(location.pose.position));
        let orientation: Quat = head_rotation * quat_from_xr(location.pose.orientation);
        let orientation = self.filter.filter(time.as_nanos(), orientation.normalize());

        Some(Mat4::from_rotation_translation(orientation, position))
    }
}

impl<R: Runtime> Drop for EyeGaze<R> {
    fn drop(&mut self) {
        for space in [self.action_space.take(), self.view_space.take()]
            .into_iter()
            .flatten()
        {
            self.runtime.destroy_space(space);
        }
    }
}
