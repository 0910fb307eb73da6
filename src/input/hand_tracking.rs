use super::gesture::{GestureManager, Pinch};
use crate::runtime::{Hand, HandTrackerHandle, HandTrackingRequest, Runtime, SpaceHandle};
use glam::Mat4;
use log::{debug, trace, warn};
use openxr as xr;
use std::rc::Rc;

/// What a tracked hand contributes to a frame in place of a controller.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct HandFrame {
    pub aim: Mat4,
    pub pinch: Pinch,
    pub system_gesture: bool,
}

/// One hand's joint tracker and the gesture manager interpreting it.
pub struct HandTracking<R: Runtime> {
    runtime: Rc<R>,
    hand: Hand,
    tracker: Option<HandTrackerHandle>,
    gestures: Box<dyn GestureManager>,
    creation_failed: bool,
}

impl<R: Runtime> HandTracking<R> {
    pub fn new(runtime: Rc<R>, hand: Hand, gestures: Box<dyn GestureManager>) -> Self {
        Self {
            runtime,
            hand,
            tracker: None,
            gestures,
            creation_failed: false,
        }
    }

    fn tracker(&mut self) -> Option<HandTrackerHandle> {
        if self.tracker.is_none() {
            match self.runtime.create_hand_tracker(self.hand) {
                Ok(tracker) => {
                    debug!("created {} hand tracker", self.hand.name());
                    self.tracker = Some(tracker);
                }
                Err(e) => {
                    if !self.creation_failed {
                        warn!("failed to create {} hand tracker: {e}", self.hand.name());
                        self.creation_failed = true;
                    }
                }
            }
        }
        self.tracker
    }

    /// Returns `None` while the hand isn't tracked well enough to aim with.
    pub fn update(&mut self, base: SpaceHandle, time: xr::Time, head: &Mat4) -> Option<HandFrame> {
        let tracker = self.tracker()?;

        let mut request = HandTrackingRequest::default();
        self.gestures.populate_extra_tracking_request(&mut request);

        let sample = match self.runtime.locate_hand_joints(tracker, base, time, &request) {
            Ok(Some(sample)) => sample,
            Ok(None) => return None,
            Err(e) => {
                trace!("failed to locate {} hand joints: {e}", self.hand.name());
                return None;
            }
        };

        if !self.gestures.has_valid_aim(&sample) {
            return None;
        }

        let aim = self
            .gestures
            .compute_aim_pose(time, self.hand, &sample, head);
        let pinch = self.gestures.detect_pinch(&sample);
        let system_gesture = self.gestures.detect_system_gesture(&sample, head);

        Some(HandFrame {
            aim,
            pinch,
            system_gesture,
        })
    }
}

impl<R: Runtime> Drop for HandTracking<R> {
    fn drop(&mut self) {
        if let Some(tracker) = self.tracker.take() {
            self.runtime.destroy_hand_tracker(tracker);
        }
    }
}
