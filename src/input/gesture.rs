//! Aim, pinch and system gesture detection for tracked hands.

use crate::config::{FilterParams, InputConfig, PinchConfig};
use crate::convert::{pose_to_mat4, vec3_from_xr};
use crate::filter::OneEuroFilterVector;
use crate::runtime::{Hand, HandJointsSample, HandTrackingRequest, HandTrackingSupport};
use glam::{Mat4, Quat, Vec3};
use openxr as xr;
use std::f32::consts::PI;

/// Shoulder position relative to the head, for the right arm.
const SHOULDER_OFFSET: Vec3 = Vec3::new(0.15, -0.25, 0.0);
const HAND_HEAD_ALIGNMENT: f32 = 0.8;
const HAND_HEAD_DISTANCE: f32 = 0.10;

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Pinch {
    pub pinching: bool,
    /// 0 with the fingers apart, 1 with them touching.
    pub factor: f32,
}

/// Measures the thumb to index distance, smoothing it and applying hysteresis so a pinch
/// doesn't flicker around the threshold.
#[derive(Clone, Debug)]
pub struct PinchDetector {
    config: PinchConfig,
    smoothed: Option<f32>,
    pinching: bool,
}

impl PinchDetector {
    pub fn new(config: PinchConfig) -> Self {
        Self {
            config,
            smoothed: None,
            pinching: false,
        }
    }

    pub fn update(&mut self, sample: &HandJointsSample) -> Pinch {
        if !sample.is_joint_position_valid(xr::HandJoint::THUMB_TIP)
            || !sample.is_joint_position_valid(xr::HandJoint::INDEX_TIP)
        {
            self.pinching = false;
            return Pinch::default();
        }

        let thumb = vec3_from_xr(sample.joint(xr::HandJoint::THUMB_TIP).pose.position);
        let index = vec3_from_xr(sample.joint(xr::HandJoint::INDEX_TIP).pose.position);
        self.measure(thumb.distance(index))
    }

    fn measure(&mut self, distance: f32) -> Pinch {
        let PinchConfig {
            threshold,
            release_threshold,
            start,
            smoothing,
        } = self.config;

        let smoothed = match self.smoothed {
            Some(prev) => smoothing * distance + (1.0 - smoothing) * prev,
            None => distance,
        };
        self.smoothed = Some(smoothed);

        self.pinching = if self.pinching {
            smoothed < release_threshold
        } else {
            smoothed < threshold
        };

        let factor = 1.0 - ((smoothed - threshold) / (start - threshold)).clamp(0.0, 1.0);
        Pinch {
            pinching: self.pinching,
            factor,
        }
    }
}

/// Whether the palm faces the user's eyes, closely enough to be meant as a gesture.
pub fn hand_faces_head(hand: &Mat4, head: &Mat4) -> bool {
    // With the hand upright and facing the head its Y axis matches the head's -Z.
    let hand_direction = hand.transform_vector3(Vec3::Y).normalize();
    let head_direction = head.transform_vector3(Vec3::NEG_Z).normalize();
    if hand_direction.dot(head_direction) <= HAND_HEAD_ALIGNMENT {
        return false;
    }

    let hand_to_head = hand.transform_point3(Vec3::ZERO) - head.transform_point3(Vec3::ZERO);
    let along_gaze = head_direction * hand_to_head.dot(head_direction);
    let in_plane = hand_to_head - along_gaze;

    in_plane.x.abs() < HAND_HEAD_DISTANCE && in_plane.y.abs() < HAND_HEAD_DISTANCE
}

/// Rotation taking +Z onto the direction from `source` to `target`. Identity when the two
/// points coincide.
pub fn look_at(source: Vec3, target: Vec3) -> Quat {
    const EPSILON: f32 = 1e-6;
    let forward = (target - source).normalize_or_zero();
    if forward == Vec3::ZERO {
        return Quat::IDENTITY;
    }
    let dot = Vec3::Z.dot(forward);

    if (dot + 1.0).abs() < EPSILON {
        return Quat::from_rotation_y(PI);
    }
    if (dot - 1.0).abs() < EPSILON {
        return Quat::IDENTITY;
    }

    let axis = Vec3::Z.cross(forward).normalize();
    Quat::from_axis_angle(axis, dot.clamp(-1.0, 1.0).acos())
}

fn palm_transform(sample: &HandJointsSample) -> Mat4 {
    pose_to_mat4(sample.joint(xr::HandJoint::PALM).pose)
}

pub trait GestureManager {
    /// Asks for whatever extra data this manager needs from the hand joint query.
    fn populate_extra_tracking_request(&self, request: &mut HandTrackingRequest);
    fn has_valid_aim(&self, sample: &HandJointsSample) -> bool;
    /// Only meaningful if [`Self::has_valid_aim`] holds for `sample`.
    fn compute_aim_pose(
        &mut self,
        time: xr::Time,
        hand: Hand,
        sample: &HandJointsSample,
        head: &Mat4,
    ) -> Mat4;
    fn detect_system_gesture(&self, sample: &HandJointsSample, head: &Mat4) -> bool;

    fn pinch_detector(&mut self) -> &mut PinchDetector;

    fn detect_pinch(&mut self, sample: &HandJointsSample) -> Pinch {
        self.pinch_detector().update(sample)
    }
}

/// Picks the gesture manager matching what the runtime supports.
pub fn create_gesture_manager(
    support: HandTrackingSupport,
    config: &InputConfig,
) -> Option<Box<dyn GestureManager>> {
    match support {
        HandTrackingSupport::None => None,
        HandTrackingSupport::Joints => Some(Box::new(JointGestures::new(
            config.hand_filter,
            config.pinch,
        ))),
        HandTrackingSupport::JointsWithAim => Some(Box::new(RuntimeAimGestures::new(config))),
    }
}

/// Uses the aim computed by the runtime (XR_FB_hand_tracking_aim), which is already stable.
pub struct RuntimeAimGestures {
    pinch: PinchDetector,
    trust_pinch: bool,
    trust_system_gesture: bool,
}

impl RuntimeAimGestures {
    pub fn new(config: &InputConfig) -> Self {
        Self {
            pinch: PinchDetector::new(config.pinch),
            trust_pinch: config.trust_runtime_pinch,
            trust_system_gesture: config.trust_runtime_system_gesture,
        }
    }
}

impl GestureManager for RuntimeAimGestures {
    fn populate_extra_tracking_request(&self, request: &mut HandTrackingRequest) {
        request.aim_state = true;
    }

    fn has_valid_aim(&self, sample: &HandJointsSample) -> bool {
        sample.aim.is_some_and(|aim| aim.valid)
    }

    fn compute_aim_pose(
        &mut self,
        _: xr::Time,
        _: Hand,
        sample: &HandJointsSample,
        _: &Mat4,
    ) -> Mat4 {
        sample
            .aim
            .map(|aim| pose_to_mat4(aim.aim_pose))
            .unwrap_or(Mat4::IDENTITY)
    }

    fn detect_system_gesture(&self, sample: &HandJointsSample, head: &Mat4) -> bool {
        match sample.aim {
            Some(aim) if self.trust_system_gesture => aim.system_gesture,
            _ => hand_faces_head(&palm_transform(sample), head),
        }
    }

    fn pinch_detector(&mut self) -> &mut PinchDetector {
        &mut self.pinch
    }

    fn detect_pinch(&mut self, sample: &HandJointsSample) -> Pinch {
        match sample.aim {
            Some(aim) if self.trust_pinch => Pinch {
                pinching: aim.index_pinching,
                factor: aim.pinch_strength_index,
            },
            _ => self.pinch.update(sample),
        }
    }
}

/// Derives the aim from the raw joints: a ray from the shoulder through the hand.
pub struct JointGestures {
    position_filter: Option<OneEuroFilterVector>,
    pinch: PinchDetector,
}

impl JointGestures {
    pub fn new(filter: Option<FilterParams>, pinch: PinchConfig) -> Self {
        Self {
            position_filter: filter.map(OneEuroFilterVector::new),
            pinch: PinchDetector::new(pinch),
        }
    }
}

impl GestureManager for JointGestures {
    fn populate_extra_tracking_request(&self, _: &mut HandTrackingRequest) {}

    fn has_valid_aim(&self, sample: &HandJointsSample) -> bool {
        sample.is_joint_position_valid(xr::HandJoint::MIDDLE_PROXIMAL)
    }

    fn compute_aim_pose(
        &mut self,
        time: xr::Time,
        hand: Hand,
        sample: &HandJointsSample,
        head: &Mat4,
    ) -> Mat4 {
        let position = vec3_from_xr(sample.joint(xr::HandJoint::MIDDLE_PROXIMAL).pose.position);
        let filtered = match &mut self.position_filter {
            Some(filter) => filter.filter(time.as_nanos(), position),
            None => position,
        };

        let mut shoulder = SHOULDER_OFFSET;
        if hand == Hand::Left {
            shoulder.x = -shoulder.x;
        }
        let shoulder = head.transform_point3(shoulder);

        Mat4::from_rotation_translation(look_at(filtered, shoulder), position)
    }

    fn detect_system_gesture(&self, sample: &HandJointsSample, head: &Mat4) -> bool {
        hand_faces_head(&palm_transform(sample), head)
    }

    fn pinch_detector(&mut self) -> &mut PinchDetector {
        &mut self.pinch
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::convert::{quat_to_xr, vec3_to_xr};
    use crate::runtime::AimState;

    pub fn joint_location(
        position: Vec3,
        orientation: Quat,
        valid: bool,
    ) -> xr::HandJointLocation {
        xr::HandJointLocation {
            location_flags: if valid {
                xr::SpaceLocationFlags::POSITION_VALID | xr::SpaceLocationFlags::ORIENTATION_VALID
            } else {
                xr::SpaceLocationFlags::EMPTY
            },
            pose: xr::Posef {
                orientation: quat_to_xr(orientation),
                position: vec3_to_xr(position),
            },
            radius: 0.01,
        }
    }

    /// A hand held 40cm in front of the origin, with the thumb and index `pinch_distance` apart.
    pub fn open_hand(pinch_distance: f32) -> HandJointsSample {
        let base = Vec3::new(0.0, 0.0, -0.4);
        let mut joints = [joint_location(base, Quat::IDENTITY, true); xr::HAND_JOINT_COUNT];
        joints[xr::HandJoint::THUMB_TIP.into_raw() as usize] =
            joint_location(base + Vec3::new(-0.02, 0.0, 0.0), Quat::IDENTITY, true);
        joints[xr::HandJoint::INDEX_TIP.into_raw() as usize] = joint_location(
            base + Vec3::new(pinch_distance - 0.02, 0.0, 0.0),
            Quat::IDENTITY,
            true,
        );
        HandJointsSample { joints, aim: None }
    }

    #[test]
    fn look_at_degenerate_directions() {
        assert_eq!(look_at(Vec3::ZERO, Vec3::Z), Quat::IDENTITY);

        let turned = look_at(Vec3::ZERO, Vec3::NEG_Z);
        assert!(turned.is_normalized());
        assert!((turned * Vec3::Z).abs_diff_eq(Vec3::NEG_Z, 1e-5));
    }

    #[test]
    fn look_at_same_point_is_identity() {
        let point = Vec3::new(0.2, 1.4, -0.3);
        let rotation = look_at(point, point);
        assert!(!rotation.is_nan());
        assert_eq!(rotation, Quat::IDENTITY);
    }

    #[test]
    fn look_at_points_z_at_target() {
        let source = Vec3::new(0.2, 1.0, -0.4);
        let target = Vec3::new(0.15, 1.35, 0.0);
        let rotation = look_at(source, target);
        let direction = (target - source).normalize();
        assert!((rotation * Vec3::Z).abs_diff_eq(direction, 1e-5));
    }

    #[test]
    fn pinch_uses_hysteresis() {
        let mut detector = PinchDetector::new(PinchConfig {
            smoothing: 1.0,
            ..Default::default()
        });

        let apart = detector.measure(0.08);
        assert!(!apart.pinching);
        assert_eq!(apart.factor, 0.0);

        assert!(detector.measure(0.015).pinching);
        // between the thresholds: stays pinched
        let held = detector.measure(0.022);
        assert!(held.pinching);
        assert!(held.factor > 0.0 && held.factor < 1.0);
        assert!(!detector.measure(0.03).pinching);
        // and going back between them doesn't start a new pinch
        assert!(!detector.measure(0.022).pinching);
    }

    #[test]
    fn pinch_distance_is_smoothed() {
        let mut detector = PinchDetector::new(PinchConfig::default());
        detector.measure(0.05);
        // a single close sample only halves the distance
        assert!(!detector.measure(0.0).pinching);
        assert!(detector.measure(0.0).pinching);
    }

    #[test]
    fn invalid_tips_mean_no_pinch() {
        let mut sample = open_hand(0.0);
        sample.joints[xr::HandJoint::THUMB_TIP.into_raw() as usize].location_flags =
            xr::SpaceLocationFlags::EMPTY;

        let mut detector = PinchDetector::new(PinchConfig::default());
        assert_eq!(detector.update(&sample), Pinch::default());
        assert!(detector.update(&open_hand(0.0)).pinching);
    }

    #[test]
    fn palm_facing_head_is_detected() {
        let head = Mat4::from_translation(Vec3::new(0.0, 1.6, 0.0));
        // palm Y axis turned to point along the head's -Z
        let facing = Quat::from_rotation_x(-std::f32::consts::FRAC_PI_2);
        let hand = Mat4::from_rotation_translation(facing, Vec3::new(0.03, 1.58, -0.3));
        assert!(hand_faces_head(&hand, &head));

        let off_center = Mat4::from_rotation_translation(facing, Vec3::new(0.3, 1.58, -0.3));
        assert!(!hand_faces_head(&off_center, &head));

        let upright = Mat4::from_translation(Vec3::new(0.03, 1.58, -0.3));
        assert!(!hand_faces_head(&upright, &head));
    }

    #[test]
    fn joint_aim_points_away_from_shoulder() {
        let mut gestures = JointGestures::new(None, PinchConfig::default());
        let sample = open_hand(0.05);
        assert!(gestures.has_valid_aim(&sample));

        let aim = gestures.compute_aim_pose(
            xr::Time::from_nanos(1),
            Hand::Right,
            &sample,
            &Mat4::IDENTITY,
        );
        let position = aim.transform_point3(Vec3::ZERO);
        assert!(position.abs_diff_eq(Vec3::new(0.0, 0.0, -0.4), 1e-6));

        let shoulder = Vec3::new(0.15, -0.25, 0.0);
        let forward = aim.transform_vector3(Vec3::NEG_Z);
        assert!(forward.abs_diff_eq((position - shoulder).normalize(), 1e-5), "{forward}");
    }

    #[test]
    fn runtime_aim_is_trusted_when_configured() {
        let mut config = InputConfig::default();
        let mut sample = open_hand(0.08);
        sample.aim = Some(AimState {
            valid: true,
            index_pinching: true,
            pinch_strength_index: 0.9,
            ..Default::default()
        });

        let mut gestures = RuntimeAimGestures::new(&config);
        let mut request = HandTrackingRequest::default();
        gestures.populate_extra_tracking_request(&mut request);
        assert!(request.aim_state);
        assert!(gestures.has_valid_aim(&sample));
        assert_eq!(
            gestures.detect_pinch(&sample),
            Pinch {
                pinching: true,
                factor: 0.9
            }
        );

        config.trust_runtime_pinch = false;
        let mut gestures = RuntimeAimGestures::new(&config);
        assert!(!gestures.detect_pinch(&sample).pinching);
    }

    #[test]
    fn gesture_manager_follows_runtime_support() {
        let config = InputConfig::default();
        assert!(create_gesture_manager(HandTrackingSupport::None, &config).is_none());

        let sample = open_hand(0.05);
        let joints = create_gesture_manager(HandTrackingSupport::Joints, &config).unwrap();
        assert!(joints.has_valid_aim(&sample));
        let aim = create_gesture_manager(HandTrackingSupport::JointsWithAim, &config).unwrap();
        // no aim state in the sample
        assert!(!aim.has_valid_aim(&sample));
    }
}
