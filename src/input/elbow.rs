//! Arm model used to place controllers that only track orientation.

use crate::runtime::Hand;
use glam::{Mat4, Quat, Vec3};

/// Elbow position relative to the head, for the right arm, in the head's yaw frame.
const ELBOW_OFFSET: Vec3 = Vec3::new(0.195, -0.5, 0.075);
const FOREARM: Vec3 = Vec3::new(0.0, 0.0, -0.25);
const WRIST_TO_CONTROLLER: Vec3 = Vec3::new(0.0, 0.0, -0.05);

/// Rotation around Y that matches the direction the head faces, ignoring pitch and roll.
fn head_yaw(head: &Mat4) -> Quat {
    let forward = head.transform_vector3(Vec3::NEG_Z);
    if forward.x.abs() < f32::EPSILON && forward.z.abs() < f32::EPSILON {
        return Quat::IDENTITY;
    }
    Quat::from_rotation_y((-forward.x).atan2(-forward.z))
}

/// Places a controller with orientation `controller` at a plausible hand position, given the
/// head pose.
pub fn controller_transform(hand: Hand, head: &Mat4, controller: &Mat4) -> Mat4 {
    let (_, orientation, _) = controller.to_scale_rotation_translation();
    let mut offset = ELBOW_OFFSET;
    if hand == Hand::Left {
        offset.x = -offset.x;
    }

    let elbow = head.transform_point3(Vec3::ZERO) + head_yaw(head) * offset;
    let wrist = elbow + orientation * FOREARM;
    let position = wrist + orientation * WRIST_TO_CONTROLLER;

    Mat4::from_rotation_translation(orientation, position)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn hands_are_mirrored() {
        let head = Mat4::from_translation(Vec3::new(0.0, 1.6, 0.0));
        let left = controller_transform(Hand::Left, &head, &Mat4::IDENTITY);
        let right = controller_transform(Hand::Right, &head, &Mat4::IDENTITY);

        let left = left.transform_point3(Vec3::ZERO);
        let right = right.transform_point3(Vec3::ZERO);
        assert!(left.abs_diff_eq(Vec3::new(-0.195, 1.1, -0.225), 1e-5), "{left}");
        assert!(right.abs_diff_eq(Vec3::new(0.195, 1.1, -0.225), 1e-5), "{right}");
    }

    #[test]
    fn follows_head_yaw_but_not_pitch() {
        let turned = Mat4::from_quat(Quat::from_rotation_y(FRAC_PI_2));
        let right = controller_transform(Hand::Right, &turned, &Mat4::IDENTITY)
            .transform_point3(Vec3::ZERO);
        // The shoulder offset rotates with the head: right of a head facing -X is -Z.
        // The forearm keeps following the controller, which still points at -Z.
        assert!(
            right.abs_diff_eq(Vec3::new(0.075, -0.5, -0.495), 1e-5),
            "{right}"
        );

        let pitched = Mat4::from_quat(Quat::from_rotation_x(0.5));
        let right = controller_transform(Hand::Right, &pitched, &Mat4::IDENTITY)
            .transform_point3(Vec3::ZERO);
        assert!((right.y - -0.5).abs() < 1e-5, "{right}");
    }

    #[test]
    fn keeps_controller_orientation() {
        let rotation = Quat::from_rotation_x(-0.3);
        let transform =
            controller_transform(Hand::Left, &Mat4::IDENTITY, &Mat4::from_quat(rotation));
        let (_, out, _) = transform.to_scale_rotation_translation();
        assert!(out.abs_diff_eq(rotation, 1e-5));
    }
}
