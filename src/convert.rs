use glam::{Mat4, Quat, Vec3};
use openxr as xr;

#[inline]
pub fn vec3_from_xr(value: xr::Vector3f) -> Vec3 {
    Vec3::new(value.x, value.y, value.z)
}

#[inline]
pub fn vec3_to_xr(value: Vec3) -> xr::Vector3f {
    xr::Vector3f {
        x: value.x,
        y: value.y,
        z: value.z,
    }
}

#[inline]
pub fn quat_from_xr(value: xr::Quaternionf) -> Quat {
    Quat::from_xyzw(value.x, value.y, value.z, value.w)
}

#[inline]
pub fn quat_to_xr(value: Quat) -> xr::Quaternionf {
    xr::Quaternionf {
        x: value.x,
        y: value.y,
        z: value.z,
        w: value.w,
    }
}

pub fn pose_to_mat4(pose: xr::Posef) -> Mat4 {
    Mat4::from_rotation_translation(
        quat_from_xr(pose.orientation).normalize(),
        vec3_from_xr(pose.position),
    )
}

pub fn mat4_to_pose(matrix: Mat4) -> xr::Posef {
    let (_, rotation, translation) = matrix.to_scale_rotation_translation();
    xr::Posef {
        orientation: quat_to_xr(rotation),
        position: vec3_to_xr(translation),
    }
}
