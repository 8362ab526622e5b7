//! Conversions between glam and the physics engine's nalgebra types, plus a
//! few vector helpers used by the gravity and camera code.
//!
//! Gameplay code works in glam. Only `physics` touches nalgebra, through the
//! adapters here.

use glam::{Quat, Vec3};
use rapier3d::na::{Isometry3, Quaternion, Translation3, UnitQuaternion, Vector3};

/// Tolerance for near-parallel checks in orientation math.
pub const EPS: f32 = 0.01;

/// Convert a glam vector into a physics vector.
#[inline]
pub fn vec_to_na(v: Vec3) -> Vector3<f32> {
    Vector3::new(v.x, v.y, v.z)
}

/// Convert a physics vector into a glam vector.
#[inline]
pub fn vec_from_na(v: &Vector3<f32>) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

/// Convert a glam quaternion into a physics rotation.
///
/// The input is renormalized, so slightly drifted quaternions are accepted.
#[inline]
pub fn quat_to_na(q: Quat) -> UnitQuaternion<f32> {
    UnitQuaternion::new_normalize(Quaternion::new(q.w, q.x, q.y, q.z))
}

/// Convert a physics rotation into a glam quaternion.
#[inline]
pub fn quat_from_na(q: &UnitQuaternion<f32>) -> Quat {
    let c = q.coords;
    Quat::from_xyzw(c.x, c.y, c.z, c.w)
}

/// Build a physics pose from a translation and rotation.
pub fn isometry(translation: Vec3, rotation: Quat) -> Isometry3<f32> {
    Isometry3::from_parts(Translation3::from(vec_to_na(translation)), quat_to_na(rotation))
}

/// Remove the component of `v` along the unit normal `n`.
#[inline]
pub fn project_on_plane(v: Vec3, n: Vec3) -> Vec3 {
    v - n * v.dot(n)
}

/// Signed angle that rotates unit vector `from` onto unit vector `to` about
/// `axis`.
///
/// The sign follows `axis · (from × to)`. When the two directions are close
/// to parallel the cross product is tiny and its sign unreliable, so values
/// within [`EPS`] count as positive.
pub fn signed_angle(from: Vec3, to: Vec3, axis: Vec3) -> f32 {
    let angle = from.dot(to).clamp(-1.0, 1.0).acos();
    if axis.dot(from.cross(to)) < -EPS {
        -angle
    } else {
        angle
    }
}

/// Local up for a gravity vector, or `None` if gravity has no direction.
#[inline]
pub fn up_from_gravity(gravity: Vec3) -> Option<Vec3> {
    (-gravity).try_normalize()
}

/// Whether a vector is usable as a gravity vector.
#[inline]
pub fn is_valid_gravity(gravity: Vec3) -> bool {
    gravity.is_finite() && gravity.length_squared() > f32::EPSILON
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_quat_conversion_preserves_rotation() {
        let q = Quat::from_axis_angle(Vec3::new(1.0, 2.0, -0.5).normalize(), 1.2);
        let back = quat_from_na(&quat_to_na(q));
        assert!(q.dot(back).abs() > 1.0 - 1e-6);

        let v = Vec3::new(0.3, -1.0, 2.0);
        let rotated_na = quat_to_na(q) * vec_to_na(v);
        let rotated = vec_from_na(&rotated_na);
        assert!((rotated - q * v).length() < 1e-5);
    }

    #[test]
    fn test_isometry_parts() {
        let iso = isometry(Vec3::new(1.0, 2.0, 3.0), Quat::from_rotation_y(FRAC_PI_2));
        assert_eq!(vec_from_na(&iso.translation.vector), Vec3::new(1.0, 2.0, 3.0));
        let x = vec_from_na(&(iso.rotation * Vector3::x()));
        assert!((x - Vec3::new(0.0, 0.0, -1.0)).length() < 1e-5);
    }

    #[test]
    fn test_signed_angle_sign() {
        assert_relative_eq!(signed_angle(Vec3::X, Vec3::Z, Vec3::Y), -FRAC_PI_2, epsilon = 1e-5);
        assert_relative_eq!(signed_angle(Vec3::Z, Vec3::X, Vec3::Y), FRAC_PI_2, epsilon = 1e-5);
    }

    #[test]
    fn test_signed_angle_near_parallel_is_finite() {
        let a = Vec3::X;
        let b = Vec3::new(1.0, 1e-4, 0.0).normalize();
        let angle = signed_angle(a, b, Vec3::Z);
        assert!(angle.is_finite());
        assert!(angle >= 0.0);
    }

    #[test]
    fn test_project_on_plane() {
        let v = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(project_on_plane(v, Vec3::Y), Vec3::new(1.0, 0.0, 3.0));
    }

    #[test]
    fn test_gravity_validation() {
        assert!(is_valid_gravity(Vec3::new(0.0, -9.82, 0.0)));
        assert!(!is_valid_gravity(Vec3::ZERO));
        assert!(!is_valid_gravity(Vec3::new(f32::NAN, 0.0, 0.0)));
        assert_eq!(up_from_gravity(Vec3::new(0.0, 0.0, 3.0)), Some(Vec3::NEG_Z));
        assert_eq!(up_from_gravity(Vec3::ZERO), None);
    }
}
