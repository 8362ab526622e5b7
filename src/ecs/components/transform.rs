//! Render-facing transform component.

use glam::{Mat4, Quat, Vec3};

/// World-space transform handed to the renderer each tick.
///
/// Bodies are the authority for position and rotation; this component is
/// overwritten from them by [`sync_transforms`](crate::ecs::systems::sync_transforms).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Transform {
    /// Create an identity transform.
    pub fn identity() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }

    /// Create a transform from a position.
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::identity()
        }
    }

    /// Create a transform from a position and rotation.
    pub fn from_pose(position: Vec3, rotation: Quat) -> Self {
        Self {
            position,
            rotation,
            scale: Vec3::ONE,
        }
    }

    /// Convert to a 4x4 matrix (translation * rotation * scale).
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }

    /// Direction of the transform's local +Y axis in world space.
    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity() {
        let t = Transform::identity();
        assert_eq!(t.to_matrix(), Mat4::IDENTITY);
        assert_eq!(Transform::default(), t);
    }

    #[test]
    fn test_from_pose_matrix() {
        let rotation = Quat::from_rotation_x(std::f32::consts::PI);
        let t = Transform::from_pose(Vec3::new(1.0, 2.0, 3.0), rotation);
        let origin = t.to_matrix().transform_point3(Vec3::ZERO);
        assert!((origin - Vec3::new(1.0, 2.0, 3.0)).length() < 1e-5);
        assert!((t.up() - Vec3::NEG_Y).length() < 1e-5, "flipped body points up along -Y");
    }
}
