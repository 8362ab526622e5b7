//! Orbit camera that follows the active player under any gravity.
//!
//! The orbit is authored in a gravity-agnostic frame where up is +Y, then
//! carried into the world by the minimal rotation from +Y onto the player's
//! up. The look-at is built from two rotations, one around the player's up
//! and one around the camera's right axis, so the camera never rolls when
//! gravity is tilted.

use std::f32::consts::FRAC_PI_2;

use glam::{Mat4, Quat, Vec3};

use crate::config::CameraConfig;
use crate::ecs::components::player::CameraAngle;
use crate::input::MoveInput;
use crate::math::{project_on_plane, signed_angle, up_from_gravity};

/// Where a camera is and how it is turned.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl CameraPose {
    /// Viewing direction (-Z in camera space).
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    /// Right-handed view matrix for the renderer.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_to_rh(self.position, self.forward(), self.up())
    }

    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.rotation.is_finite()
    }
}

/// What the camera follows this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FollowTarget {
    pub position: Vec3,
    pub gravity: Vec3,
    /// Angles the player asks for; the camera eases toward them.
    pub angle: CameraAngle,
}

/// Smoothed third-person orbit camera.
#[derive(Debug, Clone)]
pub struct FollowCamera {
    radius: f32,
    smoothing: f32,
    angle: CameraAngle,
    pose: CameraPose,
}

impl FollowCamera {
    pub fn new(config: &CameraConfig) -> Self {
        Self {
            radius: config.radius,
            smoothing: config.smoothing,
            angle: CameraAngle::new(config.initial_yaw, config.initial_pitch),
            pose: CameraPose {
                position: Vec3::ZERO,
                rotation: Quat::IDENTITY,
            },
        }
    }

    /// Current smoothed angles.
    pub fn angle(&self) -> CameraAngle {
        self.angle
    }

    /// Pose from the last update.
    pub fn pose(&self) -> CameraPose {
        self.pose
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Jump straight to `angle`, skipping the easing.
    pub fn snap(&mut self, angle: CameraAngle) {
        self.angle = angle;
    }

    /// Ease toward the target's angles and compute the new pose.
    pub fn update(&mut self, target: &FollowTarget) -> CameraPose {
        self.angle.yaw += (target.angle.yaw - self.angle.yaw) * self.smoothing;
        self.angle.pitch += (target.angle.pitch - self.angle.pitch) * self.smoothing;

        let up = up_from_gravity(target.gravity).unwrap_or(Vec3::Y);
        let align_top = Quat::from_rotation_arc(Vec3::Y, up);

        let position = target.position + align_top * orbit_offset(self.radius, self.angle);
        let rotation = look_at(position, target.position, up, align_top);

        self.pose = CameraPose { position, rotation };
        self.pose
    }

    /// Body orientation that keeps the player upright under `gravity` and
    /// facing away from a camera at `yaw`.
    ///
    /// The player model's forward is its local +X, a quarter turn from the
    /// camera's -Z convention.
    pub fn body_orientation(gravity: Vec3, yaw: f32) -> Quat {
        let up = up_from_gravity(gravity).unwrap_or(Vec3::Y);
        Quat::from_rotation_arc(Vec3::Y, up) * Quat::from_rotation_y(yaw + FRAC_PI_2)
    }
}

/// Camera offset from the target in the up = +Y frame. `pitch` is measured
/// from +Y and `yaw` around it, starting at +Z.
fn orbit_offset(radius: f32, angle: CameraAngle) -> Vec3 {
    let (sin_pitch, cos_pitch) = angle.pitch.sin_cos();
    let (sin_yaw, cos_yaw) = angle.yaw.sin_cos();
    Vec3::new(
        radius * sin_pitch * sin_yaw,
        radius * cos_pitch,
        radius * sin_pitch * cos_yaw,
    )
}

/// Turn a camera at `eye` toward `target` without rolling around `up`.
fn look_at(eye: Vec3, target: Vec3, up: Vec3, align_top: Quat) -> Quat {
    let Some(dir) = (target - eye).try_normalize() else {
        return align_top;
    };
    let mut rotation = align_top;

    // Yaw around up, comparing the two directions in the horizontal plane.
    let forward = project_on_plane(rotation * Vec3::NEG_Z, up).try_normalize();
    let wanted = project_on_plane(dir, up).try_normalize();
    if let (Some(forward), Some(wanted)) = (forward, wanted) {
        let angle = signed_angle(forward, wanted, up);
        rotation = Quat::from_axis_angle(up, angle) * rotation;
    }

    // Pitch around the camera's right axis.
    let right = rotation * Vec3::X;
    let forward = rotation * Vec3::NEG_Z;
    let angle = signed_angle(forward, dir, right);
    (Quat::from_axis_angle(right, angle) * rotation).normalize()
}

/// World velocity for movement keys, relative to where the body faces.
///
/// Forward runs along the body's local +X and strafe along its local +Z.
pub fn input_velocity(body_rotation: Quat, input: MoveInput, walk_speed: f32) -> Vec3 {
    let local = Vec3::new(input.forward, 0.0, input.strafe);
    (body_rotation * local).normalize_or_zero() * walk_speed
}
