//! Physics components and body descriptors for ECS entities.

use bitflags::bitflags;
use glam::{Quat, Vec3};

use crate::error::{FlipsideError, Result};
use crate::physics::BodyId;

/// Links an entity to its rigid body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PhysicsBody(pub BodyId);

/// Rigid body type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BodyKind {
    /// Affected by forces and collisions.
    #[default]
    Dynamic,
    /// Immovable, infinite mass.
    Static,
    /// Moved by setting target positions; pushes dynamic bodies.
    Kinematic,
}

bitflags! {
    /// Collision filter bits. A pair is tested only when each body's group
    /// intersects the other's mask.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CollisionGroups: u32 {
        const PLAYER = 1;
        const SCENE = 2;
        const OBJECTS = 4;
    }
}

impl Default for CollisionGroups {
    fn default() -> Self {
        Self::all()
    }
}

/// Collider shape.
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeDesc {
    Cuboid { half_extents: Vec3 },
    Ball { radius: f32 },
    /// Capsule aligned with local Y.
    CapsuleY { half_height: f32, radius: f32 },
    /// Cylinder aligned with local Y.
    Cylinder { half_height: f32, radius: f32 },
    ConvexHull { points: Vec<Vec3> },
}

impl ShapeDesc {
    /// Axis-aligned box with the given half extents.
    pub fn cuboid(hx: f32, hy: f32, hz: f32) -> Self {
        Self::Cuboid {
            half_extents: Vec3::new(hx, hy, hz),
        }
    }

    /// Check that every dimension is positive and finite.
    pub fn validate(&self) -> Result<()> {
        let positive = |v: f32| v.is_finite() && v > 0.0;
        let ok = match self {
            Self::Cuboid { half_extents } => half_extents.to_array().into_iter().all(positive),
            Self::Ball { radius } => positive(*radius),
            Self::CapsuleY {
                half_height,
                radius,
            }
            | Self::Cylinder {
                half_height,
                radius,
            } => positive(*half_height) && positive(*radius),
            Self::ConvexHull { points } => {
                if points.len() < 4 {
                    return Err(FlipsideError::InvalidShape(format!(
                        "convex hull needs at least 4 points, got {}",
                        points.len()
                    )));
                }
                points.iter().all(|p| p.is_finite())
            }
        };
        if ok {
            Ok(())
        } else {
            Err(FlipsideError::InvalidShape(format!("{self:?}")))
        }
    }
}

/// A shape placed relative to its body.
#[derive(Debug, Clone, PartialEq)]
pub struct ColliderDesc {
    pub shape: ShapeDesc,
    pub offset: Vec3,
    pub rotation: Quat,
}

impl ColliderDesc {
    /// A shape centered on its body.
    pub fn new(shape: ShapeDesc) -> Self {
        Self {
            shape,
            offset: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }

    /// Set the offset from the body origin.
    pub fn offset(mut self, offset: Vec3) -> Self {
        self.offset = offset;
        self
    }

    /// Set the rotation relative to the body.
    pub fn rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }
}

impl From<ShapeDesc> for ColliderDesc {
    fn from(shape: ShapeDesc) -> Self {
        Self::new(shape)
    }
}

/// How two surfaces combine their coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CombineRule {
    #[default]
    Average,
    Min,
    Multiply,
    Max,
}

/// Friction and bounciness of a body's colliders.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceMaterial {
    pub friction: f32,
    pub restitution: f32,
    pub friction_combine: CombineRule,
}

impl SurfaceMaterial {
    /// Level geometry.
    pub const GROUND: Self = Self {
        friction: 0.1,
        restitution: 0.3,
        friction_combine: CombineRule::Average,
    };

    /// Player bodies slide on the ground so walking velocity is not eaten by
    /// friction.
    pub const PLAYER: Self = Self {
        friction: 0.01,
        restitution: 0.3,
        friction_combine: CombineRule::Min,
    };
}

impl Default for SurfaceMaterial {
    fn default() -> Self {
        Self::GROUND
    }
}

/// Everything needed to create a rigid body with its colliders.
#[derive(Debug, Clone)]
pub struct BodyDesc {
    pub kind: BodyKind,
    pub position: Vec3,
    pub rotation: Quat,
    /// Total mass of a dynamic body, split across its colliders.
    pub mass: f32,
    pub colliders: Vec<ColliderDesc>,
    /// Detects overlaps without a physical response.
    pub sensor: bool,
    pub group: CollisionGroups,
    pub mask: CollisionGroups,
    pub material: SurfaceMaterial,
    pub linear_damping: f32,
    pub lock_rotations: bool,
    /// Disabled bodies keep their colliders out of the simulation.
    pub enabled: bool,
}

impl Default for BodyDesc {
    fn default() -> Self {
        Self {
            kind: BodyKind::Dynamic,
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            mass: 1.0,
            colliders: Vec::new(),
            sensor: false,
            group: CollisionGroups::OBJECTS,
            mask: CollisionGroups::all(),
            material: SurfaceMaterial::GROUND,
            linear_damping: 0.01,
            lock_rotations: false,
            enabled: true,
        }
    }
}

impl BodyDesc {
    /// A dynamic body with the given mass.
    pub fn dynamic(mass: f32) -> Self {
        Self {
            mass,
            ..Self::default()
        }
    }

    /// An immovable body.
    pub fn fixed() -> Self {
        Self {
            kind: BodyKind::Static,
            mass: 0.0,
            group: CollisionGroups::SCENE,
            ..Self::default()
        }
    }

    /// A body moved by target positions.
    pub fn kinematic() -> Self {
        Self {
            kind: BodyKind::Kinematic,
            mass: 0.0,
            group: CollisionGroups::SCENE,
            ..Self::default()
        }
    }

    /// Set the initial position.
    pub fn position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    /// Set the initial rotation.
    pub fn rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    /// Add a collider.
    pub fn collider(mut self, collider: impl Into<ColliderDesc>) -> Self {
        self.colliders.push(collider.into());
        self
    }

    /// Mark the body as a trigger volume.
    pub fn sensor(mut self, sensor: bool) -> Self {
        self.sensor = sensor;
        self
    }

    /// Set collision group membership and mask.
    pub fn groups(mut self, group: CollisionGroups, mask: CollisionGroups) -> Self {
        self.group = group;
        self.mask = mask;
        self
    }

    /// Set the surface material.
    pub fn material(mut self, material: SurfaceMaterial) -> Self {
        self.material = material;
        self
    }

    /// Set the linear damping.
    pub fn linear_damping(mut self, linear_damping: f32) -> Self {
        self.linear_damping = linear_damping;
        self
    }

    /// Prevent the solver from rotating the body.
    pub fn lock_rotations(mut self, lock: bool) -> Self {
        self.lock_rotations = lock;
        self
    }

    /// Set whether the colliders start enabled.
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Check shapes and mass.
    pub fn validate(&self) -> Result<()> {
        if self.kind == BodyKind::Dynamic && !(self.mass.is_finite() && self.mass > 0.0) {
            return Err(FlipsideError::InvalidShape(format!(
                "dynamic body needs a positive mass, got {}",
                self.mass
            )));
        }
        self.colliders.iter().try_for_each(|c| c.shape.validate())
    }
}
