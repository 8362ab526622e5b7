//! Translation from body descriptors to engine bodies and colliders.

use rapier3d::prelude::{
    ActiveEvents, CoefficientCombineRule, Collider, ColliderBuilder, Group, InteractionGroups,
    Point, RigidBody, RigidBodyBuilder,
};

use crate::ecs::components::physics::{
    BodyDesc, BodyKind, ColliderDesc, CollisionGroups, CombineRule, ShapeDesc, SurfaceMaterial,
};
use crate::error::{FlipsideError, Result};
use crate::math::isometry;

/// Collider settings shared by every shape of one body, kept so shapes can
/// be appended after creation.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ColliderTemplate {
    pub dynamic: bool,
    pub sensor: bool,
    pub group: CollisionGroups,
    pub mask: CollisionGroups,
    pub material: SurfaceMaterial,
    pub enabled: bool,
}

impl From<&BodyDesc> for ColliderTemplate {
    fn from(desc: &BodyDesc) -> Self {
        Self {
            dynamic: desc.kind == BodyKind::Dynamic,
            sensor: desc.sensor,
            group: desc.group,
            mask: desc.mask,
            material: desc.material,
            enabled: desc.enabled,
        }
    }
}

pub(crate) fn build_body(desc: &BodyDesc) -> RigidBody {
    let builder = match desc.kind {
        BodyKind::Dynamic => RigidBodyBuilder::dynamic(),
        BodyKind::Static => RigidBodyBuilder::fixed(),
        BodyKind::Kinematic => RigidBodyBuilder::kinematic_position_based(),
    };
    let mut builder = builder
        .position(isometry(desc.position, desc.rotation))
        .linear_damping(desc.linear_damping);

    if desc.lock_rotations {
        builder = builder.lock_rotations();
    }
    // Shapes may arrive later; the body still needs its mass until then.
    if desc.kind == BodyKind::Dynamic && desc.colliders.is_empty() {
        builder = builder.additional_mass(desc.mass);
    }
    builder.build()
}

/// Mass each initial collider of a dynamic body carries.
pub(crate) fn collider_mass(desc: &BodyDesc) -> Option<f32> {
    (desc.kind == BodyKind::Dynamic && !desc.colliders.is_empty())
        .then(|| desc.mass / desc.colliders.len() as f32)
}

/// Build a collider. `mass` applies to dynamic bodies only; `None` makes the
/// shape massless so it does not change an existing body's mass.
pub(crate) fn build_collider(
    collider: &ColliderDesc,
    template: &ColliderTemplate,
    mass: Option<f32>,
) -> Result<Collider> {
    collider.shape.validate()?;

    let builder = match &collider.shape {
        ShapeDesc::Cuboid { half_extents } => {
            ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
        }
        ShapeDesc::Ball { radius } => ColliderBuilder::ball(*radius),
        ShapeDesc::CapsuleY {
            half_height,
            radius,
        } => ColliderBuilder::capsule_y(*half_height, *radius),
        ShapeDesc::Cylinder {
            half_height,
            radius,
        } => ColliderBuilder::cylinder(*half_height, *radius),
        ShapeDesc::ConvexHull { points } => {
            let points: Vec<Point<f32>> =
                points.iter().map(|p| Point::new(p.x, p.y, p.z)).collect();
            ColliderBuilder::convex_hull(&points).ok_or_else(|| {
                FlipsideError::InvalidShape("degenerate convex hull".to_string())
            })?
        }
    };

    let mut builder = builder
        .position(isometry(collider.offset, collider.rotation))
        .sensor(template.sensor)
        .collision_groups(interaction_groups(template.group, template.mask))
        .active_events(ActiveEvents::COLLISION_EVENTS)
        .friction(template.material.friction)
        .restitution(template.material.restitution)
        .friction_combine_rule(combine_rule(template.material.friction_combine))
        .enabled(template.enabled);

    if template.dynamic {
        builder = builder.mass(mass.unwrap_or(0.0));
    }
    Ok(builder.build())
}

pub(crate) fn interaction_groups(
    group: CollisionGroups,
    mask: CollisionGroups,
) -> InteractionGroups {
    InteractionGroups::new(
        Group::from_bits_truncate(group.bits()),
        Group::from_bits_truncate(mask.bits()),
    )
}

fn combine_rule(rule: CombineRule) -> CoefficientCombineRule {
    match rule {
        CombineRule::Average => CoefficientCombineRule::Average,
        CombineRule::Min => CoefficientCombineRule::Min,
        CombineRule::Multiply => CoefficientCombineRule::Multiply,
        CombineRule::Max => CoefficientCombineRule::Max,
    }
}
