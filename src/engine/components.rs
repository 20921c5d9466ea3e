// Core ECS components for the engine
// These are reusable across any scene built with this engine

use bevy_ecs::prelude::*;
use glam::{EulerRot, Mat4, Quat, Vec3};

use super::collision::Aabb;
use super::collision::Triangle;
use super::tween::Timeline;

/// Local transform of an entity (translation, rotation, non-uniform scale)
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn from_position(position: Vec3) -> Self {
        Self { position, ..Default::default() }
    }

    pub fn from_matrix(m: Mat4) -> Self {
        let (scale, rotation, position) = m.to_scale_rotation_translation();
        Self { position, rotation, scale }
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }

    /// Heading around +Y in radians, in (-PI, PI].
    pub fn yaw(&self) -> f32 {
        self.rotation.to_euler(EulerRot::YXZ).0
    }

    /// Replace the rotation with a pure heading around +Y.
    pub fn set_yaw(&mut self, yaw: f32) {
        self.rotation = Quat::from_rotation_y(yaw);
    }
}

/// Marks the walkable character entity.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Character;

/// How a creature's bounce treats its authored scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BounceStyle {
    /// Squash to fixed scale values and spring back to unit scale.
    Absolute,
    /// Squash by factors of the scale captured at the start of the bounce.
    Relative,
}

/// What happens when a prop is picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropKind {
    /// Bounces with a squash/stretch animation.
    Creature(BounceStyle),
    /// Opens the content modal.
    Info,
}

/// Interactive prop registered at load time by exact scene node name.
#[derive(Component, Debug, Clone)]
pub struct Prop {
    pub name: String,
    pub kind: PropKind,
}

/// Pickable geometry in the prop's local space (its whole node subtree).
///
/// World placement is `parent_world * Transform::matrix()`, so the triangles
/// follow the prop while it bounces.
#[derive(Component, Debug, Clone)]
pub struct PickShape {
    pub parent_world: Mat4,
    pub triangles: Vec<Triangle>,
    pub bounds: Aabb,
}

/// Index of the scene graph node this entity drives.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneNodeRef(pub usize);

/// A running keyframed animation on this entity's transform.
#[derive(Component, Debug, Clone)]
pub struct ActiveTween {
    pub timeline: Timeline,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f32::consts::PI;

    #[test]
    fn yaw_round_trips_through_rotation() {
        let mut t = Transform::default();
        for yaw in [0.0, PI / 2.0, -PI / 2.0, 3.0, -3.0] {
            t.set_yaw(yaw);
            assert_abs_diff_eq!(t.yaw(), yaw, epsilon = 1e-5);
        }
    }

    #[test]
    fn matrix_decomposes_back() {
        let t = Transform {
            position: Vec3::new(1.0, 2.0, 3.0),
            rotation: Quat::from_rotation_y(0.5),
            scale: Vec3::new(1.2, 0.8, 1.2),
        };
        let back = Transform::from_matrix(t.matrix());
        assert_abs_diff_eq!(back.position.x, 1.0, epsilon = 1e-5);
        assert_abs_diff_eq!(back.scale.y, 0.8, epsilon = 1e-5);
        assert_abs_diff_eq!(back.yaw(), 0.5, epsilon = 1e-5);
    }
}
