// Character controller: a capsule hopping around the collider mesh.
//
// The capsule is the physical body. The character's visual transform follows
// it every tick, offset down by the radius so the feet rest on the floor.

use std::f32::consts::{FRAC_PI_2, PI, TAU};

use glam::Vec3;

use crate::engine::collision::{Capsule, CollisionOracle};
use crate::engine::components::Transform;
use crate::engine::input::DirectionFlags;
use crate::engine::tween::{Channel, Ease, Timeline};

use super::config::PhysicsConfig;

/// What a tick did to the character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Simulated,
    /// Fell out of the world and was put back at spawn.
    Respawned,
}

pub struct PlayerController {
    pub capsule: Capsule,
    pub velocity: Vec3,
    pub on_floor: bool,
    /// A hop is in flight. Cleared on landing.
    pub is_moving: bool,
    /// Heading the visual turns toward.
    pub target_yaw: f32,
    spawn: Vec3,
    params: PhysicsConfig,
}

impl PlayerController {
    /// Controller with its feet at `spawn`.
    pub fn new(spawn: Vec3, params: PhysicsConfig) -> Self {
        Self {
            capsule: Self::capsule_at(spawn, &params),
            velocity: Vec3::ZERO,
            on_floor: false,
            is_moving: false,
            target_yaw: FRAC_PI_2,
            spawn,
            params,
        }
    }

    fn capsule_at(feet: Vec3, params: &PhysicsConfig) -> Capsule {
        Capsule::new(
            feet + Vec3::new(0.0, params.capsule_radius, 0.0),
            feet + Vec3::new(0.0, params.capsule_height, 0.0),
            params.capsule_radius,
        )
    }

    pub fn spawn(&self) -> Vec3 {
        self.spawn
    }

    /// Feet position implied by the capsule.
    pub fn feet(&self) -> Vec3 {
        self.capsule.start - Vec3::new(0.0, self.params.capsule_radius, 0.0)
    }

    /// Put the character back at spawn, at rest.
    pub fn respawn(&mut self, visual: &mut Transform) {
        self.capsule = Self::capsule_at(self.spawn, &self.params);
        self.velocity = Vec3::ZERO;
        self.is_moving = false;
        visual.position = self.spawn;
        log::debug!("character respawned at {:?}", self.spawn);
    }

    /// Advance one constant-size step against `oracle`.
    ///
    /// `auto_rotate` is false when an external view owns the heading.
    pub fn step(
        &mut self,
        oracle: &dyn CollisionOracle,
        visual: &mut Transform,
        auto_rotate: bool,
    ) -> TickOutcome {
        if visual.position.y < self.params.fall_threshold {
            self.respawn(visual);
            return TickOutcome::Respawned;
        }

        let dt = self.params.step;
        if !self.on_floor {
            self.velocity.y -= self.params.gravity * dt;
        }
        self.capsule.translate(self.velocity * dt);

        self.on_floor = false;
        if let Some(contact) = oracle.query_contact(&self.capsule) {
            self.on_floor = contact.normal.y > 0.0;
            self.capsule.translate(contact.normal * contact.depth);
            if self.on_floor {
                self.velocity.x = 0.0;
                self.velocity.z = 0.0;
                self.is_moving = false;
            }
        }

        visual.position = self.feet();

        if auto_rotate {
            let yaw = visual.yaw();
            let diff = shortest_angle_delta(yaw, self.target_yaw);
            visual.set_yaw(yaw + diff * self.params.rotation_damping);
        }

        TickOutcome::Simulated
    }

    /// Turn held directions into a hop. Returns true if one started.
    ///
    /// Ignored while a hop is already in flight.
    pub fn apply_movement_input(&mut self, held: DirectionFlags) -> bool {
        if !held.any() || self.is_moving {
            return false;
        }

        let speed = self.params.move_speed;
        let mut impulse = Vec3::ZERO;
        // Later checks win the heading when several directions are held.
        if held.up {
            impulse.z += speed;
            self.target_yaw = 0.0;
        }
        if held.down {
            impulse.z -= speed;
            self.target_yaw = PI;
        }
        if held.left {
            impulse.x += speed;
            self.target_yaw = FRAC_PI_2;
        }
        if held.right {
            impulse.x -= speed;
            self.target_yaw = -FRAC_PI_2;
        }

        if self.params.normalize_diagonal && impulse.length() > speed {
            impulse = impulse.normalize() * speed;
        }

        self.velocity.x += impulse.x;
        self.velocity.z += impulse.z;
        self.velocity.y = self.params.jump_height;
        self.is_moving = true;
        true
    }
}

/// Signed angle from `from` to `to`, in (-PI, PI].
pub fn shortest_angle_delta(from: f32, to: f32) -> f32 {
    let d = (to - from + PI).rem_euclid(TAU) - PI;
    if d <= -PI { d + TAU } else { d }
}

/// Squash and stretch played on the character for each hop.
pub fn hop_timeline() -> Timeline {
    Timeline::new()
        .then(Channel::Scale(Vec3::new(1.08, 0.9, 1.08)), 0.1, Ease::Power2Out)
        .then(Channel::Scale(Vec3::new(0.92, 1.1, 0.92)), 0.15, Ease::Power2Out)
        .then(Channel::Scale(Vec3::ONE), 0.15, Ease::Power1InOut)
        .then(Channel::Scale(Vec3::ONE), 0.1, Ease::Linear)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::collision::{floor_quad, Octree};
    use approx::assert_abs_diff_eq;
    use glam::Vec2;

    fn floor() -> Octree {
        Octree::from_triangles(floor_quad(0.0, Vec2::splat(-20.0), Vec2::splat(20.0)))
    }

    fn standing() -> (PlayerController, Transform) {
        let player = PlayerController::new(Vec3::ZERO, PhysicsConfig::default());
        (player, Transform::default())
    }

    #[test]
    fn free_fall_accelerates_downward() {
        let empty = Octree::from_triangles(Vec::new());
        let (mut player, mut visual) = standing();
        let mut last = player.velocity.y;
        for _ in 0..10 {
            assert_eq!(player.step(&empty, &mut visual, true), TickOutcome::Simulated);
            assert!(player.velocity.y < last);
            assert!(!player.on_floor);
            last = player.velocity.y;
        }
    }

    #[test]
    fn landing_zeroes_horizontal_velocity() {
        let ground = floor();
        let (mut player, mut visual) = standing();
        player.velocity = Vec3::new(7.0, -1.0, 0.0);
        player.is_moving = true;

        player.step(&ground, &mut visual, true);
        assert!(player.on_floor);
        assert!(!player.is_moving);
        assert_eq!(player.velocity.x, 0.0);
        assert_eq!(player.velocity.z, 0.0);
        assert_abs_diff_eq!(visual.position.y, 0.0, epsilon = 1e-4);
    }

    #[test]
    fn capsule_height_is_invariant() {
        let ground = floor();
        let (mut player, mut visual) = standing();
        let length = player.capsule.end - player.capsule.start;
        player.apply_movement_input(DirectionFlags { up: true, left: true, ..Default::default() });
        for _ in 0..60 {
            player.step(&ground, &mut visual, true);
            let now = player.capsule.end - player.capsule.start;
            assert!((now - length).length() < 1e-4);
        }
    }

    #[test]
    fn respawn_is_idempotent() {
        let (mut player, mut visual) = standing();
        player.capsule.translate(Vec3::new(3.0, -5.0, 1.0));
        player.velocity = Vec3::new(1.0, -9.0, 2.0);
        player.is_moving = true;

        player.respawn(&mut visual);
        let (capsule, velocity) = (player.capsule, player.velocity);
        player.respawn(&mut visual);
        assert_eq!(player.capsule, capsule);
        assert_eq!(player.velocity, velocity);
        assert_eq!(velocity, Vec3::ZERO);
        assert!(!player.is_moving);
        assert_eq!(visual.position, Vec3::ZERO);
    }

    #[test]
    fn falling_out_of_the_world_respawns() {
        let ground = floor();
        let mut player = PlayerController::new(Vec3::new(2.0, 1.0, 3.0), PhysicsConfig::default());
        let mut visual = Transform::from_position(Vec3::new(2.0, -20.5, 3.0));
        player.velocity = Vec3::new(0.0, -40.0, 0.0);

        assert_eq!(player.step(&ground, &mut visual, true), TickOutcome::Respawned);
        assert_eq!(visual.position, Vec3::new(2.0, 1.0, 3.0));
        assert_eq!(player.velocity, Vec3::ZERO);
        assert!((player.feet() - Vec3::new(2.0, 1.0, 3.0)).length() < 1e-5);
    }

    #[test]
    fn diagonal_hop_keeps_both_components() {
        let (mut player, _) = standing();
        assert!(player.apply_movement_input(DirectionFlags { up: true, right: true, ..Default::default() }));
        let horizontal = Vec2::new(player.velocity.x, player.velocity.z);
        assert_abs_diff_eq!(horizontal.length(), 7.0 * 2f32.sqrt(), epsilon = 1e-5);
        assert_eq!(player.velocity.y, 11.0);
        assert_eq!(player.target_yaw, -FRAC_PI_2);
    }

    #[test]
    fn diagonal_hop_can_be_normalized() {
        let params = PhysicsConfig { normalize_diagonal: true, ..Default::default() };
        let mut player = PlayerController::new(Vec3::ZERO, params);
        player.apply_movement_input(DirectionFlags { down: true, left: true, ..Default::default() });
        let horizontal = Vec2::new(player.velocity.x, player.velocity.z);
        assert_abs_diff_eq!(horizontal.length(), 7.0, epsilon = 1e-5);
    }

    #[test]
    fn no_second_hop_mid_air() {
        let (mut player, _) = standing();
        assert!(player.apply_movement_input(DirectionFlags { up: true, ..Default::default() }));
        assert!(!player.apply_movement_input(DirectionFlags { left: true, ..Default::default() }));
        assert_eq!(player.velocity.x, 0.0);
        assert!(!player.apply_movement_input(DirectionFlags::default()));
    }

    #[test]
    fn yaw_approaches_target_without_overshoot() {
        let empty = Octree::from_triangles(Vec::new());
        for (start, target) in [(0.0, FRAC_PI_2), (3.0, -3.0), (-2.5, 2.0), (1.0, PI)] {
            let (mut player, mut visual) = standing();
            visual.set_yaw(start);
            player.target_yaw = target;

            let mut remaining = shortest_angle_delta(start, target);
            for _ in 0..30 {
                player.step(&empty, &mut visual, true);
                let now = shortest_angle_delta(visual.yaw(), target);
                assert!(now.abs() <= remaining.abs() + 1e-5, "{start} -> {target}");
                assert!(now * remaining >= -1e-6, "overshot {start} -> {target}");
                remaining = now;
            }
            assert!(remaining.abs() < 1e-3);
        }
    }

    #[test]
    fn external_heading_is_left_alone() {
        let empty = Octree::from_triangles(Vec::new());
        let (mut player, mut visual) = standing();
        visual.set_yaw(0.3);
        player.target_yaw = -2.0;
        player.step(&empty, &mut visual, false);
        assert_abs_diff_eq!(visual.yaw(), 0.3, epsilon = 1e-6);
    }

    #[test]
    fn shortest_delta_range() {
        assert_abs_diff_eq!(shortest_angle_delta(0.0, PI), PI, epsilon = 1e-6);
        assert_abs_diff_eq!(shortest_angle_delta(PI, 0.0), PI, epsilon = 1e-6);
        assert_abs_diff_eq!(shortest_angle_delta(3.0, -3.0), TAU - 6.0, epsilon = 1e-5);
        assert_abs_diff_eq!(shortest_angle_delta(-3.0, 3.0), 6.0 - TAU, epsilon = 1e-5);
    }

    #[test]
    fn hop_timeline_returns_to_unit_scale() {
        let mut visual = Transform::default();
        let mut tl = hop_timeline();
        assert_abs_diff_eq!(tl.duration(), 0.5, epsilon = 1e-6);
        tl.advance(0.1, &mut visual);
        assert_abs_diff_eq!(visual.scale.y, 0.9, epsilon = 1e-5);
        let p = tl.advance(0.5, &mut visual);
        assert!(p.finished);
        assert_eq!(visual.scale, Vec3::ONE);
    }
}
