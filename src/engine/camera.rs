// View providers: where the camera is, where picking rays come from, and who
// owns the character's heading.
//
// Desktop mode is a follow camera at a fixed offset from the character with
// pointer picking. Headset mode is an eye placed on the character whose
// orientation comes from an external head pose; it picks along the view
// centre and leaves the character's heading alone. Gameplay code only talks
// to the ViewProvider trait.

use glam::{EulerRot, Mat4, Quat, Vec2, Vec3};

use super::input::Gesture;
use super::picking::Ray;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentationMode {
    Desktop,
    Headset,
}

pub trait ViewProvider {
    fn mode(&self) -> PresentationMode;

    /// Unit vector the viewer is looking along.
    fn look_direction(&self) -> Vec3;

    /// Ray for a pick gesture, or `None` if this provider ignores the gesture.
    fn pointer_ray(&self, gesture: Gesture, aspect: f32) -> Option<Ray>;

    /// Ray for per-frame hover feedback, or `None` when there is no cursor.
    fn hover_ray(&self, pointer_ndc: Vec2, aspect: f32) -> Option<Ray>;

    /// Follow the character. Called once per frame after the player update.
    fn on_interaction_frame(&mut self, character_position: Vec3);

    fn eye(&self) -> Vec3;

    fn view_projection(&self, aspect: f32) -> Mat4;

    /// True when keyboard/pad movement and automatic heading apply.
    fn steers_character(&self) -> bool;

    /// Apply a look delta in radians (head tracking). Ignored by providers without one.
    fn look_by(&mut self, _yaw_delta: f32, _pitch_delta: f32) {}
}

// ============================================================================
// DESKTOP FOLLOW CAMERA
// ============================================================================

pub struct FollowCamera {
    eye: Vec3,
    target: Vec3,

    /// Offset from the character the eye tracks on X/Z; Y is absolute height.
    pub offset: Vec3,
    /// Extra eye shift on top of `offset` (X, Z).
    pub eye_bias: Vec2,
    /// Look-at point shift from the character (X, Z).
    pub look_bias: Vec2,

    /// Vertical field of view in radians
    pub fov: f32,
    pub near: f32,
    pub far: f32,
}

impl FollowCamera {
    /// Camera framing `spawn` before the first follow update.
    pub fn new(spawn: Vec3, offset: Vec3, fov_degrees: f32) -> Self {
        Self {
            eye: spawn + offset,
            target: spawn,
            offset,
            eye_bias: Vec2::new(-20.0, 30.0),
            look_bias: Vec2::new(10.0, 10.0),
            fov: fov_degrees.to_radians(),
            near: 0.1,
            far: 1000.0,
        }
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov, aspect, self.near, self.far)
    }

    fn ray_through(&self, ndc: Vec2, aspect: f32) -> Ray {
        Ray::from_ndc(ndc, self.view_projection(aspect).inverse())
    }
}

impl ViewProvider for FollowCamera {
    fn mode(&self) -> PresentationMode {
        PresentationMode::Desktop
    }

    fn look_direction(&self) -> Vec3 {
        (self.target - self.eye).normalize_or_zero()
    }

    fn pointer_ray(&self, gesture: Gesture, aspect: f32) -> Option<Ray> {
        match gesture {
            Gesture::Click(ndc) | Gesture::TouchEnd(ndc) => Some(self.ray_through(ndc, aspect)),
            Gesture::Select => None,
        }
    }

    fn hover_ray(&self, pointer_ndc: Vec2, aspect: f32) -> Option<Ray> {
        Some(self.ray_through(pointer_ndc, aspect))
    }

    fn on_interaction_frame(&mut self, character_position: Vec3) {
        let c = character_position;
        self.eye = Vec3::new(
            c.x + self.offset.x + self.eye_bias.x,
            self.offset.y,
            c.z + self.offset.z + self.eye_bias.y,
        );
        self.target = Vec3::new(c.x + self.look_bias.x, c.y, c.z + self.look_bias.y);
    }

    fn eye(&self) -> Vec3 {
        self.eye
    }

    fn view_projection(&self, aspect: f32) -> Mat4 {
        self.projection_matrix(aspect) * self.view_matrix()
    }

    fn steers_character(&self) -> bool {
        true
    }
}

// ============================================================================
// HEADSET VIEW
// ============================================================================

pub struct HeadsetView {
    eye: Vec3,
    /// Head heading in radians (0 looks along -Z).
    pub yaw: f32,
    /// Head elevation in radians, clamped just short of straight up/down.
    pub pitch: f32,
    /// Eye height above the character's feet.
    pub eye_height: f32,
    pub fov: f32,
}

impl HeadsetView {
    const PITCH_LIMIT: f32 = 1.5;

    pub fn new(eye_height: f32, fov_degrees: f32) -> Self {
        Self {
            eye: Vec3::ZERO,
            yaw: 0.0,
            pitch: 0.0,
            eye_height,
            fov: fov_degrees.to_radians(),
        }
    }

    /// Replace the head orientation with a tracked pose.
    pub fn set_orientation(&mut self, yaw: f32, pitch: f32) {
        self.yaw = yaw;
        self.pitch = pitch.clamp(-Self::PITCH_LIMIT, Self::PITCH_LIMIT);
    }

    fn orientation(&self) -> Quat {
        Quat::from_euler(EulerRot::YXZ, self.yaw, self.pitch, 0.0)
    }
}

impl ViewProvider for HeadsetView {
    fn mode(&self) -> PresentationMode {
        PresentationMode::Headset
    }

    fn look_direction(&self) -> Vec3 {
        self.orientation() * Vec3::NEG_Z
    }

    fn pointer_ray(&self, gesture: Gesture, _aspect: f32) -> Option<Ray> {
        match gesture {
            Gesture::Select => Some(Ray::new(self.eye, self.look_direction())),
            Gesture::Click(_) | Gesture::TouchEnd(_) => None,
        }
    }

    fn hover_ray(&self, _pointer_ndc: Vec2, _aspect: f32) -> Option<Ray> {
        None
    }

    fn on_interaction_frame(&mut self, character_position: Vec3) {
        self.eye = character_position + Vec3::Y * self.eye_height;
    }

    fn eye(&self) -> Vec3 {
        self.eye
    }

    fn view_projection(&self, aspect: f32) -> Mat4 {
        let view = Mat4::look_to_rh(self.eye, self.look_direction(), Vec3::Y);
        Mat4::perspective_rh(self.fov, aspect, 0.05, 1000.0) * view
    }

    fn steers_character(&self) -> bool {
        false
    }

    fn look_by(&mut self, yaw_delta: f32, pitch_delta: f32) {
        self.set_orientation(self.yaw + yaw_delta, self.pitch + pitch_delta);
    }
}
