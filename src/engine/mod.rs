// Engine module - scene-agnostic building blocks
// Collision, picking, tweening, input and presentation live here; gameplay rules live in `game`

pub mod camera;
pub mod collision;
pub mod components;
pub mod input;
pub mod mesh;
pub mod picking;
pub mod systems;
pub mod tween;
pub mod ui_overlay;
