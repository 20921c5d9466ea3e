// Ray picking against pickable entity geometry.

use glam::{Mat4, Vec2, Vec3};

use super::components::PickShape;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Unit length.
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    /// Unproject a point in normalized device coordinates (x right, y up, both in [-1, 1]).
    pub fn from_ndc(ndc: Vec2, inverse_view_proj: Mat4) -> Self {
        // wgpu depth range is [0, 1].
        let near = inverse_view_proj.project_point3(ndc.extend(0.0));
        let far = inverse_view_proj.project_point3(ndc.extend(1.0));
        Self::new(near, far - near)
    }
}

/// Convert a window-space cursor position to NDC.
pub fn cursor_to_ndc(cursor: (f32, f32), window_size: (u32, u32)) -> Vec2 {
    let (w, h) = (window_size.0.max(1) as f32, window_size.1.max(1) as f32);
    Vec2::new(cursor.0 / w * 2.0 - 1.0, -(cursor.1 / h) * 2.0 + 1.0)
}

/// Nearest hit distance of `ray` against a shape placed at `world`.
pub fn ray_shape_distance(ray: &Ray, shape: &PickShape, world: Mat4) -> Option<f32> {
    let inverse = world.inverse();
    let local_origin = inverse.transform_point3(ray.origin);
    let local_dir = inverse.transform_vector3(ray.direction);

    shape.bounds.ray_entry(local_origin, local_dir)?;

    shape
        .triangles
        .iter()
        .filter_map(|tri| tri.ray_hit(local_origin, local_dir))
        .map(|t| {
            // Measure in world units so hits on differently scaled shapes compare fairly.
            let local_hit = local_origin + local_dir * t;
            world.transform_point3(local_hit).distance(ray.origin)
        })
        .min_by(|a, b| a.total_cmp(b))
}

/// Index and distance of the nearest candidate the ray hits.
pub fn pick_nearest<'a>(
    ray: &Ray,
    candidates: impl IntoIterator<Item = (&'a PickShape, Mat4)>,
) -> Option<(usize, f32)> {
    candidates
        .into_iter()
        .enumerate()
        .filter_map(|(i, (shape, world))| ray_shape_distance(ray, shape, world).map(|d| (i, d)))
        .min_by(|a, b| a.1.total_cmp(&b.1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::collision::{box_triangles, Aabb};
    use approx::assert_abs_diff_eq;

    fn unit_box() -> PickShape {
        let triangles = box_triangles(Vec3::splat(-0.5), Vec3::splat(0.5));
        let bounds = Aabb::from_points(triangles.iter().flat_map(|t| [t.a, t.b, t.c]));
        PickShape {
            parent_world: Mat4::IDENTITY,
            triangles,
            bounds,
        }
    }

    #[test]
    fn cursor_corners_map_to_ndc_corners() {
        let ndc = cursor_to_ndc((0.0, 0.0), (800, 600));
        assert_eq!(ndc, Vec2::new(-1.0, 1.0));
        let ndc = cursor_to_ndc((800.0, 600.0), (800, 600));
        assert_eq!(ndc, Vec2::new(1.0, -1.0));
    }

    #[test]
    fn center_of_screen_ray_follows_view() {
        let view = Mat4::look_at_rh(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO, Vec3::Y);
        let proj = Mat4::perspective_rh(75f32.to_radians(), 1.5, 0.1, 1000.0);
        let ray = Ray::from_ndc(Vec2::ZERO, (proj * view).inverse());
        assert_abs_diff_eq!(ray.direction.z, -1.0, epsilon = 1e-4);
        assert_abs_diff_eq!(ray.origin.z, 9.9, epsilon = 1e-3);
    }

    #[test]
    fn nearest_of_two_boxes_wins() {
        let shape = unit_box();
        let ray = Ray::new(Vec3::new(0.0, 0.0, 10.0), Vec3::NEG_Z);
        let near = Mat4::from_translation(Vec3::new(0.0, 0.0, 3.0));
        let far = Mat4::from_translation(Vec3::new(0.0, 0.0, -3.0));

        let (idx, dist) = pick_nearest(&ray, [(&shape, far), (&shape, near)]).expect("both in line");
        assert_eq!(idx, 1);
        assert_abs_diff_eq!(dist, 6.5, epsilon = 1e-4);
    }

    #[test]
    fn scaled_shape_reports_world_distance() {
        let shape = unit_box();
        let ray = Ray::new(Vec3::new(0.0, 0.0, 10.0), Vec3::NEG_Z);
        let world = Mat4::from_scale(Vec3::splat(4.0));
        let dist = ray_shape_distance(&ray, &shape, world).expect("hit");
        assert_abs_diff_eq!(dist, 8.0, epsilon = 1e-4);
    }

    #[test]
    fn miss_returns_none() {
        let shape = unit_box();
        let ray = Ray::new(Vec3::new(5.0, 0.0, 10.0), Vec3::NEG_Z);
        assert!(pick_nearest(&ray, [(&shape, Mat4::IDENTITY)]).is_none());
    }
}
