// Static level collision: capsule vs triangle soup.
//
// The collider mesh is baked once into an octree of world-space triangles.
// Queries gather candidate triangles from leaves overlapping the capsule's
// bounds, then resolve each candidate against a scratch copy of the capsule.
// The reported contact is the total push-out applied to that scratch copy.

use glam::Vec3;
use smallvec::SmallVec;

const EPSILON: f32 = 1e-10;
/// Leaves holding more triangles than this are split further.
const TRIANGLES_PER_LEAF: usize = 8;
const MAX_DEPTH: u32 = 16;
/// Root bounds padding so axis-aligned geometry never sits on the boundary.
const BOUNDS_PADDING: f32 = 0.01;

// ============================================================================
// PRIMITIVES
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub const EMPTY: Aabb = Aabb {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };

    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Self {
        points.into_iter().fold(Self::EMPTY, |acc, p| Aabb {
            min: acc.min.min(p),
            max: acc.max.max(p),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn expand(&self, margin: f32) -> Aabb {
        Aabb {
            min: self.min - Vec3::splat(margin),
            max: self.max + Vec3::splat(margin),
        }
    }

    pub fn overlaps(&self, other: &Aabb) -> bool {
        !(self.max.x < other.min.x
            || self.min.x > other.max.x
            || self.max.y < other.min.y
            || self.min.y > other.max.y
            || self.max.z < other.min.z
            || self.min.z > other.max.z)
    }

    /// Slab test. Returns the entry distance along `dir` (0 if the origin is inside).
    pub fn ray_entry(&self, origin: Vec3, dir: Vec3) -> Option<f32> {
        let inv = Vec3::new(
            if dir.x.abs() > 1e-8 { 1.0 / dir.x } else { f32::MAX },
            if dir.y.abs() > 1e-8 { 1.0 / dir.y } else { f32::MAX },
            if dir.z.abs() > 1e-8 { 1.0 / dir.z } else { f32::MAX },
        );
        let t1 = (self.min - origin) * inv;
        let t2 = (self.max - origin) * inv;
        let tmin = t1.min(t2).max_element();
        let tmax = t1.max(t2).min_element();
        if tmax < 0.0 || tmin > tmax {
            return None;
        }
        Some(tmin.max(0.0))
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Triangle {
    pub a: Vec3,
    pub b: Vec3,
    pub c: Vec3,
}

impl Triangle {
    pub fn new(a: Vec3, b: Vec3, c: Vec3) -> Self {
        Self { a, b, c }
    }

    /// Unit normal for counter-clockwise winding, zero for degenerate triangles.
    pub fn normal(&self) -> Vec3 {
        (self.c - self.b).cross(self.a - self.b).normalize_or_zero()
    }

    pub fn aabb(&self) -> Aabb {
        Aabb::from_points([self.a, self.b, self.c])
    }

    pub fn transformed(&self, m: &glam::Mat4) -> Triangle {
        Triangle {
            a: m.transform_point3(self.a),
            b: m.transform_point3(self.b),
            c: m.transform_point3(self.c),
        }
    }

    /// Barycentric containment of `p` projected onto the triangle's plane.
    pub fn contains_point(&self, p: Vec3) -> bool {
        let v0 = self.c - self.a;
        let v1 = self.b - self.a;
        let v2 = p - self.a;

        let dot00 = v0.dot(v0);
        let dot01 = v0.dot(v1);
        let dot02 = v0.dot(v2);
        let dot11 = v1.dot(v1);
        let dot12 = v1.dot(v2);

        let denom = dot00 * dot11 - dot01 * dot01;
        if denom.abs() < EPSILON {
            return false;
        }
        let u = (dot11 * dot02 - dot01 * dot12) / denom;
        let v = (dot00 * dot12 - dot01 * dot02) / denom;
        u >= 0.0 && v >= 0.0 && u + v <= 1.0
    }

    /// Möller–Trumbore. Returns the hit distance in units of `dir`.
    pub fn ray_hit(&self, origin: Vec3, dir: Vec3) -> Option<f32> {
        let e1 = self.b - self.a;
        let e2 = self.c - self.a;
        let p = dir.cross(e2);
        let det = e1.dot(p);
        if det.abs() < 1e-8 {
            return None;
        }
        let inv_det = 1.0 / det;
        let s = origin - self.a;
        let u = s.dot(p) * inv_det;
        if !(0.0..=1.0).contains(&u) {
            return None;
        }
        let q = s.cross(e1);
        let v = dir.dot(q) * inv_det;
        if v < 0.0 || u + v > 1.0 {
            return None;
        }
        let t = e2.dot(q) * inv_det;
        (t >= 0.0).then_some(t)
    }
}

/// Vertical collision volume of the player: a segment swept by a sphere.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Capsule {
    pub start: Vec3,
    pub end: Vec3,
    pub radius: f32,
}

impl Capsule {
    pub fn new(start: Vec3, end: Vec3, radius: f32) -> Self {
        Self { start, end, radius }
    }

    pub fn translate(&mut self, offset: Vec3) {
        self.start += offset;
        self.end += offset;
    }

    pub fn center(&self) -> Vec3 {
        (self.start + self.end) * 0.5
    }

    pub fn aabb(&self) -> Aabb {
        Aabb {
            min: self.start.min(self.end) - Vec3::splat(self.radius),
            max: self.start.max(self.end) + Vec3::splat(self.radius),
        }
    }
}

/// Surface contact: push the capsule out along `normal` by `depth`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Contact {
    pub normal: Vec3,
    pub depth: f32,
}

/// Read-only query against static level geometry.
pub trait CollisionOracle {
    fn query_contact(&self, capsule: &Capsule) -> Option<Contact>;
}

// ============================================================================
// OCTREE
// ============================================================================

struct OctreeNode {
    bounds: Aabb,
    /// Triangle indices; only populated on leaves.
    triangles: Vec<u32>,
    children: Vec<OctreeNode>,
}

impl OctreeNode {
    fn split(&mut self, all: &[Triangle], depth: u32) {
        let half = (self.bounds.max - self.bounds.min) * 0.5;
        let mut children = Vec::with_capacity(8);

        for x in 0..2 {
            for y in 0..2 {
                for z in 0..2 {
                    let min = self.bounds.min + Vec3::new(x as f32, y as f32, z as f32) * half;
                    children.push(OctreeNode {
                        bounds: Aabb::new(min, min + half),
                        triangles: Vec::new(),
                        children: Vec::new(),
                    });
                }
            }
        }

        // Box-vs-box membership is conservative; the narrow phase is exact.
        for idx in self.triangles.drain(..) {
            let tri_box = all[idx as usize].aabb();
            for child in &mut children {
                if child.bounds.overlaps(&tri_box) {
                    child.triangles.push(idx);
                }
            }
        }

        for child in &mut children {
            if child.triangles.len() > TRIANGLES_PER_LEAF && depth < MAX_DEPTH {
                child.split(all, depth + 1);
            }
        }

        children.retain(|c| !c.triangles.is_empty() || !c.children.is_empty());
        self.children = children;
    }

    fn collect(&self, query: &Aabb, out: &mut SmallVec<[u32; 32]>) {
        for child in &self.children {
            if !child.bounds.overlaps(query) {
                continue;
            }
            if child.children.is_empty() {
                for &idx in &child.triangles {
                    if !out.contains(&idx) {
                        out.push(idx);
                    }
                }
            } else {
                child.collect(query, out);
            }
        }
    }
}

/// Static collision volume built once from the level's collider mesh.
pub struct Octree {
    triangles: Vec<Triangle>,
    root: OctreeNode,
}

impl Octree {
    pub fn from_triangles(triangles: Vec<Triangle>) -> Self {
        let bounds = triangles
            .iter()
            .fold(Aabb::EMPTY, |acc, t| acc.union(&t.aabb()));
        let bounds = if bounds.is_empty() {
            Aabb::new(Vec3::ZERO, Vec3::ZERO)
        } else {
            bounds.expand(BOUNDS_PADDING)
        };

        let mut root = OctreeNode {
            bounds,
            triangles: (0..triangles.len() as u32).collect(),
            children: Vec::new(),
        };
        if !triangles.is_empty() {
            root.split(&triangles, 0);
        }

        Self { triangles, root }
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    fn candidates(&self, query: &Aabb) -> SmallVec<[u32; 32]> {
        let mut out = SmallVec::new();
        if self.root.bounds.overlaps(query) {
            self.root.collect(query, &mut out);
        }
        out
    }
}

impl CollisionOracle for Octree {
    fn query_contact(&self, capsule: &Capsule) -> Option<Contact> {
        let mut moved = *capsule;
        let mut hit = false;

        for idx in self.candidates(&capsule.aabb()) {
            if let Some(c) = triangle_capsule_contact(&moved, &self.triangles[idx as usize]) {
                hit = true;
                moved.translate(c.normal * c.depth);
            }
        }

        if !hit {
            return None;
        }
        let push = moved.center() - capsule.center();
        Some(Contact {
            normal: push.normalize_or_zero(),
            depth: push.length(),
        })
    }
}

// ============================================================================
// NARROW PHASE
// ============================================================================

/// Contact between one triangle and the capsule, if they overlap.
pub fn triangle_capsule_contact(capsule: &Capsule, tri: &Triangle) -> Option<Contact> {
    let n = tri.normal();
    if n == Vec3::ZERO {
        return None;
    }
    let plane_dist = |p: Vec3| n.dot(p - tri.a);

    let d1 = plane_dist(capsule.start) - capsule.radius;
    let d2 = plane_dist(capsule.end) - capsule.radius;

    if (d1 > 0.0 && d2 > 0.0) || (d1 < -capsule.radius && d2 < -capsule.radius) {
        return None;
    }

    let denom = d1.abs() + d2.abs();
    let delta = if denom > EPSILON { (d1 / denom).abs() } else { 0.0 };
    let on_plane = capsule.start.lerp(capsule.end, delta);

    if tri.contains_point(on_plane) {
        return Some(Contact {
            normal: n,
            depth: d1.min(d2).abs(),
        });
    }

    let r2 = capsule.radius * capsule.radius;
    for (e0, e1) in [(tri.a, tri.b), (tri.b, tri.c), (tri.c, tri.a)] {
        let (p1, p2) = segment_closest_points(capsule.start, capsule.end, e0, e1);
        let d2 = p1.distance_squared(p2);
        if d2 < r2 {
            return Some(Contact {
                normal: (p1 - p2).normalize_or_zero(),
                depth: capsule.radius - d2.sqrt(),
            });
        }
    }

    None
}

/// Closest points between segments `a0..a1` and `b0..b1`.
pub fn segment_closest_points(a0: Vec3, a1: Vec3, b0: Vec3, b1: Vec3) -> (Vec3, Vec3) {
    let r = a1 - a0;
    let s = b1 - b0;
    let w = b0 - a0;

    let a = r.dot(s);
    let b = r.dot(r);
    let c = s.dot(s);
    let d = s.dot(w);
    let e = r.dot(w);

    if c < EPSILON {
        let t1 = if b < EPSILON { 0.0 } else { (e / b).clamp(0.0, 1.0) };
        return (a0 + r * t1, b0);
    }

    let divisor = b * c - a * a;
    let (t1, t2) = if divisor.abs() < EPSILON {
        // Parallel: pick the end of segment a whose projection lands nearer b's middle.
        let d1 = -d / c;
        let d2 = (a - d) / c;
        if (d1 - 0.5).abs() < (d2 - 0.5).abs() { (0.0, d1) } else { (1.0, d2) }
    } else {
        let t1 = (d * a + e * c) / divisor;
        (t1, (t1 * a - d) / c)
    };

    let t1 = t1.clamp(0.0, 1.0);
    let t2 = t2.clamp(0.0, 1.0);
    (a0 + r * t1, b0 + s * t2)
}

// ============================================================================
// TEST SHAPES
// ============================================================================

/// Two triangles facing +Y covering `[min.x, max.x] x [min.z, max.z]` at height `y`.
#[cfg(test)]
pub fn floor_quad(y: f32, min: glam::Vec2, max: glam::Vec2) -> Vec<Triangle> {
    let p0 = Vec3::new(min.x, y, max.y);
    let p1 = Vec3::new(max.x, y, max.y);
    let p2 = Vec3::new(max.x, y, min.y);
    let p3 = Vec3::new(min.x, y, min.y);
    vec![Triangle::new(p0, p1, p2), Triangle::new(p0, p2, p3)]
}

/// Closed box with outward-facing triangles.
#[cfg(test)]
pub fn box_triangles(min: Vec3, max: Vec3) -> Vec<Triangle> {
    let v = |x: f32, y: f32, z: f32| Vec3::new(x, y, z);
    let faces = [
        [v(min.x, max.y, max.z), v(max.x, max.y, max.z), v(max.x, max.y, min.z), v(min.x, max.y, min.z)],
        [v(min.x, min.y, min.z), v(max.x, min.y, min.z), v(max.x, min.y, max.z), v(min.x, min.y, max.z)],
        [v(max.x, min.y, max.z), v(max.x, min.y, min.z), v(max.x, max.y, min.z), v(max.x, max.y, max.z)],
        [v(min.x, min.y, min.z), v(min.x, min.y, max.z), v(min.x, max.y, max.z), v(min.x, max.y, min.z)],
        [v(min.x, min.y, max.z), v(max.x, min.y, max.z), v(max.x, max.y, max.z), v(min.x, max.y, max.z)],
        [v(max.x, min.y, min.z), v(min.x, min.y, min.z), v(min.x, max.y, min.z), v(max.x, max.y, min.z)],
    ];
    faces
        .iter()
        .flat_map(|[p0, p1, p2, p3]| [Triangle::new(*p0, *p1, *p2), Triangle::new(*p0, *p2, *p3)])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use glam::Vec2;

    fn ground() -> Octree {
        Octree::from_triangles(floor_quad(0.0, Vec2::splat(-10.0), Vec2::splat(10.0)))
    }

    fn standing_capsule(base: Vec3) -> Capsule {
        Capsule::new(base + Vec3::new(0.0, 0.35, 0.0), base + Vec3::new(0.0, 1.0, 0.0), 0.35)
    }

    #[test]
    fn floor_winding_faces_up() {
        for tri in floor_quad(0.0, Vec2::splat(-1.0), Vec2::splat(1.0)) {
            assert_abs_diff_eq!(tri.normal().y, 1.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn no_contact_in_free_air() {
        let tree = ground();
        let cap = standing_capsule(Vec3::new(2.0, 5.0, 3.0));
        assert!(tree.query_contact(&cap).is_none());
    }

    #[test]
    fn no_contact_far_outside_level_bounds() {
        let tree = ground();
        let cap = standing_capsule(Vec3::new(500.0, 0.0, 500.0));
        assert!(tree.query_contact(&cap).is_none());
    }

    #[test]
    fn sunk_capsule_is_pushed_up() {
        let tree = ground();
        let cap = standing_capsule(Vec3::new(2.0, -0.05, 3.0));
        let contact = tree.query_contact(&cap).expect("capsule overlaps floor");
        assert!(contact.normal.y > 0.99);
        assert_abs_diff_eq!(contact.depth, 0.05, epsilon = 1e-4);
    }

    #[test]
    fn wall_contact_is_horizontal() {
        let wall = box_triangles(Vec3::new(1.0, -1.0, -5.0), Vec3::new(2.0, 3.0, 5.0));
        let tree = Octree::from_triangles(wall);
        let cap = standing_capsule(Vec3::new(0.8, 0.5, 0.0));
        let contact = tree.query_contact(&cap).expect("capsule overlaps wall");
        assert!(contact.normal.x < -0.99);
        assert!(contact.normal.y.abs() < 1e-3);
        assert_abs_diff_eq!(contact.depth, 0.15, epsilon = 1e-3);
    }

    #[test]
    fn edge_contact_pushes_away_from_edge() {
        // Capsule hanging just past the floor's +X edge, overlapping it from the side.
        let tree = Octree::from_triangles(floor_quad(0.0, Vec2::splat(-1.0), Vec2::splat(1.0)));
        let cap = Capsule::new(Vec3::new(1.2, -0.5, 0.0), Vec3::new(1.2, 0.5, 0.0), 0.35);
        let contact = tree.query_contact(&cap).expect("edge within radius");
        assert!(contact.normal.x > 0.99);
        assert_abs_diff_eq!(contact.depth, 0.15, epsilon = 1e-3);
    }

    #[test]
    fn dense_mesh_splits_and_still_finds_contacts() {
        let mut tris = Vec::new();
        for i in -10..10 {
            for j in -10..10 {
                let min = Vec2::new(i as f32, j as f32);
                tris.extend(floor_quad(0.0, min, min + Vec2::ONE));
            }
        }
        let tree = Octree::from_triangles(tris);
        assert_eq!(tree.triangle_count(), 800);
        assert!(!tree.root.children.is_empty());

        // Incentre of one cell triangle keeps every edge outside the radius.
        let cap = standing_capsule(Vec3::new(-4.293, -0.1, 7.707));
        let contact = tree.query_contact(&cap).expect("floor below capsule");
        assert!(contact.normal.y > 0.99);
        assert_abs_diff_eq!(contact.depth, 0.1, epsilon = 1e-3);
    }

    #[test]
    fn empty_octree_never_contacts() {
        let tree = Octree::from_triangles(Vec::new());
        assert!(tree.query_contact(&standing_capsule(Vec3::ZERO)).is_none());
    }

    #[test]
    fn ray_hits_front_face() {
        let tri = Triangle::new(Vec3::new(-1.0, 0.0, -1.0), Vec3::new(1.0, 0.0, -1.0), Vec3::new(0.0, 0.0, 1.0));
        let t = tri.ray_hit(Vec3::new(0.0, 5.0, 0.0), Vec3::NEG_Y).expect("straight down");
        assert_abs_diff_eq!(t, 5.0, epsilon = 1e-5);
        assert!(tri.ray_hit(Vec3::new(0.0, 5.0, 0.0), Vec3::Y).is_none());
    }

    #[test]
    fn closest_points_of_crossing_segments() {
        let (p, q) = segment_closest_points(
            Vec3::new(0.0, -1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(-1.0, 0.0, 0.5),
            Vec3::new(1.0, 0.0, 0.5),
        );
        assert_abs_diff_eq!(p.distance(Vec3::ZERO), 0.0, epsilon = 1e-5);
        assert_abs_diff_eq!(q.distance(Vec3::new(0.0, 0.0, 0.5)), 0.0, epsilon = 1e-5);
    }

    #[test]
    fn aabb_slab_entry() {
        let b = Aabb::new(Vec3::splat(-1.0), Vec3::splat(1.0));
        assert_abs_diff_eq!(b.ray_entry(Vec3::new(-5.0, 0.0, 0.0), Vec3::X).unwrap(), 4.0, epsilon = 1e-5);
        assert!(b.ray_entry(Vec3::new(-5.0, 3.0, 0.0), Vec3::X).is_none());
        assert_eq!(b.ray_entry(Vec3::ZERO, Vec3::X), Some(0.0));
    }
}
