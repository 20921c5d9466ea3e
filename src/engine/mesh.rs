// Render mesh types.
//
// Scene primitives arrive as indexed triangle lists. Positions are kept as
// authored; normals come from the file when present, otherwise they are
// rebuilt as area-weighted smooth normals over shared vertices.

use glam::Vec3;

use super::collision::Triangle;

// ============================================================================
// GPU VERTEX
// ============================================================================

/// GPU-ready vertex with position and normal.
///   @location(0) position: vec3<f32>
///   @location(1) normal:   vec3<f32>
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GpuVertex {
    pub position: [f32; 3],
    pub normal:   [f32; 3],
}

impl GpuVertex {
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<GpuVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

// ============================================================================
// RENDER MESH
// ============================================================================

/// Indexed triangle mesh ready for upload.
/// Upload vertex_bytes() to a VERTEX buffer, index_bytes() to an INDEX buffer.
#[derive(Debug, Clone, Default)]
pub struct RenderMesh {
    pub vertices: Vec<GpuVertex>,
    pub indices:  Vec<u32>,
}

impl RenderMesh {
    /// Build from indexed positions. `normals` must match `positions` in length
    /// to be used; anything else falls back to smooth normals.
    /// Indices referencing missing vertices drop their whole triangle.
    pub fn from_indexed(positions: &[Vec3], normals: Option<&[Vec3]>, indices: &[u32]) -> Self {
        let n = positions.len() as u32;
        let indices: Vec<u32> = indices
            .chunks_exact(3)
            .filter(|tri| tri.iter().all(|&i| i < n))
            .flatten()
            .copied()
            .collect();

        let normals = match normals {
            Some(normals) if normals.len() == positions.len() => normals.to_vec(),
            _ => smooth_normals(positions, &indices),
        };

        let vertices = positions
            .iter()
            .zip(normals.iter())
            .map(|(p, n)| GpuVertex {
                position: p.to_array(),
                normal:   n.normalize_or_zero().to_array(),
            })
            .collect();

        Self { vertices, indices }
    }

    /// Build from a non-indexed triangle list (every 3 positions form a face).
    pub fn from_triangle_list(positions: &[Vec3], normals: Option<&[Vec3]>) -> Self {
        let indices: Vec<u32> = (0..positions.len() as u32).collect();
        Self::from_indexed(positions, normals, &indices)
    }

    /// Cast vertex slice to raw bytes for wgpu buffer upload.
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Cast index slice to raw bytes for wgpu buffer upload.
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    pub fn index_count(&self) -> usize  { self.indices.len() }

    /// Mesh-local triangles, used for collision and picking.
    pub fn triangles(&self) -> impl Iterator<Item = Triangle> + '_ {
        self.indices.chunks_exact(3).map(|tri| {
            let p = |i: u32| Vec3::from_array(self.vertices[i as usize].position);
            Triangle::new(p(tri[0]), p(tri[1]), p(tri[2]))
        })
    }
}

/// Area-weighted vertex normals.
///
/// The unnormalized face cross product has magnitude 2×area, so summing it
/// into each corner weights large faces more heavily.
pub fn smooth_normals(positions: &[Vec3], indices: &[u32]) -> Vec<Vec3> {
    let mut accum = vec![Vec3::ZERO; positions.len()];
    for tri in indices.chunks_exact(3) {
        let [ia, ib, ic] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        let (a, b, c) = (positions[ia], positions[ib], positions[ic]);
        let weighted = (b - a).cross(c - a);
        accum[ia] += weighted;
        accum[ib] += weighted;
        accum[ic] += weighted;
    }
    accum.into_iter().map(Vec3::normalize_or_zero).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn quad() -> (Vec<Vec3>, Vec<u32>) {
        let positions = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::new(1.0, 0.0, 1.0),
            Vec3::new(1.0, 0.0, 0.0),
        ];
        (positions, vec![0, 1, 2, 0, 2, 3])
    }

    #[test]
    fn missing_normals_are_rebuilt_facing_up() {
        let (positions, indices) = quad();
        let mesh = RenderMesh::from_indexed(&positions, None, &indices);
        for v in &mesh.vertices {
            assert_abs_diff_eq!(v.normal[1], 1.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn authored_normals_are_kept() {
        let (positions, indices) = quad();
        let normals = vec![Vec3::X; 4];
        let mesh = RenderMesh::from_indexed(&positions, Some(&normals), &indices);
        assert_eq!(mesh.vertices[2].normal, [1.0, 0.0, 0.0]);
    }

    #[test]
    fn out_of_range_indices_drop_the_triangle() {
        let (positions, mut indices) = quad();
        indices.extend([0, 1, 9]);
        let mesh = RenderMesh::from_indexed(&positions, None, &indices);
        assert_eq!(mesh.index_count(), 6);
        assert_eq!(mesh.triangles().count(), 2);
    }

    #[test]
    fn smooth_normal_weights_by_area() {
        // Shared corner between a large floor triangle and a small wall triangle.
        let positions = vec![
            Vec3::ZERO,
            Vec3::new(0.0, 0.0, 4.0),
            Vec3::new(4.0, 0.0, 0.0),
            Vec3::new(0.0, 0.5, 0.0),
            Vec3::new(0.0, 0.0, 0.5),
        ];
        let normals = smooth_normals(&positions, &[0, 1, 2, 0, 3, 4]);
        assert!(normals[0].y > normals[0].x.abs());
    }
}
