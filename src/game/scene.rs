// Scene graph loaded from a glTF/GLB file.
//
// Nodes are stored in depth-first traversal order, so a parent always
// precedes its children and world matrices resolve in a single pass.

use std::collections::HashMap;
use std::path::Path;

use glam::{Mat4, Quat, Vec3};

use crate::engine::collision::Triangle;
use crate::engine::components::Transform;
use crate::engine::mesh::RenderMesh;

#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("failed to load glTF file: {0}")]
    Gltf(#[from] gltf::Error),

    #[error("required node {0:?} not found in scene")]
    MissingNode(String),

    #[error("missing position data for mesh {0:?}")]
    MissingPositions(String),

    #[error("scene loader exited without a result")]
    LoaderExited,
}

/// One drawable piece of a mesh with its own material color.
#[derive(Debug, Clone)]
pub struct MeshPart {
    pub mesh: RenderMesh,
    pub color: [f32; 4],
}

#[derive(Debug, Clone, Default)]
pub struct SceneMesh {
    pub name: String,
    pub parts: Vec<MeshPart>,
}

#[derive(Debug, Clone)]
pub struct SceneNode {
    pub name: String,
    pub parent: Option<usize>,
    pub local: Transform,
    pub mesh: Option<usize>,
    pub visible: bool,
}

#[derive(Debug, Clone, Default)]
pub struct SceneGraph {
    nodes: Vec<SceneNode>,
    meshes: Vec<SceneMesh>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a node. `parent` must already exist.
    pub fn add_node(&mut self, name: &str, parent: Option<usize>, local: Transform) -> usize {
        debug_assert!(parent.is_none_or(|p| p < self.nodes.len()));
        self.nodes.push(SceneNode {
            name: name.to_string(),
            parent,
            local,
            mesh: None,
            visible: true,
        });
        self.nodes.len() - 1
    }

    pub fn add_mesh(&mut self, mesh: SceneMesh) -> usize {
        self.meshes.push(mesh);
        self.meshes.len() - 1
    }

    pub fn set_mesh(&mut self, node: usize, mesh: usize) {
        self.nodes[node].mesh = Some(mesh);
    }

    pub fn nodes(&self) -> &[SceneNode] {
        &self.nodes
    }

    pub fn meshes(&self) -> &[SceneMesh] {
        &self.meshes
    }

    pub fn node(&self, idx: usize) -> &SceneNode {
        &self.nodes[idx]
    }

    /// First node with this exact name in traversal order.
    pub fn find(&self, name: &str) -> Option<usize> {
        self.nodes.iter().position(|n| n.name == name)
    }

    pub fn require(&self, name: &str) -> Result<usize, SceneError> {
        self.find(name).ok_or_else(|| SceneError::MissingNode(name.to_string()))
    }

    pub fn set_local(&mut self, idx: usize, local: Transform) {
        self.nodes[idx].local = local;
    }

    /// Hide a node and everything under it from rendering.
    pub fn hide_subtree(&mut self, root: usize) {
        for idx in self.subtree(root) {
            self.nodes[idx].visible = false;
        }
    }

    pub fn world_matrices(&self) -> Vec<Mat4> {
        let mut world: Vec<Mat4> = Vec::with_capacity(self.nodes.len());
        for node in &self.nodes {
            let parent = node.parent.map_or(Mat4::IDENTITY, |p| world[p]);
            world.push(parent * node.local.matrix());
        }
        world
    }

    pub fn world_matrix(&self, idx: usize) -> Mat4 {
        let mut m = self.nodes[idx].local.matrix();
        let mut cursor = self.nodes[idx].parent;
        while let Some(p) = cursor {
            m = self.nodes[p].local.matrix() * m;
            cursor = self.nodes[p].parent;
        }
        m
    }

    /// World matrix of the node's parent (identity for roots).
    pub fn parent_world(&self, idx: usize) -> Mat4 {
        self.nodes[idx].parent.map_or(Mat4::IDENTITY, |p| self.world_matrix(p))
    }

    fn is_descendant_of(&self, idx: usize, root: usize) -> bool {
        let mut cursor = Some(idx);
        while let Some(i) = cursor {
            if i == root {
                return true;
            }
            cursor = self.nodes[i].parent;
        }
        false
    }

    /// `root` and all its descendants, in traversal order.
    pub fn subtree(&self, root: usize) -> Vec<usize> {
        // Descendants follow their root contiguously in depth-first order.
        (root..self.nodes.len())
            .take_while(|&i| i == root || self.is_descendant_of(i, root))
            .collect()
    }

    /// Triangles of every mesh under `root`, expressed in `root`'s own space
    /// (its local transform included) when `local` is true, else in world space.
    pub fn subtree_triangles(&self, root: usize, local: bool) -> Vec<Triangle> {
        let world = self.world_matrices();
        let to_space = if local { world[root].inverse() } else { Mat4::IDENTITY };

        let mut triangles = Vec::new();
        for idx in self.subtree(root) {
            let Some(mesh) = self.nodes[idx].mesh else {
                continue;
            };
            let m = to_space * world[idx];
            for part in &self.meshes[mesh].parts {
                triangles.extend(part.mesh.triangles().map(|t| t.transformed(&m)));
            }
        }
        triangles
    }
}

// ============================================================================
// GLTF IMPORT
// ============================================================================

const DEFAULT_COLOR: [f32; 4] = [0.8, 0.8, 0.8, 1.0];

/// Load the default scene of a glTF/GLB file.
pub fn load_gltf(path: impl AsRef<Path>) -> Result<SceneGraph, SceneError> {
    let path = path.as_ref();
    let (document, buffers, _images) = gltf::import(path)?;

    let mut graph = SceneGraph::new();
    let mut mesh_slots: HashMap<usize, usize> = HashMap::new();

    if let Some(scene) = document.default_scene().or_else(|| document.scenes().next()) {
        for node in scene.nodes() {
            import_node(&node, None, &buffers, &mut graph, &mut mesh_slots)?;
        }
    }

    log::info!(
        "loaded {}: {} nodes, {} meshes",
        path.display(),
        graph.nodes.len(),
        graph.meshes.len()
    );
    Ok(graph)
}

fn import_node(
    node: &gltf::Node,
    parent: Option<usize>,
    buffers: &[gltf::buffer::Data],
    graph: &mut SceneGraph,
    mesh_slots: &mut HashMap<usize, usize>,
) -> Result<(), SceneError> {
    let (translation, rotation, scale) = node.transform().decomposed();
    let local = Transform {
        position: Vec3::from_array(translation),
        rotation: Quat::from_array(rotation),
        scale: Vec3::from_array(scale),
    };
    let idx = graph.add_node(node.name().unwrap_or(""), parent, local);

    if let Some(mesh) = node.mesh() {
        let slot = match mesh_slots.get(&mesh.index()) {
            Some(&slot) => slot,
            None => {
                let slot = graph.add_mesh(import_mesh(&mesh, buffers)?);
                mesh_slots.insert(mesh.index(), slot);
                slot
            }
        };
        graph.set_mesh(idx, slot);
    }

    for child in node.children() {
        import_node(&child, Some(idx), buffers, graph, mesh_slots)?;
    }
    Ok(())
}

fn import_mesh(mesh: &gltf::Mesh, buffers: &[gltf::buffer::Data]) -> Result<SceneMesh, SceneError> {
    let name = mesh.name().unwrap_or("unnamed").to_string();
    let mut parts = Vec::new();

    for primitive in mesh.primitives() {
        if primitive.mode() != gltf::mesh::Mode::Triangles {
            log::debug!("skipping {:?} primitive in mesh {:?}", primitive.mode(), name);
            continue;
        }
        let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|d| &d.0[..]));

        let positions: Vec<Vec3> = reader
            .read_positions()
            .ok_or_else(|| SceneError::MissingPositions(name.clone()))?
            .map(Vec3::from_array)
            .collect();
        let normals: Option<Vec<Vec3>> = reader
            .read_normals()
            .map(|iter| iter.map(Vec3::from_array).collect());
        let indices: Option<Vec<u32>> = reader.read_indices().map(|iter| iter.into_u32().collect());

        let render = match indices {
            Some(indices) => RenderMesh::from_indexed(&positions, normals.as_deref(), &indices),
            None => RenderMesh::from_triangle_list(&positions, normals.as_deref()),
        };

        let color = primitive
            .material()
            .pbr_metallic_roughness()
            .base_color_factor();
        let color = if primitive.material().index().is_some() { color } else { DEFAULT_COLOR };

        parts.push(MeshPart { mesh: render, color });
    }

    Ok(SceneMesh { name, parts })
}

#[cfg(test)]
pub mod testing {
    // Programmatic scenes for tests.

    use super::*;

    /// Axis-aligned box mesh spanning `min..max`.
    pub fn box_mesh(name: &str, min: Vec3, max: Vec3) -> SceneMesh {
        let tris = crate::engine::collision::box_triangles(min, max);
        let positions: Vec<Vec3> = tris.iter().flat_map(|t| [t.a, t.b, t.c]).collect();
        SceneMesh {
            name: name.to_string(),
            parts: vec![MeshPart {
                mesh: RenderMesh::from_triangle_list(&positions, None),
                color: [1.0; 4],
            }],
        }
    }

    /// Add a node carrying a box mesh.
    pub fn add_box(
        graph: &mut SceneGraph,
        name: &str,
        parent: Option<usize>,
        at: Vec3,
        min: Vec3,
        max: Vec3,
    ) -> usize {
        let node = graph.add_node(name, parent, Transform::from_position(at));
        let mesh = graph.add_mesh(box_mesh(name, min, max));
        graph.set_mesh(node, mesh);
        node
    }
}

#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use approx::assert_abs_diff_eq;

    fn nested() -> SceneGraph {
        let mut g = SceneGraph::new();
        let root = g.add_node("Root", None, Transform::from_position(Vec3::new(10.0, 0.0, 0.0)));
        let arm = add_box(&mut g, "Arm", Some(root), Vec3::new(0.0, 2.0, 0.0), Vec3::splat(-0.5), Vec3::splat(0.5));
        add_box(&mut g, "Hand", Some(arm), Vec3::new(1.0, 0.0, 0.0), Vec3::splat(-0.1), Vec3::splat(0.1));
        g.add_node("Other", None, Transform::default());
        g
    }

    #[test]
    fn world_matrices_compose_parents() {
        let g = nested();
        let hand = g.find("Hand").unwrap();
        let world = g.world_matrices();
        assert_eq!(world[hand].transform_point3(Vec3::ZERO), Vec3::new(11.0, 2.0, 0.0));
        assert_eq!(g.world_matrix(hand), world[hand]);
    }

    #[test]
    fn subtree_stops_at_siblings() {
        let g = nested();
        assert_eq!(g.subtree(0), vec![0, 1, 2]);
        assert_eq!(g.subtree(1), vec![1, 2]);
        assert_eq!(g.subtree(3), vec![3]);
    }

    #[test]
    fn subtree_triangles_in_local_and_world_space() {
        let g = nested();
        let arm = g.find("Arm").unwrap();

        let local = g.subtree_triangles(arm, true);
        assert_eq!(local.len(), 24);
        let max_x = local.iter().flat_map(|t| [t.a.x, t.b.x, t.c.x]).fold(f32::MIN, f32::max);
        assert_abs_diff_eq!(max_x, 1.1, epsilon = 1e-5);

        let world = g.subtree_triangles(arm, false);
        let max_x = world.iter().flat_map(|t| [t.a.x, t.b.x, t.c.x]).fold(f32::MIN, f32::max);
        assert_abs_diff_eq!(max_x, 11.1, epsilon = 1e-5);
    }

    #[test]
    fn require_reports_missing_node_name() {
        let g = nested();
        let err = g.require("Character").unwrap_err();
        assert!(matches!(err, SceneError::MissingNode(ref n) if n == "Character"));
    }

    #[test]
    fn hide_subtree_hides_descendants_only() {
        let mut g = nested();
        g.hide_subtree(1);
        let visible: Vec<bool> = g.nodes().iter().map(|n| n.visible).collect();
        assert_eq!(visible, vec![true, false, false, true]);
    }
}
