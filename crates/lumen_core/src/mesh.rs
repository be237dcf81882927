//! Indexed triangle mesh as handed over by scene loaders.
//!
//! Loaders (OBJ, USD, ...) live outside the core; they produce `Mesh`
//! values which [`SceneBuilder::add_mesh`](crate::SceneBuilder::add_mesh)
//! flattens into the scene's shared attribute arrays.

use lumen_math::{Aabb, Vec2, Vec3};

/// A mesh consisting of vertex positions, optional normals and UVs, and triangle indices.
///
/// Triangles are wound counter-clockwise when viewed from the front.
#[derive(Clone, Debug)]
pub struct Mesh {
    /// Vertex positions (one Vec3 per vertex)
    pub positions: Vec<Vec3>,

    /// Vertex normals (optional, one per vertex)
    pub normals: Option<Vec<Vec3>>,

    /// UV coordinates (optional, one per vertex)
    pub uvs: Option<Vec<Vec2>>,

    /// Triangle indices (every 3 indices form a triangle)
    pub indices: Vec<u32>,

    /// Axis-aligned bounding box
    pub bounds: Aabb,
}

impl Mesh {
    /// Create a new mesh from positions and indices, optionally with normals.
    ///
    /// Normals are not computed automatically; call `ensure_normals()` for that.
    pub fn new(positions: Vec<Vec3>, indices: Vec<u32>, normals: Option<Vec<Vec3>>) -> Self {
        let bounds = Aabb::from_point_set(&positions);
        Self {
            positions,
            normals,
            uvs: None,
            indices,
            bounds,
        }
    }

    /// Attach UV coordinates.
    pub fn with_uvs(mut self, uvs: Vec<Vec2>) -> Self {
        self.uvs = Some(uvs);
        self
    }

    /// Compute smooth vertex normals by averaging area-weighted face normals.
    ///
    /// Replaces existing normals.
    pub fn compute_normals(&mut self) {
        let vertex_count = self.positions.len();
        let mut normals = vec![Vec3::ZERO; vertex_count];

        for face in self.indices.chunks_exact(3) {
            let [i0, i1, i2] = [face[0] as usize, face[1] as usize, face[2] as usize];
            if i0 >= vertex_count || i1 >= vertex_count || i2 >= vertex_count {
                continue;
            }

            let p0 = self.positions[i0];
            let face_normal = (self.positions[i1] - p0).cross(self.positions[i2] - p0);

            normals[i0] += face_normal;
            normals[i1] += face_normal;
            normals[i2] += face_normal;
        }

        for normal in &mut normals {
            // Unreferenced or fully degenerate vertices default to up
            *normal = normal.try_normalize().unwrap_or(Vec3::Y);
        }

        self.normals = Some(normals);
    }

    /// Ensure the mesh has one normal per vertex, computing them if necessary.
    pub fn ensure_normals(&mut self) {
        let count = self.normals.as_ref().map(Vec::len);
        if count != Some(self.positions.len()) {
            if let Some(count) = count {
                log::debug!(
                    "Normals array length ({}) doesn't match vertex count ({}), computing smooth normals",
                    count,
                    self.positions.len()
                );
            }
            self.compute_normals();
        }
    }

    /// Check if the mesh has normals.
    pub fn has_normals(&self) -> bool {
        self.normals.is_some()
    }

    /// Get the number of triangles in the mesh.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Get the number of vertices in the mesh.
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> Mesh {
        Mesh::new(
            vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(1.0, 1.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
            ],
            vec![0, 1, 2, 0, 2, 3],
            None,
        )
    }

    #[test]
    fn test_mesh_creation() {
        let mesh = quad();

        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.triangle_count(), 2);
        assert!(!mesh.has_normals());
        assert_eq!(mesh.bounds.max(), Vec3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn test_compute_normals_ccw() {
        let mut mesh = quad();
        mesh.compute_normals();

        // Counter-clockwise in the XY plane viewed from +Z: normals point +Z
        for normal in mesh.normals.as_ref().unwrap() {
            assert!((*normal - Vec3::Z).length() < 1e-5);
        }
    }

    #[test]
    fn test_ensure_normals_replaces_mismatched() {
        let mut mesh = quad();
        mesh.normals = Some(vec![Vec3::X]);
        mesh.ensure_normals();

        assert_eq!(mesh.normals.as_ref().unwrap().len(), 4);
    }

    #[test]
    fn test_ensure_normals_keeps_valid() {
        let mut mesh = quad();
        mesh.normals = Some(vec![Vec3::X; 4]);
        mesh.ensure_normals();

        assert_eq!(mesh.normals.as_ref().unwrap()[0], Vec3::X);
    }
}
