//! Triangle records with cached derived geometry.

use lumen_math::{Aabb, Vec3};

/// Index of a triangle in [`Scene::triangles`](crate::Scene::triangles).
pub type TriangleId = u32;

/// Index of a material in the scene's material table.
pub type MaterialId = u32;

/// Triangles with less area than this are reported as degenerate.
pub const AREA_EPSILON: f32 = 1e-12;

/// Attribute indices of one triangle, as supplied by a loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriangleIndices {
    pub positions: [u32; 3],
    pub normals: Option<[u32; 3]>,
    pub texcoords: Option<[u32; 3]>,
}

impl TriangleIndices {
    pub fn new(positions: [u32; 3]) -> Self {
        Self {
            positions,
            normals: None,
            texcoords: None,
        }
    }

    pub fn with_normals(mut self, normals: [u32; 3]) -> Self {
        self.normals = Some(normals);
        self
    }

    pub fn with_texcoords(mut self, texcoords: [u32; 3]) -> Self {
        self.texcoords = Some(texcoords);
        self
    }
}

/// A triangle referencing the scene's attribute arrays.
///
/// Derived data is computed once when the triangle is added to the scene;
/// geometry is immutable afterwards so the cache never goes stale.
#[derive(Debug, Clone, PartialEq)]
pub struct Triangle {
    indices: TriangleIndices,
    material: MaterialId,
    centroid: Vec3,
    /// Averaged vertex normal, or the winding normal without vertex normals
    normal: Vec3,
    /// Normalized `(v1 - v0) x (v2 - v0)`
    geometric_normal: Vec3,
    area: f32,
    bounds: Aabb,
}

impl Triangle {
    /// Build a triangle and its cached data. Indices must already be validated.
    pub(crate) fn new(
        indices: TriangleIndices,
        material: MaterialId,
        positions: &[Vec3],
        normals: &[Vec3],
    ) -> Self {
        let [v0, v1, v2] = indices.positions.map(|i| positions[i as usize]);

        let cross = (v1 - v0).cross(v2 - v0);
        let geometric_normal = cross.normalize_or_zero();

        let normal = indices
            .normals
            .map(|ns| ns.iter().map(|&i| normals[i as usize]).sum::<Vec3>())
            .and_then(Vec3::try_normalize)
            .unwrap_or(geometric_normal);

        Self {
            indices,
            material,
            centroid: (v0 + v1 + v2) / 3.0,
            normal,
            geometric_normal,
            area: 0.5 * cross.length(),
            bounds: Aabb::from_point_set(&[v0, v1, v2]),
        }
    }

    pub fn indices(&self) -> &TriangleIndices {
        &self.indices
    }

    pub fn material(&self) -> MaterialId {
        self.material
    }

    pub fn centroid(&self) -> Vec3 {
        self.centroid
    }

    /// Averaged vertex normal (unit length unless the triangle is degenerate).
    pub fn normal(&self) -> Vec3 {
        self.normal
    }

    pub fn geometric_normal(&self) -> Vec3 {
        self.geometric_normal
    }

    pub fn area(&self) -> f32 {
        self.area
    }

    /// Area signed by whether the winding agrees with the averaged normal.
    pub fn signed_area(&self) -> f32 {
        if self.geometric_normal.dot(self.normal) < 0.0 {
            -self.area
        } else {
            self.area
        }
    }

    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    pub fn is_degenerate(&self) -> bool {
        self.area < AREA_EPSILON
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn positions() -> Vec<Vec3> {
        vec![
            Vec3::new(-1.0, -1.0, 0.0),
            Vec3::new(1.0, -1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ]
    }

    #[test]
    fn test_cached_geometry() {
        let tri = Triangle::new(TriangleIndices::new([0, 1, 2]), 0, &positions(), &[]);

        assert!((tri.area() - 2.0).abs() < 1e-6);
        assert!((tri.centroid() - Vec3::new(0.0, -1.0 / 3.0, 0.0)).length() < 1e-6);
        assert_eq!(tri.geometric_normal(), Vec3::Z);
        assert_eq!(tri.normal(), Vec3::Z);
        assert_eq!(tri.bounds().min(), Vec3::new(-1.0, -1.0, 0.0));
        assert_eq!(tri.bounds().max(), Vec3::new(1.0, 1.0, 0.0));
        assert!(!tri.is_degenerate());
    }

    #[test]
    fn test_averaged_normal_from_vertex_normals() {
        let normals = vec![-Vec3::Z, -Vec3::Z, Vec3::new(0.0, 0.1, -1.0)];
        let indices = TriangleIndices::new([0, 1, 2]).with_normals([0, 1, 2]);
        let tri = Triangle::new(indices, 0, &positions(), &normals);

        assert!(tri.normal().z < -0.99);
        assert!((tri.normal().length() - 1.0).abs() < 1e-6);
        // Winding says +Z, vertex normals say -Z
        assert!(tri.signed_area() < 0.0);
    }

    #[test]
    fn test_cancelling_normals_fall_back_to_winding() {
        let normals = vec![Vec3::X * 2.0, -Vec3::X];
        let indices = TriangleIndices::new([0, 1, 2]).with_normals([0, 1, 1]);
        let tri = Triangle::new(indices, 0, &positions(), &normals);

        assert_eq!(tri.normal(), Vec3::Z);
    }

    #[test]
    fn test_degenerate_triangle() {
        let collinear = vec![Vec3::ZERO, Vec3::X, Vec3::X * 2.0];
        let tri = Triangle::new(TriangleIndices::new([0, 1, 2]), 0, &collinear, &[]);

        assert!(tri.is_degenerate());
        assert_eq!(tri.normal(), Vec3::ZERO);
    }
}
