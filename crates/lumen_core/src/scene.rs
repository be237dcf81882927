//! Scene storage: flat vertex attributes, triangles, materials and lights.
//!
//! A [`Scene`] is assembled once through [`SceneBuilder`] and is read-only
//! afterwards. Acceleration structures borrow it and refer to triangles by
//! [`TriangleId`].

use lumen_math::{Aabb, Mat4, Mat4Ext, Quat, Vec2, Vec3};
use thiserror::Error;

use crate::material::Material;
use crate::mesh::Mesh;
use crate::triangle::{MaterialId, Triangle, TriangleId, TriangleIndices};

/// Errors raised while assembling a scene from loader input.
#[derive(Debug, Error, PartialEq)]
pub enum SceneError {
    #[error("triangle references {kind} index {index}, but only {len} are defined")]
    IndexOutOfRange {
        kind: &'static str,
        index: u32,
        len: usize,
    },

    #[error("unknown material id {0}")]
    UnknownMaterial(MaterialId),

    #[error("material '{name}' has a negative or non-finite {field}")]
    InvalidMaterial { name: String, field: &'static str },

    #[error("mesh index count {0} is not a multiple of 3")]
    IncompleteMesh(usize),
}

/// Transform components that can be composed into a matrix.
#[derive(Clone, Debug)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// Create a new transform with only translation.
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Default::default()
        }
    }

    /// Convert to a 4x4 transformation matrix.
    ///
    /// Order: Scale -> Rotate -> Translate (SRT)
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

/// Immutable triangle scene.
#[derive(Clone, Debug, Default)]
pub struct Scene {
    name: String,
    positions: Vec<Vec3>,
    normals: Vec<Vec3>,
    texcoords: Vec<Vec2>,
    materials: Vec<Material>,
    triangles: Vec<Triangle>,
    /// Every triangle whose material is an emitter
    lights: Vec<TriangleId>,
    bounds: Aabb,
}

impl Scene {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    pub fn triangle(&self, id: TriangleId) -> &Triangle {
        &self.triangles[id as usize]
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    /// The material of a triangle.
    pub fn material(&self, id: TriangleId) -> &Material {
        &self.materials[self.triangle(id).material() as usize]
    }

    /// Triangles carrying an emissive material.
    pub fn lights(&self) -> &[TriangleId] {
        &self.lights
    }

    pub fn is_emitter(&self, id: TriangleId) -> bool {
        self.material(id).is_emitter()
    }

    /// Union of all triangle bounds.
    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    /// The three vertex positions of a triangle.
    #[inline]
    pub fn vertices(&self, id: TriangleId) -> [Vec3; 3] {
        self.triangle(id)
            .indices()
            .positions
            .map(|i| self.positions[i as usize])
    }

    /// Shading normal at barycentric coordinates `(alpha, beta)`, the weights of
    /// the second and third vertex.
    ///
    /// Interpolates vertex normals when the triangle has them, otherwise
    /// returns the triangle's averaged normal.
    pub fn shading_normal(&self, id: TriangleId, alpha: f32, beta: f32) -> Vec3 {
        let triangle = self.triangle(id);
        triangle
            .indices()
            .normals
            .and_then(|[n0, n1, n2]| {
                let n = self.normals[n0 as usize] * (1.0 - alpha - beta)
                    + self.normals[n1 as usize] * alpha
                    + self.normals[n2 as usize] * beta;
                n.try_normalize()
            })
            .unwrap_or(triangle.normal())
    }

    /// Interpolated texture coordinate, if the triangle has texcoords.
    pub fn texcoord(&self, id: TriangleId, alpha: f32, beta: f32) -> Option<Vec2> {
        self.triangle(id).indices().texcoords.map(|[t0, t1, t2]| {
            self.texcoords[t0 as usize] * (1.0 - alpha - beta)
                + self.texcoords[t1 as usize] * alpha
                + self.texcoords[t2 as usize] * beta
        })
    }

    /// Map two uniform numbers in `[0, 1)` to a point distributed uniformly
    /// over the triangle's area.
    pub fn sample_point(&self, id: TriangleId, u1: f32, u2: f32) -> Vec3 {
        let [v0, v1, v2] = self.vertices(id);
        let su = u1.sqrt();
        let b0 = 1.0 - su;
        let b1 = u2 * su;
        v0 * b0 + v1 * b1 + v2 * (1.0 - b0 - b1)
    }
}

/// Incrementally assembles a [`Scene`], validating every index on the way in.
#[derive(Debug, Default)]
pub struct SceneBuilder {
    scene: Scene,
}

impl SceneBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            scene: Scene {
                name: name.into(),
                bounds: Aabb::EMPTY,
                ..Default::default()
            },
        }
    }

    /// Add a material and return its ID.
    pub fn add_material(&mut self, material: Material) -> Result<MaterialId, SceneError> {
        if let Some(field) = material.invalid_field() {
            return Err(SceneError::InvalidMaterial {
                name: material.name,
                field,
            });
        }
        self.scene.materials.push(material);
        Ok((self.scene.materials.len() - 1) as MaterialId)
    }

    pub fn add_position(&mut self, p: Vec3) -> u32 {
        self.scene.positions.push(p);
        (self.scene.positions.len() - 1) as u32
    }

    pub fn add_normal(&mut self, n: Vec3) -> u32 {
        self.scene.normals.push(n);
        (self.scene.normals.len() - 1) as u32
    }

    pub fn add_texcoord(&mut self, uv: Vec2) -> u32 {
        self.scene.texcoords.push(uv);
        (self.scene.texcoords.len() - 1) as u32
    }

    /// Add a triangle over previously added attributes.
    pub fn add_triangle(
        &mut self,
        indices: TriangleIndices,
        material: MaterialId,
    ) -> Result<TriangleId, SceneError> {
        let scene = &self.scene;
        check_indices("position", &indices.positions, scene.positions.len())?;
        if let Some(normals) = &indices.normals {
            check_indices("normal", normals, scene.normals.len())?;
        }
        if let Some(texcoords) = &indices.texcoords {
            check_indices("texcoord", texcoords, scene.texcoords.len())?;
        }
        if material as usize >= scene.materials.len() {
            return Err(SceneError::UnknownMaterial(material));
        }

        let triangle = Triangle::new(indices, material, &scene.positions, &scene.normals);
        self.scene.bounds = Aabb::surrounding(&self.scene.bounds, &triangle.bounds());
        self.scene.triangles.push(triangle);
        Ok((self.scene.triangles.len() - 1) as TriangleId)
    }

    /// Add a standalone triangle from three positions.
    pub fn push_triangle(
        &mut self,
        vertices: [Vec3; 3],
        material: MaterialId,
    ) -> Result<TriangleId, SceneError> {
        let positions = vertices.map(|v| self.add_position(v));
        self.add_triangle(TriangleIndices::new(positions), material)
    }

    /// Flatten a mesh into the scene, optionally baking a transform into it.
    ///
    /// Returns the ids of the added triangles.
    pub fn add_mesh(
        &mut self,
        mesh: &Mesh,
        material: MaterialId,
        transform: Option<&Transform>,
    ) -> Result<std::ops::Range<TriangleId>, SceneError> {
        if mesh.indices.len() % 3 != 0 {
            return Err(SceneError::IncompleteMesh(mesh.indices.len()));
        }
        if material as usize >= self.scene.materials.len() {
            return Err(SceneError::UnknownMaterial(material));
        }
        // Reject the whole mesh before touching the builder
        if let Some(&index) = mesh.indices.iter().find(|&&i| i as usize >= mesh.positions.len()) {
            return Err(SceneError::IndexOutOfRange {
                kind: "position",
                index,
                len: mesh.positions.len(),
            });
        }

        let matrix = transform.map(Transform::to_matrix).unwrap_or(Mat4::IDENTITY);
        let mirrored = matrix.flips_handedness();

        let position_base = self.scene.positions.len() as u32;
        self.scene
            .positions
            .extend(mesh.positions.iter().map(|&p| matrix.transform_point3(p)));

        let normal_base = self.scene.normals.len() as u32;
        let has_normals = match &mesh.normals {
            Some(normals) if normals.len() == mesh.positions.len() => {
                self.scene
                    .normals
                    .extend(normals.iter().map(|&n| matrix.transform_normal3(n)));
                true
            }
            _ => false,
        };

        let texcoord_base = self.scene.texcoords.len() as u32;
        let has_uvs = match &mesh.uvs {
            Some(uvs) if uvs.len() == mesh.positions.len() => {
                self.scene.texcoords.extend_from_slice(uvs);
                true
            }
            _ => false,
        };

        let first = self.scene.triangles.len() as TriangleId;
        for face in mesh.indices.chunks_exact(3) {
            // Mirroring transforms flip winding; swap to keep the front face
            let local = if mirrored {
                [face[0], face[2], face[1]]
            } else {
                [face[0], face[1], face[2]]
            };

            let mut indices = TriangleIndices::new(local.map(|i| position_base + i));
            if has_normals {
                indices = indices.with_normals(local.map(|i| normal_base + i));
            }
            if has_uvs {
                indices = indices.with_texcoords(local.map(|i| texcoord_base + i));
            }
            self.add_triangle(indices, material)?;
        }

        log::debug!(
            "Added mesh: {} triangles within {:?}",
            mesh.triangle_count(),
            matrix.transform_aabb(&mesh.bounds)
        );
        Ok(first..self.scene.triangles.len() as TriangleId)
    }

    /// Finish the scene: derive the light list by scanning every triangle.
    pub fn build(mut self) -> Scene {
        let scene = &mut self.scene;
        scene.lights = (0..scene.triangles.len() as TriangleId)
            .filter(|&id| scene.materials[scene.triangles[id as usize].material() as usize].is_emitter())
            .collect();

        let degenerate = scene.triangles.iter().filter(|t| t.is_degenerate()).count();
        if degenerate > 0 {
            log::warn!(
                "Scene '{}': {} degenerate triangles will never be hit",
                scene.name,
                degenerate
            );
        }

        log::info!(
            "Scene '{}': {} triangles, {} vertices, {} materials, {} light triangles",
            scene.name,
            scene.triangles.len(),
            scene.positions.len(),
            scene.materials.len(),
            scene.lights.len()
        );

        self.scene
    }
}

fn check_indices(kind: &'static str, indices: &[u32; 3], len: usize) -> Result<(), SceneError> {
    match indices.iter().find(|&&i| i as usize >= len) {
        Some(&index) => Err(SceneError::IndexOutOfRange { kind, index, len }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Color;

    fn grey() -> Material {
        Material::new("grey", Color::splat(0.5))
    }

    #[test]
    fn test_empty_scene() {
        let scene = SceneBuilder::new("empty").build();

        assert!(scene.is_empty());
        assert!(scene.lights().is_empty());
        assert!(scene.bounds().is_empty());
    }

    #[test]
    fn test_light_list_follows_emission() {
        let mut builder = SceneBuilder::new("lights");
        let grey = builder.add_material(grey()).unwrap();
        let lamp = builder
            .add_material(Material::emissive("lamp", Color::splat(10.0)))
            .unwrap();

        builder.push_triangle([Vec3::ZERO, Vec3::X, Vec3::Y], grey).unwrap();
        let light = builder
            .push_triangle([Vec3::Z, Vec3::Z + Vec3::X, Vec3::Z + Vec3::Y], lamp)
            .unwrap();
        let scene = builder.build();

        assert_eq!(scene.lights(), &[light]);
        assert!(scene.is_emitter(light));
        assert!(!scene.is_emitter(0));
        assert_eq!(scene.bounds().max(), Vec3::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn test_index_validation() {
        let mut builder = SceneBuilder::new("bad");
        let grey = builder.add_material(grey()).unwrap();
        builder.add_position(Vec3::ZERO);
        builder.add_position(Vec3::X);

        let err = builder
            .add_triangle(TriangleIndices::new([0, 1, 2]), grey)
            .unwrap_err();
        assert_eq!(
            err,
            SceneError::IndexOutOfRange {
                kind: "position",
                index: 2,
                len: 2
            }
        );

        builder.add_position(Vec3::Y);
        let err = builder
            .add_triangle(TriangleIndices::new([0, 1, 2]).with_normals([0, 0, 0]), grey)
            .unwrap_err();
        assert!(matches!(err, SceneError::IndexOutOfRange { kind: "normal", .. }));

        let err = builder.add_triangle(TriangleIndices::new([0, 1, 2]), 7).unwrap_err();
        assert_eq!(err, SceneError::UnknownMaterial(7));
    }

    #[test]
    fn test_invalid_material_rejected() {
        let mut builder = SceneBuilder::new("bad");
        let err = builder
            .add_material(Material::emissive("neg", Color::new(-1.0, 0.0, 0.0)))
            .unwrap_err();

        assert!(matches!(err, SceneError::InvalidMaterial { field: "emission", .. }));
    }

    #[test]
    fn test_add_mesh_with_transform() {
        let mut mesh = Mesh::new(
            vec![Vec3::ZERO, Vec3::X, Vec3::Y],
            vec![0, 1, 2],
            None,
        )
        .with_uvs(vec![Vec2::ZERO, Vec2::X, Vec2::Y]);
        mesh.compute_normals();

        let mut builder = SceneBuilder::new("mesh");
        let grey = builder.add_material(grey()).unwrap();
        let ids = builder
            .add_mesh(&mesh, grey, Some(&Transform::from_translation(Vec3::new(0.0, 0.0, 5.0))))
            .unwrap();
        let scene = builder.build();

        assert_eq!(ids, 0..1);
        assert_eq!(scene.vertices(0)[0], Vec3::new(0.0, 0.0, 5.0));
        assert!((scene.shading_normal(0, 0.2, 0.3) - Vec3::Z).length() < 1e-5);
        let uv = scene.texcoord(0, 0.25, 0.5).unwrap();
        assert!((uv - Vec2::new(0.25, 0.5)).length() < 1e-6);
    }

    #[test]
    fn test_add_mesh_mirrored_keeps_front_face() {
        let mesh = Mesh::new(vec![Vec3::ZERO, Vec3::X, Vec3::Y], vec![0, 1, 2], None);
        let mirror = Transform {
            scale: Vec3::new(-1.0, 1.0, 1.0),
            ..Default::default()
        };

        let mut builder = SceneBuilder::new("mirror");
        let grey = builder.add_material(grey()).unwrap();
        builder.add_mesh(&mesh, grey, Some(&mirror)).unwrap();
        let scene = builder.build();

        assert!((scene.triangle(0).geometric_normal() - Vec3::Z).length() < 1e-6);
    }

    #[test]
    fn test_add_mesh_incomplete() {
        let mesh = Mesh::new(vec![Vec3::ZERO, Vec3::X, Vec3::Y], vec![0, 1], None);
        let mut builder = SceneBuilder::new("broken");
        let grey = builder.add_material(grey()).unwrap();

        assert_eq!(
            builder.add_mesh(&mesh, grey, None).unwrap_err(),
            SceneError::IncompleteMesh(2)
        );
    }

    #[test]
    fn test_failed_add_mesh_leaves_builder_untouched() {
        let mesh = Mesh::new(vec![Vec3::ZERO, Vec3::X, Vec3::Y], vec![0, 1, 2, 0, 1, 7], None);
        let mut builder = SceneBuilder::new("bad_index");
        let grey = builder.add_material(grey()).unwrap();

        assert_eq!(
            builder.add_mesh(&mesh, grey, None).unwrap_err(),
            SceneError::IndexOutOfRange { kind: "position", index: 7, len: 3 }
        );
        assert!(matches!(
            builder.add_mesh(&mesh, 9, None),
            Err(SceneError::UnknownMaterial(9))
        ));

        // No positions were appended either
        assert_eq!(builder.add_position(Vec3::Z), 0);
        let scene = builder.build();
        assert_eq!(scene.triangle_count(), 0);
        assert!(scene.bounds().is_empty());
    }

    #[test]
    fn test_sample_point_stays_on_triangle() {
        let mut builder = SceneBuilder::new("sample");
        let grey = builder.add_material(grey()).unwrap();
        builder
            .push_triangle([Vec3::ZERO, Vec3::new(2.0, 0.0, 0.0), Vec3::new(0.0, 2.0, 0.0)], grey)
            .unwrap();
        let scene = builder.build();

        for i in 0..16 {
            for j in 0..16 {
                let p = scene.sample_point(0, i as f32 / 16.0, j as f32 / 16.0);
                assert!(p.x >= -1e-6 && p.y >= -1e-6 && p.x + p.y <= 2.0 + 1e-5);
                assert_eq!(p.z, 0.0);
            }
        }
    }
}
