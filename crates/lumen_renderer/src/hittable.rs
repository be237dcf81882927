//! Hittable trait and HitRecord for ray-scene intersection.

use crate::triangle::{intersect_triangle, Culling};
use lumen_core::{Scene, TriangleId};
use lumen_math::{Aabb, Interval, Ray, Vec3};

/// Record of the nearest ray-triangle intersection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitRecord {
    /// Parameter t where the intersection occurs
    pub t: f32,
    /// The triangle that was hit
    pub triangle: TriangleId,
    /// Barycentric weights of the second and third vertex
    pub alpha: f32,
    pub beta: f32,
    /// Whether the ray hit the front face of the triangle
    pub front_face: bool,
}

impl HitRecord {
    /// Intersect a single scene triangle, accepting only hits strictly closer
    /// than `ray_t.max` and no closer than `ray_t.min`.
    #[inline]
    pub fn test(
        scene: &Scene,
        id: TriangleId,
        ray: &Ray,
        ray_t: Interval,
        culling: Culling,
    ) -> Option<Self> {
        intersect_triangle(ray, scene.vertices(id), culling)
            .filter(|hit| hit.t >= ray_t.min && hit.t < ray_t.max)
            .map(|hit| Self {
                t: hit.t,
                triangle: id,
                alpha: hit.alpha,
                beta: hit.beta,
                front_face: hit.front_face,
            })
    }

    /// World-space hit position.
    pub fn point(&self, ray: &Ray) -> Vec3 {
        ray.at(self.t)
    }
}

/// Trait for structures that can find ray intersections with scene triangles.
pub trait Hittable: Send + Sync {
    /// Nearest hit with `t` inside `ray_t`, if any.
    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<HitRecord>;

    /// True if anything is hit inside `ray_t`.
    fn occluded(&self, ray: &Ray, ray_t: Interval) -> bool {
        self.hit(ray, ray_t).is_some()
    }

    /// Get the axis-aligned bounding box of everything that can be hit.
    fn bounding_box(&self) -> Aabb;
}

/// Brute-force intersector that tests every triangle of the scene.
///
/// Used as the reference the BVH is checked against.
pub struct TriangleList<'s> {
    scene: &'s Scene,
    culling: Culling,
}

impl<'s> TriangleList<'s> {
    pub fn new(scene: &'s Scene, culling: Culling) -> Self {
        Self { scene, culling }
    }
}

impl Hittable for TriangleList<'_> {
    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<HitRecord> {
        let mut closest: Option<HitRecord> = None;

        for id in 0..self.scene.triangle_count() as TriangleId {
            let max = closest.map_or(ray_t.max, |hit| hit.t);
            if let Some(hit) = HitRecord::test(self.scene, id, ray, Interval::new(ray_t.min, max), self.culling) {
                closest = Some(hit);
            }
        }

        closest
    }

    fn bounding_box(&self) -> Aabb {
        self.scene.bounds()
    }
}
