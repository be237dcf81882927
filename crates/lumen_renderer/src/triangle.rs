//! Ray/triangle intersection.
//!
//! Solves `origin + t * d = v0 + alpha * (v1 - v0) + beta * (v2 - v0)` with
//! Cramer's rule, written with scalar triple products.

use lumen_math::{Ray, Vec3};
use serde::{Deserialize, Serialize};

/// Determinants below this magnitude mean the ray is parallel to the plane
/// or the triangle is degenerate.
pub const DET_EPSILON: f32 = 1e-8;

/// Hits at or closer than this distance are ignored to avoid self-intersection.
pub const T_EPSILON: f32 = 1e-4;

/// Which triangle sides a ray can hit.
///
/// The front side is the one the counter-clockwise winding normal
/// `(v1 - v0) x (v2 - v0)` points out of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Culling {
    /// Both sides are visible.
    #[default]
    TwoSided,
    /// Rays approaching from behind pass through.
    Backface,
}

/// A successful ray/triangle intersection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriangleHit {
    pub t: f32,
    /// Barycentric weight of `v1`
    pub alpha: f32,
    /// Barycentric weight of `v2`
    pub beta: f32,
    /// True when the ray approaches the front side
    pub front_face: bool,
}

/// Intersect a ray with the triangle `[v0, v1, v2]`.
///
/// Returns `None` for misses, for hits at `t <= T_EPSILON`, for near-zero
/// determinants and, under [`Culling::Backface`], for back-side hits.
#[inline]
pub fn intersect_triangle(ray: &Ray, [v0, v1, v2]: [Vec3; 3], culling: Culling) -> Option<TriangleHit> {
    let e1 = v1 - v0;
    let e2 = v2 - v0;

    // det = e1 . (d x e2) = -d . (e1 x e2): positive when the ray faces the front
    let p = ray.direction.cross(e2);
    let det = e1.dot(p);

    let rejected = match culling {
        Culling::TwoSided => det.abs() < DET_EPSILON,
        Culling::Backface => det < DET_EPSILON,
    };
    if rejected {
        return None;
    }

    let inv_det = 1.0 / det;
    let s = ray.origin - v0;

    let alpha = s.dot(p) * inv_det;
    if !(0.0..=1.0).contains(&alpha) {
        return None;
    }

    let q = s.cross(e1);
    let beta = ray.direction.dot(q) * inv_det;
    if beta < 0.0 || alpha + beta > 1.0 {
        return None;
    }

    let t = e2.dot(q) * inv_det;
    if t <= T_EPSILON {
        return None;
    }

    Some(TriangleHit {
        t,
        alpha,
        beta,
        front_face: det > 0.0,
    })
}
