// Transform utilities for Mat4
//
// Extends glam::Mat4 with the helpers needed to bake instance transforms
// into world-space triangle data.

use crate::Aabb;
use glam::{Mat3, Mat4, Vec3};

/// Extension trait for Mat4 to provide additional transform utilities
pub trait Mat4Ext {
    /// Transform a surface normal (inverse-transpose of the upper 3x3), normalized.
    fn transform_normal3(&self, normal: Vec3) -> Vec3;

    /// Transform an axis-aligned bounding box.
    /// Computes the bounding box of all 8 transformed corners.
    fn transform_aabb(&self, aabb: &Aabb) -> Aabb;

    /// True if the transform mirrors space, which flips triangle winding.
    fn flips_handedness(&self) -> bool;
}

impl Mat4Ext for Mat4 {
    fn transform_normal3(&self, normal: Vec3) -> Vec3 {
        let normal_matrix = Mat3::from_mat4(*self).inverse().transpose();
        (normal_matrix * normal).normalize_or_zero()
    }

    fn transform_aabb(&self, aabb: &Aabb) -> Aabb {
        if aabb.is_empty() {
            return Aabb::EMPTY;
        }

        let (lo, hi) = (aabb.min(), aabb.max());
        let corners = [
            Vec3::new(lo.x, lo.y, lo.z),
            Vec3::new(hi.x, lo.y, lo.z),
            Vec3::new(lo.x, hi.y, lo.z),
            Vec3::new(hi.x, hi.y, lo.z),
            Vec3::new(lo.x, lo.y, hi.z),
            Vec3::new(hi.x, lo.y, hi.z),
            Vec3::new(lo.x, hi.y, hi.z),
            Vec3::new(hi.x, hi.y, hi.z),
        ];

        corners
            .iter()
            .fold(Aabb::EMPTY, |acc, &corner| acc.grow(self.transform_point3(corner)))
    }

    fn flips_handedness(&self) -> bool {
        Mat3::from_mat4(*self).determinant() < 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transform_normal_ignores_translation() {
        let mat = Mat4::from_translation(Vec3::new(10.0, 20.0, 30.0));
        let normal = mat.transform_normal3(Vec3::Y);

        assert!((normal - Vec3::Y).length() < 1e-6);
    }

    #[test]
    fn test_transform_normal_non_uniform_scale() {
        // A 45 degree plane squashed along x: the normal tilts towards x
        let mat = Mat4::from_scale(Vec3::new(0.5, 1.0, 1.0));
        let n = Vec3::new(1.0, 1.0, 0.0).normalize();
        let transformed = mat.transform_normal3(n);

        assert!((transformed.length() - 1.0).abs() < 1e-6);
        assert!(transformed.x > transformed.y);
    }

    #[test]
    fn test_transform_aabb_translation() {
        let mat = Mat4::from_translation(Vec3::new(5.0, 0.0, 0.0));
        let aabb = Aabb::from_points(Vec3::ZERO, Vec3::ONE);
        let transformed = mat.transform_aabb(&aabb);

        assert!((transformed.x.min - 5.0).abs() < 1e-6);
        assert!((transformed.x.max - 6.0).abs() < 1e-6);
    }

    #[test]
    fn test_transform_aabb_rotation_grows_box() {
        let mat = Mat4::from_rotation_z(std::f32::consts::FRAC_PI_4);
        let aabb = Aabb::from_points(Vec3::splat(-1.0), Vec3::splat(1.0));
        let transformed = mat.transform_aabb(&aabb);

        let expected = 2.0_f32.sqrt();
        assert!((transformed.x.max - expected).abs() < 1e-5);
        assert!((transformed.z.max - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_flips_handedness() {
        assert!(!Mat4::IDENTITY.flips_handedness());
        assert!(Mat4::from_scale(Vec3::new(-1.0, 1.0, 1.0)).flips_handedness());
    }
}
