use crate::Vec3;

/// A ray in 3D space with origin and direction.
///
/// The direction is not required to be normalized; intersection distances
/// are expressed in multiples of `direction`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    /// Create a new ray.
    #[inline]
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction }
    }

    /// Create a ray whose origin is nudged `offset` units along `direction`.
    ///
    /// Used for secondary rays leaving a surface so they do not re-hit it.
    #[inline]
    pub fn spawn(origin: Vec3, direction: Vec3, offset: f32) -> Self {
        Self::new(origin + direction * offset, direction)
    }

    /// Get the point along the ray at parameter t.
    ///
    /// Returns: origin + t * direction
    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

impl Default for Ray {
    fn default() -> Self {
        Self {
            origin: Vec3::ZERO,
            direction: Vec3::Z,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ray_at() {
        let ray = Ray::new(Vec3::ZERO, Vec3::X);

        assert_eq!(ray.at(0.0), Vec3::ZERO);
        assert_eq!(ray.at(1.0), Vec3::X);
        assert_eq!(ray.at(2.0), Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(ray.at(-1.0), Vec3::new(-1.0, 0.0, 0.0));
    }

    #[test]
    fn test_ray_spawn_offsets_origin() {
        let ray = Ray::spawn(Vec3::ZERO, Vec3::Y, 0.5);
        assert_eq!(ray.origin, Vec3::new(0.0, 0.5, 0.0));
        assert_eq!(ray.direction, Vec3::Y);
    }
}
