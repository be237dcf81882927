use crate::{axis_component, Interval, Ray, Vec3};

/// Direction components smaller than this are treated as parallel to a slab.
pub const DIR_EPSILON: f32 = 1e-8;

/// Tolerance used when comparing slab entry/exit distances.
pub const SLAB_EPSILON: f32 = 1e-6;

/// Axis-Aligned Bounding Box for spatial acceleration structures (BVH).
///
/// An AABB is defined by three intervals (one per axis) that bound a 3D volume.
/// Boxes are tight: no padding is applied, so a flat triangle produces a box
/// with zero thickness along its normal axis.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Aabb {
    pub x: Interval,
    pub y: Interval,
    pub z: Interval,
}

impl Aabb {
    /// Create a new AABB from three intervals.
    pub fn new(x: Interval, y: Interval, z: Interval) -> Self {
        Self { x, y, z }
    }

    /// Create an AABB from two corner points.
    pub fn from_points(a: Vec3, b: Vec3) -> Self {
        let min = a.min(b);
        let max = a.max(b);
        Self {
            x: Interval::new(min.x, max.x),
            y: Interval::new(min.y, max.y),
            z: Interval::new(min.z, max.z),
        }
    }

    /// The tight box around a set of points. Empty input gives `Aabb::EMPTY`.
    pub fn from_point_set(points: &[Vec3]) -> Self {
        points.iter().fold(Aabb::EMPTY, |acc, &p| acc.grow(p))
    }

    /// Create an AABB that surrounds two other AABBs.
    pub fn surrounding(box0: &Aabb, box1: &Aabb) -> Self {
        Self {
            x: Interval::surrounding(&box0.x, &box1.x),
            y: Interval::surrounding(&box0.y, &box1.y),
            z: Interval::surrounding(&box0.z, &box1.z),
        }
    }

    /// Returns this box grown to contain `p`.
    pub fn grow(&self, p: Vec3) -> Self {
        Self {
            x: self.x.include(p.x),
            y: self.y.include(p.y),
            z: self.z.include(p.z),
        }
    }

    /// Get the interval for a specific axis (0=X, 1=Y, 2=Z).
    pub fn axis_interval(&self, n: usize) -> Interval {
        match n {
            0 => self.x,
            1 => self.y,
            _ => self.z,
        }
    }

    /// The minimum corner.
    pub fn min(&self) -> Vec3 {
        Vec3::new(self.x.min, self.y.min, self.z.min)
    }

    /// The maximum corner.
    pub fn max(&self) -> Vec3 {
        Vec3::new(self.x.max, self.y.max, self.z.max)
    }

    /// True when the box contains no point at all.
    pub fn is_empty(&self) -> bool {
        self.x.is_empty() || self.y.is_empty() || self.z.is_empty()
    }

    /// True if `p` lies inside the box or on its boundary.
    pub fn contains_point(&self, p: Vec3) -> bool {
        self.x.contains(p.x) && self.y.contains(p.y) && self.z.contains(p.z)
    }

    /// True if `other` lies entirely inside this box. Every box contains the empty box.
    pub fn contains(&self, other: &Aabb) -> bool {
        other.is_empty() || (self.contains_point(other.min()) && self.contains_point(other.max()))
    }

    /// Slab test returning the parametric range `[entry, exit]` where the ray is
    /// inside the box, or `None` when it misses.
    ///
    /// Direction components within `DIR_EPSILON` of zero never divide: the slab
    /// is unbounded when the origin lies inside it and empty otherwise. A box
    /// entirely behind the origin (`exit < SLAB_EPSILON`) is a miss.
    pub fn hit_interval(&self, r: &Ray) -> Option<Interval> {
        if self.is_empty() {
            return None;
        }

        let mut entry = f32::NEG_INFINITY;
        let mut exit = f32::INFINITY;

        for axis in 0..3 {
            let slab = self.axis_interval(axis);
            let origin = axis_component(r.origin, axis);
            let dir = axis_component(r.direction, axis);

            if dir.abs() < DIR_EPSILON {
                if !slab.contains(origin) {
                    return None;
                }
                continue;
            }

            let inv = 1.0 / dir;
            let mut t0 = (slab.min - origin) * inv;
            let mut t1 = (slab.max - origin) * inv;
            if inv < 0.0 {
                std::mem::swap(&mut t0, &mut t1);
            }
            entry = entry.max(t0);
            exit = exit.min(t1);
        }

        if entry <= exit + SLAB_EPSILON && exit >= SLAB_EPSILON {
            Some(Interval::new(entry, exit))
        } else {
            None
        }
    }

    /// Test if a ray intersects this AABB within the given interval.
    pub fn hit(&self, r: &Ray, ray_t: Interval) -> bool {
        self.hit_interval(r)
            .is_some_and(|span| !span.intersection(&ray_t).is_empty())
    }

    /// Returns the index (0=X, 1=Y, 2=Z) of the axis with the longest extent.
    pub fn longest_axis(&self) -> usize {
        let x_size = self.x.size();
        let y_size = self.y.size();
        let z_size = self.z.size();

        if x_size > y_size && x_size > z_size {
            0
        } else if y_size > z_size {
            1
        } else {
            2
        }
    }

    /// Returns the center point of the bounding box.
    pub fn centroid(&self) -> Vec3 {
        (self.min() + self.max()) * 0.5
    }

    pub const EMPTY: Aabb = Aabb {
        x: Interval::EMPTY,
        y: Interval::EMPTY,
        z: Interval::EMPTY,
    };
}

impl Default for Aabb {
    fn default() -> Self {
        Self::EMPTY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box() -> Aabb {
        Aabb::from_points(Vec3::splat(-1.0), Vec3::splat(1.0))
    }

    #[test]
    fn test_aabb_from_points_is_tight() {
        let aabb = Aabb::from_points(Vec3::new(10.0, 0.0, 3.0), Vec3::new(0.0, 10.0, 3.0));

        assert_eq!(aabb.min(), Vec3::new(0.0, 0.0, 3.0));
        assert_eq!(aabb.max(), Vec3::new(10.0, 10.0, 3.0));
        assert_eq!(aabb.z.size(), 0.0);
    }

    #[test]
    fn test_aabb_surrounding_and_contains() {
        let box1 = Aabb::from_points(Vec3::ZERO, Vec3::splat(5.0));
        let box2 = Aabb::from_points(Vec3::splat(3.0), Vec3::splat(10.0));
        let surrounding = Aabb::surrounding(&box1, &box2);

        assert_eq!(surrounding.min(), Vec3::ZERO);
        assert_eq!(surrounding.max(), Vec3::splat(10.0));
        assert!(surrounding.contains(&box1));
        assert!(surrounding.contains(&box2));
        assert!(!box1.contains(&box2));
        assert!(box1.contains(&Aabb::EMPTY));
    }

    #[test]
    fn test_aabb_from_point_set() {
        let aabb = Aabb::from_point_set(&[Vec3::X, Vec3::Y, Vec3::new(0.0, 0.0, -2.0)]);
        assert_eq!(aabb.min(), Vec3::new(0.0, 0.0, -2.0));
        assert_eq!(aabb.max(), Vec3::new(1.0, 1.0, 0.0));

        assert!(Aabb::from_point_set(&[]).is_empty());
    }

    #[test]
    fn test_aabb_hit() {
        let aabb = unit_box();

        // Ray pointing at center
        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::Z);
        let span = aabb.hit_interval(&ray).unwrap();
        assert!((span.min - 4.0).abs() < 1e-6);
        assert!((span.max - 6.0).abs() < 1e-6);
        assert!(aabb.hit(&ray, Interval::new(0.0, 100.0)));

        // Ray pointing away: box is behind the origin
        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), -Vec3::Z);
        assert!(aabb.hit_interval(&ray).is_none());

        // Ray missing the box
        let ray = Ray::new(Vec3::new(10.0, 0.0, 0.0), Vec3::Z);
        assert!(aabb.hit_interval(&ray).is_none());
    }

    #[test]
    fn test_aabb_hit_respects_ray_interval() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::Z);
        assert!(!unit_box().hit(&ray, Interval::new(0.0, 3.0)));
        assert!(unit_box().hit(&ray, Interval::new(0.0, 4.5)));
    }

    #[test]
    fn test_aabb_hit_from_inside() {
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.3, -0.2, 1.0));
        let span = unit_box().hit_interval(&ray).unwrap();
        assert!(span.min < 0.0);
        assert!(span.max > 0.0);
    }

    #[test]
    fn test_aabb_axis_parallel_ray() {
        // Zero x/y components: slabs are unbounded only while the origin is inside them
        let inside = Ray::new(Vec3::new(0.5, 0.5, -5.0), Vec3::Z);
        assert!(unit_box().hit_interval(&inside).is_some());

        let outside = Ray::new(Vec3::new(1.5, 0.5, -5.0), Vec3::Z);
        assert!(unit_box().hit_interval(&outside).is_none());
    }

    #[test]
    fn test_aabb_flat_box_hit() {
        // Zero-thickness box in the z = 0 plane
        let flat = Aabb::from_points(Vec3::new(-1.0, -1.0, 0.0), Vec3::new(1.0, 1.0, 0.0));

        let head_on = Ray::new(Vec3::new(0.0, 0.0, 3.0), -Vec3::Z);
        let span = flat.hit_interval(&head_on).unwrap();
        assert!((span.min - 3.0).abs() < 1e-6);

        let grazing = Ray::new(Vec3::new(-5.0, 0.0, 0.0), Vec3::X);
        assert!(flat.hit_interval(&grazing).is_some());
    }

    #[test]
    fn test_empty_aabb_never_hit() {
        let ray = Ray::new(Vec3::ZERO, Vec3::Z);
        assert!(Aabb::EMPTY.hit_interval(&ray).is_none());
    }

    #[test]
    fn test_aabb_centroid() {
        let aabb = Aabb::from_points(Vec3::ZERO, Vec3::splat(10.0));
        assert_eq!(aabb.centroid(), Vec3::splat(5.0));
    }

    #[test]
    fn test_aabb_longest_axis() {
        let aabb_x = Aabb::from_points(Vec3::ZERO, Vec3::new(10.0, 1.0, 1.0));
        assert_eq!(aabb_x.longest_axis(), 0);

        let aabb_y = Aabb::from_points(Vec3::ZERO, Vec3::new(1.0, 10.0, 1.0));
        assert_eq!(aabb_y.longest_axis(), 1);

        let aabb_z = Aabb::from_points(Vec3::ZERO, Vec3::new(1.0, 1.0, 10.0));
        assert_eq!(aabb_z.longest_axis(), 2);
    }
}
