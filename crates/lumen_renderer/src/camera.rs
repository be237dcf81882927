//! Camera for ray generation.

use crate::sampling::gen_f32;
use lumen_math::{Ray, Vec3};
use rand::RngCore;

/// Produces primary rays for pixel coordinates.
///
/// Pixel `(0, 0)` is the top-left corner of the image.
pub trait RayGenerator: Send + Sync {
    /// Image size in pixels as `(width, height)`.
    fn resolution(&self) -> (u32, u32);

    /// A ray through a random point inside pixel `(x, y)`.
    fn generate_ray(&self, x: u32, y: u32, rng: &mut dyn RngCore) -> Ray;
}

/// Thin-lens perspective camera. A zero defocus angle gives a pinhole.
#[derive(Clone, Debug)]
pub struct Camera {
    pub image_width: u32,
    pub image_height: u32,

    // Camera positioning
    look_from: Vec3,
    look_at: Vec3,
    vup: Vec3,

    // Lens settings
    vfov: f32,          // Vertical field of view in degrees
    defocus_angle: f32, // Variation angle of rays through each pixel
    focus_dist: f32,    // Distance from camera to plane of perfect focus

    // Cached computed values (set by initialize())
    center: Vec3,
    pixel00_loc: Vec3,
    pixel_delta_u: Vec3,
    pixel_delta_v: Vec3,
    w: Vec3,
    defocus_disk_u: Vec3,
    defocus_disk_v: Vec3,
}

impl Camera {
    /// Create a camera at the origin looking down -Z with a 90 degree field of view.
    pub fn new() -> Self {
        let mut camera = Self {
            image_width: 800,
            image_height: 450,
            look_from: Vec3::ZERO,
            look_at: Vec3::new(0.0, 0.0, -1.0),
            vup: Vec3::Y,
            vfov: 90.0,
            defocus_angle: 0.0,
            focus_dist: 1.0,
            center: Vec3::ZERO,
            pixel00_loc: Vec3::ZERO,
            pixel_delta_u: Vec3::ZERO,
            pixel_delta_v: Vec3::ZERO,
            w: Vec3::Z,
            defocus_disk_u: Vec3::ZERO,
            defocus_disk_v: Vec3::ZERO,
        };
        camera.initialize();
        camera
    }

    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.image_width = width.max(1);
        self.image_height = height.max(1);
        self.initialize();
        self
    }

    pub fn with_position(mut self, look_from: Vec3, look_at: Vec3, vup: Vec3) -> Self {
        self.look_from = look_from;
        self.look_at = look_at;
        self.vup = vup;
        self.initialize();
        self
    }

    pub fn with_lens(mut self, vfov: f32, defocus_angle: f32, focus_dist: f32) -> Self {
        self.vfov = vfov;
        self.defocus_angle = defocus_angle;
        self.focus_dist = focus_dist;
        self.initialize();
        self
    }

    /// Recompute the cached viewport after changing public fields.
    pub fn initialize(&mut self) {
        self.center = self.look_from;

        let theta = self.vfov.to_radians();
        let h = (theta / 2.0).tan();
        let viewport_height = 2.0 * h * self.focus_dist;
        let viewport_width = viewport_height * (self.image_width as f32 / self.image_height as f32);

        // Right-handed basis with w pointing back toward the viewer
        self.w = (self.look_from - self.look_at).try_normalize().unwrap_or(Vec3::Z);
        let u = self.vup.cross(self.w).try_normalize().unwrap_or(Vec3::X);
        let v = self.w.cross(u);

        let viewport_u = viewport_width * u;
        let viewport_v = -viewport_height * v;

        self.pixel_delta_u = viewport_u / self.image_width as f32;
        self.pixel_delta_v = viewport_v / self.image_height as f32;

        let viewport_upper_left =
            self.center - self.focus_dist * self.w - viewport_u / 2.0 - viewport_v / 2.0;
        self.pixel00_loc = viewport_upper_left + 0.5 * (self.pixel_delta_u + self.pixel_delta_v);

        let defocus_radius = self.focus_dist * (self.defocus_angle / 2.0).to_radians().tan();
        self.defocus_disk_u = u * defocus_radius;
        self.defocus_disk_v = v * defocus_radius;
    }

    fn defocus_disk_sample(&self, rng: &mut dyn RngCore) -> Vec3 {
        let p = random_in_unit_disk(rng);
        self.center + p.x * self.defocus_disk_u + p.y * self.defocus_disk_v
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

impl RayGenerator for Camera {
    fn resolution(&self) -> (u32, u32) {
        (self.image_width, self.image_height)
    }

    fn generate_ray(&self, x: u32, y: u32, rng: &mut dyn RngCore) -> Ray {
        let offset_x = gen_f32(rng) - 0.5;
        let offset_y = gen_f32(rng) - 0.5;

        let pixel_sample = self.pixel00_loc
            + (x as f32 + offset_x) * self.pixel_delta_u
            + (y as f32 + offset_y) * self.pixel_delta_v;

        let origin = if self.defocus_angle <= 0.0 {
            self.center
        } else {
            self.defocus_disk_sample(rng)
        };

        Ray::new(origin, pixel_sample - origin)
    }
}

/// Rejection-sample a point in the unit disk (z = 0).
fn random_in_unit_disk(rng: &mut dyn RngCore) -> Vec3 {
    loop {
        let p = Vec3::new(gen_f32(rng) * 2.0 - 1.0, gen_f32(rng) * 2.0 - 1.0, 0.0);
        if p.length_squared() < 1.0 {
            return p;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_camera_basis() {
        let camera = Camera::new()
            .with_resolution(800, 600)
            .with_position(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0), Vec3::Y);

        assert_eq!(camera.center, Vec3::ZERO);
        assert!((camera.w - Vec3::Z).length() < 0.001);
        assert_eq!(camera.resolution(), (800, 600));
    }

    #[test]
    fn test_center_ray_points_forward() {
        let camera = Camera::new()
            .with_resolution(101, 101)
            .with_position(Vec3::new(0.0, 1.0, 5.0), Vec3::new(0.0, 1.0, 0.0), Vec3::Y);
        let mut rng = StdRng::seed_from_u64(42);

        let ray = camera.generate_ray(50, 50, &mut rng);
        assert_eq!(ray.origin, Vec3::new(0.0, 1.0, 5.0));
        let dir = ray.direction.normalize();
        assert!(dir.z < -0.99, "center ray direction {dir}");
    }

    #[test]
    fn test_corner_rays_are_oriented() {
        let camera = Camera::new().with_resolution(100, 100);
        let mut rng = StdRng::seed_from_u64(1);

        // Top-left pixel looks up and to the left
        let top_left = camera.generate_ray(0, 0, &mut rng).direction;
        assert!(top_left.x < 0.0 && top_left.y > 0.0);

        let bottom_right = camera.generate_ray(99, 99, &mut rng).direction;
        assert!(bottom_right.x > 0.0 && bottom_right.y < 0.0);
    }

    #[test]
    fn test_defocus_moves_origin_within_lens() {
        let camera = Camera::new().with_lens(40.0, 10.0, 4.0);
        let mut rng = StdRng::seed_from_u64(2);
        let radius = 4.0 * (5.0f32).to_radians().tan();

        for _ in 0..100 {
            let ray = camera.generate_ray(400, 225, &mut rng);
            assert!(ray.origin.length() <= radius + 1e-5);
        }
    }
}
