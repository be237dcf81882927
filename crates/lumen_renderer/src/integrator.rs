//! Monte Carlo path-tracing integrator.
//!
//! Every non-emissive hit gathers direct light by sampling the scene's light
//! triangles with shadow rays, then continues the path with probability
//! `survival_probability` (Russian roulette), dividing surviving indirect
//! contributions by that probability so the estimate stays unbiased.

use crate::hittable::{HitRecord, Hittable};
use crate::renderer::{ConfigError, RenderConfig};
use crate::sampling::{gen_f32, sample_hemisphere};
use lumen_core::{Color, Material, Scene, TriangleId};
use lumen_math::{Interval, Ray, Vec3};
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

/// Cosines below this count as grazing or facing away.
pub const COS_EPSILON: f32 = 1e-6;

/// Distance secondary rays are pushed off the surface they leave.
pub const SPAWN_OFFSET: f32 = 1e-4;

/// Which lights contribute direct illumination at each hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LightStrategy {
    /// Sum over every light triangle.
    #[default]
    All,
    /// One light chosen uniformly, scaled by the light count.
    UniformOne,
}

/// Where on a light triangle the shadow ray is aimed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LightSampling {
    /// Always the centroid. Biased for large lights but noise-free.
    Centroid,
    /// Uniformly over the triangle's area.
    #[default]
    Area,
}

/// Terminate with probability `1 - p`, otherwise return `continue_path / p`.
///
/// A uniform `r` in `[0, 1)` is drawn and the path ends when `r >= p`, so
/// `p = 0` always terminates and `p = 1` never does.
pub fn russian_roulette<F>(p: f32, rng: &mut dyn RngCore, continue_path: F) -> Color
where
    F: FnOnce(&mut dyn RngCore) -> Color,
{
    if gen_f32(rng) >= p {
        return Color::ZERO;
    }
    continue_path(rng) / p
}

/// Estimates the radiance arriving along camera rays.
pub struct PathTracer<'a> {
    scene: &'a Scene,
    world: &'a dyn Hittable,
    config: &'a RenderConfig,
}

impl<'a> PathTracer<'a> {
    /// `world` must be an intersector over `scene` (a `Bvh` or `TriangleList`).
    ///
    /// Fails when `config` does not validate, e.g. a NaN survival probability.
    pub fn new(
        scene: &'a Scene,
        world: &'a dyn Hittable,
        config: &'a RenderConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { scene, world, config })
    }

    pub fn config(&self) -> &RenderConfig {
        self.config
    }

    /// One radiance sample along a camera ray.
    pub fn radiance(&self, ray: &Ray, rng: &mut dyn RngCore) -> Color {
        self.trace(ray, 0, true, rng)
    }

    /// Radiance along `ray` at bounce `depth`.
    ///
    /// `include_emission` is false for indirect bounces: light reaching a
    /// surface straight from an emitter was already counted by light sampling.
    pub fn trace(&self, ray: &Ray, depth: u32, include_emission: bool, rng: &mut dyn RngCore) -> Color {
        if depth >= self.config.max_depth {
            return Color::ZERO;
        }

        let Some(hit) = self.world.hit(ray, Interval::new(0.0, f32::INFINITY)) else {
            return self.config.background;
        };

        let material = self.scene.material(hit.triangle);
        if material.is_emitter() {
            // Lights emit from their front face only, as light sampling assumes
            let front = ray.direction.dot(self.scene.triangle(hit.triangle).normal()) < 0.0;
            return if include_emission && front { material.emission } else { Color::ZERO };
        }

        let point = hit.point(ray);
        let wo = -ray.direction.normalize();
        let mut normal = self.scene.shading_normal(hit.triangle, hit.alpha, hit.beta);
        // Shade the side the ray arrived from
        if normal.dot(wo) < 0.0 {
            normal = -normal;
        }

        let direct = self.direct_light(point, normal, wo, material, rng);

        let indirect = russian_roulette(self.config.survival_probability, rng, |rng| {
            let sample = sample_hemisphere(normal, self.config.hemisphere, rng);
            let cos = normal.dot(sample.direction);
            if cos < COS_EPSILON || sample.pdf <= 0.0 {
                return Color::ZERO;
            }

            // Dividing by the pdf scales by pi / cos (cosine) or 2 pi (uniform)
            let f = self.config.brdf.eval(material, normal, sample.direction, wo);
            let bounce = Ray::spawn(point, sample.direction, SPAWN_OFFSET);
            let incoming = self.trace(&bounce, depth + 1, false, rng);
            f * cos * incoming / sample.pdf
        });

        direct + indirect
    }

    fn direct_light(
        &self,
        point: Vec3,
        normal: Vec3,
        wo: Vec3,
        material: &Material,
        rng: &mut dyn RngCore,
    ) -> Color {
        let lights = self.scene.lights();
        if lights.is_empty() {
            return Color::ZERO;
        }

        match self.config.light_strategy {
            LightStrategy::All => lights
                .iter()
                .map(|&light| self.sample_light(light, point, normal, wo, material, rng))
                .sum(),
            LightStrategy::UniformOne => {
                let light = lights[rng.gen_range(0..lights.len())];
                self.sample_light(light, point, normal, wo, material, rng) * lights.len() as f32
            }
        }
    }

    /// Single-sample estimate of the light arriving from one light triangle.
    fn sample_light(
        &self,
        light: TriangleId,
        point: Vec3,
        normal: Vec3,
        wo: Vec3,
        material: &Material,
        rng: &mut dyn RngCore,
    ) -> Color {
        let triangle = self.scene.triangle(light);
        if triangle.is_degenerate() {
            return Color::ZERO;
        }

        let target = match self.config.light_sampling {
            LightSampling::Centroid => triangle.centroid(),
            LightSampling::Area => {
                let u1 = gen_f32(rng);
                let u2 = gen_f32(rng);
                self.scene.sample_point(light, u1, u2)
            }
        };

        let to_light = target - point;
        let dist2 = to_light.length_squared();
        if dist2 <= f32::EPSILON {
            return Color::ZERO;
        }
        let wi = to_light / dist2.sqrt();

        let cos_surface = normal.dot(wi);
        let cos_light = triangle.normal().dot(-wi);
        if cos_surface < COS_EPSILON || cos_light < COS_EPSILON {
            return Color::ZERO;
        }

        let shadow = Ray::spawn(point, wi, SPAWN_OFFSET);
        let unoccluded = self
            .world
            .hit(&shadow, Interval::new(0.0, f32::INFINITY))
            .is_some_and(|blocker: HitRecord| blocker.triangle == light);
        if !unoccluded {
            return Color::ZERO;
        }

        // Both strategies use pdf = 1 / area
        let emission = self.scene.material(light).emission;
        let f = self.config.brdf.eval(material, normal, wi, wo);
        emission * f * (cos_surface * cos_light * triangle.area() / dist2)
    }
}
