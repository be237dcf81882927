//! Random number helpers and hemisphere direction sampling.

use lumen_math::Vec3;
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use std::f32::consts::{FRAC_1_PI, PI};

/// Uniform `f32` in `[0, 1)` from a type-erased generator.
#[inline]
pub fn gen_f32(rng: &mut dyn RngCore) -> f32 {
    rng.gen::<f32>()
}

/// Distribution used to pick indirect bounce directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Hemisphere {
    /// pdf = cos(theta) / pi
    #[default]
    Cosine,
    /// pdf = 1 / (2 pi)
    Uniform,
}

/// A sampled unit direction and its solid-angle density.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionSample {
    pub direction: Vec3,
    pub pdf: f32,
}

/// Sample a unit direction in the hemisphere around the unit vector `normal`.
///
/// The returned direction always satisfies `direction.dot(normal) > 0`.
pub fn sample_hemisphere(normal: Vec3, kind: Hemisphere, rng: &mut dyn RngCore) -> DirectionSample {
    let u1 = gen_f32(rng);
    let u2 = gen_f32(rng);

    // 1 - u keeps cos_theta in (0, 1]
    let cos_theta = match kind {
        Hemisphere::Cosine => (1.0 - u1).sqrt(),
        Hemisphere::Uniform => 1.0 - u1,
    };
    let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
    let phi = 2.0 * PI * u2;

    let (tangent, bitangent) = normal.any_orthonormal_pair();
    let direction = (tangent * (phi.cos() * sin_theta)
        + bitangent * (phi.sin() * sin_theta)
        + normal * cos_theta)
        .normalize();

    let pdf = match kind {
        Hemisphere::Cosine => cos_theta * FRAC_1_PI,
        Hemisphere::Uniform => 0.5 * FRAC_1_PI,
    };

    DirectionSample { direction, pdf }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_gen_f32_range() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..1000 {
            let x = gen_f32(&mut rng);
            assert!((0.0..1.0).contains(&x));
        }
    }

    #[test]
    fn test_samples_stay_in_hemisphere() {
        let mut rng = StdRng::seed_from_u64(2);
        let normal = Vec3::new(1.0, 2.0, -0.5).normalize();

        for kind in [Hemisphere::Cosine, Hemisphere::Uniform] {
            for _ in 0..1000 {
                let sample = sample_hemisphere(normal, kind, &mut rng);
                assert!((sample.direction.length() - 1.0).abs() < 1e-4);
                assert!(sample.direction.dot(normal) > 0.0);
                assert!(sample.pdf > 0.0);
            }
        }
    }

    #[test]
    fn test_cosine_pdf_matches_direction() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..100 {
            let sample = sample_hemisphere(Vec3::Z, Hemisphere::Cosine, &mut rng);
            assert!((sample.pdf - sample.direction.z / PI).abs() < 1e-4);
        }
    }

    #[test]
    fn test_estimators_integrate_cosine() {
        // Integral of cos(theta) over the hemisphere is pi
        let mut rng = StdRng::seed_from_u64(4);
        let n = 50_000;

        for kind in [Hemisphere::Cosine, Hemisphere::Uniform] {
            let estimate: f32 = (0..n)
                .map(|_| {
                    let s = sample_hemisphere(Vec3::Y, kind, &mut rng);
                    s.direction.dot(Vec3::Y) / s.pdf
                })
                .sum::<f32>()
                / n as f32;
            assert!((estimate - PI).abs() < 0.05, "{kind:?} estimated {estimate}");
        }
    }
}
