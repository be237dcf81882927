//! Reflectance model.

use lumen_core::{Color, Material};
use lumen_math::Vec3;
use serde::{Deserialize, Serialize};
use std::f32::consts::FRAC_1_PI;

/// Which form of the Phong BRDF the integrator evaluates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BrdfModel {
    /// [`phong_brdf`]: the diffuse color is used as-is.
    #[default]
    Phong,
    /// Diffuse term divided by pi, so a diffuse albedo below one reflects
    /// less energy than it receives. Closed scenes need this to converge.
    NormalizedPhong,
}

impl BrdfModel {
    pub fn eval(self, material: &Material, normal: Vec3, wi: Vec3, wo: Vec3) -> Color {
        match self {
            BrdfModel::Phong => blinn_phong(material.diffuse, material, normal, wi, wo),
            BrdfModel::NormalizedPhong => {
                blinn_phong(material.diffuse * FRAC_1_PI, material, normal, wi, wo)
            }
        }
    }
}

/// Lambertian term plus a Blinn-Phong specular lobe:
/// `diffuse + specular * max(0, n.h)^shininess`.
///
/// `wi` points toward the light and `wo` toward the viewer; both leave the
/// surface at `normal`.
#[inline]
pub fn phong_brdf(material: &Material, normal: Vec3, wi: Vec3, wo: Vec3) -> Color {
    blinn_phong(material.diffuse, material, normal, wi, wo)
}

#[inline]
fn blinn_phong(diffuse: Color, material: &Material, normal: Vec3, wi: Vec3, wo: Vec3) -> Color {
    if material.specular == Color::ZERO {
        return diffuse;
    }

    let n_dot_h = (wi + wo)
        .try_normalize()
        .map_or(0.0, |h| normal.dot(h).max(0.0));
    diffuse + material.specular * n_dot_h.powf(material.shininess)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diffuse_only() {
        let material = Material::new("grey", Color::splat(0.5));
        let wi = Vec3::new(0.3, 1.0, 0.0).normalize();
        let f = phong_brdf(&material, Vec3::Y, wi, Vec3::Y);

        assert!((f - Color::splat(0.5)).length() < 1e-6);
    }

    #[test]
    fn test_specular_peak_at_mirror_direction() {
        let material = Material::new("shiny", Color::ZERO).with_specular(Color::ONE, 32.0);
        let wi = Vec3::new(1.0, 1.0, 0.0).normalize();

        // Mirror configuration: h equals the normal
        let mirror = phong_brdf(&material, Vec3::Y, wi, Vec3::new(-1.0, 1.0, 0.0).normalize());
        assert!((mirror - Color::ONE).length() < 1e-5);

        let off = phong_brdf(&material, Vec3::Y, wi, wi);
        assert!(off.x < mirror.x);
        assert!(off.x >= 0.0);
    }

    #[test]
    fn test_opposite_directions_do_not_produce_nan() {
        let material = Material::new("shiny", Color::splat(0.2)).with_specular(Color::ONE, 8.0);
        let f = phong_brdf(&material, Vec3::Y, Vec3::X, -Vec3::X);
        assert!(f.is_finite());
        assert!((f - Color::splat(0.2)).length() < 1e-6);
    }

    #[test]
    fn test_normalized_model_divides_diffuse_only() {
        let material = Material::new("shiny", Color::splat(0.6)).with_specular(Color::splat(0.3), 4.0);
        let wi = Vec3::new(0.2, 1.0, 0.4).normalize();
        let wo = Vec3::new(-0.5, 1.0, 0.1).normalize();

        let plain = BrdfModel::Phong.eval(&material, Vec3::Y, wi, wo);
        let normalized = BrdfModel::NormalizedPhong.eval(&material, Vec3::Y, wi, wo);

        assert_eq!(plain, phong_brdf(&material, Vec3::Y, wi, wo));
        let diff = plain - normalized;
        assert!((diff - Color::splat(0.6 * (1.0 - FRAC_1_PI))).length() < 1e-6);
    }
}
