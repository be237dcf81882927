//! Surface materials.
//!
//! Materials are load-time immutable. Whether geometry is a light is decided
//! solely by its material's emission (see [`Material::is_emitter`]).

use lumen_math::Vec3;
use serde::{Deserialize, Serialize};

/// Linear RGB color.
pub type Color = Vec3;

/// Emission channels above this value make a material a light emitter.
pub const EMISSION_EPSILON: f32 = 1e-3;

/// A Phong-style material definition as supplied by the scene loader.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Material {
    /// Material name (from the source file)
    pub name: String,

    /// Diffuse reflectance (RGB, 0-1)
    pub diffuse: Color,

    /// Specular reflectance of the Phong lobe
    pub specular: Color,

    /// Ambient color. Carried for loaders; the integrator does not use it.
    pub ambient: Color,

    /// Emitted radiance
    pub emission: Color,

    /// Phong exponent
    pub shininess: f32,

    /// Opacity (0=transparent, 1=opaque)
    pub opacity: f32,

    /// Index of refraction
    pub refraction_index: f32,

    /// Path to a diffuse texture map. Decoding happens outside the core.
    pub texture: Option<String>,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: String::new(),
            diffuse: Color::splat(0.5),
            specular: Color::ZERO,
            ambient: Color::ZERO,
            emission: Color::ZERO,
            shininess: 1.0,
            opacity: 1.0,
            refraction_index: 1.0,
            texture: None,
        }
    }
}

impl Material {
    /// Create a diffuse-only material.
    pub fn new(name: impl Into<String>, diffuse: Color) -> Self {
        Self {
            name: name.into(),
            diffuse,
            ..Default::default()
        }
    }

    /// Create a black-bodied emitter.
    pub fn emissive(name: impl Into<String>, emission: Color) -> Self {
        Self {
            name: name.into(),
            diffuse: Color::ZERO,
            emission,
            ..Default::default()
        }
    }

    /// Set the Phong specular lobe.
    pub fn with_specular(mut self, specular: Color, shininess: f32) -> Self {
        self.specular = specular;
        self.shininess = shininess;
        self
    }

    /// Set the emitted radiance.
    pub fn with_emission(mut self, emission: Color) -> Self {
        self.emission = emission;
        self
    }

    pub fn with_ambient(mut self, ambient: Color) -> Self {
        self.ambient = ambient;
        self
    }

    pub fn with_texture(mut self, path: impl Into<String>) -> Self {
        self.texture = Some(path.into());
        self
    }

    /// Check if this material emits light.
    pub fn is_emitter(&self) -> bool {
        self.emission.max_element() > EMISSION_EPSILON
    }

    /// Check if this material references a texture map.
    pub fn has_texture(&self) -> bool {
        self.texture.is_some()
    }

    /// Name of the first field holding a negative or non-finite value, if any.
    pub fn invalid_field(&self) -> Option<&'static str> {
        let color_ok = |c: Color| c.is_finite() && c.min_element() >= 0.0;
        let scalar_ok = |s: f32| s.is_finite() && s >= 0.0;

        if !color_ok(self.diffuse) {
            Some("diffuse")
        } else if !color_ok(self.specular) {
            Some("specular")
        } else if !color_ok(self.ambient) {
            Some("ambient")
        } else if !color_ok(self.emission) {
            Some("emission")
        } else if !scalar_ok(self.shininess) {
            Some("shininess")
        } else if !scalar_ok(self.opacity) {
            Some("opacity")
        } else if !scalar_ok(self.refraction_index) {
            Some("refraction_index")
        } else {
            None
        }
    }
}
