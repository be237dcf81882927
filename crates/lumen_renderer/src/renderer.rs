//! Render configuration, the image buffer and the serial render loop.

use crate::brdf::BrdfModel;
use crate::camera::RayGenerator;
use crate::integrator::{LightSampling, LightStrategy, PathTracer};
use crate::sampling::Hemisphere;
use crate::bucket::DEFAULT_BUCKET_SIZE;
use lumen_core::Color;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use thiserror::Error;

/// Default cap on path length.
pub const DEFAULT_MAX_DEPTH: u32 = 64;

/// Problems with a render configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse render config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("survival probability {0} is outside [0, 1]")]
    InvalidSurvival(f32),

    #[error("samples per pixel must be at least 1")]
    ZeroSamples,

    #[error("bucket size must be at least 1")]
    ZeroBucketSize,
}

/// Render configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub samples_per_pixel: u32,
    /// Probability that a path continues past each bounce
    pub survival_probability: f32,
    /// Bounces at or beyond this depth return black
    pub max_depth: u32,
    /// Radiance of rays that escape the scene
    pub background: Color,
    pub light_strategy: LightStrategy,
    pub light_sampling: LightSampling,
    pub hemisphere: Hemisphere,
    pub brdf: BrdfModel,
    /// Base seed of the per-pixel random streams
    pub seed: u64,
    /// Edge length of the square tiles used by `render_parallel`
    pub bucket_size: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            samples_per_pixel: 16,
            survival_probability: 0.8,
            max_depth: DEFAULT_MAX_DEPTH,
            background: Color::ZERO,
            light_strategy: LightStrategy::default(),
            light_sampling: LightSampling::default(),
            hemisphere: Hemisphere::default(),
            brdf: BrdfModel::default(),
            seed: 0,
            bucket_size: DEFAULT_BUCKET_SIZE,
        }
    }
}

impl RenderConfig {
    /// Parse a JSON document; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.survival_probability) {
            return Err(ConfigError::InvalidSurvival(self.survival_probability));
        }
        if self.samples_per_pixel == 0 {
            return Err(ConfigError::ZeroSamples);
        }
        if self.bucket_size == 0 {
            return Err(ConfigError::ZeroBucketSize);
        }
        Ok(())
    }

    pub fn with_samples(mut self, samples_per_pixel: u32) -> Self {
        self.samples_per_pixel = samples_per_pixel;
        self
    }

    pub fn with_survival_probability(mut self, p: f32) -> Self {
        self.survival_probability = p;
        self
    }

    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_background(mut self, background: Color) -> Self {
        self.background = background;
        self
    }

    pub fn with_light_strategy(mut self, strategy: LightStrategy) -> Self {
        self.light_strategy = strategy;
        self
    }

    pub fn with_light_sampling(mut self, sampling: LightSampling) -> Self {
        self.light_sampling = sampling;
        self
    }

    pub fn with_hemisphere(mut self, hemisphere: Hemisphere) -> Self {
        self.hemisphere = hemisphere;
        self
    }

    pub fn with_brdf(mut self, brdf: BrdfModel) -> Self {
        self.brdf = brdf;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_bucket_size(mut self, bucket_size: u32) -> Self {
        self.bucket_size = bucket_size;
        self
    }
}

/// Linear RGB image, row-major from the top-left pixel.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageBuffer {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<Color>,
}

impl ImageBuffer {
    /// Create a new image buffer filled with black.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Color::ZERO; width as usize * height as usize],
        }
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Get the pixel at (x, y).
    pub fn get(&self, x: u32, y: u32) -> Color {
        self.pixels[self.index(x, y)]
    }

    /// Set the pixel at (x, y).
    pub fn set(&mut self, x: u32, y: u32, color: Color) {
        let index = self.index(x, y);
        self.pixels[index] = color;
    }

    /// Add `color` onto the pixel at (x, y).
    pub fn accumulate(&mut self, x: u32, y: u32, color: Color) {
        let index = self.index(x, y);
        self.pixels[index] += color;
    }

    /// Multiply every pixel by `factor`.
    pub fn scale(&mut self, factor: f32) {
        for pixel in &mut self.pixels {
            *pixel *= factor;
        }
    }

    /// Average color over the whole image.
    pub fn mean(&self) -> Color {
        if self.pixels.is_empty() {
            return Color::ZERO;
        }
        self.pixels.iter().sum::<Color>() / self.pixels.len() as f32
    }

    /// Raw little-endian `f32` RGB triples.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }
}

/// The random stream owned by one pixel.
///
/// Seeded from the render seed and the pixel index alone, so the result does
/// not depend on the order pixels are visited in.
pub fn pixel_rng(seed: u64, pixel_index: u64) -> StdRng {
    StdRng::seed_from_u64(seed ^ pixel_index.wrapping_mul(0x9E37_79B9_7F4A_7C15))
}

/// Average `samples_per_pixel` radiance samples for pixel (x, y).
pub fn render_pixel(camera: &dyn RayGenerator, tracer: &PathTracer, x: u32, y: u32) -> Color {
    let config = tracer.config();
    let (width, _) = camera.resolution();
    let mut rng = pixel_rng(config.seed, y as u64 * width as u64 + x as u64);

    let mut pixel_color = Color::ZERO;
    for _ in 0..config.samples_per_pixel {
        let ray = camera.generate_ray(x, y, &mut rng);
        pixel_color += tracer.radiance(&ray, &mut rng);
    }

    pixel_color / config.samples_per_pixel.max(1) as f32
}

/// Render the whole image on the calling thread, row by row.
pub fn render(camera: &dyn RayGenerator, tracer: &PathTracer) -> ImageBuffer {
    let start = Instant::now();
    let (width, height) = camera.resolution();
    let mut image = ImageBuffer::new(width, height);

    for y in 0..height {
        for x in 0..width {
            image.set(x, y, render_pixel(camera, tracer, x, y));
        }
    }

    log::info!(
        "Rendered {}x{} at {} spp in {:?}",
        width,
        height,
        tracer.config().samples_per_pixel,
        start.elapsed()
    );
    image
}
