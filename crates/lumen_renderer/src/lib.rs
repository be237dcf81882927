//! Lumen Renderer - BVH-accelerated Monte Carlo path tracing.
//!
//! The scene geometry comes from `lumen_core`; this crate adds the
//! acceleration structure, intersection routines and the integrator.
//! Rendering is single-threaded by default (`render`) with a bucketed
//! rayon variant (`render_parallel`) that produces identical images.

mod brdf;
mod bucket;
mod bvh;
mod camera;
mod hittable;
mod integrator;
mod renderer;
mod sampling;
mod triangle;

pub use brdf::{phong_brdf, BrdfModel};
pub use bucket::{generate_buckets, render_bucket, render_parallel, Bucket, BucketResult, DEFAULT_BUCKET_SIZE};
pub use bvh::{Bvh, BvhConfig, BvhError, BvhNode, BvhStats, SplitAxis};
pub use camera::{Camera, RayGenerator};
pub use hittable::{HitRecord, Hittable, TriangleList};
pub use integrator::{russian_roulette, LightSampling, LightStrategy, PathTracer, COS_EPSILON, SPAWN_OFFSET};
pub use renderer::{pixel_rng, render, render_pixel, ConfigError, ImageBuffer, RenderConfig, DEFAULT_MAX_DEPTH};
pub use sampling::{gen_f32, sample_hemisphere, DirectionSample, Hemisphere};
pub use triangle::{intersect_triangle, Culling, TriangleHit, DET_EPSILON, T_EPSILON};

/// Re-export common math and scene types
pub use lumen_core::{Color, Material, Scene, SceneBuilder, TriangleId};
pub use lumen_math::{Aabb, Interval, Ray, Vec3};
