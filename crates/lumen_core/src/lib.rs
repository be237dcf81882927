//! Lumen Core - immutable scene geometry for the path tracer.
//!
//! This crate provides:
//!
//! - **Materials**: Phong-style surface descriptions; emission decides what is a light
//! - **Meshes**: loader-facing indexed triangle meshes
//! - **Scene**: flat vertex attribute storage, triangles with cached derived data,
//!   and the light list
//!
//! # Example
//!
//! ```ignore
//! use lumen_core::{Material, SceneBuilder};
//! use lumen_math::Vec3;
//!
//! let mut builder = SceneBuilder::new("single");
//! let grey = builder.add_material(Material::new("grey", Vec3::splat(0.5)))?;
//! builder.push_triangle([Vec3::ZERO, Vec3::X, Vec3::Y], grey)?;
//! let scene = builder.build();
//! ```

pub mod material;
pub mod mesh;
pub mod scene;
pub mod triangle;

// Re-export commonly used types
pub use material::{Color, Material, EMISSION_EPSILON};
pub use mesh::Mesh;
pub use scene::{Scene, SceneBuilder, SceneError, Transform};
pub use triangle::{MaterialId, Triangle, TriangleId, TriangleIndices};
