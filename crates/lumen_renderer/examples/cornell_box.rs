//! Cornell box render.
//!
//! Run with: cargo run --release --example cornell_box -- [config.json] [output.ppm]
//!
//! The optional JSON file overrides `RenderConfig` fields; missing fields keep
//! their defaults. A closed box needs `"brdf": "NormalizedPhong"` to converge.

use anyhow::{Context, Result};
use lumen_core::{Mesh, Transform};
use lumen_math::Quat;
use lumen_renderer::{
    render_parallel, BrdfModel, Bvh, BvhConfig, Camera, Color, ImageBuffer, Material, PathTracer, RenderConfig,
    SceneBuilder, Vec3,
};
use std::env;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::time::Instant;

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args: Vec<String> = env::args().collect();
    let config = match args.get(1) {
        Some(path) => {
            let json = fs::read_to_string(path).with_context(|| format!("reading config {path}"))?;
            RenderConfig::from_json(&json).with_context(|| format!("parsing config {path}"))?
        }
        None => RenderConfig::default()
            .with_samples(64)
            .with_brdf(BrdfModel::NormalizedPhong),
    };
    let output = args.get(2).map(String::as_str).unwrap_or("cornell_box.ppm");

    let scene = build_scene().context("building the Cornell box")?;
    let bvh = Bvh::build(&scene, &BvhConfig::default().with_seed(config.seed));
    bvh.validate().context("BVH failed validation")?;

    let camera = Camera::new()
        .with_resolution(256, 256)
        .with_position(Vec3::new(0.0, 0.0, 3.4), Vec3::ZERO, Vec3::Y)
        .with_lens(40.0, 0.0, 1.0);

    let tracer = PathTracer::new(&scene, &bvh, &config).context("invalid render config")?;
    let start = Instant::now();
    let image = render_parallel(&camera, &tracer);
    log::info!("Total render time {:?}", start.elapsed());

    save_ppm(&image, output).with_context(|| format!("writing {output}"))?;
    log::info!("Saved to {}", output);
    Ok(())
}

fn build_scene() -> Result<lumen_core::Scene> {
    let mut builder = SceneBuilder::new("cornell_box");

    let white = builder.add_material(Material::new("white", Color::splat(0.73)))?;
    let red = builder.add_material(Material::new("red", Color::new(0.65, 0.05, 0.05)))?;
    let green = builder.add_material(Material::new("green", Color::new(0.12, 0.45, 0.15)))?;
    let light = builder.add_material(Material::emissive("light", Color::splat(15.0)))?;
    let glossy = builder.add_material(
        Material::new("glossy", Color::splat(0.4)).with_specular(Color::splat(0.3), 40.0),
    )?;

    // Walls face into the box
    builder.add_mesh(&quad(Vec3::splat(-1.0), Vec3::Z * 2.0, Vec3::X * 2.0), white, None)?;
    builder.add_mesh(&quad(Vec3::new(-1.0, 1.0, -1.0), Vec3::X * 2.0, Vec3::Z * 2.0), white, None)?;
    builder.add_mesh(&quad(Vec3::splat(-1.0), Vec3::X * 2.0, Vec3::Y * 2.0), white, None)?;
    builder.add_mesh(&quad(Vec3::splat(-1.0), Vec3::Y * 2.0, Vec3::Z * 2.0), red, None)?;
    builder.add_mesh(&quad(Vec3::new(1.0, -1.0, -1.0), Vec3::Z * 2.0, Vec3::Y * 2.0), green, None)?;

    // Ceiling light, facing down
    builder.add_mesh(
        &quad(Vec3::new(-0.25, 0.99, -0.25), Vec3::X * 0.5, Vec3::Z * 0.5),
        light,
        None,
    )?;

    let tall = Transform {
        translation: Vec3::new(-0.35, -0.4, -0.35),
        rotation: Quat::from_rotation_y(0.3),
        scale: Vec3::new(0.6, 1.2, 0.6),
    };
    builder.add_mesh(&unit_cube(), glossy, Some(&tall))?;

    let short = Transform {
        translation: Vec3::new(0.35, -0.7, 0.3),
        rotation: Quat::from_rotation_y(-0.3),
        scale: Vec3::splat(0.6),
    };
    let mut cube = unit_cube();
    cube.ensure_normals();
    builder.add_mesh(&cube, white, Some(&short))?;

    Ok(builder.build())
}

/// Two-triangle quad; the front faces along `u x v`.
fn quad(corner: Vec3, u: Vec3, v: Vec3) -> Mesh {
    Mesh::new(
        vec![corner, corner + u, corner + u + v, corner + v],
        vec![0, 1, 2, 0, 2, 3],
        None,
    )
}

/// Axis-aligned cube spanning [-0.5, 0.5] with outward-facing triangles.
fn unit_cube() -> Mesh {
    let faces = [
        (Vec3::new(-0.5, -0.5, 0.5), Vec3::X, Vec3::Y),
        (Vec3::new(0.5, -0.5, -0.5), -Vec3::X, Vec3::Y),
        (Vec3::new(0.5, -0.5, 0.5), -Vec3::Z, Vec3::Y),
        (Vec3::new(-0.5, -0.5, -0.5), Vec3::Z, Vec3::Y),
        (Vec3::new(-0.5, 0.5, 0.5), Vec3::X, -Vec3::Z),
        (Vec3::new(-0.5, -0.5, -0.5), Vec3::X, Vec3::Z),
    ];

    let mut positions = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);
    for (corner, u, v) in faces {
        let base = positions.len() as u32;
        positions.extend([corner, corner + u, corner + u + v, corner + v]);
        indices.extend([base, base + 1, base + 2, base, base + 2, base + 3]);
    }
    Mesh::new(positions, indices, None)
}

/// Gamma 2 and clamp to 8 bits.
fn to_srgb8(c: f32) -> u8 {
    (255.0 * c.max(0.0).sqrt().clamp(0.0, 1.0)) as u8
}

fn save_ppm(image: &ImageBuffer, filename: &str) -> std::io::Result<()> {
    let file = File::create(filename)?;
    let mut writer = BufWriter::new(file);

    writeln!(writer, "P3")?;
    writeln!(writer, "{} {}", image.width, image.height)?;
    writeln!(writer, "255")?;

    for y in 0..image.height {
        for x in 0..image.width {
            let color = image.get(x, y);
            writeln!(writer, "{} {} {}", to_srgb8(color.x), to_srgb8(color.y), to_srgb8(color.z))?;
        }
    }

    writer.flush()
}
