//! # raytracer
//!
//! An offline ray tracer: given a declarative JSON scene description
//! (camera, lights, geometric primitives), it samples rays through each
//! pixel and evaluates radiance along them, producing a PPM image.
//!
//! ## Architecture
//!
//! - **BVH**: closest-hit/any-hit acceleration over a heterogeneous
//!   primitive set ([`bvh`]).
//! - **Integrators**: `binary` (hit/miss), `phong` (Whitted recursive
//!   reflection/refraction with hard shadows), and `pathtracer`
//!   (Monte-Carlo with next-event estimation and Fresnel mixing)
//!   ([`integrator`]).
//! - **Camera**: pinhole + stratified supersampling + thin-lens depth of
//!   field ([`camera`]).
//!
//! Rendering is read-only after scene construction: the scene, BVH,
//! materials, and textures are shared by all worker threads without
//! synchronization, with each worker seeding its own RNG.

mod bvh;
mod camera;
mod error;
mod integrator;
mod light;
mod material;
mod math;
mod ppm;
mod primitive;
mod render;
mod scene;
mod scene_file;
mod texture;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use error::RenderError;
use integrator::{PathTracerMode, RenderMode};
use render::{write_image, ImageFormat, RenderConfig};

/// raytracer — an offline BVH-accelerated ray tracer
#[derive(Parser, Debug)]
#[command(
    name = "raytracer",
    version,
    about = "Renders a JSON scene description to a PPM image",
    after_help = "EXAMPLES:\n  \
                  raytracer binary scene.json\n  \
                  raytracer phong scene.json --output render.ppm\n  \
                  raytracer pathtracer scene.json --spp 256 --strict-compat"
)]
struct Cli {
    /// Render mode
    #[arg(value_enum)]
    render_mode: CliRenderMode,

    /// Scene description file (JSON)
    scene_file: PathBuf,

    /// Output image path
    #[arg(short, long, default_value = "output.ppm")]
    output: PathBuf,

    /// Samples per pixel, averaged; `binary`/`phong` rarely need more than
    /// 1, `pathtracer` converges slowly without many
    #[arg(long, default_value_t = 1)]
    spp: u32,

    /// RNG seed for the per-thread worker generators. Re-running with the
    /// same seed reproduces the same Monte-Carlo image.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Emit ASCII P3 PPM instead of binary P6
    #[arg(long)]
    ascii: bool,

    /// Use the simpler, literal path-tracer BRDF weighting (`m.base`)
    /// instead of the physically-corrected `m.base / pi` cosine-weighted
    /// estimator
    #[arg(long)]
    strict_compat: bool,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliRenderMode {
    Binary,
    Phong,
    Pathtracer,
}

impl From<CliRenderMode> for RenderMode {
    fn from(m: CliRenderMode) -> Self {
        match m {
            CliRenderMode::Binary => RenderMode::Binary,
            CliRenderMode::Phong => RenderMode::Phong,
            CliRenderMode::Pathtracer => RenderMode::PathTracer,
        }
    }
}

fn run() -> Result<(), RenderError> {
    let cli = Cli::parse();

    let scene = scene_file::load_scene_file(&cli.scene_file)?;
    log::info!(
        "loaded scene: {} primitives, {} lights, {}x{}",
        scene.primitives.len(),
        scene.lights.len(),
        scene.camera.width(),
        scene.camera.height()
    );

    let path_tracer_mode = if cli.strict_compat {
        PathTracerMode::Strict
    } else {
        PathTracerMode::Corrected
    };

    let config = RenderConfig {
        mode: cli.render_mode.into(),
        samples_per_pixel: cli.spp,
        path_tracer_mode,
        seed: cli.seed,
        format: if cli.ascii {
            ImageFormat::Ascii
        } else {
            ImageFormat::Binary
        },
    };

    let t0 = std::time::Instant::now();
    let pixels = render::render_image(&scene, &config);
    let elapsed = t0.elapsed();
    log::info!(
        "render complete in {:.2}s ({} spp, mode {:?})",
        elapsed.as_secs_f64(),
        cli.spp,
        config.mode
    );

    write_image(
        &cli.output,
        scene.camera.width(),
        scene.camera.height(),
        &pixels,
        config.format,
    )
    .map_err(RenderError::from)?;

    log::info!("wrote {}", cli.output.display());
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("raytracer: {err}");
            ExitCode::from(err.exit_code() as u8)
        }
    }
}
