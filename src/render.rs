//! The render loop: scheduling, tone mapping, and image output.
//!
//! Parallelizes the outer pixel loop across scanlines with `rayon`, each
//! worker seeding its own RNG independently from a splittable master
//! seed — a single shared generator would serialize workers and
//! correlate samples across pixels.

use std::io;
use std::path::Path;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::integrator::{
    shade_binary, shade_pathtracer, shade_phong, PathTracerMode, RenderMode,
    PATHTRACER_MAX_DEPTH, WHITTED_MAX_DEPTH,
};
use crate::math::{Color, Ray};
use crate::ppm;
use crate::scene::Scene;

/// Output raster encoding: binary P6 by default, ASCII P3 permitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Binary,
    Ascii,
}

pub struct RenderConfig {
    pub mode: RenderMode,
    pub samples_per_pixel: u32,
    pub path_tracer_mode: PathTracerMode,
    pub seed: u64,
    pub format: ImageFormat,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            mode: RenderMode::Phong,
            samples_per_pixel: 1,
            path_tracer_mode: PathTracerMode::default(),
            seed: 0,
            format: ImageFormat::Binary,
        }
    }
}

/// Tone maps (divide by max channel if it exceeds 1, else leave
/// unchanged — preserves hue) and quantizes to 8-bit.
pub fn tone_map_to_rgb8(color: Color) -> (u8, u8, u8) {
    let m = color.max_channel();
    let scaled = if m > 1.0 { color / m } else { color };
    let clamped = scaled.saturate();
    (
        (clamped.x * 255.0) as u8,
        (clamped.y * 255.0) as u8,
        (clamped.z * 255.0) as u8,
    )
}

fn trace_pixel(
    scene: &Scene,
    ray: &Ray,
    config: &RenderConfig,
    rng: &mut SmallRng,
) -> Color {
    match config.mode {
        RenderMode::Binary => shade_binary(scene, ray),
        RenderMode::Phong => shade_phong(scene, ray, WHITTED_MAX_DEPTH),
        RenderMode::PathTracer => {
            shade_pathtracer(scene, ray, PATHTRACER_MAX_DEPTH, rng, config.path_tracer_mode)
        }
    }
}

/// Renders the full image, reassembling pixel results into scanline order
/// (top-to-bottom, left-to-right) regardless of completion order.
///
/// Samples within one pixel are averaged (the arithmetic mean, then
/// tone-mapped); each worker thread gets its own `SmallRng`, splittably
/// seeded from `config.seed` plus the pixel's row index — never a single
/// shared generator, which would serialize workers and correlate samples
/// across pixels.
pub fn render_image(scene: &Scene, config: &RenderConfig) -> Vec<u8> {
    let width = scene.camera.width();
    let height = scene.camera.height();
    let spp = config.samples_per_pixel.max(1);

    let mut rows: Vec<(u32, Vec<u8>)> = (0..height)
        .into_par_iter()
        .map(|y| {
            // Splittable seeding: each row's RNG is independent of every
            // other row's and of the master seed used to pick it, so two
            // renders with the same seed reproduce the same image while two
            // different rows never share correlated samples.
            let mut rng = SmallRng::seed_from_u64(config.seed ^ (y as u64).wrapping_mul(0x9E3779B97F4A7C15));
            let mut row = Vec::with_capacity(width as usize * 3);
            for x in 0..width {
                let mut accum = Color::zero();
                for s in 0..spp {
                    let (xi, eta) = stratified_jitter(s, spp, &mut rng);
                    let ray = scene.camera.get_ray(x, y, xi, eta, &mut rng);
                    accum += trace_pixel(scene, &ray, config, &mut rng);
                }
                accum /= spp as f64;
                let (r, g, b) = tone_map_to_rgb8(accum);
                row.push(r);
                row.push(g);
                row.push(b);
            }
            (y, row)
        })
        .collect();

    rows.sort_by_key(|(y, _)| *y);
    let mut pixels = Vec::with_capacity(width as usize * height as usize * 3);
    for (_, row) in rows {
        pixels.extend_from_slice(&row);
    }
    pixels
}

/// For `samplesPerPixel == 1`, a single `(xi, eta)` pair is drawn; for more
/// samples, jitter is stratified into a roughly sqrt(spp)-by-sqrt(spp) grid
/// over the pixel so samples spread out rather than clustering.
fn stratified_jitter(sample_index: u32, total_samples: u32, rng: &mut SmallRng) -> (f64, f64) {
    if total_samples <= 1 {
        return (rng.gen::<f64>(), rng.gen::<f64>());
    }
    let strata = (total_samples as f64).sqrt().ceil() as u32;
    let sx = sample_index % strata;
    let sy = sample_index / strata;
    let jitter_x: f64 = rng.gen();
    let jitter_y: f64 = rng.gen();
    (
        (sx as f64 + jitter_x) / strata as f64,
        (sy as f64 + jitter_y) / strata as f64,
    )
}

/// Writes the rendered pixel buffer to `path` in the configured raster
/// encoding.
pub fn write_image(
    path: &Path,
    width: u32,
    height: u32,
    pixels: &[u8],
    format: ImageFormat,
) -> io::Result<()> {
    match format {
        ImageFormat::Binary => ppm::write_ppm_binary(path, width, height, pixels),
        ImageFormat::Ascii => ppm::write_ppm_ascii(path, width, height, pixels),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tone_map_preserves_hue_when_under_one() {
        let c = Color::new(0.2, 0.4, 0.6);
        let (r, g, b) = tone_map_to_rgb8(c);
        assert_eq!(r, (0.2 * 255.0) as u8);
        assert_eq!(g, (0.4 * 255.0) as u8);
        assert_eq!(b, (0.6 * 255.0) as u8);
    }

    #[test]
    fn tone_map_scales_down_overbright_preserving_ratio() {
        let c = Color::new(2.0, 1.0, 0.0);
        let (r, g, b) = tone_map_to_rgb8(c);
        assert_eq!(r, 255);
        assert!(g > 0 && g < 255);
        assert_eq!(b, 0);
    }

    #[test]
    fn image_dimensions_match_camera() {
        use crate::camera::{Camera, CameraConfig};

        let config = CameraConfig {
            width: 16,
            height: 12,
            ..CameraConfig::default()
        };
        let camera = Camera::new(&config);
        let scene = Scene::new(Vec::new(), Vec::new(), camera, Color::zero());
        let render_config = RenderConfig {
            mode: RenderMode::Binary,
            samples_per_pixel: 1,
            ..RenderConfig::default()
        };
        let pixels = render_image(&scene, &render_config);
        assert_eq!(pixels.len(), 16 * 12 * 3);
    }
}
