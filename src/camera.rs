//! Ray generation: pinhole, stratified per-sample jitter, and thin-lens
//! depth of field.
//!
//! Builds an orthonormal `forward`/`right`/`up` basis and maps pixel
//! coordinates directly through tangent-space offsets rather than
//! precomputed viewport corners. `look_at` is treated as a forward
//! *direction*, not a world-space target point — a deliberate choice to
//! preserve the framing convention callers expect from the source scene
//! format (an alternate `target` field is also accepted by the loader).

use crate::math::{Point3, Ray, Vec3};

/// Configuration for the thin-lens camera model with depth of field.
pub struct CameraConfig {
    pub position: Point3,
    /// Unit forward direction, not a world-space target point.
    pub forward: Vec3,
    pub up: Vec3,
    pub vfov_degrees: f64,
    pub width: u32,
    pub height: u32,
    pub aperture: f64,
    pub focus_distance: f64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: Point3::new(0.0, 0.0, 0.0),
            forward: Vec3::new(0.0, 0.0, -1.0),
            up: Vec3::unit_y(),
            vfov_degrees: 60.0,
            width: 400,
            height: 300,
            aperture: 0.0,
            focus_distance: 1.0,
        }
    }
}

/// A pinhole/thin-lens camera. `right`/`up` form an orthonormal basis with
/// `forward`; rays are generated directly from tangent-space offsets rather
/// than precomputed viewport corners.
pub struct Camera {
    position: Point3,
    forward: Vec3,
    right: Vec3,
    up: Vec3,
    half_fov_tan: f64,
    aspect: f64,
    width: u32,
    height: u32,
    lens_radius: f64,
    focus_distance: f64,
}

impl Camera {
    pub fn new(config: &CameraConfig) -> Self {
        let forward = config.forward.normalized();
        let right = forward.cross(config.up).normalized();
        let up = right.cross(forward);

        Self {
            position: config.position,
            forward,
            right,
            up,
            half_fov_tan: (config.vfov_degrees.to_radians() / 2.0).tan(),
            aspect: config.width as f64 / config.height as f64,
            width: config.width,
            height: config.height,
            lens_radius: config.aperture / 2.0,
            focus_distance: config.focus_distance,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Generates a primary ray for pixel `(x, y)` with jitter `(xi, eta)` in
    /// `[0, 1)^2` (one stratified sub-sample of `samplesPerPixel`):
    ///   u = (2*(x+xi)/width - 1) * aspect * tan(fov/2)
    ///   v = (1 - 2*(y+eta)/height) * tan(fov/2)
    pub fn get_ray(&self, x: u32, y: u32, xi: f64, eta: f64, rng: &mut dyn rand::RngCore) -> Ray {
        let u =
            (2.0 * (x as f64 + xi) / self.width as f64 - 1.0) * self.aspect * self.half_fov_tan;
        let v = (1.0 - 2.0 * (y as f64 + eta) / self.height as f64) * self.half_fov_tan;

        let direction = (self.forward + self.right * u + self.up * v).normalized();

        if self.lens_radius <= 0.0 {
            return Ray::new(self.position, direction);
        }

        let lens = Vec3::random_in_unit_disk(rng) * self.lens_radius;
        let origin = self.position + self.right * lens.x + self.up * lens.y;
        let focal_point = self.position + direction * self.focus_distance;
        Ray::new(origin, (focal_point - origin).normalized())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn pinhole_primary_ray_is_unit_length() {
        let camera = Camera::new(&CameraConfig::default());
        let mut rng = rand::rngs::SmallRng::seed_from_u64(0);
        let ray = camera.get_ray(200, 150, 0.5, 0.5, &mut rng);
        assert!((ray.direction.length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn center_pixel_points_along_forward() {
        let config = CameraConfig {
            width: 101,
            height: 101,
            ..CameraConfig::default()
        };
        let camera = Camera::new(&config);
        let mut rng = rand::rngs::SmallRng::seed_from_u64(0);
        let ray = camera.get_ray(50, 50, 0.5, 0.5, &mut rng);
        assert!((ray.direction - camera.forward).length() < 1e-2);
    }

    #[test]
    fn aperture_zero_is_pinhole() {
        let camera = Camera::new(&CameraConfig::default());
        let mut rng = rand::rngs::SmallRng::seed_from_u64(7);
        let ray = camera.get_ray(10, 10, 0.3, 0.3, &mut rng);
        assert_eq!(ray.origin, camera.position);
    }
}
