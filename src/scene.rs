//! The scene: owns all primitives, lights, the BVH, and the camera, and is
//! the entry point for ray queries. Primitives are owned directly as a
//! flat vector rather than through boxed trait objects, with the BVH
//! referencing them by index.

use crate::bvh::Bvh;
use crate::camera::Camera;
use crate::light::Light;
use crate::math::{Color, Ray};
use crate::primitive::{Hit, Primitive};

pub struct Scene {
    pub primitives: Vec<Primitive>,
    pub lights: Vec<Light>,
    pub camera: Camera,
    pub background_color: Color,
    bvh: Bvh,
}

impl Scene {
    pub fn new(
        primitives: Vec<Primitive>,
        lights: Vec<Light>,
        camera: Camera,
        background_color: Color,
    ) -> Self {
        let bvh = Bvh::build(&primitives);
        Self {
            primitives,
            lights,
            camera,
            background_color,
            bvh,
        }
    }

    pub fn any_hit(&self, ray: &Ray, t_min: f64, t_max: f64) -> bool {
        self.bvh.any_hit(&self.primitives, ray, t_min, t_max)
    }

    pub fn closest_hit(&self, ray: &Ray, t_min: f64, t_max: f64) -> Option<(usize, Hit)> {
        self.bvh.closest_hit(&self.primitives, ray, t_min, t_max)
    }

    /// Whitted-integrator shadow ray: running transmittance rather than a
    /// boolean, bounded by `light_distance`.
    pub fn shadow_transmittance(&self, ray: &Ray, light_distance: f64) -> Color {
        self.bvh
            .shadow_transmittance(&self.primitives, ray, light_distance)
    }

    pub fn material_at(&self, index: usize, hit: &Hit) -> Color {
        self.primitives[index].material_at(hit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::{Camera, CameraConfig};
    use crate::math::{Point3, Vec3};

    #[test]
    fn empty_scene_every_ray_misses() {
        let camera = Camera::new(&CameraConfig::default());
        let scene = Scene::new(Vec::new(), Vec::new(), camera, Color::zero());
        let ray = Ray::new(Point3::zero(), Vec3::unit_z());
        assert!(scene.closest_hit(&ray, 1e-4, f64::INFINITY).is_none());
        assert!(!scene.any_hit(&ray, 1e-4, f64::INFINITY));
    }
}
