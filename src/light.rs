//! Point and rectangular area lights with uniform sampling and PDF.
//! Each light carries its own axes and extent, rather than a single
//! hard-coded rectangle shared by every area light.

use crate::math::{Color, Point3, Vec3};

#[derive(Debug, Clone, Copy)]
pub enum LightKind {
    Point,
    Area {
        normal: Vec3,
        u_axis: Vec3,
        v_axis: Vec3,
        width: f64,
        height: f64,
    },
}

#[derive(Debug, Clone)]
pub struct Light {
    pub position: Point3,
    pub intensity: f64,
    pub color: Color,
    pub kind: LightKind,
}

/// One sample drawn from a light: a point on its surface, the PDF of having
/// drawn it (with respect to area), and the light's radiant parameters.
pub struct LightSample {
    pub point: Point3,
    pub pdf: f64,
    pub color: Color,
    pub intensity: f64,
}

impl Light {
    pub fn point(position: Point3, intensity: f64, color: Color) -> Self {
        Self {
            position,
            intensity,
            color,
            kind: LightKind::Point,
        }
    }

    /// Samples a point on the light. Point lights are deterministic (their
    /// own position, pdf = 1); area lights draw uniformly over the
    /// rectangle with `pdf = 1/area`.
    pub fn sample(&self, rng: &mut dyn rand::RngCore) -> LightSample {
        match self.kind {
            LightKind::Point => LightSample {
                point: self.position,
                pdf: 1.0,
                color: self.color,
                intensity: self.intensity,
            },
            LightKind::Area {
                u_axis,
                v_axis,
                width,
                height,
                ..
            } => {
                use rand::Rng;
                let su: f64 = rng.gen_range(-0.5..0.5);
                let sv: f64 = rng.gen_range(-0.5..0.5);
                let point = self.position + u_axis * (su * width) + v_axis * (sv * height);
                let area = width * height;
                LightSample {
                    point,
                    pdf: 1.0 / area,
                    color: self.color,
                    intensity: self.intensity,
                }
            }
        }
    }

    /// The light's nominal "position" used by the Whitted integrator,
    /// which samples lights deterministically rather than stochastically:
    /// the light's declared position for point lights, the rectangle's
    /// center for area lights.
    pub fn representative_point(&self) -> Point3 {
        self.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn point_light_sample_pdf_is_one() {
        let light = Light::point(Point3::new(1.0, 2.0, 3.0), 5.0, Color::ones());
        let mut rng = rand::rngs::SmallRng::seed_from_u64(0);
        let sample = light.sample(&mut rng);
        assert_eq!(sample.pdf, 1.0);
        assert_eq!(sample.point, Point3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn area_light_pdf_is_inverse_area() {
        let light = Light {
            position: Point3::zero(),
            intensity: 1.0,
            color: Color::ones(),
            kind: LightKind::Area {
                normal: Vec3::unit_y(),
                u_axis: Vec3::unit_x(),
                v_axis: Vec3::unit_z(),
                width: 2.0,
                height: 4.0,
            },
        };
        let mut rng = rand::rngs::SmallRng::seed_from_u64(1);
        let sample = light.sample(&mut rng);
        assert!((sample.pdf - 1.0 / 8.0).abs() < 1e-12);
    }
}
