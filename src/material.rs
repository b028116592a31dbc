use std::sync::Arc;

use crate::math::Color;
use crate::texture::{Texture, TextureFilter};

/// Per-primitive surface parameters. A single parametric record, rather
/// than a BRDF trait hierarchy (`Lambertian`/`Metal`/`Dielectric`), since
/// the Whitted and path-tracing integrators both need to read diffuse,
/// reflective, and refractive response from the *same* material within
/// one shading evaluation (direct + reflection + refraction composited
/// together), rather than sampling one BRDF lobe and recursing.
#[derive(Debug, Clone)]
pub struct Material {
    pub base_color: Color,
    pub reflectivity: f64,
    pub transparency: f64,
    pub refractive_index: f64,
    pub texture: Option<Arc<Texture>>,
}

/// Why a [`Material`] failed validation — surfaced by the scene loader as
/// `SceneError::InvalidMaterial`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterialError {
    ReflectivityOutOfRange,
    TransparencyOutOfRange,
    ReflectivityPlusTransparencyExceedsOne,
    RefractiveIndexBelowOne,
}

impl std::fmt::Display for MaterialError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let msg = match self {
            MaterialError::ReflectivityOutOfRange => "reflectivity must be in [0, 1]",
            MaterialError::TransparencyOutOfRange => "transparency must be in [0, 1]",
            MaterialError::ReflectivityPlusTransparencyExceedsOne => {
                "reflectivity + transparency must not exceed 1"
            }
            MaterialError::RefractiveIndexBelowOne => "refractive_index must be >= 1",
        };
        f.write_str(msg)
    }
}

impl Material {
    pub fn new(
        base_color: Color,
        reflectivity: f64,
        transparency: f64,
        refractive_index: f64,
        texture: Option<Arc<Texture>>,
    ) -> Result<Self, MaterialError> {
        if !(0.0..=1.0).contains(&reflectivity) {
            return Err(MaterialError::ReflectivityOutOfRange);
        }
        if !(0.0..=1.0).contains(&transparency) {
            return Err(MaterialError::TransparencyOutOfRange);
        }
        if reflectivity + transparency > 1.0 + 1e-6 {
            return Err(MaterialError::ReflectivityPlusTransparencyExceedsOne);
        }
        if refractive_index < 1.0 {
            return Err(MaterialError::RefractiveIndexBelowOne);
        }
        Ok(Self {
            base_color,
            reflectivity,
            transparency,
            refractive_index,
            texture,
        })
    }

    /// Diffuse weight left over once reflectivity and transparency have
    /// claimed their share of the surface response.
    pub fn diffuse_weight(&self) -> f64 {
        (1.0 - self.reflectivity - self.transparency).max(0.0)
    }

    /// Resolves the surface color at a given `(u, v)`: a texture, when
    /// present, overrides `base_color` entirely.
    pub fn color_at(&self, u: f64, v: f64) -> Color {
        match &self.texture {
            Some(tex) => tex.sample(u, v, TextureFilter::Bilinear),
            None => self.base_color,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_reflectivity_plus_transparency_over_one() {
        let err = Material::new(Color::ones(), 0.7, 0.5, 1.0, None).unwrap_err();
        assert_eq!(err, MaterialError::ReflectivityPlusTransparencyExceedsOne);
    }

    #[test]
    fn rejects_sub_unity_refractive_index() {
        let err = Material::new(Color::ones(), 0.0, 0.0, 0.9, None).unwrap_err();
        assert_eq!(err, MaterialError::RefractiveIndexBelowOne);
    }

    #[test]
    fn texture_overrides_base_color() {
        let tex = Arc::new(Texture::solid(2, 2, Color::new(0.1, 0.2, 0.3)));
        let mat = Material::new(Color::ones(), 0.0, 0.0, 1.0, Some(tex)).unwrap();
        let c = mat.color_at(0.5, 0.5);
        assert!((c.x - 0.1).abs() < 1e-9);
    }
}
