//! JSON scene deserialization.
//!
//! A `SerializedScene` wire struct that `serde` deserializes is converted
//! into the runtime `Scene`, so parse-time validation — non-finite
//! rejection, material bounds, degenerate-geometry checks — happens in
//! one place and produces this module's own `SceneError` rather than a
//! raw serde error. `look_at` is used directly as the camera's forward
//! direction, preserving the framing convention callers expect from the
//! source scene format; an alternate `target` field is also accepted
//! for point-at-target framing (the two are mutually exclusive).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;

use crate::camera::{Camera, CameraConfig};
use crate::light::{Light, LightKind};
use crate::material::{Material, MaterialError};
use crate::math::{Color, Vec3};
use crate::ppm::PpmError;
use crate::primitive::{Cylinder, Primitive, Sphere, Triangle};
use crate::scene::Scene;
use crate::texture::Texture;

#[derive(Debug, Error)]
pub enum SceneError {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed scene JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("non-finite value in field `{field}`")]
    NonFinite { field: String },
    #[error("invalid material on object {index}: {source}")]
    InvalidMaterial { index: usize, source: MaterialError },
    #[error("zero-radius sphere at object {index}")]
    DegenerateSphere { index: usize },
    #[error("collinear (zero-area) triangle at object {index}")]
    DegenerateTriangle { index: usize },
    #[error("cylinder with non-positive radius or height at object {index}")]
    DegenerateCylinder { index: usize },
    #[error("both `look_at` and `target` given for the camera; they are mutually exclusive")]
    AmbiguousCameraDirection,
    #[error("camera is missing both `look_at` and `target`")]
    MissingCameraDirection,
    #[error("unreadable texture file {path}: {source}")]
    Texture {
        path: PathBuf,
        #[source]
        source: PpmError,
    },
}

type JsonVec3 = [f64; 3];

fn to_vec3(v: JsonVec3, field: &str) -> Result<Vec3, SceneError> {
    let vec = Vec3::new(v[0], v[1], v[2]);
    if !vec.is_finite() {
        return Err(SceneError::NonFinite {
            field: field.to_string(),
        });
    }
    Ok(vec)
}

#[derive(Debug, Deserialize)]
struct SerializedCamera {
    position: JsonVec3,
    #[serde(default)]
    look_at: Option<JsonVec3>,
    #[serde(default)]
    target: Option<JsonVec3>,
    up: JsonVec3,
    fov: f64,
    width: u32,
    height: u32,
    #[serde(default)]
    aperture: f64,
    #[serde(default = "default_focus_distance")]
    focus_distance: f64,
}

fn default_focus_distance() -> f64 {
    1.0
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum SerializedObject {
    Sphere {
        center: JsonVec3,
        radius: f64,
        #[serde(flatten)]
        material: SerializedMaterial,
    },
    Triangle {
        v0: JsonVec3,
        v1: JsonVec3,
        v2: JsonVec3,
        #[serde(flatten)]
        material: SerializedMaterial,
    },
    Cylinder {
        center: JsonVec3,
        axis: JsonVec3,
        radius: f64,
        height: f64,
        #[serde(flatten)]
        material: SerializedMaterial,
    },
}

#[derive(Debug, Deserialize)]
struct SerializedMaterial {
    #[serde(default)]
    color: Option<JsonVec3>,
    #[serde(default)]
    reflectivity: f64,
    #[serde(default)]
    transparency: f64,
    #[serde(default = "default_refractive_index")]
    refractive_index: f64,
    #[serde(default)]
    texture: Option<String>,
}

fn default_refractive_index() -> f64 {
    1.0
}

#[derive(Debug, Deserialize)]
struct SerializedAreaExtent {
    normal: JsonVec3,
    u_axis: JsonVec3,
    v_axis: JsonVec3,
    width: f64,
    height: f64,
}

#[derive(Debug, Deserialize)]
struct SerializedLight {
    position: JsonVec3,
    intensity: f64,
    color: JsonVec3,
    #[serde(default)]
    area: Option<SerializedAreaExtent>,
}

#[derive(Debug, Deserialize)]
struct SerializedScene {
    camera: SerializedCamera,
    objects: Vec<SerializedObject>,
    lights: Vec<SerializedLight>,
}

/// Loads and validates a scene from a JSON file on disk, resolving texture
/// paths relative to the scene file's own directory.
pub fn load_scene_file(path: &Path) -> Result<Scene, SceneError> {
    let text = std::fs::read_to_string(path).map_err(|source| SceneError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let serialized: SerializedScene = serde_json::from_str(&text)?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    build_scene(serialized, base_dir)
}

fn build_scene(serialized: SerializedScene, base_dir: &Path) -> Result<Scene, SceneError> {
    let camera = build_camera(&serialized.camera)?;

    let mut primitives = Vec::with_capacity(serialized.objects.len());
    for (index, object) in serialized.objects.into_iter().enumerate() {
        primitives.push(build_primitive(index, object, base_dir)?);
    }

    let mut lights = Vec::with_capacity(serialized.lights.len());
    for light in serialized.lights {
        lights.push(build_light(light)?);
    }

    Ok(Scene::new(primitives, lights, camera, Color::zero()))
}

fn build_camera(cam: &SerializedCamera) -> Result<Camera, SceneError> {
    let position = to_vec3(cam.position, "camera.position")?;
    let up = to_vec3(cam.up, "camera.up")?;

    let forward = match (cam.look_at, cam.target) {
        (Some(_), Some(_)) => return Err(SceneError::AmbiguousCameraDirection),
        (Some(look_at), None) => to_vec3(look_at, "camera.look_at")?.normalized(),
        (None, Some(target)) => (to_vec3(target, "camera.target")? - position).normalized(),
        (None, None) => return Err(SceneError::MissingCameraDirection),
    };

    Ok(Camera::new(&CameraConfig {
        position,
        forward,
        up,
        vfov_degrees: cam.fov,
        width: cam.width,
        height: cam.height,
        aperture: cam.aperture,
        focus_distance: cam.focus_distance,
    }))
}

fn build_material(
    index: usize,
    mat: SerializedMaterial,
    base_dir: &Path,
) -> Result<Material, SceneError> {
    let texture = match mat.texture {
        Some(file) => {
            let tex_path = base_dir.join(&file);
            let loaded = Texture::load_ppm(&tex_path).map_err(|source| SceneError::Texture {
                path: tex_path,
                source,
            })?;
            Some(Arc::new(loaded))
        }
        None => None,
    };
    let base_color = match mat.color {
        Some(c) => to_vec3(c, "color")?,
        None => Color::zero(),
    };
    Material::new(
        base_color,
        mat.reflectivity,
        mat.transparency,
        mat.refractive_index,
        texture,
    )
    .map_err(|source| SceneError::InvalidMaterial { index, source })
}

fn build_primitive(
    index: usize,
    object: SerializedObject,
    base_dir: &Path,
) -> Result<Primitive, SceneError> {
    match object {
        SerializedObject::Sphere {
            center,
            radius,
            material,
        } => {
            let center = to_vec3(center, "center")?;
            let material = build_material(index, material, base_dir)?;
            if radius <= 0.0 || !radius.is_finite() {
                return Err(SceneError::DegenerateSphere { index });
            }
            Ok(Primitive::Sphere(Sphere {
                center,
                radius,
                material,
            }))
        }
        SerializedObject::Triangle {
            v0,
            v1,
            v2,
            material,
        } => {
            let v0 = to_vec3(v0, "v0")?;
            let v1 = to_vec3(v1, "v1")?;
            let v2 = to_vec3(v2, "v2")?;
            let material = build_material(index, material, base_dir)?;
            let cross = (v1 - v0).cross(v2 - v0);
            if cross.length() <= 1e-8 {
                return Err(SceneError::DegenerateTriangle { index });
            }
            Ok(Primitive::Triangle(Triangle { v0, v1, v2, material }))
        }
        SerializedObject::Cylinder {
            center,
            axis,
            radius,
            height,
            material,
        } => {
            let center = to_vec3(center, "center")?;
            let axis = to_vec3(axis, "axis")?.normalized();
            let material = build_material(index, material, base_dir)?;
            if radius <= 0.0 || height <= 0.0 || !radius.is_finite() || !height.is_finite() {
                return Err(SceneError::DegenerateCylinder { index });
            }
            Ok(Primitive::Cylinder(Cylinder {
                center,
                axis,
                radius,
                height,
                material,
            }))
        }
    }
}

fn build_light(light: SerializedLight) -> Result<Light, SceneError> {
    let position = to_vec3(light.position, "light.position")?;
    let color = to_vec3(light.color, "light.color")?;
    let kind = match light.area {
        None => LightKind::Point,
        Some(area) => LightKind::Area {
            normal: to_vec3(area.normal, "light.area.normal")?.normalized(),
            u_axis: to_vec3(area.u_axis, "light.area.u_axis")?.normalized(),
            v_axis: to_vec3(area.v_axis, "light.area.v_axis")?.normalized(),
            width: area.width,
            height: area.height,
        },
    };
    Ok(Light {
        position,
        intensity: light.intensity,
        color,
        kind,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_scene_json() -> &'static str {
        r#"{
            "camera": {
                "position": [0, 0, 0],
                "look_at": [0, 0, -1],
                "up": [0, 1, 0],
                "fov": 60,
                "width": 100,
                "height": 100,
                "aperture": 0,
                "focus_distance": 1
            },
            "objects": [
                { "type": "sphere", "center": [0, 0, -5], "radius": 1,
                  "color": [1, 0, 0], "reflectivity": 0, "transparency": 0,
                  "refractive_index": 1 }
            ],
            "lights": [
                { "position": [5, 5, -5], "intensity": 1, "color": [1, 1, 1] }
            ]
        }"#
    }

    #[test]
    fn parses_minimal_scene() {
        let serialized: SerializedScene = serde_json::from_str(minimal_scene_json()).unwrap();
        let scene = build_scene(serialized, Path::new(".")).unwrap();
        assert_eq!(scene.primitives.len(), 1);
        assert_eq!(scene.lights.len(), 1);
    }

    #[test]
    fn rejects_zero_radius_sphere() {
        let json = minimal_scene_json().replace("\"radius\": 1", "\"radius\": 0");
        let serialized: SerializedScene = serde_json::from_str(&json).unwrap();
        let err = build_scene(serialized, Path::new(".")).unwrap_err();
        assert!(matches!(err, SceneError::DegenerateSphere { index: 0 }));
    }

    #[test]
    fn rejects_ambiguous_look_at_and_target() {
        let json = minimal_scene_json().replace(
            "\"look_at\": [0, 0, -1],",
            "\"look_at\": [0, 0, -1], \"target\": [0, 0, -5],",
        );
        let serialized: SerializedScene = serde_json::from_str(&json).unwrap();
        let err = build_scene(serialized, Path::new(".")).unwrap_err();
        assert!(matches!(err, SceneError::AmbiguousCameraDirection));
    }
}
