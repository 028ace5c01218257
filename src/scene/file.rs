//! Scene file loading. Scenes are authored as JSON documents describing the
//! global lighting coefficients, the camera, and the node tree.
//!
//! Angles in scene files are written in degrees (friendlier to author) and
//! converted to radians here. Unrecognized transformation or light `type`
//! tags are skipped with a warning rather than failing the whole load; scene
//! data is trusted, authored input.

use std::path::{Path, PathBuf};

use glam::{Mat4, Vec3, Vec4};
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use super::{
    GlobalCoefficients, Material, SceneCamera, SceneDescription, SceneLight, SceneNode,
    ScenePrimitive, Transformation,
};
use crate::shapes::PrimitiveKind;

#[derive(Debug, Error)]
pub enum SceneFileError {
    #[error("failed to read scene file {path}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse scene file {path}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Load and parse the scene file at `path`.
///
/// On failure nothing is produced; callers are expected to keep whatever
/// scene state they already had.
pub fn load<P: AsRef<Path>>(path: P) -> Result<SceneDescription, SceneFileError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| SceneFileError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    from_json(&text).map_err(|source| SceneFileError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Parse a scene description from JSON text.
pub fn from_json(text: &str) -> Result<SceneDescription, serde_json::Error> {
    let file: SceneFile = serde_json::from_str(text)?;
    Ok(file.into_description())
}

#[derive(Debug, Deserialize)]
struct SceneFile {
    globals: GlobalsSpec,
    camera: CameraSpec,
    root: NodeSpec,
}

impl SceneFile {
    fn into_description(self) -> SceneDescription {
        SceneDescription {
            globals: GlobalCoefficients {
                ka: self.globals.ka,
                kd: self.globals.kd,
                ks: self.globals.ks,
            },
            camera: SceneCamera {
                position: self.camera.position,
                focus: self.camera.focus,
                up: self.camera.up,
                height_angle: self.camera.height_angle.to_radians(),
            },
            root: self.root.into_node(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GlobalsSpec {
    ka: f32,
    kd: f32,
    ks: f32,
}

#[derive(Debug, Deserialize)]
struct CameraSpec {
    position: Vec3,
    focus: Vec3,
    #[serde(default = "default_up")]
    up: Vec3,
    /// Vertical field of view in degrees.
    height_angle: f32,
}

fn default_up() -> Vec3 {
    Vec3::Y
}

#[derive(Debug, Default, Deserialize)]
struct NodeSpec {
    #[serde(default)]
    transforms: Vec<TransformSpec>,
    #[serde(default)]
    primitives: Vec<PrimitiveSpec>,
    #[serde(default)]
    lights: Vec<LightSpec>,
    #[serde(default)]
    children: Vec<NodeSpec>,
}

impl NodeSpec {
    fn into_node(self) -> SceneNode {
        SceneNode {
            transforms: self
                .transforms
                .into_iter()
                .filter_map(TransformSpec::into_transformation)
                .collect(),
            primitives: self.primitives.into_iter().map(PrimitiveSpec::into_primitive).collect(),
            lights: self
                .lights
                .into_iter()
                .filter_map(LightSpec::into_light)
                .collect(),
            children: self.children.into_iter().map(NodeSpec::into_node).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum TransformSpec {
    Translate {
        value: Vec3,
    },
    Scale {
        value: Vec3,
    },
    Rotate {
        axis: Vec3,
        /// Degrees.
        angle: f32,
    },
    /// Raw 4x4 matrix written as four rows.
    Matrix {
        value: [[f32; 4]; 4],
    },
    #[serde(other)]
    Unknown,
}

impl TransformSpec {
    fn into_transformation(self) -> Option<Transformation> {
        match self {
            TransformSpec::Translate { value } => Some(Transformation::Translate(value)),
            TransformSpec::Scale { value } => Some(Transformation::Scale(value)),
            TransformSpec::Rotate { axis, angle } => Some(Transformation::Rotate {
                axis,
                angle: angle.to_radians(),
            }),
            TransformSpec::Matrix { value } => {
                // Scene files write rows; glam stores columns.
                Some(Transformation::Matrix(
                    Mat4::from_cols_array_2d(&value).transpose(),
                ))
            }
            TransformSpec::Unknown => {
                warn!("skipping unrecognized transformation type in scene file");
                None
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct PrimitiveSpec {
    shape: PrimitiveKind,
    material: MaterialSpec,
}

impl PrimitiveSpec {
    fn into_primitive(self) -> ScenePrimitive {
        ScenePrimitive {
            kind: self.shape,
            material: Material {
                ambient: self.material.ambient,
                diffuse: self.material.diffuse,
                specular: self.material.specular,
                shininess: self.material.shininess,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct MaterialSpec {
    ambient: Vec4,
    diffuse: Vec4,
    specular: Vec4,
    #[serde(default)]
    shininess: f32,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum LightSpec {
    Directional {
        color: Vec4,
        direction: Vec3,
    },
    Point {
        color: Vec4,
        #[serde(default = "default_attenuation")]
        attenuation: Vec3,
    },
    Spot {
        color: Vec4,
        direction: Vec3,
        #[serde(default = "default_attenuation")]
        attenuation: Vec3,
        /// Full cone angle in degrees.
        angle: f32,
        /// Penumbra in degrees.
        #[serde(default)]
        penumbra: f32,
    },
    #[serde(other)]
    Unknown,
}

fn default_attenuation() -> Vec3 {
    Vec3::new(1.0, 0.0, 0.0)
}

impl LightSpec {
    fn into_light(self) -> Option<SceneLight> {
        match self {
            LightSpec::Directional { color, direction } => Some(SceneLight::Directional {
                color,
                direction: direction.extend(0.0),
            }),
            LightSpec::Point { color, attenuation } => {
                Some(SceneLight::Point { color, attenuation })
            }
            LightSpec::Spot {
                color,
                direction,
                attenuation,
                angle,
                penumbra,
            } => Some(SceneLight::Spot {
                color,
                direction: direction.extend(0.0),
                attenuation,
                angle: angle.to_radians(),
                penumbra: penumbra.to_radians(),
            }),
            LightSpec::Unknown => {
                warn!("skipping unrecognized light type in scene file");
                None
            }
        }
    }
}
