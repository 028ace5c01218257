//! In-memory scene description: a tree of transform-annotated nodes carrying
//! primitive and light references, plus the camera and global lighting
//! coefficients that apply to the whole scene.

pub mod file;
pub mod flatten;

use glam::{Mat4, Vec3, Vec4};

use crate::shapes::PrimitiveKind;

/// A complete parsed scene: global coefficients, camera, and the node tree.
#[derive(Clone, Debug)]
pub struct SceneDescription {
    pub globals: GlobalCoefficients,
    pub camera: SceneCamera,
    pub root: SceneNode,
}

/// Scene-wide lighting coefficients, set once per scene load and read by
/// every draw call.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GlobalCoefficients {
    /// Ambient coefficient `k_a`.
    pub ka: f32,
    /// Diffuse coefficient `k_d`.
    pub kd: f32,
    /// Specular coefficient `k_s`.
    pub ks: f32,
}

/// Camera parameters as authored in the scene file. Near/far clip planes are
/// viewer settings, not scene data.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SceneCamera {
    /// World space camera position.
    pub position: Vec3,
    /// World space point the camera looks at.
    pub focus: Vec3,
    /// Camera up direction.
    pub up: Vec3,
    /// Vertical field of view in radians.
    pub height_angle: f32,
}

/// One node of the scene tree. Transform steps apply in listed order; the
/// composed result premultiplies everything at or below this node.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SceneNode {
    pub transforms: Vec<Transformation>,
    pub primitives: Vec<ScenePrimitive>,
    pub lights: Vec<SceneLight>,
    pub children: Vec<SceneNode>,
}

/// A single transformation step attached to a scene node.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Transformation {
    Translate(Vec3),
    Scale(Vec3),
    /// Rotation of `angle` radians about `axis`.
    Rotate { axis: Vec3, angle: f32 },
    /// A raw matrix composed verbatim onto the cumulative transform.
    Matrix(Mat4),
}

impl Transformation {
    /// The affine matrix for this step.
    pub fn to_matrix(self) -> Mat4 {
        match self {
            Transformation::Translate(offset) => Mat4::from_translation(offset),
            Transformation::Scale(factors) => Mat4::from_scale(factors),
            Transformation::Rotate { axis, angle } => {
                Mat4::from_axis_angle(axis.normalize(), angle)
            }
            Transformation::Matrix(matrix) => matrix,
        }
    }
}

/// A primitive reference attached to a scene node: which mesh family to draw
/// and the Phong material to draw it with.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ScenePrimitive {
    pub kind: PrimitiveKind,
    pub material: Material,
}

/// Phong material constants for one primitive.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Material {
    pub ambient: Vec4,
    pub diffuse: Vec4,
    pub specular: Vec4,
    pub shininess: f32,
}

/// A light attached to a scene node, in the node's local space. Positions are
/// implicit (a point/spot light sits at its node's origin); directions are
/// local and transformed into world space during flattening.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum SceneLight {
    Directional {
        color: Vec4,
        direction: Vec4,
    },
    Point {
        color: Vec4,
        /// Constant / linear / quadratic attenuation terms.
        attenuation: Vec3,
    },
    Spot {
        color: Vec4,
        direction: Vec4,
        attenuation: Vec3,
        /// Full cone angle in radians.
        angle: f32,
        /// Penumbra width in radians, measured inward from the cone edge.
        penumbra: f32,
    },
}
