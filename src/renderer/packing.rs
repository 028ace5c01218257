//! Rust structs with memory layouts that match their same named counterparts
//! in shader code.
//!
//! Lights are packed into one fixed-size array entry regardless of kind so
//! the shader can walk a single homogeneous list. Gaps after Vec3 fields are
//! exploited to carry extra scalars (the light kind rides in the attenuation
//! `.w` slot). Every field is aligned to 16 bytes as WebGPU requires.

use glam::{Vec3, Vec4};
use tracing::warn;

use crate::scene::flatten::{LightInstance, LightKind};

/// Upper bound on lights marshaled to the shader per frame. Lights beyond
/// this are skipped with a warning.
pub const MAX_LIGHTS: usize = 8;

/// Shader-side kind codes, matched in the fragment shader light loop.
const KIND_DIRECTIONAL: f32 = 0.0;
const KIND_POINT: f32 = 1.0;
const KIND_SPOT: f32 = 2.0;

/// Rust struct with the same memory layout as the `PackedLight` used by the
/// shading shader.
#[repr(C)]
#[derive(Clone, Copy, Default, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PackedLight {
    /// World space position. Holds the sentinel value for directional lights.
    pub position: Vec4,
    /// Normalized world space direction, zero for point lights.
    pub direction: Vec4,
    pub color: Vec4,
    /// .xyz are the constant/linear/quadratic terms, .w is the kind code.
    pub attenuation: Vec4,
    /// .x is the spot cone angle, .y the penumbra, both radians. .zw unused.
    pub cone: Vec4,
}

impl From<&LightInstance> for PackedLight {
    fn from(light: &LightInstance) -> Self {
        let kind = match light.kind {
            LightKind::Directional => KIND_DIRECTIONAL,
            LightKind::Point => KIND_POINT,
            LightKind::Spot => KIND_SPOT,
        };

        Self {
            position: light.position,
            direction: light.direction,
            color: light.color,
            attenuation: vec3_w(light.attenuation, kind),
            cone: Vec4::new(light.angle, light.penumbra, 0.0, 0.0),
        }
    }
}

/// Pack `lights` into the fixed shader array, returning the array and the
/// number of active entries. Unused entries stay zeroed.
pub fn pack_lights(lights: &[LightInstance]) -> ([PackedLight; MAX_LIGHTS], u32) {
    if lights.len() > MAX_LIGHTS {
        warn!(
            "scene has {} lights but only {} are supported, extra lights will be skipped",
            lights.len(),
            MAX_LIGHTS
        );
    }

    let mut packed = [PackedLight::default(); MAX_LIGHTS];
    let count = lights.len().min(MAX_LIGHTS);

    for (slot, light) in packed.iter_mut().zip(lights.iter()) {
        *slot = light.into();
    }

    (packed, count as u32)
}

/// Returns a new `Vec4` combining a `Vec3` x, y and z with an additional `w`.
fn vec3_w(xyz: Vec3, w: f32) -> Vec4 {
    Vec4::new(xyz.x, xyz.y, xyz.z, w)
}
