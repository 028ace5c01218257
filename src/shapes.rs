//! Procedural tessellation of the four primitive families supported by the
//! scene format. Every tessellator is a pure function from two integer
//! subdivision parameters to a flat triangle list, and every generated solid
//! fits inside the unit cube centered on the origin.
//!
//! NOTES:
//! Mesh vertex winding order is CCW when viewed from outside the solid.

mod cone;
mod cube;
mod cylinder;
mod sphere;

use glam::Vec3;
use serde::Deserialize;

/// Mesh vertex: interleaved position + normal, matching the vertex layout
/// consumed by the render pipeline.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

/// One of the primitive families that can be referenced by a scene node.
///
/// Each kind maps to exactly one cached mesh in the renderer, so the variant
/// order doubles as the mesh cache index.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveKind {
    Cube,
    Cone,
    Cylinder,
    Sphere,
}

impl PrimitiveKind {
    pub const ALL: [PrimitiveKind; 4] = [
        PrimitiveKind::Cube,
        PrimitiveKind::Cone,
        PrimitiveKind::Cylinder,
        PrimitiveKind::Sphere,
    ];

    /// Index of this primitive's slot in the mesh cache.
    pub fn index(self) -> usize {
        match self {
            PrimitiveKind::Cube => 0,
            PrimitiveKind::Cone => 1,
            PrimitiveKind::Cylinder => 2,
            PrimitiveKind::Sphere => 3,
        }
    }
}

/// Subdivision density knobs shared by all tessellators.
///
/// `param1` controls radial/vertical/latitude band count, `param2` controls
/// angular segment count. Values below the per-parameter minimum are clamped
/// up rather than rejected.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TessellationParams {
    pub param1: u32,
    pub param2: u32,
}

impl TessellationParams {
    pub const MIN_PARAM1: u32 = 1;
    pub const MIN_PARAM2: u32 = 3;

    pub fn new(param1: u32, param2: u32) -> Self {
        Self { param1, param2 }
    }

    /// Returns a copy with both parameters raised to their minimums.
    pub fn clamped(self) -> Self {
        Self {
            param1: self.param1.max(Self::MIN_PARAM1),
            param2: self.param2.max(Self::MIN_PARAM2),
        }
    }
}

impl Default for TessellationParams {
    fn default() -> Self {
        Self {
            param1: 8,
            param2: 16,
        }
    }
}

/// A triangle mesh produced by one of the tessellators. Vertices are grouped
/// in consecutive triples; there is no index buffer.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mesh {
    vertices: Vec<Vertex>,
}

impl Mesh {
    /// Create an empty mesh pre-sized for `vertex_count` vertices. Tessellators
    /// compute the count in closed form before generating so the buffer is
    /// allocated exactly once.
    fn with_capacity(vertex_count: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertex_count),
        }
    }

    fn push(&mut self, position: Vec3, normal: Vec3) {
        self.vertices.push(Vertex {
            position: position.to_array(),
            normal: normal.to_array(),
        });
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.vertices.len() / 3
    }

    /// Raw bytes suitable for uploading to a GPU vertex buffer.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }
}

/// Tessellate `kind` at the given subdivision density. Parameters below their
/// minimums are clamped, never an error.
pub fn tessellate(kind: PrimitiveKind, params: TessellationParams) -> Mesh {
    let params = params.clamped();
    match kind {
        PrimitiveKind::Cube => cube::tessellate(params),
        PrimitiveKind::Cone => cone::tessellate(params),
        PrimitiveKind::Cylinder => cylinder::tessellate(params),
        PrimitiveKind::Sphere => sphere::tessellate(params),
    }
}

/// Radius shared by every surface of revolution (and the cube's half-extent).
pub(crate) const RADIUS: f32 = 0.5;

/// Number of vertices in a flat circular cap built by [`make_cap`]: ring 0 is
/// a center fan (one triangle per segment), every outer ring adds two.
pub(crate) fn cap_vertex_count(p1: u32, p2: u32) -> usize {
    (3 * p2 * (2 * p1 - 1)) as usize
}

/// Build a flat circular cap of radius [`RADIUS`] in the y = `center_y` plane
/// out of `p1` concentric rings of `p2` angular segments. The innermost ring
/// collapses to a center fan. `facing_up` selects the (0, 1, 0) normal and the
/// matching winding; otherwise the cap faces (0, -1, 0).
///
/// Shared by the cone's base and both cylinder caps.
pub(crate) fn make_cap(mesh: &mut Mesh, center_y: f32, facing_up: bool, p1: u32, p2: u32) {
    let normal = if facing_up { Vec3::Y } else { Vec3::NEG_Y };
    let center = Vec3::new(0.0, center_y, 0.0);

    let at = |radius: f32, angle: f32| {
        Vec3::new(radius * angle.cos(), center_y, radius * angle.sin())
    };

    for ring in 0..p1 {
        let inner_radius = RADIUS * ring as f32 / p1 as f32;
        let outer_radius = RADIUS * (ring + 1) as f32 / p1 as f32;

        for segment in 0..p2 {
            let angle = std::f32::consts::TAU * segment as f32 / p2 as f32;
            let next_angle = std::f32::consts::TAU * (segment + 1) as f32 / p2 as f32;

            if ring == 0 {
                // Center fan.
                let a = at(outer_radius, angle);
                let b = at(outer_radius, next_angle);

                mesh.push(center, normal);
                if facing_up {
                    mesh.push(b, normal);
                    mesh.push(a, normal);
                } else {
                    mesh.push(a, normal);
                    mesh.push(b, normal);
                }
            } else {
                let v1 = at(inner_radius, angle);
                let v2 = at(outer_radius, angle);
                let v3 = at(inner_radius, next_angle);
                let v4 = at(outer_radius, next_angle);

                if facing_up {
                    mesh.push(v2, normal);
                    mesh.push(v1, normal);
                    mesh.push(v4, normal);

                    mesh.push(v4, normal);
                    mesh.push(v1, normal);
                    mesh.push(v3, normal);
                } else {
                    mesh.push(v1, normal);
                    mesh.push(v2, normal);
                    mesh.push(v4, normal);

                    mesh.push(v1, normal);
                    mesh.push(v4, normal);
                    mesh.push(v3, normal);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    const TOLERANCE: f32 = 1e-5;

    fn assert_unit_normals(mesh: &Mesh) {
        for vertex in mesh.vertices() {
            let length = Vec3::from_array(vertex.normal).length();
            assert!(
                (length - 1.0).abs() < TOLERANCE,
                "normal {:?} is not unit length",
                vertex.normal
            );
        }
    }

    #[test]
    fn all_shapes_emit_whole_triangles_with_unit_normals() {
        for kind in PrimitiveKind::ALL {
            for (p1, p2) in [(1, 3), (1, 4), (2, 3), (3, 8), (5, 12)] {
                let mesh = tessellate(kind, TessellationParams::new(p1, p2));
                assert!(mesh.vertex_count() > 0, "{kind:?} produced no vertices");
                assert_eq!(
                    mesh.vertex_count() % 3,
                    0,
                    "{kind:?} ({p1},{p2}) emitted a partial triangle"
                );
                assert_unit_normals(&mesh);
            }
        }
    }

    #[test]
    fn below_minimum_params_are_clamped() {
        let clamped = tessellate(PrimitiveKind::Sphere, TessellationParams::new(0, 0));
        let minimum = tessellate(PrimitiveKind::Sphere, TessellationParams::new(1, 3));
        assert_eq!(clamped, minimum);
    }

    #[test]
    fn primitive_kind_indices_are_dense() {
        for (expected, kind) in PrimitiveKind::ALL.into_iter().enumerate() {
            assert_eq!(expected, kind.index());
        }
    }

    #[test]
    fn cap_winding_faces_the_requested_direction() {
        // Every triangle in an upward cap should wind CCW seen from +y, which
        // makes its geometric normal point up.
        for facing_up in [true, false] {
            let mut mesh = Mesh::with_capacity(cap_vertex_count(2, 6));
            make_cap(&mut mesh, -0.5, facing_up, 2, 6);
            assert_eq!(mesh.vertex_count(), cap_vertex_count(2, 6));

            for triangle in mesh.vertices().chunks_exact(3) {
                let a = Vec3::from_array(triangle[0].position);
                let b = Vec3::from_array(triangle[1].position);
                let c = Vec3::from_array(triangle[2].position);
                let face = (b - a).cross(c - a);
                let expected_sign = if facing_up { 1.0 } else { -1.0 };
                assert!(
                    face.y * expected_sign > 0.0,
                    "triangle {a:?} {b:?} {c:?} winds the wrong way"
                );
            }
        }
    }
}
