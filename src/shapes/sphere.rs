//! Sphere tessellator: radius 0.5 centered on the origin, built from `param2`
//! longitudinal wedges of `param1` latitudinal bands. A vertex's normal is its
//! normalized position, so no separate normal formula is needed. The pole rows
//! collapse to a point and are emitted as harmless zero-area triangles rather
//! than special-cased pole fans.

use glam::Vec3;

use super::{Mesh, TessellationParams, RADIUS};

/// p2 wedges x p1 bands x 2 triangles per tile.
fn vertex_count(p1: u32, p2: u32) -> usize {
    (6 * p1 * p2) as usize
}

pub(super) fn tessellate(params: TessellationParams) -> Mesh {
    let (p1, p2) = (params.param1, params.param2);
    let mut mesh = Mesh::with_capacity(vertex_count(p1, p2));

    for wedge in 0..p2 {
        let theta = std::f32::consts::TAU * wedge as f32 / p2 as f32;
        let next_theta = std::f32::consts::TAU * (wedge + 1) as f32 / p2 as f32;
        make_wedge(&mut mesh, p1, theta, next_theta);
    }

    debug_assert_eq!(mesh.vertex_count(), vertex_count(p1, p2));
    mesh
}

/// Point on the sphere at longitude `theta`, colatitude `phi` (0 at +y pole).
fn point_at(theta: f32, phi: f32) -> Vec3 {
    Vec3::new(
        RADIUS * phi.sin() * theta.cos(),
        RADIUS * phi.cos(),
        RADIUS * phi.sin() * theta.sin(),
    )
}

fn make_wedge(mesh: &mut Mesh, p1: u32, theta: f32, next_theta: f32) {
    let phi_step = std::f32::consts::PI / p1 as f32;

    for band in 0..p1 {
        let phi = band as f32 * phi_step;
        let next_phi = (band + 1) as f32 * phi_step;

        let top_left = point_at(next_theta, phi);
        let top_right = point_at(theta, phi);
        let bottom_left = point_at(next_theta, next_phi);
        let bottom_right = point_at(theta, next_phi);

        make_tile(mesh, top_left, top_right, bottom_left, bottom_right);
    }
}

fn make_tile(mesh: &mut Mesh, top_left: Vec3, top_right: Vec3, bottom_left: Vec3, bottom_right: Vec3) {
    mesh.push(top_left, top_left.normalize());
    mesh.push(bottom_left, bottom_left.normalize());
    mesh.push(bottom_right, bottom_right.normalize());

    mesh.push(bottom_right, bottom_right.normalize());
    mesh.push(top_right, top_right.normalize());
    mesh.push(top_left, top_left.normalize());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{tessellate, PrimitiveKind};

    #[test]
    fn vertex_count_matches_closed_form() {
        for (p1, p2) in [(1, 3), (2, 4), (4, 8)] {
            let mesh = tessellate(PrimitiveKind::Sphere, TessellationParams::new(p1, p2));
            assert_eq!(mesh.vertex_count(), vertex_count(p1, p2));
        }
    }

    #[test]
    fn normals_equal_normalized_positions() {
        let mesh = tessellate(PrimitiveKind::Sphere, TessellationParams::new(4, 8));

        for vertex in mesh.vertices() {
            let position = Vec3::from_array(vertex.position);
            let normal = Vec3::from_array(vertex.normal);

            assert!((position.length() - RADIUS).abs() < 1e-5);
            assert!(position.normalize().abs_diff_eq(normal, 1e-5));
        }
    }

    #[test]
    fn poles_are_present() {
        let mesh = tessellate(PrimitiveKind::Sphere, TessellationParams::new(2, 4));

        let touches = |pole_y: f32| {
            mesh.vertices()
                .iter()
                .any(|v| (v.position[1] - pole_y).abs() < 1e-6)
        };
        assert!(touches(RADIUS));
        assert!(touches(-RADIUS));
    }
}
