//! Cube tessellator: six faces, each split into `param1 x param1` tiles with
//! flat per-face normals. `param2` is unused by this family.

use glam::Vec3;

use super::{Mesh, TessellationParams, RADIUS};

/// Closed-form vertex count: 6 faces, param1^2 tiles, 2 triangles per tile.
fn vertex_count(p1: u32) -> usize {
    (36 * p1 * p1) as usize
}

pub(super) fn tessellate(params: TessellationParams) -> Mesh {
    let p1 = params.param1;
    let mut mesh = Mesh::with_capacity(vertex_count(p1));

    let x0y0z0 = Vec3::new(-RADIUS, -RADIUS, -RADIUS);
    let x0y0z1 = Vec3::new(-RADIUS, -RADIUS, RADIUS);
    let x0y1z0 = Vec3::new(-RADIUS, RADIUS, -RADIUS);
    let x0y1z1 = Vec3::new(-RADIUS, RADIUS, RADIUS);
    let x1y0z0 = Vec3::new(RADIUS, -RADIUS, -RADIUS);
    let x1y0z1 = Vec3::new(RADIUS, -RADIUS, RADIUS);
    let x1y1z0 = Vec3::new(RADIUS, RADIUS, -RADIUS);
    let x1y1z1 = Vec3::new(RADIUS, RADIUS, RADIUS);

    // Each face is given as (top-left, top-right, bottom-left) seen from
    // outside the cube, so the shared tiling code below emits CCW triangles
    // for every face. The fourth corner falls out of the tiling arithmetic.
    let faces = [
        // Front (+z), right (+x), back (-z), left (-x), top (+y), bottom (-y).
        [x0y1z1, x1y1z1, x0y0z1],
        [x1y1z1, x1y1z0, x1y0z1],
        [x1y1z0, x0y1z0, x1y0z0],
        [x0y1z0, x0y1z1, x0y0z0],
        [x0y1z0, x1y1z0, x0y1z1],
        [x0y0z1, x1y0z1, x0y0z0],
    ];

    for [top_left, top_right, bottom_left] in faces {
        make_face(&mut mesh, p1, top_left, top_right, bottom_left);
    }

    debug_assert_eq!(mesh.vertex_count(), vertex_count(p1));
    mesh
}

fn make_face(mesh: &mut Mesh, p1: u32, top_left: Vec3, top_right: Vec3, bottom_left: Vec3) {
    let tile_size = 1.0 / p1 as f32;
    let col_step = (top_right - top_left) * tile_size;
    let row_step = (bottom_left - top_left) * tile_size;

    for row in 0..p1 {
        for col in 0..p1 {
            let origin = top_left + row_step * row as f32 + col_step * col as f32;
            make_tile(
                mesh,
                origin,
                origin + col_step,
                origin + row_step,
                origin + row_step + col_step,
            );
        }
    }
}

fn make_tile(mesh: &mut Mesh, top_left: Vec3, top_right: Vec3, bottom_left: Vec3, bottom_right: Vec3) {
    // The tile is planar, so one edge cross product gives the flat outward
    // normal for all six vertices.
    let normal = (bottom_left - top_left)
        .cross(bottom_right - top_left)
        .normalize();

    mesh.push(top_left, normal);
    mesh.push(bottom_left, normal);
    mesh.push(bottom_right, normal);

    mesh.push(bottom_right, normal);
    mesh.push(top_right, normal);
    mesh.push(top_left, normal);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{tessellate, PrimitiveKind};

    #[test]
    fn vertex_count_matches_closed_form() {
        for p1 in 1..=4 {
            let mesh = tessellate(PrimitiveKind::Cube, TessellationParams::new(p1, 3));
            assert_eq!(mesh.vertex_count(), (36 * p1 * p1) as usize);
        }
    }

    #[test]
    fn normals_are_axis_aligned_and_outward() {
        let mesh = tessellate(PrimitiveKind::Cube, TessellationParams::new(2, 3));
        for vertex in mesh.vertices() {
            let normal = Vec3::from_array(vertex.normal);
            let position = Vec3::from_array(vertex.position);

            // Flat cube normals are exactly one of the six axis directions,
            // and every vertex lies on the face its normal points out of.
            let along_axis = normal.abs().max_element();
            assert!((along_axis - 1.0).abs() < 1e-6, "normal {normal:?} not axis aligned");
            assert!(
                (position.dot(normal) - RADIUS).abs() < 1e-6,
                "vertex {position:?} not on the face for normal {normal:?}"
            );
        }
    }

    #[test]
    fn triangles_wind_counter_clockwise() {
        let mesh = tessellate(PrimitiveKind::Cube, TessellationParams::new(3, 3));
        for triangle in mesh.vertices().chunks_exact(3) {
            let a = Vec3::from_array(triangle[0].position);
            let b = Vec3::from_array(triangle[1].position);
            let c = Vec3::from_array(triangle[2].position);
            let geometric = (b - a).cross(c - a);
            let shading = Vec3::from_array(triangle[0].normal);
            assert!(
                geometric.dot(shading) > 0.0,
                "triangle winds away from its face normal"
            );
        }
    }
}
