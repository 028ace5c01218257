//! Cylinder tessellator: radius 0.5 barrel between y = -0.5 and y = +0.5 with
//! smooth radial normals, capped top and bottom with the shared flat cap.

use glam::Vec3;

use super::{cap_vertex_count, make_cap, Mesh, TessellationParams, RADIUS};

/// Lateral: p2 wedges x p1 bands x 2 triangles. Two caps of the shared count.
fn vertex_count(p1: u32, p2: u32) -> usize {
    (6 * p1 * p2) as usize + 2 * cap_vertex_count(p1, p2)
}

pub(super) fn tessellate(params: TessellationParams) -> Mesh {
    let (p1, p2) = (params.param1, params.param2);
    let mut mesh = Mesh::with_capacity(vertex_count(p1, p2));

    make_barrel(&mut mesh, p1, p2);
    make_cap(&mut mesh, RADIUS, true, p1, p2);
    make_cap(&mut mesh, -RADIUS, false, p1, p2);

    debug_assert_eq!(mesh.vertex_count(), vertex_count(p1, p2));
    mesh
}

fn make_barrel(mesh: &mut Mesh, p1: u32, p2: u32) {
    for wedge in 0..p2 {
        let angle = std::f32::consts::TAU * wedge as f32 / p2 as f32;
        let next_angle = std::f32::consts::TAU * (wedge + 1) as f32 / p2 as f32;

        // Radial unit normal per angular column: constant along the height.
        let normal_a = Vec3::new(angle.cos(), 0.0, angle.sin());
        let normal_b = Vec3::new(next_angle.cos(), 0.0, next_angle.sin());

        for band in 0..p1 {
            let y_low = -RADIUS + band as f32 / p1 as f32;
            let y_high = -RADIUS + (band + 1) as f32 / p1 as f32;

            let low_a = Vec3::new(RADIUS * angle.cos(), y_low, RADIUS * angle.sin());
            let low_b = Vec3::new(RADIUS * next_angle.cos(), y_low, RADIUS * next_angle.sin());
            let high_a = Vec3::new(RADIUS * angle.cos(), y_high, RADIUS * angle.sin());
            let high_b = Vec3::new(RADIUS * next_angle.cos(), y_high, RADIUS * next_angle.sin());

            mesh.push(low_a, normal_a);
            mesh.push(high_a, normal_a);
            mesh.push(low_b, normal_b);

            mesh.push(high_a, normal_a);
            mesh.push(high_b, normal_b);
            mesh.push(low_b, normal_b);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{tessellate, PrimitiveKind};

    #[test]
    fn vertex_count_matches_closed_form() {
        for (p1, p2) in [(1, 3), (1, 4), (2, 6), (4, 10)] {
            let mesh = tessellate(PrimitiveKind::Cylinder, TessellationParams::new(p1, p2));
            assert_eq!(mesh.vertex_count(), vertex_count(p1, p2));
        }
    }

    #[test]
    fn lateral_normals_are_unit_radial_with_zero_y() {
        let (p1, p2) = (3, 8);
        let mesh = tessellate(PrimitiveKind::Cylinder, TessellationParams::new(p1, p2));
        let lateral = &mesh.vertices()[..(6 * p1 * p2) as usize];

        for vertex in lateral {
            let position = Vec3::from_array(vertex.position);
            let normal = Vec3::from_array(vertex.normal);

            assert_eq!(normal.y, 0.0);
            let radial = Vec3::new(position.x, 0.0, position.z).normalize();
            assert!(radial.abs_diff_eq(normal, 1e-5), "{normal:?} vs {radial:?}");
        }
    }

    #[test]
    fn single_band_caps_are_center_fans() {
        // p1 = 1 collapses each cap to p2 fan triangles.
        let mesh = tessellate(PrimitiveKind::Cylinder, TessellationParams::new(1, 5));
        assert_eq!(mesh.triangle_count(), (2 * 5) + 5 + 5);
    }
}
