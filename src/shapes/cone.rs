//! Cone tessellator: apex at y = +0.5, base circle of radius 0.5 at y = -0.5.
//!
//! The lateral surface uses the analytic cone normal for the vertex's angular
//! column, `normalize(cos a, radius / height, sin a)`. The normal depends only
//! on the column angle, so the apex row reuses the rim normal of its column
//! instead of degenerating to (0, 1, 0).

use glam::Vec3;

use super::{cap_vertex_count, make_cap, Mesh, TessellationParams, RADIUS};

const HEIGHT: f32 = 1.0;

/// Lateral: p2 wedges x p1 bands x 2 triangles. Base cap: shared cap count.
fn vertex_count(p1: u32, p2: u32) -> usize {
    (6 * p1 * p2) as usize + cap_vertex_count(p1, p2)
}

pub(super) fn tessellate(params: TessellationParams) -> Mesh {
    let (p1, p2) = (params.param1, params.param2);
    let mut mesh = Mesh::with_capacity(vertex_count(p1, p2));

    make_lateral_surface(&mut mesh, p1, p2);
    make_cap(&mut mesh, -RADIUS, false, p1, p2);

    debug_assert_eq!(mesh.vertex_count(), vertex_count(p1, p2));
    mesh
}

/// Analytic surface normal for the lateral column at `angle`.
fn surface_normal(angle: f32) -> Vec3 {
    Vec3::new(angle.cos(), RADIUS / HEIGHT, angle.sin()).normalize()
}

fn make_lateral_surface(mesh: &mut Mesh, p1: u32, p2: u32) {
    let apex = Vec3::new(0.0, RADIUS, 0.0);

    for wedge in 0..p2 {
        let angle = std::f32::consts::TAU * wedge as f32 / p2 as f32;
        let next_angle = std::f32::consts::TAU * (wedge + 1) as f32 / p2 as f32;

        let base_a = Vec3::new(RADIUS * angle.cos(), -RADIUS, RADIUS * angle.sin());
        let base_b = Vec3::new(
            RADIUS * next_angle.cos(),
            -RADIUS,
            RADIUS * next_angle.sin(),
        );

        let normal_a = surface_normal(angle);
        let normal_b = surface_normal(next_angle);

        for band in 0..p1 {
            let t_low = band as f32 / p1 as f32;
            let t_high = (band + 1) as f32 / p1 as f32;

            let low_a = base_a.lerp(apex, t_low);
            let low_b = base_b.lerp(apex, t_low);
            let high_a = base_a.lerp(apex, t_high);
            let high_b = base_b.lerp(apex, t_high);

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
    fn minimal_cone_has_twelve_triangles() {
        // 4 wedges x 1 band x 2 lateral triangles, plus a 4 triangle base fan.
        let mesh = tessellate(PrimitiveKind::Cone, TessellationParams::new(1, 4));
        assert_eq!(mesh.triangle_count(), 12);
    }

    #[test]
    fn vertex_count_matches_closed_form() {
        for (p1, p2) in [(1, 3), (2, 4), (3, 8)] {
            let mesh = tessellate(PrimitiveKind::Cone, TessellationParams::new(p1, p2));
            assert_eq!(mesh.vertex_count(), vertex_count(p1, p2));
        }
    }

    #[test]
    fn lateral_normals_follow_the_slope() {
        let mesh = tessellate(PrimitiveKind::Cone, TessellationParams::new(2, 8));
        let lateral = &mesh.vertices()[..(6 * 2 * 8)];

        for vertex in lateral {
            let normal = Vec3::from_array(vertex.normal);

            // Analytic normals rise at a fixed slope regardless of height or
            // angle, which is what keeps shading smooth through the apex.
            let radial = Vec3::new(normal.x, 0.0, normal.z).length();
            assert!((normal.y / radial - RADIUS / HEIGHT).abs() < 1e-4);
            assert!((normal.length() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn apex_vertices_reuse_rim_normals() {
        let mesh = tessellate(PrimitiveKind::Cone, TessellationParams::new(1, 4));

        for vertex in mesh.vertices() {
            let position = Vec3::from_array(vertex.position);
            if position.y > RADIUS - 1e-6 {
                // The apex never gets a singular (0, 1, 0) normal.
                let normal = Vec3::from_array(vertex.normal);
                assert!(normal.y < 0.99, "apex normal {normal:?} is singular");
            }
        }
    }
}
