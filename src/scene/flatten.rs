//! Flattening of the hierarchical scene tree into the two flat lists the
//! renderer consumes: world-space shape instances and world-space lights.

use glam::{Mat4, Vec3, Vec4};

use super::{Material, SceneLight, SceneNode};
use crate::shapes::PrimitiveKind;

/// Position reported for lights that have no meaningful position
/// (directional). Far outside any authored scene coordinate.
pub const UNUSED_POSITION: Vec4 = Vec4::new(999.0, 999.0, 999.0, 999.0);

/// Attenuation reported for lights that do not attenuate (directional).
const UNUSED_ATTENUATION: Vec3 = Vec3::new(1.0, 0.0, 0.0);

/// A primitive lifted out of the tree with its world transform baked in.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ShapeInstance {
    pub kind: PrimitiveKind,
    pub material: Material,
    /// Cumulative model-to-world transform for this instance.
    pub world_from_local: Mat4,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LightKind {
    Directional,
    Point,
    Spot,
}

/// A light lifted out of the tree into world space.
///
/// Every field is populated for every kind so the renderer can marshal lights
/// uniformly; fields that do not apply to a kind hold harmless defaults
/// (sentinel position for directional, zero direction for point, zero
/// angles for anything that is not a spot).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LightInstance {
    pub kind: LightKind,
    pub color: Vec4,
    pub position: Vec4,
    pub direction: Vec4,
    /// Constant / linear / quadratic attenuation terms.
    pub attenuation: Vec3,
    /// Spot cone angle in radians, 0 otherwise.
    pub angle: f32,
    /// Spot penumbra in radians, 0 otherwise.
    pub penumbra: f32,
}

/// The flat render-ready view of a scene tree.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FlattenedScene {
    pub shapes: Vec<ShapeInstance>,
    pub lights: Vec<LightInstance>,
}

/// Flatten `root` into world-space shape and light lists.
///
/// Depth-first pre-order: a node's own primitives and lights are emitted
/// before its children, and children in listed order, so the output order is
/// stable across runs of the same tree.
pub fn flatten(root: &SceneNode) -> FlattenedScene {
    let mut flattened = FlattenedScene::default();
    visit(root, Mat4::IDENTITY, &mut flattened);
    flattened
}

fn visit(node: &SceneNode, inherited: Mat4, out: &mut FlattenedScene) {
    // Fold this node's transform steps onto the inherited transform in listed
    // order. Right-multiplication keeps each step in the frame established by
    // the steps before it.
    let ctm = node
        .transforms
        .iter()
        .fold(inherited, |acc, step| acc * step.to_matrix());

    for primitive in &node.primitives {
        out.shapes.push(ShapeInstance {
            kind: primitive.kind,
            material: primitive.material,
            world_from_local: ctm,
        });
    }

    for light in &node.lights {
        out.lights.push(flatten_light(light, ctm));
    }

    for child in &node.children {
        visit(child, ctm, out);
    }
}

fn flatten_light(light: &SceneLight, ctm: Mat4) -> LightInstance {
    let local_origin = Vec4::new(0.0, 0.0, 0.0, 1.0);

    match *light {
        SceneLight::Directional { color, direction } => LightInstance {
            kind: LightKind::Directional,
            color,
            position: UNUSED_POSITION,
            direction: (ctm * direction).normalize(),
            attenuation: UNUSED_ATTENUATION,
            angle: 0.0,
            penumbra: 0.0,
        },
        SceneLight::Point { color, attenuation } => LightInstance {
            kind: LightKind::Point,
            color,
            position: ctm * local_origin,
            direction: Vec4::ZERO,
            attenuation,
            angle: 0.0,
            penumbra: 0.0,
        },
        SceneLight::Spot {
            color,
            direction,
            attenuation,
            angle,
            penumbra,
        } => LightInstance {
            kind: LightKind::Spot,
            color,
            position: ctm * local_origin,
            direction: (ctm * direction).normalize(),
            attenuation,
            // Cone angles are copied verbatim: a non-uniform scale on an
            // ancestor node will not widen or narrow the visual cone.
            angle,
            penumbra,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{ScenePrimitive, Transformation};

    fn test_material() -> Material {
        Material {
            ambient: Vec4::new(0.2, 0.2, 0.2, 1.0),
            diffuse: Vec4::new(0.8, 0.1, 0.1, 1.0),
            specular: Vec4::new(1.0, 1.0, 1.0, 1.0),
            shininess: 25.0,
        }
    }

    #[test]
    fn empty_tree_flattens_to_nothing() {
        let flattened = flatten(&SceneNode::default());
        assert!(flattened.shapes.is_empty());
        assert!(flattened.lights.is_empty());
    }

    #[test]
    fn flattening_is_deterministic() {
        let root = SceneNode {
            transforms: vec![Transformation::Rotate {
                axis: Vec3::new(0.0, 1.0, 0.0),
                angle: 0.7,
            }],
            primitives: vec![ScenePrimitive {
                kind: PrimitiveKind::Sphere,
                material: test_material(),
            }],
            lights: vec![SceneLight::Point {
                color: Vec4::ONE,
                attenuation: Vec3::new(1.0, 0.1, 0.0),
            }],
            children: vec![SceneNode {
                transforms: vec![Transformation::Translate(Vec3::new(1.0, 2.0, 3.0))],
                primitives: vec![ScenePrimitive {
                    kind: PrimitiveKind::Cone,
                    material: test_material(),
                }],
                ..Default::default()
            }],
        };

        // Two runs over an unchanged tree must agree bit for bit, in both
        // order and values.
        assert_eq!(flatten(&root), flatten(&root));
    }

    #[test]
    fn transform_steps_compose_in_listed_order() {
        let root = SceneNode {
            transforms: vec![
                Transformation::Translate(Vec3::new(1.0, 0.0, 0.0)),
                Transformation::Scale(Vec3::splat(2.0)),
            ],
            primitives: vec![ScenePrimitive {
                kind: PrimitiveKind::Cube,
                material: test_material(),
            }],
            ..Default::default()
        };

        let flattened = flatten(&root);
        let world_from_local = flattened.shapes[0].world_from_local;

        // The translate step is applied in the parent frame before the scale
        // folds in, so the local origin lands exactly at (1, 0, 0).
        let origin = world_from_local * Vec4::new(0.0, 0.0, 0.0, 1.0);
        assert!(origin.abs_diff_eq(Vec4::new(1.0, 0.0, 0.0, 1.0), 1e-6));

        // A unit offset is scaled by 2 on top of the translation.
        let unit_x = world_from_local * Vec4::new(1.0, 0.0, 0.0, 1.0);
        assert!(unit_x.abs_diff_eq(Vec4::new(3.0, 0.0, 0.0, 1.0), 1e-6));
    }

    #[test]
    fn directional_light_direction_is_transformed_and_normalized() {
        let axis = Vec3::new(0.0, 0.0, 1.0);
        let root = SceneNode {
            transforms: vec![
                Transformation::Rotate {
                    axis,
                    angle: std::f32::consts::FRAC_PI_2,
                },
                Transformation::Scale(Vec3::splat(5.0)),
            ],
            lights: vec![SceneLight::Directional {
                color: Vec4::ONE,
                direction: Vec4::new(1.0, 0.0, 0.0, 0.0),
            }],
            ..Default::default()
        };

        let flattened = flatten(&root);
        let light = &flattened.lights[0];

        // Rotating +x by 90 degrees about +z gives +y; the scale factor is
        // normalized away.
        assert!(light
            .direction
            .abs_diff_eq(Vec4::new(0.0, 1.0, 0.0, 0.0), 1e-6));

        // Directional lights report the fixed sentinel position.
        assert_eq!(light.position, UNUSED_POSITION);
    }

    #[test]
    fn translated_child_emits_world_space_point_light_and_shape() {
        let root = SceneNode {
            children: vec![SceneNode {
                transforms: vec![Transformation::Translate(Vec3::new(0.0, 5.0, 0.0))],
                primitives: vec![ScenePrimitive {
                    kind: PrimitiveKind::Cube,
                    material: test_material(),
                }],
                lights: vec![SceneLight::Point {
                    color: Vec4::ONE,
                    attenuation: Vec3::new(1.0, 0.0, 0.0),
                }],
                ..Default::default()
            }],
            ..Default::default()
        };

        let flattened = flatten(&root);
        assert_eq!(flattened.shapes.len(), 1);
        assert_eq!(flattened.lights.len(), 1);

        let light = &flattened.lights[0];
        assert_eq!(light.kind, LightKind::Point);
        assert!(light
            .position
            .abs_diff_eq(Vec4::new(0.0, 5.0, 0.0, 1.0), 1e-6));
        assert_eq!(light.direction, Vec4::ZERO);

        let shape = &flattened.shapes[0];
        let origin = shape.world_from_local * Vec4::new(0.0, 0.0, 0.0, 1.0);
        assert!(origin.abs_diff_eq(Vec4::new(0.0, 5.0, 0.0, 1.0), 1e-6));
    }

    #[test]
    fn spot_light_angles_are_copied_verbatim() {
        let root = SceneNode {
            transforms: vec![Transformation::Scale(Vec3::new(3.0, 1.0, 1.0))],
            lights: vec![SceneLight::Spot {
                color: Vec4::ONE,
                direction: Vec4::new(0.0, -1.0, 0.0, 0.0),
                attenuation: Vec3::new(1.0, 0.1, 0.01),
                angle: 0.5,
                penumbra: 0.1,
            }],
            ..Default::default()
        };

        let flattened = flatten(&root);
        let light = &flattened.lights[0];

        assert_eq!(light.kind, LightKind::Spot);
        assert_eq!(light.angle, 0.5);
        assert_eq!(light.penumbra, 0.1);
        assert!((light.direction.length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn emission_order_is_node_then_children() {
        let child_with = |kind| SceneNode {
            primitives: vec![ScenePrimitive {
                kind,
                material: test_material(),
            }],
            ..Default::default()
        };

        let root = SceneNode {
            primitives: vec![ScenePrimitive {
                kind: PrimitiveKind::Cube,
                material: test_material(),
            }],
            children: vec![
                child_with(PrimitiveKind::Cone),
                child_with(PrimitiveKind::Sphere),
            ],
            ..Default::default()
        };

        let kinds: Vec<_> = flatten(&root).shapes.iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![
                PrimitiveKind::Cube,
                PrimitiveKind::Cone,
                PrimitiveKind::Sphere
            ]
        );
    }
}
