use glam::{Mat4, Quat, Vec3};
use skinview_asset::{
    material::MaterialAsset,
    mesh::{ModelVertex, PrimitiveData},
};

use crate::config::BoxConfig;

const FACES: [(Vec3, Vec3, Vec3); 6] = [
    // (normal, u, v), with u cross v == normal
    (Vec3::X, Vec3::NEG_Z, Vec3::Y),
    (Vec3::NEG_X, Vec3::Z, Vec3::Y),
    (Vec3::Y, Vec3::X, Vec3::NEG_Z),
    (Vec3::NEG_Y, Vec3::X, Vec3::Z),
    (Vec3::Z, Vec3::X, Vec3::Y),
    (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
];

/// Cube spanning -1..1 on every axis, four vertices per face so every face
/// keeps its own normal.
pub fn cube_primitive(base_color: [f32; 4]) -> PrimitiveData {
    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);
    for (normal, u, v) in FACES {
        let start = vertices.len() as u32;
        let corners = [
            (-u - v, [0.0, 1.0]),
            (u - v, [1.0, 1.0]),
            (u + v, [1.0, 0.0]),
            (-u + v, [0.0, 0.0]),
        ];
        for (offset, tex_coords) in corners {
            vertices.push(ModelVertex {
                position: (normal + offset).to_array(),
                normal: normal.to_array(),
                tex_coords,
                ..Default::default()
            });
        }
        indices.extend([start, start + 1, start + 2, start, start + 2, start + 3]);
    }

    PrimitiveData {
        name: Some(String::from("Box")),
        vertices,
        indices,
        material: MaterialAsset {
            name: None,
            base_color,
            base_color_texture: None,
        },
        skinned: false,
        transform: Mat4::IDENTITY,
    }
}

/// Box placement, lifted so it rests on the ground plane.
pub fn box_transform(config: &BoxConfig) -> Mat4 {
    let scale = Vec3::from_array(config.scale);
    let position = Vec3::from_array(config.position) + Vec3::new(0.0, scale.y, 0.0);
    Mat4::from_scale_rotation_translation(scale, Quat::IDENTITY, position)
}

/// Unit ground quad centered on the origin, facing up.
pub fn ground_quad() -> PrimitiveData {
    let corners = [
        ([-0.5, 0.0, -0.5], [0.0, 0.0]),
        ([-0.5, 0.0, 0.5], [0.0, 1.0]),
        ([0.5, 0.0, 0.5], [1.0, 1.0]),
        ([0.5, 0.0, -0.5], [1.0, 0.0]),
    ];
    let vertices = corners
        .into_iter()
        .map(|(position, tex_coords)| ModelVertex {
            position,
            normal: [0.0, 1.0, 0.0],
            tex_coords,
            ..Default::default()
        })
        .collect();

    PrimitiveData {
        name: Some(String::from("Ground")),
        vertices,
        indices: vec![0, 1, 2, 0, 2, 3],
        material: MaterialAsset::default(),
        skinned: false,
        transform: Mat4::IDENTITY,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn triangle_normals(primitive: &PrimitiveData) -> Vec<(Vec3, Vec3)> {
        primitive
            .indices
            .chunks_exact(3)
            .map(|triangle| {
                let [a, b, c] = [0, 1, 2]
                    .map(|corner| Vec3::from_array(primitive.vertices[triangle[corner] as usize].position));
                let face = (b - a).cross(c - a).normalize();
                let vertex = Vec3::from_array(primitive.vertices[triangle[0] as usize].normal);
                (face, vertex)
            })
            .collect()
    }

    #[test]
    fn test_cube_layout() {
        let cube = cube_primitive([1.0, 0.0, 0.0, 1.0]);
        assert_eq!(cube.vertices.len(), 24);
        assert_eq!(cube.indices.len(), 36);
        assert!(!cube.skinned);
        assert_eq!(cube.material.base_color, [1.0, 0.0, 0.0, 1.0]);
        for vertex in &cube.vertices {
            assert!(vertex.position.iter().all(|value| value.abs() == 1.0));
        }
    }

    #[test]
    fn test_cube_winding_faces_outwards() {
        for (face, vertex) in triangle_normals(&cube_primitive([1.0; 4])) {
            assert!(face.abs_diff_eq(vertex, 1e-6));
        }
    }

    #[test]
    fn test_ground_quad_faces_up() {
        let quad = ground_quad();
        assert_eq!(quad.vertices.len(), 4);
        for (face, _) in triangle_normals(&quad) {
            assert!(face.abs_diff_eq(Vec3::Y, 1e-6));
        }
    }

    #[test]
    fn test_box_rests_on_ground() {
        let transform = box_transform(&BoxConfig {
            position: [10.0, 0.0, -5.0],
            scale: [2.0, 3.0, 2.0],
            color: [1.0; 4],
        });
        let bottom = transform.transform_point3(Vec3::new(0.0, -1.0, 0.0));
        assert!(bottom.abs_diff_eq(Vec3::new(10.0, 0.0, -5.0), 1e-6));
    }
}
