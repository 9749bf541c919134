//! # Chart Primitive Generation
//!
//! Bar box, ground plane and line furniture, all in the Z-up world the
//! camera expects. The bar box spans `[0, 1]` on Z so a plain Z scale grows
//! a bar out of the ground without translating it.

use cgmath::Vector3;

use super::GeometryData;
use crate::gfx::rendering::vertex::LineVertex;

/// Grid and axis line colors (unlit).
pub const GRID_COLOR: [f32; 3] = [0.78, 0.80, 0.82];
pub const AXIS_COLOR: [f32; 3] = [0.35, 0.38, 0.42];

/// Generate the unit bar box.
///
/// Footprint spans -0.5..0.5 on X and Y, height spans 0..1 on Z. Each face
/// has outward normals so scaled instances stay correctly lit.
pub fn generate_bar_box() -> GeometryData {
    let mut data = GeometryData::new();

    let positions = [
        // Front face (-Y)
        [-0.5, -0.5, 0.0], [0.5, -0.5, 0.0], [0.5, -0.5, 1.0], [-0.5, -0.5, 1.0],
        // Back face (+Y)
        [0.5, 0.5, 0.0], [-0.5, 0.5, 0.0], [-0.5, 0.5, 1.0], [0.5, 0.5, 1.0],
        // Left face (-X)
        [-0.5, 0.5, 0.0], [-0.5, -0.5, 0.0], [-0.5, -0.5, 1.0], [-0.5, 0.5, 1.0],
        // Right face (+X)
        [0.5, -0.5, 0.0], [0.5, 0.5, 0.0], [0.5, 0.5, 1.0], [0.5, -0.5, 1.0],
        // Top face (+Z)
        [-0.5, -0.5, 1.0], [0.5, -0.5, 1.0], [0.5, 0.5, 1.0], [-0.5, 0.5, 1.0],
        // Bottom face (-Z)
        [-0.5, 0.5, 0.0], [0.5, 0.5, 0.0], [0.5, -0.5, 0.0], [-0.5, -0.5, 0.0],
    ];

    let normals = [
        [0.0, -1.0, 0.0], [0.0, -1.0, 0.0], [0.0, -1.0, 0.0], [0.0, -1.0, 0.0],
        [0.0, 1.0, 0.0], [0.0, 1.0, 0.0], [0.0, 1.0, 0.0], [0.0, 1.0, 0.0],
        [-1.0, 0.0, 0.0], [-1.0, 0.0, 0.0], [-1.0, 0.0, 0.0], [-1.0, 0.0, 0.0],
        [1.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 0.0, 0.0],
        [0.0, 0.0, 1.0], [0.0, 0.0, 1.0], [0.0, 0.0, 1.0], [0.0, 0.0, 1.0],
        [0.0, 0.0, -1.0], [0.0, 0.0, -1.0], [0.0, 0.0, -1.0], [0.0, 0.0, -1.0],
    ];

    data.vertices = positions.to_vec();
    data.normals = normals.to_vec();

    // Two counter-clockwise triangles per face.
    data.indices = vec![
        0, 1, 2, 2, 3, 0, // front
        4, 5, 6, 6, 7, 4, // back
        8, 9, 10, 10, 11, 8, // left
        12, 13, 14, 14, 15, 12, // right
        16, 17, 18, 18, 19, 16, // top
        20, 21, 22, 22, 23, 20, // bottom
    ];

    data
}

/// Generate the ground plane, centered at the origin at z = 0, facing +Z.
pub fn generate_ground_plane(width: f32, depth: f32) -> GeometryData {
    let hw = width * 0.5;
    let hd = depth * 0.5;
    GeometryData {
        vertices: vec![
            [-hw, -hd, 0.0],
            [hw, -hd, 0.0],
            [hw, hd, 0.0],
            [-hw, hd, 0.0],
        ],
        normals: vec![[0.0, 0.0, 1.0]; 4],
        indices: vec![0, 1, 2, 2, 3, 0],
    }
}

/// Generate grid lines over the ground plane as line-list pairs.
///
/// Lines cover `[-half_x, half_x] x [-half_y, half_y]` at the given step,
/// sitting just above the plane to avoid z-fighting.
pub fn generate_grid_lines(half_x: f32, half_y: f32, step: f32) -> Vec<LineVertex> {
    let mut lines = Vec::new();
    let z = 0.005;
    let step = step.max(0.05);

    let mut x = -half_x;
    while x <= half_x + 1e-4 {
        lines.push(LineVertex::new(Vector3::new(x, -half_y, z), GRID_COLOR));
        lines.push(LineVertex::new(Vector3::new(x, half_y, z), GRID_COLOR));
        x += step;
    }
    let mut y = -half_y;
    while y <= half_y + 1e-4 {
        lines.push(LineVertex::new(Vector3::new(-half_x, y, z), GRID_COLOR));
        lines.push(LineVertex::new(Vector3::new(half_x, y, z), GRID_COLOR));
        y += step;
    }

    lines
}

/// Generate the two chart axes as line-list pairs: the category axis along
/// the front bottom edge and the value axis rising at the left end.
pub fn generate_axis_lines(half_x: f32, front_y: f32, height: f32) -> Vec<LineVertex> {
    let z = 0.01;
    vec![
        // Category axis along X.
        LineVertex::new(Vector3::new(-half_x, front_y, z), AXIS_COLOR),
        LineVertex::new(Vector3::new(half_x, front_y, z), AXIS_COLOR),
        // Value axis up Z.
        LineVertex::new(Vector3::new(-half_x, front_y, z), AXIS_COLOR),
        LineVertex::new(Vector3::new(-half_x, front_y, height), AXIS_COLOR),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bar_box_has_per_face_vertices() {
        let bar = generate_bar_box();
        assert_eq!(bar.vertices.len(), 24); // 6 faces * 4 vertices
        assert_eq!(bar.indices.len(), 36); // 6 faces * 2 triangles * 3 indices
        assert_eq!(bar.vertex_count(), 24);
        assert_eq!(bar.triangle_count(), 12);
        assert_eq!(bar.normals.len(), bar.vertices.len());
    }

    #[test]
    fn bar_box_grows_from_the_ground() {
        let bar = generate_bar_box();
        for v in &bar.vertices {
            assert!((0.0..=1.0).contains(&v[2]), "z out of range: {:?}", v);
            assert!((-0.5..=0.5).contains(&v[0]));
            assert!((-0.5..=0.5).contains(&v[1]));
        }
        assert!(bar.vertices.iter().any(|v| v[2] == 0.0));
        assert!(bar.vertices.iter().any(|v| v[2] == 1.0));
    }

    #[test]
    fn ground_plane_is_flat_and_centered() {
        let plane = generate_ground_plane(20.0, 12.0);
        assert_eq!(plane.vertices.len(), 4);
        assert_eq!(plane.triangle_count(), 2);
        assert!(plane.vertices.iter().all(|v| v[2] == 0.0));
        let sum_x: f32 = plane.vertices.iter().map(|v| v[0]).sum();
        assert!(sum_x.abs() < 1e-5);
    }

    #[test]
    fn grid_lines_come_in_pairs() {
        let grid = generate_grid_lines(5.0, 3.0, 1.0);
        assert_eq!(grid.len() % 2, 0);
        // 11 lines across X plus 7 across Y.
        assert_eq!(grid.len(), (11 + 7) * 2);
    }

    #[test]
    fn axes_share_their_origin_corner() {
        let axes = generate_axis_lines(6.0, -2.0, 10.0);
        assert_eq!(axes.len(), 4);
        assert_eq!(axes[0].position[0], axes[2].position[0]);
        assert_eq!(axes[3].position[2], 10.0);
    }
}
