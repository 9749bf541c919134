//! # Procedural Chart Geometry
//!
//! Everything the chart renders is generated procedurally: the shared bar
//! box, the ground plane, and the grid/axis line sets. No model files.
//!
//! ## Usage
//!
//! ```rust
//! use cairn::gfx::geometry::{generate_bar_box, generate_ground_plane};
//!
//! let bar = generate_bar_box();
//! let ground = generate_ground_plane(20.0, 12.0);
//! assert_eq!(bar.vertex_count(), 24);
//! ```

pub mod primitives;

pub use primitives::*;

/// Generated mesh data ready for GPU upload.
#[derive(Debug, Clone, Default)]
pub struct GeometryData {
    /// Vertex positions (x, y, z)
    pub vertices: Vec<[f32; 3]>,
    /// Normal vectors (x, y, z)
    pub normals: Vec<[f32; 3]>,
    /// Triangle indices (counter-clockwise winding)
    pub indices: Vec<u32>,
}

impl GeometryData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Interleaves positions and normals into the renderer's vertex format.
    pub fn to_vertex_data(&self) -> (Vec<crate::gfx::rendering::vertex::Vertex3D>, Vec<u32>) {
        use crate::gfx::rendering::vertex::Vertex3D;

        let vertices: Vec<Vertex3D> = (0..self.vertices.len())
            .map(|i| Vertex3D {
                position: self.vertices[i],
                normal: self.normals.get(i).copied().unwrap_or([0.0, 0.0, 1.0]),
            })
            .collect();

        (vertices, self.indices.clone())
    }
}
