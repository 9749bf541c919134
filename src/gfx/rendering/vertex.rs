//! Vertex and instance buffer layouts
//!
//! All layouts here MUST match the input structs in `chart.wgsl` exactly.

use bytemuck::{Pod, Zeroable};
use cgmath::{Matrix4, Vector3};

use crate::config::Color;

/// Mesh vertex for lit geometry (bars, ground plane).
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct Vertex3D {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl Vertex3D {
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex3D>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

/// Per-instance data for one rendered box (a bar or a hover particle).
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct BarInstance {
    /// World transform (4x4, column arrays).
    pub transform: [[f32; 4]; 4],
    /// Base color (RGBA).
    pub color: [f32; 4],
    /// x = emissive strength, remaining lanes reserved.
    pub params: [f32; 4],
}

impl BarInstance {
    pub fn new(transform: Matrix4<f32>, color: Color, emissive: f32) -> Self {
        Self {
            transform: transform.into(),
            color: color.to_array(),
            params: [emissive, 0.0, 0.0, 0.0],
        }
    }

    /// Instance buffer layout, locations 2..=7 after the mesh vertex.
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<BarInstance>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[
                // Transform matrix (4 vec4 columns)
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 4]>() as wgpu::BufferAddress,
                    shader_location: 3,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 8]>() as wgpu::BufferAddress,
                    shader_location: 4,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 12]>() as wgpu::BufferAddress,
                    shader_location: 5,
                    format: wgpu::VertexFormat::Float32x4,
                },
                // Color
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 16]>() as wgpu::BufferAddress,
                    shader_location: 6,
                    format: wgpu::VertexFormat::Float32x4,
                },
                // Params (emissive)
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 20]>() as wgpu::BufferAddress,
                    shader_location: 7,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

/// Unlit colored vertex for grid and axis lines.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct LineVertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
}

impl LineVertex {
    pub fn new(position: Vector3<f32>, color: [f32; 3]) -> Self {
        Self {
            position: position.into(),
            color,
        }
    }

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<LineVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instance_stride_covers_all_attributes() {
        // 16 transform + 4 color + 4 params floats.
        assert_eq!(std::mem::size_of::<BarInstance>(), 24 * 4);
        let desc = BarInstance::desc();
        assert_eq!(desc.attributes.len(), 6);
        let last = desc.attributes.last().unwrap();
        assert_eq!(last.offset as usize, 20 * 4);
    }

    #[test]
    fn bar_instance_carries_color_and_emissive() {
        let instance = BarInstance::new(
            Matrix4::from_translation(Vector3::new(1.0, 2.0, 0.0)),
            Color::rgb(0.5, 0.25, 1.0),
            0.3,
        );
        assert_eq!(instance.color, [0.5, 0.25, 1.0, 1.0]);
        assert_eq!(instance.params[0], 0.3);
        // Translation lands in the last column.
        assert_eq!(instance.transform[3][0], 1.0);
        assert_eq!(instance.transform[3][1], 2.0);
    }
}
