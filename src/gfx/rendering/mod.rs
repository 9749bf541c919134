// src/gfx/rendering/mod.rs
//! Core rendering functionality
//!
//! Render pipelines, GPU resource management, and frame rendering for the
//! bar chart surface.

pub mod render_engine;
pub mod texture;
pub mod vertex;

// Re-export main types
pub use render_engine::{ChartDraw, GpuMesh, RenderEngine, CAPTURE_CLEAR_COLOR, VIEW_CLEAR_COLOR};
pub use texture::TextureResource;
pub use vertex::{BarInstance, LineVertex, Vertex3D};
