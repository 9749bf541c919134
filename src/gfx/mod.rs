//! # Graphics Module
//!
//! Everything between the mapped bar descriptors and pixels on a surface:
//! camera, procedural geometry, ray picking, the wgpu renderer and the scene
//! lifecycle.
//!
//! ## Architecture Overview
//!
//! - **Camera System** ([`camera`]) - Z-up orbit camera with damped controls
//!   and the idle auto-orbit
//! - **Geometry** ([`geometry`]) - Procedural bar box, ground plane and line
//!   furniture
//! - **Picking** ([`picking`]) - Pointer rays and AABB hit tests, pure
//!   functions over camera and extents
//! - **Rendering** ([`rendering`]) - Instanced wgpu pipelines plus offscreen
//!   capture
//! - **Scene Lifecycle** ([`scene`]) - The per-chart session owning all of
//!   the above, with resource accounting
//!
//! The session in [`scene`] is the entry point; the other modules are its
//! building blocks and stay usable on their own (picking and geometry run
//! without a GPU, which is how most of the tests exercise them).

pub mod camera;
pub mod geometry;
pub mod picking;
pub mod rendering;
pub mod scene;

// Re-export commonly used types
pub use camera::orbit_camera::OrbitCamera;
pub use rendering::render_engine::RenderEngine;
pub use scene::SceneSession;
