//! # HUD and Overlay Plumbing
//!
//! [`UiManager`] owns the imgui context, winit platform glue and wgpu
//! renderer; [`hud`] builds the built-in control panel from plain data each
//! frame. The label overlay draws through the same imgui frame (see
//! [`crate::overlay`]) so labels and HUD share one pass after the 3D render.

pub mod hud;
pub mod manager;

pub use hud::{draw_hud, HudActions, HudInfo, HudState};
pub use manager::UiManager;
