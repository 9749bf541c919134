// src/lib.rs
//! # Cairn
//!
//! A 3D bar chart rendering pipeline built on wgpu and winit: tabular
//! records in, an animated scene out, with a damped orbit camera, ray-picked
//! hover and selection, a screen-space label overlay, and PNG/PDF export of
//! the rendered frame.
//!
//! ```no_run
//! use cairn::config::ChartConfig;
//! use cairn::data::Record;
//!
//! let rows = vec![
//!     Record::new().with_text("month", "Jan").with_number("sales", 120.0),
//!     Record::new().with_text("month", "Feb").with_number("sales", 90.0),
//! ];
//! let app = cairn::chart(
//!     &rows,
//!     "month",
//!     "sales",
//!     ChartConfig::default().with_title("Monthly Sales"),
//! )
//! .expect("valid dataset");
//! app.run();
//! ```
//!
//! The windowed [`ChartApp`] is the convenient entry point; hosts that need
//! finer control (or no window at all) drive a
//! [`SceneSession`](gfx::scene::SceneSession) directly and use [`capture`]
//! for headless export.

pub mod animation;
pub mod app;
pub mod capture;
pub mod config;
pub mod data;
pub mod error;
pub mod gfx;
pub mod overlay;
pub mod prelude;
pub mod ui;

// Re-export main types for convenience
pub use app::ChartApp;
pub use config::ChartConfig;
pub use error::ChartError;

/// Validates the dataset and builds a windowed chart application.
pub fn chart(
    records: &[data::Record],
    category_field: &str,
    value_field: &str,
    config: ChartConfig,
) -> Result<ChartApp, ChartError> {
    ChartApp::new(records, category_field, value_field, config)
}
