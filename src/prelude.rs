//! # Cairn Prelude
//!
//! One import for typical chart applications:
//!
//! ```rust
//! use cairn::prelude::*;
//! ```
//!
//! This brings the dataset types, configuration, the app shell, the scene
//! session and the capture helpers into scope.

// Application shell
pub use crate::app::ChartApp;
pub use crate::chart;

// Dataset and mapping
pub use crate::data::{map_dataset, BarDescriptor, FieldValue, Record, HEIGHT_SCALE};

// Configuration and palettes
pub use crate::config::{
    palette_by_name, ChartConfig, Color, ValueLabelMode, PALETTE_DEFAULT, PALETTE_FOREST,
    PALETTE_MONO, PALETTE_OCEAN, PALETTE_SUNSET,
};

// Scene lifecycle for hosts that bypass the app shell
pub use crate::gfx::scene::{ResourceLedger, SceneSession};

// Capture and export
pub use crate::capture::{self, ExportFormat};

// Errors
pub use crate::error::{ChartError, DatasetError};

// Re-export the UI handle host callbacks receive
pub use imgui::Ui;
