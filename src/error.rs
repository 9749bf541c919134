//! Error types for the chart pipeline
//!
//! Dataset-shape problems are validated before any scene is constructed and
//! surface as [`DatasetError`]; everything downstream (mounting, capture,
//! encoding) reports through [`ChartError`].

use thiserror::Error;

/// Validation failures detected while mapping a dataset into bar descriptors.
///
/// These block rendering and should be shown to the user as a "no data"
/// state rather than a crash.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DatasetError {
    /// The dataset contains no records at all.
    #[error("dataset contains no records")]
    Empty,

    /// The selected value field is not numeric-coercible in any record.
    #[error("value field `{field}` is not numeric in any record")]
    ValueFieldNotNumeric { field: String },
}

/// Top-level error type for the chart pipeline.
#[derive(Error, Debug)]
pub enum ChartError {
    /// Dataset failed validation before scene construction.
    #[error("invalid dataset: {0}")]
    InvalidDataset(#[from] DatasetError),

    /// No host surface or GPU adapter could be acquired at mount time.
    ///
    /// Recoverable: the caller may retry once a valid surface appears.
    #[error("host surface unavailable, nothing was mounted")]
    MountUnavailable,

    /// Export was requested but no renderable surface exists.
    #[error("no renderable surface available for capture")]
    CaptureUnavailable,

    /// Reading rendered pixels back from the GPU failed.
    #[error("frame capture failed: {0}")]
    Capture(String),

    /// Stamping overlay labels into the captured raster failed.
    #[error("label compositing failed: {0}")]
    Composite(String),

    /// Encoding the captured frame as an image failed.
    #[error("image encoding failed: {0}")]
    ImageEncoding(#[from] image::ImageError),

    /// Writing the single-page document wrapper failed.
    #[error("document write failed: {0}")]
    DocumentWrite(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
