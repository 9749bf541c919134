//! # Scene Lifecycle
//!
//! One [`SceneSession`] per chart: it owns the descriptors, animation state,
//! camera and (while mounted) the GPU resources, and runs the
//! mount/rebuild/resize/unmount lifecycle. The [`ResourceLedger`] accounts
//! for every object the session builds and disposes.
//!
//! ## Usage
//!
//! ```rust
//! use cairn::config::ChartConfig;
//! use cairn::data::Record;
//! use cairn::gfx::scene::SceneSession;
//!
//! let rows = vec![
//!     Record::new().with_text("month", "Jan").with_number("sales", 120.0),
//!     Record::new().with_text("month", "Feb").with_number("sales", 90.0),
//! ];
//! let mut session =
//!     SceneSession::from_records(&rows, "month", "sales", ChartConfig::default()).unwrap();
//! session.advance(1.0 / 60.0);
//! session.unmount();
//! assert_eq!(session.ledger().live(), 0);
//! ```

pub mod ledger;
pub mod session;

// Re-export main types
pub use ledger::ResourceLedger;
pub use session::SceneSession;
