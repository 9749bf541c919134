//! Smallest possible chart: four records, default config.
//!
//! Drag to orbit, scroll to zoom, hover a bar for its value, click to
//! select. The HUD exports the current frame as PNG or PDF.

use anyhow::Result;
use cairn::prelude::*;

fn main() -> Result<()> {
    env_logger::init();

    let rows = vec![
        Record::new().with_text("quarter", "Q1").with_number("revenue", 48.0),
        Record::new().with_text("quarter", "Q2").with_number("revenue", 72.0),
        Record::new().with_text("quarter", "Q3").with_number("revenue", 31.0),
        Record::new().with_text("quarter", "Q4").with_number("revenue", 90.0),
    ];

    let config = ChartConfig::default().with_title("Quarterly Revenue");
    let app = cairn::chart(&rows, "quarter", "revenue", config)?;
    app.run();
    Ok(())
}
