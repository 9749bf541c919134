//! Renders a chart offscreen, without opening a window, and writes the
//! settled frame as both PNG and PDF into the working directory.

use std::path::Path;

use anyhow::{Context, Result};
use cairn::prelude::*;

fn main() -> Result<()> {
    env_logger::init();

    let rows = vec![
        Record::new().with_text("city", "Berlin").with_number("visitors", 1340.0),
        Record::new().with_text("city", "Madrid").with_number("visitors", 980.0),
        Record::new().with_text("city", "Oslo").with_number("visitors", 410.0),
        Record::new().with_text("city", "Rome").with_number("visitors", 1710.0),
        Record::new().with_text("city", "Vienna").with_number("visitors", 760.0),
    ];

    let config = ChartConfig::default()
        .with_title("Museum Visitors")
        .with_palette(palette_by_name("sunset").unwrap())
        .with_value_labels(ValueLabelMode::Always)
        .with_idle_orbit(false);

    let mut session = SceneSession::from_records(&rows, "city", "visitors", config)?;
    session
        .mount_headless(1600, 900)
        .context("no gpu adapter available for headless rendering")?;

    let out = Path::new(".");
    let png = capture::export_frame(&mut session, out, ExportFormat::Png, (1600, 900))?;
    println!("wrote {}", png.display());
    let pdf = capture::export_frame(&mut session, out, ExportFormat::Pdf, (1600, 900))?;
    println!("wrote {}", pdf.display());

    session.unmount();
    Ok(())
}
