//! Monthly sales dashboard: a year of randomized data, the ocean palette,
//! always-on value labels and a custom legend panel next to the built-in
//! HUD.

use anyhow::Result;
use cairn::prelude::*;
use rand::Rng;

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

fn main() -> Result<()> {
    env_logger::init();

    let mut rng = rand::rng();
    let rows: Vec<Record> = MONTHS
        .iter()
        .map(|month| {
            Record::new()
                .with_text("month", *month)
                .with_number("sales", rng.random_range(40.0..160.0))
        })
        .collect();

    let config = ChartConfig::default()
        .with_title("Monthly Sales")
        .with_palette(palette_by_name("ocean").unwrap())
        .with_value_labels(ValueLabelMode::Always)
        .with_animation_speed(0.8);

    let legend: Vec<(String, f64)> = rows
        .iter()
        .map(|row| {
            let month = row.get("month").map(FieldValue::as_label).unwrap_or_default();
            let sales = row.get("sales").and_then(FieldValue::as_number).unwrap_or(0.0);
            (month, sales)
        })
        .collect();

    let mut app = cairn::chart(&rows, "month", "sales", config)?;
    app.set_ui(move |ui| {
        ui.window("Legend")
            .size([180.0, 0.0], imgui::Condition::FirstUseEver)
            .position([16.0, 360.0], imgui::Condition::FirstUseEver)
            .build(|| {
                for (month, sales) in &legend {
                    ui.text(format!("{month}: {sales:.0}"));
                }
            });
    });
    app.run();
    Ok(())
}
