//! Dataset to bar descriptor mapping
//!
//! Pure, deterministic, no I/O: the same records and axis selection always
//! produce the same ordered descriptor list. All scene geometry derives from
//! the output of [`map_dataset`].

use cgmath::Vector3;
use log::warn;

use super::Record;
use crate::config::{ChartConfig, Color};
use crate::error::DatasetError;

/// World-space height of the tallest bar. Every dataset is normalized so its
/// maximum absolute value maps to exactly this height.
pub const HEIGHT_SCALE: f32 = 10.0;

/// Derived per-record geometric/visual description of one bar.
#[derive(Debug, Clone, PartialEq)]
pub struct BarDescriptor {
    /// Position of the record in the dataset, and of the bar in the row.
    pub index: usize,
    /// Category cell coerced to text; empty when the field is missing.
    pub category_label: String,
    /// Value cell coerced to a number; 0.0 when missing or non-numeric.
    pub value: f32,
    /// Bar height in world units, in `[0, HEIGHT_SCALE]`.
    pub normalized_height: f32,
    /// Center of the bar footprint on the ground plane (z = 0).
    pub world_position: Vector3<f32>,
    /// Palette color, cycled via `index % palette.len()`.
    pub color: Color,
}

/// Maps dataset records into bar descriptors.
///
/// Records keep their input order and their slot: a record whose value cell
/// is missing or non-numeric contributes a zero-height bar instead of being
/// dropped, so positions and palette colors stay aligned with the input.
///
/// # Errors
/// [`DatasetError::Empty`] when `records` is empty, and
/// [`DatasetError::ValueFieldNotNumeric`] when no record at all has a
/// numeric-coercible value cell.
pub fn map_dataset(
    records: &[Record],
    category_field: &str,
    value_field: &str,
    config: &ChartConfig,
) -> Result<Vec<BarDescriptor>, DatasetError> {
    if records.is_empty() {
        return Err(DatasetError::Empty);
    }

    let mut any_numeric = false;
    let values: Vec<f32> = records
        .iter()
        .map(|record| match record.get(value_field).and_then(|v| v.as_number()) {
            Some(n) => {
                any_numeric = true;
                n as f32
            }
            None => 0.0,
        })
        .collect();

    if !any_numeric {
        return Err(DatasetError::ValueFieldNotNumeric {
            field: value_field.to_owned(),
        });
    }

    let non_numeric = values.len() - records
        .iter()
        .filter(|r| r.get(value_field).and_then(|v| v.as_number()).is_some())
        .count();
    if non_numeric > 0 {
        warn!(
            "{non_numeric} of {} records have a non-numeric `{value_field}` cell, rendered as zero-height bars",
            records.len()
        );
    }

    // Heights scale against the largest magnitude so the tallest bar is
    // always HEIGHT_SCALE tall; an all-zero dataset stays flat.
    let max_abs = values.iter().fold(0.0f32, |acc, v| acc.max(v.abs()));

    let palette = &config.palette;
    let step = config.bar_width + config.spacing;
    let start_x = -((records.len() - 1) as f32) * step / 2.0;

    let descriptors = records
        .iter()
        .zip(values.iter())
        .enumerate()
        .map(|(index, (record, &value))| {
            let normalized_height = if max_abs > 0.0 {
                (value.abs() / max_abs) * HEIGHT_SCALE
            } else {
                0.0
            };
            let category_label = record
                .get(category_field)
                .map(|v| v.as_label())
                .unwrap_or_default();

            BarDescriptor {
                index,
                category_label,
                value,
                normalized_height,
                world_position: Vector3::new(start_x + index as f32 * step, 0.0, 0.0),
                color: palette[index % palette.len()],
            }
        })
        .collect();

    Ok(descriptors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PALETTE_DEFAULT;
    use rand::{Rng, SeedableRng};

    fn rows(values: &[(&str, f64)]) -> Vec<Record> {
        values
            .iter()
            .map(|(cat, val)| Record::new().with_text("cat", *cat).with_number("val", *val))
            .collect()
    }

    #[test]
    fn heights_normalize_against_the_maximum() {
        let records = rows(&[("A", 10.0), ("B", 20.0), ("C", 5.0)]);
        let bars = map_dataset(&records, "cat", "val", &ChartConfig::default()).unwrap();

        let heights: Vec<f32> = bars.iter().map(|b| b.normalized_height).collect();
        assert!((heights[0] - 5.0).abs() < 1e-5);
        assert!((heights[1] - 10.0).abs() < 1e-5);
        assert!((heights[2] - 2.5).abs() < 1e-5);
        assert_eq!(bars[1].category_label, "B");
    }

    #[test]
    fn all_zero_dataset_renders_flat() {
        let records = rows(&[("A", 0.0), ("B", 0.0), ("C", 0.0)]);
        let bars = map_dataset(&records, "cat", "val", &ChartConfig::default()).unwrap();
        assert!(bars.iter().all(|b| b.normalized_height == 0.0));
        assert!(bars.iter().all(|b| b.normalized_height.is_finite()));
    }

    #[test]
    fn positions_are_symmetric_and_evenly_spaced() {
        let config = ChartConfig::default();
        let records = rows(&[("A", 1.0), ("B", 2.0), ("C", 3.0), ("D", 4.0), ("E", 5.0)]);
        let bars = map_dataset(&records, "cat", "val", &config).unwrap();

        let xs: Vec<f32> = bars.iter().map(|b| b.world_position.x).collect();
        let step = config.bar_width + config.spacing;
        let n = xs.len();
        for i in 0..n {
            // Mirror pairs cancel about the origin.
            assert!((xs[i] + xs[n - 1 - i]).abs() < 1e-5);
            if i > 0 {
                assert!(xs[i] > xs[i - 1]);
                assert!((xs[i] - xs[i - 1] - step).abs() < 1e-5);
            }
        }
    }

    #[test]
    fn colors_cycle_through_the_palette() {
        let records = rows(&[
            ("A", 1.0),
            ("B", 2.0),
            ("C", 3.0),
            ("D", 4.0),
            ("E", 5.0),
            ("F", 6.0),
            ("G", 7.0),
            ("H", 8.0),
        ]);
        let bars = map_dataset(&records, "cat", "val", &ChartConfig::default()).unwrap();
        for bar in &bars {
            assert_eq!(bar.color, PALETTE_DEFAULT[bar.index % PALETTE_DEFAULT.len()]);
        }
        assert_eq!(bars[6].color, bars[0].color);
    }

    #[test]
    fn non_numeric_cells_keep_their_slot_as_zero_bars() {
        let records = vec![
            Record::new().with_text("cat", "A").with_number("val", 8.0),
            Record::new().with_text("cat", "B").with_text("val", "n/a"),
            Record::new().with_text("cat", "C").with_number("val", 4.0),
        ];
        let bars = map_dataset(&records, "cat", "val", &ChartConfig::default()).unwrap();
        assert_eq!(bars.len(), 3);
        assert_eq!(bars[1].value, 0.0);
        assert_eq!(bars[1].normalized_height, 0.0);
        // Slot preserved: C keeps its index, position ordering and color.
        assert_eq!(bars[2].index, 2);
        assert!(bars[2].world_position.x > bars[1].world_position.x);
    }

    #[test]
    fn numeric_text_cells_coerce() {
        let records = vec![
            Record::new().with_text("cat", "A").with_text("val", "15"),
            Record::new().with_text("cat", "B").with_text("val", "30"),
        ];
        let bars = map_dataset(&records, "cat", "val", &ChartConfig::default()).unwrap();
        assert!((bars[0].normalized_height - 5.0).abs() < 1e-5);
        assert!((bars[1].normalized_height - 10.0).abs() < 1e-5);
    }

    #[test]
    fn empty_dataset_is_rejected() {
        let err = map_dataset(&[], "cat", "val", &ChartConfig::default()).unwrap_err();
        assert_eq!(err, DatasetError::Empty);
    }

    #[test]
    fn fully_non_numeric_value_field_is_rejected() {
        let records = vec![
            Record::new().with_text("cat", "A").with_text("val", "low"),
            Record::new().with_text("cat", "B").with_text("val", "high"),
        ];
        let err = map_dataset(&records, "cat", "val", &ChartConfig::default()).unwrap_err();
        assert_eq!(
            err,
            DatasetError::ValueFieldNotNumeric { field: "val".into() }
        );
    }

    #[test]
    fn missing_category_field_labels_as_empty() {
        let records = vec![Record::new().with_number("val", 3.0)];
        let bars = map_dataset(&records, "cat", "val", &ChartConfig::default()).unwrap();
        assert_eq!(bars[0].category_label, "");
        assert!((bars[0].normalized_height - HEIGHT_SCALE).abs() < 1e-5);
    }

    #[test]
    fn negative_values_normalize_by_magnitude() {
        let records = rows(&[("A", -20.0), ("B", 10.0)]);
        let bars = map_dataset(&records, "cat", "val", &ChartConfig::default()).unwrap();
        assert!((bars[0].normalized_height - HEIGHT_SCALE).abs() < 1e-5);
        assert!((bars[1].normalized_height - 5.0).abs() < 1e-5);
        assert_eq!(bars[0].value, -20.0);
    }

    #[test]
    fn random_datasets_always_peak_at_height_scale() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let n = rng.random_range(1..40);
            let records: Vec<Record> = (0..n)
                .map(|i| {
                    Record::new()
                        .with_text("cat", format!("c{i}"))
                        .with_number("val", rng.random_range(0.1..5000.0))
                })
                .collect();
            let bars = map_dataset(&records, "cat", "val", &ChartConfig::default()).unwrap();
            let max = bars
                .iter()
                .map(|b| b.normalized_height)
                .fold(0.0f32, f32::max);
            assert!((max - HEIGHT_SCALE).abs() < 1e-3);
            assert!(bars
                .iter()
                .all(|b| (0.0..=HEIGHT_SCALE + 1e-3).contains(&b.normalized_height)));
        }
    }

    #[test]
    fn mapping_is_deterministic() {
        let records = rows(&[("A", 3.0), ("B", 9.0)]);
        let config = ChartConfig::default();
        let first = map_dataset(&records, "cat", "val", &config).unwrap();
        let second = map_dataset(&records, "cat", "val", &config).unwrap();
        assert_eq!(first, second);
    }
}
