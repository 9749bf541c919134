//! # Label Overlay
//!
//! Screen-space text for the chart: one node per bar category, one per bar
//! value (per the configured visibility policy) and one title per axis. Every
//! node is positioned by projecting a fixed world anchor through the current
//! camera, so labels track the orbit exactly; the layout is recomputed each
//! frame after the 3D pass and drawn on top of it.
//!
//! The same [`layout_labels`] output feeds two renderers: the live imgui
//! overlay ([`draw_labels`]) and the capture compositor, which stamps the
//! labels into exported pixels.

use cgmath::{Matrix4, Vector3};

use crate::config::ValueLabelMode;
use crate::data::HEIGHT_SCALE;
use crate::gfx::scene::SceneSession;

/// Labels whose projected position strays this far outside the viewport are
/// dropped from the layout.
const VIEWPORT_MARGIN: f32 = 100.0;

/// Hover-faded labels below this alpha are invisible and skipped.
const MIN_VISIBLE_ALPHA: f32 = 0.02;

const CATEGORY_RGB: [f32; 3] = [0.22, 0.24, 0.28];
const VALUE_RGB: [f32; 3] = [0.13, 0.15, 0.18];
const AXIS_RGB: [f32; 3] = [0.42, 0.45, 0.5];

/// What a label annotates, which decides its color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelKind {
    /// Category text under a bar.
    Category,
    /// Value text above a bar.
    Value,
    /// Axis title taken from the selected field name.
    AxisTitle,
}

/// One positioned text node for the current frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub text: String,
    /// Center position in pixels, y down.
    pub position: [f32; 2],
    pub kind: LabelKind,
    /// 0..1 opacity; hover-only value labels fade with the hover emphasis.
    pub alpha: f32,
}

/// Projects a world point to pixel coordinates.
///
/// Returns `None` for anchors behind the camera (`w <= 0`). The y axis is
/// flipped so the result is in window coordinates, y down.
pub fn project_to_screen(
    world: Vector3<f32>,
    view_proj: &Matrix4<f32>,
    viewport: (f32, f32),
) -> Option<[f32; 2]> {
    let clip = view_proj * world.extend(1.0);
    if clip.w <= 0.0 {
        return None;
    }
    let ndc_x = clip.x / clip.w;
    let ndc_y = clip.y / clip.w;
    Some([
        (ndc_x + 1.0) * 0.5 * viewport.0,
        (1.0 - ndc_y) * 0.5 * viewport.1,
    ])
}

/// Lays out every visible label for one frame.
///
/// `view_proj` and `viewport` must describe the same target, whether that is
/// the live window or an offscreen capture.
pub fn layout_labels(
    session: &SceneSession,
    view_proj: &Matrix4<f32>,
    viewport: (f32, f32),
) -> Vec<Label> {
    let mut labels = Vec::new();
    let config = session.config();
    let front = config.bar_width * 0.5 + 0.4;

    for (descriptor, visual) in session.descriptors().iter().zip(session.animation().bars()) {
        if !descriptor.category_label.is_empty() {
            let anchor = descriptor.world_position + Vector3::new(0.0, -front, 0.0);
            push_label(
                &mut labels,
                descriptor.category_label.clone(),
                anchor,
                LabelKind::Category,
                1.0,
                view_proj,
                viewport,
            );
        }

        let alpha = match config.value_labels {
            ValueLabelMode::Always => 1.0,
            ValueLabelMode::HoverOnly => visual.hover_emphasis,
        };
        if alpha > MIN_VISIBLE_ALPHA {
            let anchor = descriptor.world_position
                + Vector3::new(0.0, 0.0, visual.render_height() + 0.5);
            push_label(
                &mut labels,
                format_value(descriptor.value),
                anchor,
                LabelKind::Value,
                alpha,
                view_proj,
                viewport,
            );
        }
    }

    let (half_x, half_y) = session.field_half_extents();
    push_label(
        &mut labels,
        session.category_field().to_owned(),
        Vector3::new(0.0, -half_y - 1.2, 0.0),
        LabelKind::AxisTitle,
        1.0,
        view_proj,
        viewport,
    );
    push_label(
        &mut labels,
        session.value_field().to_owned(),
        Vector3::new(-half_x - 0.6, -half_y, HEIGHT_SCALE * 0.5),
        LabelKind::AxisTitle,
        1.0,
        view_proj,
        viewport,
    );

    labels
}

fn push_label(
    labels: &mut Vec<Label>,
    text: String,
    anchor: Vector3<f32>,
    kind: LabelKind,
    alpha: f32,
    view_proj: &Matrix4<f32>,
    viewport: (f32, f32),
) {
    let Some(position) = project_to_screen(anchor, view_proj, viewport) else {
        return;
    };
    if position[0] < -VIEWPORT_MARGIN
        || position[0] > viewport.0 + VIEWPORT_MARGIN
        || position[1] < -VIEWPORT_MARGIN
        || position[1] > viewport.1 + VIEWPORT_MARGIN
    {
        return;
    }
    labels.push(Label {
        text,
        position,
        kind,
        alpha,
    });
}

/// Formats a value for its bar label, without a trailing `.0` on whole
/// numbers.
pub fn format_value(value: f32) -> String {
    if value.fract().abs() < 1e-6 && value.abs() < 1e9 {
        format!("{}", value as i64)
    } else {
        let text = format!("{value:.2}");
        text.trim_end_matches('0').trim_end_matches('.').to_owned()
    }
}

/// RGBA draw color for a label.
pub fn label_color(label: &Label) -> [f32; 4] {
    let [r, g, b] = match label.kind {
        LabelKind::Category => CATEGORY_RGB,
        LabelKind::Value => VALUE_RGB,
        LabelKind::AxisTitle => AXIS_RGB,
    };
    [r, g, b, label.alpha]
}

/// Draws the laid-out labels through imgui, centered on their anchors and
/// behind any HUD windows.
pub fn draw_labels(ui: &imgui::Ui, labels: &[Label]) {
    let draw_list = ui.get_background_draw_list();
    for label in labels {
        let size = ui.calc_text_size(&label.text);
        let position = [
            label.position[0] - size[0] * 0.5,
            label.position[1] - size[1] * 0.5,
        ];
        draw_list.add_text(position, label_color(label), &label.text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{perspective, Deg, Point3};

    use crate::config::ChartConfig;
    use crate::data::Record;

    const VIEWPORT: (f32, f32) = (1200.0, 800.0);

    fn records(values: &[f64]) -> Vec<Record> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                Record::new()
                    .with_text("month", format!("M{i}"))
                    .with_number("sales", *v)
            })
            .collect()
    }

    fn session_with(config: ChartConfig) -> SceneSession {
        SceneSession::from_records(&records(&[10.0, 20.0, 5.0]), "month", "sales", config)
            .unwrap()
    }

    fn settled_session(config: ChartConfig) -> SceneSession {
        let mut session = session_with(config);
        for _ in 0..400 {
            session.advance(1.0 / 60.0);
            if session.is_settled() {
                break;
            }
        }
        session
    }

    #[test]
    fn identity_projection_maps_the_origin_to_center() {
        let identity = Matrix4::from_scale(1.0);
        let center = project_to_screen(Vector3::new(0.0, 0.0, 0.0), &identity, VIEWPORT).unwrap();
        assert_eq!(center, [600.0, 400.0]);

        // NDC up maps to smaller pixel y.
        let above = project_to_screen(Vector3::new(0.0, 0.5, 0.0), &identity, VIEWPORT).unwrap();
        assert!(above[1] < center[1]);
        assert_eq!(above[0], center[0]);
    }

    #[test]
    fn anchors_behind_the_camera_are_skipped() {
        let view = Matrix4::look_at_rh(
            Point3::new(0.0, -10.0, 0.0),
            Point3::new(0.0, 0.0, 0.0),
            Vector3::unit_z(),
        );
        let vp = perspective(Deg(60.0), 1.5, 0.1, 100.0) * view;

        assert!(project_to_screen(Vector3::new(0.0, 0.0, 0.0), &vp, VIEWPORT).is_some());
        assert!(project_to_screen(Vector3::new(0.0, -20.0, 0.0), &vp, VIEWPORT).is_none());
    }

    #[test]
    fn layout_emits_category_and_axis_labels() {
        let session = settled_session(ChartConfig::default());
        let labels = layout_labels(&session, &session.view_projection(), VIEWPORT);

        let categories: Vec<&Label> = labels
            .iter()
            .filter(|l| l.kind == LabelKind::Category)
            .collect();
        assert_eq!(categories.len(), 3);
        assert_eq!(categories[0].text, "M0");

        let axes: Vec<&Label> = labels
            .iter()
            .filter(|l| l.kind == LabelKind::AxisTitle)
            .collect();
        assert_eq!(axes.len(), 2);
        assert!(axes.iter().any(|l| l.text == "month"));
        assert!(axes.iter().any(|l| l.text == "sales"));

        // Hover-only policy with nothing hovered shows no values.
        assert!(labels.iter().all(|l| l.kind != LabelKind::Value));
    }

    #[test]
    fn always_mode_shows_every_value_label() {
        let session =
            settled_session(ChartConfig::default().with_value_labels(ValueLabelMode::Always));
        let labels = layout_labels(&session, &session.view_projection(), VIEWPORT);

        let values: Vec<&Label> = labels
            .iter()
            .filter(|l| l.kind == LabelKind::Value)
            .collect();
        assert_eq!(values.len(), 3);
        assert!(values.iter().any(|l| l.text == "20"));
        assert!(values.iter().all(|l| l.alpha == 1.0));
    }

    #[test]
    fn hovered_bar_fades_its_value_label_in() {
        let mut session = settled_session(ChartConfig::default());

        // Aim the pointer at the center of bar 1.
        let center = session.descriptors()[1].world_position
            + Vector3::new(0.0, 0.0, session.animation().bars()[1].render_height() * 0.5);
        let clip = session.view_projection() * center.extend(1.0);
        let ndc = (clip.x / clip.w, clip.y / clip.w);
        assert_eq!(session.update_hover(ndc), Some(1));

        for _ in 0..30 {
            session.advance(1.0 / 60.0);
        }
        let labels = layout_labels(&session, &session.view_projection(), VIEWPORT);
        let values: Vec<&Label> = labels
            .iter()
            .filter(|l| l.kind == LabelKind::Value)
            .collect();
        assert_eq!(values.len(), 1);
        assert_eq!(values[0].text, "20");
        assert!(values[0].alpha > 0.5 && values[0].alpha <= 1.0);
    }

    #[test]
    fn value_labels_sit_above_their_category_labels() {
        let session =
            settled_session(ChartConfig::default().with_value_labels(ValueLabelMode::Always));
        let labels = layout_labels(&session, &session.view_projection(), VIEWPORT);

        let category_y = labels
            .iter()
            .find(|l| l.kind == LabelKind::Category && l.text == "M1")
            .map(|l| l.position[1])
            .unwrap();
        let value_y = labels
            .iter()
            .find(|l| l.kind == LabelKind::Value && l.text == "20")
            .map(|l| l.position[1])
            .unwrap();
        assert!(value_y < category_y, "value label renders above the bar");
    }

    #[test]
    fn whole_values_format_without_a_decimal_tail() {
        assert_eq!(format_value(120.0), "120");
        assert_eq!(format_value(2.5), "2.5");
        assert_eq!(format_value(-7.25), "-7.25");
        assert_eq!(format_value(0.0), "0");
    }

    #[test]
    fn label_colors_carry_the_alpha() {
        let label = Label {
            text: "42".into(),
            position: [10.0, 10.0],
            kind: LabelKind::Value,
            alpha: 0.4,
        };
        assert_eq!(label_color(&label)[3], 0.4);
    }
}
