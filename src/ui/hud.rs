//! Built-in control panel for a chart window.
//!
//! The HUD is rebuilt from plain data every frame: [`HudInfo`] snapshots the
//! session, [`HudState`] holds the widget values the user edits, and
//! [`HudActions`] reports what the app shell should apply this frame.

use imgui::{Condition, Ui};

use crate::config::{ChartConfig, ValueLabelMode};
use crate::overlay::format_value;

/// User-editable HUD values, initialized from the chart config.
#[derive(Debug, Clone)]
pub struct HudState {
    pub visible: bool,
    pub animation_speed: f32,
    pub idle_orbit: bool,
    pub value_labels: ValueLabelMode,
    /// Outcome of the last export, shown at the bottom of the panel.
    pub status: Option<String>,
}

impl HudState {
    pub fn from_config(config: &ChartConfig) -> Self {
        Self {
            visible: true,
            animation_speed: config.animation_speed,
            idle_orbit: config.idle_orbit,
            value_labels: config.value_labels,
            status: None,
        }
    }
}

/// Per-frame snapshot of the session the HUD displays.
#[derive(Debug, Clone, Default)]
pub struct HudInfo {
    pub title: String,
    pub bar_count: usize,
    pub hovered: Option<(String, f32)>,
    pub selected: Vec<(String, f32)>,
}

/// What the user asked for this frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct HudActions {
    pub reset_view: bool,
    pub export_png: bool,
    pub export_pdf: bool,
    pub speed_changed: bool,
    pub idle_orbit_toggled: bool,
    pub value_labels_toggled: bool,
}

/// Draws the chart panel and returns the requested actions.
pub fn draw_hud(ui: &Ui, info: &HudInfo, state: &mut HudState) -> HudActions {
    let mut actions = HudActions::default();
    if !state.visible {
        return actions;
    }

    ui.window("Chart")
        .size([280.0, 0.0], Condition::FirstUseEver)
        .position([16.0, 16.0], Condition::FirstUseEver)
        .build(|| {
            if !info.title.is_empty() {
                ui.text(&info.title);
                ui.separator();
            }
            ui.text(format!("{} bars", info.bar_count));
            match &info.hovered {
                Some((label, value)) => {
                    ui.text(format!("{label}: {}", format_value(*value)));
                }
                None => ui.text_disabled("hover a bar for details"),
            }
            if !info.selected.is_empty() {
                ui.separator();
                ui.text("selected");
                for (label, value) in &info.selected {
                    ui.bullet_text(format!("{label}: {}", format_value(*value)));
                }
            }

            ui.separator();
            if ui.slider("speed", 0.1, 2.0, &mut state.animation_speed) {
                actions.speed_changed = true;
            }
            if ui.checkbox("idle orbit", &mut state.idle_orbit) {
                actions.idle_orbit_toggled = true;
            }
            let mut always = matches!(state.value_labels, ValueLabelMode::Always);
            if ui.checkbox("always show values", &mut always) {
                state.value_labels = if always {
                    ValueLabelMode::Always
                } else {
                    ValueLabelMode::HoverOnly
                };
                actions.value_labels_toggled = true;
            }

            if ui.button("reset view") {
                actions.reset_view = true;
            }
            ui.same_line();
            if ui.button("export png") {
                actions.export_png = true;
            }
            ui.same_line();
            if ui.button("export pdf") {
                actions.export_pdf = true;
            }

            if let Some(status) = &state.status {
                ui.separator();
                ui.text_wrapped(status);
            }
        });

    actions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hud_state_mirrors_the_config() {
        let config = ChartConfig::default()
            .with_animation_speed(1.5)
            .with_idle_orbit(false)
            .with_value_labels(ValueLabelMode::Always);
        let state = HudState::from_config(&config);
        assert!(state.visible);
        assert!((state.animation_speed - 1.5).abs() < f32::EPSILON);
        assert!(!state.idle_orbit);
        assert_eq!(state.value_labels, ValueLabelMode::Always);
        assert!(state.status.is_none());
    }

    #[test]
    fn actions_default_to_no_requests() {
        let actions = HudActions::default();
        assert!(!actions.reset_view);
        assert!(!actions.export_png);
        assert!(!actions.export_pdf);
        assert!(!actions.speed_changed);
    }
}
