//! # Bar Animation State Machine
//!
//! Per-bar visual state lives in a flat array indexed by bar index and is
//! advanced by a pure step function each tick. The scene graph is a rendering
//! projection of this state, not the source of truth, which keeps the whole
//! animation testable without a GPU.
//!
//! Phases per bar: **Growing** (height eases toward the descriptor height,
//! monotonic) → **Steady** → **Pulsing** (while selected, a bounded sinusoid
//! modulates the steady height) → **Steady** on deselect. Hover drives a
//! separate eased emphasis value used for footprint scale-up, emissive
//! highlight, label visibility and particles.

use cgmath::Vector3;

use crate::data::BarDescriptor;

/// Fraction of the target height gained per 60 Hz frame at unit speed.
pub const GROWTH_RATE: f32 = 0.05;
/// Amplitude of the selection pulse, as a fraction of the steady height.
pub const PULSE_AMPLITUDE: f32 = 0.05;
/// Angular rate of the selection pulse in rad/s at unit speed.
pub const PULSE_RATE: f32 = 4.0;
/// Per 60 Hz frame lerp factor easing hover emphasis toward its target.
pub const HOVER_EASE: f32 = 0.1;
/// Footprint scale gain at full hover emphasis (1.0 → 1.2).
pub const HOVER_FOOTPRINT_GAIN: f32 = 0.2;
/// Emissive highlight strength at full hover emphasis.
pub const HOVER_EMISSIVE: f32 = 0.3;
/// Extra emissive lift while a bar is selected.
pub const SELECT_EMISSIVE: f32 = 0.2;
/// Below this remaining distance a growing bar snaps to its target.
pub const EASING_EPSILON: f32 = 1e-4;
/// Number of floating particles above a hovered bar.
pub const HOVER_PARTICLE_COUNT: usize = 5;

/// Reference frame length animations are normalized against.
const BASE_FRAME: f32 = 1.0 / 60.0;

/// Discrete phase of one bar's state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarPhase {
    Growing,
    Steady,
    Pulsing,
}

/// Mutable visual state of a single bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarVisual {
    /// Current height in world units; grows from 0 toward `target_scale`.
    pub current_scale: f32,
    /// Steady-state height, equal to the descriptor's normalized height.
    pub target_scale: f32,
    pub hovered: bool,
    pub selected: bool,
    /// Eased 0..1 hover feedback driving footprint/emissive/labels.
    pub hover_emphasis: f32,
    /// Phase of the selection pulse in radians; zero while deselected.
    pub pulse_phase: f32,
}

impl BarVisual {
    /// New bar at zero height so it grows in on the first frames.
    pub fn new(target_scale: f32) -> Self {
        Self {
            current_scale: 0.0,
            target_scale: target_scale.max(0.0),
            hovered: false,
            selected: false,
            hover_emphasis: 0.0,
            pulse_phase: 0.0,
        }
    }

    pub fn phase(&self) -> BarPhase {
        if self.current_scale < self.target_scale {
            BarPhase::Growing
        } else if self.selected {
            BarPhase::Pulsing
        } else {
            BarPhase::Steady
        }
    }

    /// Growth has finished; the pulse and hover feedback never block
    /// settling since they are bounded modulations of the steady height.
    pub fn is_settled(&self) -> bool {
        self.current_scale >= self.target_scale
    }

    /// Advances this bar by `dt` seconds at the given speed multiplier.
    ///
    /// Pure: returns the successor state. Growth is monotonic and clamps at
    /// the target without overshoot.
    pub fn step(mut self, dt: f32, speed: f32) -> Self {
        let frames = (dt / BASE_FRAME).max(0.0);

        if self.current_scale < self.target_scale {
            let advance = self.target_scale * speed * GROWTH_RATE * frames;
            let next = self.current_scale + advance;
            self.current_scale = if next >= self.target_scale - EASING_EPSILON {
                self.target_scale
            } else {
                next
            };
        }

        // Exponential ease keeps the per-frame lerp factor stable across
        // refresh rates: applying two half-frames equals one whole frame.
        let emphasis_target = if self.hovered { 1.0 } else { 0.0 };
        let blend = 1.0 - (1.0 - HOVER_EASE).powf(frames);
        self.hover_emphasis += (emphasis_target - self.hover_emphasis) * blend;
        self.hover_emphasis = self.hover_emphasis.clamp(0.0, 1.0);

        if self.selected {
            self.pulse_phase += dt * PULSE_RATE * speed;
        } else {
            self.pulse_phase = 0.0;
        }

        self
    }

    /// Height to render this frame: the eased height, modulated by the
    /// selection pulse. The pulse never alters `target_scale`.
    pub fn render_height(&self) -> f32 {
        if self.selected {
            self.current_scale * (1.0 + PULSE_AMPLITUDE * self.pulse_phase.sin())
        } else {
            self.current_scale
        }
    }

    /// Footprint multiplier from hover emphasis (1.0 when idle, up to 1.2).
    pub fn footprint_scale(&self) -> f32 {
        1.0 + HOVER_FOOTPRINT_GAIN * self.hover_emphasis
    }

    /// Emissive highlight strength from hover and selection.
    pub fn emissive(&self) -> f32 {
        let selected = if self.selected { SELECT_EMISSIVE } else { 0.0 };
        (HOVER_EMISSIVE * self.hover_emphasis + selected).min(1.0)
    }
}

/// Visual state for every bar of one session, in descriptor order.
#[derive(Debug, Clone, Default)]
pub struct AnimationState {
    bars: Vec<BarVisual>,
    clock: f32,
}

impl AnimationState {
    pub fn from_descriptors(descriptors: &[BarDescriptor]) -> Self {
        Self {
            bars: descriptors
                .iter()
                .map(|d| BarVisual::new(d.normalized_height))
                .collect(),
            clock: 0.0,
        }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn bars(&self) -> &[BarVisual] {
        &self.bars
    }

    pub fn bar(&self, index: usize) -> Option<&BarVisual> {
        self.bars.get(index)
    }

    /// Session-relative animation clock in seconds, used by particles.
    pub fn clock(&self) -> f32 {
        self.clock
    }

    /// Advances every bar by one step in index order.
    pub fn step_all(&mut self, dt: f32, speed: f32) {
        self.clock += dt;
        for bar in &mut self.bars {
            *bar = bar.step(dt, speed);
        }
    }

    /// All growth animations have finished.
    pub fn is_settled(&self) -> bool {
        self.bars.iter().all(BarVisual::is_settled)
    }

    /// Marks at most one bar as hovered; `None` clears hover everywhere.
    pub fn set_hovered(&mut self, index: Option<usize>) {
        for (i, bar) in self.bars.iter_mut().enumerate() {
            bar.hovered = Some(i) == index;
        }
    }

    pub fn hovered_index(&self) -> Option<usize> {
        self.bars.iter().position(|b| b.hovered)
    }

    /// Toggles the selection flag of one bar; selections are independent,
    /// so several bars can pulse at once.
    pub fn toggle_selected(&mut self, index: usize) {
        if let Some(bar) = self.bars.get_mut(index) {
            bar.selected = !bar.selected;
        }
    }

    pub fn selected_indices(&self) -> Vec<usize> {
        self.bars
            .iter()
            .enumerate()
            .filter(|(_, b)| b.selected)
            .map(|(i, _)| i)
            .collect()
    }
}

/// World positions for the ring of particles floating above a hovered bar.
///
/// Particles orbit slowly above the bar top and bob on individual offsets;
/// callers scale their size/alpha by the hover emphasis.
pub fn hover_particles(bar_top: Vector3<f32>, clock: f32) -> [Vector3<f32>; HOVER_PARTICLE_COUNT] {
    let mut positions = [bar_top; HOVER_PARTICLE_COUNT];
    for (i, p) in positions.iter_mut().enumerate() {
        let angle = i as f32 * std::f32::consts::TAU / HOVER_PARTICLE_COUNT as f32 + clock * 0.8;
        p.x += 0.6 * angle.cos();
        p.y += 0.6 * angle.sin();
        p.z += 0.5 + 0.25 * (clock * 2.0 + i as f32).sin();
    }
    positions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChartConfig;
    use crate::data::{map_dataset, Record};

    const DT: f32 = 1.0 / 60.0;

    fn grown(target: f32) -> BarVisual {
        let mut bar = BarVisual::new(target);
        for _ in 0..10_000 {
            bar = bar.step(DT, 1.0);
            if bar.is_settled() {
                break;
            }
        }
        bar
    }

    #[test]
    fn growth_is_monotonic_and_reaches_target_without_overshoot() {
        let mut bar = BarVisual::new(10.0);
        let mut previous = bar.current_scale;
        let mut steps = 0;
        while !bar.is_settled() {
            bar = bar.step(DT, 1.0);
            assert!(bar.current_scale >= previous);
            assert!(bar.current_scale <= bar.target_scale + EASING_EPSILON);
            previous = bar.current_scale;
            steps += 1;
            assert!(steps < 1000, "growth never settled");
        }
        assert_eq!(bar.current_scale, bar.target_scale);
        assert_eq!(bar.phase(), BarPhase::Steady);
    }

    #[test]
    fn zero_height_bar_settles_immediately() {
        let bar = BarVisual::new(0.0);
        assert!(bar.is_settled());
        assert_eq!(bar.phase(), BarPhase::Steady);
        assert_eq!(bar.step(DT, 1.0).current_scale, 0.0);
    }

    #[test]
    fn faster_speed_grows_faster() {
        let slow = BarVisual::new(10.0).step(DT, 0.5);
        let fast = BarVisual::new(10.0).step(DT, 2.0);
        assert!(fast.current_scale > slow.current_scale);
    }

    #[test]
    fn growth_rate_matches_definition() {
        let bar = BarVisual::new(10.0).step(DT, 1.0);
        // One 60 Hz frame at unit speed gains target * GROWTH_RATE.
        assert!((bar.current_scale - 10.0 * GROWTH_RATE).abs() < 1e-5);
    }

    #[test]
    fn split_frames_match_whole_frames_while_growing() {
        let whole = BarVisual::new(10.0).step(DT, 1.0);
        let halves = BarVisual::new(10.0).step(DT / 2.0, 1.0).step(DT / 2.0, 1.0);
        assert!((whole.current_scale - halves.current_scale).abs() < 1e-4);
        assert!((whole.hover_emphasis - halves.hover_emphasis).abs() < 1e-4);
    }

    #[test]
    fn selection_pulse_is_bounded_and_transient() {
        let mut bar = grown(8.0);
        bar.selected = true;
        let mut min = f32::MAX;
        let mut max = f32::MIN;
        for _ in 0..600 {
            bar = bar.step(DT, 1.0);
            assert_eq!(bar.phase(), BarPhase::Pulsing);
            min = min.min(bar.render_height());
            max = max.max(bar.render_height());
            // The pulse modulates rendering only.
            assert_eq!(bar.target_scale, 8.0);
            assert_eq!(bar.current_scale, 8.0);
        }
        assert!(max <= 8.0 * (1.0 + PULSE_AMPLITUDE) + 1e-4);
        assert!(min >= 8.0 * (1.0 - PULSE_AMPLITUDE) - 1e-4);
        assert!(max > 8.0 && min < 8.0, "pulse should actually oscillate");

        bar.selected = false;
        let bar = bar.step(DT, 1.0);
        assert_eq!(bar.phase(), BarPhase::Steady);
        assert_eq!(bar.render_height(), 8.0);
        assert_eq!(bar.pulse_phase, 0.0);
    }

    #[test]
    fn hover_emphasis_eases_in_and_out() {
        let mut bar = grown(5.0);
        bar.hovered = true;
        let mut previous = 0.0;
        for _ in 0..120 {
            bar = bar.step(DT, 1.0);
            assert!(bar.hover_emphasis >= previous);
            assert!(bar.hover_emphasis <= 1.0);
            previous = bar.hover_emphasis;
        }
        assert!(bar.hover_emphasis > 0.9);
        assert!(bar.footprint_scale() > 1.15);
        assert!(bar.emissive() > 0.25);

        bar.hovered = false;
        for _ in 0..120 {
            bar = bar.step(DT, 1.0);
        }
        assert!(bar.hover_emphasis < 0.05);
        assert!(bar.footprint_scale() < 1.02);
    }

    fn demo_state() -> AnimationState {
        let records = vec![
            Record::new().with_text("cat", "A").with_number("val", 10.0),
            Record::new().with_text("cat", "B").with_number("val", 20.0),
            Record::new().with_text("cat", "C").with_number("val", 5.0),
        ];
        let bars = map_dataset(&records, "cat", "val", &ChartConfig::default()).unwrap();
        AnimationState::from_descriptors(&bars)
    }

    #[test]
    fn state_array_tracks_descriptor_order_and_settles() {
        let mut state = demo_state();
        assert_eq!(state.len(), 3);
        assert!(!state.is_settled());
        assert!((state.bars()[1].target_scale - 10.0).abs() < 1e-5);

        for _ in 0..1000 {
            state.step_all(DT, 0.5);
            if state.is_settled() {
                break;
            }
        }
        assert!(state.is_settled());
    }

    #[test]
    fn hover_is_exclusive_and_clearable() {
        let mut state = demo_state();
        state.set_hovered(Some(1));
        assert_eq!(state.hovered_index(), Some(1));
        assert!(!state.bars()[0].hovered && !state.bars()[2].hovered);

        state.set_hovered(Some(2));
        assert_eq!(state.hovered_index(), Some(2));
        assert!(!state.bars()[1].hovered);

        state.set_hovered(None);
        assert_eq!(state.hovered_index(), None);
    }

    #[test]
    fn selections_toggle_independently() {
        let mut state = demo_state();
        state.toggle_selected(0);
        state.toggle_selected(2);
        assert_eq!(state.selected_indices(), vec![0, 2]);
        state.toggle_selected(0);
        assert_eq!(state.selected_indices(), vec![2]);
        // Out-of-range toggles are ignored.
        state.toggle_selected(99);
        assert_eq!(state.selected_indices(), vec![2]);
    }

    #[test]
    fn hover_particles_ring_the_bar_top() {
        let top = Vector3::new(2.0, 0.0, 6.0);
        let ring = hover_particles(top, 1.25);
        assert_eq!(ring.len(), HOVER_PARTICLE_COUNT);
        for p in &ring {
            let dx = p.x - top.x;
            let dy = p.y - top.y;
            assert!((dx * dx + dy * dy).sqrt() <= 0.61);
            assert!(p.z > top.z, "particles float above the bar");
        }
        // Ring rotates over time.
        let later = hover_particles(top, 2.0);
        assert_ne!(ring[0], later[0]);
    }
}
