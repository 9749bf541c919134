//! Application shell: a winit event loop hosting one chart session.
//!
//! [`ChartApp`] owns the window, the [`SceneSession`] and the imgui overlay,
//! and runs the fixed per-frame order on every redraw: controls damping, bar
//! animation, the 3D pass, then the overlay pass. Pointer events are
//! translated to normalized device coordinates here; everything below this
//! layer works on NDC, camera and extents only.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use log::{error, info, warn};
use winit::{
    application::ApplicationHandler,
    dpi::{LogicalSize, PhysicalSize},
    event::{ElementState, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowAttributes},
};

use crate::capture::{self, ExportFormat};
use crate::config::ChartConfig;
use crate::data::Record;
use crate::error::ChartError;
use crate::gfx::picking::screen_to_ndc;
use crate::gfx::scene::SceneSession;
use crate::overlay;
use crate::ui::{draw_hud, HudActions, HudInfo, HudState, UiManager};

/// Extra HUD content supplied by the host, drawn after the built-in panel.
pub type UiCallback = Box<dyn Fn(&imgui::Ui) + Send + Sync>;

/// Press and release within this pixel distance toggle a selection; anything
/// further is an orbit drag.
const CLICK_TOLERANCE: f64 = 4.0;

/// A windowed chart application.
///
/// ```no_run
/// use cairn::config::ChartConfig;
/// use cairn::data::Record;
///
/// let rows = vec![
///     Record::new().with_text("month", "Jan").with_number("sales", 120.0),
///     Record::new().with_text("month", "Feb").with_number("sales", 90.0),
/// ];
/// let app = cairn::chart(&rows, "month", "sales", ChartConfig::default()).unwrap();
/// app.run();
/// ```
pub struct ChartApp {
    event_loop: Option<EventLoop<()>>,
    state: AppState,
}

struct AppState {
    window: Option<Arc<Window>>,
    session: SceneSession,
    ui: Option<UiManager>,
    hud: HudState,
    ui_callback: Option<UiCallback>,
    /// Last pointer position in window pixels.
    cursor: Option<(f64, f64)>,
    /// Pointer position at left-button press, for click-vs-drag.
    press: Option<(f64, f64)>,
    last_frame: Instant,
    export_dir: PathBuf,
}

impl ChartApp {
    /// Validates the dataset and builds the application. The window and GPU
    /// surface are created lazily when the event loop starts.
    pub fn new(
        records: &[Record],
        category_field: &str,
        value_field: &str,
        config: ChartConfig,
    ) -> Result<Self, ChartError> {
        let hud = HudState::from_config(&config);
        let session = SceneSession::from_records(records, category_field, value_field, config)?;
        let event_loop = EventLoop::new().map_err(|err| {
            error!("failed to create event loop: {err}");
            ChartError::MountUnavailable
        })?;

        Ok(Self {
            event_loop: Some(event_loop),
            state: AppState {
                window: None,
                session,
                ui: None,
                hud,
                ui_callback: None,
                cursor: None,
                press: None,
                last_frame: Instant::now(),
                export_dir: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            },
        })
    }

    /// Directory exported files are written into; defaults to the working
    /// directory.
    pub fn with_export_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.state.export_dir = dir.into();
        self
    }

    /// Registers host UI drawn after the built-in panel each frame.
    pub fn set_ui<F>(&mut self, ui_fn: F)
    where
        F: Fn(&imgui::Ui) + Send + Sync + 'static,
    {
        self.state.ui_callback = Some(Box::new(ui_fn));
    }

    pub fn session(&self) -> &SceneSession {
        &self.state.session
    }

    /// Runs the event loop until the window closes. Consumes the app.
    pub fn run(mut self) {
        let event_loop = self.event_loop.take().expect("event loop already consumed");
        event_loop.set_control_flow(ControlFlow::Poll);
        if let Err(err) = event_loop.run_app(&mut self.state) {
            error!("event loop terminated abnormally: {err}");
        }
    }
}

impl AppState {
    fn pointer_ndc(&self, window: &Window) -> Option<(f32, f32)> {
        let (x, y) = self.cursor?;
        let size = window.inner_size();
        Some(screen_to_ndc(
            (x as f32, y as f32),
            (size.width as f32, size.height as f32),
        ))
    }

    fn hud_info(&self) -> HudInfo {
        let descriptors = self.session.descriptors();
        let hovered = self
            .session
            .hovered_index()
            .and_then(|i| descriptors.get(i))
            .map(|d| (d.category_label.clone(), d.value));
        let selected = self
            .session
            .selected_indices()
            .into_iter()
            .filter_map(|i| descriptors.get(i))
            .map(|d| (d.category_label.clone(), d.value))
            .collect();
        HudInfo {
            title: self.session.config().title.clone(),
            bar_count: descriptors.len(),
            hovered,
            selected,
        }
    }

    fn redraw(&mut self, window: &Arc<Window>) {
        let now = Instant::now();
        // Clamp so a stall (window drag, debugger) does not teleport the
        // animation.
        let dt = (now - self.last_frame).as_secs_f32().min(0.1);
        self.last_frame = now;

        // Fixed frame order: controls, animation step, 3D pass, overlay.
        self.session.advance(dt);

        let size = window.inner_size();
        let viewport = (size.width as f32, size.height as f32);
        let labels =
            overlay::layout_labels(&self.session, &self.session.view_projection(), viewport);
        let info = self.hud_info();

        let mut actions = HudActions::default();
        let result = match self.ui.as_mut() {
            Some(ui_manager) => {
                let hud = &mut self.hud;
                let ui_callback = &self.ui_callback;
                let actions_out = &mut actions;
                let window_ref = window.clone();
                self.session.render(Some(
                    move |device: &wgpu::Device,
                          queue: &wgpu::Queue,
                          encoder: &mut wgpu::CommandEncoder,
                          view: &wgpu::TextureView| {
                        ui_manager.draw(device, queue, encoder, &window_ref, view, |ui| {
                            overlay::draw_labels(ui, &labels);
                            *actions_out = draw_hud(ui, &info, hud);
                            if let Some(callback) = ui_callback {
                                callback(ui);
                            }
                        });
                    },
                ))
            }
            None => self.session.render(
                None::<fn(&wgpu::Device, &wgpu::Queue, &mut wgpu::CommandEncoder, &wgpu::TextureView)>,
            ),
        };
        if let Err(err) = result {
            warn!("frame skipped: {err}");
            return;
        }

        self.apply_hud_actions(actions);
    }

    fn apply_hud_actions(&mut self, actions: HudActions) {
        if actions.speed_changed {
            self.session.set_animation_speed(self.hud.animation_speed);
        }
        if actions.idle_orbit_toggled {
            self.session.set_idle_orbit(self.hud.idle_orbit);
        }
        if actions.value_labels_toggled {
            self.session.set_value_labels(self.hud.value_labels);
        }
        if actions.reset_view {
            self.session.reset_view();
        }
        if actions.export_png {
            self.export(ExportFormat::Png);
        }
        if actions.export_pdf {
            self.export(ExportFormat::Pdf);
        }
    }

    /// Pointer update while the HUD has captured the event: the position is
    /// still tracked, but no bar can be hovered or clicked through the panel.
    fn pointer_over_ui(&mut self, position: (f64, f64)) {
        self.cursor = Some(position);
        self.press = None;
        self.session.clear_hover();
    }

    fn export(&mut self, format: ExportFormat) {
        let size = self
            .session
            .engine()
            .map(|engine| engine.get_surface_size())
            .unwrap_or(capture::DEFAULT_CAPTURE_SIZE);
        match capture::export_frame(&mut self.session, &self.export_dir, format, size) {
            Ok(path) => {
                info!("chart exported to {}", path.display());
                self.hud.status = Some(format!("saved {}", path.display()));
            }
            Err(err) => {
                error!("export failed: {err}");
                self.hud.status = Some(format!("export failed: {err}"));
            }
        }
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let title = if self.session.config().title.is_empty() {
            "cairn".to_owned()
        } else {
            self.session.config().title.clone()
        };
        let attributes = WindowAttributes::default()
            .with_title(title)
            .with_inner_size(LogicalSize::new(1200, 800));
        let Ok(window) = event_loop.create_window(attributes) else {
            warn!("window creation failed, nothing to mount");
            return;
        };

        let window = Arc::new(window);
        let (width, height) = window.inner_size().into();
        match self.session.mount(window.clone(), width, height) {
            Ok(()) => {
                if let Some(engine) = self.session.engine() {
                    self.ui = Some(UiManager::new(
                        engine.device(),
                        engine.queue(),
                        engine.surface_format(),
                        &window,
                    ));
                }
                self.window = Some(window);
                self.last_frame = Instant::now();
            }
            // Per the lifecycle contract a failed mount is a logged no-op;
            // the session stays valid for a later retry.
            Err(err) => warn!("mount unavailable: {err}"),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let Some(window) = self.window.clone() else {
            return;
        };

        if let Some(ui_manager) = self.ui.as_mut() {
            let ui_event: winit::event::Event<()> = winit::event::Event::WindowEvent {
                window_id,
                event: event.clone(),
            };
            if ui_manager.handle_input(&window, &ui_event) {
                // The HUD owns the pointer now; keep tracking it so hover
                // state does not stick to the last bar under the panel.
                match &event {
                    WindowEvent::CursorMoved { position, .. } => {
                        self.pointer_over_ui((position.x, position.y));
                    }
                    WindowEvent::CursorLeft { .. } => {
                        self.cursor = None;
                        self.session.clear_hover();
                    }
                    _ => (),
                }
                window.request_redraw();
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                self.session.unmount();
                event_loop.exit();
            }
            WindowEvent::KeyboardInput {
                event: key_event, ..
            } => {
                if key_event.state == ElementState::Pressed
                    && key_event.physical_key == PhysicalKey::Code(KeyCode::Escape)
                {
                    self.session.unmount();
                    event_loop.exit();
                    return;
                }
                self.session.handle_keyboard_event(&key_event);
            }
            WindowEvent::Resized(PhysicalSize { width, height }) => {
                self.session.resize(width, height);
                if let Some(ui_manager) = self.ui.as_mut() {
                    ui_manager.update_display_size(width, height);
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = Some((position.x, position.y));
                if let Some(ndc) = self.pointer_ndc(&window) {
                    self.session.update_hover(ndc);
                }
            }
            WindowEvent::CursorLeft { .. } => {
                self.cursor = None;
                self.session.clear_hover();
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => match state {
                ElementState::Pressed => self.press = self.cursor,
                ElementState::Released => {
                    if let (Some((px, py)), Some((cx, cy))) = (self.press, self.cursor) {
                        let travel = ((cx - px).powi(2) + (cy - py).powi(2)).sqrt();
                        if travel <= CLICK_TOLERANCE {
                            if let Some(ndc) = self.pointer_ndc(&window) {
                                self.session.click(ndc);
                            }
                        }
                    }
                    self.press = None;
                }
            },
            WindowEvent::RedrawRequested => self.redraw(&window),
            _ => (),
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: winit::event::DeviceId,
        event: winit::event::DeviceEvent,
    ) {
        let Some(window) = self.window.as_ref() else {
            return;
        };
        if self.ui.as_ref().is_some_and(UiManager::wants_input) {
            return;
        }
        self.session.handle_device_event(&event, window);
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        // Unmount is idempotent; this covers exits that skip CloseRequested.
        self.session.unmount();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Vector3;

    fn state(values: &[f64]) -> AppState {
        let records: Vec<Record> = values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                Record::new()
                    .with_text("month", format!("M{i}"))
                    .with_number("sales", *v)
            })
            .collect();
        let config = ChartConfig::default();
        let hud = HudState::from_config(&config);
        let session = SceneSession::from_records(&records, "month", "sales", config).unwrap();
        AppState {
            window: None,
            session,
            ui: None,
            hud,
            ui_callback: None,
            cursor: None,
            press: None,
            last_frame: Instant::now(),
            export_dir: PathBuf::from("."),
        }
    }

    /// NDC of a bar's mid-height center under the live projection.
    fn bar_ndc(session: &SceneSession, index: usize) -> (f32, f32) {
        let descriptor = &session.descriptors()[index];
        let height = session.animation().bars()[index].render_height();
        let center = descriptor.world_position + Vector3::new(0.0, 0.0, height * 0.5);
        let clip = session.view_projection() * center.extend(1.0);
        assert!(clip.w > 0.0, "bar behind the camera");
        (clip.x / clip.w, clip.y / clip.w)
    }

    #[test]
    fn pointer_captured_by_the_hud_clears_hover_but_keeps_tracking() {
        let mut state = state(&[10.0, 20.0, 5.0]);
        for _ in 0..400 {
            state.session.advance(1.0 / 60.0);
            if state.session.is_settled() {
                break;
            }
        }

        state.session.update_hover(bar_ndc(&state.session, 1));
        assert_eq!(state.session.hovered_index(), Some(1));
        state.press = Some((100.0, 100.0));

        state.pointer_over_ui((40.0, 40.0));
        assert_eq!(state.session.hovered_index(), None);
        assert_eq!(state.cursor, Some((40.0, 40.0)));
        assert!(state.press.is_none(), "a press cannot survive into the panel");
    }
}
