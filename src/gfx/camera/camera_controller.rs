use winit::{
    dpi::PhysicalPosition,
    event::{DeviceEvent, ElementState, KeyEvent, MouseScrollDelta},
    keyboard::{KeyCode, PhysicalKey},
    window::Window,
};

use super::orbit_camera::OrbitCamera;

const BASE_FRAME: f32 = 1.0 / 60.0;

/// Damped orbit input plus the idle auto-orbit.
///
/// Drag input accumulates into yaw/pitch velocities that are applied and
/// decayed each frame, so rotation glides to a stop after release instead of
/// snapping. While the user is idle the camera drifts around the chart at
/// `auto_orbit_rate` (scaled by the chart's animation speed).
#[derive(Debug)]
pub struct CameraController {
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    /// Per-frame velocity fraction shed while gliding.
    pub damping: f32,
    pub auto_orbit: bool,
    /// Idle orbit rate in rad/s at unit animation speed.
    pub auto_orbit_rate: f32,
    yaw_velocity: f32,
    pitch_velocity: f32,
    is_mouse_pressed: bool,
    is_shift_held: bool,
}

impl CameraController {
    pub fn new(rotate_speed: f32, zoom_speed: f32) -> Self {
        Self {
            rotate_speed,
            zoom_speed,
            pan_speed: 0.01,
            damping: 0.05,
            auto_orbit: true,
            auto_orbit_rate: 0.5,
            yaw_velocity: 0.0,
            pitch_velocity: 0.0,
            is_mouse_pressed: false,
            is_shift_held: false,
        }
    }

    pub fn process_events(
        &mut self,
        event: &DeviceEvent,
        window: &Window,
        camera: &mut OrbitCamera,
    ) {
        match event {
            DeviceEvent::Button {
                button: 0, // Left Mouse Button
                state,
            } => {
                self.is_mouse_pressed = *state == ElementState::Pressed;
            }
            DeviceEvent::MouseWheel { delta, .. } => {
                let scroll_amount = -match delta {
                    MouseScrollDelta::LineDelta(_, scroll) => *scroll,
                    MouseScrollDelta::PixelDelta(PhysicalPosition { y: scroll, .. }) => {
                        *scroll as f32
                    }
                };
                camera.add_distance(scroll_amount * self.zoom_speed);
                window.request_redraw();
            }
            DeviceEvent::MouseMotion { delta } => {
                if self.is_mouse_pressed {
                    if self.is_shift_held {
                        // SHIFT + DRAG = PAN (move focus point)
                        camera.pan((
                            -delta.0 as f32 * self.pan_speed,
                            delta.1 as f32 * self.pan_speed,
                        ));
                    } else {
                        // NORMAL DRAG = ROTATE, fed through the damped velocity
                        self.yaw_velocity -= delta.0 as f32 * self.rotate_speed;
                        self.pitch_velocity += delta.1 as f32 * self.rotate_speed;
                    }
                    window.request_redraw();
                }
            }
            _ => (),
        }
    }

    pub fn process_keyed_events(&mut self, event: &KeyEvent, camera: &mut OrbitCamera) {
        match event {
            KeyEvent {
                physical_key: PhysicalKey::Code(KeyCode::ShiftLeft | KeyCode::ShiftRight),
                state,
                ..
            } => {
                self.is_shift_held = *state == ElementState::Pressed;
            }
            KeyEvent {
                physical_key: PhysicalKey::Code(KeyCode::KeyC),
                state: ElementState::Pressed,
                ..
            } => {
                // Shift+C returns to the framed home view.
                if self.is_shift_held {
                    camera.reset_to_home();
                    self.yaw_velocity = 0.0;
                    self.pitch_velocity = 0.0;
                }
            }
            _ => (),
        }
    }

    /// Per-frame controls step: applies damped drag velocities, then the
    /// idle orbit when the user is hands-off. Runs before the animation step
    /// in the frame order.
    pub fn update(&mut self, dt: f32, speed: f32, camera: &mut OrbitCamera) {
        let frames = (dt / BASE_FRAME).max(0.0);

        if self.yaw_velocity.abs() > 1e-6 || self.pitch_velocity.abs() > 1e-6 {
            camera.add_yaw(self.yaw_velocity * frames);
            camera.add_pitch(self.pitch_velocity * frames);

            let retain = (1.0 - self.damping).powf(frames);
            self.yaw_velocity *= retain;
            self.pitch_velocity *= retain;
            if self.yaw_velocity.abs() < 1e-6 {
                self.yaw_velocity = 0.0;
            }
            if self.pitch_velocity.abs() < 1e-6 {
                self.pitch_velocity = 0.0;
            }
        } else if self.auto_orbit && !self.is_mouse_pressed {
            camera.add_yaw(self.auto_orbit_rate * speed * dt);
        }
    }

    /// True while a drag is in progress (suspends the idle orbit).
    pub fn is_user_interacting(&self) -> bool {
        self.is_mouse_pressed
    }

    pub fn is_panning(&self) -> bool {
        self.is_mouse_pressed && self.is_shift_held
    }

    pub fn set_pan_speed(&mut self, speed: f32) {
        self.pan_speed = speed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Vector3;

    const DT: f32 = 1.0 / 60.0;

    fn camera() -> OrbitCamera {
        OrbitCamera::new(18.0, 0.6, 0.8, Vector3::new(0.0, 0.0, 2.5), 1.5)
    }

    #[test]
    fn idle_orbit_advances_yaw_at_the_configured_rate() {
        let mut controller = CameraController::new(0.005, 0.1);
        let mut cam = camera();
        let yaw0 = cam.yaw;
        // One second of idle frames at speed 0.5.
        for _ in 0..60 {
            controller.update(DT, 0.5, &mut cam);
        }
        let swept = cam.yaw - yaw0;
        assert!((swept - 0.25).abs() < 1e-3, "swept {swept}");
    }

    #[test]
    fn idle_orbit_can_be_disabled() {
        let mut controller = CameraController::new(0.005, 0.1);
        controller.auto_orbit = false;
        let mut cam = camera();
        let yaw0 = cam.yaw;
        for _ in 0..60 {
            controller.update(DT, 1.0, &mut cam);
        }
        assert_eq!(cam.yaw, yaw0);
    }

    #[test]
    fn drag_velocity_decays_to_rest() {
        let mut controller = CameraController::new(0.005, 0.1);
        let mut cam = camera();
        controller.yaw_velocity = 0.1;

        let mut last_yaw = cam.yaw;
        let mut step_sizes = Vec::new();
        for _ in 0..400 {
            controller.update(DT, 1.0, &mut cam);
            step_sizes.push(cam.yaw - last_yaw);
            last_yaw = cam.yaw;
        }
        assert_eq!(controller.yaw_velocity, 0.0, "glide should stop");
        // Glide shrinks monotonically while active.
        assert!(step_sizes[0] > step_sizes[1]);
        assert!(step_sizes[1] > step_sizes[2]);
    }
}
