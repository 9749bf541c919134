use super::camera_utils::{convert_matrix4_to_array, Camera, CameraUniform};
use cgmath::*;

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: cgmath::Matrix4<f32> = cgmath::Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.5,
    0.0, 0.0, 0.0, 1.0,
);

/// Orbit camera aimed at the bar field, Z-up.
///
/// Position is spherical around `target`: yaw spins in the ground plane,
/// pitch lifts above it, distance zooms. Bounds keep the view sensible for a
/// chart (never below the ground plane, zoom clamped).
#[derive(Debug, Clone, Copy)]
pub struct OrbitCamera {
    pub distance: f32,
    pub pitch: f32,
    pub yaw: f32,
    pub eye: Vector3<f32>,
    pub target: Vector3<f32>,
    pub up: Vector3<f32>,
    pub bounds: OrbitCameraBounds,
    pub aspect: f32,
    pub fovy: Rad<f32>,
    pub znear: f32,
    pub zfar: f32,
    pub uniform: CameraUniform,
    home: CameraHome,
}

/// Pose restored by `reset_to_home`, captured when the session frames the
/// bar field.
#[derive(Debug, Clone, Copy)]
struct CameraHome {
    distance: f32,
    pitch: f32,
    yaw: f32,
    target: Vector3<f32>,
}

impl Camera for OrbitCamera {
    fn build_view_projection_matrix(&self) -> Matrix4<f32> {
        let eye = Point3::from_vec(self.eye);
        let target = Point3::from_vec(self.target);
        let view = Matrix4::look_at_rh(eye, target, self.up);
        let proj =
            OPENGL_TO_WGPU_MATRIX * perspective(self.fovy, self.aspect, self.znear, self.zfar);
        proj * view
    }
}

impl OrbitCamera {
    pub fn new(distance: f32, pitch: f32, yaw: f32, target: Vector3<f32>, aspect: f32) -> Self {
        let bounds = OrbitCameraBounds::default();
        let mut camera = Self {
            distance: distance.clamp(
                bounds.min_distance.unwrap_or(f32::EPSILON),
                bounds.max_distance.unwrap_or(f32::MAX),
            ),
            pitch: pitch.clamp(bounds.min_pitch, bounds.max_pitch),
            yaw,
            eye: Vector3::zero(), // Recalculated in `update()`.
            target,
            up: Vector3::unit_z(),
            bounds,
            aspect,
            fovy: Rad::from(Deg(60.0)),
            znear: 0.1,
            zfar: 1000.0,
            uniform: CameraUniform::default(),
            home: CameraHome {
                distance,
                pitch,
                yaw,
                target,
            },
        };
        camera.update();
        camera.update_view_proj();
        camera
    }

    /// Stores the current pose as the home view.
    pub fn set_home(&mut self) {
        self.home = CameraHome {
            distance: self.distance,
            pitch: self.pitch,
            yaw: self.yaw,
            target: self.target,
        };
    }

    /// Returns to the pose captured by `set_home`.
    pub fn reset_to_home(&mut self) {
        self.distance = self.home.distance;
        self.pitch = self.home.pitch;
        self.yaw = self.home.yaw;
        self.target = self.home.target;
        self.update();
    }

    /// Zooms so a field of the given half-extent fits the vertical fov with
    /// some margin, within the distance bounds.
    pub fn frame_extent(&mut self, half_extent: f32) {
        let fit = half_extent / (self.fovy.0 / 2.0).tan();
        self.set_distance(fit * 1.2);
        self.set_home();
    }

    pub fn set_distance(&mut self, distance: f32) {
        self.distance = distance.clamp(
            self.bounds.min_distance.unwrap_or(f32::EPSILON),
            self.bounds.max_distance.unwrap_or(f32::MAX),
        );
        self.update();
    }

    pub fn add_distance(&mut self, delta: f32) {
        let corrected_zoom = f32::log10(self.distance) * delta;
        self.set_distance(self.distance + corrected_zoom);
    }

    pub fn set_pitch(&mut self, pitch: f32) {
        self.pitch = pitch.clamp(self.bounds.min_pitch, self.bounds.max_pitch);
        self.update();
    }

    pub fn add_pitch(&mut self, delta: f32) {
        self.set_pitch(self.pitch + delta);
    }

    pub fn set_yaw(&mut self, yaw: f32) {
        let mut bounded_yaw = yaw;
        if let Some(min_yaw) = self.bounds.min_yaw {
            bounded_yaw = bounded_yaw.max(min_yaw);
        }
        if let Some(max_yaw) = self.bounds.max_yaw {
            bounded_yaw = bounded_yaw.min(max_yaw);
        }
        self.yaw = bounded_yaw;
        self.update();
    }

    pub fn add_yaw(&mut self, delta: f32) {
        self.set_yaw(self.yaw + delta);
    }

    /// Pans the focus point relative to the current view direction.
    /// delta.0 = horizontal (left/right), delta.1 = vertical (up/down).
    pub fn pan(&mut self, delta: (f32, f32)) {
        let forward = (self.target - self.eye).normalize();
        let right = forward.cross(self.up).normalize();
        let up = right.cross(forward).normalize();

        // Scale by distance for a consistent feel at every zoom level.
        let pan_scale = self.distance * 0.1;
        let movement = right * delta.0 * pan_scale + up * delta.1 * pan_scale;

        self.eye += movement;
        self.target += movement;
    }

    /// Updates the eye after changing `distance`, `pitch` or `yaw`.
    fn update(&mut self) {
        self.eye = calculate_cartesian_eye_position(self.pitch, self.yaw, self.distance, self.target);
    }

    pub fn resize_projection(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.aspect = width as f32 / height as f32;
    }

    pub fn update_view_proj(&mut self) {
        self.uniform.view_position = [self.eye.x, self.eye.y, self.eye.z, 1.0];
        self.uniform.view_proj = convert_matrix4_to_array(self.build_view_projection_matrix());
    }
}

#[derive(Debug, Clone, Copy)]
pub struct OrbitCameraBounds {
    pub min_distance: Option<f32>,
    pub max_distance: Option<f32>,
    pub min_pitch: f32,
    pub max_pitch: f32,
    pub min_yaw: Option<f32>,
    pub max_yaw: Option<f32>,
}

impl Default for OrbitCameraBounds {
    /// Chart viewing bounds: zoom 5..25, pitch kept above the ground plane.
    fn default() -> Self {
        Self {
            min_distance: Some(5.0),
            max_distance: Some(25.0),
            min_pitch: 0.02,
            max_pitch: std::f32::consts::FRAC_PI_2 - 0.02,
            min_yaw: None,
            max_yaw: None,
        }
    }
}

/// Spherical to Cartesian for a Z-up world: yaw spins in the XY ground
/// plane, pitch lifts toward +Z.
fn calculate_cartesian_eye_position(
    pitch: f32,
    yaw: f32,
    distance: f32,
    target: Vector3<f32>,
) -> Vector3<f32> {
    Vector3::new(
        distance * yaw.sin() * pitch.cos(),
        distance * yaw.cos() * pitch.cos(),
        distance * pitch.sin(),
    ) + target
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chart_camera() -> OrbitCamera {
        OrbitCamera::new(18.0, 0.6, 0.8, Vector3::new(0.0, 0.0, 2.5), 1.5)
    }

    #[test]
    fn distance_clamps_to_bounds() {
        let mut camera = chart_camera();
        camera.set_distance(100.0);
        assert_eq!(camera.distance, 25.0);
        camera.set_distance(1.0);
        assert_eq!(camera.distance, 5.0);
    }

    #[test]
    fn pitch_never_goes_below_the_ground_plane() {
        let mut camera = chart_camera();
        camera.set_pitch(-1.0);
        assert!(camera.pitch >= 0.0);
        assert!(camera.eye.z >= camera.target.z);

        camera.set_pitch(3.0);
        assert!(camera.pitch < std::f32::consts::FRAC_PI_2);
    }

    #[test]
    fn eye_stays_on_the_orbit_sphere() {
        let mut camera = chart_camera();
        for yaw in [0.0f32, 0.7, 1.9, 4.2] {
            camera.set_yaw(yaw);
            let radius = (camera.eye - camera.target).magnitude();
            assert!((radius - camera.distance).abs() < 1e-4);
        }
    }

    #[test]
    fn resize_updates_aspect_and_ignores_zero_sizes() {
        let mut camera = chart_camera();
        camera.resize_projection(1920, 1080);
        assert!((camera.aspect - 1920.0 / 1080.0).abs() < 1e-6);

        camera.resize_projection(0, 400);
        assert!((camera.aspect - 1920.0 / 1080.0).abs() < 1e-6);
    }

    #[test]
    fn reset_returns_to_home_pose() {
        let mut camera = chart_camera();
        let home_eye = camera.eye;
        camera.add_yaw(1.3);
        camera.add_pitch(0.2);
        camera.set_distance(7.0);
        assert!((camera.eye - home_eye).magnitude() > 0.1);

        camera.reset_to_home();
        assert!((camera.eye - home_eye).magnitude() < 1e-4);
    }

    #[test]
    fn view_projection_puts_the_target_at_screen_center() {
        let mut camera = chart_camera();
        camera.update_view_proj();
        let vp = camera.build_view_projection_matrix();
        let clip = vp * Vector4::new(camera.target.x, camera.target.y, camera.target.z, 1.0);
        assert!(clip.w > 0.0);
        assert!((clip.x / clip.w).abs() < 1e-4);
        assert!((clip.y / clip.w).abs() < 1e-4);
    }
}
