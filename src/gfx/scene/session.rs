//! One chart scene from mount to unmount.
//!
//! A [`SceneSession`] exclusively owns everything a rendered chart needs:
//! the mapped descriptors, the animation state array, the camera and its
//! controls, and (while mounted) the render engine plus the GPU buffers
//! derived from the descriptors. Nothing chart-related lives in globals, so
//! two sessions can coexist and dropping one cannot touch the other.
//!
//! The session also keeps the [`ResourceLedger`] that lifecycle tests check:
//! every logical scene object (one per bar, plus the ground/grid/axes
//! furniture) is recorded when built and recorded again when disposed by
//! `rebuild` or `unmount`.

use cgmath::{Matrix4, SquareMatrix, Vector3};
use log::{debug, info, warn};
use winit::{
    event::{DeviceEvent, KeyEvent},
    window::Window,
};

use super::ledger::ResourceLedger;
use crate::animation::{hover_particles, AnimationState, HOVER_PARTICLE_COUNT};
use crate::config::{ChartConfig, Color};
use crate::data::{map_dataset, BarDescriptor, Record, HEIGHT_SCALE};
use crate::error::ChartError;
use crate::gfx::camera::camera_utils::Camera;
use crate::gfx::camera::{CameraController, CameraManager, OrbitCamera};
use crate::gfx::geometry::{
    generate_axis_lines, generate_bar_box, generate_grid_lines, generate_ground_plane,
};
use crate::gfx::picking::{bar_extent, pick_nearest, pointer_ray, Aabb};
use crate::gfx::rendering::{BarInstance, ChartDraw, GpuMesh, RenderEngine};

/// Logical furniture objects built alongside the bars: ground plane, grid
/// lines, axis lines.
const FURNITURE_OBJECTS: usize = 3;

/// Visual thickness of a zero-height bar so flat bars stay visible.
const FLAT_BAR_THICKNESS: f32 = 0.02;

/// Edge of a hover particle cube at full emphasis.
const PARTICLE_SCALE: f32 = 0.12;

/// Peak alpha of hover particles; scaled down by the eased emphasis.
const PARTICLE_ALPHA: f32 = 0.7;

const GROUND_COLOR: Color = Color::rgb(0.88, 0.89, 0.9);

/// GPU-side scene content, rebuilt whenever the descriptors change and
/// dropped wholesale on unmount.
#[derive(Debug)]
struct SceneGpuResources {
    bar_mesh: GpuMesh,
    ground_mesh: GpuMesh,
    instance_buffer: wgpu::Buffer,
    ground_instance_buffer: wgpu::Buffer,
    line_buffer: wgpu::Buffer,
    line_vertex_count: u32,
}

/// A single chart scene and its full lifecycle.
#[derive(Debug)]
pub struct SceneSession {
    descriptors: Vec<BarDescriptor>,
    config: ChartConfig,
    category_field: String,
    value_field: String,
    animation: AnimationState,
    camera: CameraManager,
    engine: Option<RenderEngine>,
    gpu: Option<SceneGpuResources>,
    ledger: ResourceLedger,
    /// Live logical objects, zeroed on release so disposal is idempotent.
    content_objects: usize,
}

impl SceneSession {
    /// Builds a session directly from mapped descriptors.
    pub fn new(descriptors: Vec<BarDescriptor>, config: ChartConfig) -> Self {
        let animation = AnimationState::from_descriptors(&descriptors);
        let camera = Self::build_camera(&descriptors, &config);
        let mut session = Self {
            descriptors,
            config,
            category_field: "category".to_owned(),
            value_field: "value".to_owned(),
            animation,
            camera,
            engine: None,
            gpu: None,
            ledger: ResourceLedger::default(),
            content_objects: 0,
        };
        session.adopt_content();
        session
    }

    /// Maps the records and builds a session, remembering the field names
    /// for the axis titles.
    pub fn from_records(
        records: &[Record],
        category_field: &str,
        value_field: &str,
        config: ChartConfig,
    ) -> Result<Self, ChartError> {
        let descriptors = map_dataset(records, category_field, value_field, &config)?;
        let mut session = Self::new(descriptors, config);
        session.category_field = category_field.to_owned();
        session.value_field = value_field.to_owned();
        Ok(session)
    }

    /// Attaches the session to a window surface.
    ///
    /// On failure nothing is mounted and the session stays usable, so the
    /// caller can retry once a real surface exists. Mounting twice is a
    /// logged no-op.
    pub fn mount(
        &mut self,
        target: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
    ) -> Result<(), ChartError> {
        if self.engine.is_some() {
            warn!("mount requested while already mounted, keeping the live renderer");
            return Ok(());
        }
        let engine = pollster::block_on(RenderEngine::new(target, width, height))?;
        self.finish_mount(engine, width, height)
    }

    /// Mounts without a window, for capture-only use.
    pub fn mount_headless(&mut self, width: u32, height: u32) -> Result<(), ChartError> {
        if self.engine.is_some() {
            warn!("mount requested while already mounted, keeping the live renderer");
            return Ok(());
        }
        let engine = pollster::block_on(RenderEngine::new_headless(width, height))?;
        self.finish_mount(engine, width, height)
    }

    fn finish_mount(
        &mut self,
        engine: RenderEngine,
        width: u32,
        height: u32,
    ) -> Result<(), ChartError> {
        // Remounting after an unmount rebuilds the logical content too.
        if self.content_objects == 0 {
            self.adopt_content();
        }
        self.camera.camera.resize_projection(width, height);
        self.camera.camera.update_view_proj();

        let gpu = self.build_gpu_resources(&engine);
        engine.update_camera(self.camera.camera.uniform);
        self.engine = Some(engine);
        self.gpu = Some(gpu);
        info!(
            "scene mounted at {width}x{height} with {} bars",
            self.descriptors.len()
        );
        Ok(())
    }

    /// Replaces the dataset behind the scene.
    ///
    /// The old per-bar objects are disposed before the new set is built, and
    /// the new bars grow in from zero. The viewing angle survives; only the
    /// framing distance adapts to the new field width.
    pub fn rebuild(&mut self, descriptors: Vec<BarDescriptor>, config: ChartConfig) {
        self.release_content();

        self.descriptors = descriptors;
        self.config = config;
        self.animation = AnimationState::from_descriptors(&self.descriptors);
        self.camera.controller.auto_orbit = self.config.idle_orbit;
        self.adopt_content();

        let (half_x, _) = self.field_half_extents();
        self.camera.camera.frame_extent(half_x.max(6.0));
        self.camera.camera.update_view_proj();

        if let Some(engine) = &self.engine {
            self.gpu = Some(self.build_gpu_resources(engine));
            engine.update_camera(self.camera.camera.uniform);
        }
        info!("scene rebuilt with {} bars", self.descriptors.len());
    }

    /// Maps fresh records and rebuilds, updating the stored axis fields.
    pub fn rebuild_from_records(
        &mut self,
        records: &[Record],
        category_field: &str,
        value_field: &str,
        config: ChartConfig,
    ) -> Result<(), ChartError> {
        let descriptors = map_dataset(records, category_field, value_field, &config)?;
        self.category_field = category_field.to_owned();
        self.value_field = value_field.to_owned();
        self.rebuild(descriptors, config);
        Ok(())
    }

    /// Adapts the projection and surface to a new viewport size.
    ///
    /// Zero-sized requests are ignored. Resizing never touches animation
    /// state or bar positions.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            warn!("ignoring zero-sized resize to {width}x{height}");
            return;
        }
        self.camera.camera.resize_projection(width, height);
        if let Some(engine) = &mut self.engine {
            engine.resize(width, height);
        }
    }

    /// Releases the renderer and every scene object. Safe to call twice;
    /// the second call finds nothing left to dispose.
    pub fn unmount(&mut self) {
        let was_mounted = self.engine.is_some();
        self.release_content();
        self.gpu = None;
        self.engine = None;
        if was_mounted {
            info!("scene unmounted, {} objects disposed", self.ledger.disposed());
        }
    }

    fn adopt_content(&mut self) {
        let count = self.descriptors.len() + FURNITURE_OBJECTS;
        self.ledger.record_created(count);
        self.content_objects = count;
        debug!("scene content built: {count} objects");
    }

    fn release_content(&mut self) {
        if self.content_objects > 0 {
            self.ledger.record_disposed(self.content_objects);
            debug!("scene content disposed: {} objects", self.content_objects);
            self.content_objects = 0;
        }
    }

    /// Controls step, then animation step. Callers run this once per frame
    /// before rendering.
    pub fn advance(&mut self, dt: f32) {
        let speed = self.config.animation_speed;
        self.camera.update(dt, speed);
        self.animation.step_all(dt, speed);
    }

    /// Renders one frame to the mounted surface, with an optional overlay
    /// pass drawn after the 3D content.
    pub fn render<F>(&mut self, ui_callback: Option<F>) -> Result<(), ChartError>
    where
        F: FnOnce(&wgpu::Device, &wgpu::Queue, &mut wgpu::CommandEncoder, &wgpu::TextureView),
    {
        let instances = self.build_instances();
        let uniform = self.camera.camera.uniform;
        let (Some(engine), Some(gpu)) = (self.engine.as_mut(), self.gpu.as_ref()) else {
            return Err(ChartError::MountUnavailable);
        };

        engine.update_camera(uniform);
        engine.write_instances(&gpu.instance_buffer, &instances);
        let draw = ChartDraw {
            bar_mesh: &gpu.bar_mesh,
            instance_buffer: &gpu.instance_buffer,
            instance_count: instances.len() as u32,
            ground_mesh: &gpu.ground_mesh,
            ground_instance_buffer: &gpu.ground_instance_buffer,
            line_buffer: &gpu.line_buffer,
            line_vertex_count: gpu.line_vertex_count,
        };
        engine.render_frame(&draw, ui_callback)
    }

    /// Renders the scene into an offscreen target and returns tightly packed
    /// RGBA pixels.
    ///
    /// # Errors
    /// [`ChartError::CaptureUnavailable`] when nothing is mounted.
    pub fn render_offscreen(&mut self, width: u32, height: u32) -> Result<Vec<u8>, ChartError> {
        let instances = self.build_instances();
        let (Some(engine), Some(gpu)) = (self.engine.as_ref(), self.gpu.as_ref()) else {
            return Err(ChartError::CaptureUnavailable);
        };

        // The capture target has its own aspect ratio; the live projection
        // is restored afterwards.
        let mut capture_camera = self.camera.camera;
        capture_camera.resize_projection(width, height);
        capture_camera.update_view_proj();
        engine.update_camera(capture_camera.uniform);
        engine.write_instances(&gpu.instance_buffer, &instances);

        let draw = ChartDraw {
            bar_mesh: &gpu.bar_mesh,
            instance_buffer: &gpu.instance_buffer,
            instance_count: instances.len() as u32,
            ground_mesh: &gpu.ground_mesh,
            ground_instance_buffer: &gpu.ground_instance_buffer,
            line_buffer: &gpu.line_buffer,
            line_vertex_count: gpu.line_vertex_count,
        };
        let pixels = engine.render_offscreen(&draw, width, height);
        engine.update_camera(self.camera.camera.uniform);
        pixels
    }

    /// Resolves the pointer to at most one bar and marks it hovered.
    ///
    /// `ndc` is the pointer in normalized device coordinates as produced by
    /// [`crate::gfx::picking::screen_to_ndc`]. Empty space clears hover.
    pub fn update_hover(&mut self, ndc: (f32, f32)) -> Option<usize> {
        let ray = pointer_ray(ndc, &self.camera.camera);
        let hit = pick_nearest(&ray, &self.bar_extents()).map(|hit| hit.bar_index);
        self.animation.set_hovered(hit);
        hit
    }

    /// Clears hover, used when the pointer leaves the viewport.
    pub fn clear_hover(&mut self) {
        self.animation.set_hovered(None);
    }

    /// Resolves a click to a bar and toggles its selection. Selections are
    /// independent; clicking empty space changes nothing.
    pub fn click(&mut self, ndc: (f32, f32)) -> Option<usize> {
        let ray = pointer_ray(ndc, &self.camera.camera);
        let hit = pick_nearest(&ray, &self.bar_extents()).map(|hit| hit.bar_index);
        if let Some(index) = hit {
            self.animation.toggle_selected(index);
            debug!("bar {index} selection toggled");
        }
        hit
    }

    pub fn handle_device_event(&mut self, event: &DeviceEvent, window: &Window) {
        self.camera.process_event(event, window);
    }

    pub fn handle_keyboard_event(&mut self, event: &KeyEvent) {
        self.camera.process_keyboard_event(event);
    }

    /// Returns the camera to its framed home pose.
    pub fn reset_view(&mut self) {
        self.camera.camera.reset_to_home();
    }

    pub fn set_animation_speed(&mut self, speed: f32) {
        self.config.animation_speed = if speed > 0.0 { speed } else { 0.01 };
    }

    pub fn set_idle_orbit(&mut self, enabled: bool) {
        self.config.idle_orbit = enabled;
        self.camera.controller.auto_orbit = enabled;
    }

    pub fn set_value_labels(&mut self, mode: crate::config::ValueLabelMode) {
        self.config.value_labels = mode;
    }

    /// All growth animations have reached their targets.
    pub fn is_settled(&self) -> bool {
        self.animation.is_settled()
    }

    pub fn is_mounted(&self) -> bool {
        self.engine.is_some()
    }

    pub fn descriptors(&self) -> &[BarDescriptor] {
        &self.descriptors
    }

    pub fn config(&self) -> &ChartConfig {
        &self.config
    }

    pub fn animation(&self) -> &AnimationState {
        &self.animation
    }

    pub fn ledger(&self) -> ResourceLedger {
        self.ledger
    }

    pub fn hovered_index(&self) -> Option<usize> {
        self.animation.hovered_index()
    }

    pub fn selected_indices(&self) -> Vec<usize> {
        self.animation.selected_indices()
    }

    pub fn camera(&self) -> &CameraManager {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut CameraManager {
        &mut self.camera
    }

    pub fn engine(&self) -> Option<&RenderEngine> {
        self.engine.as_ref()
    }

    pub fn engine_mut(&mut self) -> Option<&mut RenderEngine> {
        self.engine.as_mut()
    }

    pub fn category_field(&self) -> &str {
        &self.category_field
    }

    pub fn value_field(&self) -> &str {
        &self.value_field
    }

    /// Full view-projection matrix at the live viewport aspect.
    pub fn view_projection(&self) -> Matrix4<f32> {
        self.camera.get_view_proj_matrix()
    }

    /// View-projection matrix at an arbitrary target size, used when
    /// projecting labels onto a capture.
    pub fn view_projection_at(&self, width: u32, height: u32) -> Matrix4<f32> {
        let mut camera = self.camera.camera;
        camera.resize_projection(width, height);
        camera.build_view_projection_matrix()
    }

    fn build_camera(descriptors: &[BarDescriptor], config: &ChartConfig) -> CameraManager {
        let step = config.bar_width + config.spacing;
        let half_x =
            (descriptors.len().saturating_sub(1)) as f32 * step / 2.0 + config.bar_width;

        // Aspect is provisional until the first mount/resize reports the
        // real viewport.
        let mut camera = OrbitCamera::new(16.0, 0.55, 0.85, Vector3::new(0.0, 0.0, 2.5), 16.0 / 9.0);
        camera.frame_extent(half_x.max(6.0));

        let mut controller = CameraController::new(0.005, 0.1);
        controller.auto_orbit = config.idle_orbit;
        CameraManager::new(camera, controller)
    }

    /// Half extents of the bar field on the ground plane.
    pub fn field_half_extents(&self) -> (f32, f32) {
        let step = self.config.bar_width + self.config.spacing;
        let half_x = (self.descriptors.len().saturating_sub(1)) as f32 * step / 2.0
            + self.config.bar_width;
        let half_y = self.config.bar_width.max(1.5);
        (half_x, half_y)
    }

    /// Current pick volumes, one per bar in descriptor order. Flat bars keep
    /// a thin slab so they stay clickable.
    fn bar_extents(&self) -> Vec<Aabb> {
        self.descriptors
            .iter()
            .zip(self.animation.bars())
            .map(|(descriptor, visual)| {
                bar_extent(
                    descriptor.world_position,
                    self.config.bar_width,
                    visual.render_height(),
                )
            })
            .collect()
    }

    /// Per-frame instance list: every bar in descriptor order, then the
    /// hover particles last so alpha blending composites over the bars.
    fn build_instances(&self) -> Vec<BarInstance> {
        let mut instances = Vec::with_capacity(self.descriptors.len() + HOVER_PARTICLE_COUNT);

        for (descriptor, visual) in self.descriptors.iter().zip(self.animation.bars()) {
            let footprint = self.config.bar_width * visual.footprint_scale();
            let height = visual.render_height().max(FLAT_BAR_THICKNESS);
            let transform = Matrix4::from_translation(descriptor.world_position)
                * Matrix4::from_nonuniform_scale(footprint, footprint, height);
            instances.push(BarInstance::new(transform, descriptor.color, visual.emissive()));
        }

        if let Some(index) = self.animation.hovered_index() {
            if let (Some(descriptor), Some(visual)) =
                (self.descriptors.get(index), self.animation.bar(index))
            {
                let top = descriptor.world_position
                    + Vector3::new(0.0, 0.0, visual.render_height());
                let scale = PARTICLE_SCALE * visual.hover_emphasis.max(0.05);
                for position in hover_particles(top, self.animation.clock()) {
                    let mut particle = BarInstance::new(
                        Matrix4::from_translation(position)
                            * Matrix4::from_nonuniform_scale(scale, scale, scale),
                        descriptor.color,
                        0.5,
                    );
                    particle.color[3] = PARTICLE_ALPHA * visual.hover_emphasis;
                    instances.push(particle);
                }
            }
        }

        instances
    }

    fn build_gpu_resources(&self, engine: &RenderEngine) -> SceneGpuResources {
        let (half_x, half_y) = self.field_half_extents();

        let bar_mesh = engine.upload_mesh(&generate_bar_box(), "bar box mesh");
        let ground_mesh = engine.upload_mesh(
            &generate_ground_plane(half_x * 2.0 + 2.0, half_y * 2.0 + 2.0),
            "ground plane mesh",
        );

        let max_instances = self.descriptors.len() + HOVER_PARTICLE_COUNT;
        let instance_buffer =
            engine.create_instance_buffer(max_instances as u32, "bar instance buffer");

        let ground_instance_buffer = engine.create_instance_buffer(1, "ground instance buffer");
        engine.write_instances(
            &ground_instance_buffer,
            &[BarInstance::new(Matrix4::identity(), GROUND_COLOR, 0.0)],
        );

        let mut lines = generate_grid_lines(half_x, half_y, 1.0);
        lines.extend(generate_axis_lines(half_x, -half_y, HEIGHT_SCALE));
        let line_buffer = engine.create_line_buffer(lines.len() as u32, "furniture line buffer");
        engine.write_lines(&line_buffer, &lines);

        SceneGpuResources {
            bar_mesh,
            ground_mesh,
            instance_buffer,
            ground_instance_buffer,
            line_buffer,
            line_vertex_count: lines.len() as u32,
        }
    }
}
