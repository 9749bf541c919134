//! WGPU render engine for the chart surface
//!
//! Owns the device, queue, optional presentation surface and the two chart
//! pipelines (lit instanced bars, unlit furniture lines). The engine draws
//! whatever [`ChartDraw`] hands it each frame; scene content stays owned by
//! the session so unmount can dispose it deterministically.

use std::sync::Arc;

use wgpu::util::DeviceExt;
use wgpu::TextureFormat;

use crate::error::ChartError;
use crate::gfx::camera::camera_utils::CameraUniform;
use crate::gfx::geometry::GeometryData;

use super::texture::TextureResource;
use super::vertex::{BarInstance, LineVertex, Vertex3D};

/// Clear color for the interactive view, a light neutral backdrop.
pub const VIEW_CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.95,
    g: 0.96,
    b: 0.97,
    a: 1.0,
};

/// Captures flatten onto opaque white.
pub const CAPTURE_CLEAR_COLOR: wgpu::Color = wgpu::Color::WHITE;

/// GPU-resident mesh uploaded from [`GeometryData`].
#[derive(Debug)]
pub struct GpuMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

/// One frame's draw content, borrowed from the session.
///
/// Bars render last so the alpha-blended hover particles, appended at the
/// tail of the instance list, composite over the furniture.
pub struct ChartDraw<'a> {
    pub bar_mesh: &'a GpuMesh,
    pub instance_buffer: &'a wgpu::Buffer,
    pub instance_count: u32,
    pub ground_mesh: &'a GpuMesh,
    pub ground_instance_buffer: &'a wgpu::Buffer,
    pub line_buffer: &'a wgpu::Buffer,
    pub line_vertex_count: u32,
}

/// Core rendering engine managing GPU resources and draw calls.
///
/// Construct with [`RenderEngine::new`] for an interactive window surface or
/// [`RenderEngine::new_headless`] when only offscreen capture is needed.
#[derive(Debug)]
pub struct RenderEngine {
    surface: Option<wgpu::Surface<'static>>,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    config: wgpu::SurfaceConfiguration,
    depth_texture: TextureResource,
    format: TextureFormat,
    bar_pipeline: wgpu::RenderPipeline,
    line_pipeline: wgpu::RenderPipeline,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
}

impl RenderEngine {
    /// Creates a render engine presenting to the given window.
    ///
    /// Fails with [`ChartError::MountUnavailable`] when no surface, adapter
    /// or device can be acquired; the caller may retry later.
    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
    ) -> Result<RenderEngine, ChartError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance.create_surface(window).map_err(|err| {
            log::error!("failed to create presentation surface: {err}");
            ChartError::MountUnavailable
        })?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|err| {
                log::error!("no compatible gpu adapter: {err}");
                ChartError::MountUnavailable
            })?;

        let surface_capabilities = surface.get_capabilities(&adapter);
        let format = surface_capabilities
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .unwrap_or(surface_capabilities.formats[0]);
        let alpha_mode = surface_capabilities.alpha_modes[0];

        Self::from_parts(adapter, Some(surface), format, alpha_mode, width, height).await
    }

    /// Creates an engine without a presentation surface, for offscreen
    /// rendering and capture only.
    pub async fn new_headless(width: u32, height: u32) -> Result<RenderEngine, ChartError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .map_err(|err| {
                log::error!("no gpu adapter for headless rendering: {err}");
                ChartError::MountUnavailable
            })?;

        Self::from_parts(
            adapter,
            None,
            TextureResource::CAPTURE_FORMAT,
            wgpu::CompositeAlphaMode::Opaque,
            width,
            height,
        )
        .await
    }

    async fn from_parts(
        adapter: wgpu::Adapter,
        surface: Option<wgpu::Surface<'static>>,
        format: TextureFormat,
        alpha_mode: wgpu::CompositeAlphaMode,
        width: u32,
        height: u32,
    ) -> Result<RenderEngine, ChartError> {
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Chart Device"),
                required_features: wgpu::Features::default(),
                required_limits: wgpu::Limits {
                    max_texture_dimension_2d: 4096,
                    ..wgpu::Limits::downlevel_defaults()
                },
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .map_err(|err| {
                log::error!("failed to acquire gpu device: {err}");
                ChartError::MountUnavailable
            })?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        if let Some(surface) = &surface {
            surface.configure(&device, &config);
        }

        let depth_texture =
            TextureResource::create_depth_texture(&device, config.width, config.height, "depth_texture");

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Chart Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("chart.wgsl").into()),
        });

        let camera_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Camera Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Uniform Buffer"),
            contents: bytemuck::cast_slice(&[CameraUniform::default()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Camera Bind Group"),
            layout: &camera_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Chart Pipeline Layout"),
            bind_group_layouts: &[&camera_bind_group_layout],
            push_constant_ranges: &[],
        });

        let bar_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Bar Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_bar"),
                buffers: &[Vertex3D::desc(), BarInstance::desc()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_bar"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Back),
                unclipped_depth: false,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: TextureResource::DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let line_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Furniture Line Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_line"),
                buffers: &[LineVertex::desc()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_line"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::LineList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                unclipped_depth: false,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: TextureResource::DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Ok(RenderEngine {
            surface,
            device: device.into(),
            queue: queue.into(),
            config,
            depth_texture,
            format,
            bar_pipeline,
            line_pipeline,
            camera_buffer,
            camera_bind_group,
        })
    }

    /// Uploads mesh geometry into GPU vertex and index buffers.
    pub fn upload_mesh(&self, data: &GeometryData, label: &str) -> GpuMesh {
        let (vertices, indices) = data.to_vertex_data();

        let vertex_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::cast_slice(&vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });

        let index_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::cast_slice(&indices),
                usage: wgpu::BufferUsages::INDEX,
            });

        GpuMesh {
            vertex_buffer,
            index_buffer,
            index_count: indices.len() as u32,
        }
    }

    /// Creates an instance buffer sized for `max_instances` bars.
    pub fn create_instance_buffer(&self, max_instances: u32, label: &str) -> wgpu::Buffer {
        self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: (max_instances.max(1) as u64) * std::mem::size_of::<BarInstance>() as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    /// Creates a vertex buffer sized for `max_vertices` line endpoints.
    pub fn create_line_buffer(&self, max_vertices: u32, label: &str) -> wgpu::Buffer {
        self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: (max_vertices.max(1) as u64) * std::mem::size_of::<LineVertex>() as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    pub fn write_instances(&self, buffer: &wgpu::Buffer, instances: &[BarInstance]) {
        if !instances.is_empty() {
            self.queue
                .write_buffer(buffer, 0, bytemuck::cast_slice(instances));
        }
    }

    pub fn write_lines(&self, buffer: &wgpu::Buffer, vertices: &[LineVertex]) {
        if !vertices.is_empty() {
            self.queue
                .write_buffer(buffer, 0, bytemuck::cast_slice(vertices));
        }
    }

    /// Uploads the per-frame camera uniform.
    pub fn update_camera(&self, camera_uniform: CameraUniform) {
        self.queue
            .write_buffer(&self.camera_buffer, 0, bytemuck::cast_slice(&[camera_uniform]));
    }

    /// Renders a frame to the presentation surface with an optional overlay
    /// callback drawn on top of the 3D pass.
    pub fn render_frame<F>(&mut self, draw: &ChartDraw, ui_callback: Option<F>) -> Result<(), ChartError>
    where
        F: FnOnce(&wgpu::Device, &wgpu::Queue, &mut wgpu::CommandEncoder, &wgpu::TextureView),
    {
        let Some(surface) = &self.surface else {
            return Err(ChartError::MountUnavailable);
        };

        let surface_texture = match surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                surface.configure(&self.device, &self.config);
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => return Ok(()),
            Err(err) => {
                log::error!("presentation surface failed: {err}");
                return Err(ChartError::MountUnavailable);
            }
        };

        let surface_texture_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        self.encode_chart_pass(
            &mut encoder,
            &surface_texture_view,
            &self.depth_texture.view,
            draw,
            VIEW_CLEAR_COLOR,
        );

        if let Some(ui_callback) = ui_callback {
            ui_callback(&self.device, &self.queue, &mut encoder, &surface_texture_view);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        surface_texture.present();

        Ok(())
    }

    /// Renders the chart to an offscreen target and reads the pixels back.
    ///
    /// Returns tightly packed RGBA8 rows on a white background.
    pub fn render_offscreen(
        &self,
        draw: &ChartDraw,
        width: u32,
        height: u32,
    ) -> Result<Vec<u8>, ChartError> {
        let target = TextureResource::create_capture_target(&self.device, width, height);
        let depth = TextureResource::create_depth_texture(&self.device, width, height, "capture_depth");

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Capture Encoder"),
            });

        self.encode_chart_pass(&mut encoder, &target.view, &depth.view, draw, CAPTURE_CLEAR_COLOR);

        let unpadded_bytes_per_row = 4 * width;
        let padded_bytes_per_row = aligned_bytes_per_row(width);

        let readback_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Capture Readback Buffer"),
            size: (padded_bytes_per_row as u64) * (height as u64),
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &target.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &readback_buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_bytes_per_row),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );

        self.queue.submit(std::iter::once(encoder.finish()));

        let slice = readback_buffer.slice(..);
        let (tx, rx) = futures::channel::oneshot::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });

        let _ = self.device.poll(wgpu::MaintainBase::Wait);

        match futures::executor::block_on(rx) {
            Ok(Ok(())) => {
                let mapped = slice.get_mapped_range();
                let mut pixels =
                    Vec::with_capacity(unpadded_bytes_per_row as usize * height as usize);
                for row in mapped.chunks(padded_bytes_per_row as usize) {
                    pixels.extend_from_slice(&row[..unpadded_bytes_per_row as usize]);
                }
                drop(mapped);
                readback_buffer.unmap();
                Ok(pixels)
            }
            Ok(Err(err)) => Err(ChartError::Capture(err.to_string())),
            Err(_) => Err(ChartError::Capture("readback channel dropped".into())),
        }
    }

    fn encode_chart_pass(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        color_view: &wgpu::TextureView,
        depth_view: &wgpu::TextureView,
        draw: &ChartDraw,
        clear: wgpu::Color,
    ) {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Chart Render Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(clear),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            occlusion_query_set: None,
            timestamp_writes: None,
        });

        render_pass.set_bind_group(0, &self.camera_bind_group, &[]);

        // Ground plane, then furniture lines, bars last for blending.
        render_pass.set_pipeline(&self.bar_pipeline);
        render_pass.set_vertex_buffer(0, draw.ground_mesh.vertex_buffer.slice(..));
        render_pass.set_vertex_buffer(1, draw.ground_instance_buffer.slice(..));
        render_pass.set_index_buffer(
            draw.ground_mesh.index_buffer.slice(..),
            wgpu::IndexFormat::Uint32,
        );
        render_pass.draw_indexed(0..draw.ground_mesh.index_count, 0, 0..1);

        if draw.line_vertex_count > 0 {
            render_pass.set_pipeline(&self.line_pipeline);
            render_pass.set_vertex_buffer(0, draw.line_buffer.slice(..));
            render_pass.draw(0..draw.line_vertex_count, 0..1);
        }

        if draw.instance_count > 0 {
            render_pass.set_pipeline(&self.bar_pipeline);
            render_pass.set_vertex_buffer(0, draw.bar_mesh.vertex_buffer.slice(..));
            render_pass.set_vertex_buffer(1, draw.instance_buffer.slice(..));
            render_pass.set_index_buffer(
                draw.bar_mesh.index_buffer.slice(..),
                wgpu::IndexFormat::Uint32,
            );
            render_pass.draw_indexed(0..draw.bar_mesh.index_count, 0, 0..draw.instance_count);
        }
    }

    /// Resizes the presentation surface and recreates the depth buffer.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }

        self.config.width = width;
        self.config.height = height;

        if let Some(surface) = &self.surface {
            surface.configure(&self.device, &self.config);
        }

        self.depth_texture =
            TextureResource::create_depth_texture(&self.device, width, height, "depth_texture");
    }

    /// Current render target dimensions in pixels.
    pub fn get_surface_size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.format
    }

    /// Whether this engine presents to a window surface.
    pub fn is_interactive(&self) -> bool {
        self.surface.is_some()
    }

    /// Toggles vertical sync on the presentation surface.
    pub fn set_vsync(&mut self, enable: bool) {
        self.config.present_mode = if enable {
            wgpu::PresentMode::Fifo
        } else {
            wgpu::PresentMode::Immediate
        };

        if let Some(surface) = &self.surface {
            surface.configure(&self.device, &self.config);
        }
    }
}

/// Bytes per image row padded to the copy alignment wgpu requires.
fn aligned_bytes_per_row(width: u32) -> u32 {
    let unaligned = 4 * width;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    (unaligned + align - 1) / align * align
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_padding_rounds_up_to_the_copy_alignment() {
        assert_eq!(aligned_bytes_per_row(64), 256);
        assert_eq!(aligned_bytes_per_row(100), 512);
        assert_eq!(aligned_bytes_per_row(256), 1024);
        assert_eq!(aligned_bytes_per_row(1600), 6400);
    }

    #[test]
    fn capture_background_is_opaque_white() {
        assert_eq!(CAPTURE_CLEAR_COLOR.a, 1.0);
        assert_eq!(CAPTURE_CLEAR_COLOR.r, 1.0);
        assert_eq!(VIEW_CLEAR_COLOR.a, 1.0);
    }
}
