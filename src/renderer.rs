mod export;
mod packing;
mod uniforms;

pub use packing::MAX_LIGHTS;

use anyhow::Context;
use tracing::{debug, info, warn};
use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::camera::Camera;
use crate::scene::flatten::FlattenedScene;
use crate::scene::GlobalCoefficients;
use crate::shapes::{self, PrimitiveKind, TessellationParams, Vertex};

use uniforms::{BindGroupLayouts, PerFrameUniforms, PerShapeUniforms};

/// Clear color behind the scene.
const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.1,
    g: 0.1,
    b: 0.12,
    a: 1.0,
};

/// Draws flattened scenes into a window surface.
pub struct Renderer<'a> {
    surface: wgpu::Surface<'a>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface_config: wgpu::SurfaceConfiguration,
    window_size: winit::dpi::PhysicalSize<u32>,
    depth_texture: DepthTexture,
    render_pipeline: wgpu::RenderPipeline,
    layouts: BindGroupLayouts,
    per_frame_uniforms: PerFrameUniforms,
    /// One draw record per flattened shape instance, in scene order.
    shape_draws: Vec<ShapeDraw>,
    mesh_cache: MeshCache,
    /// NOTE: `window` must be the last field in the struct because it needs
    /// to be dropped after `surface`, which holds references to the window.
    window: &'a Window,
}

/// Everything needed to draw one flattened shape instance.
struct ShapeDraw {
    kind: PrimitiveKind,
    uniforms: PerShapeUniforms,
}

impl<'a> Renderer<'a> {
    pub async fn new(window: &'a Window, params: TessellationParams) -> anyhow::Result<Self> {
        let window_size = window.inner_size();

        // Create a WGPU instance that can use any supported graphics API.
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window)
            .context("failed to create rendering surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("no compatible graphics adapter found")?;

        info!("using graphics adapter: {:?}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    label: None,
                },
                None,
            )
            .await
            .context("failed to acquire graphics device")?;

        // Prefer an sRGB back buffer so shaders can assume they are writing
        // sRGB values.
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .unwrap_or(surface_caps.formats[0]);

        if !surface_format.is_srgb() {
            warn!("no sRGB surface format available, defaulting to first supported format");
        }

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: window_size.width.max(1),
            height: window_size.height.max(1),
            present_mode: surface_caps.present_modes[0],
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        surface.configure(&device, &surface_config);

        let layouts = BindGroupLayouts::new(&device);
        let per_frame_uniforms = PerFrameUniforms::new(&device, &layouts);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("phong shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shader.wgsl").into()),
        });

        let depth_texture = DepthTexture::new(
            &device,
            surface_config.width,
            surface_config.height,
            Some("depth buffer"),
        );

        let render_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("scene pipeline layout"),
                bind_group_layouts: &[&layouts.per_frame_layout, &layouts.per_shape_layout],
                push_constant_ranges: &[],
            });

        let render_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("scene pipeline"),
            layout: Some(&render_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "vs_main",
                buffers: &[vertex_buffer_layout()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_config.format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                // Tessellators emit counterclockwise triangles viewed from
                // outside the solid, so back faces can be culled.
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Back),
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DepthTexture::FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
        });

        let mesh_cache = MeshCache::new(&device, params);

        Ok(Self {
            surface,
            device,
            queue,
            surface_config,
            window_size,
            depth_texture,
            render_pipeline,
            layouts,
            per_frame_uniforms,
            shape_draws: Vec::new(),
            mesh_cache,
            window,
        })
    }

    pub fn window(&self) -> &Window {
        self.window
    }

    pub fn window_size(&self) -> winit::dpi::PhysicalSize<u32> {
        self.window_size
    }

    /// Replace the renderer's drawable scene with a freshly flattened one.
    pub fn set_scene(&mut self, globals: GlobalCoefficients, scene: &FlattenedScene) {
        self.per_frame_uniforms.set_globals(globals);

        let (lights, light_count) = packing::pack_lights(&scene.lights);
        self.per_frame_uniforms.set_lights(lights, light_count);

        self.shape_draws = scene
            .shapes
            .iter()
            .map(|shape| {
                let mut uniforms = PerShapeUniforms::new(&self.device, &self.layouts);
                uniforms.set_model(shape.world_from_local);
                uniforms.set_material(&shape.material);
                ShapeDraw {
                    kind: shape.kind,
                    uniforms,
                }
            })
            .collect();

        debug!(
            "scene set: {} shapes, {} lights",
            self.shape_draws.len(),
            light_count
        );
    }

    /// Retessellate all four primitive meshes with new parameters. Shape
    /// draw records are untouched because they only reference mesh kinds.
    pub fn rebuild_meshes(&mut self, params: TessellationParams) {
        self.mesh_cache = MeshCache::new(&self.device, params);
    }

    pub fn resize(&mut self, new_width: u32, new_height: u32) {
        if new_width == 0 || new_height == 0 {
            warn!("ignoring resize to invalid size {new_width}x{new_height}");
            return;
        }

        self.window_size = winit::dpi::PhysicalSize::new(new_width, new_height);
        self.surface_config.width = new_width;
        self.surface_config.height = new_height;
        self.surface.configure(&self.device, &self.surface_config);

        // The depth buffer must always match the surface size.
        self.depth_texture =
            DepthTexture::new(&self.device, new_width, new_height, Some("depth buffer"));
    }

    /// Draw one frame of the current scene as seen through `camera`.
    pub fn render(&mut self, camera: &Camera) -> Result<(), wgpu::SurfaceError> {
        self.per_frame_uniforms.set_camera(
            camera.view_matrix(),
            camera.projection_matrix(),
            camera.eye(),
        );
        self.write_uniforms();

        let backbuffer = self.surface.get_current_texture()?;
        let view = backbuffer
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame encoder"),
            });

        self.encode_scene_pass(&mut encoder, &view, &self.depth_texture.view);

        self.queue.submit(std::iter::once(encoder.finish()));
        backbuffer.present();

        Ok(())
    }

    /// Push any dirty uniform values to the GPU.
    fn write_uniforms(&self) {
        self.per_frame_uniforms.update_gpu(&self.queue);

        for draw in &self.shape_draws {
            if draw.uniforms.is_dirty() {
                draw.uniforms.update_gpu(&self.queue);
            }
        }
    }

    /// Record the scene render pass into `encoder`, drawing every flattened
    /// shape with its cached mesh.
    fn encode_scene_pass(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        color_view: &wgpu::TextureView,
        depth_view: &wgpu::TextureView,
    ) {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("scene pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(CLEAR_COLOR),
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

        render_pass.set_pipeline(&self.render_pipeline);
        render_pass.set_bind_group(0, self.per_frame_uniforms.bind_group(), &[]);

        for draw in &self.shape_draws {
            let mesh = self.mesh_cache.get(draw.kind);

            render_pass.set_bind_group(1, draw.uniforms.bind_group(), &[]);
            render_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
            render_pass.draw(0..mesh.vertex_count, 0..1);
        }
    }
}

/// GPU vertex buffers for all four primitive kinds at one tessellation level.
struct MeshCache {
    meshes: [GpuMesh; 4],
}

struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    vertex_count: u32,
}

impl MeshCache {
    fn new(device: &wgpu::Device, params: TessellationParams) -> Self {
        Self {
            meshes: PrimitiveKind::ALL.map(|kind| {
                let mesh = shapes::tessellate(kind, params);

                GpuMesh {
                    vertex_buffer: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some("primitive vertex buffer"),
                        contents: mesh.as_bytes(),
                        usage: wgpu::BufferUsages::VERTEX,
                    }),
                    vertex_count: mesh.vertex_count() as u32,
                }
            }),
        }
    }

    fn get(&self, kind: PrimitiveKind) -> &GpuMesh {
        &self.meshes[kind.index()]
    }
}

/// Depth buffer texture sized to match its render target.
struct DepthTexture {
    view: wgpu::TextureView,
}

impl DepthTexture {
    const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    fn new(device: &wgpu::Device, width: u32, height: u32, label: Option<&str>) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label,
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self { view }
    }
}

/// Vertex layout shared by every tessellated mesh: position then normal,
/// tightly packed.
fn vertex_buffer_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            },
            wgpu::VertexAttribute {
                offset: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x3,
            },
        ],
    }
}
