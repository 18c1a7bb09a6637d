mod camera;
mod post_process;
mod stars;

use std::sync::Arc;

use glam::{Mat4, Vec2, Vec3};
use wgpu::util::DeviceExt;
use winit::window::Window;

pub use camera::Camera;
pub use post_process::{PostProcessState, HDR_FORMAT};
pub use stars::StarState;

use crate::config::TinselConfig;
use crate::error::GpuError;
use crate::field::{palette, ParticleField};
use crate::session::FrameState;
use crate::shader::{render_shader, RenderUniforms};
use crate::stars::StarField;

/// Per-instance attribute buffers in shader location order.
struct InstanceBuffers {
    assembled: wgpu::Buffer,
    scattered: wgpu::Buffer,
    color: wgpu::Buffer,
    size: wgpu::Buffer,
    seed: wgpu::Buffer,
}

impl InstanceBuffers {
    fn new(device: &wgpu::Device, field: &ParticleField) -> Self {
        let buffer = |label: &str, contents: &[u8]| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents,
                usage: wgpu::BufferUsages::VERTEX,
            })
        };
        Self {
            assembled: buffer("Assembled Positions", bytemuck::cast_slice(field.assembled())),
            scattered: buffer("Scattered Positions", bytemuck::cast_slice(field.scattered())),
            color: buffer("Particle Colors", bytemuck::cast_slice(&linear_colors(field.colors()))),
            size: buffer("Particle Sizes", bytemuck::cast_slice(field.sizes())),
            seed: buffer("Particle Seeds", bytemuck::cast_slice(field.seeds())),
        }
    }

    fn bind<'a>(&'a self, pass: &mut wgpu::RenderPass<'a>) {
        pass.set_vertex_buffer(0, self.assembled.slice(..));
        pass.set_vertex_buffer(1, self.scattered.slice(..));
        pass.set_vertex_buffer(2, self.color.slice(..));
        pass.set_vertex_buffer(3, self.size.slice(..));
        pass.set_vertex_buffer(4, self.seed.slice(..));
    }
}

pub struct GpuState {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    render_pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    instances: InstanceBuffers,
    num_particles: u32,
    post: PostProcessState,
    stars: Option<StarState>,
    /// Star clock rate relative to elapsed time.
    star_speed: f32,
    clear_color: wgpu::Color,
    /// Moves the tree relative to the orbit target.
    model: Mat4,
    pub camera: Camera,
}

impl GpuState {
    pub async fn new(
        window: Arc<Window>,
        field: &ParticleField,
        settings: &TinselConfig,
    ) -> Result<Self, GpuError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;
        log::info!("Using adapter: {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
                trace: Default::default(),
                experimental_features: Default::default(),
            })
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or(GpuError::UnsupportedSurface)?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let instances = InstanceBuffers::new(&device, field);
        let camera = Camera::from_config(&settings.camera);
        let model = Mat4::from_translation(Vec3::new(0.0, settings.camera.tree_offset_y, 0.0));

        let uniforms = frame_uniforms(&camera, model, &config, 0.0, 0.0);
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Uniform Buffer"),
            contents: bytemuck::bytes_of(&uniforms),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let uniform_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Uniform Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Uniform Bind Group"),
            layout: &uniform_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let render_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Particle Shader"),
            source: wgpu::ShaderSource::Wgsl(render_shader().into()),
        });

        let render_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Particle Pipeline Layout"),
                bind_group_layouts: &[&uniform_bind_group_layout],
                push_constant_ranges: &[],
            });

        // One attribute per buffer: assembled, scattered, color, size, seed.
        let vec3 = std::mem::size_of::<Vec3>() as wgpu::BufferAddress;
        let float = std::mem::size_of::<f32>() as wgpu::BufferAddress;
        let attributes = [
            [instance_attribute(0, wgpu::VertexFormat::Float32x3)],
            [instance_attribute(1, wgpu::VertexFormat::Float32x3)],
            [instance_attribute(2, wgpu::VertexFormat::Float32x3)],
            [instance_attribute(3, wgpu::VertexFormat::Float32)],
            [instance_attribute(4, wgpu::VertexFormat::Float32x3)],
        ];
        let strides = [vec3, vec3, vec3, float, vec3];
        let buffer_layouts: Vec<wgpu::VertexBufferLayout> = attributes
            .iter()
            .zip(strides)
            .map(|(attrs, stride)| wgpu::VertexBufferLayout {
                array_stride: stride,
                step_mode: wgpu::VertexStepMode::Instance,
                attributes: attrs,
            })
            .collect();

        let render_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Particle Pipeline"),
            layout: Some(&render_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &render_shader,
                entry_point: Some("vs_main"),
                buffers: &buffer_layouts,
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &render_shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: HDR_FORMAT,
                    blend: Some(additive_blend()),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            // Additive blending is order independent; no depth buffer.
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let post = PostProcessState::new(&device, &settings.render, config.width, config.height, surface_format);

        let stars = (settings.stars.enabled && settings.stars.count > 0).then(|| {
            let field = match settings.seed {
                Some(seed) => StarField::generate_seeded(&settings.stars, seed),
                None => StarField::generate(&settings.stars),
            };
            log::info!("Generated {} stars", field.len());
            let uniforms = frame_uniforms(&camera, Mat4::IDENTITY, &config, 0.0, 0.0);
            StarState::new(&device, &field, &uniform_bind_group_layout, &uniforms)
        });

        let bg = palette::srgb_to_linear(settings.render.background_rgb());
        let clear_color = wgpu::Color {
            r: bg.x as f64,
            g: bg.y as f64,
            b: bg.z as f64,
            a: 1.0,
        };

        Ok(Self {
            surface,
            device,
            queue,
            config,
            render_pipeline,
            uniform_buffer,
            uniform_bind_group,
            instances,
            num_particles: field.len() as u32,
            post,
            stars,
            star_speed: settings.stars.speed,
            clear_color,
            model,
            camera,
        })
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
            self.post.resize(&self.device, new_size.width, new_size.height);
        }
    }

    pub fn render(&mut self, frame: &FrameState) -> Result<(), wgpu::SurfaceError> {
        let uniforms = frame_uniforms(&self.camera, self.model, &self.config, frame.elapsed, frame.morph_factor);
        self.queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));
        if let Some(stars) = &self.stars {
            let star_time = frame.elapsed * self.star_speed;
            stars.update(&self.queue, &frame_uniforms(&self.camera, Mat4::IDENTITY, &self.config, star_time, 0.0));
        }
        self.post.update(&self.queue, frame.elapsed);

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Particle Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.post.view,
                    resolve_target: None,
                    depth_slice: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            if let Some(stars) = &self.stars {
                stars.draw(&mut render_pass);
            }

            render_pass.set_pipeline(&self.render_pipeline);
            render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
            self.instances.bind(&mut render_pass);
            render_pass.draw(0..6, 0..self.num_particles);
        }

        self.post.draw(&mut encoder, &view);

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

fn frame_uniforms(
    camera: &Camera,
    model: Mat4,
    config: &wgpu::SurfaceConfiguration,
    time: f32,
    morph_factor: f32,
) -> RenderUniforms {
    let aspect = config.width as f32 / config.height.max(1) as f32;
    let view = camera.view_matrix() * model;
    let proj = camera.projection_matrix(aspect);
    RenderUniforms::new(
        proj * view,
        view,
        Vec2::new(config.width as f32, config.height as f32),
        time,
        morph_factor,
    )
}

fn instance_attribute(location: u32, format: wgpu::VertexFormat) -> wgpu::VertexAttribute {
    wgpu::VertexAttribute {
        offset: 0,
        shader_location: location,
        format,
    }
}

fn additive_blend() -> wgpu::BlendState {
    let add = wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::One,
        dst_factor: wgpu::BlendFactor::One,
        operation: wgpu::BlendOperation::Add,
    };
    wgpu::BlendState { color: add, alpha: add }
}

/// Palette colors are authored in sRGB; the scene target is linear.
fn linear_colors(colors: &[Vec3]) -> Vec<Vec3> {
    colors.iter().map(|&c| palette::srgb_to_linear(c)).collect()
}
