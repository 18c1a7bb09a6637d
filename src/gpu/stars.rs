//! Background star pass, drawn into the HDR target before the tree.

use super::{additive_blend, instance_attribute, HDR_FORMAT};
use crate::field::palette;
use crate::shader::{star_shader, RenderUniforms};
use crate::stars::{Star, StarField};
use glam::Vec3;
use wgpu::util::DeviceExt;

pub struct StarState {
    instance_buffer: wgpu::Buffer,
    num_stars: u32,
    pipeline: wgpu::RenderPipeline,
    /// Stars have their own uniforms: no tree offset and a scaled clock.
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl StarState {
    pub fn new(
        device: &wgpu::Device,
        field: &StarField,
        uniform_layout: &wgpu::BindGroupLayout,
        uniforms: &RenderUniforms,
    ) -> Self {
        let stars: Vec<Star> = field
            .stars()
            .iter()
            .map(|star| Star {
                color: palette::srgb_to_linear(Vec3::from_array(star.color)).to_array(),
                ..*star
            })
            .collect();
        let instance_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Star Instances"),
            contents: bytemuck::cast_slice(&stars),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Star Uniforms"),
            contents: bytemuck::bytes_of(uniforms),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Star Bind Group"),
            layout: uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Star Shader"),
            source: wgpu::ShaderSource::Wgsl(star_shader().into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Star Pipeline Layout"),
            bind_group_layouts: &[uniform_layout],
            push_constant_ranges: &[],
        });

        let float = std::mem::size_of::<f32>() as wgpu::BufferAddress;
        let attributes = [
            instance_attribute(0, wgpu::VertexFormat::Float32x3),
            wgpu::VertexAttribute {
                offset: 3 * float,
                ..instance_attribute(1, wgpu::VertexFormat::Float32x3)
            },
            wgpu::VertexAttribute {
                offset: 6 * float,
                ..instance_attribute(2, wgpu::VertexFormat::Float32)
            },
        ];

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Star Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<Star>() as wgpu::BufferAddress,
                    step_mode: wgpu::VertexStepMode::Instance,
                    attributes: &attributes,
                }],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
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
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Self {
            instance_buffer,
            num_stars: field.len() as u32,
            pipeline,
            uniform_buffer,
            bind_group,
        }
    }

    pub fn update(&self, queue: &wgpu::Queue, uniforms: &RenderUniforms) {
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(uniforms));
    }

    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.bind_group, &[]);
        pass.set_vertex_buffer(0, self.instance_buffer.slice(..));
        pass.draw(0..6, 0..self.num_stars);
    }
}
