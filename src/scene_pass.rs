//! Scene rendering pass: one non-indexed draw per visible object.
//!
//! [`ScenePass`] owns everything the games need to put drawables on screen:
//!
//! - the linked [`ShaderProgram`]
//! - one render pipeline per (topology, fill mode) pair, built on first use
//! - a uniform buffer holding every draw's MVP matrix in its own slot
//! - a depth buffer that follows the surface size
//!
//! # Bind Groups
//!
//! - **Group 0, binding 0**: `Matrices { mat4 MVP; }`, bound with a dynamic
//!   offset per draw
//!
//! # Per-Draw Uniforms
//!
//! All MVPs for a frame are written before the pass is recorded. Each one
//! sits at a multiple of the device's `min_uniform_buffer_offset_alignment`,
//! so a single buffer and bind group serve every draw. The buffer grows when
//! a frame queues more draws than it has slots for.

use std::collections::HashMap;

use glam::Mat4;

use crate::color::Color;
use crate::geometry::{Drawable, FillMode, Topology};
use crate::gpu::{DEPTH_FORMAT, GpuContext};
use crate::registry::{DrawableId, DrawableRegistry};
use crate::shader::ShaderProgram;

/// One queued draw: which drawable, and the full projection × view × model.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawCall {
    pub drawable: DrawableId,
    pub mvp: Mat4,
}

const MVP_SIZE: u64 = std::mem::size_of::<[[f32; 4]; 4]>() as u64;
const INITIAL_SLOTS: u64 = 64;

/// Byte distance between consecutive MVP slots.
pub(crate) fn slot_stride(alignment: u64) -> u64 {
    MVP_SIZE.div_ceil(alignment) * alignment
}

pub struct ScenePass {
    program: ShaderProgram,
    pipeline_layout: wgpu::PipelineLayout,
    pipelines: HashMap<(Topology, FillMode), wgpu::RenderPipeline>,
    uniform_layout: wgpu::BindGroupLayout,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    slot_stride: u64,
    slots: u64,
    depth_view: wgpu::TextureView,
    depth_size: (u32, u32),
    warned_line_fill: bool,
}

impl ScenePass {
    pub fn new(gpu: &GpuContext, program: ShaderProgram) -> Self {
        let device = &gpu.device;

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("MVP Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: wgpu::BufferSize::new(MVP_SIZE),
                },
                count: None,
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Scene Pipeline Layout"),
            bind_group_layouts: &[&uniform_layout],
            push_constant_ranges: &[],
        });

        let slot_stride = slot_stride(device.limits().min_uniform_buffer_offset_alignment as u64);
        let (uniform_buffer, uniform_bind_group) =
            Self::create_uniforms(gpu, &uniform_layout, slot_stride, INITIAL_SLOTS);

        Self {
            program,
            pipeline_layout,
            pipelines: HashMap::new(),
            uniform_layout,
            uniform_buffer,
            uniform_bind_group,
            slot_stride,
            slots: INITIAL_SLOTS,
            depth_view: Self::create_depth_view(gpu),
            depth_size: (gpu.width(), gpu.height()),
            warned_line_fill: false,
        }
    }

    fn create_uniforms(
        gpu: &GpuContext,
        layout: &wgpu::BindGroupLayout,
        stride: u64,
        slots: u64,
    ) -> (wgpu::Buffer, wgpu::BindGroup) {
        let buffer = gpu.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("MVP Uniforms"),
            size: stride * slots,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("MVP Bind Group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(MVP_SIZE),
                }),
            }],
        });

        (buffer, bind_group)
    }

    fn create_depth_view(gpu: &GpuContext) -> wgpu::TextureView {
        let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Depth Texture"),
            size: wgpu::Extent3d {
                width: gpu.width(),
                height: gpu.height(),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&wgpu::TextureViewDescriptor::default())
    }

    /// Recreates the depth buffer if the surface changed size.
    pub fn ensure_depth_size(&mut self, gpu: &GpuContext) {
        if self.depth_size != (gpu.width(), gpu.height()) {
            self.depth_view = Self::create_depth_view(gpu);
            self.depth_size = (gpu.width(), gpu.height());
        }
    }

    /// Grows the uniform buffer to hold at least `draws` slots.
    fn ensure_slots(&mut self, gpu: &GpuContext, draws: u64) {
        if draws <= self.slots {
            return;
        }
        let slots = draws.next_power_of_two();
        log::debug!("growing MVP buffer from {} to {slots} slots", self.slots);
        let (buffer, bind_group) =
            Self::create_uniforms(gpu, &self.uniform_layout, self.slot_stride, slots);
        self.uniform_buffer = buffer;
        self.uniform_bind_group = bind_group;
        self.slots = slots;
    }

    /// Picks the fill mode a drawable actually renders with.
    fn effective_fill(&mut self, gpu: &GpuContext, requested: FillMode) -> FillMode {
        if requested == FillMode::Line && !gpu.supports_line_fill {
            if !self.warned_line_fill {
                log::warn!("device lacks POLYGON_MODE_LINE; drawing line-fill geometry filled");
                self.warned_line_fill = true;
            }
            FillMode::Fill
        } else {
            requested
        }
    }

    fn ensure_pipeline(&mut self, gpu: &GpuContext, key: (Topology, FillMode)) {
        if self.pipelines.contains_key(&key) {
            return;
        }
        let (topology, fill) = key;
        log::debug!("building pipeline for {topology:?} / {fill:?}");

        let pipeline = gpu
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("Scene Pipeline"),
                layout: Some(&self.pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &self.program.vertex,
                    entry_point: Some("main"),
                    buffers: &Drawable::LAYOUTS,
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &self.program.fragment,
                    entry_point: Some("main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: gpu.config.format,
                        blend: Some(wgpu::BlendState::REPLACE),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: topology.to_wgpu(),
                    polygon_mode: fill.to_wgpu(),
                    cull_mode: None,
                    ..Default::default()
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::LessEqual,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            });

        self.pipelines.insert(key, pipeline);
    }

    /// Clears `target` and draws every call in order.
    ///
    /// Calls naming a drawable the registry does not hold are skipped with a
    /// warning.
    pub fn render(
        &mut self,
        gpu: &GpuContext,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
        clear_color: Color,
        registry: &DrawableRegistry,
        draws: &[DrawCall],
    ) {
        self.ensure_depth_size(gpu);
        self.ensure_slots(gpu, draws.len() as u64);

        // Resolve pipelines and upload every MVP before the pass borrows self.
        let mut resolved = Vec::with_capacity(draws.len());
        for (slot, call) in draws.iter().enumerate() {
            let Some(drawable) = registry.get(call.drawable) else {
                log::warn!("skipping draw of unknown drawable {:?}", call.drawable);
                continue;
            };
            let key = (
                drawable.topology(),
                self.effective_fill(gpu, drawable.fill_mode()),
            );
            self.ensure_pipeline(gpu, key);

            let offset = slot as u64 * self.slot_stride;
            gpu.queue.write_buffer(
                &self.uniform_buffer,
                offset,
                bytemuck::cast_slice(&call.mvp.to_cols_array()),
            );
            resolved.push((drawable, key, offset as u32));
        }

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Scene Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(clear_color.into()),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        let mut bound: Option<(Topology, FillMode)> = None;
        for (drawable, key, offset) in resolved {
            if bound != Some(key) {
                if let Some(pipeline) = self.pipelines.get(&key) {
                    pass.set_pipeline(pipeline);
                }
                bound = Some(key);
            }
            pass.set_bind_group(0, &self.uniform_bind_group, &[offset]);
            pass.set_vertex_buffer(0, drawable.position_buffer.slice(..));
            pass.set_vertex_buffer(1, drawable.color_buffer.slice(..));
            pass.draw(0..drawable.vertex_count(), 0..1);
        }

        log::trace!("scene pass recorded {} draws", draws.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slots_are_aligned_to_the_device_limit() {
        assert_eq!(slot_stride(256), 256);
        assert_eq!(slot_stride(64), 64);
        assert_eq!(slot_stride(32), 64);
    }
}
