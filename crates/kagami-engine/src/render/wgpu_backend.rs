//! wgpu implementation of [`EffectBackend`].
//!
//! Owns the GPU textures behind every arena handle plus a canvas pair that
//! stands in for the default framebuffer. The embedding application hands
//! in its swapchain view once per frame; `transfer_to_default` blits the
//! canvas into it when the effect chain ends.

use std::collections::HashMap;

use crate::target::{TargetDesc, TargetHandle, TargetKind};

use super::backend::EffectBackend;
use super::quad::QuadBlitter;

const COLOR_SLOTS: usize = crate::target::COLOR_SLOTS;

struct GpuTarget {
    format: wgpu::TextureFormat,
    kind: TargetKind,
    mip_level_count: u32,
    /// Single-sample texture, sampleable by later passes.
    texture: wgpu::Texture,
    /// All-mips view for sampling.
    sampled_view: wgpu::TextureView,
    /// Mip 0 view used as a render attachment or resolve destination.
    attach_view: wgpu::TextureView,
    /// Present for `AntiAlias=true` color targets; rendering lands here and
    /// `resolve_msaa` folds it into `texture`.
    msaa_view: Option<wgpu::TextureView>,
}

struct Canvas {
    color_view: wgpu::TextureView,
    depth_view: wgpu::TextureView,
    format: wgpu::TextureFormat,
}

/// GPU-backed effect backend.
pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    blitter: QuadBlitter,
    canvas: Canvas,
    targets: HashMap<usize, GpuTarget>,
    bound_color: [Option<TargetHandle>; COLOR_SLOTS],
    bound_depth: Option<TargetHandle>,
    frame_view: Option<wgpu::TextureView>,
}

impl WgpuBackend {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> Self {
        let canvas = Self::make_canvas(device, surface_format, width, height);
        Self {
            device: device.clone(),
            queue: queue.clone(),
            blitter: QuadBlitter::new(device),
            canvas,
            targets: HashMap::new(),
            bound_color: [None; COLOR_SLOTS],
            bound_depth: None,
            frame_view: None,
        }
    }

    /// Installs the swapchain view `transfer_to_default` writes to. Call
    /// once per frame; the view is dropped at `end_frame`.
    pub fn begin_frame(&mut self, frame_view: wgpu::TextureView) {
        self.frame_view = Some(frame_view);
        self.bound_color = [None; COLOR_SLOTS];
        self.bound_depth = None;
    }

    pub fn end_frame(&mut self) {
        self.frame_view = None;
    }

    /// Recreates the canvas at a new pixel size. Offscreen targets are not
    /// touched; the engine re-registers them through its own invalidation.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.canvas = Self::make_canvas(&self.device, self.canvas.format, width, height);
    }

    /// Drops every allocated target texture.
    pub fn release_targets(&mut self) {
        self.targets.clear();
        self.bound_color = [None; COLOR_SLOTS];
        self.bound_depth = None;
    }

    /// Sampleable view of an allocated target, for callers that feed
    /// offscreen results into their own bind groups.
    pub fn sampled_view(&self, handle: TargetHandle) -> Option<&wgpu::TextureView> {
        self.targets.get(&handle.index()).map(|t| &t.sampled_view)
    }

    fn make_canvas(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> Canvas {
        let color = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("kagami canvas color"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let depth = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("kagami canvas depth"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Depth24PlusStencil8,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        Canvas {
            color_view: color.create_view(&wgpu::TextureViewDescriptor::default()),
            depth_view: depth.create_view(&wgpu::TextureViewDescriptor::default()),
            format,
        }
    }

    /// Attachment view and sample count for one bound color slot. Slot 0
    /// falls back to the canvas when nothing is bound.
    fn color_attachment(&self, slot: usize) -> Option<(&wgpu::TextureView, wgpu::TextureFormat, u32)> {
        match self.bound_color[slot] {
            Some(handle) => {
                let target = self.targets.get(&handle.index())?;
                match &target.msaa_view {
                    Some(view) => Some((view, target.format, 4)),
                    None => Some((&target.attach_view, target.format, 1)),
                }
            }
            None if slot == 0 => Some((&self.canvas.color_view, self.canvas.format, 1)),
            None => None,
        }
    }

    fn depth_attachment(&self) -> (&wgpu::TextureView, bool) {
        match self.bound_depth.and_then(|h| self.targets.get(&h.index())) {
            Some(target) => {
                let has_stencil = target.format == wgpu::TextureFormat::Depth24PlusStencil8;
                (&target.attach_view, has_stencil)
            }
            None => (&self.canvas.depth_view, true),
        }
    }

    fn submit(&self, encoder: wgpu::CommandEncoder) {
        self.queue.submit(std::iter::once(encoder.finish()));
    }

    fn encoder(&self, label: &str) -> wgpu::CommandEncoder {
        self.device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some(label) })
    }
}

fn mip_levels(width: u32, height: u32) -> u32 {
    32 - width.max(height).max(1).leading_zeros()
}

impl EffectBackend for WgpuBackend {
    fn allocate_target(&mut self, handle: TargetHandle, desc: &TargetDesc, width: u32, height: u32) {
        let mip_level_count = if desc.mipmap { mip_levels(width, height) } else { 1 };
        let size = wgpu::Extent3d { width, height, depth_or_array_layers: 1 };
        let usage = wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING;

        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(&desc.name),
            size,
            mip_level_count,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: desc.format,
            usage,
            view_formats: &[],
        });
        let sampled_view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let attach_view = texture.create_view(&wgpu::TextureViewDescriptor {
            base_mip_level: 0,
            mip_level_count: Some(1),
            ..Default::default()
        });

        let msaa_view = (desc.sample_count > 1).then(|| {
            self.device
                .create_texture(&wgpu::TextureDescriptor {
                    label: Some(&desc.name),
                    size,
                    mip_level_count: 1,
                    sample_count: desc.sample_count,
                    dimension: wgpu::TextureDimension::D2,
                    format: desc.format,
                    usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                    view_formats: &[],
                })
                .create_view(&wgpu::TextureViewDescriptor::default())
        });

        self.targets.insert(
            handle.index(),
            GpuTarget {
                format: desc.format,
                kind: desc.kind,
                mip_level_count,
                texture,
                sampled_view,
                attach_view,
                msaa_view,
            },
        );
    }

    fn generate_mipmaps(&mut self, handle: TargetHandle) {
        let Some(target) = self.targets.get(&handle.index()) else {
            return;
        };
        if target.mip_level_count < 2 || target.kind != TargetKind::Color {
            return;
        }

        // Blit each level from the one above it.
        let mut encoder = self.encoder("kagami mipmap encoder");
        for level in 1..target.mip_level_count {
            let src = target.texture.create_view(&wgpu::TextureViewDescriptor {
                base_mip_level: level - 1,
                mip_level_count: Some(1),
                ..Default::default()
            });
            let dst = target.texture.create_view(&wgpu::TextureViewDescriptor {
                base_mip_level: level,
                mip_level_count: Some(1),
                ..Default::default()
            });
            self.blitter
                .blit(&self.device, &mut encoder, &src, &dst, target.format, 1);
        }
        self.submit(encoder);
    }

    fn set_color_target(&mut self, slot: usize, target: Option<TargetHandle>) {
        self.bound_color[slot] = target;
    }

    fn set_depth_stencil_target(&mut self, target: Option<TargetHandle>) {
        self.bound_depth = target;
    }

    fn resolve_msaa(&mut self, handle: TargetHandle) {
        let Some(target) = self.targets.get(&handle.index()) else {
            return;
        };
        let Some(msaa_view) = &target.msaa_view else {
            return;
        };

        // An empty pass with a resolve attachment performs the fold.
        let mut encoder = self.encoder("kagami resolve encoder");
        {
            let _rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("kagami msaa resolve"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: msaa_view,
                    resolve_target: Some(&target.attach_view),
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Discard,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
        }
        self.submit(encoder);
    }

    fn clear_color(&mut self, value: [f32; 4]) {
        let clear = wgpu::Color {
            r: value[0] as f64,
            g: value[1] as f64,
            b: value[2] as f64,
            a: value[3] as f64,
        };

        // One pass per bound attachment; formats may differ across slots.
        let mut encoder = self.encoder("kagami clear encoder");
        for slot in 0..COLOR_SLOTS {
            let Some((view, _, _)) = self.color_attachment(slot) else {
                continue;
            };
            let _rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("kagami clear color"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
        }
        self.submit(encoder);
    }

    fn clear_depth(&mut self, value: f32) {
        let (view, has_stencil) = self.depth_attachment();
        let mut encoder = self.encoder("kagami clear depth encoder");
        {
            let _rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("kagami clear depth"),
                color_attachments: &[],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(value),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: has_stencil.then_some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(0),
                        store: wgpu::StoreOp::Store,
                    }),
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
        }
        self.submit(encoder);
    }

    fn transfer_to_default(&mut self) {
        let Some(frame_view) = self.frame_view.clone() else {
            log::debug!("transfer_to_default with no frame view installed, skipped");
            return;
        };
        let mut encoder = self.encoder("kagami transfer encoder");
        self.blitter.blit(
            &self.device,
            &mut encoder,
            &self.canvas.color_view,
            &frame_view,
            self.canvas.format,
            1,
        );
        self.submit(encoder);
    }

    fn draw_quad(&mut self) {
        // `Draw=Buffer` feeds the accumulated canvas through the currently
        // bound target. Slot 0 bound to the canvas itself would self-sample.
        let Some(handle) = self.bound_color[0] else {
            log::debug!("Draw=Buffer with the default attachment bound, skipped");
            return;
        };
        let Some(target) = self.targets.get(&handle.index()) else {
            return;
        };
        let (dst, samples) = match &target.msaa_view {
            Some(view) => (view, 4),
            None => (&target.attach_view, 1),
        };
        let mut encoder = self.encoder("kagami quad encoder");
        self.blitter.blit(
            &self.device,
            &mut encoder,
            &self.canvas.color_view,
            dst,
            target.format,
            samples,
        );
        self.submit(encoder);
    }
}
