use crate::target::{TargetDesc, TargetHandle};

/// Render-state mutation surface driven by the script interpreter and the
/// target binder.
///
/// Ordering contracts the binder upholds:
/// - `resolve_msaa` for a multisampled handle arrives before the
///   `set_color_target`/`set_depth_stencil_target` call that displaces it;
/// - `allocate_target` for a handle arrives before its first bind;
/// - `transfer_to_default` arrives only after slot 0 was unbound with no
///   chained post effect.
pub trait EffectBackend {
    /// Allocates the GPU texture for a handle at the resolved pixel size.
    fn allocate_target(&mut self, handle: TargetHandle, desc: &TargetDesc, width: u32, height: u32);

    /// Regenerates the mipmap chain of an allocated target.
    fn generate_mipmaps(&mut self, handle: TargetHandle);

    /// Binds (`Some`) or restores the default attachment for (`None`) one
    /// color slot.
    fn set_color_target(&mut self, slot: usize, target: Option<TargetHandle>);

    fn set_depth_stencil_target(&mut self, target: Option<TargetHandle>);

    /// Resolves a multisampled target into its single-sample texture so it
    /// can be sampled elsewhere.
    fn resolve_msaa(&mut self, handle: TargetHandle);

    fn clear_color(&mut self, value: [f32; 4]);

    fn clear_depth(&mut self, value: f32);

    /// Blits the accumulated image to the window framebuffer. Emitted when
    /// the last color target is unbound and no post effect is chained.
    fn transfer_to_default(&mut self);

    /// Draws the fullscreen quad (`Draw=Buffer`).
    fn draw_quad(&mut self);
}

// ── Trace backend ─────────────────────────────────────────────────────────

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq)]
pub enum TraceOp {
    Allocate { handle: TargetHandle, width: u32, height: u32 },
    GenerateMipmaps(TargetHandle),
    SetColorTarget { slot: usize, target: Option<TargetHandle> },
    SetDepthStencilTarget(Option<TargetHandle>),
    ResolveMsaa(TargetHandle),
    ClearColor([f32; 4]),
    ClearDepth(f32),
    TransferToDefault,
    DrawQuad,
}

/// Backend that records every call instead of touching a GPU.
///
/// Used by the test suite to assert call ordering (MSAA resolve before
/// rebind, lazy allocation) and useful as a script-debugging aid.
#[derive(Debug, Default)]
pub struct TraceBackend {
    pub ops: Vec<TraceOp>,
}

impl TraceBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.ops.clear();
    }
}

impl EffectBackend for TraceBackend {
    fn allocate_target(&mut self, handle: TargetHandle, _desc: &TargetDesc, width: u32, height: u32) {
        self.ops.push(TraceOp::Allocate { handle, width, height });
    }

    fn generate_mipmaps(&mut self, handle: TargetHandle) {
        self.ops.push(TraceOp::GenerateMipmaps(handle));
    }

    fn set_color_target(&mut self, slot: usize, target: Option<TargetHandle>) {
        self.ops.push(TraceOp::SetColorTarget { slot, target });
    }

    fn set_depth_stencil_target(&mut self, target: Option<TargetHandle>) {
        self.ops.push(TraceOp::SetDepthStencilTarget(target));
    }

    fn resolve_msaa(&mut self, handle: TargetHandle) {
        self.ops.push(TraceOp::ResolveMsaa(handle));
    }

    fn clear_color(&mut self, value: [f32; 4]) {
        self.ops.push(TraceOp::ClearColor(value));
    }

    fn clear_depth(&mut self, value: f32) {
        self.ops.push(TraceOp::ClearDepth(value));
    }

    fn transfer_to_default(&mut self) {
        self.ops.push(TraceOp::TransferToDefault);
    }

    fn draw_quad(&mut self) {
        self.ops.push(TraceOp::DrawQuad);
    }
}
