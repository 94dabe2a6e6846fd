//! Render dispatch surface.
//!
//! The interpreter never talks to wgpu directly. Render-state mutations go
//! through [`EffectBackend`] (implemented by [`WgpuBackend`] for real work
//! and [`TraceBackend`] for diagnostics and tests); geometry draws go
//! through the caller-supplied [`DrawDelegate`], since the embedding render
//! engine owns every model's vertex and index buffers.

pub mod backend;
pub mod quad;
pub mod wgpu_backend;

pub use backend::{EffectBackend, TraceBackend, TraceOp};
pub use wgpu_backend::WgpuBackend;

// ── Draw command ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrimitiveMode {
    #[default]
    Triangles,
    TriangleStrip,
    Lines,
    Points,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndexType {
    U16,
    #[default]
    U32,
}

/// One material's index-range draw, supplied by the render engine for each
/// `execute_technique_passes` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DrawCommand {
    pub mode: PrimitiveMode,
    pub count: u32,
    pub index_type: IndexType,
    pub offset: u32,
    pub stride: u32,
    pub start: u32,
    pub end: u32,
}

/// Caller-supplied draw primitives.
///
/// `draw_primitives` issues one indexed draw of the current material's
/// range with the caller's own pipeline state. `rebind_vertex_bundle` is
/// invoked after every fullscreen-quad draw so the model's vertex layout is
/// restored before the next geometry draw.
pub trait DrawDelegate {
    fn draw_primitives(&mut self, command: &DrawCommand);
    fn rebind_vertex_bundle(&mut self);
}
