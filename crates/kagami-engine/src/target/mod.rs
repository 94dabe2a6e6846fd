//! Offscreen render-target management.
//!
//! Targets declared by RENDERCOLORTARGET / RENDERDEPTHSTENCILTARGET
//! parameters live in an arena addressed by small integer handles. GPU
//! textures are allocated lazily on first script reference; MSAA-resolve
//! state is owned one-to-one by its handle, and the [`TargetBinder`]
//! enforces resolve-before-switch ordering.

mod arena;
mod binder;
pub mod format;

pub use arena::{RenderTargetArena, TargetDesc, TargetHandle, TargetKind};
pub use binder::{TargetBinder, COLOR_SLOTS};
