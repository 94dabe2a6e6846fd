use std::collections::HashMap;

use crate::coords::Viewport;
use crate::render::backend::EffectBackend;
use crate::semantic::{ColorTargetDecl, DepthTargetDecl, SizeSpec};

use super::format;

/// Index into the render-target arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetHandle(u32);

impl TargetHandle {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    Color,
    DepthStencil,
}

/// Static description of one target, derived from its declaring
/// parameter's annotations at `set_effect`.
#[derive(Debug, Clone)]
pub struct TargetDesc {
    pub name: String,
    pub kind: TargetKind,
    pub size: SizeSpec,
    pub format: wgpu::TextureFormat,
    /// 4 for `AntiAlias=true` color targets, 1 otherwise.
    pub sample_count: u32,
    pub mipmap: bool,
}

#[derive(Debug)]
struct Entry {
    desc: TargetDesc,
    /// Pixel size at allocation; `None` until the first script reference.
    allocated: Option<(u32, u32)>,
    /// Set while a multisampled target has unresolved writes.
    needs_resolve: bool,
}

/// Arena of offscreen targets addressed by [`TargetHandle`].
///
/// The arena owns metadata and resolve state only; the backend owns the
/// GPU textures keyed by handle.
#[derive(Debug, Default)]
pub struct RenderTargetArena {
    entries: Vec<Entry>,
    by_name: HashMap<String, TargetHandle>,
}

impl RenderTargetArena {
    /// Registers every declared color and depth-stencil target. Nothing is
    /// allocated yet.
    pub fn new(colors: &[ColorTargetDecl], depths: &[DepthTargetDecl]) -> Self {
        let mut arena = Self::default();
        for decl in colors {
            arena.register(TargetDesc {
                name: decl.name.clone(),
                kind: TargetKind::Color,
                size: decl.size,
                format: format::color_format(decl.format.as_deref()),
                sample_count: if decl.msaa { 4 } else { 1 },
                mipmap: decl.mipmap,
            });
        }
        for decl in depths {
            arena.register(TargetDesc {
                name: decl.name.clone(),
                kind: TargetKind::DepthStencil,
                size: decl.size,
                format: format::depth_format(decl.format.as_deref()),
                sample_count: 1,
                mipmap: false,
            });
        }
        arena
    }

    fn register(&mut self, desc: TargetDesc) {
        let handle = TargetHandle(self.entries.len() as u32);
        if self.by_name.contains_key(&desc.name) {
            log::warn!("render target {:?} declared twice, keeping first", desc.name);
            return;
        }
        self.by_name.insert(desc.name.clone(), handle);
        self.entries.push(Entry { desc, allocated: None, needs_resolve: false });
    }

    pub fn lookup(&self, name: &str) -> Option<TargetHandle> {
        self.by_name.get(name).copied()
    }

    pub fn desc(&self, handle: TargetHandle) -> &TargetDesc {
        &self.entries[handle.index()].desc
    }

    pub fn is_allocated(&self, handle: TargetHandle) -> bool {
        self.entries[handle.index()].allocated.is_some()
    }

    /// Allocates the GPU texture on first use, sized against the current
    /// viewport, and generates the initial mipmap chain when requested.
    pub fn ensure_allocated(
        &mut self,
        handle: TargetHandle,
        viewport: Viewport,
        backend: &mut dyn EffectBackend,
    ) {
        let entry = &mut self.entries[handle.index()];
        if entry.allocated.is_some() {
            return;
        }
        let (width, height) = entry.desc.size.resolve(viewport);
        backend.allocate_target(handle, &entry.desc, width, height);
        entry.allocated = Some((width, height));
        if entry.desc.mipmap {
            backend.generate_mipmaps(handle);
        }
    }

    /// Marks a bound target as written; a multisampled target then needs a
    /// resolve before anything samples it.
    pub fn mark_written(&mut self, handle: TargetHandle) {
        let entry = &mut self.entries[handle.index()];
        entry.needs_resolve = entry.desc.sample_count > 1;
    }

    /// Consumes the pending-resolve flag. Returns true when the caller
    /// must emit a resolve now.
    pub fn take_pending_resolve(&mut self, handle: TargetHandle) -> bool {
        std::mem::take(&mut self.entries[handle.index()].needs_resolve)
    }

    pub fn handles(&self) -> impl Iterator<Item = TargetHandle> + '_ {
        (0..self.entries.len() as u32).map(TargetHandle)
    }

    /// Forgets all registrations and allocation state. GPU textures are the
    /// backend's to release.
    pub fn invalidate(&mut self) {
        self.entries.clear();
        self.by_name.clear();
    }
}
