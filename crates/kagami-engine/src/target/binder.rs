use crate::coords::Viewport;
use crate::render::backend::EffectBackend;

use super::arena::{RenderTargetArena, TargetHandle};

pub const COLOR_SLOTS: usize = 4;

/// Tracks what is bound to color slots 0..=3 and the depth-stencil slot,
/// and enforces the mandatory read-before-switch ordering: any displaced
/// multisampled target is resolved (and a mipmapped one regenerated)
/// before the slot is rebound.
#[derive(Debug, Default)]
pub struct TargetBinder {
    color: [Option<TargetHandle>; COLOR_SLOTS],
    depth: Option<TargetHandle>,
}

impl TargetBinder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bound_color(&self, slot: usize) -> Option<TargetHandle> {
        self.color[slot]
    }

    pub fn bound_depth(&self) -> Option<TargetHandle> {
        self.depth
    }

    /// Binds `target` to a color slot, or restores the default attachment
    /// for `None`. `final_transfer` is set when no post effect is chained;
    /// unbinding slot 0 then transfers the accumulated image to the window
    /// framebuffer.
    pub fn bind_color(
        &mut self,
        slot: usize,
        target: Option<TargetHandle>,
        arena: &mut RenderTargetArena,
        viewport: Viewport,
        backend: &mut dyn EffectBackend,
        final_transfer: bool,
    ) {
        if self.color[slot] == target {
            return;
        }
        self.flush_displaced(self.color[slot], arena, backend);

        if let Some(handle) = target {
            arena.ensure_allocated(handle, viewport, backend);
            arena.mark_written(handle);
        }
        self.color[slot] = target;
        backend.set_color_target(slot, target);

        if slot == 0 && target.is_none() && final_transfer {
            backend.transfer_to_default();
        }
    }

    pub fn bind_depth(
        &mut self,
        target: Option<TargetHandle>,
        arena: &mut RenderTargetArena,
        viewport: Viewport,
        backend: &mut dyn EffectBackend,
    ) {
        if self.depth == target {
            return;
        }
        if let Some(handle) = target {
            arena.ensure_allocated(handle, viewport, backend);
        }
        self.depth = target;
        backend.set_depth_stencil_target(target);
    }

    /// Resolves and unbinds everything still attached. Called when a
    /// script execution finishes so the next technique starts from the
    /// default framebuffer.
    pub fn finish(
        &mut self,
        arena: &mut RenderTargetArena,
        backend: &mut dyn EffectBackend,
        final_transfer: bool,
    ) {
        for slot in (0..COLOR_SLOTS).rev() {
            if self.color[slot].is_some() {
                self.bind_color(slot, None, arena, Viewport::default(), backend, final_transfer);
            }
        }
        if self.depth.is_some() {
            self.bind_depth(None, arena, Viewport::default(), backend);
        }
    }

    /// Drops bound-slot state without emitting backend calls.
    pub fn invalidate(&mut self) {
        *self = Self::default();
    }

    fn flush_displaced(
        &self,
        displaced: Option<TargetHandle>,
        arena: &mut RenderTargetArena,
        backend: &mut dyn EffectBackend,
    ) {
        let Some(handle) = displaced else {
            return;
        };
        if arena.take_pending_resolve(handle) {
            backend.resolve_msaa(handle);
        }
        if arena.desc(handle).mipmap {
            backend.generate_mipmaps(handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::ParameterId;
    use crate::render::backend::{TraceBackend, TraceOp};
    use crate::semantic::{ColorTargetDecl, SizeSpec};

    fn arena_with(names: &[(&str, bool)]) -> RenderTargetArena {
        let colors: Vec<ColorTargetDecl> = names
            .iter()
            .map(|(name, msaa)| ColorTargetDecl {
                parameter: ParameterId(0),
                name: (*name).into(),
                size: SizeSpec::Viewport,
                format: None,
                msaa: *msaa,
                mipmap: false,
                sampler: None,
            })
            .collect();
        RenderTargetArena::new(&colors, &[])
    }

    fn ops_after<F: FnOnce(&mut TargetBinder, &mut RenderTargetArena, &mut TraceBackend)>(
        arena: &mut RenderTargetArena,
        f: F,
    ) -> Vec<TraceOp> {
        let mut binder = TargetBinder::new();
        let mut backend = TraceBackend::new();
        f(&mut binder, arena, &mut backend);
        backend.ops
    }

    #[test]
    fn msaa_resolved_before_every_rebind() {
        // Exercise bind/unbind sequences across all four slots: whenever a
        // slot that held the MSAA target is rebound, the resolve must come
        // first.
        let mut arena = arena_with(&[("Msaa", true), ("Plain", false)]);
        let msaa = arena.lookup("Msaa").unwrap();
        let plain = arena.lookup("Plain").unwrap();
        let vp = Viewport::new(64, 64);

        for slot in 0..COLOR_SLOTS {
            let ops = ops_after(&mut arena, |binder, arena, backend| {
                binder.bind_color(slot, Some(msaa), arena, vp, backend, false);
                binder.bind_color(slot, Some(plain), arena, vp, backend, false);
            });
            let resolve_at = ops.iter().position(|op| *op == TraceOp::ResolveMsaa(msaa));
            let rebind_at = ops
                .iter()
                .position(|op| *op == TraceOp::SetColorTarget { slot, target: Some(plain) });
            assert!(resolve_at.unwrap() < rebind_at.unwrap(), "slot {slot}: {ops:?}");
        }
    }

    #[test]
    fn msaa_resolved_before_unbind() {
        let mut arena = arena_with(&[("Msaa", true)]);
        let msaa = arena.lookup("Msaa").unwrap();
        let vp = Viewport::new(64, 64);

        let ops = ops_after(&mut arena, |binder, arena, backend| {
            binder.bind_color(0, Some(msaa), arena, vp, backend, false);
            binder.bind_color(0, None, arena, vp, backend, false);
        });
        assert_eq!(
            ops.last(),
            Some(&TraceOp::SetColorTarget { slot: 0, target: None })
        );
        assert!(ops.contains(&TraceOp::ResolveMsaa(msaa)));
    }

    #[test]
    fn plain_target_never_resolves() {
        let mut arena = arena_with(&[("Plain", false)]);
        let plain = arena.lookup("Plain").unwrap();
        let vp = Viewport::new(64, 64);

        let ops = ops_after(&mut arena, |binder, arena, backend| {
            binder.bind_color(0, Some(plain), arena, vp, backend, false);
            binder.bind_color(0, None, arena, vp, backend, false);
        });
        assert!(!ops.iter().any(|op| matches!(op, TraceOp::ResolveMsaa(_))));
    }

    #[test]
    fn rebinding_same_target_is_noop() {
        let mut arena = arena_with(&[("RT", false)]);
        let rt = arena.lookup("RT").unwrap();
        let vp = Viewport::new(64, 64);

        let ops = ops_after(&mut arena, |binder, arena, backend| {
            binder.bind_color(0, Some(rt), arena, vp, backend, false);
            binder.bind_color(0, Some(rt), arena, vp, backend, false);
        });
        let binds = ops
            .iter()
            .filter(|op| matches!(op, TraceOp::SetColorTarget { .. }))
            .count();
        assert_eq!(binds, 1);
    }

    #[test]
    fn final_unbind_transfers_to_default() {
        let mut arena = arena_with(&[("RT", false)]);
        let rt = arena.lookup("RT").unwrap();
        let vp = Viewport::new(64, 64);

        let ops = ops_after(&mut arena, |binder, arena, backend| {
            binder.bind_color(0, Some(rt), arena, vp, backend, true);
            binder.bind_color(0, None, arena, vp, backend, true);
        });
        assert_eq!(ops.last(), Some(&TraceOp::TransferToDefault));

        // With a chained post effect, no transfer happens.
        let mut arena = arena_with(&[("RT", false)]);
        let rt = arena.lookup("RT").unwrap();
        let ops = ops_after(&mut arena, |binder, arena, backend| {
            binder.bind_color(0, Some(rt), arena, vp, backend, false);
            binder.bind_color(0, None, arena, vp, backend, false);
        });
        assert!(!ops.contains(&TraceOp::TransferToDefault));
    }
}
