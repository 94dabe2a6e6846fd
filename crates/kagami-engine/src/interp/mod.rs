//! Script interpreter.
//!
//! Walks a [`kagami_script::ParsedScript`] with a program counter and a single loop
//! register, dispatching each state to a render-state mutation or a draw.
//! Structural validity was established at parse time; the only condition
//! handled here is a render-target name that resolves to nothing or to a
//! target of the wrong kind, which leaves the current target unchanged.

use kagami_script::{LoopCount, ScriptState};

use crate::coords::Viewport;
use crate::effect::{Effect, ParameterId, ParameterValue};
use crate::registry::TechniqueEntry;
use crate::render::backend::EffectBackend;
use crate::render::{DrawCommand, DrawDelegate};
use crate::target::{RenderTargetArena, TargetBinder, TargetHandle, TargetKind};

/// Everything one script execution mutates, borrowed from the engine and
/// its callers for the duration of the call.
///
/// The hook carries its own lifetime `'h`: it belongs to the caller's
/// frame, not to the engine borrows in `'a`, and tying them together would
/// pin every field borrow for as long as the hook lives.
pub struct ExecCtx<'a, 'h> {
    pub effect: &'a mut Effect,
    pub arena: &'a mut RenderTargetArena,
    pub binder: &'a mut TargetBinder,
    pub backend: &'a mut dyn EffectBackend,
    pub delegate: &'a mut dyn DrawDelegate,
    pub viewport: Viewport,
    /// Current material's index range for `Draw=Geometry`.
    pub draw: DrawCommand,
    /// True when no post effect is chained: unbinding the last color
    /// target then transfers the image to the window framebuffer.
    pub final_transfer: bool,
    /// Invoked at `ScriptExternal=Color` to let the chained post effect
    /// render before the remainder of the script runs.
    pub on_script_external: Option<&'a mut (dyn FnMut(&mut dyn EffectBackend) + 'h)>,
}

/// Per-invocation interpreter state. Nested pass scripts copy the clear
/// selection from their technique (state-copy inheritance); overrides stay
/// local to the nested script.
#[derive(Debug, Clone, Copy, Default)]
struct ExecState {
    clear_color: Option<ParameterId>,
    clear_depth: Option<ParameterId>,
    loop_index: i32,
}

/// Executes a technique's script, then its external continuation states.
pub fn execute_technique(entry: &TechniqueEntry, ctx: &mut ExecCtx<'_, '_>) {
    let state = ExecState::default();
    run(&entry.script.states, Some(entry), ctx, state);
    if !entry.script.external.is_empty() {
        run(&entry.script.external, Some(entry), ctx, state);
    }
}

fn run(states: &[ScriptState], technique: Option<&TechniqueEntry>, ctx: &mut ExecCtx<'_, '_>, mut state: ExecState) {
    let mut pc = 0usize;
    let mut iterations_left = 0i32;
    let mut loop_start = 0usize;

    while pc < states.len() {
        match &states[pc] {
            ScriptState::RenderColorTarget { slot, name } => {
                match resolve_target(name.as_deref(), ctx.arena, TargetKind::Color) {
                    Ok(target) => {
                        let final_transfer = ctx.final_transfer;
                        ctx.binder.bind_color(
                            *slot as usize,
                            target,
                            ctx.arena,
                            ctx.viewport,
                            ctx.backend,
                            final_transfer,
                        );
                    }
                    // Unknown name: leave the current target unchanged.
                    Err(()) => {}
                }
            }
            ScriptState::RenderDepthStencilTarget { name } => {
                if let Ok(target) = resolve_target(name.as_deref(), ctx.arena, TargetKind::DepthStencil) {
                    ctx.binder.bind_depth(target, ctx.arena, ctx.viewport, ctx.backend);
                }
            }
            ScriptState::ClearSetColor { parameter } => {
                state.clear_color = find_parameter(ctx.effect, parameter);
            }
            ScriptState::ClearSetDepth { parameter } => {
                state.clear_depth = find_parameter(ctx.effect, parameter);
            }
            ScriptState::ClearColor => {
                let value = state
                    .clear_color
                    .and_then(|id| ctx.effect.value(id).as_float4())
                    .unwrap_or([0.0; 4]);
                ctx.backend.clear_color(value);
            }
            ScriptState::ClearDepth => {
                let value = state
                    .clear_depth
                    .and_then(|id| ctx.effect.value(id).as_float())
                    .unwrap_or(1.0);
                ctx.backend.clear_depth(value);
            }
            ScriptState::LoopByCount { count } => {
                let n = resolve_loop_count(count, ctx.effect).max(0);
                if n == 0 {
                    // Empty loop: continue past the matching LoopEnd.
                    pc = find_loop_end(states, pc);
                } else {
                    iterations_left = n;
                    state.loop_index = 0;
                    loop_start = pc;
                }
            }
            ScriptState::LoopEnd => {
                iterations_left -= 1;
                state.loop_index += 1;
                if iterations_left > 0 {
                    pc = loop_start;
                }
            }
            ScriptState::LoopGetIndex { parameter } => {
                if let Some(id) = find_parameter(ctx.effect, parameter) {
                    ctx.effect.write(id, ParameterValue::Int(state.loop_index));
                }
            }
            ScriptState::Pass { name } => {
                let script = technique.and_then(|t| t.pass_script(name));
                match script {
                    Some(script) => run(&script.states, technique, ctx, state),
                    None => log::warn!("script references unknown pass {name:?}"),
                }
            }
            ScriptState::DrawGeometry => {
                let draw = ctx.draw;
                ctx.delegate.draw_primitives(&draw);
            }
            ScriptState::DrawBuffer => {
                ctx.backend.draw_quad();
                ctx.delegate.rebind_vertex_bundle();
            }
            ScriptState::ScriptExternal => {
                if let Some(hook) = ctx.on_script_external.as_mut() {
                    hook(&mut *ctx.backend);
                }
            }
        }
        pc += 1;
    }
}

/// `Ok(None)` unbinds, `Ok(Some)` binds, `Err` means the name resolved to
/// nothing (or to a target of the wrong kind) and the current target must
/// stay.
fn resolve_target(name: Option<&str>, arena: &RenderTargetArena, kind: TargetKind) -> Result<Option<TargetHandle>, ()> {
    match name {
        None => Ok(None),
        Some(name) => match arena.lookup(name) {
            Some(handle) if arena.desc(handle).kind == kind => Ok(Some(handle)),
            Some(_) => {
                log::warn!("render target {name:?} is not a {kind:?} target, keeping current target");
                Err(())
            }
            None => {
                log::warn!("render target {name:?} not found, keeping current target");
                Err(())
            }
        },
    }
}

fn find_parameter(effect: &Effect, name: &str) -> Option<ParameterId> {
    let found = effect.find_parameter(name);
    if found.is_none() {
        log::warn!("script references unknown parameter {name:?}");
    }
    found
}

fn resolve_loop_count(count: &LoopCount, effect: &Effect) -> i32 {
    match count {
        LoopCount::Literal(n) => *n,
        LoopCount::Parameter(name) => find_parameter(effect, name)
            .and_then(|id| effect.value(id).as_int())
            .unwrap_or(0),
    }
}

fn find_loop_end(states: &[ScriptState], from: usize) -> usize {
    states[from..]
        .iter()
        .position(|s| *s == ScriptState::LoopEnd)
        .map(|offset| from + offset)
        // Parser guarantees a matching LoopEnd; fall through to the end
        // if a hand-built script lacks one.
        .unwrap_or(states.len().saturating_sub(1))
}
