//! Effect engine facade.
//!
//! One [`EffectEngine`] per loaded effect. `set_effect` performs the whole
//! load-time pipeline (semantic classification, STANDARDSGLOBAL scan,
//! technique registration, script parsing) in staging state and swaps it in
//! only on success. Per-frame setters write through the binding slots; the
//! render engine drives `find_technique` / `execute_technique_passes` per
//! material and `execute_process` once per frame for scripted pre/post
//! effects.

use std::sync::Arc;

use anyhow::{Result, bail};
use kagami_script::{ScriptClass, ScriptOrder};

use crate::coords::Viewport;
use crate::effect::{Effect, ParameterId, ParameterValue};
use crate::interp::{self, ExecCtx};
use crate::registry::{TechniqueEntry, TechniqueQuery, TechniqueRegistry};
use crate::render::backend::EffectBackend;
use crate::render::{DrawCommand, DrawDelegate};
use crate::semantic::{
    ControlObjectResolver, FrameClock, MaterialColors, SemanticBindings, TransformSet,
};
use crate::target::{RenderTargetArena, TargetBinder, TargetHandle};

/// Outcome of [`EffectEngine::find_technique`]: which list the matching
/// technique came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TechniqueMatch {
    Own(usize),
    Fallback(usize),
}

#[derive(Default)]
pub struct EffectEngine {
    effect: Effect,
    bindings: SemanticBindings,
    registry: TechniqueRegistry,
    arena: RenderTargetArena,
    binder: TargetBinder,
    /// Built once from the standard effect and shared across engines.
    fallback: Option<Arc<TechniqueRegistry>>,
    viewport: Viewport,
}

impl EffectEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry of the standard effect, consulted when the effect's own
    /// techniques match nothing. Entries are self-contained, so one shared
    /// registry serves every engine.
    pub fn set_fallback_registry(&mut self, registry: Arc<TechniqueRegistry>) {
        self.fallback = Some(registry);
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Loads an effect: classifies parameters, scans STANDARDSGLOBAL,
    /// registers techniques, parses every script. On error the engine keeps
    /// its previous state.
    pub fn set_effect(&mut self, effect: Effect) -> Result<()> {
        let registry = TechniqueRegistry::from_effect(&effect);
        if registry.entries().is_empty() {
            bail!("effect declares no usable technique");
        }
        let bindings = SemanticBindings::from_effect(&effect);
        let arena = RenderTargetArena::new(&bindings.color_targets, &bindings.depth_targets);

        self.effect = effect;
        self.bindings = bindings;
        self.registry = registry;
        self.arena = arena;
        self.binder.invalidate();
        Ok(())
    }

    /// Drops bindings, registry, and target registrations. GPU textures are
    /// the backend's to release.
    pub fn invalidate(&mut self) {
        self.effect = Effect::default();
        self.bindings.invalidate();
        self.registry = TechniqueRegistry::default();
        self.arena.invalidate();
        self.binder.invalidate();
    }

    pub fn script_class(&self) -> ScriptClass {
        self.registry.class
    }

    pub fn script_order(&self) -> ScriptOrder {
        self.registry.order
    }

    pub fn effect(&self) -> &Effect {
        &self.effect
    }

    pub fn effect_mut(&mut self) -> &mut Effect {
        &mut self.effect
    }

    // ── Per-frame parameter updates ───────────────────────────────────────

    /// Writes all bound matrix variants for the current model, plus the
    /// self-shadow view-projection matrix. Callers put the model's world
    /// matrix into both transform sets.
    pub fn set_model_matrix_parameters(&mut self, camera: &TransformSet, light: &TransformSet) {
        self.bindings.matrices.update(&mut self.effect, camera, light);
        if let Some(id) = self.bindings.self_shadow {
            let m = light.projection * light.view;
            self.effect.write(id, ParameterValue::Float4x4(m.to_cols_array_2d()));
        }
    }

    /// Light-side material colors and light geometry, once per frame.
    pub fn update_model_light_parameters(
        &mut self,
        colors: &MaterialColors,
        position: [f32; 3],
        direction: [f32; 3],
    ) {
        self.bindings.materials.update_light(&mut self.effect, colors);
        self.bindings.geometry.update_light(&mut self.effect, position, direction);
    }

    /// Camera geometry, frame clock, and TEXTUREVALUE forwarding, once per
    /// frame.
    pub fn update_scene_parameters(
        &mut self,
        camera_position: [f32; 3],
        camera_direction: [f32; 3],
        clock: &FrameClock,
    ) {
        self.bindings.geometry.update_camera(&mut self.effect, camera_position, camera_direction);
        self.bindings.time.update(&mut self.effect, clock);
        self.bindings.texture_values.update(&mut self.effect);
    }

    /// Geometry-side material colors, per material draw.
    pub fn set_material_parameters(&mut self, colors: &MaterialColors) {
        self.bindings.materials.update_geometry(&mut self.effect, colors);
    }

    pub fn update_animated_texture_parameters(&mut self, time: f32) {
        self.bindings.animated_textures.update(&mut self.effect, time);
    }

    pub fn update_control_object_parameters(&mut self, resolver: &dyn ControlObjectResolver) {
        self.bindings.control_objects.update(&mut self.effect, resolver);
    }

    // ── Technique selection and execution ─────────────────────────────────

    /// Scans the effect's own techniques first, then the shared fallback
    /// registry.
    pub fn find_technique(&self, query: &TechniqueQuery<'_>) -> Option<TechniqueMatch> {
        if let Some(index) = self.registry.find(query) {
            return Some(TechniqueMatch::Own(index));
        }
        self.fallback
            .as_ref()
            .and_then(|fallback| fallback.find(query))
            .map(TechniqueMatch::Fallback)
    }

    /// Runs the matched technique's script against one material draw.
    ///
    /// `on_script_external` is the chained post effect's render callback;
    /// its absence means this effect finishes the frame, so unbinding the
    /// last color target transfers the image to the window framebuffer.
    pub fn execute_technique_passes(
        &mut self,
        matched: TechniqueMatch,
        draw: DrawCommand,
        backend: &mut dyn EffectBackend,
        delegate: &mut dyn DrawDelegate,
        on_script_external: Option<&mut dyn FnMut(&mut dyn EffectBackend)>,
    ) {
        let Some(entry) = self.entry(matched) else {
            log::warn!("stale technique match {matched:?}, draw skipped");
            return;
        };
        let final_transfer = on_script_external.is_none();
        let mut ctx = ExecCtx {
            effect: &mut self.effect,
            arena: &mut self.arena,
            binder: &mut self.binder,
            backend,
            delegate,
            viewport: self.viewport,
            draw,
            final_transfer,
            on_script_external,
        };
        interp::execute_technique(&entry, &mut ctx);
    }

    /// Runs every registered technique of a scripted pre/post effect, then
    /// restores the default attachments. No-op unless the effect's
    /// STANDARDSGLOBAL order matches `order`.
    ///
    /// Returns true when the effect ran.
    pub fn execute_process(
        &mut self,
        order: ScriptOrder,
        backend: &mut dyn EffectBackend,
        delegate: &mut dyn DrawDelegate,
        mut on_script_external: Option<&mut dyn FnMut(&mut dyn EffectBackend)>,
    ) -> bool {
        if self.registry.order != order || order == ScriptOrder::Standard {
            return false;
        }
        let final_transfer = on_script_external.is_none();
        for entry in self.registry.entries() {
            let mut ctx = ExecCtx {
                effect: &mut self.effect,
                arena: &mut self.arena,
                binder: &mut self.binder,
                backend: &mut *backend,
                delegate: &mut *delegate,
                viewport: self.viewport,
                draw: DrawCommand::default(),
                final_transfer,
                on_script_external: on_script_external.as_deref_mut(),
            };
            interp::execute_technique(entry, &mut ctx);
        }
        self.binder.finish(&mut self.arena, backend, final_transfer);
        true
    }

    // ── Lookups for the framebuffer collaborator ──────────────────────────

    pub fn find_texture(&self, name: &str) -> Option<TargetHandle> {
        self.arena.lookup(name)
    }

    pub fn find_parameter(&self, name: &str) -> Option<ParameterId> {
        self.effect.find_parameter(name)
    }

    fn entry(&self, matched: TechniqueMatch) -> Option<TechniqueEntry> {
        match matched {
            TechniqueMatch::Own(index) => self.registry.entries().get(index).cloned(),
            TechniqueMatch::Fallback(index) => {
                self.fallback.as_ref()?.entries().get(index).cloned()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::{
        AnnotationMap, AnnotationValue, Parameter, ParameterType, Pass, Technique,
    };
    use crate::render::backend::{TraceBackend, TraceOp};

    #[derive(Default)]
    struct RecordingDelegate {
        draws: Vec<DrawCommand>,
        rebinds: usize,
    }

    impl DrawDelegate for RecordingDelegate {
        fn draw_primitives(&mut self, command: &DrawCommand) {
            self.draws.push(*command);
        }

        fn rebind_vertex_bundle(&mut self) {
            self.rebinds += 1;
        }
    }

    fn annotations(entries: &[(&str, &str)]) -> AnnotationMap {
        let mut a = AnnotationMap::new();
        for (k, v) in entries {
            a.insert(*k, AnnotationValue::String((*v).to_owned()));
        }
        a
    }

    fn standards(entries: &[(&str, &str)]) -> Parameter {
        Parameter::new("Std", ParameterType::Float)
            .with_semantic("STANDARDSGLOBAL")
            .with_value(ParameterValue::Float(0.8))
            .with_annotations(annotations(entries))
    }

    fn scripted_technique(name: &str, script: &str) -> Technique {
        Technique::new(name)
            .with_annotations(annotations(&[("Script", script)]))
            .with_pass(Pass::new("P0"))
    }

    fn query(pass: &'static str) -> TechniqueQuery<'static> {
        TechniqueQuery {
            pass,
            material_offset: 0,
            material_count: 1,
            has_texture: false,
            has_sphere_map: false,
            use_toon: false,
        }
    }

    fn run_first(engine: &mut EffectEngine) -> (Vec<TraceOp>, RecordingDelegate) {
        let matched = engine.find_technique(&query("object")).unwrap();
        let mut backend = TraceBackend::new();
        let mut delegate = RecordingDelegate::default();
        engine.execute_technique_passes(
            matched,
            DrawCommand::default(),
            &mut backend,
            &mut delegate,
            None,
        );
        (backend.ops, delegate)
    }

    #[test]
    fn two_pass_technique_draws_each_material_range_once_per_pass() {
        let fx = Effect::builder()
            .parameter(standards(&[
                ("ScriptClass", "object"),
                ("Script", "Technique=Main;"),
            ]))
            .technique(
                Technique::new("Main")
                    .with_annotations(annotations(&[(
                        "Script",
                        "RenderColorTarget0=;Pass=P0;Pass=P1;",
                    )]))
                    .with_pass(Pass::new("P0"))
                    .with_pass(
                        Pass::new("P1")
                            .with_annotations(annotations(&[("Script", "Draw=Geometry;")])),
                    ),
            )
            .build();

        let mut engine = EffectEngine::new();
        engine.set_effect(fx).unwrap();
        let (ops, delegate) = run_first(&mut engine);

        // Already on the default attachment, so the leading unbind changes
        // nothing and the whole run stays on it.
        assert!(!ops.iter().any(|op| matches!(
            op,
            TraceOp::SetColorTarget { target: Some(_), .. }
        )));
        assert_eq!(delegate.draws.len(), 2);
        // No Draw=Buffer anywhere, so the vertex bundle never needed a rebind.
        assert_eq!(delegate.rebinds, 0);
    }

    #[test]
    fn loop_runs_body_count_times() {
        let fx = Effect::builder()
            .technique(scripted_technique("Main", "LoopByCount=3;Pass=P0;LoopEnd=;"))
            .build();
        let mut engine = EffectEngine::new();
        engine.set_effect(fx).unwrap();
        let (_, delegate) = run_first(&mut engine);
        assert_eq!(delegate.draws.len(), 3);
    }

    #[test]
    fn zero_count_loop_skips_body() {
        let fx = Effect::builder()
            .technique(scripted_technique("Main", "LoopByCount=0;Pass=P0;LoopEnd=;"))
            .build();
        let mut engine = EffectEngine::new();
        engine.set_effect(fx).unwrap();
        let (_, delegate) = run_first(&mut engine);
        assert!(delegate.draws.is_empty());
    }

    #[test]
    fn loop_count_from_parameter_and_index_readback() {
        let fx = Effect::builder()
            .parameter(
                Parameter::new("N", ParameterType::Int).with_value(ParameterValue::Int(2)),
            )
            .parameter(Parameter::new("Idx", ParameterType::Int))
            .technique(scripted_technique(
                "Main",
                "LoopByCount=N;LoopGetIndex=Idx;Pass=P0;LoopEnd=;",
            ))
            .build();
        let mut engine = EffectEngine::new();
        engine.set_effect(fx).unwrap();
        let (_, delegate) = run_first(&mut engine);
        assert_eq!(delegate.draws.len(), 2);

        // LoopGetIndex wrote 0 then 1; the last write sticks.
        let idx = engine.find_parameter("Idx").unwrap();
        assert_eq!(*engine.effect().value(idx), ParameterValue::Int(1));
    }

    #[test]
    fn own_registry_preferred_over_fallback() {
        let standard_fx = Effect::builder()
            .technique(scripted_technique("Default", "Pass=P0;"))
            .build();
        let fallback = Arc::new(TechniqueRegistry::from_effect(&standard_fx));

        let fx = Effect::builder()
            .technique(
                Technique::new("EdgeOnly")
                    .with_annotations(annotations(&[("MMDPass", "edge")]))
                    .with_pass(Pass::new("P0")),
            )
            .build();
        let mut engine = EffectEngine::new();
        engine.set_effect(fx).unwrap();
        engine.set_fallback_registry(fallback);

        assert_eq!(engine.find_technique(&query("edge")), Some(TechniqueMatch::Own(0)));
        assert_eq!(engine.find_technique(&query("object")), Some(TechniqueMatch::Fallback(0)));
    }

    #[test]
    fn failed_set_effect_keeps_previous_state() {
        let mut engine = EffectEngine::new();
        let good = Effect::builder()
            .parameter(Parameter::new("Kept", ParameterType::Float))
            .technique(scripted_technique("Main", "Pass=P0;"))
            .build();
        engine.set_effect(good).unwrap();

        let no_techniques = Effect::builder()
            .parameter(Parameter::new("Gone", ParameterType::Float))
            .build();
        assert!(engine.set_effect(no_techniques).is_err());

        assert!(engine.find_parameter("Kept").is_some());
        assert!(engine.find_parameter("Gone").is_none());
    }

    #[test]
    fn execute_process_gates_on_script_order() {
        let fx = Effect::builder()
            .parameter(standards(&[("ScriptOrder", "postprocess")]))
            .parameter(
                Parameter::new("RT", ParameterType::Texture)
                    .with_semantic("RENDERCOLORTARGET"),
            )
            .technique(scripted_technique(
                "Post",
                "RenderColorTarget0=RT;Pass=P0;RenderColorTarget0=;ScriptExternal=Color;",
            ))
            .build();
        let mut engine = EffectEngine::new();
        engine.set_viewport(Viewport::new(320, 240));
        engine.set_effect(fx).unwrap();

        let mut backend = TraceBackend::new();
        let mut delegate = RecordingDelegate::default();
        let mut hook_calls = 0usize;
        let mut hook = |_: &mut dyn EffectBackend| hook_calls += 1;

        let ran = engine.execute_process(
            ScriptOrder::PreProcess,
            &mut backend,
            &mut delegate,
            None,
        );
        assert!(!ran);
        assert!(backend.ops.is_empty());

        let ran = engine.execute_process(
            ScriptOrder::PostProcess,
            &mut backend,
            &mut delegate,
            Some(&mut hook),
        );
        assert!(ran);
        assert_eq!(hook_calls, 1);

        let rt = engine.find_texture("RT").unwrap();
        let bind = backend
            .ops
            .iter()
            .position(|op| *op == TraceOp::SetColorTarget { slot: 0, target: Some(rt) });
        let alloc = backend
            .ops
            .iter()
            .position(|op| matches!(op, TraceOp::Allocate { handle, .. } if *handle == rt));
        assert!(alloc.unwrap() < bind.unwrap());
        // A chained post effect exists, so nothing transfers to the window.
        assert!(!backend.ops.contains(&TraceOp::TransferToDefault));
    }

    #[test]
    fn external_hook_shared_across_process_techniques() {
        let fx = Effect::builder()
            .parameter(standards(&[("ScriptOrder", "postprocess")]))
            .technique(scripted_technique("First", "Pass=P0;ScriptExternal=Color;"))
            .technique(scripted_technique("Second", "Pass=P0;ScriptExternal=Color;"))
            .build();
        let mut engine = EffectEngine::new();
        engine.set_effect(fx).unwrap();

        let mut backend = TraceBackend::new();
        let mut delegate = RecordingDelegate::default();
        let mut hook_calls = 0usize;
        let mut hook = |_: &mut dyn EffectBackend| hook_calls += 1;

        let ran = engine.execute_process(
            ScriptOrder::PostProcess,
            &mut backend,
            &mut delegate,
            Some(&mut hook),
        );
        assert!(ran);
        // Both techniques ran and the one caller hook served each of them.
        assert_eq!(hook_calls, 2);
        assert_eq!(delegate.draws.len(), 2);
    }

    #[test]
    fn mismatched_target_kind_keeps_current_binding() {
        let fx = Effect::builder()
            .parameter(
                Parameter::new("RT", ParameterType::Texture)
                    .with_semantic("RENDERCOLORTARGET"),
            )
            .parameter(
                Parameter::new("DS", ParameterType::Texture)
                    .with_semantic("RENDERDEPTHSTENCILTARGET"),
            )
            .technique(scripted_technique(
                "Main",
                "RenderColorTarget0=DS;RenderDepthStencilTarget=RT;Pass=P0;",
            ))
            .build();
        let mut engine = EffectEngine::new();
        engine.set_viewport(Viewport::new(320, 240));
        engine.set_effect(fx).unwrap();
        let (ops, delegate) = run_first(&mut engine);

        // A depth name in a color slot (and vice versa) must not bind; the
        // run stays on the default attachments end to end.
        assert!(!ops.iter().any(|op| matches!(
            op,
            TraceOp::SetColorTarget { target: Some(_), .. }
                | TraceOp::SetDepthStencilTarget(Some(_))
                | TraceOp::Allocate { .. }
        )));
        assert_eq!(delegate.draws.len(), 1);
    }
}
