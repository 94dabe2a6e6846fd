//! Semantic parameter bindings.
//!
//! Classification of every effect parameter happens once, at
//! `set_effect`: [`classify`] turns the raw semantic string plus `Object`
//! annotation into a closed [`Semantic`] value, and [`SemanticBindings`]
//! stores the parameter's table index into the matching slot. Per-frame
//! setters then dispatch purely on slots, with no string comparison after
//! load. Setters on unbound slots are silent no-ops: most semantics are
//! optional per effect.

mod classify;
mod control;
mod material;
mod matrix;
mod scene;
mod texture;

pub use classify::{
    MaterialChannel, MaterialObject, MatrixKind, MatrixVariant, ObjectRef, Semantic, classify,
};
pub use control::{ControlObjectBindings, ControlObjectResolver, ControlObjectSlot};
pub use material::{MaterialBindings, MaterialColors};
pub use matrix::{MatrixBindings, TransformSet};
pub use scene::{FrameClock, GeometryBindings, TimeBindings};
pub use texture::{
    AnimatedTextureBindings, AnimatedTextureSlot, ColorTargetDecl, DepthTargetDecl, SizeSpec,
    TextureValueBindings, minfilter_uses_mipmaps, wants_mipmaps,
};

use crate::effect::{Effect, ParameterId};

/// All binding slots of one effect.
#[derive(Debug, Clone, Default)]
pub struct SemanticBindings {
    pub matrices: MatrixBindings,
    pub materials: MaterialBindings,
    pub geometry: GeometryBindings,
    pub time: TimeBindings,
    pub control_objects: ControlObjectBindings,
    pub animated_textures: AnimatedTextureBindings,
    pub texture_values: TextureValueBindings,
    pub color_targets: Vec<ColorTargetDecl>,
    pub depth_targets: Vec<DepthTargetDecl>,
    pub self_shadow: Option<ParameterId>,
}

impl SemanticBindings {
    /// Classifies every parameter of the effect and wires the consuming
    /// samplers to their render-color-target declarations.
    pub fn from_effect(effect: &Effect) -> Self {
        let mut bindings = Self::default();
        for (id, _) in effect.parameters() {
            bindings.add_parameter(effect, id);
        }
        bindings.link_samplers(effect);
        bindings
    }

    /// Classifies one parameter and stores it into the matching slot.
    /// Unclassifiable parameters are skipped; they remain addressable by
    /// name through the effect table.
    pub fn add_parameter(&mut self, effect: &Effect, id: ParameterId) {
        let parameter = effect.parameter(id);
        let Some(semantic) = classify(parameter) else {
            return;
        };
        match semantic {
            Semantic::Matrix { kind, variant, object } => {
                self.matrices.bind(kind, variant, object, id, &parameter.name);
            }
            Semantic::Material { channel, object } => {
                self.materials.bind(channel, object, id, &parameter.name);
            }
            Semantic::Position { object } => self.geometry.bind_position(object, id),
            Semantic::Direction { object } => self.geometry.bind_direction(object, id),
            Semantic::Time { sync_in_edit } => self.time.bind_time(sync_in_edit, id),
            Semantic::ElapsedTime { sync_in_edit } => self.time.bind_elapsed(sync_in_edit, id),
            Semantic::ControlObject => {
                let Some(object) = parameter.annotations.string("name") else {
                    log::warn!("CONTROLOBJECT parameter {} has no name annotation", parameter.name);
                    return;
                };
                let item = parameter.annotations.string("item").map(str::to_owned);
                self.control_objects.bind(id, object.to_owned(), item);
            }
            Semantic::RenderColorTarget => {
                self.color_targets.push(ColorTargetDecl::from_parameter(id, parameter));
            }
            Semantic::RenderDepthStencilTarget => {
                self.depth_targets.push(DepthTargetDecl::from_parameter(id, parameter));
            }
            Semantic::AnimatedTexture => self.animated_textures.bind(id, parameter),
            Semantic::TextureValue => self.texture_values.bind(id, parameter, effect),
            Semantic::SelfShadowViewProjection => {
                if self.self_shadow.is_none() {
                    self.self_shadow = Some(id);
                }
            }
            // Consumed by the technique registry, not a binding slot.
            Semantic::StandardsGlobal => {}
        }
    }

    /// Connects sampler parameters to the color targets they consume (via
    /// the case-insensitive `Texture` sampler state) and folds their
    /// MINFILTER mipmap hint into the target declaration.
    fn link_samplers(&mut self, effect: &Effect) {
        for (sampler_id, sampler) in effect.parameters() {
            if !sampler.ty.is_sampler() {
                continue;
            }
            let Some(texture_name) = sampler.sampler_state("Texture") else {
                continue;
            };
            let Some(decl) = self.color_targets.iter_mut().find(|d| d.name == texture_name) else {
                continue;
            };
            if decl.sampler.is_none() {
                decl.sampler = Some(sampler_id);
            }
            decl.mipmap |= minfilter_uses_mipmaps(sampler);
        }
    }

    /// Drops every held parameter reference. GPU resources are untouched;
    /// the target arena and backend own those.
    pub fn invalidate(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::{AnnotationMap, AnnotationValue, Parameter, ParameterType};

    fn sample_effect() -> Effect {
        Effect::builder()
            .parameter(
                Parameter::new("ScratchRT", ParameterType::Texture)
                    .with_semantic("RENDERCOLORTARGET")
                    .with_annotations(
                        AnnotationMap::new().with("MipLevels", AnnotationValue::Int(1)),
                    ),
            )
            .parameter(
                Parameter::new("ScratchSampler", ParameterType::Sampler2D)
                    .with_sampler_state("Texture", "ScratchRT")
                    .with_sampler_state("MinFilter", "LINEAR_MIPMAP_LINEAR"),
            )
            .parameter(Parameter::new("WVP", ParameterType::Float4x4).with_semantic("WORLDVIEWPROJECTION"))
            .build()
    }

    #[test]
    fn sampler_linked_to_color_target() {
        let effect = sample_effect();
        let bindings = SemanticBindings::from_effect(&effect);
        let decl = &bindings.color_targets[0];
        assert_eq!(decl.name, "ScratchRT");
        assert_eq!(decl.sampler, effect.find_parameter("ScratchSampler"));
        // The target's own annotations say no mipmaps, the consuming
        // sampler's MINFILTER says yes; the sampler wins.
        assert!(decl.mipmap);
    }

    #[test]
    fn invalidate_clears_slots() {
        let effect = sample_effect();
        let mut bindings = SemanticBindings::from_effect(&effect);
        assert_eq!(bindings.color_targets.len(), 1);
        bindings.invalidate();
        assert!(bindings.color_targets.is_empty());
    }
}
