use crate::effect::{Effect, ParameterId, ParameterValue};

use super::classify::{MATERIAL_CHANNELS, MaterialChannel, MaterialObject};

/// Color set for one side of a material semantic: either the current
/// material (`Object = Geometry`) or the scene light (`Object = Light`).
#[derive(Debug, Clone, Copy, Default)]
pub struct MaterialColors {
    pub diffuse: [f32; 4],
    pub ambient: [f32; 3],
    pub emissive: [f32; 3],
    pub specular: [f32; 3],
    pub specular_power: f32,
    pub toon_color: [f32; 4],
    pub edge_color: [f32; 4],
}

#[derive(Debug, Clone, Copy, Default)]
struct ChannelSlots {
    slots: [Option<ParameterId>; MATERIAL_CHANNELS],
}

impl ChannelSlots {
    fn update(&self, effect: &mut Effect, colors: &MaterialColors) {
        for (c, slot) in self.slots.iter().enumerate() {
            let Some(id) = *slot else { continue };
            let value = match channel_of(c) {
                MaterialChannel::Diffuse => ParameterValue::Float4(colors.diffuse),
                MaterialChannel::Ambient => ParameterValue::Float3(colors.ambient),
                MaterialChannel::Emissive => ParameterValue::Float3(colors.emissive),
                MaterialChannel::Specular => ParameterValue::Float3(colors.specular),
                MaterialChannel::SpecularPower => ParameterValue::Float(colors.specular_power),
                MaterialChannel::ToonColor => ParameterValue::Float4(colors.toon_color),
                MaterialChannel::EdgeColor => ParameterValue::Float4(colors.edge_color),
            };
            effect.write(id, value);
        }
    }
}

fn channel_of(index: usize) -> MaterialChannel {
    [
        MaterialChannel::Diffuse,
        MaterialChannel::Ambient,
        MaterialChannel::Emissive,
        MaterialChannel::Specular,
        MaterialChannel::SpecularPower,
        MaterialChannel::ToonColor,
        MaterialChannel::EdgeColor,
    ][index]
}

/// Material color uniform slots, split by the `Object` annotation.
///
/// Geometry-side values change per material draw; light-side values change
/// once per frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaterialBindings {
    geometry: ChannelSlots,
    light: ChannelSlots,
}

impl MaterialBindings {
    pub fn bind(&mut self, channel: MaterialChannel, object: MaterialObject, id: ParameterId, name: &str) {
        let slots = match object {
            MaterialObject::Geometry => &mut self.geometry.slots,
            MaterialObject::Light => &mut self.light.slots,
        };
        let slot = &mut slots[channel as usize];
        if slot.is_some() {
            log::warn!("material semantic {channel:?}/{object:?} already bound, ignoring {name}");
            return;
        }
        *slot = Some(id);
    }

    /// Writes the per-material (geometry-side) channels.
    pub fn update_geometry(&self, effect: &mut Effect, colors: &MaterialColors) {
        self.geometry.update(effect, colors);
    }

    /// Writes the light-side channels.
    pub fn update_light(&self, effect: &mut Effect, colors: &MaterialColors) {
        self.light.update(effect, colors);
    }

    pub fn invalidate(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::{Parameter, ParameterType};

    #[test]
    fn geometry_and_light_sides_are_independent() {
        let mut effect = Effect::builder()
            .parameter(Parameter::new("MatDiffuse", ParameterType::Float4))
            .parameter(Parameter::new("LightDiffuse", ParameterType::Float4))
            .build();
        let mat = effect.find_parameter("MatDiffuse").unwrap();
        let light = effect.find_parameter("LightDiffuse").unwrap();

        let mut bindings = MaterialBindings::default();
        bindings.bind(MaterialChannel::Diffuse, MaterialObject::Geometry, mat, "MatDiffuse");
        bindings.bind(MaterialChannel::Diffuse, MaterialObject::Light, light, "LightDiffuse");

        let colors = MaterialColors { diffuse: [1.0, 0.5, 0.25, 1.0], ..Default::default() };
        bindings.update_geometry(&mut effect, &colors);

        assert_eq!(*effect.value(mat), ParameterValue::Float4([1.0, 0.5, 0.25, 1.0]));
        assert_eq!(*effect.value(light), ParameterValue::Empty);
    }

    #[test]
    fn specular_power_is_scalar() {
        let mut effect = Effect::builder()
            .parameter(Parameter::new("Power", ParameterType::Float))
            .build();
        let id = effect.find_parameter("Power").unwrap();
        let mut bindings = MaterialBindings::default();
        bindings.bind(MaterialChannel::SpecularPower, MaterialObject::Geometry, id, "Power");

        let colors = MaterialColors { specular_power: 32.0, ..Default::default() };
        bindings.update_geometry(&mut effect, &colors);
        assert_eq!(*effect.value(id), ParameterValue::Float(32.0));
    }
}
