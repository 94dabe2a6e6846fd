//! Effect data model: parameters with annotations, techniques, passes.
//!
//! An [`Effect`] is the CPU-side view of a compiled shader bundle. The
//! loader (external to this crate) constructs one through
//! [`EffectBuilder`]; the engine then classifies every parameter's
//! semantic, builds the technique registry, and parses all scripts.

mod annotation;
mod parameter;
mod technique;

pub use annotation::{AnnotationMap, AnnotationValue};
pub use parameter::{Parameter, ParameterId, ParameterType, ParameterValue, SamplerState};
pub use technique::{Pass, Technique};

use std::collections::HashMap;

/// A compiled shader bundle: flat parameter table plus technique list.
#[derive(Debug, Clone, Default)]
pub struct Effect {
    parameters: Vec<Parameter>,
    techniques: Vec<Technique>,
    by_name: HashMap<String, ParameterId>,
}

impl Effect {
    pub fn builder() -> EffectBuilder {
        EffectBuilder::default()
    }

    pub fn parameters(&self) -> impl Iterator<Item = (ParameterId, &Parameter)> {
        self.parameters.iter().enumerate().map(|(i, p)| (ParameterId(i as u32), p))
    }

    pub fn parameter(&self, id: ParameterId) -> &Parameter {
        &self.parameters[id.index()]
    }

    pub fn parameter_mut(&mut self, id: ParameterId) -> &mut Parameter {
        &mut self.parameters[id.index()]
    }

    pub fn find_parameter(&self, name: &str) -> Option<ParameterId> {
        self.by_name.get(name).copied()
    }

    pub fn techniques(&self) -> &[Technique] {
        &self.techniques
    }

    pub fn technique(&self, name: &str) -> Option<&Technique> {
        self.techniques.iter().find(|t| t.name == name)
    }

    /// Reads a parameter value by id.
    pub fn value(&self, id: ParameterId) -> &ParameterValue {
        &self.parameters[id.index()].value
    }

    /// Writes a parameter value by id. Type agreement with the declaration
    /// is the setter's concern; the table stores whatever was pushed.
    pub fn write(&mut self, id: ParameterId, value: ParameterValue) {
        self.parameters[id.index()].value = value;
    }
}

/// Builds an [`Effect`] from loader output.
///
/// Duplicate parameter names keep the first declaration, matching how
/// effect compilers expose them.
#[derive(Debug, Default)]
pub struct EffectBuilder {
    parameters: Vec<Parameter>,
    techniques: Vec<Technique>,
}

impl EffectBuilder {
    pub fn parameter(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn technique(mut self, technique: Technique) -> Self {
        self.techniques.push(technique);
        self
    }

    pub fn build(self) -> Effect {
        let mut by_name = HashMap::with_capacity(self.parameters.len());
        for (i, p) in self.parameters.iter().enumerate() {
            by_name.entry(p.name.clone()).or_insert(ParameterId(i as u32));
        }
        Effect { parameters: self.parameters, techniques: self.techniques, by_name }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_parameter_by_name() {
        let fx = Effect::builder()
            .parameter(Parameter::new("A", ParameterType::Float))
            .parameter(Parameter::new("B", ParameterType::Int))
            .build();
        let b = fx.find_parameter("B").unwrap();
        assert_eq!(fx.parameter(b).name, "B");
        assert!(fx.find_parameter("C").is_none());
    }

    #[test]
    fn duplicate_name_keeps_first() {
        let fx = Effect::builder()
            .parameter(Parameter::new("A", ParameterType::Float).with_value(ParameterValue::Float(1.0)))
            .parameter(Parameter::new("A", ParameterType::Float).with_value(ParameterValue::Float(2.0)))
            .build();
        let a = fx.find_parameter("A").unwrap();
        assert_eq!(*fx.value(a), ParameterValue::Float(1.0));
    }

    #[test]
    fn write_and_read_back() {
        let mut fx = Effect::builder()
            .parameter(Parameter::new("T", ParameterType::Float))
            .build();
        let t = fx.find_parameter("T").unwrap();
        fx.write(t, ParameterValue::Float(0.5));
        assert_eq!(fx.value(t).as_float(), Some(0.5));
    }
}
