use crate::effect::{Effect, ParameterId, ParameterValue};

/// Supplies CONTROLOBJECT values from the scene: the engine knows the
/// object and item names from annotations, the application owns the
/// models/bones/morphs they refer to.
pub trait ControlObjectResolver {
    /// `object` is the `name` annotation (a model name or `"(self)"`),
    /// `item` the optional `item` annotation (bone, morph, or axis name).
    /// Returning `None` leaves the parameter unchanged.
    fn resolve(&self, object: &str, item: Option<&str>) -> Option<ParameterValue>;
}

#[derive(Debug, Clone)]
pub struct ControlObjectSlot {
    pub parameter: ParameterId,
    pub object: String,
    pub item: Option<String>,
}

/// CONTROLOBJECT uniform slots.
#[derive(Debug, Clone, Default)]
pub struct ControlObjectBindings {
    slots: Vec<ControlObjectSlot>,
}

impl ControlObjectBindings {
    pub fn bind(&mut self, parameter: ParameterId, object: String, item: Option<String>) {
        self.slots.push(ControlObjectSlot { parameter, object, item });
    }

    pub fn update(&self, effect: &mut Effect, resolver: &dyn ControlObjectResolver) {
        for slot in &self.slots {
            let Some(value) = resolver.resolve(&slot.object, slot.item.as_deref()) else {
                continue;
            };
            effect.write(slot.parameter, value);
        }
    }

    pub fn invalidate(&mut self) {
        self.slots.clear();
    }
}
