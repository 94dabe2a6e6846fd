use crate::effect::{Effect, ParameterId, ParameterValue};

use super::classify::ObjectRef;

/// Camera/light position and direction uniform slots.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeometryBindings {
    camera_position: Option<ParameterId>,
    camera_direction: Option<ParameterId>,
    light_position: Option<ParameterId>,
    light_direction: Option<ParameterId>,
}

impl GeometryBindings {
    pub fn bind_position(&mut self, object: ObjectRef, id: ParameterId) {
        let slot = match object {
            ObjectRef::Camera => &mut self.camera_position,
            ObjectRef::Light => &mut self.light_position,
        };
        slot.get_or_insert(id);
    }

    pub fn bind_direction(&mut self, object: ObjectRef, id: ParameterId) {
        let slot = match object {
            ObjectRef::Camera => &mut self.camera_direction,
            ObjectRef::Light => &mut self.light_direction,
        };
        slot.get_or_insert(id);
    }

    pub fn update_camera(&self, effect: &mut Effect, position: [f32; 3], direction: [f32; 3]) {
        if let Some(id) = self.camera_position {
            effect.write(id, ParameterValue::Float3(position));
        }
        if let Some(id) = self.camera_direction {
            effect.write(id, ParameterValue::Float3(direction));
        }
    }

    pub fn update_light(&self, effect: &mut Effect, position: [f32; 3], direction: [f32; 3]) {
        if let Some(id) = self.light_position {
            effect.write(id, ParameterValue::Float3(position));
        }
        if let Some(id) = self.light_direction {
            effect.write(id, ParameterValue::Float3(direction));
        }
    }

    pub fn invalidate(&mut self) {
        *self = Self::default();
    }
}

/// Frame clock fed to TIME / ELAPSEDTIME semantics.
///
/// `project` is the edit-mode timeline clock used when the semantic carries
/// `SyncInEditMode=true`; `system` runs regardless of playback state.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameClock {
    pub system: f32,
    pub system_elapsed: f32,
    pub project: f32,
    pub project_elapsed: f32,
}

/// TIME / ELAPSEDTIME uniform slots, split by the `SyncInEditMode` flag.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeBindings {
    time: Option<ParameterId>,
    time_synced: Option<ParameterId>,
    elapsed: Option<ParameterId>,
    elapsed_synced: Option<ParameterId>,
}

impl TimeBindings {
    pub fn bind_time(&mut self, sync_in_edit: bool, id: ParameterId) {
        let slot = if sync_in_edit { &mut self.time_synced } else { &mut self.time };
        slot.get_or_insert(id);
    }

    pub fn bind_elapsed(&mut self, sync_in_edit: bool, id: ParameterId) {
        let slot = if sync_in_edit { &mut self.elapsed_synced } else { &mut self.elapsed };
        slot.get_or_insert(id);
    }

    pub fn update(&self, effect: &mut Effect, clock: &FrameClock) {
        if let Some(id) = self.time {
            effect.write(id, ParameterValue::Float(clock.system));
        }
        if let Some(id) = self.time_synced {
            effect.write(id, ParameterValue::Float(clock.project));
        }
        if let Some(id) = self.elapsed {
            effect.write(id, ParameterValue::Float(clock.system_elapsed));
        }
        if let Some(id) = self.elapsed_synced {
            effect.write(id, ParameterValue::Float(clock.project_elapsed));
        }
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
    fn sync_flag_selects_clock() {
        let mut effect = Effect::builder()
            .parameter(Parameter::new("T", ParameterType::Float))
            .parameter(Parameter::new("TSync", ParameterType::Float))
            .build();
        let t = effect.find_parameter("T").unwrap();
        let ts = effect.find_parameter("TSync").unwrap();

        let mut bindings = TimeBindings::default();
        bindings.bind_time(false, t);
        bindings.bind_time(true, ts);

        let clock = FrameClock { system: 10.0, project: 2.5, ..Default::default() };
        bindings.update(&mut effect, &clock);

        assert_eq!(effect.value(t).as_float(), Some(10.0));
        assert_eq!(effect.value(ts).as_float(), Some(2.5));
    }

    #[test]
    fn unbound_geometry_update_is_noop() {
        let mut effect = Effect::builder()
            .parameter(Parameter::new("P", ParameterType::Float3))
            .build();
        let bindings = GeometryBindings::default();
        bindings.update_camera(&mut effect, [1.0; 3], [0.0; 3]);
        let p = effect.find_parameter("P").unwrap();
        assert_eq!(*effect.value(p), ParameterValue::Empty);
    }
}
