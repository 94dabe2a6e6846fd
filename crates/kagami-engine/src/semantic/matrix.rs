use glam::Mat4;

use crate::effect::{Effect, ParameterId, ParameterValue};

use super::classify::{MATRIX_KINDS, MATRIX_VARIANTS, MatrixKind, MatrixVariant, ObjectRef};

/// Transforms for one relative object (camera or light), supplied by the
/// embedding render engine each frame.
#[derive(Debug, Clone, Copy)]
pub struct TransformSet {
    pub world: Mat4,
    pub view: Mat4,
    pub projection: Mat4,
}

impl TransformSet {
    fn base(&self, kind: MatrixKind) -> Mat4 {
        match kind {
            MatrixKind::World => self.world,
            MatrixKind::View => self.view,
            MatrixKind::Projection => self.projection,
            MatrixKind::WorldView => self.view * self.world,
            MatrixKind::ViewProjection => self.projection * self.view,
            MatrixKind::WorldViewProjection => self.projection * self.view * self.world,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct MatrixSlots {
    slots: [[Option<ParameterId>; MATRIX_VARIANTS]; MATRIX_KINDS],
}

impl MatrixSlots {
    fn slot(&mut self, kind: MatrixKind, variant: MatrixVariant) -> &mut Option<ParameterId> {
        &mut self.slots[kind as usize][variant as usize]
    }

    fn update(&self, effect: &mut Effect, transforms: &TransformSet) {
        for (k, per_kind) in self.slots.iter().enumerate() {
            if per_kind.iter().all(Option::is_none) {
                continue;
            }
            let base = transforms.base(kind_of(k));
            for (v, slot) in per_kind.iter().enumerate() {
                let Some(id) = *slot else { continue };
                let m = match variant_of(v) {
                    MatrixVariant::Plain => base,
                    MatrixVariant::Inverse => base.inverse(),
                    MatrixVariant::Transpose => base.transpose(),
                    MatrixVariant::InverseTranspose => base.inverse().transpose(),
                };
                effect.write(id, ParameterValue::Float4x4(m.to_cols_array_2d()));
            }
        }
    }
}

fn kind_of(index: usize) -> MatrixKind {
    [
        MatrixKind::World,
        MatrixKind::View,
        MatrixKind::Projection,
        MatrixKind::WorldView,
        MatrixKind::ViewProjection,
        MatrixKind::WorldViewProjection,
    ][index]
}

fn variant_of(index: usize) -> MatrixVariant {
    [
        MatrixVariant::Plain,
        MatrixVariant::Inverse,
        MatrixVariant::Transpose,
        MatrixVariant::InverseTranspose,
    ][index]
}

/// Camera- and light-relative matrix uniform slots.
///
/// Every slot is optional; a setter touching an unbound slot is a no-op
/// since most semantics are optional per effect.
#[derive(Debug, Clone, Copy, Default)]
pub struct MatrixBindings {
    camera: MatrixSlots,
    light: MatrixSlots,
}

impl MatrixBindings {
    /// Stores a classified matrix parameter. The first declaration of a
    /// role wins; a second is ignored with a warning.
    pub fn bind(
        &mut self,
        kind: MatrixKind,
        variant: MatrixVariant,
        object: ObjectRef,
        id: ParameterId,
        name: &str,
    ) {
        let slots = match object {
            ObjectRef::Camera => &mut self.camera,
            ObjectRef::Light => &mut self.light,
        };
        let slot = slots.slot(kind, variant);
        if slot.is_some() {
            log::warn!("matrix semantic {kind:?}/{variant:?}/{object:?} already bound, ignoring {name}");
            return;
        }
        *slot = Some(id);
    }

    /// Writes all bound camera- and light-relative variants. Each variant
    /// is computed independently and skipped when unbound.
    pub fn update(&self, effect: &mut Effect, camera: &TransformSet, light: &TransformSet) {
        self.camera.update(effect, camera);
        self.light.update(effect, light);
    }

    pub fn invalidate(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::{Parameter, ParameterType};
    use glam::Vec3;

    fn fx(names: &[&str]) -> Effect {
        let mut b = Effect::builder();
        for n in names {
            b = b.parameter(Parameter::new(*n, ParameterType::Float4x4));
        }
        b.build()
    }

    fn transforms() -> TransformSet {
        TransformSet {
            world: Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0)),
            view: Mat4::look_at_rh(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y),
            projection: Mat4::perspective_rh(1.0, 1.5, 0.1, 100.0),
        }
    }

    #[test]
    fn unbound_update_is_noop() {
        let mut effect = fx(&["M"]);
        let bindings = MatrixBindings::default();
        let t = transforms();
        bindings.update(&mut effect, &t, &t);
        let m = effect.find_parameter("M").unwrap();
        assert_eq!(*effect.value(m), ParameterValue::Empty);
    }

    #[test]
    fn wvp_product_order() {
        let mut effect = fx(&["WVP"]);
        let id = effect.find_parameter("WVP").unwrap();
        let mut bindings = MatrixBindings::default();
        bindings.bind(
            MatrixKind::WorldViewProjection,
            MatrixVariant::Plain,
            ObjectRef::Camera,
            id,
            "WVP",
        );
        let t = transforms();
        bindings.update(&mut effect, &t, &t);

        let expected = (t.projection * t.view * t.world).to_cols_array_2d();
        assert_eq!(*effect.value(id), ParameterValue::Float4x4(expected));
    }

    #[test]
    fn inverse_transpose_variant() {
        let mut effect = fx(&["WIT"]);
        let id = effect.find_parameter("WIT").unwrap();
        let mut bindings = MatrixBindings::default();
        bindings.bind(MatrixKind::World, MatrixVariant::InverseTranspose, ObjectRef::Camera, id, "WIT");
        let t = transforms();
        bindings.update(&mut effect, &t, &t);

        let expected = t.world.inverse().transpose().to_cols_array_2d();
        assert_eq!(*effect.value(id), ParameterValue::Float4x4(expected));
    }

    #[test]
    fn first_binding_wins() {
        let mut effect = fx(&["A", "B"]);
        let a = effect.find_parameter("A").unwrap();
        let b = effect.find_parameter("B").unwrap();
        let mut bindings = MatrixBindings::default();
        bindings.bind(MatrixKind::World, MatrixVariant::Plain, ObjectRef::Camera, a, "A");
        bindings.bind(MatrixKind::World, MatrixVariant::Plain, ObjectRef::Camera, b, "B");
        let t = transforms();
        bindings.update(&mut effect, &t, &t);

        assert_ne!(*effect.value(a), ParameterValue::Empty);
        assert_eq!(*effect.value(b), ParameterValue::Empty);
    }
}
