use crate::effect::Parameter;

// ── Classification vocabulary ─────────────────────────────────────────────

/// Which scene object a matrix or geometry semantic is relative to,
/// selected by the `Object` annotation (`"Camera"` is the default).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ObjectRef {
    #[default]
    Camera,
    Light,
}

/// Base matrix semantics, before any suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatrixKind {
    World,
    View,
    Projection,
    WorldView,
    ViewProjection,
    WorldViewProjection,
}

pub const MATRIX_KINDS: usize = 6;

/// Matrix transform suffix (`WORLDINVERSETRANSPOSE` etc.).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatrixVariant {
    Plain,
    Inverse,
    Transpose,
    InverseTranspose,
}

pub const MATRIX_VARIANTS: usize = 4;

/// Material color channels, relative to `Object = Geometry | Light`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterialChannel {
    Diffuse,
    Ambient,
    Emissive,
    Specular,
    SpecularPower,
    ToonColor,
    EdgeColor,
}

pub const MATERIAL_CHANNELS: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MaterialObject {
    #[default]
    Geometry,
    Light,
}

/// The closed semantic vocabulary.
///
/// Produced exactly once per parameter at `set_effect`; every later
/// dispatch (setters and the script interpreter alike) switches on this
/// enum, never on annotation text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Semantic {
    Matrix { kind: MatrixKind, variant: MatrixVariant, object: ObjectRef },
    Material { channel: MaterialChannel, object: MaterialObject },
    Position { object: ObjectRef },
    Direction { object: ObjectRef },
    Time { sync_in_edit: bool },
    ElapsedTime { sync_in_edit: bool },
    ControlObject,
    RenderColorTarget,
    RenderDepthStencilTarget,
    AnimatedTexture,
    TextureValue,
    /// `SELFSHADOWVPMAT`: the self-shadow light view-projection matrix.
    SelfShadowViewProjection,
    StandardsGlobal,
}

// ── Classification ────────────────────────────────────────────────────────

/// Classifies a parameter by its semantic string and `Object` annotation.
///
/// Matching is case-sensitive over the fixed table below (sampler-state
/// names, handled elsewhere, are the sole case-insensitive comparison in
/// the engine). Unrecognized semantics classify as `None`: the parameter
/// is still addressable by name but no binding slot will write it.
pub fn classify(parameter: &Parameter) -> Option<Semantic> {
    let semantic = parameter.semantic.as_str();
    if semantic.is_empty() {
        return None;
    }

    if let Some((kind, variant)) = parse_matrix(semantic) {
        let object = match parameter.annotations.string("Object") {
            Some("Light") => ObjectRef::Light,
            _ => ObjectRef::Camera,
        };
        return Some(Semantic::Matrix { kind, variant, object });
    }

    if let Some(channel) = parse_material_channel(semantic) {
        let object = match parameter.annotations.string("Object") {
            Some("Light") => MaterialObject::Light,
            _ => MaterialObject::Geometry,
        };
        return Some(Semantic::Material { channel, object });
    }

    let object = match parameter.annotations.string("Object") {
        Some("Light") => ObjectRef::Light,
        _ => ObjectRef::Camera,
    };
    let sync_in_edit = parameter.annotations.boolean("SyncInEditMode").unwrap_or(false);

    match semantic {
        "POSITION" => Some(Semantic::Position { object }),
        "DIRECTION" => Some(Semantic::Direction { object }),
        "TIME" => Some(Semantic::Time { sync_in_edit }),
        "ELAPSEDTIME" => Some(Semantic::ElapsedTime { sync_in_edit }),
        "CONTROLOBJECT" => Some(Semantic::ControlObject),
        "RENDERCOLORTARGET" => Some(Semantic::RenderColorTarget),
        "RENDERDEPTHSTENCILTARGET" => Some(Semantic::RenderDepthStencilTarget),
        "ANIMATEDTEXTURE" => Some(Semantic::AnimatedTexture),
        "TEXTUREVALUE" => Some(Semantic::TextureValue),
        "SELFSHADOWVPMAT" => Some(Semantic::SelfShadowViewProjection),
        "STANDARDSGLOBAL" => Some(Semantic::StandardsGlobal),
        _ => None,
    }
}

fn parse_matrix(semantic: &str) -> Option<(MatrixKind, MatrixVariant)> {
    // Longest suffix first: INVERSETRANSPOSE contains both shorter forms.
    let (base, variant) = if let Some(base) = semantic.strip_suffix("INVERSETRANSPOSE") {
        (base, MatrixVariant::InverseTranspose)
    } else if let Some(base) = semantic.strip_suffix("TRANSPOSE") {
        (base, MatrixVariant::Transpose)
    } else if let Some(base) = semantic.strip_suffix("INVERSE") {
        (base, MatrixVariant::Inverse)
    } else {
        (semantic, MatrixVariant::Plain)
    };

    let kind = match base {
        "WORLD" => MatrixKind::World,
        "VIEW" => MatrixKind::View,
        "PROJECTION" => MatrixKind::Projection,
        "WORLDVIEW" => MatrixKind::WorldView,
        "VIEWPROJECTION" => MatrixKind::ViewProjection,
        "WORLDVIEWPROJECTION" => MatrixKind::WorldViewProjection,
        _ => return None,
    };
    Some((kind, variant))
}

fn parse_material_channel(semantic: &str) -> Option<MaterialChannel> {
    match semantic {
        "DIFFUSE" => Some(MaterialChannel::Diffuse),
        "AMBIENT" => Some(MaterialChannel::Ambient),
        "EMISSIVE" => Some(MaterialChannel::Emissive),
        "SPECULAR" => Some(MaterialChannel::Specular),
        "SPECULARPOWER" => Some(MaterialChannel::SpecularPower),
        "TOONCOLOR" => Some(MaterialChannel::ToonColor),
        "EDGECOLOR" => Some(MaterialChannel::EdgeColor),
        _ => None,
    }
}
