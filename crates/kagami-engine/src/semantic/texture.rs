use crate::coords::Viewport;
use crate::effect::{AnnotationMap, Effect, Parameter, ParameterId, ParameterValue};

// ── Size specification ────────────────────────────────────────────────────

/// How a render target's pixel size is determined, in annotation priority
/// order: explicit Width/Height/Depth or Dimensions, then ViewPortRatio,
/// then the current viewport verbatim.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SizeSpec {
    Explicit { width: u32, height: u32, depth: u32 },
    ViewportRatio { x: f32, y: f32 },
    Viewport,
}

impl SizeSpec {
    pub fn from_annotations(annotations: &AnnotationMap) -> Self {
        if let Some(dims) = annotations.int_vec("Dimensions") {
            let get = |i: usize| dims.get(i).copied().unwrap_or(1).max(1) as u32;
            return Self::Explicit { width: get(0), height: get(1), depth: get(2) };
        }
        let width = annotations.int("Width");
        let height = annotations.int("Height");
        if width.is_some() || height.is_some() {
            return Self::Explicit {
                width: width.unwrap_or(1).max(1) as u32,
                height: height.unwrap_or(1).max(1) as u32,
                depth: annotations.int("Depth").unwrap_or(1).max(1) as u32,
            };
        }
        if let Some(ratio) = annotations.float_vec("ViewPortRatio") {
            let x = ratio.first().copied().unwrap_or(1.0);
            let y = ratio.get(1).copied().unwrap_or(x);
            return Self::ViewportRatio { x, y };
        }
        Self::Viewport
    }

    /// Resolves to a concrete pixel size against the current viewport.
    pub fn resolve(&self, viewport: Viewport) -> (u32, u32) {
        match *self {
            Self::Explicit { width, height, .. } => (width, height),
            Self::ViewportRatio { x, y } => viewport.scaled(x, y),
            Self::Viewport => (viewport.width.max(1), viewport.height.max(1)),
        }
    }
}

// ── Mipmap derivation ─────────────────────────────────────────────────────

/// A texture-bearing parameter wants mipmaps when `MipLevels`/`Level` is
/// anything but 1, or a MINFILTER sampler state names a `*_MIPMAP_*` mode.
pub fn wants_mipmaps(parameter: &Parameter) -> bool {
    for key in ["MipLevels", "Level"] {
        if let Some(levels) = parameter.annotations.int(key)
            && levels != 1
        {
            return true;
        }
    }
    minfilter_uses_mipmaps(parameter)
}

pub fn minfilter_uses_mipmaps(parameter: &Parameter) -> bool {
    parameter
        .sampler_state("MINFILTER")
        .is_some_and(|mode| mode.to_ascii_uppercase().contains("_MIPMAP_"))
}

// ── Render-target declarations ────────────────────────────────────────────

/// A RENDERCOLORTARGET parameter: a named offscreen color buffer plus the
/// sampler parameter that consumes it. The GPU texture itself is allocated
/// lazily by the target arena on first script reference.
#[derive(Debug, Clone)]
pub struct ColorTargetDecl {
    pub parameter: ParameterId,
    pub name: String,
    pub size: SizeSpec,
    /// Raw `Format` annotation token; mapped by `target::format`.
    pub format: Option<String>,
    /// `AntiAlias=true` requests a multisampled buffer.
    pub msaa: bool,
    pub mipmap: bool,
    pub sampler: Option<ParameterId>,
}

/// A RENDERDEPTHSTENCILTARGET parameter.
#[derive(Debug, Clone)]
pub struct DepthTargetDecl {
    pub parameter: ParameterId,
    pub name: String,
    pub size: SizeSpec,
    pub format: Option<String>,
}

impl ColorTargetDecl {
    pub fn from_parameter(id: ParameterId, parameter: &Parameter) -> Self {
        Self {
            parameter: id,
            name: parameter.name.clone(),
            size: SizeSpec::from_annotations(&parameter.annotations),
            format: parameter.annotations.string("Format").map(str::to_owned),
            msaa: parameter.annotations.boolean("AntiAlias").unwrap_or(false),
            mipmap: wants_mipmaps(parameter),
            sampler: None,
        }
    }
}

impl DepthTargetDecl {
    pub fn from_parameter(id: ParameterId, parameter: &Parameter) -> Self {
        Self {
            parameter: id,
            name: parameter.name.clone(),
            size: SizeSpec::from_annotations(&parameter.annotations),
            format: parameter.annotations.string("Format").map(str::to_owned),
        }
    }
}

// ── Animated textures ─────────────────────────────────────────────────────

/// ANIMATEDTEXTURE: per-frame seek computation. The external texture
/// loader owns the image frames; it reads the seek value stored on the
/// parameter to choose one.
#[derive(Debug, Clone)]
pub struct AnimatedTextureSlot {
    pub parameter: ParameterId,
    pub resource: Option<String>,
    pub offset: f32,
    pub speed: f32,
    pub seek_variable: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct AnimatedTextureBindings {
    slots: Vec<AnimatedTextureSlot>,
}

impl AnimatedTextureBindings {
    pub fn bind(&mut self, id: ParameterId, parameter: &Parameter) {
        self.slots.push(AnimatedTextureSlot {
            parameter: id,
            resource: parameter.annotations.string("ResourceName").map(str::to_owned),
            offset: parameter.annotations.float("Offset").unwrap_or(0.0),
            speed: parameter.annotations.float("Speed").unwrap_or(1.0),
            seek_variable: parameter.annotations.string("SeekVariable").map(str::to_owned),
        });
    }

    /// Computes each slot's seek time: the SeekVariable parameter when one
    /// is named (and holds a scalar), otherwise the frame clock.
    pub fn update(&self, effect: &mut Effect, time: f32) {
        for slot in &self.slots {
            let base = slot
                .seek_variable
                .as_deref()
                .and_then(|name| effect.find_parameter(name))
                .and_then(|id| effect.value(id).as_float())
                .unwrap_or(time);
            effect.write(slot.parameter, ParameterValue::Float(base * slot.speed + slot.offset));
        }
    }

    pub fn slots(&self) -> &[AnimatedTextureSlot] {
        &self.slots
    }

    pub fn invalidate(&mut self) {
        self.slots.clear();
    }
}

// ── Texture values ────────────────────────────────────────────────────────

/// TEXTUREVALUE: the parameter mirrors another parameter's value through
/// the flat table (slot writes through index `source`).
#[derive(Debug, Clone, Copy)]
pub struct TextureValueSlot {
    pub parameter: ParameterId,
    pub source: ParameterId,
}

#[derive(Debug, Clone, Default)]
pub struct TextureValueBindings {
    slots: Vec<TextureValueSlot>,
}

impl TextureValueBindings {
    /// Links `id` to the parameter named by its `TextureName` annotation.
    /// Self-references and unknown names are dropped with a warning.
    pub fn bind(&mut self, id: ParameterId, parameter: &Parameter, effect: &Effect) {
        let Some(name) = parameter.annotations.string("TextureName") else {
            log::warn!("TEXTUREVALUE parameter {} has no TextureName annotation", parameter.name);
            return;
        };
        let Some(source) = effect.find_parameter(name) else {
            log::warn!("TEXTUREVALUE parameter {} names unknown texture {name}", parameter.name);
            return;
        };
        if source == id {
            log::warn!("TEXTUREVALUE parameter {} connects to itself, ignored", parameter.name);
            return;
        }
        self.slots.push(TextureValueSlot { parameter: id, source });
    }

    pub fn update(&self, effect: &mut Effect) {
        for slot in &self.slots {
            let value = *effect.value(slot.source);
            effect.write(slot.parameter, value);
        }
    }

    pub fn invalidate(&mut self) {
        self.slots.clear();
    }
}
