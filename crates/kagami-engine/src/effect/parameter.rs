use super::annotation::AnnotationMap;

/// Index into the flat parameter table of an [`Effect`](super::Effect).
///
/// Binding slots hold these instead of references; "connecting" one
/// parameter to another is a slot writing through a second index, which
/// keeps invalidation trivial and avoids aliasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParameterId(pub(crate) u32);

impl ParameterId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Declared type of a shader uniform or sampler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterType {
    Bool,
    Int,
    Float,
    Float2,
    Float3,
    Float4,
    Float4x4,
    Sampler2D,
    Sampler3D,
    SamplerCube,
    Texture,
}

impl ParameterType {
    #[inline]
    pub fn is_sampler(self) -> bool {
        matches!(self, Self::Sampler2D | Self::Sampler3D | Self::SamplerCube)
    }
}

/// CPU-side value store for a uniform.
///
/// Semantic setters write here each frame; the embedding render engine
/// reads the table when it uploads uniforms for a draw. Sampler and
/// texture parameters carry no value.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ParameterValue {
    #[default]
    Empty,
    Bool(bool),
    Int(i32),
    Float(f32),
    Float2([f32; 2]),
    Float3([f32; 3]),
    Float4([f32; 4]),
    Float4x4([[f32; 4]; 4]),
}

impl ParameterValue {
    /// Integer view used by `LoopByCount` when the bound uniform drives the
    /// loop bound.
    pub fn as_int(&self) -> Option<i32> {
        match *self {
            Self::Int(i) => Some(i),
            Self::Float(f) => Some(f as i32),
            Self::Bool(b) => Some(b as i32),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f32> {
        match *self {
            Self::Float(f) => Some(f),
            Self::Int(i) => Some(i as f32),
            _ => None,
        }
    }

    pub fn as_float4(&self) -> Option<[f32; 4]> {
        match *self {
            Self::Float4(v) => Some(v),
            Self::Float3([x, y, z]) => Some([x, y, z, 1.0]),
            _ => None,
        }
    }
}

/// One sampler-state assignment on a sampler parameter.
///
/// State names compare case-insensitively (the one exception to the
/// engine's case-sensitive matching).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SamplerState {
    pub name: String,
    pub value: String,
}

/// Opaque handle to a shader uniform or sampler, owned by the effect.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    /// Raw semantic string from the effect source; classified once at load.
    pub semantic: String,
    pub ty: ParameterType,
    pub value: ParameterValue,
    pub annotations: AnnotationMap,
    pub sampler_states: Vec<SamplerState>,
}

impl Parameter {
    pub fn new(name: impl Into<String>, ty: ParameterType) -> Self {
        Self {
            name: name.into(),
            semantic: String::new(),
            ty,
            value: ParameterValue::Empty,
            annotations: AnnotationMap::new(),
            sampler_states: Vec::new(),
        }
    }

    pub fn with_semantic(mut self, semantic: impl Into<String>) -> Self {
        self.semantic = semantic.into();
        self
    }

    pub fn with_value(mut self, value: ParameterValue) -> Self {
        self.value = value;
        self
    }

    pub fn with_annotations(mut self, annotations: AnnotationMap) -> Self {
        self.annotations = annotations;
        self
    }

    pub fn with_sampler_state(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.sampler_states.push(SamplerState { name: name.into(), value: value.into() });
        self
    }

    /// Case-insensitive sampler-state lookup.
    pub fn sampler_state(&self, name: &str) -> Option<&str> {
        self.sampler_states
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name))
            .map(|s| s.value.as_str())
    }
}
