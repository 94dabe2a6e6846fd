// ── Script classification ─────────────────────────────────────────────────

/// What a scripted effect is allowed to draw.
///
/// Declared by the `ScriptClass` annotation on the STANDARDSGLOBAL
/// parameter. Values compare case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScriptClass {
    /// Per-material geometry only; `Draw=Buffer` is a structural error.
    #[default]
    Object,
    /// Offscreen buffer work only; `Draw=Geometry` is a structural error.
    Scene,
    /// Both draw kinds permitted.
    SceneOrObject,
}

impl ScriptClass {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "object" => Some(Self::Object),
            "scene" => Some(Self::Scene),
            "sceneorobject" => Some(Self::SceneOrObject),
            _ => None,
        }
    }
}

/// When in the frame a scripted effect runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScriptOrder {
    #[default]
    Standard,
    PreProcess,
    PostProcess,
}

impl ScriptOrder {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "standard" => Some(Self::Standard),
            "preprocess" => Some(Self::PreProcess),
            "postprocess" => Some(Self::PostProcess),
            _ => None,
        }
    }
}

// ── Script states ─────────────────────────────────────────────────────────

/// Loop bound: an integer literal, or the name of an int parameter read
/// when the loop starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopCount {
    Literal(i32),
    Parameter(String),
}

/// One executable step of a parsed script.
///
/// Names are left unresolved here; the engine resolves render targets,
/// passes, and parameters against the owning effect. An unresolvable
/// render-target name is the one runtime-recoverable condition (the
/// current target is left unchanged); everything structural was already
/// validated by the parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptState {
    /// Bind (`Some`) or unbind (`None`) color attachment `slot` (0..=3).
    RenderColorTarget { slot: u8, name: Option<String> },
    RenderDepthStencilTarget { name: Option<String> },
    /// Clear the bound color target with the `ClearSetColor` parameter value.
    ClearColor,
    /// Clear the bound depth-stencil target with the `ClearSetDepth` value.
    ClearDepth,
    /// Select the float4 parameter read at `Clear=Color` time.
    ClearSetColor { parameter: String },
    /// Select the float parameter read at `Clear=Depth` time.
    ClearSetDepth { parameter: String },
    LoopByCount { count: LoopCount },
    LoopEnd,
    /// Expose the current iteration through the named int parameter.
    LoopGetIndex { parameter: String },
    /// Execute the named pass of the enclosing technique.
    Pass { name: String },
    /// One indexed draw of the current material's geometry.
    DrawGeometry,
    /// One fullscreen-quad draw.
    DrawBuffer,
    /// Yield to the chained post effect; at most one, post-process only.
    ScriptExternal,
}
