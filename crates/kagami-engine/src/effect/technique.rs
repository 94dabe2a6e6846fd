use super::annotation::AnnotationMap;

/// One GPU pipeline-state block; executing it issues exactly one draw.
#[derive(Debug, Clone, PartialEq)]
pub struct Pass {
    pub name: String,
    pub annotations: AnnotationMap,
}

impl Pass {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), annotations: AnnotationMap::new() }
    }

    pub fn with_annotations(mut self, annotations: AnnotationMap) -> Self {
        self.annotations = annotations;
        self
    }
}

/// A named alternative rendering recipe: ordered passes plus matching
/// annotations (MMDPass, Subset, UseTexture, UseSphereMap, UseToon) and an
/// optional Script.
#[derive(Debug, Clone, PartialEq)]
pub struct Technique {
    pub name: String,
    pub annotations: AnnotationMap,
    pub passes: Vec<Pass>,
}

impl Technique {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), annotations: AnnotationMap::new(), passes: Vec::new() }
    }

    pub fn with_annotations(mut self, annotations: AnnotationMap) -> Self {
        self.annotations = annotations;
        self
    }

    pub fn with_pass(mut self, pass: Pass) -> Self {
        self.passes.push(pass);
        self
    }

    pub fn pass(&self, name: &str) -> Option<&Pass> {
        self.passes.iter().find(|p| p.name == name)
    }
}
