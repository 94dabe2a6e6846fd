/// Value of one annotation, parsed once by the effect loader.
#[derive(Debug, Clone, PartialEq)]
pub enum AnnotationValue {
    Bool(bool),
    Int(i32),
    Float(f32),
    String(String),
    IntVec(Vec<i32>),
    FloatVec(Vec<f32>),
}

/// Read-only key/value metadata attached to a parameter, technique, or pass.
///
/// Key lookup is exact-match. Annotation sets are small (a handful of
/// entries), so this is a plain vector rather than a map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnnotationMap {
    entries: Vec<(String, AnnotationValue)>,
}

impl AnnotationMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: AnnotationValue) {
        self.entries.push((key.into(), value));
    }

    pub fn with(mut self, key: impl Into<String>, value: AnnotationValue) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&AnnotationValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn string(&self, key: &str) -> Option<&str> {
        match self.get(key)? {
            AnnotationValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Bool-valued annotation; integer values are accepted as 0/non-0.
    pub fn boolean(&self, key: &str) -> Option<bool> {
        match self.get(key)? {
            AnnotationValue::Bool(b) => Some(*b),
            AnnotationValue::Int(i) => Some(*i != 0),
            _ => None,
        }
    }

    pub fn int(&self, key: &str) -> Option<i32> {
        match self.get(key)? {
            AnnotationValue::Int(i) => Some(*i),
            AnnotationValue::Float(f) => Some(*f as i32),
            _ => None,
        }
    }

    pub fn float(&self, key: &str) -> Option<f32> {
        match self.get(key)? {
            AnnotationValue::Float(f) => Some(*f),
            AnnotationValue::Int(i) => Some(*i as f32),
            _ => None,
        }
    }

    pub fn int_vec(&self, key: &str) -> Option<&[i32]> {
        match self.get(key)? {
            AnnotationValue::IntVec(v) => Some(v),
            _ => None,
        }
    }

    pub fn float_vec(&self, key: &str) -> Option<&[f32]> {
        match self.get(key)? {
            AnnotationValue::FloatVec(v) => Some(v),
            _ => None,
        }
    }
}
