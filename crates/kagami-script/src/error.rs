use std::fmt;

/// A structural error in a `Script` annotation.
///
/// Rejection is whole-script: the engine drops the owning technique or pass
/// from its registry and loads the rest of the effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptError {
    pub message: String,
    /// 0-based index of the offending `command=value` clause.
    pub clause: usize,
}

impl ScriptError {
    pub(crate) fn new(msg: impl Into<String>, clause: usize) -> Self {
        Self { message: msg.into(), clause }
    }
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "script error at clause {}: {}", self.clause, self.message)
    }
}

impl std::error::Error for ScriptError {}
