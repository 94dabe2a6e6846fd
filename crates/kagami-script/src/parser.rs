use crate::error::ScriptError;
use crate::lexer::{Clause, Lexer};
use crate::state::{LoopCount, ScriptClass, ScriptOrder, ScriptState};

// ── Parsed script ─────────────────────────────────────────────────────────

/// An ordered, structurally validated script.
///
/// `external` holds the states that followed a `ScriptExternal=Color`
/// clause; they run when the chained post effect has finished, independent
/// of technique dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedScript {
    pub states: Vec<ScriptState>,
    pub external: Vec<ScriptState>,
}

impl ParsedScript {
    /// The implicit script of a pass that declares no `Script` annotation:
    /// a single per-material draw.
    pub fn implicit_pass() -> Self {
        Self { states: vec![ScriptState::DrawGeometry], external: Vec::new() }
    }

    /// The implicit script of a technique that declares no `Script`
    /// annotation: every declared pass, in order.
    pub fn implicit_technique<S: Into<String>>(pass_names: impl IntoIterator<Item = S>) -> Self {
        Self {
            states: pass_names
                .into_iter()
                .map(|name| ScriptState::Pass { name: name.into() })
                .collect(),
            external: Vec::new(),
        }
    }
}

/// Whether a script annotates a technique or a pass.
///
/// `Pass=` clauses are only meaningful on techniques and `Draw=` clauses
/// only on passes; loop and render-target rules are identical at both
/// levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptLevel {
    Technique,
    Pass,
}

/// Parses a technique-level `Script` annotation value.
pub fn parse_technique_script(
    src: &str,
    class: ScriptClass,
    order: ScriptOrder,
) -> Result<ParsedScript, ScriptError> {
    Parser::new(class, order, ScriptLevel::Technique).parse(src)
}

/// Parses a pass-level `Script` annotation value.
pub fn parse_pass_script(
    src: &str,
    class: ScriptClass,
    order: ScriptOrder,
) -> Result<ParsedScript, ScriptError> {
    Parser::new(class, order, ScriptLevel::Pass).parse(src)
}

// ── Parser ────────────────────────────────────────────────────────────────

struct Parser {
    class: ScriptClass,
    order: ScriptOrder,
    level: ScriptLevel,

    // Structural context accumulated while walking clauses.
    loop_open: bool,
    loop_seen: bool,
    color_slot0_seen: bool,
    color_bound: [bool; 4],
    depth_bound: bool,
    external_seen: bool,
}

impl Parser {
    fn new(class: ScriptClass, order: ScriptOrder, level: ScriptLevel) -> Self {
        Self {
            class,
            order,
            level,
            loop_open: false,
            loop_seen: false,
            color_slot0_seen: false,
            color_bound: [false; 4],
            depth_bound: false,
            external_seen: false,
        }
    }

    fn parse(mut self, src: &str) -> Result<ParsedScript, ScriptError> {
        let clauses = Lexer::new(src).tokenize()?;
        let mut script = ParsedScript::default();

        for (index, clause) in clauses.iter().enumerate() {
            let Some(state) = self.parse_clause(clause, index)? else {
                continue;
            };
            let to_external = self.external_seen && state != ScriptState::ScriptExternal;
            if to_external {
                script.external.push(state);
            } else {
                script.states.push(state);
            }
        }

        if self.loop_open {
            return Err(ScriptError::new("LoopByCount without matching LoopEnd", clauses.len()));
        }
        Ok(script)
    }

    /// Produces zero or one state per clause. Unrecognized commands are
    /// skipped so effects written against newer dialects still load.
    fn parse_clause(
        &mut self,
        clause: &Clause,
        index: usize,
    ) -> Result<Option<ScriptState>, ScriptError> {
        let err = |msg: String| Err(ScriptError::new(msg, index));
        let value = clause.value.as_str();

        let state = match clause.command.as_str() {
            "RenderColorTarget" | "RenderColorTarget0" => {
                self.color_slot0_seen = true;
                self.color_bound[0] = !value.is_empty();
                ScriptState::RenderColorTarget { slot: 0, name: nonempty(value) }
            }
            cmd @ ("RenderColorTarget1" | "RenderColorTarget2" | "RenderColorTarget3") => {
                if !self.color_slot0_seen {
                    return err(format!("{cmd} before RenderColorTarget0"));
                }
                let slot = cmd.as_bytes()[cmd.len() - 1] - b'0';
                self.color_bound[slot as usize] = !value.is_empty();
                ScriptState::RenderColorTarget { slot, name: nonempty(value) }
            }
            "RenderDepthStencilTarget" => {
                self.depth_bound = !value.is_empty();
                ScriptState::RenderDepthStencilTarget { name: nonempty(value) }
            }
            "ClearSetColor" => ScriptState::ClearSetColor { parameter: value.to_owned() },
            "ClearSetDepth" => ScriptState::ClearSetDepth { parameter: value.to_owned() },
            "Clear" => {
                if value.eq_ignore_ascii_case("color") {
                    if !self.color_bound.iter().any(|bound| *bound) {
                        return err("Clear=Color with no script color target bound".into());
                    }
                    ScriptState::ClearColor
                } else if value.eq_ignore_ascii_case("depth") {
                    if !self.depth_bound {
                        return err("Clear=Depth with no script depth target bound".into());
                    }
                    ScriptState::ClearDepth
                } else {
                    return err(format!("unknown Clear value {value:?}"));
                }
            }
            "Pass" => {
                if self.level != ScriptLevel::Technique {
                    return err("Pass is only valid in a technique script".into());
                }
                if value.is_empty() {
                    return err("Pass requires a pass name".into());
                }
                ScriptState::Pass { name: value.to_owned() }
            }
            "LoopByCount" => {
                if self.loop_open {
                    return err("nested LoopByCount".into());
                }
                if self.loop_seen {
                    return err("multiple loop regions in one script".into());
                }
                self.loop_open = true;
                self.loop_seen = true;
                let count = match value.parse::<i32>() {
                    Ok(n) => LoopCount::Literal(n),
                    Err(_) if !value.is_empty() => LoopCount::Parameter(value.to_owned()),
                    Err(_) => return err("LoopByCount requires a count".into()),
                };
                ScriptState::LoopByCount { count }
            }
            "LoopEnd" => {
                if !self.loop_open {
                    return err("LoopEnd without open LoopByCount".into());
                }
                self.loop_open = false;
                ScriptState::LoopEnd
            }
            "LoopGetIndex" => {
                if value.is_empty() {
                    return err("LoopGetIndex requires a parameter name".into());
                }
                ScriptState::LoopGetIndex { parameter: value.to_owned() }
            }
            "Draw" => {
                if self.level != ScriptLevel::Pass {
                    return err("Draw is only valid in a pass script".into());
                }
                if value.eq_ignore_ascii_case("geometry") {
                    if self.class == ScriptClass::Scene {
                        return err("Draw=Geometry is illegal when ScriptClass is scene".into());
                    }
                    ScriptState::DrawGeometry
                } else if value.eq_ignore_ascii_case("buffer") {
                    if self.class == ScriptClass::Object {
                        return err("Draw=Buffer is illegal when ScriptClass is object".into());
                    }
                    ScriptState::DrawBuffer
                } else {
                    return err(format!("unknown Draw value {value:?}"));
                }
            }
            "ScriptExternal" => {
                if !value.eq_ignore_ascii_case("color") {
                    return err(format!("unknown ScriptExternal value {value:?}"));
                }
                if self.level != ScriptLevel::Technique {
                    return err("ScriptExternal is only valid in a technique script".into());
                }
                if self.order != ScriptOrder::PostProcess {
                    return err("ScriptExternal requires post-process script order".into());
                }
                if self.external_seen {
                    return err("ScriptExternal appears more than once".into());
                }
                if self.loop_open {
                    return err("ScriptExternal inside an open loop".into());
                }
                self.external_seen = true;
                ScriptState::ScriptExternal
            }
            _ => return Ok(None),
        };
        Ok(Some(state))
    }
}

fn nonempty(value: &str) -> Option<String> {
    if value.is_empty() { None } else { Some(value.to_owned()) }
}
