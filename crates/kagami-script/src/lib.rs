//! Lexer, parser, and state model for the **kagami effect Script** language.
//!
//! Effect files attach a `Script` annotation to techniques and passes: a
//! flat, semicolon-delimited sequence of `command=value` clauses that
//! controls render-target switching, clearing, looping, and draw dispatch.
//! This crate turns that text into an ordered [`ParsedScript`] of typed
//! [`ScriptState`] values and enforces every structural rule, so the engine
//! interpreter never re-tokenizes or re-validates at draw time.
//!
//! This crate is intentionally dependency-free so it can be consumed by
//! effect-authoring tooling and linters without pulling in any engine or
//! GPU code.
//!
//! # Structure
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`state`] | `ScriptState`, `ScriptClass`, `ScriptOrder`, `LoopCount` |
//! | [`error`] | `ScriptError` |
//! | [`lexer`] | `Lexer`, `Clause` |
//! | [`parser`] | `parse_technique_script` / `parse_pass_script`, `ParsedScript` |
//! | [`subset`] | `contains_subset` material-range membership |
//!
//! # Quick start
//!
//! ```rust
//! use kagami_script::{parse_technique_script, ScriptClass, ScriptOrder, ScriptState};
//!
//! let script = parse_technique_script(
//!     "RenderColorTarget0=Scratch; ClearSetColor=ClearColor; Clear=Color; Pass=P0;",
//!     ScriptClass::Object,
//!     ScriptOrder::Standard,
//! )
//! .unwrap();
//!
//! assert_eq!(script.states.len(), 4);
//! assert_eq!(script.states[3], ScriptState::Pass { name: "P0".into() });
//! ```

pub mod error;
pub mod lexer;
pub mod parser;
pub mod state;
pub mod subset;

pub use error::ScriptError;
pub use parser::{ParsedScript, ScriptLevel, parse_pass_script, parse_technique_script};
pub use state::{LoopCount, ScriptClass, ScriptOrder, ScriptState};
pub use subset::contains_subset;

#[cfg(test)]
mod parse_tests {
    use super::*;

    fn tech(src: &str) -> ParsedScript {
        parse_technique_script(src, ScriptClass::Object, ScriptOrder::Standard).unwrap()
    }
    fn tech_err(src: &str) {
        parse_technique_script(src, ScriptClass::Object, ScriptOrder::Standard).unwrap_err();
    }
    fn pass(src: &str, class: ScriptClass) -> Result<ParsedScript, ScriptError> {
        parse_pass_script(src, class, ScriptOrder::Standard)
    }

    // ── clauses ───────────────────────────────────────────────────────────

    #[test]
    fn empty_script() {
        assert!(tech("").states.is_empty());
    }
    #[test]
    fn trailing_semicolon_optional() {
        assert_eq!(tech("Pass=P0").states, tech("Pass=P0;").states);
    }
    #[test]
    fn whitespace_tolerated() {
        assert_eq!(tech("  Pass = P0 ; ").states, vec![ScriptState::Pass { name: "P0".into() }]);
    }
    #[test]
    fn empty_segments_skipped() {
        assert_eq!(tech(";;Pass=P0;;").states.len(), 1);
    }
    #[test]
    fn clause_without_equals() {
        tech_err("Pass");
    }
    #[test]
    fn unknown_command_skipped() {
        assert!(tech("FrobnicateTarget=x;").states.is_empty());
    }

    // ── render targets ────────────────────────────────────────────────────

    #[test]
    fn color_target_bind_and_unbind() {
        let s = tech("RenderColorTarget0=RT;RenderColorTarget0=;");
        assert_eq!(
            s.states,
            vec![
                ScriptState::RenderColorTarget { slot: 0, name: Some("RT".into()) },
                ScriptState::RenderColorTarget { slot: 0, name: None },
            ]
        );
    }
    #[test]
    fn bare_color_target_is_slot0() {
        assert_eq!(
            tech("RenderColorTarget=RT;").states,
            vec![ScriptState::RenderColorTarget { slot: 0, name: Some("RT".into()) }]
        );
    }
    #[test]
    fn slot1_requires_slot0_first() {
        tech_err("RenderColorTarget1=RT;");
    }
    #[test]
    fn slots_after_slot0() {
        let s = tech("RenderColorTarget0=A;RenderColorTarget1=B;RenderColorTarget3=C;");
        assert_eq!(s.states.len(), 3);
    }
    #[test]
    fn depth_stencil_target() {
        assert_eq!(
            tech("RenderDepthStencilTarget=DS;").states,
            vec![ScriptState::RenderDepthStencilTarget { name: Some("DS".into()) }]
        );
    }

    // ── clears ────────────────────────────────────────────────────────────

    #[test]
    fn clear_color_requires_bound_target() {
        tech_err("Clear=Color;");
    }
    #[test]
    fn clear_color_after_bind() {
        let s = tech("RenderColorTarget0=RT;ClearSetColor=CC;Clear=Color;");
        assert_eq!(s.states[2], ScriptState::ClearColor);
    }
    #[test]
    fn clear_color_after_unbind_rejected() {
        tech_err("RenderColorTarget0=RT;RenderColorTarget0=;Clear=Color;");
    }
    #[test]
    fn clear_color_valid_while_any_slot_bound() {
        let s = tech("RenderColorTarget0=A;RenderColorTarget0=;RenderColorTarget1=B;Clear=Color;");
        assert_eq!(s.states[3], ScriptState::ClearColor);
    }
    #[test]
    fn clear_color_after_all_slots_unbound_rejected() {
        tech_err("RenderColorTarget0=A;RenderColorTarget1=B;RenderColorTarget1=;RenderColorTarget0=;Clear=Color;");
    }
    #[test]
    fn clear_depth_requires_bound_depth() {
        tech_err("RenderColorTarget0=RT;Clear=Depth;");
    }
    #[test]
    fn clear_depth_after_bind() {
        tech("RenderDepthStencilTarget=DS;Clear=Depth;");
    }
    #[test]
    fn clear_value_case_insensitive() {
        tech("RenderColorTarget0=RT;Clear=COLOR;");
    }
    #[test]
    fn clear_unknown_value() {
        tech_err("RenderColorTarget0=RT;Clear=Stencil;");
    }

    // ── loops ─────────────────────────────────────────────────────────────

    #[test]
    fn loop_literal_count() {
        let s = tech("LoopByCount=4;Pass=P0;LoopEnd=;");
        assert_eq!(s.states[0], ScriptState::LoopByCount { count: LoopCount::Literal(4) });
        assert_eq!(s.states[2], ScriptState::LoopEnd);
    }
    #[test]
    fn loop_parameter_count() {
        let s = tech("LoopByCount=Iterations;LoopEnd=;");
        assert_eq!(
            s.states[0],
            ScriptState::LoopByCount { count: LoopCount::Parameter("Iterations".into()) }
        );
    }
    #[test]
    fn loop_get_index() {
        let s = tech("LoopByCount=2;LoopGetIndex=Idx;LoopEnd=;");
        assert_eq!(s.states[1], ScriptState::LoopGetIndex { parameter: "Idx".into() });
    }
    #[test]
    fn unterminated_loop() {
        tech_err("LoopByCount=4;Pass=P0;");
    }
    #[test]
    fn nested_loop_rejected() {
        tech_err("LoopByCount=4;LoopByCount=2;LoopEnd=;LoopEnd=;");
    }
    #[test]
    fn second_loop_region_rejected() {
        tech_err("LoopByCount=1;LoopEnd=;LoopByCount=1;LoopEnd=;");
    }
    #[test]
    fn stray_loop_end_rejected_in_pass_scripts_too() {
        pass("LoopEnd=;", ScriptClass::Scene).unwrap_err();
    }

    // ── draw vs. script class ─────────────────────────────────────────────

    #[test]
    fn draw_geometry_object_class() {
        assert_eq!(
            pass("Draw=Geometry;", ScriptClass::Object).unwrap().states,
            vec![ScriptState::DrawGeometry]
        );
    }
    #[test]
    fn draw_buffer_rejected_for_object_class() {
        pass("Draw=Buffer;", ScriptClass::Object).unwrap_err();
    }
    #[test]
    fn draw_geometry_rejected_for_scene_class() {
        pass("Draw=Geometry;", ScriptClass::Scene).unwrap_err();
    }
    #[test]
    fn scene_or_object_allows_both() {
        pass("Draw=Geometry;", ScriptClass::SceneOrObject).unwrap();
        pass("Draw=Buffer;", ScriptClass::SceneOrObject).unwrap();
    }
    #[test]
    fn draw_in_technique_script_rejected() {
        tech_err("Draw=Geometry;");
    }
    #[test]
    fn pass_in_pass_script_rejected() {
        pass("Pass=P0;", ScriptClass::Object).unwrap_err();
    }

    // ── ScriptExternal ────────────────────────────────────────────────────

    #[test]
    fn script_external_post_process_only() {
        parse_technique_script(
            "ScriptExternal=Color;",
            ScriptClass::Scene,
            ScriptOrder::Standard,
        )
        .unwrap_err();
    }
    #[test]
    fn script_external_splits_trailing_states() {
        let s = parse_technique_script(
            "RenderColorTarget0=RT;ScriptExternal=Color;RenderColorTarget0=;Pass=P0;",
            ScriptClass::Scene,
            ScriptOrder::PostProcess,
        )
        .unwrap();
        assert_eq!(s.states.len(), 2);
        assert_eq!(s.states[1], ScriptState::ScriptExternal);
        assert_eq!(s.external.len(), 2);
        assert_eq!(s.external[1], ScriptState::Pass { name: "P0".into() });
    }
    #[test]
    fn script_external_twice_rejected() {
        parse_technique_script(
            "ScriptExternal=Color;ScriptExternal=Color;",
            ScriptClass::Scene,
            ScriptOrder::PostProcess,
        )
        .unwrap_err();
    }
    #[test]
    fn script_external_inside_loop_rejected() {
        parse_technique_script(
            "LoopByCount=2;ScriptExternal=Color;LoopEnd=;",
            ScriptClass::Scene,
            ScriptOrder::PostProcess,
        )
        .unwrap_err();
    }

    // ── implicit scripts ──────────────────────────────────────────────────

    #[test]
    fn implicit_pass_is_one_draw() {
        assert_eq!(ParsedScript::implicit_pass().states, vec![ScriptState::DrawGeometry]);
    }
    #[test]
    fn implicit_technique_runs_passes_in_order() {
        let s = ParsedScript::implicit_technique(["A", "B"]);
        assert_eq!(
            s.states,
            vec![
                ScriptState::Pass { name: "A".into() },
                ScriptState::Pass { name: "B".into() },
            ]
        );
    }
}
