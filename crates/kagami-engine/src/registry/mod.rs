//! Technique/pass registry and matching.
//!
//! Built once per effect at `set_effect`: the STANDARDSGLOBAL parameter is
//! scanned for script class/order and the explicit technique selection,
//! every selected technique's scripts (and its passes' scripts) are parsed
//! and memoized, and structurally invalid candidates are dropped with a
//! warning while the rest of the effect loads.

use std::sync::Arc;

use kagami_script::{
    ParsedScript, ScriptClass, ScriptOrder, contains_subset, parse_pass_script,
    parse_technique_script,
};

use crate::effect::{AnnotationMap, Effect, Technique};
use crate::semantic::{Semantic, classify};

/// STANDARDSGLOBAL carries a version in its parameter value; anything but
/// 0.8 voids its Script/ScriptClass/ScriptOrder annotations.
const STANDARDS_VERSION: f32 = 0.8;

// ── Matching ──────────────────────────────────────────────────────────────

/// The rendering context a technique is matched against, supplied by the
/// render engine per material.
#[derive(Debug, Clone, Copy)]
pub struct TechniqueQuery<'a> {
    pub pass: &'a str,
    pub material_offset: u32,
    pub material_count: u32,
    pub has_texture: bool,
    pub has_sphere_map: bool,
    pub use_toon: bool,
}

/// Matching annotations of one technique. An absent annotation matches
/// every query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TechniqueFilter {
    pub pass: Option<String>,
    pub subset: Option<String>,
    pub use_texture: Option<bool>,
    pub use_sphere_map: Option<bool>,
    pub use_toon: Option<bool>,
}

impl TechniqueFilter {
    fn from_annotations(annotations: &AnnotationMap) -> Self {
        Self {
            pass: annotations.string("MMDPass").map(str::to_owned),
            subset: annotations
                .string("Subset")
                .filter(|s| !s.is_empty())
                .map(str::to_owned),
            use_texture: annotations.boolean("UseTexture"),
            use_sphere_map: annotations.boolean("UseSphereMap"),
            use_toon: annotations.boolean("UseToon"),
        }
    }

    pub fn matches(&self, query: &TechniqueQuery<'_>) -> bool {
        if let Some(pass) = &self.pass
            && !pass.eq_ignore_ascii_case(query.pass)
        {
            return false;
        }
        if let Some(subset) = &self.subset
            && !contains_subset(subset, query.material_offset, query.material_count)
        {
            return false;
        }
        for (annotation, flag) in [
            (self.use_texture, query.has_texture),
            (self.use_sphere_map, query.has_sphere_map),
            (self.use_toon, query.use_toon),
        ] {
            if let Some(required) = annotation
                && required != flag
            {
                return false;
            }
        }
        true
    }
}

// ── Entries ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct PassEntry {
    pub name: String,
    /// Parsed once at registry build; repeated lookups share this Arc.
    pub script: Arc<ParsedScript>,
}

/// One registered technique with its parsed scripts, self-contained so
/// fallback entries from a standard effect execute without reaching back
/// into their source effect.
#[derive(Debug, Clone)]
pub struct TechniqueEntry {
    pub name: String,
    pub filter: TechniqueFilter,
    pub script: Arc<ParsedScript>,
    pub passes: Vec<PassEntry>,
}

impl TechniqueEntry {
    /// Memoized pass-script lookup: the same Arc every call, no
    /// re-tokenizing.
    pub fn pass_script(&self, name: &str) -> Option<Arc<ParsedScript>> {
        self.passes.iter().find(|p| p.name == name).map(|p| Arc::clone(&p.script))
    }
}

// ── Registry ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct TechniqueRegistry {
    pub class: ScriptClass,
    pub order: ScriptOrder,
    entries: Vec<TechniqueEntry>,
}

impl TechniqueRegistry {
    /// Scans STANDARDSGLOBAL, selects the explicit technique list, and
    /// parses all scripts. Rejected techniques are dropped; the registry
    /// itself always builds.
    pub fn from_effect(effect: &Effect) -> Self {
        let standards = scan_standards_global(effect);
        let mut registry =
            Self { class: standards.class, order: standards.order, entries: Vec::new() };

        let candidates: Vec<&Technique> = match &standards.selection {
            Some(names) => names
                .iter()
                .filter_map(|name| {
                    let found = effect.technique(name);
                    if found.is_none() {
                        log::warn!("STANDARDSGLOBAL selects unknown technique {name:?}");
                    }
                    found
                })
                .collect(),
            None => effect.techniques().iter().collect(),
        };

        for technique in candidates {
            match build_entry(technique, standards.class, standards.order) {
                Some(entry) => registry.entries.push(entry),
                None => {
                    log::warn!("technique {:?} rejected, dropped from registry", technique.name);
                }
            }
        }
        registry
    }

    pub fn entries(&self) -> &[TechniqueEntry] {
        &self.entries
    }

    /// Linear scan in declaration order; first match wins.
    pub fn find(&self, query: &TechniqueQuery<'_>) -> Option<usize> {
        self.entries.iter().position(|e| e.filter.matches(query))
    }
}

fn build_entry(
    technique: &Technique,
    class: ScriptClass,
    order: ScriptOrder,
) -> Option<TechniqueEntry> {
    let script = match technique.annotations.string("Script") {
        Some(src) => match parse_technique_script(src, class, order) {
            Ok(parsed) => parsed,
            Err(e) => {
                log::warn!("technique {:?}: {e}", technique.name);
                return None;
            }
        },
        None => ParsedScript::implicit_technique(technique.passes.iter().map(|p| p.name.as_str())),
    };

    let mut passes = Vec::with_capacity(technique.passes.len());
    for pass in &technique.passes {
        let parsed = match pass.annotations.string("Script") {
            Some(src) => match parse_pass_script(src, class, order) {
                Ok(parsed) => parsed,
                Err(e) => {
                    log::warn!("pass {:?} of technique {:?}: {e}", pass.name, technique.name);
                    return None;
                }
            },
            None => ParsedScript::implicit_pass(),
        };
        passes.push(PassEntry { name: pass.name.clone(), script: Arc::new(parsed) });
    }

    Some(TechniqueEntry {
        name: technique.name.clone(),
        filter: TechniqueFilter::from_annotations(&technique.annotations),
        script: Arc::new(script),
        passes,
    })
}

// ── STANDARDSGLOBAL ───────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct StandardsGlobal {
    class: ScriptClass,
    order: ScriptOrder,
    /// Explicit technique selection; `None` means every declared
    /// technique in file order.
    selection: Option<Vec<String>>,
}

fn scan_standards_global(effect: &Effect) -> StandardsGlobal {
    let Some((_, parameter)) = effect
        .parameters()
        .find(|(_, p)| classify(p) == Some(Semantic::StandardsGlobal))
    else {
        return StandardsGlobal::default();
    };

    let version = parameter.value.as_float().unwrap_or(0.0);
    if (version - STANDARDS_VERSION).abs() > f32::EPSILON {
        log::warn!(
            "STANDARDSGLOBAL version {version} != {STANDARDS_VERSION}, ignoring its script annotations"
        );
        return StandardsGlobal::default();
    }

    let mut standards = StandardsGlobal::default();
    if let Some(value) = parameter.annotations.string("ScriptClass") {
        match ScriptClass::parse(value) {
            Some(class) => standards.class = class,
            None => log::warn!("unknown ScriptClass {value:?}"),
        }
    }
    if let Some(value) = parameter.annotations.string("ScriptOrder") {
        match ScriptOrder::parse(value) {
            Some(order) => standards.order = order,
            None => log::warn!("unknown ScriptOrder {value:?}"),
        }
    }
    if let Some(script) = parameter.annotations.string("Script") {
        standards.selection = parse_technique_selection(script);
    }
    standards
}

/// The STANDARDSGLOBAL `Script` annotation selects either one technique
/// (`Technique=Main;`) or several (`Technique?Main:Sub;`).
fn parse_technique_selection(script: &str) -> Option<Vec<String>> {
    for segment in script.split(';') {
        let segment = segment.trim();
        if let Some(name) = segment.strip_prefix("Technique=") {
            if name.is_empty() {
                continue;
            }
            return Some(vec![name.to_owned()]);
        }
        if let Some(names) = segment.strip_prefix("Technique?") {
            let names: Vec<String> = names
                .split(':')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_owned)
                .collect();
            if !names.is_empty() {
                return Some(names);
            }
        }
    }
    None
}
