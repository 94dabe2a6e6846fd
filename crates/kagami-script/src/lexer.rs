use crate::error::ScriptError;

// ── Clause ────────────────────────────────────────────────────────────────

/// One `command=value` clause from a `Script` annotation string.
///
/// The value may be empty (`RenderColorTarget0=;` unbinds the target).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    pub command: String,
    pub value: String,
}

// ── Lexer ─────────────────────────────────────────────────────────────────

/// Splits a `Script` annotation string into `command=value` clauses.
///
/// The language is flat: clauses separated by `;`, no nesting, no quoting.
/// Whitespace around commands and values is not significant and is trimmed.
pub struct Lexer<'s> {
    src: &'s str,
    pos: usize,
    clause: usize,
}

impl<'s> Lexer<'s> {
    pub fn new(src: &'s str) -> Self {
        Self { src, pos: 0, clause: 0 }
    }

    /// Tokenizes the whole source. A trailing `;` is optional.
    pub fn tokenize(mut self) -> Result<Vec<Clause>, ScriptError> {
        let mut clauses = Vec::new();
        while let Some(clause) = self.next_clause()? {
            clauses.push(clause);
        }
        Ok(clauses)
    }

    fn next_clause(&mut self) -> Result<Option<Clause>, ScriptError> {
        // Segment boundaries are `;`; empty segments (";;" or a trailing ";")
        // are skipped rather than rejected, matching existing effect files.
        loop {
            if self.pos >= self.src.len() {
                return Ok(None);
            }
            let rest = &self.src[self.pos..];
            let (segment, advance) = match rest.find(';') {
                Some(i) => (&rest[..i], i + 1),
                None => (rest, rest.len()),
            };
            self.pos += advance;

            let segment = segment.trim();
            if segment.is_empty() {
                continue;
            }

            let index = self.clause;
            self.clause += 1;

            let Some(eq) = segment.find('=') else {
                return Err(ScriptError::new(
                    format!("clause {:?} has no `=`", segment),
                    index,
                ));
            };
            let command = segment[..eq].trim();
            let value = segment[eq + 1..].trim();
            if command.is_empty() {
                return Err(ScriptError::new("clause has an empty command", index));
            }
            return Ok(Some(Clause {
                command: command.to_owned(),
                value: value.to_owned(),
            }));
        }
    }
}
