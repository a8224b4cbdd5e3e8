use crate::ast::Program;
use crate::error::{MmtError, Span};
use log::debug;
use serde::Deserialize;

/// Serializes a parsed program to the JSON interchange form.
pub fn to_json(program: &Program) -> Result<String, MmtError> {
    debug!("Serializing {} top-level statements", program.statements.len());
    serde_json::to_string_pretty(program)
        .map_err(|e| MmtError::runtime_error(Span::default(), format!("Cannot serialize program: {}", e)))
}

/// Rebuilds a program from its JSON interchange form. Nesting depth is not
/// capped, so any program the parser accepted loads back.
pub fn from_json(text: &str) -> Result<Program, MmtError> {
    let mut de = serde_json::Deserializer::from_str(text);
    de.disable_recursion_limit();
    Program::deserialize(&mut de)
        .and_then(|program| de.end().map(|()| program))
        .map_err(|e| {
            MmtError::parse_error_with_help(
                Span::new(e.line(), e.column()),
                format!("Malformed program file: {}", e),
                "The file must be produced by `mmt <file.thl> <file.json>`.".to_string(),
            )
        })
}
