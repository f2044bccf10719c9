//! The stable diagnostic wire format (spec §6): `{severity, code, message,
//! location: {start: {line, col, offset}, end: {...}}, related}`.
//!
//! `Diagnostic`/`Span` themselves carry only a `FileId` plus a start
//! line/column; the end location is resolved here, at serialization time, by
//! looking the file back up in the `SourceMap` rather than widening `Span`
//! itself (SPEC_FULL.md's §3 data-model note).

use serde::Serialize;

use lumina_util::diagnostic::{Diagnostic, Level};
use lumina_util::{SourceMap, Span};

#[derive(Debug, Clone, Serialize)]
pub struct WirePosition {
    pub line: usize,
    pub col: usize,
    pub offset: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct WireLocation {
    pub start: WirePosition,
    pub end: WirePosition,
}

#[derive(Debug, Clone, Serialize)]
pub struct WireRelated {
    pub message: String,
    pub location: WireLocation,
}

#[derive(Debug, Clone, Serialize)]
pub struct WireDiagnostic {
    pub severity: &'static str,
    pub code: Option<String>,
    pub message: String,
    pub location: WireLocation,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub related: Vec<WireRelated>,
}

fn severity_str(level: Level) -> &'static str {
    match level {
        Level::Error | Level::Bug => "error",
        Level::Warning => "warning",
        Level::Note | Level::Help => "info",
    }
}

fn resolve_location(span: Span, source_map: &SourceMap) -> WireLocation {
    let start = WirePosition { line: span.line as usize, col: span.column as usize, offset: span.start };

    let end = match source_map.get(span.file_id) {
        Some(file) => {
            let (line, col) = file.offset_to_line_col(span.end);
            WirePosition { line, col, offset: span.end }
        }
        None => WirePosition { line: span.line as usize, col: span.column as usize, offset: span.end },
    };

    WireLocation { start, end }
}

pub fn to_wire(diagnostic: &Diagnostic, source_map: &SourceMap) -> WireDiagnostic {
    WireDiagnostic {
        severity: severity_str(diagnostic.level),
        code: diagnostic.code.map(|c| c.as_str().to_string()),
        message: diagnostic.message.clone(),
        location: resolve_location(diagnostic.span, source_map),
        related: diagnostic
            .notes
            .iter()
            .map(|note| WireRelated { message: note.clone(), location: resolve_location(diagnostic.span, source_map) })
            .collect(),
    }
}

pub fn to_wire_json(diagnostics: &[Diagnostic], source_map: &SourceMap) -> serde_json::Result<String> {
    let wire: Vec<WireDiagnostic> = diagnostics.iter().map(|d| to_wire(d, source_map)).collect();
    serde_json::to_string_pretty(&wire)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumina_util::diagnostic::DiagnosticCode;

    #[test]
    fn an_error_diagnostic_serializes_with_error_severity() {
        let mut source_map = SourceMap::new();
        let file_id = source_map.add_file("main.lum", "let x = 1\n");
        let span = Span::with_file(4, 5, file_id, 1, 5);

        let diag = Diagnostic::error("unresolved name", span).with_code(DiagnosticCode::LUM_002);
        let wire = to_wire(&diag, &source_map);

        assert_eq!(wire.severity, "error");
        assert_eq!(wire.code.as_deref(), Some("LUM-002"));
        assert_eq!(wire.location.start.line, 1);
    }

    #[test]
    fn notes_become_related_entries() {
        let source_map = SourceMap::new();
        let diag = Diagnostic::error("type mismatch", Span::DUMMY).with_note("expected `i32`");
        let wire = to_wire(&diag, &source_map);
        assert_eq!(wire.related.len(), 1);
        assert_eq!(wire.related[0].message, "expected `i32`");
    }

    #[test]
    fn a_diagnostic_list_serializes_to_a_json_array() {
        let source_map = SourceMap::new();
        let diags = vec![Diagnostic::warning("unused binding", Span::DUMMY)];
        let json = to_wire_json(&diags, &source_map).unwrap();
        assert!(json.contains("\"severity\": \"warning\""));
    }
}
