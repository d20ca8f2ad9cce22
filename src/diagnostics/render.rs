//! Rendering of accumulated diagnostics.

use serde::Serialize;

use super::{Diagnostic, Position, SourceMap};

/// Output style for rendered diagnostics.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// Multi-line report with a source snippet and underline.
    Human,
    /// One `file:line:col: severity[code]: message` line per diagnostic.
    Short,
    /// One JSON object per diagnostic, for tooling.
    Json,
}

/// Render diagnostics against the sources they point into, one entry per
/// line (human entries span several lines each).
#[must_use]
pub fn render(diagnostics: &[Diagnostic], sources: &SourceMap, format: OutputFormat) -> String {
    let rendered: Vec<String> = diagnostics
        .iter()
        .map(|diagnostic| match format {
            OutputFormat::Human => human(diagnostic, sources),
            OutputFormat::Short => short(diagnostic, sources),
            OutputFormat::Json => json(diagnostic, sources),
        })
        .collect();
    rendered.join("\n")
}

fn locate<'a>(diagnostic: &Diagnostic, sources: &'a SourceMap) -> Option<(&'a str, Position)> {
    let span = diagnostic.span?;
    let name = sources.name(span.source)?;
    let position = sources.position(span.source, span.start)?;
    Some((name, position))
}

fn human(diagnostic: &Diagnostic, sources: &SourceMap) -> String {
    let mut out = diagnostic.to_string();
    if let Some((name, position)) = locate(diagnostic, sources) {
        out.push_str(&format!("\n  --> {name}:{}:{}", position.line, position.column));
        if let Some(span) = diagnostic.span {
            if let Some(line) = sources.line(span.source, position.line) {
                let carets = sources.width(span.source, span.start, span.end);
                out.push_str(&format!("\n{:>4} | {line}", position.line));
                out.push_str(&format!(
                    "\n{:>4} | {}{}",
                    "",
                    " ".repeat(position.column.saturating_sub(1)),
                    "^".repeat(carets)
                ));
            }
        }
    }
    for note in &diagnostic.notes {
        out.push_str(&format!("\nnote: {note}"));
    }
    out
}

fn short(diagnostic: &Diagnostic, sources: &SourceMap) -> String {
    let mut out = String::new();
    if let Some((name, position)) = locate(diagnostic, sources) {
        out.push_str(&format!("{name}:{}:{}: ", position.line, position.column));
    }
    out.push_str(&diagnostic.to_string());
    if !diagnostic.notes.is_empty() {
        out.push_str(&format!(" (notes: {})", diagnostic.notes.len()));
    }
    out
}

#[derive(Serialize)]
struct JsonPayload<'a> {
    severity: &'a str,
    code: Option<&'a str>,
    message: &'a str,
    source: Option<&'a str>,
    line: Option<usize>,
    column: Option<usize>,
    start: Option<usize>,
    end: Option<usize>,
    notes: &'a [String],
}

fn json(diagnostic: &Diagnostic, sources: &SourceMap) -> String {
    let location = locate(diagnostic, sources);
    let payload = JsonPayload {
        severity: diagnostic.severity.as_str(),
        code: diagnostic.code,
        message: &diagnostic.message,
        source: location.map(|(name, _)| name),
        line: location.map(|(_, position)| position.line),
        column: location.map(|(_, position)| position.column),
        start: diagnostic.span.map(|span| span.start),
        end: diagnostic.span.map(|span| span.end),
        notes: &diagnostic.notes,
    };
    serde_json::to_string(&payload).unwrap_or_else(|_| "{}".into())
}
