//! Renders accumulated diagnostics to a terminal.

use colored::Colorize;
use cool_common::{Diagnostic, LineIndex};

/// Formats every diagnostic as one `error: <where>: <message>` line.
/// `source`, when given, upgrades the location from a raw byte range to
/// a 1-indexed line:column; a `Span::dummy()` (no real source position,
/// e.g. the missing-`Main`-class diagnostic) always prints as `<main>`.
pub fn render_diagnostics(diagnostics: &[Diagnostic], source: Option<&str>) -> String {
    let index = source.map(LineIndex::new);
    let mut out = String::new();
    for d in diagnostics {
        let where_ = if d.span.is_dummy() {
            "<main>".to_string()
        } else {
            match &index {
                Some(idx) => {
                    let pos = idx.position_of_span(d.span);
                    format!("{}:{}", pos.line, pos.column)
                }
                None => format!("{}..{}", d.span.start, d.span.end),
            }
        };
        out.push_str(&format!("{} {where_}: {}\n", "error:".red().bold(), d.message));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use cool_common::{DiagnosticCategory, Span};

    #[test]
    fn dummy_spans_render_as_main() {
        let diags = vec![Diagnostic {
            category: DiagnosticCategory::Error,
            message: "no definition for class \"Main\"".into(),
            span: Span::dummy(),
        }];
        let rendered = render_diagnostics(&diags, None);
        assert!(rendered.contains("<main>"));
    }

    #[test]
    fn byte_offsets_render_without_a_source_file() {
        let diags = vec![Diagnostic {
            category: DiagnosticCategory::Error,
            message: "oops".into(),
            span: Span::new(3, 7),
        }];
        let rendered = render_diagnostics(&diags, None);
        assert!(rendered.contains("3..7"));
    }

    #[test]
    fn line_and_column_render_with_a_source_file() {
        let diags = vec![Diagnostic {
            category: DiagnosticCategory::Error,
            message: "oops".into(),
            span: Span::new(4, 5),
        }];
        let rendered = render_diagnostics(&diags, Some("abc\ndef\n"));
        assert!(rendered.contains("2:1"));
    }
}
