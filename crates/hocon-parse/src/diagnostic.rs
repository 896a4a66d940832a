//! Diagnostic rendering for parse errors.

use ariadne::{Color, Config, Label, Report, ReportKind, Source};

use crate::ParseError;

/// Render a parse error with source context.
pub fn render_parse_error(error: &ParseError, filename: &str, source: &str) -> String {
    let mut output = Vec::new();
    write_report(error, filename, source, &mut output);
    String::from_utf8(output).unwrap_or_else(|_| format!("{error}"))
}

/// Write the error report to a writer.
pub fn write_report<W: std::io::Write>(
    error: &ParseError,
    filename: &str,
    source: &str,
    writer: W,
) {
    let range = error.span.range();
    let report = Report::build(ReportKind::Error, filename, range.start)
        .with_config(Config::default().with_color(false))
        .with_message(&error.message)
        .with_label(
            Label::new((filename, range))
                .with_message("here")
                .with_color(Color::Red),
        )
        .finish();
    let _ = report.write((filename, Source::from(source)), writer);
}
