//! Parse errors with source spans.

use hocon_tokenizer::Span;
use hocon_tree::{ConfigError, Origin};

/// A parse error at a known span.
///
/// The span makes source-context diagnostics possible (see
/// [`crate::render_parse_error`]); conversion to [`ConfigError`] attaches
/// the owning source's origin with the line number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// What went wrong.
    pub message: String,
    /// Where in the source.
    pub span: Span,
    /// 1-based line of the error.
    pub line: u32,
}

impl ParseError {
    /// Create a new parse error.
    pub fn new(message: impl Into<String>, span: Span, line: u32) -> Self {
        Self {
            message: message.into(),
            span,
            line,
        }
    }

    /// Attach a source origin, producing the public error type.
    pub fn into_config_error(self, origin: &Origin) -> ConfigError {
        ConfigError::parse(origin.with_line(self.line), self.message)
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at line {}", self.message, self.line)
    }
}

impl std::error::Error for ParseError {}
