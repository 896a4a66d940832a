//! Key paths: the addressing primitive.
//!
//! A path is an ordered sequence of key segments. The canonical string
//! form separates segments with `.` and quotes any segment containing
//! reserved characters, so `a.b."c.d".e` has four segments.

use hocon_tokenizer::{Token, TokenKind, Tokenizer, escape_json_string, unescape_quoted};

use crate::{ConfigError, Origin, Result};

/// An ordered sequence of key segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Path {
    segments: Vec<String>,
}

impl Path {
    /// Create a path from segments. Must be non-empty.
    pub fn new(segments: Vec<String>) -> Self {
        debug_assert!(!segments.is_empty());
        Self { segments }
    }

    /// Create a single-segment path from a literal key (no `.` splitting).
    pub fn from_key(key: impl Into<String>) -> Self {
        Self {
            segments: vec![key.into()],
        }
    }

    /// Parse a path from its string form, honoring quoted segments.
    pub fn parse(s: &str) -> Result<Path> {
        let origin = Origin::new(format!("path parameter '{s}'"));
        let tokens: Vec<Token<'_>> = Tokenizer::new(s).collect();
        Self::from_tokens(&tokens, &origin)
    }

    /// Build a path from a token stream.
    ///
    /// Used both for `Path::parse` and by the document parser for key
    /// paths and substitution bodies. Whitespace adjacent to `.` is
    /// dropped; interior whitespace between unquoted runs is preserved
    /// (`a b.c` has segments `a b` and `c`).
    pub fn from_tokens(tokens: &[Token<'_>], origin: &Origin) -> Result<Path> {
        let mut segments: Vec<String> = Vec::new();
        let mut current = String::new();
        let mut have_current = false;
        let mut pending_ws = String::new();

        let mut end_segment =
            |current: &mut String, have_current: &mut bool, pending_ws: &mut String| {
                if !*have_current {
                    return Err(ConfigError::parse(
                        origin.clone(),
                        "path has a leading, trailing, or doubled '.' (empty segment)",
                    ));
                }
                segments.push(std::mem::take(current));
                *have_current = false;
                pending_ws.clear();
                Ok(())
            };

        for token in tokens {
            match token.kind {
                TokenKind::Start | TokenKind::Eof => continue,
                TokenKind::Whitespace => {
                    if have_current {
                        pending_ws.push_str(token.text);
                    }
                }
                TokenKind::QuotedString => {
                    current.push_str(&pending_ws);
                    pending_ws.clear();
                    let inner = &token.text[1..token.text.len() - 1];
                    current.push_str(&unescape_quoted(inner));
                    have_current = true;
                }
                TokenKind::Unquoted
                | TokenKind::Int
                | TokenKind::Double
                | TokenKind::Bool
                | TokenKind::Null => {
                    for c in token.text.chars() {
                        if c == '.' {
                            end_segment(&mut current, &mut have_current, &mut pending_ws)?;
                        } else {
                            current.push_str(&pending_ws);
                            pending_ws.clear();
                            current.push(c);
                            have_current = true;
                        }
                    }
                }
                TokenKind::Problem => {
                    let message = token
                        .problem
                        .clone()
                        .unwrap_or_else(|| "malformed token".to_string());
                    return Err(ConfigError::parse(origin.clone(), message));
                }
                _ => {
                    return Err(ConfigError::parse(
                        origin.clone(),
                        format!("token not allowed in a path expression: '{}'", token.text),
                    ));
                }
            }
        }

        end_segment(&mut current, &mut have_current, &mut pending_ws)?;
        Ok(Path { segments })
    }

    /// The segments in order.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Always false; paths have at least one segment.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// The first segment.
    pub fn first(&self) -> &str {
        &self.segments[0]
    }

    /// The last segment.
    pub fn last(&self) -> &str {
        &self.segments[self.segments.len() - 1]
    }

    /// The path without its first segment, or `None` for a single key.
    pub fn remainder(&self) -> Option<Path> {
        if self.segments.len() <= 1 {
            None
        } else {
            Some(Path {
                segments: self.segments[1..].to_vec(),
            })
        }
    }

    /// The path without its last segment, or `None` for a single key.
    pub fn parent(&self) -> Option<Path> {
        if self.segments.len() <= 1 {
            None
        } else {
            Some(Path {
                segments: self.segments[..self.segments.len() - 1].to_vec(),
            })
        }
    }

    /// Append a single key.
    pub fn child_key(&self, key: impl Into<String>) -> Path {
        let mut segments = self.segments.clone();
        segments.push(key.into());
        Path { segments }
    }

    /// Append another path.
    pub fn child(&self, other: &Path) -> Path {
        let mut segments = self.segments.clone();
        segments.extend(other.segments.iter().cloned());
        Path { segments }
    }

    /// Whether `prefix` is a prefix of this path (or equal to it).
    pub fn starts_with(&self, prefix: &Path) -> bool {
        self.segments.len() >= prefix.segments.len()
            && self.segments[..prefix.segments.len()] == prefix.segments[..]
    }

    /// Canonical string form, quoting segments with reserved characters.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                out.push('.');
            }
            if needs_quotes(segment) {
                out.push('"');
                out.push_str(&escape_json_string(segment));
                out.push('"');
            } else {
                out.push_str(segment);
            }
        }
        out
    }

    /// The segments joined with the given separator, unquoted. Used for
    /// environment variable lookup.
    pub fn join_plain(&self, separator: &str) -> String {
        self.segments.join(separator)
    }
}

/// A segment renders unquoted only when it consists of plain
/// identifier-ish characters.
fn needs_quotes(segment: &str) -> bool {
    segment.is_empty()
        || !segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

impl std::fmt::Display for Path {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.render())
    }
}
