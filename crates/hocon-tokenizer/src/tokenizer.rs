//! Tokenizer for the HOCON configuration language.

use crate::{Span, Token, TokenKind};
use tracing::trace;

/// A tokenizer that produces tokens from HOCON source text.
///
/// The tokenizer is lossless: concatenating the `text` of every produced
/// token reproduces the input exactly. Malformed input becomes `Problem`
/// tokens rather than errors, so the parser can report precise diagnostics.
#[derive(Clone)]
pub struct Tokenizer<'src> {
    /// The source text being tokenized.
    source: &'src str,
    /// The remaining source text (suffix of `source`).
    remaining: &'src str,
    /// Current byte position in `source`.
    pos: u32,
    /// Current 1-based line number.
    line: u32,
    /// Whether the `Start` token has been emitted.
    started: bool,
    /// Nesting depth of `${` substitutions. A `}` closes a substitution
    /// instead of an object while this is non-zero.
    substitution_depth: u32,
}

/// Characters pulled while scanning a number literal.
const NUMBER_CHARS: &str = "0123456789eE+-.";

impl<'src> Tokenizer<'src> {
    /// Create a new tokenizer for the given source text.
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            remaining: source,
            pos: 0,
            line: 1,
            started: false,
            substitution_depth: 0,
        }
    }

    /// Get the current byte position.
    #[inline]
    pub fn position(&self) -> u32 {
        self.pos
    }

    /// Check if we're at the end of input.
    #[inline]
    pub fn is_eof(&self) -> bool {
        self.remaining.is_empty()
    }

    /// Peek at the next character without consuming it.
    #[inline]
    fn peek(&self) -> Option<char> {
        self.remaining.chars().next()
    }

    /// Peek at the nth character (0-indexed) without consuming.
    #[inline]
    fn peek_nth(&self, n: usize) -> Option<char> {
        self.remaining.chars().nth(n)
    }

    /// Advance by one character and return it. Tracks line numbers.
    #[inline]
    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8() as u32;
        self.remaining = &self.remaining[c.len_utf8()..];
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    /// Check if the remaining text starts with the given prefix.
    #[inline]
    fn starts_with(&self, prefix: &str) -> bool {
        self.remaining.starts_with(prefix)
    }

    /// Create a token from the given start position to current position.
    fn token(&self, kind: TokenKind, start: u32, line: u32) -> Token<'src> {
        let span = Span::new(start, self.pos);
        let text = &self.source[start as usize..self.pos as usize];
        trace!("Token {:?} at {:?}: {:?}", kind, span, text);
        Token::new(kind, span, text, line)
    }

    /// Create a problem token from the given start position.
    fn problem(&self, start: u32, line: u32, message: impl Into<String>) -> Token<'src> {
        let span = Span::new(start, self.pos);
        let text = &self.source[start as usize..self.pos as usize];
        let message = message.into();
        trace!("Problem at {:?}: {} ({:?})", span, message, text);
        Token::problem(span, text, line, message)
    }

    /// Get the next token.
    pub fn next_token(&mut self) -> Token<'src> {
        if !self.started {
            self.started = true;
            return self.token(TokenKind::Start, self.pos, self.line);
        }

        if self.is_eof() {
            return self.token(TokenKind::Eof, self.pos, self.line);
        }

        let start = self.pos;
        let line = self.line;
        let c = self.peek().unwrap();

        match c {
            '\n' => {
                self.advance();
                self.token(TokenKind::Newline, start, line)
            }
            '\r' if self.peek_nth(1) == Some('\n') => {
                self.advance();
                self.advance();
                self.token(TokenKind::Newline, start, line)
            }

            '{' => {
                self.advance();
                self.token(TokenKind::LBrace, start, line)
            }
            '}' => {
                self.advance();
                if self.substitution_depth > 0 {
                    self.substitution_depth -= 1;
                    self.token(TokenKind::SubstitutionClose, start, line)
                } else {
                    self.token(TokenKind::RBrace, start, line)
                }
            }
            '[' => {
                self.advance();
                self.token(TokenKind::LBracket, start, line)
            }
            ']' => {
                self.advance();
                self.token(TokenKind::RBracket, start, line)
            }
            ',' => {
                self.advance();
                self.token(TokenKind::Comma, start, line)
            }
            '=' => {
                self.advance();
                self.token(TokenKind::Equals, start, line)
            }
            ':' => {
                self.advance();
                self.token(TokenKind::Colon, start, line)
            }
            '+' => {
                self.advance();
                if self.peek() == Some('=') {
                    self.advance();
                    self.token(TokenKind::PlusEquals, start, line)
                } else {
                    self.problem(start, line, "'+' not followed by '='")
                }
            }

            '$' => self.tokenize_substitution_open(),

            '#' => self.tokenize_comment(),
            '/' if self.starts_with("//") => self.tokenize_comment(),

            '"' if self.starts_with("\"\"\"") => self.tokenize_multiline_string(),
            '"' => self.tokenize_quoted_string(),

            '-' => self.tokenize_number(),
            _ if c.is_ascii_digit() => self.tokenize_number(),

            _ if c.is_whitespace() => self.tokenize_whitespace(),

            _ if is_unquoted_char(c) => self.tokenize_unquoted(),

            _ => {
                self.advance();
                self.problem(
                    start,
                    line,
                    format!("reserved character '{c}' is not allowed outside quotes"),
                )
            }
        }
    }

    /// Tokenize horizontal whitespace. Newlines are separate tokens.
    fn tokenize_whitespace(&mut self) -> Token<'src> {
        let start = self.pos;
        let line = self.line;
        while let Some(c) = self.peek() {
            if c == '\n' || (c == '\r' && self.peek_nth(1) == Some('\n')) {
                break;
            }
            if c.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
        self.token(TokenKind::Whitespace, start, line)
    }

    /// Tokenize a comment: `#` or `//` to end of line.
    fn tokenize_comment(&mut self) -> Token<'src> {
        let start = self.pos;
        let line = self.line;
        while let Some(c) = self.peek() {
            if c == '\n' || (c == '\r' && self.peek_nth(1) == Some('\n')) {
                break;
            }
            self.advance();
        }
        self.token(TokenKind::Comment, start, line)
    }

    /// Tokenize `${` or `${?`. A bare `$` is reserved.
    fn tokenize_substitution_open(&mut self) -> Token<'src> {
        let start = self.pos;
        let line = self.line;
        self.advance(); // consume `$`
        if self.peek() != Some('{') {
            return self.problem(start, line, "'$' not followed by '{'");
        }
        self.advance(); // consume `{`
        self.substitution_depth += 1;
        if self.peek() == Some('?') {
            self.advance();
            self.token(TokenKind::SubstitutionOptionalOpen, start, line)
        } else {
            self.token(TokenKind::SubstitutionOpen, start, line)
        }
    }

    /// Tokenize an unquoted string run.
    ///
    /// `true`, `false`, and `null` are classified here when the run
    /// matches those literal forms exactly.
    fn tokenize_unquoted(&mut self) -> Token<'src> {
        let start = self.pos;
        let line = self.line;
        while let Some(c) = self.peek() {
            // `//` starts a comment even mid-run; a single `/` is fine.
            if c == '/' && self.peek_nth(1) == Some('/') {
                break;
            }
            if is_unquoted_char(c) {
                self.advance();
            } else {
                break;
            }
        }
        let text = &self.source[start as usize..self.pos as usize];
        let kind = match text {
            "true" | "false" => TokenKind::Bool,
            "null" => TokenKind::Null,
            _ => TokenKind::Unquoted,
        };
        self.token(kind, start, line)
    }

    /// Tokenize a number per the JSON grammar.
    ///
    /// Pulls the run of number characters and classifies it. A run that
    /// fails to parse falls back to an unquoted string (`1.2.3` is the
    /// string "1.2.3"); a failed run containing characters illegal in
    /// unquoted strings is a problem token.
    fn tokenize_number(&mut self) -> Token<'src> {
        let start = self.pos;
        let line = self.line;
        while let Some(c) = self.peek() {
            if NUMBER_CHARS.contains(c) {
                self.advance();
            } else {
                break;
            }
        }
        let text = &self.source[start as usize..self.pos as usize];

        if text.contains('.') || text.contains('e') || text.contains('E') {
            if text.parse::<f64>().is_ok() {
                return self.token(TokenKind::Double, start, line);
            }
        } else if text.parse::<i64>().is_ok() {
            return self.token(TokenKind::Int, start, line);
        } else if text.parse::<f64>().is_ok() {
            // Integer too wide for i64; keep it as a double.
            return self.token(TokenKind::Double, start, line);
        }

        // Not a number after all. Keep pulling unquoted characters and
        // reclassify the whole run.
        while let Some(c) = self.peek() {
            if c == '/' && self.peek_nth(1) == Some('/') {
                break;
            }
            if is_unquoted_char(c) {
                self.advance();
            } else {
                break;
            }
        }
        let text = &self.source[start as usize..self.pos as usize];
        if text.chars().all(is_unquoted_char) {
            self.token(TokenKind::Unquoted, start, line)
        } else {
            self.problem(start, line, format!("invalid number: '{text}'"))
        }
    }

    /// Tokenize a quoted string: `"..."` with JSON escapes.
    fn tokenize_quoted_string(&mut self) -> Token<'src> {
        let start = self.pos;
        let line = self.line;
        self.advance(); // consume opening quote

        loop {
            match self.peek() {
                None => {
                    return self.problem(start, line, "unterminated quoted string");
                }
                Some('\n') => {
                    // Leave the newline for the next token.
                    return self.problem(
                        start,
                        line,
                        "quoted string must not contain a literal newline; use \\n",
                    );
                }
                Some('"') => {
                    self.advance();
                    return self.token(TokenKind::QuotedString, start, line);
                }
                Some('\\') => {
                    self.advance();
                    match self.peek() {
                        Some('"' | '\\' | '/' | 'b' | 'f' | 'n' | 'r' | 't') => {
                            self.advance();
                        }
                        Some('u') => {
                            self.advance();
                            for _ in 0..4 {
                                match self.peek() {
                                    Some(c) if c.is_ascii_hexdigit() => {
                                        self.advance();
                                    }
                                    _ => {
                                        return self.problem(
                                            start,
                                            line,
                                            "\\u escape must be followed by 4 hex digits",
                                        );
                                    }
                                }
                            }
                        }
                        Some(c) => {
                            self.advance();
                            return self.problem(
                                start,
                                line,
                                format!("invalid escape sequence '\\{c}'"),
                            );
                        }
                        None => {
                            return self.problem(start, line, "unterminated quoted string");
                        }
                    }
                }
                Some(_) => {
                    self.advance();
                }
            }
        }
    }

    /// Tokenize a triple-quoted string, copied verbatim with no escapes.
    ///
    /// The string ends at the last three quotes of a closing quote run, so
    /// `"""foo""""` contains `foo"`.
    fn tokenize_multiline_string(&mut self) -> Token<'src> {
        let start = self.pos;
        let line = self.line;
        self.advance();
        self.advance();
        self.advance(); // consume `"""`

        loop {
            match self.peek() {
                None => {
                    return self.problem(start, line, "unterminated triple-quoted string");
                }
                Some('"') if self.starts_with("\"\"\"") => {
                    self.advance();
                    self.advance();
                    self.advance();
                    // Extra quotes after the closing triple belong to the
                    // string content; the close is the final three.
                    while self.peek() == Some('"') {
                        self.advance();
                    }
                    return self.token(TokenKind::MultilineString, start, line);
                }
                Some(_) => {
                    self.advance();
                }
            }
        }
    }
}

impl<'src> Iterator for Tokenizer<'src> {
    type Item = Token<'src>;

    fn next(&mut self) -> Option<Self::Item> {
        let token = self.next_token();
        if token.kind == TokenKind::Eof {
            None
        } else {
            Some(token)
        }
    }
}

/// Check if a character is allowed in an unquoted string.
pub fn is_unquoted_char(c: char) -> bool {
    !matches!(
        c,
        '$' | '"'
            | '{'
            | '}'
            | '['
            | ']'
            | ':'
            | '='
            | ','
            | '+'
            | '#'
            | '`'
            | '^'
            | '?'
            | '!'
            | '@'
            | '*'
            | '&'
            | '\\'
    ) && !c.is_whitespace()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Tokenize, dropping the empty Start token.
    fn tokenize(source: &str) -> Vec<(TokenKind, &str)> {
        Tokenizer::new(source)
            .filter(|t| t.kind != TokenKind::Start)
            .map(|t| (t.kind, t.text))
            .collect()
    }

    fn roundtrip(source: &str) -> String {
        Tokenizer::new(source).map(|t| t.text).collect()
    }

    #[test]
    fn test_structural_tokens() {
        assert_eq!(tokenize("{"), vec![(TokenKind::LBrace, "{")]);
        assert_eq!(tokenize("}"), vec![(TokenKind::RBrace, "}")]);
        assert_eq!(tokenize("["), vec![(TokenKind::LBracket, "[")]);
        assert_eq!(tokenize("]"), vec![(TokenKind::RBracket, "]")]);
        assert_eq!(tokenize(","), vec![(TokenKind::Comma, ",")]);
        assert_eq!(tokenize("="), vec![(TokenKind::Equals, "=")]);
        assert_eq!(tokenize(":"), vec![(TokenKind::Colon, ":")]);
        assert_eq!(tokenize("+="), vec![(TokenKind::PlusEquals, "+=")]);
    }

    #[test]
    fn test_unquoted() {
        assert_eq!(tokenize("hello"), vec![(TokenKind::Unquoted, "hello")]);
        assert_eq!(
            tokenize("hello-world_x"),
            vec![(TokenKind::Unquoted, "hello-world_x")]
        );
        assert_eq!(tokenize("/usr/bin"), vec![(TokenKind::Unquoted, "/usr/bin")]);
    }

    #[test]
    fn test_bool_null_classification() {
        assert_eq!(tokenize("true"), vec![(TokenKind::Bool, "true")]);
        assert_eq!(tokenize("false"), vec![(TokenKind::Bool, "false")]);
        assert_eq!(tokenize("null"), vec![(TokenKind::Null, "null")]);
        // Only exact matches classify
        assert_eq!(tokenize("truex"), vec![(TokenKind::Unquoted, "truex")]);
        assert_eq!(tokenize("nullable"), vec![(TokenKind::Unquoted, "nullable")]);
    }

    #[test]
    fn test_numbers() {
        assert_eq!(tokenize("42"), vec![(TokenKind::Int, "42")]);
        assert_eq!(tokenize("-7"), vec![(TokenKind::Int, "-7")]);
        assert_eq!(tokenize("3.14"), vec![(TokenKind::Double, "3.14")]);
        assert_eq!(tokenize("1e6"), vec![(TokenKind::Double, "1e6")]);
        assert_eq!(tokenize("-2.5e-3"), vec![(TokenKind::Double, "-2.5e-3")]);
    }

    #[test]
    fn test_huge_int_is_double() {
        assert_eq!(
            tokenize("99999999999999999999"),
            vec![(TokenKind::Double, "99999999999999999999")]
        );
    }

    #[test]
    fn test_number_fallback_to_unquoted() {
        // A failed number parse becomes an unquoted string
        assert_eq!(tokenize("1.2.3"), vec![(TokenKind::Unquoted, "1.2.3")]);
        // A number followed by unquoted chars splits; concatenation
        // re-joins them later
        assert_eq!(
            tokenize("10ms"),
            vec![(TokenKind::Int, "10"), (TokenKind::Unquoted, "ms")]
        );
        assert_eq!(tokenize("-foo"), vec![(TokenKind::Unquoted, "-foo")]);
    }

    #[test]
    fn test_quoted_string() {
        assert_eq!(
            tokenize(r#""hello world""#),
            vec![(TokenKind::QuotedString, r#""hello world""#)]
        );
        assert_eq!(
            tokenize(r#""with \"escapes\" and \n""#),
            vec![(TokenKind::QuotedString, r#""with \"escapes\" and \n""#)]
        );
        assert_eq!(
            tokenize(r#""é""#),
            vec![(TokenKind::QuotedString, r#""é""#)]
        );
    }

    #[test]
    fn test_invalid_escape_is_problem() {
        let tokens = tokenize(r#""bad \q escape""#);
        assert_eq!(tokens[0].0, TokenKind::Problem);
    }

    #[test]
    fn test_unterminated_string_is_problem() {
        let tokens = tokenize("\"never closed");
        assert!(tokens.iter().any(|t| t.0 == TokenKind::Problem));
    }

    #[test]
    fn test_newline_in_string_is_problem() {
        let tokens = tokenize("\"line\nbreak\"");
        assert_eq!(tokens[0].0, TokenKind::Problem);
        // The newline itself is preserved as its own token
        assert!(tokens.iter().any(|t| t.0 == TokenKind::Newline));
    }

    #[test]
    fn test_multiline_string() {
        assert_eq!(
            tokenize("\"\"\"line1\nline2\"\"\""),
            vec![(TokenKind::MultilineString, "\"\"\"line1\nline2\"\"\"")]
        );
        // No escape processing inside
        assert_eq!(
            tokenize("\"\"\"a \\n b\"\"\""),
            vec![(TokenKind::MultilineString, "\"\"\"a \\n b\"\"\"")]
        );
    }

    #[test]
    fn test_multiline_string_extra_quotes() {
        // Extra quotes belong to the content: """foo"""" contains foo"
        assert_eq!(
            tokenize("\"\"\"foo\"\"\"\""),
            vec![(TokenKind::MultilineString, "\"\"\"foo\"\"\"\"")]
        );
    }

    #[test]
    fn test_comments() {
        assert_eq!(tokenize("# hash"), vec![(TokenKind::Comment, "# hash")]);
        assert_eq!(
            tokenize("// slashes"),
            vec![(TokenKind::Comment, "// slashes")]
        );
        let tokens = tokenize("a # trailing\nb");
        assert_eq!(
            tokens,
            vec![
                (TokenKind::Unquoted, "a"),
                (TokenKind::Whitespace, " "),
                (TokenKind::Comment, "# trailing"),
                (TokenKind::Newline, "\n"),
                (TokenKind::Unquoted, "b"),
            ]
        );
    }

    #[test]
    fn test_whitespace_and_newlines() {
        assert_eq!(tokenize("  \t"), vec![(TokenKind::Whitespace, "  \t")]);
        assert_eq!(tokenize("\n"), vec![(TokenKind::Newline, "\n")]);
        assert_eq!(tokenize("\r\n"), vec![(TokenKind::Newline, "\r\n")]);
    }

    #[test]
    fn test_substitutions() {
        assert_eq!(
            tokenize("${a.b}"),
            vec![
                (TokenKind::SubstitutionOpen, "${"),
                (TokenKind::Unquoted, "a.b"),
                (TokenKind::SubstitutionClose, "}"),
            ]
        );
        assert_eq!(
            tokenize("${?opt}"),
            vec![
                (TokenKind::SubstitutionOptionalOpen, "${?"),
                (TokenKind::Unquoted, "opt"),
                (TokenKind::SubstitutionClose, "}"),
            ]
        );
    }

    #[test]
    fn test_substitution_close_vs_rbrace() {
        let tokens = tokenize("{a=${b}}");
        assert_eq!(
            tokens,
            vec![
                (TokenKind::LBrace, "{"),
                (TokenKind::Unquoted, "a"),
                (TokenKind::Equals, "="),
                (TokenKind::SubstitutionOpen, "${"),
                (TokenKind::Unquoted, "b"),
                (TokenKind::SubstitutionClose, "}"),
                (TokenKind::RBrace, "}"),
            ]
        );
    }

    #[test]
    fn test_bare_dollar_is_problem() {
        let tokens = tokenize("$x");
        assert_eq!(tokens[0].0, TokenKind::Problem);
    }

    #[test]
    fn test_reserved_char_is_problem() {
        let tokens = tokenize("a?b");
        assert!(tokens.iter().any(|t| t.0 == TokenKind::Problem));
    }

    #[test]
    fn test_line_numbers() {
        let tokens: Vec<_> = Tokenizer::new("a\nb\n\nc").collect();
        let lines: Vec<(TokenKind, u32)> = tokens
            .iter()
            .filter(|t| !t.kind.is_trivia() && t.kind != TokenKind::Start)
            .map(|t| (t.kind, t.line))
            .collect();
        assert_eq!(
            lines,
            vec![
                (TokenKind::Unquoted, 1),
                (TokenKind::Unquoted, 2),
                (TokenKind::Unquoted, 4),
            ]
        );
    }

    #[test]
    fn test_roundtrip_targeted() {
        let cases = [
            "a = 1\nb = ${a}\n",
            "# comment\nfoo { bar: [1, 2.5, true, null] }",
            "include \"other.conf\"\n",
            "a += 2",
            "\"\"\"multi\nline\"\"\" tail",
            "bad \\ input ? here",
            "{ \"json\": true }",
        ];
        for case in cases {
            assert_eq!(roundtrip(case), case, "roundtrip failed for {case:?}");
        }
    }

    proptest::proptest! {
        /// Concatenating every token's text reproduces the input exactly.
        #[test]
        fn test_roundtrip_property(source in "\\PC*") {
            proptest::prop_assert_eq!(roundtrip(&source), source);
        }

        #[test]
        fn test_roundtrip_property_confish(source in "[a-z0-9 \n\t{}\\[\\]:=,+#\"$.]{0,64}") {
            proptest::prop_assert_eq!(roundtrip(&source), source);
        }
    }
}
