//! Recursive-descent document parser: tokens to syntax tree.
//!
//! The parser consumes every token into some node, so the resulting tree
//! re-renders byte-identically. It fails fast on the first malformed
//! construct; `Problem` tokens from the tokenizer surface here as parse
//! errors carrying the tokenizer's message.

use hocon_tokenizer::{Token, TokenKind, Tokenizer, unescape_quoted};
use hocon_tree::{Origin, Path};
use tracing::trace;

use crate::node::{Field, Node, RawToken, Root, SeparatorKind};
use crate::{ConfigSyntax, IncludeKind, IncludeSpec, ParseError};

/// Parse a document into its syntax tree.
///
/// `ConfigSyntax::Unspecified` parses as CONF; syntax fixup from file
/// extensions happens in the source layer.
pub fn parse_document_nodes(source: &str, syntax: ConfigSyntax) -> Result<Root, ParseError> {
    let mut parser = Parser::new(source, syntax);
    parser.parse_root()
}

/// Parse a single value fragment, as used by the document edit surface.
///
/// Leading and trailing trivia are discarded; formatting inside the value
/// is preserved.
pub fn parse_value_fragment(source: &str, syntax: ConfigSyntax) -> Result<Node, ParseError> {
    let mut parser = Parser::new(source, syntax);
    parser.skip_trivia();
    let value = parser.parse_value()?;
    parser.skip_trivia();
    if parser.peek().kind != TokenKind::Eof {
        return Err(parser.error_here("expecting end of value text"));
    }
    Ok(value)
}

struct Parser<'src> {
    tokens: Vec<Token<'src>>,
    pos: usize,
    json: bool,
}

impl<'src> Parser<'src> {
    fn new(source: &'src str, syntax: ConfigSyntax) -> Self {
        let mut tokenizer = Tokenizer::new(source);
        let mut tokens = Vec::new();
        loop {
            let token = tokenizer.next_token();
            let done = token.kind == TokenKind::Eof;
            if token.kind != TokenKind::Start {
                tokens.push(token);
            }
            if done {
                break;
            }
        }
        trace!("parsing {} tokens as {:?}", tokens.len(), syntax);
        Self {
            tokens,
            pos: 0,
            json: syntax.is_json(),
        }
    }

    fn peek(&self) -> &Token<'src> {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_kind(&self) -> TokenKind {
        self.peek().kind
    }

    fn bump(&mut self) -> RawToken {
        let token = RawToken::from_token(self.peek());
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn error_here(&self, message: impl Into<String>) -> ParseError {
        let token = self.peek();
        ParseError::new(message, token.span, token.line)
    }

    /// Convert a `Problem` token into a parse error.
    fn problem_error(&self) -> ParseError {
        let token = self.peek();
        let message = token
            .problem
            .clone()
            .unwrap_or_else(|| "malformed token".to_string());
        ParseError::new(message, token.span, token.line)
    }

    /// Describe the current token for error messages.
    fn describe_current(&self) -> String {
        let token = self.peek();
        match token.kind {
            TokenKind::Eof => "end of input".to_string(),
            TokenKind::Newline => "newline".to_string(),
            _ => format!("'{}'", token.text),
        }
    }

    /// Collect trivia into `children`. Newlines reset `need_separator`
    /// in CONF mode only; comments are rejected in JSON mode.
    fn collect_trivia(
        &mut self,
        children: &mut Vec<Node>,
        need_separator: Option<&mut bool>,
    ) -> Result<(), ParseError> {
        let mut need_separator = need_separator;
        loop {
            match self.peek_kind() {
                TokenKind::Whitespace => {
                    children.push(Node::Token(self.bump()));
                }
                TokenKind::Comment => {
                    if self.json {
                        return Err(self.error_here("JSON does not allow comments"));
                    }
                    children.push(Node::Token(self.bump()));
                }
                TokenKind::Newline => {
                    children.push(Node::Token(self.bump()));
                    if !self.json
                        && let Some(flag) = need_separator.as_deref_mut()
                    {
                        *flag = false;
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    /// Skip trivia without recording it (fragment parsing only).
    fn skip_trivia(&mut self) {
        while matches!(
            self.peek_kind(),
            TokenKind::Whitespace | TokenKind::Comment | TokenKind::Newline
        ) {
            self.bump();
        }
    }

    fn parse_root(&mut self) -> Result<Root, ParseError> {
        let mut children = Vec::new();
        self.collect_trivia(&mut children, None)?;

        match self.peek_kind() {
            TokenKind::LBrace => {
                children.push(self.parse_object()?);
                self.collect_trivia(&mut children, None)?;
                if self.peek_kind() != TokenKind::Eof {
                    return Err(self.error_here(format!(
                        "expecting end of input, got {}",
                        self.describe_current()
                    )));
                }
            }
            TokenKind::LBracket => {
                children.push(self.parse_array()?);
                self.collect_trivia(&mut children, None)?;
                if self.peek_kind() != TokenKind::Eof {
                    return Err(self.error_here(format!(
                        "expecting end of input, got {}",
                        self.describe_current()
                    )));
                }
            }
            TokenKind::Eof => {
                if self.json {
                    return Err(self.error_here("empty JSON document"));
                }
            }
            TokenKind::Problem => return Err(self.problem_error()),
            _ => {
                if self.json {
                    return Err(
                        self.error_here("JSON document must have an object or array at root")
                    );
                }
                self.parse_object_body(&mut children, None)?;
            }
        }

        let syntax = if self.json {
            ConfigSyntax::Json
        } else {
            ConfigSyntax::Conf
        };
        Ok(Root { children, syntax })
    }

    /// Parse an object starting at `{`.
    fn parse_object(&mut self) -> Result<Node, ParseError> {
        let mut children = vec![Node::Token(self.bump())];
        self.parse_object_body(&mut children, Some(TokenKind::RBrace))?;
        Ok(Node::Object(children))
    }

    /// Parse object content up to `close` (or end of input for the
    /// brace-less document root).
    fn parse_object_body(
        &mut self,
        children: &mut Vec<Node>,
        close: Option<TokenKind>,
    ) -> Result<(), ParseError> {
        let mut need_separator = false;
        let mut just_had_comma = false;
        let mut has_field = false;

        loop {
            self.collect_trivia(children, Some(&mut need_separator))?;
            let kind = self.peek_kind();

            if Some(kind) == close {
                if self.json && just_had_comma {
                    return Err(self.error_here("JSON does not allow a trailing comma"));
                }
                children.push(Node::Token(self.bump()));
                return Ok(());
            }

            match kind {
                TokenKind::Eof => {
                    if close.is_some() {
                        return Err(self.error_here("object has no closing '}'"));
                    }
                    return Ok(());
                }
                TokenKind::RBrace => {
                    // close is None here: a brace-less root
                    return Err(self.error_here("unbalanced '}'"));
                }
                TokenKind::Comma => {
                    if !has_field || just_had_comma {
                        return Err(
                            self.error_here("expecting a field name before ','")
                        );
                    }
                    children.push(Node::Token(self.bump()));
                    just_had_comma = true;
                    need_separator = false;
                }
                TokenKind::Problem => return Err(self.problem_error()),
                _ => {
                    if need_separator {
                        return Err(self.error_here(format!(
                            "expecting a comma or newline before next field, got {}",
                            self.describe_current()
                        )));
                    }
                    let node = self.parse_field_or_include()?;
                    children.push(node);
                    has_field = true;
                    need_separator = true;
                    just_had_comma = false;
                }
            }
        }
    }

    fn parse_field_or_include(&mut self) -> Result<Node, ParseError> {
        if !self.json && self.peek_kind() == TokenKind::Unquoted && self.peek().text == "include" {
            let mark = self.pos;
            match self.try_parse_include() {
                Ok(Some(node)) => return Ok(node),
                Ok(None) => self.pos = mark,
                Err(error) => return Err(error),
            }
        }
        self.parse_field()
    }

    /// Parse an include directive. Returns `Ok(None)` when `include`
    /// turns out to be an ordinary key (`include = 42`).
    fn try_parse_include(&mut self) -> Result<Option<Node>, ParseError> {
        let mut tokens = vec![self.bump()]; // the `include` keyword
        while self.peek_kind() == TokenKind::Whitespace {
            tokens.push(self.bump());
        }

        // `include` as a key is followed by a separator or `{`.
        match self.peek_kind() {
            TokenKind::QuotedString | TokenKind::Unquoted => {}
            _ => return Ok(None),
        }

        // Collect the argument tokens up to the next boundary.
        let arg_start = tokens.len();
        loop {
            match self.peek_kind() {
                TokenKind::QuotedString | TokenKind::Unquoted | TokenKind::Whitespace => {
                    tokens.push(self.bump());
                }
                TokenKind::Problem => return Err(self.problem_error()),
                _ => break,
            }
        }

        let spec = self.analyze_include_argument(&tokens[arg_start..])?;
        Ok(Some(Node::Include { tokens, spec }))
    }

    /// Decode an include argument: a quoted string, optionally inside
    /// `file()` / `classpath()` / `url()`, optionally inside
    /// `required()`.
    fn analyze_include_argument(&self, tokens: &[RawToken]) -> Result<IncludeSpec, ParseError> {
        let bad = |parser: &Self| {
            parser.error_here(
                "include statement's argument must be a quoted string, optionally wrapped in \
                 file(), classpath(), url(), or required()",
            )
        };

        let mut prefix = String::new();
        let mut suffix = String::new();
        let mut name: Option<String> = None;
        for token in tokens {
            match token.kind {
                TokenKind::Whitespace => continue,
                TokenKind::QuotedString => {
                    if name.is_some() {
                        return Err(bad(self));
                    }
                    let inner = &token.text[1..token.text.len() - 1];
                    name = Some(unescape_quoted(inner).into_owned());
                }
                TokenKind::Unquoted => {
                    if name.is_none() {
                        prefix.push_str(&token.text);
                    } else {
                        suffix.push_str(&token.text);
                    }
                }
                _ => return Err(bad(self)),
            }
        }
        let Some(name) = name else {
            return Err(bad(self));
        };

        let mut opens = 0usize;
        let mut rest = prefix.as_str();
        let required = if let Some(after) = rest.strip_prefix("required(") {
            opens += 1;
            rest = after;
            true
        } else {
            false
        };
        let kind = if let Some(after) = rest.strip_prefix("file(") {
            rest = after;
            opens += 1;
            IncludeKind::File
        } else if let Some(after) = rest.strip_prefix("classpath(") {
            rest = after;
            opens += 1;
            IncludeKind::Classpath
        } else if let Some(after) = rest.strip_prefix("url(") {
            rest = after;
            opens += 1;
            IncludeKind::Url
        } else {
            IncludeKind::Heuristic
        };
        if !rest.is_empty() || suffix != ")".repeat(opens) {
            return Err(bad(self));
        }

        Ok(IncludeSpec {
            kind,
            name,
            required,
        })
    }

    fn parse_field(&mut self) -> Result<Node, ParseError> {
        // Key path tokens, interior whitespace included.
        let key_start = self.pos;
        let mut key_tokens = Vec::new();
        loop {
            match self.peek_kind() {
                TokenKind::Unquoted
                | TokenKind::QuotedString
                | TokenKind::Int
                | TokenKind::Double
                | TokenKind::Bool
                | TokenKind::Null
                | TokenKind::Whitespace => {
                    key_tokens.push(self.bump());
                }
                TokenKind::Problem => return Err(self.problem_error()),
                _ => break,
            }
        }
        if !key_tokens.iter().any(|t| t.kind != TokenKind::Whitespace) {
            return Err(self.error_here(format!(
                "expecting a field name, got {}",
                self.describe_current()
            )));
        }

        if self.json {
            let non_ws: Vec<_> = key_tokens
                .iter()
                .filter(|t| t.kind != TokenKind::Whitespace)
                .collect();
            if non_ws.len() != 1 || non_ws[0].kind != TokenKind::QuotedString {
                return Err(self.error_here("JSON field names must be quoted strings"));
            }
        }

        let path = self.path_from_range(key_start, self.pos)?;

        // Separator (or `{` for `key { ... }`).
        let mut separator_tokens = Vec::new();
        let separator = match self.peek_kind() {
            TokenKind::Colon => {
                separator_tokens.push(self.bump());
                SeparatorKind::Colon
            }
            TokenKind::Equals => {
                if self.json {
                    return Err(self.error_here("JSON does not allow '='; use ':'"));
                }
                separator_tokens.push(self.bump());
                SeparatorKind::Equals
            }
            TokenKind::PlusEquals => {
                if self.json {
                    return Err(self.error_here("JSON does not allow '+='"));
                }
                separator_tokens.push(self.bump());
                SeparatorKind::PlusEquals
            }
            TokenKind::LBrace => SeparatorKind::None,
            _ => {
                return Err(self.error_here(format!(
                    "expecting ':', '=', '+=', or '{{' after key '{path}', got {}",
                    self.describe_current()
                )));
            }
        };

        // Whitespace between separator and value.
        while self.peek_kind() == TokenKind::Whitespace {
            separator_tokens.push(self.bump());
        }

        let value = self.parse_value()?;

        Ok(Node::Field(Field {
            key_tokens,
            path,
            separator_tokens,
            separator,
            value: Box::new(value),
        }))
    }

    /// Build a `Path` from a range of the original token buffer.
    fn path_from_range(&self, start: usize, end: usize) -> Result<Path, ParseError> {
        let placeholder = Origin::new("key");
        Path::from_tokens(&self.tokens[start..end], &placeholder).map_err(|error| {
            let message = match error.kind() {
                hocon_tree::ConfigErrorKind::Parse { message } => message.clone(),
                other => format!("invalid key: {other:?}"),
            };
            let token = &self.tokens[start];
            ParseError::new(message, token.span, token.line)
        })
    }

    /// Parse a value, collecting adjacent parts on the same line into a
    /// concatenation.
    fn parse_value(&mut self) -> Result<Node, ParseError> {
        let mut parts = vec![self.parse_value_part()?];

        loop {
            let mark = self.pos;
            let mut whitespace = Vec::new();
            while self.peek_kind() == TokenKind::Whitespace {
                whitespace.push(Node::Token(self.bump()));
            }
            if self.peek_kind().is_value_start() {
                if self.json {
                    return Err(self.error_here(
                        "JSON does not allow concatenation; expecting ',' or a closing delimiter",
                    ));
                }
                parts.extend(whitespace);
                parts.push(self.parse_value_part()?);
            } else {
                self.pos = mark;
                break;
            }
        }

        if parts.len() == 1 {
            Ok(parts.pop().expect("one part"))
        } else {
            Ok(Node::Concat(parts))
        }
    }

    fn parse_value_part(&mut self) -> Result<Node, ParseError> {
        match self.peek_kind() {
            TokenKind::Int
            | TokenKind::Double
            | TokenKind::Bool
            | TokenKind::Null
            | TokenKind::QuotedString
            | TokenKind::MultilineString => Ok(Node::SimpleValue(self.bump())),
            TokenKind::Unquoted => {
                if self.json {
                    return Err(self.error_here("JSON does not allow unquoted strings"));
                }
                Ok(Node::SimpleValue(self.bump()))
            }
            TokenKind::SubstitutionOpen | TokenKind::SubstitutionOptionalOpen => {
                if self.json {
                    return Err(self.error_here("JSON does not allow substitutions"));
                }
                self.parse_substitution()
            }
            TokenKind::LBrace => self.parse_object(),
            TokenKind::LBracket => self.parse_array(),
            TokenKind::Problem => Err(self.problem_error()),
            _ => Err(self.error_here(format!(
                "expecting a value, got {}",
                self.describe_current()
            ))),
        }
    }

    fn parse_substitution(&mut self) -> Result<Node, ParseError> {
        let mut tokens = vec![self.bump()];
        loop {
            match self.peek_kind() {
                TokenKind::SubstitutionClose => {
                    tokens.push(self.bump());
                    return Ok(Node::Substitution(tokens));
                }
                TokenKind::Newline | TokenKind::Eof => {
                    return Err(self.error_here("substitution '${' is not closed with '}'"));
                }
                TokenKind::Comment => {
                    return Err(self.error_here("comments are not allowed inside '${...}'"));
                }
                TokenKind::SubstitutionOpen | TokenKind::SubstitutionOptionalOpen => {
                    return Err(self.error_here("substitutions cannot be nested"));
                }
                TokenKind::Problem => return Err(self.problem_error()),
                _ => tokens.push(self.bump()),
            }
        }
    }

    fn parse_array(&mut self) -> Result<Node, ParseError> {
        let mut children = vec![Node::Token(self.bump())];
        let mut need_separator = false;
        let mut just_had_comma = false;
        let mut has_element = false;

        loop {
            self.collect_trivia(&mut children, Some(&mut need_separator))?;
            match self.peek_kind() {
                TokenKind::RBracket => {
                    if self.json && just_had_comma {
                        return Err(self.error_here("JSON does not allow a trailing comma"));
                    }
                    children.push(Node::Token(self.bump()));
                    return Ok(Node::Array(children));
                }
                TokenKind::Eof => {
                    return Err(self.error_here("array has no closing ']'"));
                }
                TokenKind::Comma => {
                    if !has_element || just_had_comma {
                        return Err(self.error_here("expecting an array element before ','"));
                    }
                    children.push(Node::Token(self.bump()));
                    just_had_comma = true;
                    need_separator = false;
                }
                TokenKind::Problem => return Err(self.problem_error()),
                _ => {
                    if need_separator {
                        return Err(self.error_here(format!(
                            "expecting a comma or newline before next array element, got {}",
                            self.describe_current()
                        )));
                    }
                    children.push(self.parse_value()?);
                    has_element = true;
                    need_separator = true;
                    just_had_comma = false;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Root {
        parse_document_nodes(source, ConfigSyntax::Conf).expect("parse failed")
    }

    fn parse_json(source: &str) -> Result<Root, ParseError> {
        parse_document_nodes(source, ConfigSyntax::Json)
    }

    #[test]
    fn test_round_trip() {
        let cases = [
            "",
            "a = 1",
            "a = 1\nb = 2\n",
            "# leading comment\na : hello world  // trailing\n",
            "a { x = 1, y = 2 }",
            "a.b.c = [1, 2, 3,]\n",
            "a = ${x.y} tail",
            "a += 2\n",
            "include \"other.conf\"\nb = 1\n",
            "include required(file(\"x.conf\"))\n",
            "{ a = 1 }\n",
            "[1, 2]\n",
            "m = \"\"\"multi\nline\"\"\"\n",
            "empty {}\n",
        ];
        for case in cases {
            let root = parse(case);
            assert_eq!(root.render(), case, "round trip failed for {case:?}");
        }
    }

    #[test]
    fn test_json_round_trip() {
        let cases = ["{ \"a\": 1 }", "[1, 2.5, true, null, \"s\"]", "{\n  \"a\": { \"b\": [] }\n}"];
        for case in cases {
            let root = parse_json(case).expect("json parse failed");
            assert_eq!(root.render(), case);
        }
    }

    #[test]
    fn test_field_structure() {
        let root = parse("a.b = 1");
        let field = root
            .children
            .iter()
            .find_map(|n| match n {
                Node::Field(f) => Some(f),
                _ => None,
            })
            .expect("no field");
        assert_eq!(field.path, Path::parse("a.b").unwrap());
        assert_eq!(field.separator, SeparatorKind::Equals);
    }

    #[test]
    fn test_plus_equals_structure() {
        let root = parse("a += 2");
        let field = root
            .children
            .iter()
            .find_map(|n| match n {
                Node::Field(f) => Some(f),
                _ => None,
            })
            .expect("no field");
        assert_eq!(field.separator, SeparatorKind::PlusEquals);
    }

    #[test]
    fn test_concat_parts() {
        let root = parse("a = foo ${b} baz");
        let field = root
            .children
            .iter()
            .find_map(|n| match n {
                Node::Field(f) => Some(f),
                _ => None,
            })
            .expect("no field");
        match field.value.as_ref() {
            Node::Concat(parts) => {
                // foo, ws, ${b}, ws, baz
                assert_eq!(parts.len(), 5);
            }
            other => panic!("expected concat, got {other:?}"),
        }
    }

    #[test]
    fn test_include_specs() {
        let cases = [
            ("include \"a.conf\"", IncludeKind::Heuristic, "a.conf", false),
            ("include file(\"b.conf\")", IncludeKind::File, "b.conf", false),
            (
                "include required(file(\"c.conf\"))",
                IncludeKind::File,
                "c.conf",
                true,
            ),
            (
                "include required(\"d.conf\")",
                IncludeKind::Heuristic,
                "d.conf",
                true,
            ),
            (
                "include classpath(\"e.conf\")",
                IncludeKind::Classpath,
                "e.conf",
                false,
            ),
            (
                "include required( file( \"f.conf\" ) )",
                IncludeKind::File,
                "f.conf",
                true,
            ),
        ];
        for (source, kind, name, required) in cases {
            let root = parse(source);
            let spec = root
                .children
                .iter()
                .find_map(|n| match n {
                    Node::Include { spec, .. } => Some(spec),
                    _ => None,
                })
                .unwrap_or_else(|| panic!("no include in {source:?}"));
            assert_eq!(spec.kind, kind, "{source}");
            assert_eq!(spec.name, name, "{source}");
            assert_eq!(spec.required, required, "{source}");
        }
    }

    #[test]
    fn test_include_as_ordinary_key() {
        let root = parse("include = 42");
        assert!(
            root.children
                .iter()
                .any(|n| matches!(n, Node::Field(f) if f.path.first() == "include"))
        );
    }

    #[test]
    fn test_missing_separator_is_error() {
        assert!(parse_document_nodes("a = 1 b = 2", ConfigSyntax::Conf).is_err());
    }

    #[test]
    fn test_unclosed_object_is_error() {
        assert!(parse_document_nodes("a { x = 1", ConfigSyntax::Conf).is_err());
    }

    #[test]
    fn test_unclosed_substitution_is_error() {
        assert!(parse_document_nodes("a = ${x\nb = 1", ConfigSyntax::Conf).is_err());
    }

    #[test]
    fn test_key_without_value_is_error() {
        assert!(parse_document_nodes("a\n", ConfigSyntax::Conf).is_err());
        assert!(parse_document_nodes("a =\n", ConfigSyntax::Conf).is_err());
    }

    #[test]
    fn test_json_rejections() {
        // Trailing comma
        assert!(parse_json("{ \"a\": 1, }").is_err());
        // Comments
        assert!(parse_json("{ \"a\": 1 } // done").is_err());
        // Unquoted strings
        assert!(parse_json("{ \"a\": hello }").is_err());
        // Unbraced root
        assert!(parse_json("\"a\": 1").is_err());
        // '=' separator
        assert!(parse_json("{ \"a\" = 1 }").is_err());
        // Substitution
        assert!(parse_json("{ \"a\": \"x\", \"b\": 1 }").is_ok());
        assert!(parse_json("{ \"b\": ${a} }").is_err());
        // Newline is not a separator in JSON
        assert!(parse_json("{ \"a\": 1\n\"b\": 2 }").is_err());
    }

    #[test]
    fn test_hocon_trailing_comma_ok() {
        assert!(parse_document_nodes("{ a : 1, }", ConfigSyntax::Conf).is_ok());
        assert!(parse_document_nodes("[1, 2,]", ConfigSyntax::Conf).is_ok());
    }

    #[test]
    fn test_double_comma_is_error() {
        assert!(parse_document_nodes("{ a : 1,, b : 2 }", ConfigSyntax::Conf).is_err());
        assert!(parse_document_nodes("[1,, 2]", ConfigSyntax::Conf).is_err());
    }

    #[test]
    fn test_value_fragment() {
        let node = parse_value_fragment("  { a = 1 } ", ConfigSyntax::Conf).unwrap();
        assert!(matches!(node, Node::Object(_)));
        assert_eq!(node.render(), "{ a = 1 }");

        assert!(parse_value_fragment("1 \n 2", ConfigSyntax::Conf).is_err());
    }
}
