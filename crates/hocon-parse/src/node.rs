//! The formatting-preserving syntax tree.
//!
//! Every token the tokenizer produced is recorded in some node, so
//! rendering the tree reproduces the source byte-for-byte. Nodes own
//! their text and outlive the source buffer. The semantic value tree is
//! built from these nodes by [`crate::build_value`]; it references
//! origins but never nodes.

use hocon_tokenizer::{Token, TokenKind};
use hocon_tree::Path;

use crate::{ConfigSyntax, IncludeSpec};

/// An owned copy of a token: kind, exact text, and starting line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawToken {
    /// The token kind.
    pub kind: TokenKind,
    /// The exact source text.
    pub text: String,
    /// 1-based line where the token starts.
    pub line: u32,
}

impl RawToken {
    /// Copy a borrowed token into an owned one.
    pub fn from_token(token: &Token<'_>) -> Self {
        Self {
            kind: token.kind,
            text: token.text.to_string(),
            line: token.line,
        }
    }

    /// Make a synthetic token (used by the document edit surface).
    pub fn synthetic(kind: TokenKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            line: 0,
        }
    }
}

/// How a field separated its key from its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeparatorKind {
    /// `=`
    Equals,
    /// `:`
    Colon,
    /// `+=`, which desugars to a self-referential list append.
    PlusEquals,
    /// No separator: `key { ... }`.
    None,
}

/// A key/value field.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// The key tokens as written, including interior whitespace.
    pub key_tokens: Vec<RawToken>,
    /// The parsed key path.
    pub path: Path,
    /// Separator token plus surrounding whitespace.
    pub separator_tokens: Vec<RawToken>,
    /// Which separator was used.
    pub separator: SeparatorKind,
    /// The value.
    pub value: Box<Node>,
}

/// A node in the syntax tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// A single preserved token: whitespace, newline, comment, or
    /// punctuation.
    Token(RawToken),
    /// A scalar value: one token.
    SimpleValue(RawToken),
    /// A substitution: `${`, body tokens, `}`.
    Substitution(Vec<RawToken>),
    /// Adjacent values forming a concatenation, with interior
    /// whitespace preserved as `Token` children.
    Concat(Vec<Node>),
    /// An object; children include the braces, trivia, fields, and
    /// includes.
    Object(Vec<Node>),
    /// An array; children include the brackets, trivia, and element
    /// values.
    Array(Vec<Node>),
    /// A key/value field.
    Field(Field),
    /// An include directive, with its parsed form.
    Include {
        /// The directive's tokens as written.
        tokens: Vec<RawToken>,
        /// The parsed argument.
        spec: IncludeSpec,
    },
}

impl Node {
    /// Append this node's exact source text.
    pub fn render_into(&self, out: &mut String) {
        match self {
            Node::Token(token) | Node::SimpleValue(token) => out.push_str(&token.text),
            Node::Substitution(tokens) => {
                for token in tokens {
                    out.push_str(&token.text);
                }
            }
            Node::Concat(children) | Node::Object(children) | Node::Array(children) => {
                for child in children {
                    child.render_into(out);
                }
            }
            Node::Field(field) => {
                for token in &field.key_tokens {
                    out.push_str(&token.text);
                }
                for token in &field.separator_tokens {
                    out.push_str(&token.text);
                }
                field.value.render_into(out);
            }
            Node::Include { tokens, .. } => {
                for token in tokens {
                    out.push_str(&token.text);
                }
            }
        }
    }

    /// This node's exact source text.
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.render_into(&mut out);
        out
    }

    /// The 1-based line this node starts on.
    pub fn start_line(&self) -> u32 {
        match self {
            Node::Token(token) | Node::SimpleValue(token) => token.line,
            Node::Substitution(tokens) => tokens.first().map(|t| t.line).unwrap_or(1),
            Node::Concat(children) | Node::Object(children) | Node::Array(children) => {
                children.first().map(Node::start_line).unwrap_or(1)
            }
            Node::Field(field) => field
                .key_tokens
                .first()
                .map(|t| t.line)
                .unwrap_or_else(|| field.value.start_line()),
            Node::Include { tokens, .. } => tokens.first().map(|t| t.line).unwrap_or(1),
        }
    }
}

/// The root of a parsed document: top-level content plus surrounding
/// trivia.
#[derive(Debug, Clone, PartialEq)]
pub struct Root {
    /// Top-level children. Either trivia plus a single `Object`/`Array`
    /// node, or (for brace-less HOCON roots) trivia, fields, and
    /// includes directly.
    pub children: Vec<Node>,
    /// The syntax the document was parsed with.
    pub syntax: ConfigSyntax,
}

impl Root {
    /// Re-render the document exactly as it was written.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            child.render_into(&mut out);
        }
        out
    }

    /// Whether the top level is an explicit array.
    pub fn is_array_root(&self) -> bool {
        self.children
            .iter()
            .any(|child| matches!(child, Node::Array(_)))
    }
}
