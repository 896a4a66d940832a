//! The document edit surface.
//!
//! A `ConfigDocument` wraps a parsed syntax tree and supports replacing,
//! adding, and removing values at a path while leaving everything else
//! byte-identical. Edits produce a new document; nodes are immutable and
//! shared by clone.

use hocon_tokenizer::TokenKind;
use hocon_tree::{ConfigError, Origin, Path, Result};

use crate::node::{Field, Node, RawToken, Root, SeparatorKind};
use crate::{ConfigSyntax, parse_document_nodes, parse_value_fragment};

/// A parsed document that can be re-rendered exactly and edited.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigDocument {
    root: Root,
}

impl ConfigDocument {
    /// Parse a document.
    pub fn parse(source: &str, syntax: ConfigSyntax) -> Result<Self> {
        let origin = Origin::new("string");
        let root = parse_document_nodes(source, syntax)
            .map_err(|error| error.into_config_error(&origin))?;
        Ok(Self { root })
    }

    /// Wrap an already-parsed tree.
    pub fn from_root(root: Root) -> Self {
        Self { root }
    }

    /// The underlying syntax tree.
    pub fn root(&self) -> &Root {
        &self.root
    }

    /// The syntax this document was parsed with.
    pub fn syntax(&self) -> ConfigSyntax {
        self.root.syntax
    }

    /// Render the document. Unedited documents render byte-identically
    /// to their input.
    pub fn render(&self) -> String {
        self.root.render()
    }

    /// Whether a field exists at the path (or the path is an object
    /// prefix of an existing field).
    pub fn has_path(&self, path: &str) -> Result<bool> {
        let target = Path::parse(path)?;
        if self.root.is_array_root() {
            return Ok(false);
        }
        Ok(has_in_children(object_body(&self.root.children), &target))
    }

    /// Replace the value at `path` with parsed `value_text`, appending a
    /// new field if the path does not exist. Formatting inside
    /// `value_text` is preserved.
    pub fn set_value(&self, path: &str, value_text: &str) -> Result<ConfigDocument> {
        let target = Path::parse(path)?;
        if self.root.is_array_root() {
            return Err(ConfigError::wrong_type(
                Origin::new("document"),
                path,
                "object at document root",
                "array",
            ));
        }
        let value = parse_value_fragment(value_text, self.root.syntax)
            .map_err(|error| error.into_config_error(&Origin::new("value text")))?;

        let mut root = self.root.clone();
        let json = root.syntax.is_json();
        let replaced = {
            let children = object_body_mut(&mut root.children);
            set_in_children(children, &target, &value)
        };
        if !replaced {
            append_field(&mut root, &target, value, json);
        }
        Ok(ConfigDocument { root })
    }

    /// Replace the value at `path` with a rendered config value.
    pub fn set_config_value(
        &self,
        path: &str,
        value: &hocon_tree::ConfigValue,
    ) -> Result<ConfigDocument> {
        let text = hocon_tree::render(value, &hocon_tree::RenderOptions::concise());
        self.set_value(path, &text)
    }

    /// Remove every field at `path` (including any nested definitions of
    /// descendant paths).
    pub fn remove_path(&self, path: &str) -> Result<ConfigDocument> {
        let target = Path::parse(path)?;
        let mut root = self.root.clone();
        {
            let children = object_body_mut(&mut root.children);
            remove_in_children(children, &target);
        }
        Ok(ConfigDocument { root })
    }
}

/// The children list that holds fields: the explicit root object's, or
/// the root's own for brace-less documents.
fn object_body(children: &[Node]) -> &[Node] {
    for child in children {
        if let Node::Object(inner) = child {
            return inner;
        }
    }
    children
}

fn object_body_mut(children: &mut Vec<Node>) -> &mut Vec<Node> {
    let has_object = children.iter().any(|c| matches!(c, Node::Object(_)));
    if has_object {
        for child in children.iter_mut() {
            if let Node::Object(inner) = child {
                return inner;
            }
        }
        unreachable!("object child disappeared");
    }
    children
}

fn strip_prefix(path: &Path, count: usize) -> Path {
    Path::new(path.segments()[count..].to_vec())
}

fn has_in_children(children: &[Node], target: &Path) -> bool {
    for child in children {
        let Node::Field(field) = child else { continue };
        if field.path == *target || field.path.starts_with(target) {
            return true;
        }
        if target.starts_with(&field.path)
            && let Node::Object(inner) = field.value.as_ref()
            && has_in_children(inner, &strip_prefix(target, field.path.len()))
        {
            return true;
        }
    }
    false
}

/// Replace the value of the last field matching `target`. Returns false
/// when no field matched and the caller should append.
fn set_in_children(children: &mut [Node], target: &Path, value: &Node) -> bool {
    for child in children.iter_mut().rev() {
        let Node::Field(field) = child else { continue };
        if field.path == *target {
            field.value = Box::new(value.clone());
            return true;
        }
    }
    for child in children.iter_mut().rev() {
        let Node::Field(field) = child else { continue };
        if target.starts_with(&field.path)
            && field.path.len() < target.len()
            && let Node::Object(inner) = field.value.as_mut()
            && set_in_children(inner, &strip_prefix(target, field.path.len()), value)
        {
            return true;
        }
    }
    false
}

/// Append a new field for `target` at the end of the document root.
fn append_field(root: &mut Root, target: &Path, value: Node, json: bool) {
    let separator = if json {
        SeparatorKind::Colon
    } else {
        SeparatorKind::Equals
    };
    let separator_text = if json { ":" } else { "=" };
    let key_token = if json {
        RawToken::synthetic(
            TokenKind::QuotedString,
            format!(
                "\"{}\"",
                hocon_tokenizer::escape_json_string(target.render().as_str())
            ),
        )
    } else {
        RawToken::synthetic(TokenKind::Unquoted, target.render())
    };
    let field = Node::Field(Field {
        key_tokens: vec![
            key_token,
            RawToken::synthetic(TokenKind::Whitespace, " "),
        ],
        path: target.clone(),
        separator_tokens: vec![
            RawToken::synthetic(
                if json {
                    TokenKind::Colon
                } else {
                    TokenKind::Equals
                },
                separator_text,
            ),
            RawToken::synthetic(TokenKind::Whitespace, " "),
        ],
        separator,
        value: Box::new(value),
    });

    let children = object_body_mut(&mut root.children);
    // Insert after the last content node, before any trailing trivia and
    // closing brace; preceded by a newline separator (or a comma in
    // JSON).
    let mut insert_at = children
        .iter()
        .rposition(|c| matches!(c, Node::Token(t) if t.kind == TokenKind::RBrace))
        .unwrap_or(children.len());
    while insert_at > 0
        && matches!(&children[insert_at - 1], Node::Token(t)
            if t.kind == TokenKind::Whitespace || t.kind == TokenKind::Newline)
    {
        insert_at -= 1;
    }
    let has_fields = children.iter().any(|c| matches!(c, Node::Field(_)));
    let mut nodes = Vec::new();
    if json && has_fields {
        nodes.push(Node::Token(RawToken::synthetic(TokenKind::Comma, ",")));
        nodes.push(Node::Token(RawToken::synthetic(TokenKind::Whitespace, " ")));
    } else {
        nodes.push(Node::Token(RawToken::synthetic(TokenKind::Newline, "\n")));
    }
    nodes.push(field);
    for (offset, node) in nodes.into_iter().enumerate() {
        children.insert(insert_at + offset, node);
    }
}

/// Remove every field matching `target` or defining something beneath
/// it, along with a trailing comma.
fn remove_in_children(children: &mut Vec<Node>, target: &Path) {
    let mut index = 0;
    while index < children.len() {
        let matched = match &children[index] {
            Node::Field(field) => field.path == *target || field.path.starts_with(target),
            _ => false,
        };
        if matched {
            children.remove(index);
            remove_following_comma(children, index);
            continue;
        }
        if let Node::Field(field) = &mut children[index]
            && target.starts_with(&field.path)
            && field.path.len() < target.len()
            && let Node::Object(inner) = field.value.as_mut()
        {
            remove_in_children(inner, &strip_prefix(target, field.path.len()));
        }
        index += 1;
    }
}

fn remove_following_comma(children: &mut Vec<Node>, index: usize) {
    let mut cursor = index;
    while cursor < children.len() {
        match &children[cursor] {
            Node::Token(t) if t.kind == TokenKind::Whitespace => cursor += 1,
            Node::Token(t) if t.kind == TokenKind::Comma => {
                children.remove(cursor);
                return;
            }
            _ => return,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(source: &str) -> ConfigDocument {
        ConfigDocument::parse(source, ConfigSyntax::Conf).expect("parse failed")
    }

    #[test]
    fn test_render_identity() {
        let cases = [
            "a = 1\nb { c = [1, 2] } # done\n",
            "# header\ninclude \"base.conf\"\n\nx : yes\n",
            "{ a : 1, b : 2 }",
        ];
        for case in cases {
            assert_eq!(doc(case).render(), case);
        }
    }

    #[test]
    fn test_has_path() {
        let document = doc("a { b = 1 }\nc.d = 2\n");
        assert!(document.has_path("a").unwrap());
        assert!(document.has_path("a.b").unwrap());
        assert!(document.has_path("c").unwrap());
        assert!(document.has_path("c.d").unwrap());
        assert!(!document.has_path("a.x").unwrap());
        assert!(!document.has_path("z").unwrap());
    }

    #[test]
    fn test_set_value_replaces_in_place() {
        let document = doc("a = 1  # keep me\nb = 2\n");
        let edited = document.set_value("a", "42").unwrap();
        assert_eq!(edited.render(), "a = 42  # keep me\nb = 2\n");
    }

    #[test]
    fn test_set_value_nested() {
        let document = doc("server {\n  port = 80\n}\n");
        let edited = document.set_value("server.port", "8080").unwrap();
        assert_eq!(edited.render(), "server {\n  port = 8080\n}\n");
    }

    #[test]
    fn test_set_value_replaces_dotted_field() {
        let document = doc("a.b = 1\n");
        let edited = document.set_value("a.b", "2").unwrap();
        assert_eq!(edited.render(), "a.b = 2\n");
    }

    #[test]
    fn test_set_value_appends_when_missing() {
        let document = doc("a = 1");
        let edited = document.set_value("b.c", "hi there").unwrap();
        assert_eq!(edited.render(), "a = 1\nb.c = hi there");
        // The appended field parses back to the same value
        assert!(edited.has_path("b.c").unwrap());
    }

    #[test]
    fn test_set_value_preserves_replacement_formatting() {
        let document = doc("a = 1\n");
        let edited = document.set_value("a", "{ x = 1,  y = 2 }").unwrap();
        assert_eq!(edited.render(), "a = { x = 1,  y = 2 }\n");
    }

    #[test]
    fn test_remove_path() {
        let document = doc("a = 1\nb = 2\n");
        let edited = document.remove_path("a").unwrap();
        assert_eq!(edited.render(), "\nb = 2\n");
        assert!(!edited.has_path("a").unwrap());
    }

    #[test]
    fn test_remove_path_with_comma() {
        let document = doc("{ a : 1, b : 2 }");
        let edited = document.remove_path("a").unwrap();
        assert_eq!(edited.render(), "{  b : 2 }");
    }

    #[test]
    fn test_remove_nested_path() {
        let document = doc("outer { keep = 1\ndrop = 2 }\n");
        let edited = document.remove_path("outer.drop").unwrap();
        assert!(!edited.has_path("outer.drop").unwrap());
        assert!(edited.has_path("outer.keep").unwrap());
    }

    #[test]
    fn test_set_value_in_json_document() {
        let document =
            ConfigDocument::parse("{ \"a\": 1 }", ConfigSyntax::Json).expect("parse failed");
        let edited = document.set_value("b", "2").unwrap();
        assert_eq!(edited.render(), "{ \"a\": 1, \"b\" : 2 }");
    }
}
