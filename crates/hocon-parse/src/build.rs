//! Value builder: syntax tree to semantic value tree.
//!
//! This is the second half of the document parser. It walks config nodes
//! and produces `ConfigValue`s with substitution placeholders left in
//! place for the resolver. Includes are delegated to the handler and
//! spliced with object-merge semantics; `+=` desugars to a
//! self-referential list append; duplicate keys merge per the fallback
//! rules.

use hocon_tokenizer::{TokenKind, unescape_quoted};
use hocon_tree::{ConfigError, ConfigValue, Object, Origin, Path, Result, join_concat};
use tracing::trace;

use crate::node::{Field, Node, RawToken, Root, SeparatorKind};
use crate::IncludeHandler;

/// Build the value tree for a parsed document.
///
/// The result is an object for object-rooted documents (braced or not)
/// and a list for array-rooted ones. Substitutions remain unresolved.
pub fn build_value(
    root: &Root,
    origin: &Origin,
    handler: &dyn IncludeHandler,
) -> Result<ConfigValue> {
    let builder = Builder { origin, handler };
    builder.build_root(root)
}

struct Builder<'a> {
    origin: &'a Origin,
    handler: &'a dyn IncludeHandler,
}

impl Builder<'_> {
    fn origin_at(&self, line: u32) -> Origin {
        self.origin.with_line(line)
    }

    fn build_root(&self, root: &Root) -> Result<ConfigValue> {
        for child in &root.children {
            match child {
                Node::Object(children) => return self.build_object(children, &[]),
                Node::Array(children) => return self.build_array(children, &[]),
                _ => {}
            }
        }
        // Brace-less root: the children are the object body.
        self.build_object(&root.children, &[])
    }

    /// Build an object from its children (braces and trivia included).
    /// `prefix` is the key path from the document root, used to desugar
    /// `+=` into an absolute self-reference.
    fn build_object(&self, children: &[Node], prefix: &[String]) -> Result<ConfigValue> {
        let line = children.first().map(Node::start_line).unwrap_or(1);
        let mut object = Object::new();
        let mut pending_comments: Vec<String> = Vec::new();

        for child in children {
            match child {
                Node::Field(field) => {
                    let comments = std::mem::take(&mut pending_comments);
                    self.add_field(&mut object, field, prefix, comments)?;
                }
                Node::Include { tokens, spec } => {
                    pending_comments.clear();
                    self.splice_include(&mut object, tokens, spec)?;
                }
                Node::Token(token) if token.kind == TokenKind::Comment => {
                    pending_comments.push(strip_comment_marker(&token.text).to_string());
                }
                _ => {}
            }
        }

        Ok(ConfigValue::object(object, self.origin_at(line)))
    }

    fn add_field(
        &self,
        object: &mut Object,
        field: &Field,
        prefix: &[String],
        comments: Vec<String>,
    ) -> Result<()> {
        let line = field
            .key_tokens
            .first()
            .map(|t| t.line)
            .unwrap_or_else(|| field.value.start_line());
        let field_origin = self.origin_at(line);

        let mut full_prefix: Vec<String> = prefix.to_vec();
        full_prefix.extend(field.path.segments().iter().cloned());

        let mut value = self.build_node(&field.value, &full_prefix)?;
        if !comments.is_empty() {
            value.origin = value.origin.with_comments(comments);
        }
        let value = if field.separator == SeparatorKind::PlusEquals {
            // `k += v` appends to the previous value of k, which need not
            // exist: `k = ${?k} [v]`.
            trace!("desugaring += at {}", Path::new(full_prefix.clone()));
            let previous = ConfigValue::substitution(
                Path::new(full_prefix.clone()),
                true,
                field_origin.clone(),
            );
            let element_origin = value.origin.clone();
            let singleton = ConfigValue::list(vec![value], element_origin);
            ConfigValue::concat(vec![previous, singleton], field_origin.clone())
        } else {
            value
        };

        // Expand `a.b.c = v` into nested objects.
        let segments = field.path.segments();
        let mut wrapped = value;
        for segment in segments[1..].iter().rev() {
            let mut inner = Object::new();
            inner.insert(segment.clone(), wrapped);
            wrapped = ConfigValue::object(inner, field_origin.clone());
        }

        merge_key(object, segments[0].clone(), wrapped);
        Ok(())
    }

    fn splice_include(
        &self,
        object: &mut Object,
        tokens: &[RawToken],
        spec: &crate::IncludeSpec,
    ) -> Result<()> {
        let line = tokens.first().map(|t| t.line).unwrap_or(1);
        let include_origin = self.origin_at(line);
        let value = self.handler.include(spec, &include_origin)?;
        let Some(included) = value.as_object() else {
            return Err(ConfigError::wrong_type(
                value.origin.clone(),
                "",
                "object at file root",
                value.value_type_name(),
            ));
        };
        for (key, included_value) in included.iter() {
            merge_key(object, key.clone(), included_value.clone());
        }
        Ok(())
    }

    fn build_array(&self, children: &[Node], prefix: &[String]) -> Result<ConfigValue> {
        let line = children.first().map(Node::start_line).unwrap_or(1);
        let mut items = Vec::new();
        for child in children {
            if let Some(item) = self.build_element(child, prefix)? {
                items.push(item);
            }
        }
        Ok(ConfigValue::list(items, self.origin_at(line)))
    }

    /// Build an array element; trivia and brackets yield `None`.
    fn build_element(&self, node: &Node, prefix: &[String]) -> Result<Option<ConfigValue>> {
        match node {
            Node::Token(_) => Ok(None),
            _ => self.build_node(node, prefix).map(Some),
        }
    }

    fn build_node(&self, node: &Node, prefix: &[String]) -> Result<ConfigValue> {
        match node {
            Node::SimpleValue(token) => self.build_scalar(token),
            Node::Substitution(tokens) => self.build_substitution(tokens),
            Node::Concat(parts) => self.build_concat(parts, prefix),
            Node::Object(children) => self.build_object(children, prefix),
            Node::Array(children) => self.build_array(children, prefix),
            Node::Token(token) => Err(ConfigError::bug(format!(
                "stray token '{}' treated as a value",
                token.text
            ))),
            Node::Field(_) | Node::Include { .. } => Err(ConfigError::bug(
                "field node outside of an object".to_string(),
            )),
        }
    }

    fn build_scalar(&self, token: &RawToken) -> Result<ConfigValue> {
        let origin = self.origin_at(token.line);
        let value = match token.kind {
            TokenKind::Int => {
                let n = token.text.parse::<i64>().map_err(|_| {
                    ConfigError::bug(format!("int token failed to parse: '{}'", token.text))
                })?;
                ConfigValue::int(n, origin)
            }
            TokenKind::Double => {
                let d = token.text.parse::<f64>().map_err(|_| {
                    ConfigError::bug(format!("double token failed to parse: '{}'", token.text))
                })?;
                ConfigValue::double(d, origin)
            }
            TokenKind::Bool => ConfigValue::bool(token.text == "true", origin),
            TokenKind::Null => ConfigValue::null(origin),
            TokenKind::QuotedString => {
                let inner = &token.text[1..token.text.len() - 1];
                ConfigValue::string(unescape_quoted(inner).into_owned(), origin)
            }
            TokenKind::MultilineString => {
                // Strip the triple quotes; content is verbatim.
                let inner = &token.text[3..token.text.len() - 3];
                ConfigValue::string(inner.to_string(), origin)
            }
            TokenKind::Unquoted => ConfigValue::string(token.text.clone(), origin),
            other => {
                return Err(ConfigError::bug(format!(
                    "token kind {other:?} is not a simple value"
                )));
            }
        };
        Ok(value)
    }

    fn build_substitution(&self, tokens: &[RawToken]) -> Result<ConfigValue> {
        let open = tokens.first().ok_or_else(|| {
            ConfigError::bug("substitution node with no tokens".to_string())
        })?;
        let origin = self.origin_at(open.line);
        let optional = open.kind == TokenKind::SubstitutionOptionalOpen;

        let body: String = tokens[1..tokens.len() - 1]
            .iter()
            .map(|t| t.text.as_str())
            .collect();
        let trimmed = body.trim();
        if trimmed.is_empty() {
            return Err(ConfigError::parse(
                origin,
                "substitution '${}' has an empty path".to_string(),
            ));
        }
        let path = Path::parse(trimmed).map_err(|error| {
            ConfigError::parse(
                origin.clone(),
                format!("invalid path in substitution '${{{trimmed}}}': {error}"),
            )
        })?;
        Ok(ConfigValue::substitution(path, optional, origin))
    }

    fn build_concat(&self, parts: &[Node], prefix: &[String]) -> Result<ConfigValue> {
        let line = parts.first().map(Node::start_line).unwrap_or(1);
        let origin = self.origin_at(line);

        let mut values = Vec::with_capacity(parts.len());
        for part in parts {
            match part {
                Node::Token(token) => {
                    // Interior whitespace becomes a literal string part.
                    values.push(ConfigValue::string(
                        token.text.clone(),
                        self.origin_at(token.line),
                    ));
                }
                _ => values.push(self.build_node(part, prefix)?),
            }
        }

        if values.iter().all(ConfigValue::is_resolved) {
            // Join now so malformed concatenations fail at parse time.
            match join_concat(values, &origin)? {
                Some(joined) => Ok(joined),
                None => Err(ConfigError::bug(
                    "eager concatenation join produced no value".to_string(),
                )),
            }
        } else {
            Ok(ConfigValue::concat(values, origin))
        }
    }
}

/// Strip the `#` or `//` marker and one leading space from a comment.
fn strip_comment_marker(text: &str) -> &str {
    let body = text
        .strip_prefix("//")
        .or_else(|| text.strip_prefix('#'))
        .unwrap_or(text);
    body.strip_prefix(' ').unwrap_or(body)
}

/// Insert a value, merging with any earlier entry (newer wins).
fn merge_key(object: &mut Object, key: String, value: ConfigValue) {
    match object.get(&key) {
        Some(existing) => {
            let merged = value.with_fallback(existing);
            object.insert(key, merged);
        }
        None => object.insert(key, value),
    }
}
