//! Rendering config values back to text.
//!
//! The document tree in `hocon-parse` re-renders its exact input; this
//! renderer instead prints a value tree, controlled by [`RenderOptions`].
//! With `json` set the output is valid JSON as long as the tree is
//! resolved; `comments` may independently reintroduce non-JSON output.

use hocon_tokenizer::{escape_json_string, is_unquoted_char};

use crate::{ConfigValue, ValueKind, format_double};

/// Toggles for value rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Emit a comment with each value's origin.
    pub origin_comments: bool,
    /// Emit comments that preceded values in the source.
    pub comments: bool,
    /// Indent and use newlines; otherwise everything is on one line.
    pub formatted: bool,
    /// Suppress HOCON extensions (quote all keys and strings).
    pub json: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            origin_comments: true,
            comments: true,
            formatted: true,
            json: true,
        }
    }
}

impl RenderOptions {
    /// The default options: everything on.
    pub fn defaults() -> Self {
        Self::default()
    }

    /// All options off: single-line HOCON with no comments.
    pub fn concise() -> Self {
        Self {
            origin_comments: false,
            comments: false,
            formatted: false,
            json: false,
        }
    }

    /// Return a copy with `origin_comments` set.
    pub fn set_origin_comments(mut self, value: bool) -> Self {
        self.origin_comments = value;
        self
    }

    /// Return a copy with `comments` set.
    pub fn set_comments(mut self, value: bool) -> Self {
        self.comments = value;
        self
    }

    /// Return a copy with `formatted` set.
    pub fn set_formatted(mut self, value: bool) -> Self {
        self.formatted = value;
        self
    }

    /// Return a copy with `json` set.
    pub fn set_json(mut self, value: bool) -> Self {
        self.json = value;
        self
    }
}

/// Render a value to text.
pub fn render(value: &ConfigValue, options: &RenderOptions) -> String {
    let mut out = String::new();
    render_value(value, &mut out, 0, options);
    out
}

const INDENT: &str = "    ";

fn push_indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str(INDENT);
    }
}

fn render_value(value: &ConfigValue, out: &mut String, depth: usize, options: &RenderOptions) {
    match &value.kind {
        ValueKind::Null => out.push_str("null"),
        ValueKind::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        ValueKind::Int(n) => out.push_str(&n.to_string()),
        ValueKind::Double(d) => out.push_str(&format_double(*d)),
        ValueKind::String(s) => render_string(s, out, options),
        ValueKind::List(items) => render_list(items, out, depth, options),
        ValueKind::Object(_) => render_object(value, out, depth, options),
        ValueKind::Concat(parts) => {
            // Unresolved; best-effort HOCON form.
            for part in parts {
                match &part.kind {
                    ValueKind::String(s) => out.push_str(s),
                    _ => render_value(part, out, depth, options),
                }
            }
        }
        ValueKind::Substitution(sub) => out.push_str(&sub.expression()),
        ValueKind::DelayedMerge(stack) => {
            // Unresolved; the newest entry is the best single rendering.
            if let Some(newest) = stack.first() {
                render_value(newest, out, depth, options);
            }
        }
    }
}

fn render_string(s: &str, out: &mut String, options: &RenderOptions) {
    if !options.json && can_render_unquoted(s) {
        out.push_str(s);
    } else {
        out.push('"');
        out.push_str(&escape_json_string(s));
        out.push('"');
    }
}

fn render_key(key: &str, out: &mut String, options: &RenderOptions) {
    render_string(key, out, options);
}

fn render_list(items: &[ConfigValue], out: &mut String, depth: usize, options: &RenderOptions) {
    if items.is_empty() {
        out.push_str("[]");
        return;
    }
    out.push('[');
    for (index, item) in items.iter().enumerate() {
        if index > 0 {
            out.push(',');
            if options.formatted {
                out.push(' ');
            }
        }
        render_value(item, out, depth, options);
    }
    out.push(']');
}

fn render_object(value: &ConfigValue, out: &mut String, depth: usize, options: &RenderOptions) {
    let object = match &value.kind {
        ValueKind::Object(object) => object,
        _ => unreachable!("render_object on non-object"),
    };
    if object.is_empty() {
        out.push_str("{}");
        return;
    }

    out.push('{');
    if options.formatted {
        out.push('\n');
    }
    let last = object.len() - 1;
    for (index, (key, child)) in object.iter().enumerate() {
        if options.formatted {
            if options.comments {
                for line in child.origin.comments() {
                    push_indent(out, depth + 1);
                    out.push_str("# ");
                    out.push_str(line);
                    out.push('\n');
                }
            }
            if options.origin_comments {
                push_indent(out, depth + 1);
                out.push_str("# ");
                out.push_str(&child.origin.describe());
                out.push('\n');
            }
            push_indent(out, depth + 1);
        }
        render_key(key, out, options);
        out.push_str(" : ");
        render_value(child, out, depth + 1, options);
        if index != last && (options.json || !options.formatted) {
            out.push(',');
        }
        if options.formatted {
            out.push('\n');
        } else if index != last {
            out.push(' ');
        }
    }
    if options.formatted {
        push_indent(out, depth);
    }
    out.push('}');
}

/// A string renders unquoted only if re-parsing it yields the same
/// string value.
fn can_render_unquoted(s: &str) -> bool {
    if s.is_empty() || matches!(s, "true" | "false" | "null") {
        return false;
    }
    if s.parse::<f64>().is_ok() {
        return false;
    }
    if s.contains("//") {
        return false;
    }
    s.chars().all(is_unquoted_char)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Object, Origin};

    fn origin() -> Origin {
        Origin::new("test")
    }

    fn sample() -> ConfigValue {
        let mut inner = Object::new();
        inner.insert("host", ConfigValue::string("localhost", origin()));
        inner.insert("port", ConfigValue::int(80, origin()));
        let mut root = Object::new();
        root.insert("server", ConfigValue::object(inner, origin()));
        root.insert(
            "tags",
            ConfigValue::list(
                vec![
                    ConfigValue::string("a b", origin()),
                    ConfigValue::bool(true, origin()),
                    ConfigValue::null(origin()),
                ],
                origin(),
            ),
        );
        ConfigValue::object(root, origin())
    }

    #[test]
    fn test_concise_render() {
        let options = RenderOptions::concise();
        let text = render(&sample(), &options);
        assert_eq!(
            text,
            "{server : {host : localhost, port : 80}, tags : [\"a b\",true,null]}"
        );
    }

    #[test]
    fn test_json_render() {
        let options = RenderOptions::concise().set_json(true);
        let text = render(&sample(), &options);
        assert_eq!(
            text,
            "{\"server\" : {\"host\" : \"localhost\", \"port\" : 80}, \"tags\" : [\"a b\",true,null]}"
        );
    }

    #[test]
    fn test_formatted_render_indents() {
        let options = RenderOptions::concise().set_formatted(true);
        let text = render(&sample(), &options);
        assert!(text.contains("{\n"));
        assert!(text.contains("    server : {\n"));
        assert!(text.contains("        host : localhost\n"));
    }

    #[test]
    fn test_origin_comments() {
        let options = RenderOptions::concise()
            .set_formatted(true)
            .set_origin_comments(true);
        let text = render(&sample(), &options);
        assert!(text.contains("# test"));
    }

    #[test]
    fn test_value_comments() {
        let mut root = Object::new();
        root.insert(
            "port",
            ConfigValue::int(80, origin().with_comments(vec!["the port".to_string()])),
        );
        let value = ConfigValue::object(root, origin());
        let options = RenderOptions::concise()
            .set_formatted(true)
            .set_comments(true);
        let text = render(&value, &options);
        assert!(text.contains("# the port\n"));
        // And the toggle really is independent
        let silent = render(&value, &RenderOptions::concise().set_formatted(true));
        assert!(!silent.contains("# the port"));
    }

    #[test]
    fn test_substitution_renders_as_expression() {
        let value = ConfigValue::substitution(
            crate::Path::parse("a.b").unwrap(),
            true,
            origin(),
        );
        assert_eq!(render(&value, &RenderOptions::concise()), "${?a.b}");
    }

    #[test]
    fn test_numbers_round_trip_as_numbers() {
        let value = ConfigValue::double(3.0, origin());
        assert_eq!(render(&value, &RenderOptions::concise()), "3.0");
        let value = ConfigValue::string("3.0", origin());
        // A numeric-looking string must stay quoted
        assert_eq!(render(&value, &RenderOptions::concise()), "\"3.0\"");
    }
}
