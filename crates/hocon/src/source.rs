//! Parseable sources.
//!
//! A `Parseable` pairs something that can produce text (a file, an
//! in-memory string, a named resource, or a known-missing placeholder)
//! with parse options and an origin. It owns the entry points into the
//! parse pipeline and the per-thread include depth guard.

use std::cell::RefCell;
use std::path::PathBuf;

use hocon_parse::{ConfigDocument, ConfigSyntax, Root, build_value, parse_document_nodes};
use hocon_tree::{ConfigError, ConfigErrorKind, ConfigValue, Origin, Result};
use tracing::trace;

use crate::ParseOptions;
use crate::include::EngineIncludeHandler;

/// Maximum include nesting before the engine assumes a cycle.
pub const MAX_INCLUDE_DEPTH: usize = 50;

thread_local! {
    /// Sources currently being parsed on this thread. Established lazily
    /// by the first parse and emptied when the outermost parse finishes.
    static PARSE_STACK: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
}

/// Pops the parse stack on every exit path, panics included.
struct StackGuard;

impl StackGuard {
    fn push(entry: String, origin: &Origin) -> Result<StackGuard> {
        PARSE_STACK.with(|stack| {
            let mut stack = stack.borrow_mut();
            if stack.len() >= MAX_INCLUDE_DEPTH {
                let trace = stack.clone();
                return Err(ConfigError::cycle(
                    origin.clone(),
                    format!(
                        "include statements nested more than {MAX_INCLUDE_DEPTH} times, you \
                         probably have a cycle in your includes."
                    ),
                    trace,
                ));
            }
            stack.push(entry);
            Ok(StackGuard)
        })
    }
}

impl Drop for StackGuard {
    fn drop(&mut self) {
        PARSE_STACK.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

/// Something parseable: a source of config text plus options and origin.
#[derive(Debug, Clone)]
pub struct Parseable {
    kind: SourceKind,
    options: ParseOptions,
    origin: Origin,
}

#[derive(Debug, Clone)]
enum SourceKind {
    /// A file on disk.
    File { path: PathBuf },
    /// An in-memory string.
    Text { content: String },
    /// A named resource, resolvable only by an application includer.
    Resources { resource: String },
    /// A placeholder for something already known to be missing.
    NotFound { what: String, message: String },
}

impl Parseable {
    /// A file source. Syntax is guessed from the extension when
    /// unspecified.
    pub fn new_file(path: impl Into<PathBuf>, options: ParseOptions) -> Parseable {
        Self::construct(SourceKind::File { path: path.into() }, options)
    }

    /// An in-memory string source.
    pub fn new_string(content: impl Into<String>, options: ParseOptions) -> Parseable {
        Self::construct(
            SourceKind::Text {
                content: content.into(),
            },
            options,
        )
    }

    /// A named-resource source. Reading it is an error; it exists so
    /// resource names can carry origins through the include machinery.
    pub fn new_resources(resource: impl Into<String>, options: ParseOptions) -> Parseable {
        Self::construct(
            SourceKind::Resources {
                resource: resource.into(),
            },
            options,
        )
    }

    /// A placeholder for a missing source: parses to an empty object
    /// when the policy allows, errors with `message` otherwise.
    pub fn new_not_found(
        what: impl Into<String>,
        message: impl Into<String>,
        options: ParseOptions,
    ) -> Parseable {
        Self::construct(
            SourceKind::NotFound {
                what: what.into(),
                message: message.into(),
            },
            options,
        )
    }

    fn construct(kind: SourceKind, base_options: ParseOptions) -> Parseable {
        let options = fixup_options(&kind, base_options);
        let origin = match options.origin_description() {
            Some(description) => Origin::new(description),
            None => create_origin(&kind),
        };
        Parseable {
            kind,
            options,
            origin,
        }
    }

    /// The options this source was created with (after fixup).
    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// The origin describing this source.
    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    /// Derive a source relative to this one. Names starting with `/` are
    /// absolute; others resolve against the including file's directory.
    /// Include arguments always use `/`; only the OS open sees native
    /// separators.
    pub fn relative_to(&self, name: &str, options: ParseOptions) -> Parseable {
        if name.starts_with('/') {
            return Parseable::new_file(name, options);
        }
        match &self.kind {
            SourceKind::File { path } => {
                let dir = path.parent().unwrap_or_else(|| std::path::Path::new(""));
                Parseable::new_file(dir.join(name), options)
            }
            _ => Parseable::new_file(name, options),
        }
    }

    /// Read the source's entire content.
    fn reader(&self) -> Result<String> {
        match &self.kind {
            SourceKind::File { path } => std::fs::read_to_string(path).map_err(|error| {
                ConfigError::io(
                    self.origin.clone(),
                    format!("{}: {}", path.display(), error),
                )
            }),
            SourceKind::Text { content } => Ok(content.clone()),
            SourceKind::Resources { .. } => Err(ConfigError::bug(
                "reader() should not be called on a resources source".to_string(),
            )),
            SourceKind::NotFound { message, .. } => {
                Err(ConfigError::io(self.origin.clone(), message.clone()))
            }
        }
    }

    /// Parse to an object root, guarding against include cycles.
    ///
    /// This is the entry point the include engine re-enters; nesting
    /// deeper than [`MAX_INCLUDE_DEPTH`] raises a cycle error carrying
    /// the per-thread stack as its trace.
    pub fn parse(&self) -> Result<ConfigValue> {
        self.parse_with(self.options.clone())
    }

    /// Parse to an object root with the given options.
    pub fn parse_with(&self, options: ParseOptions) -> Result<ConfigValue> {
        let _guard = StackGuard::push(self.origin.description().to_string(), &self.origin)?;
        let value = self.parse_value_with(options)?;
        force_object(value)
    }

    /// Parse to a value tree (object or array root) without forcing an
    /// object.
    pub fn parse_value(&self) -> Result<ConfigValue> {
        self.parse_value_with(self.options.clone())
    }

    /// Parse to a value tree with the given options.
    ///
    /// An unreadable source becomes an empty object with a `(not found)`
    /// origin when `allow_missing` is set; otherwise the I/O error
    /// propagates. Malformed content is always an error.
    pub fn parse_value_with(&self, base_options: ParseOptions) -> Result<ConfigValue> {
        let options = fixup_options(&self.kind, base_options);
        let origin = match options.origin_description() {
            Some(description) => Origin::new(description),
            None => self.origin.clone(),
        };
        match self.raw_parse_value(&origin, &options) {
            Ok(value) => Ok(value),
            Err(error) if matches!(error.kind(), ConfigErrorKind::Io { .. }) => {
                if options.allow_missing() {
                    trace!("missing source allowed: {}", origin.description());
                    Ok(ConfigValue::empty_object(origin.with_suffix(" (not found)")))
                } else {
                    Err(error)
                }
            }
            Err(error) => Err(error),
        }
    }

    fn raw_parse_value(&self, origin: &Origin, options: &ParseOptions) -> Result<ConfigValue> {
        let content = self.reader()?;
        let root = parse_document_nodes(&content, options.syntax())
            .map_err(|error| error.into_config_error(origin))?;
        let handler = EngineIncludeHandler::new(self, options);
        build_value(&root, origin, &handler)
    }

    /// Parse to a formatting-preserving document with an edit surface.
    pub fn parse_document(&self) -> Result<ConfigDocument> {
        self.parse_document_with(self.options.clone())
    }

    /// Parse to a document with the given options, applying the same
    /// missing-source policy as [`Parseable::parse_value_with`].
    pub fn parse_document_with(&self, base_options: ParseOptions) -> Result<ConfigDocument> {
        let options = fixup_options(&self.kind, base_options);
        let origin = match options.origin_description() {
            Some(description) => Origin::new(description),
            None => self.origin.clone(),
        };
        let result = self.reader().and_then(|content| {
            parse_document_nodes(&content, options.syntax())
                .map(ConfigDocument::from_root)
                .map_err(|error| error.into_config_error(&origin))
        });
        match result {
            Ok(document) => Ok(document),
            Err(error) if matches!(error.kind(), ConfigErrorKind::Io { .. }) => {
                if options.allow_missing() {
                    Ok(ConfigDocument::from_root(Root {
                        children: Vec::new(),
                        syntax: options.syntax(),
                    }))
                } else {
                    Err(error)
                }
            }
            Err(error) => Err(error),
        }
    }
}

/// Apply the standard option fixups: syntax falls back from unspecified
/// to the source's guess, then to CONF.
fn fixup_options(kind: &SourceKind, base: ParseOptions) -> ParseOptions {
    let mut syntax = base.syntax();
    if syntax == ConfigSyntax::Unspecified {
        syntax = guess_syntax(kind);
    }
    if syntax == ConfigSyntax::Unspecified {
        syntax = ConfigSyntax::Conf;
    }
    base.set_syntax(syntax)
}

fn guess_syntax(kind: &SourceKind) -> ConfigSyntax {
    match kind {
        SourceKind::File { path } => {
            ConfigSyntax::from_extension(&path.to_string_lossy())
        }
        _ => ConfigSyntax::Unspecified,
    }
}

fn create_origin(kind: &SourceKind) -> Origin {
    match kind {
        SourceKind::File { path } => Origin::new_file(path.clone()),
        SourceKind::Text { .. } => Origin::new("string"),
        SourceKind::Resources { resource } => Origin::new(resource.clone()),
        SourceKind::NotFound { what, .. } => Origin::new(what.clone()),
    }
}

fn force_object(value: ConfigValue) -> Result<ConfigValue> {
    if value.as_object().is_some() {
        Ok(value)
    } else {
        Err(ConfigError::wrong_type(
            value.origin.clone(),
            "",
            "object at file root",
            value.value_type_name(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_string() {
        let source = Parseable::new_string("a = 1", ParseOptions::new());
        let value = source.parse().expect("parse failed");
        assert!(value.as_object().unwrap().contains_key("a"));
    }

    #[test]
    fn test_array_root_rejected_by_parse() {
        let source = Parseable::new_string("[1, 2]", ParseOptions::new());
        let error = source.parse().expect_err("expected wrong type");
        assert!(matches!(
            error.kind(),
            ConfigErrorKind::WrongType { .. }
        ));
        // parse_value accepts it
        let value = source.parse_value().expect("parse_value failed");
        assert!(value.as_list().is_some());
    }

    #[test]
    fn test_missing_file_policy() {
        let missing = Parseable::new_file("definitely/not/here.conf", ParseOptions::new());
        let error = missing.parse().expect_err("expected io error");
        assert!(matches!(error.kind(), ConfigErrorKind::Io { .. }));

        let allowed = Parseable::new_file(
            "definitely/not/here.conf",
            ParseOptions::new().set_allow_missing(true),
        );
        let value = allowed.parse().expect("should be empty");
        assert!(value.as_object().unwrap().is_empty());
        assert!(value.origin.description().ends_with("(not found)"));
    }

    #[test]
    fn test_not_found_source() {
        let source = Parseable::new_not_found(
            "resource \"x\"",
            "x was not on the search path",
            ParseOptions::new().set_allow_missing(true),
        );
        let value = source.parse().expect("should be empty object");
        assert!(value.as_object().unwrap().is_empty());

        let strict = Parseable::new_not_found(
            "resource \"x\"",
            "x was not on the search path",
            ParseOptions::new(),
        );
        assert!(strict.parse().is_err());
    }

    #[test]
    fn test_resources_reader_is_bug() {
        let source = Parseable::new_resources("application.conf", ParseOptions::new());
        let error = source.parse().expect_err("expected bug");
        assert!(matches!(error.kind(), ConfigErrorKind::Bug { .. }));
    }

    #[test]
    fn test_syntax_guess_from_extension() {
        let json = Parseable::new_file("app.json", ParseOptions::new());
        assert_eq!(json.options().syntax(), ConfigSyntax::Json);
        let conf = Parseable::new_file("app.conf", ParseOptions::new());
        assert_eq!(conf.options().syntax(), ConfigSyntax::Conf);
        let other = Parseable::new_file("app.cfg", ParseOptions::new());
        assert_eq!(other.options().syntax(), ConfigSyntax::Conf);
    }

    #[test]
    fn test_explicit_syntax_wins_over_extension() {
        let source = Parseable::new_file(
            "app.json",
            ParseOptions::new().set_syntax(ConfigSyntax::Conf),
        );
        assert_eq!(source.options().syntax(), ConfigSyntax::Conf);
    }

    #[test]
    fn test_origin_description_override() {
        let source = Parseable::new_string(
            "a = 1",
            ParseOptions::new().set_origin_description("test config"),
        );
        assert_eq!(source.origin().description(), "test config");
        let value = source.parse().expect("parse failed");
        let a = value.as_object().unwrap().get("a").unwrap();
        assert_eq!(a.origin.description(), "test config");
        assert_eq!(a.origin.line(), Some(1));
    }

    #[test]
    fn test_relative_to() {
        let base = Parseable::new_file("conf/app.conf", ParseOptions::new());
        let relative = base.relative_to("other.conf", ParseOptions::new());
        assert_eq!(
            relative.origin().description(),
            format!("file: conf{}other.conf", std::path::MAIN_SEPARATOR)
        );

        let absolute = base.relative_to("/etc/app.conf", ParseOptions::new());
        assert_eq!(absolute.origin().description(), "file: /etc/app.conf");
    }

    #[test]
    fn test_parse_stack_unwinds() {
        // After a failed parse the stack must be empty again
        let bad = Parseable::new_string("a = ${", ParseOptions::new());
        assert!(bad.parse().is_err());
        PARSE_STACK.with(|stack| assert!(stack.borrow().is_empty()));
        // And further parses on the same thread still work
        let good = Parseable::new_string("a = 1", ParseOptions::new());
        assert!(good.parse().is_ok());
    }
}
