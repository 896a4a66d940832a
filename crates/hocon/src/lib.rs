//! Parse, resolve, and query HOCON configuration.
//!
//! HOCON is a superset of JSON with comments, unquoted keys and strings,
//! key paths, value concatenation, object merging, substitutions,
//! includes, and duration/size units. The pipeline here is parse →
//! resolve → query:
//!
//! ```
//! let config = hocon::load_str(r#"
//!     base { timeout = 250ms }
//!     service = ${base} { retries = 3 }
//! "#).unwrap();
//!
//! assert_eq!(config.get_int("service.retries").unwrap(), 3);
//! assert_eq!(config.get_duration("service.timeout").unwrap(), 250_000_000);
//! ```
//!
//! [`parse_str`] and [`parse_file`] stop before resolution (substitutions
//! stay in the tree for later [`Config::resolve`] or
//! [`Config::with_fallback`] composition); [`load_str`] and
//! [`load_file`] resolve immediately. [`Parseable`] is the full-control
//! surface behind both.

mod config;
mod include;
mod options;
mod resolve;
mod source;
mod units;

pub use config::Config;
pub use include::{DefaultIncluder, IncludeContext, Includer};
pub use options::{ParseOptions, ResolveOptions};
pub use resolve::resolve;
pub use source::{MAX_INCLUDE_DEPTH, Parseable};

pub use hocon_parse::{
    ConfigDocument, ConfigSyntax, IncludeKind, IncludeSpec, ParseError, render_parse_error,
};
pub use hocon_tree::{
    ConfigError, ConfigErrorKind, ConfigValue, Object, Origin, Path, RenderOptions, ResolveStatus,
    Result, Substitution, ValueKind, render,
};

use std::path::Path as FsPath;

/// Parse a string without resolving substitutions.
pub fn parse_str(source: &str) -> Result<Config> {
    parse_str_with(source, ParseOptions::new())
}

/// Parse a string with options, without resolving substitutions.
pub fn parse_str_with(source: &str, options: ParseOptions) -> Result<Config> {
    Config::from_root(Parseable::new_string(source, options).parse()?)
}

/// Parse a file without resolving substitutions. A missing file is an
/// error unless the options allow it.
pub fn parse_file(path: impl AsRef<FsPath>) -> Result<Config> {
    parse_file_with(path, ParseOptions::new())
}

/// Parse a file with options, without resolving substitutions.
pub fn parse_file_with(path: impl AsRef<FsPath>, options: ParseOptions) -> Result<Config> {
    Config::from_root(Parseable::new_file(path.as_ref(), options).parse()?)
}

/// Parse and resolve a string.
pub fn load_str(source: &str) -> Result<Config> {
    parse_str(source)?.resolve()
}

/// Parse and resolve a file.
pub fn load_file(path: impl AsRef<FsPath>) -> Result<Config> {
    parse_file(path)?.resolve()
}

/// Parse a string into an editable, formatting-preserving document.
pub fn parse_document_str(source: &str) -> Result<ConfigDocument> {
    Parseable::new_string(source, ParseOptions::new()).parse_document()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_str() {
        let config = load_str("a = 1\nb = ${a}").unwrap();
        assert_eq!(config.get_int("b").unwrap(), 1);
        assert!(config.is_resolved());
    }

    #[test]
    fn test_parse_str_leaves_substitutions() {
        let config = parse_str("a = 1\nb = ${a}").unwrap();
        assert!(!config.is_resolved());
    }

    #[test]
    fn test_doc_example() {
        let config = load_str(
            r#"
            base { timeout = 250ms }
            service = ${base} { retries = 3 }
            "#,
        )
        .unwrap();
        assert_eq!(config.get_int("service.retries").unwrap(), 3);
        assert_eq!(
            config.get_duration("service.timeout").unwrap(),
            250_000_000
        );
    }
}
